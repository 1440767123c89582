use super::{Context, HandlerResult, reject};
use crate::error::BrokerResult;
use crate::request::{MoveOsdToBucket, OsdId, present};

pub fn move_osd_to_bucket(ctx: &Context<'_>, req: &MoveOsdToBucket) -> HandlerResult {
    let osd = match &req.osd {
        Some(OsdId::Name(name)) if name.is_empty() => None,
        other => other.as_ref().map(ToString::to_string),
    };
    let (Some(osd), Some(bucket)) = (osd, present(&req.bucket)) else {
        return reject("Missing OSD ID or Bucket");
    };
    match move_osd(ctx, &osd, bucket) {
        Ok(()) => Ok(None),
        Err(err) => reject(format!("Failed to move OSD {osd} into Bucket {bucket} :: {err}")),
    }
}

fn move_osd(ctx: &Context<'_>, osd: &str, bucket: &str) -> BrokerResult<()> {
    let cluster = ctx.cluster;
    cluster.ensure_root_bucket(bucket)?;
    let weight = cluster.osd_weight(osd)?;
    cluster.move_osd_to_root(osd, weight, bucket)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::Harness;
    use ceph_exec::{CommandOutput, StaticHandler};

    #[test]
    fn osd_zero_is_moved() {
        let harness = Harness::new();
        let mut handler = StaticHandler::new();
        handler.expect(
            "ceph --id admin osd crush dump --format=json",
            CommandOutput::success().with_stdout(r#"{"buckets":[{"name":"default"}]}"#),
        );
        handler.expect_ok("ceph --id admin osd crush add-bucket ssd root");
        handler.expect(
            "ceph --id admin osd tree --format=json",
            CommandOutput::success().with_stdout(r#"{"nodes":[{"name":"osd.0","crush_weight":1.82}]}"#),
        );
        handler.expect_ok("ceph --id admin osd crush set 0 1.82 root=ssd");
        handler.register(&harness.executor);
        let req = MoveOsdToBucket {
            osd: Some(OsdId::Number(0)),
            bucket: Some("ssd".into()),
        };
        assert_eq!(move_osd_to_bucket(&harness.ctx(), &req).unwrap(), None);
    }

    #[test]
    fn failures_name_the_osd_and_bucket() {
        let harness = Harness::new();
        harness
            .executor
            .set_handler(Box::new(|_argv: &[String]| {
                CommandOutput::failure(1).with_stderr("no quorum")
            }));
        let req = MoveOsdToBucket {
            osd: Some(OsdId::Name("3".into())),
            bucket: Some("ssd".into()),
        };
        let response = move_osd_to_bucket(&harness.ctx(), &req).unwrap().unwrap();
        let stderr = response.stderr.unwrap();
        assert!(stderr.starts_with("Failed to move OSD 3 into Bucket ssd :: "), "{stderr}");
    }

    #[test]
    fn osd_and_bucket_are_required() {
        let harness = Harness::new();
        let req = MoveOsdToBucket {
            osd: Some(OsdId::Name(String::new())),
            bucket: Some("ssd".into()),
        };
        let response = move_osd_to_bucket(&harness.ctx(), &req).unwrap().unwrap();
        assert_eq!(response.stderr.as_deref(), Some("Missing OSD ID or Bucket"));
    }
}
