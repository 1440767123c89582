use serde_json::Value;

use super::{Context, HandlerResult, reject, tool_outcome};
use crate::cluster::UploadKind;
use crate::envelope::Response;
use crate::request::{
    RgwCreateUser, RgwRegionSet, RgwRegionmapDefault, RgwRegionmapUpdate, RgwZoneSet, present,
};

const MISSING_DOCUMENT: &str = "Missing json-file or client-name params";
const MISSING_REGION: &str = "Missing rgw-region or client-name params";

pub fn region_set(ctx: &Context<'_>, req: &RgwRegionSet) -> HandlerResult {
    let (Some(document), Some(client), Some(_region), Some(zone)) = (
        present(&req.region_json),
        present(&req.client_name),
        present(&req.region_name),
        present(&req.zone_name),
    ) else {
        return reject(MISSING_DOCUMENT);
    };
    tool_outcome(&ctx.cluster.rgw_upload(UploadKind::Region, document, zone, client)?)
}

pub fn zone_set(ctx: &Context<'_>, req: &RgwZoneSet) -> HandlerResult {
    let (Some(document), Some(client), Some(_region), Some(zone)) = (
        present(&req.zone_json),
        present(&req.client_name),
        present(&req.region_name),
        present(&req.zone_name),
    ) else {
        return reject(MISSING_DOCUMENT);
    };
    tool_outcome(&ctx.cluster.rgw_upload(UploadKind::Zone, document, zone, client)?)
}

pub fn regionmap_update(ctx: &Context<'_>, req: &RgwRegionmapUpdate) -> HandlerResult {
    let Some(client) = present(&req.client_name) else {
        return reject(MISSING_REGION);
    };
    tool_outcome(&ctx.cluster.rgw_regionmap_update(client)?)
}

pub fn regionmap_default(ctx: &Context<'_>, req: &RgwRegionmapDefault) -> HandlerResult {
    let (Some(region), Some(client)) = (present(&req.rgw_region), present(&req.client_name)) else {
        return reject(MISSING_REGION);
    };
    tool_outcome(&ctx.cluster.rgw_regionmap_default(region, client)?)
}

/// Creates a system user and echoes the gateway's description of it.
pub fn create_user(ctx: &Context<'_>, req: &RgwCreateUser) -> HandlerResult {
    let (Some(uid), Some(display_name), Some(client)) = (
        present(&req.rgw_uid),
        present(&req.display_name),
        present(&req.client_name),
    ) else {
        return reject("Missing client-name, display-name or rgw-uid");
    };
    let output = ctx.cluster.rgw_create_user(uid, display_name, client)?;
    if !output.is_success() {
        return tool_outcome(&output);
    }
    match serde_json::from_str::<Value>(&output.stdout) {
        Ok(user) => Ok(Some(Response::success().with_field("user", user))),
        Err(err) => reject(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::Harness;
    use ceph_exec::{CommandOutput, StaticHandler};
    use serde_json::json;

    fn user_request() -> RgwCreateUser {
        RgwCreateUser {
            rgw_uid: Some("sync".into()),
            display_name: Some("Sync User".into()),
            client_name: Some("client.rgw.east".into()),
        }
    }

    #[test]
    fn created_user_is_echoed() {
        let harness = Harness::new();
        let mut handler = StaticHandler::new();
        handler.expect(
            "radosgw-admin --id admin user create --uid sync --display-name Sync User --name client.rgw.east --system",
            CommandOutput::success().with_stdout(r#"{"user_id":"sync","keys":[]}"#),
        );
        handler.register(&harness.executor);
        let response = create_user(&harness.ctx(), &user_request()).unwrap().unwrap();
        assert_eq!(response.exit_code, 0);
        assert_eq!(response.fields["user"], json!({"user_id": "sync", "keys": []}));
    }

    #[test]
    fn undecodable_user_is_a_failure() {
        let harness = Harness::new();
        harness
            .executor
            .set_handler(Box::new(|_argv: &[String]| {
                CommandOutput::success().with_stdout("not json")
            }));
        let response = create_user(&harness.ctx(), &user_request()).unwrap().unwrap();
        assert_eq!(response.exit_code, 1);
        assert!(response.stderr.is_some());
    }

    #[test]
    fn documents_need_every_name() {
        let harness = Harness::new();
        let req = RgwZoneSet {
            zone_json: Some("{}".into()),
            client_name: Some("client.rgw".into()),
            region_name: None,
            zone_name: Some("east".into()),
        };
        let response = zone_set(&harness.ctx(), &req).unwrap().unwrap();
        assert_eq!(response.stderr.as_deref(), Some(MISSING_DOCUMENT));
        assert!(harness.executor.invocations().is_empty());
    }

    #[test]
    fn regionmap_commands() {
        let harness = Harness::new();
        let mut handler = StaticHandler::new();
        handler.expect_ok("radosgw-admin --id admin regionmap update --name client.rgw");
        handler.expect(
            "radosgw-admin --id admin regionmap default --rgw-region us --name client.rgw",
            CommandOutput::failure(1).with_stdout("failed to init regionmap"),
        );
        handler.register(&harness.executor);
        let ctx = harness.ctx();
        let update = RgwRegionmapUpdate {
            client_name: Some("client.rgw".into()),
        };
        assert_eq!(regionmap_update(&ctx, &update).unwrap(), None);
        let default = RgwRegionmapDefault {
            rgw_region: Some("us".into()),
            client_name: Some("client.rgw".into()),
        };
        let response = regionmap_default(&ctx, &default).unwrap().unwrap();
        assert_eq!(response.stderr.as_deref(), Some("failed to init regionmap"));
    }
}
