use serde::Deserialize;
use tracing::info;

use super::Cluster;
use crate::error::{BrokerError, BrokerResult};

#[derive(Deserialize)]
struct CrushDump {
    #[serde(default)]
    buckets: Vec<CrushBucket>,
}

#[derive(Deserialize)]
struct CrushBucket {
    name: String,
}

#[derive(Deserialize)]
struct OsdTree {
    #[serde(default)]
    nodes: Vec<OsdTreeNode>,
}

#[derive(Deserialize)]
struct OsdTreeNode {
    name: String,
    #[serde(default)]
    crush_weight: Option<f64>,
}

impl Cluster {
    pub fn crush_bucket_names(&self) -> BrokerResult<Vec<String>> {
        let output = self.ceph(&["osd", "crush", "dump", "--format=json"])?;
        let dump: CrushDump = serde_json::from_str(&output.stdout)?;
        Ok(dump.buckets.into_iter().map(|b| b.name).collect())
    }

    /// Creates `bucket` as a root of the crush hierarchy unless it exists.
    pub fn ensure_root_bucket(&self, bucket: &str) -> BrokerResult<()> {
        if self.crush_bucket_names()?.iter().any(|name| name == bucket) {
            return Ok(());
        }
        info!(bucket, "adding crush root bucket");
        self.ceph(&["osd", "crush", "add-bucket", bucket, "root"])?;
        Ok(())
    }

    /// Current crush weight of `osd.<id>`.
    pub fn osd_weight(&self, osd_id: &str) -> BrokerResult<f64> {
        let output = self.ceph(&["osd", "tree", "--format=json"])?;
        let tree: OsdTree = serde_json::from_str(&output.stdout)?;
        let name = format!("osd.{osd_id}");
        tree.nodes
            .into_iter()
            .find(|node| node.name == name)
            .and_then(|node| node.crush_weight)
            .ok_or_else(|| BrokerError::Cluster(format!("{name} not found in the osd tree")))
    }

    pub fn move_osd_to_root(&self, osd_id: &str, weight: f64, bucket: &str) -> BrokerResult<()> {
        let root = format!("root={bucket}");
        self.ceph(&["osd", "crush", "set", osd_id, &weight.to_string(), &root])?;
        Ok(())
    }
}
