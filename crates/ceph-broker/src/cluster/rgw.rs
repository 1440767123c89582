use std::io::Write;

use ceph_exec::CommandOutput;
use tracing::debug;

use super::Cluster;
use crate::error::BrokerResult;

/// Gateway documents uploaded with `radosgw-admin <kind> set --infile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Region,
    Zone,
}

impl UploadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadKind::Region => "region",
            UploadKind::Zone => "zone",
        }
    }
}

impl Cluster {
    /// Writes `document` to a private temporary file and hands it to
    /// `radosgw-admin`. The file is removed when this returns.
    pub fn rgw_upload(
        &self,
        kind: UploadKind,
        document: &str,
        zone: &str,
        client: &str,
    ) -> BrokerResult<CommandOutput> {
        let mut infile = tempfile::Builder::new()
            .prefix(&format!("rgw-{}-", kind.as_str()))
            .suffix(".json")
            .tempfile()?;
        infile.write_all(document.as_bytes())?;
        infile.flush()?;
        let path = infile.path().to_string_lossy().into_owned();
        debug!(kind = kind.as_str(), %path, "uploading gateway document");
        self.radosgw_admin(&[
            kind.as_str(),
            "set",
            "--rgw-zone",
            zone,
            "--infile",
            &path,
            "--name",
            client,
        ])
    }

    pub fn rgw_regionmap_update(&self, client: &str) -> BrokerResult<CommandOutput> {
        self.radosgw_admin(&["regionmap", "update", "--name", client])
    }

    pub fn rgw_regionmap_default(&self, region: &str, client: &str) -> BrokerResult<CommandOutput> {
        self.radosgw_admin(&["regionmap", "default", "--rgw-region", region, "--name", client])
    }

    pub fn rgw_create_user(&self, uid: &str, display_name: &str, client: &str) -> BrokerResult<CommandOutput> {
        self.radosgw_admin(&[
            "user",
            "create",
            "--uid",
            uid,
            "--display-name",
            display_name,
            "--name",
            client,
            "--system",
        ])
    }
}
