//! Typed broker requests.
//!
//! Every op is a variant of [`Request`], tagged by the `op` field. Fields use
//! the wire names clients already send; most are optional so handlers can
//! report missing parameters with their own messages.

use serde::Deserialize;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Request {
    CreatePool(CreatePool),
    CreateCephfs(CreateCephfs),
    CreateCacheTier(CreateCacheTier),
    RemoveCacheTier(RemoveCacheTier),
    CreateErasureProfile(CreateErasureProfile),
    DeletePool(DeletePool),
    RenamePool(RenamePool),
    SnapshotPool(PoolSnapshot),
    RemovePoolSnapshot(PoolSnapshot),
    SetPoolValue(SetPoolValue),
    RgwRegionSet(RgwRegionSet),
    RgwZoneSet(RgwZoneSet),
    RgwRegionmapUpdate(RgwRegionmapUpdate),
    RgwRegionmapDefault(RgwRegionmapDefault),
    RgwCreateUser(RgwCreateUser),
    MoveOsdToBucket(MoveOsdToBucket),
    AddPermissionsToKey(AddPermissionsToKey),
}

impl Request {
    pub const OPS: &'static [&'static str] = &[
        "create-pool",
        "create-cephfs",
        "create-cache-tier",
        "remove-cache-tier",
        "create-erasure-profile",
        "delete-pool",
        "rename-pool",
        "snapshot-pool",
        "remove-pool-snapshot",
        "set-pool-value",
        "rgw-region-set",
        "rgw-zone-set",
        "rgw-regionmap-update",
        "rgw-regionmap-default",
        "rgw-create-user",
        "move-osd-to-bucket",
        "add-permissions-to-key",
    ];

    /// Decode one op. Unknown op names are distinguished from malformed
    /// fields of a known op.
    pub fn decode(value: &Value) -> Result<Self, RequestDecodeError> {
        let op = match value.get("op") {
            Some(Value::String(op)) => op.clone(),
            Some(other) => return Err(RequestDecodeError::UnknownOp(other.to_string())),
            None => return Err(RequestDecodeError::UnknownOp(String::new())),
        };
        if !Self::OPS.contains(&op.as_str()) {
            return Err(RequestDecodeError::UnknownOp(op));
        }
        Self::deserialize(value).map_err(|err| RequestDecodeError::Invalid {
            op,
            detail: err.to_string(),
        })
    }

    pub fn op(&self) -> &'static str {
        match self {
            Request::CreatePool(_) => "create-pool",
            Request::CreateCephfs(_) => "create-cephfs",
            Request::CreateCacheTier(_) => "create-cache-tier",
            Request::RemoveCacheTier(_) => "remove-cache-tier",
            Request::CreateErasureProfile(_) => "create-erasure-profile",
            Request::DeletePool(_) => "delete-pool",
            Request::RenamePool(_) => "rename-pool",
            Request::SnapshotPool(_) => "snapshot-pool",
            Request::RemovePoolSnapshot(_) => "remove-pool-snapshot",
            Request::SetPoolValue(_) => "set-pool-value",
            Request::RgwRegionSet(_) => "rgw-region-set",
            Request::RgwZoneSet(_) => "rgw-zone-set",
            Request::RgwRegionmapUpdate(_) => "rgw-regionmap-update",
            Request::RgwRegionmapDefault(_) => "rgw-regionmap-default",
            Request::RgwCreateUser(_) => "rgw-create-user",
            Request::MoveOsdToBucket(_) => "move-osd-to-bucket",
            Request::AddPermissionsToKey(_) => "add-permissions-to-key",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestDecodeError {
    #[error("Unknown operation '{0}'")]
    UnknownOp(String),
    #[error("Invalid request for op '{op}': {detail}")]
    Invalid { op: String, detail: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolType {
    Erasure,
    #[default]
    #[serde(other)]
    Replicated,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CreatePool {
    #[serde(default)]
    pub pool_type: Option<PoolType>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub replicas: Option<u32>,
    #[serde(default, rename = "pg_num")]
    pub pg_num: Option<u32>,
    /// Percent of cluster data the pool is expected to hold.
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub max_bytes: Option<u64>,
    #[serde(default)]
    pub erasure_profile: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub group_namespace: Option<String>,
}

impl CreatePool {
    pub fn pool_type(&self) -> PoolType {
        self.pool_type.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CreateCephfs {
    #[serde(default)]
    pub mds_name: Option<String>,
    #[serde(default)]
    pub data_pool: Option<String>,
    #[serde(default)]
    pub metadata_pool: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CreateCacheTier {
    #[serde(default)]
    pub cold_pool: Option<String>,
    #[serde(default)]
    pub hot_pool: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RemoveCacheTier {
    #[serde(default)]
    pub cold_pool: Option<String>,
    #[serde(default)]
    pub hot_pool: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CreateErasureProfile {
    #[serde(default)]
    pub name: Option<String>,
    /// Plugin name; `jerasure` when absent.
    #[serde(default)]
    pub erasure_type: Option<String>,
    #[serde(default)]
    pub failure_domain: Option<String>,
    #[serde(default)]
    pub k: Option<u32>,
    #[serde(default)]
    pub m: Option<u32>,
    #[serde(default)]
    pub l: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DeletePool {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RenamePool {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub new_name: Option<String>,
}

/// Shared by snapshot-pool and remove-pool-snapshot.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PoolSnapshot {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub snapshot_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct SetPoolValue {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RgwRegionSet {
    #[serde(default)]
    pub region_json: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub region_name: Option<String>,
    #[serde(default)]
    pub zone_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RgwZoneSet {
    #[serde(default)]
    pub zone_json: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub region_name: Option<String>,
    #[serde(default)]
    pub zone_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RgwRegionmapUpdate {
    #[serde(default)]
    pub client_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RgwRegionmapDefault {
    #[serde(default)]
    pub rgw_region: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RgwCreateUser {
    #[serde(default)]
    pub rgw_uid: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
}

/// OSDs are addressed by number, but clients sometimes send the id as a string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OsdId {
    Number(u64),
    Name(String),
}

impl fmt::Display for OsdId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsdId::Number(id) => write!(f, "{id}"),
            OsdId::Name(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct MoveOsdToBucket {
    #[serde(default)]
    pub osd: Option<OsdId>,
    #[serde(default)]
    pub bucket: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AddPermissionsToKey {
    /// cephx identity receiving the grant.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub group_namespace: Option<String>,
    /// Permission level; `rwx` when absent.
    #[serde(default)]
    pub group_permission: Option<String>,
}

/// Treats empty strings like absent values, as clients send both.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_listed_op_decodes() {
        for op in Request::OPS {
            let request = Request::decode(&json!({ "op": op })).expect(op);
            assert_eq!(request.op(), *op);
        }
    }

    #[test]
    fn pool_type_defaults_to_replicated() {
        let Request::CreatePool(req) = Request::decode(&json!({
            "op": "create-pool", "name": "glance", "replicas": 3, "pool-type": "fancy"
        }))
        .unwrap() else {
            panic!("expected create-pool");
        };
        assert_eq!(req.pool_type(), PoolType::Replicated);
        assert_eq!(req.replicas, Some(3));

        let Request::CreatePool(req) = Request::decode(&json!({
            "op": "create-pool", "name": "ec", "pool-type": "erasure", "erasure-profile": "p"
        }))
        .unwrap() else {
            panic!("expected create-pool");
        };
        assert_eq!(req.pool_type(), PoolType::Erasure);
        assert_eq!(req.erasure_profile.as_deref(), Some("p"));
    }

    #[test]
    fn unknown_and_invalid_ops_are_distinguished() {
        assert_eq!(
            Request::decode(&json!({"op": "frobnicate"})),
            Err(RequestDecodeError::UnknownOp("frobnicate".into()))
        );
        assert!(matches!(
            Request::decode(&json!({"op": "create-pool", "replicas": "three"})),
            Err(RequestDecodeError::Invalid { .. })
        ));
    }

    #[test]
    fn osd_id_accepts_numbers_and_strings() {
        let Request::MoveOsdToBucket(req) =
            Request::decode(&json!({"op": "move-osd-to-bucket", "osd": 0, "bucket": "ssd"})).unwrap()
        else {
            panic!("expected move-osd-to-bucket");
        };
        assert_eq!(req.osd, Some(OsdId::Number(0)));
        let Request::MoveOsdToBucket(req) =
            Request::decode(&json!({"op": "move-osd-to-bucket", "osd": "7"})).unwrap()
        else {
            panic!("expected move-osd-to-bucket");
        };
        assert_eq!(req.osd.map(|id| id.to_string()).as_deref(), Some("7"));
    }
}
