//! Permission groups and the services granted access to them.
//!
//! Groups live under `cephx.groups.<name>` and services under
//! `cephx.services.<name>`, both as JSON documents in the cluster key/value
//! store. A service's `groups` view is rebuilt on every read and is never
//! written back; the stored document always carries `"groups": {}`.

use std::sync::Arc;

use ceph_kv::DynKvStore;
use indexmap::IndexMap;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, warn};

use crate::cluster::Cluster;
use crate::error::BrokerResult;

/// Permission level granted when a request names none.
pub const DEFAULT_PERMISSION: &str = "rwx";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub pools: Vec<String>,
    #[serde(default)]
    pub services: Vec<String>,
}

impl Group {
    /// Returns `false` if the pool was already a member.
    pub fn add_pool(&mut self, pool: &str) -> bool {
        push_unique(&mut self.pools, pool)
    }

    pub fn add_service(&mut self, service: &str) -> bool {
        push_unique(&mut self.services, service)
    }
}

/// The persisted part of a service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// Permission level to group names, in grant order.
    #[serde(default)]
    pub group_names: IndexMap<String, Vec<String>>,
    #[serde(default)]
    groups: DerivedGroups,
}

impl ServiceRecord {
    pub fn grant(&mut self, permission: &str, group: &str) -> bool {
        let names = self.group_names.entry(permission.to_string()).or_default();
        push_unique(names, group)
    }

    /// Every referenced group name, in level then grant order.
    pub fn referenced_groups(&self) -> impl Iterator<Item = &str> {
        self.group_names.values().flatten().map(String::as_str)
    }
}

/// Placeholder for the derived `groups` view in the stored document.
/// Always written as `{}`; whatever was stored is ignored on read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct DerivedGroups;

impl Serialize for DerivedGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        serializer.serialize_map(Some(0))?.end()
    }
}

impl<'de> Deserialize<'de> for DerivedGroups {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        IgnoredAny::deserialize(deserializer)?;
        Ok(DerivedGroups)
    }
}

/// A service record together with the groups it references, keyed by the
/// names listed in the record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Service {
    pub name: String,
    pub record: ServiceRecord,
    pub groups: IndexMap<String, Group>,
}

pub fn group_key(name: &str) -> String {
    format!("cephx.groups.{name}")
}

pub fn service_key(name: &str) -> String {
    format!("cephx.services.{name}")
}

/// `"{namespace}-{group}"`, unless `group` already carries that prefix.
pub fn namespaced(group: &str, namespace: Option<&str>) -> String {
    match namespace.filter(|ns| !ns.is_empty()) {
        Some(ns) if !group.starts_with(&format!("{ns}-")) => format!("{ns}-{group}"),
        _ => group.to_string(),
    }
}

pub struct GroupStore {
    kv: DynKvStore,
    cluster: Arc<Cluster>,
}

impl GroupStore {
    pub fn new(kv: DynKvStore, cluster: Arc<Cluster>) -> Self {
        Self { kv, cluster }
    }

    fn identity(&self) -> &str {
        self.cluster.service()
    }

    fn read<T: DeserializeOwned + Default>(&self, key: &str) -> BrokerResult<T> {
        Ok(self
            .kv
            .get(self.identity(), key)?
            .map(|stored| decode_or_default(key, &stored.value))
            .unwrap_or_default())
    }

    /// Read-modify-write of one document, re-reading on conflict.
    fn update<T, F>(&self, key: &str, mut mutate: F) -> BrokerResult<T>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnMut(&mut T),
    {
        let retries = self.cluster.config().kv_conflict_retries;
        let mut attempt = 0;
        loop {
            let current = self.kv.get(self.identity(), key)?;
            let mut doc: T = current
                .as_ref()
                .map(|stored| decode_or_default(key, &stored.value))
                .unwrap_or_default();
            mutate(&mut doc);
            let encoded = serde_json::to_string(&doc)?;
            let expected = current.as_ref().map(|stored| &stored.version);
            match self.kv.compare_and_set(self.identity(), key, &encoded, expected) {
                Ok(_) => return Ok(doc),
                Err(err) if err.is_conflict() && attempt < retries => {
                    attempt += 1;
                    debug!(key, attempt, "conflicting update, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// The named group, empty when absent or undecodable.
    pub fn get_group(&self, name: &str) -> BrokerResult<Group> {
        self.read(&group_key(name))
    }

    pub fn save_group(&self, group: &Group, name: &str) -> BrokerResult<()> {
        let value = serde_json::to_string(group)?;
        self.kv.set(self.identity(), &group_key(name), &value)?;
        Ok(())
    }

    pub fn update_group(&self, name: &str, mutate: impl FnMut(&mut Group)) -> BrokerResult<Group> {
        self.update(&group_key(name), mutate)
    }

    /// The named service with its `groups` view resolved. Records hold
    /// group names already namespaced, so each is looked up as written.
    pub fn get_service(&self, name: &str) -> BrokerResult<Service> {
        let record: ServiceRecord = self.read(&service_key(name))?;
        self.resolve(name, record)
    }

    fn resolve(&self, name: &str, record: ServiceRecord) -> BrokerResult<Service> {
        let mut groups = IndexMap::new();
        for group in record.referenced_groups() {
            if !groups.contains_key(group) {
                groups.insert(group.to_string(), self.get_group(group)?);
            }
        }
        Ok(Service {
            name: name.to_string(),
            record,
            groups,
        })
    }

    pub fn save_service(&self, name: &str, record: &ServiceRecord) -> BrokerResult<()> {
        let value = serde_json::to_string(record)?;
        self.kv.set(self.identity(), &service_key(name), &value)?;
        Ok(())
    }

    pub fn update_service(
        &self,
        name: &str,
        mutate: impl FnMut(&mut ServiceRecord),
    ) -> BrokerResult<ServiceRecord> {
        self.update(&service_key(name), mutate)
    }

    /// `["mon", "allow r", "osd", "allow <perm> pool=<pool>, ..."]` for every
    /// pool of every group the service holds, in grant order.
    pub fn recompute_capabilities(service: &Service) -> Vec<String> {
        let mut grants = Vec::new();
        for (permission, groups) in &service.record.group_names {
            for group in groups {
                let Some(group) = service.groups.get(group) else {
                    continue;
                };
                for pool in &group.pools {
                    grants.push(format!("allow {permission} pool={pool}"));
                }
            }
        }
        vec![
            "mon".to_string(),
            "allow r".to_string(),
            "osd".to_string(),
            grants.join(", "),
        ]
    }

    pub fn apply_capabilities(&self, service: &str, caps: &[String]) -> BrokerResult<()> {
        debug!(service, ?caps, "applying key capabilities");
        self.cluster.auth_caps(service, caps)
    }

    /// Recomputes and applies the capabilities of `service`.
    pub fn refresh_capabilities(&self, service: &str) -> BrokerResult<()> {
        let service = self.get_service(service)?;
        self.apply_capabilities(&service.name, &Self::recompute_capabilities(&service))
    }

    /// Adds `pool` to the (namespaced) group and re-applies the capabilities
    /// of every member service. Capability failures are logged only.
    pub fn add_pool_to_group(
        &self,
        pool: &str,
        group: &str,
        namespace: Option<&str>,
    ) -> BrokerResult<()> {
        let name = namespaced(group, namespace);
        let group = self.update_group(&name, |g| {
            g.add_pool(pool);
        })?;
        for service in &group.services {
            if let Err(err) = self.refresh_capabilities(service) {
                warn!(service = %service, group = %name, "Error updating key capabilities: {err}");
            }
        }
        Ok(())
    }

    /// Enrolls `service` in the (namespaced) group at `permission` and
    /// returns the updated service. Capabilities are not applied.
    pub fn grant_group_to_service(
        &self,
        service: &str,
        group: &str,
        namespace: Option<&str>,
        permission: &str,
    ) -> BrokerResult<Service> {
        let name = namespaced(group, namespace);
        self.update_group(&name, |g| {
            g.add_service(service);
        })?;
        let record = self.update_service(service, |record| {
            record.grant(permission, &name);
        })?;
        self.resolve(service, record)
    }
}

fn push_unique(items: &mut Vec<String>, item: &str) -> bool {
    if items.iter().any(|existing| existing == item) {
        return false;
    }
    items.push(item.to_string());
    true
}

fn decode_or_default<T: DeserializeOwned + Default>(key: &str, value: &str) -> T {
    match serde_json::from_str(value) {
        Ok(doc) => doc,
        Err(err) => {
            if !value.trim().is_empty() {
                warn!(key, "ignoring undecodable document: {err}");
            }
            T::default()
        }
    }
}
