//! Cluster key/value storage abstractions plus monitor-backed and in-memory
//! backends.

mod mem_store;
mod monitor_store;

pub use mem_store::MemKvStore;
pub use monitor_store::MonitorKvStore;

use sha2::{Digest, Sha256};
use std::{fmt, sync::Arc};

pub type KvResult<T> = Result<T, KvError>;
pub type DynKvStore = Arc<dyn KvStore>;

/// Trait implemented by all key/value backends.
///
/// `service` is the cephx identity the operation authenticates as.
pub trait KvStore: Send + Sync {
    fn get(&self, service: &str, key: &str) -> KvResult<Option<Versioned>>;

    /// Unconditional overwrite.
    fn set(&self, service: &str, key: &str, value: &str) -> KvResult<()>;

    /// Writes `value` only if the current version of `key` is `expected`
    /// (`None` meaning "absent"). Returns the version of the written value,
    /// or [`KvError::Conflict`] when the stored value moved underneath.
    fn compare_and_set(
        &self,
        service: &str,
        key: &str,
        value: &str,
        expected: Option<&Version>,
    ) -> KvResult<Version>;
}

/// Content version of a stored value (hex SHA-256 of the value).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Version(String);

impl Version {
    pub fn of_value(value: &str) -> Self {
        Self(hex::encode(Sha256::digest(value.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Versioned {
    pub value: String,
    pub version: Version,
}

impl Versioned {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let version = Version::of_value(&value);
        Self { value, version }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum KvError {
    #[error("key/value command failed: {0}")]
    Exec(#[from] ceph_exec::ExecutionError),
    #[error("conflicting update of '{key}'")]
    Conflict { key: String },
}

impl KvError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, KvError::Conflict { .. })
    }
}

pub(crate) fn expected_matches(current: Option<&Versioned>, expected: Option<&Version>) -> bool {
    match (current, expected) {
        (None, None) => true,
        (Some(current), Some(expected)) => &current.version == expected,
        _ => false,
    }
}
