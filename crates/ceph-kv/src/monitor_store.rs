use crate::{KvError, KvResult, KvStore, Version, Versioned, expected_matches};
use ceph_exec::{BoxedExecutor, argv};
use std::fmt;
use tracing::debug;

/// Store backed by the monitor cluster's `config-key` service.
///
/// The monitors offer no conditional write: `compare_and_set` re-reads the
/// key right before writing, so a writer landing between the two commands
/// goes undetected.
#[derive(Clone)]
pub struct MonitorKvStore {
    executor: BoxedExecutor,
}

impl fmt::Debug for MonitorKvStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorKvStore").finish_non_exhaustive()
    }
}

impl MonitorKvStore {
    pub fn new(executor: BoxedExecutor) -> Self {
        Self { executor }
    }
}

impl KvStore for MonitorKvStore {
    fn get(&self, service: &str, key: &str) -> KvResult<Option<Versioned>> {
        let output = self
            .executor
            .run(&argv(["ceph", "--id", service, "config-key", "get", key]))?;
        if !output.is_success() {
            debug!(key, status = ?output.status, "monitor key not readable, treating as absent");
            return Ok(None);
        }
        Ok(Some(Versioned::new(output.stdout.trim())))
    }

    fn set(&self, service: &str, key: &str, value: &str) -> KvResult<()> {
        self.executor.execute(&argv([
            "ceph",
            "--id",
            service,
            "config-key",
            "put",
            key,
            value,
        ]))?;
        Ok(())
    }

    fn compare_and_set(
        &self,
        service: &str,
        key: &str,
        value: &str,
        expected: Option<&Version>,
    ) -> KvResult<Version> {
        let current = self.get(service, key)?;
        if !expected_matches(current.as_ref(), expected) {
            return Err(KvError::Conflict {
                key: key.to_string(),
            });
        }
        self.set(service, key, value)?;
        Ok(Version::of_value(value))
    }
}
