use crate::{KvError, KvResult, KvStore, Version, Versioned, expected_matches};
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

/// In-memory store; `compare_and_set` is atomic under a single write lock.
#[derive(Clone, Default)]
pub struct MemKvStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl std::fmt::Debug for MemKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemKvStore")
            .field("entries", &self.entries.read().unwrap().len())
            .finish()
    }
}

impl MemKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored value, bypassing any identity scoping.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.read().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl KvStore for MemKvStore {
    fn get(&self, _service: &str, key: &str) -> KvResult<Option<Versioned>> {
        Ok(self.raw(key).map(Versioned::new))
    }

    fn set(&self, _service: &str, key: &str, value: &str) -> KvResult<()> {
        self.entries
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn compare_and_set(
        &self,
        _service: &str,
        key: &str,
        value: &str,
        expected: Option<&Version>,
    ) -> KvResult<Version> {
        let mut guard = self.entries.write().unwrap();
        let current = guard.get(key).cloned().map(Versioned::new);
        if !expected_matches(current.as_ref(), expected) {
            return Err(KvError::Conflict {
                key: key.to_string(),
            });
        }
        guard.insert(key.to_string(), value.to_string());
        Ok(Version::of_value(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_after_set() {
        let store = MemKvStore::new();
        assert_eq!(store.get("admin", "cephx.groups.images").unwrap(), None);
        store.set("admin", "cephx.groups.images", "{}").unwrap();
        let entry = store.get("admin", "cephx.groups.images").unwrap().unwrap();
        assert_eq!(entry.value, "{}");
        assert_eq!(entry.version, Version::of_value("{}"));
        assert_eq!(store.keys(), vec!["cephx.groups.images".to_string()]);
    }

    #[test]
    fn compare_and_set_detects_lost_update() {
        let store = MemKvStore::new();
        let first = store
            .compare_and_set("admin", "k", "one", None)
            .expect("create");

        // A second writer that read the absent key loses.
        let err = store
            .compare_and_set("admin", "k", "two", None)
            .expect_err("stale expectation");
        assert!(err.is_conflict());

        store
            .compare_and_set("admin", "k", "two", Some(&first))
            .expect("fresh expectation");
        assert_eq!(store.raw("k").as_deref(), Some("two"));
    }
}
