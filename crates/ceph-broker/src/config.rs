/// How a batch reacts to a failing op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    /// Run every op; the first op that produced a result mapping decides the
    /// response.
    #[default]
    Compat,
    /// Stop at the first failing op and return its result.
    Strict,
}

#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// cephx identity every cluster command runs as.
    pub service: String,
    pub batch_mode: BatchMode,
    /// Lower bound for the OSD count used in placement-group sizing.
    pub expected_osd_count: Option<u32>,
    /// Target placement groups per OSD.
    pub pgs_per_osd: u32,
    /// Percent of cluster data a pool is expected to hold when the request
    /// carries no weight.
    pub default_pool_weight: f64,
    pub default_erasure_profile: String,
    /// Re-reads attempted after a conflicting group/service update.
    pub kv_conflict_retries: u32,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            service: "admin".into(),
            batch_mode: BatchMode::Compat,
            expected_osd_count: None,
            pgs_per_osd: 100,
            default_pool_weight: 10.0,
            default_erasure_profile: "default-canonical".into(),
            kv_conflict_retries: 3,
        }
    }
}

impl BrokerConfig {
    /// Build a config from `CEPH_BROKER_*` environment variables, falling back
    /// to defaults for unset or malformed values.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(service) = lookup("CEPH_BROKER_SERVICE").filter(|s| !s.is_empty()) {
            config.service = service;
        }
        if lookup("CEPH_BROKER_STRICT").is_some_and(|v| matches!(v.as_str(), "1" | "true" | "yes")) {
            config.batch_mode = BatchMode::Strict;
        }
        if let Some(count) = lookup("CEPH_BROKER_EXPECTED_OSD_COUNT").and_then(|v| v.parse().ok()) {
            config.expected_osd_count = Some(count);
        }
        if let Some(pgs) = lookup("CEPH_BROKER_PGS_PER_OSD").and_then(|v| v.parse().ok()) {
            config.pgs_per_osd = pgs;
        }
        if let Some(retries) = lookup("CEPH_BROKER_KV_RETRIES").and_then(|v| v.parse().ok()) {
            config.kv_conflict_retries = retries;
        }
        config
    }
}
