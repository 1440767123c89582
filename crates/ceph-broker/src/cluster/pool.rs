use ceph_exec::CommandOutput;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::Cluster;
use crate::error::{BrokerError, BrokerResult};

/// Placement groups used when the cluster cannot report its OSDs.
pub const LEGACY_PG_COUNT: u32 = 200;
pub const MINIMUM_PGS: u32 = 2;

/// Placement-group count for a pool of `pool_size` copies/chunks expected to
/// hold `weight` percent of the data on `osd_count` OSDs, rounded to a power
/// of two (upwards when the nearest lower power is more than 25% off).
pub fn pg_count_for(osd_count: u32, pool_size: u32, weight: f64, pgs_per_osd: u32) -> u32 {
    let pool_size = pool_size.max(1) as f64;
    let raw = (pgs_per_osd as f64 * osd_count as f64 * (weight / 100.0) / pool_size).floor();
    let num_pg = raw.max(MINIMUM_PGS as f64);
    let nearest = 2f64.powf(num_pg.log2().floor());
    if num_pg - nearest > num_pg * 0.25 {
        (nearest * 2.0) as u32
    } else {
        nearest as u32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErasureProfileSpec<'a> {
    pub name: &'a str,
    pub plugin: &'a str,
    pub failure_domain: &'a str,
    pub k: u32,
    pub m: u32,
    pub locality: Option<u32>,
}

#[derive(Deserialize)]
struct OsdDump {
    #[serde(default)]
    pools: Vec<OsdDumpPool>,
}

#[derive(Deserialize)]
struct OsdDumpPool {
    pool_name: String,
    #[serde(default)]
    cache_mode: Option<String>,
}

impl Cluster {
    pub fn pool_exists(&self, name: &str) -> BrokerResult<bool> {
        let output = self.rados(&["lspools"])?;
        Ok(output.stdout.lines().any(|line| line.trim() == name))
    }

    pub fn osd_ids(&self) -> BrokerResult<Vec<u64>> {
        let output = self.ceph(&["osd", "ls", "--format=json"])?;
        if output.stdout.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&output.stdout)?)
    }

    /// Placement groups for a new pool, sized from the live OSD count and
    /// the configured expectations.
    pub fn placement_groups(&self, pool_size: u32, weight: Option<f64>) -> BrokerResult<u32> {
        let config = self.config();
        let weight = weight.unwrap_or(config.default_pool_weight);
        let live = self.osd_ids()?.len() as u32;
        let expected = config.expected_osd_count.unwrap_or(0);
        let osd_count = if live > 0 {
            if expected > 0 && live > expected {
                debug!(expected, live, "more osds than expected, sizing from the live count");
            }
            live.max(expected)
        } else if expected > 0 {
            expected
        } else {
            return Ok(LEGACY_PG_COUNT);
        };
        Ok(pg_count_for(osd_count, pool_size, weight, config.pgs_per_osd))
    }

    pub fn create_replicated_pool(&self, name: &str, replicas: u32, pg_num: u32) -> BrokerResult<()> {
        info!(pool = name, replicas, pg_num, "creating replicated pool");
        self.ceph(&["osd", "pool", "create", name, &pg_num.to_string()])?;
        self.ceph(&["osd", "pool", "set", name, "size", &replicas.to_string()])?;
        Ok(())
    }

    pub fn create_erasure_pool(&self, name: &str, profile: &str, pg_num: u32) -> BrokerResult<()> {
        info!(pool = name, profile, pg_num, "creating erasure pool");
        let pgs = pg_num.to_string();
        self.ceph(&["osd", "pool", "create", name, &pgs, &pgs, "erasure", profile])?;
        Ok(())
    }

    pub fn set_pool_quota(&self, pool: &str, max_bytes: u64) -> BrokerResult<()> {
        self.ceph(&[
            "osd",
            "pool",
            "set-quota",
            pool,
            "max_bytes",
            &max_bytes.to_string(),
        ])?;
        Ok(())
    }

    pub fn set_pool_value(&self, pool: &str, key: &str, value: &str) -> BrokerResult<()> {
        self.ceph(&["osd", "pool", "set", pool, key, value])?;
        Ok(())
    }

    pub fn erasure_profile_exists(&self, name: &str) -> BrokerResult<bool> {
        let output = self.ceph_unchecked(&["osd", "erasure-code-profile", "get", name])?;
        Ok(output.is_success())
    }

    /// Data plus coding chunks of an existing profile.
    pub fn erasure_profile_width(&self, name: &str) -> BrokerResult<u32> {
        let output = self.ceph(&["osd", "erasure-code-profile", "get", name, "--format=json"])?;
        let profile: Value = serde_json::from_str(&output.stdout)?;
        let chunk = |field: &str| -> BrokerResult<u32> {
            let value = profile.get(field).ok_or_else(|| {
                BrokerError::Cluster(format!("erasure profile {name} has no '{field}'"))
            })?;
            value
                .as_u64()
                .map(|v| v as u32)
                .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
                .ok_or_else(|| {
                    BrokerError::Cluster(format!("erasure profile {name} has invalid '{field}': {value}"))
                })
        };
        Ok(chunk("k")? + chunk("m")?)
    }

    pub fn create_erasure_profile(&self, spec: &ErasureProfileSpec<'_>) -> BrokerResult<()> {
        let plugin = format!("plugin={}", spec.plugin);
        let k = format!("k={}", spec.k);
        let m = format!("m={}", spec.m);
        let domain = format!("ruleset-failure-domain={}", spec.failure_domain);
        let locality = spec.locality.map(|l| format!("l={l}"));
        let mut args = vec![
            "osd",
            "erasure-code-profile",
            "set",
            spec.name,
            plugin.as_str(),
            k.as_str(),
            m.as_str(),
            domain.as_str(),
        ];
        if let Some(locality) = locality.as_deref() {
            args.push(locality);
        }
        info!(profile = spec.name, "creating erasure profile");
        self.ceph(&args)?;
        Ok(())
    }

    pub fn delete_pool(&self, name: &str) -> BrokerResult<CommandOutput> {
        self.ceph_unchecked(&[
            "osd",
            "pool",
            "delete",
            name,
            name,
            "--yes-i-really-really-mean-it",
        ])
    }

    pub fn rename_pool(&self, old_name: &str, new_name: &str) -> BrokerResult<CommandOutput> {
        self.ceph_unchecked(&["osd", "pool", "rename", old_name, new_name])
    }

    pub fn snapshot_pool(&self, pool: &str, snapshot: &str) -> BrokerResult<CommandOutput> {
        self.ceph_unchecked(&["osd", "pool", "mksnap", pool, snapshot])
    }

    pub fn remove_pool_snapshot(&self, pool: &str, snapshot: &str) -> BrokerResult<CommandOutput> {
        self.ceph_unchecked(&["osd", "pool", "rmsnap", pool, snapshot])
    }

    pub fn add_cache_tier(&self, pool: &str, cache_pool: &str, mode: &str) -> BrokerResult<()> {
        info!(pool, cache_pool, mode, "adding cache tier");
        self.ceph(&["osd", "tier", "add", pool, cache_pool])?;
        self.ceph(&["osd", "tier", "cache-mode", cache_pool, mode])?;
        self.ceph(&["osd", "tier", "set-overlay", pool, cache_pool])?;
        self.ceph(&["osd", "pool", "set", cache_pool, "hit_set_type", "bloom"])?;
        Ok(())
    }

    pub fn cache_mode(&self, pool: &str) -> BrokerResult<Option<String>> {
        let output = self.ceph(&["osd", "dump", "--format=json"])?;
        let dump: OsdDump = serde_json::from_str(&output.stdout)?;
        Ok(dump
            .pools
            .into_iter()
            .find(|p| p.pool_name == pool)
            .and_then(|p| p.cache_mode))
    }

    pub fn remove_cache_tier(&self, pool: &str, cache_pool: &str) -> BrokerResult<()> {
        match self.cache_mode(cache_pool)?.as_deref() {
            Some("readonly") => {
                self.ceph(&["osd", "tier", "cache-mode", cache_pool, "none"])?;
                self.ceph(&["osd", "tier", "remove", pool, cache_pool])?;
            }
            Some("writeback") => {
                self.ceph(&["osd", "tier", "cache-mode", cache_pool, "forward"])?;
                // Flush the cache and wait for it to return.
                self.rados(&["-p", cache_pool, "cache-flush-evict-all"])?;
                self.ceph(&["osd", "tier", "remove-overlay", pool])?;
                self.ceph(&["osd", "tier", "remove", pool, cache_pool])?;
            }
            other => {
                warn!(pool, cache_pool, mode = ?other, "no cache tier in a removable mode");
            }
        }
        Ok(())
    }

    /// Names of existing filesystems; empty when the query fails.
    pub fn cephfs_names(&self) -> BrokerResult<Vec<String>> {
        let output = self.ceph_unchecked(&["fs", "ls"])?;
        if !output.is_success() {
            return Ok(Vec::new());
        }
        // name: ceph-fs, metadata pool: ceph-fs_metadata, data pools: [ceph-fs_data ]
        Ok(output
            .stdout
            .lines()
            .filter_map(|line| line.trim().strip_prefix("name:"))
            .filter_map(|rest| rest.split(',').next())
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect())
    }

    pub fn create_cephfs(&self, name: &str, metadata_pool: &str, data_pool: &str) -> BrokerResult<CommandOutput> {
        info!(name, metadata_pool, data_pool, "creating cephfs");
        self.ceph_unchecked(&["fs", "new", name, metadata_pool, data_pool])
    }

    /// Replaces the capabilities of `client.<client>`.
    pub fn auth_caps(&self, client: &str, caps: &[String]) -> BrokerResult<()> {
        let mut argv = vec![
            "ceph".to_string(),
            "auth".to_string(),
            "caps".to_string(),
            format!("client.{client}"),
        ];
        argv.extend(caps.iter().cloned());
        self.executor().execute(&argv)?;
        Ok(())
    }
}
