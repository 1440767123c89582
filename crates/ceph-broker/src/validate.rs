//! Allow-lists and value checks applied before anything reaches the cluster.

use serde_json::Value;

/// Crush bucket types accepted as an erasure profile failure domain.
pub const CEPH_BUCKET_TYPES: &[&str] = &[
    "osd",
    "host",
    "chassis",
    "rack",
    "row",
    "pdu",
    "pod",
    "room",
    "datacenter",
    "region",
    "root",
];

pub const CACHE_MODES: &[&str] = &["writeback", "readonly"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueKind {
    Int,
    Bool,
    Float,
    Str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRange {
    Any,
    Int(i64, i64),
    Float(f64, f64),
    OneOf(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolKey {
    pub name: &'static str,
    pub kind: ValueKind,
    pub range: ValueRange,
}

const fn key(name: &'static str, kind: ValueKind) -> PoolKey {
    PoolKey {
        name,
        kind,
        range: ValueRange::Any,
    }
}

const fn ranged(name: &'static str, kind: ValueKind, range: ValueRange) -> PoolKey {
    PoolKey { name, kind, range }
}

/// Pool tunables settable through `set-pool-value`.
/// See <http://docs.ceph.com/docs/master/rados/operations/pools/>.
pub const POOL_KEYS: &[PoolKey] = &[
    key("size", ValueKind::Int),
    key("min_size", ValueKind::Int),
    key("crash_replay_interval", ValueKind::Int),
    // must not exceed pg_num
    key("pgp_num", ValueKind::Int),
    key("crush_ruleset", ValueKind::Int),
    key("hashpspool", ValueKind::Bool),
    key("nodelete", ValueKind::Bool),
    key("nopgchange", ValueKind::Bool),
    key("nosizechange", ValueKind::Bool),
    key("write_fadvise_dontneed", ValueKind::Bool),
    key("noscrub", ValueKind::Bool),
    key("nodeep-scrub", ValueKind::Bool),
    ranged(
        "hit_set_type",
        ValueKind::Str,
        ValueRange::OneOf(&["bloom", "explicit_hash", "explicit_object"]),
    ),
    ranged("hit_set_count", ValueKind::Int, ValueRange::Int(1, 1)),
    key("hit_set_period", ValueKind::Int),
    ranged("hit_set_fpp", ValueKind::Float, ValueRange::Float(0.0, 1.0)),
    key("cache_target_dirty_ratio", ValueKind::Float),
    key("cache_target_dirty_high_ratio", ValueKind::Float),
    key("cache_target_full_ratio", ValueKind::Float),
    key("target_max_bytes", ValueKind::Int),
    key("target_max_objects", ValueKind::Int),
    key("cache_min_flush_age", ValueKind::Int),
    key("cache_min_evict_age", ValueKind::Int),
    key("fast_read", ValueKind::Bool),
];

pub fn pool_key(name: &str) -> Option<&'static PoolKey> {
    POOL_KEYS.iter().find(|k| k.name == name)
}

pub fn is_bucket_type(name: &str) -> bool {
    CEPH_BUCKET_TYPES.contains(&name)
}

/// Checks `value` against `key`'s type and range and renders it the way the
/// `ceph osd pool set` command line expects.
pub fn validate_pool_value(key: &PoolKey, value: &Value) -> Result<String, String> {
    let rendered = match (key.kind, value) {
        (ValueKind::Bool, Value::Bool(b)) => b.to_string(),
        (ValueKind::Int, Value::Number(n)) if n.is_i64() || n.is_u64() => {
            let int = n
                .as_i64()
                .ok_or_else(|| format!("Value {n} for '{}' is out of range", key.name))?;
            if let ValueRange::Int(min, max) = key.range {
                if int < min || int > max {
                    return Err(format!(
                        "Value {int} for '{}' must be within [{min}, {max}]",
                        key.name
                    ));
                }
            }
            int.to_string()
        }
        (ValueKind::Float, Value::Number(n)) => {
            let float = n
                .as_f64()
                .ok_or_else(|| format!("Value {n} for '{}' is not a number", key.name))?;
            if let ValueRange::Float(min, max) = key.range {
                if float < min || float > max {
                    return Err(format!(
                        "Value {float} for '{}' must be within [{min:?}, {max:?}]",
                        key.name
                    ));
                }
            }
            n.to_string()
        }
        (ValueKind::Str, Value::String(s)) => {
            if let ValueRange::OneOf(allowed) = key.range {
                if !allowed.contains(&s.as_str()) {
                    return Err(format!(
                        "Value '{s}' for '{}' must be one of {allowed:?}",
                        key.name
                    ));
                }
            }
            s.clone()
        }
        (kind, other) => {
            return Err(format!(
                "Value {other} for '{}' is not of type {}",
                key.name,
                kind_label(kind)
            ));
        }
    };
    Ok(rendered)
}

fn kind_label(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Int => "int",
        ValueKind::Bool => "bool",
        ValueKind::Float => "float",
        ValueKind::Str => "str",
    }
}
