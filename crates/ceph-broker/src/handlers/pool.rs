use tracing::{debug, info};

use super::{Context, HandlerResult, reject, tool_outcome};
use crate::request::{
    CreatePool, DeletePool, PoolSnapshot, PoolType, RenamePool, SetPoolValue, present,
};
use crate::validate::{pool_key, validate_pool_value};

pub fn create_pool(ctx: &Context<'_>, req: &CreatePool) -> HandlerResult {
    match req.pool_type() {
        PoolType::Replicated => create_replicated_pool(ctx, req),
        PoolType::Erasure => create_erasure_pool(ctx, req),
    }
}

fn create_replicated_pool(ctx: &Context<'_>, req: &CreatePool) -> HandlerResult {
    let (Some(name), Some(replicas)) = (present(&req.name), req.replicas) else {
        return reject("Missing parameter. name and replicas are required");
    };
    let cluster = ctx.cluster;

    // Cap pg_num to the most the cluster can hold.
    let mut pg_num = req.pg_num.filter(|pg| *pg > 0);
    if let Some(requested) = pg_num {
        let osds = cluster.osd_ids()?.len() as u32;
        if osds > 0 {
            pg_num = Some(requested.min(osds * 100 / replicas.max(1)));
        }
    }

    if let Some(group) = present(&req.group) {
        ctx.groups
            .add_pool_to_group(name, group, present(&req.group_namespace))?;
    }

    if cluster.pool_exists(name)? {
        debug!(pool = name, "pool already exists, skipping create");
    } else {
        let pg_num = match pg_num {
            Some(pg_num) => pg_num,
            None => cluster.placement_groups(replicas, weight(req))?,
        };
        info!(pool = name, replicas, "creating pool");
        cluster.create_replicated_pool(name, replicas, pg_num)?;
    }

    if let Some(max_bytes) = req.max_bytes {
        cluster.set_pool_quota(name, max_bytes)?;
    }
    Ok(None)
}

fn create_erasure_pool(ctx: &Context<'_>, req: &CreatePool) -> HandlerResult {
    let Some(name) = present(&req.name) else {
        return reject("Missing parameter. name is required for the pool");
    };
    let cluster = ctx.cluster;
    let profile = present(&req.erasure_profile)
        .unwrap_or(cluster.config().default_erasure_profile.as_str());

    if let Some(group) = present(&req.group) {
        ctx.groups
            .add_pool_to_group(name, group, present(&req.group_namespace))?;
    }

    if !cluster.erasure_profile_exists(profile)? {
        return reject(format!(
            "erasure-profile {profile} does not exist.  Please create it with: create-erasure-profile"
        ));
    }

    if cluster.pool_exists(name)? {
        debug!(pool = name, "pool already exists, skipping create");
    } else {
        let width = cluster.erasure_profile_width(profile)?;
        let pg_num = cluster.placement_groups(width, weight(req))?;
        cluster.create_erasure_pool(name, profile, pg_num)?;
    }

    if let Some(max_bytes) = req.max_bytes {
        cluster.set_pool_quota(name, max_bytes)?;
    }
    Ok(None)
}

/// A zero weight means "not given".
fn weight(req: &CreatePool) -> Option<f64> {
    req.weight.filter(|w| *w > 0.0)
}

pub fn delete_pool(ctx: &Context<'_>, req: &DeletePool) -> HandlerResult {
    let Some(name) = present(&req.name) else {
        return reject("Missing parameter. name is required for the pool");
    };
    tool_outcome(&ctx.cluster.delete_pool(name)?)
}

pub fn rename_pool(ctx: &Context<'_>, req: &RenamePool) -> HandlerResult {
    let (Some(name), Some(new_name)) = (present(&req.name), present(&req.new_name)) else {
        return reject("Missing parameter. name and new-name are required");
    };
    tool_outcome(&ctx.cluster.rename_pool(name, new_name)?)
}

pub fn snapshot_pool(ctx: &Context<'_>, req: &PoolSnapshot) -> HandlerResult {
    let (Some(name), Some(snapshot)) = (present(&req.name), present(&req.snapshot_name)) else {
        return reject("Missing parameter. name and snapshot-name are required");
    };
    tool_outcome(&ctx.cluster.snapshot_pool(name, snapshot)?)
}

pub fn remove_pool_snapshot(ctx: &Context<'_>, req: &PoolSnapshot) -> HandlerResult {
    let (Some(name), Some(snapshot)) = (present(&req.name), present(&req.snapshot_name)) else {
        return reject("Missing parameter. name and snapshot-name are required");
    };
    tool_outcome(&ctx.cluster.remove_pool_snapshot(name, snapshot)?)
}

pub fn set_pool_value(ctx: &Context<'_>, req: &SetPoolValue) -> HandlerResult {
    let Some(key) = req.key.as_deref().and_then(pool_key) else {
        return reject(format!("Invalid key '{}'", req.key.as_deref().unwrap_or("None")));
    };
    let Some(name) = present(&req.name) else {
        return reject("Missing parameter. name is required for the pool");
    };
    let Some(value) = &req.value else {
        return reject(format!("Missing value for '{}'", key.name));
    };
    let rendered = match validate_pool_value(key, value) {
        Ok(rendered) => rendered,
        Err(message) => return reject(message),
    };
    ctx.cluster.set_pool_value(name, key.name, &rendered)?;
    Ok(None)
}
