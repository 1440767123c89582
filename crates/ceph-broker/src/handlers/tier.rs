use super::{Context, HandlerResult, label, reject};
use crate::request::{CreateCacheTier, RemoveCacheTier, present};
use crate::validate::CACHE_MODES;

/// Both pools, when both were named and exist.
fn existing_pair<'r>(
    ctx: &Context<'_>,
    cold: Option<&'r str>,
    hot: Option<&'r str>,
) -> crate::error::BrokerResult<Option<(&'r str, &'r str)>> {
    let (Some(cold), Some(hot)) = (cold, hot) else {
        return Ok(None);
    };
    if ctx.cluster.pool_exists(cold)? && ctx.cluster.pool_exists(hot)? {
        Ok(Some((cold, hot)))
    } else {
        Ok(None)
    }
}

pub fn create_cache_tier(ctx: &Context<'_>, req: &CreateCacheTier) -> HandlerResult {
    let cold = present(&req.cold_pool);
    let hot = present(&req.hot_pool);
    let mode = present(&req.mode).unwrap_or("writeback");
    if !CACHE_MODES.contains(&mode) {
        return reject(format!("mode must be one of {CACHE_MODES:?}"));
    }
    let Some((cold, hot)) = existing_pair(ctx, cold, hot)? else {
        return reject(format!(
            "cold-pool: {} and hot-pool: {} must exist. Please create them first",
            label(cold),
            label(hot)
        ));
    };
    ctx.cluster.add_cache_tier(cold, hot, mode)?;
    Ok(None)
}

pub fn remove_cache_tier(ctx: &Context<'_>, req: &RemoveCacheTier) -> HandlerResult {
    let cold = present(&req.cold_pool);
    let hot = present(&req.hot_pool);
    let Some((cold, hot)) = existing_pair(ctx, cold, hot)? else {
        return reject(format!(
            "cold-pool: {} or hot-pool: {} doesn't exist. Not deleting cache tier",
            label(cold),
            label(hot)
        ));
    };
    ctx.cluster.remove_cache_tier(cold, hot)?;
    Ok(None)
}
