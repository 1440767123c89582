use tracing::info;

use super::{Context, HandlerResult, reject};
use crate::groups::{DEFAULT_PERMISSION, GroupStore};
use crate::request::{AddPermissionsToKey, present};

/// Grants a cephx key access to every pool of a (namespaced) group and
/// rewrites the key's capabilities to match.
pub fn add_permissions_to_key(ctx: &Context<'_>, req: &AddPermissionsToKey) -> HandlerResult {
    let (Some(name), Some(group)) = (present(&req.name), present(&req.group)) else {
        return reject("Missing parameter. name and group are required");
    };
    let namespace = present(&req.group_namespace);
    let permission = present(&req.group_permission).unwrap_or(DEFAULT_PERMISSION);

    let service = ctx
        .groups
        .grant_group_to_service(name, group, namespace, permission)?;
    info!(service = name, group, permission, "granted group to service");

    let caps = GroupStore::recompute_capabilities(&service);
    if let Err(err) = ctx.groups.apply_capabilities(name, &caps) {
        return reject(format!("Error updating key capabilities: {err}"));
    }
    Ok(None)
}
