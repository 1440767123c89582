use tracing::info;

use super::{Context, HandlerResult, reject, tool_outcome};
use crate::request::{CreateCephfs, present};

/// `fs new` exits with EINVAL when a filesystem already exists.
const EINVAL: i32 = 22;

pub fn create_cephfs(ctx: &Context<'_>, req: &CreateCephfs) -> HandlerResult {
    let (Some(name), Some(data_pool), Some(metadata_pool)) = (
        present(&req.mds_name),
        present(&req.data_pool),
        present(&req.metadata_pool),
    ) else {
        return reject("Missing mds_name, data_pool or metadata_pool params");
    };
    let cluster = ctx.cluster;
    if !cluster.pool_exists(data_pool)? {
        return reject("CephFS data pool does not exist.  Cannot create CephFS");
    }
    if !cluster.pool_exists(metadata_pool)? {
        return reject("CephFS metadata pool does not exist.  Cannot create CephFS");
    }
    if !cluster.cephfs_names()?.is_empty() {
        info!("CephFS already created");
        return Ok(None);
    }
    let output = cluster.create_cephfs(name, metadata_pool, data_pool)?;
    if output.status == Some(EINVAL) {
        info!("CephFS already created");
        return Ok(None);
    }
    tool_outcome(&output)
}
