//! One handler per op. Handlers return `Ok(None)` when the op applied with
//! nothing to report, `Ok(Some(response))` for a result mapping (validation
//! and precondition failures included), and `Err` only for unexpected
//! failures that abort the batch.

mod cephfs;
mod erasure;
mod osd;
mod permissions;
mod pool;
mod rgw;
mod tier;

use ceph_exec::CommandOutput;
use tracing::error;

use crate::cluster::Cluster;
use crate::envelope::Response;
use crate::error::BrokerResult;
use crate::groups::GroupStore;
use crate::request::Request;

pub type HandlerResult = BrokerResult<Option<Response>>;

/// What a handler may touch while applying an op.
pub struct Context<'a> {
    pub cluster: &'a Cluster,
    pub groups: &'a GroupStore,
}

pub fn dispatch(ctx: &Context<'_>, request: &Request) -> HandlerResult {
    match request {
        Request::CreatePool(req) => pool::create_pool(ctx, req),
        Request::CreateCephfs(req) => cephfs::create_cephfs(ctx, req),
        Request::CreateCacheTier(req) => tier::create_cache_tier(ctx, req),
        Request::RemoveCacheTier(req) => tier::remove_cache_tier(ctx, req),
        Request::CreateErasureProfile(req) => erasure::create_erasure_profile(ctx, req),
        Request::DeletePool(req) => pool::delete_pool(ctx, req),
        Request::RenamePool(req) => pool::rename_pool(ctx, req),
        Request::SnapshotPool(req) => pool::snapshot_pool(ctx, req),
        Request::RemovePoolSnapshot(req) => pool::remove_pool_snapshot(ctx, req),
        Request::SetPoolValue(req) => pool::set_pool_value(ctx, req),
        Request::RgwRegionSet(req) => rgw::region_set(ctx, req),
        Request::RgwZoneSet(req) => rgw::zone_set(ctx, req),
        Request::RgwRegionmapUpdate(req) => rgw::regionmap_update(ctx, req),
        Request::RgwRegionmapDefault(req) => rgw::regionmap_default(ctx, req),
        Request::RgwCreateUser(req) => rgw::create_user(ctx, req),
        Request::MoveOsdToBucket(req) => osd::move_osd_to_bucket(ctx, req),
        Request::AddPermissionsToKey(req) => permissions::add_permissions_to_key(ctx, req),
    }
}

/// Logs `message` and turns it into a failure result.
pub(crate) fn reject(message: impl Into<String>) -> HandlerResult {
    let message = message.into();
    error!("{message}");
    Ok(Some(Response::failure(message)))
}

/// The op's result is the tool's: nothing on success, its output otherwise.
pub(crate) fn tool_outcome(output: &CommandOutput) -> HandlerResult {
    if output.is_success() {
        Ok(None)
    } else {
        reject(output.diagnostic())
    }
}

/// Renders an optional request field the way failure messages name it.
pub(crate) fn label(value: Option<&str>) -> &str {
    value.unwrap_or("None")
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use ceph_exec::FakeExecutor;
    use ceph_kv::MemKvStore;

    use crate::cluster::Cluster;
    use crate::config::BrokerConfig;
    use crate::groups::GroupStore;

    use super::Context;

    /// A cluster and group store over a fake executor and in-memory kv.
    pub struct Harness {
        pub executor: Arc<FakeExecutor>,
        pub kv: MemKvStore,
        pub cluster: Arc<Cluster>,
        pub groups: GroupStore,
    }

    impl Harness {
        pub fn new() -> Self {
            let executor = FakeExecutor::new();
            let kv = MemKvStore::new();
            let cluster = Arc::new(Cluster::new(
                executor.clone().as_executor(),
                BrokerConfig::default(),
            ));
            let groups = GroupStore::new(Arc::new(kv.clone()), cluster.clone());
            Self {
                executor,
                kv,
                cluster,
                groups,
            }
        }

        pub fn ctx(&self) -> Context<'_> {
            Context {
                cluster: &self.cluster,
                groups: &self.groups,
            }
        }
    }
}
