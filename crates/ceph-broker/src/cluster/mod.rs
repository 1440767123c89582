//! Live cluster queries and mutations, expressed as commands run through an
//! [`Executor`](ceph_exec::Executor).

mod crush;
mod pool;
mod rgw;

pub use pool::{ErasureProfileSpec, LEGACY_PG_COUNT, MINIMUM_PGS, pg_count_for};
pub use rgw::UploadKind;

use ceph_exec::{BoxedExecutor, CommandOutput};

use crate::config::BrokerConfig;
use crate::error::BrokerResult;

pub struct Cluster {
    executor: BoxedExecutor,
    config: BrokerConfig,
}

impl Cluster {
    pub fn new(executor: BoxedExecutor, config: BrokerConfig) -> Self {
        Self { executor, config }
    }

    pub fn service(&self) -> &str {
        &self.config.service
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    pub fn executor(&self) -> &BoxedExecutor {
        &self.executor
    }

    /// `<tool> --id <service> <args...>`
    fn tool_argv(&self, tool: &str, args: &[&str]) -> Vec<String> {
        let mut argv = Vec::with_capacity(args.len() + 3);
        argv.push(tool.to_string());
        argv.push("--id".to_string());
        argv.push(self.config.service.clone());
        argv.extend(args.iter().map(|a| a.to_string()));
        argv
    }

    /// Runs `ceph --id <service> ...` and fails on a non-zero exit.
    fn ceph(&self, args: &[&str]) -> BrokerResult<CommandOutput> {
        Ok(self.executor.execute(&self.tool_argv("ceph", args))?)
    }

    /// Runs `ceph --id <service> ...` and returns the output whatever the exit.
    fn ceph_unchecked(&self, args: &[&str]) -> BrokerResult<CommandOutput> {
        Ok(self.executor.run(&self.tool_argv("ceph", args))?)
    }

    fn rados(&self, args: &[&str]) -> BrokerResult<CommandOutput> {
        Ok(self.executor.execute(&self.tool_argv("rados", args))?)
    }

    fn radosgw_admin(&self, args: &[&str]) -> BrokerResult<CommandOutput> {
        Ok(self.executor.run(&self.tool_argv("radosgw-admin", args))?)
    }
}
