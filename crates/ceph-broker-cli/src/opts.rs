//! Command line options layered over `CEPH_BROKER_*` environment defaults.

use std::path::PathBuf;

use ceph_broker::{BatchMode, BrokerConfig};
use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct BrokerOpts {
    /// Read the request envelope from a file instead of stdin
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Pretty-print the JSON response
    #[arg(long)]
    pub pretty: bool,

    /// cephx identity cluster commands run as (env: CEPH_BROKER_SERVICE)
    #[arg(long, env = "CEPH_BROKER_SERVICE")]
    pub service: Option<String>,

    /// Stop a batch at the first failing op (env: CEPH_BROKER_STRICT)
    #[arg(long, env = "CEPH_BROKER_STRICT")]
    pub strict: bool,

    /// Lower bound for the OSD count used to size placement groups
    #[arg(long, env = "CEPH_BROKER_EXPECTED_OSD_COUNT")]
    pub expected_osd_count: Option<u32>,

    /// Target placement groups per OSD
    #[arg(long, env = "CEPH_BROKER_PGS_PER_OSD")]
    pub pgs_per_osd: Option<u32>,
}

impl BrokerOpts {
    pub fn config(&self) -> BrokerConfig {
        let mut config = BrokerConfig::from_env();
        if let Some(service) = self.service.as_ref().filter(|s| !s.is_empty()) {
            config.service = service.clone();
        }
        if self.strict {
            config.batch_mode = BatchMode::Strict;
        }
        if let Some(count) = self.expected_osd_count {
            config.expected_osd_count = Some(count);
        }
        if let Some(pgs) = self.pgs_per_osd {
            config.pgs_per_osd = pgs;
        }
        config
    }
}
