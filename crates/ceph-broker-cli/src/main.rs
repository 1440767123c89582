mod opts;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use ceph_broker::Broker;
use ceph_exec::HostExecutor;
use ceph_kv::MonitorKvStore;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use opts::BrokerOpts;

/// Reads one broker request envelope and writes one JSON response to stdout.
#[derive(Parser, Debug)]
#[command(name = "ceph-broker", version, about = "Apply Ceph broker requests to the local cluster")]
struct Cli {
    #[command(flatten)]
    opts: BrokerOpts,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging();

    let input = read_input(cli.opts.input.as_deref())?;
    let executor = HostExecutor::new().as_executor();
    let kv = Arc::new(MonitorKvStore::new(executor.clone()));
    let config = cli.opts.config();
    debug!(service = %config.service, mode = ?config.batch_mode, "broker configured");
    let broker = Broker::new(executor, kv, config);

    let response = broker.handle(&input);
    let rendered = if cli.opts.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{rendered}");
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path).with_context(|| format!("read {}", path.display())),
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("read request from stdin")?;
            Ok(buf)
        }
    }
}

/// Logs go to stderr; stdout carries only the response.
fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();
}
