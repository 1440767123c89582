//! Shared helpers for broker integration tests.
//!
//! Each integration test compiles this module separately, so some helpers
//! appear unused in some of them.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use ceph_broker::{Broker, BrokerConfig};
use ceph_exec::{CommandOutput, FakeExecutor};
use ceph_kv::MemKvStore;
use serde_json::{Value, json};

#[derive(Default)]
struct SimState {
    osds: Vec<u64>,
    pools: BTreeSet<String>,
    pool_values: BTreeMap<(String, String), String>,
    profiles: BTreeMap<String, (u32, u32)>,
    filesystems: Vec<String>,
    caps: BTreeMap<String, Vec<String>>,
    /// `--infile` paths with the document read at call time.
    uploads: Vec<(PathBuf, String)>,
}

/// A toy cluster answering the commands the broker issues.
pub struct SimCluster {
    pub executor: Arc<FakeExecutor>,
    pub kv: MemKvStore,
    state: Arc<Mutex<SimState>>,
}

impl SimCluster {
    pub fn new(osd_count: u64) -> Self {
        let state = Arc::new(Mutex::new(SimState {
            osds: (0..osd_count).collect(),
            ..SimState::default()
        }));
        let executor = FakeExecutor::new();
        let handler_state = state.clone();
        executor.set_handler(Box::new(move |argv: &[String]| {
            simulate(&mut handler_state.lock().unwrap(), argv)
        }));
        Self {
            executor,
            kv: MemKvStore::new(),
            state,
        }
    }

    pub fn broker(&self) -> Broker {
        self.broker_with(BrokerConfig::default())
    }

    pub fn broker_with(&self, config: BrokerConfig) -> Broker {
        Broker::new(
            self.executor.clone().as_executor(),
            Arc::new(self.kv.clone()),
            config,
        )
    }

    pub fn add_pool(&self, name: &str) {
        self.state.lock().unwrap().pools.insert(name.to_string());
    }

    pub fn add_profile(&self, name: &str, k: u32, m: u32) {
        self.state
            .lock()
            .unwrap()
            .profiles
            .insert(name.to_string(), (k, m));
    }

    pub fn pools(&self) -> Vec<String> {
        self.state.lock().unwrap().pools.iter().cloned().collect()
    }

    pub fn pool_value(&self, pool: &str, key: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .pool_values
            .get(&(pool.to_string(), key.to_string()))
            .cloned()
    }

    pub fn profile(&self, name: &str) -> Option<(u32, u32)> {
        self.state.lock().unwrap().profiles.get(name).copied()
    }

    pub fn filesystems(&self) -> Vec<String> {
        self.state.lock().unwrap().filesystems.clone()
    }

    pub fn caps(&self, client: &str) -> Option<Vec<String>> {
        self.state.lock().unwrap().caps.get(client).cloned()
    }

    pub fn uploads(&self) -> Vec<(PathBuf, String)> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.executor.commands()
    }

    pub fn commands_matching(&self, needle: &str) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|c| c.contains(needle))
            .collect()
    }
}

fn ok(stdout: impl Into<String>) -> CommandOutput {
    CommandOutput::success().with_stdout(stdout)
}

fn fail(code: i32, stderr: &str) -> CommandOutput {
    CommandOutput::failure(code).with_stderr(stderr)
}

fn simulate(state: &mut SimState, argv: &[String]) -> CommandOutput {
    let argv: Vec<&str> = argv.iter().map(String::as_str).collect();
    match argv.as_slice() {
        ["ceph", "auth", "caps", client, caps @ ..] => {
            state
                .caps
                .insert(client.to_string(), caps.iter().map(|c| c.to_string()).collect());
            CommandOutput::success()
        }
        [_tool, "--id", _service, rest @ ..] => simulate_tool(state, argv[0], rest),
        _ => fail(1, "unexpected command"),
    }
}

fn simulate_tool(state: &mut SimState, tool: &str, args: &[&str]) -> CommandOutput {
    match (tool, args) {
        ("rados", ["lspools"]) => {
            let pools: Vec<&str> = state.pools.iter().map(String::as_str).collect();
            ok(pools.join("\n"))
        }
        ("ceph", ["osd", "ls", "--format=json"]) => ok(json!(state.osds).to_string()),
        ("ceph", ["osd", "pool", "create", name, ..]) => {
            if state.pools.insert(name.to_string()) {
                CommandOutput::success()
            } else {
                ok(format!("pool '{name}' already exists"))
            }
        }
        ("ceph", ["osd", "pool", "set", pool, key, value]) => {
            if !state.pools.contains(*pool) {
                return fail(2, &format!("Error ENOENT: unrecognized pool '{pool}'"));
            }
            state
                .pool_values
                .insert((pool.to_string(), key.to_string()), value.to_string());
            CommandOutput::success()
        }
        ("ceph", ["osd", "pool", "delete", pool, ..]) => {
            if state.pools.remove(*pool) {
                CommandOutput::success()
            } else {
                fail(2, &format!("Error ENOENT: pool '{pool}' does not exist"))
            }
        }
        ("ceph", ["osd", "erasure-code-profile", "get", name, rest @ ..]) => {
            match state.profiles.get(*name) {
                Some((k, m)) if rest == ["--format=json"] => ok(json!({
                    "k": k.to_string(),
                    "m": m.to_string(),
                    "plugin": "jerasure"
                })
                .to_string()),
                Some((k, m)) => ok(format!("k={k}\nm={m}\nplugin=jerasure")),
                None => fail(2, &format!("Error ENOENT: unknown erasure code profile '{name}'")),
            }
        }
        ("ceph", ["osd", "erasure-code-profile", "set", name, params @ ..]) => {
            let param = |prefix: &str| {
                params
                    .iter()
                    .find_map(|p| p.strip_prefix(prefix))
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0)
            };
            state
                .profiles
                .insert(name.to_string(), (param("k="), param("m=")));
            CommandOutput::success()
        }
        ("ceph", ["fs", "ls"]) => {
            if state.filesystems.is_empty() {
                return ok("No filesystems enabled");
            }
            let lines: Vec<String> = state
                .filesystems
                .iter()
                .map(|fs| format!("name: {fs}, metadata pool: {fs}_metadata, data pools: [{fs}_data ]"))
                .collect();
            ok(lines.join("\n"))
        }
        ("ceph", ["fs", "new", name, ..]) => {
            state.filesystems.push(name.to_string());
            CommandOutput::success()
        }
        ("radosgw-admin", args) => {
            if let Some(at) = args.iter().position(|a| *a == "--infile") {
                let path = PathBuf::from(args[at + 1]);
                let body = std::fs::read_to_string(&path).unwrap_or_default();
                state.uploads.push((path, body));
            }
            if args.first() == Some(&"user") {
                return ok(json!({"user_id": "sync", "keys": [{"user": "sync"}]}).to_string());
            }
            CommandOutput::success()
        }
        _ => CommandOutput::success(),
    }
}

/// A version 1 envelope around `ops`.
pub fn envelope(ops: Value) -> Value {
    json!({"api-version": 1, "request-id": "test-request", "ops": ops})
}

pub fn run(broker: &Broker, request: &Value) -> Value {
    let bytes = broker.process(request.to_string().as_bytes());
    serde_json::from_slice(&bytes).expect("response is JSON")
}
