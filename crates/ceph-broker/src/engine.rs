use std::sync::Arc;

use ceph_exec::BoxedExecutor;
use ceph_kv::DynKvStore;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::cluster::Cluster;
use crate::config::{BatchMode, BrokerConfig};
use crate::envelope::{Envelope, Response};
use crate::error::{BrokerError, BrokerResult};
use crate::groups::GroupStore;
use crate::handlers::{self, Context};
use crate::request::{Request, RequestDecodeError};

/// Applies batches of broker requests to a cluster.
pub struct Broker {
    cluster: Arc<Cluster>,
    groups: GroupStore,
}

impl Broker {
    pub fn new(executor: BoxedExecutor, kv: DynKvStore, config: BrokerConfig) -> Self {
        let cluster = Arc::new(Cluster::new(executor, config));
        let groups = GroupStore::new(kv, cluster.clone());
        Self { cluster, groups }
    }

    pub fn config(&self) -> &BrokerConfig {
        self.cluster.config()
    }

    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    pub fn groups(&self) -> &GroupStore {
        &self.groups
    }

    /// Encoded envelope in, encoded response out. Never fails; every problem
    /// is reported in the response.
    pub fn process(&self, input: &[u8]) -> Vec<u8> {
        self.handle(input).to_bytes()
    }

    pub fn handle(&self, input: &[u8]) -> Response {
        match serde_json::from_slice::<Value>(input) {
            Ok(value) => self.process_envelope(&value),
            Err(err) => {
                let message = format!("Unable to decode broker request: {err}");
                error!("{message}");
                Response::failure(message)
            }
        }
    }

    pub fn process_envelope(&self, value: &Value) -> Response {
        let envelope = Envelope::from_value(value);
        if !envelope.is_supported_version() {
            let message = format!(
                "Missing or invalid api version ({})",
                envelope.version_label()
            );
            error!("{message}");
            return Response::failure(message).with_request_id(envelope.request_id);
        }

        debug!(request_id = ?envelope.request_id, "processing request");
        let response = match self.process_requests_v1(envelope.ops) {
            Ok(response) => response,
            Err(err) => {
                let message = format!("Unexpected error occurred while processing requests: {err}");
                error!("{message}");
                Response::failure(message)
            }
        };
        response.with_request_id(envelope.request_id)
    }

    /// Runs the ops of a version 1 envelope in order.
    ///
    /// An unknown op stops the batch. Otherwise [`BatchMode::Compat`] runs
    /// every op and reports the first failure, or the first result mapping
    /// when every op succeeded, while [`BatchMode::Strict`] stops at the
    /// first failure.
    pub fn process_requests_v1(&self, ops: Option<&Value>) -> BrokerResult<Response> {
        let Some(ops) = ops.and_then(Value::as_array) else {
            return Err(BrokerError::Decode("'ops' must be a list of requests".into()));
        };
        let strict = self.config().batch_mode == BatchMode::Strict;
        let ctx = Context {
            cluster: &self.cluster,
            groups: &self.groups,
        };

        info!(count = ops.len(), "processing ceph broker requests");
        let mut failure: Option<Response> = None;
        let mut result: Option<Response> = None;
        for op in ops {
            let outcome = match Request::decode(op) {
                Ok(request) => {
                    debug!(op = request.op(), "processing op");
                    handlers::dispatch(&ctx, &request)?
                }
                Err(err @ RequestDecodeError::UnknownOp(_)) => {
                    error!("{err}");
                    return Ok(Response::failure(err.to_string()));
                }
                Err(err) => handlers::reject(err.to_string())?,
            };
            let Some(response) = outcome else {
                continue;
            };
            let slot = if response.is_failure() {
                if strict {
                    return Ok(response);
                }
                &mut failure
            } else {
                &mut result
            };
            if slot.is_none() {
                *slot = Some(response);
            }
        }
        Ok(failure.or(result).unwrap_or_else(Response::success))
    }
}
