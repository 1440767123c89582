//! Ceph broker: applies batches of JSON requests for pools, erasure profiles,
//! cache tiers, filesystems, gateway administration and cephx permission
//! groups to a cluster, reporting a single JSON response per batch.

pub mod cluster;
pub mod config;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod groups;
pub mod handlers;
pub mod request;
pub mod validate;

pub use cluster::Cluster;
pub use config::{BatchMode, BrokerConfig};
pub use engine::Broker;
pub use envelope::{API_VERSION, Response};
pub use error::{BrokerError, BrokerResult};
pub use groups::{Group, GroupStore, Service, ServiceRecord};
pub use request::{Request, RequestDecodeError};
