use thiserror::Error;

pub type BrokerResult<T> = Result<T, BrokerError>;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("command error: {0}")]
    Exec(#[from] ceph_exec::ExecutionError),
    #[error("key/value store error: {0}")]
    Kv(#[from] ceph_kv::KvError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed request: {0}")]
    Decode(String),
    #[error("cluster error: {0}")]
    Cluster(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
