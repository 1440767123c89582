use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const API_VERSION: i64 = 1;

/// Response envelope; also the shape of every per-op result mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "exit-code")]
    pub exit_code: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(rename = "request-id", default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Value>,
    /// Op-specific fields (e.g. `user` for rgw-create-user).
    #[serde(flatten)]
    pub fields: IndexMap<String, Value>,
}

impl Response {
    pub fn success() -> Self {
        Self {
            exit_code: 0,
            stderr: None,
            request_id: None,
            fields: IndexMap::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            exit_code: 1,
            stderr: Some(message.into()),
            ..Self::success()
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn with_request_id(mut self, request_id: Option<Value>) -> Self {
        self.request_id = request_id.filter(|id| !id.is_null());
        self
    }

    pub fn is_failure(&self) -> bool {
        self.exit_code != 0
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_else(|_| br#"{"exit-code":1}"#.to_vec())
    }
}

/// Version-independent view of an incoming envelope.
#[derive(Debug, Clone)]
pub(crate) struct Envelope<'a> {
    pub api_version: Option<&'a Value>,
    pub request_id: Option<Value>,
    pub ops: Option<&'a Value>,
}

impl<'a> Envelope<'a> {
    pub fn from_value(value: &'a Value) -> Self {
        Self {
            api_version: value.get("api-version"),
            request_id: value.get("request-id").cloned(),
            ops: value.get("ops"),
        }
    }

    pub fn is_supported_version(&self) -> bool {
        // `1.0` counts as version 1.
        self.api_version.and_then(Value::as_f64) == Some(API_VERSION as f64)
    }

    pub fn version_label(&self) -> String {
        match self.api_version {
            Some(v) => v.to_string(),
            None => "null".to_string(),
        }
    }
}
