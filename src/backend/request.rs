//! Request and response envelopes exchanged with the routing layer.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Operation requested on a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Enumerate entries under a path.
    List,
    /// Read a single entry.
    Read,
    /// Create or replace a single entry.
    Update,
    /// Remove a single entry.
    Delete,
    /// Describe the path.
    Help,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Read => write!(f, "read"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::Help => write!(f, "help"),
        }
    }
}

/// A routed request.
///
/// `path` is relative to the mount point; a leading `/` is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Requested operation.
    pub operation: Operation,
    /// Path relative to the mount point.
    pub path: String,
    /// Request body fields.
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Request {
    /// Create a request with no body.
    pub fn new(operation: Operation, path: impl Into<String>) -> Self {
        Self {
            operation,
            path: path.into(),
            data: Map::new(),
        }
    }

    /// Add a body field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(name.into(), value.into());
        self
    }
}

/// Response data returned by a handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Response body.
    pub data: Map<String, Value>,
}

impl Response {
    /// Build a list response (`{"keys": [...]}`).
    pub fn list(keys: Vec<String>) -> Self {
        let mut data = Map::new();
        data.insert("keys".to_string(), Value::from(keys));
        Self { data }
    }

    /// Build a help response.
    pub fn help(text: impl Into<String>) -> Self {
        let mut data = Map::new();
        data.insert("help".to_string(), Value::String(text.into()));
        Self { data }
    }

    /// Add a data field.
    pub fn with_data(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(name.into(), value.into());
        self
    }

    /// Look up a data field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Keys of a list response, if this is one.
    pub fn keys(&self) -> Option<Vec<String>> {
        self.data.get("keys")?.as_array().map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
    }
}
