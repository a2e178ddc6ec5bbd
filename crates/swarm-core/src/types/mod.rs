//! Shared server types used by the validator, filter engine and manager.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw persisted mapping: storage key (plain or disabled-prefixed) to config.
pub type RawMapping = Map<String, Value>;

/// Visible mapping: logical name to config plus derived metadata.
pub type ServerMap = BTreeMap<String, ServerEntry>;

/// Scalar environment value accepted in a server's `env` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    String(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl EnvValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            EnvValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvValue::String(s) => f.write_str(s),
            EnvValue::Number(n) => write!(f, "{n}"),
            EnvValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for EnvValue {
    fn from(value: &str) -> Self {
        EnvValue::String(value.to_string())
    }
}

/// Launch specification for one MCP server, as persisted by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Executable name or path
    pub command: String,

    /// Command arguments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Environment overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, EnvValue>>,

    /// Host-specific fields this subsystem does not interpret (e.g. `type`, `cwd`)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServerConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: None,
            extra: Map::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<EnvValue>) -> Self {
        self.env
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Serialize to the JSON value stored under a storage key.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Derived state attached to every visible server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMetadata {
    pub enabled: bool,
    pub protected: bool,
}

/// A visible server: its config plus derived metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerEntry {
    #[serde(flatten)]
    pub config: ServerConfig,
    pub metadata: ServerMetadata,
}

impl ServerEntry {
    pub fn enabled(config: ServerConfig) -> Self {
        Self {
            config,
            metadata: ServerMetadata {
                enabled: true,
                protected: false,
            },
        }
    }

    pub fn disabled(config: ServerConfig) -> Self {
        Self {
            config,
            metadata: ServerMetadata {
                enabled: false,
                protected: false,
            },
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.metadata.enabled
    }
}
