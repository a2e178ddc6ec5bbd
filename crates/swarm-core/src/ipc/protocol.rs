//! Channel names and payload shapes shared by the manager and the host.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{RawMapping, ServerConfig};

pub const LOAD_CONFIG: &str = "mcp:load-config";
pub const ADD_SERVERS: &str = "mcp:add-servers";
pub const UPDATE_SERVER: &str = "mcp:update-server";
pub const REMOVE_SERVER: &str = "mcp:remove-server";
pub const TOGGLE_SERVER: &str = "mcp:toggle-server";

/// Reply to `mcp:load-config`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadConfigResponse {
    #[serde(rename = "mcpServers", default)]
    pub mcp_servers: RawMapping,
}

/// Payload of `mcp:update-server`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateServerRequest {
    pub name: String,
    pub config: ServerConfig,
}

/// Payload of `mcp:toggle-server`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleServerRequest {
    pub name: String,
    pub enabled: bool,
}

/// Reply to every mutating call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AckResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
