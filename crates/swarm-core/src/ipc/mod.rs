//! IPC boundary between the manager and the host process.
//!
//! The host owns the config file. Every call is a request/response pair on a
//! named channel, bounded by a timeout.

pub mod protocol;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::settings::DEFAULT_IPC_TIMEOUT_MS;
use crate::error::IpcError;
use crate::types::{RawMapping, ServerConfig};

use protocol::{AckResponse, LoadConfigResponse, ToggleServerRequest, UpdateServerRequest};

/// A request/response channel to the host.
#[async_trait]
pub trait IpcTransport: Send + Sync {
    async fn invoke(&self, channel: &str, payload: Value) -> Result<Value, IpcError>;
}

/// Typed client over an [`IpcTransport`] with a per-call timeout.
#[derive(Clone)]
pub struct IpcClient {
    transport: Arc<dyn IpcTransport>,
    timeout: Duration,
}

impl std::fmt::Debug for IpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpcClient")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl IpcClient {
    pub fn new(transport: Arc<dyn IpcTransport>) -> Self {
        Self::with_timeout(transport, Duration::from_millis(DEFAULT_IPC_TIMEOUT_MS))
    }

    pub fn with_timeout(transport: Arc<dyn IpcTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send one request and wait at most `timeout` for the reply.
    pub async fn call(&self, channel: &str, payload: Value) -> Result<Value, IpcError> {
        tracing::debug!(channel, "IPC request");
        match tokio::time::timeout(self.timeout, self.transport.invoke(channel, payload)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    channel,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "IPC request timed out"
                );
                Err(IpcError::Timeout {
                    channel: channel.to_string(),
                    after: self.timeout,
                })
            }
        }
    }

    pub async fn load_config(&self) -> Result<RawMapping, IpcError> {
        let response = self.call(protocol::LOAD_CONFIG, Value::Null).await?;
        if let Some(Value::Bool(false)) = response.get("success") {
            return Err(rejected(protocol::LOAD_CONFIG, &response));
        }
        let parsed: LoadConfigResponse =
            serde_json::from_value(response).map_err(|e| IpcError::InvalidResponse {
                channel: protocol::LOAD_CONFIG.to_string(),
                reason: e.to_string(),
            })?;
        Ok(parsed.mcp_servers)
    }

    pub async fn add_servers(&self, servers: RawMapping) -> Result<(), IpcError> {
        self.call_ack(protocol::ADD_SERVERS, Value::Object(servers)).await
    }

    pub async fn update_server(&self, name: &str, config: &ServerConfig) -> Result<(), IpcError> {
        let request = UpdateServerRequest {
            name: name.to_string(),
            config: config.clone(),
        };
        self.call_ack(protocol::UPDATE_SERVER, to_payload(&request)?)
            .await
    }

    pub async fn remove_server(&self, name: &str) -> Result<(), IpcError> {
        self.call_ack(protocol::REMOVE_SERVER, Value::String(name.to_string()))
            .await
    }

    pub async fn toggle_server(&self, name: &str, enabled: bool) -> Result<(), IpcError> {
        let request = ToggleServerRequest {
            name: name.to_string(),
            enabled,
        };
        self.call_ack(protocol::TOGGLE_SERVER, to_payload(&request)?)
            .await
    }

    async fn call_ack(&self, channel: &str, payload: Value) -> Result<(), IpcError> {
        let response = self.call(channel, payload).await?;
        let ack: AckResponse =
            serde_json::from_value(response.clone()).map_err(|e| IpcError::InvalidResponse {
                channel: channel.to_string(),
                reason: e.to_string(),
            })?;
        if ack.success {
            Ok(())
        } else {
            Err(rejected(channel, &response))
        }
    }
}

fn rejected(channel: &str, response: &Value) -> IpcError {
    let message = response
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("Unknown error")
        .to_string();
    IpcError::Rejected {
        channel: channel.to_string(),
        message,
    }
}

fn to_payload<T: serde::Serialize>(request: &T) -> Result<Value, IpcError> {
    serde_json::to_value(request).map_err(|e| IpcError::Transport(e.to_string()))
}
