//! Shared helpers for manager integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use swarm_core::error::IpcError;
use swarm_core::host::MemoryHost;
use swarm_core::ipc::{IpcClient, IpcTransport};
use swarm_core::manager::{EventKind, ManagerEvent, McpManager};
use swarm_core::types::RawMapping;

pub const ALL_EVENTS: [EventKind; 7] = [
    EventKind::Initialized,
    EventKind::ServersLoaded,
    EventKind::ServersAdded,
    EventKind::ServerUpdated,
    EventKind::ServerRemoved,
    EventKind::ServerToggled,
    EventKind::Error,
];

/// How the next call on a channel should fail.
#[derive(Debug, Clone)]
pub enum Failure {
    /// Reply `{ success: false, error }`
    Reject(String),
    /// Never reply
    Hang,
    /// Fail at the transport level
    Transport(String),
}

/// A [`MemoryHost`] that can be told to fail specific calls.
#[derive(Default)]
pub struct ScriptedHost {
    inner: MemoryHost,
    failures: Mutex<HashMap<String, Failure>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedHost {
    pub fn with_servers(servers: RawMapping) -> Self {
        Self {
            inner: MemoryHost::with_servers(servers),
            ..Default::default()
        }
    }

    pub fn fail_next(&self, channel: &str, failure: Failure) {
        self.failures
            .lock()
            .unwrap()
            .insert(channel.to_string(), failure);
    }

    pub fn raw(&self) -> RawMapping {
        self.inner.raw()
    }

    pub fn replace(&self, servers: RawMapping) {
        self.inner.replace(servers);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl IpcTransport for ScriptedHost {
    async fn invoke(&self, channel: &str, payload: Value) -> Result<Value, IpcError> {
        self.calls.lock().unwrap().push(channel.to_string());
        let failure = self.failures.lock().unwrap().remove(channel);
        match failure {
            Some(Failure::Reject(message)) => Ok(json!({"success": false, "error": message})),
            Some(Failure::Hang) => std::future::pending().await,
            Some(Failure::Transport(message)) => Err(IpcError::Transport(message)),
            None => self.inner.invoke(channel, payload).await,
        }
    }
}

pub fn raw(value: Value) -> RawMapping {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

pub fn manager_over(host: &Arc<ScriptedHost>) -> McpManager {
    McpManager::new(IpcClient::with_timeout(
        host.clone(),
        Duration::from_secs(10),
    ))
}

pub fn scripted(value: Value) -> (Arc<ScriptedHost>, McpManager) {
    let host = Arc::new(ScriptedHost::with_servers(raw(value)));
    let manager = manager_over(&host);
    (host, manager)
}

pub type EventLog = Arc<Mutex<Vec<ManagerEvent>>>;

/// Subscribe to every event kind and collect what is emitted.
pub fn record_events(manager: &mut McpManager) -> EventLog {
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    for kind in ALL_EVENTS {
        let log = log.clone();
        manager.on(kind, move |event| {
            log.lock().unwrap().push(event.clone());
            Ok(())
        });
    }
    log
}

pub fn kinds(log: &EventLog) -> Vec<EventKind> {
    log.lock().unwrap().iter().map(ManagerEvent::kind).collect()
}
