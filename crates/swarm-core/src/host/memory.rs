//! In-memory host, used by tests and embedders that own the mapping.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{ConfigDocument, dispatch};
use crate::error::IpcError;
use crate::ipc::IpcTransport;
use crate::types::RawMapping;

#[derive(Debug, Default)]
pub struct MemoryHost {
    document: Mutex<ConfigDocument>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_servers(servers: RawMapping) -> Self {
        Self {
            document: Mutex::new(ConfigDocument::new(servers)),
        }
    }

    /// Snapshot of the raw mapping as currently stored.
    pub fn raw(&self) -> RawMapping {
        self.lock().servers().clone()
    }

    /// Replace the stored mapping, as an external edit would.
    pub fn replace(&self, servers: RawMapping) {
        *self.lock() = ConfigDocument::new(servers);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ConfigDocument> {
        self.document
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl IpcTransport for MemoryHost {
    async fn invoke(&self, channel: &str, payload: Value) -> Result<Value, IpcError> {
        let mut document = self.lock();
        dispatch(&mut document, channel, payload).map(|out| out.reply)
    }
}
