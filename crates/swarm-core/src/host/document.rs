//! Host-side edits to the raw `mcpServers` mapping.
//!
//! These mirror what the host process does when it receives a request: the
//! manager sends logical names, and the document finds whichever storage key
//! currently holds them.

use anyhow::Result;
use serde_json::Value;

use crate::config::StorageKey;
use crate::types::{RawMapping, ServerConfig};

/// The raw server mapping as the host stores it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDocument {
    servers: RawMapping,
}

impl ConfigDocument {
    pub fn new(servers: RawMapping) -> Self {
        Self { servers }
    }

    pub fn servers(&self) -> &RawMapping {
        &self.servers
    }

    pub fn into_servers(self) -> RawMapping {
        self.servers
    }

    /// Storage key currently holding `name`; the disabled form is preferred.
    pub fn locate(&self, name: &str) -> Option<StorageKey> {
        let disabled = StorageKey::disabled(name);
        if self.servers.contains_key(&disabled.encode()) {
            return Some(disabled);
        }
        let enabled = StorageKey::enabled(name);
        if self.servers.contains_key(&enabled.encode()) {
            return Some(enabled);
        }
        None
    }

    /// Insert new servers under plain (enabled) keys.
    pub fn add(&mut self, servers: RawMapping) {
        for (name, config) in servers {
            self.servers.insert(StorageKey::enabled(name).encode(), config);
        }
    }

    /// Replace a server's config, keeping its enabled state.
    pub fn update(&mut self, name: &str, config: &ServerConfig) -> Result<()> {
        let key = self
            .locate(name)
            .ok_or_else(|| anyhow::anyhow!("Server '{}' not found", name))?;
        self.servers.insert(key.encode(), config.to_value());
        Ok(())
    }

    /// Remove a server in whichever form it is stored.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        let removed_enabled = self.servers.remove(&StorageKey::enabled(name).encode());
        let removed_disabled = self.servers.remove(&StorageKey::disabled(name).encode());
        if removed_enabled.is_none() && removed_disabled.is_none() {
            anyhow::bail!("Server '{}' not found", name);
        }
        Ok(())
    }

    /// Move a server between its plain and disabled keys.
    pub fn toggle(&mut self, name: &str, enabled: bool) -> Result<()> {
        let current = self
            .locate(name)
            .ok_or_else(|| anyhow::anyhow!("Server '{}' not found", name))?;
        if current.enabled == enabled {
            return Ok(());
        }
        let config = self
            .servers
            .remove(&current.encode())
            .unwrap_or(Value::Null);
        self.servers.insert(current.flipped().encode(), config);
        Ok(())
    }
}
