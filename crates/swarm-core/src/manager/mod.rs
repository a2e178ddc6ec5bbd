//! Stateful front of the MCP configuration subsystem.
//!
//! The manager keeps the visible server mapping in memory, validates user
//! input, persists through the IPC boundary and notifies listeners. The host
//! stays the source of truth: [`McpManager::load_servers`] can resync the
//! cache at any time.
//!
//! Cache maintenance per operation:
//! - load: rebuilt from the host
//! - add / update: patched locally
//! - remove: patched locally, then reloaded
//! - toggle: reloaded (the host renames the storage key)

pub mod events;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::{MCP_SERVERS_KEY, Settings, StorageKey, filter_protected_servers};
use crate::error::{ManagerError, Result, ValidationError};
use crate::ipc::{IpcClient, IpcTransport};
use crate::protected::is_protected_name;
use crate::types::{EnvValue, RawMapping, ServerConfig, ServerEntry, ServerMap};
use crate::validate::{
    ValidatedConfig, sanitize_env, validate_new_config, validate_server_config, wrap_named,
};

pub use events::{EventBus, EventKind, ListenerId, ManagerEvent};

/// Lifecycle of the manager. Once `Ready`, it never goes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Uninitialized,
    Initializing,
    Ready,
}

/// Result of [`McpManager::add_servers`].
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// A direct server object was submitted; nothing was persisted.
    NeedsName(ServerConfig),
    /// The servers that were persisted and added to the cache.
    Added(ServerMap),
}

/// `{ success, error? }` view of an operation result, for UI layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> From<&Result<T>> for OperationReport {
    fn from(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Self {
                success: true,
                error: None,
            },
            Err(e) => Self {
                success: false,
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug)]
pub struct McpManager {
    ipc: IpcClient,
    servers: ServerMap,
    initialized: bool,
    state: ManagerState,
    events: EventBus,
}

impl McpManager {
    pub fn new(ipc: IpcClient) -> Self {
        Self {
            ipc,
            servers: ServerMap::new(),
            initialized: false,
            state: ManagerState::Uninitialized,
            events: EventBus::new(),
        }
    }

    /// Build a manager over `transport` using the timeout from `settings`.
    pub fn with_settings(transport: Arc<dyn IpcTransport>, settings: &Settings) -> Self {
        Self::new(IpcClient::with_timeout(transport, settings.ipc_timeout()))
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&ManagerEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.events.on(kind, listener)
    }

    pub fn off(&mut self, kind: EventKind, id: ListenerId) -> bool {
        self.events.off(kind, id)
    }

    fn emit(&self, event: ManagerEvent) {
        self.events.emit(&event);
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Load servers once. Later calls are no-ops; a failed call may be retried.
    pub async fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        self.state = ManagerState::Initializing;
        match self.load_servers().await {
            Ok(()) => {
                self.initialized = true;
                self.state = ManagerState::Ready;
                tracing::info!(servers = self.servers.len(), "MCP manager initialized");
                self.emit(ManagerEvent::Initialized);
                Ok(())
            }
            Err(e) => {
                self.state = ManagerState::Uninitialized;
                let err = ManagerError::Initialization(Box::new(e));
                self.emit(ManagerEvent::Error {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Replace the cache with the host's current mapping.
    ///
    /// On failure the previous cache is kept.
    pub async fn load_servers(&mut self) -> Result<()> {
        let raw = match self.ipc.load_config().await {
            Ok(raw) => raw,
            Err(e) => {
                let err = ManagerError::Load(e);
                tracing::error!(error = %err, "Failed to load MCP servers");
                self.emit(ManagerEvent::Error {
                    message: err.to_string(),
                });
                return Err(err);
            }
        };

        self.servers = filter_protected_servers(&raw);
        tracing::debug!(servers = self.servers.len(), "Loaded MCP servers");
        self.emit(ManagerEvent::ServersLoaded(self.servers.clone()));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Validate and persist servers from user-supplied JSON.
    ///
    /// A direct server object is returned as [`AddOutcome::NeedsName`]; name
    /// it and resubmit with [`McpManager::add_named_server`].
    pub async fn add_servers(&mut self, text: &str) -> Result<AddOutcome> {
        let servers = match validate_new_config(text, &self.servers)? {
            ValidatedConfig::Direct(config) => return Ok(AddOutcome::NeedsName(config)),
            ValidatedConfig::Wrapped(servers) => servers,
        };

        let raw: RawMapping = servers
            .iter()
            .map(|(name, config)| (name.clone(), config.to_value()))
            .collect();
        self.ipc.add_servers(raw).await?;

        let added: ServerMap = servers
            .into_iter()
            .map(|(name, config)| (name, ServerEntry::enabled(config)))
            .collect();
        self.servers
            .extend(added.iter().map(|(name, entry)| (name.clone(), entry.clone())));
        tracing::info!(servers = ?added.keys().collect::<Vec<_>>(), "Added MCP servers");
        self.emit(ManagerEvent::ServersAdded(added.clone()));
        Ok(AddOutcome::Added(added))
    }

    /// Add a single named server, as the follow-up to [`AddOutcome::NeedsName`].
    pub async fn add_named_server(&mut self, name: &str, config: &ServerConfig) -> Result<ServerMap> {
        let text = wrap_named(name, config).to_string();
        match self.add_servers(&text).await? {
            AddOutcome::Added(added) => Ok(added),
            AddOutcome::NeedsName(_) => Err(ValidationError::Structure(format!(
                "expected an '{MCP_SERVERS_KEY}' object"
            ))
            .into()),
        }
    }

    /// Replace a known server's config. Enabled state is preserved.
    pub async fn update_server(&mut self, name: &str, config: &Value) -> Result<ServerEntry> {
        let metadata = self
            .servers
            .get(name)
            .map(|entry| entry.metadata)
            .ok_or_else(|| ManagerError::NotFound(name.to_string()))?;

        validate_server_config(name, config)?;
        let config: ServerConfig = serde_json::from_value(config.clone()).map_err(|e| {
            ValidationError::Structure(format!("server '{name}' could not be read: {e}"))
        })?;

        self.ipc.update_server(name, &config).await?;

        let entry = ServerEntry { config, metadata };
        self.servers.insert(name.to_string(), entry.clone());
        tracing::info!(server = name, "Updated MCP server");
        self.emit(ManagerEvent::ServerUpdated {
            name: name.to_string(),
            entry: entry.clone(),
        });
        Ok(entry)
    }

    /// Remove a server in whichever form the host stores it, then resync.
    pub async fn remove_server(&mut self, name: &str) -> Result<()> {
        if is_protected_name(&StorageKey::parse(name).name) {
            return Err(ManagerError::ProtectedName(name.to_string()));
        }

        self.ipc.remove_server(name).await?;

        self.servers.remove(name);
        tracing::info!(server = name, "Removed MCP server");
        self.emit(ManagerEvent::ServerRemoved {
            name: name.to_string(),
        });

        if let Err(e) = self.load_servers().await {
            tracing::warn!(server = name, error = %e, "Reload after removal failed; cache patched locally");
        }
        Ok(())
    }

    /// Enable or disable a known server, then reload from the host.
    pub async fn toggle_server(&mut self, name: &str, enabled: bool) -> Result<()> {
        if !self.servers.contains_key(name) {
            return Err(ManagerError::NotFound(name.to_string()));
        }

        self.ipc.toggle_server(name, enabled).await?;
        self.load_servers().await?;

        tracing::info!(server = name, enabled, "Toggled MCP server");
        self.emit(ManagerEvent::ServerToggled {
            name: name.to_string(),
            enabled,
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn get_server(&self, name: &str) -> Option<&ServerEntry> {
        self.servers.get(name)
    }

    pub fn get_all_servers(&self) -> &ServerMap {
        &self.servers
    }

    pub fn get_server_names(&self) -> Vec<String> {
        self.servers.keys().cloned().collect()
    }

    pub fn has_server(&self, name: &str) -> bool {
        self.servers.contains_key(name)
    }

    /// A copy of the server with sensitive env values masked, for display.
    pub fn get_sanitized_server(&self, name: &str) -> Option<ServerEntry> {
        let mut entry = self.servers.get(name)?.clone();
        if let Some(env) = &entry.config.env {
            let masked: BTreeMap<String, EnvValue> = sanitize_env(env)
                .into_iter()
                .map(|(key, value)| (key, EnvValue::String(value)))
                .collect();
            entry.config.env = Some(masked);
        }
        Some(entry)
    }

    /// Serialize the cache as `{"mcpServers": {...}}`, without metadata.
    pub fn export_configuration(&self) -> String {
        let servers: Map<String, Value> = self
            .servers
            .iter()
            .map(|(name, entry)| (name.clone(), entry.config.to_value()))
            .collect();
        let mut root = Map::new();
        root.insert(MCP_SERVERS_KEY.to_string(), Value::Object(servers));
        format!("{:#}", Value::Object(root))
    }

    /// Run the add-servers validation without side effects.
    pub fn validate_configuration(
        &self,
        text: &str,
    ) -> std::result::Result<ValidatedConfig, ValidationError> {
        validate_new_config(text, &self.servers)
    }
}
