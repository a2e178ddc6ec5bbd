//! Swarm Core Library
//!
//! MCP server configuration for CodeAgentSwarm: validation of user-supplied
//! server definitions, the enabled/disabled projection of the persisted
//! mapping, and a manager that persists changes through an IPC boundary.

pub mod config;
pub mod error;
pub mod host;
pub mod ipc;
pub mod manager;
pub mod protected;
pub mod types;
pub mod validate;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{Settings, StorageKey, filter_protected_servers, to_raw_form};

    // Errors
    pub use crate::error::{FieldError, IpcError, ManagerError, NameError, ValidationError};

    // Types
    pub use crate::types::{
        EnvValue, RawMapping, ServerConfig, ServerEntry, ServerMap, ServerMetadata,
    };

    // Validation
    pub use crate::validate::{
        ValidatedConfig, parse_config, sanitize_env, validate_name, validate_new_config,
        validate_new_name, validate_server_config, validate_structure,
    };

    // IPC
    pub use crate::host::{FileHost, MemoryHost};
    pub use crate::ipc::{IpcClient, IpcTransport};

    // Manager
    pub use crate::manager::{
        AddOutcome, EventKind, ListenerId, ManagerEvent, ManagerState, McpManager,
        OperationReport,
    };

    pub use crate::protected::is_protected_name;
}
