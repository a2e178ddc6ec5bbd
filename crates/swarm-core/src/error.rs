//! Error taxonomy for the MCP configuration subsystem.
//!
//! Messages produced here are shown to users verbatim, so they name the
//! offending server, field, index or key.

use std::time::Duration;

use thiserror::Error;

/// Result type for validator operations
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Result type for manager operations
pub type Result<T> = std::result::Result<T, ManagerError>;

/// A rejected server name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("Server name cannot be empty")]
    Empty,

    #[error(
        "Server name '{0}' is invalid: only letters, numbers, hyphens and underscores are allowed"
    )]
    InvalidCharacters(String),

    #[error("A server named '{0}' already exists")]
    Duplicate(String),

    #[error("Server name '{0}' is reserved")]
    Reserved(String),

    #[error("Server name '{0}' cannot start with the reserved '_disabled_' prefix")]
    DisabledPrefix(String),
}

/// A per-field schema violation inside one server config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("configuration must be an object")]
    NotAnObject,

    #[error("'command' is required and must be a non-empty string")]
    MissingCommand,

    #[error("'args' must be an array")]
    ArgsNotArray,

    #[error("'args[{index}]' must be a string")]
    ArgNotString { index: usize },

    #[error("'env' must be an object")]
    EnvNotObject,

    #[error("'env.{key}' must be a string, number, or boolean")]
    EnvValueInvalid { key: String },
}

/// Errors raised while validating user-supplied server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Empty or whitespace-only input
    #[error("Configuration cannot be empty")]
    EmptyInput,

    /// Malformed JSON
    #[error("Invalid JSON: {0}")]
    Parse(String),

    /// Neither a direct server object nor a wrapped `mcpServers` object
    #[error("Invalid configuration structure: {0}")]
    Structure(String),

    /// Per-field schema violation
    #[error("Invalid configuration for server '{server}': {field}")]
    InvalidField { server: String, field: FieldError },

    /// Attempt to use a reserved server name
    #[error("'{0}' is a protected server and cannot be modified")]
    ProtectedName(String),

    /// Illegal, duplicate or reserved name
    #[error(transparent)]
    Name(#[from] NameError),
}

impl ValidationError {
    pub(crate) fn field(server: &str, field: FieldError) -> Self {
        Self::InvalidField {
            server: server.to_string(),
            field,
        }
    }

    /// True for failures that happened before any structure was inspected.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::EmptyInput | Self::Parse(_))
    }
}

/// Failures at the IPC boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IpcError {
    /// No reply within the configured bound
    #[error("IPC call '{channel}' timed out after {}ms", after.as_millis())]
    Timeout { channel: String, after: Duration },

    /// The host replied with `{ success: false, error }`
    #[error("{message}")]
    Rejected { channel: String, message: String },

    /// The transport itself failed
    #[error("IPC transport error: {0}")]
    Transport(String),

    /// The host replied with something that does not match the contract
    #[error("Invalid response from '{channel}': {reason}")]
    InvalidResponse { channel: String, reason: String },
}

impl IpcError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Errors surfaced by [`crate::manager::McpManager`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManagerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Server '{0}' not found")]
    NotFound(String),

    #[error("'{0}' is a protected server and cannot be modified")]
    ProtectedName(String),

    #[error(transparent)]
    Ipc(#[from] IpcError),

    #[error("Failed to initialize MCP manager: {0}")]
    Initialization(Box<ManagerError>),

    #[error("Failed to load MCP servers: {0}")]
    Load(IpcError),
}

impl ManagerError {
    /// True when the failure came from the IPC boundary rather than user input.
    pub fn is_ipc(&self) -> bool {
        match self {
            Self::Ipc(_) | Self::Load(_) => true,
            Self::Initialization(inner) => inner.is_ipc(),
            _ => false,
        }
    }
}
