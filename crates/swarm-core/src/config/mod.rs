//! Persisted configuration: storage key encoding, the visible-mapping
//! projection, and runtime settings.

pub mod filter;
pub mod paths;
pub mod settings;
pub mod storage_key;

pub use filter::{filter_protected_servers, to_raw_form};
pub use settings::Settings;
pub use storage_key::StorageKey;

/// Top-level key holding the server mapping, in both the persisted file and
/// the wrapped import shape.
pub const MCP_SERVERS_KEY: &str = "mcpServers";
