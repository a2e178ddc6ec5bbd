//! Default file locations.

use std::path::{Path, PathBuf};

/// Directory name under the platform config dir.
pub const APP_DIR_NAME: &str = "codeagentswarm";

/// Environment variable that overrides the MCP config file location.
pub const CONFIG_FILE_ENV: &str = "SWARM_MCP_CONFIG";

pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join(APP_DIR_NAME).join("settings.toml")
}

/// The JSON file holding the `mcpServers` object.
pub fn default_mcp_config_file(home_dir: &Path) -> PathBuf {
    home_dir.join(".claude.json")
}
