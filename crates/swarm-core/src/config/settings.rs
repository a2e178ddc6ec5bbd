//! Runtime settings loaded from `settings.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::paths;

/// Default bound on a single IPC round trip.
pub const DEFAULT_IPC_TIMEOUT_MS: u64 = 10_000;

fn default_ipc_timeout_ms() -> u64 {
    DEFAULT_IPC_TIMEOUT_MS
}

/// Settings for the MCP configuration subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// JSON file holding the `mcpServers` mapping
    #[serde(default)]
    pub config_file: Option<PathBuf>,

    /// Timeout for each IPC call, in milliseconds
    #[serde(default = "default_ipc_timeout_ms")]
    pub ipc_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_file: None,
            ipc_timeout_ms: DEFAULT_IPC_TIMEOUT_MS,
        }
    }
}

impl Settings {
    /// Load settings from the platform config dir, applying env overrides.
    pub fn load_default() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        let mut settings = Self::load_from(&paths::settings_path(&config_dir))?;
        if let Ok(path) = std::env::var(paths::CONFIG_FILE_ENV)
            && !path.trim().is_empty()
        {
            settings.config_file = Some(PathBuf::from(path));
        }
        Ok(settings)
    }

    /// Load settings from a file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        parse_settings_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    pub fn ipc_timeout(&self) -> Duration {
        Duration::from_millis(self.ipc_timeout_ms)
    }

    /// Resolve the MCP config file, falling back to the home directory default.
    pub fn resolve_config_file(&self) -> Result<PathBuf> {
        if let Some(path) = &self.config_file {
            return Ok(path.clone());
        }
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(paths::default_mcp_config_file(&home))
    }
}

/// Parse settings content from a string
pub fn parse_settings_str(content: &str) -> Result<Settings> {
    let settings: Settings =
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;
    if settings.ipc_timeout_ms == 0 {
        anyhow::bail!("ipc_timeout_ms must be greater than zero");
    }
    Ok(settings)
}

fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let message = error.message().to_string();
    match error.span() {
        Some(span) => {
            let line_num = content[..span.start.min(content.len())].matches('\n').count() + 1;
            anyhow::anyhow!(
                "TOML parsing error at line {}:\n{}\n\nError: {}",
                line_num,
                line_context(content, line_num),
                message
            )
        }
        None => anyhow::anyhow!("TOML parsing error: {}", message),
    }
}

fn line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 1).min(lines.len());

    lines[start.min(end)..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
