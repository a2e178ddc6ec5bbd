//! Host backed by a JSON file with a top-level `mcpServers` object.
//!
//! Other top-level keys in the file are preserved on write.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{ConfigDocument, dispatch};
use crate::config::MCP_SERVERS_KEY;
use crate::error::IpcError;
use crate::ipc::IpcTransport;

#[derive(Debug)]
pub struct FileHost {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileHost {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn handle(&self, channel: &str, payload: Value) -> anyhow::Result<Result<Value, IpcError>> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());

        let mut root = read_root(&self.path)?;
        let servers = match root.remove(MCP_SERVERS_KEY) {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => anyhow::bail!(
                "Expected '{}' to be a JSON object in {}",
                MCP_SERVERS_KEY,
                self.path.display()
            ),
        };
        let mut document = ConfigDocument::new(servers);

        let dispatched = match dispatch(&mut document, channel, payload) {
            Ok(dispatched) => dispatched,
            Err(e) => return Ok(Err(e)),
        };

        if dispatched.changed {
            root.insert(
                MCP_SERVERS_KEY.to_string(),
                Value::Object(document.into_servers()),
            );
            replace_root(&self.path, &root)?;
            tracing::info!(channel, path = %self.path.display(), "Updated MCP config file");
        }
        Ok(Ok(dispatched.reply))
    }
}

#[async_trait]
impl IpcTransport for FileHost {
    async fn invoke(&self, channel: &str, payload: Value) -> Result<Value, IpcError> {
        self.handle(channel, payload)
            .unwrap_or_else(|e| Err(IpcError::Transport(format!("{e:#}"))))
    }
}

/// Top-level object of the file; a missing or blank file reads as empty.
fn read_root(path: &Path) -> anyhow::Result<Map<String, Value>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to read config file: {}", path.display()));
        }
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
    {
        Value::Object(root) => Ok(root),
        _ => anyhow::bail!("Expected JSON object at root: {}", path.display()),
    }
}

/// Sibling path the new contents are staged in before the rename.
fn staging_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{file_name}.{}.tmp", std::process::id()))
}

/// Replace the file in one rename so a failed write never truncates it.
fn replace_root(path: &Path, root: &Map<String, Value>) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }
    let bytes = serde_json::to_vec_pretty(root).context("Failed to serialize JSON config")?;

    let staged = staging_path(path);
    std::fs::write(&staged, bytes)
        .with_context(|| format!("Failed to write staged config: {}", staged.display()))?;
    if let Err(e) = std::fs::rename(&staged, path) {
        let _ = std::fs::remove_file(&staged);
        return Err(e).with_context(|| format!("Failed to replace config file: {}", path.display()));
    }
    Ok(())
}
