//! Projection of the raw persisted mapping into the visible server mapping.
//!
//! The raw mapping may hold a name in plain form, disabled form, or (after a
//! manual edit) both. The visible mapping holds each logical name at most
//! once, never contains protected names, and records the enabled state in
//! the entry metadata.

use std::collections::BTreeSet;

use super::storage_key::StorageKey;
use crate::protected::is_protected_name;
use crate::types::{RawMapping, ServerConfig, ServerEntry, ServerMap};

/// Build the visible server mapping from a raw persisted mapping.
///
/// When both `name` and `_disabled_name` exist, the disabled entry wins.
/// Raw values that do not describe a server are skipped.
pub fn filter_protected_servers(raw: &RawMapping) -> ServerMap {
    let names: BTreeSet<String> = raw.keys().map(|key| StorageKey::parse(key).name).collect();

    let mut visible = ServerMap::new();
    for name in names {
        if name.is_empty() || is_protected_name(&name) {
            continue;
        }

        let disabled_key = StorageKey::disabled(name.as_str()).encode();
        let (value, enabled) = match raw.get(&disabled_key) {
            Some(value) => (value, false),
            None => match raw.get(&name) {
                Some(value) => (value, true),
                None => continue,
            },
        };

        let config: ServerConfig = match serde_json::from_value(value.clone()) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(server = %name, error = %e, "Skipping unreadable MCP server entry");
                continue;
            }
        };

        let entry = if enabled {
            ServerEntry::enabled(config)
        } else {
            ServerEntry::disabled(config)
        };
        visible.insert(name, entry);
    }

    visible
}

/// Re-encode a visible mapping into raw storage form, keyed by enabled state.
pub fn to_raw_form(servers: &ServerMap) -> RawMapping {
    servers
        .iter()
        .map(|(name, entry)| {
            let key = StorageKey::new(name.as_str(), entry.metadata.enabled);
            (key.encode(), entry.config.to_value())
        })
        .collect()
}
