//! Storage key codec.
//!
//! The host persists the enabled/disabled state of a server in the key
//! itself: `name` is enabled, `_disabled_name` is disabled. This is the only
//! place that knows about the prefix.

use std::fmt;

const DISABLED_PREFIX: &str = "_disabled_";

/// A decoded storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    pub name: String,
    pub enabled: bool,
}

impl StorageKey {
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            enabled,
        }
    }

    pub fn enabled(name: impl Into<String>) -> Self {
        Self::new(name, true)
    }

    pub fn disabled(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }

    /// Decode a raw key from the persisted mapping.
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix(DISABLED_PREFIX) {
            Some(name) => Self::disabled(name),
            None => Self::enabled(raw),
        }
    }

    /// Encode back into the key the host stores.
    pub fn encode(&self) -> String {
        if self.enabled {
            self.name.clone()
        } else {
            format!("{DISABLED_PREFIX}{}", self.name)
        }
    }

    /// The same logical name in the opposite state.
    pub fn flipped(&self) -> Self {
        Self::new(self.name.clone(), !self.enabled)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
