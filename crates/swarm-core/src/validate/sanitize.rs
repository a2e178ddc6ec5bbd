//! Display-only masking of sensitive environment values.
//!
//! The output of these functions must never be written back to storage.

use std::collections::BTreeMap;

use crate::types::EnvValue;

/// Lowercased key fragments that mark a variable as sensitive.
pub const SENSITIVE_KEY_MARKERS: &[&str] = &[
    "key",
    "token",
    "secret",
    "password",
    "pwd",
    "auth",
    "credential",
];

const VISIBLE_PREFIX: usize = 4;
const MAX_MASK: usize = 8;

fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    SENSITIVE_KEY_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}

/// Keep the first four characters and mask up to eight of the rest.
pub fn mask_value(value: &str) -> String {
    let total = value.chars().count();
    if total <= VISIBLE_PREFIX {
        return value.to_string();
    }
    let mut masked: String = value.chars().take(VISIBLE_PREFIX).collect();
    masked.push_str(&"*".repeat((total - VISIBLE_PREFIX).min(MAX_MASK)));
    masked
}

/// Render an env block for display, masking string values of sensitive keys.
pub fn sanitize_env(env: &BTreeMap<String, EnvValue>) -> BTreeMap<String, String> {
    env.iter()
        .map(|(key, value)| {
            let shown = match value {
                EnvValue::String(s) if is_sensitive_key(key) => mask_value(s),
                other => other.to_string(),
            };
            (key.clone(), shown)
        })
        .collect()
}
