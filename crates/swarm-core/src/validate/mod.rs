//! Validation of user-supplied MCP server configuration.
//!
//! Accepts two input shapes:
//! - a direct server object (`{"command": ...}`), which still needs a name
//! - a wrapped object (`{"mcpServers": {"name": {...}}}`)
//!
//! Every check is pure; the only configuration is the protected name set.

pub mod sanitize;

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::config::{MCP_SERVERS_KEY, StorageKey};
use crate::error::{FieldError, NameError, ValidationError, ValidationResult};
use crate::protected::is_protected_name;
use crate::types::{ServerConfig, ServerMap};

pub use sanitize::{SENSITIVE_KEY_MARKERS, mask_value, sanitize_env};

/// Name used to validate a direct server object before the user names it.
const PLACEHOLDER_NAME: &str = "new-server";

/// Outcome of structural validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedConfig {
    /// A single anonymous server; the caller must supply a name.
    Direct(ServerConfig),
    /// Named servers taken from the `mcpServers` wrapper.
    Wrapped(BTreeMap<String, ServerConfig>),
}

impl ValidatedConfig {
    pub fn needs_name(&self) -> bool {
        matches!(self, ValidatedConfig::Direct(_))
    }

    /// Named servers, `None` for a direct config.
    pub fn servers(&self) -> Option<&BTreeMap<String, ServerConfig>> {
        match self {
            ValidatedConfig::Wrapped(servers) => Some(servers),
            ValidatedConfig::Direct(_) => None,
        }
    }
}

/// Parse raw text into JSON.
pub fn parse_config(text: &str) -> ValidationResult<Value> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyInput);
    }
    serde_json::from_str(text).map_err(|e| ValidationError::Parse(e.to_string()))
}

/// Classify parsed JSON as a direct or wrapped config and validate every server in it.
pub fn validate_structure(parsed: &Value) -> ValidationResult<ValidatedConfig> {
    let object = parsed.as_object().ok_or_else(|| {
        ValidationError::Structure(
            "expected a JSON object describing a server or an 'mcpServers' mapping".to_string(),
        )
    })?;

    if matches!(object.get("command"), Some(Value::String(_))) {
        validate_server_config(PLACEHOLDER_NAME, parsed)?;
        return Ok(ValidatedConfig::Direct(to_server_config(
            PLACEHOLDER_NAME,
            parsed,
        )?));
    }

    let Some(wrapped) = object.get(MCP_SERVERS_KEY) else {
        return Err(ValidationError::Structure(format!(
            "expected either a server object with a 'command' field or an object with an '{MCP_SERVERS_KEY}' field"
        )));
    };

    let servers = wrapped.as_object().ok_or_else(|| {
        ValidationError::Structure(format!(
            "'{MCP_SERVERS_KEY}' must be an object mapping server names to configurations"
        ))
    })?;
    if servers.is_empty() {
        return Err(ValidationError::Structure(format!(
            "'{MCP_SERVERS_KEY}' must contain at least one server"
        )));
    }

    let mut validated = BTreeMap::new();
    for (name, config) in servers {
        validate_server_config(name, config)?;
        validated.insert(name.clone(), to_server_config(name, config)?);
    }
    Ok(ValidatedConfig::Wrapped(validated))
}

/// Check a single server config. The first failing check is reported.
pub fn validate_server_config(name: &str, config: &Value) -> ValidationResult<()> {
    if name.trim().is_empty() {
        return Err(NameError::Empty.into());
    }
    if is_protected_name(name) {
        return Err(ValidationError::ProtectedName(name.to_string()));
    }

    let object = match config {
        Value::Object(object) => object,
        _ => return Err(ValidationError::field(name, FieldError::NotAnObject)),
    };

    match object.get("command") {
        Some(Value::String(command)) if !command.trim().is_empty() => {}
        _ => return Err(ValidationError::field(name, FieldError::MissingCommand)),
    }

    if let Some(args) = object.get("args") {
        let args = args
            .as_array()
            .ok_or_else(|| ValidationError::field(name, FieldError::ArgsNotArray))?;
        if let Some(index) = args.iter().position(|arg| !arg.is_string()) {
            return Err(ValidationError::field(
                name,
                FieldError::ArgNotString { index },
            ));
        }
    }

    if let Some(env) = object.get("env") {
        let env = env
            .as_object()
            .ok_or_else(|| ValidationError::field(name, FieldError::EnvNotObject))?;
        if let Some(key) = first_non_scalar_key(env) {
            return Err(ValidationError::field(
                name,
                FieldError::EnvValueInvalid { key },
            ));
        }
    }

    Ok(())
}

/// Check that `name` can be used for a new server.
pub fn validate_name(name: &str, existing: &ServerMap) -> ValidationResult<()> {
    if name.trim().is_empty() {
        return Err(NameError::Empty.into());
    }
    if !is_legal_name(name) {
        return Err(NameError::InvalidCharacters(name.to_string()).into());
    }
    if is_protected_name(name) {
        return Err(NameError::Reserved(name.to_string()).into());
    }
    if existing.contains_key(name) {
        return Err(NameError::Duplicate(name.to_string()).into());
    }
    Ok(())
}

/// [`validate_name`], plus a check that `name` would be stored under its own
/// plain key rather than decoding as another server's disabled key.
pub fn validate_new_name(name: &str, existing: &ServerMap) -> ValidationResult<()> {
    validate_name(name, existing)?;
    if StorageKey::parse(name) != StorageKey::enabled(name) {
        return Err(NameError::DisabledPrefix(name.to_string()).into());
    }
    Ok(())
}

/// Full pipeline for an "add servers" request.
pub fn validate_new_config(text: &str, existing: &ServerMap) -> ValidationResult<ValidatedConfig> {
    let parsed = parse_config(text)?;
    let validated = validate_structure(&parsed)?;
    if let ValidatedConfig::Wrapped(servers) = &validated {
        for name in servers.keys() {
            validate_new_name(name, existing)?;
        }
    }
    Ok(validated)
}

/// Wrap a named server in the `mcpServers` shape so it can be resubmitted.
pub fn wrap_named(name: &str, config: &ServerConfig) -> Value {
    let mut servers = Map::new();
    servers.insert(name.to_string(), config.to_value());
    let mut root = Map::new();
    root.insert(MCP_SERVERS_KEY.to_string(), Value::Object(servers));
    Value::Object(root)
}

/// `^[A-Za-z0-9_-]+$`
fn is_legal_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn first_non_scalar_key(env: &Map<String, Value>) -> Option<String> {
    env.iter()
        .find(|(_, value)| !matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_)))
        .map(|(key, _)| key.clone())
}

fn to_server_config(name: &str, value: &Value) -> ValidationResult<ServerConfig> {
    serde_json::from_value(value.clone()).map_err(|e| {
        ValidationError::Structure(format!("server '{name}' could not be read: {e}"))
    })
}
