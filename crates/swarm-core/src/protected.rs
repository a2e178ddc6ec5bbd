//! Reserved server names owned by the host application.

/// Names the host keeps for its own tooling. Compared case-insensitively.
pub const PROTECTED_SERVER_NAMES: &[&str] = &["codeagentswarm-tasks", "codeagentswarm"];

/// Returns true if `name` is reserved, ignoring ASCII case.
pub fn is_protected_name(name: &str) -> bool {
    PROTECTED_SERVER_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(name))
}
