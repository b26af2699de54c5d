//! Environment variable helpers for attach-time overrides.
//!
//! The agent reads these once while building its [`AgentConfig`](crate::config::AgentConfig);
//! nothing consults the environment afterwards.
//!
//! # Example
//!
//! ```
//! use sqlspy_types::env_utils::{env_bool, env_string};
//!
//! let class: Option<String> = env_string("SQLSPY_TARGET_CLASS");
//! let hints = env_bool("SQLSPY_TYPE_HINTS");
//! # let _ = (class, hints);
//! ```

use std::str::FromStr;

/// Parse an environment variable into a type that implements `FromStr`.
///
/// Returns `None` if the variable is not set or cannot be parsed.
pub fn env_var<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Read a non-empty, trimmed string variable.
pub fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Interpret a variable as a boolean switch.
///
/// `1`, `true`, `yes`, `on` are true and `0`, `false`, `no`, `off` are false
/// (case-insensitive). Anything else, or an unset variable, is `None`.
pub fn env_bool_opt(key: &str) -> Option<bool> {
    env_string(key).and_then(|v| parse_switch(&v))
}

/// Like [`env_bool_opt`] but unset or unrecognized values are `false`.
pub fn env_bool(key: &str) -> bool {
    env_bool_opt(key).unwrap_or(false)
}

pub(crate) fn parse_switch(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_switch() {
        assert_eq!(parse_switch("TRUE"), Some(true));
        assert_eq!(parse_switch("on"), Some(true));
        assert_eq!(parse_switch("0"), Some(false));
        assert_eq!(parse_switch("Off"), Some(false));
        assert_eq!(parse_switch("maybe"), None);
    }

    #[test]
    fn test_unset_variables() {
        let key = "SQLSPY_TEST_SURELY_UNSET_VARIABLE";
        assert_eq!(env_string(key), None);
        assert_eq!(env_var::<u32>(key), None);
        assert!(!env_bool(key));
    }
}
