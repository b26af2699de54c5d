//! Attach-time configuration.
//!
//! Everything the rewriter and the statement proxy need is carried by explicit
//! values built here and passed to their constructors. Nothing is read from
//! process-wide statics after construction.
//!
//! # Example
//!
//! ```
//! use sqlspy_types::config::{AgentConfig, MethodSignature};
//!
//! let config = AgentConfig::default()
//!     .with_target_class("org/example/Connection")
//!     .with_method(MethodSignature::new(
//!         "prepare",
//!         "(Ljava/lang/String;)Ljava/sql/PreparedStatement;",
//!     ))
//!     .with_type_hints(true);
//!
//! assert_eq!(config.target.class_name, "org/example/Connection");
//! assert_eq!(config.target.renamed_name(), "prepare$sqlspy$original");
//! assert!(config.proxy.type_hints);
//! ```

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::env_utils::{env_bool_opt, env_string};

/// Internal name of the class whose factory method is redirected by default.
pub const DEFAULT_TARGET_CLASS: &str = "com/mysql/jdbc/ConnectionImpl";

/// Name of the factory method redirected by default.
pub const DEFAULT_TARGET_METHOD: &str = "prepareStatement";

/// Descriptor of `prepareStatement(String sql, int resultSetType, int resultSetConcurrency)`.
pub const DEFAULT_TARGET_DESCRIPTOR: &str = "(Ljava/lang/String;II)Ljava/sql/PreparedStatement;";

/// Internal name of the JVM-side proxy class constructed by the redirect.
pub const DEFAULT_PROXY_CLASS: &str = "com/sqlspy/PreparedStatementProxy";

/// Suffix appended to the original method name to form its reserved identity.
pub const DEFAULT_RENAMED_SUFFIX: &str = "$sqlspy$original";

/// Exception type the redirect declares on top of the original's.
pub const DEFAULT_EXTRA_EXCEPTION: &str = "java/sql/SQLException";

/// Positional placeholder marker in command templates.
pub const DEFAULT_MARKER: char = '?';

/// Environment variable overriding [`RewriteTarget::class_name`].
pub const ENV_TARGET_CLASS: &str = "SQLSPY_TARGET_CLASS";

/// Environment variable overriding [`ProxySettings::type_hints`].
pub const ENV_TYPE_HINTS: &str = "SQLSPY_TYPE_HINTS";

/// A method identified by name and JVM descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSignature {
    pub name: String,
    pub descriptor: String,
}

impl MethodSignature {
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }

    /// Parse `name(params)ret`, e.g. `prepareStatement(Ljava/lang/String;II)Ljava/sql/PreparedStatement;`.
    pub fn parse(spec: &str) -> Result<Self> {
        let open = spec
            .find('(')
            .ok_or_else(|| anyhow!("method signature '{}' has no descriptor", spec))?;
        let (name, descriptor) = spec.split_at(open);
        if name.is_empty() {
            return Err(anyhow!("method signature '{}' has no name", spec));
        }
        if !descriptor.contains(')') {
            return Err(anyhow!("method signature '{}' has an unterminated descriptor", spec));
        }
        Ok(Self::new(name, descriptor))
    }
}

impl Default for MethodSignature {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_METHOD, DEFAULT_TARGET_DESCRIPTOR)
    }
}

impl std::fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.name, self.descriptor)
    }
}

/// Which module and method the rewriter redirects, and what it redirects to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteTarget {
    /// Internal (slash separated) name of the class to rewrite.
    pub class_name: String,

    /// The single method redirected through the proxy.
    pub method: MethodSignature,

    /// Internal name of the proxy class. Its constructor must accept
    /// `(first parameter type, return type)`.
    pub proxy_class: String,

    /// Appended to the method name to form the renamed identity of the original body.
    pub renamed_suffix: String,

    /// Exception classes declared by the redirect in addition to the original's.
    pub extra_exceptions: Vec<String>,
}

impl Default for RewriteTarget {
    fn default() -> Self {
        Self {
            class_name: DEFAULT_TARGET_CLASS.to_string(),
            method: MethodSignature::default(),
            proxy_class: DEFAULT_PROXY_CLASS.to_string(),
            renamed_suffix: DEFAULT_RENAMED_SUFFIX.to_string(),
            extra_exceptions: vec![DEFAULT_EXTRA_EXCEPTION.to_string()],
        }
    }
}

impl RewriteTarget {
    /// Name under which the original method body is preserved.
    pub fn renamed_name(&self) -> String {
        format!("{}{}", self.method.name, self.renamed_suffix)
    }

    /// Reject configurations the rewriter can never act on.
    pub fn validate(&self) -> Result<()> {
        if self.class_name.is_empty() || self.class_name.contains('.') {
            return Err(anyhow!(
                "target class '{}' must be an internal name like com/example/Type",
                self.class_name
            ));
        }
        if self.proxy_class.is_empty() || self.proxy_class.contains('.') {
            return Err(anyhow!(
                "proxy class '{}' must be an internal name like com/example/Proxy",
                self.proxy_class
            ));
        }
        if self.method.name.is_empty() || self.method.name.starts_with('<') {
            return Err(anyhow!(
                "target method '{}' cannot be rewritten",
                self.method.name
            ));
        }
        if self.renamed_suffix.is_empty() {
            return Err(anyhow!("renamed suffix must not be empty"));
        }
        Ok(())
    }
}

/// Behavior switches of the statement proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    /// Prefix every recorded fragment with a type hint such as `(int)`.
    pub type_hints: bool,

    /// Placeholder marker scanned for during reconstruction.
    pub marker: char,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            type_hints: false,
            marker: DEFAULT_MARKER,
        }
    }
}

/// Complete configuration fixed when the agent attaches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub target: RewriteTarget,
    pub proxy: ProxySettings,
}

impl AgentConfig {
    /// Load a JSON configuration file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.target.validate()?;
        Ok(config)
    }

    /// Apply `SQLSPY_*` environment overrides on top of this configuration.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(class_name) = env_string(ENV_TARGET_CLASS) {
            self.target.class_name = class_name.replace('.', "/");
        }
        if let Some(type_hints) = env_bool_opt(ENV_TYPE_HINTS) {
            self.proxy.type_hints = type_hints;
        }
        self
    }

    pub fn with_target_class(mut self, class_name: impl Into<String>) -> Self {
        self.target.class_name = class_name.into();
        self
    }

    pub fn with_method(mut self, method: MethodSignature) -> Self {
        self.target.method = method;
        self
    }

    pub fn with_proxy_class(mut self, proxy_class: impl Into<String>) -> Self {
        self.target.proxy_class = proxy_class.into();
        self
    }

    pub fn with_renamed_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.target.renamed_suffix = suffix.into();
        self
    }

    pub fn with_type_hints(mut self, type_hints: bool) -> Self {
        self.proxy.type_hints = type_hints;
        self
    }

    pub fn with_marker(mut self, marker: char) -> Self {
        self.proxy.marker = marker;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_target_is_mysql_prepare_statement() {
        let target = RewriteTarget::default();
        assert_eq!(target.class_name, "com/mysql/jdbc/ConnectionImpl");
        assert_eq!(target.method.name, "prepareStatement");
        assert_eq!(
            target.method.descriptor,
            "(Ljava/lang/String;II)Ljava/sql/PreparedStatement;"
        );
        assert_eq!(target.extra_exceptions, vec!["java/sql/SQLException"]);
        assert!(target.validate().is_ok());
    }

    #[test]
    fn test_method_signature_parse() {
        let sig = MethodSignature::parse("prepare(Ljava/lang/String;)Ljava/lang/Object;").unwrap();
        assert_eq!(sig.name, "prepare");
        assert_eq!(sig.descriptor, "(Ljava/lang/String;)Ljava/lang/Object;");
        assert_eq!(sig.to_string(), "prepare(Ljava/lang/String;)Ljava/lang/Object;");

        assert!(MethodSignature::parse("prepare").is_err());
        assert!(MethodSignature::parse("(I)V").is_err());
        assert!(MethodSignature::parse("prepare(I").is_err());
    }

    #[test]
    fn test_validate_rejects_dotted_names() {
        let target = RewriteTarget {
            class_name: "com.mysql.jdbc.ConnectionImpl".to_string(),
            ..RewriteTarget::default()
        };
        assert!(target.validate().is_err());

        let target = RewriteTarget {
            method: MethodSignature::new("<init>", "()V"),
            ..RewriteTarget::default()
        };
        assert!(target.validate().is_err());
    }

    #[test]
    fn test_json_config_partial_fields_use_defaults() {
        let config = AgentConfig::from_json_str(
            r#"{ "target": { "class_name": "org/h2/jdbc/JdbcConnection" }, "proxy": { "type_hints": true } }"#,
        )
        .unwrap();
        assert_eq!(config.target.class_name, "org/h2/jdbc/JdbcConnection");
        assert_eq!(config.target.method, MethodSignature::default());
        assert!(config.proxy.type_hints);
        assert_eq!(config.proxy.marker, '?');
    }

    #[test]
    fn test_json_config_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sqlspy.json");
        let config = AgentConfig::default().with_renamed_suffix("Org");
        fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = AgentConfig::from_json_file(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.target.renamed_name(), "prepareStatementOrg");
    }

    #[test]
    fn test_invalid_json_config_is_rejected() {
        let err = AgentConfig::from_json_str(r#"{ "target": { "class_name": "a.b.C" } }"#)
            .unwrap_err();
        assert!(err.to_string().contains("internal name"), "{}", err);
    }
}
