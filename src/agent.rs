//! Agent bootstrap: turn the attach-time argument string into a configured
//! transformer and register it with the host.
//!
//! Arguments are `key=value` pairs separated by `,`:
//!
//! ```text
//! config=/etc/sqlspy.json,class=com.mysql.cj.jdbc.ConnectionImpl,type_hints=true
//! ```
//!
//! | key | effect |
//! |---|---|
//! | `config` | JSON file loaded first, see [`AgentConfig::from_json_file`] |
//! | `class` | target class (`.` or `/` separated) |
//! | `method` | target method name |
//! | `descriptor` | target method descriptor |
//! | `proxy` | proxy class constructed by the redirect |
//! | `type_hints` | `true`/`false`, prefix recorded values with their type |
//!
//! Precedence, lowest first: defaults, `config`, `SQLSPY_*` environment, the
//! remaining arguments.

use anyhow::{anyhow, bail, Context, Result};
use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use sqlspy_core::rewriter::internal_name;
use sqlspy_core::{ModuleTransformer, StatementTransformer};
use sqlspy_types::{AgentConfig, LogSink, TracingSink};

/// The host's module-loading pipeline.
pub trait ModuleLoadPipeline {
    fn add_transformer(&mut self, transformer: Arc<dyn ModuleTransformer>);
}

/// A pipeline that applies its transformers in registration order.
#[derive(Default)]
pub struct TransformerChain {
    transformers: Vec<Arc<dyn ModuleTransformer>>,
}

impl TransformerChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    /// Bytes the host should define for `identity`.
    pub fn define<'a>(&self, identity: &str, bytes: &'a [u8]) -> Cow<'a, [u8]> {
        let mut current = Cow::Borrowed(bytes);
        for transformer in &self.transformers {
            current = match current {
                Cow::Borrowed(b) => transformer.transform(identity, b),
                Cow::Owned(b) => Cow::Owned(transformer.transform(identity, &b).into_owned()),
            };
        }
        current
    }
}

impl ModuleLoadPipeline for TransformerChain {
    fn add_transformer(&mut self, transformer: Arc<dyn ModuleTransformer>) {
        self.transformers.push(transformer);
    }
}

/// Parse `key=value,key=value` into ordered pairs. Empty segments are skipped.
pub fn parse_agent_args(args: &str) -> Result<Vec<(String, String)>> {
    args.split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| anyhow!("agent argument '{}' is not key=value", segment))?;
            Ok((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("{} expects true or false, got '{}'", key, value),
    }
}

/// Build the agent configuration from an optional argument string.
pub fn config_from_args(args: Option<&str>) -> Result<AgentConfig> {
    let pairs = match args {
        Some(args) => parse_agent_args(args)?,
        None => Vec::new(),
    };

    let mut config = match pairs.iter().find(|(key, _)| key == "config") {
        Some((_, path)) => AgentConfig::from_json_file(Path::new(path))?,
        None => AgentConfig::default(),
    }
    .with_env_overrides();

    for (key, value) in &pairs {
        match key.as_str() {
            "config" => {}
            "class" => config.target.class_name = internal_name(value).into_owned(),
            "method" => config.target.method.name = value.clone(),
            "descriptor" => config.target.method.descriptor = value.clone(),
            "proxy" => config.target.proxy_class = internal_name(value).into_owned(),
            "type_hints" => config.proxy.type_hints = parse_bool(key, value)?,
            other => bail!("unknown agent argument '{}'", other),
        }
    }

    config
        .target
        .validate()
        .context("invalid agent configuration")?;
    Ok(config)
}

pub struct Agent;

impl Agent {
    /// Static attach: configure and register the statement transformer.
    pub fn premain(
        args: Option<&str>,
        pipeline: &mut dyn ModuleLoadPipeline,
    ) -> Result<Arc<StatementTransformer>> {
        Self::install(args, pipeline, TracingSink::shared())
    }

    /// Dynamic attach. Classes already loaded are not retransformed.
    pub fn agentmain(
        args: Option<&str>,
        pipeline: &mut dyn ModuleLoadPipeline,
    ) -> Result<Arc<StatementTransformer>> {
        Self::install(args, pipeline, TracingSink::shared())
    }

    /// Register a transformer reporting to `sink`.
    pub fn install(
        args: Option<&str>,
        pipeline: &mut dyn ModuleLoadPipeline,
        sink: Arc<dyn LogSink>,
    ) -> Result<Arc<StatementTransformer>> {
        let config = config_from_args(args)?;
        info!(
            class = %config.target.class_name,
            method = %config.target.method,
            proxy = %config.target.proxy_class,
            type_hints = config.proxy.type_hints,
            "installing statement transformer"
        );
        let transformer = Arc::new(StatementTransformer::new(config.target, sink));
        pipeline.add_transformer(transformer.clone());
        Ok(transformer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlspy_types::MemorySink;
    use std::io::Write;

    #[test]
    fn test_parse_agent_args() {
        let pairs = parse_agent_args(" class=a.b.C , ,type_hints=true").unwrap();
        assert_eq!(
            pairs,
            vec![
                ("class".to_string(), "a.b.C".to_string()),
                ("type_hints".to_string(), "true".to_string()),
            ]
        );
        assert!(parse_agent_args("class").is_err());
    }

    #[test]
    fn test_arguments_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"target": {{"class_name": "org/h2/jdbc/JdbcConnection"}}, "proxy": {{"type_hints": true}}}}"#
        )
        .unwrap();
        let args = format!(
            "config={},method=prepareCall,type_hints=false",
            file.path().display()
        );
        let config = config_from_args(Some(&args)).unwrap();
        assert_eq!(config.target.class_name, "org/h2/jdbc/JdbcConnection");
        assert_eq!(config.target.method.name, "prepareCall");
        assert!(!config.proxy.type_hints);
    }

    #[test]
    fn test_invalid_arguments_are_rejected() {
        assert!(config_from_args(Some("colour=blue")).is_err());
        assert!(config_from_args(Some("type_hints=maybe")).is_err());
        assert!(config_from_args(Some("method=<init>")).is_err());
    }

    #[test]
    fn test_install_registers_transformer() {
        let mut chain = TransformerChain::new();
        let sink = MemorySink::shared();
        let transformer =
            Agent::install(Some("class=com.example.Conn"), &mut chain, sink.clone()).unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(transformer.rewriter().target().class_name, "com/example/Conn");

        let bytes = b"unrelated";
        assert!(matches!(chain.define("org/example/Other", bytes), Cow::Borrowed(_)));
        assert!(matches!(chain.define("com/example/Conn", bytes), Cow::Borrowed(_)));
        assert_eq!(transformer.stats().failed, 1);
        assert_eq!(sink.diagnostics().len(), 1);
    }
}
