//! Shared types for the sqlspy workspace.
//!
//! - [`config`]: attach-time configuration of the rewriter and the proxy
//! - [`sink`]: log sinks receiving statement events and diagnostics
//! - [`env_utils`]: environment overrides read while building the config

pub mod config;
pub mod env_utils;
pub mod sink;

pub use config::{AgentConfig, MethodSignature, ProxySettings, RewriteTarget};
pub use sink::{Diagnostic, LogSink, MemorySink, StatementEvent, TracingSink};
