//! CLI subcommand implementations for sqlspy

pub mod inspect;
pub mod rewrite;
pub mod scan;

use anyhow::{Context, Result};
use clap::Args;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use sqlspy_core::rewriter::internal_name;
use sqlspy_types::AgentConfig;

/// Target selection shared by `rewrite` and `scan`.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// JSON configuration file (same format as the agent's `config=`)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Target class, overriding the configuration (e.g. com.mysql.cj.jdbc.ConnectionImpl)
    #[arg(long)]
    pub class: Option<String>,
}

impl TargetArgs {
    pub fn load(&self) -> Result<AgentConfig> {
        let mut config = match &self.config {
            Some(path) => AgentConfig::from_json_file(path)?,
            None => AgentConfig::default(),
        }
        .with_env_overrides();
        if let Some(class) = &self.class {
            config = config.with_target_class(internal_name(class).into_owned());
        }
        config.target.validate()?;
        Ok(config)
    }
}

pub fn read_class(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("read {}", path.display()))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
