//! sqlspy: offline tooling for the prepared-statement logging agent
//!
//! The agent itself runs inside the host's class loading pipeline. This CLI
//! applies the same rewrite to class files on disk, to check what the agent
//! will do before attaching it.
//!
//! ## Commands
//!
//! - **rewrite**: redirect the target method of one class file
//! - **inspect**: list a class file's methods and their flags
//! - **scan**: find the target class in a directory tree
//!
//! ## Example Usage
//!
//! ```bash
//! # Preview the rewrite of the MySQL connection class
//! sqlspy rewrite ConnectionImpl.class
//!
//! # Rewrite a different driver and write the result
//! sqlspy rewrite JdbcConnection.class --class org.h2.jdbc.JdbcConnection -o out.class
//!
//! # Which classes under build/ would be rewritten?
//! sqlspy scan build/classes --json
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod sqlspy_cli;

use sqlspy_cli::{inspect::InspectCmd, rewrite::RewriteCmd, scan::ScanCmd};

#[derive(Parser)]
#[command(
    name = "sqlspy",
    author,
    version,
    about = "Inspect and rewrite class files for prepared-statement logging"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON instead of human-readable format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (debug logging and extra detail)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Redirect the target method of a class file through the statement proxy
    Rewrite(RewriteCmd),

    /// Show a class file's name, version and methods
    Inspect(InspectCmd),

    /// Report which class files in a directory contain the target
    Scan(ScanCmd),
}

fn main() -> Result<()> {
    let Cli {
        command,
        json,
        verbose,
    } = Cli::parse();
    sqlspy::init_tracing(Some(if verbose { "debug" } else { "warn" }), false)?;

    match command {
        Commands::Rewrite(cmd) => cmd.execute(json, verbose),
        Commands::Inspect(cmd) => cmd.execute(json, verbose),
        Commands::Scan(cmd) => cmd.execute(json, verbose),
    }
}
