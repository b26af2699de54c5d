//! Rewrite command - apply the statement redirect to one class file

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use sqlspy_core::{ModuleRewriter, RewriteOutcome, RewriteReport};

use super::{print_json, read_class, sha256_hex, TargetArgs};

#[derive(Parser, Debug)]
pub struct RewriteCmd {
    /// Class file to rewrite
    pub input: PathBuf,

    /// Write the rewritten class here (without it, only the report is printed)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub target: TargetArgs,

    /// Exit successfully even when the class was left unchanged
    #[arg(long)]
    pub allow_noop: bool,
}

#[derive(Debug, Serialize)]
struct RewriteSummary {
    input: PathBuf,
    output: Option<PathBuf>,
    outcome: &'static str,
    input_sha256: String,
    output_sha256: String,
    report: Option<RewriteReport>,
}

impl RewriteCmd {
    pub fn execute(&self, json_output: bool, verbose: bool) -> Result<()> {
        let config = self.target.load()?;
        let input = read_class(&self.input)?;
        let rewriter = ModuleRewriter::new(config.target);

        let outcome = rewriter
            .try_rewrite(&input)
            .with_context(|| format!("rewrite {}", self.input.display()))?;
        let (name, bytes, report) = match outcome {
            RewriteOutcome::Rewritten { bytes, report } => ("rewritten", bytes, Some(report)),
            RewriteOutcome::NoMatch => ("no_match", input.clone(), None),
            RewriteOutcome::AlreadyRewritten => ("already_rewritten", input.clone(), None),
        };

        if let (Some(path), Some(_)) = (&self.output, &report) {
            std::fs::write(path, &bytes)
                .with_context(|| format!("write {}", path.display()))?;
        }

        let summary = RewriteSummary {
            input: self.input.clone(),
            output: report.as_ref().and(self.output.clone()),
            outcome: name,
            input_sha256: sha256_hex(&input),
            output_sha256: sha256_hex(&bytes),
            report,
        };
        if json_output {
            print_json(&summary)?;
        } else {
            print_summary(&summary, verbose);
        }

        if summary.report.is_none() && !self.allow_noop {
            let target = rewriter.target();
            bail!(
                "{} left unchanged ({}): target is {}.{}",
                self.input.display(),
                name,
                target.class_name,
                target.method
            );
        }
        Ok(())
    }
}

fn print_summary(summary: &RewriteSummary, verbose: bool) {
    match &summary.report {
        Some(report) => {
            println!(
                "Redirected {}.{}{}",
                report.class_name, report.method, report.descriptor
            );
            println!("  original kept as: {}", report.renamed_method);
            println!(
                "  proxy:            {}{}",
                report.proxy_class, report.proxy_constructor
            );
            println!("  invoke:           {}", report.invoke);
            println!(
                "  max stack/locals: {}/{}",
                report.max_stack, report.max_locals
            );
            if verbose {
                println!("  throws:           {}", report.declared_exceptions.join(", "));
            }
        }
        None => println!("Unchanged ({})", summary.outcome),
    }
    println!("  input sha256:     {}", summary.input_sha256);
    println!("  output sha256:    {}", summary.output_sha256);
    if let Some(path) = &summary.output {
        println!("  written to:       {}", path.display());
    }
}
