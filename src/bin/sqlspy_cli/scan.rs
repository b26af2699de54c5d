//! Scan command - find which class files in a tree the agent would rewrite

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

use sqlspy_classfile::ClassFile;
use sqlspy_core::{ModuleRewriter, RewriteOutcome};
use tracing::debug;

use super::{print_json, read_class, TargetArgs};

#[derive(Parser, Debug)]
pub struct ScanCmd {
    /// Directory searched recursively for `.class` files
    pub dir: PathBuf,

    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanHit {
    pub path: PathBuf,
    pub class_name: String,
    /// `rewritable`, `already_rewritten`, `no_method` or `unsupported`.
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub target_class: String,
    pub target_method: String,
    pub scanned: usize,
    pub unreadable: Vec<PathBuf>,
    pub hits: Vec<ScanHit>,
}

enum FileResult {
    Skipped,
    Hit(ScanHit),
    Unreadable(PathBuf),
}

fn collect_class_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            collect_class_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "class") {
            out.push(path);
        }
    }
    Ok(())
}

fn scan_file(rewriter: &ModuleRewriter, path: &Path) -> FileResult {
    let parsed = read_class(path).and_then(|bytes| {
        let class = ClassFile::parse(&bytes)?;
        Ok((class.class_name()?, bytes))
    });
    let (class_name, bytes) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!(path = %path.display(), error = %format!("{:#}", e), "unreadable class file");
            return FileResult::Unreadable(path.to_path_buf());
        }
    };
    if !rewriter.matches_identity(&class_name) {
        return FileResult::Skipped;
    }

    let status = match rewriter.try_rewrite(&bytes) {
        Ok(RewriteOutcome::Rewritten { .. }) => "rewritable",
        Ok(RewriteOutcome::AlreadyRewritten) => "already_rewritten",
        Ok(RewriteOutcome::NoMatch) => "no_method",
        Err(e) => {
            debug!(path = %path.display(), error = %format!("{:#}", e), "target class cannot be rewritten");
            "unsupported"
        }
    };
    FileResult::Hit(ScanHit {
        path: path.to_path_buf(),
        class_name,
        status,
    })
}

impl ScanCmd {
    pub fn execute(&self, json_output: bool, verbose: bool) -> Result<()> {
        let config = self.target.load()?;
        let rewriter = ModuleRewriter::new(config.target);

        let mut files = Vec::new();
        collect_class_files(&self.dir, &mut files)?;
        files.sort();

        let results: Vec<FileResult> = files
            .par_iter()
            .map(|path| scan_file(&rewriter, path))
            .collect();

        let mut report = ScanReport {
            target_class: rewriter.target().class_name.clone(),
            target_method: rewriter.target().method.to_string(),
            scanned: files.len(),
            unreadable: Vec::new(),
            hits: Vec::new(),
        };
        for result in results {
            match result {
                FileResult::Skipped => {}
                FileResult::Hit(hit) => report.hits.push(hit),
                FileResult::Unreadable(path) => report.unreadable.push(path),
            }
        }

        if json_output {
            return print_json(&report);
        }

        println!(
            "Scanned {} class files for {}.{}",
            report.scanned, report.target_class, report.target_method
        );
        if report.hits.is_empty() {
            println!("  no matching classes");
        }
        for hit in &report.hits {
            println!("  {:<18} {}", hit.status, hit.path.display());
        }
        if !report.unreadable.is_empty() {
            println!("  {} unreadable file(s)", report.unreadable.len());
            if verbose {
                for path in &report.unreadable {
                    println!("    {}", path.display());
                }
            }
        }
        Ok(())
    }
}
