//! Inspect command - summarize a class file

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use sqlspy_classfile::access::describe_method_flags;
use sqlspy_classfile::ClassFile;

use super::{print_json, read_class};

#[derive(Parser, Debug)]
pub struct InspectCmd {
    /// Class file to inspect
    pub input: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct MethodSummary {
    pub name: String,
    pub descriptor: String,
    pub flags: Vec<&'static str>,
    pub max_stack: Option<u16>,
    pub max_locals: Option<u16>,
    pub code_length: Option<usize>,
    pub exceptions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ClassSummary {
    pub class_name: String,
    pub super_class: Option<String>,
    pub major_version: u16,
    pub minor_version: u16,
    pub is_interface: bool,
    pub constant_pool_entries: usize,
    pub methods: Vec<MethodSummary>,
}

pub fn summarize(class: &ClassFile) -> Result<ClassSummary> {
    let pool = &class.constant_pool;
    let methods = class
        .methods
        .iter()
        .map(|method| -> Result<MethodSummary> {
            let code = method.code(pool)?;
            Ok(MethodSummary {
                name: method.name(pool)?,
                descriptor: method.descriptor(pool)?,
                flags: describe_method_flags(method.access_flags),
                max_stack: code.as_ref().map(|c| c.max_stack),
                max_locals: code.as_ref().map(|c| c.max_locals),
                code_length: code.as_ref().map(|c| c.code.len()),
                exceptions: method.exceptions(pool)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ClassSummary {
        class_name: class.class_name()?,
        super_class: class.super_class_name()?,
        major_version: class.major_version,
        minor_version: class.minor_version,
        is_interface: class.is_interface(),
        constant_pool_entries: pool.count(),
        methods,
    })
}

impl InspectCmd {
    pub fn execute(&self, json_output: bool, verbose: bool) -> Result<()> {
        let bytes = read_class(&self.input)?;
        let class = ClassFile::parse(&bytes)
            .with_context(|| format!("parse {}", self.input.display()))?;
        let summary = summarize(&class)?;

        if json_output {
            return print_json(&summary);
        }

        println!("Class: {}", summary.class_name);
        if let Some(super_class) = &summary.super_class {
            println!("  extends:   {}", super_class);
        }
        println!(
            "  version:   {}.{}",
            summary.major_version, summary.minor_version
        );
        println!("  constants: {}", summary.constant_pool_entries);
        println!("Methods ({}):", summary.methods.len());
        for method in &summary.methods {
            println!(
                "  {} {}{}",
                method.flags.join(" "),
                method.name,
                method.descriptor
            );
            if verbose {
                if let (Some(stack), Some(locals), Some(len)) =
                    (method.max_stack, method.max_locals, method.code_length)
                {
                    println!(
                        "      stack={} locals={} code={} bytes",
                        stack, locals, len
                    );
                }
                if !method.exceptions.is_empty() {
                    println!("      throws {}", method.exceptions.join(", "));
                }
            }
        }
        Ok(())
    }
}
