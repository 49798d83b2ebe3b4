//! Package commands: hash, validate, apply, uninstall, drift, diff

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use schemapack_core::compute_content_hash;
use schemapack_core::diff::render_human_summary;
use schemapack_engine::registry::load_file;
use schemapack_engine::{EngineCommand, EngineCommandResult};
use serde_json::json;

use crate::commands::{print_json, run};
use crate::GlobalArgs;

#[derive(Debug, Args)]
pub struct FileArgs {
    /// Definition file (.json, .yaml or .yml)
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct PackageArgs {
    pub package_id: String,
}

#[derive(Debug, Args)]
pub struct DriftArgs {
    pub package_id: String,

    /// Print the full drift report
    #[arg(long)]
    pub debug: bool,
}

#[derive(Debug, Args)]
pub struct DiffArgs {
    pub package_id: String,

    /// Print a Markdown summary instead of JSON
    #[arg(long)]
    pub summary: bool,
}

pub fn hash(args: FileArgs) -> Result<()> {
    let definition = load_file(&args.file)?;
    print_json(&json!({
        "packageId": definition.id,
        "contentHash": compute_content_hash(&definition),
    }))
}

pub fn validate(args: FileArgs) -> Result<()> {
    let definition = load_file(&args.file)?;
    print_json(&json!({
        "packageId": definition.id,
        "valid": true,
        "entities": definition.entity_count(),
    }))
}

pub fn apply(global: &GlobalArgs, args: PackageArgs) -> Result<()> {
    let result = run(
        global,
        EngineCommand::ApplyPackage {
            package_id: args.package_id,
        },
    )?;
    print_json(&result)
}

pub fn uninstall(global: &GlobalArgs, args: PackageArgs) -> Result<()> {
    let result = run(
        global,
        EngineCommand::Uninstall {
            package_id: args.package_id,
        },
    )?;
    print_json(&result)
}

pub fn drift(global: &GlobalArgs, args: DriftArgs) -> Result<()> {
    let result = run(
        global,
        EngineCommand::CheckDrift {
            package_id: args.package_id,
            detailed: args.debug,
        },
    )?;
    print_json(&result)
}

pub fn diff(global: &GlobalArgs, args: DiffArgs) -> Result<()> {
    let result = run(
        global,
        EngineCommand::DiffPackage {
            package_id: args.package_id,
        },
    )?;

    match result {
        EngineCommandResult::Diff(diff) if args.summary => {
            print!("{}", render_human_summary(&diff));
            Ok(())
        }
        EngineCommandResult::Diff(diff) => print_json(&diff),
        other => bail!("unexpected engine result: {:?}", other),
    }
}
