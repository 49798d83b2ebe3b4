//! Library commands: publish, list, show, apply, check

use anyhow::Result;
use clap::{Args, Subcommand};
use schemapack_engine::EngineCommand;

use crate::commands::{print_json, run};
use crate::GlobalArgs;

#[derive(Debug, Args)]
pub struct PublishArgs {
    pub package_id: String,

    /// Note stored with the new version
    #[arg(long)]
    pub changelog: Option<String>,
}

#[derive(Debug, Args)]
pub struct LibraryArgs {
    #[command(subcommand)]
    pub command: LibraryCommand,
}

#[derive(Debug, Subcommand)]
pub enum LibraryCommand {
    /// List library entries
    List,
    /// Show one version of an entry (latest by default)
    Show(VersionArgs),
    /// Install a library version into the document
    Apply(VersionArgs),
    /// Check an installed package for a newer library version
    Check(CheckArgs),
}

#[derive(Debug, Args)]
pub struct VersionArgs {
    pub entry_id: String,

    #[arg(long)]
    pub version: Option<u32>,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    pub package_id: String,

    /// Print the diff to the library head instead of the check result
    #[arg(long)]
    pub preview: bool,
}

pub fn publish(global: &GlobalArgs, args: PublishArgs) -> Result<()> {
    let result = run(
        global,
        EngineCommand::Publish {
            package_id: args.package_id,
            changelog: args.changelog,
        },
    )?;
    print_json(&result)
}

pub fn execute(global: &GlobalArgs, args: LibraryArgs) -> Result<()> {
    let cmd = match args.command {
        LibraryCommand::List => EngineCommand::ListLibrary,
        LibraryCommand::Show(v) => EngineCommand::GetLibraryVersion {
            entry_id: v.entry_id,
            version: v.version,
        },
        LibraryCommand::Apply(v) => EngineCommand::ApplyLibraryEntry {
            entry_id: v.entry_id,
            version: v.version,
        },
        LibraryCommand::Check(c) if c.preview => EngineCommand::PreviewUpdate {
            package_id: c.package_id,
        },
        LibraryCommand::Check(c) => EngineCommand::CheckUpdate {
            package_id: c.package_id,
        },
    };
    print_json(&run(global, cmd)?)
}
