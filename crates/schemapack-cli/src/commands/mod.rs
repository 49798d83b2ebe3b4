pub mod library;
pub mod package;

use anyhow::{Context, Result};
use rusqlite::Connection;
use schemapack_engine::{apply_engine_command, EngineCommand, EngineCommandResult, EngineConfig};
use schemapack_engine::PackageRegistry;
use serde::Serialize;

use crate::GlobalArgs;

/// Open the store, load the registry and run one engine command
pub fn run(global: &GlobalArgs, cmd: EngineCommand) -> Result<EngineCommandResult> {
    let mut conn = open(global)?;
    let registry = PackageRegistry::load_dir(&global.packages)
        .with_context(|| format!("loading packages from {}", global.packages.display()))?;
    let config = EngineConfig::for_document(&global.document);

    Ok(apply_engine_command(cmd, &mut conn, &registry, &config)?)
}

fn open(global: &GlobalArgs) -> Result<Connection> {
    schemapack_store::db::open_store(&global.db)
        .with_context(|| format!("opening store {}", global.db.display()))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
