//! SchemaPack Engine - Orchestration layer
//!
//! Runs package, drift, diff and library commands against a document and a
//! library persisted in SQLite, with bundled definitions supplied by a
//! [`registry::PackageRegistry`].

pub mod commands;
pub mod registry;

pub use commands::engine_command::{
    apply_engine_command, EngineCommand, EngineCommandResult, EngineConfig,
};
pub use registry::PackageRegistry;
