//! SchemaPack Store - SQLite persistence for libraries and documents
//!
//! Provides:
//! - SQLite schema with a checksummed migrations framework
//! - `SqliteLibrary`, the durable `LibraryStore`
//! - `DocumentRepo`, saving a document state (manifest included) and its
//!   change log

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;

pub use errors::Result;
pub use repo::{DocumentRepo, SqliteLibrary};
