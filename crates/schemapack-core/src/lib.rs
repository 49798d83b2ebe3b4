//! SchemaPack Core - portable schema packages and their live counterparts
//!
//! This crate provides the foundational operations for loading, tracking and
//! sharing schema packages inside a collaborative document:
//! - Package definition, manifest and library models
//! - Content-hash canonicalization (identifier independent)
//! - Idempotent, transactional package installation (hydration)
//! - Drift detection against the recorded install baseline
//! - Structured field-level diffing between definitions
//! - Versioned library publishing with fork lineage
//!
//! Validation of incoming definitions lives in `rules` and runs upstream of
//! installation.

pub mod apply;
pub mod canonical;
pub mod diff;
pub mod document;
pub mod drift;
pub mod errors;
pub mod library;
pub mod logging_facility;
pub mod model;
pub mod rules;

pub use schemapack_core_types as core_types;

// Re-export commonly used types
pub use apply::{apply_package, is_loaded, uninstall, ApplyOptions, ApplyResult, ApplyStatus};
pub use canonical::compute_content_hash;
pub use document::{Document, DocumentRead, DocumentStore, DocumentWrite};
pub use errors::{ExError, ExErrorKind, Result, SchemaPackError};
pub use model::{LivePackage, PackageDefinition, PackageManifest};
