//! Engine-level commands over a persisted document and library.
//!
//! Mutating commands load the document, run the core operation and save it
//! back inside one `IMMEDIATE` SQLite transaction, so the manifest check of an
//! install and its write cannot interleave with another connection's. Read
//! commands never write.

use std::time::Instant;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use schemapack_core::core_types::Origin;
use schemapack_core::diff::{diff_package, PackageDiff};
use schemapack_core::document::RemovedCounts;
use schemapack_core::drift::{check_drift, drift_report, DriftReport, DriftStatus};
use schemapack_core::errors::{ExError, ExErrorKind, SchemaPackError};
use schemapack_core::library::{
    apply_library_entry, check_for_update, get_version, list_library, preview_update, publish,
    PublishResult, UpdateCheck,
};
use schemapack_core::model::{LibraryEntrySummary, LibraryVersion};
use schemapack_core::{
    apply_package, log_op_end, log_op_error, log_op_start, uninstall, ApplyOptions, ApplyResult,
    Document,
};
use schemapack_store::errors::from_rusqlite;
use schemapack_store::{DocumentRepo, Result, SqliteLibrary};
use serde::Serialize;

use crate::registry::PackageRegistry;

/// Per-invocation settings
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Document the command runs against
    pub document_id: String,
    /// Label for bundled installs
    pub origin: Origin,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            document_id: "default".to_string(),
            origin: Origin::package_apply(),
        }
    }
}

impl EngineConfig {
    pub fn for_document(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            ..Self::default()
        }
    }
}

/// Engine-level commands that require I/O (database, registry).
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    /// Install a bundled package from the registry.
    ApplyPackage { package_id: String },
    /// Tear an installed package down.
    Uninstall { package_id: String },
    /// Drift status, or the full debug report when `detailed`.
    CheckDrift { package_id: String, detailed: bool },
    /// Structured diff of snapshot vs live.
    DiffPackage { package_id: String },
    /// Publish a live package as the next library version.
    Publish {
        package_id: String,
        changelog: Option<String>,
    },
    ListLibrary,
    /// One version of an entry (latest when `version` is `None`).
    GetLibraryVersion {
        entry_id: String,
        version: Option<u32>,
    },
    /// Install a library version into the document.
    ApplyLibraryEntry {
        entry_id: String,
        version: Option<u32>,
    },
    /// Compare an installed package with its library head.
    CheckUpdate { package_id: String },
    /// Diff an installed snapshot against its library head.
    PreviewUpdate { package_id: String },
}

impl EngineCommand {
    /// Stable operation name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            EngineCommand::ApplyPackage { .. } => "apply_package",
            EngineCommand::Uninstall { .. } => "uninstall",
            EngineCommand::CheckDrift { .. } => "check_drift",
            EngineCommand::DiffPackage { .. } => "diff_package",
            EngineCommand::Publish { .. } => "publish",
            EngineCommand::ListLibrary => "list_library",
            EngineCommand::GetLibraryVersion { .. } => "get_library_version",
            EngineCommand::ApplyLibraryEntry { .. } => "apply_library_entry",
            EngineCommand::CheckUpdate { .. } => "check_update",
            EngineCommand::PreviewUpdate { .. } => "preview_update",
        }
    }
}

/// Result of applying an engine command.
///
/// Serializes as the bare inner value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EngineCommandResult {
    Applied(ApplyResult),
    #[serde(rename_all = "camelCase")]
    Uninstalled {
        package_id: String,
        removed: RemovedCounts,
    },
    Drift(DriftStatus),
    DriftReport(DriftReport),
    Diff(PackageDiff),
    Published(PublishResult),
    Library(Vec<LibraryEntrySummary>),
    LibraryVersion(LibraryVersion),
    UpdateCheck(UpdateCheck),
}

/// Apply an engine command against the configured document.
///
/// # Errors
///
/// Returns `NotFound` for an unknown bundled package, an unloaded package or
/// a missing library entry/version, and persistence errors from the store.
pub fn apply_engine_command(
    cmd: EngineCommand,
    conn: &mut Connection,
    registry: &PackageRegistry,
    config: &EngineConfig,
) -> Result<EngineCommandResult> {
    let start = Instant::now();
    let op = cmd.name();
    log_op_start!(
        "engine_command",
        command = op,
        document_id = %config.document_id
    );

    let result = dispatch(cmd, conn, registry, config);

    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => log_op_end!("engine_command", duration_ms = duration_ms, command = op),
        Err(e) => log_op_error!(
            "engine_command",
            e.clone(),
            duration_ms = duration_ms,
            command = op
        ),
    }

    result
}

fn dispatch(
    cmd: EngineCommand,
    conn: &mut Connection,
    registry: &PackageRegistry,
    config: &EngineConfig,
) -> Result<EngineCommandResult> {
    let document_id = config.document_id.as_str();

    match cmd {
        EngineCommand::ApplyPackage { package_id } => {
            let definition = registry.get(&package_id).ok_or_else(|| {
                ExError::new(ExErrorKind::NotFound)
                    .with_op("apply_package")
                    .with_package_id(package_id.clone())
                    .with_message("no bundled package with this id")
            })?;
            let options = ApplyOptions::default().with_origin(config.origin.clone());
            let result = with_document(conn, document_id, |_, doc| {
                Ok(apply_package(doc, definition, &options)?)
            })?;
            Ok(EngineCommandResult::Applied(result))
        }
        EngineCommand::Uninstall { package_id } => {
            let removed =
                with_document(conn, document_id, |_, doc| Ok(uninstall(doc, &package_id)?))?;
            Ok(EngineCommandResult::Uninstalled {
                package_id,
                removed,
            })
        }
        EngineCommand::CheckDrift {
            package_id,
            detailed,
        } => {
            let doc = DocumentRepo::load_or_new(conn, document_id)?;
            if detailed {
                drift_report(&doc, &package_id)
                    .map(EngineCommandResult::DriftReport)
                    .ok_or_else(|| not_loaded(&package_id))
            } else {
                Ok(EngineCommandResult::Drift(check_drift(&doc, &package_id)?))
            }
        }
        EngineCommand::DiffPackage { package_id } => {
            let doc = DocumentRepo::load_or_new(conn, document_id)?;
            diff_package(&doc, &package_id)
                .map(EngineCommandResult::Diff)
                .ok_or_else(|| not_loaded(&package_id))
        }
        EngineCommand::Publish {
            package_id,
            changelog,
        } => {
            let doc = DocumentRepo::load_or_new(conn, document_id)?;
            let mut library = SqliteLibrary::new(conn);
            let published = publish(&doc, &mut library, &package_id, changelog)?;
            Ok(EngineCommandResult::Published(published))
        }
        EngineCommand::ListLibrary => {
            let library = SqliteLibrary::new(conn);
            Ok(EngineCommandResult::Library(list_library(&library)?))
        }
        EngineCommand::GetLibraryVersion { entry_id, version } => {
            let library = SqliteLibrary::new(conn);
            Ok(EngineCommandResult::LibraryVersion(get_version(
                &library, &entry_id, version,
            )?))
        }
        EngineCommand::ApplyLibraryEntry { entry_id, version } => {
            let result = with_document(conn, document_id, |tx, doc| {
                let library = SqliteLibrary::new(tx);
                apply_library_entry(doc, &library, &entry_id, version)
            })?;
            Ok(EngineCommandResult::Applied(result))
        }
        EngineCommand::CheckUpdate { package_id } => {
            let doc = DocumentRepo::load_or_new(conn, document_id)?;
            let library = SqliteLibrary::new(conn);
            Ok(EngineCommandResult::UpdateCheck(check_for_update(
                &doc,
                &library,
                &package_id,
            )?))
        }
        EngineCommand::PreviewUpdate { package_id } => {
            let doc = DocumentRepo::load_or_new(conn, document_id)?;
            let library = SqliteLibrary::new(conn);
            Ok(EngineCommandResult::Diff(preview_update(
                &doc,
                &library,
                &package_id,
            )?))
        }
    }
}

/// Load, mutate and save a document under one write lock.
///
/// The document is saved only when the operation committed a change-set; a
/// skipped install leaves the store untouched. On `Err` the transaction rolls
/// back.
fn with_document<T>(
    conn: &mut Connection,
    document_id: &str,
    op: impl FnOnce(&Transaction<'_>, &mut Document) -> Result<T>,
) -> Result<T> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(from_rusqlite)?;

    let mut doc = DocumentRepo::load_or_new(&tx, document_id)?;
    let out = op(&tx, &mut doc)?;
    if !doc.change_log().is_empty() {
        DocumentRepo::save_in(&tx, document_id, &doc)?;
    }

    tx.commit().map_err(from_rusqlite)?;
    Ok(out)
}

fn not_loaded(package_id: &str) -> ExError {
    SchemaPackError::ManifestEntryNotFound {
        package_id: package_id.to_string(),
    }
    .into()
}
