//! Library manager operations
//!
//! - `publish`: live package → new library version (never deduplicated)
//! - `list_library` / `get_version`: catalog and version lookups
//! - `apply_library_entry`: install a library version with fork lineage
//! - `check_for_update` / `preview_update`: compare an installed snapshot
//!   with the entry head, without projecting the live document

use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::apply::{apply_package, ApplyOptions, ApplyResult};
use crate::canonical::compute_content_hash;
use crate::core_types::Origin;
use crate::diff::{diff_definitions, PackageDiff};
use crate::document::{DocumentRead, DocumentStore};
use crate::drift::project_live;
use crate::errors::{ExError, ExErrorKind, SchemaPackError};
use crate::library::store::{LibraryStore, NewVersion, PublishTarget};
use crate::model::{
    LibraryEntry, LibraryEntrySummary, LibraryVersion, Lineage, LivePackage, ManifestEntry,
    PackageDefinition,
};
use crate::{log_op_end, log_op_error, log_op_start};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResult {
    pub entry_id: String,
    pub version: u32,
    pub content_hash: String,
    /// True when this publish created the library entry
    pub created_entry: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCheck {
    pub package_id: String,
    pub entry_id: String,
    pub update_available: bool,
    pub installed_hash: String,
    pub latest_hash: String,
    pub latest_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_version: Option<u32>,
}

/// Publish a live package as the next version of its library entry.
///
/// The entry is resolved by the live package's recorded lineage, then by the
/// package id it was first published from; otherwise a new entry is created.
/// Every call appends a version, even when the content is unchanged.
///
/// # Errors
///
/// Returns `NotFound` if there is no live package with this id, or a
/// persistence error from the library store.
pub fn publish<L: LibraryStore + ?Sized>(
    doc: &dyn DocumentRead,
    library: &mut L,
    package_id: &str,
    changelog: Option<String>,
) -> Result<PublishResult, ExError> {
    let start = Instant::now();
    log_op_start!("publish", package_id = package_id);

    let result = publish_inner(doc, library, package_id, changelog);

    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(r) => log_op_end!(
            "publish",
            duration_ms = duration_ms,
            package_id = package_id,
            entry_id = %r.entry_id,
            version = r.version
        ),
        Err(e) => log_op_error!(
            "publish",
            e.clone(),
            duration_ms = duration_ms,
            package_id = package_id
        ),
    }

    result
}

fn publish_inner<L: LibraryStore + ?Sized>(
    doc: &dyn DocumentRead,
    library: &mut L,
    package_id: &str,
    changelog: Option<String>,
) -> Result<PublishResult, ExError> {
    let live = doc
        .live_package(package_id)
        .ok_or_else(|| SchemaPackError::PackageNotFound {
            package_id: package_id.to_string(),
        })?;

    let snapshot_groups = doc
        .manifest_entry(package_id)
        .map(|e| e.snapshot.schema_groups.as_slice())
        .unwrap_or(&[]);
    let fallback = PackageDefinition::new(&live.id, &live.name);
    let snapshot = project_live(doc, package_id, snapshot_groups, &fallback).definition;
    let content_hash = compute_content_hash(&snapshot);

    let published = library.publish_version(
        PublishTarget {
            lineage_entry_id: live.library_entry_id.clone(),
            new_entry: LibraryEntry {
                entry_id: Uuid::now_v7().to_string(),
                source_package_id: live.id.clone(),
                name: live.name.clone(),
                description: live.description.clone(),
                color: live.color.clone(),
                versions: Vec::new(),
            },
        },
        NewVersion {
            snapshot,
            content_hash: content_hash.clone(),
            changelog,
            published_at: Utc::now(),
        },
    )?;

    Ok(PublishResult {
        entry_id: published.entry_id,
        version: published.version.version,
        content_hash,
        created_entry: published.created_entry,
    })
}

/// Entry a live package belongs to: recorded lineage first, then the entry it
/// was first published into
fn find_entry<L: LibraryStore + ?Sized>(
    library: &L,
    live: &LivePackage,
) -> Result<Option<LibraryEntry>, ExError> {
    if let Some(entry_id) = &live.library_entry_id {
        if let Some(entry) = library.entry(entry_id)? {
            return Ok(Some(entry));
        }
    }
    library.find_entry_for_package(&live.id)
}

/// Catalog of entries (version counts only), ordered by name then entry id.
///
/// # Errors
///
/// Returns a persistence error from the library store.
pub fn list_library<L: LibraryStore + ?Sized>(
    library: &L,
) -> Result<Vec<LibraryEntrySummary>, ExError> {
    let mut summaries = library.summaries()?;
    summaries.sort_by(|a, b| (&a.name, &a.entry_id).cmp(&(&b.name, &b.entry_id)));
    Ok(summaries)
}

/// A specific version's full snapshot, or the latest when `version` is `None`.
///
/// # Errors
///
/// Returns `NotFound` for a missing entry, a missing version, or an entry
/// with no versions.
pub fn get_version<L: LibraryStore + ?Sized>(
    library: &L,
    entry_id: &str,
    version: Option<u32>,
) -> Result<LibraryVersion, ExError> {
    let entry = library
        .entry(entry_id)?
        .ok_or_else(|| SchemaPackError::LibraryEntryNotFound {
            entry_id: entry_id.to_string(),
        })?;

    let found = match version {
        Some(v) => entry
            .version(v)
            .ok_or_else(|| SchemaPackError::LibraryVersionNotFound {
                entry_id: entry_id.to_string(),
                version: v,
            })?,
        None => entry
            .latest()
            .ok_or_else(|| SchemaPackError::LibraryEntryEmpty {
                entry_id: entry_id.to_string(),
            })?,
    };
    Ok(found.clone())
}

/// Install a library version into a document, recording fork lineage.
///
/// The installed package id is the version snapshot's id, so a document that
/// already holds that package reports `Skipped`.
///
/// # Errors
///
/// Returns `NotFound` if the entry or version does not exist, or any error
/// from [`apply_package`].
pub fn apply_library_entry<S, L>(
    doc: &mut S,
    library: &L,
    entry_id: &str,
    version: Option<u32>,
) -> Result<ApplyResult, ExError>
where
    S: DocumentStore,
    L: LibraryStore + ?Sized,
{
    let start = Instant::now();
    log_op_start!("apply_library_entry", entry_id = entry_id, version = ?version);

    let result = get_version(library, entry_id, version).and_then(|v| {
        let options = ApplyOptions::default()
            .with_origin(Origin::library_apply())
            .with_lineage(Lineage {
                library_entry_id: entry_id.to_string(),
                applied_version: v.version,
            });
        apply_package(doc, &v.snapshot, &options).map_err(ExError::from)
    });

    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(r) => log_op_end!(
            "apply_library_entry",
            duration_ms = duration_ms,
            entry_id = entry_id,
            package_id = %r.package_id,
            status = ?r.status
        ),
        Err(e) => log_op_error!(
            "apply_library_entry",
            e.clone(),
            duration_ms = duration_ms,
            entry_id = entry_id
        ),
    }

    result
}

/// Compare an installed package's snapshot hash with its library head.
///
/// # Errors
///
/// Returns `NotFound` if the package is not loaded, has no library entry, or
/// the entry has no versions.
pub fn check_for_update<L: LibraryStore + ?Sized>(
    doc: &dyn DocumentRead,
    library: &L,
    package_id: &str,
) -> Result<UpdateCheck, ExError> {
    let start = Instant::now();
    log_op_start!("check_for_update", package_id = package_id);

    let result = resolve_head(doc, library, package_id).map(|(installed, entry, head)| {
        let installed_hash = compute_content_hash(&installed.snapshot);
        let latest_hash = compute_content_hash(&head.snapshot);
        UpdateCheck {
            package_id: package_id.to_string(),
            entry_id: entry.entry_id,
            update_available: installed_hash != latest_hash,
            installed_hash,
            latest_hash,
            latest_version: head.version,
            applied_version: doc.live_package(package_id).and_then(|p| p.applied_version),
        }
    });

    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(check) => log_op_end!(
            "check_for_update",
            duration_ms = duration_ms,
            package_id = package_id,
            update_available = check.update_available
        ),
        Err(e) => log_op_error!(
            "check_for_update",
            e.clone(),
            duration_ms = duration_ms,
            package_id = package_id
        ),
    }

    result
}

/// Diff an installed snapshot against its library head.
///
/// # Errors
///
/// Same as [`check_for_update`].
pub fn preview_update<L: LibraryStore + ?Sized>(
    doc: &dyn DocumentRead,
    library: &L,
    package_id: &str,
) -> Result<PackageDiff, ExError> {
    let (installed, _, head) = resolve_head(doc, library, package_id)?;
    Ok(diff_definitions(&installed.snapshot, &head.snapshot))
}

fn resolve_head<'d, L: LibraryStore + ?Sized>(
    doc: &'d dyn DocumentRead,
    library: &L,
    package_id: &str,
) -> Result<(&'d ManifestEntry, LibraryEntry, LibraryVersion), ExError> {
    let installed =
        doc.manifest_entry(package_id)
            .ok_or_else(|| SchemaPackError::ManifestEntryNotFound {
                package_id: package_id.to_string(),
            })?;

    let entry = match doc.live_package(package_id) {
        Some(live) => find_entry(library, live)?,
        None => library.find_entry_for_package(package_id)?,
    }
    .ok_or_else(|| {
        ExError::new(ExErrorKind::NotFound)
            .with_op("check_for_update")
            .with_package_id(package_id)
            .with_message("Package has no library entry")
    })?;

    let head = entry.latest().cloned().ok_or_else(|| {
        ExError::from(SchemaPackError::LibraryEntryEmpty {
            entry_id: entry.entry_id.clone(),
        })
    })?;

    Ok((installed, entry, head))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::ApplyStatus;
    use crate::core_types::Origin;
    use crate::document::Document;
    use crate::library::store::Library;
    use crate::model::{ConstructSchema, FieldSchema};

    fn definition() -> PackageDefinition {
        PackageDefinition::new("pkg-1", "Infra").with_schema(
            ConstructSchema::new("svc", "Service").with_field(FieldSchema::new("port", "number")),
        )
    }

    fn installed() -> Document {
        let mut doc = Document::new();
        apply_package(&mut doc, &definition(), &ApplyOptions::default()).unwrap();
        doc
    }

    #[test]
    fn test_publish_unknown_package_is_not_found() {
        let doc = Document::new();
        let mut library = Library::new();
        let err = publish(&doc, &mut library, "nope", None).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::NotFound);
    }

    #[test]
    fn test_publish_reuses_entry() {
        let doc = installed();
        let mut library = Library::new();

        let first = publish(&doc, &mut library, "pkg-1", Some("initial".to_string())).unwrap();
        let second = publish(&doc, &mut library, "pkg-1", None).unwrap();

        assert!(first.created_entry);
        assert!(!second.created_entry);
        assert_eq!(first.entry_id, second.entry_id);
        assert_eq!((first.version, second.version), (1, 2));
        assert_eq!(first.content_hash, second.content_hash);
    }

    #[test]
    fn test_published_snapshot_matches_install_hash() {
        let doc = installed();
        let mut library = Library::new();

        let published = publish(&doc, &mut library, "pkg-1", None).unwrap();

        assert_eq!(
            published.content_hash,
            doc.manifest_entry("pkg-1").unwrap().content_hash
        );
    }

    #[test]
    fn test_get_version_errors() {
        let doc = installed();
        let mut library = Library::new();
        let published = publish(&doc, &mut library, "pkg-1", None).unwrap();

        assert!(get_version(&library, &published.entry_id, None).is_ok());
        assert_eq!(
            get_version(&library, &published.entry_id, Some(9))
                .unwrap_err()
                .kind(),
            ExErrorKind::NotFound
        );
        assert_eq!(
            get_version(&library, "missing", None).unwrap_err().kind(),
            ExErrorKind::NotFound
        );
    }

    #[test]
    fn test_update_check_detects_new_head() {
        let mut doc = installed();
        let mut library = Library::new();
        let published = publish(&doc, &mut library, "pkg-1", None).unwrap();

        let check = check_for_update(&doc, &library, "pkg-1").unwrap();
        assert!(!check.update_available);

        doc.transaction(&Origin::user(), |txn| {
            txn.schemas_mut()[0].fields[0].field_type = "string".to_string();
            Ok(())
        })
        .unwrap();
        publish(&doc, &mut library, "pkg-1", Some("port is a string".to_string())).unwrap();

        let check = check_for_update(&doc, &library, "pkg-1").unwrap();
        assert!(check.update_available);
        assert_eq!(check.entry_id, published.entry_id);
        assert_eq!(check.latest_version, 2);

        let preview = preview_update(&doc, &library, "pkg-1").unwrap();
        assert_eq!(preview.summary.modified, 1);
    }

    #[test]
    fn test_apply_library_entry_records_lineage() {
        let source = installed();
        let mut library = Library::new();
        let published = publish(&source, &mut library, "pkg-1", None).unwrap();

        let mut target = Document::new();
        let result = apply_library_entry(&mut target, &library, &published.entry_id, None).unwrap();

        assert_eq!(result.status, ApplyStatus::Applied);
        assert_eq!(result.applied_version, Some(1));
        let live = target.live_package("pkg-1").unwrap();
        assert_eq!(live.library_entry_id.as_deref(), Some(published.entry_id.as_str()));
        assert_eq!(target.change_log()[0].origin, Origin::library_apply());
    }

    #[test]
    fn test_apply_library_entry_into_source_document_skips() {
        let mut doc = installed();
        let mut library = Library::new();
        let published = publish(&doc, &mut library, "pkg-1", None).unwrap();

        let result = apply_library_entry(&mut doc, &library, &published.entry_id, Some(1)).unwrap();

        assert_eq!(result.status, ApplyStatus::Skipped);
    }
}
