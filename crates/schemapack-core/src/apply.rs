//! Package installation (hydration) and teardown
//!
//! ## Install Contract
//!
//! `apply_package()` is an idempotent create-or-skip installer:
//! - The manifest is keyed by package id; an existing entry means the package
//!   is already installed and the call reports `Skipped` without writing
//! - The content hash is computed from the definition as supplied, before any
//!   identifier is rewritten
//! - Hydration gives every group a fresh id (parent links and schema/port
//!   group links follow it), regenerates every relationship id and stamps
//!   every entity with `package_id`
//! - The live package record, all hydrated entities and the manifest entry
//!   are written in one document transaction
//!
//! The idempotency check runs inside that same transaction, so the
//! check-and-insert is a single atomic step: of two concurrent installs of
//! the same package through one document, exactly one reports `Applied`.

use std::collections::HashMap;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::canonical::compute_content_hash;
use crate::core_types::origin::ORIGIN_PACKAGE_UNINSTALL;
use crate::core_types::Origin;
use crate::document::{DocumentRead, DocumentStore, DocumentWrite, RemovedCounts};
use crate::errors::{Result, SchemaPackError};
use crate::model::{Lineage, LivePackage, ManifestEntry, PackageDefinition};
use crate::{log_op_end, log_op_error, log_op_start};

/// Outcome of an install call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyStatus {
    Applied,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResult {
    pub status: ApplyStatus,
    pub package_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schemas_loaded: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_entry_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_version: Option<u32>,
}

impl ApplyResult {
    fn skipped(package_id: &str) -> Self {
        Self {
            status: ApplyStatus::Skipped,
            package_id: package_id.to_string(),
            schemas_loaded: None,
            content_hash: None,
            library_entry_id: None,
            applied_version: None,
        }
    }

    pub fn is_applied(&self) -> bool {
        self.status == ApplyStatus::Applied
    }
}

/// Per-call install settings
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    /// Label attached to the install change-set
    pub origin: Origin,
    /// Library lineage stamped on the live package record
    pub lineage: Option<Lineage>,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            origin: Origin::package_apply(),
            lineage: None,
        }
    }
}

impl ApplyOptions {
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_lineage(mut self, lineage: Lineage) -> Self {
        self.lineage = Some(lineage);
        self
    }
}

/// Install a package definition into a document, or skip if already loaded.
///
/// # Errors
///
/// Installing an already-loaded package is not an error. Errors come only
/// from the document transaction, e.g. `PackageAlreadyExists` when a live
/// package record with this id exists without a manifest entry; in that case
/// nothing is written.
///
/// # Example
///
/// ```
/// use schemapack_core::{apply_package, ApplyOptions, ApplyStatus, Document};
/// use schemapack_core::model::{ConstructSchema, PackageDefinition};
///
/// let mut doc = Document::new();
/// let def = PackageDefinition::new("pkg-1", "Infra")
///     .with_schema(ConstructSchema::new("svc", "Service"));
///
/// let first = apply_package(&mut doc, &def, &ApplyOptions::default()).unwrap();
/// let second = apply_package(&mut doc, &def, &ApplyOptions::default()).unwrap();
/// assert_eq!(first.status, ApplyStatus::Applied);
/// assert_eq!(second.status, ApplyStatus::Skipped);
/// ```
pub fn apply_package<S: DocumentStore>(
    doc: &mut S,
    definition: &PackageDefinition,
    options: &ApplyOptions,
) -> Result<ApplyResult> {
    let start = Instant::now();
    log_op_start!(
        "apply_package",
        package_id = %definition.id,
        origin = options.origin.as_str()
    );

    let content_hash = compute_content_hash(definition);

    let result = doc.transaction(&options.origin, |txn| {
        if txn.manifest_entry(&definition.id).is_some() {
            return Ok(ApplyResult::skipped(&definition.id));
        }
        install(txn, definition, &content_hash, options.lineage.as_ref())
    });

    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(r) => log_op_end!(
            "apply_package",
            duration_ms = duration_ms,
            package_id = %definition.id,
            status = ?r.status
        ),
        Err(e) => log_op_error!(
            "apply_package",
            e.clone(),
            duration_ms = duration_ms,
            package_id = %definition.id
        ),
    }

    result
}

fn install(
    txn: &mut dyn DocumentWrite,
    definition: &PackageDefinition,
    content_hash: &str,
    lineage: Option<&Lineage>,
) -> Result<ApplyResult> {
    let mut live = LivePackage::new(&definition.id, &definition.name);
    live.description = definition.description.clone();
    live.color = definition.color.clone();
    if let Some(lineage) = lineage {
        live.library_entry_id = Some(lineage.library_entry_id.clone());
        live.applied_version = Some(lineage.applied_version);
    }
    txn.add_live_package(live)?;

    let hydrated = hydrate(definition);
    let schemas_loaded = hydrated.schemas.len();
    for schema in hydrated.schemas {
        txn.add_schema(schema);
    }
    for port_schema in hydrated.port_schemas {
        txn.add_port_schema(port_schema);
    }
    for group in hydrated.schema_groups {
        txn.add_schema_group(group);
    }
    for relationship in hydrated.schema_relationships {
        txn.add_schema_relationship(relationship);
    }

    txn.add_manifest_entry(ManifestEntry {
        package_id: definition.id.clone(),
        content_hash: content_hash.to_string(),
        display_name: definition.name.clone(),
        loaded_at: Utc::now(),
        snapshot: definition.clone(),
    })?;

    Ok(ApplyResult {
        status: ApplyStatus::Applied,
        package_id: definition.id.clone(),
        schemas_loaded: Some(schemas_loaded),
        content_hash: Some(content_hash.to_string()),
        library_entry_id: lineage.map(|l| l.library_entry_id.clone()),
        applied_version: lineage.map(|l| l.applied_version),
    })
}

/// Produce the live copy of a definition.
///
/// Every group gets a fresh UUID; parent links and schema/port group links
/// are rewritten through the old→new map (unknown ids are kept verbatim).
/// Relationship ids are always regenerated. Every entity is tagged with
/// `package_id = definition.id`.
pub fn hydrate(definition: &PackageDefinition) -> PackageDefinition {
    let package_id = Some(definition.id.clone());
    let id_map: HashMap<&str, String> = definition
        .schema_groups
        .iter()
        .map(|g| (g.id.as_str(), Uuid::new_v4().to_string()))
        .collect();
    let remap = |id: &Option<String>| {
        id.as_ref()
            .map(|old| id_map.get(old.as_str()).cloned().unwrap_or_else(|| old.clone()))
    };

    let mut hydrated = definition.clone();
    for group in &mut hydrated.schema_groups {
        group.id = id_map
            .get(group.id.as_str())
            .cloned()
            .unwrap_or_else(|| group.id.clone());
        group.parent_id = remap(&group.parent_id);
        group.package_id = package_id.clone();
    }
    for schema in &mut hydrated.schemas {
        schema.group_id = remap(&schema.group_id);
        schema.package_id = package_id.clone();
    }
    for port_schema in &mut hydrated.port_schemas {
        port_schema.group_id = remap(&port_schema.group_id);
        port_schema.package_id = package_id.clone();
    }
    for relationship in &mut hydrated.schema_relationships {
        relationship.id = Uuid::new_v4().to_string();
        relationship.package_id = package_id.clone();
    }
    hydrated
}

/// Whether a package has a manifest entry in this document
pub fn is_loaded(doc: &dyn DocumentRead, package_id: &str) -> bool {
    doc.manifest_entry(package_id).is_some()
}

/// Tear down an installed package in one transaction.
///
/// Removes every entity tagged with `package_id`, the live package record and
/// the manifest entry.
///
/// # Errors
///
/// Returns `ManifestEntryNotFound` if the package is not loaded.
pub fn uninstall<S: DocumentStore>(doc: &mut S, package_id: &str) -> Result<RemovedCounts> {
    let start = Instant::now();
    log_op_start!("uninstall", package_id = package_id);

    let result = doc.transaction(&Origin::new(ORIGIN_PACKAGE_UNINSTALL), |txn| {
        if txn.manifest_entry(package_id).is_none() {
            return Err(SchemaPackError::ManifestEntryNotFound {
                package_id: package_id.to_string(),
            });
        }
        Ok(txn.remove_package(package_id))
    });

    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(removed) => log_op_end!(
            "uninstall",
            duration_ms = duration_ms,
            package_id = package_id,
            entities_removed = removed.total_entities()
        ),
        Err(e) => log_op_error!(
            "uninstall",
            e.clone(),
            duration_ms = duration_ms,
            package_id = package_id
        ),
    }

    result
}
