use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::canonical::compute_content_hash;
use crate::document::DocumentRead;
use crate::drift::projection::{reconstruct_live, ElementCounts};
use crate::drift::reverse_map::GroupMatch;
use crate::errors::Result;
use crate::{log_op_end, log_op_error, log_op_start};

/// Boolean drift signal with the hashes it was decided on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftStatus {
    pub package_id: String,
    pub modified: bool,
    /// Hash recorded in the manifest at install time
    pub stored_hash: String,
    /// Hash of the reconstructed live state
    pub current_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmappedGroup {
    pub live_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmbiguousGroup {
    pub live_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Snapshot group ids sharing the name and color; the first one is used
    pub candidates: Vec<String>,
}

/// Diagnostic drift payload for "why does this look modified"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftReport {
    pub package_id: String,
    pub modified: bool,
    pub stored_hash: String,
    /// Hash recomputed from the manifest snapshot
    pub snapshot_hash: String,
    pub live_hash: String,
    pub unmapped_groups: Vec<UnmappedGroup>,
    pub ambiguous_groups: Vec<AmbiguousGroup>,
    pub snapshot_counts: ElementCounts,
    pub live_counts: ElementCounts,
}

/// Decide whether an installed package has drifted from its snapshot.
///
/// # Errors
///
/// Returns `ManifestEntryNotFound` if the package is not loaded. Check with
/// [`crate::apply::is_loaded`] first when that is an expected case.
pub fn check_drift(doc: &dyn DocumentRead, package_id: &str) -> Result<DriftStatus> {
    let start = Instant::now();
    log_op_start!("check_drift", package_id = package_id);

    let result = compute_status(doc, package_id);

    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(status) => log_op_end!(
            "check_drift",
            duration_ms = duration_ms,
            package_id = package_id,
            modified = status.modified
        ),
        Err(e) => log_op_error!(
            "check_drift",
            e.clone(),
            duration_ms = duration_ms,
            package_id = package_id
        ),
    }

    result
}

fn compute_status(doc: &dyn DocumentRead, package_id: &str) -> Result<DriftStatus> {
    let reconstruction = reconstruct_live(doc, package_id)?;
    // reconstruct_live already proved the entry exists
    let stored_hash = doc
        .manifest_entry(package_id)
        .map(|e| e.content_hash.clone())
        .unwrap_or_default();
    let current_hash = compute_content_hash(&reconstruction.definition);

    Ok(DriftStatus {
        package_id: package_id.to_string(),
        modified: stored_hash != current_hash,
        stored_hash,
        current_hash,
    })
}

/// Debug variant of [`check_drift`]. Returns `None` when the package is not
/// loaded instead of failing.
pub fn drift_report(doc: &dyn DocumentRead, package_id: &str) -> Option<DriftReport> {
    let entry = doc.manifest_entry(package_id)?;
    let reconstruction = reconstruct_live(doc, package_id).ok()?;

    let live_group = |live_id: &str| {
        doc.schema_groups()
            .iter()
            .find(|g| g.id == live_id && g.package_id.as_deref() == Some(package_id))
    };

    let mut unmapped_groups = Vec::new();
    let mut ambiguous_groups = Vec::new();
    for (live_id, group_match) in &reconstruction.group_matches {
        let Some(group) = live_group(live_id) else {
            continue;
        };
        match group_match {
            GroupMatch::Unmatched => unmapped_groups.push(UnmappedGroup {
                live_id: live_id.clone(),
                name: group.name.clone(),
                color: group.color.clone(),
            }),
            GroupMatch::Ambiguous(candidates) => ambiguous_groups.push(AmbiguousGroup {
                live_id: live_id.clone(),
                name: group.name.clone(),
                color: group.color.clone(),
                candidates: candidates.clone(),
            }),
            GroupMatch::Matched(_) => {}
        }
    }

    let live_hash = compute_content_hash(&reconstruction.definition);
    let report = DriftReport {
        package_id: package_id.to_string(),
        modified: live_hash != entry.content_hash,
        stored_hash: entry.content_hash.clone(),
        snapshot_hash: compute_content_hash(&entry.snapshot),
        live_hash,
        unmapped_groups,
        ambiguous_groups,
        snapshot_counts: ElementCounts::of(&entry.snapshot),
        live_counts: ElementCounts::of(&reconstruction.definition),
    };

    tracing::debug!(
        package_id = package_id,
        modified = report.modified,
        unmapped = report.unmapped_groups.len(),
        ambiguous = report.ambiguous_groups.len(),
        "drift report computed"
    );

    Some(report)
}
