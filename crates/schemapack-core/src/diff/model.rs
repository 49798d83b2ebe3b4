//! Package diff output types.
//!
//! Every per-kind list is sorted by its key so serialization is deterministic.
//! Optional detail lists are omitted from JSON when empty.

use serde::{Deserialize, Serialize};

/// Presence/modification status of a diffed element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffStatus {
    Added,
    Removed,
    Modified,
}

/// The top-level structured diff between two package definitions.
///
/// `old_hash`/`new_hash` are the content hashes of both sides; equal hashes
/// imply an empty diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDiff {
    pub package_id: String,
    pub old_hash: String,
    pub new_hash: String,
    pub schemas: Vec<SchemaDiff>,
    pub port_schemas: Vec<PortSchemaDiff>,
    pub schema_groups: Vec<GroupDiff>,
    pub schema_relationships: Vec<RelationshipDiff>,
    pub summary: DiffSummary,
}

impl PackageDiff {
    pub fn has_changes(&self) -> bool {
        self.summary.total() > 0
    }
}

/// Added/removed/modified totals across all four kinds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
}

impl DiffSummary {
    pub fn record(&mut self, status: DiffStatus) {
        match status {
            DiffStatus::Added => self.added += 1,
            DiffStatus::Removed => self.removed += 1,
            DiffStatus::Modified => self.modified += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.added + self.removed + self.modified
    }
}

/// Schema-level diff entry, keyed by schema `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDiff {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub status: DiffStatus,
    /// Field-level changes (only for `modified` schemas)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_changes: Option<Vec<FieldChange>>,
    /// Names of other schema properties whose values differ
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_changes: Option<Vec<String>>,
}

/// Field-level diff entry, keyed by field `name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub field_name: String,
    pub status: DiffStatus,
    /// e.g. `type: number → string` (only for `modified` fields)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Port schema diff entry, keyed by port `id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortSchemaDiff {
    pub id: String,
    pub status: DiffStatus,
}

/// Old/new value pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueChange<T> {
    pub from: T,
    pub to: T,
}

/// Group diff entry, keyed by group `name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDiff {
    pub name: String,
    pub status: DiffStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ValueChange<Option<String>>>,
    /// Whether the group has any parent (presence, not identity)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_parent: Option<ValueChange<bool>>,
}

/// Relationship diff entry, keyed by `sourceSchemaType::targetSchemaType`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipDiff {
    pub key: String,
    pub status: DiffStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_port_id: Option<ValueChange<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port_id: Option<ValueChange<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_records_statuses() {
        let mut summary = DiffSummary::default();
        summary.record(DiffStatus::Added);
        summary.record(DiffStatus::Modified);
        summary.record(DiffStatus::Modified);

        assert_eq!(
            summary,
            DiffSummary {
                added: 1,
                removed: 0,
                modified: 2
            }
        );
        assert_eq!(summary.total(), 3);
    }

    #[test]
    fn test_removed_schema_serializes_without_field_changes() {
        let diff = SchemaDiff {
            schema_type: "svc".to_string(),
            status: DiffStatus::Removed,
            field_changes: None,
            property_changes: None,
        };
        let json = serde_json::to_value(&diff).unwrap();
        assert_eq!(json["type"], "svc");
        assert_eq!(json["status"], "removed");
        assert!(json.get("fieldChanges").is_none());
    }
}
