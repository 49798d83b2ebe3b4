#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use schemapack_core::diff::{diff_package, render_human_summary, DiffStatus, DiffSummary};
use schemapack_core::document::DocumentWrite;
use schemapack_core::drift::check_drift;
use schemapack_core::model::FieldSchema;
use serde_json::json;

use common::{edit, infra_package, installed, live_schema_mut, svc_port_package};

#[test]
fn test_port_type_change_scenario() {
    let mut doc = installed(&svc_port_package());
    edit(&mut doc, |txn| {
        live_schema_mut(txn, "pkg-p1", "svc").fields[0].field_type = "string".to_string();
    });

    let diff = diff_package(&doc, "pkg-p1").unwrap();

    assert_eq!(
        diff.summary,
        DiffSummary {
            added: 0,
            removed: 0,
            modified: 1
        }
    );
    let json = serde_json::to_value(&diff).unwrap();
    assert_eq!(
        json["schemas"],
        json!([{
            "type": "svc",
            "status": "modified",
            "fieldChanges": [{
                "fieldName": "port",
                "status": "modified",
                "detail": "type: number → string"
            }]
        }])
    );
    assert_eq!(json["summary"], json!({"added": 0, "removed": 0, "modified": 1}));
}

#[test]
fn test_added_field_listed_in_field_changes() {
    let mut doc = installed(&infra_package());
    edit(&mut doc, |txn| {
        live_schema_mut(txn, "pkg-infra", "db")
            .fields
            .push(FieldSchema::new("version", "string"));
    });

    let diff = diff_package(&doc, "pkg-infra").unwrap();

    assert_eq!(diff.schemas.len(), 1);
    let db = &diff.schemas[0];
    assert_eq!(db.schema_type, "db");
    assert_eq!(db.status, DiffStatus::Modified);
    let changes = db.field_changes.as_ref().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].field_name, "version");
    assert_eq!(changes[0].status, DiffStatus::Added);
    assert!(changes[0].detail.is_none());
}

#[test]
fn test_removed_schema_has_no_field_changes() {
    let mut doc = installed(&infra_package());
    edit(&mut doc, |txn| {
        txn.schemas_mut().retain(|s| s.schema_type != "svc");
    });

    let diff = diff_package(&doc, "pkg-infra").unwrap();

    assert_eq!(diff.schemas.len(), 1);
    assert_eq!(diff.schemas[0].schema_type, "svc");
    assert_eq!(diff.schemas[0].status, DiffStatus::Removed);
    assert!(diff.schemas[0].field_changes.is_none());
    assert_eq!(diff.summary.removed, 1);
}

#[test]
fn test_fresh_install_has_empty_diff() {
    let doc = installed(&infra_package());
    let diff = diff_package(&doc, "pkg-infra").unwrap();
    assert!(!diff.has_changes());
    assert_eq!(diff.old_hash, diff.new_hash);
}

#[test]
fn test_unloaded_package_diff_is_none() {
    let doc = installed(&infra_package());
    assert!(diff_package(&doc, "pkg-unknown").is_none());
}

#[test]
fn test_group_recolor_reported_by_name() {
    let mut doc = installed(&infra_package());
    edit(&mut doc, |txn| {
        for group in txn.schema_groups_mut() {
            if group.name == "Storage" {
                group.color = Some("green".to_string());
            }
        }
    });

    let diff = diff_package(&doc, "pkg-infra").unwrap();

    let storage = diff
        .schema_groups
        .iter()
        .find(|g| g.name == "Storage")
        .unwrap();
    assert_eq!(storage.status, DiffStatus::Modified);
    assert_eq!(storage.color.as_ref().unwrap().to.as_deref(), Some("green"));
    // A recolored group no longer reverse-maps, but schemas still diff by name
    assert!(diff.schemas.is_empty());
}

#[test]
fn test_relationship_and_port_changes() {
    let mut doc = installed(&infra_package());
    edit(&mut doc, |txn| {
        for rel in txn.schema_relationships_mut() {
            rel.source_port_id = "flow-out-2".to_string();
        }
        txn.port_schemas_mut()
            .retain(|p| p.id != "flow-in");
    });

    let diff = diff_package(&doc, "pkg-infra").unwrap();

    assert_eq!(diff.schema_relationships.len(), 1);
    assert_eq!(diff.schema_relationships[0].key, "svc::db");
    assert_eq!(
        diff.schema_relationships[0]
            .source_port_id
            .as_ref()
            .unwrap()
            .to,
        "flow-out-2"
    );
    assert_eq!(diff.port_schemas.len(), 1);
    assert_eq!(diff.port_schemas[0].status, DiffStatus::Removed);
    assert_eq!(diff.summary.modified, 1);
    assert_eq!(diff.summary.removed, 1);
}

#[test]
fn test_human_summary_mentions_changes() {
    let mut doc = installed(&svc_port_package());
    edit(&mut doc, |txn| {
        live_schema_mut(txn, "pkg-p1", "svc").fields[0].field_type = "string".to_string();
    });

    let rendered = render_human_summary(&diff_package(&doc, "pkg-p1").unwrap());

    assert!(rendered.contains("## Package Diff: pkg-p1"));
    assert!(rendered.contains("0 added, 0 removed, 1 modified"));
    assert!(rendered.contains("type: number → string"));
}

#[test]
fn test_live_field_reorder_shows_in_diff_and_drift() {
    let mut doc = installed(&infra_package());
    edit(&mut doc, |txn| {
        live_schema_mut(txn, "pkg-infra", "svc").fields.swap(0, 1);
    });

    assert!(check_drift(&doc, "pkg-infra").unwrap().modified);

    let diff = diff_package(&doc, "pkg-infra").unwrap();
    assert!(diff.has_changes());
    assert_eq!(diff.schemas[0].schema_type, "svc");
    assert_eq!(
        diff.schemas[0].property_changes,
        Some(vec!["fieldOrder".to_string()])
    );
}
