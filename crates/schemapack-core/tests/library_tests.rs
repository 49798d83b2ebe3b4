#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use schemapack_core::document::{Document, DocumentRead};
use schemapack_core::drift::check_drift;
use schemapack_core::errors::ExErrorKind;
use schemapack_core::library::{
    apply_library_entry, check_for_update, get_version, list_library, preview_update, publish,
    Library,
};
use schemapack_core::model::FieldSchema;
use schemapack_core::{compute_content_hash, ApplyStatus};

use common::{edit, infra_package, installed, live_schema_mut, svc_port_package};

#[test]
fn test_publish_versions_are_never_deduplicated() {
    let mut doc = installed(&infra_package());
    let mut library = Library::new();

    let v1 = publish(&doc, &mut library, "pkg-infra", Some("first".to_string())).unwrap();
    let v2 = publish(&doc, &mut library, "pkg-infra", None).unwrap();

    assert!(v1.created_entry);
    assert!(!v2.created_entry);
    assert_eq!(v1.entry_id, v2.entry_id);
    assert_eq!((v1.version, v2.version), (1, 2));
    assert_eq!(v1.content_hash, v2.content_hash);
    assert_eq!(v1.content_hash, compute_content_hash(&infra_package()));

    edit(&mut doc, |txn| {
        live_schema_mut(txn, "pkg-infra", "db")
            .fields
            .push(FieldSchema::new("version", "string"));
    });
    let v3 = publish(&doc, &mut library, "pkg-infra", Some("add version".to_string())).unwrap();

    assert_eq!(v3.version, 3);
    assert_ne!(v3.content_hash, v1.content_hash);

    let head = get_version(&library, &v1.entry_id, None).unwrap();
    assert_eq!(head.version, 3);
    assert_eq!(head.changelog.as_deref(), Some("add version"));
    assert!(head.snapshot.schemas.iter().all(|s| s.package_id.is_none()));
}

#[test]
fn test_apply_old_version_into_fresh_document() {
    let mut source = installed(&infra_package());
    let mut library = Library::new();
    let v1 = publish(&source, &mut library, "pkg-infra", None).unwrap();
    edit(&mut source, |txn| {
        live_schema_mut(txn, "pkg-infra", "svc").fields.clear();
    });
    publish(&source, &mut library, "pkg-infra", None).unwrap();

    let mut fresh = Document::new();
    let result = apply_library_entry(&mut fresh, &library, &v1.entry_id, Some(1)).unwrap();

    assert_eq!(result.status, ApplyStatus::Applied);
    assert_eq!(result.library_entry_id.as_deref(), Some(v1.entry_id.as_str()));
    assert_eq!(result.applied_version, Some(1));
    assert_eq!(
        fresh.manifest_entry("pkg-infra").unwrap().content_hash,
        v1.content_hash
    );
    assert!(!check_drift(&fresh, "pkg-infra").unwrap().modified);

    let live = fresh.live_package("pkg-infra").unwrap();
    assert_eq!(live.library_entry_id.as_deref(), Some(v1.entry_id.as_str()));
    assert_eq!(live.applied_version, Some(1));
    assert_eq!(fresh.change_log()[0].origin.as_str(), "library-apply");
}

#[test]
fn test_update_check_and_preview() {
    let mut source = installed(&infra_package());
    let mut library = Library::new();
    let v1 = publish(&source, &mut library, "pkg-infra", None).unwrap();

    let mut fork = Document::new();
    apply_library_entry(&mut fork, &library, &v1.entry_id, None).unwrap();
    let current = check_for_update(&fork, &library, "pkg-infra").unwrap();
    assert!(!current.update_available);
    assert_eq!(current.latest_version, 1);

    edit(&mut source, |txn| {
        live_schema_mut(txn, "pkg-infra", "db")
            .fields
            .push(FieldSchema::new("version", "string"));
    });
    publish(&source, &mut library, "pkg-infra", None).unwrap();

    let check = check_for_update(&fork, &library, "pkg-infra").unwrap();
    assert!(check.update_available);
    assert_eq!(check.latest_version, 2);
    assert_eq!(check.applied_version, Some(1));
    assert_ne!(check.installed_hash, check.latest_hash);

    let preview = preview_update(&fork, &library, "pkg-infra").unwrap();
    assert_eq!(preview.summary.modified, 1);
    assert_eq!(preview.schemas[0].schema_type, "db");
}

#[test]
fn test_missing_lookups_are_not_found() {
    let doc = installed(&svc_port_package());
    let mut library = Library::new();

    let err = publish(&doc, &mut library, "pkg-unknown", None).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);

    let err = get_version(&library, "no-entry", None).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);

    let published = publish(&doc, &mut library, "pkg-p1", None).unwrap();
    let err = get_version(&library, &published.entry_id, Some(7)).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);

    let err = check_for_update(&installed(&infra_package()), &library, "pkg-infra").unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
}

#[test]
fn test_list_library_sorted_by_name() {
    let mut library = Library::new();
    publish(&installed(&infra_package()), &mut library, "pkg-infra", None).unwrap();
    let p1 = installed(&svc_port_package());
    publish(&p1, &mut library, "pkg-p1", None).unwrap();
    publish(&p1, &mut library, "pkg-p1", None).unwrap();

    let listed = list_library(&library).unwrap();

    let names: Vec<&str> = listed.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Infrastructure", "P1"]);
    assert_eq!(listed[1].version_count, 2);
    assert_eq!(listed[1].latest_version, Some(2));
}
