#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::{Arc, Mutex};
use std::thread;

use schemapack_core::core_types::origin::ORIGIN_PACKAGE_APPLY;
use schemapack_core::document::{Document, DocumentRead};
use schemapack_core::{apply_package, is_loaded, uninstall, ApplyOptions, ApplyStatus};

use common::{infra_package, installed};

fn entity_counts(doc: &Document) -> (usize, usize, usize, usize) {
    (
        doc.schemas().len(),
        doc.port_schemas().len(),
        doc.schema_groups().len(),
        doc.schema_relationships().len(),
    )
}

#[test]
fn test_install_twice_applies_then_skips() {
    let def = infra_package();
    let mut doc = Document::new();

    let first = apply_package(&mut doc, &def, &ApplyOptions::default()).unwrap();
    let counts_after_first = entity_counts(&doc);
    let second = apply_package(&mut doc, &def, &ApplyOptions::default()).unwrap();

    assert_eq!(first.status, ApplyStatus::Applied);
    assert_eq!(first.schemas_loaded, Some(2));
    assert_eq!(second.status, ApplyStatus::Skipped);
    assert_eq!(second.package_id, "pkg-infra");
    assert_eq!(entity_counts(&doc), counts_after_first);
    assert_eq!(counts_after_first, (2, 2, 3, 1));
}

#[test]
fn test_install_writes_one_change_set_with_origin() {
    let doc = installed(&infra_package());

    assert_eq!(doc.change_log().len(), 1);
    let change = &doc.change_log()[0];
    assert_eq!(change.origin.as_str(), ORIGIN_PACKAGE_APPLY);
    // live package + 8 entities + manifest entry
    assert_eq!(change.writes, 10);
}

#[test]
fn test_every_installed_entity_is_tagged() {
    let doc = installed(&infra_package());
    let tagged = |tag: &Option<String>| tag.as_deref() == Some("pkg-infra");

    assert!(doc.schemas().iter().all(|s| tagged(&s.package_id)));
    assert!(doc.port_schemas().iter().all(|p| tagged(&p.package_id)));
    assert!(doc.schema_groups().iter().all(|g| tagged(&g.package_id)));
    assert!(doc.schema_relationships().iter().all(|r| tagged(&r.package_id)));
}

#[test]
fn test_live_package_record_copied_from_definition() {
    let def = infra_package();
    let doc = installed(&def);

    let live = doc.live_package("pkg-infra").unwrap();
    assert_eq!(live.name, def.name);
    assert_eq!(live.color, def.color);
    assert!(live.lineage().is_none());
}

#[test]
fn test_two_documents_get_different_group_ids() {
    let def = infra_package();
    let a = installed(&def);
    let b = installed(&def);

    let ids = |doc: &Document| {
        let mut ids: Vec<String> = doc.schema_groups().iter().map(|g| g.id.clone()).collect();
        ids.sort();
        ids
    };
    assert_ne!(ids(&a), ids(&b));
    assert_eq!(
        a.manifest_entry("pkg-infra").unwrap().content_hash,
        b.manifest_entry("pkg-infra").unwrap().content_hash
    );
}

#[test]
fn test_concurrent_installs_apply_exactly_once() {
    let def = infra_package();
    let doc = Arc::new(Mutex::new(Document::new()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let doc = Arc::clone(&doc);
            let def = def.clone();
            thread::spawn(move || {
                let mut guard = doc.lock().unwrap();
                apply_package(&mut *guard, &def, &ApplyOptions::default())
                    .unwrap()
                    .status
            })
        })
        .collect();

    let statuses: Vec<ApplyStatus> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let applied = statuses
        .iter()
        .filter(|s| **s == ApplyStatus::Applied)
        .count();
    assert_eq!(applied, 1);
    let doc = doc.lock().unwrap();
    assert_eq!(doc.schemas().len(), 2);
    assert_eq!(doc.manifest().len(), 1);
}

#[test]
fn test_reinstall_after_uninstall() {
    let def = infra_package();
    let mut doc = installed(&def);

    uninstall(&mut doc, "pkg-infra").unwrap();
    assert!(!is_loaded(&doc, "pkg-infra"));
    assert_eq!(entity_counts(&doc), (0, 0, 0, 0));

    let again = apply_package(&mut doc, &def, &ApplyOptions::default()).unwrap();
    assert_eq!(again.status, ApplyStatus::Applied);
}
