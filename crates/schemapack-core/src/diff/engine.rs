//! Package diff computation engine.
//!
//! Per-kind keying:
//! - schemas by `type`, with a field-level sub-diff keyed by field `name`
//! - port schemas by `id`, compared as whole objects
//! - groups by `name` (ids are regenerated on every install)
//! - relationships by `sourceSchemaType::targetSchemaType`
//!
//! When a key occurs more than once on one side, the first occurrence is
//! compared.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use crate::canonical::compute_content_hash;
use crate::diff::model::{
    DiffStatus, DiffSummary, FieldChange, GroupDiff, PackageDiff, PortSchemaDiff,
    RelationshipDiff, SchemaDiff, ValueChange,
};
use crate::document::DocumentRead;
use crate::drift::reconstruct_live;
use crate::model::{
    ConstructSchema, FieldSchema, PackageDefinition, PortSchema, SchemaGroup, SchemaRelationship,
};
use crate::{log_op_end, log_op_start};

/// Diff an installed package's snapshot against its reconstructed live state.
///
/// Returns `None` if the package is not loaded.
pub fn diff_package(doc: &dyn DocumentRead, package_id: &str) -> Option<PackageDiff> {
    let start = Instant::now();
    log_op_start!("diff_package", package_id = package_id);

    let diff = doc.manifest_entry(package_id).and_then(|entry| {
        reconstruct_live(doc, package_id)
            .ok()
            .map(|rec| diff_definitions(&entry.snapshot, &rec.definition))
    });

    log_op_end!(
        "diff_package",
        duration_ms = start.elapsed().as_millis() as u64,
        package_id = package_id,
        loaded = diff.is_some(),
        changes = diff.as_ref().map(|d| d.summary.total()).unwrap_or(0)
    );

    diff
}

/// Diff two package definitions (`old` → `new`). Pure; never touches a
/// document.
///
/// # Example
///
/// ```
/// use schemapack_core::diff::{diff_definitions, DiffStatus};
/// use schemapack_core::model::{ConstructSchema, PackageDefinition};
///
/// let old = PackageDefinition::new("p", "P").with_schema(ConstructSchema::new("svc", "Service"));
/// let new = PackageDefinition::new("p", "P");
///
/// let diff = diff_definitions(&old, &new);
/// assert_eq!(diff.schemas[0].status, DiffStatus::Removed);
/// assert_eq!(diff.summary.removed, 1);
/// ```
pub fn diff_definitions(old: &PackageDefinition, new: &PackageDefinition) -> PackageDiff {
    let schemas = diff_schemas(old, new);
    let port_schemas = diff_port_schemas(&old.port_schemas, &new.port_schemas);
    let schema_groups = diff_groups(&old.schema_groups, &new.schema_groups);
    let schema_relationships =
        diff_relationships(&old.schema_relationships, &new.schema_relationships);

    let mut summary = DiffSummary::default();
    schemas.iter().for_each(|d| summary.record(d.status));
    port_schemas.iter().for_each(|d| summary.record(d.status));
    schema_groups.iter().for_each(|d| summary.record(d.status));
    schema_relationships
        .iter()
        .for_each(|d| summary.record(d.status));

    PackageDiff {
        package_id: new.id.clone(),
        old_hash: compute_content_hash(old),
        new_hash: compute_content_hash(new),
        schemas,
        port_schemas,
        schema_groups,
        schema_relationships,
        summary,
    }
}

/// Index by key, first occurrence wins
fn index_by<'a, T, K>(items: &'a [T], key: K) -> BTreeMap<String, &'a T>
where
    K: Fn(&T) -> String,
{
    let mut map = BTreeMap::new();
    for item in items {
        map.entry(key(item)).or_insert(item);
    }
    map
}

fn union_keys<'a, A, B>(
    old: &'a BTreeMap<String, A>,
    new: &'a BTreeMap<String, B>,
) -> BTreeSet<&'a String> {
    old.keys().chain(new.keys()).collect()
}

fn presence<A, B>(old: Option<A>, new: Option<B>) -> Option<DiffStatus> {
    match (old, new) {
        (Some(_), None) => Some(DiffStatus::Removed),
        (None, Some(_)) => Some(DiffStatus::Added),
        _ => None,
    }
}

fn diff_schemas(old: &PackageDefinition, new: &PackageDefinition) -> Vec<SchemaDiff> {
    let old_map = index_by(&old.schemas, |s| s.schema_type.clone());
    let new_map = index_by(&new.schemas, |s| s.schema_type.clone());

    let mut diffs = Vec::new();
    for key in union_keys(&old_map, &new_map) {
        let (a, b) = (old_map.get(key), new_map.get(key));
        if let Some(status) = presence(a, b) {
            diffs.push(SchemaDiff {
                schema_type: key.clone(),
                status,
                field_changes: None,
                property_changes: None,
            });
            continue;
        }
        let (Some(a), Some(b)) = (a, b) else {
            continue;
        };

        let field_changes = diff_fields(&a.fields, &b.fields);
        let property_changes = schema_property_changes(a, old, b, new);
        if field_changes.is_empty() && property_changes.is_empty() {
            continue;
        }
        diffs.push(SchemaDiff {
            schema_type: key.clone(),
            status: DiffStatus::Modified,
            field_changes: (!field_changes.is_empty()).then_some(field_changes),
            property_changes: (!property_changes.is_empty()).then_some(property_changes),
        });
    }
    diffs
}

fn diff_fields(old: &[FieldSchema], new: &[FieldSchema]) -> Vec<FieldChange> {
    let old_map = index_by(old, |f| f.name.clone());
    let new_map = index_by(new, |f| f.name.clone());

    let mut changes = Vec::new();
    for key in union_keys(&old_map, &new_map) {
        let (a, b) = (old_map.get(key), new_map.get(key));
        if let Some(status) = presence(a, b) {
            changes.push(FieldChange {
                field_name: key.clone(),
                status,
                detail: None,
            });
            continue;
        }
        let (Some(a), Some(b)) = (a, b) else {
            continue;
        };
        let details = field_details(a, b);
        if !details.is_empty() {
            changes.push(FieldChange {
                field_name: key.clone(),
                status: DiffStatus::Modified,
                detail: Some(details.join(", ")),
            });
        }
    }
    changes
}

fn field_details(a: &FieldSchema, b: &FieldSchema) -> Vec<String> {
    let mut details = Vec::new();
    if a.field_type != b.field_type {
        details.push(format!("type: {} → {}", a.field_type, b.field_type));
    }
    if a.display_tier != b.display_tier {
        details.push(format!(
            "displayTier: {} → {}",
            or_none(a.display_tier.as_deref()),
            or_none(b.display_tier.as_deref())
        ));
    }
    if a.required != b.required {
        details.push(format!("required: {} → {}", a.required, b.required));
    }
    if a.description != b.description {
        details.push(format!(
            "description: {} → {}",
            or_none(a.description.as_deref()),
            or_none(b.description.as_deref())
        ));
    }
    if a.default_value != b.default_value {
        let render = |v: &Option<serde_json::Value>| {
            v.as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "none".to_string())
        };
        details.push(format!(
            "defaultValue: {} → {}",
            render(&a.default_value),
            render(&b.default_value)
        ));
    }
    if a.options != b.options {
        details.push(format!(
            "options: [{}] → [{}]",
            a.options.join(", "),
            b.options.join(", ")
        ));
    }
    details
}

fn or_none(value: Option<&str>) -> &str {
    value.unwrap_or("none")
}

/// Non-field schema properties that differ. Group membership is compared by
/// the group's name since group ids are not stable across installs.
fn schema_property_changes(
    a: &ConstructSchema,
    old: &PackageDefinition,
    b: &ConstructSchema,
    new: &PackageDefinition,
) -> Vec<String> {
    let mut changed = Vec::new();
    if a.display_name != b.display_name {
        changed.push("displayName".to_string());
    }
    if a.description != b.description {
        changed.push("description".to_string());
    }
    if a.color != b.color {
        changed.push("color".to_string());
    }
    if shared_field_order(&a.fields, &b.fields) != shared_field_order(&b.fields, &a.fields) {
        changed.push("fieldOrder".to_string());
    }
    if a.ports != b.ports {
        changed.push("ports".to_string());
    }
    if a.metadata != b.metadata {
        changed.push("metadata".to_string());
    }
    if group_name(old, a.group_id.as_deref()) != group_name(new, b.group_id.as_deref()) {
        changed.push("group".to_string());
    }
    changed
}

/// Names of `fields` also present in `other`, in `fields` order. Field order
/// is hashed content, so a reorder of shared fields is a change even though
/// the field-level diff keys by name.
fn shared_field_order<'a>(fields: &'a [FieldSchema], other: &[FieldSchema]) -> Vec<&'a str> {
    fields
        .iter()
        .map(|f| f.name.as_str())
        .filter(|name| other.iter().any(|o| o.name == *name))
        .collect()
}

fn group_name<'a>(def: &'a PackageDefinition, group_id: Option<&'a str>) -> Option<&'a str> {
    group_id.map(|id| def.group(id).map(|g| g.name.as_str()).unwrap_or(id))
}

fn diff_port_schemas(old: &[PortSchema], new: &[PortSchema]) -> Vec<PortSchemaDiff> {
    let old_map = index_by(old, |p| p.id.clone());
    let new_map = index_by(new, |p| p.id.clone());

    union_keys(&old_map, &new_map)
        .into_iter()
        .filter_map(|key| {
            let (a, b) = (old_map.get(key), new_map.get(key));
            let status = match presence(a, b) {
                Some(status) => status,
                None if a != b => DiffStatus::Modified,
                None => return None,
            };
            Some(PortSchemaDiff {
                id: key.clone(),
                status,
            })
        })
        .collect()
}

fn diff_groups(old: &[SchemaGroup], new: &[SchemaGroup]) -> Vec<GroupDiff> {
    let old_map = index_by(old, |g| g.name.clone());
    let new_map = index_by(new, |g| g.name.clone());

    let mut diffs = Vec::new();
    for key in union_keys(&old_map, &new_map) {
        let (a, b) = (old_map.get(key), new_map.get(key));
        if let Some(status) = presence(a, b) {
            diffs.push(GroupDiff {
                name: key.clone(),
                status,
                color: None,
                has_parent: None,
            });
            continue;
        }
        let (Some(a), Some(b)) = (a, b) else {
            continue;
        };

        let color = (a.color != b.color).then(|| ValueChange {
            from: a.color.clone(),
            to: b.color.clone(),
        });
        let (had, has) = (a.parent_id.is_some(), b.parent_id.is_some());
        let has_parent = (had != has).then_some(ValueChange { from: had, to: has });

        if color.is_some() || has_parent.is_some() {
            diffs.push(GroupDiff {
                name: key.clone(),
                status: DiffStatus::Modified,
                color,
                has_parent,
            });
        }
    }
    diffs
}

fn diff_relationships(
    old: &[SchemaRelationship],
    new: &[SchemaRelationship],
) -> Vec<RelationshipDiff> {
    let old_map = index_by(old, SchemaRelationship::diff_key);
    let new_map = index_by(new, SchemaRelationship::diff_key);

    let mut diffs = Vec::new();
    for key in union_keys(&old_map, &new_map) {
        let (a, b) = (old_map.get(key), new_map.get(key));
        if let Some(status) = presence(a, b) {
            diffs.push(RelationshipDiff {
                key: key.clone(),
                status,
                source_port_id: None,
                target_port_id: None,
            });
            continue;
        }
        let (Some(a), Some(b)) = (a, b) else {
            continue;
        };

        let changed = |from: &String, to: &String| {
            (from != to).then(|| ValueChange {
                from: from.clone(),
                to: to.clone(),
            })
        };
        let source_port_id = changed(&a.source_port_id, &b.source_port_id);
        let target_port_id = changed(&a.target_port_id, &b.target_port_id);

        if source_port_id.is_some() || target_port_id.is_some() {
            diffs.push(RelationshipDiff {
                key: key.clone(),
                status: DiffStatus::Modified,
                source_port_id,
                target_port_id,
            });
        }
    }
    diffs
}
