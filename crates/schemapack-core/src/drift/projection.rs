//! Live → portable projection.
//!
//! Filters the document down to one package's entities, rewrites group
//! references into the snapshot identifier space and strips `package_id`
//! tags, producing a definition comparable with the install snapshot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::DocumentRead;
use crate::drift::reverse_map::{GroupMatch, ReverseGroupMap};
use crate::errors::{Result, SchemaPackError};
use crate::model::{PackageDefinition, SchemaGroup};

/// A live package projected back to portable form
#[derive(Debug, Clone, PartialEq)]
pub struct Reconstruction {
    pub definition: PackageDefinition,
    /// Match result per live group id
    pub group_matches: BTreeMap<String, GroupMatch>,
}

/// Entity counts for one side of a comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementCounts {
    pub schemas: usize,
    pub port_schemas: usize,
    pub schema_groups: usize,
    pub schema_relationships: usize,
}

impl ElementCounts {
    pub fn of(definition: &PackageDefinition) -> Self {
        Self {
            schemas: definition.schemas.len(),
            port_schemas: definition.port_schemas.len(),
            schema_groups: definition.schema_groups.len(),
            schema_relationships: definition.schema_relationships.len(),
        }
    }
}

/// Reconstruct an installed package against its manifest snapshot.
///
/// # Errors
///
/// Returns `ManifestEntryNotFound` if the package is not loaded.
pub fn reconstruct_live(doc: &dyn DocumentRead, package_id: &str) -> Result<Reconstruction> {
    let entry = doc
        .manifest_entry(package_id)
        .ok_or_else(|| SchemaPackError::ManifestEntryNotFound {
            package_id: package_id.to_string(),
        })?;

    Ok(project_live(
        doc,
        package_id,
        &entry.snapshot.schema_groups,
        &entry.snapshot,
    ))
}

/// Project one package's live entities.
///
/// Group references are rewritten into the id space of `snapshot_groups`
/// (pass an empty slice to keep live ids). Package-level name, description
/// and color come from the live package record when present, otherwise from
/// `fallback`.
pub fn project_live(
    doc: &dyn DocumentRead,
    package_id: &str,
    snapshot_groups: &[SchemaGroup],
    fallback: &PackageDefinition,
) -> Reconstruction {
    let owned = |tag: &Option<String>| tag.as_deref() == Some(package_id);

    let live_groups: Vec<&SchemaGroup> = doc
        .schema_groups()
        .iter()
        .filter(|g| owned(&g.package_id))
        .collect();
    let map = ReverseGroupMap::build(live_groups.iter().copied(), snapshot_groups);

    let mut definition = match doc.live_package(package_id) {
        Some(live) => {
            let mut def = PackageDefinition::new(&live.id, &live.name);
            def.description = live.description.clone();
            def.color = live.color.clone();
            def
        }
        None => {
            let mut def = PackageDefinition::new(package_id, &fallback.name);
            def.description = fallback.description.clone();
            def.color = fallback.color.clone();
            def
        }
    };

    definition.schema_groups = live_groups
        .iter()
        .map(|g| SchemaGroup {
            id: map.rewrite(&g.id),
            parent_id: map.rewrite_opt(&g.parent_id),
            package_id: None,
            ..(*g).clone()
        })
        .collect();

    definition.schemas = doc
        .schemas()
        .iter()
        .filter(|s| owned(&s.package_id))
        .map(|s| {
            let mut schema = s.clone();
            schema.group_id = map.rewrite_opt(&s.group_id);
            schema.package_id = None;
            schema
        })
        .collect();

    definition.port_schemas = doc
        .port_schemas()
        .iter()
        .filter(|p| owned(&p.package_id))
        .map(|p| {
            let mut port_schema = p.clone();
            port_schema.group_id = map.rewrite_opt(&p.group_id);
            port_schema.package_id = None;
            port_schema
        })
        .collect();

    definition.schema_relationships = doc
        .schema_relationships()
        .iter()
        .filter(|r| owned(&r.package_id))
        .map(|r| {
            let mut relationship = r.clone();
            relationship.package_id = None;
            relationship
        })
        .collect();

    Reconstruction {
        definition,
        group_matches: map.into_matches(),
    }
}
