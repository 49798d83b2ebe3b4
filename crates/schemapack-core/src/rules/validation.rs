use crate::errors::{Result, SchemaPackError};
use crate::model::PackageDefinition;

use super::invariants;

/// Validate a package definition before it is installed or bundled
///
/// Checks, in order:
///
/// 1. Package id and name are present
/// 2. Schema types are non-empty and unique
/// 3. Port schema ids and group ids are unique
/// 4. Group parent links resolve and do not form cycles
/// 5. Schema and port schema group links resolve
/// 6. Field names are unique within each schema
///
/// # Errors
///
/// Returns the first violation found. For exhaustive reporting call the
/// `invariants` finders directly.
pub fn validate_definition(def: &PackageDefinition) -> Result<()> {
    let invalid = |reason: String| SchemaPackError::InvalidDefinition {
        package_id: def.id.clone(),
        reason,
    };

    if def.id.trim().is_empty() {
        return Err(invalid("package id is empty".to_string()));
    }
    if def.name.trim().is_empty() {
        return Err(invalid("package name is empty".to_string()));
    }

    if let Some(index) = invariants::find_empty_schema_types(def).first() {
        return Err(invalid(format!("schema #{} has an empty type", index)));
    }

    let duplicate_id = |kind: &str, id: &String| SchemaPackError::DuplicateId {
        package_id: def.id.clone(),
        kind: kind.to_string(),
        id: id.clone(),
    };
    if let Some(schema_type) = invariants::find_duplicate_schema_types(def).first() {
        return Err(duplicate_id("schema type", schema_type));
    }
    if let Some(port_id) = invariants::find_duplicate_port_ids(def).first() {
        return Err(duplicate_id("port schema", port_id));
    }
    if let Some(group_id) = invariants::find_duplicate_group_ids(def).first() {
        return Err(duplicate_id("group", group_id));
    }

    if let Some((group_id, parent_id)) = invariants::find_unknown_parents(def).first() {
        return Err(SchemaPackError::UnknownGroupReference {
            kind: "group".to_string(),
            owner: group_id.clone(),
            group_id: parent_id.clone(),
        });
    }
    if let Some(group_id) = invariants::find_parent_cycles(def).first() {
        return Err(SchemaPackError::GroupCycle {
            group_id: group_id.clone(),
        });
    }

    if let Some((kind, owner, group_id)) = invariants::find_unknown_group_refs(def).first() {
        return Err(SchemaPackError::UnknownGroupReference {
            kind: kind.clone(),
            owner: owner.clone(),
            group_id: group_id.clone(),
        });
    }

    if let Some((schema_type, field)) = invariants::find_duplicate_field_names(def).first() {
        return Err(invalid(format!(
            "schema {} declares field {} more than once",
            schema_type, field
        )));
    }

    Ok(())
}
