//! Structural invariant finders for package definitions.
//!
//! Each finder returns every violation it sees, in definition order, so
//! callers can report exhaustively. `validation::validate_definition` stops
//! at the first one.

use std::collections::{HashMap, HashSet};

use crate::model::PackageDefinition;

/// Ids (or types/names) occurring more than once, each reported once
fn duplicates<'a>(keys: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut out = Vec::new();
    for key in keys {
        if !seen.insert(key) && reported.insert(key) {
            out.push(key.to_string());
        }
    }
    out
}

/// Positions of schemas whose type is blank
pub fn find_empty_schema_types(def: &PackageDefinition) -> Vec<usize> {
    def.schemas
        .iter()
        .enumerate()
        .filter(|(_, s)| s.schema_type.trim().is_empty())
        .map(|(i, _)| i)
        .collect()
}

pub fn find_duplicate_schema_types(def: &PackageDefinition) -> Vec<String> {
    duplicates(def.schemas.iter().map(|s| s.schema_type.as_str()))
}

pub fn find_duplicate_port_ids(def: &PackageDefinition) -> Vec<String> {
    duplicates(def.port_schemas.iter().map(|p| p.id.as_str()))
}

pub fn find_duplicate_group_ids(def: &PackageDefinition) -> Vec<String> {
    duplicates(def.schema_groups.iter().map(|g| g.id.as_str()))
}

/// `(schema type, field name)` pairs repeated within one schema
pub fn find_duplicate_field_names(def: &PackageDefinition) -> Vec<(String, String)> {
    def.schemas
        .iter()
        .flat_map(|s| {
            duplicates(s.fields.iter().map(|f| f.name.as_str()))
                .into_iter()
                .map(move |name| (s.schema_type.clone(), name))
        })
        .collect()
}

/// `(group id, parent id)` where the parent is not a group of the definition
pub fn find_unknown_parents(def: &PackageDefinition) -> Vec<(String, String)> {
    let ids: HashSet<&str> = def.schema_groups.iter().map(|g| g.id.as_str()).collect();
    def.schema_groups
        .iter()
        .filter_map(|g| {
            g.parent_id
                .as_deref()
                .filter(|p| !ids.contains(p))
                .map(|p| (g.id.clone(), p.to_string()))
        })
        .collect()
}

/// `(kind, owner, group id)` for schema/port group links that do not resolve
pub fn find_unknown_group_refs(def: &PackageDefinition) -> Vec<(String, String, String)> {
    let ids: HashSet<&str> = def.schema_groups.iter().map(|g| g.id.as_str()).collect();

    let schema_refs = def.schemas.iter().filter_map(|s| {
        s.group_id
            .as_deref()
            .filter(|id| !ids.contains(id))
            .map(|id| ("schema".to_string(), s.schema_type.clone(), id.to_string()))
    });
    let port_refs = def.port_schemas.iter().filter_map(|p| {
        p.group_id
            .as_deref()
            .filter(|id| !ids.contains(id))
            .map(|id| ("port schema".to_string(), p.id.clone(), id.to_string()))
    });

    schema_refs.chain(port_refs).collect()
}

/// Parent cycles among groups, one group id reported per cycle (the member
/// where the walk first closed the loop).
pub fn find_parent_cycles(def: &PackageDefinition) -> Vec<String> {
    let parents: HashMap<&str, &str> = def
        .schema_groups
        .iter()
        .filter_map(|g| g.parent_id.as_deref().map(|p| (g.id.as_str(), p)))
        .collect();

    let mut in_cycle: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    for group in &def.schema_groups {
        let start = group.id.as_str();
        if in_cycle.contains(start) {
            continue;
        }
        let mut seen = HashSet::new();
        let mut current = start;
        while let Some(parent) = parents.get(current) {
            if !seen.insert(current) {
                // `current` sits on a cycle; record every member once
                if !in_cycle.contains(current) {
                    let mut member = current;
                    loop {
                        in_cycle.insert(member);
                        member = match parents.get(member) {
                            Some(p) => *p,
                            None => break,
                        };
                        if member == current {
                            break;
                        }
                    }
                    out.push(current.to_string());
                }
                break;
            }
            current = *parent;
        }
    }
    out
}
