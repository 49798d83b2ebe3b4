//! Canonical comparison form.
//!
//! Plain value types carrying a definition's structural content without its
//! disposable identifiers. Group references are expressed as the name path
//! from the root group instead of a raw group id.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::Value;

use crate::canonical::digest::canonical_json;
use crate::model::{
    ConstructSchema, FieldSchema, PackageDefinition, PortConfig, PortSchema, SchemaGroup,
    SchemaRelationship,
};

/// Reference to a group inside the canonical form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupRef {
    /// Group names from the root down to the referenced group
    Path(Vec<String>),
    /// Identifier that does not resolve inside the definition, kept verbatim
    Id(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalPackage {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub schemas: Vec<CanonicalSchema>,
    pub port_schemas: Vec<CanonicalPortSchema>,
    pub schema_groups: Vec<CanonicalGroup>,
    pub schema_relationships: Vec<CanonicalRelationship>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub fields: Vec<FieldSchema>,
    pub ports: Vec<PortConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalPortSchema {
    pub id: String,
    pub display_name: String,
    pub semantic: String,
    pub polarity: String,
    pub compatible_with: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_complement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalGroup {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<GroupRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRelationship {
    pub source_schema_type: String,
    pub target_schema_type: String,
    pub source_port_id: String,
    pub target_port_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<String>,
}

/// Build the canonical form of a definition.
///
/// Collections are ordered as follows, ties broken by the canonical JSON of
/// the element:
/// - schemas by `type`
/// - port schemas by `id`
/// - groups by `name`
/// - relationships by `sourceSchemaType-targetSchemaType`
pub fn canonicalize(definition: &PackageDefinition) -> CanonicalPackage {
    let groups = GroupIndex::new(&definition.schema_groups);

    let schemas = definition
        .schemas
        .iter()
        .map(|s| canonical_schema(s, &groups))
        .collect();
    let port_schemas = definition
        .port_schemas
        .iter()
        .map(|p| canonical_port_schema(p, &groups))
        .collect();
    let schema_groups = definition
        .schema_groups
        .iter()
        .map(|g| canonical_group(g, &groups))
        .collect();
    let schema_relationships = definition
        .schema_relationships
        .iter()
        .map(canonical_relationship)
        .collect();

    CanonicalPackage {
        id: definition.id.clone(),
        name: definition.name.clone(),
        description: definition.description.clone(),
        color: definition.color.clone(),
        schemas: sorted_by(schemas, |s: &CanonicalSchema| s.schema_type.clone()),
        port_schemas: sorted_by(port_schemas, |p: &CanonicalPortSchema| p.id.clone()),
        schema_groups: sorted_by(schema_groups, |g: &CanonicalGroup| g.name.clone()),
        schema_relationships: sorted_by(schema_relationships, |r: &CanonicalRelationship| {
            format!("{}-{}", r.source_schema_type, r.target_schema_type)
        }),
    }
}

fn canonical_schema(schema: &ConstructSchema, groups: &GroupIndex<'_>) -> CanonicalSchema {
    CanonicalSchema {
        schema_type: schema.schema_type.clone(),
        display_name: schema.display_name.clone(),
        description: schema.description.clone(),
        color: schema.color.clone(),
        fields: schema.fields.clone(),
        ports: schema.ports.clone(),
        metadata: schema.metadata.clone(),
        group: schema.group_id.as_deref().map(|id| groups.reference(id)),
    }
}

fn canonical_port_schema(port: &PortSchema, groups: &GroupIndex<'_>) -> CanonicalPortSchema {
    CanonicalPortSchema {
        id: port.id.clone(),
        display_name: port.display_name.clone(),
        semantic: port.semantic.clone(),
        polarity: port.polarity.clone(),
        compatible_with: port.compatible_with.clone(),
        expected_complement: port.expected_complement.clone(),
        color: port.color.clone(),
        description: port.description.clone(),
        group: port.group_id.as_deref().map(|id| groups.reference(id)),
    }
}

fn canonical_group(group: &SchemaGroup, groups: &GroupIndex<'_>) -> CanonicalGroup {
    CanonicalGroup {
        name: group.name.clone(),
        parent: group.parent_id.as_deref().map(|id| groups.reference(id)),
        color: group.color.clone(),
        description: group.description.clone(),
    }
}

fn canonical_relationship(relationship: &SchemaRelationship) -> CanonicalRelationship {
    CanonicalRelationship {
        source_schema_type: relationship.source_schema_type.clone(),
        target_schema_type: relationship.target_schema_type.clone(),
        source_port_id: relationship.source_port_id.clone(),
        target_port_id: relationship.target_port_id.clone(),
        label: relationship.label.clone(),
        cardinality: relationship.cardinality.clone(),
    }
}

/// Sort by primary key, then by canonical JSON so the order is total
fn sorted_by<T, K>(items: Vec<T>, key: K) -> Vec<T>
where
    T: Serialize,
    K: Fn(&T) -> String,
{
    let mut keyed: Vec<(String, String, T)> = items
        .into_iter()
        .map(|item| {
            // Plain structs with string keys always serialize
            let json = serde_json::to_value(&item)
                .map(|v| canonical_json(&v))
                .unwrap_or_default();
            (key(&item), json, item)
        })
        .collect();
    keyed.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
    keyed.into_iter().map(|(_, _, item)| item).collect()
}

/// Group lookup by definition-local id
struct GroupIndex<'a> {
    by_id: HashMap<&'a str, &'a SchemaGroup>,
}

impl<'a> GroupIndex<'a> {
    fn new(groups: &'a [SchemaGroup]) -> Self {
        Self {
            by_id: groups.iter().map(|g| (g.id.as_str(), g)).collect(),
        }
    }

    fn reference(&self, id: &str) -> GroupRef {
        match self.name_path(id) {
            Some(path) => GroupRef::Path(path),
            None => GroupRef::Id(id.to_string()),
        }
    }

    /// Names from the root to `id`. `None` when the chain hits an unknown id
    /// or loops.
    fn name_path(&self, id: &str) -> Option<Vec<String>> {
        let mut names = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(id);

        while let Some(group_id) = current {
            if !seen.insert(group_id) {
                return None;
            }
            let group = self.by_id.get(group_id)?;
            names.push(group.name.clone());
            current = group.parent_id.as_deref();
        }

        names.reverse();
        Some(names)
    }
}
