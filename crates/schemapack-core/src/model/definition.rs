//! Portable package definition model.
//!
//! A `PackageDefinition` is the canonical, self-contained form of a schema
//! package. Identity is carried by `id` alone; group identifiers inside the
//! definition are only meaningful for the definition's own cross references
//! (`parentId`, `groupId`).
//!
//! The same entity types are used for live (installed) entities, where
//! `package_id` is stamped with the owning package's id.

use serde::{Deserialize, Serialize};

/// Portable bundle of schemas, port schemas, groups and relationships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDefinition {
    /// Stable, author-assigned or generated package id (the idempotency key)
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub schemas: Vec<ConstructSchema>,
    #[serde(default)]
    pub port_schemas: Vec<PortSchema>,
    #[serde(default)]
    pub schema_groups: Vec<SchemaGroup>,
    #[serde(default)]
    pub schema_relationships: Vec<SchemaRelationship>,
}

impl PackageDefinition {
    /// Create an empty definition with the given id and name
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            color: None,
            schemas: Vec::new(),
            port_schemas: Vec::new(),
            schema_groups: Vec::new(),
            schema_relationships: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_schema(mut self, schema: ConstructSchema) -> Self {
        self.schemas.push(schema);
        self
    }

    pub fn with_port_schema(mut self, port: PortSchema) -> Self {
        self.port_schemas.push(port);
        self
    }

    pub fn with_group(mut self, group: SchemaGroup) -> Self {
        self.schema_groups.push(group);
        self
    }

    pub fn with_relationship(mut self, relationship: SchemaRelationship) -> Self {
        self.schema_relationships.push(relationship);
        self
    }

    /// Look up a group by its definition-local id
    pub fn group(&self, id: &str) -> Option<&SchemaGroup> {
        self.schema_groups.iter().find(|g| g.id == id)
    }

    /// Total number of entities carried by this definition
    pub fn entity_count(&self) -> usize {
        self.schemas.len()
            + self.port_schemas.len()
            + self.schema_groups.len()
            + self.schema_relationships.len()
    }
}

/// Typed node definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructSchema {
    /// Schema type, unique within a package
    #[serde(rename = "type")]
    pub schema_type: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
    #[serde(default)]
    pub ports: Vec<PortConfig>,
    /// Free-form, nested metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,
}

impl ConstructSchema {
    pub fn new(schema_type: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            schema_type: schema_type.into(),
            display_name: display_name.into(),
            description: None,
            color: None,
            fields: Vec::new(),
            ports: Vec::new(),
            metadata: None,
            group_id: None,
            package_id: None,
        }
    }

    pub fn with_field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_port(mut self, port: PortConfig) -> Self {
        self.ports.push(port);
        self
    }

    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A single field on a construct schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_tier: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            display_tier: None,
            required: false,
            description: None,
            default_value: None,
            options: Vec::new(),
        }
    }

    pub fn with_display_tier(mut self, tier: impl Into<String>) -> Self {
        self.display_tier = Some(tier.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Port attachment point declared on a construct schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortConfig {
    pub id: String,
    pub port_type: String,
    pub position: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl PortConfig {
    pub fn new(
        id: impl Into<String>,
        port_type: impl Into<String>,
        position: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            port_type: port_type.into(),
            position: position.into(),
            label: None,
        }
    }
}

/// Typed port definition shared across schemas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortSchema {
    pub id: String,
    pub display_name: String,
    pub semantic: String,
    pub polarity: String,
    #[serde(default)]
    pub compatible_with: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_complement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,
}

impl PortSchema {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        semantic: impl Into<String>,
        polarity: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            semantic: semantic.into(),
            polarity: polarity.into(),
            compatible_with: Vec::new(),
            expected_complement: None,
            color: None,
            description: None,
            group_id: None,
            package_id: None,
        }
    }

    pub fn compatible_with(mut self, port_ids: &[&str]) -> Self {
        self.compatible_with = port_ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }
}

/// Hierarchical grouping node. `parent_id` is `None` at the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaGroup {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,
}

impl SchemaGroup {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: None,
            color: None,
            description: None,
            package_id: None,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Directed edge-type declaration between two schema types.
///
/// The `id` is disposable: nothing outside the relationship refers to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaRelationship {
    pub id: String,
    pub source_schema_type: String,
    pub target_schema_type: String,
    pub source_port_id: String,
    pub target_port_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,
}

impl SchemaRelationship {
    pub fn new(
        id: impl Into<String>,
        source_schema_type: impl Into<String>,
        target_schema_type: impl Into<String>,
        source_port_id: impl Into<String>,
        target_port_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_schema_type: source_schema_type.into(),
            target_schema_type: target_schema_type.into(),
            source_port_id: source_port_id.into(),
            target_port_id: target_port_id.into(),
            label: None,
            cardinality: None,
            package_id: None,
        }
    }

    /// Composite `source-target` key used for canonical ordering
    pub fn sort_key(&self) -> String {
        format!("{}-{}", self.source_schema_type, self.target_schema_type)
    }

    /// Composite `source::target` key used by the diff engine
    pub fn diff_key(&self) -> String {
        format!("{}::{}", self.source_schema_type, self.target_schema_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_serializes_camel_case() {
        let def = PackageDefinition::new("pkg-1", "Infra")
            .with_schema(
                ConstructSchema::new("svc", "Service")
                    .with_field(FieldSchema::new("port", "number").with_display_tier("primary")),
            )
            .with_port_schema(PortSchema::new("flow-out", "Flow Out", "flow", "source"));

        let json = serde_json::to_value(&def).unwrap();
        assert!(json.get("portSchemas").is_some());
        assert_eq!(json["schemas"][0]["type"], "svc");
        assert_eq!(json["schemas"][0]["fields"][0]["displayTier"], "primary");
        assert!(json["schemas"][0].get("packageId").is_none());
    }

    #[test]
    fn test_definition_deserializes_with_missing_collections() {
        let def: PackageDefinition =
            serde_json::from_str(r#"{"id":"p","name":"Empty"}"#).unwrap();
        assert_eq!(def.entity_count(), 0);
    }

    #[test]
    fn test_relationship_keys() {
        let rel = SchemaRelationship::new("r1", "svc", "db", "out", "in");
        assert_eq!(rel.sort_key(), "svc-db");
        assert_eq!(rel.diff_key(), "svc::db");
    }
}
