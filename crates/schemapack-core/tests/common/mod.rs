use schemapack_core::core_types::Origin;
use schemapack_core::document::{Document, DocumentStore, DocumentWrite};
use schemapack_core::model::{
    ConstructSchema, FieldSchema, PackageDefinition, PortConfig, PortSchema, SchemaGroup,
    SchemaRelationship,
};
use schemapack_core::{apply_package, ApplyOptions};
use serde_json::json;

/// A package exercising every entity kind: nested groups, grouped schemas
/// and ports, free-form metadata and a relationship
#[allow(dead_code)]
pub fn infra_package() -> PackageDefinition {
    PackageDefinition::new("pkg-infra", "Infrastructure")
        .with_description("Services and their storage")
        .with_color("#336699")
        .with_group(SchemaGroup::new("g-infra", "Infra").with_color("grey"))
        .with_group(
            SchemaGroup::new("g-compute", "Compute")
                .with_parent("g-infra")
                .with_color("red"),
        )
        .with_group(SchemaGroup::new("g-storage", "Storage").with_parent("g-infra"))
        .with_schema(
            ConstructSchema::new("svc", "Service")
                .with_group_id("g-compute")
                .with_field(FieldSchema::new("name", "string").required())
                .with_field(FieldSchema::new("port", "number").with_display_tier("primary"))
                .with_port(PortConfig::new("flow-out", "flow-out", "right"))
                .with_metadata(json!({"icon": "server", "layout": {"w": 2, "h": 1}})),
        )
        .with_schema(
            ConstructSchema::new("db", "Database")
                .with_group_id("g-storage")
                .with_field(FieldSchema::new("engine", "enum"))
                .with_port(PortConfig::new("flow-in", "flow-in", "left")),
        )
        .with_port_schema(
            PortSchema::new("flow-out", "Flow Out", "flow", "source")
                .compatible_with(&["flow-in"])
                .with_group_id("g-infra"),
        )
        .with_port_schema(
            PortSchema::new("flow-in", "Flow In", "flow", "sink").compatible_with(&["flow-out"]),
        )
        .with_relationship(SchemaRelationship::new(
            "rel-1", "svc", "db", "flow-out", "flow-in",
        ))
}

/// Snapshot `{schemas:[{type:'svc', fields:[{name:'port', type:'number'}]}]}`
#[allow(dead_code)]
pub fn svc_port_package() -> PackageDefinition {
    PackageDefinition::new("pkg-p1", "P1").with_schema(
        ConstructSchema::new("svc", "Service").with_field(FieldSchema::new("port", "number")),
    )
}

#[allow(dead_code)]
pub fn installed(def: &PackageDefinition) -> Document {
    let mut doc = Document::new();
    apply_package(&mut doc, def, &ApplyOptions::default()).unwrap();
    doc
}

/// Simulate a collaborator edit
#[allow(dead_code)]
pub fn edit<F>(doc: &mut Document, f: F)
where
    F: FnOnce(&mut dyn DocumentWrite),
{
    doc.transaction(&Origin::user(), |txn| {
        f(txn);
        Ok(())
    })
    .unwrap();
}

/// Live schema of a package by type
#[allow(dead_code)]
pub fn live_schema_mut<'a>(
    txn: &'a mut dyn DocumentWrite,
    package_id: &str,
    schema_type: &str,
) -> &'a mut ConstructSchema {
    txn.schemas_mut()
        .iter_mut()
        .find(|s| s.package_id.as_deref() == Some(package_id) && s.schema_type == schema_type)
        .unwrap()
}
