use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::store::{DocumentRead, DocumentWrite, RemovedCounts};
use crate::errors::{Result, SchemaPackError};
use crate::model::{
    ConstructSchema, LivePackage, ManifestEntry, PackageManifest, PortSchema, SchemaGroup,
    SchemaRelationship,
};

/// Flat, serializable document contents
///
/// Entities of every installed package share the same collections and are
/// told apart by their `package_id` tag. The manifest travels with the state
/// so saving a document also saves its install baselines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentState {
    #[serde(default)]
    pub schemas: Vec<ConstructSchema>,
    #[serde(default)]
    pub port_schemas: Vec<PortSchema>,
    #[serde(default)]
    pub schema_groups: Vec<SchemaGroup>,
    #[serde(default)]
    pub schema_relationships: Vec<SchemaRelationship>,
    #[serde(default)]
    pub packages: BTreeMap<String, LivePackage>,
    #[serde(default)]
    pub manifest: PackageManifest,
}

impl DocumentState {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentRead for DocumentState {
    fn schemas(&self) -> &[ConstructSchema] {
        &self.schemas
    }

    fn port_schemas(&self) -> &[PortSchema] {
        &self.port_schemas
    }

    fn schema_groups(&self) -> &[SchemaGroup] {
        &self.schema_groups
    }

    fn schema_relationships(&self) -> &[SchemaRelationship] {
        &self.schema_relationships
    }

    fn live_package(&self, package_id: &str) -> Option<&LivePackage> {
        self.packages.get(package_id)
    }

    fn live_packages(&self) -> Vec<&LivePackage> {
        self.packages.values().collect()
    }

    fn manifest(&self) -> &PackageManifest {
        &self.manifest
    }
}

impl DocumentWrite for DocumentState {
    fn add_schema(&mut self, schema: ConstructSchema) {
        self.schemas.push(schema);
    }

    fn add_port_schema(&mut self, port_schema: PortSchema) {
        self.port_schemas.push(port_schema);
    }

    fn add_schema_group(&mut self, group: SchemaGroup) {
        self.schema_groups.push(group);
    }

    fn add_schema_relationship(&mut self, relationship: SchemaRelationship) {
        self.schema_relationships.push(relationship);
    }

    fn add_live_package(&mut self, package: LivePackage) -> Result<()> {
        if self.packages.contains_key(&package.id) {
            return Err(SchemaPackError::PackageAlreadyExists {
                package_id: package.id,
            });
        }
        self.packages.insert(package.id.clone(), package);
        Ok(())
    }

    fn add_manifest_entry(&mut self, entry: ManifestEntry) -> Result<()> {
        let package_id = entry.package_id.clone();
        if !self.manifest.insert(entry) {
            return Err(SchemaPackError::ManifestEntryExists { package_id });
        }
        Ok(())
    }

    fn schemas_mut(&mut self) -> &mut Vec<ConstructSchema> {
        &mut self.schemas
    }

    fn port_schemas_mut(&mut self) -> &mut Vec<PortSchema> {
        &mut self.port_schemas
    }

    fn schema_groups_mut(&mut self) -> &mut Vec<SchemaGroup> {
        &mut self.schema_groups
    }

    fn schema_relationships_mut(&mut self) -> &mut Vec<SchemaRelationship> {
        &mut self.schema_relationships
    }

    fn live_package_mut(&mut self, package_id: &str) -> Option<&mut LivePackage> {
        self.packages.get_mut(package_id)
    }

    fn remove_package(&mut self, package_id: &str) -> RemovedCounts {
        let owned = |tag: &Option<String>| tag.as_deref() == Some(package_id);

        let before = (
            self.schemas.len(),
            self.port_schemas.len(),
            self.schema_groups.len(),
            self.schema_relationships.len(),
        );
        self.schemas.retain(|s| !owned(&s.package_id));
        self.port_schemas.retain(|p| !owned(&p.package_id));
        self.schema_groups.retain(|g| !owned(&g.package_id));
        self.schema_relationships.retain(|r| !owned(&r.package_id));

        RemovedCounts {
            schemas: before.0 - self.schemas.len(),
            port_schemas: before.1 - self.port_schemas.len(),
            schema_groups: before.2 - self.schema_groups.len(),
            schema_relationships: before.3 - self.schema_relationships.len(),
            live_package: self.packages.remove(package_id).is_some(),
            manifest_entry: self.manifest.remove(package_id).is_some(),
        }
    }
}
