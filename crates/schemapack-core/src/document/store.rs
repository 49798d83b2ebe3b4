use serde::{Deserialize, Serialize};

use crate::core_types::Origin;
use crate::errors::Result;
use crate::model::{
    ConstructSchema, LivePackage, ManifestEntry, PackageManifest, PortSchema, SchemaGroup,
    SchemaRelationship,
};

/// Read access to a document's live entities and manifest
pub trait DocumentRead {
    fn schemas(&self) -> &[ConstructSchema];
    fn port_schemas(&self) -> &[PortSchema];
    fn schema_groups(&self) -> &[SchemaGroup];
    fn schema_relationships(&self) -> &[SchemaRelationship];

    fn live_package(&self, package_id: &str) -> Option<&LivePackage>;

    /// All live package records, ordered by package id
    fn live_packages(&self) -> Vec<&LivePackage>;

    fn manifest(&self) -> &PackageManifest;

    fn manifest_entry(&self, package_id: &str) -> Option<&ManifestEntry> {
        self.manifest().get(package_id)
    }
}

/// Mutations available inside a document transaction
pub trait DocumentWrite: DocumentRead {
    fn add_schema(&mut self, schema: ConstructSchema);
    fn add_port_schema(&mut self, port_schema: PortSchema);
    fn add_schema_group(&mut self, group: SchemaGroup);
    fn add_schema_relationship(&mut self, relationship: SchemaRelationship);

    /// # Errors
    ///
    /// Returns `PackageAlreadyExists` if a live package with the same id exists.
    fn add_live_package(&mut self, package: LivePackage) -> Result<()>;

    /// # Errors
    ///
    /// Returns `ManifestEntryExists` if the package already has a manifest entry.
    fn add_manifest_entry(&mut self, entry: ManifestEntry) -> Result<()>;

    // Collaborator edits
    fn schemas_mut(&mut self) -> &mut Vec<ConstructSchema>;
    fn port_schemas_mut(&mut self) -> &mut Vec<PortSchema>;
    fn schema_groups_mut(&mut self) -> &mut Vec<SchemaGroup>;
    fn schema_relationships_mut(&mut self) -> &mut Vec<SchemaRelationship>;
    fn live_package_mut(&mut self, package_id: &str) -> Option<&mut LivePackage>;

    /// Remove every entity tagged with `package_id`, its live package record
    /// and its manifest entry
    fn remove_package(&mut self, package_id: &str) -> RemovedCounts;
}

/// A document that can run atomic transactions
pub trait DocumentStore: DocumentRead {
    /// Run `f` atomically. `origin` tags the resulting change-set.
    ///
    /// Either every write made by `f` becomes visible, or (when `f` returns an
    /// error) none does.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `f`.
    fn transaction<T, F>(&mut self, origin: &Origin, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn DocumentWrite) -> Result<T>;
}

/// Entities removed by a package teardown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedCounts {
    pub schemas: usize,
    pub port_schemas: usize,
    pub schema_groups: usize,
    pub schema_relationships: usize,
    pub live_package: bool,
    pub manifest_entry: bool,
}

impl RemovedCounts {
    pub fn total_entities(&self) -> usize {
        self.schemas + self.port_schemas + self.schema_groups + self.schema_relationships
    }
}
