//! In-memory document aggregate
//!
//! ## Atomicity Contract
//!
//! A transaction runs against a working copy of the committed state. The
//! working copy replaces the committed state only when the transaction
//! function returns `Ok`; on `Err` it is dropped and the document is
//! unchanged. Every committed transaction that wrote something appends a
//! `ChangeSet` tagged with its origin label.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core_types::{Origin, RequestId};
use crate::document::state::DocumentState;
use crate::document::store::{DocumentRead, DocumentStore, DocumentWrite, RemovedCounts};
use crate::errors::Result;
use crate::model::{
    ConstructSchema, LivePackage, ManifestEntry, PackageManifest, PortSchema, SchemaGroup,
    SchemaRelationship,
};

/// Record of one committed transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    pub request_id: RequestId,
    pub origin: Origin,
    /// Number of write calls made by the transaction
    pub writes: usize,
    pub committed_at: DateTime<Utc>,
}

/// A collaborative document: live entities, installed packages and manifest
#[derive(Debug, Clone, Default)]
pub struct Document {
    state: DocumentState,
    change_log: Vec<ChangeSet>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate a document from persisted state. The change log starts empty.
    pub fn from_state(state: DocumentState) -> Self {
        Self {
            state,
            change_log: Vec::new(),
        }
    }

    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    pub fn into_state(self) -> DocumentState {
        self.state
    }

    pub fn change_log(&self) -> &[ChangeSet] {
        &self.change_log
    }
}

impl DocumentRead for Document {
    fn schemas(&self) -> &[ConstructSchema] {
        self.state.schemas()
    }

    fn port_schemas(&self) -> &[PortSchema] {
        self.state.port_schemas()
    }

    fn schema_groups(&self) -> &[SchemaGroup] {
        self.state.schema_groups()
    }

    fn schema_relationships(&self) -> &[SchemaRelationship] {
        self.state.schema_relationships()
    }

    fn live_package(&self, package_id: &str) -> Option<&LivePackage> {
        self.state.live_package(package_id)
    }

    fn live_packages(&self) -> Vec<&LivePackage> {
        self.state.live_packages()
    }

    fn manifest(&self) -> &PackageManifest {
        self.state.manifest()
    }
}

impl DocumentStore for Document {
    fn transaction<T, F>(&mut self, origin: &Origin, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn DocumentWrite) -> Result<T>,
    {
        let mut working = WorkingCopy {
            state: self.state.clone(),
            writes: 0,
        };

        let value = f(&mut working)?;

        if working.writes > 0 {
            self.state = working.state;
            self.change_log.push(ChangeSet {
                request_id: RequestId::new(),
                origin: origin.clone(),
                writes: working.writes,
                committed_at: Utc::now(),
            });
            tracing::debug!(
                origin = origin.as_str(),
                writes = working.writes,
                "document transaction committed"
            );
        }

        Ok(value)
    }
}

/// Transaction-scoped copy of the document state that counts writes
struct WorkingCopy {
    state: DocumentState,
    writes: usize,
}

impl DocumentRead for WorkingCopy {
    fn schemas(&self) -> &[ConstructSchema] {
        self.state.schemas()
    }

    fn port_schemas(&self) -> &[PortSchema] {
        self.state.port_schemas()
    }

    fn schema_groups(&self) -> &[SchemaGroup] {
        self.state.schema_groups()
    }

    fn schema_relationships(&self) -> &[SchemaRelationship] {
        self.state.schema_relationships()
    }

    fn live_package(&self, package_id: &str) -> Option<&LivePackage> {
        self.state.live_package(package_id)
    }

    fn live_packages(&self) -> Vec<&LivePackage> {
        self.state.live_packages()
    }

    fn manifest(&self) -> &PackageManifest {
        self.state.manifest()
    }
}

impl DocumentWrite for WorkingCopy {
    fn add_schema(&mut self, schema: ConstructSchema) {
        self.writes += 1;
        self.state.add_schema(schema);
    }

    fn add_port_schema(&mut self, port_schema: PortSchema) {
        self.writes += 1;
        self.state.add_port_schema(port_schema);
    }

    fn add_schema_group(&mut self, group: SchemaGroup) {
        self.writes += 1;
        self.state.add_schema_group(group);
    }

    fn add_schema_relationship(&mut self, relationship: SchemaRelationship) {
        self.writes += 1;
        self.state.add_schema_relationship(relationship);
    }

    fn add_live_package(&mut self, package: LivePackage) -> Result<()> {
        self.state.add_live_package(package)?;
        self.writes += 1;
        Ok(())
    }

    fn add_manifest_entry(&mut self, entry: ManifestEntry) -> Result<()> {
        self.state.add_manifest_entry(entry)?;
        self.writes += 1;
        Ok(())
    }

    fn schemas_mut(&mut self) -> &mut Vec<ConstructSchema> {
        self.writes += 1;
        self.state.schemas_mut()
    }

    fn port_schemas_mut(&mut self) -> &mut Vec<PortSchema> {
        self.writes += 1;
        self.state.port_schemas_mut()
    }

    fn schema_groups_mut(&mut self) -> &mut Vec<SchemaGroup> {
        self.writes += 1;
        self.state.schema_groups_mut()
    }

    fn schema_relationships_mut(&mut self) -> &mut Vec<SchemaRelationship> {
        self.writes += 1;
        self.state.schema_relationships_mut()
    }

    fn live_package_mut(&mut self, package_id: &str) -> Option<&mut LivePackage> {
        self.writes += 1;
        self.state.live_package_mut(package_id)
    }

    fn remove_package(&mut self, package_id: &str) -> RemovedCounts {
        self.writes += 1;
        self.state.remove_package(package_id)
    }
}
