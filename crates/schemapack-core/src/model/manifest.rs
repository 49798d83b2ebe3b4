//! Per-document package manifest.
//!
//! The manifest is the idempotency and drift record: one entry per installed
//! package, keyed by package id, holding the content hash computed at install
//! time and the original (pre-hydration) definition.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::definition::PackageDefinition;

/// Manifest record for one installed package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub package_id: String,
    /// Content hash of `snapshot`
    pub content_hash: String,
    pub display_name: String,
    pub loaded_at: DateTime<Utc>,
    /// The definition exactly as supplied at install time. Never mutated.
    pub snapshot: PackageDefinition,
}

/// Manifest keyed by package id.
///
/// `BTreeMap` keeps serialization order stable when the document is saved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageManifest {
    entries: BTreeMap<String, ManifestEntry>,
}

impl PackageManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, package_id: &str) -> Option<&ManifestEntry> {
        self.entries.get(package_id)
    }

    pub fn contains(&self, package_id: &str) -> bool {
        self.entries.contains_key(package_id)
    }

    /// Insert an entry. Returns `false` (and leaves the manifest untouched)
    /// if an entry for the same package id already exists.
    pub fn insert(&mut self, entry: ManifestEntry) -> bool {
        if self.entries.contains_key(&entry.package_id) {
            return false;
        }
        self.entries.insert(entry.package_id.clone(), entry);
        true
    }

    pub fn remove(&mut self, package_id: &str) -> Option<ManifestEntry> {
        self.entries.remove(package_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> ManifestEntry {
        ManifestEntry {
            package_id: id.to_string(),
            content_hash: "h".to_string(),
            display_name: id.to_string(),
            loaded_at: Utc::now(),
            snapshot: PackageDefinition::new(id, id),
        }
    }

    #[test]
    fn test_insert_refuses_duplicates() {
        let mut manifest = PackageManifest::new();
        assert!(manifest.insert(entry("p1")));
        assert!(!manifest.insert(entry("p1")));
        assert_eq!(manifest.len(), 1);
    }

    #[test]
    fn test_serializes_as_map_keyed_by_package_id() {
        let mut manifest = PackageManifest::new();
        manifest.insert(entry("p1"));
        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["p1"]["packageId"], "p1");
    }
}
