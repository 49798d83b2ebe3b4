use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::definition::PackageDefinition;

/// One published version of a library entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryVersion {
    /// 1-based, strictly increasing within an entry
    pub version: u32,
    pub snapshot: PackageDefinition,
    pub content_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog: Option<String>,
    pub published_at: DateTime<Utc>,
}

/// Versioned, cross-document publication history of a package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntry {
    pub entry_id: String,
    /// Id of the live package first published into this entry
    pub source_package_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub versions: Vec<LibraryVersion>,
}

impl LibraryEntry {
    /// Latest (head) version, if any has been published
    pub fn latest(&self) -> Option<&LibraryVersion> {
        self.versions.iter().max_by_key(|v| v.version)
    }

    pub fn version(&self, version: u32) -> Option<&LibraryVersion> {
        self.versions.iter().find(|v| v.version == version)
    }

    pub fn next_version(&self) -> u32 {
        self.latest().map(|v| v.version + 1).unwrap_or(1)
    }

    pub fn summary(&self) -> LibraryEntrySummary {
        LibraryEntrySummary {
            entry_id: self.entry_id.clone(),
            name: self.name.clone(),
            version_count: self.versions.len(),
            latest_version: self.latest().map(|v| v.version),
        }
    }
}

/// Catalog view of an entry: no snapshot bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntrySummary {
    pub entry_id: String,
    pub name: String,
    pub version_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<u32>,
}
