use serde::{Deserialize, Serialize};

/// Fork lineage recorded when a package was installed from a library version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lineage {
    pub library_entry_id: String,
    pub applied_version: u32,
}

/// Document-scoped record of an installed package.
///
/// Distinct from the portable definition: it may be renamed or recoloured in
/// the document, and it remembers which library version it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivePackage {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_entry_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_version: Option<u32>,
}

impl LivePackage {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            color: None,
            library_entry_id: None,
            applied_version: None,
        }
    }

    /// Lineage, if both halves are recorded
    pub fn lineage(&self) -> Option<Lineage> {
        match (&self.library_entry_id, self.applied_version) {
            (Some(entry_id), Some(version)) => Some(Lineage {
                library_entry_id: entry_id.clone(),
                applied_version: version,
            }),
            _ => None,
        }
    }
}
