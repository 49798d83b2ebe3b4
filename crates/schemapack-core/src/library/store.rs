use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::errors::{ExError, SchemaPackError};
use crate::model::{LibraryEntry, LibraryEntrySummary, LibraryVersion, PackageDefinition};

/// Version body handed to [`LibraryStore::append_version`]. The store assigns
/// the version number.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVersion {
    pub snapshot: PackageDefinition,
    pub content_hash: String,
    pub changelog: Option<String>,
    pub published_at: DateTime<Utc>,
}

/// Entry resolution for [`LibraryStore::publish_version`]
#[derive(Debug, Clone, PartialEq)]
pub struct PublishTarget {
    /// Entry recorded in the live package's lineage, tried first
    pub lineage_entry_id: Option<String>,
    /// Created when neither the lineage entry nor an entry first published
    /// from `new_entry.source_package_id` exists
    pub new_entry: LibraryEntry,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishedVersion {
    pub entry_id: String,
    pub created_entry: bool,
    pub version: LibraryVersion,
}

/// Library storage seam
pub trait LibraryStore {
    /// All entries with their versions, ordered by entry id
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the backing store cannot be read.
    fn entries(&self) -> Result<Vec<LibraryEntry>, ExError>;

    /// Catalog view: version counts only
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the backing store cannot be read.
    fn summaries(&self) -> Result<Vec<LibraryEntrySummary>, ExError> {
        Ok(self.entries()?.iter().map(LibraryEntry::summary).collect())
    }

    /// # Errors
    ///
    /// Returns a persistence error if the backing store cannot be read.
    fn entry(&self, entry_id: &str) -> Result<Option<LibraryEntry>, ExError>;

    /// Entry first published from the given live package
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the backing store cannot be read.
    fn find_entry_for_package(&self, package_id: &str) -> Result<Option<LibraryEntry>, ExError>;

    /// Create an entry (its `versions` are ignored)
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if the entry id is taken.
    fn create_entry(&mut self, entry: LibraryEntry) -> Result<(), ExError>;

    /// Append the next version (1 for an empty entry) and return it
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the entry does not exist.
    fn append_version(
        &mut self,
        entry_id: &str,
        version: NewVersion,
    ) -> Result<LibraryVersion, ExError>;

    /// Resolve (or create) the target entry and append the next version.
    ///
    /// Stores shared between processes must override this so resolution,
    /// creation and append happen atomically; otherwise two first publishes
    /// of one package can each create an entry.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the backing store cannot be written.
    fn publish_version(
        &mut self,
        target: PublishTarget,
        version: NewVersion,
    ) -> Result<PublishedVersion, ExError> {
        let lineage = match target.lineage_entry_id.as_deref() {
            Some(entry_id) => self.entry(entry_id)?,
            None => None,
        };
        let existing = match lineage {
            Some(entry) => Some(entry),
            None => self.find_entry_for_package(&target.new_entry.source_package_id)?,
        };

        let (entry_id, created_entry) = match existing {
            Some(entry) => (entry.entry_id, false),
            None => {
                let entry_id = target.new_entry.entry_id.clone();
                self.create_entry(target.new_entry)?;
                (entry_id, true)
            }
        };

        let version = self.append_version(&entry_id, version)?;
        Ok(PublishedVersion {
            entry_id,
            created_entry,
            version,
        })
    }
}

/// In-memory library
#[derive(Debug, Clone, Default)]
pub struct Library {
    entries: BTreeMap<String, LibraryEntry>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LibraryStore for Library {
    fn entries(&self) -> Result<Vec<LibraryEntry>, ExError> {
        Ok(self.entries.values().cloned().collect())
    }

    fn entry(&self, entry_id: &str) -> Result<Option<LibraryEntry>, ExError> {
        Ok(self.entries.get(entry_id).cloned())
    }

    fn find_entry_for_package(&self, package_id: &str) -> Result<Option<LibraryEntry>, ExError> {
        Ok(self
            .entries
            .values()
            .find(|e| e.source_package_id == package_id)
            .cloned())
    }

    fn create_entry(&mut self, mut entry: LibraryEntry) -> Result<(), ExError> {
        if self.entries.contains_key(&entry.entry_id) {
            return Err(SchemaPackError::LibraryEntryExists {
                entry_id: entry.entry_id,
            }
            .into());
        }
        entry.versions.clear();
        self.entries.insert(entry.entry_id.clone(), entry);
        Ok(())
    }

    fn append_version(
        &mut self,
        entry_id: &str,
        version: NewVersion,
    ) -> Result<LibraryVersion, ExError> {
        let entry =
            self.entries
                .get_mut(entry_id)
                .ok_or_else(|| SchemaPackError::LibraryEntryNotFound {
                    entry_id: entry_id.to_string(),
                })?;

        let published = LibraryVersion {
            version: entry.next_version(),
            snapshot: version.snapshot,
            content_hash: version.content_hash,
            changelog: version.changelog,
            published_at: version.published_at,
        };
        entry.versions.push(published.clone());
        Ok(published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExErrorKind;

    fn entry(id: &str) -> LibraryEntry {
        LibraryEntry {
            entry_id: id.to_string(),
            source_package_id: "pkg-1".to_string(),
            name: "Infra".to_string(),
            description: None,
            color: None,
            versions: Vec::new(),
        }
    }

    fn body() -> NewVersion {
        NewVersion {
            snapshot: PackageDefinition::new("pkg-1", "Infra"),
            content_hash: "h".to_string(),
            changelog: None,
            published_at: Utc::now(),
        }
    }

    #[test]
    fn test_versions_increment_from_one() {
        let mut library = Library::new();
        library.create_entry(entry("e1")).unwrap();

        assert_eq!(library.append_version("e1", body()).unwrap().version, 1);
        assert_eq!(library.append_version("e1", body()).unwrap().version, 2);
        assert_eq!(library.summaries().unwrap()[0].version_count, 2);
    }

    #[test]
    fn test_append_to_unknown_entry_is_not_found() {
        let mut library = Library::new();
        let err = library.append_version("nope", body()).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::NotFound);
    }

    #[test]
    fn test_publish_version_reuses_entry_for_source_package() {
        let mut library = Library::new();
        let target = |entry_id: &str| PublishTarget {
            lineage_entry_id: None,
            new_entry: entry(entry_id),
        };

        let first = library.publish_version(target("e1"), body()).unwrap();
        let second = library.publish_version(target("e2"), body()).unwrap();

        assert!(first.created_entry);
        assert!(!second.created_entry);
        assert_eq!(second.entry_id, "e1");
        assert_eq!(second.version.version, 2);
        assert_eq!(library.entries().unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_entry_rejected() {
        let mut library = Library::new();
        library.create_entry(entry("e1")).unwrap();
        let err = library.create_entry(entry("e1")).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::AlreadyExists);
    }
}
