//! SQLite-backed library
//!
//! Entries live in `library_entries`; every published version is one row of
//! `library_versions` holding the snapshot as JSON. Writes run in `IMMEDIATE`
//! transactions so concurrent publishers serialize on the database lock.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use schemapack_core::errors::SchemaPackError;
use schemapack_core::library::{LibraryStore, NewVersion, PublishTarget, PublishedVersion};
use schemapack_core::model::{LibraryEntry, LibraryVersion, PackageDefinition};

use crate::errors::{from_rusqlite, from_serde_json, Result};
use crate::repo::parse_timestamp;

const ENTRY_COLUMNS: &str = "entry_id, source_package_id, name, description, color";

/// `LibraryStore` over a migrated SQLite connection
///
/// Reads work inside a caller's transaction. Writes open their own, so they
/// must not be called while one is active on the connection.
pub struct SqliteLibrary<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteLibrary<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    fn begin_write(&self) -> Result<Transaction<'c>> {
        Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(from_rusqlite)
    }

    fn with_versions(&self, mut entry: LibraryEntry) -> Result<LibraryEntry> {
        entry.versions = load_versions(self.conn, &entry.entry_id)?;
        Ok(entry)
    }
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<LibraryEntry> {
    Ok(LibraryEntry {
        entry_id: row.get(0)?,
        source_package_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        color: row.get(4)?,
        versions: Vec::new(),
    })
}

fn query_entry(conn: &Connection, where_clause: &str, key: &str) -> Result<Option<LibraryEntry>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM library_entries WHERE {}",
            ENTRY_COLUMNS, where_clause
        ),
        [key],
        entry_from_row,
    )
    .optional()
    .map_err(from_rusqlite)
}

fn entry_by_id(conn: &Connection, entry_id: &str) -> Result<Option<LibraryEntry>> {
    query_entry(conn, "entry_id = ?1", entry_id)
}

/// Oldest entry wins when a package id was published more than once
fn entry_by_source(conn: &Connection, package_id: &str) -> Result<Option<LibraryEntry>> {
    query_entry(
        conn,
        "source_package_id = ?1 ORDER BY created_at, entry_id LIMIT 1",
        package_id,
    )
}

fn insert_entry(conn: &Connection, entry: &LibraryEntry) -> Result<()> {
    if entry_by_id(conn, &entry.entry_id)?.is_some() {
        return Err(SchemaPackError::LibraryEntryExists {
            entry_id: entry.entry_id.clone(),
        }
        .into());
    }

    conn.execute(
        "INSERT INTO library_entries
            (entry_id, source_package_id, name, description, color, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            entry.entry_id,
            entry.source_package_id,
            entry.name,
            entry.description,
            entry.color,
            Utc::now().timestamp_millis(),
        ],
    )
    .map_err(from_rusqlite)?;

    tracing::debug!(entry_id = %entry.entry_id, "library entry created");
    Ok(())
}

/// Insert the entry's next version; the caller holds the write transaction
fn insert_next_version(
    conn: &Connection,
    entry_id: &str,
    version: NewVersion,
) -> Result<LibraryVersion> {
    if entry_by_id(conn, entry_id)?.is_none() {
        return Err(SchemaPackError::LibraryEntryNotFound {
            entry_id: entry_id.to_string(),
        }
        .into());
    }

    let snapshot_json = serde_json::to_string(&version.snapshot)
        .map_err(|e| from_serde_json("append_version", e))?;
    let next: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) + 1 FROM library_versions WHERE entry_id = ?1",
            [entry_id],
            |row| row.get(0),
        )
        .map_err(from_rusqlite)?;

    conn.execute(
        "INSERT INTO library_versions
            (entry_id, version, content_hash, changelog, published_at, snapshot_json)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            entry_id,
            next,
            version.content_hash,
            version.changelog,
            version.published_at.to_rfc3339(),
            snapshot_json,
        ],
    )
    .map_err(from_rusqlite)?;

    tracing::debug!(entry_id, version = next, "library version appended");
    Ok(LibraryVersion {
        version: next,
        snapshot: version.snapshot,
        content_hash: version.content_hash,
        changelog: version.changelog,
        published_at: version.published_at,
    })
}

fn load_versions(conn: &Connection, entry_id: &str) -> Result<Vec<LibraryVersion>> {
    let mut stmt = conn
        .prepare(
            "SELECT version, content_hash, changelog, published_at, snapshot_json
             FROM library_versions WHERE entry_id = ?1 ORDER BY version",
        )
        .map_err(from_rusqlite)?;

    let rows: Vec<(u32, String, Option<String>, String, String)> = stmt
        .query_map([entry_id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
        })
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;

    rows.into_iter()
        .map(|(version, content_hash, changelog, published_at, snapshot_json)| {
            let snapshot: PackageDefinition = serde_json::from_str(&snapshot_json)
                .map_err(|e| from_serde_json("load_library_version", e))?;
            Ok(LibraryVersion {
                version,
                snapshot,
                content_hash,
                changelog,
                published_at: parse_timestamp("published_at", &published_at)?,
            })
        })
        .collect()
}

impl LibraryStore for SqliteLibrary<'_> {
    fn entries(&self) -> Result<Vec<LibraryEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM library_entries ORDER BY entry_id",
                ENTRY_COLUMNS
            ))
            .map_err(from_rusqlite)?;
        let entries = stmt
            .query_map([], entry_from_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        drop(stmt);

        entries.into_iter().map(|e| self.with_versions(e)).collect()
    }

    fn entry(&self, entry_id: &str) -> Result<Option<LibraryEntry>> {
        entry_by_id(self.conn, entry_id)?
            .map(|e| self.with_versions(e))
            .transpose()
    }

    fn find_entry_for_package(&self, package_id: &str) -> Result<Option<LibraryEntry>> {
        entry_by_source(self.conn, package_id)?
            .map(|e| self.with_versions(e))
            .transpose()
    }

    fn create_entry(&mut self, entry: LibraryEntry) -> Result<()> {
        let tx = self.begin_write()?;
        insert_entry(&tx, &entry)?;
        tx.commit().map_err(from_rusqlite)
    }

    fn append_version(
        &mut self,
        entry_id: &str,
        version: NewVersion,
    ) -> Result<LibraryVersion> {
        let tx = self.begin_write()?;
        let appended = insert_next_version(&tx, entry_id, version)?;
        tx.commit().map_err(from_rusqlite)?;
        Ok(appended)
    }

    fn publish_version(
        &mut self,
        target: PublishTarget,
        version: NewVersion,
    ) -> Result<PublishedVersion> {
        let tx = self.begin_write()?;

        let lineage = match target.lineage_entry_id.as_deref() {
            Some(entry_id) => entry_by_id(&tx, entry_id)?,
            None => None,
        };
        let existing = match lineage {
            Some(entry) => Some(entry),
            None => entry_by_source(&tx, &target.new_entry.source_package_id)?,
        };
        let (entry_id, created_entry) = match existing {
            Some(entry) => (entry.entry_id, false),
            None => {
                insert_entry(&tx, &target.new_entry)?;
                (target.new_entry.entry_id, true)
            }
        };

        let version = insert_next_version(&tx, &entry_id, version)?;
        tx.commit().map_err(from_rusqlite)?;

        Ok(PublishedVersion {
            entry_id,
            created_entry,
            version,
        })
    }
}
