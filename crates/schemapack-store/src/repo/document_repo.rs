//! Document persistence
//!
//! A document is stored as its serialized `DocumentState` (live entities,
//! live package records and the manifest together), so the manifest can never
//! be saved without the entities it describes. Committed change-sets are
//! appended to `document_changes`, keyed by request id.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Transaction};
use schemapack_core::core_types::{Origin, RequestId};
use schemapack_core::document::{ChangeSet, Document, DocumentState};

use crate::errors::{from_rusqlite, from_serde_json, Result};
use crate::repo::parse_timestamp;

pub struct DocumentRepo;

impl DocumentRepo {
    /// Save a document's state and append its change log.
    ///
    /// Change-sets already recorded for this document are skipped, so saving
    /// the same document twice is harmless. Returns the number of change-sets
    /// newly recorded.
    pub fn save(conn: &mut Connection, document_id: &str, doc: &Document) -> Result<usize> {
        let tx = conn.transaction().map_err(from_rusqlite)?;
        let recorded = Self::save_in(&tx, document_id, doc)?;
        tx.commit().map_err(from_rusqlite)?;
        Ok(recorded)
    }

    /// [`DocumentRepo::save`] inside a transaction owned by the caller.
    ///
    /// A caller that loaded the document through the same transaction gets a
    /// read-modify-write no other connection can interleave with, provided
    /// the transaction was opened `IMMEDIATE`.
    pub fn save_in(tx: &Transaction<'_>, document_id: &str, doc: &Document) -> Result<usize> {
        let state_json = serde_json::to_string(doc.state())
            .map_err(|e| from_serde_json("save_document", e))?;

        tx.execute(
            "INSERT INTO documents (document_id, state_json, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(document_id) DO UPDATE SET
                state_json = excluded.state_json,
                updated_at = excluded.updated_at",
            rusqlite::params![document_id, state_json, Utc::now().timestamp()],
        )
        .map_err(from_rusqlite)?;

        let mut recorded = 0;
        for change in doc.change_log() {
            recorded += tx
                .execute(
                    "INSERT OR IGNORE INTO document_changes
                        (document_id, request_id, origin, writes, committed_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![
                        document_id,
                        change.request_id.as_str(),
                        change.origin.as_str(),
                        change.writes as i64,
                        change.committed_at.to_rfc3339(),
                    ],
                )
                .map_err(from_rusqlite)?;
        }

        tracing::debug!(document_id, recorded, "document saved");
        Ok(recorded)
    }

    /// Load a saved document. The returned document's change log is empty;
    /// use [`DocumentRepo::change_history`] for the persisted one.
    pub fn load(conn: &Connection, document_id: &str) -> Result<Option<Document>> {
        let state_json: Option<String> = conn
            .query_row(
                "SELECT state_json FROM documents WHERE document_id = ?1",
                [document_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(from_rusqlite)?;

        state_json
            .map(|json| {
                serde_json::from_str::<DocumentState>(&json)
                    .map(Document::from_state)
                    .map_err(|e| from_serde_json("load_document", e))
            })
            .transpose()
    }

    /// Load a saved document, or start an empty one
    pub fn load_or_new(conn: &Connection, document_id: &str) -> Result<Document> {
        Ok(Self::load(conn, document_id)?.unwrap_or_default())
    }

    /// Persisted change-sets in commit order
    pub fn change_history(conn: &Connection, document_id: &str) -> Result<Vec<ChangeSet>> {
        let mut stmt = conn
            .prepare(
                "SELECT request_id, origin, writes, committed_at
                 FROM document_changes WHERE document_id = ?1 ORDER BY id",
            )
            .map_err(from_rusqlite)?;

        let rows: Vec<(String, String, i64, String)> = stmt
            .query_map([document_id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        rows.into_iter()
            .map(|(request_id, origin, writes, committed_at)| {
                Ok(ChangeSet {
                    request_id: RequestId::from_string(request_id),
                    origin: Origin::new(origin),
                    writes: usize::try_from(writes).unwrap_or_default(),
                    committed_at: parse_timestamp("committed_at", &committed_at)?,
                })
            })
            .collect()
    }

    /// Ids of all saved documents
    pub fn list(conn: &Connection) -> Result<Vec<String>> {
        let mut stmt = conn
            .prepare("SELECT document_id FROM documents ORDER BY document_id")
            .map_err(from_rusqlite)?;
        let ids = stmt
            .query_map([], |row| row.get(0))
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(from_rusqlite)?;
        Ok(ids)
    }
}
