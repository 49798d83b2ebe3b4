//! Repositories bridging core types to SQLite

mod document_repo;
mod library_repo;

pub use document_repo::DocumentRepo;
pub use library_repo::SqliteLibrary;

use chrono::{DateTime, Utc};
use schemapack_core::errors::{ExError, ExErrorKind};

/// Timestamps are stored as RFC 3339 text
pub(crate) fn parse_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, ExError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            ExError::new(ExErrorKind::Serialization)
                .with_op("parse_timestamp")
                .with_message(format!("{}: {}", column, e))
        })
}
