//! Versioned package library
//!
//! Publishing lifts a live, document-scoped package into a portable library
//! entry; applying pulls a library version back into a document with fork
//! lineage. Storage is abstracted behind `LibraryStore` so the same manager
//! operations run against the in-memory `Library` and the SQLite store.

pub mod manager;
pub mod store;

pub use manager::{
    apply_library_entry, check_for_update, get_version, list_library, preview_update, publish,
    PublishResult, UpdateCheck,
};
pub use store::{Library, LibraryStore, NewVersion, PublishTarget, PublishedVersion};
