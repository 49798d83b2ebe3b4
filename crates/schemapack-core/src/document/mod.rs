//! Document-store boundary
//!
//! The collaborative document is the live, ID-stamped home of installed
//! package entities. This module defines the read/write interface consumed by
//! the package operations (`DocumentRead`, `DocumentWrite`, `DocumentStore`)
//! and an in-memory `Document` aggregate implementing it.

pub mod aggregate;
pub mod state;
pub mod store;

pub use aggregate::{ChangeSet, Document};
pub use state::DocumentState;
pub use store::{DocumentRead, DocumentStore, DocumentWrite, RemovedCounts};
