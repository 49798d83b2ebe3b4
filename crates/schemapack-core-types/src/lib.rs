//! Core types shared across the schemapack crates
//!
//! - **Correlation types**: RequestId, TraceId
//! - **Origins**: labels attached to document change-sets
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod origin;
pub mod schema;

pub use correlation::{RequestId, TraceId};
pub use origin::Origin;
