//! Canonicalization and content hashing of package definitions.
//!
//! The content hash depends on structural content only: array order, group
//! and relationship identifiers, `packageId` tags and object key order never
//! change it.

pub mod digest;
pub mod form;

pub use digest::{canonical_json, compute_content_hash};
pub use form::{canonicalize, CanonicalPackage, GroupRef};
