//! Drift detection
//!
//! Installed packages live in the document under regenerated identifiers, so
//! drift cannot be decided by comparing ids. Instead the live entities are
//! projected back into the snapshot's identifier space (`projection`), using
//! a reverse group lookup keyed by `(name, color)` (`reverse_map`), and the
//! reconstruction's content hash is compared against the install baseline
//! (`detector`).

pub mod detector;
pub mod projection;
pub mod reverse_map;

pub use detector::{check_drift, drift_report, AmbiguousGroup, DriftReport, DriftStatus, UnmappedGroup};
pub use projection::{project_live, reconstruct_live, ElementCounts, Reconstruction};
pub use reverse_map::{match_group, GroupMatch, ReverseGroupMap};
