//! Definition validation, run upstream of installation.

pub mod invariants;
pub mod validation;

pub use validation::validate_definition;
