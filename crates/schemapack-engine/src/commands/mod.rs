//! Command orchestration layer.
//!
//! Coordinates core domain operations with the persistence layer.

pub mod engine_command;
