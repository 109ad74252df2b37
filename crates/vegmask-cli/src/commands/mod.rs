//! Subcommand implementations.

pub mod analyze;
pub mod batch;
pub mod indices;
