//! Core data model: steps, chains, identifiers, and usage errors.

pub mod chain;
pub mod error;
pub mod step;
pub mod types;
