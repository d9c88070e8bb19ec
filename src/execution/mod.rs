//! Execution engine.
//!
//! This module provides the execution infrastructure for running steps,
//! chains, and whole chain sets.

mod chain_runner;
mod engine;
mod runner;

pub use chain_runner::{ChainReport, ChainRunner, ChainStatus};
pub use engine::{Engine, RunReport};
pub use runner::{StepReport, StepRunner};
