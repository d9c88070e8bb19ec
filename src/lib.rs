//! stepwise - a minimal concurrent command runner.
//!
//! A [`Step`] is one named external-command invocation; a [`Chain`] is an
//! ordered, fail-fast sequence of steps; the [`Engine`] runs a set of
//! chains concurrently and aggregates their outcomes into a [`RunReport`].

pub mod core;
pub mod events;
pub mod execution;

pub use crate::core::chain::Chain;
pub use crate::core::error::UsageError;
pub use crate::core::step::{FailureKind, Step, StepBuilder, StepError, StepStatus};
pub use crate::core::types::{ChainId, RunId};
pub use crate::events::{Event, EventBus, EventHandler, OutputStream};
pub use crate::execution::{
    ChainReport, ChainRunner, ChainStatus, Engine, RunReport, StepReport, StepRunner,
};
