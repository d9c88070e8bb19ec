//! Construction-time usage errors.
//!
//! Structural misuse of the builder API fails synchronously, before any
//! process is spawned. These errors are never folded into a runtime report.

use thiserror::Error;

/// Errors raised when steps or chains are constructed incorrectly.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// A step was declared with an empty name.
    #[error("step name must not be empty")]
    EmptyStepName,

    /// A step was declared with an empty command.
    #[error("step command must not be empty")]
    EmptyCommand,

    /// A chain was built from an empty step list.
    #[error("a chain must contain at least one step")]
    EmptyChain,

    /// A step was appended to a chain that has already started executing.
    #[error("cannot append a step to a chain that has started executing")]
    ChainAlreadyStarted,
}
