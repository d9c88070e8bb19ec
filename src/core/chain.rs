//! Chain model: an ordered, fail-fast sequence of steps.
//!
//! A [`Chain`] is built by declaring a first step and appending further
//! steps with [`Chain::then`]. Appending returns an updated chain value
//! rather than mutating in place. Once the engine begins executing a
//! chain, further appends are rejected with
//! [`UsageError::ChainAlreadyStarted`]; clones of a chain share the same
//! started flag, so a handle kept by the caller cannot race the executor.
//!
//! # Example
//!
//! ```
//! use stepwise::Chain;
//!
//! let chain = Chain::new("build", "cargo build")
//!     .unwrap()
//!     .then("test", "cargo test")
//!     .unwrap();
//! assert_eq!(chain.len(), 2);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::error::UsageError;
use crate::core::step::Step;

/// An ordered sequence of steps that must succeed in declared order.
#[derive(Debug, Clone)]
pub struct Chain {
    /// Steps in execution order; never empty.
    steps: Vec<Step>,
    /// Optional display label, used for the chain id in reports.
    label: Option<String>,
    /// Set by the engine at dispatch. Shared across clones.
    started: Arc<AtomicBool>,
}

impl Chain {
    /// Create a chain from a first (name, command) pair.
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Result<Self, UsageError> {
        Ok(Self::from_step(Step::new(name, command)?))
    }

    /// Create a chain from an already-built first step.
    pub fn from_step(step: Step) -> Self {
        Self {
            steps: vec![step],
            label: None,
            started: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a chain from a list of steps.
    ///
    /// Fails with [`UsageError::EmptyChain`] if the list is empty.
    pub fn from_steps(steps: Vec<Step>) -> Result<Self, UsageError> {
        if steps.is_empty() {
            return Err(UsageError::EmptyChain);
        }
        Ok(Self {
            steps,
            label: None,
            started: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Append a (name, command) step to run after the current last step.
    pub fn then(
        self,
        name: impl Into<String>,
        command: impl Into<String>,
    ) -> Result<Self, UsageError> {
        let step = Step::new(name, command)?;
        self.then_step(step)
    }

    /// Append an already-built step to run after the current last step.
    ///
    /// Fails with [`UsageError::ChainAlreadyStarted`] once the chain has
    /// been dispatched by the engine.
    pub fn then_step(mut self, step: Step) -> Result<Self, UsageError> {
        if self.has_started() {
            return Err(UsageError::ChainAlreadyStarted);
        }
        self.steps.push(step);
        Ok(self)
    }

    /// Set a display label for this chain.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the chain's label, if one was set.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Get the steps in execution order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of steps in the chain. Always at least one.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the chain has no steps. Construction guarantees false.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether the engine has started executing this chain.
    pub fn has_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Mark the chain as started. Called by the executor at dispatch.
    pub(crate) fn mark_started(&self) {
        self.started.store(true, Ordering::SeqCst);
    }
}
