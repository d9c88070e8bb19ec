//! Step model and builder.
//!
//! A [`Step`] is the atomic unit of execution: one named external command,
//! interpreted by the host shell. Steps are immutable once built; runtime
//! state (status, exit code) lives in the report produced by the executor.
//!
//! # Example
//!
//! ```
//! use stepwise::Step;
//!
//! // Simple step
//! let step = Step::new("build", "cargo build").unwrap();
//!
//! // Step with environment and working directory
//! let step = Step::builder("test", "cargo test")
//!     .env("RUST_BACKTRACE", "1")
//!     .working_dir("/tmp")
//!     .build()
//!     .unwrap();
//! assert_eq!(step.name(), "test");
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::error::UsageError;

/// Lifecycle status of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Step has not started; steps after a failed step stay pending forever.
    Pending,
    /// The spawned process is running.
    Running,
    /// The process terminated with exit code zero.
    Succeeded,
    /// The process failed, could not be launched, or was killed by a signal.
    Failed,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Succeeded => "succeeded",
            StepStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Classification of a step failure, carried in the report.
///
/// `Launch`, `NonZeroExit`, and `Signaled` cover every way a command's
/// own lifecycle can fail. `Io` is the remaining case: the process
/// spawned but waiting on it failed, so its outcome is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The command could not be started at all; no exit code exists.
    Launch,
    /// The process terminated with a non-zero exit code.
    NonZeroExit,
    /// The process was terminated by a signal; no exit code exists.
    Signaled,
    /// An I/O error occurred while observing the process.
    Io,
}

/// Errors that can occur while executing a step.
#[derive(Debug, Error)]
pub enum StepError {
    /// The command could not be launched (missing shell, bad working
    /// directory, permission denied).
    #[error("failed to launch command: {0}")]
    Launch(#[source] std::io::Error),

    /// The command exited with a non-zero code.
    #[error("command exited with code {0}")]
    NonZeroExit(i32),

    /// The command was terminated by a signal before exiting.
    #[error("command terminated by a signal")]
    Signaled,

    /// Waiting on the process failed.
    #[error("i/o error while waiting on command: {0}")]
    Io(#[source] std::io::Error),
}

impl StepError {
    /// Classify this error for reporting.
    pub fn kind(&self) -> FailureKind {
        match self {
            StepError::Launch(_) => FailureKind::Launch,
            StepError::NonZeroExit(_) => FailureKind::NonZeroExit,
            StepError::Signaled => FailureKind::Signaled,
            StepError::Io(_) => FailureKind::Io,
        }
    }

    /// The exit code carried by this error, if the process produced one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            StepError::NonZeroExit(code) => Some(*code),
            _ => None,
        }
    }
}

/// A single named external-command invocation.
///
/// The command string is opaque to the runner and handed verbatim to
/// `sh -c`; no templating or shell-feature emulation happens here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Human-readable label. Need not be unique.
    name: String,
    /// Command line, interpreted by the host shell.
    command: String,
    /// Extra environment variables for the spawned process.
    env: Vec<(String, String)>,
    /// Working directory; inherited from the caller when unset.
    working_dir: Option<PathBuf>,
}

impl Step {
    /// Create a step with just a name and command.
    ///
    /// Fails with a [`UsageError`] if either is empty.
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Result<Self, UsageError> {
        Self::builder(name, command).build()
    }

    /// Create a builder for a step with additional configuration.
    pub fn builder(name: impl Into<String>, command: impl Into<String>) -> StepBuilder {
        StepBuilder::new(name, command)
    }

    /// Get the step name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the command line.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Get the extra environment variables.
    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    /// Get the working directory, if configured.
    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }
}

/// Builder for creating [`Step`] instances.
#[derive(Debug, Clone)]
pub struct StepBuilder {
    name: String,
    command: String,
    env: Vec<(String, String)>,
    working_dir: Option<PathBuf>,
}

impl StepBuilder {
    /// Create a new builder with the given name and command.
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            env: Vec::new(),
            working_dir: None,
        }
    }

    /// Add a single environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Set the working directory for the spawned process.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Build the [`Step`], validating name and command.
    pub fn build(self) -> Result<Step, UsageError> {
        if self.name.trim().is_empty() {
            return Err(UsageError::EmptyStepName);
        }
        if self.command.trim().is_empty() {
            return Err(UsageError::EmptyCommand);
        }
        Ok(Step {
            name: self.name,
            command: self.command,
            env: self.env,
            working_dir: self.working_dir,
        })
    }
}
