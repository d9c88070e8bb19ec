//! Lifecycle events and event handling.
//!
//! This module provides event emission for step, chain, and run lifecycle
//! events, enabling observability into engine execution. Step output is
//! delivered one complete line per event, so concurrent chains can never
//! corrupt line boundaries in a sink fed from the bus.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::core::types::{ChainId, RunId};

/// Which output stream of the child process a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Lifecycle events emitted during execution.
#[derive(Debug, Clone)]
pub enum Event {
    /// A chain has been dispatched and is about to run its first step.
    ChainStarted {
        chain_id: ChainId,
        run_id: RunId,
        timestamp: Instant,
    },

    /// A chain reached a terminal state.
    ChainCompleted {
        chain_id: ChainId,
        run_id: RunId,
        success: bool,
        duration: Duration,
        timestamp: Instant,
    },

    /// A step's process has been spawned.
    StepStarted {
        chain_id: ChainId,
        step: String,
        timestamp: Instant,
    },

    /// The running step produced one complete line of output.
    StepOutput {
        chain_id: ChainId,
        step: String,
        stream: OutputStream,
        line: String,
        timestamp: Instant,
    },

    /// A step's process terminated with exit code zero.
    StepCompleted {
        chain_id: ChainId,
        step: String,
        duration: Duration,
        timestamp: Instant,
    },

    /// A step failed: non-zero exit, launch failure, or signal.
    StepFailed {
        chain_id: ChainId,
        step: String,
        error: String,
        exit_code: Option<i32>,
        duration: Duration,
        timestamp: Instant,
    },

    /// All chains in a run reached a terminal state.
    RunCompleted {
        run_id: RunId,
        success: bool,
        duration: Duration,
        timestamp: Instant,
    },
}

impl Event {
    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> Instant {
        match self {
            Event::ChainStarted { timestamp, .. } => *timestamp,
            Event::ChainCompleted { timestamp, .. } => *timestamp,
            Event::StepStarted { timestamp, .. } => *timestamp,
            Event::StepOutput { timestamp, .. } => *timestamp,
            Event::StepCompleted { timestamp, .. } => *timestamp,
            Event::StepFailed { timestamp, .. } => *timestamp,
            Event::RunCompleted { timestamp, .. } => *timestamp,
        }
    }

    /// Create a ChainStarted event.
    pub fn chain_started(chain_id: ChainId, run_id: RunId) -> Self {
        Event::ChainStarted {
            chain_id,
            run_id,
            timestamp: Instant::now(),
        }
    }

    /// Create a ChainCompleted event.
    pub fn chain_completed(
        chain_id: ChainId,
        run_id: RunId,
        success: bool,
        duration: Duration,
    ) -> Self {
        Event::ChainCompleted {
            chain_id,
            run_id,
            success,
            duration,
            timestamp: Instant::now(),
        }
    }

    /// Create a StepStarted event.
    pub fn step_started(chain_id: ChainId, step: impl Into<String>) -> Self {
        Event::StepStarted {
            chain_id,
            step: step.into(),
            timestamp: Instant::now(),
        }
    }

    /// Create a StepOutput event for one line of child output.
    pub fn step_output(
        chain_id: ChainId,
        step: impl Into<String>,
        stream: OutputStream,
        line: impl Into<String>,
    ) -> Self {
        Event::StepOutput {
            chain_id,
            step: step.into(),
            stream,
            line: line.into(),
            timestamp: Instant::now(),
        }
    }

    /// Create a StepCompleted event.
    pub fn step_completed(chain_id: ChainId, step: impl Into<String>, duration: Duration) -> Self {
        Event::StepCompleted {
            chain_id,
            step: step.into(),
            duration,
            timestamp: Instant::now(),
        }
    }

    /// Create a StepFailed event.
    pub fn step_failed(
        chain_id: ChainId,
        step: impl Into<String>,
        error: String,
        exit_code: Option<i32>,
        duration: Duration,
    ) -> Self {
        Event::StepFailed {
            chain_id,
            step: step.into(),
            error,
            exit_code,
            duration,
            timestamp: Instant::now(),
        }
    }

    /// Create a RunCompleted event.
    pub fn run_completed(run_id: RunId, success: bool, duration: Duration) -> Self {
        Event::RunCompleted {
            run_id,
            success,
            duration,
            timestamp: Instant::now(),
        }
    }
}

/// Handler for receiving lifecycle events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle an event.
    async fn handle(&self, event: &Event);
}

/// Event bus for distributing events to registered handlers.
pub struct EventBus {
    handlers: RwLock<Vec<Arc<dyn EventHandler>>>,
}

impl EventBus {
    /// Create a new event bus with no handlers.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Register an event handler.
    pub async fn register(&self, handler: Arc<dyn EventHandler>) {
        let mut handlers = self.handlers.write().await;
        handlers.push(handler);
    }

    /// Emit an event to all registered handlers.
    pub async fn emit(&self, event: Event) {
        let handlers = self.handlers.read().await;
        for handler in handlers.iter() {
            handler.handle(&event).await;
        }
    }

    /// Get the number of registered handlers.
    pub async fn handler_count(&self) -> usize {
        self.handlers.read().await.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
