//! Sequential chain execution.
//!
//! [`ChainRunner`] runs a chain's steps strictly in declared order and
//! stops at the first failure. Steps after a failed step are never
//! spawned; they appear in the report as `Pending`. At most one step of a
//! chain runs at any time.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::core::chain::Chain;
use crate::core::types::{ChainId, RunId};
use crate::events::{Event, EventBus};

use super::runner::{StepReport, StepRunner};

/// Terminal status of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainStatus {
    /// Every step succeeded.
    Succeeded,
    /// Some step failed; later steps were never run.
    Failed,
}

impl std::fmt::Display for ChainStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainStatus::Succeeded => write!(f, "succeeded"),
            ChainStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Result of executing a chain.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ChainReport {
    /// Identifier of the chain within the run.
    pub chain_id: ChainId,
    /// The chain's label, if one was set.
    pub label: Option<String>,
    /// Terminal status.
    pub status: ChainStatus,
    /// Wall-clock duration of the whole chain.
    pub duration: Duration,
    /// Per-step results, in declared order. Always one entry per step.
    pub steps: Vec<StepReport>,
    /// Index into `steps` of the failing step, if any.
    pub failed_step: Option<usize>,
}

impl ChainReport {
    /// Whether every step succeeded.
    pub fn ok(&self) -> bool {
        self.status == ChainStatus::Succeeded
    }

    /// The report of the step that failed the chain, if any.
    pub fn failure(&self) -> Option<&StepReport> {
        self.failed_step.and_then(|i| self.steps.get(i))
    }
}

/// Executor for one chain: runs its steps in order, fail-fast.
#[derive(Clone, Default)]
pub struct ChainRunner {
    step_runner: StepRunner,
    event_bus: Option<Arc<EventBus>>,
}

impl ChainRunner {
    /// Create a runner that emits no events.
    pub fn new() -> Self {
        Self {
            step_runner: StepRunner::new(),
            event_bus: None,
        }
    }

    /// Create a runner that emits chain and step lifecycle events.
    pub fn with_event_bus(event_bus: Arc<EventBus>) -> Self {
        Self {
            step_runner: StepRunner::with_event_bus(event_bus.clone()),
            event_bus: Some(event_bus),
        }
    }

    /// Execute every step of the chain in order, stopping at the first
    /// failure. Consumes the chain; runs are single-use.
    pub async fn run(&self, chain: Chain, chain_id: ChainId, run_id: RunId) -> ChainReport {
        chain.mark_started();
        let label = chain.label().map(str::to_string);
        let start = Instant::now();

        if let Some(ref bus) = self.event_bus {
            bus.emit(Event::chain_started(chain_id.clone(), run_id)).await;
        }
        debug!(chain = %chain_id, steps = chain.len(), "starting chain");

        let mut reports: Vec<StepReport> = Vec::with_capacity(chain.len());
        let mut failed_step: Option<usize> = None;

        for (index, step) in chain.steps().iter().enumerate() {
            if failed_step.is_some() {
                reports.push(StepReport::pending(step));
                continue;
            }

            let report = self.step_runner.execute(step, &chain_id).await;
            if !report.ok() {
                debug!(
                    chain = %chain_id,
                    step = step.name(),
                    "step failed, remaining steps stay pending"
                );
                failed_step = Some(index);
            }
            reports.push(report);
        }

        let status = if failed_step.is_none() {
            ChainStatus::Succeeded
        } else {
            ChainStatus::Failed
        };
        let duration = start.elapsed();

        if let Some(ref bus) = self.event_bus {
            bus.emit(Event::chain_completed(
                chain_id.clone(),
                run_id,
                status == ChainStatus::Succeeded,
                duration,
            ))
            .await;
        }

        ChainReport {
            chain_id,
            label,
            status,
            duration,
            steps: reports,
            failed_step,
        }
    }
}
