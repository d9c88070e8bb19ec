//! Concurrent chain-set execution.
//!
//! The [`Engine`] takes a collection of chains, starts each one as an
//! independent tokio task, and blocks until all of them reach a terminal
//! state. A failing chain never interrupts its siblings; every chain runs
//! to its own completion and every result appears in the [`RunReport`],
//! whatever the aggregate verdict.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, error, info_span, Instrument};

use crate::core::chain::Chain;
use crate::core::types::{ChainId, RunId};
use crate::events::{Event, EventBus};

use super::chain_runner::{ChainReport, ChainRunner, ChainStatus};

/// Result of executing a set of chains.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RunReport {
    /// Unique identifier of this run.
    pub run_id: RunId,
    /// Aggregate verdict: true iff every chain succeeded.
    pub success: bool,
    /// Wall-clock duration from dispatch to the last chain finishing.
    pub duration: Duration,
    /// Per-chain results, in submission order.
    pub chains: Vec<ChainReport>,
}

impl RunReport {
    /// Whether every chain succeeded.
    pub fn ok(&self) -> bool {
        self.success
    }

    /// Number of chains that succeeded.
    pub fn succeeded_count(&self) -> usize {
        self.chains.iter().filter(|c| c.ok()).count()
    }

    /// Number of chains that failed.
    pub fn failed_count(&self) -> usize {
        self.chains.iter().filter(|c| !c.ok()).count()
    }

    /// The chains that failed, in submission order.
    pub fn failed_chains(&self) -> Vec<&ChainReport> {
        self.chains.iter().filter(|c| !c.ok()).collect()
    }

    /// Find a chain report by its id.
    pub fn chain(&self, id: &ChainId) -> Option<&ChainReport> {
        self.chains.iter().find(|c| &c.chain_id == id)
    }

    /// Process exit status for callers: zero iff every chain succeeded.
    pub fn exit_code(&self) -> i32 {
        if self.success {
            0
        } else {
            1
        }
    }
}

/// Executor for running a set of chains concurrently.
///
/// The engine holds configuration only; a call to [`Engine::run`]
/// consumes its chains, so each run is single-use. To re-run, build new
/// steps and chains.
#[derive(Clone, Default)]
pub struct Engine {
    /// Optional cap on concurrently executing chains. Unlimited when
    /// unset: every chain starts at dispatch time.
    max_concurrent_chains: Option<usize>,
    event_bus: Option<Arc<EventBus>>,
}

impl Engine {
    /// Create an engine with unlimited chain concurrency and no events.
    pub fn new() -> Self {
        Self {
            max_concurrent_chains: None,
            event_bus: None,
        }
    }

    /// Attach an event bus; chain and step lifecycle events will be
    /// emitted through it.
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Cap the number of chains executing at once.
    pub fn with_max_concurrent_chains(mut self, max: usize) -> Self {
        self.max_concurrent_chains = Some(max);
        self
    }

    /// Execute all chains concurrently and block until every one of them
    /// reaches a terminal state.
    ///
    /// Chain results are collected in submission order; no result is
    /// discarded even when the aggregate is failed.
    pub async fn run(&self, chains: Vec<Chain>) -> RunReport {
        let run_id = RunId::new();
        let start = Instant::now();

        debug!(run = %run_id, chain_count = chains.len(), "dispatching chains");

        let semaphore = self
            .max_concurrent_chains
            .map(|max| Arc::new(Semaphore::new(max)));

        let mut handles = Vec::with_capacity(chains.len());
        for (index, chain) in chains.into_iter().enumerate() {
            let chain_id = match chain.label() {
                Some(label) => ChainId::new(label),
                None => ChainId::new(format!("chain-{index}")),
            };
            let runner = match &self.event_bus {
                Some(bus) => ChainRunner::with_event_bus(bus.clone()),
                None => ChainRunner::new(),
            };
            let semaphore = semaphore.clone();
            let span = info_span!("chain_run", run = %run_id, chain = %chain_id);

            let task_chain_id = chain_id.clone();
            let handle = tokio::spawn(
                async move {
                    let _permit = match semaphore {
                        Some(s) => Some(s.acquire_owned().await.expect("semaphore closed")),
                        None => None,
                    };
                    runner.run(chain, task_chain_id, run_id).await
                }
                .instrument(span),
            );
            handles.push((chain_id, handle));
        }

        let mut reports = Vec::with_capacity(handles.len());
        for (chain_id, handle) in handles {
            match handle.await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    // A panicked chain task still yields a failed entry so
                    // the report stays complete.
                    error!(chain = %chain_id, "chain task aborted: {}", e);
                    reports.push(ChainReport {
                        chain_id,
                        label: None,
                        status: ChainStatus::Failed,
                        duration: start.elapsed(),
                        steps: Vec::new(),
                        failed_step: None,
                    });
                }
            }
        }

        let success = reports.iter().all(|r| r.ok());
        let duration = start.elapsed();

        if let Some(ref bus) = self.event_bus {
            bus.emit(Event::run_completed(run_id, success, duration)).await;
        }

        debug!(
            run = %run_id,
            success = success,
            duration_ms = %duration.as_millis(),
            succeeded = reports.iter().filter(|r| r.ok()).count(),
            failed = reports.iter().filter(|r| !r.ok()).count(),
            "run completed"
        );

        RunReport {
            run_id,
            success,
            duration,
            chains: reports,
        }
    }
}
