//! Single-step execution.
//!
//! [`StepRunner`] spawns a step's command via `sh -c`, waits for it to
//! terminate, and produces a [`StepReport`]. Output handling: stdout and
//! stderr are streamed live, one complete line at a time, through the
//! event bus (when attached), and the full text is retained in the
//! report. Because every emitted unit is a whole line, output from steps
//! in different chains can interleave only at line granularity.
//!
//! A command that cannot be spawned at all (bad working directory,
//! missing shell) is reported as a failed step with no exit code; it
//! never aborts the engine.

use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::core::step::{FailureKind, Step, StepError, StepStatus};
use crate::core::types::ChainId;
use crate::events::{Event, EventBus, OutputStream};

/// Result of executing (or not executing) a single step.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StepReport {
    /// The step's name.
    pub name: String,
    /// Terminal status, or `Pending` for steps after a failure.
    pub status: StepStatus,
    /// Exit code of the process, if it ran and exited normally.
    pub exit_code: Option<i32>,
    /// Wall-clock duration of the step. Zero for pending steps.
    pub duration: Duration,
    /// Captured standard output, newline-joined.
    pub stdout: String,
    /// Captured standard error, newline-joined.
    pub stderr: String,
    /// Failure classification, if the step failed.
    pub failure: Option<FailureKind>,
    /// Human-readable error, if the step failed.
    pub error: Option<String>,
}

impl StepReport {
    /// Report for a step that was never executed because an earlier step
    /// in its chain failed.
    pub fn pending(step: &Step) -> Self {
        Self {
            name: step.name().to_string(),
            status: StepStatus::Pending,
            exit_code: None,
            duration: Duration::ZERO,
            stdout: String::new(),
            stderr: String::new(),
            failure: None,
            error: None,
        }
    }

    /// Whether the step succeeded.
    pub fn ok(&self) -> bool {
        self.status == StepStatus::Succeeded
    }
}

/// Executor for a single step.
#[derive(Clone, Default)]
pub struct StepRunner {
    event_bus: Option<Arc<EventBus>>,
}

impl StepRunner {
    /// Create a runner that emits no events.
    pub fn new() -> Self {
        Self { event_bus: None }
    }

    /// Create a runner that emits step lifecycle and output events.
    pub fn with_event_bus(event_bus: Arc<EventBus>) -> Self {
        Self {
            event_bus: Some(event_bus),
        }
    }

    /// Execute the step and block until its process terminates.
    ///
    /// Never returns an error: every failure mode is folded into the
    /// report so the owning chain can record it and stop.
    pub async fn execute(&self, step: &Step, chain_id: &ChainId) -> StepReport {
        let start = Instant::now();
        self.emit(Event::step_started(chain_id.clone(), step.name()))
            .await;

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(step.command())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        for (key, value) in step.env() {
            cmd.env(key, value);
        }
        if let Some(dir) = step.working_dir() {
            cmd.current_dir(dir);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                let err = StepError::Launch(e);
                return self
                    .fail(step, chain_id, err, String::new(), String::new(), start)
                    .await;
            }
        };

        // Stream both pipes concurrently while waiting on the process.
        let stdout_task = self.spawn_line_reader(
            child.stdout.take(),
            chain_id.clone(),
            step.name().to_string(),
            OutputStream::Stdout,
        );
        let stderr_task = self.spawn_line_reader(
            child.stderr.take(),
            chain_id.clone(),
            step.name().to_string(),
            OutputStream::Stderr,
        );

        let status = child.wait().await;
        let stdout = Self::join_lines(stdout_task.await, step.name(), OutputStream::Stdout);
        let stderr = Self::join_lines(stderr_task.await, step.name(), OutputStream::Stderr);

        let status = match status {
            Ok(status) => status,
            Err(e) => {
                let err = StepError::Io(e);
                return self.fail(step, chain_id, err, stdout, stderr, start).await;
            }
        };

        let exit_code = status.code();
        if status.success() {
            let duration = start.elapsed();
            self.emit(Event::step_completed(
                chain_id.clone(),
                step.name(),
                duration,
            ))
            .await;
            StepReport {
                name: step.name().to_string(),
                status: StepStatus::Succeeded,
                exit_code,
                duration,
                stdout,
                stderr,
                failure: None,
                error: None,
            }
        } else {
            let err = match exit_code {
                Some(code) => StepError::NonZeroExit(code),
                None => StepError::Signaled,
            };
            self.fail(step, chain_id, err, stdout, stderr, start).await
        }
    }

    /// Build a failed report and emit the matching event.
    async fn fail(
        &self,
        step: &Step,
        chain_id: &ChainId,
        err: StepError,
        stdout: String,
        stderr: String,
        start: Instant,
    ) -> StepReport {
        let duration = start.elapsed();
        self.emit(Event::step_failed(
            chain_id.clone(),
            step.name(),
            err.to_string(),
            err.exit_code(),
            duration,
        ))
        .await;
        StepReport {
            name: step.name().to_string(),
            status: StepStatus::Failed,
            exit_code: err.exit_code(),
            duration,
            stdout,
            stderr,
            failure: Some(err.kind()),
            error: Some(err.to_string()),
        }
    }

    /// Read a child pipe line by line, emitting each complete line as an
    /// event and collecting the text for the report.
    fn spawn_line_reader<R>(
        &self,
        pipe: Option<R>,
        chain_id: ChainId,
        step_name: String,
        stream: OutputStream,
    ) -> JoinHandle<Vec<String>>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let event_bus = self.event_bus.clone();
        tokio::spawn(async move {
            let mut collected = Vec::new();
            let Some(pipe) = pipe else {
                return collected;
            };
            let mut lines = BufReader::new(pipe).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if let Some(ref bus) = event_bus {
                            bus.emit(Event::step_output(
                                chain_id.clone(),
                                step_name.clone(),
                                stream,
                                line.clone(),
                            ))
                            .await;
                        }
                        collected.push(line);
                    }
                    Ok(None) => break,
                    Err(e) => {
                        debug!(step = %step_name, "error reading child output: {}", e);
                        break;
                    }
                }
            }
            collected
        })
    }

    /// Join the collected lines of one pipe; an aborted reader task loses
    /// its output, so say so instead of defaulting quietly.
    fn join_lines(
        result: Result<Vec<String>, tokio::task::JoinError>,
        step_name: &str,
        stream: OutputStream,
    ) -> String {
        match result {
            Ok(lines) => lines.join("\n"),
            Err(e) => {
                warn!(step = %step_name, ?stream, "output reader task aborted: {}", e);
                String::new()
            }
        }
    }

    async fn emit(&self, event: Event) {
        if let Some(ref bus) = self.event_bus {
            bus.emit(event).await;
        }
    }
}
