//! sw - run chains of external commands concurrently.
//!
//! Usage:
//!   sw run "build: cargo build -> test: cargo test" "lint: cargo clippy"
//!   sw check "build: cargo build -> test: cargo test"
//!
//! Each CHAIN argument declares one chain: steps are separated by the
//! token ` -> ` (spaces required, so a command may itself contain `->`)
//! and each step is `name: command`. Chains run concurrently; steps
//! within a chain run in order and stop at the first failure. The process
//! exits zero iff every chain succeeded.

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use stepwise::{Chain, Engine, Event, EventBus, EventHandler, OutputStream};
use tracing::{error, info, warn};

/// sw - a minimal concurrent command runner
#[derive(Parser)]
#[command(name = "sw")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one or more chains concurrently
    Run {
        /// Chain specifications: "name: command [-> name: command ...]"
        #[arg(value_name = "CHAIN", required = true)]
        chains: Vec<String>,

        /// Maximum concurrent chains (default: unlimited)
        #[arg(short = 'j', long)]
        max_chains: Option<usize>,

        /// Print the full run report as JSON instead of log lines
        #[arg(long)]
        json: bool,
    },

    /// Parse and validate chain specifications without running them
    Check {
        /// Chain specifications: "name: command [-> name: command ...]"
        #[arg(value_name = "CHAIN", required = true)]
        chains: Vec<String>,
    },
}

/// Logging event handler that prints run progress.
struct LoggingHandler;

#[async_trait::async_trait]
impl EventHandler for LoggingHandler {
    async fn handle(&self, event: &Event) {
        match event {
            Event::ChainStarted { chain_id, .. } => {
                info!("Chain '{}' started", chain_id);
            }
            Event::ChainCompleted {
                chain_id,
                success,
                duration,
                ..
            } => {
                if *success {
                    info!("Chain '{}' succeeded in {:?}", chain_id, duration);
                } else {
                    error!("Chain '{}' failed after {:?}", chain_id, duration);
                }
            }
            Event::StepStarted { chain_id, step, .. } => {
                info!("  [{}] step '{}' started", chain_id, step);
            }
            Event::StepOutput {
                chain_id,
                step,
                stream,
                line,
                ..
            } => match stream {
                OutputStream::Stdout => info!("  [{}] {}: {}", chain_id, step, line),
                OutputStream::Stderr => warn!("  [{}] {}: {}", chain_id, step, line),
            },
            Event::StepCompleted {
                chain_id,
                step,
                duration,
                ..
            } => {
                info!("  [{}] step '{}' succeeded in {:?}", chain_id, step, duration);
            }
            Event::StepFailed {
                chain_id,
                step,
                error,
                exit_code,
                ..
            } => {
                let exit_info = exit_code
                    .map(|c| format!(" (exit: {})", c))
                    .unwrap_or_default();
                warn!("  [{}] step '{}' failed{}: {}", chain_id, step, exit_info, error);
            }
            Event::RunCompleted {
                success, duration, ..
            } => {
                if *success {
                    info!("All chains succeeded in {:?}", duration);
                } else {
                    error!("Run failed after {:?}", duration);
                }
            }
        }
    }
}

/// Parse a chain specification of the form
/// `"name: command -> name: command"`.
///
/// Steps are split on the padded token `" -> "`; an unpadded `->` inside
/// a command (awk or sed programs, say) is left alone.
fn parse_chain(spec: &str) -> Result<Chain, Box<dyn std::error::Error>> {
    let mut chain: Option<Chain> = None;

    for part in spec.split(" -> ") {
        let (name, command) = part.split_once(':').ok_or_else(|| {
            format!(
                "invalid step '{}': expected 'name: command'",
                part.trim()
            )
        })?;
        let name = name.trim();
        let command = command.trim();

        chain = Some(match chain {
            None => Chain::new(name, command)?,
            Some(c) => c.then(name, command)?,
        });
    }

    chain.ok_or_else(|| "empty chain specification".into())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            chains,
            max_chains,
            json,
        } => run_chains(chains, max_chains, json).await,
        Commands::Check { chains } => check_chains(chains),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(2)
        }
    }
}

/// Parse, run, and report a set of chains.
async fn run_chains(
    specs: Vec<String>,
    max_chains: Option<usize>,
    json: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let chains = specs
        .iter()
        .map(|s| parse_chain(s))
        .collect::<Result<Vec<_>, _>>()?;

    let event_bus = Arc::new(EventBus::new());
    if !json {
        event_bus.register(Arc::new(LoggingHandler)).await;
    }

    let mut engine = Engine::new().with_event_bus(event_bus);
    if let Some(max) = max_chains {
        engine = engine.with_max_concurrent_chains(max);
    }

    let report = engine.run(chains).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for chain in &report.chains {
            if let Some(step) = chain.failure() {
                let exit_info = step
                    .exit_code
                    .map(|c| format!(" (exit: {})", c))
                    .unwrap_or_default();
                error!(
                    "Chain '{}' failed at step '{}'{}",
                    chain.chain_id, step.name, exit_info
                );
            }
        }
    }

    Ok(ExitCode::from(report.exit_code() as u8))
}

/// Validate chain specifications without spawning anything.
fn check_chains(specs: Vec<String>) -> Result<ExitCode, Box<dyn std::error::Error>> {
    for spec in &specs {
        let chain = parse_chain(spec)?;
        info!(
            "ok: {} step(s): {}",
            chain.len(),
            chain
                .steps()
                .iter()
                .map(|s| s.name())
                .collect::<Vec<_>>()
                .join(" -> ")
        );
    }
    Ok(ExitCode::SUCCESS)
}
