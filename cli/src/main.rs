//! Scriptorium command line.
//!
//! Drives the platform end to end against the offline backend: submit a
//! request JSON, print the routing decision, or dump orchestrator metrics.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scriptorium_backend::{RateLimitedBackend, StaticBackend};
use scriptorium_config::AppConfig;
use scriptorium_orchestration::{Orchestrator, SubmissionRequest, WorkflowOutcome};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scriptorium", about = "Multi-agent writing platform", version)]
struct Cli {
    /// Path to a TOML config file; defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a request JSON file and execute the workflow to completion.
    Submit {
        /// Path to the submission JSON (see docs for the shape).
        request: PathBuf,
    },
    /// Route a request without executing it and print the decision.
    Route {
        request: PathBuf,
    },
    /// Print orchestrator metrics after executing a request.
    Metrics {
        request: PathBuf,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => AppConfig::load_default().context("building default config"),
    }
}

fn load_submission(path: &PathBuf) -> Result<SubmissionRequest> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading request from {}", path.display()))?;
    serde_json::from_str(&text).context("parsing submission JSON")
}

fn build_orchestrator(config: AppConfig) -> Orchestrator {
    let backend = Arc::new(RateLimitedBackend::new(
        Arc::new(StaticBackend::new()),
        config.backend.rate_limit.clone(),
    ));
    Orchestrator::new(backend, config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Submit { request } => {
            let submission = load_submission(&request)?;
            let orchestrator = build_orchestrator(config);
            let request = submission.into_request();
            let workflow_id = orchestrator.create_workflow(&request).await?;
            let result = orchestrator.execute_workflow(workflow_id).await?;
            let outcome = WorkflowOutcome::from_result(&result);
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Route { request } => {
            let submission = load_submission(&request)?;
            let orchestrator = build_orchestrator(config);
            let decision = orchestrator.router().route(&submission.into_request()).await?;
            println!("{}", serde_json::to_string_pretty(&decision)?);
        }
        Command::Metrics { request } => {
            let submission = load_submission(&request)?;
            let orchestrator = build_orchestrator(config);
            let request = submission.into_request();
            let workflow_id = orchestrator.create_workflow(&request).await?;
            orchestrator.execute_workflow(workflow_id).await?;
            println!("{}", serde_json::to_string_pretty(&orchestrator.metrics())?);
        }
    }
    Ok(())
}
