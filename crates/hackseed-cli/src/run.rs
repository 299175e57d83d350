//! # Run Subcommand
//!
//! Executes the full seeding workflow and prints its summary.
//!
//! - `hackseed run [--plan seed.yaml] [--event-id E1] [-n 5] [-k 3]
//!   [--track 1] [-c 4] [--json-out outcome.json]`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use hackseed_orchestrator::{summary, Orchestrator, RunOutcome};

use crate::plan::PlanArgs;
use crate::{EXIT_ABORTED, EXIT_FAILED, EXIT_OK};

/// Arguments for `hackseed run`.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Write the full run outcome as pretty JSON to this path.
    #[arg(long)]
    pub json_out: Option<PathBuf>,
}

/// Exit code for a finished run.
pub fn exit_code(outcome: &RunOutcome) -> u8 {
    if outcome.is_success() {
        EXIT_OK
    } else {
        EXIT_FAILED
    }
}

fn write_outcome(path: &Path, outcome: &RunOutcome) -> Result<()> {
    let json = serde_json::to_string_pretty(outcome).context("serializing run outcome")?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), "run outcome written");
    Ok(())
}

/// Execute the run subcommand.
pub async fn run_seed(args: &RunArgs) -> Result<u8> {
    let plan = match args.plan.resolve() {
        Ok(plan) => plan,
        Err(e) => {
            tracing::error!("{e}");
            return Ok(EXIT_ABORTED);
        }
    };

    let orchestrator = Orchestrator::new();
    let cancel = orchestrator.cancel_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing identities in flight");
            cancel.cancel();
        }
    });

    let result = orchestrator.run(plan).await;
    interrupt.abort();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("run aborted: {e}");
            eprintln!("run aborted: {e}");
            return Ok(EXIT_ABORTED);
        }
    };

    println!("{}", summary::render(&outcome));
    if let Some(path) = &args.json_out {
        write_outcome(path, &outcome)?;
    }
    Ok(exit_code(&outcome))
}
