//! # hackseed CLI entry point
//!
//! Parses command-line arguments, initialises logging and dispatches to the
//! subcommand handlers. Logs go to stderr; summaries and reports to stdout.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hackseed_cli::events::{run_events, EventsArgs};
use hackseed_cli::run::{run_seed, RunArgs};
use hackseed_cli::verify::{run_verify, VerifyArgs};
use hackseed_cli::EXIT_ABORTED;

/// Seed a hackathon platform with test identities, registrations and
/// submissions, then verify what organisers will see.
#[derive(Parser, Debug)]
#[command(name = "hackseed", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit log lines as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Provision, register, submit and verify.
    Run(RunArgs),

    /// Check an event's participant state without changing anything.
    Verify(VerifyArgs),

    /// List events.
    Events(EventsArgs),
}

fn init_tracing(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    tracing::debug!("hackseed v{} starting", env!("CARGO_PKG_VERSION"));

    let result = match &cli.command {
        Commands::Run(args) => run_seed(args).await,
        Commands::Verify(args) => run_verify(args).await,
        Commands::Events(args) => run_events(args).await,
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_ABORTED)
        }
    }
}
