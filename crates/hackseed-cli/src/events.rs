//! # Events Subcommand
//!
//! Lists the backend's events.

use anyhow::Result;
use clap::Args;
use hackseed_client::hackathons::Hackathon;
use hackseed_client::HackathonClient;

use crate::plan::ConnectionArgs;
use crate::{EXIT_ABORTED, EXIT_OK};

/// Arguments for `hackseed events`.
#[derive(Args, Debug, Clone, Default)]
pub struct EventsArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
}

pub fn render_events(events: &[Hackathon]) -> String {
    if events.is_empty() {
        return "No events.".into();
    }
    events
        .iter()
        .map(|e| {
            format!(
                "{:<28} {:<22} {}",
                e.id,
                e.status.as_deref().unwrap_or("-"),
                e.title
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Execute the events subcommand.
pub async fn run_events(args: &EventsArgs) -> Result<u8> {
    let plan = match args.connection.resolve_with(|k| std::env::var(k).ok()) {
        Ok(plan) => plan,
        Err(e) => {
            tracing::error!("{e}");
            return Ok(EXIT_ABORTED);
        }
    };
    let client = match plan.api_config().and_then(|c| HackathonClient::new(&c).map_err(Into::into)) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("{e}");
            return Ok(EXIT_ABORTED);
        }
    };
    match client.hackathons().list().await {
        Ok(events) => {
            println!("{}", render_events(&events));
            Ok(EXIT_OK)
        }
        Err(e) => {
            eprintln!("cannot list events: {e}");
            Ok(EXIT_ABORTED)
        }
    }
}
