// SPDX-License-Identifier: BUSL-1.1
//! Hackathon API stub server, runnable as a standalone development server.
//!
//! Seeds one open event and serves the API under `/api/v1`.
//!
//! Environment:
//! - `HACKSEED_STUB_PORT` (default 3002)
//! - `HACKSEED_STUB_EVENT_ID` (default `E1`)
//! - `HACKSEED_STUB_EVENT_TITLE` (default `Local Hackathon`)

use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("HACKSEED_STUB_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3002);
    let event_id = std::env::var("HACKSEED_STUB_EVENT_ID").unwrap_or_else(|_| "E1".into());
    let event_title =
        std::env::var("HACKSEED_STUB_EVENT_TITLE").unwrap_or_else(|_| "Local Hackathon".into());

    let state = hackseed_stub::AppState::new();
    state.seed_event(&event_id, &event_title, true);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%event_id, "hackseed-stub listening on {addr}{}", hackseed_stub::API_PREFIX);

    hackseed_stub::serve(listener, state, async {
        tokio::signal::ctrl_c().await.ok();
    })
    .await?;
    Ok(())
}
