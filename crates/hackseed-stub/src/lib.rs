// SPDX-License-Identifier: BUSL-1.1
//! # hackseed-stub -- in-memory hackathon API
//!
//! Implements the slice of the hackathon backend that the seeding workflow
//! drives (auth, event registration, participants, submissions) with the
//! backend's conflict semantics and messages. Used as the deterministic
//! test double for workflow tests and for local dry runs.
//!
//! Storage is in-memory (DashMap) with no persistence; data is lost on
//! restart.

pub mod error;
pub mod routes;
pub mod store;

pub use error::StubError;
pub use routes::{router, API_PREFIX};
pub use store::AppState;

/// Serve `router(state)` on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
}
