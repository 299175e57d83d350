//! # hackseed-client -- Typed Rust client for the hackathon platform API
//!
//! Provides typed access to the parts of the hackathon backend that the
//! seeding workflow drives:
//! - **Auth** via `/auth/register` and `/auth/login`
//! - **Hackathons** via `/hackathons`, `/hackathons/{id}/register`,
//!   `/hackathons/{id}/participants`
//! - **Submissions** via `/submissions`
//!
//! ## Error model
//!
//! Every call returns `Result<_, ApiError>`. Non-2xx responses carry the
//! status, the body's `message`, and the raw body. Requests that never got a
//! response (DNS, connection refused, timeout) carry `status_code == 0` and
//! the message `"transport failure"`. Nothing here retries; callers opt in
//! through [`retry::retry_transport`].

pub mod auth;
pub mod config;
pub mod error;
pub mod hackathons;
pub mod retry;
pub mod submissions;
pub mod transport;

pub use config::{ApiConfig, ConfigError};
pub use error::ApiError;
pub use reqwest::Method;
pub use retry::RetryPolicy;

use serde_json::Value;

/// Top-level hackathon API client. Holds one sub-client per resource.
#[derive(Debug, Clone)]
pub struct HackathonClient {
    transport: transport::Transport,
    auth: auth::AuthClient,
    hackathons: hackathons::HackathonsClient,
    submissions: submissions::SubmissionsClient,
}

impl HackathonClient {
    /// Create a client from configuration.
    pub fn new(config: &ApiConfig) -> Result<Self, ConfigError> {
        let transport = transport::Transport::new(config)?;
        Ok(Self {
            auth: auth::AuthClient::new(transport.clone()),
            hackathons: hackathons::HackathonsClient::new(transport.clone()),
            submissions: submissions::SubmissionsClient::new(transport.clone()),
            transport,
        })
    }

    /// Untyped escape hatch: `call(method, path, body?, token?)`.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        auth_token: Option<&str>,
    ) -> Result<Value, ApiError> {
        self.transport.call(method, path, body, auth_token).await
    }

    /// Access the `/auth` client.
    pub fn auth(&self) -> &auth::AuthClient {
        &self.auth
    }

    /// Access the `/hackathons` client.
    pub fn hackathons(&self) -> &hackathons::HackathonsClient {
        &self.hackathons
    }

    /// Access the `/submissions` client.
    pub fn submissions(&self) -> &submissions::SubmissionsClient {
        &self.submissions
    }
}
