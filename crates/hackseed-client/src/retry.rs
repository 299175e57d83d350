//! Caller-selected retry with exponential backoff.
//!
//! The client never retries on its own. Callers that decide a call is worth
//! repeating wrap it in [`retry_transport`], which retries only transport
//! failures (connection errors, timeouts). Any response from the backend,
//! including conflicts and validation errors, is returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::ApiError;

/// Default base delay between retries (doubles each attempt).
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(200);

/// How many times to repeat a call after a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// No retries at all.
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }

    /// A single retry after [`DEFAULT_BASE_DELAY`].
    pub const fn once() -> Self {
        Self {
            max_retries: 1,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::once()
    }
}

/// Run `f`, repeating it per `policy` while it fails with a transport error.
pub async fn retry_transport<T, F, Fut>(policy: &RetryPolicy, mut f: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Err(e) if e.is_transport() && attempt < policy.max_retries => {
                let delay = policy.delay_for(attempt);
                attempt += 1;
                tracing::warn!(
                    endpoint = %e.endpoint,
                    attempt,
                    max_retries = policy.max_retries,
                    "transport failure, retrying in {delay:?}: {}",
                    e.cause.as_deref().unwrap_or("unknown cause")
                );
                tokio::time::sleep(delay).await;
            }
            other => return other,
        }
    }
}
