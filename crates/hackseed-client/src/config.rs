//! Hackathon API client configuration.
//!
//! A single base URL (including the API prefix, e.g. `/api/v1`) and a
//! per-request timeout. Defaults point at a locally running backend.
//! Override via environment variables or explicit construction.

use std::time::Duration;

use url::Url;

/// Default base URL of the hackathon backend, including the API prefix.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3002/api/v1";

/// Default per-request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Configuration for connecting to the hackathon API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL every request path is appended to.
    pub base_url: Url,
    /// Timeout applied to each request (connect + response).
    pub timeout: Duration,
}

impl ApiConfig {
    /// Build a configuration from a raw base URL and a timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let base_url = parse_base_url("base_url", base_url)?;
        if timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout("timeout must be non-zero".into()));
        }
        Ok(Self { base_url, timeout })
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `HACKSEED_BASE_URL` (default: `http://localhost:3002/api/v1`)
    /// - `HACKSEED_TIMEOUT_MS` (default: 5000)
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = std::env::var("HACKSEED_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let base_url = parse_base_url("HACKSEED_BASE_URL", &raw)?;
        let timeout_ms = match std::env::var("HACKSEED_TIMEOUT_MS") {
            Ok(s) => s
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidTimeout(format!("HACKSEED_TIMEOUT_MS={s}: {e}")))?,
            Err(_) => DEFAULT_TIMEOUT_MS,
        };
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout("HACKSEED_TIMEOUT_MS must be non-zero".into()));
        }
        Ok(Self {
            base_url,
            timeout: Duration::from_millis(timeout_ms),
        })
    }

    /// Configuration pointing at a local stub server (for testing).
    pub fn local(port: u16, prefix: &str) -> Result<Self, ConfigError> {
        Self::new(
            &format!("http://127.0.0.1:{port}{prefix}"),
            Duration::from_millis(DEFAULT_TIMEOUT_MS),
        )
    }

    /// Base URL as a string without a trailing slash, ready for path concatenation.
    pub(crate) fn base(&self) -> String {
        self.base_url.as_str().trim_end_matches('/').to_string()
    }
}

fn parse_base_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(field.to_string(), e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("unsupported URL scheme {0:?} (expected http or https)")]
    UnsupportedScheme(String),
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_builds_prefixed_url() {
        let cfg = ApiConfig::local(9000, "/api/v1").unwrap();
        assert_eq!(cfg.base(), "http://127.0.0.1:9000/api/v1");
        assert_eq!(cfg.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
    }

    #[test]
    fn base_strips_trailing_slash() {
        let cfg = ApiConfig::new("http://example.com/api/v1/", Duration::from_secs(1)).unwrap();
        assert_eq!(cfg.base(), "http://example.com/api/v1");
    }

    #[test]
    fn rejects_non_http_scheme() {
        let err = ApiConfig::new("ftp://example.com", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedScheme(s) if s == "ftp"));
    }

    #[test]
    fn rejects_garbage_url() {
        let err = ApiConfig::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl(..)));
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = ApiConfig::new("http://example.com", Duration::ZERO).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout(_)));
    }
}
