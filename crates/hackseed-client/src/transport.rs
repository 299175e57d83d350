//! The single request path every typed endpoint goes through.
//!
//! `call` issues one JSON request against `{base_url}{path}`, attaches the
//! bearer token when given, and folds every outcome into
//! `Result<serde_json::Value, ApiError>`. No retries happen here.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::config::{ApiConfig, ConfigError};
use crate::error::ApiError;

/// Shared HTTP transport. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
    base: String,
    root: Url,
}

impl Transport {
    /// Build a transport from configuration.
    pub fn new(config: &ApiConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self {
            http,
            base: config.base(),
            root: config.base_url.clone(),
        })
    }

    /// Base-relative path built from raw segments, each one percent-encoded,
    /// so an id containing `/`, `?` or `#` stays a single segment.
    pub fn path_of(&self, segments: &[&str]) -> String {
        let mut url = self.root.clone();
        url.set_query(None);
        match url.path_segments_mut() {
            Ok(mut path) => {
                path.clear().extend(segments);
            }
            Err(()) => return format!("/{}", segments.join("/")),
        }
        url.path().to_string()
    }

    /// Absolute URL for a base-relative path.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base, path)
        } else {
            format!("{}/{}", self.base, path)
        }
    }

    /// Issue one request and return the decoded JSON body.
    ///
    /// Non-2xx responses become [`ApiError`] with the response status;
    /// requests that never got a response become transport errors
    /// (`status_code == 0`). An empty 2xx body decodes to `Value::Null`.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        auth_token: Option<&str>,
    ) -> Result<Value, ApiError> {
        let endpoint = format!("{method} {}", strip_query(path));
        let mut req = self.http.request(method, self.url_for(path));
        if let Some(token) = auth_token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        tracing::debug!(%endpoint, authenticated = auth_token.is_some(), "sending request");

        let resp = req.send().await.map_err(|e| {
            let err = ApiError::transport(&endpoint, &e);
            tracing::warn!(%endpoint, cause = ?err.cause, "request did not complete");
            err
        })?;

        let status = resp.status();
        let raw = resp
            .text()
            .await
            .map_err(|e| ApiError::transport(&endpoint, &e))?;

        if !status.is_success() {
            let err = ApiError::from_response(endpoint, status, raw);
            tracing::debug!(
                endpoint = %err.endpoint,
                status = err.status_code,
                message = %err.message,
                "request rejected"
            );
            return Err(err);
        }

        if raw.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&raw).map_err(|e| ApiError::malformed(endpoint, status.as_u16(), raw, &e))
    }

    /// Typed variant of [`Transport::call`]: serializes `body` and decodes the reply into `T`.
    pub async fn send<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        auth_token: Option<&str>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let endpoint = format!("{method} {}", strip_query(path));
        let body = match body {
            Some(b) => Some(
                serde_json::to_value(b).map_err(|e| ApiError::malformed(&endpoint, 0, String::new(), &e))?,
            ),
            None => None,
        };
        let value = self.call(method, path, body.as_ref(), auth_token).await?;
        decode(&endpoint, value)
    }
}

/// Decode a successful JSON body into `T`, reporting the raw body on failure.
pub(crate) fn decode<T: DeserializeOwned>(endpoint: &str, value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value.clone()).map_err(|e| ApiError::malformed(endpoint, 200, value.to_string(), &e))
}

fn strip_query(path: &str) -> &str {
    path.split_once('?').map_or(path, |(p, _)| p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn transport() -> Transport {
        let cfg = ApiConfig::new("http://127.0.0.1:9/api/v1/", Duration::from_millis(200)).unwrap();
        Transport::new(&cfg).unwrap()
    }

    #[test]
    fn url_for_joins_with_single_slash() {
        let t = transport();
        assert_eq!(t.url_for("/hackathons"), "http://127.0.0.1:9/api/v1/hackathons");
        assert_eq!(t.url_for("auth/login"), "http://127.0.0.1:9/api/v1/auth/login");
    }

    #[test]
    fn path_of_encodes_each_segment() {
        let t = transport();
        assert_eq!(t.path_of(&["hackathons", "E1"]), "/hackathons/E1");
        assert_eq!(
            t.path_of(&["hackathons", "E/1?x#y", "register"]),
            "/hackathons/E%2F1%3Fx%23y/register"
        );
        assert_eq!(
            t.url_for(&t.path_of(&["hackathons", "a b"])),
            "http://127.0.0.1:9/api/v1/hackathons/a%20b"
        );
    }

    #[test]
    fn endpoint_label_drops_query() {
        assert_eq!(strip_query("/submissions?hackathonId=E1"), "/submissions");
        assert_eq!(strip_query("/hackathons"), "/hackathons");
    }

    #[tokio::test]
    async fn closed_port_is_a_transport_failure() {
        let err = transport()
            .call(Method::GET, "/hackathons", None, None)
            .await
            .unwrap_err();
        assert_eq!(err.status_code, 0);
        assert_eq!(err.message, crate::error::TRANSPORT_FAILURE);
        assert!(err.cause.is_some());
        assert_eq!(err.endpoint, "GET /hackathons");
    }
}
