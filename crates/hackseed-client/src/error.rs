//! Hackathon API error type.
//!
//! Every failure of a call, whether the backend answered with a non-2xx
//! status or the request never completed, is normalised into [`ApiError`].
//! Transport failures carry `status_code == 0`.

use serde_json::Value;

/// Message used for every transport-level failure.
pub const TRANSPORT_FAILURE: &str = "transport failure";

/// Message used when a 2xx body could not be decoded.
pub const MALFORMED_BODY: &str = "malformed response body";

/// A failed API call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{endpoint} returned {status_code}: {message}")]
pub struct ApiError {
    /// `METHOD /path` of the failed call.
    pub endpoint: String,
    /// HTTP status, or 0 when no response was received.
    pub status_code: u16,
    /// Human-readable message (the body's `message` field when present).
    pub message: String,
    /// Machine-readable error code from the body, if the backend sent one.
    pub code: Option<String>,
    /// Raw response body, empty for transport failures.
    pub raw_body: String,
    /// Underlying cause for transport and decode failures.
    pub cause: Option<String>,
}

impl ApiError {
    /// Build a transport failure from a `reqwest` error.
    pub fn transport(endpoint: impl Into<String>, err: &reqwest::Error) -> Self {
        let cause = if err.is_timeout() {
            format!("timed out: {err}")
        } else if err.is_connect() {
            format!("connection failed: {err}")
        } else {
            err.to_string()
        };
        Self {
            endpoint: endpoint.into(),
            status_code: 0,
            message: TRANSPORT_FAILURE.into(),
            code: None,
            raw_body: String::new(),
            cause: Some(cause),
        }
    }

    /// Build an error from a non-2xx response.
    pub fn from_response(endpoint: impl Into<String>, status: reqwest::StatusCode, raw_body: String) -> Self {
        let parsed: Option<Value> = serde_json::from_str(&raw_body).ok();
        let message = parsed
            .as_ref()
            .and_then(extract_message)
            .or_else(|| {
                let trimmed = raw_body.trim();
                (!trimmed.is_empty() && parsed.is_none()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown status").to_string());
        let code = parsed.as_ref().and_then(extract_code);
        Self {
            endpoint: endpoint.into(),
            status_code: status.as_u16(),
            message,
            code,
            raw_body,
            cause: None,
        }
    }

    /// Build an error for a 2xx body (or request payload) that failed (de)serialization.
    pub fn malformed(endpoint: impl Into<String>, status_code: u16, raw_body: String, err: &serde_json::Error) -> Self {
        Self {
            endpoint: endpoint.into(),
            status_code,
            message: MALFORMED_BODY.into(),
            code: None,
            raw_body,
            cause: Some(err.to_string()),
        }
    }

    /// Whether the request failed before any response was received.
    pub fn is_transport(&self) -> bool {
        self.status_code == 0
    }

    /// Whether the request timed out.
    pub fn is_timeout(&self) -> bool {
        self.is_transport()
            && self
                .cause
                .as_deref()
                .is_some_and(|c| c.starts_with("timed out"))
    }
}

/// Pull the human-readable message out of an error body.
///
/// Accepts `{"message": "..."}`, `{"message": ["...", "..."]}` (validation
/// pipes return arrays), and `{"error": {"message": "..."}}`.
fn extract_message(body: &Value) -> Option<String> {
    match body.get("message") {
        Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
        Some(Value::Array(items)) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            if !parts.is_empty() {
                return Some(parts.join("; "));
            }
        }
        _ => {}
    }
    match body.get("error") {
        Some(Value::Object(obj)) => obj.get("message").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn extract_code(body: &Value) -> Option<String> {
    body.get("code")
        .and_then(Value::as_str)
        .or_else(|| body.get("error").and_then(|e| e.get("code")).and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn message_field_is_extracted() {
        let err = ApiError::from_response(
            "POST /auth/register",
            StatusCode::CONFLICT,
            r#"{"statusCode":409,"message":"User with this email already exists","error":"Conflict"}"#.into(),
        );
        assert_eq!(err.status_code, 409);
        assert_eq!(err.message, "User with this email already exists");
        assert!(err.code.is_none());
        assert!(!err.is_transport());
    }

    #[test]
    fn array_messages_are_joined() {
        let err = ApiError::from_response(
            "POST /submissions",
            StatusCode::BAD_REQUEST,
            r#"{"message":["title should not be empty","hackathonId must be a string"]}"#.into(),
        );
        assert_eq!(err.message, "title should not be empty; hackathonId must be a string");
    }

    #[test]
    fn nested_error_shape_yields_code_and_message() {
        let err = ApiError::from_response(
            "POST /submissions",
            StatusCode::CONFLICT,
            r#"{"error":{"code":"DUPLICATE_SUBMISSION","message":"dup"}}"#.into(),
        );
        assert_eq!(err.code.as_deref(), Some("DUPLICATE_SUBMISSION"));
        assert_eq!(err.message, "dup");
    }

    #[test]
    fn plain_text_body_becomes_message() {
        let err = ApiError::from_response("GET /x", StatusCode::BAD_GATEWAY, "upstream down".into());
        assert_eq!(err.message, "upstream down");
    }

    #[test]
    fn empty_body_falls_back_to_reason_phrase() {
        let err = ApiError::from_response("GET /x", StatusCode::NOT_FOUND, String::new());
        assert_eq!(err.message, "Not Found");
    }

    #[test]
    fn display_includes_endpoint_and_status() {
        let err = ApiError::from_response("GET /hackathons", StatusCode::INTERNAL_SERVER_ERROR, "{}".into());
        let shown = err.to_string();
        assert!(shown.contains("GET /hackathons"));
        assert!(shown.contains("500"));
    }
}
