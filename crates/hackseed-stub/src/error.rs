// SPDX-License-Identifier: BUSL-1.1
//! Stub error type.
//!
//! Rendered in the backend's error shape,
//! `{"statusCode": 409, "message": "...", "error": "Conflict"}`, so the
//! client sees exactly what the real service sends.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StubError {
    /// Malformed or incomplete request body (400).
    #[error("{0}")]
    BadRequest(String),

    /// Missing, unknown or wrong credentials (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Resource not found (404).
    #[error("{0}")]
    NotFound(String),

    /// Resource already exists (409).
    #[error("{0}")]
    Conflict(String),
}

impl StubError {
    fn status_and_label(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "Bad Request"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "Not Found"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "Conflict"),
        }
    }
}

impl IntoResponse for StubError {
    fn into_response(self) -> Response {
        let (status, label) = self.status_and_label();
        let body = json!({
            "statusCode": status.as_u16(),
            "message": self.to_string(),
            "error": label,
        });
        (status, Json(body)).into_response()
    }
}
