//! Error types for the orchestrator.
//!
//! Per-identity problems are data ([`Failure`] inside a record), never
//! `Err` values that abort a stage. Only [`OrchestratorError`] stops a run,
//! and only before any identity has been touched.

use hackseed_client::{ApiError, ConfigError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classify::FailureKind;

/// A classified failure with a human-readable cause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub cause: String,
}

impl Failure {
    /// Build a failure. An empty cause is replaced by the kind's name so the
    /// cause is always readable.
    pub fn new(kind: FailureKind, cause: impl Into<String>) -> Self {
        let cause = cause.into();
        let cause = if cause.trim().is_empty() {
            format!("{kind} failure")
        } else {
            cause
        };
        Self { kind, cause }
    }

    pub fn auth(cause: impl Into<String>) -> Self {
        Self::new(FailureKind::Auth, cause)
    }

    pub fn validation(cause: impl Into<String>) -> Self {
        Self::new(FailureKind::Validation, cause)
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.cause)
    }
}

/// Why an identity could not be provisioned.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum ProvisionError {
    /// The account already exists but logging in with the same credentials failed.
    #[error("account {email} exists but login failed: {failure}")]
    ConflictUnresolved { email: String, failure: Failure },

    /// Account creation (or a login-only lookup) failed for any other reason.
    #[error("could not provision {email}: {failure}")]
    CreationFailed { email: String, failure: Failure },
}

impl ProvisionError {
    pub fn failure(&self) -> &Failure {
        match self {
            Self::ConflictUnresolved { failure, .. } | Self::CreationFailed { failure, .. } => failure,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Self::ConflictUnresolved { email, .. } | Self::CreationFailed { email, .. } => email,
        }
    }
}

/// Infrastructural failures that abort a run before any identity is touched.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// The run plan is inconsistent.
    #[error("invalid run plan: {0}")]
    InvalidPlan(String),

    /// Base URL or timeout could not be turned into a client.
    #[error("client configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The event list or the named event could not be fetched.
    #[error("event resolution failed: {0}")]
    EventResolution(#[source] ApiError),

    /// The backend lists no events to default to.
    #[error("no events available at the backend")]
    NoEvents,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cause_is_replaced() {
        let f = Failure::new(FailureKind::Server, "  ");
        assert_eq!(f.cause, "server failure");
    }

    #[test]
    fn provision_error_exposes_failure() {
        let e = ProvisionError::ConflictUnresolved {
            email: "a@x.com".into(),
            failure: Failure::auth("Invalid credentials"),
        };
        assert_eq!(e.email(), "a@x.com");
        assert_eq!(e.failure().kind, FailureKind::Auth);
        assert!(e.to_string().contains("login failed"));
    }

    #[test]
    fn provision_error_serializes_with_reason_tag() {
        let e = ProvisionError::CreationFailed {
            email: "a@x.com".into(),
            failure: Failure::validation("missing accessToken"),
        };
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["reason"], "creationFailed");
        assert_eq!(v["failure"]["kind"], "validation");
    }
}
