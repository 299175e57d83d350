//! Failure classification.
//!
//! The only place that interprets backend error payloads. Every
//! [`ApiError`] maps to exactly one [`FailureKind`]; conflicts additionally
//! map to the [`ConflictKind`] that says *what* already existed.
//!
//! A machine-readable `code` in the error body wins. Without one, the
//! message is matched against the phrases the backend is known to use.

use hackseed_client::ApiError;
use serde::{Deserialize, Serialize};

use crate::error::Failure;

/// Coarse failure taxonomy used in every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// No response: DNS, refused connection, timeout.
    Transport,
    /// The resource or action already exists.
    Conflict,
    /// The backend rejected the payload, or replied with something undecodable.
    Validation,
    /// Bad credentials, missing or expired token.
    Auth,
    /// The addressed resource does not exist.
    NotFound,
    /// 5xx or any status not covered above.
    Server,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Transport => "transport",
            Self::Conflict => "conflict",
            Self::Validation => "validation",
            Self::Auth => "auth",
            Self::NotFound => "not-found",
            Self::Server => "server",
        };
        f.write_str(s)
    }
}

/// What a conflict says already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictKind {
    UserExists,
    AlreadyRegistered,
    DuplicateSubmission,
}

const CODES: &[(&str, ConflictKind)] = &[
    ("USER_EXISTS", ConflictKind::UserExists),
    ("ALREADY_REGISTERED", ConflictKind::AlreadyRegistered),
    ("DUPLICATE_SUBMISSION", ConflictKind::DuplicateSubmission),
];

const PHRASES: &[(&str, ConflictKind)] = &[
    ("already exists", ConflictKind::UserExists),
    ("already registered", ConflictKind::AlreadyRegistered),
    ("duplicate submission", ConflictKind::DuplicateSubmission),
    ("already submitted", ConflictKind::DuplicateSubmission),
];

/// Match a free-text message against the known conflict phrases.
///
/// Also used on 2xx replies, where the backend reports an idempotent
/// registration as success with an "already registered" message.
pub fn message_conflict(message: &str) -> Option<ConflictKind> {
    let lower = message.to_ascii_lowercase();
    PHRASES
        .iter()
        .find(|(phrase, _)| lower.contains(phrase))
        .map(|(_, kind)| *kind)
}

/// The conflict an error reports, if any.
pub fn conflict_of(err: &ApiError) -> Option<ConflictKind> {
    if err.is_transport() {
        return None;
    }
    if let Some(code) = err.code.as_deref() {
        if let Some((_, kind)) = CODES.iter().find(|(c, _)| c.eq_ignore_ascii_case(code)) {
            return Some(*kind);
        }
    }
    message_conflict(&err.message)
}

/// Classify an error into exactly one [`FailureKind`].
pub fn classify(err: &ApiError) -> FailureKind {
    if err.is_transport() {
        return FailureKind::Transport;
    }
    if err.status_code == 409 || conflict_of(err).is_some() {
        return FailureKind::Conflict;
    }
    match err.status_code {
        400 | 422 => FailureKind::Validation,
        401 | 403 => FailureKind::Auth,
        404 => FailureKind::NotFound,
        s if (200..300).contains(&s) => FailureKind::Validation,
        _ => FailureKind::Server,
    }
}

/// Turn an error into a recorded [`Failure`].
pub fn failure(err: &ApiError) -> Failure {
    let cause = match &err.cause {
        Some(cause) => format!("{err} ({cause})"),
        None => err.to_string(),
    };
    Failure::new(classify(err), cause)
}
