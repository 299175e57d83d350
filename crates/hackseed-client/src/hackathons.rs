//! Typed client for the `/hackathons` endpoints.
//!
//! | Method | Path | Auth | Operation |
//! |--------|------|------|-----------|
//! | GET    | `/hackathons` | – | List events |
//! | GET    | `/hackathons/{id}` | – | Get one event |
//! | POST   | `/hackathons/{id}/register` | bearer | Register caller for event |
//! | GET    | `/hackathons/{id}/participants` | bearer | Participant list |

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::transport::Transport;

/// An event as returned by the backend. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hackathon {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Body of `POST /hackathons/{id}/register`.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRegistrationRequest {
    pub selected_track: u32,
}

/// Reply of a successful registration call.
///
/// The backend answers a repeated registration with 2xx and a message
/// saying so, so the message is kept for classification.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventRegistrationReply {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Nested user shape used by older participant listings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// One row of `GET /hackathons/{id}/participants`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub registered_at: Option<String>,
    #[serde(default)]
    pub has_submission: bool,
    #[serde(default)]
    pub submission_id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub user: Option<ParticipantUser>,
}

impl Participant {
    /// Participant email, from the flat field or the nested `user` object.
    pub fn email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .or_else(|| self.user.as_ref().and_then(|u| u.email.as_deref()))
    }
}

/// A listing that is either a bare array or wrapped as `{"data": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Listing<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> Listing<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Self::Bare(v) | Self::Wrapped { data: v } => v,
        }
    }
}

/// Client for the `/hackathons` endpoints.
#[derive(Debug, Clone)]
pub struct HackathonsClient {
    transport: Transport,
}

impl HackathonsClient {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// List events. Calls `GET /hackathons`.
    pub async fn list(&self) -> Result<Vec<Hackathon>, ApiError> {
        let listing: Listing<Hackathon> = self
            .transport
            .send::<(), _>(Method::GET, "/hackathons", None, None)
            .await?;
        Ok(listing.into_vec())
    }

    /// Fetch one event. Calls `GET /hackathons/{id}`.
    pub async fn get(&self, id: &str) -> Result<Hackathon, ApiError> {
        self.transport
            .send::<(), _>(Method::GET, &self.transport.path_of(&["hackathons", id]), None, None)
            .await
    }

    /// Register the token's owner for an event. Calls `POST /hackathons/{id}/register`.
    pub async fn register(
        &self,
        id: &str,
        req: &EventRegistrationRequest,
        token: &str,
    ) -> Result<EventRegistrationReply, ApiError> {
        self.transport
            .send(Method::POST, &self.transport.path_of(&["hackathons", id, "register"]), Some(req), Some(token))
            .await
    }

    /// Participant list of an event. Calls `GET /hackathons/{id}/participants`.
    pub async fn participants(&self, id: &str, token: &str) -> Result<Vec<Participant>, ApiError> {
        let listing: Listing<Participant> = self
            .transport
            .send::<(), _>(
                Method::GET,
                &self.transport.path_of(&["hackathons", id, "participants"]),
                None,
                Some(token),
            )
            .await?;
        Ok(listing.into_vec())
    }
}
