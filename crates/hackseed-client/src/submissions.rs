//! Typed client for the `/submissions` endpoints.
//!
//! | Method | Path | Auth | Operation |
//! |--------|------|------|-----------|
//! | POST   | `/submissions` | bearer | Create a project submission |
//! | GET    | `/submissions?hackathonId=` | bearer | List submissions of an event |

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::hackathons::Listing;
use crate::transport::Transport;

/// Body of `POST /submissions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmissionRequest {
    pub hackathon_id: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech_stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_track: Option<u32>,
    #[serde(default)]
    pub is_draft: bool,
}

/// Submitter summary embedded in submissions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submitter {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A submission as returned by the backend.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub hackathon_id: Option<String>,
    #[serde(default)]
    pub submitter_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub is_draft: bool,
    #[serde(default)]
    pub submitter: Option<Submitter>,
}

impl Submission {
    /// Submitter email when the backend embeds it.
    pub fn submitter_email(&self) -> Option<&str> {
        self.submitter.as_ref().and_then(|s| s.email.as_deref())
    }
}

/// Client for the `/submissions` endpoints.
#[derive(Debug, Clone)]
pub struct SubmissionsClient {
    transport: Transport,
}

impl SubmissionsClient {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Create a submission owned by the token's user. Calls `POST /submissions`.
    pub async fn create(&self, req: &CreateSubmissionRequest, token: &str) -> Result<Submission, ApiError> {
        self.transport
            .send(Method::POST, "/submissions", Some(req), Some(token))
            .await
    }

    /// List submissions of one event. Calls `GET /submissions?hackathonId={id}`.
    pub async fn list(&self, hackathon_id: &str, token: &str) -> Result<Vec<Submission>, ApiError> {
        let query: String = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("hackathonId", hackathon_id)
            .finish();
        let listing: Listing<Submission> = self
            .transport
            .send::<(), _>(Method::GET, &format!("/submissions?{query}"), None, Some(token))
            .await?;
        Ok(listing.into_vec())
    }
}
