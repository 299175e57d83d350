//! Synthetic project submissions.
//!
//! Payloads come from a [`SubmissionTemplate`]; the default one derives
//! every field from the identity's email local part and its position, so
//! reruns produce the same content.

use std::sync::Arc;
use std::time::Instant;

use hackseed_client::submissions::CreateSubmissionRequest;
use hackseed_client::HackathonClient;
use serde::Serialize;

use crate::classify::{self, ConflictKind};
use crate::error::Failure;
use crate::executor::{elapsed_ms, run_stage, CancelSignal, StageResult};
use crate::identity::Identity;
use crate::provision::Provisioner;

pub const DEFAULT_TECH_STACK: &str = "React, Node.js, PostgreSQL";

/// Builds the submission payload for an identity. `index` is the identity's
/// 0-based position in the plan, so content does not shift when another
/// identity drops out.
pub trait SubmissionTemplate: Send + Sync {
    fn build(&self, identity: &Identity, index: usize, event_id: &str, track_selection: u32) -> CreateSubmissionRequest;
}

impl<F> SubmissionTemplate for F
where
    F: Fn(&Identity, usize, &str, u32) -> CreateSubmissionRequest + Send + Sync,
{
    fn build(&self, identity: &Identity, index: usize, event_id: &str, track_selection: u32) -> CreateSubmissionRequest {
        self(identity, index, event_id, track_selection)
    }
}

/// The built-in template.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTemplate;

impl SubmissionTemplate for DefaultTemplate {
    fn build(&self, identity: &Identity, index: usize, event_id: &str, track_selection: u32) -> CreateSubmissionRequest {
        let local = identity.local_part();
        let n = index + 1;
        CreateSubmissionRequest {
            hackathon_id: event_id.to_string(),
            title: format!("Project {n} by {local}"),
            description: format!(
                "A full-stack project built for hackathon {event_id} by {}.\n\
                 It pairs a web client with an API over a relational data store.\n\
                 Seeded test data, project {n}.",
                identity.display_name
            ),
            tech_stack: Some(DEFAULT_TECH_STACK.to_string()),
            repository_url: Some(format!("https://github.com/{local}/hackathon-project-{n}")),
            live_url: Some(format!("https://{local}-hackathon.example.app")),
            video_url: Some(format!("https://videos.example.com/{local}-{n}")),
            selected_track: Some(track_selection),
            is_draft: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionLinks {
    pub repository: Option<String>,
    pub live: Option<String>,
    pub video: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SubmissionOutcome {
    Created {
        #[serde(rename = "submissionId")]
        submission_id: Option<String>,
    },
    AlreadyExists,
    Failed(Failure),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub email: String,
    pub event_id: String,
    pub title: String,
    pub description: String,
    pub links: SubmissionLinks,
    pub outcome: SubmissionOutcome,
    pub elapsed_ms: u64,
}

/// Submits projects, treating duplicate-submission conflicts as success.
#[derive(Clone)]
pub struct SubmissionGenerator {
    client: HackathonClient,
    provisioner: Provisioner,
    template: Arc<dyn SubmissionTemplate>,
}

impl std::fmt::Debug for SubmissionGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionGenerator").finish_non_exhaustive()
    }
}

impl SubmissionGenerator {
    pub fn new(client: HackathonClient, provisioner: Provisioner) -> Self {
        Self {
            client,
            provisioner,
            template: Arc::new(DefaultTemplate),
        }
    }

    pub fn with_template(mut self, template: Arc<dyn SubmissionTemplate>) -> Self {
        self.template = template;
        self
    }

    pub async fn submit(&self, identity: &Identity, index: usize, event_id: &str, track_selection: u32) -> SubmissionRecord {
        let started = Instant::now();
        let payload = self.template.build(identity, index, event_id, track_selection);
        let submissions = self.client.submissions();
        let body = &payload;
        let result = self
            .provisioner
            .with_reauth(identity, |token| async move { submissions.create(body, &token).await })
            .await;

        let outcome = match result {
            Err(failure) => SubmissionOutcome::Failed(failure),
            Ok(Ok(created)) => SubmissionOutcome::Created {
                submission_id: created.id,
            },
            Ok(Err(e)) => match classify::conflict_of(&e) {
                Some(ConflictKind::DuplicateSubmission) => SubmissionOutcome::AlreadyExists,
                _ => SubmissionOutcome::Failed(classify::failure(&e)),
            },
        };
        if let SubmissionOutcome::Failed(f) = &outcome {
            tracing::warn!(email = %identity.email, event_id, failure = %f, "submission failed");
        }

        SubmissionRecord {
            email: identity.email.clone(),
            event_id: event_id.to_string(),
            links: SubmissionLinks {
                repository: payload.repository_url.clone(),
                live: payload.live_url.clone(),
                video: payload.video_url.clone(),
            },
            title: payload.title,
            description: payload.description,
            outcome,
            elapsed_ms: elapsed_ms(started),
        }
    }

    /// Submit for every `(plan index, identity)` pair given, in input order.
    /// Callers pass the subset that should submit; nobody else is contacted.
    pub async fn submit_for(
        &self,
        submitters: &[(usize, Identity)],
        event_id: &str,
        track_selection: u32,
        limit: usize,
        cancel: &CancelSignal,
    ) -> StageResult<SubmissionRecord> {
        let this = self.clone();
        let event_id = event_id.to_string();
        run_stage(submitters.to_vec(), limit, cancel, move |_, (index, identity)| {
            let this = this.clone();
            let event_id = event_id.clone();
            async move { this.submit(&identity, index, &event_id, track_selection).await }
        })
        .await
    }
}
