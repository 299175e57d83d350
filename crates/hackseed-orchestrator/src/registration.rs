//! Event registration for provisioned identities.

use std::time::Instant;

use hackseed_client::hackathons::EventRegistrationRequest;
use hackseed_client::HackathonClient;
use serde::Serialize;

use crate::classify::{self, ConflictKind};
use crate::error::Failure;
use crate::executor::{elapsed_ms, run_stage, CancelSignal, StageResult};
use crate::identity::Identity;
use crate::provision::Provisioner;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum RegistrationOutcome {
    Registered,
    AlreadyRegistered,
    Failed(Failure),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRecord {
    pub email: String,
    pub event_id: String,
    pub track_selection: u32,
    pub outcome: RegistrationOutcome,
    pub elapsed_ms: u64,
}

/// Registers identities for an event, treating "already registered" as success.
#[derive(Debug, Clone)]
pub struct RegistrationCoordinator {
    client: HackathonClient,
    provisioner: Provisioner,
}

impl RegistrationCoordinator {
    pub fn new(client: HackathonClient, provisioner: Provisioner) -> Self {
        Self { client, provisioner }
    }

    pub async fn register(&self, identity: &Identity, event_id: &str, track_selection: u32) -> RegistrationRecord {
        let started = Instant::now();
        let req = EventRegistrationRequest {
            selected_track: track_selection,
        };
        let hackathons = self.client.hackathons();
        let result = self
            .provisioner
            .with_reauth(identity, |token| async move { hackathons.register(event_id, &req, &token).await })
            .await;

        let outcome = match result {
            Err(failure) => RegistrationOutcome::Failed(failure),
            Ok(Ok(reply)) => match reply.message.as_deref().and_then(classify::message_conflict) {
                Some(ConflictKind::AlreadyRegistered) => RegistrationOutcome::AlreadyRegistered,
                _ => RegistrationOutcome::Registered,
            },
            Ok(Err(e)) => match classify::conflict_of(&e) {
                Some(ConflictKind::AlreadyRegistered) => RegistrationOutcome::AlreadyRegistered,
                _ => RegistrationOutcome::Failed(classify::failure(&e)),
            },
        };
        if let RegistrationOutcome::Failed(f) = &outcome {
            tracing::warn!(email = %identity.email, event_id, failure = %f, "registration failed");
        }

        RegistrationRecord {
            email: identity.email.clone(),
            event_id: event_id.to_string(),
            track_selection,
            outcome,
            elapsed_ms: elapsed_ms(started),
        }
    }

    /// Register every identity, records in input order.
    pub async fn register_all(
        &self,
        identities: &[Identity],
        event_id: &str,
        track_selection: u32,
        limit: usize,
        cancel: &CancelSignal,
    ) -> StageResult<RegistrationRecord> {
        let this = self.clone();
        let event_id = event_id.to_string();
        run_stage(identities.to_vec(), limit, cancel, move |_, identity| {
            let this = this.clone();
            let event_id = event_id.clone();
            async move { this.register(&identity, &event_id, track_selection).await }
        })
        .await
    }
}
