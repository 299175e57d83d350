//! The seeding workflow: provision, register, submit, verify.
//!
//! Stages run strictly in order. Per-identity failures are recorded and the
//! run carries on; only an inconsistent plan, a bad base URL or an event that
//! cannot be resolved aborts, and always before any identity is touched.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use hackseed_client::config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_MS};
use hackseed_client::{ApiConfig, HackathonClient, RetryPolicy};
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{Failure, OrchestratorError};
use crate::executor::{cancel_pair, elapsed_ms, CancelHandle, CancelSignal};
use crate::identity::{Identity, IdentityTemplate};
use crate::provision::{ProvisionRecord, Provisioner};
use crate::registration::{RegistrationCoordinator, RegistrationOutcome, RegistrationRecord};
use crate::stats::RunStats;
use crate::submission::{SubmissionGenerator, SubmissionOutcome, SubmissionRecord, SubmissionTemplate};
use crate::verify::{ExpectedIdentity, ReconciliationReport, Verifier};

/// Retry settings for provisioning calls, in plan-file form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetrySettings {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let p = RetryPolicy::default();
        Self {
            max_retries: p.max_retries,
            base_delay_ms: u64::try_from(p.base_delay.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl From<RetrySettings> for RetryPolicy {
    fn from(s: RetrySettings) -> Self {
        RetryPolicy {
            max_retries: s.max_retries,
            base_delay: Duration::from_millis(s.base_delay_ms),
        }
    }
}

/// Parameters of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunPlan {
    pub base_url: String,
    /// Target event. `None` picks the first event the backend lists.
    pub event_id: Option<String>,
    pub identity_count: usize,
    /// How many identities, from the front of the list, submit a project.
    pub submission_subset_size: usize,
    pub track_selection: u32,
    pub concurrency_limit: usize,
    pub timeout_ms: u64,
    pub identities: IdentityTemplate,
    pub retry: RetrySettings,
}

impl Default for RunPlan {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            event_id: None,
            identity_count: 5,
            submission_subset_size: 3,
            track_selection: 1,
            concurrency_limit: 1,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            identities: IdentityTemplate::default(),
            retry: RetrySettings::default(),
        }
    }
}

impl RunPlan {
    pub fn validate(&self) -> Result<(), OrchestratorError> {
        if self.identity_count == 0 {
            return Err(OrchestratorError::InvalidPlan("identityCount must be at least 1".into()));
        }
        if self.submission_subset_size > self.identity_count {
            return Err(OrchestratorError::InvalidPlan(format!(
                "submissionSubsetSize ({}) exceeds identityCount ({})",
                self.submission_subset_size, self.identity_count
            )));
        }
        if self.concurrency_limit == 0 {
            return Err(OrchestratorError::InvalidPlan("concurrencyLimit must be at least 1".into()));
        }
        if self.timeout_ms == 0 {
            return Err(OrchestratorError::InvalidPlan("timeoutMs must be positive".into()));
        }
        if self.event_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            return Err(OrchestratorError::InvalidPlan("eventId must not be blank".into()));
        }
        Ok(())
    }

    pub fn api_config(&self) -> Result<ApiConfig, OrchestratorError> {
        Ok(ApiConfig::new(&self.base_url, Duration::from_millis(self.timeout_ms))?)
    }

    /// Expected identities for verification: every planned email, the first
    /// `submission_subset_size` of them expected to have submitted.
    pub fn expected_identities(&self) -> Vec<ExpectedIdentity> {
        let emails: Vec<String> = self
            .identities
            .generate(self.identity_count)
            .into_iter()
            .map(|s| s.email)
            .collect();
        ExpectedIdentity::from_emails(&emails, self.submission_subset_size)
    }
}

/// The event a run targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTarget {
    pub event_id: String,
    pub title: String,
    pub status: Option<String>,
}

/// Wall-clock duration of each stage, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTimings {
    pub provision_ms: u64,
    pub registration_ms: u64,
    pub submission_ms: u64,
    pub verification_ms: u64,
    pub total_ms: u64,
}

/// Stage names used in failure listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Provision,
    Registration,
    Submission,
    Verification,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Provision => "provision",
            Self::Registration => "registration",
            Self::Submission => "submission",
            Self::Verification => "verification",
        };
        f.write_str(s)
    }
}

/// One failure of a run, with where it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureEntry {
    pub stage: Stage,
    /// `None` for stage-level failures (verification could not run).
    pub email: Option<String>,
    pub failure: Failure,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub event: EventTarget,
    pub provisioned: Vec<ProvisionRecord>,
    pub registrations: Vec<RegistrationRecord>,
    pub submissions: Vec<SubmissionRecord>,
    /// `None` when verification was skipped (cancelled) or could not run.
    pub report: Option<ReconciliationReport>,
    pub verification_error: Option<Failure>,
    pub cancelled: bool,
    pub timings: StageTimings,
    pub stats: RunStats,
}

impl RunOutcome {
    /// Every `Failed` outcome across stages, in stage then input order.
    pub fn failures(&self) -> Vec<FailureEntry> {
        let mut out = Vec::new();
        for r in &self.provisioned {
            if let Some(f) = r.failure() {
                out.push(FailureEntry {
                    stage: Stage::Provision,
                    email: Some(r.email.clone()),
                    failure: f.clone(),
                });
            }
        }
        for r in &self.registrations {
            if let RegistrationOutcome::Failed(f) = &r.outcome {
                out.push(FailureEntry {
                    stage: Stage::Registration,
                    email: Some(r.email.clone()),
                    failure: f.clone(),
                });
            }
        }
        for r in &self.submissions {
            if let SubmissionOutcome::Failed(f) = &r.outcome {
                out.push(FailureEntry {
                    stage: Stage::Submission,
                    email: Some(r.email.clone()),
                    failure: f.clone(),
                });
            }
        }
        if let Some(f) = &self.verification_error {
            out.push(FailureEntry {
                stage: Stage::Verification,
                email: None,
                failure: f.clone(),
            });
        }
        out
    }

    pub fn discrepancies(&self) -> &[String] {
        self.report.as_ref().map(|r| r.discrepancies.as_slice()).unwrap_or(&[])
    }

    /// Zero failures, zero discrepancies, verification ran, not cancelled.
    pub fn is_success(&self) -> bool {
        !self.cancelled && self.report.is_some() && self.failures().is_empty() && self.discrepancies().is_empty()
    }

    /// Identities that came out of provisioning, in input order.
    pub fn identities(&self) -> Vec<&Identity> {
        self.provisioned.iter().filter_map(ProvisionRecord::identity).collect()
    }
}

/// Runs plans. Holds the cancellation handle and the submission template.
#[derive(Clone)]
pub struct Orchestrator {
    cancel: CancelHandle,
    signal: CancelSignal,
    template: Option<Arc<dyn SubmissionTemplate>>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("cancelled", &self.signal.is_cancelled())
            .field("custom_template", &self.template.is_some())
            .finish()
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        let (cancel, signal) = cancel_pair();
        Self {
            cancel,
            signal,
            template: None,
        }
    }

    /// Replace the default submission template.
    pub fn with_template(mut self, template: Arc<dyn SubmissionTemplate>) -> Self {
        self.template = Some(template);
        self
    }

    /// Handle that cancels the current and future runs of this orchestrator.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Resolve the event a plan targets.
    pub async fn resolve_event(client: &HackathonClient, event_id: Option<&str>) -> Result<EventTarget, OrchestratorError> {
        let event = match event_id {
            Some(id) => client
                .hackathons()
                .get(id)
                .await
                .map_err(OrchestratorError::EventResolution)?,
            None => client
                .hackathons()
                .list()
                .await
                .map_err(OrchestratorError::EventResolution)?
                .into_iter()
                .next()
                .ok_or(OrchestratorError::NoEvents)?,
        };
        Ok(EventTarget {
            event_id: event.id,
            title: event.title,
            status: event.status,
        })
    }

    /// Execute a plan end to end.
    pub async fn run(&self, plan: RunPlan) -> Result<RunOutcome, OrchestratorError> {
        plan.validate()?;
        let client = HackathonClient::new(&plan.api_config()?)?;
        let event = Self::resolve_event(&client, plan.event_id.as_deref()).await?;

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("run", %run_id, event_id = %event.event_id);
        Ok(self.execute(run_id, plan, client, event).instrument(span).await)
    }

    async fn execute(&self, run_id: Uuid, plan: RunPlan, client: HackathonClient, event: EventTarget) -> RunOutcome {
        tracing::info!(
            identities = plan.identity_count,
            submitters = plan.submission_subset_size,
            concurrency = plan.concurrency_limit,
            "starting run"
        );

        let started_at = Utc::now();
        let total = Instant::now();
        let limit = plan.concurrency_limit;
        let cancel = &self.signal;
        let mut timings = StageTimings::default();

        let provisioner = Provisioner::new(client.clone()).with_retry(plan.retry.into());
        let registrar = RegistrationCoordinator::new(client.clone(), provisioner.clone());
        let mut generator = SubmissionGenerator::new(client.clone(), provisioner.clone());
        if let Some(template) = &self.template {
            generator = generator.with_template(Arc::clone(template));
        }
        let verifier = Verifier::new(client);

        let mut outcome = RunOutcome {
            run_id,
            started_at,
            event: event.clone(),
            provisioned: Vec::new(),
            registrations: Vec::new(),
            submissions: Vec::new(),
            report: None,
            verification_error: None,
            cancelled: false,
            timings,
            stats: RunStats::default(),
        };

        // provision
        let t = Instant::now();
        let stage = provisioner
            .ensure_all(plan.identities.generate(plan.identity_count), limit, cancel)
            .await;
        timings.provision_ms = elapsed_ms(t);
        outcome.provisioned = stage.records;
        outcome.cancelled = stage.cancelled || cancel.is_cancelled();
        let identities: Vec<Identity> = outcome.identities().into_iter().cloned().collect();
        tracing::info!(provisioned = identities.len(), "provisioning done");

        // register
        if !outcome.cancelled {
            let t = Instant::now();
            let stage = registrar
                .register_all(&identities, &event.event_id, plan.track_selection, limit, cancel)
                .await;
            timings.registration_ms = elapsed_ms(t);
            outcome.registrations = stage.records;
            outcome.cancelled = stage.cancelled || cancel.is_cancelled();
        }

        // submit: the planned subset, minus identities that failed provisioning
        if !outcome.cancelled {
            let plan_index: HashMap<String, usize> = plan
                .identities
                .generate(plan.submission_subset_size)
                .into_iter()
                .enumerate()
                .map(|(i, s)| (s.email, i))
                .collect();
            let subset: Vec<(usize, Identity)> = identities
                .iter()
                .filter_map(|identity| plan_index.get(&identity.email).map(|&i| (i, identity.clone())))
                .collect();
            let t = Instant::now();
            let stage = generator
                .submit_for(&subset, &event.event_id, plan.track_selection, limit, cancel)
                .await;
            timings.submission_ms = elapsed_ms(t);
            outcome.submissions = stage.records;
            outcome.cancelled = stage.cancelled || cancel.is_cancelled();
        }

        // verify
        if !outcome.cancelled {
            let t = Instant::now();
            match identities.first() {
                None => {
                    outcome.verification_error =
                        Some(Failure::auth("no identity was provisioned, nothing to authenticate verification with"));
                }
                Some(reader) => {
                    let expected = plan.expected_identities();
                    let result = provisioner
                        .with_reauth(reader, |token| {
                            let verifier = &verifier;
                            let event_id = event.event_id.as_str();
                            let expected = expected.as_slice();
                            async move { verifier.verify(event_id, expected, &token).await }
                        })
                        .await;
                    match result {
                        Ok(Ok(report)) => outcome.report = Some(report),
                        Ok(Err(e)) => outcome.verification_error = Some(crate::classify::failure(&e)),
                        Err(f) => outcome.verification_error = Some(f),
                    }
                }
            }
            timings.verification_ms = elapsed_ms(t);
        } else {
            tracing::warn!("run cancelled, later stages skipped");
        }

        timings.total_ms = elapsed_ms(total);
        outcome.timings = timings;
        outcome.stats = RunStats::of(&outcome);
        tracing::info!(
            success = outcome.is_success(),
            failures = outcome.failures().len(),
            discrepancies = outcome.discrepancies().len(),
            cancelled = outcome.cancelled,
            "run finished"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_plan_is_valid() {
        RunPlan::default().validate().unwrap();
    }

    #[test]
    fn subset_larger_than_identities_is_rejected() {
        let plan = RunPlan {
            identity_count: 2,
            submission_subset_size: 3,
            ..RunPlan::default()
        };
        assert!(matches!(plan.validate(), Err(OrchestratorError::InvalidPlan(_))));
    }

    #[test]
    fn zero_identities_are_rejected() {
        let plan = RunPlan {
            identity_count: 0,
            submission_subset_size: 0,
            ..RunPlan::default()
        };
        let err = plan.validate().unwrap_err();
        assert!(matches!(&err, OrchestratorError::InvalidPlan(m) if m.contains("identityCount")));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let plan = RunPlan {
            concurrency_limit: 0,
            ..RunPlan::default()
        };
        assert!(plan.validate().is_err());
    }

    #[test]
    fn plan_deserializes_from_partial_camel_case() {
        let plan: RunPlan = serde_json::from_value(serde_json::json!({
            "eventId": "E1",
            "identityCount": 10,
            "retry": {"maxRetries": 0}
        }))
        .unwrap();
        assert_eq!(plan.event_id.as_deref(), Some("E1"));
        assert_eq!(plan.identity_count, 10);
        assert_eq!(plan.submission_subset_size, 3);
        assert_eq!(plan.retry.max_retries, 0);
        assert_eq!(plan.retry.base_delay_ms, 200);
        assert_eq!(plan.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn expected_identities_follow_template_and_subset() {
        let plan = RunPlan {
            identity_count: 3,
            submission_subset_size: 1,
            ..RunPlan::default()
        };
        let expected = plan.expected_identities();
        assert_eq!(expected.len(), 3);
        assert_eq!(expected[0].email, "testuser1@loadtest.com");
        assert!(expected[0].expect_submission);
        assert!(!expected[2].expect_submission);
    }

    #[test]
    fn retry_settings_convert_to_policy() {
        let p: RetryPolicy = RetrySettings {
            max_retries: 2,
            base_delay_ms: 10,
        }
        .into();
        assert_eq!(p.max_retries, 2);
        assert_eq!(p.base_delay, Duration::from_millis(10));
    }

    #[tokio::test]
    async fn bad_base_url_aborts_before_any_call() {
        let plan = RunPlan {
            base_url: "not a url".into(),
            ..RunPlan::default()
        };
        let err = Orchestrator::new().run(plan).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Config(_)));
    }

    #[tokio::test]
    async fn empty_plan_aborts_instead_of_failing_verification() {
        let plan = RunPlan {
            base_url: "http://127.0.0.1:9/api/v1".into(),
            identity_count: 0,
            submission_subset_size: 0,
            ..RunPlan::default()
        };
        let err = Orchestrator::new().run(plan).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidPlan(_)));
    }
}
