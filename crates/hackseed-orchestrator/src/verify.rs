//! Read-only reconciliation of expected identities against the event's
//! participant list.

use std::collections::{HashMap, HashSet};

use hackseed_client::hackathons::Participant;
use hackseed_client::{ApiError, HackathonClient};
use serde::Serialize;

/// An identity the verifier expects to find.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedIdentity {
    pub email: String,
    /// Whether this identity is in the submitting subset.
    pub expect_submission: bool,
}

impl ExpectedIdentity {
    /// Expected set for a run: the first `subset` emails should have submitted.
    pub fn from_emails<S: AsRef<str>>(emails: &[S], subset: usize) -> Vec<Self> {
        emails
            .iter()
            .enumerate()
            .map(|(i, e)| Self {
                email: e.as_ref().to_string(),
                expect_submission: i < subset,
            })
            .collect()
    }
}

/// Observed state of one expected identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityStatus {
    pub email: String,
    pub registered: bool,
    pub submitted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub expected_count: usize,
    pub observed_count: usize,
    /// One entry per distinct expected email, in expected order.
    pub per_identity_status: Vec<IdentityStatus>,
    pub discrepancies: Vec<String>,
}

impl ReconciliationReport {
    pub fn status(&self, email: &str) -> Option<&IdentityStatus> {
        self.per_identity_status.iter().find(|s| s.email == email)
    }

    pub fn registered_count(&self) -> usize {
        self.per_identity_status.iter().filter(|s| s.registered).count()
    }

    pub fn submitted_count(&self) -> usize {
        self.per_identity_status.iter().filter(|s| s.submitted).count()
    }

    pub fn is_clean(&self) -> bool {
        self.discrepancies.is_empty()
    }
}

/// Build the report from an already fetched participant list.
pub fn reconcile(expected: &[ExpectedIdentity], participants: &[Participant]) -> ReconciliationReport {
    let mut observed: HashMap<&str, bool> = HashMap::new();
    for p in participants {
        if let Some(email) = p.email() {
            let flag = observed.entry(email).or_insert(false);
            *flag |= p.has_submission;
        }
    }

    let mut seen = HashSet::new();
    let mut report = ReconciliationReport::default();
    for exp in expected {
        if !seen.insert(exp.email.as_str()) {
            continue;
        }
        let status = match observed.get(exp.email.as_str()) {
            Some(&submitted) => IdentityStatus {
                email: exp.email.clone(),
                registered: true,
                submitted,
            },
            None => IdentityStatus {
                email: exp.email.clone(),
                registered: false,
                submitted: false,
            },
        };

        if !status.registered {
            report
                .discrepancies
                .push(format!("{}: expected participant, not found in participant list", exp.email));
        } else if exp.expect_submission && !status.submitted {
            report
                .discrepancies
                .push(format!("{}: expected a submission, participant reports none", exp.email));
        } else if !exp.expect_submission && status.submitted {
            report
                .discrepancies
                .push(format!("{}: not expected to submit, participant reports a submission", exp.email));
        }
        if status.registered {
            report.observed_count += 1;
        }
        report.per_identity_status.push(status);
    }
    report.expected_count = report.per_identity_status.len();
    report
}

/// Fetches participants and reconciles them.
#[derive(Debug, Clone)]
pub struct Verifier {
    client: HackathonClient,
}

impl Verifier {
    pub fn new(client: HackathonClient) -> Self {
        Self { client }
    }

    /// Verify an event. `Err` only when the participant list cannot be fetched.
    pub async fn verify(
        &self,
        event_id: &str,
        expected: &[ExpectedIdentity],
        auth_token: &str,
    ) -> Result<ReconciliationReport, ApiError> {
        let participants = self.client.hackathons().participants(event_id, auth_token).await?;
        let report = reconcile(expected, &participants);
        tracing::info!(
            event_id,
            participants = participants.len(),
            expected = report.expected_count,
            observed = report.observed_count,
            discrepancies = report.discrepancies.len(),
            "reconciliation complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn participants(v: serde_json::Value) -> Vec<Participant> {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn clean_run_has_no_discrepancies() {
        let expected = ExpectedIdentity::from_emails(&["a@x.com", "b@x.com", "c@x.com"], 2);
        let list = participants(json!([
            {"email": "a@x.com", "hasSubmission": true},
            {"email": "b@x.com", "hasSubmission": true},
            {"email": "c@x.com", "hasSubmission": false},
            {"email": "other@x.com", "hasSubmission": true}
        ]));
        let report = reconcile(&expected, &list);
        assert!(report.is_clean(), "{:?}", report.discrepancies);
        assert_eq!(report.expected_count, 3);
        assert_eq!(report.observed_count, 3);
        assert_eq!(report.submitted_count(), 2);
        assert!(report.status("other@x.com").is_none());
    }

    #[test]
    fn each_kind_of_discrepancy_is_flagged() {
        let expected = ExpectedIdentity::from_emails(&["a@x.com", "b@x.com", "c@x.com"], 2);
        let list = participants(json!([
            {"email": "b@x.com", "hasSubmission": false},
            {"user": {"email": "c@x.com"}, "hasSubmission": true}
        ]));
        let report = reconcile(&expected, &list);
        assert_eq!(report.observed_count, 2);
        assert_eq!(report.discrepancies.len(), 3);
        assert!(report.discrepancies[0].starts_with("a@x.com: expected participant"));
        assert!(report.discrepancies[1].starts_with("b@x.com: expected a submission"));
        assert!(report.discrepancies[2].starts_with("c@x.com: not expected to submit"));
        assert!(!report.status("a@x.com").unwrap().registered);
    }

    #[test]
    fn duplicate_expected_emails_collapse() {
        let expected = vec![
            ExpectedIdentity {
                email: "a@x.com".into(),
                expect_submission: false,
            },
            ExpectedIdentity {
                email: "a@x.com".into(),
                expect_submission: false,
            },
        ];
        let report = reconcile(&expected, &participants(json!([{"email": "a@x.com"}])));
        assert_eq!(report.expected_count, 1);
        assert_eq!(report.per_identity_status.len(), 1);
    }

    #[test]
    fn email_match_is_exact() {
        let expected = ExpectedIdentity::from_emails(&["a@x.com"], 0);
        let report = reconcile(&expected, &participants(json!([{"email": "A@x.com"}])));
        assert_eq!(report.observed_count, 0);
        assert_eq!(report.discrepancies.len(), 1);
    }
}
