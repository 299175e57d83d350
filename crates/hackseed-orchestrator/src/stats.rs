//! Latency and success-rate figures derived from a run's records.
//!
//! Every provision, registration and submission record carries the time spent
//! on it. [`RunStats`] folds those into per-stage min/avg/max and success
//! percentages, plus the end-to-end flow time of each provisioned identity.

use std::collections::HashMap;

use serde::Serialize;

use crate::registration::RegistrationOutcome;
use crate::submission::SubmissionOutcome;
use crate::workflow::RunOutcome;

/// Min, mean and max over a set of millisecond samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Latency {
    pub samples: usize,
    pub min_ms: u64,
    pub avg_ms: u64,
    pub max_ms: u64,
}

impl Latency {
    /// `None` for an empty sample set. The mean is rounded down.
    pub fn of(samples: impl IntoIterator<Item = u64>) -> Option<Self> {
        let mut n: usize = 0;
        let mut sum: u128 = 0;
        let mut min = u64::MAX;
        let mut max = 0;
        for ms in samples {
            n += 1;
            sum += u128::from(ms);
            min = min.min(ms);
            max = max.max(ms);
        }
        if n == 0 {
            return None;
        }
        Some(Self {
            samples: n,
            min_ms: min,
            avg_ms: u64::try_from(sum / n as u128).unwrap_or(u64::MAX),
            max_ms: max,
        })
    }
}

/// Attempts, successes and latency of one stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageStats {
    pub attempted: usize,
    pub succeeded: usize,
    /// Percentage of attempts that did not fail. `None` when nothing ran.
    pub success_rate: Option<f64>,
    pub latency: Option<Latency>,
}

impl StageStats {
    /// Fold `(succeeded, elapsed_ms)` pairs.
    pub fn of(results: impl IntoIterator<Item = (bool, u64)>) -> Self {
        let results: Vec<(bool, u64)> = results.into_iter().collect();
        let attempted = results.len();
        let succeeded = results.iter().filter(|(ok, _)| *ok).count();
        let success_rate = (attempted > 0).then(|| succeeded as f64 * 100.0 / attempted as f64);
        Self {
            attempted,
            succeeded,
            success_rate,
            latency: Latency::of(results.iter().map(|(_, ms)| *ms)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    pub provision: StageStats,
    pub registration: StageStats,
    pub submission: StageStats,
    /// Per provisioned identity: its provision, registration and submission
    /// times added up.
    pub identity_flow: Option<Latency>,
}

impl RunStats {
    pub fn of(outcome: &RunOutcome) -> Self {
        let provision = StageStats::of(outcome.provisioned.iter().map(|r| (r.failure().is_none(), r.elapsed_ms)));
        let registration = StageStats::of(
            outcome
                .registrations
                .iter()
                .map(|r| (!matches!(r.outcome, RegistrationOutcome::Failed(_)), r.elapsed_ms)),
        );
        let submission = StageStats::of(
            outcome
                .submissions
                .iter()
                .map(|r| (!matches!(r.outcome, SubmissionOutcome::Failed(_)), r.elapsed_ms)),
        );

        let mut flow: HashMap<&str, u64> = outcome
            .provisioned
            .iter()
            .filter(|r| r.identity().is_some())
            .map(|r| (r.email.as_str(), r.elapsed_ms))
            .collect();
        let later = outcome
            .registrations
            .iter()
            .map(|r| (r.email.as_str(), r.elapsed_ms))
            .chain(outcome.submissions.iter().map(|r| (r.email.as_str(), r.elapsed_ms)));
        for (email, ms) in later {
            if let Some(total) = flow.get_mut(email) {
                *total = total.saturating_add(ms);
            }
        }

        Self {
            provision,
            registration,
            submission,
            identity_flow: Latency::of(flow.into_values()),
        }
    }
}
