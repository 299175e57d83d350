//! Plain-text rendering of a [`RunOutcome`].

use std::fmt::Write;

use crate::identity::ProvisionState;
use crate::provision::ProvisionOutcome;
use crate::registration::RegistrationOutcome;
use crate::stats::{Latency, StageStats};
use crate::submission::SubmissionOutcome;
use crate::workflow::RunOutcome;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub created: usize,
    pub existing: usize,
    pub provision_failed: usize,
    pub registered: usize,
    pub already_registered: usize,
    pub registration_failed: usize,
    pub submitted: usize,
    pub already_submitted: usize,
    pub submission_failed: usize,
}

impl Counts {
    pub fn of(outcome: &RunOutcome) -> Self {
        let mut c = Self::default();
        for r in &outcome.provisioned {
            match &r.outcome {
                ProvisionOutcome::Provisioned(i) if i.state == ProvisionState::New => c.created += 1,
                ProvisionOutcome::Provisioned(_) => c.existing += 1,
                ProvisionOutcome::Failed(_) => c.provision_failed += 1,
            }
        }
        for r in &outcome.registrations {
            match r.outcome {
                RegistrationOutcome::Registered => c.registered += 1,
                RegistrationOutcome::AlreadyRegistered => c.already_registered += 1,
                RegistrationOutcome::Failed(_) => c.registration_failed += 1,
            }
        }
        for r in &outcome.submissions {
            match r.outcome {
                SubmissionOutcome::Created { .. } => c.submitted += 1,
                SubmissionOutcome::AlreadyExists => c.already_submitted += 1,
                SubmissionOutcome::Failed(_) => c.submission_failed += 1,
            }
        }
        c
    }
}

fn latency_line(l: &Latency) -> String {
    format!("min {} avg {} max {} over {}", l.min_ms, l.avg_ms, l.max_ms, l.samples)
}

fn stage_line(stage: &StageStats) -> String {
    match (stage.success_rate, &stage.latency) {
        (Some(rate), Some(l)) => format!(
            "{}/{} ok ({rate:.1}%), {}",
            stage.succeeded,
            stage.attempted,
            latency_line(l)
        ),
        _ => "not run".into(),
    }
}

/// Render a human-readable summary. The outcome itself stays the record.
pub fn render(outcome: &RunOutcome) -> String {
    let c = Counts::of(outcome);
    let mut s = String::new();
    let rule = "=".repeat(72);

    // Writing to a String cannot fail.
    let _ = writeln!(s, "{rule}");
    let _ = writeln!(
        s,
        "Run {} against event {} ({})",
        outcome.run_id, outcome.event.event_id, outcome.event.title
    );
    let _ = writeln!(s, "{rule}");
    let _ = writeln!(
        s,
        "Provisioning:  {} created, {} existing, {} failed",
        c.created, c.existing, c.provision_failed
    );
    let _ = writeln!(
        s,
        "Registration:  {} registered, {} already registered, {} failed",
        c.registered, c.already_registered, c.registration_failed
    );
    let _ = writeln!(
        s,
        "Submission:    {} created, {} already submitted, {} failed",
        c.submitted, c.already_submitted, c.submission_failed
    );

    match (&outcome.report, &outcome.verification_error) {
        (Some(report), _) => {
            let _ = writeln!(
                s,
                "Verification:  {}/{} registered, {}/{} submitted, {} discrepancies",
                report.registered_count(),
                report.expected_count,
                report.submitted_count(),
                report.expected_count,
                report.discrepancies.len()
            );
            for d in &report.discrepancies {
                let _ = writeln!(s, "  ! {d}");
            }
        }
        (None, Some(f)) => {
            let _ = writeln!(s, "Verification:  could not run: {f}");
        }
        (None, None) => {
            let _ = writeln!(s, "Verification:  skipped");
        }
    }

    let failures = outcome.failures();
    if !failures.is_empty() {
        let _ = writeln!(s, "Failures:");
        for f in &failures {
            let who = f.email.as_deref().unwrap_or("-");
            let _ = writeln!(s, "  {:<13} {who}: {}", f.stage.to_string(), f.failure);
        }
    }

    let stats = &outcome.stats;
    let _ = writeln!(s, "Latency (ms):");
    for (name, stage) in [
        ("provision", &stats.provision),
        ("registration", &stats.registration),
        ("submission", &stats.submission),
    ] {
        let _ = writeln!(s, "  {:<13} {}", name, stage_line(stage));
    }
    if let Some(flow) = &stats.identity_flow {
        let _ = writeln!(s, "  {:<13} {}", "identity flow", latency_line(flow));
    }

    let t = &outcome.timings;
    let _ = writeln!(
        s,
        "Timings (ms):  provision {}, registration {}, submission {}, verification {}, total {}",
        t.provision_ms, t.registration_ms, t.submission_ms, t.verification_ms, t.total_ms
    );
    let verdict = if outcome.cancelled {
        "CANCELLED"
    } else if outcome.is_success() {
        "OK"
    } else {
        "FAILED"
    };
    let _ = writeln!(s, "Result:        {verdict}");
    let _ = write!(s, "{rule}");
    s
}
