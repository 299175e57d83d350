//! # Verify Subcommand
//!
//! Read-only reconciliation. Logs in as the first template identity (it is
//! never created here) to obtain a token, then compares the event's
//! participant list with the plan's expected identities.

use anyhow::Result;
use clap::Args;
use hackseed_client::HackathonClient;
use hackseed_orchestrator::provision::Provisioner;
use hackseed_orchestrator::verify::{ReconciliationReport, Verifier};
use hackseed_orchestrator::workflow::EventTarget;
use hackseed_orchestrator::Orchestrator;

use crate::plan::PlanArgs;
use crate::{EXIT_ABORTED, EXIT_FAILED, EXIT_OK};

/// Arguments for `hackseed verify`.
#[derive(Args, Debug, Clone, Default)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Also print the event's submission listing.
    #[arg(long)]
    pub list_submissions: bool,
}

pub fn render_report(event: &EventTarget, report: &ReconciliationReport) -> String {
    let mut lines = vec![format!(
        "Event {} ({}): {}/{} registered, {}/{} submitted",
        event.event_id,
        event.title,
        report.registered_count(),
        report.expected_count,
        report.submitted_count(),
        report.expected_count
    )];
    for s in &report.per_identity_status {
        let reg = if s.registered { "registered" } else { "absent" };
        let sub = if s.submitted { "submitted" } else { "-" };
        lines.push(format!("  {:<40} {reg:<11} {sub}", s.email));
    }
    if report.discrepancies.is_empty() {
        lines.push("No discrepancies.".into());
    } else {
        lines.push(format!("{} discrepancies:", report.discrepancies.len()));
        lines.extend(report.discrepancies.iter().map(|d| format!("  ! {d}")));
    }
    lines.join("\n")
}

/// Execute the verify subcommand.
pub async fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let plan = match args.plan.resolve() {
        Ok(plan) => plan,
        Err(e) => {
            tracing::error!("{e}");
            return Ok(EXIT_ABORTED);
        }
    };
    if let Err(e) = plan.validate() {
        tracing::error!("{e}");
        return Ok(EXIT_ABORTED);
    }
    let client = match plan.api_config().and_then(|c| HackathonClient::new(&c).map_err(Into::into)) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("{e}");
            return Ok(EXIT_ABORTED);
        }
    };
    let event = match Orchestrator::resolve_event(&client, plan.event_id.as_deref()).await {
        Ok(event) => event,
        Err(e) => {
            eprintln!("verify aborted: {e}");
            return Ok(EXIT_ABORTED);
        }
    };

    let reader_spec = plan.identities.spec(1);
    let provisioner = Provisioner::new(client.clone()).with_retry(plan.retry.into());
    let reader = match provisioner.login(&reader_spec).await {
        Ok(identity) => identity,
        Err(e) => {
            eprintln!("verify aborted: cannot authenticate as {}: {e}", reader_spec.email);
            return Ok(EXIT_ABORTED);
        }
    };
    let Some(token) = reader.token() else {
        eprintln!("verify aborted: no token for {}", reader.email);
        return Ok(EXIT_ABORTED);
    };

    let expected = plan.expected_identities();
    let report = match Verifier::new(client.clone()).verify(&event.event_id, &expected, &token).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("verify aborted: {e}");
            return Ok(EXIT_ABORTED);
        }
    };
    println!("{}", render_report(&event, &report));

    if args.list_submissions {
        match client.submissions().list(&event.event_id, &token).await {
            Ok(submissions) => {
                println!("Submissions ({}):", submissions.len());
                for s in &submissions {
                    println!(
                        "  {:<16} {:<40} {}",
                        s.id.as_deref().unwrap_or("-"),
                        s.submitter_email().unwrap_or("-"),
                        s.title
                    );
                }
            }
            Err(e) => tracing::warn!("could not list submissions: {e}"),
        }
    }

    Ok(if report.is_clean() { EXIT_OK } else { EXIT_FAILED })
}
