//! Run plan assembly.
//!
//! Layers, lowest first: built-in defaults, `HACKSEED_*` environment
//! variables, the YAML plan file, command-line flags. Each layer only sets
//! the fields it names.
//!
//! ```yaml
//! baseUrl: http://localhost:3002/api/v1
//! eventId: E1
//! identityCount: 20
//! submissionSubsetSize: 10
//! trackSelection: 2
//! concurrencyLimit: 4
//! timeoutMs: 5000
//! identities:
//!   emailPrefix: seed
//!   emailDomain: example.org
//! retry:
//!   maxRetries: 2
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::Args;
use hackseed_orchestrator::workflow::RetrySettings;
use hackseed_orchestrator::{IdentityTemplate, RunPlan};
use serde::Deserialize;
use thiserror::Error;

pub const ENV_BASE_URL: &str = "HACKSEED_BASE_URL";
pub const ENV_TIMEOUT_MS: &str = "HACKSEED_TIMEOUT_MS";
pub const ENV_EVENT_ID: &str = "HACKSEED_EVENT_ID";
pub const ENV_IDENTITIES: &str = "HACKSEED_IDENTITIES";
pub const ENV_SUBMITTERS: &str = "HACKSEED_SUBMITTERS";
pub const ENV_TRACK: &str = "HACKSEED_TRACK";
pub const ENV_CONCURRENCY: &str = "HACKSEED_CONCURRENCY";

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("cannot read plan file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid plan file {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },
}

/// A plan file: every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlanFile {
    pub base_url: Option<String>,
    pub event_id: Option<String>,
    pub identity_count: Option<usize>,
    pub submission_subset_size: Option<usize>,
    pub track_selection: Option<u32>,
    pub concurrency_limit: Option<usize>,
    pub timeout_ms: Option<u64>,
    pub identities: Option<IdentityTemplate>,
    pub retry: Option<RetrySettings>,
}

impl PlanFile {
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let text = std::fs::read_to_string(path).map_err(|source| PlanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&text).map_err(|source| PlanError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply(self, plan: &mut RunPlan) {
        set(&mut plan.base_url, self.base_url);
        if self.event_id.is_some() {
            plan.event_id = self.event_id;
        }
        set(&mut plan.identity_count, self.identity_count);
        set(&mut plan.submission_subset_size, self.submission_subset_size);
        set(&mut plan.track_selection, self.track_selection);
        set(&mut plan.concurrency_limit, self.concurrency_limit);
        set(&mut plan.timeout_ms, self.timeout_ms);
        set(&mut plan.identities, self.identities);
        set(&mut plan.retry, self.retry);
    }
}

/// Connection flags shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// API base URL, including the `/api/v1` prefix.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Per-request timeout in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

/// Plan flags shared by `run` and `verify`.
#[derive(Args, Debug, Clone, Default)]
pub struct PlanArgs {
    /// YAML plan file.
    #[arg(long)]
    pub plan: Option<PathBuf>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Target event id. Defaults to the first event the backend lists.
    #[arg(long)]
    pub event_id: Option<String>,

    /// Number of identities.
    #[arg(long, short = 'n')]
    pub identities: Option<usize>,

    /// How many identities, from the front, submit a project.
    #[arg(long, short = 'k')]
    pub submitters: Option<usize>,

    /// Track selected at registration and submission.
    #[arg(long)]
    pub track: Option<u32>,

    /// Identities processed concurrently within a stage.
    #[arg(long, short = 'c')]
    pub concurrency: Option<usize>,
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn parse_env<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, PlanError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| PlanError::Env { var, value }),
    }
}

/// Apply `HACKSEED_*` variables read through `lookup`.
pub fn apply_env(plan: &mut RunPlan, lookup: impl Fn(&str) -> Option<String>) -> Result<(), PlanError> {
    set(&mut plan.base_url, lookup(ENV_BASE_URL));
    set(&mut plan.timeout_ms, parse_env(&lookup, ENV_TIMEOUT_MS)?);
    if let Some(id) = lookup(ENV_EVENT_ID) {
        plan.event_id = Some(id);
    }
    set(&mut plan.identity_count, parse_env(&lookup, ENV_IDENTITIES)?);
    set(&mut plan.submission_subset_size, parse_env(&lookup, ENV_SUBMITTERS)?);
    set(&mut plan.track_selection, parse_env(&lookup, ENV_TRACK)?);
    set(&mut plan.concurrency_limit, parse_env(&lookup, ENV_CONCURRENCY)?);
    Ok(())
}

impl ConnectionArgs {
    fn apply(&self, plan: &mut RunPlan) {
        set(&mut plan.base_url, self.base_url.clone());
        set(&mut plan.timeout_ms, self.timeout_ms);
    }

    /// Plan with only the connection layers applied (env, then flags).
    pub fn resolve_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<RunPlan, PlanError> {
        let mut plan = RunPlan::default();
        apply_env(&mut plan, lookup)?;
        self.apply(&mut plan);
        Ok(plan)
    }
}

impl PlanArgs {
    /// Assemble the plan from all layers, reading the process environment.
    pub fn resolve(&self) -> Result<RunPlan, PlanError> {
        self.resolve_with(|k| std::env::var(k).ok())
    }

    pub fn resolve_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<RunPlan, PlanError> {
        let mut plan = RunPlan::default();
        apply_env(&mut plan, lookup)?;
        if let Some(path) = &self.plan {
            PlanFile::load(path)?.apply(&mut plan);
        }
        self.connection.apply(&mut plan);
        if self.event_id.is_some() {
            plan.event_id = self.event_id.clone();
        }
        set(&mut plan.identity_count, self.identities);
        set(&mut plan.submission_subset_size, self.submitters);
        set(&mut plan.track_selection, self.track);
        set(&mut plan.concurrency_limit, self.concurrency);
        Ok(plan)
    }
}
