//! # hackseed-orchestrator -- test-data seeding for the hackathon platform
//!
//! Drives the hackathon API through one ordered workflow:
//!
//! 1. **provision** ([`provision`]): create each account, or log in when it
//!    already exists
//! 2. **register** ([`registration`]): register each identity for the event
//! 3. **submit** ([`submission`]): submit a project for the first K identities
//! 4. **verify** ([`verify`]): compare the participant list with what was
//!    expected
//!
//! Every stage tolerates state left by earlier runs: conflicts ("already
//! exists", "already registered", "already submitted") are recorded as
//! idempotent successes, classified in one place ([`classify`]). Per-identity
//! failures are recorded, not returned; [`workflow::RunOutcome`] holds
//! everything a run produced.
//!
//! ## Entry point
//!
//! ```no_run
//! # async fn demo() -> Result<(), hackseed_orchestrator::OrchestratorError> {
//! use hackseed_orchestrator::{Orchestrator, RunPlan};
//!
//! let plan = RunPlan {
//!     event_id: Some("E1".into()),
//!     ..RunPlan::default()
//! };
//! let outcome = Orchestrator::new().run(plan).await?;
//! println!("{}", hackseed_orchestrator::summary::render(&outcome));
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod error;
pub mod executor;
pub mod identity;
pub mod provision;
pub mod registration;
pub mod stats;
pub mod submission;
pub mod summary;
pub mod verify;
pub mod workflow;

pub use classify::{ConflictKind, FailureKind};
pub use error::{Failure, OrchestratorError, ProvisionError};
pub use executor::{CancelHandle, CancelSignal};
pub use identity::{Identity, IdentitySpec, IdentityTemplate, ProvisionState};
pub use workflow::{Orchestrator, RunOutcome, RunPlan};
