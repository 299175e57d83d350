//! # hackseed-cli -- seed and verify hackathon test data
//!
//! Provides the `hackseed` command-line interface over
//! `hackseed-orchestrator`.
//!
//! ## Subcommands
//!
//! - `hackseed run`: provision identities, register them, submit projects,
//!   verify the result.
//! - `hackseed verify`: read-only check of an event's participant state.
//! - `hackseed events`: list the backend's events.
//!
//! ## Exit codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | success |
//! | 1 | completed with failures or discrepancies, or cancelled |
//! | 2 | aborted: bad configuration, unreachable backend, unknown event |
//!
//! ```bash
//! hackseed run --event-id E1 -n 5 -k 3 --track 1
//! hackseed run --plan seed.yaml --json-out outcome.json
//! hackseed verify --event-id E1 -n 5 -k 3 --list-submissions
//! ```

pub mod events;
pub mod plan;
pub mod run;
pub mod verify;

pub const EXIT_OK: u8 = 0;
pub const EXIT_FAILED: u8 = 1;
pub const EXIT_ABORTED: u8 = 2;
