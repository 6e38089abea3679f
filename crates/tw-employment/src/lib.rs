//! `tw-employment`: jobs, shift attendance, wages, and exits.
//!
//! | Module        | Contents                                                 |
//! |---------------|----------------------------------------------------------|
//! | [`config`]    | `EmploymentConfig` + validation                          |
//! | [`job`]       | `JobSpec`, `JobRoster`                                   |
//! | [`loader`]    | `load_roster_csv`, `load_roster_reader`                  |
//! | [`shift`]     | `ShiftPhase`, `ShiftContext`, `ShiftArena`               |
//! | [`scheduler`] | `ShiftScheduler`, `ShiftEnv`                             |
//! | [`exit`]      | `ExitQueue`, `ExitSummary`, `ExitState`                  |
//! | [`error`]     | `EmploymentError`, `EmploymentResult`                    |
//!
//! The scheduler writes only the employment fields of the `AgentStore`, the
//! wallet, and coworker ties in the `RelationshipLedger`.

pub mod config;
pub mod error;
pub mod exit;
pub mod job;
pub mod loader;
pub mod scheduler;
pub mod shift;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::EmploymentConfig;
pub use error::{EmploymentError, EmploymentResult};
pub use exit::{ExitQueue, ExitState, ExitSummary};
pub use job::{JobRoster, JobSpec};
pub use loader::{load_roster_csv, load_roster_reader};
pub use scheduler::{ShiftEnv, ShiftScheduler};
pub use shift::{ShiftArena, ShiftContext, ShiftFlags, ShiftPhase, ShiftRecord};
