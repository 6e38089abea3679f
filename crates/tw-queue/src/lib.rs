//! `tw-queue`: reservation queues for contended objects.
//!
//! Each object has a [`ReservationQueue`]: an optional holder, an ordered
//! list of waiters, per-agent cooldowns, and a stall counter.  The
//! [`FairnessScheduler`] owns one per object and decides who gets a freed
//! object next:
//!
//! ```text
//! priority(entry) = queue_index - age_priority_weight * (tick - joined_tick)
//! ```
//!
//! The lowest priority wins; ties go to the lower queue index.  Every
//! operation is advisory: redundant or invalid calls are silent no-ops, so
//! callers may poll freely every tick.
//!
//! | Module        | Contents                                        |
//! |---------------|-------------------------------------------------|
//! | [`config`]    | `QueueConfig` + validation                      |
//! | [`queue`]     | `QueueEntry`, `ReservationQueue`                |
//! | [`scheduler`] | `FairnessScheduler`, `QueueMetrics`             |
//! | [`conflict`]  | `ConflictObservation`, `ConflictReason`         |
//! | [`state`]     | `QueueState` persistence payload                |
//! | [`error`]     | `QueueError`, `QueueResult`                     |

pub mod config;
pub mod conflict;
pub mod error;
pub mod queue;
pub mod scheduler;
pub mod state;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::QueueConfig;
pub use conflict::{ConflictObservation, ConflictReason};
pub use error::{QueueError, QueueResult};
pub use queue::{QueueEntry, ReservationQueue};
pub use scheduler::{FairnessScheduler, QueueMetrics};
pub use state::{CooldownRecord, QueueRecord, QueueState, ReservationRecord, StallRecord};
