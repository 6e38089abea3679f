//! `tw-core`: foundational types for the `rust_town` contention engine.
//!
//! Every other `tw-*` crate depends on this one.  It has no `tw-*`
//! dependencies and keeps external ones to `rand` and `thiserror`, plus an
//! optional `serde`.
//!
//! # What lives here
//!
//! | Module     | Contents                                                     |
//! |------------|--------------------------------------------------------------|
//! | [`ids`]    | `AgentId`, `ObjectId`, `ObjectTypeId`, `AffordanceId`, `JobId` |
//! | [`grid`]   | `Cell` grid coordinate                                       |
//! | [`time`]   | `Tick`, `SimClock` (day cycle), `SimConfig`                  |
//! | [`rng`]    | `AgentRng`                                                   |
//! | [`event`]  | `SimEvent`, `EventLog`, reason codes                         |
//! | [`error`]  | `TwError`, `TwResult`                                        |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to ids, ticks, and cells.   |

pub mod error;
pub mod event;
pub mod grid;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{TwError, TwResult};
pub use event::{ActionReason, EventLog, ExitReason, SimEvent};
pub use grid::Cell;
pub use ids::{AffordanceId, AgentId, JobId, ObjectId, ObjectTypeId};
pub use rng::AgentRng;
pub use time::{SimClock, SimConfig, Tick};
