//! `tw-agent`: agent state for the `rust_town` engine.
//!
//! Agent state is stored as a Structure of Arrays indexed by `AgentId`.  The
//! contention engine only touches the fields it owns (wallet, needs,
//! employment counters); position and job are written by decision models
//! and setup code.
//!
//! | Module           | Contents                                              |
//! |------------------|-------------------------------------------------------|
//! | [`store`]        | `AgentStore`, `AgentRngs`, `EmploymentRecord`, `ActionOutcome` |
//! | [`builder`]      | `AgentStoreBuilder`                                   |
//! | [`needs`]        | `NeedKind`, `Needs`, `EffectMap`, `DecayRates`        |
//! | [`relationship`] | `Tie`, `RelationshipOracle`, `RelationshipLedger`     |

pub mod builder;
pub mod needs;
pub mod relationship;
pub mod store;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use builder::AgentStoreBuilder;
pub use needs::{DecayRates, EffectMap, EffectTarget, NeedKind, Needs};
pub use relationship::{RelationshipLedger, RelationshipOracle, Tie, TieRecord};
pub use store::{ActionKind, ActionOutcome, AgentRecord, AgentRngs, AgentStore, EmploymentRecord};
