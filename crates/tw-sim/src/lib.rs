//! `tw-sim`: tick orchestrator for the rust_town contention engine.
//!
//! # Tick loop
//!
//! ```text
//! for tick in now..config.sim.end_tick():
//!   decide   - DecisionModel::decide for each alive agent (ascending id)
//!   ① cooldowns   - expire reservation cooldowns
//!   ② actions     - request / start / release / move / blocked, in order
//!   ③ stall sweep - ghost-step holders that stalled too long
//!   ④ advance     - count running actions down; complete and hand over
//!   ⑤ decay       - passive need decay
//!   ⑥ shifts      - attendance phases, wages, penalties
//!   ⑦ exits       - manual, threshold, overdue, and daily-cap exits
//!   ⑧ conflicts   - handover and ghost-step observations → relationships
//!   observe  - drained events go to SimObserver::on_event
//! ```
//!
//! # Modules
//!
//! | Module       | Contents                                              |
//! |--------------|-------------------------------------------------------|
//! | [`world`]    | `World`: every table plus the phase order             |
//! | [`sim`]      | `Sim`: clock, decisions, observer plumbing            |
//! | [`builder`]  | `SimBuilder`: setup-time validation                   |
//! | [`model`]    | `DecisionModel`, `DecisionContext`, `IdleModel`, `ScriptedModel` |
//! | [`action`]   | `AgentAction`                                         |
//! | [`config`]   | `EngineConfig`, `RivalryConfig`                       |
//! | [`conflict`] | conflict observation → relationship ledger            |
//! | [`state`]    | `WorldState` export/import                            |
//! | [`observer`] | `SimObserver`, `NoopObserver`                         |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use tw_agent::AgentStoreBuilder;
//! use tw_sim::{EngineConfig, IdleModel, NoopObserver, SimBuilder};
//!
//! let (store, rngs) = AgentStoreBuilder::new(10, 42).build();
//! let mut sim = SimBuilder::new(EngineConfig::default(), store, rngs, IdleModel)
//!     .build()?;
//! sim.run(&mut NoopObserver)?;
//! ```

pub mod action;
pub mod builder;
pub mod config;
pub mod conflict;
pub mod error;
pub mod model;
pub mod observer;
pub mod sim;
pub mod state;
pub mod world;


pub use action::AgentAction;
pub use builder::SimBuilder;
pub use config::{EngineConfig, RivalryConfig};
pub use conflict::{apply_conflict, ghost_step_intensity};
pub use error::{SimError, SimResult};
pub use model::{DecisionContext, DecisionModel, IdleModel, ScriptedModel};
pub use observer::{NoopObserver, SimObserver};
pub use sim::Sim;
pub use state::WorldState;
pub use world::World;
