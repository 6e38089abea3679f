//! `tw-affordance`: timed actions on contended objects.
//!
//! An affordance is something an agent can do with an object type ("eat a
//! meal" at a stove, "shower" at a shower).  Only the object's reservation
//! holder (see `tw-queue`) may start one; when it finishes, its effects are
//! applied exactly once and the reservation is handed to the next waiter,
//! preferring one the departing agent gets along with.
//!
//! | Module           | Contents                                              |
//! |------------------|-------------------------------------------------------|
//! | [`object`]       | `InteractiveObject`, `ObjectTable`                    |
//! | [`spec`]         | `AffordanceSpec`, `AffordanceRegistry`, `StageHooks`  |
//! | [`precondition`] | `Precondition` trait, `Comparison`, `ContextSnapshot` |
//! | [`hooks`]        | `HookRegistry`, `HookHandler`, `HookPayload`          |
//! | [`runtime`]      | `TimedActionRuntime`, `AffordanceEnv`, handover       |
//! | [`loader`]       | CSV manifest loader                                   |
//! | [`error`]        | `AffordanceError`, `AffordanceResult`                 |

pub mod error;
pub mod hooks;
pub mod loader;
pub mod object;
pub mod precondition;
pub mod runtime;
pub mod spec;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{AffordanceError, AffordanceResult};
pub use hooks::{HookHandler, HookPayload, HookRegistry, HookStage};
pub use loader::{load_manifest_csv, load_manifest_reader};
pub use object::{InteractiveObject, ObjectTable};
pub use precondition::{first_failing, CmpOp, Comparison, ContextSnapshot, Precondition};
pub use runtime::{
    select_successor, ActionMetadata, AffordanceEnv, RunningAction, RunningRecord, RuntimeState,
    TimedActionRuntime,
};
pub use spec::{AffordanceRegistry, AffordanceSpec, StageHooks};
