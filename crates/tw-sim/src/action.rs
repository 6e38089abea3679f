//! Per-tick agent actions produced by a [`DecisionModel`][crate::DecisionModel].

use tw_core::{AffordanceId, Cell, ObjectId};

/// One thing an agent asks the engine to do this tick.
///
/// Invalid actions (starting without holding, releasing someone else's
/// object) are not errors: they are recorded as unsuccessful outcomes on the
/// agent and otherwise ignored.
#[derive(Clone, PartialEq, Debug, Default)]
pub enum AgentAction {
    #[default]
    Idle,

    /// Reserve `object`, or join its queue.  With `blocked`, an ungranted
    /// request also reports the holder as stalled.
    Request {
        object:  ObjectId,
        blocked: bool,
    },

    /// Begin `affordance` on an object the agent holds.
    Start {
        object:     ObjectId,
        affordance: AffordanceId,
    },

    /// Give up `object`.  A successful release completes any running action.
    Release {
        object:     ObjectId,
        success:    bool,
        reason:     Option<String>,
        affordance: Option<AffordanceId>,
    },

    Move {
        to: Cell,
    },

    /// Report that `object`'s holder is not making progress.
    Blocked {
        object: ObjectId,
    },
}

impl AgentAction {
    pub fn request(object: ObjectId) -> Self {
        AgentAction::Request { object, blocked: false }
    }

    pub fn start(object: ObjectId, affordance: AffordanceId) -> Self {
        AgentAction::Start { object, affordance }
    }

    pub fn release(object: ObjectId, success: bool) -> Self {
        AgentAction::Release { object, success, reason: None, affordance: None }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, AgentAction::Idle)
    }
}
