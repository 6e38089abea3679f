//! Conflict observations recorded when a resource changes hands.

use tw_core::{AgentId, ObjectId, Tick};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ConflictReason {
    /// Graceful transfer after the holder finished.
    Handover,
    /// Forced eviction of a stalled holder.
    GhostStep,
}

impl ConflictReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictReason::Handover  => "handover",
            ConflictReason::GhostStep => "ghost_step",
        }
    }
}

/// One contested transfer of an object from `actor` with `rival` waiting.
#[derive(Clone, PartialEq, Debug)]
pub struct ConflictObservation {
    pub tick:         Tick,
    pub object:       ObjectId,
    pub actor:        AgentId,
    pub rival:        AgentId,
    pub reason:       ConflictReason,
    /// Waiters at the moment of transfer.
    pub queue_length: usize,
    /// `None` lets the consumer derive intensity from its own tuning.
    pub intensity:    Option<f32>,
}
