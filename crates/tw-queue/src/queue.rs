//! Per-object reservation queue.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tw_core::{AgentId, Tick};

/// A waiting agent and the tick it joined.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct QueueEntry {
    pub agent:  AgentId,
    pub joined: Tick,
}

/// Holder, waiters, cooldowns, and stall counter for one object.
///
/// Mutated only through [`FairnessScheduler`][crate::FairnessScheduler].
#[derive(Clone, Debug, Default)]
pub struct ReservationQueue {
    pub(crate) holder:      Option<AgentId>,
    pub(crate) waiting:     Vec<QueueEntry>,
    /// Agent → first tick at which it may request again.
    pub(crate) cooldowns:   BTreeMap<AgentId, Tick>,
    pub(crate) stall_count: u32,
}

impl ReservationQueue {
    #[inline]
    pub fn holder(&self) -> Option<AgentId> {
        self.holder
    }

    #[inline]
    pub fn waiting(&self) -> &[QueueEntry] {
        &self.waiting
    }

    pub fn is_queued(&self, agent: AgentId) -> bool {
        self.waiting.iter().any(|e| e.agent == agent)
    }

    pub fn cooldown_until(&self, agent: AgentId) -> Option<Tick> {
        self.cooldowns.get(&agent).copied()
    }

    /// `true` while `agent` may not request this object.
    pub fn on_cooldown(&self, agent: AgentId, tick: Tick) -> bool {
        matches!(self.cooldowns.get(&agent), Some(&until) if tick < until)
    }

    pub fn stall_count(&self) -> u32 {
        self.stall_count
    }

    /// Nothing held, queued, cooling down, or counted.
    pub(crate) fn is_idle(&self) -> bool {
        self.holder.is_none()
            && self.waiting.is_empty()
            && self.cooldowns.is_empty()
            && self.stall_count == 0
    }

    /// Drop cooldowns whose expiry is at or before `tick`.
    pub(crate) fn expire_cooldowns(&mut self, tick: Tick) {
        self.cooldowns.retain(|_, until| *until > tick);
    }

    /// Hand the object to the best-priority waiter if it is free.
    ///
    /// Lower priority value wins; the strict `<` keeps the earliest index on
    /// ties.
    pub(crate) fn assign_next(&mut self, tick: Tick, age_weight: f64) -> Option<AgentId> {
        if self.holder.is_some() || self.waiting.is_empty() {
            return None;
        }
        let mut best: Option<(usize, f64)> = None;
        for (index, entry) in self.waiting.iter().enumerate() {
            let waited = tick.since(entry.joined) as f64;
            let priority = index as f64 - age_weight * waited;
            match best {
                Some((_, p)) if priority >= p => {}
                _ => best = Some((index, priority)),
            }
        }
        let (index, _) = best?;
        let winner = self.waiting.remove(index).agent;
        self.holder = Some(winner);
        self.stall_count = 0;
        Some(winner)
    }
}
