//! Persistence payload for the scheduler.
//!
//! Every list is emitted in ascending `ObjectId` order (then `AgentId` for
//! cooldowns), so exporting an imported state reproduces it exactly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tw_core::{AgentId, ObjectId, Tick};

use crate::{FairnessScheduler, QueueEntry, QueueError, QueueMetrics, QueueResult, ReservationQueue};

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ReservationRecord {
    pub object: ObjectId,
    pub agent:  AgentId,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct QueueRecord {
    pub object:  ObjectId,
    pub entries: Vec<QueueEntry>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CooldownRecord {
    pub object: ObjectId,
    pub agent:  AgentId,
    pub until:  Tick,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct StallRecord {
    pub object: ObjectId,
    pub count:  u32,
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct QueueState {
    pub reservations: Vec<ReservationRecord>,
    pub queues:       Vec<QueueRecord>,
    pub cooldowns:    Vec<CooldownRecord>,
    pub stall_counts: Vec<StallRecord>,
    pub metrics:      QueueMetrics,
}

impl FairnessScheduler {
    pub fn export_state(&self) -> QueueState {
        let mut state = QueueState {
            metrics: self.metrics(),
            ..QueueState::default()
        };
        for (&object, q) in self.queues() {
            if let Some(agent) = q.holder {
                state.reservations.push(ReservationRecord { object, agent });
            }
            if !q.waiting.is_empty() {
                state.queues.push(QueueRecord { object, entries: q.waiting.clone() });
            }
            for (&agent, &until) in &q.cooldowns {
                state.cooldowns.push(CooldownRecord { object, agent, until });
            }
            if q.stall_count > 0 {
                state.stall_counts.push(StallRecord { object, count: q.stall_count });
            }
        }
        state
    }

    /// Replace all queue state with `state`.
    ///
    /// Rejects payloads where an object's holder also appears among its
    /// waiters; on error the scheduler is left unchanged.
    pub fn import_state(&mut self, state: &QueueState) -> QueueResult<()> {
        let mut queues: BTreeMap<ObjectId, ReservationQueue> = BTreeMap::new();
        for r in &state.reservations {
            queues.entry(r.object).or_default().holder = Some(r.agent);
        }
        for r in &state.queues {
            queues.entry(r.object).or_default().waiting = r.entries.clone();
        }
        for r in &state.cooldowns {
            queues.entry(r.object).or_default().cooldowns.insert(r.agent, r.until);
        }
        for r in &state.stall_counts {
            queues.entry(r.object).or_default().stall_count = r.count;
        }
        for (&object, q) in &queues {
            if let Some(agent) = q.holder {
                if q.is_queued(agent) {
                    return Err(QueueError::HolderAlsoWaiting { object, agent });
                }
            }
        }
        self.restore(queues, state.metrics);
        Ok(())
    }
}
