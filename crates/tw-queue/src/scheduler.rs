//! `FairnessScheduler`: all reservation queues plus fairness metrics.

use std::collections::BTreeMap;

use tracing::{debug, trace};
use tw_core::{AgentId, ObjectId, Tick};

use crate::{QueueConfig, QueueEntry, QueueResult, ReservationQueue};

/// Running counters describing queue churn.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct QueueMetrics {
    /// Requests rejected because the agent was cooling down.
    pub cooldown_events:   u64,
    pub ghost_step_events: u64,
    /// Requeues and promotions.
    pub rotation_events:   u64,
}

/// Owns one [`ReservationQueue`] per object and resolves assignment.
///
/// None of the operations fail: invalid or duplicate calls are absorbed as
/// no-ops so callers can treat the queue as advisory state.
#[derive(Clone, Debug)]
pub struct FairnessScheduler {
    config:  QueueConfig,
    queues:  BTreeMap<ObjectId, ReservationQueue>,
    metrics: QueueMetrics,
}

impl FairnessScheduler {
    /// Validate `config` and create an empty scheduler.
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            queues:  BTreeMap::new(),
            metrics: QueueMetrics::default(),
        })
    }

    #[inline]
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    #[inline]
    pub fn metrics(&self) -> QueueMetrics {
        self.metrics
    }

    pub fn queue(&self, object: ObjectId) -> Option<&ReservationQueue> {
        self.queues.get(&object)
    }

    // ── Tick boundary ─────────────────────────────────────────────────────

    /// Expire cooldowns ending at or before `tick` and drop idle queues.
    pub fn on_tick(&mut self, tick: Tick) {
        for q in self.queues.values_mut() {
            q.expire_cooldowns(tick);
        }
        self.queues.retain(|_, q| !q.is_idle());
    }

    // ── Contract operations ───────────────────────────────────────────────

    /// Ask for `object`.  Returns `true` if `agent` holds it afterwards.
    ///
    /// A holder asking again gets `true`.  An agent under cooldown is
    /// rejected without being queued.  An agent already waiting stays where
    /// it is.  Otherwise the agent joins the tail and assignment runs.
    pub fn request(&mut self, object: ObjectId, agent: AgentId, tick: Tick) -> bool {
        let weight = self.config.age_priority_weight;
        let q = self.queues.entry(object).or_default();

        if q.holder == Some(agent) {
            return true;
        }
        if q.on_cooldown(agent, tick) {
            self.metrics.cooldown_events += 1;
            return false;
        }
        if q.is_queued(agent) {
            return false;
        }

        q.waiting.push(QueueEntry { agent, joined: tick });
        let granted = q.assign_next(tick, weight);
        if let Some(winner) = granted {
            debug!(object = %object, agent = %winner, tick = tick.0, "reservation granted");
        }
        granted == Some(agent)
    }

    /// Give up `object`.  No-op unless `agent` is the holder.
    ///
    /// A successful release starts a cooldown; a failed one clears any
    /// cooldown so the agent may retry at once.  The next waiter is assigned
    /// afterwards.
    pub fn release(&mut self, object: ObjectId, agent: AgentId, tick: Tick, success: bool) {
        let cooldown = self.config.cooldown_ticks;
        let weight = self.config.age_priority_weight;
        let Some(q) = self.queues.get_mut(&object) else {
            return;
        };
        if q.holder != Some(agent) {
            return;
        }

        q.holder = None;
        if success {
            q.cooldowns.insert(agent, tick + cooldown);
        } else {
            q.cooldowns.remove(&agent);
        }
        q.stall_count = 0;

        if let Some(next) = q.assign_next(tick, weight) {
            debug!(object = %object, from = %agent, to = %next, tick = tick.0, "reservation passed on");
        }
    }

    /// Count one blocked-progress signal against `object`'s holder.
    ///
    /// Returns `true`, and resets the counter, once `ghost_step_after`
    /// signals have accumulated.
    pub fn record_blocked_attempt(&mut self, object: ObjectId) -> bool {
        let limit = self.config.ghost_step_after;
        if limit == 0 {
            return false;
        }
        let q = self.queues.entry(object).or_default();
        q.stall_count += 1;
        trace!(object = %object, stalls = q.stall_count, "blocked attempt");
        if q.stall_count >= limit {
            q.stall_count = 0;
            self.metrics.ghost_step_events += 1;
            true
        } else {
            false
        }
    }

    // ── Maintenance ───────────────────────────────────────────────────────

    /// Put `agent` at the back of `object`'s queue.  No-op if already
    /// waiting.
    pub fn requeue_to_tail(&mut self, object: ObjectId, agent: AgentId, tick: Tick) {
        let q = self.queues.entry(object).or_default();
        if q.is_queued(agent) {
            return;
        }
        q.waiting.push(QueueEntry { agent, joined: tick });
        self.metrics.rotation_events += 1;
    }

    /// Move an already-waiting `agent` to the front of `object`'s queue.
    pub fn promote_agent(&mut self, object: ObjectId, agent: AgentId) {
        let Some(q) = self.queues.get_mut(&object) else {
            return;
        };
        match q.waiting.iter().position(|e| e.agent == agent) {
            Some(0) | None => {}
            Some(index) => {
                let entry = q.waiting.remove(index);
                q.waiting.insert(0, entry);
                self.metrics.rotation_events += 1;
            }
        }
    }

    /// Release everything `agent` holds (unsuccessfully) and drop it from
    /// every queue.
    pub fn remove_agent(&mut self, agent: AgentId, tick: Tick) {
        let held: Vec<ObjectId> = self
            .queues
            .iter()
            .filter(|(_, q)| q.holder == Some(agent))
            .map(|(&o, _)| o)
            .collect();
        for object in held {
            self.release(object, agent, tick, false);
        }
        for q in self.queues.values_mut() {
            q.waiting.retain(|e| e.agent != agent);
            q.cooldowns.remove(&agent);
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────

    #[inline]
    pub fn active_agent(&self, object: ObjectId) -> Option<AgentId> {
        self.queues.get(&object).and_then(|q| q.holder)
    }

    /// Waiting agents for `object` in queue order.
    pub fn queue_snapshot(&self, object: ObjectId) -> Vec<AgentId> {
        self.queues
            .get(&object)
            .map(|q| q.waiting.iter().map(|e| e.agent).collect())
            .unwrap_or_default()
    }

    /// Object → holder for every held object.
    pub fn active_reservations(&self) -> BTreeMap<ObjectId, AgentId> {
        self.queues
            .iter()
            .filter_map(|(&o, q)| q.holder.map(|a| (o, a)))
            .collect()
    }

    /// Held objects that also have at least one waiter, in object order.
    pub fn contested(&self) -> Vec<(ObjectId, AgentId)> {
        self.queues
            .iter()
            .filter(|(_, q)| !q.waiting.is_empty())
            .filter_map(|(&o, q)| q.holder.map(|a| (o, a)))
            .collect()
    }

    pub(crate) fn queues(&self) -> &BTreeMap<ObjectId, ReservationQueue> {
        &self.queues
    }

    pub(crate) fn restore(
        &mut self,
        queues: BTreeMap<ObjectId, ReservationQueue>,
        metrics: QueueMetrics,
    ) {
        self.queues = queues;
        self.metrics = metrics;
    }
}
