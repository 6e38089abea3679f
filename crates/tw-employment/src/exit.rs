//! `ExitQueue`: agents waiting to leave the population.
//!
//! Agents enter the queue automatically (too many absences in seven days)
//! or are flagged for a manual exit.  Evaluation runs once per tick after
//! the shift scheduler:
//!
//! 1. reset the daily exit counter when the day changes;
//! 2. process every manual exit (`manual_approve`);
//! 3. enqueue agents at or above `max_absent_shifts`;
//! 4. force exits queued for at least `exit_review_window` (`auto_review`);
//! 5. drain the queue front while under `daily_exit_cap` (`daily_cap`).
//!
//! An exit marks the agent removed in the [`AgentStore`]; the caller clears
//! the agent from every other table.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;
use tw_agent::AgentStore;
use tw_core::{AgentId, EventLog, ExitReason, SimEvent, Tick};

use crate::EmploymentConfig;

/// Queryable snapshot of the exit backlog.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ExitSummary {
    pub pending:        Vec<AgentId>,
    pub pending_count:  usize,
    pub exits_today:    u32,
    pub daily_exit_cap: u32,
    pub queue_limit:    usize,
    pub review_window:  u64,
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct ExitState {
    pub pending:     Vec<AgentId>,
    pub enqueued_at: Vec<(AgentId, Tick)>,
    pub manual:      Vec<AgentId>,
    pub exits_today: u32,
    pub day:         Option<u64>,
}

#[derive(Clone, Debug)]
pub struct ExitQueue {
    config:      EmploymentConfig,
    pending:     Vec<AgentId>,
    enqueued_at: BTreeMap<AgentId, Tick>,
    manual:      BTreeSet<AgentId>,
    exits_today: u32,
    day:         Option<u64>,
}

impl ExitQueue {
    pub fn new(config: EmploymentConfig) -> Self {
        Self {
            config,
            pending:     Vec::new(),
            enqueued_at: BTreeMap::new(),
            manual:      BTreeSet::new(),
            exits_today: 0,
            day:         None,
        }
    }

    pub fn pending(&self) -> &[AgentId] {
        &self.pending
    }

    pub fn is_pending(&self, agent: AgentId) -> bool {
        self.pending.contains(&agent)
    }

    pub fn manual_exits(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.manual.iter().copied()
    }

    pub fn exits_today(&self) -> u32 {
        self.exits_today
    }

    pub fn enqueued_at(&self, agent: AgentId) -> Option<Tick> {
        self.enqueued_at.get(&agent).copied()
    }

    pub fn summary(&self) -> ExitSummary {
        ExitSummary {
            pending:        self.pending.clone(),
            pending_count:  self.pending.len(),
            exits_today:    self.exits_today,
            daily_exit_cap: self.config.daily_exit_cap,
            queue_limit:    self.config.exit_queue_limit,
            review_window:  self.config.exit_review_window,
        }
    }

    // ── Membership ────────────────────────────────────────────────────────

    /// Append `agent` to the queue.  No-op if already pending.
    pub fn enqueue_exit(
        &mut self,
        agent:  AgentId,
        tick:   Tick,
        agents: &mut AgentStore,
        events: &mut EventLog,
    ) {
        if self.is_pending(agent) {
            return;
        }
        self.pending.push(agent);
        self.enqueued_at.insert(agent, tick);
        if let Some(record) = agents.employment.get_mut(agent.index()) {
            record.exit_pending = true;
        }

        let limit = self.config.exit_queue_limit;
        let pending_count = self.pending.len();
        if limit > 0 && pending_count > limit {
            events.emit(tick, SimEvent::EmploymentExitQueueOverflow { pending_count, limit });
        } else {
            events.emit(tick, SimEvent::EmploymentExitPending { agent, pending_count });
        }
        debug!(agent = %agent, tick = tick.0, pending = pending_count, "exit enqueued");
    }

    pub fn remove_from_queue(&mut self, agent: AgentId, agents: &mut AgentStore) {
        self.pending.retain(|&a| a != agent);
        self.enqueued_at.remove(&agent);
        if let Some(record) = agents.employment.get_mut(agent.index()) {
            record.exit_pending = false;
        }
    }

    /// Flag `agent` for exit at the next evaluation.  `false` for agents not
    /// in the population.
    pub fn request_manual_exit(
        &mut self,
        agent:  AgentId,
        tick:   Tick,
        agents: &AgentStore,
        events: &mut EventLog,
    ) -> bool {
        if !agents.is_alive(agent) {
            return false;
        }
        self.manual.insert(agent);
        events.emit(tick, SimEvent::EmploymentExitManualRequest { agent });
        true
    }

    /// Withdraw any manual or queued exit for `agent`.
    pub fn defer_exit(
        &mut self,
        agent:  AgentId,
        tick:   Tick,
        agents: &mut AgentStore,
        events: &mut EventLog,
    ) -> bool {
        if !agents.is_alive(agent) {
            return false;
        }
        self.manual.remove(&agent);
        self.remove_from_queue(agent, agents);
        events.emit(tick, SimEvent::EmploymentExitDeferred { agent });
        true
    }

    // ── Evaluation ────────────────────────────────────────────────────────

    /// Run one evaluation pass.  Returns the agents that exited, in order.
    pub fn evaluate(
        &mut self,
        tick:   Tick,
        day:    u64,
        agents: &mut AgentStore,
        events: &mut EventLog,
    ) -> Vec<AgentId> {
        let mut exited = Vec::new();

        if self.day != Some(day) {
            self.day = Some(day);
            self.exits_today = 0;
        }

        let manual: Vec<AgentId> = self.manual.iter().copied().collect();
        for agent in manual {
            if self.execute(agent, tick, ExitReason::ManualApprove, agents, events) {
                exited.push(agent);
            }
        }

        let threshold = self.config.max_absent_shifts;
        if threshold > 0 {
            let candidates: Vec<AgentId> = agents
                .alive_ids()
                .filter(|a| agents.employment[a.index()].absent_shifts_7d >= threshold)
                .collect();
            for agent in candidates {
                self.enqueue_exit(agent, tick, agents, events);
            }
        }

        let review = self.config.exit_review_window;
        let overdue: Vec<AgentId> = self
            .pending
            .iter()
            .copied()
            .filter(|a| tick.since(self.enqueued_at(*a).unwrap_or(tick)) >= review)
            .collect();
        for agent in overdue {
            if self.execute(agent, tick, ExitReason::AutoReview, agents, events) {
                exited.push(agent);
            }
        }

        let cap = self.config.daily_exit_cap;
        while let Some(&agent) = self.pending.first() {
            if cap > 0 && self.exits_today >= cap {
                break;
            }
            // `execute` always drops the front entry, so this terminates.
            if self.execute(agent, tick, ExitReason::DailyCap, agents, events) {
                exited.push(agent);
            }
        }

        exited
    }

    fn execute(
        &mut self,
        agent:  AgentId,
        tick:   Tick,
        reason: ExitReason,
        agents: &mut AgentStore,
        events: &mut EventLog,
    ) -> bool {
        self.remove_from_queue(agent, agents);
        self.manual.remove(&agent);
        if !agents.is_alive(agent) {
            return false;
        }
        self.exits_today += 1;
        let job = agents.job[agent.index()];
        agents.remove(agent);
        events.emit(tick, SimEvent::EmploymentExitProcessed {
            agent,
            job: job.is_valid().then_some(job),
            reason,
        });
        debug!(agent = %agent, reason = reason.as_str(), "exit processed");
        true
    }

    // ── Persistence ───────────────────────────────────────────────────────

    pub fn export_state(&self) -> ExitState {
        ExitState {
            pending:     self.pending.clone(),
            enqueued_at: self.enqueued_at.iter().map(|(&a, &t)| (a, t)).collect(),
            manual:      self.manual.iter().copied().collect(),
            exits_today: self.exits_today,
            day:         self.day,
        }
    }

    pub fn import_state(&mut self, state: &ExitState) {
        self.pending = state.pending.clone();
        self.enqueued_at = state.enqueued_at.iter().copied().collect();
        self.manual = state.manual.iter().copied().collect();
        self.exits_today = state.exits_today;
        self.day = state.day;
    }
}
