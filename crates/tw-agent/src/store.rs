//! Core agent storage: `AgentStore` (SoA data) and `AgentRngs` (per-agent RNG).
//!
//! RNGs live in their own struct so a decision model can hold
//! `&mut AgentRngs` and `&AgentStore` at the same time.
//!
//! # Removal
//!
//! Agents are never compacted out of the arrays.  Removing an agent clears
//! its `alive` flag and resets its engine-owned state; the `AgentId` stays
//! reserved so every table keyed by it remains valid.

use serde::{Deserialize, Serialize};
use tracing::debug;
use tw_core::{ActionReason, AffordanceId, AgentId, AgentRng, Cell, JobId, TwError, TwResult};

use crate::needs::{DecayRates, EffectMap, EffectTarget, NeedKind, Needs};

// ── AgentRngs ─────────────────────────────────────────────────────────────────

/// Per-agent deterministic RNG state, separated from [`AgentStore`] for the
/// split-borrow pattern.
pub struct AgentRngs {
    pub inner: Vec<AgentRng>,
}

impl AgentRngs {
    pub(crate) fn new(count: usize, global_seed: u64) -> Self {
        let inner = (0..count as u32)
            .map(|i| AgentRng::new(global_seed, AgentId(i)))
            .collect();
        Self { inner }
    }

    #[inline]
    pub fn get_mut(&mut self, agent: AgentId) -> &mut AgentRng {
        &mut self.inner[agent.index()]
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

// ── Per-agent records ─────────────────────────────────────────────────────────

/// Employment counters visible to decision models and telemetry.
///
/// Written only by the shift scheduler and exit queue.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct EmploymentRecord {
    /// Wage-eligible this tick (on time or late but present).
    pub on_shift:         bool,
    /// Lifetime count of shifts that started late.
    pub lateness_counter: u32,
    pub late_ticks_today: u32,
    /// Ticks of wage paid, lifetime.
    pub wages_earned:     u32,
    pub wages_withheld:   f32,
    /// Rolling mean of on-time ticks over scheduled ticks.
    pub attendance_ratio: f32,
    /// Absence events in the trailing seven days.
    pub absent_shifts_7d: u32,
    pub exit_pending:     bool,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ActionKind {
    Request,
    Start,
    Release,
    Move,
    Blocked,
}

/// Result of the last action an agent issued, readable next tick.
#[derive(Clone, PartialEq, Debug)]
pub struct ActionOutcome {
    pub kind:       ActionKind,
    pub success:    bool,
    pub affordance: Option<AffordanceId>,
    pub reason:     Option<ActionReason>,
}

/// Persisted form of one agent's engine-relevant state.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct AgentRecord {
    pub agent:      AgentId,
    pub alive:      bool,
    pub position:   Cell,
    pub job:        Option<JobId>,
    pub needs:      Needs,
    pub wallet:     f32,
    pub employment: EmploymentRecord,
}

// ── AgentStore ────────────────────────────────────────────────────────────────

/// Structure-of-Arrays storage for all agent state.
///
/// Every `Vec` field has exactly `count` elements and the `AgentId` value is
/// the index into all of them.
pub struct AgentStore {
    /// Number of agent slots, alive or not.
    pub count: usize,

    /// `false` once the agent has exited the population.
    pub alive: Vec<bool>,

    // ── World placement ───────────────────────────────────────────────────
    pub position: Vec<Cell>,

    /// Assigned job.  `JobId::INVALID` means "use the roster default".
    pub job: Vec<JobId>,

    // ── Engine-owned state ────────────────────────────────────────────────
    pub needs: Vec<Needs>,

    /// Currency balance.  Never negative.
    pub wallet: Vec<f32>,

    pub employment: Vec<EmploymentRecord>,

    pub last_outcome: Vec<Option<ActionOutcome>>,
}

impl AgentStore {
    pub(crate) fn new(count: usize, needs: Needs, wallet: f32) -> Self {
        Self {
            count,
            alive:        vec![true; count],
            position:     vec![Cell::default(); count],
            job:          vec![JobId::INVALID; count],
            needs:        vec![needs; count],
            wallet:       vec![wallet.max(0.0); count],
            employment:   vec![EmploymentRecord::default(); count],
            last_outcome: vec![None; count],
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// `true` if `agent` is in range and has not exited.
    #[inline]
    pub fn is_alive(&self, agent: AgentId) -> bool {
        self.alive.get(agent.index()).copied().unwrap_or(false)
    }

    /// Ascending ids of agents still in the population.
    pub fn alive_ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        (0..self.count as u32)
            .map(AgentId)
            .filter(|a| self.alive[a.index()])
    }

    pub fn alive_count(&self) -> usize {
        self.alive.iter().filter(|a| **a).count()
    }

    // ── Engine mutations ──────────────────────────────────────────────────

    /// Apply a completed action's effects.  Needs clamp to `[0, 1]`; money
    /// is floored at zero.
    pub fn apply_effects(&mut self, agent: AgentId, effects: &EffectMap) {
        let i = agent.index();
        let (Some(needs), Some(wallet)) = (self.needs.get_mut(i), self.wallet.get_mut(i)) else {
            return;
        };
        for &(target, delta) in effects.iter() {
            match target {
                EffectTarget::Need(kind) => needs.adjust(kind, delta),
                EffectTarget::Money      => *wallet = (*wallet + delta).max(0.0),
            }
        }
    }

    /// Subtract one tick of passive decay from every living agent.
    pub fn apply_decay(&mut self, rates: &DecayRates) {
        for i in 0..self.count {
            if !self.alive[i] {
                continue;
            }
            for kind in NeedKind::ALL {
                let rate = rates.rate(kind);
                if rate > 0.0 {
                    self.needs[i].adjust(kind, -rate);
                }
            }
        }
    }

    /// Deduct `amount` from the wallet, flooring at zero.
    #[inline]
    pub fn charge(&mut self, agent: AgentId, amount: f32) {
        if let Some(w) = self.wallet.get_mut(agent.index()) {
            *w = (*w - amount).max(0.0);
        }
    }

    #[inline]
    pub fn credit(&mut self, agent: AgentId, amount: f32) {
        if let Some(w) = self.wallet.get_mut(agent.index()) {
            *w += amount;
        }
    }

    pub fn record_outcome(&mut self, agent: AgentId, outcome: ActionOutcome) {
        if let Some(slot) = self.last_outcome.get_mut(agent.index()) {
            *slot = Some(outcome);
        }
    }

    /// Mark `agent` as exited.  Engine-owned state is reset; the slot stays
    /// reserved.
    pub fn remove(&mut self, agent: AgentId) {
        let i = agent.index();
        if i >= self.count || !self.alive[i] {
            return;
        }
        self.alive[i] = false;
        self.employment[i] = EmploymentRecord::default();
        self.last_outcome[i] = None;
        debug!(agent = %agent, "agent removed from population");
    }

    // ── Persistence ───────────────────────────────────────────────────────

    pub fn export_records(&self) -> Vec<AgentRecord> {
        (0..self.count)
            .map(|i| AgentRecord {
                agent:      AgentId(i as u32),
                alive:      self.alive[i],
                position:   self.position[i],
                job:        self.job[i].is_valid().then_some(self.job[i]),
                needs:      self.needs[i],
                wallet:     self.wallet[i],
                employment: self.employment[i].clone(),
            })
            .collect()
    }

    /// Overwrite state from persisted records.  The record set must cover
    /// exactly this store's agent slots.
    pub fn import_records(&mut self, records: &[AgentRecord]) -> TwResult<()> {
        if records.len() != self.count {
            return Err(TwError::Config(format!(
                "agent record count {} does not match store size {}",
                records.len(),
                self.count
            )));
        }
        let mut seen = vec![false; self.count];
        for r in records {
            let i = r.agent.index();
            if i >= self.count {
                return Err(TwError::AgentNotFound(r.agent));
            }
            if std::mem::replace(&mut seen[i], true) {
                return Err(TwError::Config(format!("duplicate agent record for {}", r.agent)));
            }
        }
        for r in records {
            let i = r.agent.index();
            self.alive[i]        = r.alive;
            self.position[i]     = r.position;
            self.job[i]          = r.job.unwrap_or(JobId::INVALID);
            self.needs[i]        = r.needs;
            self.wallet[i]       = r.wallet;
            self.employment[i]   = r.employment.clone();
            self.last_outcome[i] = None;
        }
        Ok(())
    }
}
