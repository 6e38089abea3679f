//! `World`: every engine table in one place, and the fixed per-tick phase
//! order that mutates them.

use std::collections::BTreeMap;

use tracing::{debug, trace};
use tw_affordance::{
    ActionMetadata, AffordanceEnv, AffordanceRegistry, HookRegistry, ObjectTable, RunningAction,
    TimedActionRuntime,
};
use tw_agent::{ActionKind, ActionOutcome, AgentStore, DecayRates, RelationshipLedger};
use tw_core::{ActionReason, AffordanceId, AgentId, EventLog, ObjectId, SimClock, Tick};
use tw_employment::{ExitQueue, ExitSummary, JobRoster, ShiftEnv, ShiftScheduler};
use tw_queue::{ConflictObservation, FairnessScheduler};

use crate::{apply_conflict, AgentAction, RivalryConfig};

/// All mutable engine state.
///
/// Object occupancy and queue contents are written only through the
/// scheduler and the action runtime; shift contexts only through the shift
/// scheduler.  Build one with [`SimBuilder`][crate::SimBuilder].
pub struct World {
    pub agents:        AgentStore,
    pub objects:       ObjectTable,
    pub scheduler:     FairnessScheduler,
    pub runtime:       TimedActionRuntime,
    pub registry:      AffordanceRegistry,
    pub hooks:         HookRegistry,
    pub relationships: RelationshipLedger,
    pub roster:        JobRoster,
    pub shifts:        ShiftScheduler,
    pub exits:         ExitQueue,
    pub rivalry:       RivalryConfig,
    pub need_decay:    DecayRates,

    /// Events emitted since the last drain.
    pub events: EventLog,

    /// Conflicts observed this tick, applied to the ledger at tick end.
    pub(crate) conflicts: Vec<ConflictObservation>,
}

impl World {
    /// Split the world into the runtime and the environment it acts on.
    pub(crate) fn affordance_parts(&mut self) -> (&mut TimedActionRuntime, AffordanceEnv<'_>) {
        let World {
            runtime, scheduler, objects, agents, registry, hooks, relationships, events,
            conflicts, ..
        } = self;
        let env = AffordanceEnv {
            scheduler,
            objects,
            agents,
            registry:      &*registry,
            hooks:         &*hooks,
            relationships: &*relationships,
            events,
            conflicts,
        };
        (runtime, env)
    }

    // ── Resource operations ───────────────────────────────────────────────

    /// Reserve `object` for `agent`, or queue it.  `true` if `agent` holds
    /// the object afterwards.
    pub fn request(&mut self, agent: AgentId, object: ObjectId, tick: Tick) -> bool {
        let (runtime, mut env) = self.affordance_parts();
        runtime.request(&mut env, agent, object, tick)
    }

    pub fn start(
        &mut self,
        agent:      AgentId,
        object:     ObjectId,
        affordance: AffordanceId,
        tick:       Tick,
    ) -> (bool, ActionMetadata) {
        let (runtime, mut env) = self.affordance_parts();
        runtime.start(&mut env, agent, object, affordance, tick)
    }

    pub fn release(
        &mut self,
        agent:      AgentId,
        object:     ObjectId,
        success:    bool,
        reason:     Option<ActionReason>,
        affordance: Option<AffordanceId>,
        tick:       Tick,
    ) -> (Option<AffordanceId>, ActionMetadata) {
        let (runtime, mut env) = self.affordance_parts();
        runtime.release(&mut env, agent, object, success, reason, affordance, tick)
    }

    pub fn handle_blocked(&mut self, object: ObjectId, tick: Tick) {
        let (runtime, mut env) = self.affordance_parts();
        runtime.handle_blocked(&mut env, object, tick);
    }

    /// Evict `object`'s holder from outside the tick loop, failing any
    /// running action with `reason`.  Returns the evicted agent.
    pub fn force_release(&mut self, object: ObjectId, reason: ActionReason, tick: Tick) -> Option<AgentId> {
        let holder = self.scheduler.active_agent(object)?;
        self.release(holder, object, false, Some(reason), None, tick);
        debug!(object = %object, holder = %holder, "holder force-released");
        Some(holder)
    }

    // ── Exit requests ─────────────────────────────────────────────────────

    /// Flag `agent` to leave at the next exit evaluation.
    pub fn request_manual_exit(&mut self, agent: AgentId, tick: Tick) -> bool {
        self.exits.request_manual_exit(agent, tick, &self.agents, &mut self.events)
    }

    /// Withdraw a pending or manual exit for `agent`.
    pub fn defer_exit(&mut self, agent: AgentId, tick: Tick) -> bool {
        self.exits.defer_exit(agent, tick, &mut self.agents, &mut self.events)
    }

    /// Clear `agent` from every table after it left the population.
    pub fn remove_agent(&mut self, agent: AgentId, tick: Tick) {
        self.agents.remove(agent);
        let (runtime, mut env) = self.affordance_parts();
        runtime.remove_agent(&mut env, agent, tick);
        self.shifts.remove_agent(agent);
        self.exits.remove_from_queue(agent, &mut self.agents);
    }

    // ── Snapshots ─────────────────────────────────────────────────────────

    pub fn active_reservations(&self) -> BTreeMap<ObjectId, AgentId> {
        self.scheduler.active_reservations()
    }

    pub fn queue_snapshot(&self, object: ObjectId) -> Vec<AgentId> {
        self.scheduler.queue_snapshot(object)
    }

    pub fn running(&self) -> &BTreeMap<ObjectId, RunningAction> {
        self.runtime.running()
    }

    pub fn exit_summary(&self) -> ExitSummary {
        self.exits.summary()
    }

    // ── Actions ───────────────────────────────────────────────────────────

    /// Apply one agent action and record its outcome on the agent.
    ///
    /// Returns `None` for idle actions and for agents no longer alive.
    pub fn apply_action(&mut self, agent: AgentId, action: &AgentAction, tick: Tick) -> Option<ActionOutcome> {
        if !self.agents.is_alive(agent) {
            return None;
        }
        let outcome = match action {
            AgentAction::Idle => return None,
            &AgentAction::Request { object, blocked } => {
                let granted = self.request(agent, object, tick);
                if !granted && blocked {
                    self.handle_blocked(object, tick);
                }
                outcome(ActionKind::Request, granted, None, None)
            }
            &AgentAction::Start { object, affordance } => {
                let (started, meta) = self.start(agent, object, affordance, tick);
                outcome(ActionKind::Start, started, Some(affordance), meta.reason)
            }
            AgentAction::Release { object, success, reason, affordance } => {
                let reason = reason.clone().map(ActionReason::Other);
                let (kind, meta) = self.release(agent, *object, *success, reason, *affordance, tick);
                outcome(ActionKind::Release, *success, kind, meta.reason)
            }
            &AgentAction::Move { to } => {
                self.agents.position[agent.index()] = to;
                outcome(ActionKind::Move, true, None, None)
            }
            &AgentAction::Blocked { object } => {
                self.handle_blocked(object, tick);
                outcome(ActionKind::Blocked, true, None, None)
            }
        };
        self.agents.record_outcome(agent, outcome.clone());
        Some(outcome)
    }

    // ── Tick ──────────────────────────────────────────────────────────────

    /// Run one tick over `actions`, which must be in ascending agent order.
    /// Returns the number of actions applied.
    pub fn step(&mut self, tick: Tick, clock: &SimClock, actions: &[(AgentId, AgentAction)]) -> usize {
        // ── Phase 1: cooldown expiry ──────────────────────────────────────
        self.scheduler.on_tick(tick);

        // ── Phase 2: agent actions ────────────────────────────────────────
        let applied = actions
            .iter()
            .filter_map(|(agent, action)| self.apply_action(*agent, action, tick))
            .count();

        // ── Phase 3: stall sweep ──────────────────────────────────────────
        // ── Phase 4: affordance advance ───────────────────────────────────
        {
            let (runtime, mut env) = self.affordance_parts();
            runtime.stall_sweep(&mut env, tick);
            runtime.advance(&mut env, tick);
        }

        // ── Phase 5: need decay ───────────────────────────────────────────
        self.agents.apply_decay(&self.need_decay);

        // ── Phase 6: shifts ───────────────────────────────────────────────
        {
            let mut env = ShiftEnv {
                agents: &mut self.agents,
                roster: &self.roster,
                ledger: &mut self.relationships,
                events: &mut self.events,
            };
            self.shifts.step(tick, clock, &mut env);
        }

        // ── Phase 7: exits ────────────────────────────────────────────────
        let exited = self.exits.evaluate(tick, clock.day_of(tick), &mut self.agents, &mut self.events);
        for &agent in &exited {
            self.remove_agent(agent, tick);
        }

        // ── Phase 8: conflicts → relationships ────────────────────────────
        for observation in std::mem::take(&mut self.conflicts) {
            apply_conflict(&self.rivalry, &observation, &mut self.relationships, &mut self.events);
        }

        trace!(
            tick     = tick.0,
            applied,
            running  = self.runtime.running().len(),
            exited   = exited.len(),
            events   = self.events.len(),
            "tick processed"
        );
        applied
    }
}

fn outcome(
    kind:       ActionKind,
    success:    bool,
    affordance: Option<AffordanceId>,
    reason:     Option<ActionReason>,
) -> ActionOutcome {
    ActionOutcome { kind, success, affordance, reason }
}
