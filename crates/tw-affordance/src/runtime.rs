//! `TimedActionRuntime`: starts, advances, and tears down timed actions.
//!
//! A running action is bound to exactly one object, and only the object's
//! current reservation holder may start one.  Occupancy on the object table
//! is re-synchronised from the scheduler after every reservation change, so
//! the occupant always equals the holder and, while an action runs, the
//! action's agent.
//!
//! # Lifecycle
//!
//! ```text
//! start ──► running ──advance()──► complete ──► handover
//!   │           │
//!   │           ├─ release(success) ──────────► complete ──► handover
//!   │           ├─ release(failure) ──► fail hooks
//!   │           └─ ghost-step ─────────► fail hooks
//!   └─ not_holder | already_running | missing_spec
//!      | precondition_failed | hook_cancelled
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use tw_agent::{AgentStore, EffectMap, NeedKind, RelationshipOracle};
use tw_core::{ActionReason, AffordanceId, AgentId, EventLog, ObjectId, SimEvent, Tick};
use tw_queue::{ConflictObservation, ConflictReason, FairnessScheduler};

use crate::precondition::first_failing;
use crate::{
    AffordanceError, AffordanceRegistry, AffordanceResult, AffordanceSpec, ContextSnapshot,
    HookPayload, HookRegistry, HookStage, ObjectTable,
};

/// Score deducted per queue position when choosing a handover successor.
const HANDOVER_INDEX_PENALTY: f32 = 0.05;

/// Fixed intensity of handover conflict observations.
const HANDOVER_INTENSITY: f32 = 0.5;

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Debug)]
pub struct RunningAction {
    pub agent:      AgentId,
    pub affordance: AffordanceId,
    pub duration:   u32,
    pub remaining:  u32,
    pub effects:    EffectMap,
}

/// Diagnostics returned alongside an outcome.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct ActionMetadata {
    pub reason:    Option<ActionReason>,
    /// Source of the failing precondition.
    pub condition: Option<String>,
    /// Context the precondition was evaluated against.
    pub context:   Option<ContextSnapshot>,
}

impl ActionMetadata {
    pub fn reason(reason: ActionReason) -> Self {
        Self { reason: Some(reason), ..Self::default() }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct RunningRecord {
    pub object:     ObjectId,
    pub agent:      AgentId,
    pub affordance: AffordanceId,
    pub duration:   u32,
    pub remaining:  u32,
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct RuntimeState {
    pub running:       Vec<RunningRecord>,
    pub last_advanced: Option<Tick>,
}

/// Everything the runtime reads or writes outside its own table.
///
/// Built by the orchestrator from disjoint field borrows of the world.
pub struct AffordanceEnv<'a> {
    pub scheduler:     &'a mut FairnessScheduler,
    pub objects:       &'a mut ObjectTable,
    pub agents:        &'a mut AgentStore,
    pub registry:      &'a AffordanceRegistry,
    pub hooks:         &'a HookRegistry,
    pub relationships: &'a dyn RelationshipOracle,
    pub events:        &'a mut EventLog,
    pub conflicts:     &'a mut Vec<ConflictObservation>,
}

impl AffordanceEnv<'_> {
    /// Copy the scheduler's holder for `object` onto the object table.
    fn sync(&mut self, object: ObjectId) {
        let holder = self.scheduler.active_agent(object);
        self.objects.set_occupant(object, holder);
    }

    fn run_hooks(
        &self,
        spec:   &AffordanceSpec,
        stage:  HookStage,
        tick:   Tick,
        agent:  AgentId,
        object: ObjectId,
        meta:   &ActionMetadata,
    ) -> bool {
        let names = spec.hooks.names(stage);
        if names.is_empty() {
            return true;
        }
        let payload = HookPayload {
            stage,
            tick,
            agent,
            object,
            object_type: spec.object_type,
            affordance:  spec.id,
            effects:     spec.effects.clone(),
            reason:      meta.reason.clone(),
            condition:   meta.condition.clone(),
            context:     meta.context.clone(),
        };
        self.hooks.dispatch(names, &payload)
    }

    fn context(&self, agent: AgentId, object: ObjectId, tick: Tick) -> ContextSnapshot {
        let mut ctx = ContextSnapshot::new().with("world.tick", tick.0 as f64);
        let i = agent.index();
        let known_agent = i < self.agents.count;
        if known_agent {
            let needs = self.agents.needs[i];
            for kind in NeedKind::ALL {
                ctx = ctx.with(format!("agent.{kind}"), needs.get(kind) as f64);
            }
            let record = &self.agents.employment[i];
            ctx = ctx
                .with("agent.wallet", self.agents.wallet[i] as f64)
                .with("agent.on_shift", if record.on_shift { 1.0 } else { 0.0 })
                .with("agent.attendance", record.attendance_ratio as f64);
        }
        if let Some(o) = self.objects.get(object) {
            ctx = ctx
                .with("object.type", o.object_type.0 as f64)
                .with("object.queue_length", self.scheduler.queue_snapshot(object).len() as f64);
            if known_agent {
                let distance = self.agents.position[i].manhattan(o.position);
                ctx = ctx.with("object.distance", distance as f64);
            }
        }
        ctx
    }
}

// ── Successor selection ───────────────────────────────────────────────────────

/// Pick the waiter `departing` would hand over to.
///
/// Each candidate scores `trust + familiarity - rivalry - 0.05 * index`.
/// The best strictly-positive score wins; earlier candidates win ties.
/// `None` means fall back to plain queue order.
pub fn select_successor(
    relationships: &dyn RelationshipOracle,
    departing:     AgentId,
    waiting:       &[AgentId],
) -> Option<AgentId> {
    let mut best: Option<(AgentId, f32)> = None;
    for (index, &candidate) in waiting.iter().enumerate() {
        let score = relationships.tie(departing, candidate).affinity()
            - HANDOVER_INDEX_PENALTY * index as f32;
        match best {
            Some((_, s)) if score <= s => {}
            _ => best = Some((candidate, score)),
        }
    }
    best.filter(|&(_, s)| s > 0.0).map(|(a, _)| a)
}

// ── TimedActionRuntime ────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct TimedActionRuntime {
    running:       BTreeMap<ObjectId, RunningAction>,
    last_advanced: Option<Tick>,
}

impl TimedActionRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Running-action table keyed by object.
    pub fn running(&self) -> &BTreeMap<ObjectId, RunningAction> {
        &self.running
    }

    pub fn running_on(&self, object: ObjectId) -> Option<&RunningAction> {
        self.running.get(&object)
    }

    /// Reserve `object` for `agent` through the scheduler and mirror the
    /// result onto the object table.
    pub fn request(
        &mut self,
        env:    &mut AffordanceEnv<'_>,
        agent:  AgentId,
        object: ObjectId,
        tick:   Tick,
    ) -> bool {
        if !env.agents.is_alive(agent) {
            debug!(agent = %agent, object = %object, "request from agent outside the population");
            return false;
        }
        let granted = env.scheduler.request(object, agent, tick);
        env.sync(object);
        granted
    }

    // ── start ─────────────────────────────────────────────────────────────

    pub fn start(
        &mut self,
        env:        &mut AffordanceEnv<'_>,
        agent:      AgentId,
        object:     ObjectId,
        affordance: AffordanceId,
        tick:       Tick,
    ) -> (bool, ActionMetadata) {
        if !env.agents.is_alive(agent) || env.scheduler.active_agent(object) != Some(agent) {
            return (false, ActionMetadata::reason(ActionReason::NotHolder));
        }
        if self.running.contains_key(&object) {
            return (false, ActionMetadata::reason(ActionReason::AlreadyRunning));
        }

        let registry = env.registry;
        let object_type = env.objects.get(object).map(|o| o.object_type);
        let Some(spec) = object_type.and_then(|t| registry.resolve(affordance, t)) else {
            warn!(
                agent = %agent, object = %object, affordance = %affordance,
                "no affordance spec for this object; releasing reservation"
            );
            env.scheduler.release(object, agent, tick, false);
            env.sync(object);
            env.events.emit(tick, SimEvent::AffordanceFail {
                agent,
                object,
                affordance,
                reason: ActionReason::MissingSpec,
            });
            return (false, ActionMetadata::reason(ActionReason::MissingSpec));
        };

        // ── Preconditions ─────────────────────────────────────────────────
        let ctx = env.context(agent, object, tick);
        if let Some(failed) = first_failing(&spec.preconditions, &ctx) {
            let condition = failed.source().to_string();
            let meta = ActionMetadata {
                reason:    Some(ActionReason::PreconditionFailed),
                condition: Some(condition.clone()),
                context:   Some(ctx),
            };
            env.run_hooks(spec, HookStage::Fail, tick, agent, object, &meta);
            env.events.emit(tick, SimEvent::AffordancePreconditionFail {
                agent,
                object,
                affordance,
                condition,
            });
            env.events.emit(tick, SimEvent::AffordanceFail {
                agent,
                object,
                affordance,
                reason: ActionReason::PreconditionFailed,
            });
            env.scheduler.release(object, agent, tick, false);
            env.sync(object);
            return (false, meta);
        }

        // ── Commit, then let before-hooks veto ────────────────────────────
        let duration = spec.effective_duration();
        self.running.insert(object, RunningAction {
            agent,
            affordance,
            duration,
            remaining: duration,
            effects: spec.effects.clone(),
        });
        env.objects.set_occupant(object, Some(agent));

        if !env.run_hooks(spec, HookStage::Before, tick, agent, object, &ActionMetadata::default()) {
            self.running.remove(&object);
            env.objects.set_occupant(object, None);
            let meta = ActionMetadata::reason(ActionReason::HookCancelled);
            env.run_hooks(spec, HookStage::Fail, tick, agent, object, &meta);
            env.events.emit(tick, SimEvent::AffordanceFail {
                agent,
                object,
                affordance,
                reason: ActionReason::HookCancelled,
            });
            env.scheduler.release(object, agent, tick, false);
            env.sync(object);
            return (false, meta);
        }

        env.events.emit(tick, SimEvent::AffordanceStart { agent, object, affordance, duration });
        debug!(agent = %agent, object = %object, affordance = %affordance, duration, "action started");
        (true, ActionMetadata::default())
    }

    // ── advance ───────────────────────────────────────────────────────────

    /// Count every running action down by one tick and complete those that
    /// reach zero.  A second call with the same `tick` does nothing.
    pub fn advance(&mut self, env: &mut AffordanceEnv<'_>, tick: Tick) {
        if self.last_advanced == Some(tick) {
            return;
        }
        self.last_advanced = Some(tick);

        let mut finished = Vec::new();
        for (&object, action) in self.running.iter_mut() {
            action.remaining = action.remaining.saturating_sub(1);
            if action.remaining == 0 {
                finished.push(object);
            }
        }
        for object in finished {
            if let Some(action) = self.running.remove(&object) {
                self.complete(env, object, action, tick);
            }
        }
    }

    /// Effects, after-hooks, handover, finish event, in that order.  The
    /// action is already out of the table.
    fn complete(
        &mut self,
        env:    &mut AffordanceEnv<'_>,
        object: ObjectId,
        action: RunningAction,
        tick:   Tick,
    ) {
        let agent = action.agent;
        env.agents.apply_effects(agent, &action.effects);
        let waiting = env.scheduler.queue_snapshot(object);

        let registry = env.registry;
        if let Some(spec) = registry.get(action.affordance) {
            env.run_hooks(spec, HookStage::After, tick, agent, object, &ActionMetadata::default());
        }

        if env.scheduler.active_agent(object) == Some(agent) {
            handover(env, agent, object, &waiting, tick);
        } else {
            env.sync(object);
        }

        env.events.emit(tick, SimEvent::AffordanceFinish {
            agent,
            object,
            affordance: action.affordance,
        });
    }

    // ── release ───────────────────────────────────────────────────────────

    /// Explicit early release by `agent`.
    ///
    /// Success completes the action as if it had run out (effects, hooks,
    /// handover).  Failure dispatches fail hooks with `reason`.  The
    /// reservation is released either way.  Returns the affected action kind
    /// (the running one, else `requested`).
    #[allow(clippy::too_many_arguments)]
    pub fn release(
        &mut self,
        env:       &mut AffordanceEnv<'_>,
        agent:     AgentId,
        object:    ObjectId,
        success:   bool,
        reason:    Option<ActionReason>,
        requested: Option<AffordanceId>,
        tick:      Tick,
    ) -> (Option<AffordanceId>, ActionMetadata) {
        let running = match self.running.get(&object) {
            Some(r) if r.agent == agent => self.running.remove(&object),
            _ => None,
        };
        let kind = running.as_ref().map(|r| r.affordance).or(requested);

        if success {
            match running {
                Some(action) => self.complete(env, object, action, tick),
                None if env.scheduler.active_agent(object) == Some(agent) => {
                    let waiting = env.scheduler.queue_snapshot(object);
                    handover(env, agent, object, &waiting, tick);
                }
                None => {}
            }
            return (kind, ActionMetadata::default());
        }

        let reason = reason.unwrap_or_else(|| ActionReason::Other("released".to_string()));
        env.scheduler.release(object, agent, tick, false);
        env.sync(object);
        let meta = ActionMetadata::reason(reason.clone());
        if let Some(action) = running {
            fail_action(env, object, &action, reason, tick);
        }
        (kind, meta)
    }

    // ── Stall handling ────────────────────────────────────────────────────

    /// A waiter reports that `object`'s holder is not making progress.
    ///
    /// Once the scheduler's stall limit is hit the holder's action is torn
    /// down with `ghost_step` and the holder is released unsuccessfully.
    pub fn handle_blocked(&mut self, env: &mut AffordanceEnv<'_>, object: ObjectId, tick: Tick) {
        if !env.scheduler.record_blocked_attempt(object) {
            return;
        }
        let holder = env.scheduler.active_agent(object);
        self.tear_down(env, object, tick);
        if let Some(holder) = holder {
            env.scheduler.release(object, holder, tick, false);
            debug!(object = %object, holder = %holder, "holder ghost-stepped after blocked attempts");
        }
        env.sync(object);
    }

    /// Per-tick sweep over every held object with waiters.
    ///
    /// A holder that trips the stall limit is released unsuccessfully,
    /// requeued at the tail of the same queue, and recorded in a
    /// `ghost_step` conflict against the first waiter.
    pub fn stall_sweep(&mut self, env: &mut AffordanceEnv<'_>, tick: Tick) {
        for (object, holder) in env.scheduler.contested() {
            if !env.scheduler.record_blocked_attempt(object) {
                continue;
            }
            let waiting = env.scheduler.queue_snapshot(object);
            let rival = waiting.first().copied().unwrap_or(holder);

            self.tear_down(env, object, tick);
            env.scheduler.release(object, holder, tick, false);
            env.scheduler.requeue_to_tail(object, holder, tick);
            env.sync(object);

            env.conflicts.push(ConflictObservation {
                tick,
                object,
                actor:        holder,
                rival,
                reason:       ConflictReason::GhostStep,
                queue_length: waiting.len(),
                intensity:    None,
            });
            debug!(object = %object, holder = %holder, rival = %rival, "stalled holder ghost-stepped");
        }
    }

    fn tear_down(&mut self, env: &mut AffordanceEnv<'_>, object: ObjectId, tick: Tick) {
        if let Some(action) = self.running.remove(&object) {
            fail_action(env, object, &action, ActionReason::GhostStep, tick);
        }
    }

    // ── Population changes ────────────────────────────────────────────────

    /// Drop `agent` from the runtime and the scheduler without hooks.
    pub fn remove_agent(&mut self, env: &mut AffordanceEnv<'_>, agent: AgentId, tick: Tick) {
        self.running.retain(|_, a| a.agent != agent);
        env.scheduler.remove_agent(agent, tick);
        let ids: Vec<ObjectId> = env.objects.ids().collect();
        for object in ids {
            env.sync(object);
        }
    }

    // ── Persistence ───────────────────────────────────────────────────────

    pub fn export_state(&self) -> RuntimeState {
        RuntimeState {
            running: self
                .running
                .iter()
                .map(|(&object, a)| RunningRecord {
                    object,
                    agent:      a.agent,
                    affordance: a.affordance,
                    duration:   a.duration,
                    remaining:  a.remaining,
                })
                .collect(),
            last_advanced: self.last_advanced,
        }
    }

    /// Restore running actions; effect maps are re-read from `registry`.
    pub fn import_state(
        &mut self,
        state:    &RuntimeState,
        registry: &AffordanceRegistry,
    ) -> AffordanceResult<()> {
        let mut running = BTreeMap::new();
        for r in &state.running {
            let spec = registry
                .get(r.affordance)
                .ok_or(AffordanceError::UnknownAffordance(r.affordance))?;
            running.insert(r.object, RunningAction {
                agent:      r.agent,
                affordance: r.affordance,
                duration:   r.duration,
                remaining:  r.remaining,
                effects:    spec.effects.clone(),
            });
        }
        self.running = running;
        self.last_advanced = state.last_advanced;
        Ok(())
    }

    /// Re-derive every object's occupant from the scheduler.
    pub fn resync(&self, env: &mut AffordanceEnv<'_>) {
        let ids: Vec<ObjectId> = env.objects.ids().collect();
        for object in ids {
            env.sync(object);
        }
    }
}

// ── Free helpers ──────────────────────────────────────────────────────────────

/// Release `departing` successfully, preferring the best-affinity waiter.
fn handover(
    env:       &mut AffordanceEnv<'_>,
    departing: AgentId,
    object:    ObjectId,
    waiting:   &[AgentId],
    tick:      Tick,
) {
    let preferred = select_successor(env.relationships, departing, waiting);
    if let Some(p) = preferred {
        env.scheduler.promote_agent(object, p);
    }
    env.scheduler.release(object, departing, tick, true);
    env.sync(object);

    if let Some(&first) = waiting.first() {
        env.conflicts.push(ConflictObservation {
            tick,
            object,
            actor:        departing,
            rival:        preferred.unwrap_or(first),
            reason:       ConflictReason::Handover,
            queue_length: waiting.len(),
            intensity:    Some(HANDOVER_INTENSITY),
        });
    }
}

fn fail_action(
    env:    &mut AffordanceEnv<'_>,
    object: ObjectId,
    action: &RunningAction,
    reason: ActionReason,
    tick:   Tick,
) {
    let registry = env.registry;
    if let Some(spec) = registry.get(action.affordance) {
        let meta = ActionMetadata::reason(reason.clone());
        env.run_hooks(spec, HookStage::Fail, tick, action.agent, object, &meta);
    }
    env.events.emit(tick, SimEvent::AffordanceFail {
        agent:      action.agent,
        object,
        affordance: action.affordance,
        reason,
    });
}
