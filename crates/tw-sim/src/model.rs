//! The `DecisionModel` trait: where agents choose their next action.

use std::collections::BTreeMap;

use tw_core::{AgentId, AgentRng, SimClock, Tick};

use crate::{AgentAction, World};

/// Read-only view handed to a decision model.
pub struct DecisionContext<'a> {
    pub tick:  Tick,
    /// Maps `tick` onto the day cycle job windows are written in.
    pub clock: &'a SimClock,
    pub world: &'a World,
}

/// Pluggable agent decision logic.
///
/// Called once per alive agent per tick, in ascending `AgentId` order, before
/// any action is applied.  The engine itself never consults randomness;
/// models that do must draw from the supplied per-agent [`AgentRng`] so runs
/// stay reproducible.
///
/// The outcome of the previous tick's action is available as
/// `ctx.world.agents.last_outcome[agent.index()]`.
pub trait DecisionModel: Send + Sync + 'static {
    fn decide(
        &self,
        agent: AgentId,
        ctx:   &DecisionContext<'_>,
        rng:   &mut AgentRng,
    ) -> AgentAction;
}

/// A model under which nobody ever does anything.
pub struct IdleModel;

impl DecisionModel for IdleModel {
    fn decide(&self, _: AgentId, _: &DecisionContext<'_>, _: &mut AgentRng) -> AgentAction {
        AgentAction::Idle
    }
}

/// Replays a fixed timetable of actions.  Unlisted `(tick, agent)` pairs idle.
#[derive(Clone, Debug, Default)]
pub struct ScriptedModel {
    script: BTreeMap<(Tick, AgentId), AgentAction>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `action` for `agent` at `tick`, replacing any earlier entry.
    pub fn at(mut self, tick: u64, agent: AgentId, action: AgentAction) -> Self {
        self.script.insert((Tick(tick), agent), action);
        self
    }

    pub fn len(&self) -> usize {
        self.script.len()
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }
}

impl DecisionModel for ScriptedModel {
    fn decide(&self, agent: AgentId, ctx: &DecisionContext<'_>, _: &mut AgentRng) -> AgentAction {
        self.script.get(&(ctx.tick, agent)).cloned().unwrap_or_default()
    }
}
