//! The `Sim` struct and its tick loop.

use tw_agent::AgentRngs;
use tw_core::{AgentId, SimClock, Tick};

use crate::{
    AgentAction, DecisionContext, DecisionModel, EngineConfig, SimObserver, SimResult, World,
    WorldState,
};

/// The tick orchestrator.
///
/// Each tick has two halves:
///
/// 1. **Decide**: [`DecisionModel::decide`] for every alive agent in
///    ascending `AgentId` order, against a read-only view of the world.
/// 2. **Apply**: [`World::step`] runs the fixed phase order (cooldown
///    expiry, actions, stall sweep, affordance advance, need decay, shifts,
///    exits, conflicts) and the drained events go to the observer.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim<M: DecisionModel> {
    pub config: EngineConfig,

    /// Tracks the current tick and the day cycle.
    pub clock: SimClock,

    pub world: World,

    /// Per-agent deterministic RNGs, kept apart from `world` so decisions can
    /// borrow both.
    pub rngs: AgentRngs,

    pub model: M,
}

impl<M: DecisionModel> Sim<M> {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run the simulation from the current tick to the configured end.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        loop {
            let now = self.clock.current_tick;
            if now >= self.config.sim.end_tick() {
                break;
            }
            self.tick_once(now, observer)?;
        }
        observer.on_sim_end(self.clock.current_tick);
        Ok(())
    }

    /// Run exactly `n` ticks from the current position (ignores the end tick).
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            let now = self.clock.current_tick;
            self.tick_once(now, observer)?;
        }
        Ok(())
    }

    pub fn export_state(&self) -> WorldState {
        self.world.export_state(self.clock.current_tick)
    }

    /// Restore `state` and move the clock to its tick.
    pub fn import_state(&mut self, state: &WorldState) -> SimResult<()> {
        self.world.import_state(state)?;
        self.clock.current_tick = state.tick;
        Ok(())
    }

    // ── Core tick processing ──────────────────────────────────────────────

    fn tick_once<O: SimObserver>(&mut self, now: Tick, observer: &mut O) -> SimResult<()> {
        observer.on_tick_start(now);
        let applied = self.process_tick(now)?;
        for (tick, event) in self.world.events.drain() {
            observer.on_event(tick, &event);
        }
        observer.on_tick_end(now, applied, &self.world);
        self.clock.advance();
        Ok(())
    }

    fn process_tick(&mut self, now: Tick) -> SimResult<usize> {
        // ── Decide ────────────────────────────────────────────────────────
        //
        // Decisions see the world as it stood at the end of the previous
        // tick; nothing is applied until every agent has chosen.
        let actions = self.collect_actions(now);

        // ── Apply ─────────────────────────────────────────────────────────
        Ok(self.world.step(now, &self.clock, &actions))
    }

    fn collect_actions(&mut self, now: Tick) -> Vec<(AgentId, AgentAction)> {
        let ctx = DecisionContext { tick: now, clock: &self.clock, world: &self.world };
        let alive: Vec<AgentId> = self.world.agents.alive_ids().collect();
        alive
            .into_iter()
            .filter_map(|agent| {
                let action = self.model.decide(agent, &ctx, self.rngs.get_mut(agent));
                (!action.is_idle()).then_some((agent, action))
            })
            .collect()
    }
}
