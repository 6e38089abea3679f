//! Whole-world persistence.
//!
//! [`WorldState`] gathers every table's persisted form.  All lists come out
//! in ascending id order, so `export → import → export` yields byte-identical
//! JSON.  Object occupancy is not stored; it is re-derived from the
//! reservations on import.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use tw_affordance::{RuntimeState, TimedActionRuntime};
use tw_agent::{AgentRecord, TieRecord};
use tw_core::{AgentId, ObjectId, Tick};
use tw_employment::{ExitState, ShiftRecord};
use tw_queue::{FairnessScheduler, QueueState};

use crate::{SimError, SimResult, World};

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct WorldState {
    /// Next tick to process.
    pub tick:          Tick,
    pub queue:         QueueState,
    pub running:       RuntimeState,
    pub agents:        Vec<AgentRecord>,
    pub relationships: Vec<TieRecord>,
    pub shifts:        Vec<ShiftRecord>,
    pub exits:         ExitState,
}

impl WorldState {
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl World {
    pub fn export_state(&self, tick: Tick) -> WorldState {
        WorldState {
            tick,
            queue:         self.scheduler.export_state(),
            running:       self.runtime.export_state(),
            agents:        self.agents.export_records(),
            relationships: self.relationships.export_records(),
            shifts:        self.shifts.export_records(),
            exits:         self.exits.export_state(),
        }
    }

    /// Replace the world's dynamic state with `state`.
    ///
    /// Either every table is replaced or, on error, none is.  Static tables
    /// (objects, registry, hooks, roster, configuration) are kept.
    pub fn import_state(&mut self, state: &WorldState) -> SimResult<()> {
        let mut scheduler = FairnessScheduler::new(self.scheduler.config().clone())?;
        scheduler.import_state(&state.queue)?;

        let mut runtime = TimedActionRuntime::new();
        runtime.import_state(&state.running, &self.registry)?;

        let count = self.agents.count;
        if state.agents.len() != count {
            return Err(SimError::AgentCountMismatch {
                expected: count,
                got:      state.agents.len(),
                what:     "agent records",
            });
        }
        if let Some(r) = state.agents.iter().find(|r| r.agent.index() >= count) {
            return Err(SimError::Config(format!("agent record for unknown agent {}", r.agent)));
        }
        let holders: BTreeMap<ObjectId, AgentId> =
            state.queue.reservations.iter().map(|r| (r.object, r.agent)).collect();
        for r in &state.running.running {
            if self.objects.get(r.object).is_none() {
                warn!(object = %r.object, "running action on unknown object");
                return Err(SimError::Config(format!("running action on unknown object {}", r.object)));
            }
            if holders.get(&r.object) != Some(&r.agent) {
                warn!(object = %r.object, agent = %r.agent, "running action without a matching reservation");
                return Err(SimError::Config(format!(
                    "running action on {} by {} does not match the reservation holder",
                    r.object, r.agent
                )));
            }
        }

        self.agents.import_records(&state.agents)?;
        self.scheduler = scheduler;
        self.runtime = runtime;
        self.relationships.import_records(&state.relationships);
        self.shifts.import_records(&state.shifts);
        self.exits.import_state(&state.exits);
        self.conflicts.clear();

        let (runtime, mut env) = self.affordance_parts();
        runtime.resync(&mut env);
        debug!(tick = state.tick.0, running = state.running.running.len(), "world state imported");
        Ok(())
    }
}
