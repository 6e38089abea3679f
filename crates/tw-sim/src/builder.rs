//! Fluent builder for constructing a [`Sim`].

use tracing::info;
use tw_affordance::{AffordanceRegistry, HookRegistry, ObjectTable, TimedActionRuntime};
use tw_agent::{AgentRngs, AgentStore, RelationshipLedger};
use tw_core::EventLog;
use tw_employment::{ExitQueue, JobRoster, ShiftScheduler};
use tw_queue::FairnessScheduler;

use crate::{DecisionModel, EngineConfig, Sim, SimError, SimResult, World};

/// Fluent builder for [`Sim<M>`].
///
/// # Required inputs
///
/// - [`EngineConfig`]: run length, queue, employment, and rivalry tuning
/// - [`AgentStore`] + [`AgentRngs`]: from [`tw_agent::AgentStoreBuilder`]
/// - `M: DecisionModel`: the decision implementation
///
/// # Optional inputs (have defaults)
///
/// | Method               | Default                                  |
/// |----------------------|------------------------------------------|
/// | `.objects(t)`        | Empty `ObjectTable`                      |
/// | `.registry(r)`       | Empty `AffordanceRegistry`               |
/// | `.hooks(h)`          | Empty `HookRegistry`                     |
/// | `.roster(r)`         | Empty `JobRoster` (nobody works)         |
/// | `.relationships(l)`  | Empty `RelationshipLedger`               |
///
/// Agents without a job are assigned one round-robin from the roster.
///
/// # Example
///
/// ```rust,ignore
/// let (store, rngs) = AgentStoreBuilder::new(n, seed).build();
/// let mut sim = SimBuilder::new(config, store, rngs, IdleModel)
///     .objects(objects)
///     .registry(load_manifest_csv(path)?)
///     .roster(load_roster_csv(roster_path)?)
///     .build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder<M: DecisionModel> {
    config:        EngineConfig,
    agents:        AgentStore,
    rngs:          AgentRngs,
    model:         M,
    objects:       Option<ObjectTable>,
    registry:      Option<AffordanceRegistry>,
    hooks:         Option<HookRegistry>,
    roster:        Option<JobRoster>,
    relationships: Option<RelationshipLedger>,
}

impl<M: DecisionModel> SimBuilder<M> {
    /// Create a builder with all required inputs.
    pub fn new(config: EngineConfig, agents: AgentStore, rngs: AgentRngs, model: M) -> Self {
        Self {
            config,
            agents,
            rngs,
            model,
            objects:       None,
            registry:      None,
            hooks:         None,
            roster:        None,
            relationships: None,
        }
    }

    pub fn objects(mut self, objects: ObjectTable) -> Self {
        self.objects = Some(objects);
        self
    }

    /// Affordance specs.  Every spec must target an object type present in
    /// the object table.
    pub fn registry(mut self, registry: AffordanceRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Hook handlers.  Every hook a spec names must be registered here for
    /// the matching stage.
    pub fn hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn roster(mut self, roster: JobRoster) -> Self {
        self.roster = Some(roster);
        self
    }

    /// Seed relationships used for handover scoring.
    pub fn relationships(mut self, relationships: RelationshipLedger) -> Self {
        self.relationships = Some(relationships);
        self
    }

    /// Validate every input and return a ready-to-run [`Sim`].
    pub fn build(self) -> SimResult<Sim<M>> {
        let agent_count = self.agents.count;

        // ── Validate ──────────────────────────────────────────────────────
        self.config.validate()?;

        if self.rngs.len() != agent_count {
            return Err(SimError::AgentCountMismatch {
                expected: agent_count,
                got:      self.rngs.len(),
                what:     "agent RNGs",
            });
        }

        let objects = self.objects.unwrap_or_default();
        let registry = self.registry.unwrap_or_default();
        let hooks = self.hooks.unwrap_or_default();
        let roster = self.roster.unwrap_or_default();

        registry.validate(&objects, &hooks)?;
        roster.validate(self.config.sim.ticks_per_day)?;

        // ── Assemble ──────────────────────────────────────────────────────
        let mut agents = self.agents;
        roster.assign_round_robin(&mut agents);

        let scheduler = FairnessScheduler::new(self.config.queue.clone())?;
        let shifts = ShiftScheduler::new(self.config.employment.clone())?;
        let exits = ExitQueue::new(self.config.employment.clone());

        info!(
            agents      = agent_count,
            objects     = objects.len(),
            affordances = registry.len(),
            jobs        = roster.len(),
            "simulation built"
        );

        let world = World {
            agents,
            objects,
            scheduler,
            runtime:       TimedActionRuntime::new(),
            registry,
            hooks,
            relationships: self.relationships.unwrap_or_default(),
            roster,
            shifts,
            exits,
            rivalry:       self.config.rivalry.clone(),
            need_decay:    self.config.need_decay.clone(),
            events:        EventLog::new(),
            conflicts:     Vec::new(),
        };

        Ok(Sim {
            clock: self.config.sim.make_clock(),
            config: self.config,
            world,
            rngs: self.rngs,
            model: self.model,
        })
    }
}
