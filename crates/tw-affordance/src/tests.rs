//! Unit tests for tw-affordance.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tw_agent::{AgentStore, AgentStoreBuilder, NeedKind, Needs, RelationshipLedger, Tie};
use tw_core::{ActionReason, AffordanceId, AgentId, Cell, EventLog, ObjectId, ObjectTypeId, SimEvent, Tick};
use tw_queue::{ConflictObservation, ConflictReason, FairnessScheduler, QueueConfig};

use crate::{
    load_manifest_reader, AffordanceEnv, AffordanceRegistry, HookPayload, HookRegistry, HookStage,
    InteractiveObject, ObjectTable, TimedActionRuntime,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

const STOVE: ObjectId = ObjectId(0);
const SHOWER: ObjectId = ObjectId(1);

const EAT: AffordanceId = AffordanceId(0);
const WASH: AffordanceId = AffordanceId(1);
const NAP: AffordanceId = AffordanceId(2);

const MANIFEST: &str = "\
affordance_id,name,object_type,duration,effects,preconditions,before,after,fail
0,eat_meal,1,3,hunger:0.5;money:-2,agent.wallet >= 2,,count_after,record_fail
1,shower,2,2,hygiene:0.6,,veto,count_after,record_fail
2,nap,1,0,energy:0.3,,,,
";

fn a(n: u32) -> AgentId {
    AgentId(n)
}

/// Everything a runtime needs, owned in one place.
struct Rig {
    runtime:   TimedActionRuntime,
    scheduler: FairnessScheduler,
    objects:   ObjectTable,
    agents:    AgentStore,
    registry:  AffordanceRegistry,
    hooks:     HookRegistry,
    ledger:    RelationshipLedger,
    events:    EventLog,
    conflicts: Vec<ConflictObservation>,
    failures:  Arc<Mutex<Vec<HookPayload>>>,
    afters:    Arc<Mutex<u32>>,
    allow:     Arc<AtomicBool>,
}

impl Rig {
    fn new() -> Self {
        let scheduler = FairnessScheduler::new(QueueConfig {
            cooldown_ticks:      10,
            ghost_step_after:    3,
            age_priority_weight: 0.0,
        })
        .unwrap();

        let mut objects = ObjectTable::new();
        objects.add(InteractiveObject::new(STOVE, ObjectTypeId(1), Cell::new(0, 0))).unwrap();
        objects.add(InteractiveObject::new(SHOWER, ObjectTypeId(2), Cell::new(3, 4))).unwrap();

        let (agents, _) = AgentStoreBuilder::new(4, 7)
            .initial_needs(Needs::uniform(0.2))
            .initial_wallet(10.0)
            .build();

        let failures = Arc::new(Mutex::new(Vec::new()));
        let afters = Arc::new(Mutex::new(0));
        let allow = Arc::new(AtomicBool::new(true));

        let mut hooks = HookRegistry::new();
        let f = Arc::clone(&failures);
        hooks.register(HookStage::Fail, "record_fail", move |p: &HookPayload| {
            f.lock().unwrap().push(p.clone());
            true
        });
        let c = Arc::clone(&afters);
        hooks.register(HookStage::After, "count_after", move |_: &HookPayload| {
            *c.lock().unwrap() += 1;
            true
        });
        let gate = Arc::clone(&allow);
        hooks.register(HookStage::Before, "veto", move |_: &HookPayload| gate.load(Ordering::SeqCst));

        let registry = load_manifest_reader(MANIFEST.as_bytes()).unwrap();
        registry.validate(&objects, &hooks).unwrap();

        Self {
            runtime: TimedActionRuntime::new(),
            scheduler,
            objects,
            agents,
            registry,
            hooks,
            ledger: RelationshipLedger::new(),
            events: EventLog::new(),
            conflicts: Vec::new(),
            failures,
            afters,
            allow,
        }
    }

    fn split(&mut self) -> (&mut TimedActionRuntime, AffordanceEnv<'_>) {
        let Rig {
            runtime, scheduler, objects, agents, registry, hooks, ledger, events, conflicts, ..
        } = self;
        let env = AffordanceEnv {
            scheduler,
            objects,
            agents,
            registry:      &*registry,
            hooks:         &*hooks,
            relationships: &*ledger,
            events,
            conflicts,
        };
        (runtime, env)
    }

    fn request(&mut self, agent: AgentId, object: ObjectId, tick: u64) -> bool {
        let (rt, mut env) = self.split();
        rt.request(&mut env, agent, object, Tick(tick))
    }

    fn start(&mut self, agent: AgentId, object: ObjectId, aff: AffordanceId, tick: u64) -> (bool, crate::ActionMetadata) {
        let (rt, mut env) = self.split();
        rt.start(&mut env, agent, object, aff, Tick(tick))
    }

    fn advance(&mut self, tick: u64) {
        let (rt, mut env) = self.split();
        rt.advance(&mut env, Tick(tick));
    }

    fn occupant(&self, object: ObjectId) -> Option<AgentId> {
        self.objects.get(object).unwrap().occupied_by()
    }

    fn hunger(&self, agent: AgentId) -> f32 {
        self.agents.needs[agent.index()].get(NeedKind::Hunger)
    }
}

// ── Start ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod start {
    use super::*;

    #[test]
    fn non_holder_is_rejected_silently() {
        let mut rig = Rig::new();
        let (ok, meta) = rig.start(a(0), STOVE, EAT, 0);
        assert!(!ok);
        assert_eq!(meta.reason, Some(ActionReason::NotHolder));
        assert!(rig.events.is_empty());
    }

    #[test]
    fn holder_starts_and_reports_duration() {
        let mut rig = Rig::new();
        assert!(rig.request(a(0), STOVE, 0));
        assert_eq!(rig.occupant(STOVE), Some(a(0)));

        let (ok, _) = rig.start(a(0), STOVE, EAT, 0);
        assert!(ok);
        assert_eq!(rig.runtime.running_on(STOVE).unwrap().remaining, 3);
        assert!(matches!(
            rig.events.iter().last(),
            Some((_, SimEvent::AffordanceStart { duration: 3, .. }))
        ));
    }

    #[test]
    fn second_start_is_already_running() {
        let mut rig = Rig::new();
        rig.request(a(0), STOVE, 0);
        rig.start(a(0), STOVE, EAT, 0);
        let (ok, meta) = rig.start(a(0), STOVE, NAP, 1);
        assert!(!ok);
        assert_eq!(meta.reason, Some(ActionReason::AlreadyRunning));
        assert_eq!(rig.runtime.running_on(STOVE).unwrap().affordance, EAT);
    }

    #[test]
    fn wrong_object_type_releases_with_missing_spec() {
        let mut rig = Rig::new();
        rig.request(a(0), STOVE, 0);
        rig.request(a(1), STOVE, 0);

        let (ok, meta) = rig.start(a(0), STOVE, WASH, 1);
        assert!(!ok);
        assert_eq!(meta.reason, Some(ActionReason::MissingSpec));
        assert_eq!(rig.scheduler.active_agent(STOVE), Some(a(1)));
        assert_eq!(rig.occupant(STOVE), Some(a(1)));
        assert!(matches!(
            rig.events.iter().last(),
            Some((_, SimEvent::AffordanceFail { reason: ActionReason::MissingSpec, .. }))
        ));
    }

    #[test]
    fn zero_duration_finishes_after_one_tick() {
        let mut rig = Rig::new();
        rig.request(a(0), STOVE, 0);
        rig.start(a(0), STOVE, NAP, 0);
        assert_eq!(rig.runtime.running_on(STOVE).unwrap().duration, 1);
        rig.advance(1);
        assert!(rig.runtime.running().is_empty());
        assert!((rig.agents.needs[0].get(NeedKind::Energy) - 0.5).abs() < 1e-6);
    }
}

// ── Preconditions ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod preconditions {
    use super::*;

    #[test]
    fn failure_carries_condition_and_context() {
        let mut rig = Rig::new();
        rig.agents.wallet[0] = 1.0;
        rig.request(a(0), STOVE, 0);
        rig.request(a(1), STOVE, 0);

        let (ok, meta) = rig.start(a(0), STOVE, EAT, 2);
        assert!(!ok);
        assert_eq!(meta.reason, Some(ActionReason::PreconditionFailed));
        assert_eq!(meta.condition.as_deref(), Some("agent.wallet >= 2"));
        let ctx = meta.context.unwrap();
        assert_eq!(ctx.get("agent.wallet"), Some(1.0));
        assert_eq!(ctx.get("object.queue_length"), Some(1.0));
        assert_eq!(ctx.get("world.tick"), Some(2.0));

        assert_eq!(rig.events.names(), vec![
            "affordance_precondition_fail",
            "affordance_fail",
        ]);
        let failures = rig.failures.lock().unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].condition.as_deref(), Some("agent.wallet >= 2"));
        assert_eq!(failures[0].reason, Some(ActionReason::PreconditionFailed));
    }

    #[test]
    fn failure_releases_reservation_without_cooldown() {
        let mut rig = Rig::new();
        rig.agents.wallet[0] = 0.0;
        rig.request(a(0), STOVE, 0);
        rig.start(a(0), STOVE, EAT, 0);

        assert_eq!(rig.scheduler.active_agent(STOVE), None);
        assert_eq!(rig.occupant(STOVE), None);
        assert!(rig.request(a(0), STOVE, 1));
    }
}

// ── Hooks ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod hooks {
    use super::*;

    #[test]
    fn before_hook_veto_cancels_start() {
        let mut rig = Rig::new();
        rig.allow.store(false, Ordering::SeqCst);
        rig.request(a(2), SHOWER, 0);

        let (ok, meta) = rig.start(a(2), SHOWER, WASH, 0);
        assert!(!ok);
        assert_eq!(meta.reason, Some(ActionReason::HookCancelled));
        assert!(rig.runtime.running().is_empty());
        assert_eq!(rig.occupant(SHOWER), None);
        assert_eq!(rig.events.names(), vec!["affordance_fail"]);
        assert_eq!(rig.failures.lock().unwrap()[0].stage, HookStage::Fail);
    }

    #[test]
    fn dispatch_runs_every_handler_even_after_a_veto() {
        let mut hooks = HookRegistry::new();
        let calls = Arc::new(Mutex::new(0));
        for verdict in [false, true] {
            let c = Arc::clone(&calls);
            hooks.register(HookStage::Before, "gate", move |_: &HookPayload| {
                *c.lock().unwrap() += 1;
                verdict
            });
        }
        let payload = HookPayload {
            stage:       HookStage::Before,
            tick:        Tick(0),
            agent:       a(0),
            object:      STOVE,
            object_type: ObjectTypeId(1),
            affordance:  EAT,
            effects:     Default::default(),
            reason:      None,
            condition:   None,
            context:     None,
        };
        assert!(!hooks.dispatch(&["gate".to_string()], &payload));
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[test]
    fn unregistered_hook_fails_validation() {
        let rig = Rig::new();
        let empty = HookRegistry::new();
        assert!(rig.registry.validate(&rig.objects, &empty).is_err());
    }
}

// ── Completion ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod completion {
    use super::*;

    #[test]
    fn effects_apply_exactly_once() {
        let mut rig = Rig::new();
        rig.request(a(0), STOVE, 0);
        rig.start(a(0), STOVE, EAT, 0);

        rig.advance(1);
        rig.advance(2);
        rig.advance(2);
        assert!(rig.runtime.running_on(STOVE).is_some());
        rig.advance(3);
        rig.advance(4);
        rig.advance(5);

        assert!((rig.hunger(a(0)) - 0.7).abs() < 1e-6);
        assert_eq!(rig.agents.wallet[0], 8.0);
        assert_eq!(*rig.afters.lock().unwrap(), 1);
        let finishes = rig.events.names().iter().filter(|n| **n == "affordance_finish").count();
        assert_eq!(finishes, 1);
    }

    #[test]
    fn same_tick_advance_is_a_no_op() {
        let mut rig = Rig::new();
        rig.request(a(0), STOVE, 0);
        rig.start(a(0), STOVE, EAT, 0);
        rig.advance(1);
        rig.advance(1);
        assert_eq!(rig.runtime.running_on(STOVE).unwrap().remaining, 2);
    }

    #[test]
    fn completion_releases_with_cooldown() {
        let mut rig = Rig::new();
        rig.request(a(0), STOVE, 0);
        rig.start(a(0), STOVE, EAT, 0);
        for t in 1..=3 {
            rig.advance(t);
        }
        assert_eq!(rig.scheduler.active_agent(STOVE), None);
        assert_eq!(rig.occupant(STOVE), None);
        assert!(rig.scheduler.queue(STOVE).unwrap().on_cooldown(a(0), Tick(4)));
        assert!(rig.conflicts.is_empty());
    }
}

// ── Handover ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod handover {
    use super::*;
    use crate::select_successor;

    #[test]
    fn affinity_beats_queue_position() {
        let mut ledger = RelationshipLedger::new();
        ledger.set(a(0), a(2), Tie::new(0.5, 0.0, 0.0));
        assert_eq!(select_successor(&ledger, a(0), &[a(1), a(2)]), Some(a(2)));
    }

    #[test]
    fn neutral_ties_fall_back_to_queue_order() {
        let ledger = RelationshipLedger::new();
        assert_eq!(select_successor(&ledger, a(0), &[a(1), a(2)]), None);
    }

    #[test]
    fn index_penalty_can_cancel_affinity() {
        let mut ledger = RelationshipLedger::new();
        ledger.set(a(0), a(2), Tie::new(0.05, 0.0, 0.0));
        assert_eq!(select_successor(&ledger, a(0), &[a(1), a(2)]), None);
    }

    #[test]
    fn rivalry_pushes_a_waiter_down() {
        let mut ledger = RelationshipLedger::new();
        ledger.set(a(0), a(1), Tie::new(0.3, 0.0, 0.2));
        ledger.set(a(0), a(2), Tie::new(0.3, 0.0, 0.0));
        assert_eq!(select_successor(&ledger, a(0), &[a(1), a(2)]), Some(a(2)));
    }

    #[test]
    fn completion_hands_to_preferred_waiter() {
        let mut rig = Rig::new();
        rig.ledger.set(a(0), a(2), Tie::new(0.5, 0.2, 0.0));
        rig.request(a(0), STOVE, 0);
        rig.start(a(0), STOVE, EAT, 0);
        rig.request(a(1), STOVE, 1);
        rig.request(a(2), STOVE, 2);

        for t in 1..=3 {
            rig.advance(t);
        }

        assert_eq!(rig.scheduler.active_agent(STOVE), Some(a(2)));
        assert_eq!(rig.occupant(STOVE), Some(a(2)));
        assert_eq!(rig.scheduler.queue_snapshot(STOVE), vec![a(1)]);
        assert_eq!(rig.conflicts.len(), 1);
        let c = &rig.conflicts[0];
        assert_eq!(c.reason, ConflictReason::Handover);
        assert_eq!((c.actor, c.rival, c.queue_length), (a(0), a(2), 2));
        assert_eq!(c.intensity, Some(0.5));
    }
}

// ── Release ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod release {
    use super::*;

    #[test]
    fn successful_early_release_completes_action() {
        let mut rig = Rig::new();
        rig.request(a(0), STOVE, 0);
        rig.start(a(0), STOVE, EAT, 0);
        rig.request(a(1), STOVE, 0);

        let (rt, mut env) = rig.split();
        let (kind, meta) = rt.release(&mut env, a(0), STOVE, true, None, None, Tick(1));
        assert_eq!(kind, Some(EAT));
        assert_eq!(meta.reason, None);

        assert!((rig.hunger(a(0)) - 0.7).abs() < 1e-6);
        assert_eq!(rig.scheduler.active_agent(STOVE), Some(a(1)));
        assert_eq!(rig.events.names().last(), Some(&"affordance_finish"));
    }

    #[test]
    fn failed_release_runs_fail_hooks_without_effects() {
        let mut rig = Rig::new();
        rig.request(a(0), STOVE, 0);
        rig.start(a(0), STOVE, EAT, 0);

        let (rt, mut env) = rig.split();
        let reason = ActionReason::Other("interrupted".into());
        let (_, meta) = rt.release(&mut env, a(0), STOVE, false, Some(reason.clone()), None, Tick(1));
        assert_eq!(meta.reason, Some(reason.clone()));

        assert_eq!(rig.hunger(a(0)), 0.2);
        assert_eq!(rig.agents.wallet[0], 10.0);
        assert_eq!(rig.failures.lock().unwrap()[0].reason, Some(reason));
        assert_eq!(rig.scheduler.queue(STOVE).unwrap().cooldown_until(a(0)), None);
    }

    #[test]
    fn default_failure_reason_is_released() {
        let mut rig = Rig::new();
        rig.request(a(0), STOVE, 0);
        let (rt, mut env) = rig.split();
        let (kind, meta) = rt.release(&mut env, a(0), STOVE, false, None, Some(NAP), Tick(1));
        assert_eq!(kind, Some(NAP));
        assert_eq!(meta.reason.unwrap().as_str(), "released");
        assert!(rig.events.is_empty());
    }

    #[test]
    fn release_by_non_holder_leaves_runner_alone() {
        let mut rig = Rig::new();
        rig.request(a(0), STOVE, 0);
        rig.start(a(0), STOVE, EAT, 0);
        let (rt, mut env) = rig.split();
        rt.release(&mut env, a(1), STOVE, false, None, None, Tick(1));
        assert_eq!(rig.runtime.running_on(STOVE).unwrap().agent, a(0));
        assert_eq!(rig.occupant(STOVE), Some(a(0)));
    }
}

// ── Stalls ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod stalls {
    use super::*;

    #[test]
    fn blocked_attempts_ghost_step_the_holder() {
        let mut rig = Rig::new();
        rig.request(a(0), STOVE, 0);
        rig.start(a(0), STOVE, EAT, 0);
        rig.request(a(1), STOVE, 0);

        for t in 1..=2 {
            let (rt, mut env) = rig.split();
            rt.handle_blocked(&mut env, STOVE, Tick(t));
        }
        assert_eq!(rig.scheduler.active_agent(STOVE), Some(a(0)));

        let (rt, mut env) = rig.split();
        rt.handle_blocked(&mut env, STOVE, Tick(3));
        assert_eq!(rig.scheduler.active_agent(STOVE), Some(a(1)));
        assert!(rig.runtime.running().is_empty());
        assert_eq!(rig.failures.lock().unwrap()[0].reason, Some(ActionReason::GhostStep));
        assert_eq!(rig.hunger(a(0)), 0.2);
    }

    #[test]
    fn sweep_requeues_stalled_holder_at_tail() {
        let mut rig = Rig::new();
        rig.request(a(0), STOVE, 0);
        rig.request(a(1), STOVE, 0);

        for t in 1..=3 {
            let (rt, mut env) = rig.split();
            rt.stall_sweep(&mut env, Tick(t));
        }

        assert_eq!(rig.scheduler.active_agent(STOVE), Some(a(1)));
        assert_eq!(rig.occupant(STOVE), Some(a(1)));
        assert_eq!(rig.scheduler.queue_snapshot(STOVE), vec![a(0)]);
        assert_eq!(rig.conflicts.len(), 1);
        let c = &rig.conflicts[0];
        assert_eq!(c.reason, ConflictReason::GhostStep);
        assert_eq!((c.actor, c.rival, c.queue_length), (a(0), a(1), 1));
        assert_eq!(c.intensity, None);
    }

    #[test]
    fn sweep_ignores_uncontested_objects() {
        let mut rig = Rig::new();
        rig.request(a(0), STOVE, 0);
        for t in 1..=5 {
            let (rt, mut env) = rig.split();
            rt.stall_sweep(&mut env, Tick(t));
        }
        assert_eq!(rig.scheduler.active_agent(STOVE), Some(a(0)));
        assert!(rig.conflicts.is_empty());
    }

    #[test]
    fn removed_agent_frees_its_object() {
        let mut rig = Rig::new();
        rig.request(a(0), STOVE, 0);
        rig.start(a(0), STOVE, EAT, 0);
        rig.request(a(1), STOVE, 0);

        let (rt, mut env) = rig.split();
        rt.remove_agent(&mut env, a(0), Tick(1));
        assert!(rig.runtime.running().is_empty());
        assert_eq!(rig.occupant(STOVE), Some(a(1)));
        assert!(rig.failures.lock().unwrap().is_empty());
    }
}

// ── Persistence ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod persistence {
    use super::*;

    #[test]
    fn running_actions_survive_export_import() {
        let mut rig = Rig::new();
        rig.request(a(0), STOVE, 0);
        rig.start(a(0), STOVE, EAT, 0);
        rig.advance(1);

        let state = rig.runtime.export_state();
        let mut fresh = TimedActionRuntime::new();
        fresh.import_state(&state, &rig.registry).unwrap();
        assert_eq!(fresh.export_state(), state);
        assert_eq!(fresh.running_on(STOVE), rig.runtime.running_on(STOVE));
    }

    #[test]
    fn unknown_affordance_is_rejected() {
        let rig = Rig::new();
        let mut state = rig.runtime.export_state();
        state.running.push(crate::RunningRecord {
            object:     STOVE,
            agent:      a(0),
            affordance: AffordanceId(99),
            duration:   2,
            remaining:  1,
        });
        let mut fresh = TimedActionRuntime::new();
        assert!(fresh.import_state(&state, &rig.registry).is_err());
        assert!(fresh.running().is_empty());
    }
}

// ── Manifest loader ───────────────────────────────────────────────────────────

#[cfg(test)]
mod loader {
    use super::*;
    use crate::{load_manifest_csv, AffordanceError, Precondition, StageHooks};

    #[test]
    fn rows_become_specs() {
        let registry = load_manifest_reader(MANIFEST.as_bytes()).unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.id_of("shower"), Some(WASH));

        let eat = registry.get(EAT).unwrap();
        assert_eq!(eat.object_type, ObjectTypeId(1));
        assert_eq!(eat.preconditions.len(), 1);
        assert_eq!(eat.preconditions[0].source(), "agent.wallet >= 2");
        assert_eq!(eat.hooks, StageHooks {
            before: vec![],
            after:  vec!["count_after".into()],
            fail:   vec!["record_fail".into()],
        });
        assert_eq!(registry.for_type(ObjectTypeId(1)).count(), 2);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let csv = "affordance_id,name,object_type,duration\n0,eat,1,2\n1,eat,1,2\n";
        assert!(matches!(
            load_manifest_reader(csv.as_bytes()),
            Err(AffordanceError::Duplicate(AffordanceId(1)))
        ));
    }

    #[test]
    fn bad_precondition_fails_the_load() {
        let csv = "affordance_id,name,object_type,duration,effects,preconditions\n0,eat,1,2,,wallet >= 2\n";
        assert!(matches!(
            load_manifest_reader(csv.as_bytes()),
            Err(AffordanceError::Precondition { .. })
        ));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("affordances.csv");
        std::fs::write(&path, MANIFEST).unwrap();
        assert_eq!(load_manifest_csv(&path).unwrap().len(), 3);
    }

    #[test]
    fn missing_object_type_fails_validation() {
        let registry = load_manifest_reader(MANIFEST.as_bytes()).unwrap();
        let mut objects = ObjectTable::new();
        objects.add(InteractiveObject::new(STOVE, ObjectTypeId(1), Cell::new(0, 0))).unwrap();
        assert!(matches!(
            registry.validate(&objects, &HookRegistry::new()),
            Err(AffordanceError::UnknownObjectType { .. }) | Err(AffordanceError::UnregisteredHook { .. })
        ));
    }
}

// ── Comparison ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod comparison {
    use crate::{Comparison, ContextSnapshot, Precondition};

    #[test]
    fn operators_evaluate() {
        let ctx = ContextSnapshot::new()
            .with("agent.hunger", 0.4)
            .with("agent.on_shift", 0.0);
        let cases = [
            ("agent.hunger < 0.5", true),
            ("agent.hunger <= 0.4", true),
            ("agent.hunger > 0.4", false),
            ("agent.hunger >= 0.4", true),
            ("agent.hunger == 0.4", true),
            ("agent.hunger != 0.4", false),
            ("agent.on_shift == false", true),
            ("agent.on_shift", false),
            ("agent.hunger", true),
        ];
        for (src, expected) in cases {
            assert_eq!(Comparison::compile(src).unwrap().evaluate(&ctx), expected, "{src}");
        }
    }

    #[test]
    fn missing_key_fails() {
        let c = Comparison::compile("agent.wallet > 0").unwrap();
        assert!(!c.evaluate(&ContextSnapshot::new()));
    }

    #[test]
    fn malformed_sources_are_rejected() {
        for src in ["wallet >= 2", "agent.wallet >= lots", "Agent.Wallet > 1", "", "agent. > 1"] {
            assert!(Comparison::compile(src).is_err(), "{src}");
        }
    }
}
