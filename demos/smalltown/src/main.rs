//! smalltown: a dozen townsfolk share two stoves, two beds and a shower
//! around their day jobs.
//!
//! Run with `RUST_LOG=debug` to watch reservations change hands.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tw_affordance::{
    load_manifest_reader, HookPayload, HookRegistry, HookStage, InteractiveObject, ObjectTable,
};
use tw_agent::{ActionKind, AgentStoreBuilder, NeedKind, Needs};
use tw_core::{AgentId, AgentRng, Cell, ObjectId, ObjectTypeId, SimEvent, Tick};
use tw_employment::load_roster_reader;
use tw_sim::{AgentAction, DecisionContext, DecisionModel, EngineConfig, SimBuilder, SimObserver, World, WorldState};

// ── Constants ─────────────────────────────────────────────────────────────────

const AGENT_COUNT: usize = 12;
const COMMUTE_LEAD: u64 = 30; // ticks before shift start agents set off
const MEAL_PRICE: f32 = 4.0;
const HOME: Cell = Cell::new(0, 0);

const KITCHEN: ObjectTypeId = ObjectTypeId(1);
const BEDROOM: ObjectTypeId = ObjectTypeId(2);
const BATHROOM: ObjectTypeId = ObjectTypeId(3);

// ── Embedded inputs ───────────────────────────────────────────────────────────

// One tick per minute, three days.
const ENGINE_JSON: &str = r#"{
  "sim":        { "total_ticks": 4320, "seed": 7, "ticks_per_day": 1440 },
  "queue":      { "cooldown_ticks": 30, "ghost_step_after": 45, "age_priority_weight": 0.2 },
  "employment": { "daily_exit_cap": 1 },
  "need_decay": { "hunger": 0.0015, "energy": 0.0008, "hygiene": 0.001 }
}"#;

const MANIFEST_CSV: &str = "\
affordance_id,name,object_type,duration,effects,preconditions,before,after,fail
0,cook_meal,1,30,hunger:0.6;money:-4,agent.wallet >= 4,,log_meal,
1,sleep,2,240,energy:0.8,,,,log_interrupted
2,shower,3,15,hygiene:0.7,,,,log_interrupted
";

const ROSTER_CSV: &str = "\
job_id,name,start_tick,end_tick,wage_rate,lateness_penalty,location_x,location_y
0,grocer,480,960,0.02,0.5,20,4
1,baker,360,840,0.02,0.5,22,6
2,night_porter,1200,1430,0.03,0.5,18,2
";

// ── Decision model ────────────────────────────────────────────────────────────

/// Work during shift hours, otherwise look after the lowest need.
struct Townsfolk;

impl Townsfolk {
    /// The object `agent` holds, if any.
    fn held(world: &World, agent: AgentId) -> Option<&InteractiveObject> {
        world.objects.iter().find(|o| world.scheduler.active_agent(o.id) == Some(agent))
    }

    /// The object `agent` is queued for, if any.
    fn waiting_for(world: &World, agent: AgentId) -> Option<ObjectId> {
        world.objects.ids().find(|&o| world.queue_snapshot(o).contains(&agent))
    }

    /// Least contended object of `object_type`.
    fn pick(world: &World, object_type: ObjectTypeId) -> Option<ObjectId> {
        world
            .objects
            .iter()
            .filter(|o| o.object_type == object_type)
            .min_by_key(|o| {
                let busy = usize::from(world.scheduler.active_agent(o.id).is_some());
                world.queue_snapshot(o.id).len() + busy
            })
            .map(|o| o.id)
    }
}

impl DecisionModel for Townsfolk {
    fn decide(&self, agent: AgentId, ctx: &DecisionContext<'_>, rng: &mut AgentRng) -> AgentAction {
        let world = ctx.world;
        let i = agent.index();

        // Finish what we hold before anything else.
        if let Some(object) = Self::held(world, agent) {
            if world.runtime.running_on(object.id).is_some() {
                return AgentAction::Idle;
            }
            let failed_start = matches!(
                &world.agents.last_outcome[i],
                Some(o) if o.kind == ActionKind::Start && !o.success
            );
            return match world.registry.for_type(object.object_type).next() {
                Some(spec) if !failed_start => AgentAction::start(object.id, spec.id),
                _ => AgentAction::Release {
                    object:     object.id,
                    success:    false,
                    reason:     Some("gave_up".to_string()),
                    affordance: None,
                },
            };
        }

        // Commute to work and stay there for the shift.
        let day_tick = ctx.clock.tick_of_day(ctx.tick);
        if let Some(job) = world.roster.resolve(world.agents.job[i]) {
            let window = job.start_tick.saturating_sub(COMMUTE_LEAD)..=job.end_tick;
            if window.contains(&day_tick) {
                let site = job.location.unwrap_or(HOME);
                if world.agents.position[i] != site && rng.gen_bool(0.9) {
                    return AgentAction::Move { to: site };
                }
                return AgentAction::Idle;
            }
        }
        if world.agents.position[i] != HOME {
            return AgentAction::Move { to: HOME };
        }

        // Impatient waiters report a hogging holder.
        if let Some(object) = Self::waiting_for(world, agent) {
            return AgentAction::Request { object, blocked: rng.gen_bool(0.2) };
        }

        let needs = world.agents.needs[i];
        let wanted = [
            (NeedKind::Hunger, KITCHEN, 0.35),
            (NeedKind::Energy, BEDROOM, 0.25),
            (NeedKind::Hygiene, BATHROOM, 0.30),
        ]
        .into_iter()
        .filter(|&(kind, _, threshold)| needs.get(kind) < threshold)
        .filter(|&(_, object_type, _)| object_type != KITCHEN || world.agents.wallet[i] >= MEAL_PRICE)
        .min_by(|a, b| needs.get(a.0).total_cmp(&needs.get(b.0)));

        match wanted.and_then(|(_, object_type, _)| Self::pick(world, object_type)) {
            Some(object) => AgentAction::request(object),
            None => AgentAction::Idle,
        }
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

/// Tallies events by name and logs a line per simulated day.
struct TownLedger {
    ticks_per_day: u64,
    counts:        BTreeMap<&'static str, usize>,
}

impl SimObserver for TownLedger {
    fn on_event(&mut self, _tick: Tick, event: &SimEvent) {
        *self.counts.entry(event.name()).or_default() += 1;
    }

    fn on_tick_end(&mut self, tick: Tick, _applied: usize, world: &World) {
        if (tick.0 + 1) % self.ticks_per_day != 0 {
            return;
        }
        let wallets: f32 = world.agents.wallet.iter().sum();
        info!(
            day        = tick.0 / self.ticks_per_day,
            alive      = world.agents.alive_count(),
            running    = world.running().len(),
            mean_wallet = wallets / world.agents.count as f32,
            pending_exits = world.exit_summary().pending_count,
            "day complete"
        );
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== smalltown: rust_town contention demo ===");

    // 1. Configuration.
    let config = EngineConfig::from_json_str(ENGINE_JSON)?;
    let ticks_per_day = config.sim.ticks_per_day;
    println!(
        "Agents: {AGENT_COUNT}  |  Ticks: {}  |  Seed: {}",
        config.sim.total_ticks, config.sim.seed
    );

    // 2. Objects.
    let mut objects = ObjectTable::new();
    objects.add(InteractiveObject::new(ObjectId(0), KITCHEN, Cell::new(1, 0)))?;
    objects.add(InteractiveObject::new(ObjectId(1), KITCHEN, Cell::new(2, 0)))?;
    objects.add(InteractiveObject::new(ObjectId(2), BEDROOM, Cell::new(0, 1)))?;
    objects.add(InteractiveObject::new(ObjectId(3), BEDROOM, Cell::new(0, 2)))?;
    objects.add(InteractiveObject::new(ObjectId(4), BATHROOM, Cell::new(1, 1)))?;

    // 3. Affordances and their hooks.
    let meals = Arc::new(AtomicUsize::new(0));
    let interrupted = Arc::new(AtomicUsize::new(0));
    let mut hooks = HookRegistry::new();
    let m = Arc::clone(&meals);
    hooks.register(HookStage::After, "log_meal", move |_: &HookPayload| {
        m.fetch_add(1, Ordering::Relaxed);
        true
    });
    let n = Arc::clone(&interrupted);
    hooks.register(HookStage::Fail, "log_interrupted", move |_: &HookPayload| {
        n.fetch_add(1, Ordering::Relaxed);
        true
    });
    let registry = load_manifest_reader(MANIFEST_CSV.as_bytes())?;
    let roster = load_roster_reader(ROSTER_CSV.as_bytes())?;
    println!("Loaded {} affordances, {} jobs", registry.len(), roster.len());

    // 4. Agents.
    let (mut store, rngs) = AgentStoreBuilder::new(AGENT_COUNT, config.sim.seed)
        .initial_needs(Needs::uniform(0.6))
        .initial_wallet(20.0)
        .build();
    store.position.fill(HOME);

    // 5. Build and run.
    let mut sim = SimBuilder::new(config, store, rngs, Townsfolk)
        .objects(objects)
        .registry(registry)
        .hooks(hooks)
        .roster(roster)
        .build()?;

    let mut ledger = TownLedger { ticks_per_day, counts: BTreeMap::new() };
    let t0 = Instant::now();
    sim.run(&mut ledger)?;
    let elapsed = t0.elapsed();

    // 6. Persist the final state and check it reloads.
    std::fs::create_dir_all("output/smalltown")?;
    let state = sim.export_state();
    let json = state.to_json()?;
    std::fs::write(Path::new("output/smalltown/state.json"), &json)?;
    sim.import_state(&WorldState::from_json(&json)?)?;
    let summary = serde_json::to_string_pretty(&sim.world.exit_summary())?;

    // 7. Summary.
    println!("Simulation complete in {:.3} s", elapsed.as_secs_f64());
    println!("  meals cooked        : {}", meals.load(Ordering::Relaxed));
    println!("  actions interrupted : {}", interrupted.load(Ordering::Relaxed));
    println!("  ghost-steps         : {}", sim.world.scheduler.metrics().ghost_step_events);
    println!("  state.json          : {} bytes", json.len());
    println!();
    println!("{:<34} {:>6}", "Event", "Count");
    println!("{}", "-".repeat(41));
    for (name, count) in &ledger.counts {
        println!("{name:<34} {count:>6}");
    }
    println!();
    println!("{:<8} {:<7} {:>8} {:>6} {:>10}", "Agent", "Alive", "Wallet", "Late", "Attendance");
    println!("{}", "-".repeat(43));
    for i in 0..sim.world.agents.count {
        let record = &sim.world.agents.employment[i];
        println!(
            "{:<8} {:<7} {:>8.2} {:>6} {:>10.2}",
            i,
            if sim.world.agents.alive[i] { "yes" } else { "no" },
            sim.world.agents.wallet[i],
            record.lateness_counter,
            record.attendance_ratio,
        );
    }
    println!();
    println!("Exit queue: {summary}");

    Ok(())
}
