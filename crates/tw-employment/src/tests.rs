//! Unit tests for tw-employment.

use tw_agent::{AgentStore, AgentStoreBuilder, RelationshipLedger, RelationshipOracle};
use tw_core::{AgentId, Cell, EventLog, JobId, SimClock, SimEvent, Tick};

use crate::{
    EmploymentConfig, ExitQueue, JobRoster, JobSpec, ShiftEnv, ShiftPhase, ShiftScheduler,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

const SITE: Cell = Cell::new(5, 5);
const AWAY: Cell = Cell::new(0, 0);

fn a(n: u32) -> AgentId {
    AgentId(n)
}

fn grocer() -> JobSpec {
    JobSpec {
        id:               JobId(0),
        name:             "grocer".into(),
        start_tick:       100,
        end_tick:         200,
        wage_rate:        1.0,
        lateness_penalty: 0.5,
        location:         Some(SITE),
    }
}

struct Rig {
    sched:  ShiftScheduler,
    clock:  SimClock,
    agents: AgentStore,
    roster: JobRoster,
    ledger: RelationshipLedger,
    events: EventLog,
}

impl Rig {
    fn new(agents: usize, config: EmploymentConfig, ticks_per_day: u64) -> Self {
        Self::with_job(agents, config, ticks_per_day, grocer())
    }

    fn with_job(agents: usize, config: EmploymentConfig, ticks_per_day: u64, job: JobSpec) -> Self {
        let (mut store, _) = AgentStoreBuilder::new(agents, 1).initial_wallet(10.0).build();
        let mut roster = JobRoster::new();
        roster.insert(job).unwrap();
        roster.validate(ticks_per_day).unwrap();
        roster.assign_round_robin(&mut store);
        store.position.iter_mut().for_each(|p| *p = AWAY);
        Self {
            sched:  ShiftScheduler::new(config).unwrap(),
            clock:  SimClock::new(ticks_per_day),
            agents: store,
            roster,
            ledger: RelationshipLedger::new(),
            events: EventLog::new(),
        }
    }

    fn step(&mut self, tick: u64) {
        let mut env = ShiftEnv {
            agents: &mut self.agents,
            roster: &self.roster,
            ledger: &mut self.ledger,
            events: &mut self.events,
        };
        self.sched.step(Tick(tick), &self.clock, &mut env);
    }

    fn run(&mut self, ticks: std::ops::RangeInclusive<u64>) {
        for t in ticks {
            self.step(t);
        }
    }

    fn count(&self, name: &str) -> usize {
        self.events.names().iter().filter(|n| **n == name).count()
    }

    fn wallet(&self, agent: AgentId) -> f32 {
        self.agents.wallet[agent.index()]
    }
}

fn scenario_config() -> EmploymentConfig {
    EmploymentConfig { absent_cutoff: 5, ..EmploymentConfig::default() }
}

// ── Shift phases ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod phases {
    use super::*;

    #[test]
    fn idle_then_await_before_start() {
        let mut rig = Rig::new(1, EmploymentConfig::default(), 1_440);
        rig.step(79);
        assert_eq!(rig.sched.phase(a(0)), ShiftPhase::Idle);
        rig.step(80);
        assert_eq!(rig.sched.phase(a(0)), ShiftPhase::AwaitStart);
        assert!(!rig.agents.employment[0].on_shift);
    }

    #[test]
    fn shift_ending_at_midnight_is_still_recorded() {
        let job = JobSpec { start_tick: 5, end_tick: 199, ..grocer() };
        let mut rig = Rig::with_job(1, EmploymentConfig::default(), 200, job);
        rig.agents.position[0] = SITE;

        rig.run(0..=199);
        assert_eq!(rig.sched.phase(a(0)), ShiftPhase::OnTime);
        rig.step(200);
        assert_eq!(rig.sched.phase(a(0)), ShiftPhase::AwaitStart);
        assert_eq!(rig.sched.context(a(0)).unwrap().samples.len(), 1);

        rig.run(201..=599);
        let ctx = rig.sched.context(a(0)).unwrap();
        assert_eq!(ctx.samples.iter().copied().collect::<Vec<_>>(), vec![1.0, 1.0]);
        assert_eq!(rig.agents.employment[0].attendance_ratio, 1.0);
    }

    #[test]
    fn await_start_opens_the_evening_before_an_early_shift() {
        let job = JobSpec { start_tick: 5, end_tick: 100, ..grocer() };
        let mut rig = Rig::with_job(1, EmploymentConfig::default(), 1_440, job);

        rig.run(0..=1_424);
        assert_eq!(rig.sched.phase(a(0)), ShiftPhase::PostShift);
        rig.step(1_425);
        assert_eq!(rig.sched.phase(a(0)), ShiftPhase::AwaitStart);
        rig.run(1_426..=1_444);
        assert_eq!(rig.sched.phase(a(0)), ShiftPhase::AwaitStart);
        rig.step(1_445);
        assert_eq!(rig.sched.phase(a(0)), ShiftPhase::Late);
        assert_eq!(rig.sched.context(a(0)).unwrap().samples.len(), 1);
    }

    #[test]
    fn absent_until_110_scenario() {
        let mut rig = Rig::new(1, scenario_config(), 1_440);
        rig.run(0..=99);

        for t in 100..=105 {
            rig.step(t);
            assert_eq!(rig.sched.phase(a(0)), ShiftPhase::Late, "tick {t}");
        }
        for t in 106..=109 {
            rig.step(t);
            assert_eq!(rig.sched.phase(a(0)), ShiftPhase::Absent, "tick {t}");
        }
        // lateness 0.5, six away-late ticks at 0.005, one absence penalty.
        assert!((rig.wallet(a(0)) - (10.0 - 0.5 - 0.03 - 0.2)).abs() < 1e-4);

        rig.agents.position[0] = SITE;
        rig.run(110..=200);
        assert_eq!(rig.sched.phase(a(0)), ShiftPhase::Late);
        assert_eq!(rig.count("shift_absent"), 1);
        assert_eq!(rig.count("shift_late_start"), 1);

        rig.step(201);
        let ctx = rig.sched.context(a(0)).unwrap();
        assert_eq!(ctx.phase, ShiftPhase::PostShift);
        assert_eq!(ctx.samples.iter().copied().collect::<Vec<_>>(), vec![0.0]);
        assert_eq!(rig.agents.employment[0].attendance_ratio, 0.0);
        assert_eq!(rig.agents.employment[0].absent_shifts_7d, 1);
    }

    #[test]
    fn lateness_is_charged_once_across_a_long_late_shift() {
        let mut rig = Rig::new(1, EmploymentConfig::default(), 1_440);
        rig.run(0..=105);
        rig.agents.position[0] = SITE;
        rig.run(106..=155);

        let record = &rig.agents.employment[0];
        assert_eq!(record.lateness_counter, 1);
        assert_eq!(record.wages_earned, 50);
        assert_eq!(record.late_ticks_today, 56);
        assert!((rig.wallet(a(0)) - (10.0 - 0.5 - 0.03 + 50.0)).abs() < 1e-3);
        assert_eq!(rig.count("shift_late_start"), 1);
    }

    #[test]
    fn punctual_agent_earns_every_tick() {
        let mut rig = Rig::new(1, EmploymentConfig::default(), 1_440);
        rig.agents.position[0] = SITE;
        rig.run(0..=201);

        let record = &rig.agents.employment[0];
        assert_eq!(record.wages_earned, 101);
        assert_eq!(record.lateness_counter, 0);
        assert_eq!(record.attendance_ratio, 1.0);
        assert!(rig.events.is_empty());
    }

    #[test]
    fn on_time_once_stays_on_time() {
        let mut rig = Rig::new(1, EmploymentConfig::default(), 1_440);
        rig.agents.position[0] = SITE;
        rig.run(0..=100);
        rig.agents.position[0] = AWAY;
        rig.run(101..=103);
        assert_eq!(rig.sched.phase(a(0)), ShiftPhase::Late);
        rig.agents.position[0] = SITE;
        rig.step(110);
        assert_eq!(rig.sched.phase(a(0)), ShiftPhase::OnTime);
        assert_eq!(rig.agents.employment[0].lateness_counter, 0);
    }

    #[test]
    fn leaving_mid_shift_reports_early_departure_once() {
        let mut rig = Rig::new(1, EmploymentConfig::default(), 1_440);
        rig.agents.position[0] = SITE;
        rig.run(0..=120);
        rig.agents.position[0] = AWAY;
        rig.run(121..=130);
        assert_eq!(rig.sched.phase(a(0)), ShiftPhase::Late);
        rig.run(131..=160);
        assert_eq!(rig.sched.phase(a(0)), ShiftPhase::Absent);
        assert_eq!(rig.count("shift_departed_early"), 1);
        assert_eq!(rig.count("shift_absent"), 1);
    }

    #[test]
    fn shifts_recur_each_day() {
        let mut rig = Rig::new(1, EmploymentConfig::default(), 300);
        rig.run(0..=500);
        let record = &rig.agents.employment[0];
        assert_eq!(record.lateness_counter, 2);
        assert_eq!(rig.sched.context(a(0)).unwrap().samples.len(), 1);
        rig.run(501..=599);
        assert_eq!(rig.sched.context(a(0)).unwrap().samples.len(), 2);
        assert_eq!(rig.agents.employment[0].absent_shifts_7d, 2);
    }

    #[test]
    fn absences_age_out_after_seven_days() {
        let mut rig = Rig::new(1, EmploymentConfig::default(), 300);
        rig.run(0..=300);
        assert_eq!(rig.agents.employment[0].absent_shifts_7d, 1);
        // First absence at tick 131; seven days later it drops out.
        rig.agents.position[0] = SITE;
        rig.run(301..=2_232);
        assert_eq!(rig.agents.employment[0].absent_shifts_7d, 0);
    }

    #[test]
    fn without_jobs_everyone_idles() {
        let (agents, _) = AgentStoreBuilder::new(1, 1).build();
        let mut rig = Rig::new(1, EmploymentConfig::default(), 1_440);
        rig.roster = JobRoster::new();
        rig.agents = agents;
        rig.run(0..=150);
        assert_eq!(rig.sched.phase(a(0)), ShiftPhase::Idle);
        assert!(rig.events.is_empty());
    }

    #[test]
    fn unassigned_agent_takes_default_job() {
        let mut rig = Rig::new(1, EmploymentConfig::default(), 1_440);
        rig.agents.job[0] = JobId::INVALID;
        rig.step(100);
        assert_eq!(rig.agents.job[0], JobId(0));
        assert_eq!(rig.sched.phase(a(0)), ShiftPhase::Late);
    }
}

// ── Coworkers ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod coworkers {
    use super::*;

    #[test]
    fn late_arrival_is_helped_by_present_coworker() {
        let mut rig = Rig::new(2, EmploymentConfig::default(), 1_440);
        rig.agents.position[0] = SITE;
        rig.run(0..=100);

        let helped: Vec<_> = rig
            .events
            .iter()
            .filter_map(|(_, e)| match e {
                SimEvent::EmploymentHelpedWhenLate { agent, coworkers, .. } => Some((*agent, coworkers.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(helped, vec![(a(1), vec![a(0)])]);
        let tie = rig.ledger.tie(a(1), a(0));
        assert!((tie.trust - 0.2).abs() < 1e-6);
        assert!((tie.familiarity - 0.1).abs() < 1e-6);

        rig.run(101..=140);
        assert_eq!(rig.count("employment_helped_when_late"), 1);
        assert_eq!(rig.count("employment_took_my_shift"), 1);
        let tie = rig.ledger.tie(a(0), a(1));
        assert!((tie.trust - 0.1).abs() < 1e-6);
        assert!((tie.rivalry - 0.3).abs() < 1e-6);
    }

    #[test]
    fn lone_worker_gets_no_coworker_events() {
        let mut rig = Rig::new(1, EmploymentConfig::default(), 1_440);
        rig.run(0..=150);
        assert_eq!(rig.count("employment_helped_when_late"), 0);
        assert_eq!(rig.count("employment_took_my_shift"), 0);
        assert!(rig.ledger.is_empty());
    }
}

// ── Exit queue ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod exits {
    use super::*;
    use tw_core::ExitReason;

    fn store(n: usize) -> AgentStore {
        AgentStoreBuilder::new(n, 1).build().0
    }

    fn processed(events: &EventLog) -> Vec<(AgentId, ExitReason)> {
        events
            .iter()
            .filter_map(|(_, e)| match e {
                SimEvent::EmploymentExitProcessed { agent, reason, .. } => Some((*agent, *reason)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn enqueue_is_idempotent() {
        let mut agents = store(2);
        let mut events = EventLog::new();
        let mut q = ExitQueue::new(EmploymentConfig::default());
        q.enqueue_exit(a(0), Tick(5), &mut agents, &mut events);
        q.enqueue_exit(a(0), Tick(6), &mut agents, &mut events);
        assert_eq!(q.pending(), &[a(0)]);
        assert_eq!(q.enqueued_at(a(0)), Some(Tick(5)));
        assert!(agents.employment[0].exit_pending);
        assert_eq!(events.names(), vec!["employment_exit_pending"]);
    }

    #[test]
    fn queue_over_limit_raises_overflow() {
        let mut agents = store(2);
        let mut events = EventLog::new();
        let cfg = EmploymentConfig { exit_queue_limit: 1, ..EmploymentConfig::default() };
        let mut q = ExitQueue::new(cfg);
        q.enqueue_exit(a(0), Tick(0), &mut agents, &mut events);
        q.enqueue_exit(a(1), Tick(0), &mut agents, &mut events);
        assert_eq!(events.names(), vec![
            "employment_exit_pending",
            "employment_exit_queue_overflow",
        ]);
    }

    #[test]
    fn manual_exit_and_deferral() {
        let mut agents = store(3);
        let mut events = EventLog::new();
        let mut q = ExitQueue::new(EmploymentConfig::default());

        assert!(q.request_manual_exit(a(0), Tick(0), &agents, &mut events));
        assert!(q.request_manual_exit(a(1), Tick(0), &agents, &mut events));
        assert!(q.defer_exit(a(1), Tick(0), &mut agents, &mut events));
        assert!(!q.request_manual_exit(a(9), Tick(0), &agents, &mut events));

        let exited = q.evaluate(Tick(1), 0, &mut agents, &mut events);
        assert_eq!(exited, vec![a(0)]);
        assert_eq!(processed(&events), vec![(a(0), ExitReason::ManualApprove)]);
        assert!(!agents.is_alive(a(0)));
        assert!(agents.is_alive(a(1)));
        assert!(!q.defer_exit(a(0), Tick(2), &mut agents, &mut events));
    }

    #[test]
    fn daily_cap_spreads_exits_over_days() {
        let mut agents = store(3);
        let mut events = EventLog::new();
        let cfg = EmploymentConfig { daily_exit_cap: 1, ..EmploymentConfig::default() };
        let mut q = ExitQueue::new(cfg);
        for rec in agents.employment.iter_mut() {
            rec.absent_shifts_7d = 3;
        }

        assert_eq!(q.evaluate(Tick(10), 0, &mut agents, &mut events), vec![a(0)]);
        assert_eq!(q.evaluate(Tick(11), 0, &mut agents, &mut events), vec![]);
        assert_eq!(q.pending(), &[a(1), a(2)]);
        assert_eq!(q.evaluate(Tick(1_000), 1, &mut agents, &mut events), vec![a(1)]);
        assert_eq!(q.exits_today(), 1);
        assert!(processed(&events).iter().all(|(_, r)| *r == ExitReason::DailyCap));
    }

    #[test]
    fn overdue_entries_are_forced_out() {
        let mut agents = store(3);
        let mut events = EventLog::new();
        let cfg = EmploymentConfig {
            daily_exit_cap:     1,
            exit_review_window: 10,
            ..EmploymentConfig::default()
        };
        let mut q = ExitQueue::new(cfg);
        for rec in agents.employment.iter_mut() {
            rec.absent_shifts_7d = 5;
        }
        q.evaluate(Tick(0), 0, &mut agents, &mut events);
        let exited = q.evaluate(Tick(10), 0, &mut agents, &mut events);
        assert_eq!(exited, vec![a(1), a(2)]);
        assert_eq!(processed(&events)[1..], [
            (a(1), ExitReason::AutoReview),
            (a(2), ExitReason::AutoReview),
        ]);
        assert!(q.pending().is_empty());
    }

    #[test]
    fn zero_threshold_disables_auto_enqueue() {
        let mut agents = store(1);
        let mut events = EventLog::new();
        let cfg = EmploymentConfig { max_absent_shifts: 0, ..EmploymentConfig::default() };
        let mut q = ExitQueue::new(cfg);
        assert!(q.evaluate(Tick(0), 0, &mut agents, &mut events).is_empty());
        assert!(events.is_empty());
    }

    #[test]
    fn summary_reports_backlog() {
        let mut agents = store(2);
        let mut events = EventLog::new();
        let mut q = ExitQueue::new(EmploymentConfig::default());
        q.enqueue_exit(a(1), Tick(3), &mut agents, &mut events);
        let s = q.summary();
        assert_eq!(s.pending, vec![a(1)]);
        assert_eq!(s.pending_count, 1);
        assert_eq!(s.daily_exit_cap, 2);
        assert_eq!(s.review_window, 1_440);
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut agents = store(3);
        let mut events = EventLog::new();
        let mut q = ExitQueue::new(EmploymentConfig::default());
        q.enqueue_exit(a(2), Tick(3), &mut agents, &mut events);
        q.request_manual_exit(a(1), Tick(4), &agents, &mut events);

        let json = serde_json::to_string(&q.export_state()).unwrap();
        let mut restored = ExitQueue::new(EmploymentConfig::default());
        restored.import_state(&serde_json::from_str(&json).unwrap());
        assert_eq!(serde_json::to_string(&restored.export_state()).unwrap(), json);
    }
}

// ── Roster ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod roster {
    use super::*;
    use crate::{load_roster_csv, load_roster_reader, EmploymentError};

    const ROSTER: &str = "\
job_id,name,start_tick,end_tick,wage_rate,lateness_penalty,location_x,location_y
0,grocer,480,960,0.02,0.5,4,7
1,courier,360,840,0.015,,,
";

    #[test]
    fn rows_become_jobs() {
        let roster = load_roster_reader(ROSTER.as_bytes()).unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.get(JobId(0)).unwrap().location, Some(Cell::new(4, 7)));
        let courier = roster.get(JobId(1)).unwrap();
        assert_eq!(courier.location, None);
        assert_eq!(courier.lateness_penalty, 0.0);
        assert!(courier.is_present(Cell::new(-3, 2)));
    }

    #[test]
    fn half_a_location_is_rejected() {
        let csv = "job_id,name,start_tick,end_tick,wage_rate,lateness_penalty,location_x,location_y\n0,x,1,2,0.1,0,4,\n";
        assert!(matches!(load_roster_reader(csv.as_bytes()), Err(EmploymentError::Parse(_))));
    }

    #[test]
    fn duplicate_job_is_rejected() {
        let csv = "job_id,name,start_tick,end_tick,wage_rate\n0,x,1,2,0.1\n0,y,1,2,0.1\n";
        assert!(matches!(
            load_roster_reader(csv.as_bytes()),
            Err(EmploymentError::DuplicateJob(JobId(0)))
        ));
    }

    #[test]
    fn windows_must_fit_the_day() {
        let roster = load_roster_reader(ROSTER.as_bytes()).unwrap();
        assert!(roster.validate(1_440).is_ok());
        assert!(matches!(roster.validate(900), Err(EmploymentError::JobWindow { .. })));
    }

    #[test]
    fn round_robin_fills_unassigned_agents() {
        let roster = load_roster_reader(ROSTER.as_bytes()).unwrap();
        let (mut agents, _) = AgentStoreBuilder::new(3, 1).build();
        agents.job[1] = JobId(0);
        roster.assign_round_robin(&mut agents);
        assert_eq!(agents.job, vec![JobId(0), JobId(0), JobId(0)]);
        agents.job = vec![JobId::INVALID; 3];
        roster.assign_round_robin(&mut agents);
        assert_eq!(agents.job, vec![JobId(0), JobId(1), JobId(0)]);
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.csv");
        std::fs::write(&path, ROSTER).unwrap();
        assert_eq!(load_roster_csv(&path).unwrap().len(), 2);
    }
}

// ── Config + persistence ──────────────────────────────────────────────────────

#[cfg(test)]
mod config {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(EmploymentConfig::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_values_fail() {
        let bad = [
            EmploymentConfig { attendance_window: 0, ..EmploymentConfig::default() },
            EmploymentConfig { grace_ticks: 121, ..EmploymentConfig::default() },
            EmploymentConfig { absence_penalty: -1.0, ..EmploymentConfig::default() },
            EmploymentConfig { exit_review_window: 0, ..EmploymentConfig::default() },
        ];
        for cfg in bad {
            assert!(ShiftScheduler::new(cfg).is_err());
        }
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: EmploymentConfig = serde_json::from_str(r#"{"grace_ticks": 2}"#).unwrap();
        assert_eq!(cfg.grace_ticks, 2);
        assert_eq!(cfg.absent_cutoff, 30);
    }

    #[test]
    fn shift_contexts_round_trip_mid_shift() {
        let mut rig = Rig::new(2, scenario_config(), 1_440);
        rig.agents.position[0] = SITE;
        rig.run(0..=110);

        let json = serde_json::to_string(&rig.sched.export_records()).unwrap();
        let mut restored = ShiftScheduler::new(scenario_config()).unwrap();
        restored.import_records(&serde_json::from_str::<Vec<crate::ShiftRecord>>(&json).unwrap());
        assert_eq!(serde_json::to_string(&restored.export_records()).unwrap(), json);
        assert_eq!(restored.phase(a(0)), ShiftPhase::OnTime);
        assert_eq!(restored.phase(a(1)), ShiftPhase::Absent);
    }
}
