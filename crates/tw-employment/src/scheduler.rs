//! `ShiftScheduler`: the per-tick attendance state machine.
//!
//! Every tick each living agent with a job is placed in one phase of
//!
//! ```text
//! idle ─► await_start ─► { on_time | late | absent } ─► post_shift ─► idle
//! ```
//!
//! relative to its shift window for the current day.  Inside the window the
//! phase is recomputed every tick from presence at the job location.
//! Charges, counters and events fire at most once per shift; a shift's
//! attendance sample is recorded on the first tick after the window closes.

use tracing::debug;
use tw_agent::{AgentStore, RelationshipLedger};
use tw_core::{AgentId, EventLog, JobId, SimClock, SimEvent, Tick};

use crate::job::{JobRoster, JobSpec};
use crate::shift::{ShiftArena, ShiftContext, ShiftFlags, ShiftPhase, ShiftRecord};
use crate::{EmploymentConfig, EmploymentResult};

/// Relationship deltas `(trust, familiarity, rivalry)` toward coworkers.
const HELPED_WHEN_LATE: (f32, f32, f32) = (0.2, 0.1, -0.1);
const TOOK_MY_SHIFT: (f32, f32, f32) = (-0.1, 0.0, 0.3);

/// Days of absence history kept for `absent_shifts_7d`.
const ABSENCE_HORIZON_DAYS: u64 = 7;

/// Mutable world state the scheduler writes while stepping.
pub struct ShiftEnv<'a> {
    pub agents:  &'a mut AgentStore,
    pub roster:  &'a JobRoster,
    pub ledger:  &'a mut RelationshipLedger,
    pub events:  &'a mut EventLog,
}

#[derive(Debug)]
pub struct ShiftScheduler {
    config:   EmploymentConfig,
    contexts: ShiftArena,
}

impl ShiftScheduler {
    pub fn new(config: EmploymentConfig) -> EmploymentResult<Self> {
        config.validate()?;
        Ok(Self { config, contexts: ShiftArena::new() })
    }

    pub fn config(&self) -> &EmploymentConfig {
        &self.config
    }

    pub fn contexts(&self) -> &ShiftArena {
        &self.contexts
    }

    pub fn context(&self, agent: AgentId) -> Option<&ShiftContext> {
        self.contexts.get(agent)
    }

    pub fn phase(&self, agent: AgentId) -> ShiftPhase {
        self.contexts.phase(agent)
    }

    /// Drop `agent`'s context.  Called when the agent leaves the population.
    pub fn remove_agent(&mut self, agent: AgentId) {
        self.contexts.remove(agent);
    }

    pub fn export_records(&self) -> Vec<ShiftRecord> {
        self.contexts.export_records()
    }

    pub fn import_records(&mut self, records: &[ShiftRecord]) {
        self.contexts.import_records(records);
    }

    // ── Tick entry point ──────────────────────────────────────────────────

    /// Advance every living agent's shift state by one tick.
    pub fn step(&mut self, tick: Tick, clock: &SimClock, env: &mut ShiftEnv<'_>) {
        let ids: Vec<AgentId> = env.agents.alive_ids().collect();
        for agent in ids {
            let mut ctx = self.contexts.take_or_default(agent);
            self.step_agent(agent, &mut ctx, tick, clock, env);
            self.contexts.put(agent, ctx);
        }
    }

    fn step_agent(
        &self,
        agent: AgentId,
        ctx:   &mut ShiftContext,
        tick:  Tick,
        clock: &SimClock,
        env:   &mut ShiftEnv<'_>,
    ) {
        let i = agent.index();

        // A shift whose window has closed is recorded before anything else,
        // including shifts that end on the last tick of the day.
        if ctx.shift_end.is_some_and(|end| tick > end) {
            self.finalize(ctx, env.agents, agent);
        }

        // ── Per-day reset ─────────────────────────────────────────────────
        let day = clock.day_of(tick);
        if ctx.current_day != Some(day) {
            ctx.current_day = Some(day);
            ctx.late_ticks = 0;
            ctx.wages_paid = 0.0;
            env.agents.employment[i].late_ticks_today = 0;
        }

        let roster = env.roster;
        let Some(job) = roster.resolve(env.agents.job[i]) else {
            self.enter_idle(ctx, env.agents, agent);
            return;
        };
        env.agents.job[i] = job.id;

        ctx.prune_absences(tick, clock.ticks_for_days(ABSENCE_HORIZON_DAYS));
        env.agents.employment[i].absent_shifts_7d = ctx.absence_events.len() as u32;

        let (start, end) = self.window(job, tick, clock);
        let arrival = Tick(start.0.saturating_sub(self.config.arrival_buffer));

        if tick < arrival {
            self.enter_idle(ctx, env.agents, agent);
        } else if tick < start {
            self.finalize_stale(ctx, start, env.agents, agent);
            ctx.phase = ShiftPhase::AwaitStart;
            env.agents.employment[i].on_shift = false;
        } else if tick <= end {
            self.finalize_stale(ctx, start, env.agents, agent);
            ctx.begin(start, end);
            let present = job.is_present(env.agents.position[i]);
            let phase = self.determine_phase(ctx, tick, start, present);
            self.apply_phase(agent, ctx, phase, present, job, tick, env);
        } else {
            self.finalize(ctx, env.agents, agent);
        }
    }

    /// Absolute `(start, end)` of the shift `tick` belongs to: today's, or
    /// tomorrow's once today's has closed and its arrival buffer is open.
    fn window(&self, job: &JobSpec, tick: Tick, clock: &SimClock) -> (Tick, Tick) {
        let base = clock.day_start(tick);
        let start = base + job.start_tick;
        let end = base + job.effective_end();
        if tick <= end {
            return (start, end);
        }
        let next = start + clock.ticks_per_day;
        if tick.0 + self.config.arrival_buffer >= next.0 {
            (next, end + clock.ticks_per_day)
        } else {
            (start, end)
        }
    }

    // ── Transitions ───────────────────────────────────────────────────────

    /// Record an unfinished shift before the one starting at `start` opens.
    fn finalize_stale(&self, ctx: &mut ShiftContext, start: Tick, agents: &mut AgentStore, agent: AgentId) {
        if ctx.shift_start.is_some_and(|s| s != start) {
            self.finalize(ctx, agents, agent);
        }
    }

    fn enter_idle(&self, ctx: &mut ShiftContext, agents: &mut AgentStore, agent: AgentId) {
        if ctx.phase != ShiftPhase::Idle {
            self.finalize(ctx, agents, agent);
        }
        ctx.phase = ShiftPhase::Idle;
        agents.employment[agent.index()].on_shift = false;
    }

    fn determine_phase(&self, ctx: &mut ShiftContext, tick: Tick, start: Tick, present: bool) -> ShiftPhase {
        let elapsed = tick.since(start);
        let cfg = &self.config;

        if present {
            ctx.last_present = Some(tick);
            if ctx.flags.ever_on_time || elapsed <= cfg.grace_ticks {
                ctx.flags.ever_on_time = true;
                ShiftPhase::OnTime
            } else {
                ShiftPhase::Late
            }
        } else if elapsed <= cfg.grace_ticks {
            ShiftPhase::Late
        } else if elapsed > cfg.absent_cutoff {
            ShiftPhase::Absent
        } else if ctx.last_present.is_some_and(|p| tick.since(p) > cfg.absence_slack) {
            ShiftPhase::Absent
        } else {
            ShiftPhase::Late
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_phase(
        &self,
        agent:   AgentId,
        ctx:     &mut ShiftContext,
        phase:   ShiftPhase,
        present: bool,
        job:     &JobSpec,
        tick:    Tick,
        env:     &mut ShiftEnv<'_>,
    ) {
        let i = agent.index();
        let previous = ctx.phase;
        ctx.phase = phase;

        match phase {
            ShiftPhase::OnTime => ctx.on_time_ticks += 1,

            ShiftPhase::Late => {
                ctx.late_ticks += 1;
                env.agents.employment[i].late_ticks_today += 1;

                if !ctx.flags.late_penalty_applied && !previous.is_working() {
                    env.agents.charge(agent, job.lateness_penalty);
                    ctx.flags.late_penalty_applied = true;
                    if !ctx.flags.late_counter_recorded {
                        env.agents.employment[i].lateness_counter += 1;
                        ctx.flags.late_counter_recorded = true;
                    }
                }
                if !ctx.flags.late_event_emitted {
                    env.events.emit(tick, SimEvent::ShiftLateStart {
                        agent,
                        job:        job.id,
                        ticks_late: ctx.late_ticks,
                    });
                    ctx.flags.late_event_emitted = true;
                }
                if !present {
                    if self.config.late_tick_penalty > 0.0 {
                        env.agents.charge(agent, self.config.late_tick_penalty);
                    }
                    env.agents.employment[i].wages_withheld += job.wage_rate;
                }
                if !ctx.flags.late_help_emitted {
                    let coworkers = self.coworkers_on_shift(agent, job.id, env.agents);
                    if !coworkers.is_empty() {
                        nudge(env.ledger, agent, &coworkers, HELPED_WHEN_LATE);
                        env.events.emit(tick, SimEvent::EmploymentHelpedWhenLate {
                            agent,
                            job: job.id,
                            coworkers,
                        });
                        ctx.flags.late_help_emitted = true;
                    }
                }
            }

            ShiftPhase::Absent => {
                if !ctx.flags.absence_penalty_applied {
                    env.agents.charge(agent, self.config.absence_penalty);
                    ctx.flags.absence_penalty_applied = true;
                }
                env.agents.employment[i].wages_withheld += job.wage_rate;
                if !ctx.flags.absence_event_emitted {
                    env.events.emit(tick, SimEvent::ShiftAbsent { agent, job: job.id });
                    ctx.flags.absence_event_emitted = true;
                    ctx.absence_events.push_back(tick);
                    env.agents.employment[i].absent_shifts_7d = ctx.absence_events.len() as u32;
                    debug!(agent = %agent, job = %job.id, tick = tick.0, "marked absent");
                }
                if !ctx.flags.took_shift_emitted {
                    let coworkers = self.coworkers_on_shift(agent, job.id, env.agents);
                    if !coworkers.is_empty() {
                        nudge(env.ledger, agent, &coworkers, TOOK_MY_SHIFT);
                        env.events.emit(tick, SimEvent::EmploymentTookMyShift {
                            agent,
                            job: job.id,
                            coworkers,
                        });
                        ctx.flags.took_shift_emitted = true;
                    }
                }
            }

            _ => {}
        }

        if phase.is_working() {
            ctx.flags.absence_penalty_applied = false;
        }

        let record = &mut env.agents.employment[i];
        if phase.is_working() && present {
            record.on_shift = true;
            record.wages_earned += 1;
            ctx.wages_paid += job.wage_rate;
            env.agents.credit(agent, job.wage_rate);
        } else {
            record.on_shift = false;
            if previous.is_working()
                && !phase.is_working()
                && !ctx.flags.departure_event_emitted
            {
                env.events.emit(tick, SimEvent::ShiftDepartedEarly { agent, job: job.id });
                ctx.flags.departure_event_emitted = true;
            }
        }
    }

    /// Record the shift's attendance sample.  Safe to call repeatedly.
    fn finalize(&self, ctx: &mut ShiftContext, agents: &mut AgentStore, agent: AgentId) {
        let record = &mut agents.employment[agent.index()];
        record.on_shift = false;
        ctx.phase = ShiftPhase::PostShift;
        if ctx.shift_start.is_none() || ctx.flags.outcome_recorded {
            return;
        }

        let value = ctx.on_time_ticks as f32 / ctx.scheduled_ticks.max(1) as f32;
        ctx.push_sample(value, self.config.attendance_window);
        record.attendance_ratio = ctx.samples.iter().sum::<f32>() / ctx.samples.len() as f32;
        record.late_ticks_today = ctx.late_ticks;

        ctx.shift_start = None;
        ctx.shift_end = None;
        ctx.last_present = None;
        ctx.late_ticks = 0;
        ctx.flags = ShiftFlags { outcome_recorded: true, ..ShiftFlags::default() };
        debug!(agent = %agent, attendance = value, "shift finalized");
    }

    /// Other agents on `job` currently on time or late, ascending.
    fn coworkers_on_shift(&self, agent: AgentId, job: JobId, agents: &AgentStore) -> Vec<AgentId> {
        agents
            .alive_ids()
            .filter(|&other| other != agent && agents.job[other.index()] == job)
            .filter(|&other| self.contexts.phase(other).is_working())
            .collect()
    }
}

fn nudge(ledger: &mut RelationshipLedger, agent: AgentId, others: &[AgentId], delta: (f32, f32, f32)) {
    let (trust, familiarity, rivalry) = delta;
    for &other in others {
        ledger.update(agent, other, trust, familiarity, rivalry);
    }
}
