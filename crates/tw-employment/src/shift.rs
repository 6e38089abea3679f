//! Per-agent shift bookkeeping.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tw_core::{AgentId, Tick};

/// Current-tick employment status relative to the agent's shift window.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftPhase {
    #[default]
    Idle,
    AwaitStart,
    OnTime,
    Late,
    Absent,
    PostShift,
}

impl ShiftPhase {
    /// `on_time` or `late`: the agent counts as working this shift.
    #[inline]
    pub fn is_working(self) -> bool {
        matches!(self, ShiftPhase::OnTime | ShiftPhase::Late)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShiftPhase::Idle       => "idle",
            ShiftPhase::AwaitStart => "await_start",
            ShiftPhase::OnTime     => "on_time",
            ShiftPhase::Late       => "late",
            ShiftPhase::Absent     => "absent",
            ShiftPhase::PostShift  => "post_shift",
        }
    }
}

/// Once-per-shift guards.  All reset when a new shift begins.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct ShiftFlags {
    pub late_penalty_applied:    bool,
    pub absence_penalty_applied: bool,
    pub late_event_emitted:      bool,
    pub absence_event_emitted:   bool,
    pub departure_event_emitted: bool,
    pub late_help_emitted:       bool,
    pub took_shift_emitted:      bool,
    pub late_counter_recorded:   bool,
    pub ever_on_time:            bool,
    pub outcome_recorded:        bool,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct ShiftContext {
    pub phase:           ShiftPhase,
    /// Day index of the last per-day reset.
    pub current_day:     Option<u64>,
    /// Late ticks in the current shift.
    pub late_ticks:      u32,
    pub wages_paid:      f32,
    pub flags:           ShiftFlags,
    /// Absolute start tick of the shift in progress.
    pub shift_start:     Option<Tick>,
    pub shift_end:       Option<Tick>,
    pub last_present:    Option<Tick>,
    pub scheduled_ticks: u64,
    pub on_time_ticks:   u64,
    /// Per-shift attendance values, newest last.
    pub samples:         VecDeque<f32>,
    /// Ticks at which the agent was marked absent, oldest first.
    pub absence_events:  VecDeque<Tick>,
}

impl ShiftContext {
    /// Reset per-shift counters if `start` opens a new shift.
    pub(crate) fn begin(&mut self, start: Tick, end: Tick) {
        if self.shift_start == Some(start) {
            return;
        }
        self.shift_start = Some(start);
        self.shift_end = Some(end);
        self.scheduled_ticks = (end.0 - start.0 + 1).max(1);
        self.on_time_ticks = 0;
        self.late_ticks = 0;
        self.wages_paid = 0.0;
        self.flags = ShiftFlags::default();
        self.last_present = None;
    }

    /// Share of the shift spent on time, in `[0, 1]`.
    pub fn punctuality(&self) -> f32 {
        let scheduled = self.scheduled_ticks.max(1) as f32;
        (self.on_time_ticks as f32 / scheduled).clamp(0.0, 1.0)
    }

    pub(crate) fn push_sample(&mut self, value: f32, window: usize) {
        self.samples.push_back(value);
        while self.samples.len() > window.max(1) {
            self.samples.pop_front();
        }
    }

    pub(crate) fn prune_absences(&mut self, tick: Tick, horizon: u64) {
        while self
            .absence_events
            .front()
            .is_some_and(|&t| tick.since(t) > horizon)
        {
            self.absence_events.pop_front();
        }
    }
}

/// Persisted form of one agent's context.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ShiftRecord {
    pub agent:   AgentId,
    pub context: ShiftContext,
}

// ── Arena ─────────────────────────────────────────────────────────────────────

/// Agent-indexed context storage with explicit get-or-create.
#[derive(Clone, Debug, Default)]
pub struct ShiftArena {
    slots: Vec<Option<ShiftContext>>,
}

impl ShiftArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, agent: AgentId) -> Option<&ShiftContext> {
        self.slots.get(agent.index()).and_then(Option::as_ref)
    }

    pub fn get_or_create(&mut self, agent: AgentId) -> &mut ShiftContext {
        let i = agent.index();
        if i >= self.slots.len() {
            self.slots.resize_with(i + 1, || None);
        }
        self.slots[i].get_or_insert_with(ShiftContext::default)
    }

    /// Move the context out for mutation while other slots stay readable.
    pub(crate) fn take_or_default(&mut self, agent: AgentId) -> ShiftContext {
        self.slots
            .get_mut(agent.index())
            .and_then(Option::take)
            .unwrap_or_default()
    }

    pub(crate) fn put(&mut self, agent: AgentId, ctx: ShiftContext) {
        *self.get_or_create(agent) = ctx;
    }

    pub fn remove(&mut self, agent: AgentId) {
        if let Some(slot) = self.slots.get_mut(agent.index()) {
            *slot = None;
        }
    }

    pub fn phase(&self, agent: AgentId) -> ShiftPhase {
        self.get(agent).map(|c| c.phase).unwrap_or_default()
    }

    pub fn export_records(&self) -> Vec<ShiftRecord> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| {
                s.as_ref().map(|c| ShiftRecord { agent: AgentId(i as u32), context: c.clone() })
            })
            .collect()
    }

    pub fn import_records(&mut self, records: &[ShiftRecord]) {
        self.slots.clear();
        for r in records {
            self.put(r.agent, r.context.clone());
        }
    }
}
