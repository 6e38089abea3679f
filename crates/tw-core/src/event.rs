//! The per-tick event stream.
//!
//! Every tick-time outcome that collaborators care about (telemetry,
//! behaviour logic, tests) is reported as a [`SimEvent`] appended to the
//! world's [`EventLog`].  Rejections carry an [`ActionReason`] code instead
//! of raising errors.

use std::fmt;

use crate::{AffordanceId, AgentId, JobId, ObjectId, Tick};

// ── Reason codes ──────────────────────────────────────────────────────────────

/// Why a timed action did not start, or why it ended without success.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ActionReason {
    NotHolder,
    AlreadyRunning,
    MissingSpec,
    PreconditionFailed,
    HookCancelled,
    GhostStep,
    /// Caller-supplied reason for an explicit early release.
    Other(String),
}

impl ActionReason {
    pub fn as_str(&self) -> &str {
        match self {
            ActionReason::NotHolder          => "not_holder",
            ActionReason::AlreadyRunning     => "already_running",
            ActionReason::MissingSpec        => "missing_spec",
            ActionReason::PreconditionFailed => "precondition_failed",
            ActionReason::HookCancelled      => "hook_cancelled",
            ActionReason::GhostStep          => "ghost_step",
            ActionReason::Other(s)           => s,
        }
    }
}

impl fmt::Display for ActionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an agent left the population.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ExitReason {
    ManualApprove,
    AutoReview,
    DailyCap,
}

impl ExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExitReason::ManualApprove => "manual_approve",
            ExitReason::AutoReview    => "auto_review",
            ExitReason::DailyCap      => "daily_cap",
        }
    }
}

// ── SimEvent ──────────────────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Debug)]
pub enum SimEvent {
    AffordanceStart {
        agent:      AgentId,
        object:     ObjectId,
        affordance: AffordanceId,
        duration:   u32,
    },
    AffordanceFinish {
        agent:      AgentId,
        object:     ObjectId,
        affordance: AffordanceId,
    },
    AffordanceFail {
        agent:      AgentId,
        object:     ObjectId,
        affordance: AffordanceId,
        reason:     ActionReason,
    },
    AffordancePreconditionFail {
        agent:      AgentId,
        object:     ObjectId,
        affordance: AffordanceId,
        condition:  String,
    },
    ShiftLateStart {
        agent:      AgentId,
        job:        JobId,
        ticks_late: u32,
    },
    ShiftAbsent {
        agent: AgentId,
        job:   JobId,
    },
    ShiftDepartedEarly {
        agent: AgentId,
        job:   JobId,
    },
    EmploymentHelpedWhenLate {
        agent:     AgentId,
        job:       JobId,
        coworkers: Vec<AgentId>,
    },
    EmploymentTookMyShift {
        agent:     AgentId,
        job:       JobId,
        coworkers: Vec<AgentId>,
    },
    EmploymentExitPending {
        agent:         AgentId,
        pending_count: usize,
    },
    EmploymentExitQueueOverflow {
        pending_count: usize,
        limit:         usize,
    },
    EmploymentExitManualRequest {
        agent: AgentId,
    },
    EmploymentExitDeferred {
        agent: AgentId,
    },
    EmploymentExitProcessed {
        agent:  AgentId,
        job:    Option<JobId>,
        reason: ExitReason,
    },
    QueueConflict {
        object:    ObjectId,
        actor:     AgentId,
        rival:     AgentId,
        intensity: f32,
    },
}

impl SimEvent {
    /// Stable event name used by telemetry consumers.
    pub fn name(&self) -> &'static str {
        match self {
            SimEvent::AffordanceStart { .. }             => "affordance_start",
            SimEvent::AffordanceFinish { .. }            => "affordance_finish",
            SimEvent::AffordanceFail { .. }              => "affordance_fail",
            SimEvent::AffordancePreconditionFail { .. }  => "affordance_precondition_fail",
            SimEvent::ShiftLateStart { .. }              => "shift_late_start",
            SimEvent::ShiftAbsent { .. }                 => "shift_absent",
            SimEvent::ShiftDepartedEarly { .. }          => "shift_departed_early",
            SimEvent::EmploymentHelpedWhenLate { .. }    => "employment_helped_when_late",
            SimEvent::EmploymentTookMyShift { .. }       => "employment_took_my_shift",
            SimEvent::EmploymentExitPending { .. }       => "employment_exit_pending",
            SimEvent::EmploymentExitQueueOverflow { .. } => "employment_exit_queue_overflow",
            SimEvent::EmploymentExitManualRequest { .. } => "employment_exit_manual_request",
            SimEvent::EmploymentExitDeferred { .. }      => "employment_exit_deferred",
            SimEvent::EmploymentExitProcessed { .. }     => "employment_exit_processed",
            SimEvent::QueueConflict { .. }               => "queue_conflict",
        }
    }

    /// The agent the event is about, if it concerns a single agent.
    pub fn agent(&self) -> Option<AgentId> {
        match self {
            SimEvent::AffordanceStart { agent, .. }
            | SimEvent::AffordanceFinish { agent, .. }
            | SimEvent::AffordanceFail { agent, .. }
            | SimEvent::AffordancePreconditionFail { agent, .. }
            | SimEvent::ShiftLateStart { agent, .. }
            | SimEvent::ShiftAbsent { agent, .. }
            | SimEvent::ShiftDepartedEarly { agent, .. }
            | SimEvent::EmploymentHelpedWhenLate { agent, .. }
            | SimEvent::EmploymentTookMyShift { agent, .. }
            | SimEvent::EmploymentExitPending { agent, .. }
            | SimEvent::EmploymentExitManualRequest { agent }
            | SimEvent::EmploymentExitDeferred { agent }
            | SimEvent::EmploymentExitProcessed { agent, .. } => Some(*agent),
            SimEvent::QueueConflict { actor, .. } => Some(*actor),
            SimEvent::EmploymentExitQueueOverflow { .. } => None,
        }
    }
}

// ── EventLog ──────────────────────────────────────────────────────────────────

/// Append-only buffer of `(tick, event)` pairs.
///
/// The orchestrator drains it once per tick and hands the batch to its
/// observer, so between ticks it holds only the events of the tick in
/// progress.
#[derive(Default, Debug)]
pub struct EventLog {
    events: Vec<(Tick, SimEvent)>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn emit(&mut self, tick: Tick, event: SimEvent) {
        self.events.push((tick, event));
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Tick, SimEvent)> {
        self.events.iter()
    }

    /// Names of all buffered events in emission order.
    pub fn names(&self) -> Vec<&'static str> {
        self.events.iter().map(|(_, e)| e.name()).collect()
    }

    /// Take every buffered event, leaving the log empty.
    pub fn drain(&mut self) -> Vec<(Tick, SimEvent)> {
        std::mem::take(&mut self.events)
    }
}
