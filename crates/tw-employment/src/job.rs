//! Jobs and the roster that assigns them.
//!
//! Shift windows are offsets within the day cycle, so a job with
//! `start_tick = 480, end_tick = 960` runs from 08:00 to 16:00 every day at
//! one tick per minute.

use std::collections::BTreeMap;

use tw_agent::AgentStore;
use tw_core::{Cell, JobId};

use crate::{EmploymentError, EmploymentResult};

#[derive(Clone, PartialEq, Debug)]
pub struct JobSpec {
    pub id:               JobId,
    pub name:             String,
    /// First tick of the shift, as an offset into the day.
    pub start_tick:       u64,
    /// Last tick of the shift (inclusive).  Clamped up to `start_tick`.
    pub end_tick:         u64,
    /// Wallet credit per tick worked.
    pub wage_rate:        f32,
    /// One-off wallet charge on a late start.
    pub lateness_penalty: f32,
    /// Where the agent must stand to count as present.  `None` means anywhere.
    pub location:         Option<Cell>,
}

impl JobSpec {
    #[inline]
    pub fn effective_end(&self) -> u64 {
        self.end_tick.max(self.start_tick)
    }

    #[inline]
    pub fn is_present(&self, position: Cell) -> bool {
        self.location.is_none_or(|l| l == position)
    }
}

#[derive(Clone, Debug, Default)]
pub struct JobRoster {
    jobs: BTreeMap<JobId, JobSpec>,
}

impl JobRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, job: JobSpec) -> EmploymentResult<()> {
        if self.jobs.contains_key(&job.id) {
            return Err(EmploymentError::DuplicateJob(job.id));
        }
        self.jobs.insert(job.id, job);
        Ok(())
    }

    #[inline]
    pub fn get(&self, id: JobId) -> Option<&JobSpec> {
        self.jobs.get(&id)
    }

    /// Lowest-id job, used for agents without a valid assignment.
    pub fn default_job(&self) -> Option<&JobSpec> {
        self.jobs.values().next()
    }

    /// `id`'s spec, or the default job if `id` is unset or unknown.
    pub fn resolve(&self, id: JobId) -> Option<&JobSpec> {
        self.get(id).or_else(|| self.default_job())
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobSpec> {
        self.jobs.values()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Give every agent without a known job one in round-robin order.
    pub fn assign_round_robin(&self, agents: &mut AgentStore) {
        let ids: Vec<JobId> = self.jobs.keys().copied().collect();
        if ids.is_empty() {
            return;
        }
        for i in 0..agents.count {
            if !self.jobs.contains_key(&agents.job[i]) {
                agents.job[i] = ids[i % ids.len()];
            }
        }
    }

    /// Every window must lie inside one day.
    pub fn validate(&self, ticks_per_day: u64) -> EmploymentResult<()> {
        for job in self.jobs.values() {
            if job.effective_end() >= ticks_per_day {
                return Err(EmploymentError::JobWindow {
                    job:   job.id,
                    start: job.start_tick,
                    end:   job.end_tick,
                    ticks_per_day,
                });
            }
        }
        Ok(())
    }
}
