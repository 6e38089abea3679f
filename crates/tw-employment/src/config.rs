//! Attendance, penalty, and exit-queue tuning.

use serde::{Deserialize, Serialize};

use crate::{EmploymentError, EmploymentResult};

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EmploymentConfig {
    /// Ticks after shift start that still count as on time.
    pub grace_ticks: u64,
    /// Ticks after shift start beyond which an absent agent is `absent`.
    pub absent_cutoff: u64,
    /// Ticks away from the job after last being present before `absent`.
    pub absence_slack: u64,
    /// Wallet charge per tick spent late and away from the job.
    pub late_tick_penalty: f32,
    /// One-off wallet charge on entering `absent`.
    pub absence_penalty: f32,
    /// Absences in seven days that put an agent in the exit queue.
    /// `0` disables automatic enqueueing.
    pub max_absent_shifts: u32,
    /// Shifts averaged into `attendance_ratio`.
    pub attendance_window: usize,
    /// Exits processed per day.  `0` means unlimited.
    pub daily_exit_cap: u32,
    /// Queue length above which an overflow alert replaces the pending notice.
    /// `0` disables the alert.
    pub exit_queue_limit: usize,
    /// Ticks an agent may wait in the exit queue before a forced exit.
    pub exit_review_window: u64,
    /// Ticks before shift start during which the agent is `await_start`.
    pub arrival_buffer: u64,
}

impl Default for EmploymentConfig {
    fn default() -> Self {
        Self {
            grace_ticks:        5,
            absent_cutoff:      30,
            absence_slack:      20,
            late_tick_penalty:  0.005,
            absence_penalty:    0.2,
            max_absent_shifts:  3,
            attendance_window:  3,
            daily_exit_cap:     2,
            exit_queue_limit:   8,
            exit_review_window: 1_440,
            arrival_buffer:     20,
        }
    }
}

impl EmploymentConfig {
    pub fn validate(&self) -> EmploymentResult<()> {
        fn at_most<T: PartialOrd + std::fmt::Display>(name: &str, v: T, max: T) -> EmploymentResult<()> {
            if v > max {
                return Err(EmploymentError::Config(format!("{name} must be at most {max}, got {v}")));
            }
            Ok(())
        }
        fn in_range(name: &str, v: f32, max: f32) -> EmploymentResult<()> {
            if !(0.0..=max).contains(&v) {
                return Err(EmploymentError::Config(format!("{name} must lie in [0, {max}], got {v}")));
            }
            Ok(())
        }

        at_most("grace_ticks", self.grace_ticks, 120)?;
        at_most("absent_cutoff", self.absent_cutoff, 600)?;
        at_most("absence_slack", self.absence_slack, 600)?;
        in_range("late_tick_penalty", self.late_tick_penalty, 1.0)?;
        in_range("absence_penalty", self.absence_penalty, 5.0)?;
        at_most("max_absent_shifts", self.max_absent_shifts, 20)?;
        if !(1..=14).contains(&self.attendance_window) {
            return Err(EmploymentError::Config(format!(
                "attendance_window must lie in [1, 14], got {}",
                self.attendance_window
            )));
        }
        at_most("daily_exit_cap", self.daily_exit_cap, 50)?;
        at_most("exit_queue_limit", self.exit_queue_limit, 100)?;
        if !(1..=100_000).contains(&self.exit_review_window) {
            return Err(EmploymentError::Config(format!(
                "exit_review_window must lie in [1, 100000], got {}",
                self.exit_review_window
            )));
        }
        Ok(())
    }
}
