//! Queue fairness tuning.

use serde::{Deserialize, Serialize};

use crate::{QueueError, QueueResult};

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Ticks an agent must wait before re-requesting an object it released
    /// successfully.
    pub cooldown_ticks: u64,

    /// Blocked-progress signals tolerated before the holder is evicted.
    /// `0` disables ghost-stepping.
    pub ghost_step_after: u32,

    /// How strongly waiting time outweighs queue position, in `[0, 1]`.
    pub age_priority_weight: f64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            cooldown_ticks:      60,
            ghost_step_after:    3,
            age_priority_weight: 0.1,
        }
    }
}

impl QueueConfig {
    pub fn validate(&self) -> QueueResult<()> {
        if self.cooldown_ticks > 600 {
            return Err(QueueError::Config(format!(
                "cooldown_ticks must be at most 600, got {}",
                self.cooldown_ticks
            )));
        }
        if self.ghost_step_after > 100 {
            return Err(QueueError::Config(format!(
                "ghost_step_after must be at most 100, got {}",
                self.ghost_step_after
            )));
        }
        if !(0.0..=1.0).contains(&self.age_priority_weight) {
            return Err(QueueError::Config(format!(
                "age_priority_weight must lie in [0, 1], got {}",
                self.age_priority_weight
            )));
        }
        Ok(())
    }
}
