//! Engine-wide configuration, loaded from a single JSON document.
//!
//! Every section is optional; missing sections and fields take their
//! defaults.
//!
//! ```json
//! {
//!   "sim":        { "total_ticks": 2880, "seed": 7, "ticks_per_day": 1440 },
//!   "queue":      { "cooldown_ticks": 60, "ghost_step_after": 3 },
//!   "employment": { "grace_ticks": 5, "daily_exit_cap": 2 },
//!   "rivalry":    { "ghost_step_boost": 1.5 },
//!   "need_decay": { "hunger": 0.001, "energy": 0.0005 }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tw_agent::DecayRates;
use tw_core::SimConfig;
use tw_employment::EmploymentConfig;
use tw_queue::QueueConfig;

use crate::{SimError, SimResult};

// ── RivalryConfig ─────────────────────────────────────────────────────────────

/// How strongly a ghost-step sours the evicted holder on the waiter.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RivalryConfig {
    /// Base intensity of a ghost-step.  Range `[0, 5]`.
    pub ghost_step_boost: f32,

    /// Extra intensity per waiter beyond the first.  Range `[0, 2]`.
    pub queue_length_boost: f32,
}

impl Default for RivalryConfig {
    fn default() -> Self {
        Self {
            ghost_step_boost:   1.5,
            queue_length_boost: 0.25,
        }
    }
}

impl RivalryConfig {
    pub fn validate(&self) -> SimResult<()> {
        if !(0.0..=5.0).contains(&self.ghost_step_boost) {
            return Err(SimError::Config(format!(
                "ghost_step_boost must lie in [0, 5], got {}",
                self.ghost_step_boost
            )));
        }
        if !(0.0..=2.0).contains(&self.queue_length_boost) {
            return Err(SimError::Config(format!(
                "queue_length_boost must lie in [0, 2], got {}",
                self.queue_length_boost
            )));
        }
        Ok(())
    }
}

// ── EngineConfig ──────────────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sim:        SimConfig,
    pub queue:      QueueConfig,
    pub employment: EmploymentConfig,
    pub rivalry:    RivalryConfig,
    /// Per-tick passive decay, keyed by need name.
    pub need_decay: DecayRates,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> SimResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every section.  Called by [`SimBuilder::build`][crate::SimBuilder::build].
    pub fn validate(&self) -> SimResult<()> {
        if self.sim.ticks_per_day == 0 {
            return Err(SimError::Config("ticks_per_day must be at least 1".to_string()));
        }
        self.queue.validate()?;
        self.employment.validate()?;
        self.rivalry.validate()?;
        self.need_decay.validate()?;
        Ok(())
    }
}
