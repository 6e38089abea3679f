//! Turning queue conflict observations into relationship changes.

use tracing::debug;
use tw_agent::RelationshipLedger;
use tw_core::{EventLog, SimEvent};
use tw_queue::{ConflictObservation, ConflictReason};

use crate::RivalryConfig;

/// Trust and familiarity gained (and rivalry shed) on a graceful handover.
pub const HANDOVER_NUDGE: f32 = 0.05;

const MIN_INTENSITY: f32 = 0.1;
const MAX_INTENSITY: f32 = 5.0;

/// Intensity of a ghost-step observation: the recorded value if any, else
/// the configured base plus a per-extra-waiter boost.  Always clamped.
pub fn ghost_step_intensity(config: &RivalryConfig, observation: &ConflictObservation) -> f32 {
    let raw = observation.intensity.unwrap_or_else(|| {
        let extra = observation.queue_length.saturating_sub(1) as f32;
        config.ghost_step_boost + config.queue_length_boost * extra
    });
    raw.clamp(MIN_INTENSITY, MAX_INTENSITY)
}

/// Apply one observation to `ledger`.  Self-conflicts are ignored.
pub fn apply_conflict(
    config:      &RivalryConfig,
    observation: &ConflictObservation,
    ledger:      &mut RelationshipLedger,
    events:      &mut EventLog,
) {
    let ConflictObservation { tick, object, actor, rival, reason, .. } = *observation;
    if actor == rival {
        return;
    }
    match reason {
        ConflictReason::Handover => {
            ledger.update(actor, rival, HANDOVER_NUDGE, HANDOVER_NUDGE, -HANDOVER_NUDGE);
        }
        ConflictReason::GhostStep => {
            let intensity = ghost_step_intensity(config, observation);
            ledger.apply_rivalry(actor, rival, intensity);
            events.emit(tick, SimEvent::QueueConflict { object, actor, rival, intensity });
            debug!(object = %object, actor = %actor, rival = %rival, intensity, "ghost-step rivalry applied");
        }
    }
}
