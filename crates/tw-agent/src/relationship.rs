//! Pairwise relationship ties.
//!
//! Handover scoring only needs to *read* ties, through the
//! [`RelationshipOracle`] trait.  The orchestrator owns the concrete
//! [`RelationshipLedger`] and feeds it conflict observations and coworker
//! nudges.
//!
//! Updates are symmetric: a delta between `a` and `b` changes both `a`'s view
//! of `b` and `b`'s view of `a`.  Trust and familiarity clamp to `[-1, 1]`,
//! rivalry to `[0, 1]`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tw_core::AgentId;

/// Rivalry added per unit of conflict intensity.
pub const RIVALRY_PER_INTENSITY: f32 = 0.05;

#[derive(Copy, Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Tie {
    pub trust:       f32,
    pub familiarity: f32,
    pub rivalry:     f32,
}

impl Tie {
    pub fn new(trust: f32, familiarity: f32, rivalry: f32) -> Self {
        Self { trust, familiarity, rivalry }.clamped()
    }

    fn clamped(self) -> Self {
        Self {
            trust:       self.trust.clamp(-1.0, 1.0),
            familiarity: self.familiarity.clamp(-1.0, 1.0),
            rivalry:     self.rivalry.clamp(0.0, 1.0),
        }
    }

    /// Affinity used to pick a handover successor.
    #[inline]
    pub fn affinity(&self) -> f32 {
        self.trust + self.familiarity - self.rivalry
    }
}

/// Read-only access to relationship scores.
pub trait RelationshipOracle {
    /// `owner`'s view of `other`.  Unknown pairs are neutral.
    fn tie(&self, owner: AgentId, other: AgentId) -> Tie;
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct TieRecord {
    pub owner: AgentId,
    pub other: AgentId,
    pub tie:   Tie,
}

/// Directed tie table keyed by `(owner, other)`.
#[derive(Clone, Debug, Default)]
pub struct RelationshipLedger {
    ties: BTreeMap<(AgentId, AgentId), Tie>,
}

impl RelationshipLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a delta to both directions of the pair.  Self-pairs are ignored.
    pub fn update(&mut self, a: AgentId, b: AgentId, trust: f32, familiarity: f32, rivalry: f32) {
        if a == b {
            return;
        }
        for key in [(a, b), (b, a)] {
            let tie = self.ties.entry(key).or_default();
            *tie = Tie {
                trust:       tie.trust + trust,
                familiarity: tie.familiarity + familiarity,
                rivalry:     tie.rivalry + rivalry,
            }
            .clamped();
        }
    }

    /// Overwrite both directions of the pair.
    pub fn set(&mut self, a: AgentId, b: AgentId, tie: Tie) {
        if a == b {
            return;
        }
        let tie = tie.clamped();
        self.ties.insert((a, b), tie);
        self.ties.insert((b, a), tie);
    }

    /// Raise rivalry between the pair in proportion to `intensity`.
    pub fn apply_rivalry(&mut self, a: AgentId, b: AgentId, intensity: f32) {
        self.update(a, b, 0.0, 0.0, RIVALRY_PER_INTENSITY * intensity);
    }

    pub fn len(&self) -> usize {
        self.ties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ties.is_empty()
    }

    pub fn export_records(&self) -> Vec<TieRecord> {
        self.ties
            .iter()
            .map(|(&(owner, other), &tie)| TieRecord { owner, other, tie })
            .collect()
    }

    pub fn import_records(&mut self, records: &[TieRecord]) {
        self.ties = records
            .iter()
            .map(|r| ((r.owner, r.other), r.tie))
            .collect();
    }
}

impl RelationshipOracle for RelationshipLedger {
    fn tie(&self, owner: AgentId, other: AgentId) -> Tie {
        self.ties.get(&(owner, other)).copied().unwrap_or_default()
    }
}
