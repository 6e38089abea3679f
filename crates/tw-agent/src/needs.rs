//! Needs, effect maps, and passive decay.
//!
//! Needs are normalised to `[0, 1]` where `1.0` is fully satisfied.  Effect
//! maps are parsed once at manifest load time from strings such as
//! `"hunger:0.4;money:-2"`; applying them is allocation-free.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tw_core::{TwError, TwResult};

// ── NeedKind ──────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedKind {
    Hunger,
    Hygiene,
    Energy,
    Social,
}

impl NeedKind {
    pub const ALL: [NeedKind; 4] = [
        NeedKind::Hunger,
        NeedKind::Hygiene,
        NeedKind::Energy,
        NeedKind::Social,
    ];

    #[inline]
    fn slot(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NeedKind::Hunger  => "hunger",
            NeedKind::Hygiene => "hygiene",
            NeedKind::Energy  => "energy",
            NeedKind::Social  => "social",
        }
    }

    pub fn parse(s: &str) -> Option<NeedKind> {
        NeedKind::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for NeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Needs ─────────────────────────────────────────────────────────────────────

/// One agent's need levels.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Needs([f32; 4]);

impl Needs {
    /// Every need at `level` (clamped).
    pub fn uniform(level: f32) -> Self {
        Needs([level.clamp(0.0, 1.0); 4])
    }

    #[inline]
    pub fn get(&self, kind: NeedKind) -> f32 {
        self.0[kind.slot()]
    }

    #[inline]
    pub fn set(&mut self, kind: NeedKind, level: f32) {
        self.0[kind.slot()] = level.clamp(0.0, 1.0);
    }

    #[inline]
    pub fn adjust(&mut self, kind: NeedKind, delta: f32) {
        self.set(kind, self.get(kind) + delta);
    }
}

impl Default for Needs {
    fn default() -> Self {
        Needs::uniform(1.0)
    }
}

// ── Effects ───────────────────────────────────────────────────────────────────

/// The agent dimension an effect entry changes.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum EffectTarget {
    Need(NeedKind),
    /// Added to the wallet; the wallet never goes below zero.
    Money,
}

impl EffectTarget {
    fn parse(s: &str) -> Option<EffectTarget> {
        match s {
            "money" => Some(EffectTarget::Money),
            other   => NeedKind::parse(other).map(EffectTarget::Need),
        }
    }
}

/// Deltas applied to an agent when a timed action completes.
///
/// Entries are kept sorted by target so application order is canonical.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct EffectMap(Vec<(EffectTarget, f32)>);

impl EffectMap {
    pub fn new(mut entries: Vec<(EffectTarget, f32)>) -> Self {
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        EffectMap(entries)
    }

    /// Parse `"name:delta;name:delta"`.  An empty or blank string is an
    /// empty map.
    pub fn parse(s: &str) -> TwResult<Self> {
        let mut entries = Vec::new();
        for part in s.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, value) = part.split_once(':').ok_or_else(|| {
                TwError::Parse(format!("effect {part:?}: expected name:delta"))
            })?;
            let target = EffectTarget::parse(name.trim()).ok_or_else(|| {
                TwError::Parse(format!("unknown effect target {:?}", name.trim()))
            })?;
            let delta: f32 = value.trim().parse().map_err(|_| {
                TwError::Parse(format!("effect {part:?}: delta is not a number"))
            })?;
            entries.push((target, delta));
        }
        Ok(EffectMap::new(entries))
    }

    pub fn iter(&self) -> impl Iterator<Item = &(EffectTarget, f32)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ── Decay ─────────────────────────────────────────────────────────────────────

/// Per-tick passive need decay, keyed by need name in configuration files.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecayRates(pub BTreeMap<NeedKind, f32>);

impl DecayRates {
    pub fn rate(&self, kind: NeedKind) -> f32 {
        self.0.get(&kind).copied().unwrap_or(0.0)
    }

    pub fn validate(&self) -> TwResult<()> {
        for (kind, rate) in &self.0 {
            if !rate.is_finite() || *rate < 0.0 {
                return Err(TwError::Config(format!(
                    "decay rate for {kind} must be a non-negative number, got {rate}"
                )));
            }
        }
        Ok(())
    }
}
