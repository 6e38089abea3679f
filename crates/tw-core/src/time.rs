//! Simulation time model.
//!
//! # Design
//!
//! Time is a monotonically increasing `Tick` counter.  Days are fixed-length
//! cycles of `ticks_per_day` ticks:
//!
//!   day         = tick / ticks_per_day
//!   tick_of_day = tick % ticks_per_day
//!
//! Job windows are expressed as `tick_of_day` offsets so shifts recur every
//! day without per-day bookkeeping.  All arithmetic is integer and exact.

use std::fmt;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Ticks elapsed from `earlier` to `self`, saturating at zero.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Tracks the current tick and maps ticks onto the day cycle.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Length of one simulated day in ticks.  Always at least 1.
    pub ticks_per_day: u64,
    /// The current tick, advanced by `SimClock::advance()` each iteration.
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(ticks_per_day: u64) -> Self {
        Self {
            ticks_per_day: ticks_per_day.max(1),
            current_tick:  Tick::ZERO,
        }
    }

    /// Advance the clock by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    /// Zero-based day index containing `tick`.
    #[inline]
    pub fn day_of(&self, tick: Tick) -> u64 {
        tick.0 / self.ticks_per_day
    }

    /// Position of `tick` within its day, in `[0, ticks_per_day)`.
    #[inline]
    pub fn tick_of_day(&self, tick: Tick) -> u64 {
        tick.0 % self.ticks_per_day
    }

    /// First tick of the day containing `tick`.
    #[inline]
    pub fn day_start(&self, tick: Tick) -> Tick {
        Tick(tick.0 - self.tick_of_day(tick))
    }

    #[inline]
    pub fn ticks_for_days(&self, days: u64) -> u64 {
        days * self.ticks_per_day
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.current_tick;
        write!(f, "{} (day {} +{})", t, self.day_of(t), self.tick_of_day(t))
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Run-level settings: how long to simulate and how to seed randomness.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Total ticks to simulate.
    pub total_ticks: u64,

    /// Master RNG seed.  The same seed and the same action stream always
    /// produce identical results.
    pub seed: u64,

    /// Length of a simulated day.  Default: 1440 (one tick per minute).
    pub ticks_per_day: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            total_ticks:   1_440,
            seed:          0,
            ticks_per_day: 1_440,
        }
    }
}

impl SimConfig {
    /// The tick at which the simulation ends (exclusive upper bound).
    #[inline]
    pub fn end_tick(&self) -> Tick {
        Tick(self.total_ticks)
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.ticks_per_day)
    }
}
