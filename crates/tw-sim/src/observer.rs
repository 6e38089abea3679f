//! Simulation observer trait for progress reporting and event collection.

use tw_core::{SimEvent, Tick};

use crate::World;

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] at key points in the
/// tick loop.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: event counter
///
/// ```rust,ignore
/// struct Counter(usize);
///
/// impl SimObserver for Counter {
///     fn on_event(&mut self, _tick: Tick, _event: &SimEvent) {
///         self.0 += 1;
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each tick, before decisions are taken.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called once per event emitted during the tick, in emission order.
    fn on_event(&mut self, _tick: Tick, _event: &SimEvent) {}

    /// Called at the end of each tick with read-only access to the world.
    ///
    /// `applied` is the number of non-idle actions applied this tick.
    fn on_tick_end(&mut self, _tick: Tick, _applied: usize, _world: &World) {}

    /// Called once after the final tick completes.
    fn on_sim_end(&mut self, _final_tick: Tick) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
