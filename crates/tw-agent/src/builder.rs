//! Fluent builder for constructing `AgentStore` + `AgentRngs` in one step.
//!
//! ```rust
//! use tw_agent::{AgentStoreBuilder, Needs};
//!
//! let (store, rngs) = AgentStoreBuilder::new(4, /*seed=*/ 42)
//!     .initial_needs(Needs::uniform(0.8))
//!     .initial_wallet(10.0)
//!     .build();
//!
//! assert_eq!(store.count, 4);
//! assert_eq!(rngs.len(), 4);
//! ```

use crate::{AgentRngs, AgentStore, Needs};

/// Fluent builder for [`AgentStore`] + [`AgentRngs`].
///
/// Positions and jobs start unset; setup code writes them directly to the
/// `pub` fields of the returned store.
pub struct AgentStoreBuilder {
    count:  usize,
    seed:   u64,
    needs:  Needs,
    wallet: f32,
}

impl AgentStoreBuilder {
    pub fn new(count: usize, seed: u64) -> Self {
        Self {
            count,
            seed,
            needs:  Needs::default(),
            wallet: 0.0,
        }
    }

    /// Starting need levels for every agent.  Default: all `1.0`.
    pub fn initial_needs(mut self, needs: Needs) -> Self {
        self.needs = needs;
        self
    }

    /// Starting wallet balance for every agent.  Default: `0.0`.
    pub fn initial_wallet(mut self, wallet: f32) -> Self {
        self.wallet = wallet;
        self
    }

    pub fn build(self) -> (AgentStore, AgentRngs) {
        let store = AgentStore::new(self.count, self.needs, self.wallet);
        let rngs = AgentRngs::new(self.count, self.seed);
        (store, rngs)
    }
}
