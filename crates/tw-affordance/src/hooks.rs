//! Lifecycle hook registry.
//!
//! Specs name their hooks per stage; applications register handlers under
//! `(stage, name)`.  Dispatch calls every handler for every named hook in
//! registration order and never short-circuits: one `false` marks the
//! dispatch as cancelled but the remaining handlers still run.  Only the
//! `before` stage acts on cancellation.
//!
//! Handlers receive an immutable [`HookPayload`] built per dispatch, never a
//! live reference into agent or object tables.

use std::collections::BTreeMap;

use tw_agent::EffectMap;
use tw_core::{ActionReason, AffordanceId, AgentId, ObjectId, ObjectTypeId, Tick};

use crate::ContextSnapshot;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum HookStage {
    Before,
    After,
    Fail,
}

impl HookStage {
    pub fn as_str(self) -> &'static str {
        match self {
            HookStage::Before => "before",
            HookStage::After  => "after",
            HookStage::Fail   => "fail",
        }
    }
}

/// Read-only description of the action a hook is being told about.
#[derive(Clone, PartialEq, Debug)]
pub struct HookPayload {
    pub stage:       HookStage,
    pub tick:        Tick,
    pub agent:       AgentId,
    pub object:      ObjectId,
    pub object_type: ObjectTypeId,
    pub affordance:  AffordanceId,
    pub effects:     EffectMap,
    /// Set on the `fail` stage.
    pub reason:      Option<ActionReason>,
    /// Failing precondition source, for `precondition_failed`.
    pub condition:   Option<String>,
    pub context:     Option<ContextSnapshot>,
}

/// A registered hook.  Returning `false` requests cancellation.
pub trait HookHandler: Send + Sync {
    fn invoke(&self, payload: &HookPayload) -> bool;
}

impl<F> HookHandler for F
where
    F: Fn(&HookPayload) -> bool + Send + Sync,
{
    fn invoke(&self, payload: &HookPayload) -> bool {
        self(payload)
    }
}

#[derive(Default)]
pub struct HookRegistry {
    handlers: BTreeMap<(HookStage, String), Vec<Box<dyn HookHandler>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H: HookHandler + 'static>(
        &mut self,
        stage:   HookStage,
        name:    impl Into<String>,
        handler: H,
    ) {
        self.handlers
            .entry((stage, name.into()))
            .or_default()
            .push(Box::new(handler));
    }

    pub fn is_registered(&self, stage: HookStage, name: &str) -> bool {
        self.handlers.contains_key(&(stage, name.to_string()))
    }

    /// Run every handler registered for `names` at `payload.stage`.
    ///
    /// Returns `false` if any handler asked to cancel.
    pub fn dispatch(&self, names: &[String], payload: &HookPayload) -> bool {
        let mut proceed = true;
        for name in names {
            let Some(list) = self.handlers.get(&(payload.stage, name.clone())) else {
                continue;
            };
            for handler in list {
                if !handler.invoke(payload) {
                    proceed = false;
                }
            }
        }
        proceed
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.handlers.iter().map(|((s, n), v)| ((s.as_str(), n), v.len())))
            .finish()
    }
}
