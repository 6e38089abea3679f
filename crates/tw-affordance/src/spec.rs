//! Affordance specs and the registry that resolves them.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tw_agent::EffectMap;
use tw_core::{AffordanceId, ObjectTypeId};

use crate::{AffordanceError, AffordanceResult, HookRegistry, HookStage, ObjectTable, Precondition};

/// Hook names per lifecycle stage.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct StageHooks {
    pub before: Vec<String>,
    pub after:  Vec<String>,
    pub fail:   Vec<String>,
}

impl StageHooks {
    pub fn names(&self, stage: HookStage) -> &[String] {
        match stage {
            HookStage::Before => &self.before,
            HookStage::After  => &self.after,
            HookStage::Fail   => &self.fail,
        }
    }
}

/// A timed action that can be performed on one object type.
#[derive(Clone, Debug)]
pub struct AffordanceSpec {
    pub id:            AffordanceId,
    pub name:          String,
    pub object_type:   ObjectTypeId,
    /// Ticks to completion.  Zero is treated as one.
    pub duration:      u32,
    pub effects:       EffectMap,
    pub preconditions: Vec<Arc<dyn Precondition>>,
    pub hooks:         StageHooks,
}

impl AffordanceSpec {
    #[inline]
    pub fn effective_duration(&self) -> u32 {
        self.duration.max(1)
    }
}

#[derive(Clone, Debug, Default)]
pub struct AffordanceRegistry {
    specs:   BTreeMap<AffordanceId, AffordanceSpec>,
    by_name: HashMap<String, AffordanceId>,
}

impl AffordanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, spec: AffordanceSpec) -> AffordanceResult<()> {
        if self.specs.contains_key(&spec.id) || self.by_name.contains_key(&spec.name) {
            return Err(AffordanceError::Duplicate(spec.id));
        }
        self.by_name.insert(spec.name.clone(), spec.id);
        self.specs.insert(spec.id, spec);
        Ok(())
    }

    #[inline]
    pub fn get(&self, id: AffordanceId) -> Option<&AffordanceSpec> {
        self.specs.get(&id)
    }

    pub fn id_of(&self, name: &str) -> Option<AffordanceId> {
        self.by_name.get(name).copied()
    }

    /// The spec for `id` if it applies to `object_type`.
    pub fn resolve(&self, id: AffordanceId, object_type: ObjectTypeId) -> Option<&AffordanceSpec> {
        self.get(id).filter(|s| s.object_type == object_type)
    }

    /// Affordances available on objects of `object_type`.
    pub fn for_type(&self, object_type: ObjectTypeId) -> impl Iterator<Item = &AffordanceSpec> {
        self.specs.values().filter(move |s| s.object_type == object_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AffordanceSpec> {
        self.specs.values()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Setup-time check: every spec targets an object type that exists and
    /// names only registered hooks.
    pub fn validate(&self, objects: &ObjectTable, hooks: &HookRegistry) -> AffordanceResult<()> {
        for spec in self.specs.values() {
            if !objects.has_type(spec.object_type) {
                return Err(AffordanceError::UnknownObjectType {
                    affordance:  spec.id,
                    object_type: spec.object_type,
                });
            }
            for stage in [HookStage::Before, HookStage::After, HookStage::Fail] {
                for name in spec.hooks.names(stage) {
                    if !hooks.is_registered(stage, name) {
                        return Err(AffordanceError::UnregisteredHook {
                            affordance: spec.id,
                            stage,
                            name: name.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
