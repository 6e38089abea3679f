//! Interactive objects: the contended resources.

use std::collections::btree_map;
use std::collections::BTreeMap;

use tw_core::{AgentId, Cell, ObjectId, ObjectTypeId, TwError, TwResult};

#[derive(Clone, PartialEq, Debug)]
pub struct InteractiveObject {
    pub id:          ObjectId,
    pub object_type: ObjectTypeId,
    pub position:    Cell,
    /// Written only by the timed-action runtime.
    pub(crate) occupied_by: Option<AgentId>,
}

impl InteractiveObject {
    pub fn new(id: ObjectId, object_type: ObjectTypeId, position: Cell) -> Self {
        Self { id, object_type, position, occupied_by: None }
    }

    #[inline]
    pub fn occupied_by(&self) -> Option<AgentId> {
        self.occupied_by
    }
}

/// All objects in the world, keyed by id.
#[derive(Clone, Debug, Default)]
pub struct ObjectTable {
    objects: BTreeMap<ObjectId, InteractiveObject>,
}

impl ObjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object.  Ids must be unique.
    pub fn add(&mut self, object: InteractiveObject) -> TwResult<()> {
        match self.objects.entry(object.id) {
            btree_map::Entry::Occupied(_) => Err(TwError::Config(format!(
                "object {} registered twice",
                object.id
            ))),
            btree_map::Entry::Vacant(v) => {
                v.insert(object);
                Ok(())
            }
        }
    }

    #[inline]
    pub fn get(&self, id: ObjectId) -> Option<&InteractiveObject> {
        self.objects.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InteractiveObject> {
        self.objects.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// `true` if at least one object carries `object_type`.
    pub fn has_type(&self, object_type: ObjectTypeId) -> bool {
        self.objects.values().any(|o| o.object_type == object_type)
    }

    pub(crate) fn set_occupant(&mut self, id: ObjectId, agent: Option<AgentId>) {
        if let Some(o) = self.objects.get_mut(&id) {
            o.occupied_by = agent;
        }
    }
}
