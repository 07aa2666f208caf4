use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use crate::{EntityId, Position, Team};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EntityStatus {
    Alive,
    /// Killed at the given event timestamp. Renderers fade the entity out from there.
    Dead { at: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub position: Position,
    pub team: Option<Team>,
    pub status: EntityStatus,
    /// Most recent positions, oldest first.
    pub trail: VecDeque<Position>,
}

impl Entity {
    pub fn spawned(position: Position, team: Option<Team>) -> Self {
        Self {
            position,
            team,
            status: EntityStatus::Alive,
            trail: VecDeque::from([position]),
        }
    }

    pub fn is_alive(&self) -> bool {
        matches!(self.status, EntityStatus::Alive)
    }
}

/// The visualized world. Only the projector writes to it; everything else
/// reads it or refers to entities by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    entities: BTreeMap<EntityId, Entity>,
}

impl EntityState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Entities in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &Entity)> {
        self.entities.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.entities.keys()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn alive_count(&self) -> usize {
        self.entities.values().filter(|e| e.is_alive()).count()
    }

    pub(crate) fn get_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub(crate) fn insert(&mut self, id: EntityId, entity: Entity) {
        self.entities.insert(id, entity);
    }

    pub(crate) fn remove(&mut self, id: &EntityId) -> Option<Entity> {
        self.entities.remove(id)
    }

    pub(crate) fn clear(&mut self) {
        self.entities.clear();
    }
}
