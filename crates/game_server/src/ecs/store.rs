//! The entity store: an ID-indexed collection of live entities.

use super::entity::{Entity, EntityId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Container for every entity in one session's world.
///
/// Entities are handed out as `Arc<Entity>` so systems can keep iterating a
/// snapshot while the store continues to mutate concurrently. The index
/// lock is held only for map operations, never while an entity's own bag
/// lock is taken.
#[derive(Debug, Default)]
pub struct EntityStore {
    entities: RwLock<HashMap<EntityId, Arc<Entity>>>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh entity with an empty component bag and inserts it
    /// atomically.
    pub fn create_entity(&self) -> Arc<Entity> {
        self.insert_entity(Entity::new())
    }

    /// Inserts a detached entity, typically one fully built by a factory so
    /// snapshots never observe it half-constructed.
    pub fn insert_entity(&self, entity: Entity) -> Arc<Entity> {
        let entity = Arc::new(entity);
        let mut entities = self.entities.write().unwrap();
        entities.insert(entity.id(), entity.clone());
        entity
    }

    pub fn get_entity(&self, id: EntityId) -> Option<Arc<Entity>> {
        let entities = self.entities.read().unwrap();
        entities.get(&id).cloned()
    }

    /// Removes an entity from the index. Returns `true` if it was present.
    pub fn remove_entity(&self, id: EntityId) -> bool {
        let mut entities = self.entities.write().unwrap();
        entities.remove(&id).is_some()
    }

    /// Returns a defensive copy of the entity list.
    ///
    /// The returned vector is the caller's own; adding or removing entities
    /// in the store afterwards does not change it, and mutating it cannot
    /// touch the store's index.
    pub fn all_entities(&self) -> Vec<Arc<Entity>> {
        let entities = self.entities.read().unwrap();
        entities.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        let entities = self.entities.read().unwrap();
        entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
