//! Entities and their component bags.

use super::component::{Component, ComponentKind};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// Unique identifier for an entity within one session's world.
pub type EntityId = Uuid;

/// A single world object: an ID plus a bag of typed components.
///
/// The bag is guarded by its own reader/writer lock so the tick loop and
/// message handlers can touch the same entity concurrently. A mutation via
/// [`Entity::update_component`] holds the write lock for the whole closure,
/// which makes multi-field updates (e.g. both velocity axes) atomic with
/// respect to readers.
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    components: RwLock<HashMap<ComponentKind, Component>>,
}

impl Entity {
    /// Creates a detached entity with a fresh ID and an empty bag.
    ///
    /// Detached entities only become visible to systems once inserted into
    /// an [`EntityStore`](super::EntityStore), so factories can attach all
    /// initial components first without snapshots observing a half-built
    /// entity.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            components: RwLock::new(HashMap::new()),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Upserts a component, keyed by its kind.
    pub fn add_component(&self, component: Component) {
        let mut components = self.components.write().unwrap();
        components.insert(component.kind(), component);
    }

    /// Returns a copy of the component of the given kind, if present.
    pub fn get_component(&self, kind: ComponentKind) -> Option<Component> {
        let components = self.components.read().unwrap();
        components.get(&kind).cloned()
    }

    pub fn has_component(&self, kind: ComponentKind) -> bool {
        let components = self.components.read().unwrap();
        components.contains_key(&kind)
    }

    pub fn remove_component(&self, kind: ComponentKind) {
        let mut components = self.components.write().unwrap();
        components.remove(&kind);
    }

    /// Mutates the component of the given kind in place, under the entity's
    /// write lock for the full duration of `f`.
    ///
    /// Returns `false` without calling `f` if the entity has no component of
    /// that kind.
    pub fn update_component<F>(&self, kind: ComponentKind, f: F) -> bool
    where
        F: FnOnce(&mut Component),
    {
        let mut components = self.components.write().unwrap();
        match components.get_mut(&kind) {
            Some(component) => {
                f(component);
                true
            }
            None => false,
        }
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::{TransformComponent, VelocityComponent};

    #[test]
    fn add_component_upserts_by_kind() {
        let entity = Entity::new();
        entity.add_component(Component::Transform(TransformComponent { x: 1.0, y: 2.0 }));
        entity.add_component(Component::Transform(TransformComponent { x: 3.0, y: 4.0 }));

        match entity.get_component(ComponentKind::Transform) {
            Some(Component::Transform(t)) => {
                assert_eq!(t.x, 3.0);
                assert_eq!(t.y, 4.0);
            }
            other => panic!("expected transform, got {other:?}"),
        }
    }

    #[test]
    fn update_component_mutates_all_fields_in_one_call() {
        let entity = Entity::new();
        entity.add_component(Component::Velocity(VelocityComponent {
            vx: 0.0,
            vy: 0.0,
            speed: 1.0,
        }));

        let updated = entity.update_component(ComponentKind::Velocity, |c| {
            if let Component::Velocity(v) = c {
                v.vx = 0.5;
                v.vy = -0.5;
            }
        });
        assert!(updated);

        match entity.get_component(ComponentKind::Velocity) {
            Some(Component::Velocity(v)) => {
                assert_eq!(v.vx, 0.5);
                assert_eq!(v.vy, -0.5);
                assert_eq!(v.speed, 1.0);
            }
            other => panic!("expected velocity, got {other:?}"),
        }
    }

    #[test]
    fn update_component_on_missing_kind_is_noop() {
        let entity = Entity::new();
        let updated = entity.update_component(ComponentKind::Velocity, |_| {
            panic!("closure must not run for a missing component")
        });
        assert!(!updated);
    }

    #[test]
    fn remove_component_clears_slot() {
        let entity = Entity::new();
        entity.add_component(Component::Transform(TransformComponent { x: 0.0, y: 0.0 }));
        assert!(entity.has_component(ComponentKind::Transform));

        entity.remove_component(ComponentKind::Transform);
        assert!(!entity.has_component(ComponentKind::Transform));
    }
}
