//! Proximity-driven interaction scan.

use super::System;
use crate::ecs::{Component, ComponentKind, Entity};
use std::sync::Arc;

/// Toggles openable world objects when a player stands within their
/// interaction range.
///
/// For every player-controlled entity this scans every entity carrying
/// Interactable + Openable + Transform and flips `is_open` when the
/// Euclidean distance is within the interactable's configured range.
///
/// The scan is O(players x interactables) per tick. At room scale (low
/// tens of entities) that is fine; it is a known scaling limit, not a bug.
#[derive(Debug, Default)]
pub struct InteractionSystem;

impl InteractionSystem {
    pub fn new() -> Self {
        Self
    }
}

impl System for InteractionSystem {
    fn update(&self, _delta_time: f64, entities: &[Arc<Entity>]) {
        for entity in entities {
            if !entity.has_component(ComponentKind::Player) {
                continue;
            }
            let player_transform = match entity.get_component(ComponentKind::Transform) {
                Some(Component::Transform(t)) => t,
                _ => continue,
            };

            for target in entities {
                let interactable = match target.get_component(ComponentKind::Interactable) {
                    Some(Component::Interactable(i)) => i,
                    _ => continue,
                };
                let target_transform = match target.get_component(ComponentKind::Transform) {
                    Some(Component::Transform(t)) => t,
                    _ => continue,
                };
                if !target.has_component(ComponentKind::Openable) {
                    continue;
                }

                let distance = ((player_transform.x - target_transform.x).powi(2)
                    + (player_transform.y - target_transform.y).powi(2))
                .sqrt();
                if distance > interactable.range {
                    continue;
                }

                target.update_component(ComponentKind::Openable, |c| {
                    if let Component::Openable(o) = c {
                        o.is_open = !o.is_open;
                    }
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{
        EntityStore, InteractableComponent, OpenableComponent, PlayerComponent,
        TransformComponent,
    };
    use uuid::Uuid;

    fn player_at(store: &EntityStore, x: f64, y: f64) {
        let entity = store.create_entity();
        entity.add_component(Component::Player(PlayerComponent {
            player_id: Uuid::new_v4(),
            username: "tester".into(),
        }));
        entity.add_component(Component::Transform(TransformComponent { x, y }));
    }

    fn openable_at(store: &EntityStore, x: f64, y: f64, range: f64) -> Arc<Entity> {
        let entity = store.create_entity();
        entity.add_component(Component::Transform(TransformComponent { x, y }));
        entity.add_component(Component::Openable(OpenableComponent { is_open: false }));
        entity.add_component(Component::Interactable(InteractableComponent { range }));
        entity
    }

    fn is_open(entity: &Entity) -> bool {
        matches!(
            entity.get_component(ComponentKind::Openable),
            Some(Component::Openable(OpenableComponent { is_open: true }))
        )
    }

    #[test]
    fn toggles_openable_within_range() {
        let store = EntityStore::new();
        player_at(&store, 0.0, 0.0);
        let door = openable_at(&store, 0.5, 0.5, 1.0);

        InteractionSystem::new().update(1.0, &store.all_entities());
        assert!(is_open(&door));

        // A second pass flips it back.
        InteractionSystem::new().update(1.0, &store.all_entities());
        assert!(!is_open(&door));
    }

    #[test]
    fn leaves_out_of_range_openables_alone() {
        let store = EntityStore::new();
        player_at(&store, 0.0, 0.0);
        let door = openable_at(&store, 100.0, 100.0, 1.0);

        InteractionSystem::new().update(1.0, &store.all_entities());
        assert!(!is_open(&door));
    }
}
