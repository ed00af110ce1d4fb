//! Projection of the entity world into client-facing state.
//!
//! The serializer is a pure function over an entity snapshot: it never
//! mutates the store and never fails. Snapshots can race with concurrent
//! `add_component` calls on a freshly spawned entity, so every component
//! lookup is defensive; an entity missing an expected component is skipped
//! rather than reported.

use crate::ecs::{Component, ComponentKind, Entity, EntityId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerDirection {
    pub vx: f64,
    pub vy: f64,
    pub speed: f64,
}

/// Client-visible state of one player entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: Uuid,
    pub entity_id: EntityId,
    pub username: String,
    pub position: Position,
    pub direction: PlayerDirection,
}

/// Client-visible state of one door entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoorState {
    pub entity_id: EntityId,
    pub position: Position,
    pub is_open: bool,
}

/// Client-visible state of a world item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemState {
    pub entity_id: EntityId,
    pub name: String,
    pub quantity: u32,
}

/// The immutable per-room snapshot pushed to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientGameState {
    pub session_id: Uuid,
    pub players: Vec<PlayerState>,
    pub doors: Vec<DoorState>,
    pub items: Vec<ItemState>,
}

/// Serializes entity snapshots into [`ClientGameState`].
#[derive(Debug, Default)]
pub struct StateSerializer;

impl StateSerializer {
    pub fn new() -> Self {
        Self
    }

    /// Projects `entities` into the client game state for `session_id`.
    pub fn serialize(&self, session_id: Uuid, entities: &[Arc<Entity>]) -> ClientGameState {
        let mut state = ClientGameState {
            session_id,
            players: Vec::new(),
            doors: Vec::new(),
            items: Vec::new(),
        };

        for entity in entities {
            if let Some(player) = project_player(entity) {
                state.players.push(player);
                continue;
            }
            if let Some(door) = project_door(entity) {
                state.doors.push(door);
                continue;
            }
            if let Some(item) = project_item(entity) {
                state.items.push(item);
            }
        }

        state
    }
}

fn project_player(entity: &Arc<Entity>) -> Option<PlayerState> {
    let player = match entity.get_component(ComponentKind::Player) {
        Some(Component::Player(p)) => p,
        _ => return None,
    };
    let transform = match entity.get_component(ComponentKind::Transform) {
        Some(Component::Transform(t)) => t,
        _ => return None,
    };
    let velocity = match entity.get_component(ComponentKind::Velocity) {
        Some(Component::Velocity(v)) => v,
        _ => return None,
    };

    Some(PlayerState {
        id: player.player_id,
        entity_id: entity.id(),
        username: player.username,
        position: Position {
            x: transform.x,
            y: transform.y,
        },
        direction: PlayerDirection {
            vx: velocity.vx,
            vy: velocity.vy,
            speed: velocity.speed,
        },
    })
}

fn project_door(entity: &Arc<Entity>) -> Option<DoorState> {
    if !entity.has_component(ComponentKind::Door) {
        return None;
    }
    let transform = match entity.get_component(ComponentKind::Transform) {
        Some(Component::Transform(t)) => t,
        _ => return None,
    };
    let openable = match entity.get_component(ComponentKind::Openable) {
        Some(Component::Openable(o)) => o,
        _ => return None,
    };

    Some(DoorState {
        entity_id: entity.id(),
        position: Position {
            x: transform.x,
            y: transform.y,
        },
        is_open: openable.is_open,
    })
}

fn project_item(entity: &Arc<Entity>) -> Option<ItemState> {
    // Player-held items are part of the player's own record, not the world
    // item list.
    if entity.has_component(ComponentKind::Player) {
        return None;
    }
    let item = match entity.get_component(ComponentKind::Item) {
        Some(Component::Item(i)) => i,
        _ => return None,
    };

    Some(ItemState {
        entity_id: entity.id(),
        name: item.name,
        quantity: item.quantity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{
        DoorComponent, EntityStore, ItemComponent, OpenableComponent, PlayerComponent,
        TransformComponent, VelocityComponent,
    };

    #[test]
    fn serializes_players_doors_and_items() {
        let store = EntityStore::new();
        let player_id = Uuid::new_v4();

        let player = store.create_entity();
        player.add_component(Component::Player(PlayerComponent {
            player_id,
            username: "Nova".into(),
        }));
        player.add_component(Component::Transform(TransformComponent { x: 1.0, y: 2.0 }));
        player.add_component(Component::Velocity(VelocityComponent {
            vx: 0.5,
            vy: 0.0,
            speed: 1.0,
        }));

        let door = store.create_entity();
        door.add_component(Component::Door(DoorComponent));
        door.add_component(Component::Transform(TransformComponent { x: 3.0, y: 3.0 }));
        door.add_component(Component::Openable(OpenableComponent { is_open: true }));

        let item = store.create_entity();
        item.add_component(Component::Item(ItemComponent {
            name: "Health Potion".into(),
            quantity: 3,
        }));

        let session_id = Uuid::new_v4();
        let state = StateSerializer::new().serialize(session_id, &store.all_entities());

        assert_eq!(state.session_id, session_id);
        assert_eq!(state.players.len(), 1);
        assert_eq!(state.players[0].id, player_id);
        assert_eq!(state.players[0].username, "Nova");
        assert_eq!(state.players[0].position, Position { x: 1.0, y: 2.0 });
        assert_eq!(state.players[0].direction.speed, 1.0);

        assert_eq!(state.doors.len(), 1);
        assert!(state.doors[0].is_open);

        assert_eq!(state.items.len(), 1);
        assert_eq!(state.items[0].name, "Health Potion");
    }

    #[test]
    fn skips_half_constructed_entities() {
        let store = EntityStore::new();

        // Player component present but no transform/velocity yet, as a
        // snapshot racing entity construction would observe.
        let partial = store.create_entity();
        partial.add_component(Component::Player(PlayerComponent {
            player_id: Uuid::new_v4(),
            username: "ghost".into(),
        }));

        let state = StateSerializer::new().serialize(Uuid::new_v4(), &store.all_entities());
        assert!(state.players.is_empty());
        assert!(state.doors.is_empty());
        assert!(state.items.is_empty());
    }
}
