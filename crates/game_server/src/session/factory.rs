//! Entity factories.
//!
//! Factories build an entity completely before inserting it into the
//! store, so a concurrent snapshot never observes a half-constructed
//! entity.

use crate::ecs::{
    Component, DoorComponent, Entity, EntityStore, HealthComponent, ItemComponent,
    OpenableComponent, PlayerComponent, SkillComponent, StatsComponent, TransformComponent,
    VelocityComponent,
};
use std::sync::Arc;
use uuid::Uuid;

/// Starting loadout for a player entity.
#[derive(Debug, Clone)]
pub struct PlayerSpawn {
    pub player_id: Uuid,
    pub username: String,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub speed: f64,
    pub skill_name: String,
    pub skill_level: i32,
    pub current_health: i32,
    pub max_health: i32,
    pub item_name: String,
    pub item_quantity: u32,
}

impl PlayerSpawn {
    /// The default loadout: origin spawn, zero velocity, a basic attack and
    /// a few potions.
    pub fn new(player_id: Uuid, username: impl Into<String>, speed: f64) -> Self {
        Self {
            player_id,
            username: username.into(),
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            speed,
            skill_name: "Basic Attack".to_string(),
            skill_level: 1,
            current_health: 100,
            max_health: 100,
            item_name: "Health Potion".to_string(),
            item_quantity: 3,
        }
    }
}

/// Builds a fully equipped player entity and inserts it into `store`.
pub fn create_player_entity(store: &EntityStore, spawn: PlayerSpawn) -> Arc<Entity> {
    let entity = Entity::new();
    entity.add_component(Component::Player(PlayerComponent {
        player_id: spawn.player_id,
        username: spawn.username,
    }));
    entity.add_component(Component::Transform(TransformComponent {
        x: spawn.x,
        y: spawn.y,
    }));
    entity.add_component(Component::Velocity(VelocityComponent {
        vx: spawn.vx,
        vy: spawn.vy,
        speed: spawn.speed,
    }));
    entity.add_component(Component::Health(HealthComponent {
        current: spawn.current_health,
        max: spawn.max_health,
    }));
    entity.add_component(Component::Skill(SkillComponent {
        name: spawn.skill_name,
        level: spawn.skill_level,
    }));
    entity.add_component(Component::Stats(StatsComponent::default()));
    entity.add_component(Component::Item(ItemComponent {
        name: spawn.item_name,
        quantity: spawn.item_quantity,
    }));

    store.insert_entity(entity)
}

/// Builds a closed door at `(x, y)` and inserts it into `store`.
pub fn create_door_entity(store: &EntityStore, x: f64, y: f64) -> Arc<Entity> {
    let entity = Entity::new();
    entity.add_component(Component::Door(DoorComponent));
    entity.add_component(Component::Transform(TransformComponent { x, y }));
    entity.add_component(Component::Openable(OpenableComponent { is_open: false }));

    store.insert_entity(entity)
}
