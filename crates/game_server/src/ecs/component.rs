//! Component definitions.
//!
//! Components are pure data, one variant per gameplay concern. They are
//! stored in an entity's bag keyed by [`ComponentKind`], so an entity holds
//! at most one component of each kind (adding again replaces the previous
//! value). Consumers `match` on the variant they need and skip entities
//! that lack it rather than treating absence as an error.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tag identifying a component slot on an entity.
///
/// Used as the key in the component bag and as the lookup argument for
/// [`Entity::get_component`](super::Entity::get_component). Each concrete
/// component maps to exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Player,
    Transform,
    Velocity,
    Health,
    Attack,
    Skill,
    Stats,
    Item,
    Door,
    Openable,
    Interactable,
    Destructible,
}

/// Identity of the player controlling an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerComponent {
    pub player_id: Uuid,
    pub username: String,
}

/// 2D world position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformComponent {
    pub x: f64,
    pub y: f64,
}

/// Direction vector plus a scalar speed multiplier.
///
/// The movement system advances position by `(vx, vy) * speed * dt`, so a
/// direction change written by the move handler only takes effect on the
/// next tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VelocityComponent {
    pub vx: f64,
    pub vy: f64,
    pub speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthComponent {
    pub current: i32,
    pub max: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackComponent {
    pub strength: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillComponent {
    pub name: String,
    pub level: i32,
}

/// Core attribute block used by the damage calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsComponent {
    pub level: i32,
    pub experience: i32,
    pub strength: i32,
    pub agility: i32,
    pub intelligence: i32,
}

impl Default for StatsComponent {
    fn default() -> Self {
        Self {
            level: 1,
            experience: 0,
            strength: 10,
            agility: 10,
            intelligence: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemComponent {
    pub name: String,
    pub quantity: u32,
}

/// Marker for door entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DoorComponent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenableComponent {
    pub is_open: bool,
}

/// Marks an entity as interactable within `range` world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractableComponent {
    pub range: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestructibleComponent {
    pub durability: i32,
    pub max_durability: i32,
}

/// Closed sum of every component a session entity can carry.
///
/// Stored by value in the entity's bag; [`Component::kind`] yields the tag
/// the bag is keyed by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Component {
    Player(PlayerComponent),
    Transform(TransformComponent),
    Velocity(VelocityComponent),
    Health(HealthComponent),
    Attack(AttackComponent),
    Skill(SkillComponent),
    Stats(StatsComponent),
    Item(ItemComponent),
    Door(DoorComponent),
    Openable(OpenableComponent),
    Interactable(InteractableComponent),
    Destructible(DestructibleComponent),
}

impl Component {
    /// Returns the bag key for this component.
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Player(_) => ComponentKind::Player,
            Component::Transform(_) => ComponentKind::Transform,
            Component::Velocity(_) => ComponentKind::Velocity,
            Component::Health(_) => ComponentKind::Health,
            Component::Attack(_) => ComponentKind::Attack,
            Component::Skill(_) => ComponentKind::Skill,
            Component::Stats(_) => ComponentKind::Stats,
            Component::Item(_) => ComponentKind::Item,
            Component::Door(_) => ComponentKind::Door,
            Component::Openable(_) => ComponentKind::Openable,
            Component::Interactable(_) => ComponentKind::Interactable,
            Component::Destructible(_) => ComponentKind::Destructible,
        }
    }
}
