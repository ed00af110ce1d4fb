//! Per-tick simulation systems.
//!
//! A system is stateless data transformation: it scans a snapshot of the
//! world once per tick and mutates the components it cares about, skipping
//! entities that lack them. Systems never allocate entities and never talk
//! to the network; the session's tick loop drives them in a fixed order
//! (movement, interaction, combat, skill).

pub mod combat;
pub mod damage;
pub mod interaction;
pub mod movement;
pub mod skill;

use crate::ecs::Entity;
use std::sync::Arc;

/// A stateless per-tick transform over the entity snapshot.
pub trait System {
    /// Applies one tick's worth of this system to `entities`.
    ///
    /// `delta_time` is the tick's nominal duration in seconds. Given the
    /// same entity states and delta, an implementation must produce the
    /// same result (no randomness, no wall-clock reads).
    fn update(&self, delta_time: f64, entities: &[Arc<Entity>]);
}

pub use combat::CombatSystem;
pub use interaction::InteractionSystem;
pub use movement::MovementSystem;
pub use skill::SkillSystem;
