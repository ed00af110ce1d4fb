//! Movement integration over velocity.

use super::System;
use crate::ecs::{Component, ComponentKind, Entity};
use std::sync::Arc;

/// Advances every movable entity by its velocity each tick.
///
/// An entity is movable when it carries both Transform and Velocity;
/// anything else is skipped. Position integrates as
/// `position += direction * speed * delta_time`.
#[derive(Debug, Default)]
pub struct MovementSystem;

impl MovementSystem {
    pub fn new() -> Self {
        Self
    }
}

impl System for MovementSystem {
    fn update(&self, delta_time: f64, entities: &[Arc<Entity>]) {
        for entity in entities {
            let velocity = match entity.get_component(ComponentKind::Velocity) {
                Some(Component::Velocity(v)) => v,
                _ => continue,
            };
            if !entity.has_component(ComponentKind::Transform) {
                continue;
            }

            entity.update_component(ComponentKind::Transform, |c| {
                if let Component::Transform(t) = c {
                    t.x += velocity.vx * velocity.speed * delta_time;
                    t.y += velocity.vy * velocity.speed * delta_time;
                }
            });
        }
    }
}
