//! Skill resolution extension point.

use super::System;
use crate::ecs::Entity;
use std::sync::Arc;

/// Placeholder skill system, run every tick.
///
/// Cast conditions, cooldowns and per-skill effects are not implemented
/// yet.
#[derive(Debug, Default)]
pub struct SkillSystem;

impl SkillSystem {
    pub fn new() -> Self {
        Self
    }
}

impl System for SkillSystem {
    fn update(&self, _delta_time: f64, _entities: &[Arc<Entity>]) {}
}
