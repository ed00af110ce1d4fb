//! Pure damage math.
//!
//! Deterministic given the input stats; no dice rolls anywhere.

use crate::ecs::StatsComponent;

/// Physical damage: attacker strength against defender agility, floored at 1
/// so a hit always does something.
pub fn physical_damage(attacker: &StatsComponent, defender: &StatsComponent) -> i32 {
    let base_damage = attacker.strength * 2;
    let defense = defender.agility / 2;
    (base_damage - defense).max(1)
}

/// Magical damage scales with intelligence and the level of the skill used.
pub fn magical_damage(attacker: &StatsComponent, skill_level: i32) -> i32 {
    attacker.intelligence * skill_level * 3
}
