//! Common test utilities - roster builders for combat scenarios

#![allow(dead_code)]

use dot_combat::combat::{Attack, Combatant, DamageType, Faction};

pub fn shortsword(bonus: i32) -> Attack {
    Attack::new("Shortsword", bonus, "1d6", 0, DamageType::Piercing)
}

pub fn pc(name: &str, hit_points: i32) -> Combatant {
    Combatant::new(name, hit_points)
        .with_faction(Faction::Pcs)
        .with_control("Player")
        .with_attacks(vec![shortsword(0)])
}

pub fn enemy(name: &str, hit_points: i32) -> Combatant {
    Combatant::new(name, hit_points)
        .with_faction(Faction::Enemies)
        .with_attacks(vec![shortsword(0)])
}
