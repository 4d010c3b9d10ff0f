//! Attacks available to a combatant

use serde::{Deserialize, Serialize};

use super::DamageType;

/// A weapon or natural attack a combatant can use
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attack {
    pub name: String,
    /// Added to the d20 when rolling to hit
    pub attack_bonus: i32,
    /// Dice expression rolled for damage, e.g. "1d8"
    pub damage_dice: String,
    /// Flat bonus added once, even on a critical hit
    #[serde(default)]
    pub damage_bonus: i32,
    pub damage_type: DamageType,
    /// Normal range in feet
    #[serde(default = "default_range")]
    pub range: u32,
    /// Long range in feet, for ranged attacks
    #[serde(default)]
    pub long_range: Option<u32>,
}

fn default_range() -> u32 {
    5
}

impl Attack {
    /// Create a melee attack with 5ft reach
    pub fn new(
        name: impl Into<String>,
        attack_bonus: i32,
        damage_dice: impl Into<String>,
        damage_bonus: i32,
        damage_type: DamageType,
    ) -> Self {
        Self {
            name: name.into(),
            attack_bonus,
            damage_dice: damage_dice.into(),
            damage_bonus,
            damage_type,
            range: default_range(),
            long_range: None,
        }
    }

    /// Set normal and long range
    pub fn with_range(mut self, range: u32, long_range: Option<u32>) -> Self {
        self.range = range;
        self.long_range = long_range;
        self
    }
}

impl std::fmt::Display for Attack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
