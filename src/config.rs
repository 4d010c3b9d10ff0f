//! Encounter configuration
//!
//! Layered with figment: built-in defaults, then an optional TOML file, then
//! `DOT_COMBAT_`-prefixed environment variables (e.g. `DOT_COMBAT_SEED=7`).

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::combat::{
    parse_dice, Attack, Combatant, DamageType, Faction, FightingStatus, RemovalCondition,
};

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    Missing(PathBuf),

    #[error("invalid configuration: {0}")]
    Figment(#[source] Box<figment::Error>),

    #[error("combatant {name}: {reason}")]
    InvalidCombatant { name: String, reason: String },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Figment(Box::new(err))
    }
}

/// Simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Seed for reproducible dice (default: OS entropy)
    #[serde(default)]
    pub seed: Option<u64>,
    /// Give up after this many rounds (default: 100)
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    /// Roster; empty means the built-in demo encounter
    #[serde(default)]
    pub combatants: Vec<CombatantConfig>,
}

fn default_max_rounds() -> u32 {
    100
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_rounds: default_max_rounds(),
            combatants: Vec::new(),
        }
    }
}

impl SimConfig {
    /// The provider stack, without extracting
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(SimConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed("DOT_COMBAT_"))
    }

    /// Load configuration, failing if an explicit file does not exist
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::Missing(path.to_path_buf()));
            }
        }
        Ok(Self::figment(path).extract()?)
    }

    /// Build the combatants, validating each entry
    pub fn roster(&self) -> Result<Vec<Combatant>, ConfigError> {
        let configs = if self.combatants.is_empty() {
            demo_roster()
        } else {
            self.combatants.clone()
        };
        configs.iter().map(CombatantConfig::build).collect()
    }
}

/// One combatant in the roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantConfig {
    pub name: String,
    pub max_hit_points: i32,
    #[serde(default)]
    pub current_hit_points: Option<i32>,
    #[serde(default = "default_armor_class")]
    pub armor_class: i32,
    #[serde(default = "default_control")]
    pub control: String,
    #[serde(default)]
    pub faction: Faction,
    #[serde(default)]
    pub fighting_status: FightingStatus,
    #[serde(default)]
    pub removal_condition: RemovalCondition,
    #[serde(default)]
    pub attacks: Vec<Attack>,
}

fn default_armor_class() -> i32 {
    10
}

fn default_control() -> String {
    "DM".to_string()
}

impl CombatantConfig {
    pub fn new(name: impl Into<String>, max_hit_points: i32, faction: Faction) -> Self {
        Self {
            name: name.into(),
            max_hit_points,
            current_hit_points: None,
            armor_class: default_armor_class(),
            control: default_control(),
            faction,
            fighting_status: FightingStatus::default(),
            removal_condition: RemovalCondition::default(),
            attacks: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidCombatant {
            name: self.name.clone(),
            reason,
        };
        if self.max_hit_points < 1 {
            return Err(invalid(format!(
                "max_hit_points must be positive, got {}",
                self.max_hit_points
            )));
        }
        for attack in &self.attacks {
            parse_dice(&attack.damage_dice)
                .map_err(|e| invalid(format!("attack {}: {}", attack.name, e)))?;
        }
        Ok(())
    }

    pub fn build(&self) -> Result<Combatant, ConfigError> {
        self.validate()?;
        Ok(Combatant::new(self.name.clone(), self.max_hit_points)
            .with_current_hit_points(self.current_hit_points)
            .with_armor_class(self.armor_class)
            .with_control(self.control.clone())
            .with_faction(self.faction)
            .with_fighting_status(self.fighting_status)
            .with_removal_condition(self.removal_condition)
            .with_attacks(self.attacks.clone()))
    }
}

/// Two adventurers against two goblins
fn demo_roster() -> Vec<CombatantConfig> {
    let longsword = Attack::new("Longsword", 5, "1d8", 3, DamageType::Slashing);
    let shortbow =
        Attack::new("Shortbow", 5, "1d6", 3, DamageType::Piercing).with_range(80, Some(320));
    let scimitar = Attack::new("Scimitar", 4, "1d6", 2, DamageType::Slashing);

    let mut fighter = CombatantConfig::new("Fighter", 12, Faction::Pcs);
    fighter.armor_class = 16;
    fighter.control = "Player".to_string();
    fighter.attacks = vec![longsword];

    let mut rogue = CombatantConfig::new("Rogue", 9, Faction::Pcs);
    rogue.armor_class = 14;
    rogue.control = "Player".to_string();
    rogue.attacks = vec![shortbow];

    let goblins = ["Goblin Boss", "Goblin"].map(|name| {
        let mut goblin = CombatantConfig::new(name, 7, Faction::Enemies);
        goblin.armor_class = 15;
        goblin.attacks = vec![scimitar.clone()];
        goblin
    });

    let mut roster = vec![fighter, rogue];
    roster.extend(goblins);
    roster
}
