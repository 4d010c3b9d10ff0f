//! dot-combat - turn-based tabletop combat simulator
//!
//! Tracks initiative and hit points for a roster of combatants and
//! resolves their attacks until one side is left.

pub mod combat;
pub mod config;
pub mod sim;

pub use combat::{Attack, Combat, CombatError, Combatant, CombatantId, DamageType, Faction};
pub use config::{CombatantConfig, ConfigError, SimConfig};
pub use sim::{run_encounter, EncounterReport};
