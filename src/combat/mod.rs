//! Combat system module
//!
//! Implements D&D-style combat with:
//! - Dice rolling (e.g., "2d6+3") from an injectable source
//! - Combatants with hit points, armor class and an action economy
//! - Initiative order, rounds and turns
//! - Attack resolution with to-hit, fumbles, criticals and damage
//! - Narrative and technical combat logs

mod attack;
mod combatant;
mod damage;
pub mod dice;
mod log;
mod state;

pub use attack::Attack;
pub use combatant::{
    AttackRoll, Combatant, CombatantError, CombatantId, Faction, FightingStatus, RemovalCondition,
};
pub use damage::DamageType;
pub use dice::{parse_dice, roll, DiceError, DiceRoll, DiceSource, FixedDice, RngDice, ScriptedDice};
pub use log::CombatLog;
pub use state::{AttackResult, Combat, CombatError, Location};
