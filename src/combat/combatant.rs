//! Combatants
//!
//! A single participant in a combat: hit points, armor class, attacks, the
//! per-turn action economy and which side it fights for.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::dice::{is_critical, saturate, DiceError, DiceRoll, DiceSource};
use super::{Attack, DamageType};

/// Errors raised by a combatant acting on its own
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombatantError {
    #[error("{0} has no action available")]
    NoActionAvailable(String),

    #[error("{combatant} does not have the attack {attack}")]
    AttackNotAvailable { combatant: String, attack: String },

    #[error("cannot roll with both advantage and disadvantage")]
    InvalidRollModifiers,

    #[error(transparent)]
    Dice(#[from] DiceError),
}

/// Identity of a combatant.
///
/// Two combatants with identical stats are still different combatants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CombatantId(Uuid);

impl CombatantId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for CombatantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side a combatant fights on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    /// Player characters and their allies
    Pcs,
    #[default]
    Enemies,
}

impl std::fmt::Display for Faction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Faction::Pcs => write!(f, "PCs"),
            Faction::Enemies => write!(f, "enemies"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FightingStatus {
    #[default]
    Fighting,
    Fleeing,
    Fled,
}

/// When a combatant should leave the combat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalCondition {
    /// Removed as soon as it drops to 0 HP
    #[default]
    ZeroHp,
    /// Stays in at 0 HP (death saves); removed only once dead
    Dead,
    /// Removed only once it has fled
    Fled,
}

/// Result of an attack roll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackRoll {
    /// Raw die plus attack bonus
    pub total: i32,
    /// The d20 that counted
    pub raw: u32,
    /// Whether the raw die was a natural 20
    pub critical: bool,
}

/// A participant in a combat
#[derive(Debug)]
pub struct Combatant {
    id: CombatantId,
    name: String,
    control: String,
    max_hit_points: i32,
    current_hit_points: i32,
    conscious: bool,
    armor_class: i32,
    attacks: Vec<Attack>,
    initiative: Option<i32>,
    pub faction: Faction,
    pub fighting_status: FightingStatus,
    pub removal_condition: RemovalCondition,
    pub movement_available: bool,
    pub action_available: bool,
    pub bonus_action_available: bool,
    pub reaction_available: bool,
    pub is_dodging: bool,
    pub is_disengaging: bool,
    pub is_readied: bool,
}

impl Combatant {
    /// Create a combatant at full health.
    ///
    /// `max_hit_points` below 1 is raised to 1; validate first (as
    /// `CombatantConfig::validate` does) to reject such values instead.
    pub fn new(name: impl Into<String>, max_hit_points: i32) -> Self {
        let max_hit_points = max_hit_points.max(1);
        Self {
            id: CombatantId::generate(),
            name: name.into(),
            control: "DM".to_string(),
            max_hit_points,
            current_hit_points: max_hit_points,
            conscious: true,
            armor_class: 10,
            attacks: Vec::new(),
            initiative: None,
            faction: Faction::default(),
            fighting_status: FightingStatus::default(),
            removal_condition: RemovalCondition::default(),
            movement_available: true,
            action_available: true,
            bonus_action_available: true,
            reaction_available: true,
            is_dodging: false,
            is_disengaging: false,
            is_readied: false,
        }
    }

    /// Start below full health. `None` keeps the maximum.
    pub fn with_current_hit_points(mut self, current: Option<i32>) -> Self {
        self.current_hit_points = current
            .unwrap_or(self.max_hit_points)
            .clamp(0, self.max_hit_points);
        self.conscious = self.current_hit_points > 0;
        self
    }

    pub fn with_armor_class(mut self, armor_class: i32) -> Self {
        self.armor_class = armor_class;
        self
    }

    pub fn with_attacks(mut self, attacks: Vec<Attack>) -> Self {
        self.attacks = attacks;
        self
    }

    pub fn with_faction(mut self, faction: Faction) -> Self {
        self.faction = faction;
        self
    }

    pub fn with_fighting_status(mut self, status: FightingStatus) -> Self {
        self.fighting_status = status;
        self
    }

    pub fn with_removal_condition(mut self, condition: RemovalCondition) -> Self {
        self.removal_condition = condition;
        self
    }

    /// Who directs this combatant (a player name, "DM", ...)
    pub fn with_control(mut self, control: impl Into<String>) -> Self {
        self.control = control.into();
        self
    }

    pub fn id(&self) -> CombatantId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn control(&self) -> &str {
        &self.control
    }

    pub fn max_hit_points(&self) -> i32 {
        self.max_hit_points
    }

    pub fn current_hit_points(&self) -> i32 {
        self.current_hit_points
    }

    /// Consciousness as last set by [`Combatant::take_damage`]
    pub fn conscious(&self) -> bool {
        self.conscious
    }

    /// Whether the combatant has any hit points left
    pub fn is_conscious(&self) -> bool {
        self.current_hit_points > 0
    }

    pub fn armor_class(&self) -> i32 {
        self.armor_class
    }

    pub fn attacks(&self) -> &[Attack] {
        &self.attacks
    }

    /// Last rolled initiative
    pub fn initiative(&self) -> Option<i32> {
        self.initiative
    }

    /// Take damage. Damage equal to or above current HP drops to 0 and
    /// knocks the combatant unconscious.
    pub fn take_damage(&mut self, amount: i32, damage_type: DamageType) {
        let amount = amount.max(0);
        self.conscious = amount < self.current_hit_points;
        if self.conscious {
            self.current_hit_points -= amount;
        } else {
            self.current_hit_points = 0;
        }
        tracing::trace!(
            combatant = %self.name,
            amount,
            %damage_type,
            hp = self.current_hit_points,
            "took damage"
        );
    }

    /// Heal (cannot exceed max_hit_points)
    pub fn heal(&mut self, amount: i32) {
        let amount = amount.max(0);
        self.current_hit_points = self
            .current_hit_points
            .saturating_add(amount)
            .min(self.max_hit_points);
    }

    /// Roll a d20 plus dexterity modifier and remember it
    pub fn roll_initiative<D: DiceSource + ?Sized>(&mut self, dex_modifier: i32, dice: &mut D) -> i32 {
        let initiative = DiceRoll::new(1, 20, dex_modifier).roll_with(dice);
        self.initiative = Some(initiative);
        initiative
    }

    /// Should this combatant leave the combat?
    pub fn removal_conditions_met(&self) -> bool {
        if self.fighting_status == FightingStatus::Fled {
            return true;
        }
        self.removal_condition == RemovalCondition::ZeroHp && self.current_hit_points <= 0
    }

    /// Refresh the action economy and drop last turn's stance
    pub fn start_turn(&mut self) {
        self.movement_available = true;
        self.action_available = true;
        self.bonus_action_available = true;
        self.reaction_available = true;
        self.is_dodging = false;
        self.is_disengaging = false;
        self.is_readied = false;
    }

    /// Spend what is left of the turn. The reaction stays available.
    pub fn end_turn(&mut self) {
        self.movement_available = false;
        self.action_available = false;
        self.bonus_action_available = false;
    }

    /// Take the Disengage action
    pub fn disengage(&mut self) -> Result<(), CombatantError> {
        self.use_action()?;
        self.is_disengaging = true;
        Ok(())
    }

    /// Take the Dodge action
    pub fn dodge(&mut self) -> Result<(), CombatantError> {
        self.use_action()?;
        self.is_dodging = true;
        Ok(())
    }

    /// Take the Ready action
    pub fn make_ready(&mut self) -> Result<(), CombatantError> {
        self.use_action()?;
        self.is_readied = true;
        Ok(())
    }

    /// Trigger a previously readied action
    pub fn take_readied_action(&mut self) -> Result<(), CombatantError> {
        if !self.is_readied {
            return Err(CombatantError::NoActionAvailable(self.name.clone()));
        }
        self.is_readied = false;
        Ok(())
    }

    fn use_action(&mut self) -> Result<(), CombatantError> {
        if !self.action_available {
            return Err(CombatantError::NoActionAvailable(self.name.clone()));
        }
        self.action_available = false;
        Ok(())
    }

    /// Roll to hit with one of this combatant's attacks
    pub fn roll_attack<D: DiceSource + ?Sized>(
        &self,
        attack: &Attack,
        with_advantage: bool,
        with_disadvantage: bool,
        dice: &mut D,
    ) -> Result<AttackRoll, CombatantError> {
        self.check_attack(attack)?;
        if with_advantage && with_disadvantage {
            return Err(CombatantError::InvalidRollModifiers);
        }

        let first = dice.roll_die(20);
        let raw = if with_advantage {
            first.max(dice.roll_die(20))
        } else if with_disadvantage {
            first.min(dice.roll_die(20))
        } else {
            first
        };

        Ok(AttackRoll {
            total: saturate(i64::from(raw) + i64::from(attack.attack_bonus)),
            raw,
            critical: is_critical(raw),
        })
    }

    /// Roll damage for an attack. A critical hit rolls the damage dice twice;
    /// the flat bonus is added once.
    pub fn roll_damage<D: DiceSource + ?Sized>(
        &self,
        attack: &Attack,
        critical_hit: bool,
        dice: &mut D,
    ) -> Result<(i32, DamageType), CombatantError> {
        let damage_dice: DiceRoll = attack.damage_dice.parse()?;
        let mut amount = damage_dice.roll_with(dice);
        if critical_hit {
            amount = amount.saturating_add(damage_dice.roll_with(dice));
        }
        Ok((amount.saturating_add(attack.damage_bonus), attack.damage_type))
    }

    fn check_attack(&self, attack: &Attack) -> Result<(), CombatantError> {
        if self.attacks.contains(attack) {
            Ok(())
        } else {
            Err(CombatantError::AttackNotAvailable {
                combatant: self.name.clone(),
                attack: attack.name.clone(),
            })
        }
    }
}

impl std::fmt::Display for Combatant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
