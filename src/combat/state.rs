//! Combat state tracking
//!
//! A [`Combat`] owns the roster and the initiative order and steps through
//! rounds and turns:
//! - Initiative rolled per combatant and bucketed by value
//! - Turn order within a bucket follows join order
//! - Attack resolution with to-hit, fumbles and critical hits
//! - Combat ends once only one faction is left

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::info;

use super::combatant::{Combatant, CombatantError, CombatantId, Faction};
use super::dice::{is_critical, is_fumble, DiceSource, RngDice};
use super::log::CombatLog;
use super::{Attack, DamageType};

/// Where a combatant was looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Roster,
    InitiativeOrder,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Roster => write!(f, "combatant list"),
            Location::InitiativeOrder => write!(f, "initiative order"),
        }
    }
}

/// Errors raised by combat operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombatError {
    #[error("combatant {combatant} not found in {location}")]
    NotFound {
        combatant: CombatantId,
        location: Location,
    },

    #[error("combat is not in progress")]
    NotInProgress,

    /// The current combatant is missing from its own initiative bucket.
    #[error("could not find {combatant} in the list for initiative {initiative}")]
    CombatantNotFound {
        combatant: CombatantId,
        initiative: i32,
    },

    #[error("combat cannot start")]
    CannotStart,

    #[error("initiative order is empty")]
    NoInitiatives,

    #[error(transparent)]
    Combatant(#[from] CombatantError),
}

/// Result of a managed attack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackResult {
    /// The d20 roll
    pub roll: u32,
    /// Total attack value (roll + bonus)
    pub attack_total: i32,
    /// Target's AC
    pub target_ac: i32,
    /// Whether the attack hit
    pub hit: bool,
    /// Whether it was a critical hit
    pub critical: bool,
    /// Whether it was a fumble
    pub fumble: bool,
    /// Damage dealt if hit
    pub damage: Option<(i32, DamageType)>,
}

impl AttackResult {
    fn new(roll: u32, attack_total: i32, target_ac: i32) -> Self {
        Self {
            roll,
            attack_total,
            target_ac,
            hit: false,
            critical: false,
            fumble: false,
            damage: None,
        }
    }
}

/// A single combat encounter
#[derive(Debug)]
pub struct Combat {
    combatants: Vec<Combatant>,
    /// Initiative value -> combatants in join order
    initiative_order: BTreeMap<i32, Vec<CombatantId>>,
    /// Keys of `initiative_order`, highest first
    used_initiatives: Vec<i32>,
    current_round: u32,
    current_initiative: i32,
    current_combatant: Option<CombatantId>,
    has_started: bool,
    has_finished: bool,
    log: CombatLog,
    dice: Box<dyn DiceSource>,
}

impl Combat {
    /// Create a combat with the given combatants, rolling with OS entropy
    pub fn new(combatants: Vec<Combatant>) -> Self {
        Self::with_dice(combatants, RngDice::from_entropy())
    }

    /// Create a combat that rolls with the given dice
    pub fn with_dice(combatants: Vec<Combatant>, dice: impl DiceSource + 'static) -> Self {
        Self {
            combatants,
            initiative_order: BTreeMap::new(),
            used_initiatives: Vec::new(),
            current_round: 0,
            current_initiative: 0,
            current_combatant: None,
            has_started: false,
            has_finished: false,
            log: CombatLog::new(),
            dice: Box::new(dice),
        }
    }

    /// Swap the dice used for all further rolls
    pub fn set_dice(&mut self, dice: impl DiceSource + 'static) {
        self.dice = Box::new(dice);
    }

    pub fn combatants(&self) -> &[Combatant] {
        &self.combatants
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.id() == id)
    }

    pub fn combatant_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.combatants.iter_mut().find(|c| c.id() == id)
    }

    pub fn initiative_order(&self) -> &BTreeMap<i32, Vec<CombatantId>> {
        &self.initiative_order
    }

    /// Combatants sharing an initiative value, in turn order
    pub fn initiative_bucket(&self, initiative: i32) -> Option<&[CombatantId]> {
        self.initiative_order.get(&initiative).map(Vec::as_slice)
    }

    /// Initiative values in use, highest first
    pub fn used_initiatives(&self) -> &[i32] {
        &self.used_initiatives
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn current_initiative(&self) -> i32 {
        self.current_initiative
    }

    pub fn current_combatant(&self) -> Option<CombatantId> {
        self.current_combatant
    }

    pub fn has_started(&self) -> bool {
        self.has_started
    }

    pub fn has_finished(&self) -> bool {
        self.has_finished
    }

    pub fn narrative_log(&self) -> &str {
        self.log.narrative()
    }

    pub fn technical_log(&self) -> &str {
        self.log.technical()
    }

    fn narrate(&mut self, comment: &str) {
        self.log.narrate(self.current_round, self.current_initiative, comment);
    }

    fn trace(&mut self, comment: &str) {
        self.log.trace(self.current_round, self.current_initiative, comment);
    }

    fn index_of(&self, id: CombatantId) -> Result<usize, CombatError> {
        self.combatants
            .iter()
            .position(|c| c.id() == id)
            .ok_or(CombatError::NotFound {
                combatant: id,
                location: Location::Roster,
            })
    }

    fn name_of(&self, id: CombatantId) -> String {
        match self.combatant(id) {
            Some(c) => c.name().to_string(),
            None => id.to_string(),
        }
    }

    fn populate_used_initiatives(&mut self) {
        self.trace("Repopulated used initiative list.");
        self.used_initiatives = self.initiative_order.keys().rev().copied().collect();
    }

    /// Roll initiative for every combatant and bucket them by value
    pub fn fill_initiative_list(&mut self) {
        self.trace("Filled initiative order.");
        self.initiative_order.clear();
        for combatant in self.combatants.iter_mut() {
            let initiative = combatant.roll_initiative(0, self.dice.as_mut());
            self.initiative_order
                .entry(initiative)
                .or_default()
                .push(combatant.id());
        }
        self.populate_used_initiatives();
    }

    /// Add a combatant. It only gets an initiative if the order is already
    /// filled; otherwise it waits for [`Combat::fill_initiative_list`].
    pub fn add_combatant(&mut self, mut combatant: Combatant) -> CombatantId {
        let id = combatant.id();
        self.narrate(&format!("Combatant {} joined the combat.", combatant));
        if !self.initiative_order.is_empty() {
            let initiative = combatant.roll_initiative(0, self.dice.as_mut());
            self.initiative_order.entry(initiative).or_default().push(id);
        }
        self.combatants.push(combatant);
        self.populate_used_initiatives();
        id
    }

    /// Add several combatants in order
    pub fn add_combatants(&mut self, combatants: Vec<Combatant>) -> Vec<CombatantId> {
        self.trace(&format!("Adding {} new combatants.", combatants.len()));
        combatants
            .into_iter()
            .map(|c| self.add_combatant(c))
            .collect()
    }

    /// True when everything is in place to begin
    pub fn can_start_combat(&mut self) -> bool {
        if self.combatants.is_empty() {
            self.trace("Cannot start combat as there are no combatants.");
            return false;
        }
        if self.initiative_order.is_empty() {
            self.trace("Cannot start combat as the initiative order is not populated.");
            return false;
        }
        if self.current_round != 0 {
            let comment = format!("Cannot start combat as current round = {}.", self.current_round);
            self.trace(&comment);
            return false;
        }
        self.trace("Can start combat.");
        true
    }

    /// Begin round 1 with the first combatant of the highest initiative
    pub fn start_combat(&mut self) -> Result<(), CombatError> {
        if !self.can_start_combat() {
            return Err(CombatError::CannotStart);
        }
        let initiative = *self.used_initiatives.first().ok_or(CombatError::NoInitiatives)?;
        let first = self
            .initiative_order
            .get(&initiative)
            .and_then(|bucket| bucket.first())
            .copied()
            .ok_or(CombatError::NoInitiatives)?;

        self.trace("Starting combat.");
        self.current_round = 1;
        self.current_initiative = initiative;
        self.current_combatant = Some(first);
        self.has_started = true;
        Ok(())
    }

    /// Who acts after the current combatant. Does not change any state.
    pub fn next_combatant(&mut self) -> Result<CombatantId, CombatError> {
        self.trace("Getting next combatant.");
        if !self.has_started || self.has_finished {
            self.trace("Trying to determine next_combatant when combat is not in progress");
            return Err(CombatError::NotInProgress);
        }
        let current = self.current_combatant.ok_or(CombatError::NotInProgress)?;

        if let Some(bucket) = self.initiative_order.get(&self.current_initiative) {
            if bucket.len() > 1 && bucket.last() != Some(&current) {
                return match bucket.iter().position(|id| *id == current) {
                    Some(position) => Ok(bucket[position + 1]),
                    None => Err(CombatError::CombatantNotFound {
                        combatant: current,
                        initiative: self.current_initiative,
                    }),
                };
            }
        }

        let next_initiative = self.next_initiative()?;
        self.initiative_order
            .get(&next_initiative)
            .and_then(|bucket| bucket.first())
            .copied()
            .ok_or(CombatError::NoInitiatives)
    }

    /// End the current turn and start the next combatant's
    pub fn advance_combatant(&mut self) -> Result<CombatantId, CombatError> {
        let next = self.next_combatant()?;
        let next_index = self.index_of(next)?;
        let next_name = self.combatants[next_index].name().to_string();
        self.trace(&format!("Moving to Combatant {}.", next_name));

        if let Some(current) = self.current_combatant {
            if let Ok(index) = self.index_of(current) {
                self.combatants[index].end_turn();
                let comment = format!("Combatant {}'s turn is over.", self.combatants[index]);
                self.narrate(&comment);
            }
        }

        self.current_combatant = Some(next);
        self.combatants[next_index].start_turn();
        self.narrate(&format!("Combatant {}'s turn is starting.", next_name));
        Ok(next)
    }

    /// The next lower initiative in use, wrapping to the highest
    pub fn next_initiative(&self) -> Result<i32, CombatError> {
        self.used_initiatives
            .iter()
            .copied()
            .find(|initiative| *initiative < self.current_initiative)
            .or_else(|| self.used_initiatives.first().copied())
            .ok_or(CombatError::NoInitiatives)
    }

    pub fn advance_initiative(&mut self) -> Result<i32, CombatError> {
        let next = self.next_initiative()?;
        self.trace(&format!("Moving to initiative {}.", next));
        self.current_initiative = next;
        Ok(next)
    }

    /// Increment the round number and return it
    pub fn advance_round(&mut self) -> u32 {
        self.trace(&format!("Starting round {}.", self.current_round + 1));
        self.current_round += 1;
        self.current_round
    }

    /// Detach a combatant from this combat and hand it back.
    ///
    /// Nothing is changed unless the combatant is found in both the roster
    /// and (when filled) the initiative order. Ends the combat if only one
    /// faction is left afterwards.
    pub fn remove_combatant(&mut self, id: CombatantId) -> Result<Combatant, CombatError> {
        let index = self.index_of(id)?;
        let initiative = if self.initiative_order.is_empty() {
            None
        } else {
            let found = self
                .initiative_order
                .iter()
                .find(|(_, bucket)| bucket.contains(&id))
                .map(|(initiative, _)| *initiative);
            Some(found.ok_or(CombatError::NotFound {
                combatant: id,
                location: Location::InitiativeOrder,
            })?)
        };

        let removed = self.combatants.remove(index);
        self.narrate(&format!("Removing Combatant {}.", removed));

        if let Some(initiative) = initiative {
            let now_empty = match self.initiative_order.get_mut(&initiative) {
                Some(bucket) => {
                    bucket.retain(|member| *member != id);
                    bucket.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.initiative_order.remove(&initiative);
                self.populate_used_initiatives();
            }
        }

        if self.combat_over() && !self.has_finished {
            self.end_combat();
        }
        Ok(removed)
    }

    /// Whether only one faction is left standing
    pub fn combat_over(&mut self) -> bool {
        if !self.has_started {
            self.trace("Combat cannot end because it has not started.");
            return false;
        }

        let pcs_present = self.combatants.iter().any(|c| c.faction == Faction::Pcs);
        let enemies_present = self.combatants.iter().any(|c| c.faction == Faction::Enemies);
        if pcs_present && enemies_present {
            self.trace("Combat cannot end because multiple factions are still present.");
            return false;
        }
        self.trace("Combat can end.");
        true
    }

    pub fn end_combat(&mut self) {
        self.trace("Ending the combat.");
        self.has_finished = true;
        info!(
            rounds = self.current_round,
            remaining = self.combatants.len(),
            "combat finished"
        );
    }

    /// Apply damage and remove the combatant if it drops below 1 HP.
    ///
    /// Returns the combatant if it was removed.
    pub fn damage_combatant(
        &mut self,
        id: CombatantId,
        amount: i32,
        damage_type: DamageType,
    ) -> Result<Option<Combatant>, CombatError> {
        let index = self.index_of(id)?;
        let name = self.combatants[index].name().to_string();
        self.trace(&format!("{} takes {} HP of {} damage.", name, amount, damage_type));

        self.combatants[index].take_damage(amount, damage_type);
        if self.combatants[index].current_hit_points() < 1 {
            self.trace(&format!("{} has 0HP or fewer, and is removed.", name));
            return self.remove_combatant(id).map(Some);
        }
        Ok(None)
    }

    /// Roll to hit and apply any damage to the target.
    ///
    /// A natural 1 always misses and a natural 20 always crits. Damage goes
    /// straight to the target: a target dropped to 0 HP here stays in the
    /// roster until someone removes it.
    pub fn manage_attack(
        &mut self,
        attacker: CombatantId,
        attack: &Attack,
        target: CombatantId,
    ) -> Result<AttackResult, CombatError> {
        let attacker_index = self.index_of(attacker)?;
        let target_index = self.index_of(target)?;
        let attacker_name = self.name_of(attacker);
        let target_name = self.name_of(target);
        self.narrate(&format!("{} attacks {} with {}", attacker_name, target_name, attack));

        let roll = self.combatants[attacker_index].roll_attack(attack, false, false, self.dice.as_mut())?;
        let target_ac = self.combatants[target_index].armor_class();
        let mut result = AttackResult::new(roll.raw, roll.total, target_ac);

        if is_fumble(roll.raw) {
            result.fumble = true;
            self.narrate(&format!("{} rolls a 1 and misses.", attacker_name));
            return Ok(result);
        }
        if is_critical(roll.raw) {
            result.critical = true;
            self.narrate(&format!("{} rolls a 20 and makes a critical hit.", attacker_name));
        } else if roll.critical {
            result.critical = true;
            self.narrate(&format!(
                "{} makes a critical hit with a roll of {}",
                attacker_name, roll.raw
            ));
        } else if roll.total >= target_ac {
            self.narrate(&format!(
                "{} rolls a {}, hitting with a score of {}.",
                attacker_name, roll.raw, roll.total
            ));
        } else {
            self.narrate(&format!(
                "{} rolls a {}, missing with a score of {}.",
                attacker_name, roll.raw, roll.total
            ));
            return Ok(result);
        }
        result.hit = true;

        let (amount, damage_type) =
            self.combatants[attacker_index].roll_damage(attack, result.critical, self.dice.as_mut())?;
        self.narrate(&format!(
            "{} causes {} HP of {} damage.",
            attacker_name, amount, damage_type
        ));
        self.combatants[target_index].take_damage(amount, damage_type);
        let remaining = self.combatants[target_index].current_hit_points();
        self.narrate(&format!("{} now has {} HP.", target_name, remaining));

        result.damage = Some((amount, damage_type));
        Ok(result)
    }

    /// Combatants that took the Dodge action this turn
    pub fn combatants_dodging(&self) -> Vec<&Combatant> {
        self.combatants.iter().filter(|c| c.is_dodging).collect()
    }

    /// Combatants that took the Disengage action this turn
    pub fn combatants_disengaging(&self) -> Vec<&Combatant> {
        self.combatants.iter().filter(|c| c.is_disengaging).collect()
    }

    /// Combatants holding a readied action
    pub fn combatants_readied(&self) -> Vec<&Combatant> {
        self.combatants.iter().filter(|c| c.is_readied).collect()
    }
}
