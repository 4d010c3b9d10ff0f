//! Encounter driver
//!
//! Plays a [`Combat`] to the end: every combatant attacks the first conscious
//! opponent in the roster with its first attack, turns pass in initiative
//! order, and a new round starts whenever initiative wraps around.

use tracing::{debug, info};

use crate::combat::{Combat, CombatError, CombatantId, Faction, FightingStatus};

/// Summary of a played encounter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncounterReport {
    /// Rounds played
    pub rounds: u32,
    /// Whether one faction was left standing
    pub finished: bool,
    pub winner: Option<Faction>,
    /// Names still in the roster
    pub survivors: Vec<String>,
    /// Names removed, in removal order
    pub removed: Vec<String>,
}

/// Run the encounter until it finishes or `max_rounds` have been played
pub fn run_encounter(combat: &mut Combat, max_rounds: u32) -> Result<EncounterReport, CombatError> {
    if combat.initiative_order().is_empty() {
        combat.fill_initiative_list();
    }
    combat.start_combat()?;
    info!(
        combatants = combat.combatants().len(),
        initiatives = ?combat.used_initiatives(),
        "encounter started"
    );

    let first = combat.current_combatant().ok_or(CombatError::NotInProgress)?;
    if let Some(combatant) = combat.combatant_mut(first) {
        combatant.start_turn();
    }

    let mut removed = Vec::new();
    while !combat.has_finished() && combat.current_round() <= max_rounds {
        let actor = combat.current_combatant().ok_or(CombatError::NotInProgress)?;
        take_turn(combat, actor, &mut removed)?;
        if combat.has_finished() {
            break;
        }
        pass_turn(combat)?;
    }

    let finished = combat.has_finished();
    let winner = if finished {
        combat.combatants().first().map(|c| c.faction)
    } else {
        None
    };
    let report = EncounterReport {
        rounds: combat.current_round().min(max_rounds),
        finished,
        winner,
        survivors: combat
            .combatants()
            .iter()
            .map(|c| c.name().to_string())
            .collect(),
        removed,
    };
    info!(
        rounds = report.rounds,
        finished = report.finished,
        winner = ?report.winner,
        "encounter over"
    );
    Ok(report)
}

fn take_turn(
    combat: &mut Combat,
    actor: CombatantId,
    removed: &mut Vec<String>,
) -> Result<(), CombatError> {
    let Some(attacker) = combat.combatant(actor) else {
        return Ok(());
    };
    if !attacker.is_conscious()
        || !attacker.action_available
        || attacker.fighting_status != FightingStatus::Fighting
    {
        debug!(combatant = %attacker, "skips turn");
        return Ok(());
    }
    let Some(attack) = attacker.attacks().first().cloned() else {
        return Ok(());
    };
    let faction = attacker.faction;
    let target = combat
        .combatants()
        .iter()
        .find(|c| c.faction != faction && c.is_conscious())
        .map(|c| c.id());
    let Some(target) = target else {
        return Ok(());
    };

    combat.manage_attack(actor, &attack, target)?;
    if let Some(attacker) = combat.combatant_mut(actor) {
        attacker.action_available = false;
    }

    if combat
        .combatant(target)
        .is_some_and(|c| c.removal_conditions_met())
    {
        let gone = combat.remove_combatant(target)?;
        removed.push(gone.name().to_string());
    }
    Ok(())
}

/// Hand the turn on, moving initiative when the current bucket is done
fn pass_turn(combat: &mut Combat) -> Result<(), CombatError> {
    let current = combat.current_combatant().ok_or(CombatError::NotInProgress)?;
    let initiative = combat.current_initiative();
    let leaving_bucket = match combat.initiative_bucket(initiative) {
        Some(bucket) => bucket.len() <= 1 || bucket.last() == Some(&current),
        None => true,
    };

    combat.advance_combatant()?;
    if leaving_bucket {
        let next = combat.advance_initiative()?;
        if next >= initiative {
            combat.advance_round();
        }
    }
    Ok(())
}
