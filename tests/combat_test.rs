//! Combat scenarios driven through the public API

mod common;

use common::{enemy, pc, shortsword};
use dot_combat::combat::{
    roll, Attack, Combat, CombatError, DamageType, FixedDice, Location, ScriptedDice,
};

#[test]
fn test_fixed_dice_totals() {
    let mut ones = FixedDice(1);
    assert_eq!(roll("4d100+4", &mut ones).unwrap(), 8);
    assert_eq!(roll("1d100-3", &mut ones).unwrap(), -2);
    assert_eq!(roll("d100", &mut ones).unwrap(), 1);

    let mut fives = FixedDice(5);
    for (count, constant) in [(1, 0), (3, 2), (6, -4)] {
        let expression = format!("{}d10{:+}", count, constant);
        assert_eq!(roll(&expression, &mut fives).unwrap(), count * 5 + constant);
    }
}

#[test]
fn test_hit_points_clamp() {
    let mut fighter = pc("Fighter", 10);
    fighter.take_damage(3, DamageType::Slashing);
    assert_eq!(fighter.current_hit_points(), 7);
    fighter.take_damage(8, DamageType::Slashing);
    assert_eq!(fighter.current_hit_points(), 0);
    assert!(!fighter.conscious());

    let mut cleric = pc("Cleric", 10).with_current_hit_points(Some(6));
    cleric.heal(2);
    assert_eq!(cleric.current_hit_points(), 8);
    cleric.heal(3);
    assert_eq!(cleric.current_hit_points(), 10);
}

#[test]
fn test_tied_initiative_shares_one_bucket() {
    let roster = vec![pc("A", 5), pc("B", 5), enemy("C", 5), enemy("D", 5)];
    let mut combat = Combat::with_dice(roster, FixedDice(12));
    combat.fill_initiative_list();

    assert_eq!(combat.used_initiatives(), &[12]);
    assert_eq!(combat.initiative_bucket(12).map(|b| b.len()), Some(4));
}

#[test]
fn test_turn_order_within_bucket_then_wrap() {
    let roster = vec![pc("A", 5), pc("B", 5), enemy("C", 5)];
    let ids: Vec<_> = roster.iter().map(|c| c.id()).collect();
    let mut combat = Combat::with_dice(roster, FixedDice(10));
    combat.fill_initiative_list();
    combat.start_combat().unwrap();

    assert_eq!(combat.current_combatant(), Some(ids[0]));
    assert_eq!(combat.next_combatant().unwrap(), ids[1]);
    // Lookahead only
    assert_eq!(combat.current_combatant(), Some(ids[0]));

    assert_eq!(combat.advance_combatant().unwrap(), ids[1]);
    assert_eq!(combat.advance_combatant().unwrap(), ids[2]);
    // Last in the only bucket: wraps to the top of the order
    assert_eq!(combat.next_combatant().unwrap(), ids[0]);
}

#[test]
fn test_next_initiative_wraps_to_highest() {
    let roster = vec![pc("A", 5), enemy("B", 5), enemy("C", 5)];
    let mut combat = Combat::with_dice(roster, ScriptedDice::new([15, 10, 5]));
    combat.fill_initiative_list();
    combat.start_combat().unwrap();
    assert_eq!(combat.used_initiatives(), &[15, 10, 5]);
    assert_eq!(combat.current_initiative(), 15);

    assert_eq!(combat.advance_initiative().unwrap(), 10);
    assert_eq!(combat.advance_initiative().unwrap(), 5);
    assert_eq!(combat.next_initiative().unwrap(), 15);
}

#[test]
fn test_removed_current_combatant_is_inconsistent() {
    let roster = vec![pc("A", 5), pc("B", 5), enemy("C", 5), enemy("D", 5)];
    let first = roster[0].id();
    let mut combat = Combat::with_dice(roster, FixedDice(10));
    combat.fill_initiative_list();
    combat.start_combat().unwrap();

    combat.remove_combatant(first).unwrap();
    assert!(!combat.has_finished());
    assert!(matches!(
        combat.next_combatant(),
        Err(CombatError::CombatantNotFound { combatant, initiative: 10 }) if combatant == first
    ));
}

#[test]
fn test_not_in_progress() {
    let mut combat = Combat::with_dice(vec![pc("A", 5), enemy("B", 5)], FixedDice(10));
    assert!(matches!(combat.next_combatant(), Err(CombatError::NotInProgress)));
    assert!(matches!(combat.start_combat(), Err(CombatError::CannotStart)));
}

#[test]
fn test_remove_deletes_only_empty_buckets() {
    let roster = vec![pc("A", 5), enemy("B", 5), enemy("C", 5)];
    let ids: Vec<_> = roster.iter().map(|c| c.id()).collect();
    let mut combat = Combat::with_dice(roster, ScriptedDice::new([15, 10, 10]));
    combat.fill_initiative_list();

    combat.remove_combatant(ids[0]).unwrap();
    assert!(combat.initiative_bucket(15).is_none());
    assert_eq!(combat.used_initiatives(), &[10]);

    combat.remove_combatant(ids[1]).unwrap();
    assert_eq!(combat.initiative_bucket(10), Some(&[ids[2]][..]));
    assert_eq!(combat.used_initiatives(), &[10]);
}

#[test]
fn test_remove_unknown_combatant_changes_nothing() {
    let stranger = enemy("Stranger", 5);
    let stranger_id = stranger.id();
    let mut combat = Combat::with_dice(vec![pc("A", 5), enemy("B", 5)], FixedDice(10));
    combat.fill_initiative_list();

    assert!(matches!(
        combat.remove_combatant(stranger_id),
        Err(CombatError::NotFound { location: Location::Roster, .. })
    ));
    assert_eq!(combat.combatants().len(), 2);
    assert_eq!(combat.initiative_bucket(10).map(|b| b.len()), Some(2));
}

#[test]
fn test_combat_ends_when_one_faction_remains() {
    let hero = pc("Hero", 10);
    let goblin = enemy("Goblin", 7);
    let goblin_id = goblin.id();
    let mut combat = Combat::with_dice(vec![hero, goblin], FixedDice(10));
    combat.fill_initiative_list();
    combat.start_combat().unwrap();

    assert!(!combat.combat_over());
    assert!(!combat.has_finished());

    let removed = combat.remove_combatant(goblin_id).unwrap();
    assert_eq!(removed.name(), "Goblin");
    assert!(combat.combat_over());
    assert!(combat.has_finished());
}

#[test]
fn test_damage_combatant_removes_and_ends() {
    let goblin = enemy("Goblin", 7);
    let goblin_id = goblin.id();
    let mut combat = Combat::with_dice(vec![pc("Hero", 10), goblin], FixedDice(10));
    combat.fill_initiative_list();
    combat.start_combat().unwrap();

    let removed = combat
        .damage_combatant(goblin_id, 7, DamageType::Fire)
        .unwrap()
        .expect("goblin should be removed");
    assert_eq!(removed.current_hit_points(), 0);
    assert!(combat.has_finished());
}

fn duel(dice: ScriptedDice, bonus: i32) -> (Combat, Attack) {
    let attack = shortsword(bonus);
    let attacker = pc("Archer", 10).with_attacks(vec![attack.clone()]);
    let target = enemy("Ogre", 30).with_armor_class(15);
    (Combat::with_dice(vec![attacker, target], dice), attack)
}

#[test]
fn test_natural_one_always_misses() {
    let (mut combat, attack) = duel(ScriptedDice::new([1]), 50);
    let (attacker, target) = (combat.combatants()[0].id(), combat.combatants()[1].id());

    let result = combat.manage_attack(attacker, &attack, target).unwrap();
    assert!(result.fumble);
    assert!(!result.hit);
    assert_eq!(combat.combatant(target).unwrap().current_hit_points(), 30);
}

#[test]
fn test_natural_twenty_is_critical() {
    // d20 = 20, then two d6 for the doubled damage dice
    let (mut combat, attack) = duel(ScriptedDice::new([20, 4, 6]), -10);
    let (attacker, target) = (combat.combatants()[0].id(), combat.combatants()[1].id());

    let result = combat.manage_attack(attacker, &attack, target).unwrap();
    assert!(result.hit);
    assert!(result.critical);
    assert_eq!(result.damage, Some((10, DamageType::Piercing)));
    assert_eq!(combat.combatant(target).unwrap().current_hit_points(), 20);
}

#[test]
fn test_roll_equal_to_armor_class_hits() {
    let (mut combat, attack) = duel(ScriptedDice::new([15, 3]), 0);
    let (attacker, target) = (combat.combatants()[0].id(), combat.combatants()[1].id());

    let result = combat.manage_attack(attacker, &attack, target).unwrap();
    assert_eq!(result.attack_total, 15);
    assert!(result.hit);
    assert!(!result.critical);
    assert_eq!(combat.combatant(target).unwrap().current_hit_points(), 27);
}

#[test]
fn test_managed_attack_leaves_downed_target_in_roster() {
    let attack = Attack::new("Greataxe", 5, "1d12", 40, DamageType::Slashing);
    let attacker = pc("Barbarian", 15).with_attacks(vec![attack.clone()]);
    let target = enemy("Goblin", 7);
    let (attacker_id, target_id) = (attacker.id(), target.id());
    let mut combat = Combat::with_dice(vec![attacker, target], ScriptedDice::new([10, 18, 6]));
    combat.fill_initiative_list();
    combat.start_combat().unwrap();

    let result = combat.manage_attack(attacker_id, &attack, target_id).unwrap();
    assert!(result.hit);

    // Only damage_combatant removes; a managed attack does not
    let goblin = combat.combatant(target_id).unwrap();
    assert_eq!(goblin.current_hit_points(), 0);
    assert!(goblin.removal_conditions_met());
    assert_eq!(combat.combatants().len(), 2);
    assert!(!combat.has_finished());
}

#[test]
fn test_stance_queries_are_stable() {
    let mut rogue = pc("Rogue", 8);
    rogue.dodge().unwrap();
    let mut monk = pc("Monk", 8);
    monk.disengage().unwrap();
    let combat = Combat::with_dice(vec![rogue, monk, enemy("Bandit", 6)], FixedDice(10));

    let dodging: Vec<_> = combat.combatants_dodging().iter().map(|c| c.id()).collect();
    for _ in 0..3 {
        let again: Vec<_> = combat.combatants_dodging().iter().map(|c| c.id()).collect();
        assert_eq!(again, dodging);
    }
    assert_eq!(dodging.len(), 1);
    assert_eq!(combat.combatants_disengaging().len(), 1);
    assert!(combat.combatants_readied().is_empty());
}

#[test]
fn test_logs_carry_round_and_initiative() {
    let mut combat = Combat::with_dice(vec![pc("Hero", 10), enemy("Goblin", 7)], FixedDice(10));
    combat.fill_initiative_list();
    combat.start_combat().unwrap();
    combat.advance_combatant().unwrap();

    assert!(combat
        .narrative_log()
        .contains("R: 1  I:10 Combatant Goblin's turn is starting.\n"));
    assert!(combat.technical_log().starts_with("R: 0  I:0 Filled initiative order.\n"));
}
