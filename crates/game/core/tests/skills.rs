//! Skill catalog behavior through the generic executor: targeting, effects,
//! cooldowns, and RNG-dependent rolls under injected stubs.

use tactics_core::buff::{self, add_to_list};
use tactics_core::{
    Action, Board, BuffInstance, BuffType, FixedRng, GameState, HeroClass, MinionType, PlayerId,
    Position, RuleEngine, SequenceRng, SkillState, Unit, skill,
};

fn hero(id: &str, class: HeroClass, skill_id: &str, pos: Position) -> Unit {
    Unit::hero(id, PlayerId::P1, class, Some(skill_id), 10, 3, 1, 1, pos)
}

fn grunt(id: &str, owner: PlayerId, pos: Position) -> Unit {
    Unit::minion(id, owner, MinionType::Assassin, 10, 3, 1, 1, pos)
}

fn tank(id: &str, owner: PlayerId, pos: Position) -> Unit {
    Unit::minion(id, owner, MinionType::Tank, 5, 1, 1, 1, pos)
}

fn state_with(units: Vec<Unit>) -> GameState {
    GameState::new(Board::new(5, 5), units, PlayerId::P1)
}

fn give_buff(state: &mut GameState, unit_id: &str, buff: BuffInstance) {
    add_to_list(state.unit_buffs.entry(unit_id.to_owned()).or_default(), buff);
}

#[test]
fn spirit_hawk_snipes_at_long_range() {
    let state = state_with(vec![
        hero("h1", HeroClass::Huntress, skill::HUNTRESS_SPIRIT_HAWK, Position::new(0, 0)),
        grunt("e1", PlayerId::P2, Position::new(0, 4)),
    ]);
    let mut engine = RuleEngine::seeded(0);

    let cast = Action::use_skill(PlayerId::P1, "h1", None, Some("e1"));
    assert!(engine.validate_action(&state, &cast).is_valid());
    let next = engine.apply_action(&state, &cast);

    assert_eq!(next.unit("e1").unwrap().hp, 8);
    let caster = next.unit("h1").unwrap();
    assert_eq!(caster.skill_cooldown, 2);
    assert_eq!(caster.actions_used, 1);
    assert_eq!(next.current_player, PlayerId::P2);
}

#[test]
fn skill_damage_is_guardian_checked() {
    let state = state_with(vec![
        hero("h1", HeroClass::Huntress, skill::HUNTRESS_SPIRIT_HAWK, Position::new(0, 0)),
        grunt("e1", PlayerId::P2, Position::new(0, 3)),
        tank("etank", PlayerId::P2, Position::new(0, 4)),
    ]);
    let mut engine = RuleEngine::seeded(0);

    let next = engine.apply_action(&state, &Action::use_skill(PlayerId::P1, "h1", None, Some("e1")));
    assert_eq!(next.unit("e1").unwrap().hp, 10);
    assert_eq!(next.unit("etank").unwrap().hp, 3);
}

#[test]
fn elemental_blast_debuff_roll_uses_the_injected_rng() {
    let state = state_with(vec![
        hero("h1", HeroClass::Mage, skill::MAGE_ELEMENTAL_BLAST, Position::new(0, 0)),
        grunt("e1", PlayerId::P2, Position::new(0, 3)),
        grunt("e2", PlayerId::P2, Position::new(4, 4)),
    ]);

    // Roll 0 (< 50) hits, pool roll 0 picks WEAKNESS (-1 instant HP).
    let mut lucky = RuleEngine::new(SequenceRng::new(vec![0, 0]));
    let next = lucky.apply_action(&state, &Action::use_skill(PlayerId::P1, "h1", None, Some("e1")));
    assert_eq!(next.unit("e1").unwrap().hp, 6, "3 damage plus WEAKNESS instant -1");
    assert_eq!(next.buffs("e1")[0].buff_type, BuffType::Weakness);

    // Roll 99 misses the 50% chance: damage only.
    let mut unlucky = RuleEngine::new(FixedRng(99));
    let next = unlucky.apply_action(&state, &Action::use_skill(PlayerId::P1, "h1", None, Some("e1")));
    assert_eq!(next.unit("e1").unwrap().hp, 7);
    assert!(next.buffs("e1").is_empty());
}

#[test]
fn wild_magic_sweeps_every_enemy() {
    let state = state_with(vec![
        hero("h1", HeroClass::Mage, skill::MAGE_WILD_MAGIC, Position::new(0, 0)),
        grunt("e1", PlayerId::P2, Position::new(0, 4)),
        grunt("e2", PlayerId::P2, Position::new(4, 0)),
        grunt("e3", PlayerId::P2, Position::new(4, 4)),
    ]);
    let mut engine = RuleEngine::new(FixedRng(99));

    let next = engine.apply_action(&state, &Action::use_skill(PlayerId::P1, "h1", None, None));
    for id in ["e1", "e2", "e3"] {
        assert_eq!(next.unit(id).unwrap().hp, 9);
        assert!(next.buffs(id).is_empty(), "roll 99 never lands a debuff");
    }
}

#[test]
fn elemental_strike_applies_the_chosen_debuff() {
    let state = state_with(vec![
        hero("h1", HeroClass::Duelist, skill::DUELIST_ELEMENTAL_STRIKE, Position::new(0, 0)),
        grunt("e1", PlayerId::P2, Position::new(0, 1)),
    ]);
    let mut engine = RuleEngine::seeded(0);

    let cast = Action::use_skill_with_choice(PlayerId::P1, "h1", "e1", BuffType::Slow);
    let next = engine.apply_action(&state, &cast);

    assert_eq!(next.unit("e1").unwrap().hp, 7);
    assert_eq!(next.buffs("e1")[0].buff_type, BuffType::Slow);
}

#[test]
fn heroic_leap_moves_and_splashes_on_landing() {
    let state = state_with(vec![
        hero("h1", HeroClass::Warrior, skill::WARRIOR_HEROIC_LEAP, Position::new(0, 0)),
        grunt("e1", PlayerId::P2, Position::new(2, 1)),
        grunt("e2", PlayerId::P2, Position::new(3, 0)),
        grunt("far", PlayerId::P2, Position::new(4, 4)),
    ]);
    let mut engine = RuleEngine::seeded(0);

    let next = engine.apply_action(
        &state,
        &Action::use_skill(PlayerId::P1, "h1", Some(Position::new(2, 0)), None),
    );

    assert_eq!(next.unit("h1").unwrap().position, Position::new(2, 0));
    assert_eq!(next.unit("e1").unwrap().hp, 8, "adjacent to the landing tile");
    assert_eq!(next.unit("e2").unwrap().hp, 8);
    assert_eq!(next.unit("far").unwrap().hp, 10);
}

#[test]
fn shockwave_pushes_or_punishes_blocked_enemies() {
    let state = state_with(vec![
        hero("h1", HeroClass::Warrior, skill::WARRIOR_SHOCKWAVE, Position::new(2, 2)),
        // Free push: lands on (2, 4).
        grunt("e1", PlayerId::P2, Position::new(2, 3)),
        // Blocked push: (2, 0) is off toward the wall at... (2,1)->(2,0) is
        // free, so block it with a unit instead.
        grunt("e2", PlayerId::P2, Position::new(2, 1)),
        grunt("blocker", PlayerId::P2, Position::new(2, 0)),
    ]);
    let mut engine = RuleEngine::seeded(0);

    let next = engine.apply_action(&state, &Action::use_skill(PlayerId::P1, "h1", None, None));

    let pushed = next.unit("e1").unwrap();
    assert_eq!(pushed.position, Position::new(2, 4));
    assert_eq!(pushed.hp, 9);

    let stuck = next.unit("e2").unwrap();
    assert_eq!(stuck.position, Position::new(2, 1), "blocked enemies stay put");
    assert_eq!(stuck.hp, 8, "and take the extra point");
}

#[test]
fn shockwave_push_respects_the_board_edge() {
    let state = state_with(vec![
        hero("h1", HeroClass::Warrior, skill::WARRIOR_SHOCKWAVE, Position::new(0, 1)),
        grunt("e1", PlayerId::P2, Position::new(0, 0)),
    ]);
    let mut engine = RuleEngine::seeded(0);

    let next = engine.apply_action(&state, &Action::use_skill(PlayerId::P1, "h1", None, None));
    let enemy = next.unit("e1").unwrap();
    assert_eq!(enemy.position, Position::new(0, 0));
    assert_eq!(enemy.hp, 8, "pushing off the board counts as blocked");
}

#[test]
fn endure_shields_and_staunches_bleeding() {
    let mut state = state_with(vec![
        hero("h1", HeroClass::Warrior, skill::WARRIOR_ENDURE, Position::new(0, 0)),
        grunt("e1", PlayerId::P2, Position::new(4, 4)),
    ]);
    give_buff(&mut state, "h1", BuffInstance::of(BuffType::Bleed, "e1"));
    give_buff(&mut state, "h1", BuffInstance::of(BuffType::Slow, "e1"));
    let mut engine = RuleEngine::seeded(0);

    let next = engine.apply_action(&state, &Action::use_skill(PlayerId::P1, "h1", None, None));

    assert_eq!(next.unit("h1").unwrap().shield, 3);
    let remaining: Vec<BuffType> = next.buffs("h1").iter().map(|b| b.buff_type).collect();
    assert_eq!(remaining, vec![BuffType::Slow], "only the bleed is staunched");
}

#[test]
fn natures_power_charges_the_next_two_attacks() {
    let state = state_with(vec![
        hero("h1", HeroClass::Huntress, skill::HUNTRESS_NATURES_POWER, Position::new(1, 1)),
        grunt("e1", PlayerId::P2, Position::new(1, 2)),
        grunt("e2", PlayerId::P2, Position::new(4, 4)),
    ]);
    let mut engine = RuleEngine::seeded(0);

    let cast = engine.apply_action(&state, &Action::use_skill(PlayerId::P1, "h1", None, None));
    let caster = cast.unit("h1").unwrap();
    assert_eq!(caster.bonus_attack_damage, 2);
    assert_eq!(caster.bonus_attack_charges, 2);
    assert_eq!(caster.hp, 13, "LIFE grants +3 instant HP");
    assert_eq!(cast.buffs("h1")[0].buff_type, BuffType::Life);

    // Next round the empowered attack deals 3 + 2.
    let s1 = engine.apply_action(&cast, &Action::end_turn(PlayerId::P2));
    assert_eq!(s1.current_round, 2);
    let hit = engine.apply_action(&s1, &Action::attack(PlayerId::P1, Position::new(1, 2), "e1"));
    assert_eq!(hit.unit("e1").unwrap().hp, 5);
    assert_eq!(hit.unit("h1").unwrap().bonus_attack_charges, 1);
}

#[test]
fn smoke_bomb_relocates_hides_and_blinds() {
    let state = state_with(vec![
        hero("h1", HeroClass::Rogue, skill::ROGUE_SMOKE_BOMB, Position::new(1, 1)),
        grunt("e1", PlayerId::P2, Position::new(1, 2)),
        grunt("e2", PlayerId::P2, Position::new(4, 4)),
    ]);
    let mut engine = RuleEngine::seeded(0);

    let next = engine.apply_action(
        &state,
        &Action::use_skill(PlayerId::P1, "h1", Some(Position::new(3, 1)), None),
    );

    let rogue = next.unit("h1").unwrap();
    assert_eq!(rogue.position, Position::new(3, 1));
    assert!(rogue.invisible, "smoke bomb does not reveal its caster");
    assert_eq!(
        next.buffs("e1")[0].buff_type,
        BuffType::Blind,
        "enemies beside the departure tile are blinded"
    );
    assert!(next.buffs("e2").is_empty());
}

#[test]
fn casting_other_skills_reveals_an_invisible_caster() {
    let mut caster = hero("h1", HeroClass::Huntress, skill::HUNTRESS_SPIRIT_HAWK, Position::new(0, 0));
    caster.invisible = true;
    let state = state_with(vec![caster, grunt("e1", PlayerId::P2, Position::new(0, 3))]);
    let mut engine = RuleEngine::seeded(0);

    let next = engine.apply_action(&state, &Action::use_skill(PlayerId::P1, "h1", None, Some("e1")));
    assert!(!next.unit("h1").unwrap().invisible);
}

#[test]
fn warp_beacon_places_then_teleports() {
    let state = state_with(vec![
        hero("h1", HeroClass::Mage, skill::MAGE_WARP_BEACON, Position::new(0, 0)),
        grunt("e1", PlayerId::P2, Position::new(4, 4)),
    ]);
    let mut engine = RuleEngine::seeded(0);

    // First use: places the beacon without starting the cooldown.
    let placed = engine.apply_action(
        &state,
        &Action::use_skill(PlayerId::P1, "h1", Some(Position::new(2, 2)), None),
    );
    let mage = placed.unit("h1").unwrap();
    assert_eq!(mage.position, Position::new(0, 0));
    assert_eq!(mage.skill_state, Some(SkillState::Beacon(Position::new(2, 2))));
    assert_eq!(mage.skill_cooldown, 0, "placement does not trigger the cooldown");
    assert_eq!(mage.actions_used, 1);

    // Close the round, then teleport.
    let s1 = engine.apply_action(&placed, &Action::end_turn(PlayerId::P2));
    assert_eq!(s1.current_round, 2);

    let warped = engine.apply_action(&s1, &Action::use_skill(PlayerId::P1, "h1", None, None));
    let mage = warped.unit("h1").unwrap();
    assert_eq!(mage.position, Position::new(2, 2));
    assert_eq!(mage.skill_state, None);
    assert_eq!(mage.skill_cooldown, 2);
}

#[test]
fn shadow_clone_spawns_a_temporary_minion() {
    let state = state_with(vec![
        hero("h1", HeroClass::Rogue, skill::ROGUE_SHADOW_CLONE, Position::new(1, 1)),
        grunt("e1", PlayerId::P2, Position::new(4, 4)),
    ]);
    let mut engine = RuleEngine::seeded(0);

    let next = engine.apply_action(
        &state,
        &Action::use_skill(PlayerId::P1, "h1", Some(Position::new(1, 2)), None),
    );

    let clone = next.unit("h1_clone_r1").expect("clone exists with a deterministic id");
    assert_eq!(clone.hp, 1);
    assert_eq!(clone.attack, 1);
    assert_eq!(clone.owner, PlayerId::P1);
    assert!(clone.temporary);
    assert_eq!(clone.temporary_duration, 2);
    assert_eq!(clone.minion_type, Some(MinionType::Assassin));

    // Two completed rounds later the clone is gone.
    let mut state = next;
    for _ in 0..2 {
        let s = engine.apply_action(&state, &Action::end_turn(state.current_player));
        state = engine.apply_action(&s, &Action::end_turn(s.current_player));
    }
    assert!(state.unit("h1_clone_r1").is_none(), "expired clones are removed");
}

#[test]
fn dead_clones_are_removed_without_a_death_choice() {
    let state = state_with(vec![
        hero("h1", HeroClass::Rogue, skill::ROGUE_SHADOW_CLONE, Position::new(1, 1)),
        grunt("m1", PlayerId::P1, Position::new(4, 0)),
        grunt("e1", PlayerId::P2, Position::new(1, 3)),
    ]);
    let mut engine = RuleEngine::seeded(0);

    let spawned = engine.apply_action(
        &state,
        &Action::use_skill(PlayerId::P1, "h1", Some(Position::new(1, 2)), None),
    );
    // The enemy kills the 1 HP clone.
    let killed = engine.apply_action(
        &spawned,
        &Action::attack(PlayerId::P2, Position::new(1, 2), "h1_clone_r1"),
    );
    assert!(!killed.unit("h1_clone_r1").unwrap().alive);
    assert!(killed.pending_death_choice.is_none());

    // The corpse is swept at round end.
    let closed = engine.apply_action(&killed, &Action::end_turn(PlayerId::P1));
    assert!(closed.unit("h1_clone_r1").is_none());
}

#[test]
fn trinity_heals_cleanses_and_blesses() {
    let mut state = state_with(vec![
        Unit::hero("cleric", PlayerId::P1, HeroClass::Cleric, Some(skill::CLERIC_TRINITY), 10, 3, 1, 1, Position::new(0, 0)),
        grunt("ally", PlayerId::P1, Position::new(0, 2)).with_damage(5),
        grunt("e1", PlayerId::P2, Position::new(4, 4)),
    ]);
    give_buff(&mut state, "ally", BuffInstance::of(BuffType::Bleed, "e1"));
    let mut engine = RuleEngine::new(FixedRng(0));

    let next = engine.apply_action(&state, &Action::use_skill(PlayerId::P1, "cleric", None, Some("ally")));

    let ally = next.unit("ally").unwrap();
    assert_eq!(ally.hp, 11, "heal 3 plus LIFE instant 3");
    let types: Vec<BuffType> = next.buffs("ally").iter().map(|b| b.buff_type).collect();
    assert_eq!(types, vec![BuffType::Life], "the bleed was cleansed");
}

#[test]
fn power_of_many_rallies_the_whole_side() {
    let state = state_with(vec![
        Unit::hero("cleric", PlayerId::P1, HeroClass::Cleric, Some(skill::CLERIC_POWER_OF_MANY), 10, 3, 1, 1, Position::new(0, 0)),
        grunt("ally", PlayerId::P1, Position::new(0, 2)).with_damage(3),
        grunt("e1", PlayerId::P2, Position::new(4, 4)),
    ]);
    let mut engine = RuleEngine::seeded(0);

    let next = engine.apply_action(&state, &Action::use_skill(PlayerId::P1, "cleric", None, None));

    assert_eq!(next.unit("ally").unwrap().hp, 8, "heal 1");
    assert_eq!(next.unit("cleric").unwrap().hp, 11, "the caster is an ally too");
    assert_eq!(buff::bonus_attack(next.buffs("ally")), 1);
    assert_eq!(buff::bonus_attack(next.buffs("cleric")), 1);
    assert!(next.buffs("e1").is_empty());

    // The rally fades at round end.
    let s1 = engine.apply_action(&next, &Action::end_turn(PlayerId::P2));
    let s2 = engine.apply_action(&s1, &Action::end_turn(PlayerId::P1));
    assert_eq!(s2.current_round, 2);
    assert!(s2.buffs("ally").is_empty());
}

#[test]
fn ascended_form_makes_the_cleric_untouchable_for_a_round() {
    let state = state_with(vec![
        Unit::hero("cleric", PlayerId::P1, HeroClass::Cleric, Some(skill::CLERIC_ASCENDED_FORM), 10, 3, 1, 1, Position::new(1, 1)),
        grunt("e1", PlayerId::P2, Position::new(1, 2)),
    ]);
    let mut engine = RuleEngine::seeded(0);

    let blessed = engine.apply_action(&state, &Action::use_skill(PlayerId::P1, "cleric", None, None));
    assert_eq!(blessed.buffs("cleric")[0].buff_type, BuffType::Invulnerable);

    let swing = engine.apply_action(&blessed, &Action::attack(PlayerId::P2, Position::new(1, 1), "cleric"));
    assert_eq!(swing.unit("cleric").unwrap().hp, 10, "the hit is negated");
}

#[test]
fn spectral_blades_rake_the_whole_line() {
    let state = state_with(vec![
        hero("h1", HeroClass::Huntress, skill::HUNTRESS_SPECTRAL_BLADES, Position::new(0, 2)),
        grunt("e1", PlayerId::P2, Position::new(2, 2)),
        grunt("e2", PlayerId::P2, Position::new(4, 2)),
        grunt("off_line", PlayerId::P2, Position::new(2, 3)),
    ]);
    let mut engine = RuleEngine::seeded(0);

    let next = engine.apply_action(
        &state,
        &Action::use_skill(PlayerId::P1, "h1", Some(Position::new(2, 2)), None),
    );

    assert_eq!(next.unit("e1").unwrap().hp, 9);
    assert_eq!(next.unit("e2").unwrap().hp, 9, "the line pierces past the aimed tile");
    assert_eq!(next.unit("off_line").unwrap().hp, 10);
}

#[test]
fn duelist_kit_marks_its_targets() {
    let state = state_with(vec![
        hero("h1", HeroClass::Duelist, skill::DUELIST_CHALLENGE, Position::new(0, 0)),
        grunt("e1", PlayerId::P2, Position::new(0, 2)),
    ]);
    let mut engine = RuleEngine::seeded(0);

    let next = engine.apply_action(&state, &Action::use_skill(PlayerId::P1, "h1", None, Some("e1")));
    let mark = &next.buffs("e1")[0];
    assert_eq!(mark.buff_type, BuffType::Challenge);
    assert_eq!(mark.source_unit_id.as_deref(), Some("h1"));
}

#[test]
fn feint_skill_buffs_the_caster() {
    let state = state_with(vec![
        hero("h1", HeroClass::Duelist, skill::DUELIST_FEINT, Position::new(0, 0)),
        grunt("e1", PlayerId::P2, Position::new(4, 4)),
    ]);
    let mut engine = RuleEngine::seeded(0);

    let next = engine.apply_action(&state, &Action::use_skill(PlayerId::P1, "h1", None, None));
    assert_eq!(next.buffs("h1")[0].buff_type, BuffType::Feint);
}

#[test]
fn granting_the_same_buff_refreshes_duration_and_reapplies_instant_hp() {
    let mut state = state_with(vec![
        hero("h1", HeroClass::Huntress, skill::HUNTRESS_NATURES_POWER, Position::new(0, 0)),
        grunt("e1", PlayerId::P2, Position::new(4, 4)),
    ]);
    give_buff(&mut state, "h1", BuffInstance::of(BuffType::Life, "old").with_duration(1));
    let mut engine = RuleEngine::seeded(0);

    let next = engine.apply_action(&state, &Action::use_skill(PlayerId::P1, "h1", None, None));

    let lives: Vec<&BuffInstance> = next
        .buffs("h1")
        .iter()
        .filter(|b| b.buff_type == BuffType::Life)
        .collect();
    assert_eq!(lives.len(), 1, "refresh, not stack");
    assert_eq!(lives[0].duration, 2);
    assert_eq!(next.unit("h1").unwrap().hp, 13, "instant HP applies on the refresh grant");
}
