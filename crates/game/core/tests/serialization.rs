//! Document-map round trips, forward compatibility, and replay determinism
//! via the state digest.

use tactics_core::buff::add_to_list;
use tactics_core::serialize::{from_document, state_digest, to_document};
use tactics_core::{
    Action, Board, BuffInstance, BuffTile, BuffType, GameState, HeroClass, MinionType, PlayerId,
    Position, RuleEngine, Unit, skill,
};

fn swordsman(id: &str, owner: PlayerId, pos: Position) -> Unit {
    Unit::minion(id, owner, MinionType::Assassin, 10, 3, 1, 1, pos)
}

fn rich_state() -> GameState {
    let hero = Unit::hero(
        "p1_hero",
        PlayerId::P1,
        HeroClass::Mage,
        Some(skill::MAGE_WARP_BEACON),
        12,
        2,
        1,
        2,
        Position::new(1, 0),
    );
    let mut state = GameState::new(
        Board::new(5, 5),
        vec![
            hero,
            swordsman("p1_m", PlayerId::P1, Position::new(3, 0)).with_shield(2),
            swordsman("p2_m", PlayerId::P2, Position::new(3, 4)).with_damage(4),
        ],
        PlayerId::P2,
    );
    state.current_round = 4;
    let list = state.unit_buffs.entry("p1_m".to_owned()).or_default();
    add_to_list(list, BuffInstance::of(BuffType::Power, "tile_1"));
    add_to_list(list, BuffInstance::of(BuffType::Bleed, "p2_m").with_duration(3));
    state.buff_tiles = vec![
        BuffTile::new("t1", Position::new(2, 2), Some(BuffType::DeathMark)),
        BuffTile::new("t2", Position::new(0, 3), None),
    ];
    state.obstacles = vec![tactics_core::Obstacle::new("rock_1", Position::new(4, 2))];
    state
}

#[test]
fn document_round_trip_preserves_the_state() {
    let state = rich_state();
    let doc = to_document(&state);
    let back = from_document(&doc).expect("round trip");
    assert_eq!(back, state);
}

#[test]
fn json_round_trip_preserves_the_state() {
    let state = rich_state();
    let json = serde_json::to_string(&to_document(&state)).unwrap();
    let doc = serde_json::from_str(&json).unwrap();
    let back = from_document(&doc).expect("round trip through JSON");
    assert_eq!(back, state);
}

#[test]
fn buff_records_expose_the_wire_fields() {
    let state = rich_state();
    let json = serde_json::to_value(to_document(&state)).unwrap();

    let buffs = &json["unitBuffs"]["p1_m"];
    let power = &buffs[0];
    assert_eq!(power["buffType"], "POWER");
    assert_eq!(power["duration"], 2);
    assert_eq!(power["sourceUnitId"], "tile_1");
    assert_eq!(power["modifiers"]["bonusAttack"], 3);
    assert_eq!(power["flags"]["powerBuff"], true);
    assert_eq!(power["flags"]["bleedBuff"], false);
    assert_eq!(power["instantHpBonus"], 1);

    let bleed = &buffs[1];
    assert_eq!(bleed["buffType"], "BLEED");
    assert_eq!(bleed["flags"]["bleedBuff"], true);

    let tiles = &json["buffTiles"];
    assert_eq!(tiles[0]["buffType"], "DEATH_MARK");
    assert_eq!(tiles[0]["position"]["x"], 2);
    assert_eq!(tiles[0]["triggered"], false);
    assert!(tiles[1]["buffType"].is_null(), "blank tiles serialize a null type");
}

#[test]
fn unknown_fields_are_ignored_on_input() {
    let state = rich_state();
    let mut json = serde_json::to_value(to_document(&state)).unwrap();
    json["futureTopLevelField"] = serde_json::json!({"a": 1});
    json["units"][0]["futureUnitField"] = serde_json::json!(true);
    json["unitBuffs"]["p1_m"][0]["futureBuffField"] = serde_json::json!("x");
    json["buffTiles"][0]["futureTileField"] = serde_json::json!(3);

    let doc = serde_json::from_value(json).expect("unknown fields tolerated");
    let back = from_document(&doc).expect("reconstruction");
    assert_eq!(back, state);
}

#[test]
fn missing_unit_buffs_deserializes_to_an_empty_map() {
    let state = rich_state();
    let mut json = serde_json::to_value(to_document(&state)).unwrap();
    json.as_object_mut().unwrap().remove("unitBuffs");
    json.as_object_mut().unwrap().remove("buffTiles");
    json.as_object_mut().unwrap().remove("obstacles");

    let doc = serde_json::from_value(json).unwrap();
    let back = from_document(&doc).unwrap();
    assert!(back.unit_buffs.is_empty());
    assert!(back.buff_tiles.is_empty());
    assert!(back.obstacles.is_empty());
}

#[test]
fn unknown_buff_type_is_a_reconstruction_error() {
    let state = rich_state();
    let mut json = serde_json::to_value(to_document(&state)).unwrap();
    json["unitBuffs"]["p1_m"][0]["buffType"] = serde_json::json!("NOT_A_BUFF");

    let doc = serde_json::from_value(json).unwrap();
    let err = from_document(&doc).unwrap_err();
    assert!(err.to_string().contains("NOT_A_BUFF"));
}

#[test]
fn preparing_units_round_trip() {
    let mut state = rich_state();
    let action = Action::attack(PlayerId::P2, Position::new(3, 0), "p1_m");
    state.units[2] = state.units[2]
        .with_preparing_and_action_used(tactics_core::PreparedAction::from_action(&action));

    let doc = to_document(&state);
    let back = from_document(&doc).unwrap();
    assert_eq!(back, state);
    let stored = back.unit("p2_m").unwrap().preparing_action.as_ref().unwrap();
    assert_eq!(stored.target_unit_id.as_deref(), Some("p1_m"));
}

fn demo_sequence() -> (GameState, Vec<Action>) {
    let state = GameState::new(
        Board::new(5, 5),
        vec![
            Unit::hero(
                "p1_hero",
                PlayerId::P1,
                HeroClass::Mage,
                Some(skill::MAGE_WILD_MAGIC),
                12,
                2,
                1,
                2,
                Position::new(2, 0),
            ),
            swordsman("p1_m", PlayerId::P1, Position::new(0, 0)),
            swordsman("p2_a", PlayerId::P2, Position::new(2, 4)),
            swordsman("p2_b", PlayerId::P2, Position::new(0, 4)),
        ],
        PlayerId::P1,
    );
    let actions = vec![
        Action::use_skill(PlayerId::P1, "p1_hero", None, None),
        Action::move_unit(PlayerId::P2, "p2_a", Position::new(2, 3)),
        Action::move_unit(PlayerId::P1, "p1_m", Position::new(0, 1)),
        Action::move_unit(PlayerId::P2, "p2_b", Position::new(0, 3)),
        Action::end_turn(PlayerId::P2),
        Action::end_turn(PlayerId::P1),
    ];
    (state, actions)
}

fn run(seed: u64) -> GameState {
    let (mut state, actions) = demo_sequence();
    let mut engine = RuleEngine::seeded(seed);
    for action in &actions {
        state = engine.apply_action(&state, action);
    }
    state
}

#[test]
fn replaying_the_same_seed_is_bit_identical() {
    let a = run(1234);
    let b = run(1234);
    assert_eq!(a, b);
    assert_eq!(state_digest(&a), state_digest(&b));
}

#[test]
fn the_digest_distinguishes_diverging_chance_outcomes() {
    // Wild Magic's debuff rolls depend on the seed, so at least one of a
    // spread of seeds must diverge from seed 0's outcome.
    let baseline = state_digest(&run(0));
    let diverged = (1..32u64).any(|seed| state_digest(&run(seed)) != baseline);
    assert!(diverged, "chance-based effects must consume the injected RNG");
}

#[test]
fn digest_is_stable_for_equal_states() {
    let state = rich_state();
    assert_eq!(state_digest(&state), state_digest(&state.clone()));
}
