//! Document-map serialization boundary.
//!
//! Converts [`GameState`] to and from typed document records suitable for a
//! JSON transport. Deserialization is forward compatible: unknown fields on
//! any record are ignored, and a document without `unitBuffs` reconstructs
//! an empty map. Also provides the deterministic state digest used by replay
//! tests.
//!
//! Only available with the `serde` feature.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::action::{ActionType, PreparedAction};
use crate::buff::{BuffFlags, BuffInstance, BuffList, BuffModifier, BuffType};
use crate::state::{
    Board, BuffTile, DeathChoice, GameState, HeroClass, MinionType, Obstacle, PlayerId, Position,
    SkillState, Unit, UnitCategory,
};

/// Failure while reconstructing a state from a document.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("unknown player id: {0}")]
    UnknownPlayer(String),
    #[error("unknown buff type: {0}")]
    UnknownBuffType(String),
    #[error("unknown unit category: {0}")]
    UnknownCategory(String),
    #[error("unknown hero class: {0}")]
    UnknownHeroClass(String),
    #[error("unknown minion type: {0}")]
    UnknownMinionType(String),
    #[error("unknown action type: {0}")]
    UnknownActionType(String),
}

// ============================================================================
// Document records
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateDoc {
    pub board: BoardDoc,
    pub units: Vec<UnitDoc>,
    pub current_player: String,
    pub game_over: bool,
    #[serde(default)]
    pub winner: Option<String>,
    #[serde(default)]
    pub unit_buffs: BTreeMap<String, Vec<BuffDoc>>,
    #[serde(default)]
    pub buff_tiles: Vec<BuffTileDoc>,
    #[serde(default)]
    pub obstacles: Vec<ObstacleDoc>,
    #[serde(default = "default_round")]
    pub current_round: u32,
    #[serde(default)]
    pub pending_death_choice: Option<DeathChoiceDoc>,
}

fn default_round() -> u32 {
    1
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BoardDoc {
    pub width: i32,
    pub height: i32,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PositionDoc {
    pub x: i32,
    pub y: i32,
}

impl From<Position> for PositionDoc {
    fn from(pos: Position) -> Self {
        Self { x: pos.x, y: pos.y }
    }
}

impl From<PositionDoc> for Position {
    fn from(doc: PositionDoc) -> Self {
        Self::new(doc.x, doc.y)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitDoc {
    pub id: String,
    pub owner: String,
    pub hp: i32,
    #[serde(default)]
    pub max_hp: Option<i32>,
    pub attack: i32,
    #[serde(default = "default_range")]
    pub move_range: i32,
    #[serde(default = "default_range")]
    pub attack_range: i32,
    pub position: PositionDoc,
    pub alive: bool,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub hero_class: Option<String>,
    #[serde(default)]
    pub minion_type: Option<String>,
    #[serde(default)]
    pub skill_id: Option<String>,
    #[serde(default)]
    pub skill_cooldown: u32,
    #[serde(default)]
    pub shield: i32,
    #[serde(default)]
    pub invisible: bool,
    #[serde(default)]
    pub is_preparing: bool,
    #[serde(default)]
    pub preparing_action: Option<PreparedActionDoc>,
    #[serde(default)]
    pub actions_used: u32,
    #[serde(default)]
    pub temporary: bool,
    #[serde(default)]
    pub temporary_duration: u32,
    #[serde(default)]
    pub bonus_attack_damage: i32,
    #[serde(default)]
    pub bonus_attack_charges: u32,
    #[serde(default)]
    pub skill_state: Option<SkillStateDoc>,
}

fn default_range() -> i32 {
    1
}

fn default_category() -> String {
    "MINION".to_owned()
}

/// Per-skill persistent data; the beacon keys match the wire format.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SkillStateDoc {
    #[serde(default)]
    pub beacon_x: Option<i32>,
    #[serde(default)]
    pub beacon_y: Option<i32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedActionDoc {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default)]
    pub target_position: Option<PositionDoc>,
    #[serde(default)]
    pub target_unit_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuffDoc {
    pub buff_id: String,
    pub buff_type: String,
    #[serde(default)]
    pub source_unit_id: Option<String>,
    pub duration: u32,
    #[serde(default)]
    pub stackable: bool,
    #[serde(default)]
    pub modifiers: ModifiersDoc,
    #[serde(default)]
    pub flags: FlagsDoc,
    #[serde(default)]
    pub instant_hp_bonus: i32,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifiersDoc {
    #[serde(default)]
    pub bonus_hp: i32,
    #[serde(default)]
    pub bonus_attack: i32,
    #[serde(default)]
    pub bonus_move_range: i32,
    #[serde(default)]
    pub bonus_attack_range: i32,
}

/// Flags as named booleans, matching the wire format's field names.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagsDoc {
    #[serde(default)]
    pub stunned: bool,
    #[serde(default)]
    pub rooted: bool,
    #[serde(default)]
    pub poison: bool,
    #[serde(default)]
    pub power_buff: bool,
    #[serde(default)]
    pub speed_buff: bool,
    #[serde(default)]
    pub slow_buff: bool,
    #[serde(default)]
    pub life_buff: bool,
    #[serde(default)]
    pub bleed_buff: bool,
    #[serde(default)]
    pub blind_buff: bool,
    #[serde(default)]
    pub death_mark_buff: bool,
    #[serde(default)]
    pub feint_buff: bool,
    #[serde(default)]
    pub challenge_buff: bool,
    #[serde(default)]
    pub invulnerable_buff: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuffTileDoc {
    pub id: String,
    pub position: PositionDoc,
    #[serde(default)]
    pub buff_type: Option<String>,
    #[serde(default = "default_tile_duration")]
    pub duration: u32,
    #[serde(default)]
    pub triggered: bool,
}

fn default_tile_duration() -> u32 {
    BuffTile::DEFAULT_DURATION
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObstacleDoc {
    pub id: String,
    pub position: PositionDoc,
    #[serde(default = "default_obstacle_hp")]
    pub hp: i32,
}

fn default_obstacle_hp() -> i32 {
    Obstacle::DEFAULT_HP
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeathChoiceDoc {
    pub dead_unit_id: String,
    pub owner: String,
    pub death_position: PositionDoc,
}

// ============================================================================
// State -> document
// ============================================================================

pub fn to_document(state: &GameState) -> GameStateDoc {
    GameStateDoc {
        board: BoardDoc {
            width: state.board.width,
            height: state.board.height,
        },
        units: state.units.iter().map(unit_to_doc).collect(),
        current_player: state.current_player.as_str().to_owned(),
        game_over: state.is_game_over,
        winner: state.winner.map(|w| w.as_str().to_owned()),
        unit_buffs: state
            .unit_buffs
            .iter()
            .map(|(id, list)| (id.clone(), list.iter().map(buff_to_doc).collect()))
            .collect(),
        buff_tiles: state
            .buff_tiles
            .iter()
            .map(|t| BuffTileDoc {
                id: t.id.clone(),
                position: t.position.into(),
                buff_type: t.buff_type.map(|b| b.to_string()),
                duration: t.duration,
                triggered: t.triggered,
            })
            .collect(),
        obstacles: state
            .obstacles
            .iter()
            .map(|o| ObstacleDoc {
                id: o.id.clone(),
                position: o.position.into(),
                hp: o.hp,
            })
            .collect(),
        current_round: state.current_round,
        pending_death_choice: state.pending_death_choice.as_ref().map(|d| DeathChoiceDoc {
            dead_unit_id: d.dead_unit_id.clone(),
            owner: d.owner.as_str().to_owned(),
            death_position: d.death_position.into(),
        }),
    }
}

fn unit_to_doc(unit: &Unit) -> UnitDoc {
    UnitDoc {
        id: unit.id.clone(),
        owner: unit.owner.as_str().to_owned(),
        hp: unit.hp,
        max_hp: Some(unit.max_hp),
        attack: unit.attack,
        move_range: unit.move_range,
        attack_range: unit.attack_range,
        position: unit.position.into(),
        alive: unit.alive,
        category: unit.category.to_string(),
        hero_class: unit.hero_class.map(|c| c.to_string()),
        minion_type: unit.minion_type.map(|m| m.to_string()),
        skill_id: unit.skill_id.clone(),
        skill_cooldown: unit.skill_cooldown,
        shield: unit.shield,
        invisible: unit.invisible,
        is_preparing: unit.is_preparing,
        preparing_action: unit.preparing_action.as_ref().map(|p| PreparedActionDoc {
            action_type: p.action_type.to_string(),
            target_position: p.target_position.map(Into::into),
            target_unit_id: p.target_unit_id.clone(),
        }),
        actions_used: unit.actions_used,
        temporary: unit.temporary,
        temporary_duration: unit.temporary_duration,
        bonus_attack_damage: unit.bonus_attack_damage,
        bonus_attack_charges: unit.bonus_attack_charges,
        skill_state: unit.skill_state.map(|s| match s {
            SkillState::Beacon(pos) => SkillStateDoc {
                beacon_x: Some(pos.x),
                beacon_y: Some(pos.y),
            },
        }),
    }
}

fn buff_to_doc(buff: &BuffInstance) -> BuffDoc {
    let flags = buff.flags;
    BuffDoc {
        buff_id: buff.buff_id.clone(),
        buff_type: buff.buff_type.to_string(),
        source_unit_id: buff.source_unit_id.clone(),
        duration: buff.duration,
        stackable: buff.stackable,
        modifiers: ModifiersDoc {
            bonus_hp: buff.modifiers.bonus_hp,
            bonus_attack: buff.modifiers.bonus_attack,
            bonus_move_range: buff.modifiers.bonus_move_range,
            bonus_attack_range: buff.modifiers.bonus_attack_range,
        },
        flags: FlagsDoc {
            stunned: flags.contains(BuffFlags::STUNNED),
            rooted: flags.contains(BuffFlags::ROOTED),
            poison: flags.contains(BuffFlags::POISON),
            power_buff: flags.contains(BuffFlags::POWER),
            speed_buff: flags.contains(BuffFlags::SPEED),
            slow_buff: flags.contains(BuffFlags::SLOW),
            life_buff: flags.contains(BuffFlags::LIFE),
            bleed_buff: flags.contains(BuffFlags::BLEED),
            blind_buff: flags.contains(BuffFlags::BLIND),
            death_mark_buff: flags.contains(BuffFlags::DEATH_MARK),
            feint_buff: flags.contains(BuffFlags::FEINT),
            challenge_buff: flags.contains(BuffFlags::CHALLENGE),
            invulnerable_buff: flags.contains(BuffFlags::INVULNERABLE),
        },
        instant_hp_bonus: buff.instant_hp_bonus,
    }
}

// ============================================================================
// Document -> state
// ============================================================================

pub fn from_document(doc: &GameStateDoc) -> Result<GameState, SerializeError> {
    let parse_player =
        |s: &str| PlayerId::parse(s).ok_or_else(|| SerializeError::UnknownPlayer(s.to_owned()));

    let units = doc
        .units
        .iter()
        .map(unit_from_doc)
        .collect::<Result<Vec<_>, _>>()?;

    let mut unit_buffs = BTreeMap::new();
    for (unit_id, buffs) in &doc.unit_buffs {
        let mut list = BuffList::new();
        for buff in buffs {
            if !list.is_full() {
                list.push(buff_from_doc(buff)?);
            }
        }
        unit_buffs.insert(unit_id.clone(), list);
    }

    let buff_tiles = doc
        .buff_tiles
        .iter()
        .map(|t| {
            let buff_type = t
                .buff_type
                .as_deref()
                .map(|s| {
                    BuffType::from_str(s)
                        .map_err(|_| SerializeError::UnknownBuffType(s.to_owned()))
                })
                .transpose()?;
            Ok(BuffTile {
                id: t.id.clone(),
                position: t.position.into(),
                buff_type,
                duration: t.duration,
                triggered: t.triggered,
            })
        })
        .collect::<Result<Vec<_>, SerializeError>>()?;

    Ok(GameState {
        board: Board::new(doc.board.width, doc.board.height),
        units,
        current_player: parse_player(&doc.current_player)?,
        is_game_over: doc.game_over,
        winner: doc.winner.as_deref().map(parse_player).transpose()?,
        unit_buffs,
        buff_tiles,
        obstacles: doc
            .obstacles
            .iter()
            .map(|o| Obstacle {
                id: o.id.clone(),
                position: o.position.into(),
                hp: o.hp,
            })
            .collect(),
        current_round: doc.current_round,
        pending_death_choice: doc
            .pending_death_choice
            .as_ref()
            .map(|d| {
                Ok(DeathChoice {
                    dead_unit_id: d.dead_unit_id.clone(),
                    owner: parse_player(&d.owner)?,
                    death_position: d.death_position.into(),
                })
            })
            .transpose()?,
    })
}

fn unit_from_doc(doc: &UnitDoc) -> Result<Unit, SerializeError> {
    let owner = PlayerId::parse(&doc.owner)
        .ok_or_else(|| SerializeError::UnknownPlayer(doc.owner.clone()))?;
    let category = UnitCategory::from_str(&doc.category)
        .map_err(|_| SerializeError::UnknownCategory(doc.category.clone()))?;
    let hero_class = doc
        .hero_class
        .as_deref()
        .map(|s| HeroClass::from_str(s).map_err(|_| SerializeError::UnknownHeroClass(s.to_owned())))
        .transpose()?;
    let minion_type = doc
        .minion_type
        .as_deref()
        .map(|s| {
            MinionType::from_str(s).map_err(|_| SerializeError::UnknownMinionType(s.to_owned()))
        })
        .transpose()?;
    let preparing_action = doc
        .preparing_action
        .as_ref()
        .map(|p| {
            Ok(PreparedAction {
                action_type: ActionType::from_str(&p.action_type)
                    .map_err(|_| SerializeError::UnknownActionType(p.action_type.clone()))?,
                target_position: p.target_position.map(Into::into),
                target_unit_id: p.target_unit_id.clone(),
            })
        })
        .transpose()?;

    Ok(Unit {
        id: doc.id.clone(),
        owner,
        hp: doc.hp,
        max_hp: doc.max_hp.unwrap_or(doc.hp),
        attack: doc.attack,
        move_range: doc.move_range,
        attack_range: doc.attack_range,
        position: doc.position.into(),
        alive: doc.alive,
        category,
        hero_class,
        minion_type,
        skill_id: doc.skill_id.clone(),
        skill_cooldown: doc.skill_cooldown,
        shield: doc.shield,
        invisible: doc.invisible,
        is_preparing: doc.is_preparing,
        preparing_action,
        actions_used: doc.actions_used,
        temporary: doc.temporary,
        temporary_duration: doc.temporary_duration,
        bonus_attack_damage: doc.bonus_attack_damage,
        bonus_attack_charges: doc.bonus_attack_charges,
        skill_state: doc.skill_state.as_ref().and_then(|s| {
            match (s.beacon_x, s.beacon_y) {
                (Some(x), Some(y)) => Some(SkillState::Beacon(Position::new(x, y))),
                _ => None,
            }
        }),
    })
}

fn buff_from_doc(doc: &BuffDoc) -> Result<BuffInstance, SerializeError> {
    let buff_type = BuffType::from_str(&doc.buff_type)
        .map_err(|_| SerializeError::UnknownBuffType(doc.buff_type.clone()))?;

    let mut flags = BuffFlags::empty();
    let f = &doc.flags;
    flags.set(BuffFlags::STUNNED, f.stunned);
    flags.set(BuffFlags::ROOTED, f.rooted);
    flags.set(BuffFlags::POISON, f.poison);
    flags.set(BuffFlags::POWER, f.power_buff);
    flags.set(BuffFlags::SPEED, f.speed_buff);
    flags.set(BuffFlags::SLOW, f.slow_buff);
    flags.set(BuffFlags::LIFE, f.life_buff);
    flags.set(BuffFlags::BLEED, f.bleed_buff);
    flags.set(BuffFlags::BLIND, f.blind_buff);
    flags.set(BuffFlags::DEATH_MARK, f.death_mark_buff);
    flags.set(BuffFlags::FEINT, f.feint_buff);
    flags.set(BuffFlags::CHALLENGE, f.challenge_buff);
    flags.set(BuffFlags::INVULNERABLE, f.invulnerable_buff);

    Ok(BuffInstance {
        buff_id: doc.buff_id.clone(),
        buff_type,
        source_unit_id: doc.source_unit_id.clone(),
        duration: doc.duration,
        stackable: doc.stackable,
        modifiers: BuffModifier {
            bonus_hp: doc.modifiers.bonus_hp,
            bonus_attack: doc.modifiers.bonus_attack,
            bonus_move_range: doc.modifiers.bonus_move_range,
            bonus_attack_range: doc.modifiers.bonus_attack_range,
        },
        flags,
        instant_hp_bonus: doc.instant_hp_bonus,
    })
}

// ============================================================================
// State digest
// ============================================================================

/// SHA-256 over the bincode encoding of the full snapshot.
///
/// Two states are bit-identical iff their digests match, which gives replay
/// tests a single value to compare instead of a field-by-field walk.
pub fn state_digest(state: &GameState) -> [u8; 32] {
    use sha2::{Digest, Sha256};

    let bytes = bincode::serialize(state).expect("GameState serialization is infallible");
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    hasher.finalize().into()
}
