//! Timed effect system.
//!
//! Buffs are data, not behavior: a closed [`BuffType`] catalog, additive
//! numeric [`BuffModifier`]s and a [`BuffFlags`] capability set. The engine
//! interprets the data; no buff carries code of its own.

use arrayvec::ArrayVec;
use strum::{Display, EnumIter, EnumString};

use crate::config::GameConfig;

/// The closed catalog of buff and debuff types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BuffType {
    /// +3 ATK, +1 HP on grant; an empowered unit cannot MOVE_AND_ATTACK.
    Power,
    /// +3 HP on grant.
    Life,
    /// -1 ATK; two actions per round.
    Speed,
    /// -2 ATK, -1 HP on grant.
    Weakness,
    /// 1 damage per instance at round end.
    Bleed,
    /// Declared actions resolve at round end instead of immediately.
    Slow,
    /// Blocks everything except END_TURN.
    Stun,
    /// Blocks movement only.
    Root,
    /// 1 damage per instance at round end.
    Poison,
    /// Carrier cannot attack.
    Blind,
    /// Carrier takes +2 attack damage; source heals 2 when the carrier dies.
    DeathMark,
    /// Next incoming attack misses and is countered; consumed on trigger.
    Feint,
    /// Carrier deals half damage to anyone but the challenger and is
    /// countered when attacking the challenger.
    Challenge,
    /// Negates incoming attack damage.
    Invulnerable,
}

impl BuffType {
    /// The six core types a blank buff tile rolls between.
    pub const CORE: [BuffType; 6] = [
        BuffType::Power,
        BuffType::Life,
        BuffType::Speed,
        BuffType::Weakness,
        BuffType::Bleed,
        BuffType::Slow,
    ];
}

bitflags::bitflags! {
    /// Boolean capability restrictions and semantic tags, unioned across all
    /// active instances on a unit.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct BuffFlags: u16 {
        const STUNNED      = 1 << 0;
        const ROOTED       = 1 << 1;
        const POISON       = 1 << 2;
        const POWER        = 1 << 3;
        const SPEED        = 1 << 4;
        const SLOW         = 1 << 5;
        const LIFE         = 1 << 6;
        const BLEED        = 1 << 7;
        const BLIND        = 1 << 8;
        const DEATH_MARK   = 1 << 9;
        const FEINT        = 1 << 10;
        const CHALLENGE    = 1 << 11;
        const INVULNERABLE = 1 << 12;
    }
}

/// Additive stat deltas contributed by a single buff instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuffModifier {
    pub bonus_hp: i32,
    pub bonus_attack: i32,
    pub bonus_move_range: i32,
    pub bonus_attack_range: i32,
}

impl BuffModifier {
    pub const NONE: Self = Self {
        bonus_hp: 0,
        bonus_attack: 0,
        bonus_move_range: 0,
        bonus_attack_range: 0,
    };

    pub const fn attack(bonus_attack: i32) -> Self {
        Self { bonus_attack, ..Self::NONE }
    }
}

/// One active timed effect on a unit.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuffInstance {
    pub buff_id: String,
    pub buff_type: BuffType,
    /// Unit (or other source) that granted this buff, when known.
    pub source_unit_id: Option<String>,
    /// Rounds remaining; decremented at round end, removed at zero.
    pub duration: u32,
    /// Stackable instances always append; non-stackable refresh in place.
    pub stackable: bool,
    pub modifiers: BuffModifier,
    pub flags: BuffFlags,
    /// One-time HP delta applied every time the buff is granted.
    pub instant_hp_bonus: i32,
}

impl BuffInstance {
    /// Canonical catalog constructor. Ids derive from type and source so
    /// identical inputs produce identical instances (no ambient entropy).
    pub fn of(buff_type: BuffType, source_unit_id: &str) -> Self {
        let (modifiers, flags, instant_hp_bonus, duration) = match buff_type {
            BuffType::Power => (BuffModifier::attack(3), BuffFlags::POWER, 1, GameConfig::DEFAULT_BUFF_DURATION),
            BuffType::Life => (BuffModifier::NONE, BuffFlags::LIFE, 3, GameConfig::DEFAULT_BUFF_DURATION),
            BuffType::Speed => (BuffModifier::attack(-1), BuffFlags::SPEED, 0, GameConfig::DEFAULT_BUFF_DURATION),
            BuffType::Weakness => (BuffModifier::attack(-2), BuffFlags::empty(), -1, GameConfig::DEFAULT_BUFF_DURATION),
            BuffType::Bleed => (BuffModifier::NONE, BuffFlags::BLEED, 0, GameConfig::DEFAULT_BUFF_DURATION),
            BuffType::Slow => (BuffModifier::NONE, BuffFlags::SLOW, 0, GameConfig::DEFAULT_BUFF_DURATION),
            BuffType::Stun => (BuffModifier::NONE, BuffFlags::STUNNED, 0, GameConfig::DEFAULT_BUFF_DURATION),
            BuffType::Root => (BuffModifier::NONE, BuffFlags::ROOTED, 0, GameConfig::DEFAULT_BUFF_DURATION),
            BuffType::Poison => (BuffModifier::NONE, BuffFlags::POISON, 0, GameConfig::DEFAULT_BUFF_DURATION),
            BuffType::Blind => (BuffModifier::NONE, BuffFlags::BLIND, 0, 1),
            BuffType::DeathMark => (BuffModifier::NONE, BuffFlags::DEATH_MARK, 0, GameConfig::DEFAULT_BUFF_DURATION),
            BuffType::Feint => (BuffModifier::NONE, BuffFlags::FEINT, 0, GameConfig::DEFAULT_BUFF_DURATION),
            BuffType::Challenge => (BuffModifier::NONE, BuffFlags::CHALLENGE, 0, GameConfig::DEFAULT_BUFF_DURATION),
            BuffType::Invulnerable => (BuffModifier::NONE, BuffFlags::INVULNERABLE, 0, 1),
        };

        Self {
            buff_id: format!("{buff_type}_{source_unit_id}"),
            buff_type,
            source_unit_id: Some(source_unit_id.to_owned()),
            duration,
            stackable: false,
            modifiers,
            flags,
            instant_hp_bonus,
        }
    }

    /// A stackable flat-attack rally (Power of Many).
    pub fn rally_attack(source_unit_id: &str, bonus_attack: i32, duration: u32) -> Self {
        Self {
            buff_id: format!("rally_{source_unit_id}"),
            buff_type: BuffType::Power,
            source_unit_id: Some(source_unit_id.to_owned()),
            duration,
            stackable: true,
            modifiers: BuffModifier::attack(bonus_attack),
            flags: BuffFlags::empty(),
            instant_hp_bonus: 0,
        }
    }

    pub fn with_duration(&self, duration: u32) -> Self {
        Self { duration, ..self.clone() }
    }

    /// A debuff for cleansing purposes: anything that restricts the carrier
    /// or lowers its attack.
    pub fn is_debuff(&self) -> bool {
        self.flags.intersects(
            BuffFlags::BLEED | BuffFlags::SLOW | BuffFlags::STUNNED | BuffFlags::ROOTED | BuffFlags::POISON,
        ) || self.modifiers.bonus_attack < 0
    }
}

/// Bounded per-unit buff list.
pub type BuffList = ArrayVec<BuffInstance, { GameConfig::MAX_ACTIVE_BUFFS }>;

// ============================================================================
// Aggregate queries over a unit's active buffs
// ============================================================================

/// Union of all flags across the given instances.
pub fn flags_union(buffs: &[BuffInstance]) -> BuffFlags {
    buffs.iter().fold(BuffFlags::empty(), |acc, b| acc | b.flags)
}

pub fn has_flag(buffs: &[BuffInstance], flag: BuffFlags) -> bool {
    flags_union(buffs).intersects(flag)
}

pub fn bonus_attack(buffs: &[BuffInstance]) -> i32 {
    buffs.iter().map(|b| b.modifiers.bonus_attack).sum()
}

pub fn bonus_move_range(buffs: &[BuffInstance]) -> i32 {
    buffs.iter().map(|b| b.modifiers.bonus_move_range).sum()
}

pub fn bonus_attack_range(buffs: &[BuffInstance]) -> i32 {
    buffs.iter().map(|b| b.modifiers.bonus_attack_range).sum()
}

/// Damage-over-time ticks: 1 per POISON-flagged instance.
pub fn poison_ticks(buffs: &[BuffInstance]) -> i32 {
    buffs.iter().filter(|b| b.flags.contains(BuffFlags::POISON)).count() as i32
}

/// Damage-over-time ticks: 1 per BLEED-flagged instance.
pub fn bleed_ticks(buffs: &[BuffInstance]) -> i32 {
    buffs.iter().filter(|b| b.flags.contains(BuffFlags::BLEED)).count() as i32
}

/// Actions available per round: SPEED doubles the budget.
pub fn max_actions(buffs: &[BuffInstance]) -> u32 {
    if has_flag(buffs, BuffFlags::SPEED) {
        GameConfig::SPEED_MAX_ACTIONS
    } else {
        GameConfig::BASE_MAX_ACTIONS
    }
}

/// Source of the first CHALLENGE instance, if any.
pub fn challenge_source(buffs: &[BuffInstance]) -> Option<&str> {
    buffs
        .iter()
        .find(|b| b.flags.contains(BuffFlags::CHALLENGE))
        .and_then(|b| b.source_unit_id.as_deref())
}

/// Source of the first DEATH_MARK instance, if any.
pub fn death_mark_source(buffs: &[BuffInstance]) -> Option<&str> {
    buffs
        .iter()
        .find(|b| b.flags.contains(BuffFlags::DEATH_MARK))
        .and_then(|b| b.source_unit_id.as_deref())
}

/// Adds a buff to a list: same-type non-stackable instances are refreshed in
/// place (new duration, new id), everything else appends. Silently drops the
/// buff if the list is at capacity.
pub fn add_to_list(list: &mut BuffList, buff: BuffInstance) {
    if !buff.stackable {
        if let Some(existing) = list.iter_mut().find(|b| b.buff_type == buff.buff_type && !b.stackable) {
            *existing = buff;
            return;
        }
    }
    if !list.is_full() {
        list.push(buff);
    }
}
