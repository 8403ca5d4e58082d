//! Combatant records.
//!
//! Units are value records: every update constructs a new `Unit` with one
//! field changed, so snapshots stay cheap to compare and safe to replay.

use strum::{Display, EnumString};

use crate::action::PreparedAction;
use crate::state::types::common::{PlayerId, Position};

/// Whether a unit is a player's main character or a support unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnitCategory {
    Hero,
    Minion,
}

/// Hero archetype; selects the skill kit a hero may equip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HeroClass {
    Warrior,
    Mage,
    Rogue,
    Huntress,
    Duelist,
    Cleric,
}

/// Minion archetype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MinionType {
    /// Frontline wall; intercepts damage for adjacent allies (Guardian).
    Tank,
    /// Long-range attacker.
    Archer,
    /// Fast melee attacker; also the shape of summoned clones.
    Assassin,
}

/// Per-skill persistent data carried between uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SkillState {
    /// A placed Warp Beacon waiting to be teleported to.
    Beacon(Position),
}

/// A unit on the board.
///
/// `alive` is derived from `hp > 0` whenever damage or healing is applied,
/// but remains explicitly settable so fixtures can describe already-dead
/// units.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Unit {
    pub id: String,
    pub owner: PlayerId,
    pub hp: i32,
    pub max_hp: i32,
    pub attack: i32,
    pub move_range: i32,
    pub attack_range: i32,
    pub position: Position,
    pub alive: bool,
    pub category: UnitCategory,
    pub hero_class: Option<HeroClass>,
    pub minion_type: Option<MinionType>,
    /// Identifier of the hero's equipped skill, if any.
    pub skill_id: Option<String>,
    /// Rounds until the skill is usable again; 0 means ready.
    pub skill_cooldown: u32,
    /// Temporary hit points absorbed before `hp`.
    pub shield: i32,
    pub invisible: bool,
    /// SLOW-delayed action waiting for round end.
    pub is_preparing: bool,
    pub preparing_action: Option<PreparedAction>,
    /// Actions taken this round; reset to 0 when the round ends.
    pub actions_used: u32,
    /// Summoned units are removed once their duration runs out.
    pub temporary: bool,
    pub temporary_duration: u32,
    /// Consumable attack empowerment (e.g. Nature's Power).
    pub bonus_attack_damage: i32,
    pub bonus_attack_charges: u32,
    pub skill_state: Option<SkillState>,
}

impl Unit {
    /// Creates a minion with the given base stats.
    pub fn minion(
        id: impl Into<String>,
        owner: PlayerId,
        minion_type: MinionType,
        hp: i32,
        attack: i32,
        move_range: i32,
        attack_range: i32,
        position: Position,
    ) -> Self {
        Self {
            id: id.into(),
            owner,
            hp,
            max_hp: hp,
            attack,
            move_range,
            attack_range,
            position,
            alive: hp > 0,
            category: UnitCategory::Minion,
            hero_class: None,
            minion_type: Some(minion_type),
            skill_id: None,
            skill_cooldown: 0,
            shield: 0,
            invisible: false,
            is_preparing: false,
            preparing_action: None,
            actions_used: 0,
            temporary: false,
            temporary_duration: 0,
            bonus_attack_damage: 0,
            bonus_attack_charges: 0,
            skill_state: None,
        }
    }

    /// Creates a hero of the given class with an equipped skill.
    pub fn hero(
        id: impl Into<String>,
        owner: PlayerId,
        hero_class: HeroClass,
        skill_id: Option<&str>,
        hp: i32,
        attack: i32,
        move_range: i32,
        attack_range: i32,
        position: Position,
    ) -> Self {
        Self {
            category: UnitCategory::Hero,
            hero_class: Some(hero_class),
            minion_type: None,
            skill_id: skill_id.map(str::to_owned),
            ..Self::minion(id, owner, MinionType::Assassin, hp, attack, move_range, attack_range, position)
        }
    }

    #[inline]
    pub fn is_hero(&self) -> bool {
        self.category == UnitCategory::Hero
    }

    #[inline]
    pub fn is_tank(&self) -> bool {
        self.minion_type == Some(MinionType::Tank)
    }

    // ========================================================================
    // Value-copy updates
    // ========================================================================

    pub fn with_position(&self, position: Position) -> Self {
        Self { position, ..self.clone() }
    }

    pub fn with_alive(&self, alive: bool) -> Self {
        Self { alive, ..self.clone() }
    }

    /// Applies damage: shield absorbs first, the remainder reduces `hp`,
    /// and `alive` is re-derived. Negative amounts are treated as zero.
    pub fn with_damage(&self, amount: i32) -> Self {
        let amount = amount.max(0);
        let absorbed = amount.min(self.shield);
        let hp = self.hp - (amount - absorbed);
        Self {
            shield: self.shield - absorbed,
            hp,
            alive: hp > 0,
            ..self.clone()
        }
    }

    /// Applies a raw HP delta (heals and instant buff HP). Does not touch
    /// the shield; negative deltas can kill.
    pub fn with_hp_bonus(&self, delta: i32) -> Self {
        let hp = self.hp + delta;
        Self {
            hp,
            alive: hp > 0,
            ..self.clone()
        }
    }

    pub fn with_shield(&self, shield: i32) -> Self {
        Self { shield, ..self.clone() }
    }

    pub fn with_invisible(&self, invisible: bool) -> Self {
        Self { invisible, ..self.clone() }
    }

    pub fn with_action_used(&self) -> Self {
        Self {
            actions_used: self.actions_used + 1,
            ..self.clone()
        }
    }

    pub fn with_actions_used(&self, actions_used: u32) -> Self {
        Self { actions_used, ..self.clone() }
    }

    pub fn with_position_and_action_used(&self, position: Position) -> Self {
        Self {
            position,
            actions_used: self.actions_used + 1,
            ..self.clone()
        }
    }

    /// Stores a SLOW-delayed action and consumes the unit's action slot.
    pub fn with_preparing_and_action_used(&self, action: PreparedAction) -> Self {
        Self {
            is_preparing: true,
            preparing_action: Some(action),
            actions_used: self.actions_used + 1,
            ..self.clone()
        }
    }

    pub fn with_preparing_cleared(&self) -> Self {
        Self {
            is_preparing: false,
            preparing_action: None,
            ..self.clone()
        }
    }

    /// Marks the skill as spent: starts the cooldown and consumes an action.
    pub fn with_skill_used(&self, cooldown: u32) -> Self {
        Self {
            skill_cooldown: cooldown,
            actions_used: self.actions_used + 1,
            ..self.clone()
        }
    }

    pub fn with_cooldown_tick(&self) -> Self {
        Self {
            skill_cooldown: self.skill_cooldown.saturating_sub(1),
            ..self.clone()
        }
    }

    pub fn with_bonus_attack(&self, damage: i32, charges: u32) -> Self {
        Self {
            bonus_attack_damage: damage,
            bonus_attack_charges: charges,
            ..self.clone()
        }
    }

    /// Spends one empowerment charge; clears the bonus once exhausted.
    pub fn with_bonus_attack_consumed(&self) -> Self {
        let charges = self.bonus_attack_charges.saturating_sub(1);
        Self {
            bonus_attack_charges: charges,
            bonus_attack_damage: if charges == 0 { 0 } else { self.bonus_attack_damage },
            ..self.clone()
        }
    }

    pub fn with_skill_state(&self, skill_state: Option<SkillState>) -> Self {
        Self { skill_state, ..self.clone() }
    }

    pub fn with_temporary_duration(&self, temporary_duration: u32) -> Self {
        Self { temporary_duration, ..self.clone() }
    }

    /// Round-end reset: the unit is ready to act again and any leftover
    /// preparing state is dropped.
    pub fn with_round_end_reset(&self) -> Self {
        Self {
            actions_used: 0,
            is_preparing: false,
            preparing_action: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swordsman(id: &str) -> Unit {
        Unit::minion(id, PlayerId::P1, MinionType::Assassin, 10, 3, 1, 1, Position::ORIGIN)
    }

    #[test]
    fn shield_absorbs_before_hp() {
        let unit = swordsman("u1").with_shield(3);
        let hit = unit.with_damage(4);
        assert_eq!(hit.shield, 0);
        assert_eq!(hit.hp, 9);
        assert!(hit.alive);
    }

    #[test]
    fn damage_past_zero_marks_dead() {
        let hit = swordsman("u1").with_damage(12);
        assert_eq!(hit.hp, -2);
        assert!(!hit.alive);
    }

    #[test]
    fn negative_damage_is_ignored() {
        let hit = swordsman("u1").with_damage(-5);
        assert_eq!(hit.hp, 10);
    }

    #[test]
    fn hp_bonus_can_kill_and_revive_follows_hp() {
        let weakened = swordsman("u1").with_hp_bonus(-10);
        assert!(!weakened.alive);
        let healed = weakened.with_hp_bonus(3);
        assert!(healed.alive);
        assert_eq!(healed.hp, 3);
    }

    #[test]
    fn bonus_attack_clears_when_charges_run_out() {
        let empowered = swordsman("u1").with_bonus_attack(2, 2);
        let once = empowered.with_bonus_attack_consumed();
        assert_eq!(once.bonus_attack_charges, 1);
        assert_eq!(once.bonus_attack_damage, 2);
        let twice = once.with_bonus_attack_consumed();
        assert_eq!(twice.bonus_attack_charges, 0);
        assert_eq!(twice.bonus_attack_damage, 0);
    }

    #[test]
    fn round_end_reset_clears_action_bookkeeping() {
        let unit = swordsman("u1").with_action_used().with_action_used();
        assert_eq!(unit.actions_used, 2);
        let reset = unit.with_round_end_reset();
        assert_eq!(reset.actions_used, 0);
        assert!(!reset.is_preparing);
    }
}
