//! Player commands.
//!
//! An [`Action`] is the envelope a player submits for one unit. The engine
//! validates it against the current state and, if legal, folds it into the
//! next state. Dispatch is a closed match over [`ActionType`].

use strum::{Display, EnumString};

use crate::buff::BuffType;
use crate::state::{PlayerId, Position};

/// The closed set of player-submittable actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionType {
    Move,
    Attack,
    MoveAndAttack,
    EndTurn,
    UseSkill,
}

/// A player-issued command.
///
/// `acting_unit_id` identifies the unit performing the action. It is
/// required for USE_SKILL; for the board actions it may be omitted by
/// pre-turn-system callers, in which case the engine resolves the unique
/// qualifying unit from the target alone.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Action {
    pub action_type: ActionType,
    pub player: PlayerId,
    pub target_position: Option<Position>,
    pub target_unit_id: Option<String>,
    pub acting_unit_id: Option<String>,
    /// Target unit for skills; falls back to `target_unit_id` when absent.
    pub skill_target_unit_id: Option<String>,
    /// Player-chosen debuff for skills that offer a choice.
    pub chosen_buff_type: Option<BuffType>,
}

impl Action {
    fn new(action_type: ActionType, player: PlayerId) -> Self {
        Self {
            action_type,
            player,
            target_position: None,
            target_unit_id: None,
            acting_unit_id: None,
            skill_target_unit_id: None,
            chosen_buff_type: None,
        }
    }

    /// MOVE the unique unit that can reach `target`.
    pub fn move_to(player: PlayerId, target: Position) -> Self {
        Self {
            target_position: Some(target),
            ..Self::new(ActionType::Move, player)
        }
    }

    /// MOVE a named unit to `target`.
    pub fn move_unit(player: PlayerId, acting_unit_id: &str, target: Position) -> Self {
        Self {
            acting_unit_id: Some(acting_unit_id.to_owned()),
            ..Self::move_to(player, target)
        }
    }

    /// ATTACK `target_unit_id` standing at `target_position`.
    pub fn attack(player: PlayerId, target_position: Position, target_unit_id: &str) -> Self {
        Self {
            target_position: Some(target_position),
            target_unit_id: Some(target_unit_id.to_owned()),
            ..Self::new(ActionType::Attack, player)
        }
    }

    /// MOVE to `move_to` and then attack `target_unit_id` from there.
    pub fn move_and_attack(player: PlayerId, move_to: Position, target_unit_id: &str) -> Self {
        Self {
            target_position: Some(move_to),
            target_unit_id: Some(target_unit_id.to_owned()),
            ..Self::new(ActionType::MoveAndAttack, player)
        }
    }

    /// END_TURN, optionally naming the unit that passes.
    pub fn end_turn(player: PlayerId) -> Self {
        Self::new(ActionType::EndTurn, player)
    }

    pub fn end_turn_unit(player: PlayerId, acting_unit_id: &str) -> Self {
        Self {
            acting_unit_id: Some(acting_unit_id.to_owned()),
            ..Self::new(ActionType::EndTurn, player)
        }
    }

    /// USE_SKILL with an optional tile and/or unit target.
    pub fn use_skill(
        player: PlayerId,
        acting_unit_id: &str,
        target_position: Option<Position>,
        skill_target_unit_id: Option<&str>,
    ) -> Self {
        Self {
            acting_unit_id: Some(acting_unit_id.to_owned()),
            target_position,
            skill_target_unit_id: skill_target_unit_id.map(str::to_owned),
            ..Self::new(ActionType::UseSkill, player)
        }
    }

    /// USE_SKILL with a player-chosen debuff (e.g. Elemental Strike).
    pub fn use_skill_with_choice(
        player: PlayerId,
        acting_unit_id: &str,
        skill_target_unit_id: &str,
        chosen: BuffType,
    ) -> Self {
        Self {
            chosen_buff_type: Some(chosen),
            ..Self::use_skill(player, acting_unit_id, None, Some(skill_target_unit_id))
        }
    }

    /// The unit id a skill should target.
    pub fn skill_target(&self) -> Option<&str> {
        self.skill_target_unit_id
            .as_deref()
            .or(self.target_unit_id.as_deref())
    }
}

/// The stored form of a SLOW-delayed action, executed at round end.
///
/// Only the board actions can be deferred; the stored attack keeps the
/// declared target position so a target that moved away is silently missed.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PreparedAction {
    pub action_type: ActionType,
    pub target_position: Option<Position>,
    pub target_unit_id: Option<String>,
}

impl PreparedAction {
    pub fn from_action(action: &Action) -> Self {
        Self {
            action_type: action.action_type,
            target_position: action.target_position,
            target_unit_id: action.target_unit_id.clone(),
        }
    }
}
