//! The rule engine: action validation and state transition.
//!
//! [`RuleEngine`] is the authoritative reducer for [`GameState`]. Callers
//! must run [`RuleEngine::validate_action`] first; [`RuleEngine::apply_action`]
//! assumes a valid action and is best-effort on anything else, but never
//! corrupts state invariants. Illegal moves are reported as
//! [`ValidationResult`] values, never as errors or panics.

mod combat;
mod skill_exec;
mod turn;
mod validate;

use crate::action::{Action, ActionType};
use crate::buff::{self, BuffInstance};
use crate::env::{RngProvider, SeededRng};
use crate::state::{GameState, PlayerId, Position, Unit, UnitBuffs};

/// Outcome of validating a proposed action.
///
/// `error_message` is a fixed, stable string per failure category so callers
/// and tests can match on exact text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub error_message: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error_message: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            error_message: Some(message.into()),
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Validates and applies actions.
///
/// The RNG source is constructor-injected so tests can substitute
/// deterministic stubs without touching engine internals. The RNG sequence
/// position is the only state the engine carries between calls.
pub struct RuleEngine<R: RngProvider = SeededRng> {
    rng: R,
}

impl RuleEngine<SeededRng> {
    /// Engine with the default PCG source seeded from `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self::new(SeededRng::new(seed))
    }
}

impl<R: RngProvider> RuleEngine<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Pure legality check; never mutates the state or the RNG position.
    pub fn validate_action(&self, state: &GameState, action: &Action) -> ValidationResult {
        validate::validate(state, action)
    }

    /// Folds a validated action into the next state.
    pub fn apply_action(&mut self, state: &GameState, action: &Action) -> GameState {
        match action.action_type {
            ActionType::Move => combat::apply_move(state, action, &mut self.rng),
            ActionType::Attack => combat::apply_attack(state, action),
            ActionType::MoveAndAttack => combat::apply_move_and_attack(state, action, &mut self.rng),
            ActionType::EndTurn => combat::apply_end_turn(state, action),
            ActionType::UseSkill => skill_exec::apply_use_skill(state, action, &mut self.rng),
        }
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Rebuilds the unit list with `transform` applied to the unit with `id`.
pub(crate) fn update_unit(units: &[Unit], id: &str, transform: impl Fn(&Unit) -> Unit) -> Vec<Unit> {
    units
        .iter()
        .map(|u| if u.id == id { transform(u) } else { u.clone() })
        .collect()
}

pub(crate) fn find_unit<'a>(units: &'a [Unit], id: &str) -> Option<&'a Unit> {
    units.iter().find(|u| u.id == id)
}

/// Movement reachability: orthogonal, within `1..=range` tiles.
pub(crate) fn can_move_to(from: Position, target: Position, range: i32) -> bool {
    if !from.is_orthogonal_to(target) {
        return false;
    }
    let distance = from.manhattan_distance(target);
    distance >= 1 && distance <= range
}

/// Attack reachability uses the same orthogonal-range rule.
pub(crate) fn can_attack_from(from: Position, target: Position, range: i32) -> bool {
    can_move_to(from, target, range)
}

pub(crate) fn effective_move_range(unit: &Unit, buffs: &[BuffInstance]) -> i32 {
    unit.move_range + buff::bonus_move_range(buffs)
}

pub(crate) fn effective_attack_range(unit: &Unit, buffs: &[BuffInstance]) -> i32 {
    unit.attack_range + buff::bonus_attack_range(buffs)
}

/// Guardian resolution: the alive friendly TANK orthogonally adjacent to the
/// target with the lowest unit id, if any. A Tank never guards itself.
pub(crate) fn find_guardian<'a>(units: &'a [Unit], target: &Unit) -> Option<&'a Unit> {
    if target.is_tank() && target.alive {
        return None;
    }
    units
        .iter()
        .filter(|u| {
            u.alive
                && u.owner == target.owner
                && u.is_tank()
                && u.id != target.id
                && u.position.is_adjacent_to(target.position)
        })
        .min_by(|a, b| a.id.cmp(&b.id))
}

/// Win condition: a side with zero alive units loses. A simultaneous
/// wipe-out goes to the acting player.
pub(crate) fn check_game_over(
    units: &[Unit],
    active_player: Option<PlayerId>,
) -> (bool, Option<PlayerId>) {
    let p1_alive = units.iter().any(|u| u.alive && u.owner == PlayerId::P1);
    let p2_alive = units.iter().any(|u| u.alive && u.owner == PlayerId::P2);

    match (p1_alive, p2_alive) {
        (false, false) => (true, Some(active_player.unwrap_or(PlayerId::P1))),
        (false, true) => (true, Some(PlayerId::P2)),
        (true, false) => (true, Some(PlayerId::P1)),
        (true, true) => (false, None),
    }
}

/// Grants a buff to `unit_id`: same-type refresh or append, then the
/// instant HP delta. Instant HP goes through normal death handling.
pub(crate) fn grant_buff(
    units: &mut Vec<Unit>,
    unit_buffs: &mut UnitBuffs,
    unit_id: &str,
    instance: BuffInstance,
) {
    let instant = instance.instant_hp_bonus;
    buff::add_to_list(unit_buffs.entry(unit_id.to_owned()).or_default(), instance);
    if instant != 0 {
        *units = update_unit(units, unit_id, |u| u.with_hp_bonus(instant));
    }
}

/// Drops every instance matching `predicate` from a unit's buff list,
/// removing the map entry when the list empties.
pub(crate) fn remove_buffs(
    unit_buffs: &mut UnitBuffs,
    unit_id: &str,
    predicate: impl Fn(&BuffInstance) -> bool,
) {
    let mut now_empty = false;
    if let Some(list) = unit_buffs.get_mut(unit_id) {
        list.retain(|b| !predicate(b));
        now_empty = list.is_empty();
    }
    if now_empty {
        unit_buffs.remove(unit_id);
    }
}
