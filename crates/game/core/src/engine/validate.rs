//! Action validation.
//!
//! Pure legality checks over a snapshot. The dispatch order and the exact
//! error strings are part of the engine's contract; tests match on them.

use crate::action::{Action, ActionType};
use crate::buff::{self, BuffFlags, BuffInstance};
use crate::skill::{self, SkillSpec, TargetShape};
use crate::state::{GameState, Position, SkillState, Unit, UnitCategory};

use super::{ValidationResult, can_attack_from, can_move_to, effective_attack_range, effective_move_range};

pub(super) fn validate(state: &GameState, action: &Action) -> ValidationResult {
    if state.is_game_over {
        return ValidationResult::fail("Game is already over");
    }

    if action.player != state.current_player {
        return ValidationResult::fail("Not your turn");
    }

    // When the caller names the acting unit, gate on its identity up front.
    // USE_SKILL re-checks with its own ordering below.
    if action.action_type != ActionType::UseSkill {
        if let Some(acting_id) = action.acting_unit_id.as_deref() {
            let Some(acting) = state.unit(acting_id) else {
                return ValidationResult::fail("Acting unit not found");
            };
            if acting.owner != action.player {
                return ValidationResult::fail("Cannot control opponent's unit");
            }
            if !acting.alive {
                return ValidationResult::fail("Acting unit is dead");
            }
        }
    }

    match action.action_type {
        ActionType::EndTurn => ValidationResult::ok(),
        ActionType::Move => validate_move(state, action),
        ActionType::Attack => validate_attack(state, action),
        ActionType::MoveAndAttack => validate_move_and_attack(state, action),
        ActionType::UseSkill => validate_use_skill(state, action),
    }
}

fn can_act(unit: &Unit, buffs: &[BuffInstance]) -> bool {
    unit.actions_used < buff::max_actions(buffs)
}

/// A unit holding a stored SLOW action may not declare anything new until
/// the stored action resolves at round end.
fn preparing_gate(unit: &Unit) -> Option<ValidationResult> {
    unit.is_preparing
        .then(|| ValidationResult::fail("Unit is preparing an action"))
}

/// Friendly, alive units able to reach `target` this turn.
fn movers_to<'a>(state: &'a GameState, action: &Action, target: Position) -> Vec<&'a Unit> {
    state
        .units
        .iter()
        .filter(|u| u.alive && u.owner == action.player)
        .filter(|u| can_move_to(u.position, target, effective_move_range(u, state.buffs(&u.id))))
        .collect()
}

fn validate_move(state: &GameState, action: &Action) -> ValidationResult {
    if action.target_unit_id.is_some() {
        return ValidationResult::fail("MOVE must not specify targetUnitId");
    }

    let Some(target_pos) = action.target_position else {
        return ValidationResult::fail("Target position is required for MOVE");
    };

    if !state.board.contains(target_pos) {
        return ValidationResult::fail("Target position is outside the board");
    }

    if state.is_tile_blocked(target_pos) {
        return ValidationResult::fail("Target tile is occupied");
    }

    let movers = movers_to(state, action, target_pos);
    if movers.is_empty() {
        return ValidationResult::fail("No valid unit can move to target position");
    }
    if movers.len() > 1 {
        return ValidationResult::fail("Ambiguous move");
    }

    let mover = movers[0];
    let mover_buffs = state.buffs(&mover.id);

    if !can_act(mover, mover_buffs) {
        return ValidationResult::fail("Unit has no remaining actions this turn");
    }
    if let Some(blocked) = preparing_gate(mover) {
        return blocked;
    }
    if buff::has_flag(mover_buffs, BuffFlags::STUNNED) {
        return ValidationResult::fail("Unit is stunned");
    }
    if buff::has_flag(mover_buffs, BuffFlags::ROOTED) {
        return ValidationResult::fail("Unit is rooted");
    }

    ValidationResult::ok()
}

fn validate_attack(state: &GameState, action: &Action) -> ValidationResult {
    let Some(target_pos) = action.target_position else {
        return ValidationResult::fail("Target position is required for ATTACK");
    };
    let Some(target_unit_id) = action.target_unit_id.as_deref() else {
        return ValidationResult::fail("Target unit ID is required for ATTACK");
    };

    let Some(target) = state.unit(target_unit_id) else {
        return ValidationResult::fail("Target unit not found");
    };
    if !target.alive {
        return ValidationResult::fail("Target unit is dead");
    }
    if target.owner == action.player {
        return ValidationResult::fail("Cannot attack own unit");
    }
    if target.position != target_pos {
        return ValidationResult::fail("Target position does not match target unit position");
    }

    let attackers: Vec<&Unit> = state
        .units
        .iter()
        .filter(|u| u.alive && u.owner == action.player)
        .filter(|u| {
            can_attack_from(u.position, target_pos, effective_attack_range(u, state.buffs(&u.id)))
        })
        .collect();

    if attackers.is_empty() {
        return ValidationResult::fail("No attacker adjacent to target");
    }
    if attackers.len() > 1 {
        return ValidationResult::fail("Ambiguous attacker");
    }

    let attacker = attackers[0];
    let attacker_buffs = state.buffs(&attacker.id);

    if !can_act(attacker, attacker_buffs) {
        return ValidationResult::fail("Unit has no remaining actions this turn");
    }
    if let Some(blocked) = preparing_gate(attacker) {
        return blocked;
    }
    if buff::has_flag(attacker_buffs, BuffFlags::STUNNED) {
        return ValidationResult::fail("Unit is stunned");
    }
    if buff::has_flag(attacker_buffs, BuffFlags::BLIND) {
        return ValidationResult::fail("Unit is blinded and cannot attack");
    }
    if target.invisible {
        return ValidationResult::fail("Cannot target invisible unit");
    }

    ValidationResult::ok()
}

fn validate_move_and_attack(state: &GameState, action: &Action) -> ValidationResult {
    let Some(target_pos) = action.target_position else {
        return ValidationResult::fail("Target position is required for MOVE_AND_ATTACK");
    };
    let Some(target_unit_id) = action.target_unit_id.as_deref() else {
        return ValidationResult::fail("Target unit ID is required for MOVE_AND_ATTACK");
    };

    if !state.board.contains(target_pos) {
        return ValidationResult::fail("Target position is outside the board");
    }
    if state.is_tile_blocked(target_pos) {
        return ValidationResult::fail("Target tile is occupied");
    }

    let Some(target) = state.unit(target_unit_id) else {
        return ValidationResult::fail("Target unit not found");
    };
    if !target.alive {
        return ValidationResult::fail("Target unit is dead");
    }
    if target.owner == action.player {
        return ValidationResult::fail("Cannot attack own unit");
    }

    let movers = movers_to(state, action, target_pos);
    if movers.is_empty() {
        return ValidationResult::fail("No valid unit can move to target position");
    }
    if movers.len() > 1 {
        return ValidationResult::fail("Ambiguous move");
    }

    let mover = movers[0];
    let mover_buffs = state.buffs(&mover.id);

    if !can_act(mover, mover_buffs) {
        return ValidationResult::fail("Unit has no remaining actions this turn");
    }
    if let Some(blocked) = preparing_gate(mover) {
        return blocked;
    }
    if buff::has_flag(mover_buffs, BuffFlags::STUNNED) {
        return ValidationResult::fail("Unit is stunned");
    }
    if buff::has_flag(mover_buffs, BuffFlags::ROOTED) {
        return ValidationResult::fail("Unit is rooted");
    }
    if buff::has_flag(mover_buffs, BuffFlags::BLIND) {
        return ValidationResult::fail("Unit is blinded and cannot attack");
    }
    // An empowered unit must pick a single purpose for its turn.
    if buff::has_flag(mover_buffs, BuffFlags::POWER) {
        return ValidationResult::fail("Unit cannot use MOVE_AND_ATTACK with Power buff");
    }
    if target.invisible {
        return ValidationResult::fail("Cannot target invisible unit");
    }

    // The attack leg is checked from the post-move position.
    if !can_attack_from(target_pos, target.position, effective_attack_range(mover, mover_buffs)) {
        return ValidationResult::fail("Target not adjacent after movement");
    }

    let attackers_after_move = state
        .units
        .iter()
        .filter(|u| u.alive && u.owner == action.player)
        .filter(|u| {
            let from = if u.id == mover.id { target_pos } else { u.position };
            can_attack_from(from, target.position, effective_attack_range(u, state.buffs(&u.id)))
        })
        .count();

    if attackers_after_move > 1 {
        return ValidationResult::fail("Ambiguous attacker after movement");
    }

    ValidationResult::ok()
}

fn validate_use_skill(state: &GameState, action: &Action) -> ValidationResult {
    let Some(acting_id) = action.acting_unit_id.as_deref() else {
        return ValidationResult::fail("Acting unit ID is required for USE_SKILL");
    };

    let Some(actor) = state.unit(acting_id) else {
        return ValidationResult::fail("Acting unit not found");
    };
    if !actor.alive {
        return ValidationResult::fail("Acting unit is dead");
    }
    if actor.owner != action.player {
        return ValidationResult::fail("Cannot control opponent's unit");
    }
    if actor.category != UnitCategory::Hero {
        return ValidationResult::fail("Only Heroes can use skills");
    }

    let Some(skill_id) = actor.skill_id.as_deref().filter(|s| !s.is_empty()) else {
        return ValidationResult::fail("Hero has no skill selected");
    };
    let Some(spec) = skill::by_id(skill_id) else {
        return ValidationResult::fail(format!("Invalid skill ID: {skill_id}"));
    };
    if actor.hero_class != Some(spec.hero_class) {
        return ValidationResult::fail("Hero class cannot use this skill");
    }
    if actor.skill_cooldown > 0 {
        return ValidationResult::fail(format!(
            "Skill is on cooldown ({} rounds remaining)",
            actor.skill_cooldown
        ));
    }

    let buffs = state.buffs(acting_id);
    if !can_act(actor, buffs) {
        return ValidationResult::fail("Unit has no remaining actions this turn");
    }
    if let Some(blocked) = preparing_gate(actor) {
        return blocked;
    }
    if buff::has_flag(buffs, BuffFlags::STUNNED) {
        return ValidationResult::fail("Stunned units cannot use skills");
    }

    validate_skill_target(state, action, actor, spec)
}

fn validate_skill_target(
    state: &GameState,
    action: &Action,
    actor: &Unit,
    spec: &SkillSpec,
) -> ValidationResult {
    match spec.target {
        TargetShape::SelfCast | TargetShape::AreaAroundSelf | TargetShape::AllEnemies | TargetShape::AllAllies => {
            ValidationResult::ok()
        }
        TargetShape::SingleEnemy => validate_single_unit_target(state, action, actor, spec, true),
        TargetShape::SingleAlly => validate_single_unit_target(state, action, actor, spec, false),
        TargetShape::SingleTile => {
            if spec.id == skill::MAGE_WARP_BEACON {
                validate_beacon_target(state, action, actor, spec)
            } else {
                validate_tile_target(state, action, actor, spec)
            }
        }
        TargetShape::Line => validate_line_target(state, action, actor, spec),
    }
}

fn validate_single_unit_target(
    state: &GameState,
    action: &Action,
    actor: &Unit,
    spec: &SkillSpec,
    wants_enemy: bool,
) -> ValidationResult {
    let Some(target_id) = action.skill_target() else {
        return ValidationResult::fail("Target unit ID is required for this skill");
    };
    let Some(target) = state.unit(target_id) else {
        return ValidationResult::fail("Target unit not found");
    };
    if !target.alive {
        return ValidationResult::fail("Target unit is dead");
    }
    if wants_enemy && target.owner == actor.owner {
        return ValidationResult::fail("Target must be an enemy unit");
    }
    if !wants_enemy && target.owner != actor.owner {
        return ValidationResult::fail("Target must be a friendly unit");
    }
    if actor.position.manhattan_distance(target.position) > spec.range {
        return ValidationResult::fail(format!("Target is out of range (range: {})", spec.range));
    }

    ValidationResult::ok()
}

fn validate_tile_target(
    state: &GameState,
    action: &Action,
    actor: &Unit,
    spec: &SkillSpec,
) -> ValidationResult {
    let Some(target_pos) = action.target_position else {
        return ValidationResult::fail("Target position is required for this skill");
    };
    if !state.board.contains(target_pos) {
        return ValidationResult::fail("Target position is outside the board");
    }
    if actor.position.manhattan_distance(target_pos) > spec.range {
        return ValidationResult::fail(format!("Target is out of range (range: {})", spec.range));
    }

    // Movement-style skills need a free landing tile.
    let moves_self = spec
        .effects
        .iter()
        .any(|e| matches!(e, crate::skill::SkillEffect::Leap));
    if moves_self && state.is_tile_blocked(target_pos) {
        return ValidationResult::fail("Target tile is blocked");
    }

    ValidationResult::ok()
}

fn validate_beacon_target(
    state: &GameState,
    action: &Action,
    actor: &Unit,
    spec: &SkillSpec,
) -> ValidationResult {
    match actor.skill_state {
        // Second use: teleport to the placed beacon.
        Some(SkillState::Beacon(beacon_pos)) => {
            if state.is_tile_blocked(beacon_pos) {
                return ValidationResult::fail("Cannot teleport - beacon position is blocked");
            }
            ValidationResult::ok()
        }
        // First use: place the beacon.
        None => {
            let Some(target_pos) = action.target_position else {
                return ValidationResult::fail("Target position is required to place beacon");
            };
            if !state.board.contains(target_pos) {
                return ValidationResult::fail("Target position is outside the board");
            }
            if actor.position.manhattan_distance(target_pos) > spec.range {
                return ValidationResult::fail(format!("Target is out of range (range: {})", spec.range));
            }
            if state.is_tile_blocked(target_pos) {
                return ValidationResult::fail("Cannot place beacon on blocked tile");
            }
            ValidationResult::ok()
        }
    }
}

fn validate_line_target(
    state: &GameState,
    action: &Action,
    actor: &Unit,
    spec: &SkillSpec,
) -> ValidationResult {
    let Some(target_pos) = action.target_position else {
        return ValidationResult::fail("Target position is required for LINE skill");
    };
    if !state.board.contains(target_pos) {
        return ValidationResult::fail("Target position is outside the board");
    }
    if !actor.position.is_orthogonal_to(target_pos) {
        return ValidationResult::fail("Target must be in a straight line");
    }
    if actor.position.manhattan_distance(target_pos) > spec.range {
        return ValidationResult::fail(format!("Target is out of range (range: {})", spec.range));
    }

    ValidationResult::ok()
}
