//! Turn scheduling and the round-end pipeline.

use crate::action::ActionType;
use crate::buff;
use crate::config::GameConfig;
use crate::state::{GameState, PlayerId, Unit, UnitBuffs};

use super::{check_game_over, find_guardian, find_unit, update_unit};

// ============================================================================
// Turn advancement
// ============================================================================

/// The player to act next: the opponent if it still has ready units,
/// otherwise the current player keeps going (exhaustion).
pub(super) fn next_acting_player(state: &GameState, current: PlayerId) -> PlayerId {
    let opponent = current.opponent();
    if state.has_ready_units(opponent) {
        return opponent;
    }
    if state.has_ready_units(current) {
        return current;
    }
    opponent
}

/// Advances the turn after a completed action by `acting_unit_id`.
///
/// A SPEED unit with actions to spare holds the turn; otherwise the turn
/// passes (or the round ends once every alive unit has acted).
pub(super) fn advance_after_action(state: GameState, acting_unit_id: &str) -> GameState {
    if state.is_game_over {
        return state;
    }

    let holds_turn = state
        .unit(acting_unit_id)
        .is_some_and(|u| u.actions_used < buff::max_actions(state.buffs(acting_unit_id)));
    if holds_turn {
        return state;
    }

    if state.all_units_acted() {
        return round_end(state);
    }

    let next = next_acting_player(&state, state.current_player);
    state.with_current_player(next)
}

// ============================================================================
// Round end
// ============================================================================

/// Runs the fixed round-end pipeline and opens the next round.
///
/// Order: prepared SLOW actions, poison/bleed ticks, buff expiry, cooldown
/// ticks, minion decay (round 3+), global pressure (round 8+), win check,
/// then reset and hand the turn to the opponent of the round's closer.
pub(super) fn round_end(state: GameState) -> GameState {
    let round = state.current_round;

    let mut units = execute_prepared_actions(state.units.clone());
    let mut unit_buffs = state.unit_buffs.clone();

    apply_dot_ticks(&mut units, &unit_buffs);
    expire_buffs(&mut unit_buffs);

    units = units.iter().map(Unit::with_cooldown_tick).collect();
    units = sweep_temporary_units(units);

    if round >= GameConfig::DECAY_START_ROUND {
        units = units
            .iter()
            .map(|u| {
                if u.alive && !u.is_hero() {
                    u.with_damage(1)
                } else {
                    u.clone()
                }
            })
            .collect();
    }

    if round >= GameConfig::PRESSURE_START_ROUND {
        units = units
            .iter()
            .map(|u| if u.alive { u.with_damage(1) } else { u.clone() })
            .collect();
    }

    let (over, winner) = check_game_over(&units, Some(state.current_player));

    let units = units.iter().map(Unit::with_round_end_reset).collect();
    let buff_tiles = sweep_buff_tiles(&state);

    GameState {
        units,
        current_player: state.current_player.opponent(),
        is_game_over: over,
        winner,
        unit_buffs,
        buff_tiles,
        current_round: round + 1,
        pending_death_choice: None,
        ..state
    }
}

/// Executes stored SLOW actions in unit-id ascending order.
///
/// A stored attack whose declared target position no longer matches the
/// target's current position silently misses. Damage from prepared attacks
/// uses the unit's base attack and is Guardian-checked like any melee hit.
fn execute_prepared_actions(mut units: Vec<Unit>) -> Vec<Unit> {
    let mut preparing_ids: Vec<String> = units
        .iter()
        .filter(|u| u.is_preparing && u.preparing_action.is_some())
        .map(|u| u.id.clone())
        .collect();
    preparing_ids.sort();

    for unit_id in preparing_ids {
        let Some(prep_unit) = find_unit(&units, &unit_id).cloned() else {
            continue;
        };
        if !prep_unit.alive {
            continue;
        }
        let Some(prepared) = prep_unit.preparing_action.clone() else {
            continue;
        };

        match prepared.action_type {
            ActionType::Move => {
                let Some(target) = prepared.target_position else { continue };
                let blocked = units.iter().any(|u| u.alive && u.position == target);
                if !blocked {
                    units = update_unit(&units, &unit_id, |u| {
                        u.with_position(target).with_preparing_cleared()
                    });
                }
            }
            ActionType::Attack => {
                let (Some(expected_pos), Some(target_id)) =
                    (prepared.target_position, prepared.target_unit_id.as_deref())
                else {
                    continue;
                };
                let target = find_unit(&units, target_id).cloned();
                if let Some(target) = target {
                    if target.alive && target.position == expected_pos {
                        let receiver_id = find_guardian(&units, &target)
                            .map(|g| g.id.clone())
                            .unwrap_or(target.id);
                        units = update_unit(&units, &receiver_id, |u| u.with_damage(prep_unit.attack));
                    }
                }
            }
            ActionType::MoveAndAttack => {
                let (Some(move_pos), Some(target_id)) =
                    (prepared.target_position, prepared.target_unit_id.as_deref())
                else {
                    continue;
                };
                let blocked = units.iter().any(|u| u.alive && u.position == move_pos);
                if blocked {
                    continue;
                }
                let Some(target) = find_unit(&units, target_id).cloned() else {
                    continue;
                };
                if !target.alive {
                    continue;
                }
                let distance = move_pos.manhattan_distance(target.position);
                if distance >= 1 && distance <= prep_unit.attack_range {
                    units = update_unit(&units, &unit_id, |u| {
                        u.with_position(move_pos).with_preparing_cleared()
                    });
                    let receiver_id = find_guardian(&units, &target)
                        .map(|g| g.id.clone())
                        .unwrap_or(target.id);
                    units = update_unit(&units, &receiver_id, |u| u.with_damage(prep_unit.attack));
                }
            }
            ActionType::EndTurn | ActionType::UseSkill => {}
        }
    }

    units
}

/// Poison then bleed ticks, unit-id ascending; each flagged instance deals 1.
/// Already-dead units are skipped.
fn apply_dot_ticks(units: &mut Vec<Unit>, unit_buffs: &UnitBuffs) {
    for flag_ticks in [buff::poison_ticks, buff::bleed_ticks] {
        for (unit_id, buffs) in unit_buffs.iter() {
            let damage = flag_ticks(buffs);
            if damage == 0 {
                continue;
            }
            let alive = find_unit(units, unit_id).is_some_and(|u| u.alive);
            if !alive {
                continue;
            }
            *units = update_unit(units, unit_id, |u| u.with_damage(damage));
        }
    }
}

/// Decrements every instance's duration; expired instances on the same unit
/// are dropped together.
fn expire_buffs(unit_buffs: &mut UnitBuffs) {
    let expired_keys: Vec<String> = unit_buffs
        .iter_mut()
        .filter_map(|(unit_id, list)| {
            let mut remaining = crate::buff::BuffList::new();
            for instance in list.iter() {
                let duration = instance.duration.saturating_sub(1);
                if duration > 0 {
                    remaining.push(instance.with_duration(duration));
                }
            }
            *list = remaining;
            list.is_empty().then(|| unit_id.clone())
        })
        .collect();

    for key in expired_keys {
        unit_buffs.remove(&key);
    }
}

/// Decrements summoned units' lifespans and removes expired or dead ones.
fn sweep_temporary_units(units: Vec<Unit>) -> Vec<Unit> {
    units
        .into_iter()
        .filter_map(|u| {
            if !u.temporary {
                return Some(u);
            }
            if !u.alive {
                return None;
            }
            let duration = u.temporary_duration.saturating_sub(1);
            (duration > 0).then(|| u.with_temporary_duration(duration))
        })
        .collect()
}

/// Triggered tiles are swept; untriggered tiles lose a round of duration and
/// expire at zero.
fn sweep_buff_tiles(state: &GameState) -> Vec<crate::state::BuffTile> {
    state
        .buff_tiles
        .iter()
        .filter(|t| !t.triggered)
        .filter_map(|t| {
            let duration = t.duration.saturating_sub(1);
            (duration > 0).then(|| crate::state::BuffTile {
                duration,
                ..t.clone()
            })
        })
        .collect()
}
