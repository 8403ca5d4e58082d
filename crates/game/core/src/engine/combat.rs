//! Board action application: MOVE, ATTACK, MOVE_AND_ATTACK, END_TURN.
//!
//! All functions assume the action already passed validation; on an
//! impossible input they return the state unchanged rather than panic.

use crate::action::{Action, PreparedAction};
use crate::buff::{self, BuffFlags, BuffInstance, BuffType};
use crate::config::GameConfig;
use crate::env::RngProvider;
use crate::state::{BuffTile, GameState, Position, Unit, UnitBuffs};

use super::{
    check_game_over, can_attack_from, can_move_to, effective_attack_range, effective_move_range,
    find_guardian, find_unit, grant_buff, remove_buffs, turn, update_unit,
};

// ============================================================================
// Unit resolution
// ============================================================================

/// The unit performing a move-shaped action: the named one, or the unique
/// unit able to reach the target (legacy callers).
fn resolve_mover<'a>(state: &'a GameState, action: &Action) -> Option<&'a Unit> {
    if let Some(id) = action.acting_unit_id.as_deref() {
        return state.unit(id);
    }
    let target = action.target_position?;
    state
        .units
        .iter()
        .find(|u| {
            u.alive
                && u.owner == action.player
                && can_move_to(u.position, target, effective_move_range(u, state.buffs(&u.id)))
        })
}

/// The unit performing an attack: the named one, or the unique unit with the
/// target position in range.
fn resolve_attacker<'a>(state: &'a GameState, action: &Action) -> Option<&'a Unit> {
    if let Some(id) = action.acting_unit_id.as_deref() {
        return state.unit(id);
    }
    let target = action.target_position?;
    state
        .units
        .iter()
        .find(|u| {
            u.alive
                && u.owner == action.player
                && can_attack_from(u.position, target, effective_attack_range(u, state.buffs(&u.id)))
        })
}

// ============================================================================
// SLOW preparing
// ============================================================================

/// A SLOW-affected unit stores the declared action instead of executing it.
/// The declaring player keeps the turn; the unit's action slot is spent.
fn apply_slow_preparing(state: &GameState, action: &Action, unit_id: &str) -> GameState {
    let prepared = PreparedAction::from_action(action);
    let units = update_unit(&state.units, unit_id, |u| {
        u.with_preparing_and_action_used(prepared.clone())
    });
    state.with_units(units)
}

// ============================================================================
// Buff tile trigger
// ============================================================================

/// First arrival on an untriggered tile grants its buff (rolling a random
/// core type for blank tiles) and permanently spends the tile.
pub(super) fn trigger_buff_tile<R: RngProvider>(
    units: &mut Vec<Unit>,
    unit_buffs: &mut UnitBuffs,
    buff_tiles: &mut Vec<BuffTile>,
    mover_id: &str,
    landing: Position,
    rng: &mut R,
) {
    let Some(tile) = buff_tiles.iter().find(|t| t.position == landing && !t.triggered) else {
        return;
    };
    let tile_id = tile.id.clone();

    let buff_type = tile.buff_type.unwrap_or_else(|| {
        BuffType::CORE[rng.next_int(BuffType::CORE.len() as u32) as usize]
    });

    let instance = BuffInstance::of(buff_type, &format!("bufftile_{tile_id}"));
    grant_buff(units, unit_buffs, mover_id, instance);

    for tile in buff_tiles.iter_mut() {
        if tile.id == tile_id {
            *tile = tile.with_triggered(buff_type);
        }
    }
}

// ============================================================================
// MOVE
// ============================================================================

pub(super) fn apply_move<R: RngProvider>(state: &GameState, action: &Action, rng: &mut R) -> GameState {
    let (Some(mover), Some(target_pos)) = (resolve_mover(state, action), action.target_position)
    else {
        return state.clone();
    };
    let mover_id = mover.id.clone();

    if buff::has_flag(state.buffs(&mover_id), BuffFlags::SLOW) {
        return apply_slow_preparing(state, action, &mover_id);
    }

    let mut units = update_unit(&state.units, &mover_id, |u| {
        u.with_position_and_action_used(target_pos)
    });
    let mut unit_buffs = state.unit_buffs.clone();
    let mut buff_tiles = state.buff_tiles.clone();
    trigger_buff_tile(&mut units, &mut unit_buffs, &mut buff_tiles, &mover_id, target_pos, rng);

    let (over, winner) = check_game_over(&units, Some(action.player));
    let next = state
        .with_units(units)
        .with_unit_buffs(unit_buffs)
        .with_buff_tiles(buff_tiles)
        .with_game_over(over, winner);

    turn::advance_after_action(next, &mover_id)
}

// ============================================================================
// Attack resolution
// ============================================================================

/// Applies counter-attack damage against `victim_id`, honoring Guardian
/// interception exactly like forward damage.
fn apply_counter(units: Vec<Unit>, victim_id: &str) -> Vec<Unit> {
    let Some(victim) = find_unit(&units, victim_id) else {
        return units;
    };
    let receiver_id = find_guardian(&units, victim)
        .map(|g| g.id.clone())
        .unwrap_or_else(|| victim.id.clone());
    update_unit(&units, &receiver_id, |u| {
        u.with_damage(GameConfig::COUNTER_ATTACK_DAMAGE)
    })
}

/// Resolves one attack from `attacker_id` against `target_id` on an
/// already-positioned unit list.
///
/// Handles, in order: FEINT dodge + counter, Guardian interception,
/// INVULNERABLE miss, DEATH_MARK bonus and on-kill heal, CHALLENGE damage
/// halving and counter, shield absorption, empowerment charge consumption,
/// and reveal of an invisible attacker. When `consume_action` is false the
/// caller has already spent the attacker's action slot (MOVE_AND_ATTACK).
fn resolve_attack(
    units: Vec<Unit>,
    unit_buffs: &mut UnitBuffs,
    attacker_id: &str,
    target_id: &str,
    consume_action: bool,
) -> Vec<Unit> {
    let (Some(attacker), Some(target)) = (find_unit(&units, attacker_id), find_unit(&units, target_id))
    else {
        return units;
    };
    let attacker = attacker.clone();
    let target = target.clone();

    let attacker_done = |u: &Unit| {
        let mut u = if consume_action { u.with_action_used() } else { u.clone() };
        if u.invisible {
            u = u.with_invisible(false);
        }
        u
    };

    // FEINT: the attack whiffs, the defender counters, the buff is spent.
    let target_buffs: Vec<BuffInstance> = unit_buffs
        .get(target_id)
        .map(|l| l.to_vec())
        .unwrap_or_default();
    if buff::has_flag(&target_buffs, BuffFlags::FEINT) {
        remove_buffs(unit_buffs, target_id, |b| b.flags.contains(BuffFlags::FEINT));
        let units = if consume_action {
            update_unit(&units, attacker_id, |u| u.with_action_used())
        } else {
            units
        };
        return apply_counter(units, attacker_id);
    }

    let receiver_id = find_guardian(&units, &target)
        .map(|g| g.id.clone())
        .unwrap_or_else(|| target.id.clone());

    let receiver_buffs: Vec<BuffInstance> = unit_buffs
        .get(&receiver_id)
        .map(|l| l.to_vec())
        .unwrap_or_default();

    // INVULNERABLE: the hit is negated outright, no counter, no charges spent.
    if buff::has_flag(&receiver_buffs, BuffFlags::INVULNERABLE) {
        if consume_action {
            return update_unit(&units, attacker_id, |u| u.with_action_used());
        }
        return units;
    }

    let attacker_buffs: Vec<BuffInstance> = unit_buffs
        .get(attacker_id)
        .map(|l| l.to_vec())
        .unwrap_or_default();

    let charge_bonus = if attacker.bonus_attack_charges > 0 {
        attacker.bonus_attack_damage
    } else {
        0
    };
    let death_mark_bonus = if buff::has_flag(&receiver_buffs, BuffFlags::DEATH_MARK) {
        GameConfig::DEATH_MARK_BONUS
    } else {
        0
    };
    let mark_source = buff::death_mark_source(&receiver_buffs).map(str::to_owned);

    let challenge_source = buff::challenge_source(&attacker_buffs).map(str::to_owned);
    let challenged_off_target = challenge_source.as_deref().is_some_and(|s| s != receiver_id);
    let challenged_the_duelist = challenge_source.as_deref() == Some(receiver_id.as_str());

    let base = attacker.attack + buff::bonus_attack(&attacker_buffs) + charge_bonus + death_mark_bonus;
    let damage = if challenged_off_target { base / 2 } else { base }.max(0);

    let has_charges = attacker.bonus_attack_charges > 0;
    let mut units: Vec<Unit> = units
        .iter()
        .map(|u| {
            if u.id == receiver_id {
                u.with_damage(damage)
            } else if u.id == attacker_id {
                let done = attacker_done(u);
                if has_charges { done.with_bonus_attack_consumed() } else { done }
            } else {
                u.clone()
            }
        })
        .collect();

    // DEATH_MARK pays out to its source if the carrier died to this hit.
    if let Some(source_id) = mark_source {
        let receiver_died = find_unit(&units, &receiver_id).is_some_and(|u| !u.alive);
        if receiver_died {
            units = update_unit(&units, &source_id, |u| {
                u.with_hp_bonus(GameConfig::DEATH_MARK_HEAL)
            });
        }
    }

    // CHALLENGE: striking the challenger provokes an immediate riposte.
    if challenged_the_duelist {
        units = apply_counter(units, attacker_id);
    }

    units
}

// ============================================================================
// ATTACK
// ============================================================================

pub(super) fn apply_attack(state: &GameState, action: &Action) -> GameState {
    let Some(attacker) = resolve_attacker(state, action) else {
        return state.clone();
    };
    let attacker_id = attacker.id.clone();

    if buff::has_flag(state.buffs(&attacker_id), BuffFlags::SLOW) {
        return apply_slow_preparing(state, action, &attacker_id);
    }

    let Some(target_id) = action.target_unit_id.clone() else {
        return state.clone();
    };

    let mut unit_buffs = state.unit_buffs.clone();
    let units = resolve_attack(state.units.clone(), &mut unit_buffs, &attacker_id, &target_id, true);

    let (over, winner) = check_game_over(&units, Some(action.player));
    let next = state
        .with_units(units)
        .with_unit_buffs(unit_buffs)
        .with_game_over(over, winner);

    turn::advance_after_action(next, &attacker_id)
}

// ============================================================================
// MOVE_AND_ATTACK
// ============================================================================

pub(super) fn apply_move_and_attack<R: RngProvider>(
    state: &GameState,
    action: &Action,
    rng: &mut R,
) -> GameState {
    let (Some(mover), Some(move_pos)) = (resolve_mover(state, action), action.target_position)
    else {
        return state.clone();
    };
    let mover_id = mover.id.clone();

    if buff::has_flag(state.buffs(&mover_id), BuffFlags::SLOW) {
        return apply_slow_preparing(state, action, &mover_id);
    }

    let Some(target_id) = action.target_unit_id.clone() else {
        return state.clone();
    };

    // Move leg: one combined action slot for both legs.
    let mut units = update_unit(&state.units, &mover_id, |u| {
        u.with_position_and_action_used(move_pos)
    });
    let mut unit_buffs = state.unit_buffs.clone();
    let mut buff_tiles = state.buff_tiles.clone();
    trigger_buff_tile(&mut units, &mut unit_buffs, &mut buff_tiles, &mover_id, move_pos, rng);

    // Attack leg from the post-move position.
    let units = resolve_attack(units, &mut unit_buffs, &mover_id, &target_id, false);

    let (over, winner) = check_game_over(&units, Some(action.player));
    let next = state
        .with_units(units)
        .with_unit_buffs(unit_buffs)
        .with_buff_tiles(buff_tiles)
        .with_game_over(over, winner);

    turn::advance_after_action(next, &mover_id)
}

// ============================================================================
// END_TURN
// ============================================================================

pub(super) fn apply_end_turn(state: &GameState, action: &Action) -> GameState {
    let units: Vec<Unit> = match action.acting_unit_id.as_deref() {
        // Named unit passes: it is fully spent for the round.
        Some(acting_id) => update_unit(&state.units, acting_id, |u| {
            let cap = buff::max_actions(state.buffs(&u.id));
            u.with_actions_used(u.actions_used.max(cap))
        }),
        // Legacy callers: every un-acted unit of the current player passes.
        None => state
            .units
            .iter()
            .map(|u| {
                if u.alive && u.owner == state.current_player && u.actions_used == 0 {
                    let cap = buff::max_actions(state.buffs(&u.id));
                    u.with_actions_used(cap)
                } else {
                    u.clone()
                }
            })
            .collect(),
    };

    let next = state.with_units(units);
    if next.all_units_acted() {
        return turn::round_end(next);
    }

    let next_player = turn::next_acting_player(&next, next.current_player);
    next.with_current_player(next_player)
}
