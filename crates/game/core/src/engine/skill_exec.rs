//! Generic skill execution.
//!
//! One interpreter walks a skill's effect descriptors in row order and folds
//! them into the state. Targets resolve from the skill's shape; every damage
//! instance is independently Guardian-checked; every RNG draw happens in a
//! fixed order (effects in row order, targets in unit-id order), which keeps
//! chance-based skills replayable.

use std::collections::BTreeMap;

use crate::action::Action;
use crate::buff::{BuffFlags, BuffInstance, BuffType};
use crate::env::RngProvider;
use crate::skill::{self, CHANCE_DEBUFF_POOL, CleanseScope, SkillEffect, SkillSpec, TargetShape};
use crate::state::{Board, GameState, MinionType, Obstacle, Position, SkillState, Unit, UnitBuffs};

use super::{check_game_over, find_guardian, find_unit, grant_buff, remove_buffs, turn, update_unit};

pub(super) fn apply_use_skill<R: RngProvider>(
    state: &GameState,
    action: &Action,
    rng: &mut R,
) -> GameState {
    let Some(caster_id) = action.acting_unit_id.clone() else {
        return state.clone();
    };
    let Some(caster) = state.unit(&caster_id) else {
        return state.clone();
    };
    let Some(spec) = caster.skill_id.as_deref().and_then(skill::by_id) else {
        return state.clone();
    };

    let origin = caster.position;
    let was_invisible = caster.invisible;

    let mut ctx = SkillCtx {
        units: state.units.clone(),
        unit_buffs: state.unit_buffs.clone(),
        obstacles: &state.obstacles,
        board: state.board,
        caster_id: caster_id.clone(),
        origin,
        target_pos: action.target_position,
        target_unit_id: action.skill_target().map(str::to_owned),
        chosen_debuff: action.chosen_buff_type,
        round: state.current_round,
        start_cooldown: true,
    };

    for effect in spec.effects {
        ctx.apply_effect(spec, *effect, rng);
    }

    // Caster bookkeeping: cooldown + action, or action only for the
    // beacon's placement use.
    let start_cooldown = ctx.start_cooldown;
    ctx.update_caster(|u| {
        if start_cooldown {
            u.with_skill_used(spec.cooldown)
        } else {
            u.with_action_used()
        }
    });

    // Casting anything but Smoke Bomb reveals an invisible hero.
    if was_invisible && spec.id != skill::ROGUE_SMOKE_BOMB {
        ctx.update_caster(|u| u.with_invisible(false));
    }

    let SkillCtx { units, unit_buffs, .. } = ctx;
    let (over, winner) = check_game_over(&units, Some(action.player));
    let next = state
        .with_units(units)
        .with_unit_buffs(unit_buffs)
        .with_game_over(over, winner);

    turn::advance_after_action(next, &caster_id)
}

struct SkillCtx<'a> {
    units: Vec<Unit>,
    unit_buffs: UnitBuffs,
    obstacles: &'a [Obstacle],
    board: Board,
    caster_id: String,
    /// Caster position at cast time, before any Leap.
    origin: Position,
    target_pos: Option<Position>,
    target_unit_id: Option<String>,
    chosen_debuff: Option<BuffType>,
    round: u32,
    start_cooldown: bool,
}

impl SkillCtx<'_> {
    fn caster(&self) -> Option<&Unit> {
        find_unit(&self.units, &self.caster_id)
    }

    fn update_caster(&mut self, f: impl Fn(&Unit) -> Unit) {
        self.units = update_unit(&self.units, &self.caster_id, f);
    }

    fn tile_blocked(&self, pos: Position) -> bool {
        self.units.iter().any(|u| u.alive && u.position == pos)
            || self.obstacles.iter().any(|o| o.position == pos)
    }

    /// Enemy unit ids a shape resolves to, in deterministic order.
    fn resolve_enemies(&self, shape: TargetShape) -> Vec<String> {
        let Some(caster) = self.caster() else {
            return Vec::new();
        };
        let enemies = self
            .units
            .iter()
            .filter(|u| u.alive && u.owner != caster.owner);

        let mut ids: Vec<String> = match shape {
            TargetShape::SingleEnemy => {
                return self.target_unit_id.iter().cloned().collect();
            }
            TargetShape::AllEnemies => enemies.map(|u| u.id.clone()).collect(),
            TargetShape::AreaAroundSelf => enemies
                .filter(|u| caster.position.is_adjacent_to(u.position))
                .map(|u| u.id.clone())
                .collect(),
            TargetShape::Line => return self.resolve_line(caster),
            _ => Vec::new(),
        };
        ids.sort();
        ids
    }

    /// Units along the straight line from the caster toward the target
    /// position, walked tile by tile to the board edge.
    fn resolve_line(&self, caster: &Unit) -> Vec<String> {
        let Some(target_pos) = self.target_pos else {
            return Vec::new();
        };
        let dx = (target_pos.x - caster.position.x).signum();
        let dy = (target_pos.y - caster.position.y).signum();

        let mut hits = Vec::new();
        let mut cursor = Position::new(caster.position.x + dx, caster.position.y + dy);
        while self.board.contains(cursor) {
            for u in &self.units {
                if u.alive && u.owner != caster.owner && u.position == cursor {
                    hits.push(u.id.clone());
                }
            }
            cursor = Position::new(cursor.x + dx, cursor.y + dy);
        }
        hits
    }

    fn alive_allies(&self) -> Vec<String> {
        let Some(caster) = self.caster() else {
            return Vec::new();
        };
        let mut ids: Vec<String> = self
            .units
            .iter()
            .filter(|u| u.alive && u.owner == caster.owner)
            .map(|u| u.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Deals `amount` to each enemy id, redirecting each instance through
    /// Guardian resolution and merging per receiver before applying.
    fn deal_damage(&mut self, enemy_ids: &[String], amount: i32) {
        let mut totals: BTreeMap<String, i32> = BTreeMap::new();
        for enemy_id in enemy_ids {
            let Some(enemy) = find_unit(&self.units, enemy_id) else {
                continue;
            };
            let receiver_id = find_guardian(&self.units, enemy)
                .map(|g| g.id.clone())
                .unwrap_or_else(|| enemy.id.clone());
            *totals.entry(receiver_id).or_default() += amount;
        }
        for (receiver_id, total) in totals {
            self.units = update_unit(&self.units, &receiver_id, |u| u.with_damage(total));
        }
    }

    fn grant(&mut self, unit_id: &str, instance: BuffInstance) {
        grant_buff(&mut self.units, &mut self.unit_buffs, unit_id, instance);
    }

    fn apply_effect<R: RngProvider>(&mut self, spec: &SkillSpec, effect: SkillEffect, rng: &mut R) {
        match effect {
            SkillEffect::Damage { amount } => {
                let enemies = self.resolve_enemies(spec.target);
                self.deal_damage(&enemies, amount);
            }

            SkillEffect::Heal { amount } => {
                let recipients = match spec.target {
                    TargetShape::SingleAlly => self.target_unit_id.iter().cloned().collect(),
                    TargetShape::AllAllies => self.alive_allies(),
                    _ => vec![self.caster_id.clone()],
                };
                for id in recipients {
                    self.units = update_unit(&self.units, &id, |u| u.with_hp_bonus(amount));
                }
            }

            SkillEffect::Shield { amount } => {
                self.update_caster(|u| u.with_shield(u.shield + amount));
            }

            SkillEffect::GrantBuff { buff_type } => {
                let caster_id = self.caster_id.clone();
                let recipients: Vec<String> = match spec.target {
                    TargetShape::SingleEnemy | TargetShape::SingleAlly => {
                        self.target_unit_id.iter().cloned().collect()
                    }
                    TargetShape::AllAllies => self.alive_allies(),
                    _ => vec![caster_id.clone()],
                };
                for id in recipients {
                    self.grant(&id, BuffInstance::of(buff_type, &caster_id));
                }
            }

            SkillEffect::StatBuff { bonus_attack, duration } => {
                let caster_id = self.caster_id.clone();
                for id in self.alive_allies() {
                    self.grant(&id, BuffInstance::rally_attack(&caster_id, bonus_attack, duration));
                }
            }

            SkillEffect::ChanceDebuff { percent } => {
                let caster_id = self.caster_id.clone();
                for enemy_id in self.resolve_enemies(spec.target) {
                    if rng.next_int(100) < percent {
                        let roll = rng.next_int(CHANCE_DEBUFF_POOL.len() as u32) as usize;
                        self.grant(&enemy_id, BuffInstance::of(CHANCE_DEBUFF_POOL[roll], &caster_id));
                    }
                }
            }

            SkillEffect::ChosenDebuff => {
                let caster_id = self.caster_id.clone();
                let debuff = self.chosen_debuff.unwrap_or(BuffType::Bleed);
                if let Some(target_id) = self.target_unit_id.clone() {
                    self.grant(&target_id, BuffInstance::of(debuff, &caster_id));
                }
            }

            SkillEffect::Cleanse { scope } => {
                let recipient = match spec.target {
                    TargetShape::SingleAlly => self.target_unit_id.clone(),
                    _ => Some(self.caster_id.clone()),
                };
                if let Some(recipient) = recipient {
                    self.cleanse(&recipient, scope, rng);
                }
            }

            SkillEffect::Leap => {
                if let Some(target_pos) = self.target_pos {
                    self.update_caster(|u| u.with_position(target_pos));
                }
            }

            SkillEffect::LeapImpact { amount } => {
                let Some(caster) = self.caster().cloned() else { return };
                let mut ids: Vec<String> = self
                    .units
                    .iter()
                    .filter(|u| {
                        u.alive
                            && u.owner != caster.owner
                            && caster.position.is_adjacent_to(u.position)
                    })
                    .map(|u| u.id.clone())
                    .collect();
                ids.sort();
                self.deal_damage(&ids, amount);
            }

            SkillEffect::Knockback { amount } => self.knockback(amount),

            SkillEffect::SpawnClone { hp, attack, duration } => {
                let Some(caster) = self.caster().cloned() else { return };
                let Some(target_pos) = self.target_pos else { return };
                let clone_id = format!("{}_clone_r{}", caster.id, self.round);
                let clone = Unit {
                    temporary: true,
                    temporary_duration: duration,
                    ..Unit::minion(
                        clone_id,
                        caster.owner,
                        MinionType::Assassin,
                        hp,
                        attack,
                        caster.move_range,
                        1,
                        target_pos,
                    )
                };
                self.units.push(clone);
            }

            SkillEffect::EmpowerAttacks { bonus, charges } => {
                self.update_caster(|u| u.with_bonus_attack(bonus, charges));
            }

            SkillEffect::Vanish => {
                self.update_caster(|u| u.with_invisible(true));
            }

            SkillEffect::BlindAdjacent => {
                let Some(caster) = self.caster().cloned() else { return };
                let origin = self.origin;
                let mut ids: Vec<String> = self
                    .units
                    .iter()
                    .filter(|u| u.alive && u.owner != caster.owner && origin.is_adjacent_to(u.position))
                    .map(|u| u.id.clone())
                    .collect();
                ids.sort();
                let caster_id = self.caster_id.clone();
                for id in ids {
                    self.grant(&id, BuffInstance::of(BuffType::Blind, &caster_id));
                }
            }

            SkillEffect::Beacon => {
                let Some(caster) = self.caster().cloned() else { return };
                match caster.skill_state {
                    Some(SkillState::Beacon(beacon_pos)) => {
                        self.update_caster(|u| {
                            u.with_position(beacon_pos).with_skill_state(None)
                        });
                    }
                    None => {
                        if let Some(target_pos) = self.target_pos {
                            self.update_caster(|u| {
                                u.with_skill_state(Some(SkillState::Beacon(target_pos)))
                            });
                            // Placement does not start the cooldown.
                            self.start_cooldown = false;
                        }
                    }
                }
            }
        }
    }

    /// Damage adjacent enemies and push each one tile away from the caster;
    /// a blocked push converts into one extra point of damage.
    fn knockback(&mut self, amount: i32) {
        let Some(caster) = self.caster().cloned() else { return };
        let mut enemy_ids: Vec<String> = self
            .units
            .iter()
            .filter(|u| u.alive && u.owner != caster.owner && caster.position.is_adjacent_to(u.position))
            .map(|u| u.id.clone())
            .collect();
        enemy_ids.sort();

        let mut new_positions: BTreeMap<String, Position> = BTreeMap::new();
        let mut totals: BTreeMap<String, i32> = BTreeMap::new();

        for enemy_id in &enemy_ids {
            let Some(enemy) = find_unit(&self.units, enemy_id) else {
                continue;
            };
            let push_dest = Position::new(
                enemy.position.x + (enemy.position.x - caster.position.x),
                enemy.position.y + (enemy.position.y - caster.position.y),
            );

            let can_push = self.board.contains(push_dest)
                && !self.tile_blocked(push_dest)
                && !new_positions.values().any(|p| *p == push_dest);

            let receiver_id = find_guardian(&self.units, enemy)
                .map(|g| g.id.clone())
                .unwrap_or_else(|| enemy.id.clone());

            if can_push {
                new_positions.insert(enemy_id.clone(), push_dest);
                *totals.entry(receiver_id).or_default() += amount;
            } else {
                *totals.entry(receiver_id).or_default() += amount + 1;
            }
        }

        self.units = self
            .units
            .iter()
            .map(|u| {
                let mut next = u.clone();
                if let Some(pos) = new_positions.get(&u.id) {
                    next = next.with_position(*pos);
                }
                if let Some(total) = totals.get(&u.id) {
                    next = next.with_damage(*total);
                }
                next
            })
            .collect();
    }

    fn cleanse<R: RngProvider>(&mut self, unit_id: &str, scope: CleanseScope, rng: &mut R) {
        match scope {
            CleanseScope::Bleed => {
                remove_buffs(&mut self.unit_buffs, unit_id, |b| {
                    b.flags.contains(BuffFlags::BLEED)
                });
            }
            CleanseScope::OneRandomDebuff => {
                let Some(list) = self.unit_buffs.get(unit_id) else {
                    return;
                };
                let debuff_ids: Vec<String> = list
                    .iter()
                    .filter(|b| b.is_debuff())
                    .map(|b| b.buff_id.clone())
                    .collect();
                if debuff_ids.is_empty() {
                    return;
                }
                let victim = debuff_ids[rng.next_int(debuff_ids.len() as u32) as usize].clone();
                let mut now_empty = false;
                if let Some(list) = self.unit_buffs.get_mut(unit_id) {
                    if let Some(index) = list.iter().position(|b| b.buff_id == victim) {
                        list.remove(index);
                    }
                    now_empty = list.is_empty();
                }
                if now_empty {
                    self.unit_buffs.remove(unit_id);
                }
            }
        }
    }
}
