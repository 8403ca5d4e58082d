//! Authoritative game state representation.
//!
//! [`GameState`] is the full match snapshot. It is treated as immutable:
//! every transition constructs a new value, which keeps replays trivial and
//! deep-equality assertions meaningful. The engine is the only module that
//! produces new snapshots.

pub mod types;

use std::collections::BTreeMap;

use crate::buff::{BuffInstance, BuffList};

pub use types::{
    Board, BuffTile, DeathChoice, HeroClass, MinionType, Obstacle, PlayerId, Position, SkillState,
    Unit, UnitCategory,
};

/// Map from unit id to its active buff instances.
///
/// A `BTreeMap` keeps iteration order deterministic, which matters for
/// round-end processing and for the state digest.
pub type UnitBuffs = BTreeMap<String, BuffList>;

/// Canonical snapshot of a match in progress.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameState {
    pub board: Board,
    /// All units ever part of the match, in creation order. Death is a flag,
    /// not removal; only expired temporary units are physically dropped.
    pub units: Vec<Unit>,
    pub current_player: PlayerId,
    pub is_game_over: bool,
    pub winner: Option<PlayerId>,
    pub unit_buffs: UnitBuffs,
    pub buff_tiles: Vec<BuffTile>,
    pub obstacles: Vec<Obstacle>,
    /// 1-based round counter.
    pub current_round: u32,
    pub pending_death_choice: Option<DeathChoice>,
}

impl GameState {
    /// A fresh match on the given board.
    pub fn new(board: Board, units: Vec<Unit>, starting_player: PlayerId) -> Self {
        Self {
            board,
            units,
            current_player: starting_player,
            is_game_over: false,
            winner: None,
            unit_buffs: UnitBuffs::new(),
            buff_tiles: Vec::new(),
            obstacles: Vec::new(),
            current_round: 1,
            pending_death_choice: None,
        }
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    pub fn unit(&self, unit_id: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == unit_id)
    }

    /// Active buffs on a unit; empty when none are recorded.
    pub fn buffs(&self, unit_id: &str) -> &[BuffInstance] {
        self.unit_buffs
            .get(unit_id)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    /// True when an alive unit stands on `pos`.
    pub fn is_tile_occupied(&self, pos: Position) -> bool {
        self.units.iter().any(|u| u.alive && u.position == pos)
    }

    pub fn obstacle_at(&self, pos: Position) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| o.position == pos)
    }

    /// The untriggered buff tile at `pos`, if any.
    pub fn buff_tile_at(&self, pos: Position) -> Option<&BuffTile> {
        self.buff_tiles
            .iter()
            .find(|t| t.position == pos && !t.triggered)
    }

    /// A tile is blocked by an alive unit or an obstacle.
    pub fn is_tile_blocked(&self, pos: Position) -> bool {
        self.is_tile_occupied(pos) || self.obstacle_at(pos).is_some()
    }

    /// True when `player` still has an alive unit with an unused action.
    pub fn has_ready_units(&self, player: PlayerId) -> bool {
        self.units
            .iter()
            .any(|u| u.alive && u.owner == player && u.actions_used == 0)
    }

    /// True when no alive unit has an unused action left this round.
    pub fn all_units_acted(&self) -> bool {
        !self.units.iter().any(|u| u.alive && u.actions_used == 0)
    }

    // ========================================================================
    // Value-copy updates
    // ========================================================================

    pub fn with_units(&self, units: Vec<Unit>) -> Self {
        Self { units, ..self.clone() }
    }

    pub fn with_current_player(&self, current_player: PlayerId) -> Self {
        Self { current_player, ..self.clone() }
    }

    pub fn with_game_over(&self, is_game_over: bool, winner: Option<PlayerId>) -> Self {
        Self {
            is_game_over,
            winner,
            ..self.clone()
        }
    }

    pub fn with_unit_buffs(&self, unit_buffs: UnitBuffs) -> Self {
        Self { unit_buffs, ..self.clone() }
    }

    pub fn with_buff_tiles(&self, buff_tiles: Vec<BuffTile>) -> Self {
        Self { buff_tiles, ..self.clone() }
    }

    pub fn with_obstacles(&self, obstacles: Vec<Obstacle>) -> Self {
        Self { obstacles, ..self.clone() }
    }
}
