//! Map hazards: destructible obstacles and one-shot buff tiles.

use crate::buff::BuffType;
use crate::state::types::common::{PlayerId, Position};

/// Destructible terrain. Blocks movement and skill landings while present.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Obstacle {
    pub id: String,
    pub position: Position,
    pub hp: i32,
}

impl Obstacle {
    pub const DEFAULT_HP: i32 = 3;

    pub fn new(id: impl Into<String>, position: Position) -> Self {
        Self {
            id: id.into(),
            position,
            hp: Self::DEFAULT_HP,
        }
    }
}

/// A map position that grants a buff to the first unit that moves onto it.
///
/// `buff_type == None` means the buff is rolled uniformly over the six core
/// types via the RNG boundary when the tile triggers. Untriggered tiles
/// expire after `duration` rounds; triggered tiles are swept at round end.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuffTile {
    pub id: String,
    pub position: Position,
    pub buff_type: Option<BuffType>,
    pub duration: u32,
    pub triggered: bool,
}

impl BuffTile {
    pub const DEFAULT_DURATION: u32 = 2;

    pub fn new(id: impl Into<String>, position: Position, buff_type: Option<BuffType>) -> Self {
        Self {
            id: id.into(),
            position,
            buff_type,
            duration: Self::DEFAULT_DURATION,
            triggered: false,
        }
    }

    pub fn with_triggered(&self, buff_type: BuffType) -> Self {
        Self {
            buff_type: Some(buff_type),
            triggered: true,
            ..self.clone()
        }
    }
}

/// A pending follow-up decision after a unit death.
///
/// Carried on the state for fixtures and persistence; the five-variant
/// action set has no resolution action, so the engine itself never raises
/// one.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeathChoice {
    pub dead_unit_id: String,
    pub owner: PlayerId,
    pub death_position: Position,
}
