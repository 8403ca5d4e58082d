//! Deterministic rules core for a grid-based tactical combat game.
//!
//! `tactics-core` decides whether a proposed action is legal given the
//! current game state and, if so, produces the next state. The two entry
//! points are [`engine::RuleEngine::validate_action`] (pure check, returns a
//! [`engine::ValidationResult`]) and [`engine::RuleEngine::apply_action`]
//! (pure transition, returns a new [`state::GameState`]). Everything else —
//! persistence format, RNG implementation, map authoring, transport — lives
//! outside this crate and is consumed through the interfaces in [`env`] and
//! [`serialize`].
//!
//! Given an identical starting state, the same ordered action sequence, and
//! an identically seeded RNG, two executions produce bit-identical states.

pub mod action;
pub mod buff;
pub mod config;
pub mod engine;
pub mod env;
#[cfg(feature = "serde")]
pub mod serialize;
pub mod skill;
pub mod state;

pub use action::{Action, ActionType, PreparedAction};
pub use buff::{BuffFlags, BuffInstance, BuffModifier, BuffType};
pub use config::GameConfig;
pub use engine::{RuleEngine, ValidationResult};
pub use env::{FixedRng, RngProvider, SeededRng, SequenceRng};
pub use skill::{SkillEffect, SkillSpec, TargetShape};
pub use state::{
    Board, BuffTile, DeathChoice, GameState, HeroClass, MinionType, Obstacle, PlayerId, Position,
    SkillState, Unit, UnitCategory,
};
