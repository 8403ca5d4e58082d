pub mod common;
pub mod terrain;
pub mod unit;

pub use common::{Board, PlayerId, Position};
pub use terrain::{BuffTile, DeathChoice, Obstacle};
pub use unit::{HeroClass, MinionType, SkillState, Unit, UnitCategory};
