/// Game configuration constants and tunable parameters.
///
/// Balancing values are treated as given data: they mirror the shipped
/// rule set and are not meant to be tweaked per match.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameConfig;

impl GameConfig {
    // ===== compile-time constants used as type parameters =====
    /// Maximum number of simultaneously active buff instances per unit.
    pub const MAX_ACTIVE_BUFFS: usize = 16;

    // ===== rule constants =====
    /// Rounds a freshly granted buff stays active.
    pub const DEFAULT_BUFF_DURATION: u32 = 2;
    /// Actions per round for a unit carrying a SPEED buff.
    pub const SPEED_MAX_ACTIONS: u32 = 2;
    /// Actions per round without SPEED.
    pub const BASE_MAX_ACTIONS: u32 = 1;
    /// First round in which minions lose 1 HP at round end.
    pub const DECAY_START_ROUND: u32 = 3;
    /// First round in which every unit loses an extra 1 HP at round end.
    pub const PRESSURE_START_ROUND: u32 = 8;
    /// Damage dealt by FEINT and CHALLENGE counter-attacks.
    pub const COUNTER_ATTACK_DAMAGE: i32 = 2;
    /// Extra damage taken by a DEATH_MARK carrier.
    pub const DEATH_MARK_BONUS: i32 = 2;
    /// HP restored to the mark's source when the carrier dies to an attack.
    pub const DEATH_MARK_HEAL: i32 = 2;
}
