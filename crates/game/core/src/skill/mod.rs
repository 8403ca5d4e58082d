//! Hero skill catalog.
//!
//! Every skill is a data row: a targeting shape, a range, a cooldown, and a
//! list of [`SkillEffect`] descriptors. One generic executor in the engine
//! interprets the descriptors; there is no code-per-skill.

use crate::buff::BuffType;
use crate::state::HeroClass;

// Skill id constants
pub const WARRIOR_HEROIC_LEAP: &str = "warrior_heroic_leap";
pub const WARRIOR_SHOCKWAVE: &str = "warrior_shockwave";
pub const WARRIOR_ENDURE: &str = "warrior_endure";

pub const MAGE_ELEMENTAL_BLAST: &str = "mage_elemental_blast";
pub const MAGE_WARP_BEACON: &str = "mage_warp_beacon";
pub const MAGE_WILD_MAGIC: &str = "mage_wild_magic";

pub const ROGUE_SMOKE_BOMB: &str = "rogue_smoke_bomb";
pub const ROGUE_DEATH_MARK: &str = "rogue_death_mark";
pub const ROGUE_SHADOW_CLONE: &str = "rogue_shadow_clone";

pub const HUNTRESS_SPIRIT_HAWK: &str = "huntress_spirit_hawk";
pub const HUNTRESS_SPECTRAL_BLADES: &str = "huntress_spectral_blades";
pub const HUNTRESS_NATURES_POWER: &str = "huntress_natures_power";

pub const DUELIST_CHALLENGE: &str = "duelist_challenge";
pub const DUELIST_ELEMENTAL_STRIKE: &str = "duelist_elemental_strike";
pub const DUELIST_FEINT: &str = "duelist_feint";

pub const CLERIC_TRINITY: &str = "cleric_trinity";
pub const CLERIC_POWER_OF_MANY: &str = "cleric_power_of_many";
pub const CLERIC_ASCENDED_FORM: &str = "cleric_ascended_form";

/// The debuff pool rolled by chance-based effects.
pub const CHANCE_DEBUFF_POOL: [BuffType; 3] = [BuffType::Weakness, BuffType::Bleed, BuffType::Slow];

/// How a skill selects its target(s).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetShape {
    /// Affects only the caster; no target may be supplied.
    SelfCast,
    /// One enemy unit within range (Manhattan distance).
    SingleEnemy,
    /// One friendly unit (including the caster) within range.
    SingleAlly,
    /// An in-bounds tile within range.
    SingleTile,
    /// All enemies orthogonally adjacent to the caster.
    AreaAroundSelf,
    /// Every tile in a straight orthogonal line from the caster.
    Line,
    /// Every enemy on the board.
    AllEnemies,
    /// Every friendly unit on the board.
    AllAllies,
}

/// What a cleanse removes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CleanseScope {
    /// All BLEED instances on the recipient.
    Bleed,
    /// One debuff on the recipient, chosen via the RNG boundary.
    OneRandomDebuff,
}

/// One atomic skill effect, applied to the targets the shape resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SkillEffect {
    /// Deal `amount` to each resolved enemy; every instance is Guardian-checked.
    Damage { amount: i32 },
    /// Restore `amount` HP to each resolved recipient.
    Heal { amount: i32 },
    /// Grant `amount` shield to the caster.
    Shield { amount: i32 },
    /// Grant a catalog buff to the resolved recipient(s), refreshing on repeat.
    GrantBuff { buff_type: BuffType },
    /// A stackable flat attack bonus for the resolved allies.
    StatBuff { bonus_attack: i32, duration: u32 },
    /// `percent` chance per resolved enemy to roll a debuff from the pool.
    ChanceDebuff { percent: u32 },
    /// Apply the action's chosen debuff (defaults to BLEED) to the target.
    ChosenDebuff,
    /// Remove buffs from the recipient.
    Cleanse { scope: CleanseScope },
    /// Relocate the caster to the target tile.
    Leap,
    /// Damage every enemy adjacent to the caster's position after movement.
    LeapImpact { amount: i32 },
    /// Damage adjacent enemies and push them one tile away; a blocked push
    /// deals one extra damage instead.
    Knockback { amount: i32 },
    /// Summon a temporary assassin-shaped clone on the target tile.
    SpawnClone { hp: i32, attack: i32, duration: u32 },
    /// Empower the caster's next `charges` attacks by `bonus` damage.
    EmpowerAttacks { bonus: i32, charges: u32 },
    /// The caster becomes invisible until it next attacks or casts.
    Vanish,
    /// BLIND every enemy adjacent to the caster's pre-movement position.
    BlindAdjacent,
    /// Warp Beacon state machine: place on first use (no cooldown), teleport
    /// and clear on the second.
    Beacon,
}

/// Static definition of one hero skill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkillSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub hero_class: HeroClass,
    pub target: TargetShape,
    pub range: i32,
    pub cooldown: u32,
    pub effects: &'static [SkillEffect],
}

/// The full catalog: three skills per class, numbers straight from the
/// shipped rule set. All cooldowns are 2 rounds.
static SKILLS: &[SkillSpec] = &[
    // ========================== WARRIOR ==========================
    SkillSpec {
        id: WARRIOR_HEROIC_LEAP,
        name: "Heroic Leap",
        hero_class: HeroClass::Warrior,
        target: TargetShape::SingleTile,
        range: 3,
        cooldown: 2,
        effects: &[SkillEffect::Leap, SkillEffect::LeapImpact { amount: 2 }],
    },
    SkillSpec {
        id: WARRIOR_SHOCKWAVE,
        name: "Shockwave",
        hero_class: HeroClass::Warrior,
        target: TargetShape::AreaAroundSelf,
        range: 1,
        cooldown: 2,
        effects: &[SkillEffect::Knockback { amount: 1 }],
    },
    SkillSpec {
        id: WARRIOR_ENDURE,
        name: "Endure",
        hero_class: HeroClass::Warrior,
        target: TargetShape::SelfCast,
        range: 0,
        cooldown: 2,
        effects: &[
            SkillEffect::Shield { amount: 3 },
            SkillEffect::Cleanse { scope: CleanseScope::Bleed },
        ],
    },
    // ============================ MAGE ===========================
    SkillSpec {
        id: MAGE_ELEMENTAL_BLAST,
        name: "Elemental Blast",
        hero_class: HeroClass::Mage,
        target: TargetShape::SingleEnemy,
        range: 3,
        cooldown: 2,
        effects: &[
            SkillEffect::Damage { amount: 3 },
            SkillEffect::ChanceDebuff { percent: 50 },
        ],
    },
    SkillSpec {
        id: MAGE_WARP_BEACON,
        name: "Warp Beacon",
        hero_class: HeroClass::Mage,
        target: TargetShape::SingleTile,
        range: 4,
        cooldown: 2,
        effects: &[SkillEffect::Beacon],
    },
    SkillSpec {
        id: MAGE_WILD_MAGIC,
        name: "Wild Magic",
        hero_class: HeroClass::Mage,
        target: TargetShape::AllEnemies,
        range: 0,
        cooldown: 2,
        effects: &[
            SkillEffect::Damage { amount: 1 },
            SkillEffect::ChanceDebuff { percent: 33 },
        ],
    },
    // ============================ ROGUE ==========================
    SkillSpec {
        id: ROGUE_SMOKE_BOMB,
        name: "Smoke Bomb",
        hero_class: HeroClass::Rogue,
        target: TargetShape::SingleTile,
        range: 3,
        cooldown: 2,
        effects: &[
            SkillEffect::BlindAdjacent,
            SkillEffect::Leap,
            SkillEffect::Vanish,
        ],
    },
    SkillSpec {
        id: ROGUE_DEATH_MARK,
        name: "Death Mark",
        hero_class: HeroClass::Rogue,
        target: TargetShape::SingleEnemy,
        range: 2,
        cooldown: 2,
        effects: &[SkillEffect::GrantBuff { buff_type: BuffType::DeathMark }],
    },
    SkillSpec {
        id: ROGUE_SHADOW_CLONE,
        name: "Shadow Clone",
        hero_class: HeroClass::Rogue,
        target: TargetShape::SingleTile,
        range: 1,
        cooldown: 2,
        effects: &[SkillEffect::SpawnClone { hp: 1, attack: 1, duration: 2 }],
    },
    // ========================== HUNTRESS =========================
    SkillSpec {
        id: HUNTRESS_SPIRIT_HAWK,
        name: "Spirit Hawk",
        hero_class: HeroClass::Huntress,
        target: TargetShape::SingleEnemy,
        range: 4,
        cooldown: 2,
        effects: &[SkillEffect::Damage { amount: 2 }],
    },
    SkillSpec {
        id: HUNTRESS_SPECTRAL_BLADES,
        name: "Spectral Blades",
        hero_class: HeroClass::Huntress,
        target: TargetShape::Line,
        range: 3,
        cooldown: 2,
        effects: &[SkillEffect::Damage { amount: 1 }],
    },
    SkillSpec {
        id: HUNTRESS_NATURES_POWER,
        name: "Nature's Power",
        hero_class: HeroClass::Huntress,
        target: TargetShape::SelfCast,
        range: 0,
        cooldown: 2,
        effects: &[
            SkillEffect::EmpowerAttacks { bonus: 2, charges: 2 },
            SkillEffect::GrantBuff { buff_type: BuffType::Life },
        ],
    },
    // ========================== DUELIST ==========================
    SkillSpec {
        id: DUELIST_CHALLENGE,
        name: "Challenge",
        hero_class: HeroClass::Duelist,
        target: TargetShape::SingleEnemy,
        range: 2,
        cooldown: 2,
        effects: &[SkillEffect::GrantBuff { buff_type: BuffType::Challenge }],
    },
    SkillSpec {
        id: DUELIST_ELEMENTAL_STRIKE,
        name: "Elemental Strike",
        hero_class: HeroClass::Duelist,
        target: TargetShape::SingleEnemy,
        range: 1,
        cooldown: 2,
        effects: &[SkillEffect::Damage { amount: 3 }, SkillEffect::ChosenDebuff],
    },
    SkillSpec {
        id: DUELIST_FEINT,
        name: "Feint",
        hero_class: HeroClass::Duelist,
        target: TargetShape::SelfCast,
        range: 0,
        cooldown: 2,
        effects: &[SkillEffect::GrantBuff { buff_type: BuffType::Feint }],
    },
    // ========================== CLERIC ===========================
    SkillSpec {
        id: CLERIC_TRINITY,
        name: "Trinity",
        hero_class: HeroClass::Cleric,
        target: TargetShape::SingleAlly,
        range: 2,
        cooldown: 2,
        effects: &[
            SkillEffect::Heal { amount: 3 },
            SkillEffect::Cleanse { scope: CleanseScope::OneRandomDebuff },
            SkillEffect::GrantBuff { buff_type: BuffType::Life },
        ],
    },
    SkillSpec {
        id: CLERIC_POWER_OF_MANY,
        name: "Power of Many",
        hero_class: HeroClass::Cleric,
        target: TargetShape::AllAllies,
        range: 0,
        cooldown: 2,
        effects: &[
            SkillEffect::Heal { amount: 1 },
            SkillEffect::StatBuff { bonus_attack: 1, duration: 1 },
        ],
    },
    SkillSpec {
        id: CLERIC_ASCENDED_FORM,
        name: "Ascended Form",
        hero_class: HeroClass::Cleric,
        target: TargetShape::SelfCast,
        range: 0,
        cooldown: 2,
        effects: &[SkillEffect::GrantBuff { buff_type: BuffType::Invulnerable }],
    },
];

/// Looks up a skill by id.
pub fn by_id(skill_id: &str) -> Option<&'static SkillSpec> {
    SKILLS.iter().find(|s| s.id == skill_id)
}

/// All skills available to a hero class.
pub fn for_class(hero_class: HeroClass) -> impl Iterator<Item = &'static SkillSpec> {
    SKILLS.iter().filter(move |s| s.hero_class == hero_class)
}

/// True when `hero_class` may equip `skill_id`.
pub fn class_can_use(hero_class: HeroClass, skill_id: &str) -> bool {
    by_id(skill_id).is_some_and(|s| s.hero_class == hero_class)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_class_has_three_skills() {
        for class in [
            HeroClass::Warrior,
            HeroClass::Mage,
            HeroClass::Rogue,
            HeroClass::Huntress,
            HeroClass::Duelist,
            HeroClass::Cleric,
        ] {
            assert_eq!(for_class(class).count(), 3, "{class} should have 3 skills");
        }
    }

    #[test]
    fn ids_are_unique_and_resolvable() {
        for skill in SKILLS {
            assert_eq!(by_id(skill.id).map(|s| s.id), Some(skill.id));
        }
        let mut ids: Vec<&str> = SKILLS.iter().map(|s| s.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), SKILLS.len());
    }

    #[test]
    fn class_gating_rejects_cross_class_use() {
        assert!(class_can_use(HeroClass::Mage, MAGE_WILD_MAGIC));
        assert!(!class_can_use(HeroClass::Warrior, MAGE_WILD_MAGIC));
        assert!(!class_can_use(HeroClass::Mage, "not_a_skill"));
    }

    #[test]
    fn catalog_numbers_match_the_rule_set() {
        let blast = by_id(MAGE_ELEMENTAL_BLAST).unwrap();
        assert_eq!(blast.range, 3);
        assert_eq!(blast.effects[0], SkillEffect::Damage { amount: 3 });

        let hawk = by_id(HUNTRESS_SPIRIT_HAWK).unwrap();
        assert_eq!(hawk.range, 4);

        let beacon = by_id(MAGE_WARP_BEACON).unwrap();
        assert_eq!(beacon.range, 4);
        assert_eq!(beacon.effects, &[SkillEffect::Beacon]);

        for skill in SKILLS {
            assert_eq!(skill.cooldown, 2);
        }
    }
}
