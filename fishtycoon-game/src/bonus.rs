//! Bonus aggregation: pure functions from progression state to effective scalars.
//!
//! Bonuses are additive inside a bracket and multiplicative across brackets.
//! Reordering them changes results materially at high levels, so every
//! derived value in the crate goes through this module.
use crate::boat::BoatBonuses;
use crate::catalog::{Catalog, FishSpecies, Rarity};
use crate::chance::ChanceTable;
use crate::constants::{
    ACTION_DELAY_FLOOR_RATIO, BASE_CATCH_XP, LUCK_COMMON_FACTOR, LUCK_RARE_AMPLIFIER,
    LUCK_RARITY_THRESHOLD,
};
use crate::numbers::{floor_f64_to_u64, floor_to_tenth, round_f64_to_u64, u64_to_f64};
use crate::prestige::PrestigeBonuses;
use crate::skills::{SkillBook, SkillId};
use crate::upgrades::{UpgradeLevels, UpgradeStat};

/// Borrowed view of every input a derived value depends on.
#[derive(Debug, Clone, Copy)]
pub struct BonusInputs<'a> {
    pub upgrades: &'a UpgradeLevels,
    pub skills: &'a SkillBook,
    pub skills_enabled: bool,
    pub prestige_level: u32,
    pub boat: BoatBonuses,
}

impl BonusInputs<'_> {
    /// Skill bonus, or zero when the skill system is switched off.
    #[must_use]
    pub fn skill_bonus(&self, id: SkillId) -> f64 {
        if self.skills_enabled {
            self.skills.bonus(id)
        } else {
            0.0
        }
    }

    #[must_use]
    pub fn prestige(&self) -> PrestigeBonuses {
        PrestigeBonuses::for_level(self.prestige_level)
    }
}

/// Every effective scalar consumed by the catch engine, offline backfill and displays.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DerivedStats {
    pub fishing_power: f64,
    pub auto_fish_rate: f64,
    pub luck: f64,
    pub efficiency: f64,
    pub knowledge: f64,
    pub patience: f64,
    pub fish_value_bonus: f64,
    pub storage_bonus: u64,
}

impl DerivedStats {
    #[must_use]
    pub fn compute(inputs: &BonusInputs<'_>) -> Self {
        Self {
            fishing_power: effective_fishing_power(inputs),
            auto_fish_rate: effective_auto_fish_rate(inputs),
            luck: effective_luck(inputs),
            efficiency: effective_efficiency(inputs),
            knowledge: inputs.skill_bonus(SkillId::Knowledge),
            patience: inputs.skill_bonus(SkillId::Patience),
            fish_value_bonus: inputs.prestige().fish_value,
            storage_bonus: inputs.boat.storage,
        }
    }

    /// Fish obtained by one catch action.
    #[must_use]
    pub fn catch_amount(&self, automatic: bool) -> u64 {
        if automatic {
            crate::numbers::ceil_f64_to_u64(self.auto_fish_rate)
        } else {
            floor_f64_to_u64(self.fishing_power)
        }
    }

    #[must_use]
    pub fn sell_value(&self, base: u64) -> u64 {
        effective_sell_value(base, self.knowledge, self.fish_value_bonus)
    }
}

/// `(1 + Σ upgrade power + prestige power) × (1 + casting)`, floored to a tenth.
#[must_use]
pub fn effective_fishing_power(inputs: &BonusInputs<'_>) -> f64 {
    let additive = 1.0
        + inputs.upgrades.total_effect(UpgradeStat::FishingPower)
        + inputs.prestige().fishing_power;
    floor_to_tenth(additive * (1.0 + inputs.skill_bonus(SkillId::Casting)))
}

/// `auto upgrade × (1 + automation) + prestige auto + engine bonus`.
#[must_use]
pub fn effective_auto_fish_rate(inputs: &BonusInputs<'_>) -> f64 {
    let upgrade = inputs.upgrades.total_effect(UpgradeStat::AutoFishRate);
    upgrade * (1.0 + inputs.skill_bonus(SkillId::Automation))
        + inputs.prestige().auto_fishing
        + inputs.boat.auto_fish
}

#[must_use]
pub fn effective_luck(inputs: &BonusInputs<'_>) -> f64 {
    inputs.upgrades.total_effect(UpgradeStat::Luck)
        + inputs.skill_bonus(SkillId::Luck)
        + inputs.boat.rarity
}

#[must_use]
pub fn effective_efficiency(inputs: &BonusInputs<'_>) -> f64 {
    inputs.upgrades.total_effect(UpgradeStat::ActionEfficiency)
        + inputs.skill_bonus(SkillId::Efficiency)
}

/// `floor(base × (1 + knowledge) × (1 + prestige value))`.
#[must_use]
pub fn effective_sell_value(base: u64, knowledge: f64, fish_value_bonus: f64) -> u64 {
    floor_f64_to_u64(u64_to_f64(base) * (1.0 + knowledge) * (1.0 + fish_value_bonus))
}

/// Bonus-adjusted, not yet normalized weight of one species.
#[must_use]
pub fn effective_catch_chance(fish: &FishSpecies, luck: f64) -> f64 {
    let rarity_factor = if fish.chance < LUCK_RARITY_THRESHOLD {
        LUCK_RARE_AMPLIFIER
    } else {
        LUCK_COMMON_FACTOR
    };
    fish.chance * (1.0 + luck * rarity_factor)
}

/// Normalized candidate table for a location, keyed by index into
/// [`Catalog::species`]. `None` when the location has no species.
#[must_use]
pub fn candidate_table(catalog: &Catalog, location_id: &str, luck: f64) -> Option<ChanceTable> {
    ChanceTable::normalized(
        catalog
            .indexed_species_at(location_id)
            .map(|(index, fish)| (index, effective_catch_chance(fish, luck))),
    )
}

/// `max(base × (1 − efficiency), base × 0.5)`, in whole milliseconds.
#[must_use]
pub fn effective_action_delay(base_ms: u64, efficiency: f64) -> u64 {
    let base = u64_to_f64(base_ms);
    let scaled = base * (1.0 - efficiency.max(0.0));
    round_f64_to_u64(scaled.max(base * ACTION_DELAY_FLOOR_RATIO))
}

/// `round(base XP × rarity multiplier × (1 + patience))`.
#[must_use]
pub fn catch_xp(rarity: Rarity, patience: f64) -> u64 {
    round_f64_to_u64(BASE_CATCH_XP * rarity.xp_multiplier() * (1.0 + patience))
}
