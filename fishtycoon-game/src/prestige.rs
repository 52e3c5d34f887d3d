//! Prestige: a requirement-gated reset that trades progress for permanent bonuses.
use serde::{Deserialize, Serialize};

use crate::constants::{
    PRESTIGE_AUTO_FISHING_PER_LEVEL, PRESTIGE_ENCYCLOPEDIA_REQUIREMENT,
    PRESTIGE_FISH_REQUIREMENT, PRESTIGE_FISH_VALUE_PER_LEVEL, PRESTIGE_FISHING_POWER_PER_LEVEL,
    PRESTIGE_LOCATIONS_REQUIREMENT, PRESTIGE_MONEY_REQUIREMENT,
    PRESTIGE_STARTING_MONEY_PER_LEVEL,
};
use crate::numbers::u32_to_f64;

/// Bonuses derived purely from the prestige level.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PrestigeBonuses {
    pub fishing_power: f64,
    pub auto_fishing: f64,
    pub fish_value: f64,
    pub starting_money: u64,
}

impl PrestigeBonuses {
    #[must_use]
    pub fn for_level(level: u32) -> Self {
        let scale = u32_to_f64(level);
        Self {
            fishing_power: scale * PRESTIGE_FISHING_POWER_PER_LEVEL,
            auto_fishing: scale * PRESTIGE_AUTO_FISHING_PER_LEVEL,
            fish_value: scale * PRESTIGE_FISH_VALUE_PER_LEVEL,
            starting_money: u64::from(level).saturating_mul(PRESTIGE_STARTING_MONEY_PER_LEVEL),
        }
    }
}

/// Snapshot of the ledger values prestige is gated on.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PrestigeProgress {
    pub money: u64,
    pub fish_caught: u64,
    pub locations_unlocked: usize,
    /// Discovered species share, 0..=1.
    pub encyclopedia_completion: f64,
}

/// Thresholds that must all hold simultaneously for the next prestige.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrestigeRequirements {
    pub money: u64,
    pub fish_caught: u64,
    pub locations_unlocked: usize,
    pub encyclopedia_completion: f64,
}

impl PrestigeRequirements {
    /// Requirements to advance from `level`; money and fish scale with the
    /// next level, the location requirement is capped by the catalog size.
    #[must_use]
    pub fn for_level(level: u32, location_count: usize) -> Self {
        let next = u64::from(level).saturating_add(1);
        Self {
            money: PRESTIGE_MONEY_REQUIREMENT.saturating_mul(next),
            fish_caught: PRESTIGE_FISH_REQUIREMENT.saturating_mul(next),
            locations_unlocked: PRESTIGE_LOCATIONS_REQUIREMENT.min(location_count),
            encyclopedia_completion: PRESTIGE_ENCYCLOPEDIA_REQUIREMENT,
        }
    }

    #[must_use]
    pub fn evaluate(&self, progress: &PrestigeProgress) -> Vec<RequirementStatus> {
        vec![
            RequirementStatus {
                kind: RequirementKind::Money,
                required: crate::numbers::u64_to_f64(self.money),
                current: crate::numbers::u64_to_f64(progress.money),
                met: progress.money >= self.money,
            },
            RequirementStatus {
                kind: RequirementKind::FishCaught,
                required: crate::numbers::u64_to_f64(self.fish_caught),
                current: crate::numbers::u64_to_f64(progress.fish_caught),
                met: progress.fish_caught >= self.fish_caught,
            },
            RequirementStatus {
                kind: RequirementKind::LocationsUnlocked,
                required: crate::numbers::usize_to_f64(self.locations_unlocked),
                current: crate::numbers::usize_to_f64(progress.locations_unlocked),
                met: progress.locations_unlocked >= self.locations_unlocked,
            },
            RequirementStatus {
                kind: RequirementKind::EncyclopediaCompletion,
                required: self.encyclopedia_completion,
                current: progress.encyclopedia_completion,
                met: progress.encyclopedia_completion + 1e-9 >= self.encyclopedia_completion,
            },
        ]
    }

    #[must_use]
    pub fn is_met(&self, progress: &PrestigeProgress) -> bool {
        self.evaluate(progress).iter().all(|status| status.met)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    Money,
    FishCaught,
    LocationsUnlocked,
    EncyclopediaCompletion,
}

/// One requirement's progress, for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RequirementStatus {
    pub kind: RequirementKind,
    pub required: f64,
    pub current: f64,
    pub met: bool,
}

/// Result of a completed prestige transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrestigeOutcome {
    pub new_level: u32,
    pub bonuses: PrestigeBonuses,
}
