//! Purchasable upgrades. Only levels are stored; cost and effect are always
//! derived from the level.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    AUTO_BASE_COST, AUTO_COST_GROWTH, AUTO_RATE_PER_LEVEL, BOAT_BASE_COST, BOAT_COST_GROWTH,
    BOAT_EFFICIENCY_PER_LEVEL, BOAT_MAX_LEVEL, LURE_BASE_COST, LURE_COST_GROWTH,
    LURE_LUCK_PER_LEVEL, ROD_BASE_COST, ROD_COST_GROWTH, ROD_POWER_PER_LEVEL,
};
use crate::numbers::{floor_f64_to_u64, u32_to_f64};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeId {
    Rod,
    Boat,
    Auto,
    Lure,
}

/// Which effective stat an upgrade feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeStat {
    FishingPower,
    ActionEfficiency,
    AutoFishRate,
    Luck,
}

impl UpgradeId {
    pub const ALL: [Self; 4] = [Self::Rod, Self::Boat, Self::Auto, Self::Lure];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rod => "rod",
            Self::Boat => "boat",
            Self::Auto => "auto",
            Self::Lure => "lure",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rod => "Better Fishing Rod",
            Self::Boat => "Boat Upgrade",
            Self::Auto => "Auto-Fisher",
            Self::Lure => "Better Lures",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Rod => "Catch more fish per cast",
            Self::Boat => "Improves fishing speed",
            Self::Auto => "Automatically catches fish over time",
            Self::Lure => "Increases chance of rare fish",
        }
    }

    /// Level a fresh game starts at.
    #[must_use]
    pub const fn start_level(self) -> u32 {
        match self {
            Self::Auto => 0,
            Self::Rod | Self::Boat | Self::Lure => 1,
        }
    }

    #[must_use]
    pub const fn max_level(self) -> Option<u32> {
        match self {
            Self::Boat => Some(BOAT_MAX_LEVEL),
            Self::Rod | Self::Auto | Self::Lure => None,
        }
    }

    #[must_use]
    pub const fn stat(self) -> UpgradeStat {
        match self {
            Self::Rod => UpgradeStat::FishingPower,
            Self::Boat => UpgradeStat::ActionEfficiency,
            Self::Auto => UpgradeStat::AutoFishRate,
            Self::Lure => UpgradeStat::Luck,
        }
    }

    const fn curve(self) -> (f64, f64, f64) {
        match self {
            Self::Rod => (ROD_BASE_COST, ROD_COST_GROWTH, ROD_POWER_PER_LEVEL),
            Self::Boat => (BOAT_BASE_COST, BOAT_COST_GROWTH, BOAT_EFFICIENCY_PER_LEVEL),
            Self::Auto => (AUTO_BASE_COST, AUTO_COST_GROWTH, AUTO_RATE_PER_LEVEL),
            Self::Lure => (LURE_BASE_COST, LURE_COST_GROWTH, LURE_LUCK_PER_LEVEL),
        }
    }

    /// Price of buying the next level from `level`: `floor(base × growth^(level − start))`.
    #[must_use]
    pub fn cost_at(self, level: u32) -> u64 {
        let (base, growth, _) = self.curve();
        let steps = level.saturating_sub(self.start_level());
        let exponent = i32::try_from(steps).unwrap_or(i32::MAX);
        floor_f64_to_u64(base * growth.powi(exponent))
    }

    /// Effect magnitude contributed at `level`; zero at the start level.
    #[must_use]
    pub fn effect_at(self, level: u32) -> f64 {
        let (_, _, per_level) = self.curve();
        u32_to_f64(level.saturating_sub(self.start_level())) * per_level
    }

    #[must_use]
    pub fn is_maxed(self, level: u32) -> bool {
        self.max_level().is_some_and(|max| level >= max)
    }
}

impl fmt::Display for UpgradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpgradeId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rod" => Ok(Self::Rod),
            "boat" => Ok(Self::Boat),
            "auto" => Ok(Self::Auto),
            "lure" => Ok(Self::Lure),
            _ => Err(()),
        }
    }
}

/// Current upgrade levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeLevels {
    levels: BTreeMap<UpgradeId, u32>,
}

impl Default for UpgradeLevels {
    fn default() -> Self {
        Self {
            levels: UpgradeId::ALL
                .iter()
                .map(|id| (*id, id.start_level()))
                .collect(),
        }
    }
}

impl UpgradeLevels {
    #[must_use]
    pub fn level(&self, id: UpgradeId) -> u32 {
        self.levels
            .get(&id)
            .copied()
            .unwrap_or_else(|| id.start_level())
    }

    /// Set a level, clamped to the upgrade's valid range.
    pub fn set_level(&mut self, id: UpgradeId, level: u32) {
        let mut level = level.max(id.start_level());
        if let Some(max) = id.max_level() {
            level = level.min(max);
        }
        self.levels.insert(id, level);
    }

    /// Cost of the next level, `None` when maxed.
    #[must_use]
    pub fn next_cost(&self, id: UpgradeId) -> Option<u64> {
        let level = self.level(id);
        (!id.is_maxed(level)).then(|| id.cost_at(level))
    }

    /// Sum of effects feeding one stat.
    #[must_use]
    pub fn total_effect(&self, stat: UpgradeStat) -> f64 {
        UpgradeId::ALL
            .iter()
            .filter(|id| id.stat() == stat)
            .map(|id| id.effect_at(self.level(*id)))
            .sum()
    }

    pub(crate) fn increment(&mut self, id: UpgradeId) {
        let next = self.level(id).saturating_add(1);
        self.set_level(id, next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rod_costs_follow_curve() {
        assert_eq!(UpgradeId::Rod.cost_at(1), 50);
        assert_eq!(UpgradeId::Rod.cost_at(2), 75);
        assert_eq!(UpgradeId::Rod.cost_at(3), 112);
    }

    #[test]
    fn auto_fisher_starts_at_zero() {
        let levels = UpgradeLevels::default();
        assert_eq!(levels.level(UpgradeId::Auto), 0);
        assert_eq!(levels.next_cost(UpgradeId::Auto), Some(200));
        assert!(levels.total_effect(UpgradeStat::AutoFishRate).abs() < f64::EPSILON);
    }

    #[test]
    fn costs_strictly_increase() {
        for id in UpgradeId::ALL {
            let mut last = 0;
            for level in id.start_level()..id.start_level() + 12 {
                let cost = id.cost_at(level);
                assert!(cost > last, "{id} level {level}");
                last = cost;
            }
        }
    }

    #[test]
    fn boat_caps_at_max_level() {
        let mut levels = UpgradeLevels::default();
        for _ in 0..10 {
            levels.increment(UpgradeId::Boat);
        }
        assert_eq!(levels.level(UpgradeId::Boat), BOAT_MAX_LEVEL);
        assert_eq!(levels.next_cost(UpgradeId::Boat), None);
        assert!((levels.total_effect(UpgradeStat::ActionEfficiency) - 0.4).abs() < 1e-9);
    }
}
