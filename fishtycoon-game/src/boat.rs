//! Boat customization: one selected option per part category.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::catalog::Catalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoatCategory {
    Hull,
    Engine,
    Equipment,
    Storage,
}

impl BoatCategory {
    pub const ALL: [Self; 4] = [Self::Hull, Self::Engine, Self::Equipment, Self::Storage];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hull => "hull",
            Self::Engine => "engine",
            Self::Equipment => "equipment",
            Self::Storage => "storage",
        }
    }
}

impl fmt::Display for BoatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoatCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hull" => Ok(Self::Hull),
            "engine" => Ok(Self::Engine),
            "equipment" => Ok(Self::Equipment),
            "storage" => Ok(Self::Storage),
            _ => Err(()),
        }
    }
}

/// A purchasable boat part option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoatPartDef {
    pub id: String,
    pub name: String,
    pub category: BoatCategory,
    #[serde(default)]
    pub price: u64,
    /// Added to the effective auto-fish rate while selected (engines).
    #[serde(default)]
    pub auto_fish_bonus: f64,
    /// Added to luck while selected (equipment).
    #[serde(default)]
    pub rarity_bonus: f64,
    /// Added to the offline per-species inventory cap while selected (storage).
    #[serde(default)]
    pub storage_bonus: u64,
}

/// Bonuses contributed by the currently selected parts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoatBonuses {
    pub auto_fish: f64,
    pub rarity: f64,
    pub storage: u64,
}

/// Mutable boat state owned by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BoatCustomization {
    #[serde(default)]
    pub selected: BTreeMap<BoatCategory, String>,
    #[serde(default)]
    pub unlocked: BTreeSet<String>,
}

impl BoatCustomization {
    /// Fresh boat with every category's free option unlocked and selected.
    #[must_use]
    pub fn new(catalog: &Catalog) -> Self {
        let mut boat = Self::default();
        for category in BoatCategory::ALL {
            let part = catalog.default_boat_part(category);
            boat.unlocked.insert(part.id.clone());
            boat.selected.insert(category, part.id.clone());
        }
        boat
    }

    #[must_use]
    pub fn is_unlocked(&self, part_id: &str) -> bool {
        self.unlocked.contains(part_id)
    }

    #[must_use]
    pub fn selected(&self, category: BoatCategory) -> Option<&str> {
        self.selected.get(&category).map(String::as_str)
    }

    /// Unlock flags are one-way.
    pub fn unlock(&mut self, part_id: &str) {
        self.unlocked.insert(part_id.to_string());
    }

    /// Select an unlocked part. Returns whether the selection changed.
    pub fn select(&mut self, catalog: &Catalog, part_id: &str) -> bool {
        let Some(part) = catalog.boat_part(part_id) else {
            return false;
        };
        if !self.is_unlocked(part_id) || self.selected(part.category) == Some(part_id) {
            return false;
        }
        self.selected.insert(part.category, part.id.clone());
        true
    }

    /// Sum the bonuses of the selected parts.
    #[must_use]
    pub fn bonuses(&self, catalog: &Catalog) -> BoatBonuses {
        self.selected
            .values()
            .filter_map(|id| catalog.boat_part(id))
            .fold(BoatBonuses::default(), |mut acc, part| {
                acc.auto_fish += part.auto_fish_bonus;
                acc.rarity += part.rarity_bonus;
                acc.storage = acc.storage.saturating_add(part.storage_bonus);
                acc
            })
    }

    /// Drop ids the catalog does not know and fill missing categories with defaults.
    pub fn sanitize(&mut self, catalog: &Catalog) {
        self.unlocked.retain(|id| catalog.boat_part(id).is_some());
        self.selected.retain(|category, id| {
            catalog
                .boat_part(id)
                .is_some_and(|part| part.category == *category)
        });
        for category in BoatCategory::ALL {
            let default_part = catalog.default_boat_part(category);
            self.unlocked.insert(default_part.id.clone());
            let keep = self
                .selected
                .get(&category)
                .is_some_and(|id| self.unlocked.contains(id));
            if !keep {
                self.selected.insert(category, default_part.id.clone());
            }
        }
    }
}
