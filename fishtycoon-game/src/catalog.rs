//! Static fish, location and boat part catalog.
//!
//! The catalog is immutable process-wide configuration. The bundled copy is
//! parsed and validated once; custom catalogs go through the same validation.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

use crate::boat::{BoatCategory, BoatPartDef};
use crate::constants::{
    RARITY_COMMON_MIN_CHANCE, RARITY_EPIC_MIN_CHANCE, RARITY_RARE_MIN_CHANCE,
    XP_MULTIPLIER_COMMON, XP_MULTIPLIER_EPIC, XP_MULTIPLIER_LEGENDARY, XP_MULTIPLIER_RARE,
};

const BUNDLED_CATALOG: &str = include_str!("../assets/catalog.json");

/// Qualitative rarity bucket derived from a species' base catch chance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// Bucket a base catch chance.
    #[must_use]
    pub fn from_chance(chance: f64) -> Self {
        if chance >= RARITY_COMMON_MIN_CHANCE {
            Self::Common
        } else if chance >= RARITY_RARE_MIN_CHANCE {
            Self::Rare
        } else if chance >= RARITY_EPIC_MIN_CHANCE {
            Self::Epic
        } else {
            Self::Legendary
        }
    }

    /// Skill XP multiplier for a catch of this rarity.
    #[must_use]
    pub const fn xp_multiplier(self) -> f64 {
        match self {
            Self::Common => XP_MULTIPLIER_COMMON,
            Self::Rare => XP_MULTIPLIER_RARE,
            Self::Epic => XP_MULTIPLIER_EPIC,
            Self::Legendary => XP_MULTIPLIER_LEGENDARY,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catchable fish species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FishSpecies {
    pub id: String,
    pub name: String,
    pub location: String,
    /// Probability mass within its location, 0..=1.
    pub chance: f64,
    /// Base sell value.
    pub value: u64,
    #[serde(default = "default_color")]
    pub color: String,
    /// Depth range in percent of the water column.
    #[serde(default = "default_depth")]
    pub depth: (f64, f64),
    /// Weight range in kilograms.
    #[serde(default = "default_weight")]
    pub weight: (f64, f64),
    /// Length range in centimeters.
    #[serde(default = "default_length")]
    pub length: (f64, f64),
}

impl FishSpecies {
    #[must_use]
    pub fn rarity(&self) -> Rarity {
        Rarity::from_chance(self.chance)
    }
}

/// A fishing location definition. The mutable unlock flag lives in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub unlock_price: u64,
}

impl LocationDef {
    /// Locations with no price start unlocked.
    #[must_use]
    pub const fn starts_unlocked(&self) -> bool {
        self.unlock_price == 0
    }
}

/// Errors raised when catalog invariants are violated.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("catalog defines no locations")]
    NoLocations,
    #[error("no location is free to start in")]
    NoStartingLocation,
    #[error("duplicate {kind} id `{id}`")]
    DuplicateId { kind: &'static str, id: String },
    #[error("species `{species}` references unknown location `{location}`")]
    UnknownLocation { species: String, location: String },
    #[error("location `{0}` has no species to catch")]
    EmptyLocation(String),
    #[error("species `{species}` chance {chance} is outside 0..=1")]
    ChanceOutOfRange { species: String, chance: f64 },
    #[error("species `{species}` has an inverted {field} range")]
    InvertedRange {
        species: String,
        field: &'static str,
    },
    #[error("boat category `{0}` has no free default option")]
    NoDefaultBoatOption(BoatCategory),
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogData {
    locations: Vec<LocationDef>,
    species: Vec<FishSpecies>,
    #[serde(default)]
    boat: Vec<BoatPartDef>,
}

/// Validated, indexed catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    locations: Vec<LocationDef>,
    species: Vec<FishSpecies>,
    boat: Vec<BoatPartDef>,
    by_location: BTreeMap<String, Vec<usize>>,
}

impl Catalog {
    /// Process-wide bundled catalog, parsed on first use.
    ///
    /// # Panics
    ///
    /// Panics if the bundled asset fails validation, which is a build defect.
    #[must_use]
    pub fn bundled() -> &'static Self {
        static CATALOG: OnceLock<Catalog> = OnceLock::new();
        CATALOG.get_or_init(|| Self::from_json(BUNDLED_CATALOG).expect("bundled catalog is valid"))
    }

    /// Parse and validate a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or violates catalog invariants.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let data: CatalogData = serde_json::from_str(json)?;
        Self::from_parts(data.locations, data.species, data.boat)
    }

    /// Build a catalog from already-parsed definitions.
    ///
    /// # Errors
    ///
    /// Returns an error if the definitions violate catalog invariants.
    pub fn from_parts(
        locations: Vec<LocationDef>,
        species: Vec<FishSpecies>,
        boat: Vec<BoatPartDef>,
    ) -> Result<Self, CatalogError> {
        if locations.is_empty() {
            return Err(CatalogError::NoLocations);
        }
        if !locations.iter().any(LocationDef::starts_unlocked) {
            return Err(CatalogError::NoStartingLocation);
        }
        ensure_unique("location", locations.iter().map(|l| l.id.as_str()))?;
        ensure_unique("species", species.iter().map(|s| s.id.as_str()))?;
        ensure_unique("boat part", boat.iter().map(|p| p.id.as_str()))?;

        let mut by_location: BTreeMap<String, Vec<usize>> = locations
            .iter()
            .map(|location| (location.id.clone(), Vec::new()))
            .collect();
        for (idx, fish) in species.iter().enumerate() {
            validate_species(fish)?;
            let Some(bucket) = by_location.get_mut(&fish.location) else {
                return Err(CatalogError::UnknownLocation {
                    species: fish.id.clone(),
                    location: fish.location.clone(),
                });
            };
            bucket.push(idx);
        }
        if let Some((empty, _)) = by_location.iter().find(|(_, fish)| fish.is_empty()) {
            return Err(CatalogError::EmptyLocation(empty.clone()));
        }
        for category in BoatCategory::ALL {
            if !boat
                .iter()
                .any(|part| part.category == category && part.price == 0)
            {
                return Err(CatalogError::NoDefaultBoatOption(category));
            }
        }

        Ok(Self {
            locations,
            species,
            boat,
            by_location,
        })
    }

    #[must_use]
    pub fn locations(&self) -> &[LocationDef] {
        &self.locations
    }

    #[must_use]
    pub fn species(&self) -> &[FishSpecies] {
        &self.species
    }

    #[must_use]
    pub fn boat_parts(&self) -> &[BoatPartDef] {
        &self.boat
    }

    #[must_use]
    pub fn location(&self, id: &str) -> Option<&LocationDef> {
        self.locations.iter().find(|location| location.id == id)
    }

    #[must_use]
    pub fn fish(&self, id: &str) -> Option<&FishSpecies> {
        self.species.iter().find(|fish| fish.id == id)
    }

    #[must_use]
    pub fn boat_part(&self, id: &str) -> Option<&BoatPartDef> {
        self.boat.iter().find(|part| part.id == id)
    }

    /// Species belonging to a location, in catalog order.
    pub fn species_at<'a>(&'a self, location_id: &str) -> impl Iterator<Item = &'a FishSpecies> {
        self.indexed_species_at(location_id).map(|(_, fish)| fish)
    }

    /// Species belonging to a location with their index into [`Self::species`].
    pub fn indexed_species_at<'a>(
        &'a self,
        location_id: &str,
    ) -> impl Iterator<Item = (usize, &'a FishSpecies)> {
        self.by_location
            .get(location_id)
            .into_iter()
            .flatten()
            .filter_map(|idx| self.species.get(*idx).map(|fish| (*idx, fish)))
    }

    /// The location a fresh game starts in: the first free one.
    ///
    /// # Panics
    ///
    /// Never panics for a validated catalog.
    #[must_use]
    pub fn starting_location(&self) -> &LocationDef {
        self.locations
            .iter()
            .find(|location| location.starts_unlocked())
            .expect("validated catalog has a free location")
    }

    /// Default (free) option for a boat category.
    ///
    /// # Panics
    ///
    /// Never panics for a validated catalog.
    #[must_use]
    pub fn default_boat_part(&self, category: BoatCategory) -> &BoatPartDef {
        self.boat
            .iter()
            .find(|part| part.category == category && part.price == 0)
            .expect("validated catalog has a default boat option per category")
    }
}

fn ensure_unique<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(CatalogError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

fn validate_species(fish: &FishSpecies) -> Result<(), CatalogError> {
    if !(0.0..=1.0).contains(&fish.chance) {
        return Err(CatalogError::ChanceOutOfRange {
            species: fish.id.clone(),
            chance: fish.chance,
        });
    }
    for (field, (min, max)) in [
        ("depth", fish.depth),
        ("weight", fish.weight),
        ("length", fish.length),
    ] {
        if min > max {
            return Err(CatalogError::InvertedRange {
                species: fish.id.clone(),
                field,
            });
        }
    }
    Ok(())
}

fn default_color() -> String {
    "#6495ED".to_string()
}

fn default_depth() -> (f64, f64) {
    (0.0, 100.0)
}

fn default_weight() -> (f64, f64) {
    (0.5, 2.0)
}

fn default_length() -> (f64, f64) {
    (10.0, 40.0)
}
