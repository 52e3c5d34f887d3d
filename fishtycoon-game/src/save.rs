//! Persistence codec: flat save snapshots and the key-value store seam.
//!
//! Only raw progression values are read back. Derived values (fishing power,
//! auto-fish rate, upgrade costs) are written for external readers and
//! recomputed from levels on load.
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::rc::Rc;
use thiserror::Error;

use crate::boat::BoatCustomization;
use crate::catalog::Catalog;
use crate::config::GameConfig;
use crate::constants::SAVE_VERSION;
use crate::encyclopedia::{Encyclopedia, EncyclopediaEntry};
use crate::inbox::{Inbox, Mail};
use crate::ledger::Ledger;
use crate::skills::SkillId;
use crate::upgrades::UpgradeId;

/// A persisted blob that cannot be turned back into a ledger.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save data is not valid: {0}")]
    Json(#[from] serde_json::Error),
    #[error("save data must be a JSON object")]
    NotAnObject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedUpgrade {
    pub id: String,
    #[serde(default)]
    pub level: u32,
    /// Written for display; ignored on load.
    #[serde(default)]
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedLocation {
    pub id: String,
    #[serde(default)]
    pub unlocked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSkill {
    #[serde(default = "SavedSkill::default_level")]
    pub level: u32,
    #[serde(default)]
    pub xp: u64,
}

impl SavedSkill {
    const fn default_level() -> u32 {
        1
    }
}

/// Flat, re-derivable projection of the ledger.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub money: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub inventory: BTreeMap<String, u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_fish_caught: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fishing_power: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub auto_fishing_rate: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub upgrades: Vec<SavedUpgrade>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fishing_locations: Vec<SavedLocation>,
    #[serde(default)]
    pub active_location_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub boat_customization: Option<BoatCustomization>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub encyclopedia: BTreeMap<String, EncyclopediaEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub encyclopedia_unlocked: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_online_time: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub prestige_level: u32,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub emails: Vec<Mail>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fishing_skills: BTreeMap<String, SavedSkill>,
    #[serde(default, rename = "totalXP", deserialize_with = "null_as_default")]
    pub total_xp: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub auto_sell: bool,
}

impl SaveSnapshot {
    /// Project a ledger, including derived values for external display.
    #[must_use]
    pub fn capture(ledger: &Ledger, catalog: &Catalog, config: &GameConfig) -> Self {
        let stats = ledger.derived(catalog, config);
        Self {
            version: SAVE_VERSION,
            money: ledger.money(),
            inventory: ledger
                .inventory()
                .iter()
                .filter(|(_, count)| **count > 0)
                .map(|(id, count)| (id.clone(), *count))
                .collect(),
            total_fish_caught: ledger.total_fish_caught(),
            fishing_power: stats.fishing_power,
            auto_fishing_rate: stats.auto_fish_rate,
            upgrades: UpgradeId::ALL
                .iter()
                .map(|id| SavedUpgrade {
                    id: id.as_str().to_string(),
                    level: ledger.upgrades().level(*id),
                    cost: ledger
                        .upgrades()
                        .next_cost(*id)
                        .map_or(0.0, crate::numbers::u64_to_f64),
                })
                .collect(),
            fishing_locations: catalog
                .locations()
                .iter()
                .map(|location| SavedLocation {
                    id: location.id.clone(),
                    unlocked: ledger.is_location_unlocked(&location.id),
                })
                .collect(),
            active_location_id: Some(ledger.active_location().to_string()),
            boat_customization: Some(ledger.boat().clone()),
            encyclopedia: ledger.encyclopedia().entries().clone(),
            encyclopedia_unlocked: ledger.encyclopedia_unlocked(),
            last_online_time: ledger.last_online_ms(),
            prestige_level: ledger.prestige_level(),
            emails: ledger.inbox().messages().cloned().collect(),
            fishing_skills: ledger
                .skills()
                .iter()
                .map(|(id, progress)| {
                    (
                        id.as_str().to_string(),
                        SavedSkill {
                            level: progress.level,
                            xp: progress.xp,
                        },
                    )
                })
                .collect(),
            total_xp: ledger.skills().total_xp(),
            auto_sell: ledger.auto_sell(),
        }
    }

    /// Rebuild a ledger over fresh initial state. Unknown ids are dropped and
    /// every derived value is recomputed from levels.
    #[must_use]
    pub fn restore(self, catalog: &Catalog) -> Ledger {
        let mut ledger = Ledger::new(catalog);
        ledger.money = self.money;
        ledger.total_fish_caught = self.total_fish_caught;

        for (key, count) in self.inventory {
            if count == 0 {
                continue;
            }
            match resolve_species_key(catalog, &key) {
                Some(id) => {
                    let held = ledger.inventory.entry(id).or_insert(0);
                    *held = held.saturating_add(count);
                }
                None => log::debug!("ignoring unknown inventory entry {key}"),
            }
        }

        for saved in self.upgrades {
            if let Ok(id) = saved.id.parse::<UpgradeId>() {
                ledger.upgrades.set_level(id, saved.level);
            }
        }

        for saved in self.fishing_locations {
            if saved.unlocked && catalog.location(&saved.id).is_some() {
                ledger.unlocked_locations.insert(saved.id);
            }
        }
        if let Some(active) = self.active_location_id
            && ledger.is_location_unlocked(&active)
        {
            ledger.active_location = active;
        }

        if let Some(mut boat) = self.boat_customization {
            boat.sanitize(catalog);
            ledger.boat = boat;
        }

        let mut encyclopedia = Encyclopedia::new(catalog);
        encyclopedia.restore(catalog, self.encyclopedia);
        ledger.encyclopedia_unlocked =
            self.encyclopedia_unlocked || encyclopedia.discovered_count() > 0;
        ledger.encyclopedia = encyclopedia;

        ledger.last_online_ms = self.last_online_time;
        ledger.prestige_level = self.prestige_level;
        ledger.inbox = Inbox::from_saved(self.emails);

        for (key, saved) in self.fishing_skills {
            if let Ok(id) = key.parse::<SkillId>() {
                ledger.skills.restore(id, saved.level, saved.xp);
            }
        }
        ledger.skills.set_total_xp(self.total_xp);
        ledger.auto_sell = self.auto_sell;
        ledger
    }
}

/// Inventory keys are species ids; older blobs keyed them by display name.
fn resolve_species_key(catalog: &Catalog, key: &str) -> Option<String> {
    catalog
        .fish(key)
        .or_else(|| catalog.species().iter().find(|fish| fish.name == key))
        .map(|fish| fish.id.clone())
}

/// A `null` field reads as if it were missing.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// Serialize a ledger to its persisted JSON form.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode(ledger: &Ledger, catalog: &Catalog, config: &GameConfig) -> Result<String, SaveError> {
    Ok(serde_json::to_string(&SaveSnapshot::capture(ledger, catalog, config))?)
}

/// Parse a persisted blob back into a ledger.
///
/// # Errors
///
/// Returns [`SaveError`] when the blob is not a JSON object or holds values
/// of the wrong type (including negative counts).
pub fn decode(blob: &str, catalog: &Catalog) -> Result<Ledger, SaveError> {
    let value: serde_json::Value = serde_json::from_str(blob)?;
    if !value.is_object() {
        return Err(SaveError::NotAnObject);
    }
    let snapshot: SaveSnapshot = serde_json::from_value(value)?;
    Ok(snapshot.restore(catalog))
}

/// Key-value store the engine persists into.
/// Platform-specific implementations should provide this.
pub trait SaveStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read a blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Overwrite a blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn write(&self, key: &str, blob: &str) -> Result<(), Self::Error>;

    /// Delete a blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob cannot be removed.
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

/// In-memory store. Clones share the same backing map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blobs: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.blobs.borrow().get(key).cloned()
    }

    pub fn put(&self, key: &str, blob: impl Into<String>) {
        self.blobs.borrow_mut().insert(key.to_string(), blob.into());
    }
}

impl SaveStore for MemoryStore {
    type Error = Infallible;

    fn read(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.get(key))
    }

    fn write(&self, key: &str, blob: &str) -> Result<(), Self::Error> {
        self.put(key, blob);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        self.blobs.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upgrades::UpgradeId;

    fn catalog() -> &'static Catalog {
        Catalog::bundled()
    }

    #[test]
    fn minimal_legacy_blob_loads() {
        let blob = r#"{
            "money": 120,
            "inventory": { "Common Fish": 3, "Rare Fish": 0, "Mystery": 2 },
            "totalFishCaught": 40,
            "fishingPower": 99,
            "autoFishingRate": 42.5,
            "upgrades": [
                { "id": "rod", "level": 3, "cost": 112 },
                { "id": "auto", "level": 1, "cost": 400 },
                { "id": "jetpack", "level": 9, "cost": 1 }
            ]
        }"#;
        let ledger = decode(blob, catalog()).unwrap();
        assert_eq!(ledger.money(), 120);
        assert_eq!(ledger.held("common_fish"), 3);
        assert_eq!(ledger.inventory().len(), 1);
        assert_eq!(ledger.upgrades().level(UpgradeId::Rod), 3);
        assert_eq!(ledger.upgrades().level(UpgradeId::Auto), 1);
        let stats = ledger.derived(catalog(), &GameConfig::default());
        // Recomputed from levels, not read back.
        assert!((stats.fishing_power - 3.3).abs() < 1e-9);
        assert!(stats.auto_fish_rate < 1.0);
        assert_eq!(ledger.active_location(), "pond");
    }

    #[test]
    fn empty_object_is_a_fresh_game() {
        let ledger = decode("{}", catalog()).unwrap();
        assert_eq!(ledger, Ledger::new(catalog()));
    }

    #[test]
    fn negative_and_malformed_blobs_are_rejected() {
        assert!(matches!(decode("[]", catalog()), Err(SaveError::NotAnObject)));
        assert!(matches!(decode("not json", catalog()), Err(SaveError::Json(_))));
        assert!(decode(r#"{ "money": -5 }"#, catalog()).is_err());
        assert!(decode(r#"{ "inventory": { "perch": -1 } }"#, catalog()).is_err());
        assert!(decode(r#"{ "money": "lots" }"#, catalog()).is_err());
    }

    #[test]
    fn null_fields_read_as_missing() {
        let blob = r#"{
            "money": 5000,
            "inventory": null,
            "upgrades": null,
            "totalFishCaught": null,
            "lastOnlineTime": null,
            "fishingSkills": null,
            "autoSell": null
        }"#;
        let ledger = decode(blob, catalog()).unwrap();
        assert_eq!(ledger.money(), 5000);
        assert_eq!(ledger.inventory_total(), 0);
        assert_eq!(ledger.total_fish_caught(), 0);
        assert_eq!(ledger.upgrades().level(UpgradeId::Rod), 0);
        assert_eq!(ledger.last_online_ms(), 0);
        assert!(!ledger.auto_sell());
    }

    #[test]
    fn locked_active_location_falls_back() {
        let blob = r#"{
            "fishingLocations": [ { "id": "lake", "unlocked": false }, { "id": "moon", "unlocked": true } ],
            "activeLocationId": "lake"
        }"#;
        let ledger = decode(blob, catalog()).unwrap();
        assert_eq!(ledger.active_location(), "pond");
        assert!(!ledger.is_location_unlocked("moon"));
    }

    #[test]
    fn foreign_shapes_degrade_to_defaults() {
        let blob = r#"{
            "boatCustomization": { "hull": { "selected": "wooden", "options": [] } },
            "emails": [ { "subject": "hi" }, { "id": 4, "kind": "prestige", "subject": "P1", "body": "" } ],
            "fishingSkills": { "casting": { "level": 3 }, "swimming": { "level": 9, "xp": 1 } }
        }"#;
        let ledger = decode(blob, catalog()).unwrap();
        assert_eq!(ledger.boat(), &BoatCustomization::new(catalog()));
        assert_eq!(ledger.inbox().len(), 1);
        assert_eq!(ledger.skills().level(SkillId::Casting), 3);
    }

    #[test]
    fn snapshot_writes_derived_fields() {
        let mut ledger = Ledger::new(catalog());
        ledger.credit(50);
        assert!(ledger.purchase_upgrade(UpgradeId::Rod));
        let json = encode(&ledger, catalog(), &GameConfig::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], SAVE_VERSION);
        assert!(value["fishingPower"].as_f64().unwrap() > 2.0);
        let rod = value["upgrades"]
            .as_array()
            .unwrap()
            .iter()
            .find(|upgrade| upgrade["id"] == "rod")
            .unwrap();
        assert_eq!(rod["level"], 2);
        assert!((rod["cost"].as_f64().unwrap() - 75.0).abs() < f64::EPSILON);
        assert!(value.get("totalXP").is_some());
    }

    #[test]
    fn memory_store_clones_share_blobs() {
        let store = MemoryStore::new();
        let view = store.clone();
        store.write("k", "v").unwrap();
        assert_eq!(view.read("k").unwrap().as_deref(), Some("v"));
        view.remove("k").unwrap();
        assert_eq!(store.read("k").unwrap(), None);
    }
}
