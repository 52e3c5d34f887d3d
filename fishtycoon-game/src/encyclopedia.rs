//! Discovery and record keeping per species.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::Catalog;
use crate::numbers::usize_to_f64;

/// One species' entry. Every field only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncyclopediaEntry {
    #[serde(default)]
    pub discovered: bool,
    #[serde(default)]
    pub caught: u64,
    #[serde(default)]
    pub best_weight: f64,
    #[serde(default)]
    pub best_length: f64,
}

/// What a single recorded catch changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordUpdate {
    pub first_discovery: bool,
    pub new_weight_record: bool,
    pub new_length_record: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Encyclopedia {
    entries: BTreeMap<String, EncyclopediaEntry>,
}

impl Encyclopedia {
    /// Eagerly create an undiscovered entry for every catalog species.
    #[must_use]
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            entries: catalog
                .species()
                .iter()
                .map(|fish| (fish.id.clone(), EncyclopediaEntry::default()))
                .collect(),
        }
    }

    #[must_use]
    pub fn entry(&self, species_id: &str) -> Option<&EncyclopediaEntry> {
        self.entries.get(species_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EncyclopediaEntry)> {
        self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    /// Record one catch with its rolled measurements.
    pub fn record_catch(&mut self, species_id: &str, weight: f64, length: f64) -> RecordUpdate {
        let entry = self.entries.entry(species_id.to_string()).or_default();
        let first_discovery = !entry.discovered;
        entry.discovered = true;
        entry.caught = entry.caught.saturating_add(1);
        let new_weight_record = weight > entry.best_weight;
        if new_weight_record {
            entry.best_weight = weight;
        }
        let new_length_record = length > entry.best_length;
        if new_length_record {
            entry.best_length = length;
        }
        RecordUpdate {
            first_discovery,
            new_weight_record,
            new_length_record,
        }
    }

    #[must_use]
    pub fn discovered_count(&self) -> usize {
        self.entries.values().filter(|entry| entry.discovered).count()
    }

    /// Discovered share of the catalog, 0..=1.
    #[must_use]
    pub fn completion(&self, catalog: &Catalog) -> f64 {
        let total = catalog.species().len();
        if total == 0 {
            return 0.0;
        }
        let discovered = catalog
            .species()
            .iter()
            .filter(|fish| self.entry(&fish.id).is_some_and(|entry| entry.discovered))
            .count();
        usize_to_f64(discovered) / usize_to_f64(total)
    }

    /// Merge saved entries over a fresh encyclopedia, dropping unknown species
    /// and repairing entries that claim catches without being discovered.
    pub(crate) fn restore(
        &mut self,
        catalog: &Catalog,
        saved: BTreeMap<String, EncyclopediaEntry>,
    ) {
        for (id, mut entry) in saved {
            if catalog.fish(&id).is_none() {
                continue;
            }
            if entry.caught > 0 {
                entry.discovered = true;
            }
            entry.best_weight = sanitize_record(entry.best_weight);
            entry.best_length = sanitize_record(entry.best_length);
            self.entries.insert(id, entry);
        }
    }

    pub(crate) fn entries(&self) -> &BTreeMap<String, EncyclopediaEntry> {
        &self.entries
    }
}

fn sanitize_record(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_species_has_an_entry() {
        let catalog = Catalog::bundled();
        let book = Encyclopedia::new(catalog);
        assert_eq!(book.iter().count(), catalog.species().len());
        assert_eq!(book.discovered_count(), 0);
    }

    #[test]
    fn discovery_flips_once_and_records_only_grow() {
        let catalog = Catalog::bundled();
        let mut book = Encyclopedia::new(catalog);
        let first = book.record_catch("perch", 1.2, 20.0);
        assert!(first.first_discovery);
        let second = book.record_catch("perch", 0.8, 25.0);
        assert!(!second.first_discovery);
        assert!(!second.new_weight_record);
        assert!(second.new_length_record);
        let entry = book.entry("perch").unwrap();
        assert_eq!(entry.caught, 2);
        assert!((entry.best_weight - 1.2).abs() < 1e-9);
        assert!((entry.best_length - 25.0).abs() < 1e-9);
    }

    #[test]
    fn completion_counts_catalog_species() {
        let catalog = Catalog::bundled();
        let mut book = Encyclopedia::new(catalog);
        for id in ["common_fish", "rare_fish", "perch", "trout"] {
            book.record_catch(id, 1.0, 1.0);
        }
        assert!((book.completion(catalog) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn restore_repairs_inconsistent_entries() {
        let catalog = Catalog::bundled();
        let mut book = Encyclopedia::new(catalog);
        let mut saved = BTreeMap::new();
        saved.insert(
            "bass".to_string(),
            EncyclopediaEntry {
                discovered: false,
                caught: 3,
                best_weight: f64::NAN,
                best_length: 40.0,
            },
        );
        saved.insert("ghost".to_string(), EncyclopediaEntry::default());
        book.restore(catalog, saved);
        let bass = book.entry("bass").unwrap();
        assert!(bass.discovered);
        assert!(bass.best_weight.abs() < f64::EPSILON);
        assert!(book.entry("ghost").is_none());
    }
}
