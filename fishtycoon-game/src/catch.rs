//! Catch engine: resolves one fishing action into ledger mutations.
use rand::Rng;
use rand::seq::SliceRandom;

use crate::bonus::{self, DerivedStats};
use crate::catalog::{Catalog, FishSpecies};
use crate::chance::ChanceTable;
use crate::config::GameConfig;
use crate::inbox::MailKind;
use crate::ledger::Ledger;
use crate::rng::RngBundle;
use crate::skills::SkillId;

/// One fish obtained by a catch action.
#[derive(Debug, Clone, PartialEq)]
pub struct CaughtFish {
    pub species_id: String,
    pub weight: f64,
    pub length: f64,
    pub first_discovery: bool,
    pub new_record: bool,
}

/// A skill level-up earned during a catch action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUp {
    pub skill: SkillId,
    pub new_level: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatchReport {
    pub automatic: bool,
    pub fish: Vec<CaughtFish>,
    pub xp_awarded: u64,
    pub level_ups: Vec<LevelUp>,
}

impl CatchReport {
    #[must_use]
    pub fn count(&self) -> usize {
        self.fish.len()
    }

    pub fn discoveries(&self) -> impl Iterator<Item = &str> {
        self.fish
            .iter()
            .filter(|fish| fish.first_discovery)
            .map(|fish| fish.species_id.as_str())
    }
}

/// Candidate table for the active location.
///
/// # Panics
///
/// Panics if the active location has no species. A validated catalog never
/// has an empty location and the ledger only activates catalog locations.
pub(crate) fn active_candidates(ledger: &Ledger, catalog: &Catalog, luck: f64) -> ChanceTable {
    bonus::candidate_table(catalog, ledger.active_location(), luck).unwrap_or_else(|| {
        panic!(
            "no catchable species at location {:?}; the catalog is misconfigured",
            ledger.active_location()
        )
    })
}

/// Resolve one catch action, manual or automatic.
///
/// Catches `floor(fishing power)` fish for a manual action and
/// `ceil(auto-fish rate)` for an automatic one. Each fish goes to the
/// inventory, the encyclopedia and, with skills enabled, grants XP to one
/// randomly chosen skill.
///
/// # Panics
///
/// See [`active_candidates`].
pub fn resolve_catch(
    ledger: &mut Ledger,
    catalog: &Catalog,
    config: &GameConfig,
    rng: &mut RngBundle,
    automatic: bool,
) -> CatchReport {
    let stats = ledger.derived(catalog, config);
    let amount = stats.catch_amount(automatic);
    let mut report = CatchReport {
        automatic,
        ..CatchReport::default()
    };
    if amount == 0 {
        return report;
    }

    let table = active_candidates(ledger, catalog, stats.luck);
    let (catch_rng, measure_rng, skill_rng) = rng.catch_streams();
    for _ in 0..amount {
        let fish = &catalog.species()[table.pick(catch_rng)];
        let (weight, length) = roll_measurements(fish, measure_rng);
        ledger.stow_fish(&fish.id);
        let update = ledger.record_discovery(catalog, &fish.id, weight, length);
        report.fish.push(CaughtFish {
            species_id: fish.id.clone(),
            weight,
            length,
            first_discovery: update.first_discovery,
            new_record: update.new_weight_record || update.new_length_record,
        });

        if config.skills_enabled {
            award_catch_xp(ledger, fish, &stats, skill_rng, &mut report);
        }
    }
    log::debug!(
        "{} catch at {}: {} fish, {} xp",
        if automatic { "auto" } else { "manual" },
        ledger.active_location(),
        report.count(),
        report.xp_awarded
    );
    report
}

fn award_catch_xp<R: Rng + ?Sized>(
    ledger: &mut Ledger,
    fish: &FishSpecies,
    stats: &DerivedStats,
    skill_rng: &mut R,
    report: &mut CatchReport,
) {
    let xp = bonus::catch_xp(fish.rarity(), stats.patience);
    let Some(skill) = SkillId::ALL.choose(skill_rng).copied() else {
        return;
    };
    let gained = ledger.skills_mut().award(skill, xp);
    report.xp_awarded = report.xp_awarded.saturating_add(xp);
    if gained > 0 {
        let new_level = ledger.skills().level(skill);
        let bonus_pct = ledger.skills().bonus(skill) * 100.0;
        ledger.inbox_mut().deliver(
            MailKind::SkillLevelUp,
            format!("{} reached level {new_level}", capitalize(skill.as_str())),
            format!("Your {skill} skill now grants +{bonus_pct:.0}%."),
        );
        report.level_ups.push(LevelUp { skill, new_level });
    }
}

/// Roll a weight and a length inside the species' configured ranges,
/// rounded to hundredths.
pub(crate) fn roll_measurements<R: Rng + ?Sized>(fish: &FishSpecies, rng: &mut R) -> (f64, f64) {
    (roll_in(fish.weight, rng), roll_in(fish.length, rng))
}

fn roll_in<R: Rng + ?Sized>((min, max): (f64, f64), rng: &mut R) -> f64 {
    let value = if max > min { rng.gen_range(min..=max) } else { min };
    (value * 100.0).round() / 100.0
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
