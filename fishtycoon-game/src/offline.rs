//! Offline backfill: bulk auto-fishing for the time the player was away.
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::catch::{active_candidates, roll_measurements};
use crate::config::GameConfig;
use crate::constants::{MS_PER_HOUR, SECONDS_PER_HOUR};
use crate::inbox::MailKind;
use crate::ledger::Ledger;
use crate::numbers::{floor_f64_to_u64, u64_to_f64};
use crate::rng::RngBundle;

/// What an absence was worth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OfflineReport {
    /// Absence credited after clamping, in milliseconds.
    pub elapsed_ms: u64,
    /// Fish caught while away, kept or auto-sold.
    pub fish_gained: u64,
    /// Catches sold at base value because the inventory cap was reached.
    pub fish_auto_sold: u64,
    pub money_gained: u64,
}

impl OfflineReport {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fish_gained == 0 && self.money_gained == 0
    }
}

/// Number of catches an absence of `elapsed_ms` is worth at `auto_fish_rate`,
/// after clamping to the configured maximum.
#[must_use]
pub fn offline_catches(config: &GameConfig, auto_fish_rate: f64, elapsed_ms: u64) -> u64 {
    let hours = (u64_to_f64(elapsed_ms) / MS_PER_HOUR).min(config.offline.max_hours);
    floor_f64_to_u64(auto_fish_rate * config.offline.efficiency_rate * hours * SECONDS_PER_HOUR)
}

/// Credit auto-fishing for the time since the ledger was last online, then
/// mark it online at `now_ms`.
///
/// The timestamp moves before anything is credited, so replaying the same
/// window yields nothing. No-op when the feature is disabled, the auto-fish
/// rate is zero or the absence is shorter than the configured minimum.
/// Offline catches update the encyclopedia but grant no skill XP; once a
/// species' held count reaches the inventory cap, further catches of it sell
/// at base value.
///
/// # Panics
///
/// Panics if the active location has no species, which a validated catalog rules out.
pub fn apply_offline_progress(
    ledger: &mut Ledger,
    catalog: &Catalog,
    config: &GameConfig,
    rng: &mut RngBundle,
    now_ms: u64,
) -> OfflineReport {
    let last_online = ledger.last_online_ms();
    ledger.set_last_online(now_ms.max(last_online));
    let elapsed_ms = if last_online == 0 {
        0
    } else {
        now_ms.saturating_sub(last_online)
    };

    let stats = ledger.derived(catalog, config);
    if !config.offline.enabled
        || stats.auto_fish_rate <= 0.0
        || elapsed_ms < config.offline.min_elapsed_ms
    {
        return OfflineReport::default();
    }

    let max_ms = floor_f64_to_u64(config.offline.max_hours * MS_PER_HOUR);
    let credited_ms = elapsed_ms.min(max_ms);
    let catches = offline_catches(config, stats.auto_fish_rate, credited_ms);
    let cap = config
        .offline
        .inventory_cap
        .saturating_add(stats.storage_bonus);
    let table = active_candidates(ledger, catalog, stats.luck);
    let (species_rng, measure_rng) = rng.offline_streams();

    let mut report = OfflineReport {
        elapsed_ms: credited_ms,
        ..OfflineReport::default()
    };
    for _ in 0..catches {
        let fish = &catalog.species()[table.pick(species_rng)];
        let (weight, length) = roll_measurements(fish, measure_rng);
        if ledger.held(&fish.id) >= cap {
            ledger.count_sold_catch(fish.value);
            report.fish_auto_sold += 1;
            report.money_gained = report.money_gained.saturating_add(fish.value);
        } else {
            ledger.stow_fish(&fish.id);
        }
        ledger.record_discovery(catalog, &fish.id, weight, length);
        report.fish_gained += 1;
    }

    if !report.is_empty() {
        let hours = u64_to_f64(credited_ms) / MS_PER_HOUR;
        ledger.inbox_mut().deliver(
            MailKind::OfflineReport,
            "While you were away",
            format!(
                "In {hours:.1} h your crew caught {} fish and sold {} for {} coins.",
                report.fish_gained, report.fish_auto_sold, report.money_gained
            ),
        );
        log::info!(
            "offline backfill: {} ms credited, {} fish, {} coins",
            credited_ms,
            report.fish_gained,
            report.money_gained
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upgrades::UpgradeId;

    const HOUR_MS: u64 = 3_600_000;

    fn auto_fisher() -> (&'static Catalog, GameConfig, Ledger, RngBundle) {
        let catalog = Catalog::bundled();
        let config = GameConfig {
            skills_enabled: false,
            ..GameConfig::default()
        };
        let mut ledger = Ledger::new(catalog);
        ledger.credit(200);
        assert!(ledger.purchase_upgrade(UpgradeId::Auto));
        ledger.set_last_online(1_000);
        (catalog, config, ledger, RngBundle::from_user_seed(3))
    }

    #[test]
    fn zero_rate_is_a_noop() {
        let catalog = Catalog::bundled();
        let config = GameConfig::default();
        let mut ledger = Ledger::new(catalog);
        ledger.set_last_online(1_000);
        let mut rng = RngBundle::from_user_seed(1);
        let before = ledger.clone();
        for elapsed in [0, 60_000, HOUR_MS, 100 * HOUR_MS] {
            let report = apply_offline_progress(&mut ledger, catalog, &config, &mut rng, 1_000 + elapsed);
            assert!(report.is_empty());
        }
        assert_eq!(ledger.inventory(), before.inventory());
        assert_eq!(ledger.money(), before.money());
    }

    #[test]
    fn catches_follow_rate_and_derate() {
        let (catalog, config, mut ledger, mut rng) = auto_fisher();
        let report = apply_offline_progress(&mut ledger, catalog, &config, &mut rng, 1_000 + HOUR_MS);
        // 0.2 × 0.8 × 1 h × 3600
        assert_eq!(report.fish_gained, 576);
        assert_eq!(ledger.total_fish_caught(), 576);
        assert_eq!(ledger.inventory_total(), 576);
        assert!(ledger.encyclopedia_unlocked());
    }

    #[test]
    fn replaying_the_same_window_yields_nothing() {
        let (catalog, config, mut ledger, mut rng) = auto_fisher();
        let now = 1_000 + 2 * HOUR_MS;
        let first = apply_offline_progress(&mut ledger, catalog, &config, &mut rng, now);
        assert!(first.fish_gained > 0);
        let snapshot = ledger.clone();
        let second = apply_offline_progress(&mut ledger, catalog, &config, &mut rng, now);
        assert!(second.is_empty());
        assert_eq!(ledger, snapshot);
    }

    #[test]
    fn short_absences_and_fresh_games_are_ignored() {
        let (catalog, config, mut ledger, mut rng) = auto_fisher();
        let report = apply_offline_progress(&mut ledger, catalog, &config, &mut rng, 1_000 + 59_999);
        assert!(report.is_empty());

        let mut fresh = Ledger::new(catalog);
        fresh.credit(200);
        assert!(fresh.purchase_upgrade(UpgradeId::Auto));
        let report = apply_offline_progress(&mut fresh, catalog, &config, &mut rng, 50 * HOUR_MS);
        assert!(report.is_empty());
        assert_eq!(fresh.last_online_ms(), 50 * HOUR_MS);
    }

    #[test]
    fn long_absences_are_clamped_and_capped() {
        let (catalog, mut config, mut ledger, mut rng) = auto_fisher();
        config.offline.inventory_cap = 10;
        let report = apply_offline_progress(&mut ledger, catalog, &config, &mut rng, 1_000 + 48 * HOUR_MS);
        assert_eq!(report.elapsed_ms, 12 * HOUR_MS);
        assert_eq!(report.fish_gained, offline_catches(&config, 0.2, 12 * HOUR_MS));
        assert!(report.fish_auto_sold > 0);
        assert!(ledger.inventory().values().all(|held| *held <= 10));
        assert_eq!(ledger.money(), report.money_gained);
        assert_eq!(
            ledger.inventory_total() + report.fish_auto_sold,
            report.fish_gained
        );
    }

    #[test]
    fn disabled_feature_is_a_noop() {
        let (catalog, mut config, mut ledger, mut rng) = auto_fisher();
        config.offline.enabled = false;
        let report = apply_offline_progress(&mut ledger, catalog, &config, &mut rng, 1_000 + HOUR_MS);
        assert!(report.is_empty());
    }
}
