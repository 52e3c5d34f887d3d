//! Fishing Tycoon Game Engine
//!
//! Platform-agnostic economy core for the Fishing Tycoon idle game.
//! This crate provides catching, progression, offline backfill and
//! persistence without UI or platform-specific dependencies.

pub mod bonus;
pub mod boat;
pub mod catalog;
pub mod catch;
pub mod chance;
pub mod config;
pub mod constants;
pub mod encyclopedia;
pub mod inbox;
pub mod ledger;
pub mod numbers;
pub mod offline;
pub mod prestige;
pub mod rng;
pub mod save;
pub mod scheduler;
pub mod skills;
pub mod upgrades;

// Re-export commonly used types
pub use bonus::{BonusInputs, DerivedStats};
pub use boat::{BoatBonuses, BoatCategory, BoatCustomization, BoatPartDef};
pub use catalog::{Catalog, CatalogError, FishSpecies, LocationDef, Rarity};
pub use catch::{CatchReport, CaughtFish, LevelUp, resolve_catch};
pub use chance::ChanceTable;
pub use config::{ConfigError, GameConfig, OfflineConfig, PhaseConfig, TimerConfig};
pub use encyclopedia::{Encyclopedia, EncyclopediaEntry};
pub use inbox::{Inbox, Mail, MailKind};
pub use ledger::Ledger;
pub use offline::{OfflineReport, apply_offline_progress};
pub use prestige::{
    PrestigeBonuses, PrestigeOutcome, PrestigeRequirements, RequirementKind, RequirementStatus,
};
pub use rng::RngBundle;
pub use save::{MemoryStore, SaveError, SaveSnapshot, SaveStore};
pub use scheduler::{CatchPhase, Scheduler, TaskKind, TimerId};
pub use skills::{SkillBook, SkillId, SkillProgress};
pub use upgrades::{UpgradeId, UpgradeLevels};

use anyhow::Context;
use serde::Serialize;

use crate::scheduler::{CatchAction, FiredTask};

/// Something the presentation layer may want to animate or announce.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A catch action entered a new phase.
    PhaseStarted {
        phase: CatchPhase,
        automatic: bool,
    },
    Caught(CatchReport),
    /// The auto-fish timer fired while an action was in flight.
    AutoFishSkipped,
    AutoSold {
        earned: u64,
    },
    ActionFinished,
}

/// Derived values for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameStats {
    pub money: u64,
    pub fishing_power: f64,
    pub auto_fish_rate: f64,
    pub luck: f64,
    pub action_efficiency: f64,
    pub inventory_total: u64,
    pub inventory_value: u64,
    pub total_fish_caught: u64,
    pub prestige_level: u32,
    pub encyclopedia_completion: f64,
    pub unread_mail: usize,
    pub fishing_phase: Option<CatchPhase>,
}

#[derive(Debug, Clone, Copy)]
struct TimerInputs {
    auto_fish_rate: f64,
    auto_sell: bool,
}

/// Main game engine: owns the ledger, its timers and its storage.
///
/// Every tracked mutation is persisted before the call returns.
pub struct GameEngine<'c, S>
where
    S: SaveStore,
{
    catalog: &'c Catalog,
    config: GameConfig,
    ledger: Ledger,
    rng: RngBundle,
    scheduler: Scheduler,
    storage: S,
    last_offline: OfflineReport,
}

impl<'c, S> GameEngine<'c, S>
where
    S: SaveStore,
{
    /// Load (or start) a game at `now_ms` and credit any offline progress.
    ///
    /// A saved blob that cannot be decoded is logged and replaced by a fresh game.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the store fails.
    pub fn open(
        catalog: &'c Catalog,
        config: GameConfig,
        storage: S,
        seed: u64,
        now_ms: u64,
    ) -> anyhow::Result<Self> {
        config.validate().context("invalid game configuration")?;
        let blob = storage
            .read(&config.storage_key)
            .with_context(|| format!("reading save {:?}", config.storage_key))?;
        let ledger = match blob {
            Some(blob) => save::decode(&blob, catalog).unwrap_or_else(|err| {
                log::warn!("discarding unreadable save {:?}: {err}", config.storage_key);
                Ledger::new(catalog)
            }),
            None => Ledger::new(catalog),
        };
        let mut engine = Self {
            catalog,
            config,
            ledger,
            rng: RngBundle::from_user_seed(seed),
            scheduler: Scheduler::new(now_ms),
            storage,
            last_offline: OfflineReport::default(),
        };
        engine.resume(now_ms).context("writing save")?;
        Ok(engine)
    }

    #[must_use]
    pub const fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    #[must_use]
    pub const fn now(&self) -> u64 {
        self.scheduler.now()
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Report of the most recent offline backfill.
    #[must_use]
    pub const fn last_offline_report(&self) -> OfflineReport {
        self.last_offline
    }

    #[must_use]
    pub fn derived(&self) -> DerivedStats {
        self.ledger.derived(self.catalog, &self.config)
    }

    #[must_use]
    pub fn stats(&self) -> GameStats {
        let derived = self.derived();
        let inventory_value = self
            .ledger
            .inventory()
            .iter()
            .filter_map(|(id, count)| {
                self.catalog
                    .fish(id)
                    .map(|fish| derived.sell_value(fish.value).saturating_mul(*count))
            })
            .sum();
        GameStats {
            money: self.ledger.money(),
            fishing_power: derived.fishing_power,
            auto_fish_rate: derived.auto_fish_rate,
            luck: derived.luck,
            action_efficiency: derived.efficiency,
            inventory_total: self.ledger.inventory_total(),
            inventory_value,
            total_fish_caught: self.ledger.total_fish_caught(),
            prestige_level: self.ledger.prestige_level(),
            encyclopedia_completion: self.ledger.encyclopedia().completion(self.catalog),
            unread_mail: self.ledger.inbox().unread_count(),
            fishing_phase: self.ledger.timers().catch_action.map(|action| action.phase),
        }
    }

    /// Current persisted projection of the ledger.
    #[must_use]
    pub fn snapshot(&self) -> SaveSnapshot {
        SaveSnapshot::capture(&self.ledger, self.catalog, &self.config)
    }

    /// Start a paced manual catch action. Ignored while one is in flight.
    pub fn start_fishing(&mut self) -> bool {
        if self.ledger.timers().is_fishing() {
            log::debug!("cast ignored: already fishing");
            return false;
        }
        self.begin_action(false);
        true
    }

    /// Resolve a manual catch immediately, without phase pacing.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be written.
    pub fn catch_now(&mut self) -> Result<CatchReport, S::Error> {
        let report = self.resolve(false);
        self.persist()?;
        Ok(report)
    }

    /// Advance virtual time to `now_ms`, firing every task due on the way.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be written.
    pub fn tick(&mut self, now_ms: u64) -> Result<Vec<GameEvent>, S::Error> {
        let mut events = Vec::new();
        let mut dirty = false;
        while let Some(fired) = self.scheduler.pop_due(now_ms) {
            dirty |= self.fire(fired, &mut events);
        }
        self.scheduler.advance_to(now_ms);
        if dirty {
            self.persist()?;
        }
        Ok(events)
    }

    /// Sell every held fish of one species.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be written.
    pub fn sell_fish(&mut self, species_id: &str) -> Result<u64, S::Error> {
        let earned = self
            .ledger
            .sell_fish(self.catalog, &self.config, species_id);
        if earned > 0 {
            self.persist()?;
        }
        Ok(earned)
    }

    /// Sell the whole inventory.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be written.
    pub fn sell_all(&mut self) -> Result<u64, S::Error> {
        let earned = self.ledger.sell_all(self.catalog, &self.config);
        if earned > 0 {
            self.persist()?;
        }
        Ok(earned)
    }

    /// Buy the next level of an upgrade.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be written.
    pub fn purchase_upgrade(&mut self, id: UpgradeId) -> Result<bool, S::Error> {
        let inputs = self.timer_inputs();
        let bought = self.ledger.purchase_upgrade(id);
        if bought {
            self.reconcile_timers_since(inputs);
            self.persist()?;
        }
        Ok(bought)
    }

    /// Buy a location.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be written.
    pub fn unlock_location(&mut self, location_id: &str) -> Result<bool, S::Error> {
        let unlocked = self.ledger.unlock_location(self.catalog, location_id);
        if unlocked {
            self.persist()?;
        }
        Ok(unlocked)
    }

    /// Move to another unlocked location, cancelling every outstanding task.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be written.
    pub fn set_active_location(&mut self, location_id: &str) -> Result<bool, S::Error> {
        let changed = self.ledger.set_active_location(location_id);
        if changed {
            self.restart_timers();
            self.persist()?;
        }
        Ok(changed)
    }

    /// Buy (if needed) and select a boat part.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be written.
    pub fn buy_boat_option(&mut self, part_id: &str) -> Result<bool, S::Error> {
        let inputs = self.timer_inputs();
        let changed = self.ledger.buy_boat_option(self.catalog, part_id);
        if changed {
            self.reconcile_timers_since(inputs);
            self.persist()?;
        }
        Ok(changed)
    }

    /// Select an unlocked boat part.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be written.
    pub fn select_boat_option(&mut self, part_id: &str) -> Result<bool, S::Error> {
        let inputs = self.timer_inputs();
        let changed = self.ledger.select_boat_option(self.catalog, part_id);
        if changed {
            self.reconcile_timers_since(inputs);
            self.persist()?;
        }
        Ok(changed)
    }

    /// Toggle periodic auto-selling.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be written.
    pub fn set_auto_sell(&mut self, enabled: bool) -> Result<bool, S::Error> {
        let inputs = self.timer_inputs();
        let changed = self.ledger.set_auto_sell(enabled);
        if changed {
            self.reconcile_timers_since(inputs);
            self.persist()?;
        }
        Ok(changed)
    }

    #[must_use]
    pub fn can_prestige(&self) -> bool {
        self.ledger.can_prestige(self.catalog)
    }

    #[must_use]
    pub fn prestige_requirements(&self) -> Vec<RequirementStatus> {
        self.ledger.prestige_requirements(self.catalog)
    }

    /// Prestige if every requirement is met. Callers confirm with the player first.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be written.
    pub fn perform_prestige(&mut self) -> Result<Option<PrestigeOutcome>, S::Error> {
        let outcome = self.ledger.perform_prestige(self.catalog);
        if outcome.is_some() {
            self.restart_timers();
            self.persist()?;
        }
        Ok(outcome)
    }

    /// Wipe everything back to a new game. Callers confirm with the player first.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be written.
    pub fn reset_progress(&mut self) -> Result<(), S::Error> {
        self.ledger.reset_progress(self.catalog);
        self.restart_timers();
        self.persist()
    }

    /// Return from an absence at `now_ms`: abandon stale tasks, credit
    /// offline progress and re-arm the periodic timers.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be written.
    pub fn resume(&mut self, now_ms: u64) -> Result<OfflineReport, S::Error> {
        self.ledger.timers_mut().cancel_all(&mut self.scheduler);
        self.scheduler.advance_to(now_ms);
        self.last_offline = offline::apply_offline_progress(
            &mut self.ledger,
            self.catalog,
            &self.config,
            &mut self.rng,
            self.scheduler.now(),
        );
        self.reconcile_timers();
        self.persist()?;
        Ok(self.last_offline)
    }

    /// Write the current state.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be written.
    pub fn save(&mut self) -> Result<(), S::Error> {
        self.persist()
    }

    /// Mark one inbox message as read.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be written.
    pub fn mark_mail_read(&mut self, mail_id: u64) -> Result<bool, S::Error> {
        let marked = self.ledger.inbox_mut().mark_read(mail_id);
        if marked {
            self.persist()?;
        }
        Ok(marked)
    }

    /// Handle one fired task. Returns whether the ledger changed.
    fn fire(&mut self, fired: FiredTask, events: &mut Vec<GameEvent>) -> bool {
        match fired.kind {
            TaskKind::AutoFish => {
                if self.ledger.timers().is_fishing() {
                    log::debug!("auto-fish skipped at {}: already fishing", fired.due_ms);
                    events.push(GameEvent::AutoFishSkipped);
                } else {
                    self.begin_action(true);
                    events.push(GameEvent::PhaseStarted {
                        phase: CatchPhase::Casting,
                        automatic: true,
                    });
                }
                false
            }
            TaskKind::AutoSell => {
                let earned = self.ledger.sell_all(self.catalog, &self.config);
                if earned > 0 {
                    log::debug!("auto-sold for {earned} at {}", fired.due_ms);
                    events.push(GameEvent::AutoSold { earned });
                }
                earned > 0
            }
            TaskKind::CatchPhase(phase) => {
                let Some(action) = self.ledger.timers().catch_action else {
                    return false;
                };
                if action.timer != fired.id {
                    return false;
                }
                let mut dirty = false;
                if phase.resolves_catch() {
                    events.push(GameEvent::Caught(self.resolve(action.automatic)));
                    dirty = true;
                }
                if let Some(next) = phase.next() {
                    let delay = self.phase_delay(next);
                    let timer = self
                        .scheduler
                        .schedule_once(delay, TaskKind::CatchPhase(next));
                    self.ledger.timers_mut().catch_action = Some(CatchAction {
                        timer,
                        phase: next,
                        automatic: action.automatic,
                    });
                    events.push(GameEvent::PhaseStarted {
                        phase: next,
                        automatic: action.automatic,
                    });
                } else {
                    self.ledger.timers_mut().catch_action = None;
                    events.push(GameEvent::ActionFinished);
                }
                dirty
            }
        }
    }

    fn begin_action(&mut self, automatic: bool) {
        let phase = CatchPhase::Casting;
        let delay = self.phase_delay(phase);
        let timer = self
            .scheduler
            .schedule_once(delay, TaskKind::CatchPhase(phase));
        self.ledger.timers_mut().catch_action = Some(CatchAction {
            timer,
            phase,
            automatic,
        });
    }

    fn phase_delay(&self, phase: CatchPhase) -> u64 {
        let phases = &self.config.phases;
        let base = match phase {
            CatchPhase::Casting => phases.cast_ms,
            CatchPhase::Splashing => phases.splash_ms,
            CatchPhase::Reeling => phases.reel_ms,
            CatchPhase::Settling => phases.settle_ms,
        };
        bonus::effective_action_delay(base, self.derived().efficiency)
    }

    /// Resolve a catch and re-arm timers if a level-up moved the auto-fish rate.
    fn resolve(&mut self, automatic: bool) -> CatchReport {
        let inputs = self.timer_inputs();
        let report = catch::resolve_catch(
            &mut self.ledger,
            self.catalog,
            &self.config,
            &mut self.rng,
            automatic,
        );
        self.reconcile_timers_since(inputs);
        report
    }

    /// The values the periodic timers are armed from.
    fn timer_inputs(&self) -> TimerInputs {
        TimerInputs {
            auto_fish_rate: self.derived().auto_fish_rate,
            auto_sell: self.ledger.auto_sell(),
        }
    }

    /// Re-arm only the periodic timers whose inputs moved since `before`.
    /// Untouched timers keep their phase.
    fn reconcile_timers_since(&mut self, before: TimerInputs) {
        let after = self.timer_inputs();
        if (after.auto_fish_rate - before.auto_fish_rate).abs() > f64::EPSILON {
            scheduler::rearm_auto_fish(
                self.ledger.timers_mut(),
                &mut self.scheduler,
                after.auto_fish_rate,
                &self.config.timers,
            );
        }
        if after.auto_sell != before.auto_sell {
            scheduler::rearm_auto_sell(
                self.ledger.timers_mut(),
                &mut self.scheduler,
                after.auto_sell,
                &self.config.timers,
            );
        }
    }

    fn reconcile_timers(&mut self) {
        let rate = self.derived().auto_fish_rate;
        let auto_sell = self.ledger.auto_sell();
        scheduler::reconcile_timers(
            self.ledger.timers_mut(),
            &mut self.scheduler,
            rate,
            auto_sell,
            &self.config.timers,
        );
    }

    /// Cancel every outstanding task, including an in-flight catch action,
    /// then re-arm the periodic timers for the new state.
    fn restart_timers(&mut self) {
        self.ledger.timers_mut().cancel_all(&mut self.scheduler);
        self.reconcile_timers();
    }

    /// Write the save. The last-online stamp never moves backwards.
    fn persist(&mut self) -> Result<(), S::Error> {
        let stamp = self.ledger.last_online_ms().max(self.scheduler.now());
        self.ledger.set_last_online(stamp);
        match save::encode(&self.ledger, self.catalog, &self.config) {
            Ok(blob) => self.storage.write(&self.config.storage_key, &blob),
            Err(err) => {
                log::error!("could not encode save: {err}");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: u64 = 1_700_000_000_000;

    fn engine(store: MemoryStore) -> GameEngine<'static, MemoryStore> {
        GameEngine::open(Catalog::bundled(), GameConfig::default(), store, 0xF15A, START).unwrap()
    }

    #[test]
    fn opening_an_empty_store_writes_a_fresh_save() {
        let store = MemoryStore::new();
        let engine = engine(store.clone());
        assert_eq!(engine.ledger(), &{
            let mut fresh = Ledger::new(Catalog::bundled());
            fresh.set_last_online(START);
            fresh
        });
        assert!(store.get("fishingTycoonSave").is_some());
    }

    #[test]
    fn corrupt_save_falls_back_to_fresh_state() {
        let store = MemoryStore::new();
        store.put("fishingTycoonSave", "{ definitely not json");
        let engine = engine(store.clone());
        assert_eq!(engine.ledger().money(), 0);
        let rewritten = store.get("fishingTycoonSave").unwrap();
        assert!(save::decode(&rewritten, Catalog::bundled()).is_ok());
    }

    #[test]
    fn invalid_config_is_an_error() {
        let mut config = GameConfig::default();
        config.timers.auto_fish_interval_ms = 0;
        let result = GameEngine::open(Catalog::bundled(), config, MemoryStore::new(), 1, START);
        assert!(result.is_err());
    }

    #[test]
    fn paced_catch_runs_every_phase() {
        let mut engine = engine(MemoryStore::new());
        assert!(engine.start_fishing());
        assert!(!engine.start_fishing());
        assert_eq!(engine.stats().fishing_phase, Some(CatchPhase::Casting));

        let events = engine.tick(START + 1_000).unwrap();
        assert_eq!(
            events,
            vec![GameEvent::PhaseStarted {
                phase: CatchPhase::Splashing,
                automatic: false
            }]
        );
        assert_eq!(engine.ledger().total_fish_caught(), 0);

        let events = engine.tick(START + 2_500).unwrap();
        assert!(matches!(events[0], GameEvent::Caught(ref report) if report.count() == 1));
        assert_eq!(events.last(), Some(&GameEvent::ActionFinished));
        assert_eq!(engine.ledger().total_fish_caught(), 1);
        assert!(engine.start_fishing());
    }

    #[test]
    fn auto_fishing_fires_on_its_interval() {
        let mut engine = engine(MemoryStore::new());
        while engine.ledger().money() < 200 {
            engine.catch_now().unwrap();
            engine.sell_all().unwrap();
        }
        assert!(engine.purchase_upgrade(UpgradeId::Auto).unwrap());
        let caught_before = engine.ledger().total_fish_caught();
        let now = engine.now();
        engine.tick(now + 120_000).unwrap();
        assert!(engine.ledger().total_fish_caught() >= caught_before + 10);
    }

    #[test]
    fn changing_location_cancels_the_action_in_flight() {
        let mut engine = engine(MemoryStore::new());
        while engine.ledger().money() < 500 {
            engine.catch_now().unwrap();
            engine.sell_all().unwrap();
        }
        assert!(engine.unlock_location("lake").unwrap());
        assert!(engine.start_fishing());
        assert!(engine.set_active_location("lake").unwrap());
        assert_eq!(engine.stats().fishing_phase, None);
        let caught = engine.ledger().total_fish_caught();
        let now = engine.now();
        engine.tick(now + 10_000).unwrap();
        assert_eq!(engine.ledger().total_fish_caught(), caught);
    }

    #[test]
    fn auto_sell_empties_inventory() {
        let mut engine = engine(MemoryStore::new());
        engine.catch_now().unwrap();
        assert!(engine.set_auto_sell(true).unwrap());
        assert!(!engine.set_auto_sell(true).unwrap());
        let now = engine.now();
        let events = engine.tick(now + 10_000).unwrap();
        assert!(events.iter().any(|event| matches!(event, GameEvent::AutoSold { .. })));
        assert_eq!(engine.ledger().inventory_total(), 0);
    }

    #[test]
    fn upgrades_that_keep_the_rate_leave_auto_fishing_in_phase() {
        let store = MemoryStore::new();
        store.put(
            "fishingTycoonSave",
            r#"{"money":100000000,"upgrades":[{"id":"auto","level":1}]}"#,
        );
        let mut engine = engine(store);
        let mut now = START;
        for _ in 0..20 {
            now += 4_000;
            engine.tick(now).unwrap();
            assert!(engine.purchase_upgrade(UpgradeId::Rod).unwrap());
        }
        assert!(engine.ledger().total_fish_caught() >= 10);
        assert_eq!(engine.ledger().upgrades().level(UpgradeId::Rod), 20);
    }

    #[test]
    fn toggling_auto_sell_keeps_the_auto_fish_timer() {
        let store = MemoryStore::new();
        store.put(
            "fishingTycoonSave",
            r#"{"upgrades":[{"id":"auto","level":1}]}"#,
        );
        let mut engine = engine(store);
        let auto_fish = engine.ledger().timers().auto_fish;
        assert!(auto_fish.is_some());
        engine.tick(START + 3_000).unwrap();
        assert!(engine.set_auto_sell(true).unwrap());
        assert_eq!(engine.ledger().timers().auto_fish, auto_fish);
        engine.tick(START + 5_000).unwrap();
        assert_eq!(engine.stats().fishing_phase, Some(CatchPhase::Casting));
    }

    #[test]
    fn saving_never_moves_last_online_backwards() {
        let later = START + 3_600_000;
        let store = MemoryStore::new();
        store.put("fishingTycoonSave", format!(r#"{{"lastOnlineTime":{later}}}"#));
        let mut engine = engine(store.clone());
        assert_eq!(engine.ledger().last_online_ms(), later);
        engine.catch_now().unwrap();
        let saved = save::decode(&store.get("fishingTycoonSave").unwrap(), Catalog::bundled())
            .unwrap();
        assert_eq!(saved.last_online_ms(), later);
    }

    #[test]
    fn mail_can_be_marked_read() {
        let mut engine = engine(MemoryStore::new());
        engine.catch_now().unwrap();
        let unread = engine.stats().unread_mail;
        assert!(unread >= 1);
        let id = engine.ledger().inbox().messages().next().unwrap().id;
        assert!(engine.mark_mail_read(id).unwrap());
        assert!(!engine.mark_mail_read(id).unwrap());
        assert_eq!(engine.stats().unread_mail, unread - 1);
    }
}
