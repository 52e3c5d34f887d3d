use anyhow::{Context, Result};
use fishtycoon_game::{
    BoatCategory, Catalog, GameConfig, GameEngine, GameEvent, GameStats, MemoryStore,
    OfflineReport, SaveStore, UpgradeId,
};
use std::collections::BTreeMap;
use std::fmt;

/// Wall-clock origin for every simulated session.
pub const SESSION_START_MS: u64 = 1_760_000_000_000;
const MINUTE_MS: u64 = 60_000;

pub type Expectation = fn(&SimulationSummary) -> Result<()>;

/// Built-in play strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayStrategy {
    /// Casts whenever idle, sells in bulk and only ever buys the auto-fisher.
    Idle,
    /// Casts and sells every tick, buys the cheapest affordable thing.
    Greedy,
    /// Greedy with instant catches, prestiges as soon as it can.
    Prestige,
}

impl PlayStrategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Greedy => "Greedy",
            Self::Prestige => "Prestige",
        }
    }
}

impl fmt::Display for PlayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a scenario plays and how the run is checked.
#[derive(Clone)]
pub struct SimulationPlan {
    pub strategy: PlayStrategy,
    pub minutes: u64,
    pub tick_ms: u64,
    /// Reopen the save this often and compare it with the live engine.
    pub reload_every_minutes: Option<u64>,
    /// Leave for this long at the end, come back, then come back again.
    pub offline_gap_ms: Option<u64>,
    pub stop_after_prestige: bool,
    pub expectations: Vec<Expectation>,
}

impl SimulationPlan {
    #[must_use]
    pub fn new(strategy: PlayStrategy, minutes: u64) -> Self {
        Self {
            strategy,
            minutes,
            tick_ms: 1_000,
            reload_every_minutes: None,
            offline_gap_ms: None,
            stop_after_prestige: false,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_reload_every(mut self, minutes: u64) -> Self {
        self.reload_every_minutes = Some(minutes);
        self
    }

    #[must_use]
    pub const fn with_offline_gap(mut self, gap_ms: u64) -> Self {
        self.offline_gap_ms = Some(gap_ms);
        self
    }

    #[must_use]
    pub const fn stopping_after_prestige(mut self) -> Self {
        self.stop_after_prestige = true;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }
}

impl fmt::Debug for SimulationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationPlan")
            .field("strategy", &self.strategy)
            .field("minutes", &self.minutes)
            .field("tick_ms", &self.tick_ms)
            .field("reload_every_minutes", &self.reload_every_minutes)
            .field("offline_gap_ms", &self.offline_gap_ms)
            .field("stop_after_prestige", &self.stop_after_prestige)
            .field("expectations", &self.expectations.len())
            .finish()
    }
}

/// Everything a run observed, handed to the plan's expectations.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub strategy: PlayStrategy,
    pub elapsed_ms: u64,
    pub ticks: u64,
    pub catches: u64,
    pub money_earned: u64,
    pub upgrades_bought: u32,
    pub locations_unlocked: u32,
    pub prestiges: u32,
    pub reloads: u32,
    pub violations: Vec<String>,
    pub offline: Option<OfflineReport>,
    pub offline_replay: Option<OfflineReport>,
    pub auto_rate_before_leaving: f64,
    pub final_stats: GameStats,
}

impl SimulationSummary {
    #[must_use]
    pub fn headline(&self) -> String {
        format!(
            "{} min, {} catches, ${} earned, {} upgrades, prestige {}",
            self.elapsed_ms / MINUTE_MS,
            self.catches,
            self.money_earned,
            self.upgrades_bought,
            self.final_stats.prestige_level
        )
    }
}

type Engine = GameEngine<'static, MemoryStore>;

/// Drives a [`GameEngine`] over an in-memory store in virtual time.
pub struct SimulationSession {
    catalog: &'static Catalog,
    config: GameConfig,
    store: MemoryStore,
    engine: Engine,
    plan: SimulationPlan,
    discovered: BTreeMap<String, bool>,
    last_caught: u64,
    summary: SimulationSummary,
}

impl SimulationSession {
    /// Open a fresh game for `plan` seeded with `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot be opened.
    pub fn new(plan: SimulationPlan, seed: u64) -> Result<Self> {
        let catalog = Catalog::bundled();
        let config = GameConfig::default();
        let store = MemoryStore::new();
        let engine = GameEngine::open(catalog, config.clone(), store.clone(), seed, SESSION_START_MS)
            .context("opening simulated game")?;
        let final_stats = engine.stats();
        Ok(Self {
            catalog,
            config,
            store,
            engine,
            summary: SimulationSummary {
                seed,
                strategy: plan.strategy,
                elapsed_ms: 0,
                ticks: 0,
                catches: 0,
                money_earned: 0,
                upgrades_bought: 0,
                locations_unlocked: 0,
                prestiges: 0,
                reloads: 0,
                violations: Vec::new(),
                offline: None,
                offline_replay: None,
                auto_rate_before_leaving: 0.0,
                final_stats,
            },
            plan,
            discovered: BTreeMap::new(),
            last_caught: 0,
        })
    }

    /// Play the whole plan and return what was observed.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine or its store fails.
    pub fn run(mut self) -> Result<SimulationSummary> {
        let end = SESSION_START_MS + self.plan.minutes * MINUTE_MS;
        let reload_ms = self.plan.reload_every_minutes.map(|m| m.max(1) * MINUTE_MS);
        let mut next_reload = reload_ms.map(|every| SESSION_START_MS + every);
        let mut now = SESSION_START_MS;

        while now < end {
            now = (now + self.plan.tick_ms).min(end);
            let events = self.engine.tick(now)?;
            self.observe_events(&events);
            self.play_step()?;
            self.summary.ticks += 1;
            self.check_invariants();

            if let (Some(due), Some(every)) = (next_reload, reload_ms)
                && now >= due
            {
                self.reload(now)?;
                next_reload = Some(due + every);
            }
            if self.plan.stop_after_prestige && self.summary.prestiges > 0 {
                break;
            }
        }
        self.summary.elapsed_ms = now - SESSION_START_MS;

        if let Some(gap) = self.plan.offline_gap_ms {
            self.leave_and_return(now, gap)?;
        }
        self.summary.final_stats = self.engine.stats();
        Ok(self.summary)
    }

    fn observe_events(&mut self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::Caught(report) => self.summary.catches += report.count() as u64,
                GameEvent::AutoSold { earned } => self.summary.money_earned += earned,
                GameEvent::PhaseStarted { .. }
                | GameEvent::AutoFishSkipped
                | GameEvent::ActionFinished => {}
            }
        }
    }

    fn play_step(&mut self) -> Result<()> {
        match self.plan.strategy {
            PlayStrategy::Idle => {
                self.engine.start_fishing();
                if self.engine.ledger().inventory_total() >= 25 {
                    self.summary.money_earned += self.engine.sell_all()?;
                }
                self.buy(UpgradeId::Auto)?;
                if self.engine.ledger().upgrades().level(UpgradeId::Auto) > 0
                    && self.engine.set_auto_sell(true)?
                {
                    log::debug!("idle player switched auto-sell on");
                }
            }
            PlayStrategy::Greedy => {
                self.engine.start_fishing();
                self.summary.money_earned += self.engine.sell_all()?;
                self.spend_greedily()?;
            }
            PlayStrategy::Prestige => {
                let report = self.engine.catch_now()?;
                self.summary.catches += report.count() as u64;
                self.summary.money_earned += self.engine.sell_all()?;
                if self.engine.can_prestige() {
                    if let Some(outcome) = self.engine.perform_prestige()? {
                        log::info!("seed {} prestiged to {}", self.summary.seed, outcome.new_level);
                        self.summary.prestiges += 1;
                    }
                } else {
                    self.spend_greedily()?;
                }
            }
        }
        Ok(())
    }

    fn buy(&mut self, id: UpgradeId) -> Result<bool> {
        let Some(cost) = self.engine.ledger().upgrades().next_cost(id) else {
            return Ok(false);
        };
        let money = self.engine.ledger().money();
        if cost > money || !self.engine.purchase_upgrade(id)? {
            return Ok(false);
        }
        if self.engine.ledger().money() != money - cost {
            self.summary.violations.push(format!(
                "buying {id} for {cost} left {} of {money}",
                self.engine.ledger().money()
            ));
        }
        self.summary.upgrades_bought += 1;
        Ok(true)
    }

    fn spend_greedily(&mut self) -> Result<()> {
        let next_location = self
            .catalog
            .locations()
            .iter()
            .find(|location| !self.engine.ledger().is_location_unlocked(&location.id))
            .map(|location| location.id.clone());
        if let Some(id) = next_location
            && self.engine.unlock_location(&id)?
        {
            self.summary.locations_unlocked += 1;
        }

        let mut upgrades: Vec<(u64, UpgradeId)> = UpgradeId::ALL
            .iter()
            .filter_map(|id| {
                self.engine
                    .ledger()
                    .upgrades()
                    .next_cost(*id)
                    .map(|cost| (cost, *id))
            })
            .collect();
        upgrades.sort_unstable();
        for (cost, id) in upgrades {
            if cost <= self.engine.ledger().money() / 3 {
                self.buy(id)?;
            }
        }

        for category in BoatCategory::ALL {
            let part = self
                .catalog
                .boat_parts()
                .iter()
                .filter(|part| part.category == category)
                .filter(|part| !self.engine.ledger().boat().is_unlocked(&part.id))
                .min_by_key(|part| part.price)
                .map(|part| (part.id.clone(), part.price));
            if let Some((id, price)) = part
                && price <= self.engine.ledger().money() / 5
                && self.engine.buy_boat_option(&id)?
            {
                self.engine.select_boat_option(&id)?;
            }
        }

        let target = self.fishing_target();
        if let Some(id) = target {
            self.engine.set_active_location(&id)?;
        }
        Ok(())
    }

    /// First unlocked location that still hides an undiscovered species, else the last unlocked.
    fn fishing_target(&self) -> Option<String> {
        let ledger = self.engine.ledger();
        let unlocked = || {
            self.catalog
                .locations()
                .iter()
                .filter(|location| ledger.is_location_unlocked(&location.id))
        };
        unlocked()
            .find(|location| {
                self.catalog.species_at(&location.id).any(|fish| {
                    !ledger
                        .encyclopedia()
                        .entry(&fish.id)
                        .is_some_and(|entry| entry.discovered)
                })
            })
            .or_else(|| unlocked().last())
            .map(|location| location.id.clone())
    }

    fn check_invariants(&mut self) {
        let ledger = self.engine.ledger();
        if let Some((id, _)) = ledger.inventory().iter().find(|(_, count)| **count == 0) {
            self.summary
                .violations
                .push(format!("empty inventory entry kept for {id}"));
        }
        if ledger.total_fish_caught() < self.last_caught {
            self.summary.violations.push(format!(
                "catch counter went back from {} to {}",
                self.last_caught,
                ledger.total_fish_caught()
            ));
        }
        self.last_caught = ledger.total_fish_caught();
        for (id, entry) in ledger.encyclopedia().iter() {
            let was = self.discovered.insert(id.to_string(), entry.discovered);
            if was == Some(true) && !entry.discovered {
                self.summary
                    .violations
                    .push(format!("encyclopedia forgot {id}"));
            }
        }
    }

    fn reopen(&self, seed: u64, now_ms: u64) -> Result<Engine> {
        GameEngine::open(
            self.catalog,
            self.config.clone(),
            self.store.clone(),
            seed,
            now_ms,
        )
        .context("reopening simulated game")
    }

    fn reload(&mut self, now_ms: u64) -> Result<()> {
        self.engine.save()?;
        let before = self.engine.snapshot();
        let stats = self.engine.stats();
        let reloads = u64::from(self.summary.reloads);
        let reopened = self.reopen(self.summary.seed.wrapping_add(reloads + 1), now_ms)?;

        if !reopened.last_offline_report().is_empty() {
            self.summary
                .violations
                .push(format!("reload at {now_ms} credited offline progress"));
        }
        if reopened.snapshot() != before {
            self.summary
                .violations
                .push(format!("reload at {now_ms} changed the save"));
        }
        let after = reopened.stats();
        if after.fishing_power != stats.fishing_power
            || after.auto_fish_rate != stats.auto_fish_rate
            || after.luck != stats.luck
        {
            self.summary.violations.push(format!(
                "reload at {now_ms} changed derived stats: {stats:?} vs {after:?}"
            ));
        }
        self.engine = reopened;
        self.summary.reloads += 1;
        Ok(())
    }

    fn leave_and_return(&mut self, now_ms: u64, gap_ms: u64) -> Result<()> {
        self.summary.auto_rate_before_leaving = self.engine.stats().auto_fish_rate;
        self.engine.save()?;
        let back = now_ms + gap_ms;
        if self.store.read(&self.config.storage_key)?.is_none() {
            self.summary
                .violations
                .push("no save written before leaving".to_string());
        }

        let returned = self.reopen(self.summary.seed ^ 0x0FF1, back)?;
        let report = returned.last_offline_report();
        self.summary.catches += report.fish_gained;
        self.summary.money_earned += report.money_gained;
        self.summary.offline = Some(report);
        drop(returned);

        self.engine = self.reopen(self.summary.seed ^ 0x0FF2, back)?;
        self.summary.offline_replay = Some(self.engine.last_offline_report());
        self.summary.elapsed_ms = back - SESSION_START_MS;
        Ok(())
    }
}

/// Run one plan to completion for `seed`.
///
/// # Errors
///
/// Returns an error if the engine or its store fails.
pub fn run_plan(plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
    SimulationSession::new(plan.clone(), seed)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greedy_minutes_make_progress_without_violations() {
        let summary = run_plan(&SimulationPlan::new(PlayStrategy::Greedy, 5), 7).unwrap();
        assert!(summary.catches > 0);
        assert!(summary.money_earned > 0);
        assert!(summary.violations.is_empty(), "{:?}", summary.violations);
        assert_eq!(summary.elapsed_ms, 5 * MINUTE_MS);
        assert_eq!(summary.ticks, 300);
    }

    #[test]
    fn reloads_are_counted_and_clean() {
        let plan = SimulationPlan::new(PlayStrategy::Greedy, 6).with_reload_every(2);
        let summary = run_plan(&plan, 3).unwrap();
        assert_eq!(summary.reloads, 3);
        assert!(summary.violations.is_empty(), "{:?}", summary.violations);
    }

    #[test]
    fn offline_gap_replays_nothing() {
        let plan = SimulationPlan::new(PlayStrategy::Idle, 3).with_offline_gap(2 * 3_600_000);
        let summary = run_plan(&plan, 11).unwrap();
        assert!(summary.offline.is_some());
        assert!(summary.offline_replay.is_some_and(|report| report.is_empty()));
        assert_eq!(summary.elapsed_ms, 3 * MINUTE_MS + 2 * 3_600_000);
    }

    #[test]
    fn same_seed_same_headline() {
        let plan = SimulationPlan::new(PlayStrategy::Greedy, 2);
        let a = run_plan(&plan, 99).unwrap();
        let b = run_plan(&plan, 99).unwrap();
        assert_eq!(a.headline(), b.headline());
        assert_eq!(a.final_stats, b.final_stats);
    }

    #[test]
    fn plan_debug_counts_expectations() {
        let plan = SimulationPlan::new(PlayStrategy::Idle, 1).with_expectation(|_| Ok(()));
        assert!(format!("{plan:?}").contains("expectations: 1"));
    }
}
