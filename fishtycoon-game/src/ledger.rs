//! Progression ledger: the single owner of every mutable piece of game state.
//!
//! Mutators validate before they touch anything. Business-rule failures
//! (insufficient funds, locked or unknown ids) leave the ledger unchanged and
//! report `false` or `0` instead of an error.
use std::collections::{BTreeMap, BTreeSet};

use crate::boat::{BoatBonuses, BoatCustomization};
use crate::bonus::{BonusInputs, DerivedStats};
use crate::catalog::Catalog;
use crate::config::GameConfig;
use crate::constants::PRESTIGE_SKILL_LEVEL_BONUS;
use crate::encyclopedia::{Encyclopedia, RecordUpdate};
use crate::inbox::{Inbox, MailKind};
use crate::prestige::{
    PrestigeBonuses, PrestigeOutcome, PrestigeProgress, PrestigeRequirements,
    RequirementStatus,
};
use crate::scheduler::TimerHandles;
use crate::skills::SkillBook;
use crate::upgrades::{UpgradeId, UpgradeLevels};

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    pub(crate) money: u64,
    pub(crate) inventory: BTreeMap<String, u64>,
    pub(crate) total_fish_caught: u64,
    pub(crate) upgrades: UpgradeLevels,
    pub(crate) unlocked_locations: BTreeSet<String>,
    pub(crate) active_location: String,
    pub(crate) boat: BoatCustomization,
    pub(crate) encyclopedia: Encyclopedia,
    pub(crate) encyclopedia_unlocked: bool,
    pub(crate) last_online_ms: u64,
    pub(crate) prestige_level: u32,
    pub(crate) skills: SkillBook,
    pub(crate) inbox: Inbox,
    pub(crate) auto_sell: bool,
    pub(crate) timers: TimerHandles,
}

impl Ledger {
    /// Fresh initial state.
    #[must_use]
    pub fn new(catalog: &Catalog) -> Self {
        let starting = catalog.starting_location();
        Self {
            money: 0,
            inventory: BTreeMap::new(),
            total_fish_caught: 0,
            upgrades: UpgradeLevels::default(),
            unlocked_locations: catalog
                .locations()
                .iter()
                .filter(|location| location.starts_unlocked())
                .map(|location| location.id.clone())
                .collect(),
            active_location: starting.id.clone(),
            boat: BoatCustomization::new(catalog),
            encyclopedia: Encyclopedia::new(catalog),
            encyclopedia_unlocked: false,
            last_online_ms: 0,
            prestige_level: 0,
            skills: SkillBook::default(),
            inbox: Inbox::default(),
            auto_sell: false,
            timers: TimerHandles::default(),
        }
    }

    #[must_use]
    pub const fn money(&self) -> u64 {
        self.money
    }

    #[must_use]
    pub fn inventory(&self) -> &BTreeMap<String, u64> {
        &self.inventory
    }

    /// Held count of one species.
    #[must_use]
    pub fn held(&self, species_id: &str) -> u64 {
        self.inventory.get(species_id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn inventory_total(&self) -> u64 {
        self.inventory.values().sum()
    }

    #[must_use]
    pub const fn total_fish_caught(&self) -> u64 {
        self.total_fish_caught
    }

    #[must_use]
    pub const fn upgrades(&self) -> &UpgradeLevels {
        &self.upgrades
    }

    #[must_use]
    pub fn is_location_unlocked(&self, location_id: &str) -> bool {
        self.unlocked_locations.contains(location_id)
    }

    pub fn unlocked_locations(&self) -> impl Iterator<Item = &str> {
        self.unlocked_locations.iter().map(String::as_str)
    }

    #[must_use]
    pub fn active_location(&self) -> &str {
        &self.active_location
    }

    #[must_use]
    pub const fn boat(&self) -> &BoatCustomization {
        &self.boat
    }

    #[must_use]
    pub const fn encyclopedia(&self) -> &Encyclopedia {
        &self.encyclopedia
    }

    #[must_use]
    pub const fn encyclopedia_unlocked(&self) -> bool {
        self.encyclopedia_unlocked
    }

    #[must_use]
    pub const fn last_online_ms(&self) -> u64 {
        self.last_online_ms
    }

    #[must_use]
    pub const fn prestige_level(&self) -> u32 {
        self.prestige_level
    }

    #[must_use]
    pub const fn skills(&self) -> &SkillBook {
        &self.skills
    }

    #[must_use]
    pub const fn inbox(&self) -> &Inbox {
        &self.inbox
    }

    #[must_use]
    pub const fn auto_sell(&self) -> bool {
        self.auto_sell
    }

    #[must_use]
    pub const fn timers(&self) -> &TimerHandles {
        &self.timers
    }

    #[must_use]
    pub fn boat_bonuses(&self, catalog: &Catalog) -> BoatBonuses {
        self.boat.bonuses(catalog)
    }

    #[must_use]
    pub fn bonus_inputs<'a>(&'a self, catalog: &Catalog, config: &GameConfig) -> BonusInputs<'a> {
        BonusInputs {
            upgrades: &self.upgrades,
            skills: &self.skills,
            skills_enabled: config.skills_enabled,
            prestige_level: self.prestige_level,
            boat: self.boat_bonuses(catalog),
        }
    }

    /// Effective scalars for the current state.
    #[must_use]
    pub fn derived(&self, catalog: &Catalog, config: &GameConfig) -> DerivedStats {
        DerivedStats::compute(&self.bonus_inputs(catalog, config))
    }

    /// Buy the next level of an upgrade. Returns whether it was bought.
    pub fn purchase_upgrade(&mut self, id: UpgradeId) -> bool {
        let Some(cost) = self.upgrades.next_cost(id) else {
            return false;
        };
        if !self.try_spend(cost) {
            return false;
        }
        self.upgrades.increment(id);
        log::debug!("upgrade {id} -> level {}", self.upgrades.level(id));
        true
    }

    /// Sell every held fish of one species. Returns the money earned.
    pub fn sell_fish(&mut self, catalog: &Catalog, config: &GameConfig, species_id: &str) -> u64 {
        let Some(fish) = catalog.fish(species_id) else {
            return 0;
        };
        let count = self.inventory.remove(species_id).unwrap_or(0);
        if count == 0 {
            return 0;
        }
        let unit = self.derived(catalog, config).sell_value(fish.value);
        let earned = unit.saturating_mul(count);
        self.credit(earned);
        earned
    }

    /// Sell the whole inventory. Returns the money earned.
    pub fn sell_all(&mut self, catalog: &Catalog, config: &GameConfig) -> u64 {
        let stats = self.derived(catalog, config);
        let held = std::mem::take(&mut self.inventory);
        let mut earned = 0_u64;
        for (species_id, count) in held {
            match catalog.fish(&species_id) {
                Some(fish) => {
                    earned = earned.saturating_add(stats.sell_value(fish.value).saturating_mul(count));
                }
                None => log::debug!("dropping {count} unknown fish {species_id}"),
            }
        }
        self.credit(earned);
        earned
    }

    /// Buy a location. Returns whether it was newly unlocked.
    pub fn unlock_location(&mut self, catalog: &Catalog, location_id: &str) -> bool {
        let Some(location) = catalog.location(location_id) else {
            return false;
        };
        if self.is_location_unlocked(location_id) || !self.try_spend(location.unlock_price) {
            return false;
        }
        self.unlocked_locations.insert(location.id.clone());
        log::info!("unlocked location {}", location.id);
        true
    }

    /// Switch the active location. Returns whether it changed.
    pub fn set_active_location(&mut self, location_id: &str) -> bool {
        if self.active_location == location_id || !self.is_location_unlocked(location_id) {
            return false;
        }
        self.active_location = location_id.to_string();
        true
    }

    /// Buy (if needed) and select a boat part. Returns whether the selection changed.
    pub fn buy_boat_option(&mut self, catalog: &Catalog, part_id: &str) -> bool {
        let Some(part) = catalog.boat_part(part_id) else {
            return false;
        };
        if !self.boat.is_unlocked(part_id) {
            if !self.try_spend(part.price) {
                return false;
            }
            self.boat.unlock(part_id);
        }
        self.boat.select(catalog, part_id)
    }

    /// Select an already unlocked boat part. Returns whether the selection changed.
    pub fn select_boat_option(&mut self, catalog: &Catalog, part_id: &str) -> bool {
        self.boat.select(catalog, part_id)
    }

    /// Returns whether the flag changed.
    pub fn set_auto_sell(&mut self, enabled: bool) -> bool {
        let changed = self.auto_sell != enabled;
        self.auto_sell = enabled;
        changed
    }

    #[must_use]
    pub fn prestige_progress(&self, catalog: &Catalog) -> PrestigeProgress {
        PrestigeProgress {
            money: self.money,
            fish_caught: self.total_fish_caught,
            locations_unlocked: self
                .unlocked_locations
                .iter()
                .filter(|id| catalog.location(id).is_some())
                .count(),
            encyclopedia_completion: self.encyclopedia.completion(catalog),
        }
    }

    #[must_use]
    pub fn next_prestige_requirements(&self, catalog: &Catalog) -> PrestigeRequirements {
        PrestigeRequirements::for_level(self.prestige_level, catalog.locations().len())
    }

    #[must_use]
    pub fn prestige_requirements(&self, catalog: &Catalog) -> Vec<RequirementStatus> {
        self.next_prestige_requirements(catalog)
            .evaluate(&self.prestige_progress(catalog))
    }

    #[must_use]
    pub fn can_prestige(&self, catalog: &Catalog) -> bool {
        self.next_prestige_requirements(catalog)
            .is_met(&self.prestige_progress(catalog))
    }

    /// Trade current progress for the next prestige level. Encyclopedia,
    /// lifetime catch count, inbox and skill levels survive; skills gain a level.
    /// Returns `None` when the requirements are not met. The swap to the new
    /// level happens in one step, so no caller sees a half-reset ledger.
    pub fn perform_prestige(&mut self, catalog: &Catalog) -> Option<PrestigeOutcome> {
        if !self.can_prestige(catalog) {
            return None;
        }
        let new_level = self.prestige_level.saturating_add(1);
        let bonuses = PrestigeBonuses::for_level(new_level);

        let mut next = Self::new(catalog);
        next.money = bonuses.starting_money;
        next.total_fish_caught = self.total_fish_caught;
        next.encyclopedia = std::mem::take(&mut self.encyclopedia);
        next.encyclopedia_unlocked = self.encyclopedia_unlocked;
        next.last_online_ms = self.last_online_ms;
        next.skills = std::mem::take(&mut self.skills);
        next.skills.carry_over_prestige(PRESTIGE_SKILL_LEVEL_BONUS);
        next.inbox = std::mem::take(&mut self.inbox);
        next.auto_sell = self.auto_sell;
        next.prestige_level = new_level;
        next.inbox.deliver(
            MailKind::Prestige,
            format!("Prestige level {new_level}"),
            format!(
                "You start over with {} coins, +{:.1} fishing power, +{:.1} auto-fishing and +{:.0}% fish value.",
                bonuses.starting_money,
                bonuses.fishing_power,
                bonuses.auto_fishing,
                bonuses.fish_value * 100.0
            ),
        );
        *self = next;
        log::info!("prestiged to level {new_level}");
        Some(PrestigeOutcome { new_level, bonuses })
    }

    /// Full wipe back to a brand new game.
    pub fn reset_progress(&mut self, catalog: &Catalog) {
        let last_online_ms = self.last_online_ms;
        *self = Self::new(catalog);
        self.last_online_ms = last_online_ms;
        log::info!("progress reset");
    }

    pub(crate) fn credit(&mut self, amount: u64) {
        self.money = self.money.saturating_add(amount);
    }

    fn try_spend(&mut self, cost: u64) -> bool {
        if self.money < cost {
            return false;
        }
        self.money -= cost;
        true
    }

    /// Put one caught fish into the inventory and count it.
    pub(crate) fn stow_fish(&mut self, species_id: &str) {
        let held = self.inventory.entry(species_id.to_string()).or_insert(0);
        *held = held.saturating_add(1);
        self.total_fish_caught = self.total_fish_caught.saturating_add(1);
    }

    /// Count a caught fish that was sold on the spot.
    pub(crate) fn count_sold_catch(&mut self, value: u64) {
        self.total_fish_caught = self.total_fish_caught.saturating_add(1);
        self.credit(value);
    }

    /// Record a catch in the encyclopedia, announcing first discoveries.
    pub(crate) fn record_discovery(
        &mut self,
        catalog: &Catalog,
        species_id: &str,
        weight: f64,
        length: f64,
    ) -> RecordUpdate {
        let update = self.encyclopedia.record_catch(species_id, weight, length);
        if update.first_discovery {
            self.encyclopedia_unlocked = true;
            let name = catalog
                .fish(species_id)
                .map_or(species_id, |fish| fish.name.as_str());
            self.inbox.deliver(
                MailKind::Discovery,
                format!("New species: {name}"),
                format!("You caught your first {name} ({weight:.2} kg, {length:.1} cm)."),
            );
        }
        update
    }

    pub(crate) fn skills_mut(&mut self) -> &mut SkillBook {
        &mut self.skills
    }

    pub(crate) fn inbox_mut(&mut self) -> &mut Inbox {
        &mut self.inbox
    }

    pub(crate) fn timers_mut(&mut self) -> &mut TimerHandles {
        &mut self.timers
    }

    pub(crate) fn set_last_online(&mut self, now_ms: u64) {
        self.last_online_ms = now_ms;
    }
}
