//! Centralized balance and tuning constants for Fishing Tycoon game logic.
//!
//! These values define the deterministic math for the economy simulation.
//! Keeping them together ensures that balance can only be adjusted via
//! code changes reviewed in version control, rather than through save data.

// Rarity buckets -----------------------------------------------------------
pub(crate) const RARITY_COMMON_MIN_CHANCE: f64 = 0.5;
pub(crate) const RARITY_RARE_MIN_CHANCE: f64 = 0.2;
pub(crate) const RARITY_EPIC_MIN_CHANCE: f64 = 0.05;
pub(crate) const XP_MULTIPLIER_COMMON: f64 = 1.0;
pub(crate) const XP_MULTIPLIER_RARE: f64 = 2.0;
pub(crate) const XP_MULTIPLIER_EPIC: f64 = 5.0;
pub(crate) const XP_MULTIPLIER_LEGENDARY: f64 = 20.0;

// Luck ---------------------------------------------------------------------
/// Species with a base chance below this threshold get an amplified luck bonus.
pub(crate) const LUCK_RARITY_THRESHOLD: f64 = 0.1;
pub(crate) const LUCK_RARE_AMPLIFIER: f64 = 2.0;
pub(crate) const LUCK_COMMON_FACTOR: f64 = 1.0;

// Action pacing ------------------------------------------------------------
/// Efficiency can never shorten a timed phase below this share of its base.
pub(crate) const ACTION_DELAY_FLOOR_RATIO: f64 = 0.5;

// Upgrades -----------------------------------------------------------------
pub(crate) const ROD_BASE_COST: f64 = 50.0;
pub(crate) const ROD_COST_GROWTH: f64 = 1.5;
pub(crate) const ROD_POWER_PER_LEVEL: f64 = 1.0;
pub(crate) const BOAT_BASE_COST: f64 = 50.0;
pub(crate) const BOAT_COST_GROWTH: f64 = 1.6;
pub(crate) const BOAT_MAX_LEVEL: u32 = 5;
pub(crate) const BOAT_EFFICIENCY_PER_LEVEL: f64 = 0.1;
pub(crate) const AUTO_BASE_COST: f64 = 200.0;
pub(crate) const AUTO_COST_GROWTH: f64 = 2.0;
pub(crate) const AUTO_RATE_PER_LEVEL: f64 = 0.2;
pub(crate) const LURE_BASE_COST: f64 = 100.0;
pub(crate) const LURE_COST_GROWTH: f64 = 1.7;
pub(crate) const LURE_LUCK_PER_LEVEL: f64 = 0.1;

// Skills -------------------------------------------------------------------
pub(crate) const SKILL_MAX_LEVEL: u32 = 10;
pub(crate) const SKILL_XP_BASE: f64 = 100.0;
pub(crate) const SKILL_XP_GROWTH: f64 = 1.5;
pub(crate) const BASE_CATCH_XP: f64 = 10.0;
pub(crate) const CASTING_BONUS_PER_LEVEL: f64 = 0.10;
pub(crate) const AUTOMATION_BONUS_PER_LEVEL: f64 = 0.05;
pub(crate) const KNOWLEDGE_BONUS_PER_LEVEL: f64 = 0.05;
pub(crate) const LUCK_BONUS_PER_LEVEL: f64 = 0.03;
pub(crate) const PATIENCE_BONUS_PER_LEVEL: f64 = 0.05;
pub(crate) const EFFICIENCY_BONUS_PER_LEVEL: f64 = 0.03;

// Prestige -----------------------------------------------------------------
pub(crate) const PRESTIGE_FISHING_POWER_PER_LEVEL: f64 = 0.5;
pub(crate) const PRESTIGE_AUTO_FISHING_PER_LEVEL: f64 = 0.1;
pub(crate) const PRESTIGE_FISH_VALUE_PER_LEVEL: f64 = 0.25;
pub(crate) const PRESTIGE_STARTING_MONEY_PER_LEVEL: u64 = 100;
pub(crate) const PRESTIGE_MONEY_REQUIREMENT: u64 = 100_000;
pub(crate) const PRESTIGE_FISH_REQUIREMENT: u64 = 1_000;
pub(crate) const PRESTIGE_LOCATIONS_REQUIREMENT: usize = 3;
pub(crate) const PRESTIGE_ENCYCLOPEDIA_REQUIREMENT: f64 = 0.5;
pub(crate) const PRESTIGE_SKILL_LEVEL_BONUS: u32 = 1;

// Inbox --------------------------------------------------------------------
pub(crate) const INBOX_CAPACITY: usize = 50;

// Persistence --------------------------------------------------------------
pub(crate) const SAVE_VERSION: u32 = 2;
pub(crate) const DEFAULT_STORAGE_KEY: &str = "fishingTycoonSave";

// Offline ------------------------------------------------------------------
pub(crate) const MS_PER_HOUR: f64 = 3_600_000.0;
pub(crate) const SECONDS_PER_HOUR: f64 = 3_600.0;
