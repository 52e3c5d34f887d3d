//! Engine tunables: offline backfill, timers, catch pacing.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::DEFAULT_STORAGE_KEY;

/// Errors raised when configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    NonPositive { field: &'static str },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("storage key must not be empty")]
    EmptyStorageKey,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineConfig {
    #[serde(default = "OfflineConfig::default_enabled")]
    pub enabled: bool,
    /// Longest absence credited, in hours.
    #[serde(default = "OfflineConfig::default_max_hours")]
    pub max_hours: f64,
    /// Offline auto-fishing runs at this share of the live rate.
    #[serde(default = "OfflineConfig::default_efficiency_rate")]
    pub efficiency_rate: f64,
    /// Absences shorter than this are ignored.
    #[serde(default = "OfflineConfig::default_min_elapsed_ms")]
    pub min_elapsed_ms: u64,
    /// Per-species held count above which offline catches auto-sell.
    #[serde(default = "OfflineConfig::default_inventory_cap")]
    pub inventory_cap: u64,
}

impl OfflineConfig {
    const fn default_enabled() -> bool {
        true
    }

    const fn default_max_hours() -> f64 {
        12.0
    }

    const fn default_efficiency_rate() -> f64 {
        0.8
    }

    const fn default_min_elapsed_ms() -> u64 {
        60_000
    }

    const fn default_inventory_cap() -> u64 {
        500
    }
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            max_hours: Self::default_max_hours(),
            efficiency_rate: Self::default_efficiency_rate(),
            min_elapsed_ms: Self::default_min_elapsed_ms(),
            inventory_cap: Self::default_inventory_cap(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "TimerConfig::default_auto_fish_interval_ms")]
    pub auto_fish_interval_ms: u64,
    #[serde(default = "TimerConfig::default_auto_sell_interval_ms")]
    pub auto_sell_interval_ms: u64,
}

impl TimerConfig {
    const fn default_auto_fish_interval_ms() -> u64 {
        5_000
    }

    const fn default_auto_sell_interval_ms() -> u64 {
        10_000
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            auto_fish_interval_ms: Self::default_auto_fish_interval_ms(),
            auto_sell_interval_ms: Self::default_auto_sell_interval_ms(),
        }
    }
}

/// Base durations of the phases of one catch action, before efficiency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseConfig {
    #[serde(default = "PhaseConfig::default_cast_ms")]
    pub cast_ms: u64,
    #[serde(default = "PhaseConfig::default_splash_ms")]
    pub splash_ms: u64,
    #[serde(default = "PhaseConfig::default_reel_ms")]
    pub reel_ms: u64,
    #[serde(default = "PhaseConfig::default_settle_ms")]
    pub settle_ms: u64,
}

impl PhaseConfig {
    const fn default_cast_ms() -> u64 {
        500
    }

    const fn default_splash_ms() -> u64 {
        1_000
    }

    const fn default_reel_ms() -> u64 {
        500
    }

    const fn default_settle_ms() -> u64 {
        500
    }

    /// Sum of all base phase durations.
    #[must_use]
    pub const fn total_ms(&self) -> u64 {
        self.cast_ms + self.splash_ms + self.reel_ms + self.settle_ms
    }
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            cast_ms: Self::default_cast_ms(),
            splash_ms: Self::default_splash_ms(),
            reel_ms: Self::default_reel_ms(),
            settle_ms: Self::default_settle_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub offline: OfflineConfig,
    #[serde(default)]
    pub timers: TimerConfig,
    #[serde(default)]
    pub phases: PhaseConfig,
    #[serde(default = "GameConfig::default_skills_enabled")]
    pub skills_enabled: bool,
    #[serde(default = "GameConfig::default_storage_key")]
    pub storage_key: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            offline: OfflineConfig::default(),
            timers: TimerConfig::default(),
            phases: PhaseConfig::default(),
            skills_enabled: Self::default_skills_enabled(),
            storage_key: Self::default_storage_key(),
        }
    }
}

impl GameConfig {
    const fn default_skills_enabled() -> bool {
        true
    }

    fn default_storage_key() -> String {
        DEFAULT_STORAGE_KEY.to_string()
    }

    /// Get default configuration
    #[must_use]
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Parse configuration from JSON, filling any missing field with its default.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check tunables for values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timers.auto_fish_interval_ms == 0 {
            return Err(ConfigError::NonPositive {
                field: "timers.auto_fish_interval_ms",
            });
        }
        if self.timers.auto_sell_interval_ms == 0 {
            return Err(ConfigError::NonPositive {
                field: "timers.auto_sell_interval_ms",
            });
        }
        if !(self.offline.max_hours.is_finite() && self.offline.max_hours > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "offline.max_hours",
            });
        }
        let rate = self.offline.efficiency_rate;
        if !(rate.is_finite() && rate > 0.0 && rate <= 1.0) {
            return Err(ConfigError::RangeViolation {
                field: "offline.efficiency_rate",
                min: 0.0,
                max: 1.0,
                value: rate,
            });
        }
        if self.offline.inventory_cap == 0 {
            return Err(ConfigError::NonPositive {
                field: "offline.inventory_cap",
            });
        }
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_tuning() {
        let cfg = GameConfig::default_config();
        assert!(cfg.offline.enabled);
        assert!((cfg.offline.max_hours - 12.0).abs() < f64::EPSILON);
        assert!((cfg.offline.efficiency_rate - 0.8).abs() < f64::EPSILON);
        assert_eq!(cfg.timers.auto_fish_interval_ms, 5_000);
        assert_eq!(cfg.phases.total_ms(), 2_500);
        assert_eq!(cfg.storage_key, "fishingTycoonSave");
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = GameConfig::from_json(r#"{ "offline": { "max_hours": 2.0 }, "skills_enabled": false }"#)
            .unwrap();
        assert!((cfg.offline.max_hours - 2.0).abs() < f64::EPSILON);
        assert_eq!(cfg.offline.min_elapsed_ms, 60_000);
        assert!(!cfg.skills_enabled);
        assert_eq!(cfg.timers, TimerConfig::default());
    }

    #[test]
    fn invalid_values_are_reported() {
        let mut cfg = GameConfig::default();
        cfg.offline.efficiency_rate = 1.5;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::RangeViolation {
                field: "offline.efficiency_rate",
                ..
            })
        ));

        let mut cfg = GameConfig::default();
        cfg.timers.auto_sell_interval_ms = 0;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::NonPositive {
                field: "timers.auto_sell_interval_ms"
            })
        );
    }
}
