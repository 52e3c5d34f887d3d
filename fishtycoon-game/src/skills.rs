//! Fishing skills: XP pools that level up and feed the bonus aggregator.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    AUTOMATION_BONUS_PER_LEVEL, CASTING_BONUS_PER_LEVEL, EFFICIENCY_BONUS_PER_LEVEL,
    KNOWLEDGE_BONUS_PER_LEVEL, LUCK_BONUS_PER_LEVEL, PATIENCE_BONUS_PER_LEVEL, SKILL_MAX_LEVEL,
    SKILL_XP_BASE, SKILL_XP_GROWTH,
};
use crate::numbers::{floor_f64_to_u64, u32_to_f64};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillId {
    Casting,
    Automation,
    Knowledge,
    Luck,
    Patience,
    Efficiency,
}

impl SkillId {
    pub const ALL: [Self; 6] = [
        Self::Casting,
        Self::Automation,
        Self::Knowledge,
        Self::Luck,
        Self::Patience,
        Self::Efficiency,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Casting => "casting",
            Self::Automation => "automation",
            Self::Knowledge => "knowledge",
            Self::Luck => "luck",
            Self::Patience => "patience",
            Self::Efficiency => "efficiency",
        }
    }

    #[must_use]
    pub const fn bonus_per_level(self) -> f64 {
        match self {
            Self::Casting => CASTING_BONUS_PER_LEVEL,
            Self::Automation => AUTOMATION_BONUS_PER_LEVEL,
            Self::Knowledge => KNOWLEDGE_BONUS_PER_LEVEL,
            Self::Luck => LUCK_BONUS_PER_LEVEL,
            Self::Patience => PATIENCE_BONUS_PER_LEVEL,
            Self::Efficiency => EFFICIENCY_BONUS_PER_LEVEL,
        }
    }

    #[must_use]
    pub const fn max_level(self) -> u32 {
        SKILL_MAX_LEVEL
    }

    /// XP needed to go from `level` to `level + 1`.
    #[must_use]
    pub fn xp_to_next(self, level: u32) -> u64 {
        let exponent = i32::try_from(level.saturating_sub(1)).unwrap_or(i32::MAX);
        floor_f64_to_u64(SKILL_XP_BASE * SKILL_XP_GROWTH.powi(exponent))
    }
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|skill| skill.as_str() == s)
            .ok_or(())
    }
}

/// One skill's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillProgress {
    pub level: u32,
    pub xp: u64,
}

impl Default for SkillProgress {
    fn default() -> Self {
        Self { level: 1, xp: 0 }
    }
}

/// All skills plus lifetime XP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillBook {
    skills: BTreeMap<SkillId, SkillProgress>,
    total_xp: u64,
}

impl Default for SkillBook {
    fn default() -> Self {
        Self {
            skills: SkillId::ALL
                .iter()
                .map(|id| (*id, SkillProgress::default()))
                .collect(),
            total_xp: 0,
        }
    }
}

impl SkillBook {
    #[must_use]
    pub fn progress(&self, id: SkillId) -> SkillProgress {
        self.skills.get(&id).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn level(&self, id: SkillId) -> u32 {
        self.progress(id).level
    }

    #[must_use]
    pub const fn total_xp(&self) -> u64 {
        self.total_xp
    }

    /// `level × bonusPerLevel`.
    #[must_use]
    pub fn bonus(&self, id: SkillId) -> f64 {
        u32_to_f64(self.level(id)) * id.bonus_per_level()
    }

    /// Add XP to one skill and resolve every level-up it earns.
    /// Returns the number of levels gained.
    pub fn award(&mut self, id: SkillId, xp: u64) -> u32 {
        self.total_xp = self.total_xp.saturating_add(xp);
        let entry = self.skills.entry(id).or_default();
        entry.xp = entry.xp.saturating_add(xp);
        resolve_level_ups(id, entry)
    }

    /// Restore a skill from saved data, clamping it into range and resolving
    /// any level-ups a stale XP pool would grant.
    pub fn restore(&mut self, id: SkillId, level: u32, xp: u64) {
        let entry = self.skills.entry(id).or_default();
        entry.level = level.clamp(1, id.max_level());
        entry.xp = xp;
        resolve_level_ups(id, entry);
    }

    pub(crate) fn set_total_xp(&mut self, total_xp: u64) {
        self.total_xp = total_xp;
    }

    /// Keep levels (plus a bump) across a prestige, clearing in-progress XP.
    pub(crate) fn carry_over_prestige(&mut self, bonus_levels: u32) {
        for (id, progress) in &mut self.skills {
            progress.level = progress
                .level
                .saturating_add(bonus_levels)
                .min(id.max_level());
            progress.xp = 0;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (SkillId, SkillProgress)> + '_ {
        self.skills.iter().map(|(id, progress)| (*id, *progress))
    }
}

fn resolve_level_ups(id: SkillId, progress: &mut SkillProgress) -> u32 {
    let mut gained = 0;
    while progress.level < id.max_level() {
        let threshold = id.xp_to_next(progress.level);
        if progress.xp < threshold {
            break;
        }
        progress.xp -= threshold;
        progress.level += 1;
        gained += 1;
    }
    if progress.level >= id.max_level() {
        progress.xp = 0;
    }
    gained
}
