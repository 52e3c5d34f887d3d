use anyhow::{Result, bail, ensure};

use crate::logic::{PlayStrategy, SimulationPlan, SimulationSummary};

const HOUR_MS: u64 = 3_600_000;

/// A named plan the tester can run.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub plan: SimulationPlan,
}

const SCENARIO_KEYS: [(&str, &str); 6] = [
    ("smoke", "Five minutes of greedy play earns money"),
    ("idle-only", "Idle player buys the auto-fisher and lets it run"),
    (
        "greedy-upgrades",
        "An hour of greedy spending unlocks upgrades and locations",
    ),
    ("prestige-run", "Instant catches until the first prestige"),
    (
        "offline-return",
        "Leave for three hours, return, and return again",
    ),
    (
        "save-reload",
        "Reopening the save reproduces the live game every few minutes",
    ),
];

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    SCENARIO_KEYS.to_vec()
}

/// Look up a scenario by key, ignoring case.
#[must_use]
pub fn get_scenario(key: &str) -> Option<TestScenario> {
    let wanted = key.trim().to_ascii_lowercase();
    let &(key, description) = SCENARIO_KEYS.iter().find(|(k, _)| *k == wanted)?;
    let (name, plan) = match key {
        "smoke" => (
            "Smoke",
            SimulationPlan::new(PlayStrategy::Greedy, 5).with_expectation(expect_earnings),
        ),
        "idle-only" => (
            "Idle Only",
            SimulationPlan::new(PlayStrategy::Idle, 30)
                .with_expectation(expect_earnings)
                .with_expectation(expect_auto_fisher),
        ),
        "greedy-upgrades" => (
            "Greedy Upgrades",
            SimulationPlan::new(PlayStrategy::Greedy, 60)
                .with_expectation(expect_earnings)
                .with_expectation(expect_spending),
        ),
        "prestige-run" => (
            "Prestige Run",
            SimulationPlan::new(PlayStrategy::Prestige, 24 * 60)
                .stopping_after_prestige()
                .with_expectation(expect_prestige),
        ),
        "offline-return" => (
            "Offline Return",
            SimulationPlan::new(PlayStrategy::Idle, 20)
                .with_offline_gap(3 * HOUR_MS)
                .with_expectation(expect_offline_credit),
        ),
        "save-reload" => (
            "Save Reload",
            SimulationPlan::new(PlayStrategy::Greedy, 30)
                .with_reload_every(5)
                .with_expectation(expect_reloads),
        ),
        _ => return None,
    };
    Some(TestScenario {
        key,
        name,
        description,
        plan,
    })
}

/// Expand `all` into every scenario key, keeping the other tokens in order.
#[must_use]
pub fn expand_scenarios(tokens: &[String]) -> Vec<String> {
    let mut scenarios: Vec<String> = tokens
        .iter()
        .filter(|token| !token.eq_ignore_ascii_case("all"))
        .cloned()
        .collect();
    if tokens.iter().any(|token| token.eq_ignore_ascii_case("all")) {
        for (key, _) in SCENARIO_KEYS {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

fn expect_earnings(summary: &SimulationSummary) -> Result<()> {
    ensure!(summary.catches > 0, "no fish caught");
    ensure!(summary.money_earned > 0, "no money earned");
    Ok(())
}

fn expect_auto_fisher(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.final_stats.auto_fish_rate > 0.0,
        "auto-fisher never bought (money {})",
        summary.final_stats.money
    );
    ensure!(summary.catches >= 100, "only {} catches", summary.catches);
    Ok(())
}

fn expect_spending(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.upgrades_bought >= 5,
        "only {} upgrades bought",
        summary.upgrades_bought
    );
    ensure!(
        summary.locations_unlocked >= 1,
        "no location unlocked with ${}",
        summary.final_stats.money
    );
    Ok(())
}

fn expect_prestige(summary: &SimulationSummary) -> Result<()> {
    if summary.prestiges == 0 {
        bail!("never prestiged after {} catches", summary.catches);
    }
    ensure!(
        summary.final_stats.prestige_level == summary.prestiges,
        "prestige level {} after {} prestiges",
        summary.final_stats.prestige_level,
        summary.prestiges
    );
    Ok(())
}

fn expect_offline_credit(summary: &SimulationSummary) -> Result<()> {
    let Some(offline) = summary.offline else {
        bail!("no offline return recorded");
    };
    ensure!(
        offline.elapsed_ms <= 12 * HOUR_MS,
        "offline window of {} ms exceeds the cap",
        offline.elapsed_ms
    );
    if summary.auto_rate_before_leaving > 0.0 {
        ensure!(offline.fish_gained > 0, "auto-fisher earned nothing offline");
    }
    ensure!(
        summary.offline_replay.is_some_and(|replay| replay.is_empty()),
        "second return credited progress again: {:?}",
        summary.offline_replay
    );
    Ok(())
}

fn expect_reloads(summary: &SimulationSummary) -> Result<()> {
    ensure!(summary.reloads >= 5, "only {} reloads", summary.reloads);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_key_resolves() {
        for (key, description) in list_scenarios() {
            let scenario = get_scenario(key).unwrap();
            assert_eq!(scenario.key, key);
            assert_eq!(scenario.description, description);
            assert!(!scenario.plan.expectations.is_empty(), "{key}");
        }
        assert!(get_scenario("Smoke").is_some());
        assert!(get_scenario("weather").is_none());
    }

    #[test]
    fn all_expands_without_duplicates() {
        let expanded = expand_scenarios(&["smoke".to_string(), "all".to_string()]);
        assert_eq!(expanded.len(), SCENARIO_KEYS.len());
        assert_eq!(expanded[0], "smoke");
        assert!(expanded.contains(&"save-reload".to_string()));
    }

    #[test]
    fn expand_without_all_preserves_order() {
        let tokens = vec!["save-reload".to_string(), "smoke".to_string()];
        assert_eq!(expand_scenarios(&tokens), tokens);
    }

    #[test]
    fn smoke_scenario_passes() {
        let scenario = get_scenario("smoke").unwrap();
        let summary = crate::logic::simulation::run_plan(&scenario.plan, 1337).unwrap();
        assert!(summary.violations.is_empty(), "{:?}", summary.violations);
        for expectation in &scenario.plan.expectations {
            expectation(&summary).unwrap();
        }
    }

    #[test]
    fn offline_expectation_rejects_double_credit() {
        let scenario = get_scenario("offline-return").unwrap();
        let mut summary = crate::logic::simulation::run_plan(&scenario.plan, 5).unwrap();
        expect_offline_credit(&summary).unwrap();
        summary.offline_replay = summary.offline;
        if summary.offline.is_some_and(|report| !report.is_empty()) {
            assert!(expect_offline_credit(&summary).is_err());
        }
    }
}
