use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::logic::simulation::{SimulationPlan, SimulationSummary, run_plan};
use crate::scenarios::TestScenario;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    verbose: bool,
    minutes_override: Option<u64>,
}

impl LogicTester {
    pub const fn new(verbose: bool, minutes_override: Option<u64>) -> Self {
        Self {
            verbose,
            minutes_override,
        }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut plan = scenario.plan.clone();
        if let Some(minutes) = self.minutes_override {
            plan.minutes = minutes;
        }

        let mut results = Vec::new();
        for &seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing scenario: {} (strategy: {} seed: {})",
                    scenario.name.bright_white(),
                    plan.strategy,
                    seed
                );
            }
            results.push(self.run_single_scenario(scenario, &plan, seed, iterations));
        }
        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        plan: &SimulationPlan,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let (successes, failures, performance_data) =
            self.run_simulation_iterations(plan, seed, iterations);

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.to_string(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration,
            performance_data,
        }
    }

    fn run_simulation_iterations(
        &self,
        plan: &SimulationPlan,
        seed: u64,
        iterations: usize,
    ) -> (usize, Vec<String>, Vec<Duration>) {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let outcome = run_plan(plan, iteration_seed)
                .map_err(|err| format!("{err:#}"))
                .and_then(|summary| match evaluate_expectations(plan, &summary) {
                    Some(err) => Err(format!("{err} | {}", summary.headline())),
                    None => Ok(summary),
                });

            match outcome {
                Ok(summary) => {
                    successes += 1;
                    let duration = start_time.elapsed();
                    performance_data.push(duration);
                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?}) {}",
                            i + 1,
                            iterations,
                            summary.headline()
                        );
                    }
                }
                Err(err) => {
                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            iterations,
                            err.clone().red()
                        );
                    }
                    failures.push(format!(
                        "Iteration {} (strategy {}, seed {iteration_seed}): {err}",
                        i + 1,
                        plan.strategy
                    ));
                }
            }
        }

        (successes, failures, performance_data)
    }
}

/// Invariant violations fail a run before any scenario-specific expectation.
fn evaluate_expectations(plan: &SimulationPlan, summary: &SimulationSummary) -> Option<String> {
    if let Some(first) = summary.violations.first() {
        return Some(format!(
            "{} invariant violation(s), first: {first}",
            summary.violations.len()
        ));
    }
    for expectation in &plan.expectations {
        if let Err(err) = expectation(summary) {
            return Some(err.to_string());
        }
    }
    None
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations
            .iter()
            .map(std::time::Duration::as_millis)
            .collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis_vec
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::simulation::PlayStrategy;
    use anyhow::bail;

    fn scenario(plan: SimulationPlan) -> TestScenario {
        TestScenario {
            key: "sample",
            name: "Probe",
            description: "test-only scenario",
            plan,
        }
    }

    #[test]
    fn passing_plan_reports_every_iteration() {
        let tester = LogicTester::new(false, None);
        let sample = scenario(SimulationPlan::new(PlayStrategy::Greedy, 1));
        let results = tester.run_scenario(&sample, &[1, 2], 2);
        assert_eq!(results.len(), 2);
        for result in results {
            assert!(result.passed, "{:?}", result.failures);
            assert_eq!(result.successful_iterations, 2);
            assert_eq!(result.performance_data.len(), 2);
        }
    }

    #[test]
    fn failed_expectation_is_reported_with_seed() {
        let tester = LogicTester::new(false, None);
        let plan = SimulationPlan::new(PlayStrategy::Idle, 1)
            .with_expectation(|_| bail!("never satisfied"));
        let results = tester.run_scenario(&scenario(plan), &[40], 1);
        let result = &results[0];
        assert!(!result.passed);
        assert_eq!(result.successful_iterations, 0);
        assert!(result.failures[0].contains("never satisfied"));
        assert!(result.failures[0].contains("seed 40"));
        assert_eq!(result.average_duration, Duration::ZERO);
    }

    #[test]
    fn minutes_override_replaces_plan_length() {
        let tester = LogicTester::new(false, Some(1));
        let plan = SimulationPlan::new(PlayStrategy::Greedy, 10_000).with_expectation(|summary| {
            if summary.elapsed_ms == 60_000 {
                Ok(())
            } else {
                bail!("ran {} ms", summary.elapsed_ms)
            }
        });
        let results = tester.run_scenario(&scenario(plan), &[3], 1);
        assert!(results[0].passed, "{:?}", results[0].failures);
    }

    #[test]
    fn durations_serialize_as_millis() {
        let result = ScenarioResult {
            scenario_name: "Smoke".to_string(),
            seed: 1,
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            failures: Vec::new(),
            average_duration: Duration::from_millis(12),
            performance_data: vec![Duration::from_millis(12)],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["average_duration"], 12);
        let back: ScenarioResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.performance_data, vec![Duration::from_millis(12)]);
    }
}
