pub mod logger;
pub mod analyzer;

use crate::agent::Agent;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt::Write;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub const NO_RESULTS: &str = "No benchmark results available";

/// Scores of one finished run. Built once from the final agent set, never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkResult {
    algorithm: String,
    recorded_at: DateTime<Local>,
    simulation_seconds: f64,
    total_agents: usize,
    agents_reached_goal: usize,
    goal_reach_percentage: f64,
    average_distance_traveled: f64,
    total_collisions: u64,
    average_time_to_goal: f64,
}

impl BenchmarkResult {
    pub fn from_agents(algorithm: impl Into<String>, agents: &[Agent], duration: Duration) -> Self {
        let total_agents = agents.len();
        let mut total_distance = 0.0;
        let mut total_collisions = 0;
        let mut agents_reached_goal = 0;
        let mut total_time_to_goal = 0.0;

        for agent in agents {
            total_distance += agent.distance_traveled();
            total_collisions += agent.collision_count();
            if agent.has_reached_goal() {
                agents_reached_goal += 1;
                total_time_to_goal += agent.time_to_goal();
            }
        }

        Self {
            algorithm: algorithm.into(),
            recorded_at: Local::now(),
            simulation_seconds: duration.as_secs_f64(),
            total_agents,
            agents_reached_goal,
            goal_reach_percentage: mean(agents_reached_goal as f64 * 100.0, total_agents),
            average_distance_traveled: mean(total_distance, total_agents),
            total_collisions,
            average_time_to_goal: mean(total_time_to_goal, agents_reached_goal),
        }
    }

    /// Mean of several results of the same algorithm, e.g. repeated runs.
    ///
    /// The reach percentage is a plain mean over runs. Time to goal is weighted by
    /// arrivals, so runs where nobody arrived do not pull it towards zero.
    pub fn average(results: &[BenchmarkResult]) -> Option<BenchmarkResult> {
        let first = results.first()?;
        let n = results.len() as f64;
        let avg = |f: fn(&BenchmarkResult) -> f64| results.iter().map(f).sum::<f64>() / n;

        let arrivals: usize = results.iter().map(|r| r.agents_reached_goal).sum();
        let arrival_time: f64 = results
            .iter()
            .map(|r| r.average_time_to_goal * r.agents_reached_goal as f64)
            .sum();

        Some(Self {
            algorithm: first.algorithm.clone(),
            recorded_at: Local::now(),
            simulation_seconds: avg(|r| r.simulation_seconds),
            total_agents: first.total_agents,
            agents_reached_goal: avg(|r| r.agents_reached_goal as f64).round() as usize,
            goal_reach_percentage: avg(|r| r.goal_reach_percentage),
            average_distance_traveled: avg(|r| r.average_distance_traveled),
            total_collisions: avg(|r| r.total_collisions as f64).round() as u64,
            average_time_to_goal: mean(arrival_time, arrivals),
        })
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn recorded_at(&self) -> DateTime<Local> {
        self.recorded_at
    }

    pub fn simulation_seconds(&self) -> f64 {
        self.simulation_seconds
    }

    pub fn total_agents(&self) -> usize {
        self.total_agents
    }

    /// Rounded to the nearest agent for averaged results.
    pub fn agents_reached_goal(&self) -> usize {
        self.agents_reached_goal
    }

    pub fn goal_reach_percentage(&self) -> f64 {
        self.goal_reach_percentage
    }

    pub fn average_distance_traveled(&self) -> f64 {
        self.average_distance_traveled
    }

    /// Each overlapping pair contributes two, one per participant.
    pub fn total_collisions(&self) -> u64 {
        self.total_collisions
    }

    /// Only over agents that arrived; 0 when none did.
    pub fn average_time_to_goal(&self) -> f64 {
        self.average_time_to_goal
    }
}

fn mean(total: f64, count: usize) -> f64 {
    if count > 0 { total / count as f64 } else { 0.0 }
}

#[derive(Debug)]
struct ActiveRun {
    label: String,
    started: Instant,
}

/// Times runs and keeps their results in recording order.
#[derive(Debug, Default)]
pub struct BenchmarkRecorder {
    results: Vec<BenchmarkResult>,
    active: Option<ActiveRun>,
}

impl BenchmarkRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starting while already running discards the unsaved run and restarts the clock.
    pub fn start(&mut self, label: impl Into<String>) {
        let label = label.into();
        debug!("Benchmark started: {}", label);
        self.active = Some(ActiveRun {
            label,
            started: Instant::now(),
        });
    }

    /// Score the run against the final agent set. Does nothing without an active run.
    pub fn stop(&mut self, agents: &[Agent]) -> Option<&BenchmarkResult> {
        let run = self.active.take()?;
        let result = BenchmarkResult::from_agents(run.label, agents, run.started.elapsed());
        info!(
            "Benchmark recorded: {} ({}/{} reached, {} collisions)",
            result.algorithm(),
            result.agents_reached_goal(),
            result.total_agents(),
            result.total_collisions()
        );
        self.results.push(result);
        self.results.last()
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn results(&self) -> &[BenchmarkResult] {
        &self.results
    }

    pub fn clear(&mut self) {
        self.results.clear();
    }

    pub fn report(&self) -> String {
        if self.results.is_empty() {
            return NO_RESULTS.to_string();
        }

        let mut report = String::new();
        report.push_str("Benchmark Comparison Report\n");
        report.push_str("===========================\n\n");

        for result in &self.results {
            let _ = writeln!(report, "Algorithm: {}", result.algorithm());
            let _ = writeln!(report, "Simulation Time: {:.2} seconds", result.simulation_seconds());
            let _ = writeln!(report, "Average Distance Traveled: {:.2}", result.average_distance_traveled());
            let _ = writeln!(report, "Total Collisions: {}", result.total_collisions());
            let _ = writeln!(
                report,
                "Agents Reached Goal: {}/{} ({:.1}%)",
                result.agents_reached_goal(),
                result.total_agents(),
                result.goal_reach_percentage()
            );
            let _ = writeln!(report, "Average Time to Goal: {:.2} seconds", result.average_time_to_goal());
            report.push('\n');
        }

        report
    }
}
