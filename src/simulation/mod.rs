pub mod config;
pub use config::{Layout, SimConfig};

use crate::agent::Agent;
use crate::metrics::{BenchmarkRecorder, BenchmarkResult};
use crate::strategies::{NavigationStrategy, StrategyKind};
use anyhow::{Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

/// One tick: steer every agent with `strategy`, then integrate positions.
pub fn update_all(strategy: &NavigationStrategy, agents: &mut [Agent], elapsed_seconds: f64, parallel: bool) {
    strategy.steer_all(agents, parallel);
    for agent in agents.iter_mut() {
        agent.advance(elapsed_seconds);
    }
}

/// Owns the agent set, the selected strategy and the benchmark recorder.
///
/// The frame loop (interactive or headless) drives it through [`Simulation::update`]
/// and the start/stop/reset calls.
pub struct Simulation {
    config: SimConfig,
    agents: Vec<Agent>,
    strategy: NavigationStrategy,
    pub benchmark: BenchmarkRecorder,
    running: bool,
    ticks: u64,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        let strategy = NavigationStrategy::with_params(config.strategy, config.flocking, config.predictive);
        let agents = config.build_agents();
        Self {
            config,
            agents,
            strategy,
            benchmark: BenchmarkRecorder::new(),
            running: false,
            ticks: 0,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn strategy(&self) -> &NavigationStrategy {
        &self.strategy
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn reached_count(&self) -> usize {
        self.agents.iter().filter(|a| a.has_reached_goal()).count()
    }

    pub fn total_collisions(&self) -> u64 {
        self.agents.iter().map(Agent::collision_count).sum()
    }

    pub fn all_reached(&self) -> bool {
        self.agents.iter().all(Agent::has_reached_goal)
    }

    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            self.benchmark.start(self.strategy.name());
            info!("Run started: {} with {} agents", self.strategy.name(), self.agents.len());
        }
    }

    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.benchmark.stop(&self.agents);
            info!("Run stopped after {} ticks", self.ticks);
        }
    }

    pub fn toggle(&mut self) {
        if self.running { self.stop() } else { self.start() }
    }

    /// Stop the current run and put a fresh agent set on the layout.
    pub fn reset(&mut self) {
        self.stop();
        self.agents = self.config.build_agents();
        self.ticks = 0;
        debug!("Agents reset: {}", self.agents.len());
    }

    /// Switching strategy ends the run and starts over with fresh agents.
    pub fn select_strategy(&mut self, kind: StrategyKind) {
        self.stop();
        self.config.strategy = kind;
        self.strategy = NavigationStrategy::with_params(kind, self.config.flocking, self.config.predictive);
        info!("Strategy selected: {}", self.strategy.name());
        self.reset();
    }

    pub fn next_strategy(&mut self) {
        self.select_strategy(self.strategy.kind().next());
    }

    /// Tune the active strategy. The change survives later strategy switches.
    pub fn set_option(&mut self, key: &str, value: f64) -> Result<()> {
        self.strategy.set_option(key, value)?;
        match &self.strategy {
            NavigationStrategy::Flocking(flocking) => self.config.flocking = *flocking.params(),
            NavigationStrategy::PredictiveAvoidance(rvo) => self.config.predictive = *rvo.params(),
            NavigationStrategy::DirectPursuit(_) => {}
        }
        Ok(())
    }

    /// Advance one frame while running; ends the run once every agent has arrived.
    pub fn update(&mut self, elapsed_seconds: f64) {
        if !self.running {
            return;
        }

        update_all(&self.strategy, &mut self.agents, elapsed_seconds, self.config.parallel);
        self.ticks += 1;

        if self.all_reached() {
            info!("All agents reached their goals");
            self.stop();
        }
    }

    /// Headless run with the fixed tick until everyone arrives or the tick limit is hit.
    pub fn run(&mut self) -> Result<BenchmarkResult> {
        info!("Starting simulation: {}", self.config.name);
        info!("Strategy: {}", self.strategy.name());
        info!("Agents: {}, tick: {:.4}s, limit: {} ticks", self.agents.len(), self.config.tick_seconds, self.config.max_ticks);

        let pb = if self.config.show_progress {
            ProgressBar::new(self.config.max_ticks)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.orange/yellow} {pos}/{len} ticks {msg}")?
                .progress_chars("█▓░"),
        );

        self.start();
        while self.running && self.ticks < self.config.max_ticks {
            self.update(self.config.tick_seconds);
            pb.inc(1);

            if self.ticks % 30 == 0 {
                pb.set_message(format!(
                    "Reached: {}/{} | Collisions: {}",
                    self.reached_count(),
                    self.agents.len(),
                    self.total_collisions()
                ));
            }
        }

        if self.running {
            warn!(
                "Tick limit reached with {}/{} agents at their goals",
                self.reached_count(),
                self.agents.len()
            );
            self.stop();
        }
        pb.finish_with_message("Simulation complete");

        self.benchmark
            .results()
            .last()
            .cloned()
            .ok_or_else(|| anyhow!("Run {} produced no result", self.config.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::NO_RESULTS;

    fn small(kind: StrategyKind) -> SimConfig {
        SimConfig::default().with_strategy(kind).with_agents(6)
    }

    #[test]
    fn test_update_ignored_while_stopped() {
        let mut sim = Simulation::new(small(StrategyKind::DirectPursuit));
        let before: Vec<_> = sim.agents().iter().map(Agent::position).collect();
        sim.update(0.1);
        let after: Vec<_> = sim.agents().iter().map(Agent::position).collect();
        assert_eq!(before, after);
        assert_eq!(sim.ticks(), 0);
    }

    #[test]
    fn test_toggle_records_one_result_per_run() {
        let mut sim = Simulation::new(small(StrategyKind::DirectPursuit));
        sim.toggle();
        sim.update(0.1);
        sim.toggle();
        sim.stop();
        assert_eq!(sim.benchmark.results().len(), 1);
        assert_eq!(sim.benchmark.results()[0].algorithm(), "Direct Pursuit (Naive Approach)");
    }

    #[test]
    fn test_run_ends_when_everyone_arrives() {
        let mut sim = Simulation::new(small(StrategyKind::DirectPursuit));
        let result = sim.run().unwrap();
        assert!(!sim.is_running());
        assert_eq!(result.agents_reached_goal(), 6);
        assert_eq!(result.goal_reach_percentage(), 100.0);
        assert!(sim.ticks() < sim.config().max_ticks);
    }

    #[test]
    fn test_run_stops_at_tick_limit() {
        let mut config = small(StrategyKind::DirectPursuit);
        config.max_ticks = 5;
        let mut sim = Simulation::new(config);
        let result = sim.run().unwrap();
        assert_eq!(sim.ticks(), 5);
        assert_eq!(result.agents_reached_goal(), 0);
    }

    #[test]
    fn test_select_strategy_resets_and_records() {
        let mut sim = Simulation::new(small(StrategyKind::DirectPursuit));
        sim.start();
        sim.update(0.5);
        sim.select_strategy(StrategyKind::Flocking);

        assert!(!sim.is_running());
        assert_eq!(sim.ticks(), 0);
        assert_eq!(sim.strategy().kind(), StrategyKind::Flocking);
        assert_eq!(sim.benchmark.results().len(), 1);
        assert!(sim.agents().iter().all(|a| a.distance_traveled() == 0.0));
    }

    #[test]
    fn test_option_survives_switching() {
        let mut sim = Simulation::new(small(StrategyKind::Flocking));
        sim.set_option("separation_radius", 70.0).unwrap();
        sim.next_strategy();
        sim.next_strategy();
        sim.next_strategy();
        assert_eq!(sim.strategy().kind(), StrategyKind::Flocking);
        assert!(sim.strategy().options().contains(&("separation_radius", 70.0)));
        assert!(sim.set_option("time_horizon", 1.0).is_err());
    }

    #[test]
    fn test_clear_benchmark() {
        let mut sim = Simulation::new(small(StrategyKind::PredictiveAvoidance));
        sim.run().unwrap();
        sim.benchmark.clear();
        assert_eq!(sim.benchmark.report(), NO_RESULTS);
    }
}
