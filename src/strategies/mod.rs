pub mod direct;
pub mod flocking;
pub mod predictive;

pub use direct::DirectPursuit;
pub use flocking::{Flocking, FlockingParams};
pub use predictive::{PredictiveAvoidance, PredictiveParams};

use crate::agent::{Agent, AgentState};
use crate::geometry::Vec2;
use anyhow::{Result, anyhow, bail};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Below this many agents the rayon fan-out costs more than the scan.
pub const PARALLEL_MIN_AGENTS: usize = 64;

/// Per-tick velocity assignment.
///
/// `steer` must be a pure function of the snapshot so that every agent sees
/// the previous tick's state, regardless of evaluation order or thread.
pub trait Strategy: Send + Sync + fmt::Debug {
    fn steer(&self, index: usize, snapshot: &[AgentState]) -> Vec2;

    /// Runs once after all new velocities are committed.
    fn after_steer(&self, _agents: &mut [Agent]) {}

    fn name(&self) -> &str;

    fn set_option(&mut self, key: &str, value: f64) -> Result<()>;

    fn options(&self) -> Vec<(&'static str, f64)>;
}

/// Snapshot, compute every next velocity, then commit them all at once.
pub fn steer_all<S: Strategy + ?Sized>(strategy: &S, agents: &mut [Agent], parallel: bool) {
    let snapshot: Vec<AgentState> = agents.iter().map(Agent::state).collect();

    let next: Vec<Vec2> = if parallel && snapshot.len() >= PARALLEL_MIN_AGENTS {
        (0..snapshot.len())
            .into_par_iter()
            .map(|i| next_velocity(strategy, i, &snapshot))
            .collect()
    } else {
        (0..snapshot.len())
            .map(|i| next_velocity(strategy, i, &snapshot))
            .collect()
    };

    for (agent, velocity) in agents.iter_mut().zip(next) {
        agent.set_velocity(velocity);
    }

    strategy.after_steer(agents);
}

fn next_velocity<S: Strategy + ?Sized>(strategy: &S, index: usize, snapshot: &[AgentState]) -> Vec2 {
    let state = &snapshot[index];
    if state.reached_goal {
        return Vec2::ZERO;
    }

    let velocity = strategy.steer(index, snapshot).limit(state.max_speed);
    if velocity.is_finite() { velocity } else { Vec2::ZERO }
}

/// "Seek" steering: desired velocity toward `target` at full speed, minus the current one.
pub(crate) fn seek(agent: &AgentState, target: Vec2) -> Vec2 {
    let desired = (target - agent.position).with_length(agent.max_speed);
    desired - agent.velocity
}

pub(crate) fn check_option(key: &str, value: f64, non_negative: bool) -> Result<()> {
    if !value.is_finite() {
        bail!("Option {} must be finite, got {}", key, value);
    }
    if non_negative && value < 0.0 {
        bail!("Option {} must not be negative, got {}", key, value);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    DirectPursuit,
    Flocking,
    PredictiveAvoidance,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::DirectPursuit,
        StrategyKind::Flocking,
        StrategyKind::PredictiveAvoidance,
    ];

    /// Cycles through the variants in declaration order.
    pub fn next(self) -> StrategyKind {
        match self {
            StrategyKind::DirectPursuit => StrategyKind::Flocking,
            StrategyKind::Flocking => StrategyKind::PredictiveAvoidance,
            StrategyKind::PredictiveAvoidance => StrategyKind::DirectPursuit,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            StrategyKind::DirectPursuit => "direct-pursuit",
            StrategyKind::Flocking => "flocking",
            StrategyKind::PredictiveAvoidance => "predictive-avoidance",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for StrategyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        StrategyRegistry::global()
            .lookup(s)
            .ok_or_else(|| anyhow!("Unknown strategy: {}", s))
    }
}

/// The three navigation strategies as one closed sum type.
#[derive(Debug, Clone)]
pub enum NavigationStrategy {
    DirectPursuit(DirectPursuit),
    Flocking(Flocking),
    PredictiveAvoidance(PredictiveAvoidance),
}

impl NavigationStrategy {
    pub fn new(kind: StrategyKind) -> Self {
        Self::with_params(kind, FlockingParams::default(), PredictiveParams::default())
    }

    pub fn with_params(kind: StrategyKind, flocking: FlockingParams, predictive: PredictiveParams) -> Self {
        match kind {
            StrategyKind::DirectPursuit => Self::DirectPursuit(DirectPursuit::new()),
            StrategyKind::Flocking => Self::Flocking(Flocking::new(flocking)),
            StrategyKind::PredictiveAvoidance => Self::PredictiveAvoidance(PredictiveAvoidance::new(predictive)),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::DirectPursuit(_) => StrategyKind::DirectPursuit,
            Self::Flocking(_) => StrategyKind::Flocking,
            Self::PredictiveAvoidance(_) => StrategyKind::PredictiveAvoidance,
        }
    }

    fn inner(&self) -> &dyn Strategy {
        match self {
            Self::DirectPursuit(s) => s,
            Self::Flocking(s) => s,
            Self::PredictiveAvoidance(s) => s,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Strategy {
        match self {
            Self::DirectPursuit(s) => s,
            Self::Flocking(s) => s,
            Self::PredictiveAvoidance(s) => s,
        }
    }

    pub fn steer_all(&self, agents: &mut [Agent], parallel: bool) {
        steer_all(self.inner(), agents, parallel);
    }

    pub fn name(&self) -> &str {
        self.inner().name()
    }

    pub fn set_option(&mut self, key: &str, value: f64) -> Result<()> {
        self.inner_mut().set_option(key, value)?;
        debug!("{}: {} = {}", self.name(), key, value);
        Ok(())
    }

    pub fn options(&self) -> Vec<(&'static str, f64)> {
        self.inner().options()
    }
}

impl Default for NavigationStrategy {
    fn default() -> Self {
        Self::new(StrategyKind::DirectPursuit)
    }
}

pub struct StrategyRegistry {
    strategies: HashMap<String, StrategyKind>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            strategies: HashMap::new(),
        };
        registry.register_builtin();
        registry
    }

    fn register_builtin(&mut self) {
        for kind in StrategyKind::ALL {
            self.register(kind.key(), kind);
        }
        self.register("direct", StrategyKind::DirectPursuit);
        self.register("naive", StrategyKind::DirectPursuit);
        self.register("ghost", StrategyKind::DirectPursuit);
        self.register("boids", StrategyKind::Flocking);
        self.register("predictive", StrategyKind::PredictiveAvoidance);
        self.register("rvo", StrategyKind::PredictiveAvoidance);
        self.register("scout", StrategyKind::PredictiveAvoidance);
    }

    pub fn register(&mut self, name: &str, kind: StrategyKind) {
        self.strategies.insert(name.to_lowercase(), kind);
    }

    pub fn lookup(&self, name: &str) -> Option<StrategyKind> {
        self.strategies.get(&name.trim().to_lowercase()).copied()
    }

    pub fn create(&self, name: &str) -> Option<NavigationStrategy> {
        self.lookup(name).map(NavigationStrategy::new)
    }

    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.strategies.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn aliases(&self, kind: StrategyKind) -> Vec<String> {
        let mut names: Vec<String> = self
            .strategies
            .iter()
            .filter(|(name, k)| **k == kind && name.as_str() != kind.key())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn global() -> &'static StrategyRegistry {
        use std::sync::OnceLock;
        static REGISTRY: OnceLock<StrategyRegistry> = OnceLock::new();
        REGISTRY.get_or_init(StrategyRegistry::new)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub struct StrategyBuilder {
    name: String,
    params: Vec<(String, f64)>,
}

impl StrategyBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: f64) -> Self {
        self.params.push((key.into(), value));
        self
    }

    pub fn build(self) -> Result<NavigationStrategy> {
        let mut strategy = StrategyRegistry::global()
            .create(&self.name)
            .ok_or_else(|| anyhow!("Unknown strategy: {}", self.name))?;
        for (key, value) in &self.params {
            strategy.set_option(key, *value)?;
        }
        Ok(strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_aliases_resolve() {
        let registry = StrategyRegistry::global();
        assert_eq!(registry.lookup("ghost"), Some(StrategyKind::DirectPursuit));
        assert_eq!(registry.lookup("Boids"), Some(StrategyKind::Flocking));
        assert_eq!(registry.lookup(" rvo "), Some(StrategyKind::PredictiveAvoidance));
        assert_eq!(registry.lookup("orca"), None);
    }

    #[test]
    fn test_kind_from_str_and_display() {
        let kind: StrategyKind = "predictive-avoidance".parse().unwrap();
        assert_eq!(kind, StrategyKind::PredictiveAvoidance);
        assert_eq!(kind.to_string(), "predictive-avoidance");
        assert!("nope".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_next_cycles_all_three() {
        let mut kind = StrategyKind::DirectPursuit;
        for expected in [StrategyKind::Flocking, StrategyKind::PredictiveAvoidance, StrategyKind::DirectPursuit] {
            kind = kind.next();
            assert_eq!(kind, expected);
        }
    }

    #[test]
    fn test_builder_applies_params() {
        let strategy = StrategyBuilder::new("boids")
            .param("separation_radius", 30.0)
            .param("goal_weight", 5.0)
            .build()
            .unwrap();
        let options = strategy.options();
        assert!(options.contains(&("separation_radius", 30.0)));
        assert!(options.contains(&("goal_weight", 5.0)));
    }

    #[test]
    fn test_builder_rejects_unknown_option() {
        assert!(StrategyBuilder::new("direct").param("goal_weight", 1.0).build().is_err());
        assert!(StrategyBuilder::new("scout").param("time_horizon", f64::NAN).build().is_err());
        assert!(StrategyBuilder::new("unknown").build().is_err());
    }

    #[test]
    fn test_arrived_agents_get_zero_velocity() {
        for kind in StrategyKind::ALL {
            // switching strategies implies a reset, so every kind starts from rest
            let mut agents = vec![
                Agent::new(0, Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), 5.0, 10.0),
                Agent::new(1, Vec2::new(100.0, 0.0), Vec2::new(200.0, 0.0), 5.0, 10.0),
            ];
            agents[0].advance(0.1); // already within radius of its goal
            assert!(agents[0].has_reached_goal());

            NavigationStrategy::new(kind).steer_all(&mut agents, false);
            assert_eq!(agents[0].velocity(), Vec2::ZERO);
            assert!(agents[1].velocity().length() > 0.0);
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let build = || -> Vec<Agent> {
            (0..100)
                .map(|i| {
                    let angle = i as f64 * std::f64::consts::TAU / 100.0;
                    let start = Vec2::new(angle.cos(), angle.sin()) * 150.0;
                    Agent::new(i, start, -start, 12.5, 100.0)
                })
                .collect()
        };

        for kind in StrategyKind::ALL {
            let strategy = NavigationStrategy::new(kind);
            let mut seq = build();
            let mut par = build();
            for _ in 0..20 {
                strategy.steer_all(&mut seq, false);
                strategy.steer_all(&mut par, true);
                for (a, b) in seq.iter_mut().zip(par.iter_mut()) {
                    a.advance(1.0 / 60.0);
                    b.advance(1.0 / 60.0);
                }
            }
            for (a, b) in seq.iter().zip(par.iter()) {
                assert_eq!(a.position(), b.position());
                assert_eq!(a.velocity(), b.velocity());
                assert_eq!(a.metrics(), b.metrics());
            }
        }
    }
}
