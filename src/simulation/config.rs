use crate::agent::Agent;
use crate::geometry::Vec2;
use crate::strategies::{FlockingParams, PredictiveParams, StrategyKind};
use anyhow::{Context, Result, bail};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::path::Path;

/// Where agents start and where they are headed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Layout {
    /// Evenly spaced on a circle, each goal at the opposite point.
    Circle { center: Vec2, radius: f64 },
    /// Seeded uniform starts and goals inside a `width` x `height` box.
    Scatter { seed: u64, width: f64, height: f64 },
}

impl Default for Layout {
    fn default() -> Self {
        Layout::Circle {
            center: Vec2::new(450.0, 400.0),
            radius: 150.0,
        }
    }
}

impl Layout {
    /// A scatter box with a negative or non-finite side collapses to zero along that side.
    pub fn build_agents(&self, count: u32, agent_radius: f64, max_speed: f64) -> Vec<Agent> {
        match self {
            Layout::Circle { center, radius } => (0..count)
                .map(|i| {
                    let angle = i as f64 * TAU / count as f64;
                    let offset = Vec2::new(angle.cos(), angle.sin()) * *radius;
                    Agent::new(i, *center + offset, *center - offset, agent_radius, max_speed)
                })
                .collect(),
            Layout::Scatter { seed, width, height } => {
                let (width, height) = (extent(*width), extent(*height));
                let mut rng = StdRng::seed_from_u64(*seed);
                (0..count)
                    .map(|i| {
                        let start = Vec2::new(rng.gen_range(0.0..=width), rng.gen_range(0.0..=height));
                        let goal = Vec2::new(rng.gen_range(0.0..=width), rng.gen_range(0.0..=height));
                        Agent::new(i, start, goal, agent_radius, max_speed)
                    })
                    .collect()
            }
        }
    }
}

fn extent(side: f64) -> f64 {
    if side.is_finite() && side > 0.0 { side } else { 0.0 }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub name: String,
    pub strategy: StrategyKind,
    pub num_agents: u32,
    pub agent_radius: f64,
    pub max_speed: f64,
    pub layout: Layout,
    /// Fixed step used by headless runs.
    pub tick_seconds: f64,
    pub max_ticks: u64,
    pub parallel: bool,
    pub show_progress: bool,
    pub flocking: FlockingParams,
    pub predictive: PredictiveParams,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            name: "default_sim".to_string(),
            strategy: StrategyKind::DirectPursuit,
            num_agents: 20,
            agent_radius: 12.5,
            max_speed: 100.0,
            layout: Layout::default(),
            tick_seconds: 1.0 / 60.0,
            max_ticks: 3600,
            parallel: false,
            show_progress: false,
            flocking: FlockingParams::default(),
            predictive: PredictiveParams::default(),
        }
    }
}

impl SimConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: SimConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.agent_radius.is_finite() && self.agent_radius > 0.0) {
            bail!("agent_radius must be positive, got {}", self.agent_radius);
        }
        if !(self.max_speed.is_finite() && self.max_speed > 0.0) {
            bail!("max_speed must be positive, got {}", self.max_speed);
        }
        if !(self.tick_seconds.is_finite() && self.tick_seconds > 0.0) {
            bail!("tick_seconds must be positive, got {}", self.tick_seconds);
        }
        match &self.layout {
            Layout::Circle { radius, .. } if !(radius.is_finite() && *radius >= 0.0) => {
                bail!("circle radius must be non-negative, got {}", radius)
            }
            Layout::Scatter { width, height, .. }
                if !(width.is_finite() && height.is_finite() && *width >= 0.0 && *height >= 0.0) =>
            {
                bail!("scatter area must be non-negative, got {}x{}", width, height)
            }
            _ => {}
        }
        Ok(())
    }

    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_agents(mut self, num_agents: u32) -> Self {
        self.num_agents = num_agents;
        self
    }

    pub fn with_scatter(mut self, seed: u64, width: f64, height: f64) -> Self {
        self.layout = Layout::Scatter { seed, width, height };
        self
    }

    pub fn build_agents(&self) -> Vec<Agent> {
        self.layout.build_agents(self.num_agents, self.agent_radius, self.max_speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_goals_are_antipodal() {
        let config = SimConfig::default();
        let agents = config.build_agents();
        assert_eq!(agents.len(), 20);
        let center = Vec2::new(450.0, 400.0);
        for agent in &agents {
            let midpoint = (agent.position() + agent.goal()) / 2.0;
            assert!(midpoint.distance(center) < 1e-9);
            assert!((agent.position().distance(center) - 150.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_scatter_is_reproducible() {
        let config = SimConfig::default().with_scatter(7, 800.0, 600.0);
        let a = config.build_agents();
        let b = config.build_agents();
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.position(), y.position());
            assert_eq!(x.goal(), y.goal());
            assert!(x.position().x <= 800.0 && x.position().y <= 600.0);
        }
    }

    #[test]
    fn test_degenerate_scatter_box_does_not_panic() {
        for (width, height) in [(-10.0, 50.0), (f64::NAN, 50.0), (50.0, f64::INFINITY)] {
            let agents = Layout::Scatter { seed: 3, width, height }.build_agents(5, 10.0, 50.0);
            assert_eq!(agents.len(), 5);
            for agent in &agents {
                assert!(agent.position().is_finite() && agent.goal().is_finite());
            }
            if width < 0.0 || width.is_nan() {
                assert!(agents.iter().all(|a| a.position().x == 0.0 && a.goal().x == 0.0));
            } else {
                assert!(agents.iter().all(|a| a.position().y == 0.0 && a.goal().y == 0.0));
            }
        }
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let json = r#"{
            "strategy": "flocking",
            "num_agents": 8,
            "layout": { "type": "scatter", "seed": 3, "width": 100.0, "height": 100.0 },
            "flocking": { "separation_radius": 30.0 }
        }"#;
        let config: SimConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.strategy, StrategyKind::Flocking);
        assert_eq!(config.num_agents, 8);
        assert_eq!(config.flocking.separation_radius, 30.0);
        assert_eq!(config.flocking.goal_weight, 3.0);
        assert_eq!(config.max_speed, 100.0);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = SimConfig::default();
        config.tick_seconds = 0.0;
        assert!(config.validate().is_err());

        let mut config = SimConfig::default();
        config.max_speed = f64::NAN;
        assert!(config.validate().is_err());

        let config = SimConfig::default().with_scatter(1, -5.0, 10.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(SimConfig::load("/nonexistent/crowdbench.json").is_err());
    }
}
