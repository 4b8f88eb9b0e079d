// Boids-style steering: separation, alignment and cohesion plus a pull toward the goal.
// No collision counting here, spacing only emerges from the separation term.

use super::{Strategy, check_option, seek};
use crate::agent::AgentState;
use crate::geometry::Vec2;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockingParams {
    pub separation_radius: f64,
    pub alignment_radius: f64,
    pub cohesion_radius: f64,
    pub separation_weight: f64,
    pub alignment_weight: f64,
    pub cohesion_weight: f64,
    pub goal_weight: f64,
}

impl Default for FlockingParams {
    fn default() -> Self {
        Self {
            separation_radius: 50.0,
            alignment_radius: 80.0,
            cohesion_radius: 100.0,
            separation_weight: 2.0,
            alignment_weight: 1.0,
            cohesion_weight: 1.0,
            goal_weight: 3.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Flocking {
    params: FlockingParams,
}

impl Flocking {
    pub fn new(params: FlockingParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &FlockingParams {
        &self.params
    }

    /// Other agents strictly inside `radius`, skipping exact overlaps.
    fn neighbors<'a>(
        index: usize,
        snapshot: &'a [AgentState],
        radius: f64,
    ) -> impl Iterator<Item = (&'a AgentState, f64)> + 'a {
        let position = snapshot[index].position;
        snapshot
            .iter()
            .enumerate()
            .filter(move |(j, _)| *j != index)
            .map(move |(_, other)| (other, position.distance(other.position)))
            .filter(move |(_, distance)| *distance > 0.0 && *distance < radius)
    }

    fn separation(&self, index: usize, snapshot: &[AgentState]) -> Vec2 {
        let agent = &snapshot[index];
        let mut steer = Vec2::ZERO;
        let mut count = 0usize;

        for (other, distance) in Self::neighbors(index, snapshot, self.params.separation_radius) {
            // closer neighbours push harder
            steer += (agent.position - other.position).normalize() / distance;
            count += 1;
        }

        if count == 0 {
            return Vec2::ZERO;
        }
        (steer / count as f64).with_length(agent.max_speed) - agent.velocity
    }

    fn alignment(&self, index: usize, snapshot: &[AgentState]) -> Vec2 {
        let agent = &snapshot[index];
        let mut sum = Vec2::ZERO;
        let mut count = 0usize;

        for (other, _) in Self::neighbors(index, snapshot, self.params.alignment_radius) {
            sum += other.velocity;
            count += 1;
        }

        if count == 0 {
            return Vec2::ZERO;
        }
        (sum / count as f64).with_length(agent.max_speed) - agent.velocity
    }

    fn cohesion(&self, index: usize, snapshot: &[AgentState]) -> Vec2 {
        let mut sum = Vec2::ZERO;
        let mut count = 0usize;

        for (other, _) in Self::neighbors(index, snapshot, self.params.cohesion_radius) {
            sum += other.position;
            count += 1;
        }

        if count == 0 {
            return Vec2::ZERO;
        }
        seek(&snapshot[index], sum / count as f64)
    }
}

impl Strategy for Flocking {
    fn steer(&self, index: usize, snapshot: &[AgentState]) -> Vec2 {
        let agent = &snapshot[index];
        let p = &self.params;

        let total = self.separation(index, snapshot) * p.separation_weight
            + self.alignment(index, snapshot) * p.alignment_weight
            + self.cohesion(index, snapshot) * p.cohesion_weight
            + seek(agent, agent.goal) * p.goal_weight;

        total.limit(agent.max_speed)
    }

    fn name(&self) -> &str {
        "Flocking (Reactive Approach)"
    }

    fn set_option(&mut self, key: &str, value: f64) -> Result<()> {
        let p = &mut self.params;
        let (slot, non_negative) = match key {
            "separation_radius" => (&mut p.separation_radius, true),
            "alignment_radius" => (&mut p.alignment_radius, true),
            "cohesion_radius" => (&mut p.cohesion_radius, true),
            "separation_weight" => (&mut p.separation_weight, false),
            "alignment_weight" => (&mut p.alignment_weight, false),
            "cohesion_weight" => (&mut p.cohesion_weight, false),
            "goal_weight" => (&mut p.goal_weight, false),
            _ => bail!("Flocking has no option {}", key),
        };
        check_option(key, value, non_negative)?;
        *slot = value;
        Ok(())
    }

    fn options(&self) -> Vec<(&'static str, f64)> {
        let p = &self.params;
        vec![
            ("separation_radius", p.separation_radius),
            ("alignment_radius", p.alignment_radius),
            ("cohesion_radius", p.cohesion_radius),
            ("separation_weight", p.separation_weight),
            ("alignment_weight", p.alignment_weight),
            ("cohesion_weight", p.cohesion_weight),
            ("goal_weight", p.goal_weight),
        ]
    }
}
