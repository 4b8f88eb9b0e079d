// Velocity-obstacle style avoidance. Solves for the time until two discs touch
// and, if that falls inside the horizon, heads for where the gap will be.

use super::{Strategy, check_option};
use crate::agent::AgentState;
use crate::geometry::Vec2;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictiveParams {
    /// Seconds ahead a predicted collision is still reacted to.
    pub time_horizon: f64,
    pub neighbor_distance: f64,
}

impl Default for PredictiveParams {
    fn default() -> Self {
        Self {
            time_horizon: 2.0,
            neighbor_distance: 50.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PredictiveAvoidance {
    params: PredictiveParams,
}

impl PredictiveAvoidance {
    pub fn new(params: PredictiveParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &PredictiveParams {
        &self.params
    }

    /// Toward the goal, slowing down once closer than one second of travel.
    pub fn preferred_velocity(agent: &AgentState) -> Vec2 {
        let to_goal = agent.goal - agent.position;
        let distance = to_goal.length();
        if distance > 0.0 {
            to_goal.with_length(agent.max_speed.min(distance))
        } else {
            to_goal
        }
    }

    /// Earliest time in `[0, time_horizon]` at which the two discs touch, if any.
    pub fn time_to_collision(&self, agent: &AgentState, other: &AgentState) -> Option<f64> {
        let p = other.position - agent.position;
        let v = other.velocity - agent.velocity;
        let r = agent.radius + other.radius;

        let dot = v.dot(p);
        if dot > 0.0 {
            return None; // moving apart
        }

        let speed_sq = v.length_squared();
        if speed_sq <= f64::EPSILON {
            return None;
        }

        let discriminant = dot * dot - speed_sq * (p.length_squared() - r * r);
        if discriminant < 0.0 {
            return None;
        }

        let t = -(dot + discriminant.sqrt()) / speed_sq;
        if !(0.0..=self.params.time_horizon).contains(&t) {
            return None;
        }
        Some(t)
    }

    /// Heading toward the relative position at the moment of contact.
    pub fn avoidance_velocity(&self, agent: &AgentState, other: &AgentState) -> Option<Vec2> {
        let t = self.time_to_collision(agent, other)?;
        let p = other.position - agent.position;
        let v = other.velocity - agent.velocity;
        let avoid = (p + v * t).with_length(agent.max_speed);
        if avoid.is_zero() { None } else { Some(avoid) }
    }
}

impl Strategy for PredictiveAvoidance {
    fn steer(&self, index: usize, snapshot: &[AgentState]) -> Vec2 {
        let agent = &snapshot[index];

        // First threat in creation order wins, no blending.
        let avoid = snapshot
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != index)
            .filter(|(_, other)| {
                let distance = agent.position.distance(other.position);
                distance > 0.0 && distance < self.params.neighbor_distance
            })
            .find_map(|(_, other)| self.avoidance_velocity(agent, other));

        avoid
            .unwrap_or_else(|| Self::preferred_velocity(agent))
            .limit(agent.max_speed)
    }

    fn name(&self) -> &str {
        "Predictive Avoidance (Predictive Approach)"
    }

    fn set_option(&mut self, key: &str, value: f64) -> Result<()> {
        let slot = match key {
            "time_horizon" => &mut self.params.time_horizon,
            "neighbor_distance" => &mut self.params.neighbor_distance,
            _ => bail!("Predictive avoidance has no option {}", key),
        };
        check_option(key, value, true)?;
        *slot = value;
        Ok(())
    }

    fn options(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("time_horizon", self.params.time_horizon),
            ("neighbor_distance", self.params.neighbor_distance),
        ]
    }
}
