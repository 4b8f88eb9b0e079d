// Baseline with no avoidance at all, everything else is measured against it

use super::Strategy;
use crate::agent::{Agent, AgentState};
use crate::geometry::Vec2;
use anyhow::{Result, bail};

#[derive(Debug, Clone, Default)]
pub struct DirectPursuit;

impl DirectPursuit {
    pub fn new() -> Self {
        Self
    }
}

/// Count every overlapping pair once per participant.
///
/// Level-triggered: a pair that stays overlapped is counted again on every tick.
pub fn count_collisions(agents: &mut [Agent]) {
    for i in 0..agents.len() {
        for j in (i + 1)..agents.len() {
            let distance = agents[i].position().distance(agents[j].position());
            if distance < agents[i].radius() + agents[j].radius() {
                agents[i].record_collision();
                agents[j].record_collision();
            }
        }
    }
}

impl Strategy for DirectPursuit {
    fn steer(&self, index: usize, snapshot: &[AgentState]) -> Vec2 {
        let agent = &snapshot[index];
        (agent.goal - agent.position).with_length(agent.max_speed)
    }

    fn after_steer(&self, agents: &mut [Agent]) {
        count_collisions(agents);
    }

    fn name(&self) -> &str {
        "Direct Pursuit (Naive Approach)"
    }

    fn set_option(&mut self, key: &str, _value: f64) -> Result<()> {
        bail!("Direct pursuit has no option {}", key)
    }

    fn options(&self) -> Vec<(&'static str, f64)> {
        Vec::new()
    }
}
