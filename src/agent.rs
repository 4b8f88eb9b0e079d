use crate::geometry::Vec2;
use serde::{Deserialize, Serialize};

/// A point agent walking from its start position to a fixed goal.
///
/// Position is only ever changed by [`Agent::advance`]; velocity only by
/// [`Agent::set_velocity`], which strategies call once per tick.
#[derive(Debug, Clone)]
pub struct Agent {
    id: u32,
    position: Vec2,
    velocity: Vec2,
    goal: Vec2,
    radius: f64,
    max_speed: f64,
    metrics: AgentMetrics,
}

/// Run-scoped counters. All of them only ever grow, `reached_goal` only flips once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentMetrics {
    pub distance_traveled: f64,
    pub collision_count: u64,
    pub reached_goal: bool,
    pub time_to_goal: f64,
}

/// Read-only copy of everything a strategy looks at for one agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub goal: Vec2,
    pub radius: f64,
    pub max_speed: f64,
    pub reached_goal: bool,
}

impl Agent {
    pub fn new(id: u32, position: Vec2, goal: Vec2, radius: f64, max_speed: f64) -> Self {
        Self {
            id,
            position,
            velocity: Vec2::ZERO,
            goal,
            radius,
            max_speed,
            metrics: AgentMetrics::default(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn goal(&self) -> Vec2 {
        self.goal
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }

    pub fn metrics(&self) -> AgentMetrics {
        self.metrics
    }

    pub fn distance_traveled(&self) -> f64 {
        self.metrics.distance_traveled
    }

    pub fn collision_count(&self) -> u64 {
        self.metrics.collision_count
    }

    pub fn has_reached_goal(&self) -> bool {
        self.metrics.reached_goal
    }

    pub fn time_to_goal(&self) -> f64 {
        self.metrics.time_to_goal
    }

    pub fn distance_to_goal(&self) -> f64 {
        self.position.distance(self.goal)
    }

    pub fn state(&self) -> AgentState {
        AgentState {
            position: self.position,
            velocity: self.velocity,
            goal: self.goal,
            radius: self.radius,
            max_speed: self.max_speed,
            reached_goal: self.metrics.reached_goal,
        }
    }

    /// Sole write path for velocity. An arrived agent stays parked at zero.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = if self.metrics.reached_goal { Vec2::ZERO } else { velocity };
    }

    pub fn record_collision(&mut self) {
        self.metrics.collision_count += 1;
    }

    /// Integrate one tick of motion and update the run metrics.
    pub fn advance(&mut self, elapsed_seconds: f64) {
        let displacement = self.velocity * elapsed_seconds;
        self.position += displacement;
        self.metrics.distance_traveled += displacement.length();

        if self.metrics.reached_goal {
            return;
        }

        if self.position.distance(self.goal) < self.radius {
            self.metrics.reached_goal = true;
            self.velocity = Vec2::ZERO;
        } else {
            self.metrics.time_to_goal += elapsed_seconds;
        }
    }

    pub fn reset_metrics(&mut self) {
        self.metrics = AgentMetrics::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walker() -> Agent {
        Agent::new(0, Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0), 10.0, 50.0)
    }

    #[test]
    fn test_new_agent_is_at_rest() {
        let agent = walker();
        assert_eq!(agent.velocity(), Vec2::ZERO);
        assert_eq!(agent.metrics(), AgentMetrics::default());
    }

    #[test]
    fn test_advance_moves_and_accumulates() {
        let mut agent = walker();
        agent.set_velocity(Vec2::new(50.0, 0.0));
        agent.advance(0.5);

        assert_eq!(agent.position(), Vec2::new(25.0, 0.0));
        assert_eq!(agent.distance_traveled(), 25.0);
        assert_eq!(agent.time_to_goal(), 0.5);
        assert!(!agent.has_reached_goal());
    }

    #[test]
    fn test_arrival_tick_does_not_add_time() {
        let mut agent = walker();
        agent.set_velocity(Vec2::new(50.0, 0.0));
        agent.advance(1.0); // x = 50
        agent.advance(0.9); // x = 95, within radius
        assert!(agent.has_reached_goal());
        assert_eq!(agent.time_to_goal(), 1.0);
        assert_eq!(agent.velocity(), Vec2::ZERO);
    }

    #[test]
    fn test_arrived_agent_ignores_velocity_writes() {
        let mut agent = walker();
        agent.set_velocity(Vec2::new(50.0, 0.0));
        agent.advance(1.95);
        assert!(agent.has_reached_goal());

        agent.set_velocity(Vec2::new(10.0, 10.0));
        assert_eq!(agent.velocity(), Vec2::ZERO);

        let frozen = agent.time_to_goal();
        agent.advance(1.0);
        assert_eq!(agent.time_to_goal(), frozen);
        assert!(agent.has_reached_goal());
    }

    #[test]
    fn test_reset_metrics() {
        let mut agent = walker();
        agent.record_collision();
        agent.set_velocity(Vec2::new(10.0, 0.0));
        agent.advance(1.0);
        agent.reset_metrics();
        assert_eq!(agent.metrics(), AgentMetrics::default());
    }
}
