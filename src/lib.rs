pub mod agent;
pub mod geometry;
pub mod strategies;
pub mod metrics;
pub mod simulation;

pub use agent::Agent;
pub use geometry::Vec2;
pub use strategies::{NavigationStrategy, Strategy, StrategyKind};
pub use simulation::{Simulation, SimConfig};
pub use metrics::{BenchmarkRecorder, BenchmarkResult};

pub mod prelude {
    pub use crate::agent::{Agent, AgentMetrics, AgentState};
    pub use crate::geometry::Vec2;
    pub use crate::strategies::{NavigationStrategy, Strategy, StrategyBuilder, StrategyKind, StrategyRegistry};
    pub use crate::simulation::{Layout, Simulation, SimConfig, update_all};
    pub use crate::metrics::{BenchmarkRecorder, BenchmarkResult};
}
