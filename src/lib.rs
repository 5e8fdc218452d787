//! rti_planner - real-time trajectory planning in the Frenet frame
//!
//! Each cycle samples candidate trajectories around the reference path,
//! picks the cheapest collision-free one, wraps it in a position corridor
//! and hands it to a real-time iteration optimizer as the initial guess.

// Core modules
pub mod common;
pub mod config;
pub mod utils;

// Planner
pub mod optimizer;
pub mod planning;

// Re-export common types for convenience
pub use common::{GeometryError, PlannerError, PlannerResult};
pub use common::{Clock, RecordingPublisher, SystemClock, TrajectoryPublisher};
pub use common::{Obstacle, ObstacleSet, Path, PathSamples, PositionConstraint, ReferenceSet, Trajectory, VehicleState};
pub use config::PlannerConfig;
pub use optimizer::{OptimizerAdapter, SimulatedOptimizer};
pub use planning::{input_channels, ControlMode, CycleReport, LoopState, PlanningLoop};
