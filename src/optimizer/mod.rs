//! Boundary to the real-time iteration trajectory optimizer
//!
//! The solver itself is an external collaborator. The planning loop talks to
//! it only through [`OptimizerAdapter`]; [`SimulatedOptimizer`] is a
//! self-contained implementation for simulation and tests.

pub mod rollout;
pub mod simulated;

pub use rollout::{rollout, QuinticPolynomial, RolloutParams};
pub use simulated::SimulatedOptimizer;

use crate::common::types::*;

/// Feedback status of a successful solve
pub const STATUS_OK: i32 = 0;

/// Input/output contract of the optimizer
pub trait OptimizerAdapter {
    /// Called once at startup
    fn configure_weights(&mut self, state_weights: &[f64], control_weights: &[f64], slack_weight: f64);

    /// Roll out `count` candidate trajectories from the current state
    fn sample_candidates(&mut self, state: &VehicleState, path: &Path, count: usize) -> Vec<Trajectory>;

    /// Advance a trajectory by one step for reuse as a candidate
    fn shift_forward(&self, trajectory: Trajectory) -> Trajectory;

    fn set_input_bounds(&mut self, lower: f64, upper: f64);

    fn set_initial_state(&mut self, state: &VehicleState);

    fn set_initial_guess(&mut self, trajectory: &Trajectory);

    fn set_references(&mut self, trajectory: &Trajectory, refs: &ReferenceSet);

    /// Install the position constraints; returns the corridor the solver uses
    fn set_position_constraints(
        &mut self,
        trajectory: &Trajectory,
        obstacles: &ObstacleSet,
        left: &[f64],
        right: &[f64],
    ) -> PositionConstraint;

    /// Preparation half of a real-time iteration
    fn prepare(&mut self);

    /// Feedback half of a real-time iteration; nonzero status is fatal
    fn feedback(&mut self) -> i32;

    fn current_solution(&self) -> Trajectory;
}
