//! Common traits at the planner boundaries

use std::time::{Duration, Instant};

use crate::common::types::*;

/// Time source for the readiness wait and the cycle rate
pub trait Clock {
    /// Monotonic time since an arbitrary origin
    fn now(&self) -> Duration;

    /// Suspend the caller
    fn sleep(&mut self, duration: Duration);
}

/// Wall clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Outbound side of the planner
pub trait TrajectoryPublisher {
    /// Selected candidate together with the corridor it was constrained to
    fn publish_selected(&mut self, trajectory: &Trajectory, constraint: &PositionConstraint);

    /// Optimizer output for the cycle
    fn publish_optimized(&mut self, trajectory: &Trajectory);
}

/// Publisher that keeps everything it receives
#[derive(Debug, Clone, Default)]
pub struct RecordingPublisher {
    pub selected: Vec<(Trajectory, PositionConstraint)>,
    pub optimized: Vec<Trajectory>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrajectoryPublisher for RecordingPublisher {
    fn publish_selected(&mut self, trajectory: &Trajectory, constraint: &PositionConstraint) {
        self.selected.push((trajectory.clone(), constraint.clone()));
    }

    fn publish_optimized(&mut self, trajectory: &Trajectory) {
        self.optimized.push(trajectory.clone());
    }
}
