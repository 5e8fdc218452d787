//! Cost evaluation, collision and road-exit checking of a candidate set
//!
//! Every candidate accumulates the running cost
//! `w_s * (sref - s)^2 + w_v * (vxref - vx)^2` over its samples. A candidate
//! that comes closer than `Rmgn` to any obstacle, or leaves the lane bounds,
//! at any step gets one slack penalty per violated condition. The cheapest
//! candidate below `10 * slack` is selected.

use itertools::izip;
use nalgebra::Vector2;
use tracing::{debug, warn};

use crate::common::error::GeometryError;
use crate::common::types::{ObstacleSet, Path, ReferenceSet, Trajectory};
use crate::config::PlannerConfig;
use crate::utils::interp::interp;

/// Scores candidates and picks the cheapest
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectorySetEvaluator {
    s_weight: f64,
    vx_weight: f64,
    slack: f64,
}

impl TrajectorySetEvaluator {
    pub fn new(s_weight: f64, vx_weight: f64, slack: f64) -> Self {
        Self { s_weight, vx_weight, slack }
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(
            config.weights.s_weight(),
            config.weights.vx_weight(),
            config.weights.slack,
        )
    }

    pub fn slack(&self) -> f64 {
        self.slack
    }

    /// Cost a candidate must beat to be selected at all
    pub fn sentinel_cost(&self) -> f64 {
        10.0 * self.slack
    }

    /// Running cost contribution of one step
    pub fn step_cost(&self, s: f64, vx: f64, sref: f64, vxref: f64) -> f64 {
        self.s_weight * (sref - s).powi(2) + self.vx_weight * (vxref - vx).powi(2)
    }

    /// Set `cost`, `colliding` and `exitroad` of one candidate
    pub fn evaluate_trajectory(
        &self,
        traj: &mut Trajectory,
        path: &Path,
        obstacles: &ObstacleSet,
        refs: &ReferenceSet,
    ) -> Result<(), GeometryError> {
        let n = traj.len();
        if n == 0 {
            return Err(GeometryError::EmptySamples);
        }
        let states = [&traj.s, &traj.d, &traj.deltapsi, &traj.psidot, &traj.vx, &traj.vy];
        for samples in states {
            if samples.len() != n {
                return Err(GeometryError::LengthMismatch { expected: n, found: samples.len() });
            }
        }
        for samples in states {
            if let Some(index) = samples.iter().position(|v| v.is_nan()) {
                return Err(GeometryError::NotANumber { index });
            }
        }
        if refs.sref.len() < n || refs.vxref.len() < n {
            return Err(GeometryError::LengthMismatch {
                expected: n,
                found: refs.sref.len().min(refs.vxref.len()),
            });
        }

        let dub = interp(&traj.s, path.s(), path.dub())?;
        let dlb = interp(&traj.s, path.s(), path.dlb())?;

        let mut colliding = false;
        let mut exitroad = false;
        let mut cost = 0.0;
        for (&s, &d, &vx, &ub, &lb, &sref, &vxref) in
            izip!(&traj.s, &traj.d, &traj.vx, &dub, &dlb, &refs.sref, &refs.vxref)
        {
            let p = Vector2::new(s, d);
            if obstacles
                .iter()
                .any(|obs| (p - Vector2::new(obs.s, obs.d)).norm() < obs.r_mgn)
            {
                colliding = true;
            }
            if d > ub || d < lb {
                exitroad = true;
            }
            cost += self.step_cost(s, vx, sref, vxref);
        }
        if colliding {
            cost += self.slack;
        }
        if exitroad {
            cost += self.slack;
        }

        traj.cost = cost;
        traj.colliding = colliding;
        traj.exitroad = exitroad;
        Ok(())
    }

    /// Evaluate all candidates in place and return the index of the cheapest.
    ///
    /// `None` means no candidate came in under [`Self::sentinel_cost`].
    /// Candidates that cannot be evaluated get an infinite cost.
    pub fn evaluate(
        &self,
        candidates: &mut [Trajectory],
        path: &Path,
        obstacles: &ObstacleSet,
        refs: &ReferenceSet,
    ) -> Option<usize> {
        self.score(candidates, path, obstacles, refs);
        self.select(candidates)
    }

    /// Set the cost and flags of every candidate without selecting
    pub fn score(&self, candidates: &mut [Trajectory], path: &Path, obstacles: &ObstacleSet, refs: &ReferenceSet) {
        for (i, traj) in candidates.iter_mut().enumerate() {
            if let Err(e) = self.evaluate_trajectory(traj, path, obstacles, refs) {
                warn!("candidate {} unusable: {}", i, e);
                traj.cost = f64::INFINITY;
                continue;
            }
            debug!(
                "candidate {}: cost {:.3} colliding {} exitroad {}",
                i, traj.cost, traj.colliding, traj.exitroad
            );
        }
    }

    /// Index of the first candidate with the strictly lowest cost below the sentinel
    pub fn select(&self, candidates: &[Trajectory]) -> Option<usize> {
        let mut min_cost = self.sentinel_cost();
        let mut best = None;
        for (i, traj) in candidates.iter().enumerate() {
            if traj.cost < min_cost {
                min_cost = traj.cost;
                best = Some(i);
            }
        }
        best
    }
}
