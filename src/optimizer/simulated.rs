//! Stand-in for the real-time iteration solver
//!
//! Candidates are quintic lateral rollouts towards offsets spread across the
//! lane, each with a sampled longitudinal acceleration. The feedback step
//! projects the initial guess into the installed constraints and returns it
//! as the solution.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use tracing::{debug, warn};

use super::rollout::{rollout, RolloutParams};
use super::{OptimizerAdapter, STATUS_OK};
use crate::common::types::*;
use crate::config::{PlannerConfig, RolloutConfig};
use crate::utils::interp::interp_one;

/// Feedback called without an initial guess
pub const STATUS_NO_GUESS: i32 = 2;
/// Feedback called without a preceding preparation step
pub const STATUS_NOT_PREPARED: i32 = 3;
/// Solution contains NaN
pub const STATUS_NAN: i32 = 4;
/// State arrays of the initial guess differ in length
pub const STATUS_RAGGED_GUESS: i32 = 5;

/// Share of the lane width used for lateral targets
const LATERAL_SPREAD: f64 = 0.8;

pub struct SimulatedOptimizer {
    horizon: usize,
    dt: f64,
    min_vx: f64,
    rollout_config: RolloutConfig,
    rng: StdRng,
    accel_dist: Option<Normal<f64>>,
    state_weights: Vec<f64>,
    control_weights: Vec<f64>,
    slack_weight: f64,
    input_bounds: (f64, f64),
    initial_state: Option<VehicleState>,
    guess: Trajectory,
    refs: ReferenceSet,
    constraint: PositionConstraint,
    path_extent: Option<(f64, f64)>,
    prepared: bool,
    solution: Trajectory,
}

impl SimulatedOptimizer {
    pub fn new(horizon: usize, dt: f64, min_vx: f64, rollout_config: RolloutConfig) -> Self {
        let rng = StdRng::seed_from_u64(rollout_config.seed);
        let accel_dist = Normal::new(0.0, rollout_config.accel_std).ok();
        Self {
            horizon,
            dt,
            min_vx,
            rollout_config,
            rng,
            accel_dist,
            state_weights: Vec::new(),
            control_weights: Vec::new(),
            slack_weight: 0.0,
            input_bounds: (0.0, f64::INFINITY),
            initial_state: None,
            guess: Trajectory::new(),
            refs: ReferenceSet::default(),
            constraint: PositionConstraint::default(),
            path_extent: None,
            prepared: false,
            solution: Trajectory::new(),
        }
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(config.horizon, config.step_dt, config.min_vx, config.rollout.clone())
    }

    pub fn state_weights(&self) -> &[f64] {
        &self.state_weights
    }

    pub fn control_weights(&self) -> &[f64] {
        &self.control_weights
    }

    pub fn slack_weight(&self) -> f64 {
        self.slack_weight
    }

    pub fn input_bounds(&self) -> (f64, f64) {
        self.input_bounds
    }

    pub fn references(&self) -> &ReferenceSet {
        &self.refs
    }

    pub fn initial_guess(&self) -> &Trajectory {
        &self.guess
    }

    fn sample_accel(&mut self) -> f64 {
        let max = self.rollout_config.max_accel.abs();
        match self.accel_dist {
            Some(dist) => dist.sample(&mut self.rng).clamp(-max, max),
            None => 0.0,
        }
    }

    fn lateral_targets(state: &VehicleState, path: &Path, count: usize) -> Vec<f64> {
        let lb = interp_one(state.s, path.s(), path.dlb()).unwrap_or(0.0) * LATERAL_SPREAD;
        let ub = interp_one(state.s, path.s(), path.dub()).unwrap_or(0.0) * LATERAL_SPREAD;
        if count == 1 {
            return vec![0.5 * (lb + ub)];
        }
        (0..count)
            .map(|i| lb + (ub - lb) * i as f64 / (count - 1) as f64)
            .collect()
    }

    fn project(&self, traj: &mut Trajectory) {
        let pc = &self.constraint;
        if pc.len() == traj.len() {
            for j in 0..traj.len() {
                traj.s[j] = traj.s[j].max(pc.slb[j]).min(pc.sub[j]);
                traj.d[j] = traj.d[j].max(pc.dlb[j]).min(pc.dub[j]);
            }
        }
        let umax = self.input_bounds.1;
        for u in traj.fx.iter_mut().chain(traj.fyf.iter_mut()) {
            *u = u.clamp(-umax, umax);
        }
    }
}

impl OptimizerAdapter for SimulatedOptimizer {
    fn configure_weights(&mut self, state_weights: &[f64], control_weights: &[f64], slack_weight: f64) {
        self.state_weights = state_weights.to_vec();
        self.control_weights = control_weights.to_vec();
        self.slack_weight = slack_weight;
    }

    fn sample_candidates(&mut self, state: &VehicleState, path: &Path, count: usize) -> Vec<Trajectory> {
        if let (Some(lo), Some(hi)) = (path.s_min(), path.s_max()) {
            self.path_extent = Some((lo, hi));
        }
        let targets = Self::lateral_targets(state, path, count);
        let mut candidates = Vec::with_capacity(count);
        for d_target in targets {
            let params = RolloutParams { d_target, accel: self.sample_accel() };
            match rollout(
                state,
                path,
                params,
                self.horizon,
                self.dt,
                self.rollout_config.mass,
                self.min_vx,
            ) {
                Ok(traj) => candidates.push(traj),
                Err(e) => warn!("rollout towards d = {:.2} failed: {}", d_target, e),
            }
        }
        candidates
    }

    fn shift_forward(&self, mut trajectory: Trajectory) -> Trajectory {
        for v in [
            &mut trajectory.s,
            &mut trajectory.d,
            &mut trajectory.deltapsi,
            &mut trajectory.psidot,
            &mut trajectory.vx,
            &mut trajectory.vy,
            &mut trajectory.fyf,
            &mut trajectory.fx,
        ] {
            if let Some(&last) = v.last() {
                v.remove(0);
                v.push(last);
            }
        }
        trajectory.clear_cartesian();
        trajectory.cost = 0.0;
        trajectory.colliding = false;
        trajectory.exitroad = false;
        trajectory
    }

    fn set_input_bounds(&mut self, lower: f64, upper: f64) {
        self.input_bounds = (lower, upper);
    }

    fn set_initial_state(&mut self, state: &VehicleState) {
        self.initial_state = Some(*state);
    }

    fn set_initial_guess(&mut self, trajectory: &Trajectory) {
        if trajectory.is_empty() {
            // the solver keeps its previous guess
            warn!("empty initial guess ignored");
            return;
        }
        self.guess = trajectory.clone();
    }

    fn set_references(&mut self, _trajectory: &Trajectory, refs: &ReferenceSet) {
        self.refs = refs.clone();
    }

    fn set_position_constraints(
        &mut self,
        trajectory: &Trajectory,
        _obstacles: &ObstacleSet,
        left: &[f64],
        right: &[f64],
    ) -> PositionConstraint {
        let n = trajectory.len();
        let (lo, hi) = self
            .path_extent
            .or_else(|| Some((trajectory.s.first().copied()?, trajectory.final_s()?)))
            .unwrap_or((f64::NEG_INFINITY, f64::INFINITY));
        self.constraint = PositionConstraint {
            slb: vec![lo; n],
            sub: vec![hi; n],
            dlb: right.to_vec(),
            dub: left.to_vec(),
        };
        self.constraint.clone()
    }

    fn prepare(&mut self) {
        self.prepared = true;
    }

    fn feedback(&mut self) -> i32 {
        if !self.prepared {
            return STATUS_NOT_PREPARED;
        }
        self.prepared = false;
        if self.guess.is_empty() {
            return STATUS_NO_GUESS;
        }
        let g = &self.guess;
        let n = g.len();
        if [g.d.len(), g.deltapsi.len(), g.psidot.len(), g.vx.len(), g.vy.len()].iter().any(|&len| len != n) {
            return STATUS_RAGGED_GUESS;
        }

        let mut solution = self.guess.clone();
        if let Some(x0) = self.initial_state {
            solution.s[0] = x0.s;
            solution.d[0] = x0.d;
            solution.deltapsi[0] = x0.deltapsi;
            solution.psidot[0] = x0.psidot;
            solution.vx[0] = x0.vx;
            solution.vy[0] = x0.vy;
        }
        self.project(&mut solution);
        solution.clear_cartesian();
        solution.cost = 0.0;
        solution.colliding = false;
        solution.exitroad = false;

        let has_nan = solution
            .s
            .iter()
            .chain(&solution.d)
            .chain(&solution.vx)
            .any(|v| v.is_nan());
        if has_nan {
            return STATUS_NAN;
        }
        debug!("feedback step solved {} samples", solution.len());
        self.solution = solution;
        STATUS_OK
    }

    fn current_solution(&self) -> Trajectory {
        self.solution.clone()
    }
}
