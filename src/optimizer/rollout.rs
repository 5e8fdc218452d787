// Candidate rollout in the Frenet frame
//
// Lateral motion is a quintic polynomial from the current offset to a target
// offset with zero lateral speed and acceleration at the end of the horizon.
// Longitudinal motion integrates a constant acceleration.

use nalgebra::{Matrix3, Vector3};

use crate::common::error::GeometryError;
use crate::common::types::{Path, Trajectory, VehicleState};
use crate::utils::interp::interp_one;

/// Quintic polynomial for lateral motion
#[derive(Debug, Clone, Copy)]
pub struct QuinticPolynomial {
    a0: f64,
    a1: f64,
    a2: f64,
    a3: f64,
    a4: f64,
    a5: f64,
}

impl QuinticPolynomial {
    pub fn new(xs: f64, vxs: f64, axs: f64, xe: f64, vxe: f64, axe: f64, time: f64) -> Self {
        let a0 = xs;
        let a1 = vxs;
        let a2 = axs / 2.0;

        let t2 = time * time;
        let t3 = t2 * time;
        let t4 = t3 * time;
        let t5 = t4 * time;

        let a = Matrix3::new(
            t3, t4, t5,
            3.0 * t2, 4.0 * t3, 5.0 * t4,
            6.0 * time, 12.0 * t2, 20.0 * t3,
        );
        let b = Vector3::new(
            xe - a0 - a1 * time - a2 * t2,
            vxe - a1 - 2.0 * a2 * time,
            axe - 2.0 * a2,
        );

        // singular only for time == 0, where the start conditions are all there is
        let x = a.try_inverse().map(|inv| inv * b).unwrap_or_else(Vector3::zeros);

        QuinticPolynomial { a0, a1, a2, a3: x[0], a4: x[1], a5: x[2] }
    }

    pub fn calc_point(&self, t: f64) -> f64 {
        self.a0 + self.a1 * t + self.a2 * t.powi(2) + self.a3 * t.powi(3) + self.a4 * t.powi(4) + self.a5 * t.powi(5)
    }

    pub fn calc_first_derivative(&self, t: f64) -> f64 {
        self.a1 + 2.0 * self.a2 * t + 3.0 * self.a3 * t.powi(2) + 4.0 * self.a4 * t.powi(3) + 5.0 * self.a5 * t.powi(4)
    }
}

/// One rollout request
#[derive(Debug, Clone, Copy)]
pub struct RolloutParams {
    /// Lateral offset at the end of the horizon [m]
    pub d_target: f64,
    /// Constant longitudinal acceleration [m/s^2]
    pub accel: f64,
}

/// Simulate `horizon` steps of `dt` from `state`.
///
/// The result has `horizon + 1` states and `horizon` controls; `Fx` is
/// `mass * accel` and `Fyf` the lateral force holding the yaw rate.
pub fn rollout(
    state: &VehicleState,
    path: &Path,
    params: RolloutParams,
    horizon: usize,
    dt: f64,
    mass: f64,
    min_vx: f64,
) -> Result<Trajectory, GeometryError> {
    let t_end = horizon as f64 * dt;
    let d_dot0 = state.vx * state.deltapsi.sin() + state.vy * state.deltapsi.cos();
    let lat = QuinticPolynomial::new(state.d, d_dot0, 0.0, params.d_target, 0.0, 0.0, t_end);

    let mut traj = Trajectory::new();
    let mut s = state.s;
    for k in 0..=horizon {
        let t = k as f64 * dt;
        let vx = (state.vx + params.accel * t).max(min_vx);
        let d_dot = lat.calc_first_derivative(t);
        traj.s.push(s);
        traj.d.push(lat.calc_point(t));
        traj.deltapsi.push(d_dot.atan2(vx));
        traj.vx.push(vx);
        traj.vy.push(0.0);
        s += vx * dt;
    }
    traj.deltapsi[0] = state.deltapsi;
    traj.vy[0] = state.vy;

    for k in 0..=horizon {
        let kappa = interp_one(traj.s[k], path.s(), path.kappa_c())?;
        let dpsi_rate = if k < horizon {
            (traj.deltapsi[k + 1] - traj.deltapsi[k]) / dt
        } else {
            0.0
        };
        traj.psidot.push(dpsi_rate + kappa * traj.vx[k]);
    }
    traj.psidot[0] = state.psidot;

    for k in 0..horizon {
        traj.fx.push(mass * params.accel);
        traj.fyf.push(mass * traj.vx[k] * traj.psidot[k]);
    }
    Ok(traj)
}
