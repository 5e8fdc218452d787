//! Common types used throughout rti_planner

use itertools::Itertools;

use crate::common::error::{PlannerError, PlannerResult};

/// Minimum longitudinal speed accepted from the state estimate.
/// The curvilinear dynamics are singular at `vx == 0`.
pub const MIN_VX: f64 = 0.1;

/// Raw parallel arrays of a reference path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathSamples {
    pub s: Vec<f64>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub psi_c: Vec<f64>,
    pub kappa_c: Vec<f64>,
    /// Bank angle, carried through but not used by the planner core
    pub theta_c: Vec<f64>,
    /// Left lateral bound
    pub dub: Vec<f64>,
    /// Right lateral bound
    pub dlb: Vec<f64>,
}

/// Reference path tabulated over strictly increasing arc length
///
/// Constructed only through [`Path::new`], which checks the invariants, so the
/// arrays are read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    samples: PathSamples,
}

impl Path {
    pub fn new(mut samples: PathSamples) -> PlannerResult<Self> {
        let n = samples.s.len();
        if samples.theta_c.is_empty() {
            samples.theta_c = vec![0.0; n];
        }
        let lengths = [
            ("X", samples.x.len()),
            ("Y", samples.y.len()),
            ("psi_c", samples.psi_c.len()),
            ("kappa_c", samples.kappa_c.len()),
            ("theta_c", samples.theta_c.len()),
            ("dub", samples.dub.len()),
            ("dlb", samples.dlb.len()),
        ];
        if let Some((name, len)) = lengths.iter().find(|(_, len)| *len != n) {
            return Err(PlannerError::InvalidPath(format!(
                "{} has {} samples, s has {}",
                name, len, n
            )));
        }
        if let Some((i, _)) = samples
            .s
            .iter()
            .tuple_windows()
            .enumerate()
            .find(|(_, (a, b))| !(b > a))
        {
            return Err(PlannerError::InvalidPath(format!(
                "s is not strictly increasing at index {}",
                i + 1
            )));
        }
        Ok(Self { samples })
    }

    /// Build a path from a Cartesian centerline with a constant lane half width.
    ///
    /// Arc length is the cumulative chord length, heading comes from the
    /// forward difference and curvature from the heading change per meter.
    pub fn from_centerline(x: &[f64], y: &[f64], half_width: f64) -> PlannerResult<Self> {
        if x.len() != y.len() || x.len() < 2 {
            return Err(PlannerError::InvalidPath(
                "centerline needs at least two points with matching X and Y".to_string(),
            ));
        }

        let mut s = vec![0.0];
        let mut psi_c = Vec::with_capacity(x.len());
        for i in 1..x.len() {
            let dx = x[i] - x[i - 1];
            let dy = y[i] - y[i - 1];
            s.push(s[i - 1] + (dx.powi(2) + dy.powi(2)).sqrt());
            psi_c.push(dy.atan2(dx));
        }
        let last_heading = psi_c[psi_c.len() - 1];
        psi_c.push(last_heading);

        let mut kappa_c = Vec::with_capacity(x.len());
        for i in 0..x.len() - 1 {
            let ds = s[i + 1] - s[i];
            let dpsi = normalize_angle(psi_c[i + 1] - psi_c[i]);
            kappa_c.push(if ds > 0.0 { dpsi / ds } else { 0.0 });
        }
        let last_kappa = kappa_c[kappa_c.len() - 1];
        kappa_c.push(last_kappa);

        let n = x.len();
        Self::new(PathSamples {
            s,
            x: x.to_vec(),
            y: y.to_vec(),
            psi_c,
            kappa_c,
            theta_c: vec![0.0; n],
            dub: vec![half_width; n],
            dlb: vec![-half_width; n],
        })
    }

    pub fn len(&self) -> usize {
        self.samples.s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.s.is_empty()
    }

    pub fn s(&self) -> &[f64] {
        &self.samples.s
    }

    pub fn x(&self) -> &[f64] {
        &self.samples.x
    }

    pub fn y(&self) -> &[f64] {
        &self.samples.y
    }

    pub fn psi_c(&self) -> &[f64] {
        &self.samples.psi_c
    }

    pub fn kappa_c(&self) -> &[f64] {
        &self.samples.kappa_c
    }

    pub fn theta_c(&self) -> &[f64] {
        &self.samples.theta_c
    }

    pub fn dub(&self) -> &[f64] {
        &self.samples.dub
    }

    pub fn dlb(&self) -> &[f64] {
        &self.samples.dlb
    }

    /// Arc length of the first sample
    pub fn s_min(&self) -> Option<f64> {
        self.samples.s.first().copied()
    }

    /// Arc length of the last sample
    pub fn s_max(&self) -> Option<f64> {
        self.samples.s.last().copied()
    }
}

/// Normalize angle to [-pi, pi]
pub fn normalize_angle(angle: f64) -> f64 {
    let two_pi = 2.0 * std::f64::consts::PI;
    let mut a = angle % two_pi;
    if a > std::f64::consts::PI {
        a -= two_pi;
    } else if a < -std::f64::consts::PI {
        a += two_pi;
    }
    a
}

/// Vehicle state in the Frenet frame of the current path
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VehicleState {
    pub s: f64,
    pub d: f64,
    pub deltapsi: f64,
    pub psidot: f64,
    pub vx: f64,
    pub vy: f64,
}

impl VehicleState {
    pub fn new(s: f64, d: f64, deltapsi: f64, psidot: f64, vx: f64, vy: f64) -> Self {
        Self { s, d, deltapsi, psidot, vx, vy }
    }

    /// Copy of the state with `vx` raised to [`MIN_VX`]
    pub fn clamped(self) -> Self {
        self.clamped_to(MIN_VX)
    }

    /// Copy of the state with `vx` raised to `min_vx`
    pub fn clamped_to(mut self, min_vx: f64) -> Self {
        if self.vx <= min_vx {
            self.vx = min_vx;
        }
        self
    }
}

/// Obstacle in the Frenet frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub s: f64,
    pub d: f64,
    /// Physical radius [m]
    pub r: f64,
    /// Clearance radius used by the collision check [m]
    pub r_mgn: f64,
}

impl Obstacle {
    pub fn new(s: f64, d: f64, r: f64, r_mgn: f64) -> Self {
        Self { s, d, r, r_mgn }
    }

    /// Obstacle whose margin covers half the obstacle, half the vehicle and some
    /// extra room
    pub fn with_vehicle_margin(s: f64, d: f64, r: f64, vehicle_width: f64, wiggle_room: f64) -> Self {
        let r_mgn = 0.5 * r + 0.5 * vehicle_width + wiggle_room;
        Self { s, d, r, r_mgn }
    }
}

/// Obstacle set, replaced wholesale on every update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObstacleSet {
    pub obstacles: Vec<Obstacle>,
}

impl ObstacleSet {
    pub fn new() -> Self {
        Self { obstacles: Vec::new() }
    }

    pub fn from_obstacles(obstacles: Vec<Obstacle>) -> Self {
        Self { obstacles }
    }

    pub fn push(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Obstacle> {
        self.obstacles.iter()
    }
}

/// Candidate, selected or optimized trajectory over the horizon
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    // state, N+1 samples
    pub s: Vec<f64>,
    pub d: Vec<f64>,
    pub deltapsi: Vec<f64>,
    pub psidot: Vec<f64>,
    pub vx: Vec<f64>,
    pub vy: Vec<f64>,
    // control, N samples
    pub fyf: Vec<f64>,
    pub fx: Vec<f64>,
    // cartesian pose, filled by the coordinate transform
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub psi: Vec<f64>,
    pub kappac: Vec<f64>,
    pub cost: f64,
    pub colliding: bool,
    pub exitroad: bool,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of state samples
    pub fn len(&self) -> usize {
        self.s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.s.is_empty()
    }

    /// Arc length at the end of the horizon
    pub fn final_s(&self) -> Option<f64> {
        self.s.last().copied()
    }

    /// State at step `j`
    pub fn state_at(&self, j: usize) -> Option<VehicleState> {
        Some(VehicleState {
            s: *self.s.get(j)?,
            d: *self.d.get(j)?,
            deltapsi: *self.deltapsi.get(j)?,
            psidot: *self.psidot.get(j)?,
            vx: *self.vx.get(j)?,
            vy: *self.vy.get(j)?,
        })
    }

    pub fn has_cartesian(&self) -> bool {
        !self.x.is_empty() && self.x.len() == self.s.len()
    }

    pub fn clear_cartesian(&mut self) {
        self.x.clear();
        self.y.clear();
        self.psi.clear();
        self.kappac.clear();
    }
}

/// Per-step targets for the running cost
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceSet {
    pub sref: Vec<f64>,
    pub vxref: Vec<f64>,
}

impl ReferenceSet {
    pub fn len(&self) -> usize {
        self.sref.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sref.is_empty()
    }
}

/// Per-step feasible corridor handed to the optimizer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionConstraint {
    pub slb: Vec<f64>,
    pub sub: Vec<f64>,
    pub dlb: Vec<f64>,
    pub dub: Vec<f64>,
}

impl PositionConstraint {
    pub fn len(&self) -> usize {
        self.dlb.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dlb.is_empty()
    }
}
