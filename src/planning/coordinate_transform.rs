//! Frenet to Cartesian transform along a tabulated reference path
//!
//! Path geometry is interpolated linearly at each sample's arc length and
//! clamped to the end values outside `[s_min, s_max]`:
//!
//! ```text
//! X   = Xc - d * sin(psi_c)
//! Y   = Yc + d * cos(psi_c)
//! psi = deltapsi + psi_c
//! ```

use ordered_float::NotNan;

use crate::common::error::GeometryError;
use crate::common::types::{Path, Trajectory};
use crate::utils::interp::interp;

/// Cartesian pose samples
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartesianPose {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub psi: Vec<f64>,
}

impl CartesianPose {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Reject empty or NaN samples
fn check_samples(samples: &[f64]) -> Result<(), GeometryError> {
    if samples.is_empty() {
        return Err(GeometryError::EmptySamples);
    }
    for (index, &v) in samples.iter().enumerate() {
        NotNan::new(v).map_err(|_| GeometryError::NotANumber { index })?;
    }
    Ok(())
}

fn check_len(expected: usize, samples: &[f64]) -> Result<(), GeometryError> {
    if samples.len() != expected {
        return Err(GeometryError::LengthMismatch { expected, found: samples.len() });
    }
    Ok(())
}

/// Transforms Frenet samples using one reference path
#[derive(Debug, Clone, Copy)]
pub struct CoordinateTransformer<'a> {
    path: &'a Path,
}

impl<'a> CoordinateTransformer<'a> {
    pub fn new(path: &'a Path) -> Self {
        Self { path }
    }

    fn check_path(&self) -> Result<(), GeometryError> {
        if self.path.is_empty() {
            return Err(GeometryError::EmptyPath);
        }
        Ok(())
    }

    /// Pose of each `(s, d, deltapsi)` sample
    pub fn frenet_to_cartesian(
        &self,
        s: &[f64],
        d: &[f64],
        deltapsi: &[f64],
    ) -> Result<CartesianPose, GeometryError> {
        self.check_path()?;
        check_samples(s)?;
        check_len(s.len(), d)?;
        check_len(s.len(), deltapsi)?;
        check_samples(d)?;
        check_samples(deltapsi)?;

        let (x, y, psi_c) = self.centerline_at(s)?;
        let mut pose = CartesianPose {
            x: Vec::with_capacity(s.len()),
            y: Vec::with_capacity(s.len()),
            psi: Vec::with_capacity(s.len()),
        };
        for j in 0..s.len() {
            pose.x.push(x[j] - d[j] * psi_c[j].sin());
            pose.y.push(y[j] + d[j] * psi_c[j].cos());
            pose.psi.push(deltapsi[j] + psi_c[j]);
        }
        Ok(pose)
    }

    /// Position of each `(s, d)` point
    pub fn points_to_cartesian(&self, s: &[f64], d: &[f64]) -> Result<(Vec<f64>, Vec<f64>), GeometryError> {
        let zeros = vec![0.0; s.len()];
        let pose = self.frenet_to_cartesian(s, d, &zeros)?;
        Ok((pose.x, pose.y))
    }

    /// Path curvature at each arc length
    pub fn curvature(&self, s: &[f64]) -> Result<Vec<f64>, GeometryError> {
        self.check_path()?;
        check_samples(s)?;
        interp(s, self.path.s(), self.path.kappa_c())
    }

    /// Fill the Cartesian fields of a trajectory. On error the trajectory keeps
    /// no Cartesian samples.
    pub fn trajectory_to_cartesian(&self, traj: &mut Trajectory) -> Result<(), GeometryError> {
        traj.clear_cartesian();
        let pose = self.frenet_to_cartesian(&traj.s, &traj.d, &traj.deltapsi)?;
        let kappac = self.curvature(&traj.s)?;
        traj.x = pose.x;
        traj.y = pose.y;
        traj.psi = pose.psi;
        traj.kappac = kappac;
        Ok(())
    }

    fn centerline_at(&self, s: &[f64]) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>), GeometryError> {
        let x = interp(s, self.path.s(), self.path.x())?;
        let y = interp(s, self.path.s(), self.path.y())?;
        let psi_c = interp(s, self.path.s(), self.path.psi_c())?;
        Ok((x, y, psi_c))
    }
}

/// Pose of each `(s, d, deltapsi)` sample along `path`
pub fn frenet_to_cartesian(
    s: &[f64],
    d: &[f64],
    deltapsi: &[f64],
    path: &Path,
) -> Result<CartesianPose, GeometryError> {
    CoordinateTransformer::new(path).frenet_to_cartesian(s, d, deltapsi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::PathSamples;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn straight_path() -> Path {
        Path::new(PathSamples {
            s: vec![0.0, 10.0, 20.0],
            x: vec![0.0, 10.0, 20.0],
            y: vec![0.0, 0.0, 0.0],
            psi_c: vec![0.0, 0.0, 0.0],
            kappa_c: vec![0.0, 0.01, 0.02],
            theta_c: Vec::new(),
            dub: vec![2.0; 3],
            dlb: vec![-2.0; 3],
        })
        .unwrap()
    }

    #[test]
    fn test_single_sample_on_straight_path() {
        let pose = frenet_to_cartesian(&[5.0], &[1.0], &[0.0], &straight_path()).unwrap();
        assert_relative_eq!(pose.x[0], 5.0);
        assert_relative_eq!(pose.y[0], 1.0);
        assert_relative_eq!(pose.psi[0], 0.0);
    }

    #[test]
    fn test_output_lengths_match_input() {
        let path = straight_path();
        let s = [0.0, 3.0, 7.5, 12.0, 19.0];
        let d = [0.0, -1.0, 0.5, 1.5, 0.0];
        let dpsi = [0.0, 0.1, 0.0, -0.1, 0.0];
        let pose = frenet_to_cartesian(&s, &d, &dpsi, &path).unwrap();
        assert_eq!(pose.x.len(), s.len());
        assert_eq!(pose.y.len(), s.len());
        assert_eq!(pose.psi.len(), s.len());
        assert_relative_eq!(pose.psi[1], 0.1);
    }

    #[test]
    fn test_heading_rotates_lateral_offset() {
        let path = Path::new(PathSamples {
            s: vec![0.0, 10.0],
            x: vec![0.0, 0.0],
            y: vec![0.0, 10.0],
            psi_c: vec![FRAC_PI_2, FRAC_PI_2],
            kappa_c: vec![0.0, 0.0],
            theta_c: Vec::new(),
            dub: vec![2.0; 2],
            dlb: vec![-2.0; 2],
        })
        .unwrap();
        // left of a northbound path is west
        let pose = frenet_to_cartesian(&[4.0], &[1.0], &[0.0], &path).unwrap();
        assert_relative_eq!(pose.x[0], -1.0, epsilon = 1e-12);
        assert_relative_eq!(pose.y[0], 4.0, epsilon = 1e-12);
        assert_relative_eq!(pose.psi[0], FRAC_PI_2);
    }

    #[test]
    fn test_samples_outside_path_are_clamped() {
        let pose = frenet_to_cartesian(&[-5.0, 30.0], &[0.0, 0.0], &[0.0, 0.0], &straight_path()).unwrap();
        assert_relative_eq!(pose.x[0], 0.0);
        assert_relative_eq!(pose.x[1], 20.0);
    }

    #[test]
    fn test_empty_samples_rejected() {
        let result = frenet_to_cartesian(&[], &[], &[], &straight_path());
        assert_eq!(result, Err(GeometryError::EmptySamples));
    }

    #[test]
    fn test_nan_samples_rejected() {
        let result = frenet_to_cartesian(&[1.0, f64::NAN], &[0.0, 0.0], &[0.0, 0.0], &straight_path());
        assert_eq!(result, Err(GeometryError::NotANumber { index: 1 }));

        let result = frenet_to_cartesian(&[1.0], &[f64::NAN], &[0.0], &straight_path());
        assert_eq!(result, Err(GeometryError::NotANumber { index: 0 }));
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let result = frenet_to_cartesian(&[1.0, 2.0], &[0.0], &[0.0, 0.0], &straight_path());
        assert_eq!(result, Err(GeometryError::LengthMismatch { expected: 2, found: 1 }));
    }

    #[test]
    fn test_empty_path_rejected() {
        let path = Path::default();
        let result = frenet_to_cartesian(&[1.0], &[0.0], &[0.0], &path);
        assert_eq!(result, Err(GeometryError::EmptyPath));
    }

    #[test]
    fn test_trajectory_to_cartesian_fills_fields() {
        let path = straight_path();
        let mut traj = Trajectory {
            s: vec![5.0, 15.0],
            d: vec![1.0, -1.0],
            deltapsi: vec![0.0, 0.0],
            ..Default::default()
        };
        CoordinateTransformer::new(&path).trajectory_to_cartesian(&mut traj).unwrap();
        assert_eq!(traj.x, vec![5.0, 15.0]);
        assert_eq!(traj.y, vec![1.0, -1.0]);
        assert_relative_eq!(traj.kappac[0], 0.005);
        assert!(traj.has_cartesian());
    }

    #[test]
    fn test_zero_length_trajectory_is_unusable() {
        let path = straight_path();
        let mut traj = Trajectory::new();
        let result = CoordinateTransformer::new(&path).trajectory_to_cartesian(&mut traj);
        assert_eq!(result, Err(GeometryError::EmptySamples));
        assert!(!traj.has_cartesian());
    }
}
