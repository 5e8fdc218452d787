//! Piecewise-linear table lookup
//!
//! Queries below the first or above the last abscissa return the end values;
//! the table is never extrapolated.

use crate::common::error::GeometryError;

/// Interpolate `fp(xp)` at a single point. `xp` must be strictly increasing
/// and as long as `fp`.
pub fn interp_one(x: f64, xp: &[f64], fp: &[f64]) -> Result<f64, GeometryError> {
    if xp.is_empty() {
        return Err(GeometryError::EmptyPath);
    }
    if xp.len() != fp.len() {
        return Err(GeometryError::LengthMismatch { expected: xp.len(), found: fp.len() });
    }
    if x.is_nan() {
        return Err(GeometryError::NotANumber { index: 0 });
    }

    let last = xp.len() - 1;
    if x <= xp[0] {
        return Ok(fp[0]);
    }
    if x >= xp[last] {
        return Ok(fp[last]);
    }

    // first index with xp[i] > x, 1..=last here
    let i = xp.partition_point(|&v| v <= x);
    let (x0, x1) = (xp[i - 1], xp[i]);
    let t = (x - x0) / (x1 - x0);
    Ok(fp[i - 1] + t * (fp[i] - fp[i - 1]))
}

/// Interpolate `fp(xp)` at every point of `x`
pub fn interp(x: &[f64], xp: &[f64], fp: &[f64]) -> Result<Vec<f64>, GeometryError> {
    x.iter()
        .enumerate()
        .map(|(i, &xi)| {
            interp_one(xi, xp, fp).map_err(|e| match e {
                GeometryError::NotANumber { .. } => GeometryError::NotANumber { index: i },
                other => other,
            })
        })
        .collect()
}
