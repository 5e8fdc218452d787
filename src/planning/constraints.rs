//! Position constraint envelope for the optimizer
//!
//! Lateral bounds follow the lane bounds of the path at each sample of the
//! selected trajectory. Longitudinal bounds span the whole known path and are
//! not narrowed around obstacles; obstacle avoidance relies on the candidate
//! selection and the solver's own obstacle handling.

use crate::common::error::GeometryError;
use crate::common::types::{Path, PositionConstraint, Trajectory};
use crate::utils::interp::interp;

#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintBuilder;

impl ConstraintBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Corridor around `selected`. An empty trajectory yields an empty corridor.
    pub fn build(&self, selected: &Trajectory, path: &Path) -> Result<PositionConstraint, GeometryError> {
        if selected.is_empty() {
            return Ok(PositionConstraint::default());
        }
        let (s_min, s_max) = match (path.s_min(), path.s_max()) {
            (Some(lo), Some(hi)) => (lo, hi),
            _ => return Err(GeometryError::EmptyPath),
        };

        let n = selected.len();
        Ok(PositionConstraint {
            slb: vec![s_min; n],
            sub: vec![s_max; n],
            dlb: interp(&selected.s, path.s(), path.dlb())?,
            dub: interp(&selected.s, path.s(), path.dub())?,
        })
    }
}
