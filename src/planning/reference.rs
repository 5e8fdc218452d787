//! Reference targets for the running cost

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::common::error::PlannerError;
use crate::common::types::{ReferenceSet, VehicleState};
use crate::config::{PlannerConfig, ReferenceConfig};

/// What the planner is asked to achieve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    /// Hold a cruise speed
    Track,
    /// Emergency stop at the current position
    Brake,
    /// Maximize progress
    Race,
}

impl TryFrom<i64> for ControlMode {
    type Error = PlannerError;

    /// Integer codes used on the wire: 0 track, 1 brake, 2 race
    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ControlMode::Track),
            1 => Ok(ControlMode::Brake),
            2 => Ok(ControlMode::Race),
            other => Err(PlannerError::InvalidControlMode(other.to_string())),
        }
    }
}

impl FromStr for ControlMode {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "track" => Ok(ControlMode::Track),
            "brake" => Ok(ControlMode::Brake),
            "race" => Ok(ControlMode::Race),
            _ => Err(PlannerError::InvalidControlMode(s.to_string())),
        }
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControlMode::Track => "track",
            ControlMode::Brake => "brake",
            ControlMode::Race => "race",
        };
        write!(f, "{}", name)
    }
}

/// Builds `sref`/`vxref` over the horizon from the current state
#[derive(Debug, Clone)]
pub struct ReferenceGenerator {
    horizon: usize,
    dt: f64,
    config: ReferenceConfig,
}

impl ReferenceGenerator {
    /// `horizon` is N; generated arrays hold N+1 entries
    pub fn new(horizon: usize, dt: f64, config: ReferenceConfig) -> Self {
        Self { horizon, dt, config }
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(config.horizon, config.step_dt, config.references.clone())
    }

    pub fn generate(&self, mode: ControlMode, state: &VehicleState) -> ReferenceSet {
        let n = self.horizon + 1;
        match mode {
            ControlMode::Brake => ReferenceSet {
                sref: vec![state.s; n],
                vxref: vec![0.0; n],
            },
            ControlMode::Race => ReferenceSet {
                sref: vec![state.s + self.config.race_lookahead; n],
                vxref: vec![state.vx + self.config.race_speed_increment; n],
            },
            ControlMode::Track => {
                let v = self.config.cruise_speed;
                ReferenceSet {
                    sref: (0..n).map(|j| state.s + v * self.dt * j as f64).collect(),
                    vxref: vec![v; n],
                }
            }
        }
    }
}
