//! Planner configuration
//!
//! All tunables of a planning cycle. Every field has a default, so a YAML
//! file only needs to name the values it overrides:
//!
//! ```yaml
//! horizon: 40
//! cycle_period: 0.1
//! control_mode: race
//! weights:
//!   slack: 1000000.0
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::common::error::{PlannerError, PlannerResult};
use crate::common::types::MIN_VX;
use crate::planning::reference::ControlMode;

/// Cost weights shared by candidate evaluation and the optimizer
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    /// State weights in order `s, d, deltapsi, psidot, vx, vy`
    pub state: [f64; 6],
    /// Control weights in order `Fyf, Fx`
    pub control: [f64; 2],
    /// Soft constraint penalty for collision and road exit
    pub slack: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            state: [0.01, 1.0, 1.0, 0.1, 0.1, 1.0],
            control: [0.001, 0.001],
            slack: 1.0e6,
        }
    }
}

impl WeightConfig {
    /// Weight on arc-length progress error
    pub fn s_weight(&self) -> f64 {
        self.state[0]
    }

    /// Weight on speed error
    pub fn vx_weight(&self) -> f64 {
        self.state[4]
    }
}

/// Constants of the reference policies
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    /// Arc length added to the current `s` in race mode [m]
    pub race_lookahead: f64,
    /// Speed added to the current `vx` in race mode [m/s]
    pub race_speed_increment: f64,
    /// Target speed in track mode [m/s]
    pub cruise_speed: f64,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            race_lookahead: 300.0,
            race_speed_increment: 25.0,
            cruise_speed: 10.0,
        }
    }
}

/// Magnitudes passed to the optimizer's input constraints
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct InputBounds {
    pub lower: f64,
    pub upper: f64,
}

impl Default for InputBounds {
    fn default() -> Self {
        Self { lower: 0.5, upper: 1000.0 }
    }
}

/// Settings of the simulated rollout used by [`crate::optimizer::SimulatedOptimizer`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RolloutConfig {
    /// Seed of the sampling RNG
    pub seed: u64,
    /// Standard deviation of the sampled longitudinal acceleration [m/s^2]
    pub accel_std: f64,
    /// Maximum magnitude of the sampled longitudinal acceleration [m/s^2]
    pub max_accel: f64,
    /// Vehicle mass used to turn acceleration into `Fx` [kg]
    pub mass: f64,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            accel_std: 1.5,
            max_accel: 4.0,
            mass: 1500.0,
        }
    }
}

/// Planner configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Number of horizon steps N; trajectories have N+1 states
    pub horizon: usize,
    /// Time between horizon steps [s]
    pub step_dt: f64,
    /// Period of one planning cycle [s]
    pub cycle_period: f64,
    /// Candidates requested from the rollout
    pub n_samples: usize,
    pub control_mode: ControlMode,
    pub weights: WeightConfig,
    pub references: ReferenceConfig,
    pub input_bounds: InputBounds,
    /// Fraction of the path length past which the selected trajectory
    /// triggers a running-out-of-path warning
    pub path_exhaustion_ratio: f64,
    /// Lower clamp of the incoming `vx`
    pub min_vx: f64,
    /// Stop after this many cycles; `None` runs until failure
    pub max_cycles: Option<usize>,
    pub rollout: RolloutConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            horizon: 40,
            step_dt: 0.1,
            cycle_period: 0.1,
            n_samples: 6,
            control_mode: ControlMode::Race,
            weights: WeightConfig::default(),
            references: ReferenceConfig::default(),
            input_bounds: InputBounds::default(),
            path_exhaustion_ratio: 0.95,
            min_vx: MIN_VX,
            max_cycles: None,
            rollout: RolloutConfig::default(),
        }
    }
}

impl PlannerConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> PlannerResult<Self> {
        let config: PlannerConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> PlannerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> PlannerResult<()> {
        if self.horizon == 0 {
            return Err(PlannerError::InvalidConfig("horizon must be positive".to_string()));
        }
        if self.n_samples == 0 {
            return Err(PlannerError::InvalidConfig("n_samples must be positive".to_string()));
        }
        if !(self.step_dt > 0.0) || !(self.cycle_period > 0.0) {
            return Err(PlannerError::InvalidConfig(format!(
                "step_dt ({}) and cycle_period ({}) must be positive",
                self.step_dt, self.cycle_period
            )));
        }
        if !(self.weights.slack > 0.0) {
            return Err(PlannerError::InvalidConfig("slack weight must be positive".to_string()));
        }
        if !(self.path_exhaustion_ratio > 0.0 && self.path_exhaustion_ratio <= 1.0) {
            return Err(PlannerError::InvalidConfig(format!(
                "path_exhaustion_ratio {} outside (0, 1]",
                self.path_exhaustion_ratio
            )));
        }
        if self.input_bounds.lower > self.input_bounds.upper {
            return Err(PlannerError::InvalidConfig(
                "input_bounds.lower exceeds input_bounds.upper".to_string(),
            ));
        }
        Ok(())
    }

    pub fn cycle_period(&self) -> Duration {
        Duration::from_secs_f64(self.cycle_period)
    }

    /// Trajectory length in state samples
    pub fn horizon_len(&self) -> usize {
        self.horizon + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PlannerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cycle_period(), Duration::from_millis(100));
        assert_eq!(config.horizon_len(), 41);
        assert_eq!(config.n_samples, 6);
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let config = PlannerConfig::from_yaml_str(
            "horizon: 3\ncontrol_mode: brake\nweights:\n  slack: 50.0\n",
        )
        .unwrap();
        assert_eq!(config.horizon, 3);
        assert_eq!(config.control_mode, ControlMode::Brake);
        assert_eq!(config.weights.slack, 50.0);
        assert_eq!(config.weights.state, WeightConfig::default().state);
        assert_eq!(config.references.race_lookahead, 300.0);
    }

    #[test]
    fn test_unknown_control_mode_is_reported() {
        let result = PlannerConfig::from_yaml_str("control_mode: drift\n");
        assert!(matches!(result, Err(PlannerError::Yaml(_))));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = PlannerConfig::from_yaml_str("horizon: 0\n");
        assert!(matches!(result, Err(PlannerError::InvalidConfig(_))));

        let result = PlannerConfig::from_yaml_str("cycle_period: -0.1\n");
        assert!(matches!(result, Err(PlannerError::InvalidConfig(_))));
    }
}
