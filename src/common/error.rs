//! Error types for rti_planner

use thiserror::Error;

/// Failures of the Frenet to Cartesian transform
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// No samples were given
    #[error("empty sample array")]
    EmptySamples,
    /// The reference path has no samples to interpolate
    #[error("reference path is empty")]
    EmptyPath,
    /// A sample is not a number
    #[error("sample {index} is NaN")]
    NotANumber { index: usize },
    /// Parallel sample arrays differ in length
    #[error("sample arrays differ in length: expected {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },
}

/// Main error type for the planner
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Startup before the first usable state and path
    #[error("input not ready: {0}")]
    InputNotReady(String),
    /// Coordinate transform failed
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),
    /// Every candidate cost exceeded the selection sentinel
    #[error("no feasible candidate among {candidates} trajectories")]
    NoFeasibleCandidate { candidates: usize },
    /// Feedback step returned a nonzero status
    #[error("optimizer failure: feedback status {status}")]
    OptimizerFailure { status: i32 },
    /// Selected trajectory ends close to the end of the known path
    #[error("running out of path: final s {final_s:.2} of {path_end:.2}")]
    PathExhaustion { final_s: f64, path_end: f64 },
    /// Control mode that has no reference policy
    #[error("invalid control mode: {0}")]
    InvalidControlMode(String),
    /// Path arrays violate the path invariants
    #[error("invalid path: {0}")]
    InvalidPath(String),
    /// Configuration values out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Plot rendering failed
    #[error("visualization error: {0}")]
    Visualization(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl PlannerError {
    /// Only an optimizer failure ends the planning loop
    pub fn is_fatal(&self) -> bool {
        matches!(self, PlannerError::OptimizerFailure { .. })
    }
}

/// Result type alias for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;
