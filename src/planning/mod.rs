//! Frenet-frame planning pipeline

pub mod constraints;
pub mod coordinate_transform;
pub mod inputs;
pub mod planning_loop;
pub mod reference;
pub mod trajectory_eval;

pub use constraints::ConstraintBuilder;
pub use coordinate_transform::{frenet_to_cartesian, CartesianPose, CoordinateTransformer};
pub use inputs::{input_channels, InputBuffer, InputHandle, InputSnapshot, ReadinessGate};
pub use planning_loop::{CycleReport, CycleTiming, LoopState, PlanningLoop};
pub use reference::{ControlMode, ReferenceGenerator};
pub use trajectory_eval::TrajectorySetEvaluator;
