//! Common types, traits, and error definitions for rti_planner
//!
//! This module provides the data model shared by every stage of the
//! planning cycle.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
