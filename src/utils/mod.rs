//! Numeric and plotting helpers

pub mod interp;
pub mod visualization;

pub use interp::{interp, interp_one};
pub use visualization::{colors, corridor_polygons, obstacle_outline, PathStyle, Polygon, Visualizer};
