//! Spatial index and overlap detection.

mod grid;
mod overlap;

pub use grid::IntersectionGrid;
pub use overlap::{classify, detect_overlaps};
