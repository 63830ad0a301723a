//! Planar geometry for map data in a local metric plane.
//!
//! Rings, polylines and segments over `geo::Coord<f64>`, a sweep-line
//! simplicity test, and polygon-with-holes predicates.

pub mod bbox;
pub mod coord;
pub mod error;
pub mod polygon;
pub mod polyline;
pub mod ring;
pub mod segment;
pub mod sweep;

pub use bbox::{bounding_rect_of, BoundingBox};
pub use error::GeometryError;
pub use polygon::AreaPolygon;
pub use polyline::Polyline;
pub use ring::{Ring, SimpleRing};
pub use segment::Segment;
pub use sweep::is_self_intersecting;
