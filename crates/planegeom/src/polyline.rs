use geo::{Coord, LineString};

use crate::coord;
use crate::error::GeometryError;
use crate::segment::Segment;

/// An open sequence of at least two vertices.
#[derive(Clone, Debug, PartialEq)]
pub struct Polyline {
    vertices: Vec<Coord<f64>>,
}

impl Polyline {
    pub fn new(vertices: Vec<Coord<f64>>) -> Result<Self, GeometryError> {
        if vertices.len() < 2 {
            return Err(GeometryError::TooFewVertices { required: 2, actual: vertices.len() });
        }
        Ok(Self { vertices })
    }

    /// Caller guarantees at least two vertices.
    pub(crate) fn from_vertices_unchecked(vertices: Vec<Coord<f64>>) -> Self {
        debug_assert!(vertices.len() >= 2);
        Self { vertices }
    }

    #[inline] pub fn vertices(&self) -> &[Coord<f64>] { &self.vertices }

    #[inline] pub fn first(&self) -> Coord<f64> { self.vertices[0] }

    #[inline] pub fn last(&self) -> Coord<f64> { self.vertices[self.vertices.len() - 1] }

    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.vertices.windows(2).map(|w| Segment::new(w[0], w[1]))
    }

    pub fn length(&self) -> f64 {
        self.segments().map(|s| s.length()).sum()
    }

    /// Distance along the line from the first vertex to the point on the line
    /// closest to `point`.
    pub fn offset_of(&self, point: Coord<f64>) -> f64 {
        let mut best = f64::INFINITY;
        let mut best_offset = 0.0;
        let mut walked = 0.0;

        for segment in self.segments() {
            let closest = segment.closest_point(point);
            let dist = coord::distance(point, closest);
            if dist < best {
                best = dist;
                best_offset = walked + coord::distance(segment.p1, closest);
            }
            walked += segment.length();
        }

        best_offset
    }

    /// Point at distance `offset` along the line, clamped to the endpoints.
    pub fn point_at_offset(&self, offset: f64) -> Coord<f64> {
        if offset <= 0.0 { return self.first() }

        let mut remaining = offset;
        for segment in self.segments() {
            let len = segment.length();
            if remaining <= len {
                return if len == 0.0 {
                    segment.p1
                } else {
                    coord::lerp(segment.p1, segment.p2, remaining / len)
                };
            }
            remaining -= len;
        }

        self.last()
    }

    #[inline] pub fn to_line_string(&self) -> LineString<f64> { LineString::from(self.vertices.clone()) }
}
