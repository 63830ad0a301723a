//! Closed vertex loops.
//!
//! A [`Ring`] stores its vertices as a closed loop: the first vertex is
//! repeated as the last one.  [`SimpleRing`] additionally guarantees that the
//! loop has at least three distinct vertices and never crosses itself.

use std::ops::Deref;

use ahash::AHashSet;
use geo::{Coord, LineString, Polygon, Rect};

use crate::coord::{self, coord_key};
use crate::error::GeometryError;
use crate::polyline::Polyline;
use crate::segment::Segment;
use crate::sweep::is_self_intersecting;

#[derive(Clone, Debug, PartialEq)]
pub struct Ring {
    vertex_loop: Vec<Coord<f64>>,
}

impl Ring {
    /// Builds a ring from a closed loop.  Fails if the loop is not closed or
    /// has fewer than four entries (three vertices plus the repeated first).
    pub fn new(vertex_loop: Vec<Coord<f64>>) -> Result<Self, GeometryError> {
        if vertex_loop.len() < 4 {
            return Err(GeometryError::TooFewVertices { required: 4, actual: vertex_loop.len() });
        }
        if vertex_loop.first() != vertex_loop.last() {
            return Err(GeometryError::NotClosed);
        }
        Ok(Self { vertex_loop })
    }

    /// Builds a ring from open vertices, appending the first vertex if needed.
    pub fn closing(mut vertices: Vec<Coord<f64>>) -> Result<Self, GeometryError> {
        if let (Some(&first), Some(&last)) = (vertices.first(), vertices.last()) {
            if vertices.len() > 1 && first != last {
                vertices.push(first);
            }
        }
        Self::new(vertices)
    }

    /// Vertices without the closing repetition.
    #[inline] pub fn vertices(&self) -> &[Coord<f64>] { &self.vertex_loop[..self.vertex_loop.len() - 1] }

    /// Vertices with the first vertex repeated at the end.
    #[inline] pub fn vertex_loop(&self) -> &[Coord<f64>] { &self.vertex_loop }

    /// Number of vertices, not counting the closing repetition.
    #[inline] pub fn len(&self) -> usize { self.vertex_loop.len() - 1 }

    /// Always `false`: a ring has at least three vertices.
    #[inline] pub fn is_empty(&self) -> bool { false }

    #[inline]
    pub fn vertex_after(&self, index: usize) -> Coord<f64> {
        self.vertex_loop[(index + 1) % self.len()]
    }

    #[inline]
    pub fn vertex_before(&self, index: usize) -> Coord<f64> {
        self.vertex_loop[(index + self.len() - 1) % self.len()]
    }

    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.vertex_loop.windows(2).map(|w| Segment::new(w[0], w[1]))
    }

    /// Shoelace area; positive for counterclockwise rings.
    pub fn signed_area(&self) -> f64 {
        let mut sum = 0.0;
        for w in self.vertex_loop.windows(2) {
            sum += w[0].x * w[1].y - w[1].x * w[0].y;
        }
        sum / 2.0
    }

    #[inline] pub fn area(&self) -> f64 { self.signed_area().abs() }

    #[inline] pub fn is_clockwise(&self) -> bool { self.signed_area() < 0.0 }

    /// Average of the vertices.
    pub fn center(&self) -> Coord<f64> {
        let vertices = self.vertices();
        let n = vertices.len() as f64;
        let (sx, sy) = vertices.iter().fold((0.0, 0.0), |(sx, sy), c| (sx + c.x, sy + c.y));
        Coord { x: sx / n, y: sy / n }
    }

    pub fn outline_length(&self) -> f64 {
        self.segments().map(|s| s.length()).sum()
    }

    /// The boundary segment closest to `point`.  Ties go to the earlier segment.
    pub fn closest_segment(&self, point: Coord<f64>) -> Segment {
        let mut segments = self.segments();
        let mut best = segments.next().unwrap_or(Segment::new(self.vertex_loop[0], self.vertex_loop[0]));
        let mut best_dist = best.distance_to(point);
        for segment in segments {
            let dist = segment.distance_to(point);
            if dist < best_dist {
                best = segment;
                best_dist = dist;
            }
        }
        best
    }

    /// Returns `true` if both rings visit the same vertices in the same cyclic
    /// order, whatever vertex they start at.
    pub fn is_equivalent_to(&self, other: &Ring) -> bool {
        let (a, b) = (self.vertices(), other.vertices());
        if a.len() != b.len() { return false }

        let n = a.len();
        (0..n)
            .filter(|&start| b[start] == a[0])
            .any(|start| (0..n).all(|i| a[i] == b[(start + i) % n]))
    }

    pub fn reversed(&self) -> Ring {
        let mut vertex_loop = self.vertex_loop.clone();
        vertex_loop.reverse();
        Ring { vertex_loop }
    }

    /// The closed loop as an open polyline that happens to end where it starts.
    pub fn outline(&self) -> Polyline {
        Polyline::from_vertices_unchecked(self.vertex_loop.clone())
    }

    /// Point at distance `offset` along the boundary from the first vertex.
    /// Offsets wrap around, so negative offsets walk backwards.
    pub fn point_at_offset(&self, offset: f64) -> Coord<f64> {
        let length = self.outline_length();
        if length == 0.0 { return self.vertex_loop[0] }
        self.outline().point_at_offset(offset.rem_euclid(length))
    }

    /// Offset of the boundary point closest to `point`, in `[0, outline_length)`.
    pub fn offset_of(&self, point: Coord<f64>) -> f64 {
        let length = self.outline_length();
        if length == 0.0 { return 0.0 }
        self.outline().offset_of(point).rem_euclid(length)
    }

    #[inline] pub fn to_line_string(&self) -> LineString<f64> { LineString::from(self.vertex_loop.clone()) }

    #[inline] pub fn to_polygon(&self) -> Polygon<f64> { Polygon::new(self.to_line_string(), vec![]) }

    pub fn bounding_rect(&self) -> Rect<f64> {
        let first = self.vertex_loop[0];
        let (min, max) = self.vertex_loop.iter().fold((first, first), |(min, max), c| {
            (Coord { x: min.x.min(c.x), y: min.y.min(c.y) }, Coord { x: max.x.max(c.x), y: max.y.max(c.y) })
        });
        Rect::new(min, max)
    }

    /// Number of distinct vertex positions.
    fn distinct_vertices(&self) -> usize {
        self.vertices().iter().map(|&c| coord_key(c)).collect::<AHashSet<_>>().len()
    }

    pub fn contains_vertex(&self, point: Coord<f64>) -> bool {
        self.vertices().iter().any(|&v| v == point)
    }

    /// Distance from `point` to the nearest point of the boundary.
    pub fn distance_to(&self, point: Coord<f64>) -> f64 {
        coord::distance(point, self.closest_segment(point).closest_point(point))
    }
}

/// A ring that is known not to intersect itself.
#[derive(Clone, Debug, PartialEq)]
pub struct SimpleRing(Ring);

impl SimpleRing {
    pub fn new(vertex_loop: Vec<Coord<f64>>) -> Result<Self, GeometryError> {
        Self::try_from(Ring::new(vertex_loop)?)
    }

    /// Returns this ring with counterclockwise winding.
    pub fn make_counterclockwise(self) -> SimpleRing {
        if self.0.is_clockwise() { SimpleRing(self.0.reversed()) } else { self }
    }

    /// Returns this ring with clockwise winding.
    pub fn make_clockwise(self) -> SimpleRing {
        if self.0.is_clockwise() { self } else { SimpleRing(self.0.reversed()) }
    }

    #[inline] pub fn as_ring(&self) -> &Ring { &self.0 }

    #[inline] pub fn into_ring(self) -> Ring { self.0 }
}

impl TryFrom<Ring> for SimpleRing {
    type Error = GeometryError;

    fn try_from(ring: Ring) -> Result<Self, Self::Error> {
        let distinct = ring.distinct_vertices();
        if distinct < 3 {
            return Err(GeometryError::TooFewVertices { required: 3, actual: distinct });
        }
        if is_self_intersecting(ring.vertex_loop()) {
            return Err(GeometryError::SelfIntersecting);
        }
        Ok(SimpleRing(ring))
    }
}

impl Deref for SimpleRing {
    type Target = Ring;

    fn deref(&self) -> &Ring { &self.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(points: &[(f64, f64)]) -> Vec<Coord<f64>> {
        points.iter().map(|&(x, y)| Coord { x, y }).collect()
    }

    fn square() -> Ring {
        Ring::closing(coords(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)])).unwrap()
    }

    #[test]
    fn open_loop_is_rejected() {
        let open = coords(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        assert_eq!(Ring::new(open), Err(GeometryError::NotClosed));
    }

    #[test]
    fn short_loop_is_rejected() {
        let short = coords(&[(0.0, 0.0), (1.0, 0.0), (0.0, 0.0)]);
        assert!(matches!(Ring::new(short), Err(GeometryError::TooFewVertices { .. })));
    }

    #[test]
    fn winding_and_area() {
        let ccw = square();
        assert!(!ccw.is_clockwise());
        assert_eq!(ccw.signed_area(), 100.0);
        assert!(ccw.reversed().is_clockwise());
        assert_eq!(ccw.reversed().area(), 100.0);
    }

    #[test]
    fn center_and_outline_length() {
        let s = square();
        assert_eq!(s.center(), Coord { x: 5.0, y: 5.0 });
        assert_eq!(s.outline_length(), 40.0);
        assert_eq!(s.len(), 4);
    }

    #[test]
    fn equivalence_ignores_start_vertex() {
        let a = square();
        let b = Ring::closing(coords(&[(10.0, 10.0), (0.0, 10.0), (0.0, 0.0), (10.0, 0.0)])).unwrap();
        assert!(a.is_equivalent_to(&b));
        assert!(!a.is_equivalent_to(&a.reversed()));
    }

    #[test]
    fn closest_segment_picks_nearest_edge() {
        let s = square();
        let seg = s.closest_segment(Coord { x: 11.0, y: 5.0 });
        assert_eq!(seg, Segment::new(Coord { x: 10.0, y: 0.0 }, Coord { x: 10.0, y: 10.0 }));
    }

    #[test]
    fn offsets_wrap_around() {
        let s = square();
        assert_eq!(s.point_at_offset(45.0), Coord { x: 5.0, y: 0.0 });
        assert_eq!(s.point_at_offset(-5.0), Coord { x: 0.0, y: 5.0 });
        assert_eq!(s.offset_of(Coord { x: 10.0, y: 5.0 }), 15.0);
    }

    #[test]
    fn simple_ring_rejects_bowtie() {
        let bowtie = coords(&[(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0), (0.0, 0.0)]);
        assert_eq!(SimpleRing::new(bowtie), Err(GeometryError::SelfIntersecting));
    }

    #[test]
    fn simple_ring_rejects_collapsed_loop() {
        let collapsed = coords(&[(0.0, 0.0), (1.0, 0.0), (0.0, 0.0), (1.0, 0.0), (0.0, 0.0)]);
        assert_eq!(
            SimpleRing::new(collapsed),
            Err(GeometryError::TooFewVertices { required: 3, actual: 2 })
        );
    }

    #[test]
    fn make_counterclockwise_flips_clockwise_rings() {
        let cw = SimpleRing::try_from(square().reversed()).unwrap();
        assert!(cw.is_clockwise());
        assert!(!cw.make_counterclockwise().is_clockwise());
    }
}
