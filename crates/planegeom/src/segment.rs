use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Coord, Line};

use crate::coord::{self, orientation};

/// A straight line segment from `p1` to `p2`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub p1: Coord<f64>,
    pub p2: Coord<f64>,
}

impl Segment {
    #[inline] pub fn new(p1: Coord<f64>, p2: Coord<f64>) -> Self { Self { p1, p2 } }

    #[inline] pub fn length(&self) -> f64 { coord::distance(self.p1, self.p2) }

    /// Vector from `p1` to `p2` (not normalized).
    #[inline] pub fn direction(&self) -> Coord<f64> { self.p2 - self.p1 }

    #[inline] pub fn center(&self) -> Coord<f64> { coord::lerp(self.p1, self.p2, 0.5) }

    #[inline] pub fn to_line(&self) -> Line<f64> { Line::new(self.p1, self.p2) }

    #[inline] pub fn reversed(&self) -> Self { Self::new(self.p2, self.p1) }

    /// Returns `true` if the two segments have an endpoint in common.
    pub fn shares_endpoint(&self, other: &Segment) -> bool {
        self.p1 == other.p1 || self.p1 == other.p2 || self.p2 == other.p1 || self.p2 == other.p2
    }

    /// Returns `true` if the segments cross or touch.
    ///
    /// Segments that share an endpoint are never considered intersecting, even
    /// if they overlap collinearly beyond that endpoint.  The simplicity sweep
    /// depends on this.
    pub fn intersects(&self, other: &Segment) -> bool {
        if self.shares_endpoint(other) { return false }

        let d1 = orientation(other.p1, other.p2, self.p1);
        let d2 = orientation(other.p1, other.p2, self.p2);
        let d3 = orientation(self.p1, self.p2, other.p1);
        let d4 = orientation(self.p1, self.p2, other.p2);

        if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
            && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
        {
            return true;
        }

        (d1 == 0.0 && other.bbox_contains(self.p1))
            || (d2 == 0.0 && other.bbox_contains(self.p2))
            || (d3 == 0.0 && self.bbox_contains(other.p1))
            || (d4 == 0.0 && self.bbox_contains(other.p2))
    }

    /// The single point where the two segments meet, if any.
    /// Collinear overlaps have no single intersection point and yield `None`.
    pub fn intersection(&self, other: &Segment) -> Option<Coord<f64>> {
        match line_intersection(self.to_line(), other.to_line())? {
            LineIntersection::SinglePoint { intersection, .. } => Some(intersection),
            LineIntersection::Collinear { .. } => None,
        }
    }

    /// Point on this segment closest to `point`.
    pub fn closest_point(&self, point: Coord<f64>) -> Coord<f64> {
        let dir = self.direction();
        let len_sq = coord::dot(dir, dir);
        if len_sq == 0.0 { return self.p1 }
        let t = (coord::dot(point - self.p1, dir) / len_sq).clamp(0.0, 1.0);
        coord::lerp(self.p1, self.p2, t)
    }

    #[inline]
    pub fn distance_to(&self, point: Coord<f64>) -> f64 {
        coord::distance(point, self.closest_point(point))
    }

    /// Returns `true` if `point` lies inside this segment's bounding box.
    fn bbox_contains(&self, point: Coord<f64>) -> bool {
        point.x >= self.p1.x.min(self.p2.x) && point.x <= self.p1.x.max(self.p2.x)
            && point.y >= self.p1.y.min(self.p2.y) && point.y <= self.p1.y.max(self.p2.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(x1: f64, y1: f64, x2: f64, y2: f64) -> Segment {
        Segment::new(Coord { x: x1, y: y1 }, Coord { x: x2, y: y2 })
    }

    #[test]
    fn crossing_segments_intersect_at_center() {
        let a = seg(0.0, 0.0, 10.0, 10.0);
        let b = seg(0.0, 10.0, 10.0, 0.0);
        assert!(a.intersects(&b));
        let p = a.intersection(&b).unwrap();
        assert!((p.x - 5.0).abs() < 1e-9 && (p.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn shared_endpoint_is_not_an_intersection() {
        let a = seg(0.0, 0.0, 1.0, 1.0);
        let b = seg(1.0, 1.0, 2.0, 0.0);
        assert!(!a.intersects(&b));

        // Collinear overlap beyond the shared endpoint is still ignored.
        let c = seg(1.0, 1.0, 0.5, 0.5);
        assert!(!a.intersects(&c));
    }

    #[test]
    fn touching_interior_counts() {
        let a = seg(0.0, 0.0, 2.0, 0.0);
        let b = seg(1.0, 0.0, 1.0, 1.0);
        assert!(a.intersects(&b));
    }

    #[test]
    fn parallel_segments_do_not_intersect() {
        let a = seg(0.0, 0.0, 2.0, 0.0);
        let b = seg(0.0, 1.0, 2.0, 1.0);
        assert!(!a.intersects(&b));
        assert_eq!(a.intersection(&b), None);
    }

    #[test]
    fn closest_point_is_clamped() {
        let a = seg(0.0, 0.0, 2.0, 0.0);
        assert_eq!(a.closest_point(Coord { x: -3.0, y: 1.0 }), Coord { x: 0.0, y: 0.0 });
        assert_eq!(a.closest_point(Coord { x: 1.0, y: 4.0 }), Coord { x: 1.0, y: 0.0 });
        assert_eq!(a.distance_to(Coord { x: 1.0, y: 4.0 }), 4.0);
    }
}
