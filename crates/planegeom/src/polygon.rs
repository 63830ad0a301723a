use geo::{Contains, Coord, Polygon, Rect};

use crate::ring::{Ring, SimpleRing};
use crate::segment::Segment;

/// A simple outer ring with zero or more hole rings.
///
/// The `geo` polygon is built once on construction and reused by the
/// containment predicates.
#[derive(Clone, Debug)]
pub struct AreaPolygon {
    outer: SimpleRing,
    holes: Vec<Ring>,
    polygon: Polygon<f64>,
}

impl AreaPolygon {
    pub fn new(outer: SimpleRing, holes: Vec<Ring>) -> Self {
        let polygon = Polygon::new(
            outer.to_line_string(),
            holes.iter().map(Ring::to_line_string).collect(),
        );
        Self { outer, holes, polygon }
    }

    #[inline] pub fn outer(&self) -> &SimpleRing { &self.outer }

    #[inline] pub fn holes(&self) -> &[Ring] { &self.holes }

    /// The outer ring followed by every hole.
    pub fn rings(&self) -> impl Iterator<Item = &Ring> + '_ {
        std::iter::once(self.outer.as_ring()).chain(self.holes.iter())
    }

    /// Every boundary segment, outer ring first.
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.rings().flat_map(|ring| ring.segments())
    }

    #[inline] pub fn polygon(&self) -> &Polygon<f64> { &self.polygon }

    #[inline] pub fn bounding_rect(&self) -> Rect<f64> { self.outer.bounding_rect() }

    /// Outer area minus the hole areas.
    pub fn area(&self) -> f64 {
        self.outer.area() - self.holes.iter().map(Ring::area).sum::<f64>()
    }

    /// Strict containment: points on the boundary are not contained.
    #[inline]
    pub fn contains_point(&self, point: Coord<f64>) -> bool {
        self.polygon.contains(&point)
    }

    /// The segment lies in the polygon and never leaves it.
    #[inline]
    pub fn contains_segment(&self, segment: &Segment) -> bool {
        self.polygon.contains(&segment.to_line())
    }

    /// The area enclosed by `ring` lies within the polygon.
    #[inline]
    pub fn contains_ring(&self, ring: &Ring) -> bool {
        self.polygon.contains(&ring.to_polygon())
    }

    /// Returns `true` if `segment` crosses or touches any boundary segment.
    /// Boundary segments sharing an endpoint with it do not count.
    pub fn intersects_segment(&self, segment: &Segment) -> bool {
        self.segments().any(|boundary| boundary.intersects(segment))
    }

    /// Points where `segment` meets the boundary, in boundary order.
    pub fn intersection_positions(&self, segment: &Segment) -> Vec<Coord<f64>> {
        self.segments()
            .filter_map(|boundary| boundary.intersection(segment))
            .collect()
    }

    /// Points where the two boundaries meet.
    pub fn intersection_positions_with(&self, other: &AreaPolygon) -> Vec<Coord<f64>> {
        let mut positions = Vec::new();
        for a in self.segments() {
            for b in other.segments() {
                if let Some(p) = a.intersection(&b) {
                    positions.push(p);
                }
            }
        }
        positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(points: &[(f64, f64)]) -> Ring {
        Ring::closing(points.iter().map(|&(x, y)| Coord { x, y }).collect()).unwrap()
    }

    fn square_with_hole() -> AreaPolygon {
        let outer = SimpleRing::try_from(ring(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)])).unwrap();
        let hole = ring(&[(3.0, 3.0), (7.0, 3.0), (7.0, 7.0), (3.0, 7.0)]);
        AreaPolygon::new(outer, vec![hole])
    }

    #[test]
    fn hole_excludes_points() {
        let p = square_with_hole();
        assert!(p.contains_point(Coord { x: 1.0, y: 1.0 }));
        assert!(!p.contains_point(Coord { x: 5.0, y: 5.0 }));
        assert!(!p.contains_point(Coord { x: 20.0, y: 5.0 }));
        assert_eq!(p.area(), 84.0);
        assert_eq!(p.segments().count(), 8);
    }

    #[test]
    fn segment_through_hole_is_not_contained() {
        let p = square_with_hole();
        let through = Segment::new(Coord { x: 1.0, y: 5.0 }, Coord { x: 9.0, y: 5.0 });
        assert!(!p.contains_segment(&through));
        assert_eq!(p.intersection_positions(&through).len(), 2);

        let beside = Segment::new(Coord { x: 1.0, y: 1.0 }, Coord { x: 9.0, y: 1.0 });
        assert!(p.contains_segment(&beside));
        assert!(!p.intersects_segment(&beside));
    }

    #[test]
    fn crossing_boundaries_yield_positions() {
        let a = square_with_hole();
        let outer = SimpleRing::try_from(ring(&[(8.0, 8.0), (12.0, 8.0), (12.0, 12.0), (8.0, 12.0)])).unwrap();
        let b = AreaPolygon::new(outer, vec![]);
        let mut positions = a.intersection_positions_with(&b);
        positions.sort_by(|p, q| p.x.total_cmp(&q.x));
        assert_eq!(positions, vec![Coord { x: 8.0, y: 10.0 }, Coord { x: 10.0, y: 8.0 }]);
    }
}
