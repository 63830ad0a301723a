//! Axis-aligned rectangles for R-tree broad phases.
//!
//! Terrain cells look up the areas they might touch, and inner rings of a
//! multipolygon look up candidate outer rings, before any exact geometry runs.

use geo::{Coord, Rect};
use rstar::{RTreeObject, AABB};

/// The bounding rectangle of the `item`-th entry of some caller-owned list.
#[derive(Debug, Clone)]
pub struct BoundingBox {
    item: usize,
    rect: Rect<f64>,
}

impl BoundingBox {
    #[inline] pub fn new(item: usize, rect: Rect<f64>) -> Self { Self { item, rect } }

    #[inline] pub fn item(&self) -> usize { self.item }

    #[inline] pub fn rect(&self) -> &Rect<f64> { &self.rect }
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope { envelope_of(&self.rect) }
}

/// Envelope for an R-tree query over `rect`.
pub fn envelope_of(rect: &Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners(rect.min().into(), rect.max().into())
}

/// Smallest rectangle containing every point, or `None` for no points.
pub fn bounding_rect_of(points: impl IntoIterator<Item = Coord<f64>>) -> Option<Rect<f64>> {
    let mut points = points.into_iter();
    let first = points.next()?;
    let (min, max) = points.fold((first, first), |(min, max), c| {
        (Coord { x: min.x.min(c.x), y: min.y.min(c.y) }, Coord { x: max.x.max(c.x), y: max.y.max(c.y) })
    });
    Some(Rect::new(min, max))
}
