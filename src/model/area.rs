use std::fmt;

use geo::{Coord, Rect};
use planegeom::{AreaPolygon, GeometryError, Ring, Segment, SimpleRing};

use crate::error::BuildError;
use crate::input::SourceId;
use crate::tags::TagGroup;

use super::ids::{AreaId, AreaSegmentId, NodeId, OverlapId, RepresentationId};
use super::{MapModel, NodeSegment};

/// Where an area's outline came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaSource {
    /// A closed way with an area tag.
    Way(SourceId),
    /// A multipolygon relation.
    Relation(SourceId),
    /// Synthetic background filling the gaps between other areas.
    Terrain,
}

impl fmt::Display for AreaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AreaSource::Way(id) => write!(f, "w{id}"),
            AreaSource::Relation(id) => write!(f, "r{id}"),
            AreaSource::Terrain => write!(f, "terrain"),
        }
    }
}

/// A polygon of nodes: one simple outer ring plus optional holes.
#[derive(Debug, Clone)]
pub struct Area {
    pub(crate) source: AreaSource,
    pub(crate) tags: TagGroup,
    pub(crate) outer: Vec<NodeId>,      // Closed: first node repeated as last
    pub(crate) holes: Vec<Vec<NodeId>>, // Closed, like `outer`
    pub(crate) polygon: AreaPolygon,
    pub(crate) segments: Vec<AreaSegmentId>,
    pub(crate) overlaps: Vec<OverlapId>,
    pub(crate) representations: Vec<RepresentationId>,
}

impl Area {
    #[inline] pub fn source(&self) -> AreaSource { self.source }

    #[inline] pub fn tags(&self) -> &TagGroup { &self.tags }

    /// Outer ring nodes, first node repeated as last.
    #[inline] pub fn outer_nodes(&self) -> &[NodeId] { &self.outer }

    #[inline] pub fn holes(&self) -> &[Vec<NodeId>] { &self.holes }

    /// The outer ring followed by every hole.
    pub fn rings(&self) -> impl Iterator<Item = &[NodeId]> + '_ {
        std::iter::once(self.outer.as_slice()).chain(self.holes.iter().map(Vec::as_slice))
    }

    #[inline] pub fn polygon(&self) -> &AreaPolygon { &self.polygon }

    #[inline] pub fn outer_polygon(&self) -> &SimpleRing { self.polygon.outer() }

    /// Outline segments: the outer ring first, then each hole.
    #[inline] pub fn segments(&self) -> &[AreaSegmentId] { &self.segments }

    #[inline] pub fn overlaps(&self) -> &[OverlapId] { &self.overlaps }

    #[inline] pub fn representations(&self) -> &[RepresentationId] { &self.representations }

    #[inline] pub fn bounding_box(&self) -> Rect<f64> { self.polygon.bounding_rect() }

    /// Returns `true` if `node` is a vertex of any ring.
    pub fn has_node(&self, node: NodeId) -> bool {
        self.rings().any(|ring| ring.contains(&node))
    }
}

/// One step of an area outline.
#[derive(Debug, Clone)]
pub struct AreaSegment {
    pub(crate) area: AreaId,
    pub(crate) start: NodeId,
    pub(crate) end: NodeId,
    pub(crate) line: Segment,
    pub(crate) area_right: bool,
}

impl AreaSegment {
    #[inline] pub fn area(&self) -> AreaId { self.area }

    /// Whether the area lies to the right of the segment, looking from start
    /// to end.
    #[inline] pub fn is_area_right(&self) -> bool { self.area_right }

    #[inline] pub fn direction(&self) -> Coord<f64> { self.line.direction() }

    #[inline] pub fn center(&self) -> Coord<f64> { self.line.center() }
}

impl NodeSegment for AreaSegment {
    #[inline] fn start(&self) -> NodeId { self.start }
    #[inline] fn end(&self) -> NodeId { self.end }
    #[inline] fn line(&self) -> &Segment { &self.line }
}

impl MapModel {
    /// Build an area from closed node rings and register it with its nodes.
    ///
    /// Fails without touching the model if a ring is not closed, has fewer
    /// than three nodes, or the outer ring intersects itself.
    pub(crate) fn add_area(
        &mut self,
        source: AreaSource,
        tags: TagGroup,
        outer: Vec<NodeId>,
        holes: Vec<Vec<NodeId>>,
    ) -> Result<AreaId, BuildError> {
        let outer_ring = self.ring_of(&outer)
            .and_then(SimpleRing::try_from)
            .map_err(|error| BuildError::InvalidOuterRing { entity: source, error })?;

        let hole_rings = holes.iter()
            .map(|hole| self.ring_of(hole))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error| BuildError::InvalidHole { entity: source, error })?;

        let id = AreaId(self.areas.len());

        // Outline segments know on which side the area lies.
        let mut segments = Vec::new();
        let outer_right = outer_ring.is_clockwise();
        self.push_area_segments(id, &outer, outer_right, &mut segments);
        for (hole, ring) in holes.iter().zip(&hole_rings) {
            self.push_area_segments(id, hole, !ring.is_clockwise(), &mut segments);
        }

        let area = Area {
            source,
            tags,
            polygon: AreaPolygon::new(outer_ring, hole_rings),
            outer,
            holes,
            segments,
            overlaps: Vec::new(),
            representations: Vec::new(),
        };

        for ring in area.rings() {
            for &node in ring {
                self.nodes[node.0].add_adjacent_area(id);
            }
        }

        self.areas.push(area);
        Ok(id)
    }

    fn positions(&self, ring: &[NodeId]) -> Vec<Coord<f64>> {
        ring.iter().map(|n| self.nodes[n.0].pos).collect()
    }

    fn ring_of(&self, ring: &[NodeId]) -> Result<Ring, GeometryError> {
        ring_closed(ring)?;
        Ring::new(self.positions(ring))
    }

    fn push_area_segments(&mut self, area: AreaId, ring: &[NodeId], area_right: bool, out: &mut Vec<AreaSegmentId>) {
        for w in ring.windows(2) {
            let id = AreaSegmentId(self.area_segments.len());
            self.area_segments.push(AreaSegment {
                area,
                start: w[0],
                end: w[1],
                line: Segment::new(self.nodes[w[0].0].pos, self.nodes[w[1].0].pos),
                area_right,
            });
            out.push(id);
        }
    }
}

/// Node rings are closed by repeating the same node, not just the same
/// position.
fn ring_closed(ring: &[NodeId]) -> Result<(), GeometryError> {
    if ring.len() >= 2 && ring.first() != ring.last() {
        return Err(GeometryError::NotClosed);
    }
    Ok(())
}
