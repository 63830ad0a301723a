use geo::{Coord, Rect};
use planegeom::Segment;

use crate::input::SourceId;
use crate::tags::TagGroup;

use super::ids::{NodeId, OverlapId, RepresentationId, WayId, WaySegmentId};
use super::NodeSegment;

/// An open or closed polyline of nodes that did not become an area.
#[derive(Debug, Clone)]
pub struct Way {
    pub(crate) source: SourceId,
    pub(crate) tags: TagGroup,
    pub(crate) nodes: Vec<NodeId>,
    pub(crate) segments: Vec<WaySegmentId>,
}

impl Way {
    #[inline] pub fn source(&self) -> SourceId { self.source }

    #[inline] pub fn tags(&self) -> &TagGroup { &self.tags }

    #[inline] pub fn nodes(&self) -> &[NodeId] { &self.nodes }

    /// Segments in way order.
    #[inline] pub fn segments(&self) -> &[WaySegmentId] { &self.segments }
}

/// One step of a way, from `start` to `end`.
#[derive(Debug, Clone)]
pub struct WaySegment {
    pub(crate) way: WayId,
    pub(crate) start: NodeId,
    pub(crate) end: NodeId,
    pub(crate) line: Segment,
    pub(crate) overlaps: Vec<OverlapId>,
    pub(crate) representations: Vec<RepresentationId>,
}

impl WaySegment {
    #[inline] pub fn way(&self) -> WayId { self.way }

    #[inline] pub fn overlaps(&self) -> &[OverlapId] { &self.overlaps }

    #[inline] pub fn representations(&self) -> &[RepresentationId] { &self.representations }

    /// Vector from the start node to the end node.
    #[inline] pub fn direction(&self) -> Coord<f64> { self.line.direction() }

    #[inline] pub fn center(&self) -> Coord<f64> { self.line.center() }

    #[inline] pub fn length(&self) -> f64 { self.line.length() }

    #[inline] pub fn bounding_box(&self) -> Rect<f64> { Rect::new(self.line.p1, self.line.p2) }
}

impl NodeSegment for WaySegment {
    #[inline] fn start(&self) -> NodeId { self.start }
    #[inline] fn end(&self) -> NodeId { self.end }
    #[inline] fn line(&self) -> &Segment { &self.line }
}
