use geo::{Coord, Rect};
use smallvec::SmallVec;

use crate::input::SourceId;
use crate::tags::TagGroup;

use super::ids::{AreaId, AreaSegmentId, OverlapId, RepresentationId, SegmentRef, WaySegmentId};

/// A point of the map.  Every way and area vertex is a node.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) pos: Coord<f64>,
    pub(crate) source: Option<SourceId>, // None for nodes created by the converter
    pub(crate) tags: TagGroup,

    // Adjacency, sorted clockwise by the angle of the connecting segment once
    // the model is finalized.
    pub(crate) inbound: SmallVec<[WaySegmentId; 2]>,
    pub(crate) outbound: SmallVec<[WaySegmentId; 2]>,
    pub(crate) way_segments: SmallVec<[WaySegmentId; 4]>,
    pub(crate) area_segments: SmallVec<[AreaSegmentId; 4]>,
    pub(crate) connected: Vec<SegmentRef>,
    pub(crate) areas: SmallVec<[AreaId; 2]>,

    pub(crate) overlaps: Vec<OverlapId>,
    pub(crate) representations: Vec<RepresentationId>,
}

impl Node {
    pub(crate) fn new(pos: Coord<f64>, source: Option<SourceId>, tags: TagGroup) -> Self {
        Self {
            pos,
            source,
            tags,
            inbound: SmallVec::new(),
            outbound: SmallVec::new(),
            way_segments: SmallVec::new(),
            area_segments: SmallVec::new(),
            connected: Vec::new(),
            areas: SmallVec::new(),
            overlaps: Vec::new(),
            representations: Vec::new(),
        }
    }

    #[inline] pub fn pos(&self) -> Coord<f64> { self.pos }

    /// Id of the source node, `None` for nodes synthesized during conversion.
    #[inline] pub fn source(&self) -> Option<SourceId> { self.source }

    #[inline] pub fn tags(&self) -> &TagGroup { &self.tags }

    /// Way segments ending at this node.
    #[inline] pub fn inbound(&self) -> &[WaySegmentId] { &self.inbound }

    /// Way segments starting at this node.
    #[inline] pub fn outbound(&self) -> &[WaySegmentId] { &self.outbound }

    /// Inbound and outbound way segments.
    #[inline] pub fn way_segments(&self) -> &[WaySegmentId] { &self.way_segments }

    /// Area outline segments starting or ending at this node.
    #[inline] pub fn area_segments(&self) -> &[AreaSegmentId] { &self.area_segments }

    /// Way and area segments, sorted by angle.
    #[inline] pub fn connected_segments(&self) -> &[SegmentRef] { &self.connected }

    /// Areas this node is an outline vertex of.
    #[inline] pub fn adjacent_areas(&self) -> &[AreaId] { &self.areas }

    #[inline] pub fn overlaps(&self) -> &[OverlapId] { &self.overlaps }

    #[inline] pub fn representations(&self) -> &[RepresentationId] { &self.representations }

    #[inline] pub fn bounding_box(&self) -> Rect<f64> { Rect::new(self.pos, self.pos) }

    pub(crate) fn add_adjacent_area(&mut self, area: AreaId) {
        if !self.areas.contains(&area) {
            self.areas.push(area);
        }
    }
}
