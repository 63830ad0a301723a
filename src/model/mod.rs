//! The topological map model.
//!
//! # Structure
//!
//! Every entity kind lives in its own flat `Vec` inside [`MapModel`] and is
//! addressed by a strongly-typed index (`NodeId`, `WaySegmentId`, `AreaId`,
//! ...).  Cross references between entities are stored as these indices, never
//! as pointers.
//!
//! # Lifecycle
//!
//! The converter fills the arenas, calls [`MapModel::finalize`] to derive the
//! sorted node adjacency, and then records overlaps.  After that the model is
//! frozen except for representations added by later stages.

mod area;
mod ids;
mod node;
mod overlap;
mod relation;
mod way;

use geo::{Coord, Rect};
use planegeom::coord::clockwise_angle;
use planegeom::Segment;

pub use area::{Area, AreaSegment, AreaSource};
pub use ids::{
    AreaId, AreaSegmentId, ElementId, NodeId, OverlapId, RelationId, RepresentationId,
    SegmentRef, WayId, WaySegmentId,
};
pub use node::Node;
pub use overlap::{Overlap, OverlapKind};
pub use relation::{MemberRef, Membership, Relation};
pub use way::{Way, WaySegment};

use crate::input::SourceId;
use crate::tags::TagGroup;

/// Behavior shared by way segments and area outline segments.
pub trait NodeSegment {
    fn start(&self) -> NodeId;
    fn end(&self) -> NodeId;
    fn line(&self) -> &Segment;

    /// Returns `true` if the segments have at least one node in common.
    fn is_connected_to(&self, other: &impl NodeSegment) -> bool {
        self.start() == other.start() || self.start() == other.end()
            || self.end() == other.start() || self.end() == other.end()
    }

    /// Returns `true` if both segments connect the same two nodes, in either
    /// direction.
    fn shares_both_nodes(&self, other: &impl NodeSegment) -> bool {
        (self.start() == other.start() && self.end() == other.end())
            || (self.start() == other.end() && self.end() == other.start())
    }

    /// The node at the other end from `node`.
    fn other_node(&self, node: NodeId) -> NodeId {
        if self.start() == node { self.end() } else { self.start() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MapModel {
    pub(crate) nodes: Vec<Node>,
    pub(crate) ways: Vec<Way>,
    pub(crate) way_segments: Vec<WaySegment>,
    pub(crate) areas: Vec<Area>,
    pub(crate) area_segments: Vec<AreaSegment>,
    pub(crate) relations: Vec<Relation>,
    pub(crate) overlaps: Vec<Overlap>,
    pub(crate) file_boundary: Option<Rect<f64>>,
    pub(crate) data_boundary: Option<Rect<f64>>,
}

impl MapModel {
    pub(crate) fn new(file_boundary: Option<Rect<f64>>) -> Self {
        Self { file_boundary, ..Self::default() }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    #[inline] pub fn node(&self, id: NodeId) -> &Node { &self.nodes[id.0] }
    #[inline] pub fn way(&self, id: WayId) -> &Way { &self.ways[id.0] }
    #[inline] pub fn way_segment(&self, id: WaySegmentId) -> &WaySegment { &self.way_segments[id.0] }
    #[inline] pub fn area(&self, id: AreaId) -> &Area { &self.areas[id.0] }
    #[inline] pub fn area_segment(&self, id: AreaSegmentId) -> &AreaSegment { &self.area_segments[id.0] }
    #[inline] pub fn relation(&self, id: RelationId) -> &Relation { &self.relations[id.0] }
    #[inline] pub fn overlap(&self, id: OverlapId) -> &Overlap { &self.overlaps[id.0] }

    #[inline] pub fn num_nodes(&self) -> usize { self.nodes.len() }
    #[inline] pub fn num_ways(&self) -> usize { self.ways.len() }
    #[inline] pub fn num_way_segments(&self) -> usize { self.way_segments.len() }
    #[inline] pub fn num_areas(&self) -> usize { self.areas.len() }
    #[inline] pub fn num_relations(&self) -> usize { self.relations.len() }
    #[inline] pub fn num_overlaps(&self) -> usize { self.overlaps.len() }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> { (0..self.nodes.len()).map(NodeId) }
    pub fn way_ids(&self) -> impl Iterator<Item = WayId> { (0..self.ways.len()).map(WayId) }
    pub fn way_segment_ids(&self) -> impl Iterator<Item = WaySegmentId> { (0..self.way_segments.len()).map(WaySegmentId) }
    pub fn area_ids(&self) -> impl Iterator<Item = AreaId> { (0..self.areas.len()).map(AreaId) }
    pub fn relation_ids(&self) -> impl Iterator<Item = RelationId> { (0..self.relations.len()).map(RelationId) }
    pub fn overlap_ids(&self) -> impl Iterator<Item = OverlapId> { (0..self.overlaps.len()).map(OverlapId) }

    /// Every leaf element: nodes, then way segments, then areas.
    pub fn elements(&self) -> impl Iterator<Item = ElementId> {
        self.node_ids().map(ElementId::Node)
            .chain(self.way_segment_ids().map(ElementId::WaySegment))
            .chain(self.area_ids().map(ElementId::Area))
    }

    /// Look up a node by the id it had in the source data.
    pub fn find_node(&self, source: SourceId) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.source == Some(source)).map(NodeId)
    }

    /// Areas built from the given source entity, in build order.
    pub fn areas_from(&self, source: AreaSource) -> impl Iterator<Item = AreaId> + '_ {
        self.area_ids().filter(move |&id| self.areas[id.0].source == source)
    }

    // -----------------------------------------------------------------------
    // Whole-model queries
    // -----------------------------------------------------------------------

    /// Declared bounds of the input, if any.
    #[inline] pub fn file_boundary(&self) -> Option<Rect<f64>> { self.file_boundary }

    /// Bounds covering the declared bounds and every node.  `None` for an
    /// empty model without declared bounds.
    #[inline] pub fn data_boundary(&self) -> Option<Rect<f64>> { self.data_boundary }

    /// The declared bounds if present, otherwise the data-derived bounds.
    #[inline]
    pub fn boundary(&self) -> Option<Rect<f64>> {
        self.file_boundary.or(self.data_boundary)
    }

    /// Mean node position; the origin for a model without nodes.
    pub fn center(&self) -> Coord<f64> {
        let n = self.nodes.len() as f64;
        if self.nodes.is_empty() { return Coord { x: 0.0, y: 0.0 } }
        // Divide before summing so large coordinates do not lose precision.
        self.nodes.iter().fold(Coord { x: 0.0, y: 0.0 }, |acc, node| Coord {
            x: acc.x + node.pos.x / n,
            y: acc.y + node.pos.y / n,
        })
    }

    /// Tags of any leaf element.
    pub fn tags(&self, element: ElementId) -> &TagGroup {
        match element {
            ElementId::Node(id) => &self.nodes[id.0].tags,
            ElementId::WaySegment(id) => &self.ways[self.way_segments[id.0].way.0].tags,
            ElementId::Area(id) => &self.areas[id.0].tags,
        }
    }

    /// Axis-aligned bounding box of any leaf element.
    pub fn bounding_box(&self, element: ElementId) -> Rect<f64> {
        match element {
            ElementId::Node(id) => self.nodes[id.0].bounding_box(),
            ElementId::WaySegment(id) => self.way_segments[id.0].bounding_box(),
            ElementId::Area(id) => self.areas[id.0].bounding_box(),
        }
    }

    pub fn overlaps_of(&self, element: ElementId) -> &[OverlapId] {
        match element {
            ElementId::Node(id) => &self.nodes[id.0].overlaps,
            ElementId::WaySegment(id) => &self.way_segments[id.0].overlaps,
            ElementId::Area(id) => &self.areas[id.0].overlaps,
        }
    }

    // -----------------------------------------------------------------------
    // Node adjacency
    // -----------------------------------------------------------------------

    /// Ways with a segment at `node`, without repetition, in angle order.
    pub fn connected_ways(&self, node: NodeId) -> Vec<WayId> {
        let mut ways: Vec<WayId> = Vec::new();
        for seg in &self.nodes[node.0].way_segments {
            let way = self.way_segments[seg.0].way;
            if !ways.contains(&way) {
                ways.push(way);
            }
        }
        ways
    }

    /// Clockwise angle, seen from `node`, of the segment towards its other
    /// end.
    pub fn segment_angle(&self, node: NodeId, segment: SegmentRef) -> f64 {
        let other = match segment {
            SegmentRef::Way(id) => self.way_segments[id.0].other_node(node),
            SegmentRef::Area(id) => self.area_segments[id.0].other_node(node),
        };
        clockwise_angle(self.nodes[other.0].pos - self.nodes[node.0].pos)
    }

    // -----------------------------------------------------------------------
    // Representations
    // -----------------------------------------------------------------------

    /// Attach a higher-level object to an element.  The first one attached
    /// becomes the primary representation.
    pub fn add_representation(&mut self, element: ElementId, representation: RepresentationId) {
        self.representations_mut(element).push(representation);
    }

    pub fn representations(&self, element: ElementId) -> &[RepresentationId] {
        match element {
            ElementId::Node(id) => &self.nodes[id.0].representations,
            ElementId::WaySegment(id) => &self.way_segments[id.0].representations,
            ElementId::Area(id) => &self.areas[id.0].representations,
        }
    }

    #[inline]
    pub fn primary_representation(&self, element: ElementId) -> Option<RepresentationId> {
        self.representations(element).first().copied()
    }

    fn representations_mut(&mut self, element: ElementId) -> &mut Vec<RepresentationId> {
        match element {
            ElementId::Node(id) => &mut self.nodes[id.0].representations,
            ElementId::WaySegment(id) => &mut self.way_segments[id.0].representations,
            ElementId::Area(id) => &mut self.areas[id.0].representations,
        }
    }

    // -----------------------------------------------------------------------
    // Build phases
    // -----------------------------------------------------------------------

    pub(crate) fn add_node(&mut self, pos: Coord<f64>, source: Option<SourceId>, tags: TagGroup) -> NodeId {
        self.nodes.push(Node::new(pos, source, tags));
        NodeId(self.nodes.len() - 1)
    }

    /// Add a way over at least two nodes.  Repeated consecutive nodes do not
    /// produce segments.
    pub(crate) fn add_way(&mut self, source: SourceId, tags: TagGroup, nodes: Vec<NodeId>) -> WayId {
        let id = WayId(self.ways.len());
        let mut segments = Vec::with_capacity(nodes.len().saturating_sub(1));

        for w in nodes.windows(2) {
            let (start, end) = (w[0], w[1]);
            if start == end { continue }

            let seg = WaySegmentId(self.way_segments.len());
            self.way_segments.push(WaySegment {
                way: id,
                start,
                end,
                line: Segment::new(self.nodes[start.0].pos, self.nodes[end.0].pos),
                overlaps: Vec::new(),
                representations: Vec::new(),
            });
            self.nodes[start.0].outbound.push(seg);
            self.nodes[end.0].inbound.push(seg);
            segments.push(seg);
        }

        self.ways.push(Way { source, tags, nodes, segments });
        id
    }

    pub(crate) fn add_relation(&mut self, relation: Relation) -> RelationId {
        self.relations.push(relation);
        RelationId(self.relations.len() - 1)
    }

    /// Record an overlap on both participants.
    pub(crate) fn add_overlap(&mut self, overlap: Overlap) -> OverlapId {
        let id = OverlapId(self.overlaps.len());
        let (a, b) = overlap.elements();
        self.overlaps.push(overlap);
        for element in [a, b] {
            match element {
                ElementId::Node(n) => self.nodes[n.0].overlaps.push(id),
                ElementId::WaySegment(s) => self.way_segments[s.0].overlaps.push(id),
                ElementId::Area(a) => self.areas[a.0].overlaps.push(id),
            }
        }
        id
    }

    /// Derive the data boundary and the angle-sorted node adjacency.  Must
    /// run after every way and area has been added.
    pub(crate) fn finalize(&mut self) {
        self.data_boundary = self.nodes.iter().map(|n| n.pos)
            .chain(self.file_boundary.iter().flat_map(|r| [r.min(), r.max()]))
            .fold(None, |acc: Option<Rect<f64>>, c| Some(match acc {
                None => Rect::new(c, c),
                Some(r) => Rect::new(
                    Coord { x: r.min().x.min(c.x), y: r.min().y.min(c.y) },
                    Coord { x: r.max().x.max(c.x), y: r.max().y.max(c.y) },
                ),
            }));

        for i in 0..self.nodes.len() {
            let node = NodeId(i);

            let mut area_segments: Vec<AreaSegmentId> = Vec::new();
            for area in &self.nodes[i].areas {
                for &seg in &self.areas[area.0].segments {
                    let s = &self.area_segments[seg.0];
                    if s.start == node || s.end == node {
                        area_segments.push(seg);
                    }
                }
            }

            let by_angle = |model: &MapModel, a: SegmentRef, b: SegmentRef| {
                model.segment_angle(node, a).total_cmp(&model.segment_angle(node, b))
            };

            let mut inbound = self.nodes[i].inbound.clone();
            inbound.sort_by(|&a, &b| by_angle(self, SegmentRef::Way(a), SegmentRef::Way(b)));
            let mut outbound = self.nodes[i].outbound.clone();
            outbound.sort_by(|&a, &b| by_angle(self, SegmentRef::Way(a), SegmentRef::Way(b)));

            let mut way_segments: smallvec::SmallVec<[WaySegmentId; 4]> =
                inbound.iter().chain(outbound.iter()).copied().collect();
            way_segments.sort_by(|&a, &b| by_angle(self, SegmentRef::Way(a), SegmentRef::Way(b)));

            area_segments.sort_by(|&a, &b| by_angle(self, SegmentRef::Area(a), SegmentRef::Area(b)));

            let mut connected: Vec<SegmentRef> = way_segments.iter().map(|&s| SegmentRef::Way(s))
                .chain(area_segments.iter().map(|&s| SegmentRef::Area(s)))
                .collect();
            connected.sort_by(|&a, &b| by_angle(self, a, b));

            let n = &mut self.nodes[i];
            n.inbound = inbound;
            n.outbound = outbound;
            n.way_segments = way_segments;
            n.area_segments = area_segments.into_iter().collect();
            n.connected = connected;
        }
    }
}
