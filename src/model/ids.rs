//! Strongly-typed handles into the [`MapModel`](super::MapModel) arenas.

use std::fmt;

// ---------------------------------------------------------------------------
// Index types
// ---------------------------------------------------------------------------

macro_rules! idx {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub usize);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

idx!(NodeId);
idx!(WayId);
idx!(WaySegmentId);
idx!(AreaId);
idx!(AreaSegmentId);
idx!(RelationId);
idx!(OverlapId);

idx!(
    /// Opaque handle of a higher-level object attached to an element by a
    /// later pipeline stage.
    RepresentationId
);

// ---------------------------------------------------------------------------
// Element references
// ---------------------------------------------------------------------------

/// A leaf element of the model: the things that take part in overlaps and
/// carry representations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementId {
    Node(NodeId),
    WaySegment(WaySegmentId),
    Area(AreaId),
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementId::Node(id) => id.fmt(f),
            ElementId::WaySegment(id) => id.fmt(f),
            ElementId::Area(id) => id.fmt(f),
        }
    }
}

impl From<NodeId> for ElementId {
    fn from(id: NodeId) -> Self { ElementId::Node(id) }
}

impl From<WaySegmentId> for ElementId {
    fn from(id: WaySegmentId) -> Self { ElementId::WaySegment(id) }
}

impl From<AreaId> for ElementId {
    fn from(id: AreaId) -> Self { ElementId::Area(id) }
}

/// A segment connected to a node: part of a way, or part of an area outline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SegmentRef {
    Way(WaySegmentId),
    Area(AreaSegmentId),
}
