use geo::Coord;

use super::ids::{AreaId, AreaSegmentId, ElementId, NodeId, WaySegmentId};

/// How two elements relate spatially.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlapKind {
    /// The elements share a complete outline segment.
    SharedSegment,
    /// One element lies inside the other.
    Contain,
    /// The outlines cross.
    Intersect,
}

/// A spatial relationship between two elements, recorded on both of them.
#[derive(Debug, Clone, PartialEq)]
pub enum Overlap {
    /// Two way segments crossing at `pos`.
    WayWay { a: WaySegmentId, b: WaySegmentId, pos: Coord<f64> },
    /// A way segment and an area.  `positions` and `crossed` are only filled
    /// for [`OverlapKind::Intersect`], pairwise: the way crosses `crossed[i]`
    /// at `positions[i]`.
    WayArea {
        segment: WaySegmentId,
        area: AreaId,
        kind: OverlapKind,
        positions: Vec<Coord<f64>>,
        crossed: Vec<AreaSegmentId>,
    },
    /// Two areas.  For [`OverlapKind::Contain`], `first` is the contained one.
    AreaArea { first: AreaId, second: AreaId, kind: OverlapKind },
    /// A node strictly inside an area.
    NodeArea { node: NodeId, area: AreaId },
}

impl Overlap {
    pub fn kind(&self) -> OverlapKind {
        match self {
            Overlap::WayWay { .. } => OverlapKind::Intersect,
            Overlap::WayArea { kind, .. } | Overlap::AreaArea { kind, .. } => *kind,
            Overlap::NodeArea { .. } => OverlapKind::Contain,
        }
    }

    /// The two participants, in recorded order.
    pub fn elements(&self) -> (ElementId, ElementId) {
        match *self {
            Overlap::WayWay { a, b, .. } => (a.into(), b.into()),
            Overlap::WayArea { segment, area, .. } => (segment.into(), area.into()),
            Overlap::AreaArea { first, second, .. } => (first.into(), second.into()),
            Overlap::NodeArea { node, area } => (node.into(), area.into()),
        }
    }

    pub fn involves(&self, element: ElementId) -> bool {
        let (a, b) = self.elements();
        a == element || b == element
    }

    /// The participant that is not `element`.
    pub fn other(&self, element: ElementId) -> Option<ElementId> {
        match self.elements() {
            (a, b) if a == element => Some(b),
            (a, b) if b == element => Some(a),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_participant() {
        let overlap = Overlap::AreaArea { first: AreaId(2), second: AreaId(5), kind: OverlapKind::Contain };
        assert_eq!(overlap.other(AreaId(2).into()), Some(ElementId::Area(AreaId(5))));
        assert_eq!(overlap.other(AreaId(5).into()), Some(ElementId::Area(AreaId(2))));
        assert_eq!(overlap.other(AreaId(7).into()), None);
        assert!(!overlap.involves(NodeId(2).into()));
    }
}
