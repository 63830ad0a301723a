//! Pairwise overlap classification.

use ahash::AHashSet;
use geo::Coord;
use planegeom::coord::{coord_key, distance};

use crate::config::ConversionConfig;
use crate::model::{
    AreaId, ElementId, MapModel, NodeId, NodeSegment, Overlap, OverlapKind, WaySegmentId,
};

use super::grid::IntersectionGrid;

/// Find every overlap between elements and record it on both participants.
///
/// Elements are fed through an [`IntersectionGrid`] one by one; each is
/// compared only to the earlier elements sharing a cell with it, so every
/// candidate pair is classified exactly once.
pub fn detect_overlaps(model: &mut MapModel, config: &ConversionConfig) {
    let Some(boundary) = model.data_boundary() else { return };

    let mut grid = IntersectionGrid::new(boundary, config.grid_cell_size, config.max_grid_cells_per_axis);
    let elements: Vec<ElementId> = model.elements().collect();

    let mut found = Vec::new();
    for element in elements {
        let rect = model.bounding_box(element);
        for other in grid.insert_and_probe(element, &rect) {
            if let Some(overlap) = classify(model, config, other, element) {
                found.push(overlap);
            }
        }
    }

    let count = found.len();
    for overlap in found {
        model.add_overlap(overlap);
    }

    tracing::debug!(overlaps = count, cols = grid.cols(), rows = grid.rows(), "detected overlaps");
}

/// Classify one pair.  The result does not depend on the order of `a` and `b`
/// except for which way segment of a [`Overlap::WayWay`] is named first.
pub fn classify(model: &MapModel, config: &ConversionConfig, a: ElementId, b: ElementId) -> Option<Overlap> {
    use ElementId::*;

    match (a, b) {
        (WaySegment(s1), WaySegment(s2)) => way_way(model, s1, s2),
        (WaySegment(s), Area(area)) | (Area(area), WaySegment(s)) => way_area(model, config, s, area),
        (Area(a1), Area(a2)) => area_area(model, config, a1, a2),
        (Node(n), Area(area)) | (Area(area), Node(n)) => node_area(model, n, area),
        _ => None,
    }
}

fn way_way(model: &MapModel, s1: WaySegmentId, s2: WaySegmentId) -> Option<Overlap> {
    let (seg1, seg2) = (model.way_segment(s1), model.way_segment(s2));
    if seg1.is_connected_to(seg2) { return None }

    let pos = seg1.line().intersection(seg2.line())?;
    Some(Overlap::WayWay { a: s1, b: s2, pos })
}

fn way_area(model: &MapModel, config: &ConversionConfig, s: WaySegmentId, a: AreaId) -> Option<Overlap> {
    let segment = model.way_segment(s);
    let area = model.area(a);
    let line = segment.line();

    // A way running along the outline shares that segment and nothing more.
    if area.segments().iter().any(|&id| model.area_segment(id).shares_both_nodes(segment)) {
        return Some(Overlap::WayArea {
            segment: s,
            area: a,
            kind: OverlapKind::SharedSegment,
            positions: Vec::new(),
            crossed: Vec::new(),
        });
    }

    let polygon = area.polygon();
    let shared: Vec<Coord<f64>> = [segment.start(), segment.end()].into_iter()
        .filter(|&n| model.node(n).adjacent_areas().contains(&a))
        .map(|n| model.node(n).pos())
        .collect();

    let (intersects, contains) = if shared.is_empty() {
        let intersects = polygon.intersects_segment(line);
        (intersects, !intersects && polygon.contains_segment(line))
    } else {
        // Crossings right at the shared node(s) do not count.
        let tolerance = line.length() / config.line_tolerance_divisor;
        let intersects = polygon.intersection_positions(line).into_iter()
            .any(|pos| shared.iter().all(|&node| distance(pos, node) > tolerance));
        (intersects, !intersects && polygon.contains_point(line.center()))
    };

    if intersects {
        let mut positions = Vec::new();
        let mut crossed = Vec::new();
        for &id in area.segments() {
            if let Some(pos) = line.intersection(model.area_segment(id).line()) {
                positions.push(pos);
                crossed.push(id);
            }
        }
        Some(Overlap::WayArea { segment: s, area: a, kind: OverlapKind::Intersect, positions, crossed })
    } else if contains {
        Some(Overlap::WayArea {
            segment: s,
            area: a,
            kind: OverlapKind::Contain,
            positions: Vec::new(),
            crossed: Vec::new(),
        })
    } else {
        None
    }
}

fn area_area(model: &MapModel, config: &ConversionConfig, a1: AreaId, a2: AreaId) -> Option<Overlap> {
    // Keep the pair in id order so the result never depends on probe order.
    let (a1, a2) = if a1 <= a2 { (a1, a2) } else { (a2, a1) };
    let (area1, area2) = (model.area(a1), model.area(a2));

    for &id1 in area1.segments() {
        let seg1 = model.area_segment(id1);
        if area2.segments().iter().any(|&id2| model.area_segment(id2).shares_both_nodes(seg1)) {
            return Some(Overlap::AreaArea { first: a1, second: a2, kind: OverlapKind::SharedSegment });
        }
    }

    let (polygon1, polygon2) = (area1.polygon(), area2.polygon());

    let vertices1: AHashSet<(u64, u64)> = polygon1.rings()
        .flat_map(|ring| ring.vertices().iter().map(|&c| coord_key(c)))
        .collect();
    let common: Vec<Coord<f64>> = polygon2.rings()
        .flat_map(|ring| ring.vertices().iter().copied())
        .filter(|&c| vertices1.contains(&coord_key(c)))
        .collect();

    let intersects = polygon1.intersection_positions_with(polygon2).into_iter()
        .any(|pos| common.iter().all(|&c| distance(pos, c) >= config.shared_node_tolerance));

    if intersects {
        Some(Overlap::AreaArea { first: a1, second: a2, kind: OverlapKind::Intersect })
    } else if polygon1.contains_ring(polygon2.outer()) {
        Some(Overlap::AreaArea { first: a2, second: a1, kind: OverlapKind::Contain })
    } else if polygon2.contains_ring(polygon1.outer()) {
        Some(Overlap::AreaArea { first: a1, second: a2, kind: OverlapKind::Contain })
    } else {
        None
    }
}

fn node_area(model: &MapModel, n: NodeId, a: AreaId) -> Option<Overlap> {
    model.area(a).polygon().contains_point(model.node(n).pos())
        .then_some(Overlap::NodeArea { node: n, area: a })
}
