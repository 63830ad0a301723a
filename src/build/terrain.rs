//! Background terrain areas.
//!
//! The boundary is cut into a grid of cells; what remains of each cell after
//! removing every other area becomes one or more `landcover=terrain` areas.

use ahash::AHashMap;
use geo::{BooleanOps, Coord, LineString, MultiPolygon, Rect};
use planegeom::bbox::envelope_of;
use planegeom::coord::coord_key;
use planegeom::BoundingBox;
use rstar::RTree;

use crate::model::{AreaId, AreaSource, MapModel, NodeId};
use crate::tags::TagGroup;

pub(crate) fn build_terrain(model: &mut MapModel, boundary: Rect<f64>, cells_per_axis: usize) -> Vec<AreaId> {
    let tree = RTree::bulk_load(
        model.area_ids()
            .map(|id| BoundingBox::new(id.0, model.area(id).bounding_box()))
            .collect()
    );

    // Terrain outlines reuse existing nodes wherever they hit one exactly.
    let mut node_lookup: AHashMap<(u64, u64), NodeId> = AHashMap::new();
    for id in model.node_ids() {
        node_lookup.entry(coord_key(model.node(id).pos())).or_insert(id);
    }

    let tags = TagGroup::from_pairs([("landcover", "terrain")]);
    let mut created = Vec::new();

    for row in 0..cells_per_axis {
        for col in 0..cells_per_axis {
            let cell = cell_rect(&boundary, cells_per_axis, col, row);

            let covering = tree.locate_in_envelope_intersecting(&envelope_of(&cell))
                .map(|b| MultiPolygon::new(vec![model.area(AreaId(b.item())).polygon().polygon().clone()]))
                .reduce(|a, b| a.union(&b));

            let cell_polygon = MultiPolygon::new(vec![cell.to_polygon()]);
            let remainder = match covering {
                Some(covering) => cell_polygon.difference(&covering),
                None => cell_polygon,
            };

            for polygon in remainder {
                let outer = ring_nodes(model, &mut node_lookup, polygon.exterior());
                let holes = polygon.interiors().iter()
                    .map(|ring| ring_nodes(model, &mut node_lookup, ring))
                    .collect();

                match model.add_area(AreaSource::Terrain, tags.clone(), outer, holes) {
                    Ok(id) => created.push(id),
                    Err(error) => tracing::warn!(col, row, %error, "skipping terrain piece"),
                }
            }
        }
    }

    tracing::debug!(areas = created.len(), "created terrain areas");
    created
}

/// Cell `(col, row)` of an `n × n` split.  Neighbouring cells share their edge
/// coordinates exactly, and the outermost cells end exactly on the boundary.
fn cell_rect(boundary: &Rect<f64>, n: usize, col: usize, row: usize) -> Rect<f64> {
    let (min, max) = (boundary.min(), boundary.max());
    let step_x = boundary.width() / n as f64;
    let step_y = boundary.height() / n as f64;

    let edge = |start: f64, end: f64, step: f64, i: usize| {
        if i == n { end } else { start + step * i as f64 }
    };

    Rect::new(
        Coord { x: edge(min.x, max.x, step_x, col), y: edge(min.y, max.y, step_y, row) },
        Coord { x: edge(min.x, max.x, step_x, col + 1), y: edge(min.y, max.y, step_y, row + 1) },
    )
}

/// Nodes for a closed ring of coordinates, creating nodes where none exist.
/// Consecutive duplicates collapse into one node.
fn ring_nodes(model: &mut MapModel, lookup: &mut AHashMap<(u64, u64), NodeId>, ring: &LineString<f64>) -> Vec<NodeId> {
    let mut nodes: Vec<NodeId> = Vec::with_capacity(ring.0.len());
    for &c in ring.coords() {
        let id = *lookup.entry(coord_key(c))
            .or_insert_with(|| model.add_node(c, None, TagGroup::new()));
        if nodes.last() != Some(&id) {
            nodes.push(id);
        }
    }
    nodes
}
