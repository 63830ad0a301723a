//! Areas from multipolygon relations.
//!
//! Member ways arrive unordered and possibly split into several fragments per
//! ring.  Fragments are chained at shared end nodes into closed rings, holes
//! are matched to the smallest enclosing outer ring, and every outer ring
//! becomes one area with the relation's tags.

use std::f64::consts::PI;

use ahash::AHashMap;
use geo::Contains;
use planegeom::coord::{cross, dot};
use planegeom::{BoundingBox, Ring, SimpleRing};
use rstar::RTree;

use crate::input::{MemberKind, RawRelation, RawWay, SourceId};
use crate::model::{AreaId, AreaSource, MapModel, NodeId};

/// Role of a ring member.  An empty role counts as outer.
fn is_outer_role(role: &str) -> bool { role.is_empty() || role == "outer" }

/// Build the areas of one multipolygon relation.  Unresolvable members and
/// broken rings are logged and left out; whatever can be assembled is kept.
pub(crate) fn build_areas(
    model: &mut MapModel,
    relation: &RawRelation,
    ways: &AHashMap<SourceId, &RawWay>,
    node_ids: &AHashMap<SourceId, NodeId>,
) -> Vec<AreaId> {
    let mut outer_fragments = Vec::new();
    let mut inner_fragments = Vec::new();

    for member in &relation.members {
        if member.kind != MemberKind::Way { continue }

        let Some(way) = ways.get(&member.id) else {
            tracing::warn!(relation = relation.id, way = member.id, "multipolygon member way is missing");
            continue;
        };

        let Some(nodes) = way.nodes.iter().map(|id| node_ids.get(id).copied()).collect::<Option<Vec<_>>>() else {
            tracing::warn!(relation = relation.id, way = way.id, "multipolygon member way references missing nodes");
            continue;
        };

        if nodes.len() < 2 { continue }

        if is_outer_role(&member.role) {
            outer_fragments.push(nodes);
        } else if member.role == "inner" {
            inner_fragments.push(nodes);
        } else {
            tracing::debug!(relation = relation.id, role = %member.role, "ignoring multipolygon member role");
        }
    }

    let outer_rings = assemble_rings(model, relation.id, outer_fragments);
    let inner_rings = assemble_rings(model, relation.id, inner_fragments);

    // Outer rings must be simple before holes can be matched against them.
    let source = AreaSource::Relation(relation.id);
    let mut outers: Vec<(Vec<NodeId>, SimpleRing)> = Vec::new();
    for nodes in outer_rings {
        match Ring::new(positions(model, &nodes)).and_then(SimpleRing::try_from) {
            Ok(ring) => outers.push((nodes, ring)),
            Err(error) => tracing::warn!(entity = %source, %error, "skipping invalid outer ring"),
        }
    }

    let tree = RTree::bulk_load(
        outers.iter().enumerate()
            .map(|(i, (_, ring))| BoundingBox::new(i, ring.bounding_rect()))
            .collect()
    );

    let mut holes: Vec<Vec<Vec<NodeId>>> = vec![Vec::new(); outers.len()];
    for nodes in inner_rings {
        let Ok(hole) = Ring::new(positions(model, &nodes)) else {
            tracing::warn!(entity = %source, "skipping degenerate inner ring");
            continue;
        };
        let hole_polygon = hole.to_polygon();
        let hole_rect = hole.bounding_rect();

        let owner = tree
            .locate_in_envelope_intersecting(&planegeom::bbox::envelope_of(&hole_rect))
            .map(BoundingBox::item)
            .filter(|&i| outers[i].1.to_polygon().contains(&hole_polygon))
            .min_by(|&a, &b| outers[a].1.area().total_cmp(&outers[b].1.area()).then(a.cmp(&b)));

        match owner {
            Some(i) => holes[i].push(nodes),
            None => tracing::warn!(entity = %source, "dropping inner ring outside every outer ring"),
        }
    }

    let mut areas = Vec::with_capacity(outers.len());
    for ((outer, _), holes) in outers.into_iter().zip(holes) {
        match model.add_area(source, relation.tags.clone(), outer, holes) {
            Ok(id) => areas.push(id),
            Err(error) => tracing::warn!(entity = %error.entity(), %error, "skipping multipolygon area"),
        }
    }
    areas
}

fn positions(model: &MapModel, nodes: &[NodeId]) -> Vec<geo::Coord<f64>> {
    nodes.iter().map(|&n| model.node(n).pos()).collect()
}

/// Chain fragments into closed rings.
///
/// Starting from the earliest unused fragment, the ring is extended at its
/// open end by a fragment starting or ending at that node.  When several
/// qualify, the one turning least away from the current direction wins;
/// equal turns go to the earlier member.  Rings that cannot be closed are
/// dropped.
pub(crate) fn assemble_rings(model: &MapModel, relation: SourceId, fragments: Vec<Vec<NodeId>>) -> Vec<Vec<NodeId>> {
    let mut unused: Vec<Option<Vec<NodeId>>> = fragments.into_iter().map(Some).collect();
    let mut rings = Vec::new();

    while let Some(mut ring) = unused.iter_mut().find_map(Option::take) {
        loop {
            let (first, last) = (ring[0], ring[ring.len() - 1]);
            if first == last {
                if ring.len() >= 4 {
                    rings.push(ring);
                } else {
                    tracing::warn!(relation, "dropping ring with fewer than three nodes");
                }
                break;
            }

            let prev = ring[ring.len() - 2];
            let incoming = model.node(last).pos() - model.node(prev).pos();

            let mut best: Option<(usize, bool, f64)> = None; // (index, reversed, turn)
            for (i, fragment) in unused.iter().enumerate() {
                let Some(fragment) = fragment else { continue };
                let reversed = if fragment[0] == last {
                    false
                } else if fragment[fragment.len() - 1] == last {
                    true
                } else {
                    continue;
                };

                let next = if reversed { fragment[fragment.len() - 2] } else { fragment[1] };
                let outgoing = model.node(next).pos() - model.node(last).pos();
                let turn = turning_angle(incoming, outgoing);

                if best.is_none_or(|(_, _, t)| turn < t) {
                    best = Some((i, reversed, turn));
                }
            }

            let Some((i, reversed, _)) = best else {
                tracing::warn!(relation, "dropping ring that cannot be closed");
                break;
            };

            let Some(mut fragment) = unused[i].take() else { break };
            if reversed { fragment.reverse(); }
            ring.extend_from_slice(&fragment[1..]);
        }
    }

    rings
}

/// Absolute change of direction from `incoming` to `outgoing`, in `[0, π]`.
fn turning_angle(incoming: geo::Coord<f64>, outgoing: geo::Coord<f64>) -> f64 {
    let angle = cross(incoming, outgoing).atan2(dot(incoming, outgoing)).abs();
    if angle.is_nan() { PI } else { angle }
}
