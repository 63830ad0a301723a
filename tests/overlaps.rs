// Integration tests for overlap detection across the whole pipeline.

use ahash::AHashSet;
use geo::Coord;
use mapweave::model::{AreaId, AreaSource, ElementId, Overlap, OverlapKind};
use mapweave::{Converter, Dataset, MapModel, TagGroup};
use proptest::prelude::*;

fn tags(pairs: &[(&str, &str)]) -> TagGroup {
    TagGroup::from_pairs(pairs.iter().copied())
}

/// Adds a square way with nodes `first_id..first_id + 4`.
fn add_square(data: &mut Dataset, id: i64, first_id: i64, min: (f64, f64), size: f64, tag: (&str, &str)) {
    let corners = [(0.0, 0.0), (size, 0.0), (size, size), (0.0, size)];
    for (i, (dx, dy)) in corners.into_iter().enumerate() {
        data.add_node(first_id + i as i64, min.0 + dx, min.1 + dy, TagGroup::new());
    }
    data.add_way(id, vec![first_id, first_id + 1, first_id + 2, first_id + 3, first_id], tags(&[tag]));
}

fn add_line(data: &mut Dataset, id: i64, first_id: i64, from: (f64, f64), to: (f64, f64)) {
    data.add_node(first_id, from.0, from.1, TagGroup::new())
        .add_node(first_id + 1, to.0, to.1, TagGroup::new())
        .add_way(id, vec![first_id, first_id + 1], tags(&[("highway", "service")]));
}

fn area_area(model: &MapModel) -> Vec<&Overlap> {
    model.overlap_ids()
        .map(|id| model.overlap(id))
        .filter(|o| matches!(o, Overlap::AreaArea { .. }))
        .collect()
}

fn area_from_way(model: &MapModel, way: i64) -> AreaId {
    model.areas_from(AreaSource::Way(way)).next().unwrap()
}

#[test]
fn crossing_ways_meet_once() {
    let mut data = Dataset::new();
    add_line(&mut data, 10, 1, (0.0, 0.0), (10.0, 10.0));
    add_line(&mut data, 11, 3, (0.0, 10.0), (10.0, 0.0));

    let model = Converter::default().convert(&data).unwrap();

    assert_eq!(model.num_overlaps(), 1);
    let id = model.overlap_ids().next().unwrap();
    let Overlap::WayWay { a, b, pos } = model.overlap(id) else { panic!("expected a way crossing") };
    assert!((pos.x - 5.0).abs() < 1e-9 && (pos.y - 5.0).abs() < 1e-9);
    assert_eq!(model.way_segment(*a).overlaps(), &[id]);
    assert_eq!(model.way_segment(*b).overlaps(), &[id]);
}

#[test]
fn connected_ways_do_not_cross() {
    let mut data = Dataset::new();
    add_line(&mut data, 10, 1, (0.0, 0.0), (10.0, 10.0));
    data.add_node(3, 10.0, 0.0, TagGroup::new())
        .add_way(11, vec![2, 3], tags(&[("highway", "service")]));

    let model = Converter::default().convert(&data).unwrap();
    assert_eq!(model.num_overlaps(), 0);
}

#[test]
fn segment_inside_area_is_contained() {
    let mut data = Dataset::new();
    add_square(&mut data, 10, 1, (0.0, 0.0), 10.0, ("building", "yes"));
    add_line(&mut data, 11, 5, (2.0, 2.0), (8.0, 8.0));

    let model = Converter::default().convert(&data).unwrap();

    let way_area: Vec<&Overlap> = model.overlap_ids()
        .map(|id| model.overlap(id))
        .filter(|o| matches!(o, Overlap::WayArea { .. }))
        .collect();
    assert_eq!(way_area.len(), 1);
    assert_eq!(way_area[0].kind(), OverlapKind::Contain);

    // Both way nodes lie inside the area as well.
    let node = model.find_node(5).unwrap();
    let area = area_from_way(&model, 10);
    assert!(model.overlaps_of(node.into()).iter()
        .any(|&id| *model.overlap(id) == Overlap::NodeArea { node, area }));
}

#[test]
fn segment_through_area_reports_crossings() {
    let mut data = Dataset::new();
    add_square(&mut data, 10, 1, (0.0, 0.0), 10.0, ("building", "yes"));
    add_line(&mut data, 11, 5, (-5.0, 5.0), (15.0, 5.0));

    let model = Converter::default().convert(&data).unwrap();

    let crossing = model.overlap_ids()
        .map(|id| model.overlap(id))
        .find(|o| matches!(o, Overlap::WayArea { .. }))
        .unwrap();
    let Overlap::WayArea { kind, positions, crossed, .. } = crossing else { unreachable!() };
    assert_eq!(*kind, OverlapKind::Intersect);
    assert_eq!(positions.len(), 2);
    assert_eq!(crossed.len(), 2);
    for expected in [Coord { x: 0.0, y: 5.0 }, Coord { x: 10.0, y: 5.0 }] {
        assert!(positions.iter().any(|p| (p.x - expected.x).abs() < 1e-9 && (p.y - expected.y).abs() < 1e-9));
    }
}

#[test]
fn areas_sharing_a_segment_do_not_intersect() {
    let mut data = Dataset::new();
    add_square(&mut data, 10, 1, (0.0, 0.0), 10.0, ("landuse", "meadow"));
    data.add_node(5, 20.0, 0.0, TagGroup::new())
        .add_node(6, 20.0, 10.0, TagGroup::new())
        .add_way(11, vec![2, 5, 6, 3, 2], tags(&[("landuse", "farmland")]));

    let model = Converter::default().convert(&data).unwrap();

    let overlaps = area_area(&model);
    assert_eq!(overlaps.len(), 1);
    assert_eq!(overlaps[0].kind(), OverlapKind::SharedSegment);
}

#[test]
fn contained_area_is_named_first_in_either_order() {
    for small_first in [false, true] {
        let mut data = Dataset::new();
        if small_first {
            add_square(&mut data, 11, 5, (2.0, 2.0), 2.0, ("building", "yes"));
            add_square(&mut data, 10, 1, (0.0, 0.0), 10.0, ("landuse", "residential"));
        } else {
            add_square(&mut data, 10, 1, (0.0, 0.0), 10.0, ("landuse", "residential"));
            add_square(&mut data, 11, 5, (2.0, 2.0), 2.0, ("building", "yes"));
        }

        let model = Converter::default().convert(&data).unwrap();
        let (big, small) = (area_from_way(&model, 10), area_from_way(&model, 11));

        let overlaps = area_area(&model);
        assert_eq!(overlaps.len(), 1);
        assert_eq!(*overlaps[0], Overlap::AreaArea { first: small, second: big, kind: OverlapKind::Contain });
    }
}

#[test]
fn areas_crossing_each_other_intersect() {
    let mut data = Dataset::new();
    add_square(&mut data, 10, 1, (0.0, 0.0), 10.0, ("landuse", "meadow"));
    add_square(&mut data, 11, 5, (5.0, 5.0), 10.0, ("landuse", "forest"));

    let model = Converter::default().convert(&data).unwrap();

    let overlaps = area_area(&model);
    assert_eq!(overlaps.len(), 1);
    assert_eq!(overlaps[0].kind(), OverlapKind::Intersect);
}

fn way_area_kinds(model: &MapModel) -> Vec<OverlapKind> {
    model.overlap_ids()
        .map(|id| model.overlap(id))
        .filter(|o| matches!(o, Overlap::WayArea { .. }))
        .map(Overlap::kind)
        .collect()
}

#[test]
fn way_leaving_an_area_corner_inward_is_contained() {
    let mut data = Dataset::new();
    add_square(&mut data, 10, 1, (0.0, 0.0), 10.0, ("building", "yes"));
    data.add_node(5, 5.0, 5.0, TagGroup::new())
        .add_way(11, vec![1, 5], tags(&[("highway", "footway")]));

    let model = Converter::default().convert(&data).unwrap();
    assert_eq!(way_area_kinds(&model), vec![OverlapKind::Contain]);
}

/// An area with a corner at the origin whose bottom edge passes 0.1 below it,
/// and a way heading straight down from that corner.
fn corner_dataset(way_length: f64) -> Dataset {
    let mut data = Dataset::new();
    data.add_node(1, 0.0, 0.0, TagGroup::new())
        .add_node(2, 5.0, 5.0, TagGroup::new())
        .add_node(3, -5.0, 5.0, TagGroup::new())
        .add_node(4, -5.0, -0.1, TagGroup::new())
        .add_node(5, 2.0, -0.1, TagGroup::new())
        .add_way(10, vec![1, 2, 3, 4, 5, 1], tags(&[("building", "yes")]))
        .add_node(6, 0.0, -way_length, TagGroup::new())
        .add_way(11, vec![1, 6], tags(&[("highway", "footway")]));
    data
}

#[test]
fn crossings_near_a_shared_node_scale_with_way_length() {
    // 0.1 from the shared node is within 1/100 of a 20 unit way...
    let model = Converter::default().convert(&corner_dataset(20.0)).unwrap();
    assert!(way_area_kinds(&model).is_empty());

    // ...but not of a 5 unit way.
    let model = Converter::default().convert(&corner_dataset(5.0)).unwrap();
    assert_eq!(way_area_kinds(&model), vec![OverlapKind::Intersect]);
}

/// A square and a second area hanging off its top right corner, with one
/// edge dipping back through the square's top edge at `dip`.
fn touching_areas(dip: (f64, f64), top_x: f64) -> Dataset {
    let mut data = Dataset::new();
    add_square(&mut data, 10, 1, (0.0, 0.0), 10.0, ("landuse", "meadow"));
    data.add_node(5, dip.0, dip.1, TagGroup::new())
        .add_node(6, top_x, 30.0, TagGroup::new())
        .add_node(7, 30.0, 30.0, TagGroup::new())
        .add_way(11, vec![3, 5, 6, 7, 3], tags(&[("landuse", "forest")]));
    data
}

#[test]
fn area_crossings_next_to_a_common_vertex_are_ignored() {
    // The second area re-crosses the top edge about 0.005 from the corner.
    let model = Converter::default().convert(&touching_areas((9.995, 9.998), 9.99)).unwrap();
    assert!(area_area(&model).is_empty());

    let model = Converter::default().convert(&touching_areas((9.0, 9.5), 8.5)).unwrap();
    let overlaps = area_area(&model);
    assert_eq!(overlaps.len(), 1);
    assert_eq!(overlaps[0].kind(), OverlapKind::Intersect);
}

// -----------------------------------------------------------------------------
// Properties
// -----------------------------------------------------------------------------

fn random_dataset(squares: &[(u8, u8, u8)], lines: &[(u8, u8, u8, u8)]) -> Dataset {
    let mut data = Dataset::new();
    let mut next_node = 1;
    for (i, &(x, y, size)) in squares.iter().enumerate() {
        add_square(&mut data, 100 + i as i64, next_node, (x as f64, y as f64), size as f64, ("building", "yes"));
        next_node += 4;
    }
    for (i, &(x1, y1, x2, y2)) in lines.iter().enumerate() {
        add_line(&mut data, 200 + i as i64, next_node, (x1 as f64, y1 as f64), (x2 as f64, y2 as f64));
        next_node += 2;
    }
    data
}

proptest! {
    #[test]
    fn overlaps_are_recorded_once_on_both_sides(
        squares in prop::collection::vec((0u8..40, 0u8..40, 1u8..15), 0..4),
        lines in prop::collection::vec((0u8..50, 0u8..50, 0u8..50, 0u8..50), 0..4),
    ) {
        prop_assume!(lines.iter().all(|&(x1, y1, x2, y2)| (x1, y1) != (x2, y2)));

        let model = Converter::default().convert(&random_dataset(&squares, &lines)).unwrap();

        let mut pairs = AHashSet::new();
        for id in model.overlap_ids() {
            let (a, b) = model.overlap(id).elements();
            prop_assert!(model.overlaps_of(a).contains(&id));
            prop_assert!(model.overlaps_of(b).contains(&id));

            let pair = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(pairs.insert(pair), "second overlap for {:?}", pair);
        }

        for element in model.elements() {
            for &id in model.overlaps_of(element) {
                prop_assert!(model.overlap(id).involves(element));
            }
        }

        // Shared outline segments rule out a crossing record for the same pair.
        let shared: Vec<(ElementId, ElementId)> = model.overlap_ids()
            .map(|id| model.overlap(id))
            .filter(|o| o.kind() == OverlapKind::SharedSegment)
            .map(|o| o.elements())
            .collect();
        for (a, b) in shared {
            let no_intersect = model.overlaps_of(a).iter().all(|&id| {
                let o = model.overlap(id);
                !(o.involves(b) && o.kind() == OverlapKind::Intersect)
            });
            prop_assert!(no_intersect);
        }
    }
}
