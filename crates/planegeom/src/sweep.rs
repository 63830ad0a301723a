//! Self-intersection test for closed vertex loops.
//!
//! A Shamos–Hoey style sweep: every edge contributes a start and an end event,
//! events are visited left to right, and an ordered set holds the edges that
//! are currently "active".  Only neighbours in that set are ever compared, so
//! the test runs in `O(n log n)`.
//!
//! The active set is ordered by the edges' start points (then end points)
//! rather than by their height at the sweep position.  This approximates a
//! true sweep-line ordering and is what rings are accepted or rejected by;
//! keep it stable.
//!
//! Edges that merely share an endpoint are never reported as intersecting
//! (see [`Segment::intersects`]), so rings that touch themselves at a repeated
//! vertex pass.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::ops::Bound::{Excluded, Unbounded};

use geo::Coord;

use crate::segment::Segment;

/// `<`/`==` comparison that treats `-0.0 == 0.0`, matching the way vertex
/// positions are compared everywhere else.
#[inline]
fn cmp_f64(a: f64, b: f64) -> Ordering {
    if a < b { Ordering::Less } else if a == b { Ordering::Equal } else { Ordering::Greater }
}

/// Lexicographic (x, then y) point order.
#[inline]
fn cmp_xy(a: Coord<f64>, b: Coord<f64>) -> Ordering {
    cmp_f64(a.x, b.x).then_with(|| cmp_f64(a.y, b.y))
}

/// An edge in the active set, ordered by start y, start x, end y, end x.
#[derive(Clone, Copy, Debug)]
struct Active(Segment);

impl Ord for Active {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (&self.0, &other.0);
        cmp_f64(a.p1.y, b.p1.y)
            .then_with(|| cmp_f64(a.p1.x, b.p1.x))
            .then_with(|| cmp_f64(a.p2.y, b.p2.y))
            .then_with(|| cmp_f64(a.p2.x, b.p2.x))
    }
}

impl PartialOrd for Active {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl PartialEq for Active {
    fn eq(&self, other: &Self) -> bool { self.cmp(other) == Ordering::Equal }
}

impl Eq for Active {}

struct Event {
    start: bool,
    edge: Active,
}

impl Event {
    #[inline]
    fn point(&self) -> Coord<f64> {
        if self.start { self.edge.0.p1 } else { self.edge.0.p2 }
    }
}

/// Returns `true` if the closed loop (first vertex repeated as last) has two
/// edges that intersect anywhere other than at a shared endpoint.
pub fn is_self_intersecting(vertex_loop: &[Coord<f64>]) -> bool {
    let edges = vertex_loop.len().saturating_sub(1);

    let mut events = Vec::with_capacity(edges * 2);
    for w in vertex_loop.windows(2) {
        // Canonical orientation: p1 is the lexicographically smaller point.
        let edge = if cmp_xy(w[0], w[1]) == Ordering::Less {
            Active(Segment::new(w[0], w[1]))
        } else {
            Active(Segment::new(w[1], w[0]))
        };
        events.push(Event { start: true, edge });
        events.push(Event { start: false, edge });
    }

    // Stable, so a start event stays ahead of an end event at the same point
    // when it was emitted first.
    events.sort_by(|a, b| cmp_xy(a.point(), b.point()));

    let mut sweep: BTreeSet<Active> = BTreeSet::new();

    for event in &events {
        let edge = event.edge;
        let lower = sweep.range(..edge).next_back().copied();
        let higher = sweep.range((Excluded(edge), Unbounded)).next().copied();

        if event.start {
            sweep.insert(edge);

            if lower.is_some_and(|l| l.0.intersects(&edge.0)) { return true }
            if higher.is_some_and(|h| h.0.intersects(&edge.0)) { return true }
        } else {
            sweep.remove(&edge);

            if let (Some(l), Some(h)) = (lower, higher) {
                if l.0.intersects(&h.0) { return true }
            }
        }
    }

    false
}
