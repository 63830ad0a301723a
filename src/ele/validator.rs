//! Contradiction checks in front of any [`ConstraintEnforcer`].

use ahash::{AHashMap, AHashSet};
use planegeom::coord::distance;

use super::connector::JoinKey;
use super::{Connector, ConnectorId, ConstraintEnforcer, ConstraintError, ConstraintType, UnionFind};

/// A smoothness triple whose incline changes too abruptly in the solution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothnessIssue {
    pub triple: [ConnectorId; 3],
    /// Difference between the inclines before and after the middle connector.
    pub incline_change: f64,
    /// Horizontal distance between the outer connectors (metres).
    pub distance: f64,
}

impl SmoothnessIssue {
    #[inline] pub fn change_per_metre(&self) -> f64 { self.incline_change / self.distance }
}

/// Whether a vertical distance rules out equal elevations.
fn is_strict(kind: ConstraintType, distance: f64) -> bool {
    (kind != ConstraintType::Max && distance > 0.0) || (kind != ConstraintType::Min && distance < 0.0)
}

/// Wraps an enforcer and fails as soon as a declaration contradicts earlier
/// ones: a same-elevation pair that must also be a non-zero vertical distance
/// apart, in either declaration order.  After solving, it reports smoothness
/// triples whose incline changes more than the threshold per metre.
#[derive(Debug, Clone)]
pub struct ConstraintValidator<E> {
    inner: E,
    same_ele: UnionFind,
    joins: AHashMap<JoinKey, ConnectorId>,
    /// Class roots that must differ in elevation, stored in both directions.
    strict: AHashMap<usize, AHashSet<usize>>,
    smoothness: Vec<[ConnectorId; 3]>,
    smoothness_threshold: f64,
    issues: Vec<SmoothnessIssue>,
}

impl<E: ConstraintEnforcer> ConstraintValidator<E> {
    pub fn new(inner: E, smoothness_threshold: f64) -> Self {
        Self {
            inner,
            same_ele: UnionFind::default(),
            joins: AHashMap::new(),
            strict: AHashMap::new(),
            smoothness: Vec::new(),
            smoothness_threshold,
            issues: Vec::new(),
        }
    }

    #[inline] pub fn inner(&self) -> &E { &self.inner }

    #[inline] pub fn into_inner(self) -> E { self.inner }

    /// Triples flagged by the last solve.
    #[inline] pub fn smoothness_issues(&self) -> &[SmoothnessIssue] { &self.issues }

    fn describe(&self, id: ConnectorId) -> String {
        let Some(connector) = self.inner.connector(id) else { return id.to_string() };
        let (x, y) = (connector.pos.x, connector.pos.y);
        match &connector.owner {
            Some(owner) => format!("{id} at ({x:.2}, {y:.2}) of {owner}"),
            None => format!("{id} at ({x:.2}, {y:.2})"),
        }
    }

    fn contradiction(&self, reason: &'static str, first: ConnectorId, second: ConnectorId) -> ConstraintError {
        let error = ConstraintError::Contradiction { reason, first: self.describe(first), second: self.describe(second) };
        tracing::error!(%error, "contradictory elevation constraint");
        error
    }

    fn check_known(&self, ids: &[ConnectorId]) -> Result<(), ConstraintError> {
        if self.inner.is_solved() { return Err(ConstraintError::AlreadySolved) }
        match ids.iter().find(|&&id| self.inner.connector(id).is_none()) {
            Some(&id) => Err(ConstraintError::UnknownConnector(id)),
            None => Ok(()),
        }
    }

    /// Merge two classes, moving the strict relations of the absorbed root
    /// over to the surviving one.
    fn join(&mut self, ra: usize, rb: usize) {
        let root = self.same_ele.union(ra, rb);
        let gone = if root == ra { rb } else { ra };
        if gone == root { return }

        let Some(moved) = self.strict.remove(&gone) else { return };
        for other in &moved {
            if let Some(set) = self.strict.get_mut(other) {
                set.remove(&gone);
                set.insert(root);
            }
        }
        self.strict.entry(root).or_default().extend(moved);
    }

    /// Fail if joining `a` and `b` would put a strict pair in one class.
    fn check_same_ele(&mut self, a: ConnectorId, b: ConnectorId) -> Result<(), ConstraintError> {
        let (ra, rb) = (self.same_ele.find(a.index()), self.same_ele.find(b.index()));
        if ra == rb { return Ok(()) }

        if self.strict.get(&ra).is_some_and(|set| set.contains(&rb)) {
            return Err(self.contradiction("same elevation required for a pair with a vertical distance", a, b));
        }
        self.join(ra, rb);
        Ok(())
    }

    fn check_distance(&mut self, kind: ConstraintType, distance: f64, upper: ConnectorId, lower: ConnectorId)
        -> Result<(), ConstraintError>
    {
        if !is_strict(kind, distance) { return Ok(()) }

        let (ru, rl) = (self.same_ele.find(upper.index()), self.same_ele.find(lower.index()));
        if ru == rl {
            return Err(self.contradiction("vertical distance required for a pair with the same elevation", upper, lower));
        }
        self.strict.entry(ru).or_default().insert(rl);
        self.strict.entry(rl).or_default().insert(ru);
        Ok(())
    }

    fn collect_issues(&mut self) {
        self.issues.clear();
        for &triple in &self.smoothness {
            let [c0, c1, c2] = triple;
            let (Some(p0), Some(p1), Some(p2)) = (self.inner.connector(c0), self.inner.connector(c1), self.inner.connector(c2))
            else { continue };
            let (Some(e0), Some(e1), Some(e2)) = (p0.ele(), p1.ele(), p2.ele()) else { continue };

            let (d01, d12, d02) = (distance(p0.pos, p1.pos), distance(p1.pos, p2.pos), distance(p0.pos, p2.pos));
            if d01 == 0.0 || d12 == 0.0 || d02 == 0.0 { continue }

            let incline1 = (e0 - e1) / d01;
            let incline2 = (e1 - e2) / d12;
            let issue = SmoothnessIssue { triple, incline_change: (incline2 - incline1).abs(), distance: d02 };

            if issue.change_per_metre() > self.smoothness_threshold {
                tracing::warn!(
                    connectors = %format!("{c0}, {c1}, {c2}"),
                    incline_change = %format!("{:.1}%", issue.incline_change * 100.0),
                    distance = %format!("{:.1}m", issue.distance),
                    "abrupt incline change"
                );
                self.issues.push(issue);
            }
        }
    }
}

impl<E: ConstraintEnforcer> ConstraintEnforcer for ConstraintValidator<E> {
    fn add_connectors(&mut self, group: Vec<Connector>) -> Result<Vec<ConnectorId>, ConstraintError> {
        if self.inner.is_solved() { return Err(ConstraintError::AlreadySolved) }
        let keys: Vec<Option<JoinKey>> = group.iter().map(Connector::join_key).collect();

        let ids = self.inner.add_connectors(group)?;
        if let Some(last) = ids.last() {
            self.same_ele.grow(last.index() + 1);
        }

        // Connectors standing for the same point are implicitly equal.  New
        // connectors carry no strict relation yet, so these joins never fail.
        for (&id, key) in ids.iter().zip(keys) {
            let Some(key) = key else { continue };
            match self.joins.get(&key).copied() {
                Some(existing) => {
                    let (ra, rb) = (self.same_ele.find(existing.index()), self.same_ele.find(id.index()));
                    self.join(ra, rb);
                }
                None => { self.joins.insert(key, id); }
            }
        }
        Ok(ids)
    }

    fn require_same_ele(&mut self, a: ConnectorId, b: ConnectorId) -> Result<(), ConstraintError> {
        self.check_known(&[a, b])?;
        self.check_same_ele(a, b)?;
        self.inner.require_same_ele(a, b)
    }

    fn require_vertical_distance(
        &mut self,
        kind: ConstraintType,
        distance: f64,
        upper: ConnectorId,
        lower: ConnectorId,
    ) -> Result<(), ConstraintError> {
        self.check_known(&[upper, lower])?;
        self.check_distance(kind, distance, upper, lower)?;
        self.inner.require_vertical_distance(kind, distance, upper, lower)
    }

    fn require_vertical_distance_to_base(
        &mut self,
        kind: ConstraintType,
        distance: f64,
        upper: ConnectorId,
        base1: ConnectorId,
        base2: ConnectorId,
    ) -> Result<(), ConstraintError> {
        self.check_known(&[upper, base1, base2])?;

        // The base is interpolated between its ends, so only a pair of ends
        // both level with `upper` leaves no room for the distance.
        if is_strict(kind, distance)
            && self.same_ele.same(upper.index(), base1.index())
            && self.same_ele.same(upper.index(), base2.index())
        {
            return Err(self.contradiction("vertical distance to a base at the same elevation", upper, base1));
        }
        self.inner.require_vertical_distance_to_base(kind, distance, upper, base1, base2)
    }

    fn require_incline(&mut self, kind: ConstraintType, incline: f64, chain: &[ConnectorId]) -> Result<(), ConstraintError> {
        self.inner.require_incline(kind, incline, chain)
    }

    fn require_smoothness(&mut self, a: ConnectorId, b: ConnectorId, c: ConnectorId) -> Result<(), ConstraintError> {
        self.inner.require_smoothness(a, b, c)?;
        self.smoothness.push([a, b, c]);
        Ok(())
    }

    fn enforce_constraints(&mut self) -> Result<(), ConstraintError> {
        self.inner.enforce_constraints()?;
        self.collect_issues();
        Ok(())
    }

    #[inline] fn connector(&self, id: ConnectorId) -> Option<&Connector> { self.inner.connector(id) }

    #[inline] fn is_solved(&self) -> bool { self.inner.is_solved() }
}

#[cfg(test)]
mod tests {
    use geo::Coord;

    use super::*;
    use crate::ele::{GroundState, NoneEnforcer};

    fn validator() -> ConstraintValidator<NoneEnforcer> {
        ConstraintValidator::new(NoneEnforcer::new(), 200.0)
    }

    fn connector(x: f64, ele: f64, owner: &str) -> Connector {
        Connector::new(Coord { x, y: 0.0 }, GroundState::On).with_initial_ele(ele).with_owner(owner)
    }

    #[test]
    fn distance_after_same_ele_fails() {
        let mut validator = validator();
        let ids = validator.add_connectors(vec![connector(0.0, 0.0, "bridge"), connector(1.0, 0.0, "road")]).unwrap();
        validator.require_same_ele(ids[0], ids[1]).unwrap();

        let error = validator.require_vertical_distance(ConstraintType::Min, 5.0, ids[0], ids[1]).unwrap_err();
        match error {
            ConstraintError::Contradiction { first, second, .. } => {
                assert!(first.contains("bridge"));
                assert!(second.contains("road"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn same_ele_after_distance_fails_transitively() {
        let mut validator = validator();
        let ids = validator.add_connectors(vec![
            connector(0.0, 0.0, "a"),
            connector(1.0, 0.0, "b"),
            connector(2.0, 0.0, "c"),
        ]).unwrap();
        validator.require_vertical_distance(ConstraintType::Exact, -2.0, ids[0], ids[2]).unwrap();
        validator.require_same_ele(ids[0], ids[1]).unwrap();

        assert!(matches!(
            validator.require_same_ele(ids[2], ids[1]),
            Err(ConstraintError::Contradiction { .. })
        ));
    }

    #[test]
    fn strict_relations_follow_merged_classes() {
        let mut validator = validator();
        let ids = validator.add_connectors((0..5).map(|i| connector(i as f64, 0.0, "x")).collect()).unwrap();
        validator.require_vertical_distance(ConstraintType::Min, 1.0, ids[0], ids[1]).unwrap();
        validator.require_same_ele(ids[2], ids[1]).unwrap();
        validator.require_same_ele(ids[3], ids[0]).unwrap();
        validator.require_same_ele(ids[4], ids[3]).unwrap();

        // Both sides of the relation have been absorbed into larger classes.
        assert!(matches!(validator.require_same_ele(ids[4], ids[2]), Err(ConstraintError::Contradiction { .. })));
        validator.require_vertical_distance(ConstraintType::Exact, 0.0, ids[4], ids[2]).unwrap();
    }

    #[test]
    fn base_distance_fails_only_when_both_ends_are_level() {
        let mut validator = validator();
        let ids = validator.add_connectors(vec![
            connector(9.0, 0.0, "upper"),
            connector(0.0, 0.0, "b1"),
            connector(10.0, 0.0, "b2"),
        ]).unwrap();
        validator.require_same_ele(ids[0], ids[1]).unwrap();
        validator.require_vertical_distance_to_base(ConstraintType::Exact, 2.0, ids[0], ids[1], ids[2]).unwrap();

        // Nothing is recorded against the base ends.
        validator.require_same_ele(ids[0], ids[2]).unwrap();
        assert!(matches!(
            validator.require_vertical_distance_to_base(ConstraintType::Min, 2.0, ids[0], ids[1], ids[2]),
            Err(ConstraintError::Contradiction { .. })
        ));
    }

    #[test]
    fn adding_to_a_solved_enforcer_leaves_state_alone() {
        let mut validator = validator();
        validator.add_connectors(vec![connector(0.0, 0.0, "a")]).unwrap();
        validator.enforce_constraints().unwrap();

        let result = validator.add_connectors(vec![connector(1.0, 0.0, "b")]);
        assert_eq!(result, Err(ConstraintError::AlreadySolved));
        assert!(validator.connector(ConnectorId(1)).is_none());
    }

    #[test]
    fn non_strict_distances_are_compatible() {
        let mut validator = validator();
        let ids = validator.add_connectors(vec![connector(0.0, 0.0, "a"), connector(1.0, 0.0, "b")]).unwrap();
        validator.require_same_ele(ids[0], ids[1]).unwrap();

        // At most 5 above, or at least 5 below, allows equal elevations.
        validator.require_vertical_distance(ConstraintType::Max, 5.0, ids[0], ids[1]).unwrap();
        validator.require_vertical_distance(ConstraintType::Min, -5.0, ids[0], ids[1]).unwrap();
        validator.require_vertical_distance(ConstraintType::Exact, 0.0, ids[0], ids[1]).unwrap();
    }

    #[test]
    fn reports_abrupt_incline_changes() {
        let mut validator = validator();
        let ids = validator.add_connectors(vec![
            connector(0.0, 0.0, "a"),
            connector(0.001, 1.0, "b"),
            connector(0.002, 0.0, "c"),
            connector(10.0, 0.0, "d"),
            connector(20.0, 1.0, "e"),
        ]).unwrap();
        validator.require_smoothness(ids[0], ids[1], ids[2]).unwrap();
        validator.require_smoothness(ids[2], ids[3], ids[4]).unwrap();
        validator.enforce_constraints().unwrap();

        let issues = validator.smoothness_issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].triple, [ids[0], ids[1], ids[2]]);
    }

    #[test]
    fn errors_pass_through_from_the_inner_enforcer() {
        let mut validator = validator();
        let ids = validator.add_connectors(vec![connector(0.0, 0.0, "a")]).unwrap();
        validator.enforce_constraints().unwrap();

        assert_eq!(validator.require_same_ele(ids[0], ids[0]), Err(ConstraintError::AlreadySolved));
        assert_eq!(validator.enforce_constraints(), Err(ConstraintError::AlreadySolved));
    }
}
