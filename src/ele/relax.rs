//! Iterative elevation solver.
//!
//! Connectors joined by same-elevation constraints collapse into one variable.
//! Smoothness triples shape the starting guess, then every linear constraint
//! is projected in turn (Kaczmarz sweeps) until none is violated by more than
//! the configured tolerance.

use ahash::AHashMap;
use planegeom::coord::{distance, dot, norm};
use smallvec::SmallVec;

use crate::config::SolverConfig;

use super::connector::JoinKey;
use super::{
    ConnectorSet, Connector, ConnectorId, ConstraintEnforcer, ConstraintError, ConstraintType, UnionFind,
};

/// How the last solve went.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
    /// Projection sweeps performed.
    pub sweeps: usize,
    /// Largest remaining violation of any hard constraint (metres).
    pub max_violation: f64,
    pub converged: bool,
}

#[derive(Debug, Clone)]
enum Declared {
    Distance { kind: ConstraintType, distance: f64, upper: ConnectorId, lower: ConnectorId },
    DistanceToBase { kind: ConstraintType, distance: f64, upper: ConnectorId, base1: ConnectorId, base2: ConnectorId },
    Incline { kind: ConstraintType, incline: f64, lower: ConnectorId, upper: ConnectorId },
}

/// `Σ coefficient · ele(var)` compared to `rhs`.
#[derive(Debug, Clone)]
struct Linear {
    terms: SmallVec<[(usize, f64); 3]>,
    kind: ConstraintType,
    rhs: f64,
}

impl Linear {
    fn new(kind: ConstraintType, rhs: f64, raw: impl IntoIterator<Item = (usize, f64)>) -> Self {
        let mut terms: SmallVec<[(usize, f64); 3]> = SmallVec::new();
        for (var, coefficient) in raw {
            match terms.iter_mut().find(|(v, _)| *v == var) {
                Some((_, c)) => *c += coefficient,
                None => terms.push((var, coefficient)),
            }
        }
        terms.retain(|(_, c)| *c != 0.0);
        Self { terms, kind, rhs }
    }

    #[inline]
    fn residual(&self, values: &[f64]) -> f64 {
        self.terms.iter().map(|&(var, c)| c * values[var]).sum::<f64>() - self.rhs
    }

    fn violation(&self, values: &[f64]) -> f64 {
        let r = self.residual(values);
        match self.kind {
            ConstraintType::Min => (-r).max(0.0),
            ConstraintType::Max => r.max(0.0),
            ConstraintType::Exact => r.abs(),
        }
    }

    /// Move `values` onto the constraint's boundary if it is violated.
    fn project(&self, values: &mut [f64]) {
        if self.violation(values) == 0.0 { return }
        let norm2: f64 = self.terms.iter().map(|(_, c)| c * c).sum();
        if norm2 == 0.0 { return }

        let step = self.residual(values) / norm2;
        for &(var, c) in &self.terms {
            values[var] -= c * step;
        }
    }
}

/// Enforcer that solves all constraints at once by iterative projection.
#[derive(Debug, Clone, Default)]
pub struct RelaxationEnforcer {
    connectors: ConnectorSet,
    classes: UnionFind,
    joins: AHashMap<JoinKey, ConnectorId>,
    declared: Vec<Declared>,
    smoothness: Vec<[ConnectorId; 3]>,
    config: SolverConfig,
    report: Option<SolveReport>,
}

impl RelaxationEnforcer {
    pub fn new(config: SolverConfig) -> Self {
        Self { config, ..Default::default() }
    }

    /// Outcome of [`enforce_constraints`](ConstraintEnforcer::enforce_constraints),
    /// once it ran.
    #[inline] pub fn report(&self) -> Option<SolveReport> { self.report }

    /// One variable per same-elevation class, numbered in connector order.
    fn variables(&mut self) -> (Vec<usize>, usize) {
        let mut var_of_root: AHashMap<usize, usize> = AHashMap::new();
        let mut var_of = Vec::with_capacity(self.connectors.len());
        for i in 0..self.connectors.len() {
            let root = self.classes.find(i);
            let next = var_of_root.len();
            var_of.push(*var_of_root.entry(root).or_insert(next));
        }
        (var_of, var_of_root.len())
    }

    fn linearize(&self, var_of: &[usize]) -> Vec<Linear> {
        let var = |id: ConnectorId| var_of[id.index()];
        let pos = |id: ConnectorId| self.connectors.position(id);

        self.declared.iter().filter_map(|declared| match *declared {
            Declared::Distance { kind, distance, upper, lower } => {
                Some(Linear::new(kind, distance, [(var(upper), 1.0), (var(lower), -1.0)]))
            }
            Declared::DistanceToBase { kind, distance, upper, base1, base2 } => {
                let t = base_fraction(pos(upper), pos(base1), pos(base2));
                Some(Linear::new(kind, distance, [(var(upper), 1.0), (var(base1), t - 1.0), (var(base2), -t)]))
            }
            Declared::Incline { kind, incline, lower, upper } => {
                let run = distance(pos(lower), pos(upper));
                (run > 0.0).then(|| Linear::new(kind, incline * run, [(var(upper), 1.0), (var(lower), -1.0)]))
            }
        }).collect()
    }

    /// Pull the middle of every smoothness triple onto the straight line
    /// between its neighbours until nothing moves.
    fn smooth(&self, var_of: &[usize], values: &mut [f64]) {
        let triples: Vec<(usize, usize, usize, f64)> = self.smoothness.iter().filter_map(|&[a, b, c]| {
            let (va, vb, vc) = (var_of[a.index()], var_of[b.index()], var_of[c.index()]);
            if vb == va || vb == vc { return None }
            let ab = distance(self.connectors.position(a), self.connectors.position(b));
            let bc = distance(self.connectors.position(b), self.connectors.position(c));
            (ab + bc > 0.0).then(|| (va, vb, vc, ab / (ab + bc)))
        }).collect();

        for _ in 0..self.config.max_iterations {
            let mut moved = 0.0_f64;
            for &(va, vb, vc, t) in &triples {
                let target = values[va] + t * (values[vc] - values[va]);
                moved = moved.max((target - values[vb]).abs());
                values[vb] = target;
            }
            if moved <= self.config.tolerance { break }
        }
    }

    fn solve(&mut self) -> SolveReport {
        let (var_of, num_vars) = self.variables();

        let mut sums = vec![(0.0, 0usize); num_vars];
        for (id, connector) in self.connectors.iter() {
            let entry = &mut sums[var_of[id.index()]];
            entry.0 += connector.initial_ele;
            entry.1 += 1;
        }
        let mut values: Vec<f64> = sums.into_iter().map(|(sum, n)| sum / n as f64).collect();

        self.smooth(&var_of, &mut values);

        let constraints = self.linearize(&var_of);
        let max_violation = |values: &[f64]| constraints.iter().map(|c| c.violation(values)).fold(0.0, f64::max);

        let mut report = SolveReport { sweeps: 0, max_violation: max_violation(&values), converged: false };
        while report.max_violation > self.config.tolerance && report.sweeps < self.config.max_iterations {
            for constraint in &constraints {
                constraint.project(&mut values);
            }
            report.sweeps += 1;
            report.max_violation = max_violation(&values);
        }
        report.converged = report.max_violation <= self.config.tolerance;

        self.connectors.solve_with(|id, _| values[var_of[id.index()]]);
        report
    }
}

/// Position of `p` projected onto the line `b1 → b2`, as a fraction clamped
/// to the segment.
fn base_fraction(p: geo::Coord<f64>, b1: geo::Coord<f64>, b2: geo::Coord<f64>) -> f64 {
    let along = b2 - b1;
    let len = norm(along);
    if len == 0.0 { return 0.0 }
    (dot(p - b1, along) / (len * len)).clamp(0.0, 1.0)
}

impl ConstraintEnforcer for RelaxationEnforcer {
    fn add_connectors(&mut self, group: Vec<Connector>) -> Result<Vec<ConnectorId>, ConstraintError> {
        let ids = self.connectors.add(group)?;
        self.classes.grow(self.connectors.len());

        for &id in &ids {
            let Some(key) = self.connectors.get(id).and_then(Connector::join_key) else { continue };
            match self.joins.get(&key).copied() {
                Some(existing) => { self.classes.union(existing.index(), id.index()); }
                None => { self.joins.insert(key, id); }
            }
        }
        Ok(ids)
    }

    fn require_same_ele(&mut self, a: ConnectorId, b: ConnectorId) -> Result<(), ConstraintError> {
        self.connectors.check(&[a, b])?;
        self.classes.union(a.index(), b.index());
        Ok(())
    }

    fn require_vertical_distance(
        &mut self,
        kind: ConstraintType,
        distance: f64,
        upper: ConnectorId,
        lower: ConnectorId,
    ) -> Result<(), ConstraintError> {
        self.connectors.check(&[upper, lower])?;
        self.declared.push(Declared::Distance { kind, distance, upper, lower });
        Ok(())
    }

    fn require_vertical_distance_to_base(
        &mut self,
        kind: ConstraintType,
        distance: f64,
        upper: ConnectorId,
        base1: ConnectorId,
        base2: ConnectorId,
    ) -> Result<(), ConstraintError> {
        self.connectors.check(&[upper, base1, base2])?;
        self.declared.push(Declared::DistanceToBase { kind, distance, upper, base1, base2 });
        Ok(())
    }

    fn require_incline(&mut self, kind: ConstraintType, incline: f64, chain: &[ConnectorId]) -> Result<(), ConstraintError> {
        self.connectors.check(chain)?;
        self.declared.extend(chain.windows(2).map(|pair| Declared::Incline { kind, incline, lower: pair[0], upper: pair[1] }));
        Ok(())
    }

    fn require_smoothness(&mut self, a: ConnectorId, b: ConnectorId, c: ConnectorId) -> Result<(), ConstraintError> {
        self.connectors.check(&[a, b, c])?;
        self.smoothness.push([a, b, c]);
        Ok(())
    }

    fn enforce_constraints(&mut self) -> Result<(), ConstraintError> {
        self.connectors.ensure_open()?;

        let report = self.solve();
        if report.converged {
            tracing::info!(
                connectors = self.connectors.len(),
                constraints = self.declared.len(),
                sweeps = report.sweeps,
                "elevation constraints solved"
            );
        } else {
            tracing::warn!(
                sweeps = report.sweeps,
                max_violation = report.max_violation,
                "elevation solver stopped before satisfying every constraint"
            );
        }
        self.report = Some(report);
        Ok(())
    }

    #[inline] fn connector(&self, id: ConnectorId) -> Option<&Connector> { self.connectors.get(id) }

    #[inline] fn is_solved(&self) -> bool { self.connectors.is_solved() }
}

#[cfg(test)]
mod tests {
    use geo::Coord;

    use super::*;
    use crate::ele::GroundState;
    use crate::model::NodeId;

    fn at(x: f64, ele: f64) -> Connector {
        Connector::new(Coord { x, y: 0.0 }, GroundState::On).with_initial_ele(ele)
    }

    fn ele(enforcer: &RelaxationEnforcer, id: ConnectorId) -> f64 {
        enforcer.ele(id).unwrap()
    }

    #[test]
    fn same_ele_class_starts_from_mean() {
        let mut enforcer = RelaxationEnforcer::default();
        let ids = enforcer.add_connectors(vec![at(0.0, 0.0), at(5.0, 10.0)]).unwrap();
        enforcer.require_same_ele(ids[0], ids[1]).unwrap();
        enforcer.enforce_constraints().unwrap();

        assert_eq!(ele(&enforcer, ids[0]), 5.0);
        assert_eq!(ele(&enforcer, ids[1]), 5.0);
    }

    #[test]
    fn minimum_vertical_distance_is_met() {
        let mut enforcer = RelaxationEnforcer::default();
        let ids = enforcer.add_connectors(vec![at(0.0, 0.0), at(0.0, 0.0)]).unwrap();
        enforcer.require_vertical_distance(ConstraintType::Min, 5.0, ids[0], ids[1]).unwrap();
        enforcer.enforce_constraints().unwrap();

        let gap = ele(&enforcer, ids[0]) - ele(&enforcer, ids[1]);
        assert!((gap - 5.0).abs() < 1e-6, "gap {gap}");
        assert!(enforcer.report().unwrap().converged);
    }

    #[test]
    fn satisfied_maximum_leaves_hints_alone() {
        let mut enforcer = RelaxationEnforcer::default();
        let ids = enforcer.add_connectors(vec![at(0.0, 3.0), at(0.0, 1.0)]).unwrap();
        enforcer.require_vertical_distance(ConstraintType::Max, 4.0, ids[0], ids[1]).unwrap();
        enforcer.enforce_constraints().unwrap();

        assert_eq!(ele(&enforcer, ids[0]), 3.0);
        assert_eq!(ele(&enforcer, ids[1]), 1.0);
        assert_eq!(enforcer.report().unwrap().sweeps, 0);
    }

    #[test]
    fn exact_incline_along_chain() {
        let mut enforcer = RelaxationEnforcer::default();
        let ids = enforcer.add_connectors(vec![at(0.0, 0.0), at(10.0, 0.0), at(20.0, 0.0)]).unwrap();
        enforcer.require_incline(ConstraintType::Exact, 0.1, &ids).unwrap();
        enforcer.enforce_constraints().unwrap();

        assert!((ele(&enforcer, ids[1]) - ele(&enforcer, ids[0]) - 1.0).abs() < 1e-6);
        assert!((ele(&enforcer, ids[2]) - ele(&enforcer, ids[1]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn distance_to_interpolated_base() {
        let mut enforcer = RelaxationEnforcer::default();
        let ids = enforcer.add_connectors(vec![at(2.5, 0.0), at(0.0, 0.0), at(10.0, 8.0)]).unwrap();
        enforcer.require_vertical_distance_to_base(ConstraintType::Exact, 3.0, ids[0], ids[1], ids[2]).unwrap();
        enforcer.enforce_constraints().unwrap();

        let base = 0.75 * ele(&enforcer, ids[1]) + 0.25 * ele(&enforcer, ids[2]);
        assert!((ele(&enforcer, ids[0]) - base - 3.0).abs() < 1e-6);
    }

    #[test]
    fn smoothness_straightens_the_middle() {
        let mut enforcer = RelaxationEnforcer::default();
        let ids = enforcer.add_connectors(vec![at(0.0, 0.0), at(10.0, 50.0), at(20.0, 10.0)]).unwrap();
        enforcer.require_smoothness(ids[0], ids[1], ids[2]).unwrap();
        enforcer.enforce_constraints().unwrap();

        assert_eq!(ele(&enforcer, ids[0]), 0.0);
        assert_eq!(ele(&enforcer, ids[1]), 5.0);
        assert_eq!(ele(&enforcer, ids[2]), 10.0);
    }

    #[test]
    fn connectors_at_the_same_element_are_merged() {
        let mut enforcer = RelaxationEnforcer::default();
        let a = enforcer.add_connectors(vec![at(1.0, 2.0).with_reference(NodeId(7))]).unwrap();
        let b = enforcer.add_connectors(vec![at(1.0, 4.0).with_reference(NodeId(7))]).unwrap();
        let c = enforcer.add_connectors(vec![at(1.0, 9.0)]).unwrap();
        enforcer.enforce_constraints().unwrap();

        assert_eq!(ele(&enforcer, a[0]), 3.0);
        assert_eq!(ele(&enforcer, b[0]), 3.0);
        assert_eq!(ele(&enforcer, c[0]), 9.0);
    }

    #[test]
    fn unsatisfiable_constraint_is_reported() {
        let config = SolverConfig { max_iterations: 10, ..Default::default() };
        let mut enforcer = RelaxationEnforcer::new(config);
        let ids = enforcer.add_connectors(vec![at(0.0, 0.0), at(1.0, 0.0)]).unwrap();
        enforcer.require_same_ele(ids[0], ids[1]).unwrap();
        enforcer.require_vertical_distance(ConstraintType::Exact, 5.0, ids[0], ids[1]).unwrap();
        enforcer.enforce_constraints().unwrap();

        let report = enforcer.report().unwrap();
        assert!(!report.converged);
        assert_eq!(report.sweeps, 10);
        assert!(enforcer.is_solved());
    }

    #[test]
    fn declarations_after_solving_fail() {
        let mut enforcer = RelaxationEnforcer::default();
        let ids = enforcer.add_connectors(vec![at(0.0, 0.0), at(1.0, 0.0)]).unwrap();
        enforcer.enforce_constraints().unwrap();

        assert_eq!(enforcer.require_same_ele(ids[0], ids[1]), Err(ConstraintError::AlreadySolved));
        assert_eq!(enforcer.enforce_constraints(), Err(ConstraintError::AlreadySolved));
        assert_eq!(enforcer.add_connectors(vec![at(2.0, 0.0)]), Err(ConstraintError::AlreadySolved));
    }

    #[test]
    fn unknown_connectors_are_rejected() {
        let mut enforcer = RelaxationEnforcer::default();
        let ids = enforcer.add_connectors(vec![at(0.0, 0.0)]).unwrap();
        assert_eq!(
            enforcer.require_smoothness(ids[0], ConnectorId(4), ids[0]),
            Err(ConstraintError::UnknownConnector(ConnectorId(4)))
        );
    }
}
