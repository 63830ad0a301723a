//! Elevation constraints.
//!
//! World objects register [`Connector`]s (points that need an elevation) and
//! declare how their elevations relate: equal, a vertical distance apart, a
//! given incline along a chain, or smooth through a triple.  A single call to
//! [`ConstraintEnforcer::enforce_constraints`] then assigns every connector a
//! concrete elevation.  Declaring anything after that is an error.
//!
//! [`ConstraintValidator`] wraps any enforcer and rejects contradictory
//! declarations the moment they are made.

mod connector;
mod none;
mod relax;
mod validator;

use std::fmt;

use thiserror::Error;

pub use connector::{Connector, ConnectorId, GroundState};
pub use none::NoneEnforcer;
pub use relax::{RelaxationEnforcer, SolveReport};
pub use validator::{ConstraintValidator, SmoothnessIssue};

pub(crate) use connector::ConnectorSet;

/// Direction of an inequality constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintType {
    /// At least the given value.
    Min,
    /// At most the given value.
    Max,
    /// Exactly the given value.
    Exact,
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConstraintType::Min => "min",
            ConstraintType::Max => "max",
            ConstraintType::Exact => "exact",
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstraintError {
    #[error("invalid constraint: {reason}; participating connectors: {first}, {second}")]
    Contradiction { reason: &'static str, first: String, second: String },

    #[error("unknown connector {0}")]
    UnknownConnector(ConnectorId),

    #[error("constraints were already enforced")]
    AlreadySolved,
}

/// Solver over connector elevations.
///
/// Declarations may come in any order.  `enforce_constraints` is terminal:
/// afterwards connectors expose their elevations and every further call fails
/// with [`ConstraintError::AlreadySolved`].
pub trait ConstraintEnforcer {
    /// Register a group of connectors, returning their handles in order.
    fn add_connectors(&mut self, group: Vec<Connector>) -> Result<Vec<ConnectorId>, ConstraintError>;

    fn require_same_ele(&mut self, a: ConnectorId, b: ConnectorId) -> Result<(), ConstraintError>;

    /// All connectors of `set` share one elevation.
    fn require_same_ele_all(&mut self, set: &[ConnectorId]) -> Result<(), ConstraintError> {
        for pair in set.windows(2) {
            self.require_same_ele(pair[0], pair[1])?;
        }
        Ok(())
    }

    /// `ele(upper) - ele(lower)` compared to `distance` according to `kind`.
    fn require_vertical_distance(
        &mut self,
        kind: ConstraintType,
        distance: f64,
        upper: ConnectorId,
        lower: ConnectorId,
    ) -> Result<(), ConstraintError>;

    /// Like [`require_vertical_distance`](Self::require_vertical_distance),
    /// against the base line from `base1` to `base2` interpolated below
    /// `upper`.
    fn require_vertical_distance_to_base(
        &mut self,
        kind: ConstraintType,
        distance: f64,
        upper: ConnectorId,
        base1: ConnectorId,
        base2: ConnectorId,
    ) -> Result<(), ConstraintError>;

    /// Incline (rise over horizontal run) between consecutive connectors of
    /// `chain`.
    fn require_incline(&mut self, kind: ConstraintType, incline: f64, chain: &[ConnectorId]) -> Result<(), ConstraintError>;

    /// Prefer no sudden change of incline at `b` on the path `a → b → c`.
    fn require_smoothness(&mut self, a: ConnectorId, b: ConnectorId, c: ConnectorId) -> Result<(), ConstraintError>;

    fn enforce_constraints(&mut self) -> Result<(), ConstraintError>;

    fn connector(&self, id: ConnectorId) -> Option<&Connector>;

    fn is_solved(&self) -> bool;

    /// Solved elevation of a connector.
    fn ele(&self, id: ConnectorId) -> Option<f64> {
        self.connector(id).and_then(Connector::ele)
    }
}

/// Disjoint sets over connector indices.
#[derive(Debug, Clone, Default)]
pub(crate) struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    /// Make sure indices up to `len - 1` exist, each in its own set.
    pub(crate) fn grow(&mut self, len: usize) {
        while self.parent.len() < len {
            self.parent.push(self.parent.len());
            self.rank.push(0);
        }
    }

    pub(crate) fn find(&mut self, mut x: usize) -> usize {
        self.grow(x + 1);
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    pub(crate) fn union(&mut self, a: usize, b: usize) -> usize {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb { return ra }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => { self.parent[ra] = rb; rb }
            std::cmp::Ordering::Greater => { self.parent[rb] = ra; ra }
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
                ra
            }
        }
    }

    #[inline]
    pub(crate) fn same(&mut self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }
}
