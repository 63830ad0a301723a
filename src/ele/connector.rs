use std::fmt;
use std::sync::Arc;

use geo::Coord;
use planegeom::coord::coord_key;

use crate::model::ElementId;

use super::ConstraintError;

/// Handle of a registered connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectorId(pub u32);

impl fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl ConnectorId {
    #[inline] pub(crate) fn index(self) -> usize { self.0 as usize }
}

/// Where a connector sits relative to the terrain surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroundState {
    Above,
    On,
    Below,
}

/// A point whose elevation the enforcer decides.
#[derive(Debug, Clone)]
pub struct Connector {
    pub pos: Coord<f64>,
    /// Model element the connector belongs to, used to join connectors of
    /// different owners at the same element.
    pub reference: Option<ElementId>,
    pub ground_state: GroundState,
    /// Starting guess for the solver.
    pub initial_ele: f64,
    /// Human readable owner, for diagnostics.
    pub owner: Option<Arc<str>>,
    ele: Option<f64>,
}

impl Connector {
    pub fn new(pos: Coord<f64>, ground_state: GroundState) -> Self {
        Self { pos, reference: None, ground_state, initial_ele: 0.0, owner: None, ele: None }
    }

    pub fn with_reference(mut self, reference: impl Into<ElementId>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_initial_ele(mut self, ele: f64) -> Self {
        self.initial_ele = ele;
        self
    }

    pub fn with_owner(mut self, owner: impl Into<Arc<str>>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Elevation assigned by the solver, `None` before solving.
    #[inline] pub fn ele(&self) -> Option<f64> { self.ele }

    /// Whether two connectors stand for the same physical point: same
    /// position, same ground state, and the same (known) model element.
    pub fn connects_to(&self, other: &Connector) -> bool {
        self.pos == other.pos
            && self.ground_state == other.ground_state
            && self.reference.is_some()
            && self.reference == other.reference
    }

    /// Key under which [`connects_to`](Self::connects_to) holds, if any.
    pub(crate) fn join_key(&self) -> Option<JoinKey> {
        self.reference.map(|reference| JoinKey { pos: coord_key(self.pos), ground_state: self.ground_state, reference })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct JoinKey {
    pos: (u64, u64),
    ground_state: GroundState,
    reference: ElementId,
}

// -----------------------------------------------------------------------------
// Connector arena
// -----------------------------------------------------------------------------

/// Connector storage shared by the enforcers, open for declarations until
/// solved.
#[derive(Debug, Clone, Default)]
pub(crate) struct ConnectorSet {
    connectors: Vec<Connector>,
    solved: bool,
}

impl ConnectorSet {
    #[inline] pub(crate) fn len(&self) -> usize { self.connectors.len() }

    #[inline] pub(crate) fn is_solved(&self) -> bool { self.solved }

    #[inline] pub(crate) fn get(&self, id: ConnectorId) -> Option<&Connector> { self.connectors.get(id.index()) }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (ConnectorId, &Connector)> {
        self.connectors.iter().enumerate().map(|(i, c)| (ConnectorId(i as u32), c))
    }

    pub(crate) fn ensure_open(&self) -> Result<(), ConstraintError> {
        if self.solved { Err(ConstraintError::AlreadySolved) } else { Ok(()) }
    }

    /// Fails unless declarations are still accepted and every id is known.
    pub(crate) fn check(&self, ids: &[ConnectorId]) -> Result<(), ConstraintError> {
        self.ensure_open()?;
        match ids.iter().find(|id| id.index() >= self.connectors.len()) {
            Some(&id) => Err(ConstraintError::UnknownConnector(id)),
            None => Ok(()),
        }
    }

    pub(crate) fn add(&mut self, group: Vec<Connector>) -> Result<Vec<ConnectorId>, ConstraintError> {
        self.ensure_open()?;
        let start = self.connectors.len();
        self.connectors.extend(group);
        Ok((start..self.connectors.len()).map(|i| ConnectorId(i as u32)).collect())
    }

    pub(crate) fn position(&self, id: ConnectorId) -> Coord<f64> {
        self.connectors[id.index()].pos
    }

    /// Store the solution and close the set.
    pub(crate) fn solve_with(&mut self, mut ele: impl FnMut(ConnectorId, &Connector) -> f64) {
        for (i, connector) in self.connectors.iter_mut().enumerate() {
            connector.ele = Some(ele(ConnectorId(i as u32), connector));
        }
        self.solved = true;
    }
}
