use super::{Connector, ConnectorId, ConnectorSet, ConstraintEnforcer, ConstraintError, ConstraintType};

/// Accepts every declaration and ignores it: each connector simply keeps its
/// initial elevation.  Meant for quick previews.
#[derive(Debug, Clone, Default)]
pub struct NoneEnforcer {
    connectors: ConnectorSet,
}

impl NoneEnforcer {
    pub fn new() -> Self { Self::default() }
}

impl ConstraintEnforcer for NoneEnforcer {
    fn add_connectors(&mut self, group: Vec<Connector>) -> Result<Vec<ConnectorId>, ConstraintError> {
        self.connectors.add(group)
    }

    fn require_same_ele(&mut self, a: ConnectorId, b: ConnectorId) -> Result<(), ConstraintError> {
        self.connectors.check(&[a, b])
    }

    fn require_vertical_distance(
        &mut self,
        _kind: ConstraintType,
        _distance: f64,
        upper: ConnectorId,
        lower: ConnectorId,
    ) -> Result<(), ConstraintError> {
        self.connectors.check(&[upper, lower])
    }

    fn require_vertical_distance_to_base(
        &mut self,
        _kind: ConstraintType,
        _distance: f64,
        upper: ConnectorId,
        base1: ConnectorId,
        base2: ConnectorId,
    ) -> Result<(), ConstraintError> {
        self.connectors.check(&[upper, base1, base2])
    }

    fn require_incline(&mut self, _kind: ConstraintType, _incline: f64, chain: &[ConnectorId]) -> Result<(), ConstraintError> {
        self.connectors.check(chain)
    }

    fn require_smoothness(&mut self, a: ConnectorId, b: ConnectorId, c: ConnectorId) -> Result<(), ConstraintError> {
        self.connectors.check(&[a, b, c])
    }

    fn enforce_constraints(&mut self) -> Result<(), ConstraintError> {
        self.connectors.ensure_open()?;
        self.connectors.solve_with(|_, connector| connector.initial_ele);
        Ok(())
    }

    #[inline] fn connector(&self, id: ConnectorId) -> Option<&Connector> { self.connectors.get(id) }

    #[inline] fn is_solved(&self) -> bool { self.connectors.is_solved() }
}
