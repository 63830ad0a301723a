use planegeom::GeometryError;
use thiserror::Error;

use crate::model::AreaSource;

/// Per-entity failures during conversion.  The converter logs these, skips
/// the entity and carries on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("invalid outer ring for {entity}: {error}")]
    InvalidOuterRing { entity: AreaSource, error: GeometryError },

    #[error("invalid hole ring for {entity}: {error}")]
    InvalidHole { entity: AreaSource, error: GeometryError },
}

impl BuildError {
    /// The entity the failed area was built from.
    pub fn entity(&self) -> AreaSource {
        match self {
            BuildError::InvalidOuterRing { entity, .. }
            | BuildError::InvalidHole { entity, .. } => *entity,
        }
    }
}
