use thiserror::Error;

/// Reasons a vertex sequence cannot become a ring.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("vertex loop is not closed (first vertex must be repeated as last)")]
    NotClosed,
    #[error("need at least {required} vertices, got {actual}")]
    TooFewVertices { required: usize, actual: usize },
    #[error("ring is self-intersecting")]
    SelfIntersecting,
}
