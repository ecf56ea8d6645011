use thiserror::Error;

/// Errors surfaced by the simulation core.
///
/// Degenerate geometry never appears here; the update rule and the boundary
/// constraint resolve it with fallback directions.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FlockError {
    /// A parameter is out of range, non-finite, or disagrees with the population.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// The update for one agent produced a non-finite record; the tick was not committed.
    #[error("agent {index} produced a non-finite state")]
    NonFiniteState { index: usize },
}

impl FlockError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        FlockError::InvalidConfiguration(message.into())
    }
}
