//! Error types for the dice engine.

/// Errors that can occur while parsing or building dice pools.
#[derive(Debug, thiserror::Error)]
pub enum DiceError {
    /// Pool notation could not be parsed as `XkY`.
    #[error("invalid pool notation '{0}', expected XkY (e.g. 7k3)")]
    InvalidNotation(String),

    /// A pool must roll and keep at least one die.
    #[error("pool {0} must roll and keep at least one die")]
    EmptyPool(String),
}

/// Convenience result type for dice operations.
pub type DiceResult<T> = Result<T, DiceError>;
