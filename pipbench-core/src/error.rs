//! Error taxonomy for the simulation core.
//!
//! Every boundary call in the core validates its inputs and fails with one of
//! three kinds:
//! - `Validation`: a malformed or missing argument (account, position id,
//!   order list, symbol set, graph, hold duration).
//! - `State`: an illegal state transition (closing a position that is not
//!   open, closing with a non-terminal status).
//! - `Data`: market data that cannot support the request (empty arrays,
//!   fewer frames than the hold duration, timestamps out of order).

use thiserror::Error;

/// Errors raised by the simulation core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("state error: {0}")]
    State(String),

    #[error("data error: {0}")]
    Data(String),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_state(&self) -> bool {
        matches!(self, Self::State(_))
    }

    pub fn is_data(&self) -> bool {
        matches!(self, Self::Data(_))
    }
}

/// Shorthand result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_distinguishable() {
        assert!(CoreError::validation("x").is_validation());
        assert!(CoreError::state("x").is_state());
        assert!(CoreError::data("x").is_data());
        assert!(!CoreError::data("x").is_state());
    }

    #[test]
    fn display_names_the_kind() {
        let err = CoreError::state("position 7 is not open");
        assert_eq!(err.to_string(), "state error: position 7 is not open");
    }
}
