//! Error types for u-cutlist.

use crate::exact::SolveStatus;
use thiserror::Error;

/// Result type alias for u-cutlist operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, solving or interpreting a nesting run.
#[derive(Debug, Error)]
pub enum Error {
    /// Inventory failed validation (non-positive length, duplicate or colliding id).
    #[error("Invalid inventory: {0}")]
    InvalidInventory(String),

    /// The solver back-end did not return a usable solution.
    #[error("No solution found (status: {status}): {message}")]
    NoSolutionFound {
        /// Terminal status reported by the solver.
        status: SolveStatus,
        /// Solver-specific message.
        message: String,
    },

    /// A solver assignment broke a nesting invariant.
    #[error("Inconsistent solution: {0}")]
    InconsistentSolution(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns true if this error is a terminal solver outcome rather than bad input.
    pub fn is_no_solution(&self) -> bool {
        matches!(self, Self::NoSolutionFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInventory("part 'p1' has non-positive length 0".into());
        assert_eq!(
            err.to_string(),
            "Invalid inventory: part 'p1' has non-positive length 0"
        );

        let err = Error::NoSolutionFound {
            status: SolveStatus::Infeasible,
            message: "Problem is infeasible".into(),
        };
        assert_eq!(
            err.to_string(),
            "No solution found (status: Infeasible): Problem is infeasible"
        );
    }

    #[test]
    fn test_is_no_solution() {
        let err = Error::NoSolutionFound {
            status: SolveStatus::Error,
            message: String::new(),
        };
        assert!(err.is_no_solution());
        assert!(!Error::InvalidInventory(String::new()).is_no_solution());
    }
}
