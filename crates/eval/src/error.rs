//! Engine-level error type.
//!
//! Wraps the data-model errors from `mirath-core` and adds the one failure
//! only the engine can detect: final fractions that do not sum to one.

use mirath_core::{ArithmeticError, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalculationError {
    /// Rejected input; always raised before any share is computed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Malformed fraction construction or division.
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),

    /// The engine produced an inconsistent distribution. Indicates a defect
    /// in the rule tables or resolvers, never a user error.
    #[error("internal invariant violated: {message}")]
    InternalInvariantViolation { message: String },
}

impl CalculationError {
    pub fn invariant(message: impl Into<String>) -> Self {
        CalculationError::InternalInvariantViolation {
            message: message.into(),
        }
    }

    /// Stable machine-readable code carried into `CalculationResult.error`.
    pub fn code(&self) -> &'static str {
        match self {
            CalculationError::Validation(e) => e.code(),
            CalculationError::Arithmetic(e) => e.code(),
            CalculationError::InternalInvariantViolation { .. } => "INTERNAL_INVARIANT_VIOLATION",
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, CalculationError::Validation(_))
    }
}
