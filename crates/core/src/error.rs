//! Error taxonomy shared by the data model and the engine.
//!
//! Input problems are [`ValidationError`]s and are always detected before
//! any share is computed. [`ArithmeticError`] is raised only by malformed
//! fraction construction or division.

use rust_decimal::Decimal;

use crate::heir::HeirType;

/// Failures of exact fraction arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ArithmeticError {
    /// A fraction was built with a zero denominator, or divided by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// A reduced numerator or denominator no longer fits in 64 bits.
    #[error("arithmetic overflow during {operation}")]
    Overflow { operation: &'static str },
}

impl ArithmeticError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ArithmeticError::DivisionByZero => "DIVISION_BY_ZERO",
            ArithmeticError::Overflow { .. } => "ARITHMETIC_OVERFLOW",
        }
    }
}

/// Rejections raised at the input boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The gross estate is zero or negative.
    #[error("estate total must be positive, got {total}")]
    NonPositiveEstate { total: Decimal },

    /// A deduction (funeral costs, debts, bequest) is negative.
    #[error("{field} must not be negative, got {amount}")]
    NegativeAmount { field: &'static str, amount: Decimal },

    /// Funeral costs, debts and bequest together exceed the estate.
    #[error("deductions of {deductions} exceed the estate total of {total}")]
    ExcessiveDeductions { deductions: Decimal, total: Decimal },

    /// No heir category has a positive count.
    #[error("at least one heir with a positive count is required")]
    NoHeirsSpecified,

    /// An heir key is not one of the classical categories.
    #[error("unknown heir type '{key}'")]
    UnknownHeirType { key: String },

    /// An heir count is below zero.
    #[error("heir '{heir}' has negative count {count}")]
    NegativeHeirCount { heir: String, count: i64 },

    /// An heir count is above what the category admits (one father, at most four wives...).
    #[error("heir '{heir}' has count {count}, at most {max} allowed")]
    HeirCountExceedsLimit { heir: HeirType, count: i64, max: u32 },

    /// A husband and a wife were both listed for the same deceased.
    #[error("husband and wife cannot both be heirs of the same deceased")]
    ConflictingSpouses,

    /// The madhab code is not one of the four schools.
    #[error("unknown madhab '{code}'")]
    UnknownMadhab { code: String },
}

impl ValidationError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::NonPositiveEstate { .. } => "NON_POSITIVE_ESTATE",
            ValidationError::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            ValidationError::ExcessiveDeductions { .. } => "EXCESSIVE_DEDUCTIONS",
            ValidationError::NoHeirsSpecified => "NO_HEIRS_SPECIFIED",
            ValidationError::UnknownHeirType { .. } => "UNKNOWN_HEIR_TYPE",
            ValidationError::NegativeHeirCount { .. } => "NEGATIVE_HEIR_COUNT",
            ValidationError::HeirCountExceedsLimit { .. } => "HEIR_COUNT_EXCEEDS_LIMIT",
            ValidationError::ConflictingSpouses => "CONFLICTING_SPOUSES",
            ValidationError::UnknownMadhab { .. } => "UNKNOWN_MADHAB",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ArithmeticError::DivisionByZero.code(), "DIVISION_BY_ZERO");
        assert_eq!(
            ValidationError::NoHeirsSpecified.code(),
            "NO_HEIRS_SPECIFIED"
        );
        assert_eq!(
            ValidationError::UnknownMadhab {
                code: "zahiri".to_string()
            }
            .code(),
            "UNKNOWN_MADHAB"
        );
    }

    #[test]
    fn messages_name_the_offending_value() {
        let err = ValidationError::UnknownHeirType {
            key: "cousin".to_string(),
        };
        assert_eq!(err.to_string(), "unknown heir type 'cousin'");

        let err = ValidationError::HeirCountExceedsLimit {
            heir: HeirType::Wife,
            count: 5,
            max: 4,
        };
        assert_eq!(err.to_string(), "heir 'wife' has count 5, at most 4 allowed");
    }
}
