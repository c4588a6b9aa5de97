//! Exact rational numbers for share arithmetic.
//!
//! A [`Fraction`] is always stored in lowest terms with a strictly positive
//! denominator; the sign lives in the numerator. Arithmetic is checked:
//! intermediate values are computed in `i128`, reduced, and narrowed back
//! to `i64`, so an operation either yields an exact reduced value or an
//! [`ArithmeticError`]. No `f64` is involved anywhere; the only projection
//! out of the rationals is [`Fraction::to_decimal`].

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ArithmeticError;

/// Immutable exact rational number.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "RawFraction", into = "RawFraction")]
pub struct Fraction {
    numerator: i64,
    denominator: i64,
}

/// Wire form; deserialized values go back through [`Fraction::new`].
#[derive(Serialize, Deserialize)]
struct RawFraction {
    numerator: i64,
    denominator: i64,
}

impl TryFrom<RawFraction> for Fraction {
    type Error = ArithmeticError;

    fn try_from(raw: RawFraction) -> Result<Self, Self::Error> {
        Fraction::new(raw.numerator, raw.denominator)
    }
}

impl From<Fraction> for RawFraction {
    fn from(f: Fraction) -> Self {
        RawFraction {
            numerator: f.numerator,
            denominator: f.denominator,
        }
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl Fraction {
    pub const ZERO: Fraction = Fraction {
        numerator: 0,
        denominator: 1,
    };

    pub const ONE: Fraction = Fraction {
        numerator: 1,
        denominator: 1,
    };

    /// Build `numerator / denominator`, normalized and reduced.
    pub fn new(numerator: i64, denominator: i64) -> Result<Fraction, ArithmeticError> {
        Self::reduce(numerator as i128, denominator as i128, "construction")
    }

    /// Whole number `n / 1`.
    pub fn from_integer(n: i64) -> Fraction {
        Fraction {
            numerator: n,
            denominator: 1,
        }
    }

    fn reduce(num: i128, den: i128, operation: &'static str) -> Result<Fraction, ArithmeticError> {
        if den == 0 {
            return Err(ArithmeticError::DivisionByZero);
        }
        let (num, den) = if den < 0 { (-num, -den) } else { (num, den) };
        let g = gcd(num.unsigned_abs(), den.unsigned_abs()).max(1) as i128;
        let numerator =
            i64::try_from(num / g).map_err(|_| ArithmeticError::Overflow { operation })?;
        let denominator =
            i64::try_from(den / g).map_err(|_| ArithmeticError::Overflow { operation })?;
        Ok(Fraction {
            numerator,
            denominator,
        })
    }

    pub fn numerator(&self) -> i64 {
        self.numerator
    }

    pub fn denominator(&self) -> i64 {
        self.denominator
    }

    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    pub fn is_positive(&self) -> bool {
        self.numerator > 0
    }

    pub fn is_negative(&self) -> bool {
        self.numerator < 0
    }

    pub fn checked_add(&self, other: &Fraction) -> Result<Fraction, ArithmeticError> {
        let num = self.numerator as i128 * other.denominator as i128
            + other.numerator as i128 * self.denominator as i128;
        let den = self.denominator as i128 * other.denominator as i128;
        Self::reduce(num, den, "addition")
    }

    pub fn checked_sub(&self, other: &Fraction) -> Result<Fraction, ArithmeticError> {
        let num = self.numerator as i128 * other.denominator as i128
            - other.numerator as i128 * self.denominator as i128;
        let den = self.denominator as i128 * other.denominator as i128;
        Self::reduce(num, den, "subtraction")
    }

    pub fn checked_mul(&self, other: &Fraction) -> Result<Fraction, ArithmeticError> {
        let num = self.numerator as i128 * other.numerator as i128;
        let den = self.denominator as i128 * other.denominator as i128;
        Self::reduce(num, den, "multiplication")
    }

    /// Fails with `DivisionByZero` when `other` is zero-valued.
    pub fn checked_div(&self, other: &Fraction) -> Result<Fraction, ArithmeticError> {
        if other.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        let num = self.numerator as i128 * other.denominator as i128;
        let den = self.denominator as i128 * other.numerator as i128;
        Self::reduce(num, den, "division")
    }

    pub fn mul_int(&self, scalar: i64) -> Result<Fraction, ArithmeticError> {
        Self::reduce(
            self.numerator as i128 * scalar as i128,
            self.denominator as i128,
            "multiplication",
        )
    }

    /// Fails with `DivisionByZero` when `scalar` is 0.
    pub fn div_int(&self, scalar: i64) -> Result<Fraction, ArithmeticError> {
        if scalar == 0 {
            return Err(ArithmeticError::DivisionByZero);
        }
        Self::reduce(
            self.numerator as i128,
            self.denominator as i128 * scalar as i128,
            "division",
        )
    }

    /// `1 / self`.
    pub fn recip(&self) -> Result<Fraction, ArithmeticError> {
        Fraction::ONE.checked_div(self)
    }

    /// Exact sum of a sequence of fractions.
    pub fn sum<'a, I>(items: I) -> Result<Fraction, ArithmeticError>
    where
        I: IntoIterator<Item = &'a Fraction>,
    {
        items
            .into_iter()
            .try_fold(Fraction::ZERO, |acc, f| acc.checked_add(f))
    }

    /// Lossy projection for display and currency conversion.
    ///
    /// Never used to decide which rule applies.
    pub fn to_decimal(&self) -> Decimal {
        // denominator >= 1 and both parts fit the 96-bit mantissa
        Decimal::from(self.numerator) / Decimal::from(self.denominator)
    }

    /// Tolerance comparison against a decimal-origin value (UI boundary only).
    pub fn approx_eq(&self, value: Decimal, tolerance: Decimal) -> bool {
        (self.to_decimal() - value).abs() <= tolerance.abs()
    }

    /// `true` when numerator and denominator share no factor and the
    /// denominator is positive. Holds for every value this type produces.
    pub fn is_reduced(&self) -> bool {
        self.denominator > 0
            && gcd(
                self.numerator.unsigned_abs() as u128,
                self.denominator.unsigned_abs() as u128,
            ) == 1
    }
}

impl PartialEq for Fraction {
    fn eq(&self, other: &Self) -> bool {
        self.numerator as i128 * other.denominator as i128
            == other.numerator as i128 * self.denominator as i128
    }
}

impl Eq for Fraction {}

impl Hash for Fraction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // lowest terms: equal values have identical parts
        self.numerator.hash(state);
        self.denominator.hash(state);
    }
}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.numerator as i128 * other.denominator as i128)
            .cmp(&(other.numerator as i128 * self.denominator as i128))
    }
}

impl Default for Fraction {
    fn default() -> Self {
        Fraction::ZERO
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

/// Errors parsing `"n/d"` or `"n"`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFractionError {
    #[error("invalid fraction '{0}'")]
    Invalid(String),
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

impl FromStr for Fraction {
    type Err = ParseFractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseFractionError::Invalid(s.to_string());
        match s.trim().split_once('/') {
            Some((n, d)) => {
                let n = n.trim().parse::<i64>().map_err(|_| invalid())?;
                let d = d.trim().parse::<i64>().map_err(|_| invalid())?;
                Ok(Fraction::new(n, d)?)
            }
            None => {
                let n = s.trim().parse::<i64>().map_err(|_| invalid())?;
                Ok(Fraction::from_integer(n))
            }
        }
    }
}
