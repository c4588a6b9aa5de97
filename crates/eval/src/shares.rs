//! Working share map threaded between the resolvers.

use std::collections::BTreeMap;

use mirath_core::{ArithmeticError, Fraction, HeirType};
use serde::{Deserialize, Serialize};

/// How an heir's final fraction was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareBasis {
    Fixed,
    Residuary,
    FixedAndResiduary,
}

/// A heir category's group fraction, split by origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Allocation {
    pub fixed: Fraction,
    pub residuary: Fraction,
}

impl Allocation {
    pub fn fixed(fraction: Fraction) -> Self {
        Allocation {
            fixed: fraction,
            residuary: Fraction::ZERO,
        }
    }

    pub fn total(&self) -> Result<Fraction, ArithmeticError> {
        self.fixed.checked_add(&self.residuary)
    }

    pub fn basis(&self) -> ShareBasis {
        match (self.fixed.is_zero(), self.residuary.is_zero()) {
            (false, true) => ShareBasis::Fixed,
            (true, false) => ShareBasis::Residuary,
            (false, false) => ShareBasis::FixedAndResiduary,
            // zero allocations never reach the result
            (true, true) => ShareBasis::Fixed,
        }
    }

    /// Multiply both parts by `factor`.
    pub fn scaled(&self, factor: &Fraction) -> Result<Allocation, ArithmeticError> {
        Ok(Allocation {
            fixed: self.fixed.checked_mul(factor)?,
            residuary: self.residuary.checked_mul(factor)?,
        })
    }
}

pub type ShareMap = BTreeMap<HeirType, Allocation>;

/// Exact sum of every allocation in the map.
pub fn sum_shares(shares: &ShareMap) -> Result<Fraction, ArithmeticError> {
    shares
        .values()
        .try_fold(Fraction::ZERO, |acc, a| acc.checked_add(&a.total()?))
}
