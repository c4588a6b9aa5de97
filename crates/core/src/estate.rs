//! Gross estate and the deductions taken before distribution.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Monetary inputs, all in `rust_decimal::Decimal`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EstateData {
    pub total: Decimal,
    #[serde(default)]
    pub funeral_costs: Decimal,
    #[serde(default)]
    pub debts: Decimal,
    #[serde(default)]
    pub bequest: Decimal,
}

impl EstateData {
    /// Estate with no deductions.
    pub fn new(total: Decimal) -> Self {
        EstateData {
            total,
            funeral_costs: Decimal::ZERO,
            debts: Decimal::ZERO,
            bequest: Decimal::ZERO,
        }
    }

    pub fn with_funeral_costs(mut self, amount: Decimal) -> Self {
        self.funeral_costs = amount;
        self
    }

    pub fn with_debts(mut self, amount: Decimal) -> Self {
        self.debts = amount;
        self
    }

    pub fn with_bequest(mut self, amount: Decimal) -> Self {
        self.bequest = amount;
        self
    }

    /// Sum of funeral costs, debts and bequest, or `None` on overflow.
    pub fn deductions(&self) -> Option<Decimal> {
        self.funeral_costs
            .checked_add(self.debts)?
            .checked_add(self.bequest)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.total <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveEstate { total: self.total });
        }
        for (field, amount) in [
            ("funeral_costs", self.funeral_costs),
            ("debts", self.debts),
            ("bequest", self.bequest),
        ] {
            if amount.is_sign_negative() && !amount.is_zero() {
                return Err(ValidationError::NegativeAmount { field, amount });
            }
        }
        // An overflowing sum necessarily exceeds any representable total.
        match self.deductions() {
            Some(deductions) if deductions <= self.total => Ok(()),
            Some(deductions) => Err(ValidationError::ExcessiveDeductions {
                deductions,
                total: self.total,
            }),
            None => Err(ValidationError::ExcessiveDeductions {
                deductions: Decimal::MAX,
                total: self.total,
            }),
        }
    }

    /// `total - funeral_costs - debts - bequest`, after validation.
    pub fn net_estate(&self) -> Result<Decimal, ValidationError> {
        self.validate()?;
        let deductions = self.deductions().unwrap_or(Decimal::ZERO);
        Ok(self.total - deductions)
    }
}
