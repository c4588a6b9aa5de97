//! Boundary types: the untyped request and the result record.
//!
//! Downstream consumers (display, export, audit storage) treat a
//! [`CalculationResult`] as read-only. Precision-sensitive consumers should
//! read `fraction`, never reconstruct it from `amount`.

use std::collections::BTreeMap;

use mirath_core::{ArithmeticError, EstateData, Fraction, HeirType, HeirsData, Madhab, ValidationError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CalculationError;
use crate::hijab::Exclusion;
use crate::shares::ShareBasis;
use crate::steps::StepRecord;

// ──────────────────────────────────────────────
// Request
// ──────────────────────────────────────────────

/// Untyped input, validated into typed values before any computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationRequest {
    pub madhab: String,
    pub estate: EstateData,
    pub heirs: BTreeMap<String, i64>,
}

impl CalculationRequest {
    pub fn new(madhab: &str, estate: EstateData) -> Self {
        CalculationRequest {
            madhab: madhab.to_string(),
            estate,
            heirs: BTreeMap::new(),
        }
    }

    pub fn heir(mut self, key: &str, count: i64) -> Self {
        *self.heirs.entry(key.to_string()).or_insert(0) += count;
        self
    }

    /// Validate in a fixed order: estate, heirs, then madhab.
    pub fn parse(&self) -> Result<(Madhab, EstateData, HeirsData), ValidationError> {
        self.estate.validate()?;
        let heirs = HeirsData::from_raw(&self.heirs)?;
        let madhab = Madhab::from_code(&self.madhab)?;
        Ok((madhab, self.estate.clone(), heirs))
    }
}

// ──────────────────────────────────────────────
// Result
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRecord {
    pub heir: HeirType,
    /// Fraction of the net estate for the whole category.
    pub fraction: Fraction,
    pub count: u32,
    pub amount: Decimal,
    pub basis: ShareBasis,
}

impl ShareRecord {
    /// Fraction received by each individual in the category.
    pub fn per_head(&self) -> Result<Fraction, ArithmeticError> {
        self.fraction.div_int(i64::from(self.count))
    }

    /// Amount received by each individual, unrounded.
    pub fn amount_per_head(&self) -> Decimal {
        if self.count == 0 {
            return self.amount;
        }
        self.amount / Decimal::from(self.count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl From<&CalculationError> for ErrorInfo {
    fn from(err: &CalculationError) -> Self {
        ErrorInfo {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub success: bool,
    pub madhab: Option<Madhab>,
    pub shares: Vec<ShareRecord>,
    /// Categories excluded by hijab, in canonical order.
    pub blocked_heirs: Vec<HeirType>,
    #[serde(default)]
    pub exclusions: Vec<Exclusion>,
    pub awl_applied: bool,
    pub radd_applied: bool,
    /// Advisory heuristic in `[0, 1]`.
    pub confidence: f64,
    pub steps: Vec<StepRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_estate: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_set_version: Option<String>,
}

impl CalculationResult {
    /// Failure record: no shares, no partial output.
    pub fn failure(error: &CalculationError, madhab: Option<Madhab>, steps: Vec<StepRecord>) -> Self {
        CalculationResult {
            success: false,
            madhab,
            shares: Vec::new(),
            blocked_heirs: Vec::new(),
            exclusions: Vec::new(),
            awl_applied: false,
            radd_applied: false,
            confidence: 0.0,
            steps,
            error: Some(ErrorInfo::from(error)),
            net_estate: None,
            rule_set_version: None,
        }
    }

    pub fn share(&self, heir: HeirType) -> Option<&ShareRecord> {
        self.shares.iter().find(|s| s.heir == heir)
    }

    pub fn total_amount(&self) -> Decimal {
        self.shares.iter().map(|s| s.amount).sum()
    }

    pub fn total_fraction(&self) -> Result<Fraction, ArithmeticError> {
        Fraction::sum(self.shares.iter().map(|s| &s.fraction))
    }

    pub fn error_code(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.code.as_str())
    }
}
