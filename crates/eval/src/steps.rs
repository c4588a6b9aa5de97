//! Calculation state machine and the audit step log.
//!
//! Each stage transition appends a [`StepRecord`] for downstream audit
//! display. The log is advisory output only: nothing in the pipeline reads
//! it back.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CalculationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationStage {
    Validating,
    EstateNetted,
    HijabApplied,
    FixedSharesComputed,
    ResiduaryResolved,
    SpecialCaseResolved,
    AmountsFinalized,
    Done,
    Failed,
}

impl CalculationStage {
    /// The only stage reachable on success, or `None` from a terminal stage.
    pub fn next(self) -> Option<CalculationStage> {
        use CalculationStage::*;
        match self {
            Validating => Some(EstateNetted),
            EstateNetted => Some(HijabApplied),
            HijabApplied => Some(FixedSharesComputed),
            FixedSharesComputed => Some(ResiduaryResolved),
            ResiduaryResolved => Some(SpecialCaseResolved),
            SpecialCaseResolved => Some(AmountsFinalized),
            AmountsFinalized => Some(Done),
            Done | Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CalculationStage::Done | CalculationStage::Failed)
    }

    /// Short tag attached to the step recorded when entering this stage.
    pub fn tag(self) -> &'static str {
        use CalculationStage::*;
        match self {
            Validating => "validation",
            EstateNetted => "estate",
            HijabApplied => "hijab",
            FixedSharesComputed => "fard",
            ResiduaryResolved => "asaba",
            SpecialCaseResolved => "special_case",
            AmountsFinalized => "amounts",
            Done => "done",
            Failed => "error",
        }
    }
}

impl fmt::Display for CalculationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CalculationStage::*;
        f.write_str(match self {
            Validating => "validating",
            EstateNetted => "estate_netted",
            HijabApplied => "hijab_applied",
            FixedSharesComputed => "fixed_shares_computed",
            ResiduaryResolved => "residuary_resolved",
            SpecialCaseResolved => "special_case_resolved",
            AmountsFinalized => "amounts_finalized",
            Done => "done",
            Failed => "failed",
        })
    }
}

/// One human-readable entry in the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub stage: CalculationStage,
    pub title: String,
    pub description: String,
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
}

impl StepRecord {
    pub fn new(stage: CalculationStage, title: &str, description: impl Into<String>) -> Self {
        StepRecord {
            stage,
            title: title.to_string(),
            description: description.into(),
            tag: stage.tag().to_string(),
            details: BTreeMap::new(),
        }
    }

    pub fn detail(&mut self, key: &str, value: impl ToString) -> &mut Self {
        self.details.insert(key.to_string(), value.to_string());
        self
    }

    pub fn tag(&mut self, tag: &str) -> &mut Self {
        self.tag = tag.to_string();
        self
    }
}

/// Collector that enforces legal transitions while recording steps.
#[derive(Debug, Clone)]
pub struct StepLog {
    stage: CalculationStage,
    steps: Vec<StepRecord>,
}

impl Default for StepLog {
    fn default() -> Self {
        Self::new()
    }
}

impl StepLog {
    pub fn new() -> Self {
        StepLog {
            stage: CalculationStage::Validating,
            steps: Vec::new(),
        }
    }

    pub fn stage(&self) -> CalculationStage {
        self.stage
    }

    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    /// Record a step for the current stage without transitioning.
    pub fn record(&mut self, title: &str, description: impl Into<String>) -> &mut StepRecord {
        self.steps.push(StepRecord::new(self.stage, title, description));
        let last = self.steps.len() - 1;
        &mut self.steps[last]
    }

    /// Move to `to` and record the step describing it.
    ///
    /// Only the single successor of the current stage is accepted; use
    /// [`StepLog::fail`] to leave the happy path.
    pub fn advance(
        &mut self,
        to: CalculationStage,
        title: &str,
        description: impl Into<String>,
    ) -> Result<&mut StepRecord, CalculationError> {
        if self.stage.next() != Some(to) || to == CalculationStage::Failed {
            return Err(CalculationError::invariant(format!(
                "illegal stage transition {} -> {}",
                self.stage, to
            )));
        }
        self.stage = to;
        Ok(self.record(title, description))
    }

    /// Enter `Failed` from any non-terminal stage. Steps recorded so far are
    /// discarded; a failed calculation reports only why it failed.
    pub fn fail(&mut self, error: &CalculationError) -> &[StepRecord] {
        let from = self.stage;
        self.stage = CalculationStage::Failed;
        self.steps.clear();
        self.record("Calculation failed", error.to_string())
            .detail("code", error.code())
            .detail("failed_during", from);
        &self.steps
    }

    pub fn into_steps(self) -> Vec<StepRecord> {
        self.steps
    }
}
