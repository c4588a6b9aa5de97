//! Calculation orchestrator.
//!
//! Sequences the resolvers as a state machine, converts the final fractions
//! into amounts and builds the result record. The engine is a pure,
//! synchronous function of its inputs and holds no mutable state, so one
//! instance can be shared across threads freely.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use mirath_core::{EstateData, Fraction, HeirType, HeirsData, Madhab, RuleDatabase};
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use crate::amounts::finalize_amounts;
use crate::asaba::{distribute_residual, residuary_class};
use crate::config::EngineConfig;
use crate::error::CalculationError;
use crate::fard::resolve_fixed_shares;
use crate::hijab::apply_hijab;
use crate::result::{CalculationRequest, CalculationResult, ShareRecord};
use crate::shares::{ShareBasis, ShareMap};
use crate::special::{resolve_special_case, verify_total, SpecialCase};
use crate::steps::{CalculationStage, StepLog};

/// Anything that turns a request into a result without failing.
pub trait Calculator: Send + Sync {
    fn calculate(&self, request: &CalculationRequest) -> CalculationResult;
}

#[derive(Debug, Clone, Default)]
pub struct Engine {
    rules: RuleDatabase,
    config: EngineConfig,
}

impl Engine {
    pub fn new(rules: RuleDatabase, config: EngineConfig) -> Self {
        Engine { rules, config }
    }

    /// Classical rule tables, default configuration.
    pub fn classical() -> Self {
        Self::default()
    }

    pub fn rules(&self) -> &RuleDatabase {
        &self.rules
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Typed entry point; failures are returned as `Err`.
    pub fn calculate_typed(
        &self,
        madhab: Madhab,
        estate: &EstateData,
        heirs: &HeirsData,
    ) -> Result<CalculationResult, CalculationError> {
        self.run(madhab, estate, heirs, &mut StepLog::new())
    }

    /// Typed entry point with failures folded into the result.
    pub fn calculate_with(
        &self,
        madhab: Madhab,
        estate: &EstateData,
        heirs: &HeirsData,
    ) -> CalculationResult {
        let mut log = StepLog::new();
        match self.run(madhab, estate, heirs, &mut log) {
            Ok(result) => result,
            Err(err) => {
                debug!(code = err.code(), error = %err, "calculation failed");
                let steps = log.fail(&err).to_vec();
                CalculationResult::failure(&err, Some(madhab), steps)
            }
        }
    }

    #[instrument(skip_all, fields(madhab = %madhab))]
    fn run(
        &self,
        madhab: Madhab,
        estate: &EstateData,
        heirs: &HeirsData,
        log: &mut StepLog,
    ) -> Result<CalculationResult, CalculationError> {
        let started = Instant::now();

        // Validating
        estate.validate()?;
        heirs.validate()?;
        let rules = self.rules.rule_set_for(madhab)?;
        log.record("Input validated", format!("{} heir categories", heirs.iter().count()))
            .detail("madhab", madhab.name())
            .detail("rule_set_version", &rules.version);

        // EstateNetted
        let net = estate.net_estate()?;
        log.advance(
            CalculationStage::EstateNetted,
            "Net estate",
            format!("{} after funeral costs, debts and bequest", net),
        )?
        .detail("total", estate.total)
        .detail("funeral_costs", estate.funeral_costs)
        .detail("debts", estate.debts)
        .detail("bequest", estate.bequest)
        .detail("net_estate", net);

        // HijabApplied
        let hijab = apply_hijab(heirs, rules);
        let step = log.advance(
            CalculationStage::HijabApplied,
            "Exclusions applied",
            format!("{} categories excluded", hijab.exclusions.len()),
        )?;
        for exclusion in &hijab.exclusions {
            step.detail(exclusion.heir.key(), &exclusion.reason);
        }
        for (heir, reductions) in &hijab.reductions {
            step.detail(&format!("{}_reduced", heir.key()), format!("{:?}", reductions));
        }

        // FixedSharesComputed
        let class = residuary_class(&hijab.filtered, rules);
        let fixed = resolve_fixed_shares(&hijab, class.as_ref(), rules)?;
        let step = log.advance(
            CalculationStage::FixedSharesComputed,
            "Fixed shares",
            format!("residual {}", fixed.residual),
        )?;
        for (heir, allocation) in &fixed.shares {
            step.detail(heir.key(), allocation.fixed);
        }
        if fixed.oversubscribed {
            step.detail("oversubscribed", true);
        }

        // ResiduaryResolved
        let mut shares = fixed.shares;
        let residuary = distribute_residual(
            &mut shares,
            fixed.residual,
            class.as_ref(),
            &hijab.filtered,
            rules,
        )?;
        let description = match &class {
            Some(c) => format!("residual {} to {:?} residuaries", fixed.residual, c.kind),
            None => format!("no residuary heir; {} unassigned", residuary.unassigned),
        };
        let step = log.advance(CalculationStage::ResiduaryResolved, "Residue", description)?;
        for heir in &residuary.absorbed_by {
            if let Some(allocation) = shares.get(heir) {
                step.detail(heir.key(), allocation.residuary);
            }
        }
        if residuary.shared_uterine_third {
            step.detail("shared_uterine_third", true);
        }

        // SpecialCaseResolved
        let special = resolve_special_case(
            &mut shares,
            residuary.absorbed(),
            rules,
            self.config.trigger_epsilon,
        )?;
        verify_total(&shares)?;
        let description = match &special {
            SpecialCase::None => "shares sum to the whole estate".to_string(),
            SpecialCase::Awl { sum } => format!("awl: shares summed to {sum}, scaled by its reciprocal"),
            SpecialCase::Radd { surplus, .. } => format!("radd: surplus {surplus} returned"),
        };
        log.advance(CalculationStage::SpecialCaseResolved, "Special cases", description)?
            .detail("awl_applied", special.awl_applied())
            .detail("radd_applied", special.radd_applied());

        // AmountsFinalized
        let mut fractions = BTreeMap::new();
        for (heir, allocation) in &shares {
            let total = allocation.total()?;
            if total.is_positive() {
                fractions.insert(*heir, total);
            }
        }
        let amounts = finalize_amounts(net, &fractions, self.config.amount_scale)?;
        let share_records = build_records(heirs, &shares, &fractions, &amounts);
        let step = log.advance(
            CalculationStage::AmountsFinalized,
            "Amounts",
            format!("{} distributed among {} categories", net, share_records.len()),
        )?;
        for record in &share_records {
            step.detail(record.heir.key(), format!("{} = {}", record.fraction, record.amount));
        }
        // present and unblocked, but the residue ran out before reaching them
        let without_share: Vec<&str> = hijab
            .filtered
            .present()
            .into_iter()
            .filter(|heir| !fractions.contains_key(heir))
            .map(|heir| heir.key())
            .collect();
        if !without_share.is_empty() {
            debug!(heirs = ?without_share, "heirs left without a share");
            step.detail("without_share", without_share.join(","));
        }

        let confidence = confidence(&self.config, &special, started.elapsed());
        log.advance(CalculationStage::Done, "Done", "calculation complete")?
            .detail("confidence", confidence);

        Ok(CalculationResult {
            success: true,
            madhab: Some(madhab),
            shares: share_records,
            blocked_heirs: hijab.blocked_heirs(),
            exclusions: hijab.exclusions,
            awl_applied: special.awl_applied(),
            radd_applied: special.radd_applied(),
            confidence,
            steps: log.steps().to_vec(),
            error: None,
            net_estate: Some(net),
            rule_set_version: Some(rules.version.clone()),
        })
    }
}

impl Calculator for Engine {
    fn calculate(&self, request: &CalculationRequest) -> CalculationResult {
        match request.parse() {
            Ok((madhab, estate, heirs)) => self.calculate_with(madhab, &estate, &heirs),
            Err(err) => {
                let err = CalculationError::from(err);
                let madhab = Madhab::from_code(&request.madhab).ok();
                let steps = StepLog::new().fail(&err).to_vec();
                CalculationResult::failure(&err, madhab, steps)
            }
        }
    }
}

fn build_records(
    heirs: &HeirsData,
    shares: &ShareMap,
    fractions: &BTreeMap<HeirType, Fraction>,
    amounts: &BTreeMap<HeirType, Decimal>,
) -> Vec<ShareRecord> {
    fractions
        .iter()
        .map(|(heir, fraction)| ShareRecord {
            heir: *heir,
            fraction: *fraction,
            count: heirs.count(*heir),
            amount: amounts.get(heir).copied().unwrap_or_default(),
            basis: shares.get(heir).map(|a| a.basis()).unwrap_or(ShareBasis::Fixed),
        })
        .collect()
}

/// Advisory score; never read back by the engine.
fn confidence(config: &EngineConfig, special: &SpecialCase, elapsed: Duration) -> f64 {
    let mut score = 1.0;
    if special.awl_applied() {
        score -= config.awl_penalty;
    }
    if special.radd_applied() {
        score -= config.radd_penalty;
    }
    if elapsed > Duration::from_millis(config.latency_budget_ms) {
        score -= config.latency_penalty;
    }
    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn successful_run_logs_every_stage() {
        let engine = Engine::classical();
        let heirs = HeirsData::new()
            .with(HeirType::Husband, 1)
            .with(HeirType::Son, 1);
        let result = engine
            .calculate_typed(Madhab::Shafii, &EstateData::new(dec!(120000)), &heirs)
            .unwrap();
        let stages: Vec<CalculationStage> = result.steps.iter().map(|s| s.stage).collect();
        assert_eq!(
            stages,
            vec![
                CalculationStage::Validating,
                CalculationStage::EstateNetted,
                CalculationStage::HijabApplied,
                CalculationStage::FixedSharesComputed,
                CalculationStage::ResiduaryResolved,
                CalculationStage::SpecialCaseResolved,
                CalculationStage::AmountsFinalized,
                CalculationStage::Done,
            ]
        );
        assert_eq!(result.rule_set_version.as_deref(), Some("1.0.0"));
    }

    #[test]
    fn unblocked_heir_left_without_share_is_logged() {
        let engine = Engine::classical();
        let heirs = HeirsData::new()
            .with(HeirType::Husband, 1)
            .with(HeirType::Mother, 1)
            .with(HeirType::Grandfather, 1)
            .with(HeirType::FullSister, 1);
        let result = engine
            .calculate_typed(Madhab::Shafii, &EstateData::new(dec!(600)), &heirs)
            .unwrap();
        assert!(result.share(HeirType::FullSister).is_none());
        assert!(!result.blocked_heirs.contains(&HeirType::FullSister));
        let amounts = result
            .steps
            .iter()
            .find(|s| s.stage == CalculationStage::AmountsFinalized)
            .unwrap();
        assert_eq!(
            amounts.details.get("without_share").map(String::as_str),
            Some("full_sister")
        );
    }

    #[test]
    fn heirs_with_shares_are_not_listed_as_without_share() {
        let engine = Engine::classical();
        let heirs = HeirsData::new()
            .with(HeirType::Husband, 1)
            .with(HeirType::Son, 1);
        let result = engine
            .calculate_typed(Madhab::Hanafi, &EstateData::new(dec!(100)), &heirs)
            .unwrap();
        assert!(result
            .steps
            .iter()
            .all(|s| !s.details.contains_key("without_share")));
    }

    #[test]
    fn typed_failures_fold_into_the_result() {
        let engine = Engine::classical();
        let result = engine.calculate_with(
            Madhab::Hanafi,
            &EstateData::new(dec!(100)).with_debts(dec!(200)),
            &HeirsData::new().with(HeirType::Son, 1),
        );
        assert!(!result.success);
        assert_eq!(result.error_code(), Some("EXCESSIVE_DEDUCTIONS"));
        assert_eq!(result.steps.len(), 1);
        assert_eq!(result.steps[0].stage, CalculationStage::Failed);
    }

    #[test]
    fn missing_rule_set_is_reported_as_unknown_madhab() {
        let engine = Engine::new(
            RuleDatabase::from_rule_sets([mirath_core::MadhhabRuleSet::classical(Madhab::Hanafi)]),
            EngineConfig::default(),
        );
        let err = engine
            .calculate_typed(
                Madhab::Maliki,
                &EstateData::new(dec!(100)),
                &HeirsData::new().with(HeirType::Son, 1),
            )
            .unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_MADHAB");
    }

    #[test]
    fn confidence_drops_for_corrections_and_latency() {
        let cfg = EngineConfig::default();
        let awl = SpecialCase::Awl {
            sum: Fraction::new(13, 12).unwrap(),
        };
        assert_eq!(confidence(&cfg, &SpecialCase::None, Duration::ZERO), 1.0);
        assert!((confidence(&cfg, &awl, Duration::ZERO) - 0.9).abs() < 1e-9);
        assert!((confidence(&cfg, &awl, Duration::from_secs(1)) - 0.85).abs() < 1e-9);

        let harsh = EngineConfig {
            awl_penalty: 5.0,
            ..EngineConfig::default()
        };
        assert_eq!(confidence(&harsh, &awl, Duration::ZERO), 0.0);
    }
}
