//! Special-case resolver: awl and radd.
//!
//! The epsilon only decides whether a correction triggers. Both corrections
//! are exact: awl scales every share by `1/S`, radd adds the surplus in
//! proportion to each eligible share, and either way the result sums to
//! exactly one.

use mirath_core::{Fraction, HeirType, MadhhabRuleSet};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CalculationError;
use crate::shares::{sum_shares, ShareMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "case")]
pub enum SpecialCase {
    None,
    /// Shares summed to `sum` and were scaled by its reciprocal.
    Awl { sum: Fraction },
    /// `surplus` was returned to `recipients`.
    Radd {
        surplus: Fraction,
        recipients: Vec<HeirType>,
    },
}

impl SpecialCase {
    pub fn awl_applied(&self) -> bool {
        matches!(self, SpecialCase::Awl { .. })
    }

    pub fn radd_applied(&self) -> bool {
        matches!(self, SpecialCase::Radd { .. })
    }
}

/// Apply awl or radd to `shares` in place.
///
/// `residuary_absorbed` is true when a residuary class existed; radd is
/// only considered without one.
pub fn resolve_special_case(
    shares: &mut ShareMap,
    residuary_absorbed: bool,
    rules: &MadhhabRuleSet,
    epsilon: Decimal,
) -> Result<SpecialCase, CalculationError> {
    let sum = sum_shares(shares)?;
    let deviation = sum.to_decimal() - Decimal::ONE;

    if deviation > epsilon {
        let factor = sum.recip()?;
        for allocation in shares.values_mut() {
            *allocation = allocation.scaled(&factor)?;
        }
        warn!(sum = %sum, "awl applied");
        return Ok(SpecialCase::Awl { sum });
    }

    if -deviation > epsilon && !residuary_absorbed {
        let surplus = Fraction::ONE.checked_sub(&sum)?;
        let recipients = radd_recipients(shares, rules);
        let base = recipients.iter().try_fold(Fraction::ZERO, |acc, h| {
            acc.checked_add(&shares.get(h).map(|a| a.total()).transpose()?.unwrap_or_default())
        })?;
        if base.is_zero() {
            return Err(CalculationError::invariant(format!(
                "surplus {surplus} has no heir to return to"
            )));
        }
        for heir in &recipients {
            if let Some(allocation) = shares.get_mut(heir) {
                let part = surplus.checked_mul(&allocation.total()?.checked_div(&base)?)?;
                allocation.fixed = allocation.fixed.checked_add(&part)?;
            }
        }
        warn!(surplus = %surplus, recipients = recipients.len(), "radd applied");
        return Ok(SpecialCase::Radd {
            surplus,
            recipients,
        });
    }

    Ok(SpecialCase::None)
}

/// Heirs holding a share, spouses only when the rule set admits them or
/// nobody else remains.
fn radd_recipients(shares: &ShareMap, rules: &MadhhabRuleSet) -> Vec<HeirType> {
    let holders: Vec<HeirType> = shares
        .iter()
        .filter(|(_, a)| a.total().is_ok_and(|t| t.is_positive()))
        .map(|(h, _)| *h)
        .collect();
    if rules.spouse_radd {
        return holders;
    }
    let others: Vec<HeirType> = holders.iter().copied().filter(|h| !h.is_spouse()).collect();
    if others.is_empty() {
        holders
    } else {
        others
    }
}

/// Fail unless the shares sum to exactly one.
pub fn verify_total(shares: &ShareMap) -> Result<(), CalculationError> {
    let sum = sum_shares(shares)?;
    if sum != Fraction::ONE {
        return Err(CalculationError::invariant(format!(
            "final shares sum to {sum}, not 1"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shares::Allocation;
    use mirath_core::Madhab;

    fn f(n: i64, d: i64) -> Fraction {
        Fraction::new(n, d).unwrap()
    }

    fn eps() -> Decimal {
        Decimal::new(1, 4)
    }

    fn rules() -> MadhhabRuleSet {
        MadhhabRuleSet::classical(Madhab::Shafii)
    }

    #[test]
    fn awl_scales_every_share_exactly() {
        let mut shares = ShareMap::from([
            (HeirType::Husband, Allocation::fixed(f(1, 4))),
            (HeirType::FullSister, Allocation::fixed(f(2, 3))),
            (HeirType::Mother, Allocation::fixed(f(1, 6))),
        ]);
        let case = resolve_special_case(&mut shares, false, &rules(), eps()).unwrap();
        assert_eq!(case, SpecialCase::Awl { sum: f(13, 12) });
        assert_eq!(shares[&HeirType::Husband].fixed, f(3, 13));
        assert_eq!(shares[&HeirType::FullSister].fixed, f(8, 13));
        assert_eq!(shares[&HeirType::Mother].fixed, f(2, 13));
        verify_total(&shares).unwrap();
    }

    #[test]
    fn radd_skips_spouses() {
        let mut shares = ShareMap::from([
            (HeirType::Wife, Allocation::fixed(f(1, 4))),
            (HeirType::Daughter, Allocation::fixed(f(1, 2))),
        ]);
        let case = resolve_special_case(&mut shares, false, &rules(), eps()).unwrap();
        assert!(case.radd_applied());
        assert_eq!(shares[&HeirType::Wife].fixed, f(1, 4));
        assert_eq!(shares[&HeirType::Daughter].fixed, f(3, 4));
        verify_total(&shares).unwrap();
    }

    #[test]
    fn radd_is_proportional() {
        let mut shares = ShareMap::from([
            (HeirType::Mother, Allocation::fixed(f(1, 6))),
            (HeirType::Daughter, Allocation::fixed(f(1, 2))),
        ]);
        resolve_special_case(&mut shares, false, &rules(), eps()).unwrap();
        assert_eq!(shares[&HeirType::Mother].fixed, f(1, 4));
        assert_eq!(shares[&HeirType::Daughter].fixed, f(3, 4));
    }

    #[test]
    fn lone_spouse_receives_radd() {
        let mut shares = ShareMap::from([(HeirType::Husband, Allocation::fixed(f(1, 2)))]);
        let case = resolve_special_case(&mut shares, false, &rules(), eps()).unwrap();
        assert_eq!(
            case,
            SpecialCase::Radd {
                surplus: f(1, 2),
                recipients: vec![HeirType::Husband]
            }
        );
        assert_eq!(shares[&HeirType::Husband].fixed, Fraction::ONE);
    }

    #[test]
    fn exact_total_triggers_nothing() {
        let mut shares = ShareMap::from([
            (HeirType::Husband, Allocation::fixed(f(1, 2))),
            (HeirType::FullSister, Allocation::fixed(f(1, 2))),
        ]);
        let case = resolve_special_case(&mut shares, false, &rules(), eps()).unwrap();
        assert_eq!(case, SpecialCase::None);
        assert!(!case.awl_applied() && !case.radd_applied());
    }

    #[test]
    fn surplus_with_a_residuary_is_not_returned() {
        let mut shares = ShareMap::from([(HeirType::Wife, Allocation::fixed(f(1, 4)))]);
        let case = resolve_special_case(&mut shares, true, &rules(), eps()).unwrap();
        assert_eq!(case, SpecialCase::None);
        assert!(verify_total(&shares).is_err());
    }
}
