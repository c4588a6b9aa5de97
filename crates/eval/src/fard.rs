//! Fixed-share (fard) resolver.
//!
//! Reads the hijab-filtered heirs, the partial-exclusion flags and the
//! residuary class, and assigns each fixed-share heir its group fraction.
//! A category's fraction always belongs to the whole group (two wives share
//! one eighth; they do not each take one).
//!
//! This stage never applies awl: when the fixed shares alone pass one, the
//! residual is reported as zero and the excess is left for the special-case
//! resolver.

use mirath_core::{
    ArithmeticError, Fraction, HeirType, HeirsData, MadhhabRuleSet, MotherWithFather, Reduction,
};
use tracing::debug;

use crate::asaba::{ResiduaryClass, ResiduaryKind};
use crate::hijab::HijabOutcome;
use crate::shares::{sum_shares, Allocation, ShareMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedShares {
    pub shares: ShareMap,
    /// `max(0, 1 - sum of fixed shares)`.
    pub residual: Fraction,
    /// Fixed shares alone exceed the estate.
    pub oversubscribed: bool,
}

fn frac(n: i64, d: i64) -> Result<Fraction, ArithmeticError> {
    Fraction::new(n, d)
}

/// Half for one, two thirds for two or more.
fn half_or_two_thirds(count: u32) -> Result<Fraction, ArithmeticError> {
    if count == 1 {
        frac(1, 2)
    } else {
        frac(2, 3)
    }
}

struct Context<'a> {
    heirs: &'a HeirsData,
    hijab: &'a HijabOutcome,
    class: Option<&'a ResiduaryClass>,
    rules: &'a MadhhabRuleSet,
}

impl Context<'_> {
    fn reduced(&self, heir: HeirType, reduction: Reduction) -> bool {
        self.hijab.is_reduced(heir, reduction)
    }

    fn residuary(&self, heir: HeirType) -> bool {
        self.class.is_some_and(|c| c.contains(heir))
    }

    fn spouse_share(&self, shares: &ShareMap) -> Option<Fraction> {
        HeirType::SPOUSES
            .iter()
            .find_map(|s| shares.get(s).map(|a| a.fixed))
    }

    fn mother(&self, shares: &ShareMap) -> Result<Fraction, ArithmeticError> {
        use Reduction::*;
        if self.reduced(HeirType::Mother, DescendantPresent)
            || self.reduced(HeirType::Mother, MultipleSiblings)
        {
            return frac(1, 6);
        }
        if !self.reduced(HeirType::Mother, FatherPresent) {
            return frac(1, 3);
        }
        match self.rules.mother_with_father {
            MotherWithFather::Sixth => frac(1, 6),
            MotherWithFather::ThirdOfRemainder => match self.spouse_share(shares) {
                Some(spouse) => Fraction::ONE.checked_sub(&spouse)?.div_int(3),
                None => frac(1, 3),
            },
        }
    }

    /// The fixed fraction of a whole category, or `None` when it inherits
    /// only as a residuary (or not at all).
    fn fixed_share(
        &self,
        heir: HeirType,
        count: u32,
        shares: &ShareMap,
    ) -> Result<Option<Fraction>, ArithmeticError> {
        use HeirType::*;
        use Reduction::*;

        let share = match heir {
            Husband if self.reduced(heir, DescendantPresent) => frac(1, 4)?,
            Husband => frac(1, 2)?,
            Wife if self.reduced(heir, DescendantPresent) => frac(1, 8)?,
            Wife => frac(1, 4)?,
            Daughter | FullSister if self.residuary(heir) => return Ok(None),
            Daughter | FullSister => half_or_two_thirds(count)?,
            Granddaughter | PaternalSister if self.residuary(heir) => return Ok(None),
            Granddaughter | PaternalSister if self.reduced(heir, CompletesTwoThirds) => {
                frac(1, 6)?
            }
            Granddaughter | PaternalSister => half_or_two_thirds(count)?,
            Father if self.reduced(heir, DescendantPresent) => frac(1, 6)?,
            Grandfather
                if self.reduced(heir, DescendantPresent)
                    && self.class.map(|c| c.kind)
                        != Some(ResiduaryKind::GrandfatherWithSiblings) =>
            {
                frac(1, 6)?
            }
            Mother => self.mother(shares)?,
            PaternalGrandmother | MaternalGrandmother => {
                let grandmothers = self
                    .heirs
                    .total_of(&[PaternalGrandmother, MaternalGrandmother])
                    .max(1);
                frac(1, 6)?.div_int(grandmothers as i64)?
            }
            MaternalBrother | MaternalSister => {
                let uterine = self.heirs.total_of(&HeirType::UTERINE_SIBLINGS);
                if uterine == 1 {
                    frac(1, 6)?
                } else {
                    frac(1, 3)?.mul_int(i64::from(count))?.div_int(uterine as i64)?
                }
            }
            Father | Grandfather | Son | Grandson | FullBrother | PaternalBrother
            | FullNephew | PaternalNephew | FullUncle | PaternalUncle => return Ok(None),
        };
        Ok(Some(share))
    }
}

/// Assign fixed shares to the filtered heirs in canonical order.
pub fn resolve_fixed_shares(
    hijab: &HijabOutcome,
    class: Option<&ResiduaryClass>,
    rules: &MadhhabRuleSet,
) -> Result<FixedShares, ArithmeticError> {
    let ctx = Context {
        heirs: &hijab.filtered,
        hijab,
        class,
        rules,
    };

    let mut shares = ShareMap::new();
    // canonical order puts spouses before the mother, whose third may be
    // taken from what the spouse leaves
    for (heir, count) in hijab.filtered.iter() {
        if let Some(share) = ctx.fixed_share(heir, count, &shares)? {
            debug!(heir = %heir, share = %share, "fixed share");
            shares.insert(heir, Allocation::fixed(share));
        }
    }

    let sum = sum_shares(&shares)?;
    let oversubscribed = sum > Fraction::ONE;
    let residual = if oversubscribed {
        Fraction::ZERO
    } else {
        Fraction::ONE.checked_sub(&sum)?
    };
    Ok(FixedShares {
        shares,
        residual,
        oversubscribed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asaba::residuary_class;
    use crate::hijab::apply_hijab;
    use mirath_core::Madhab;

    fn f(n: i64, d: i64) -> Fraction {
        Fraction::new(n, d).unwrap()
    }

    fn fixed(madhab: Madhab, heirs: &HeirsData) -> FixedShares {
        let rules = MadhhabRuleSet::classical(madhab);
        let hijab = apply_hijab(heirs, &rules);
        let class = residuary_class(&hijab.filtered, &rules);
        resolve_fixed_shares(&hijab, class.as_ref(), &rules).unwrap()
    }

    fn share(out: &FixedShares, heir: HeirType) -> Option<Fraction> {
        out.shares.get(&heir).map(|a| a.fixed)
    }

    #[test]
    fn spouse_shares_depend_on_descendants() {
        let out = fixed(Madhab::Shafii, &HeirsData::new().with(HeirType::Husband, 1));
        assert_eq!(share(&out, HeirType::Husband), Some(f(1, 2)));

        let heirs = HeirsData::new()
            .with(HeirType::Wife, 3)
            .with(HeirType::Son, 1);
        let out = fixed(Madhab::Shafii, &heirs);
        // one eighth for the group of wives
        assert_eq!(share(&out, HeirType::Wife), Some(f(1, 8)));
        assert_eq!(share(&out, HeirType::Son), None);
        assert_eq!(out.residual, f(7, 8));
    }

    #[test]
    fn daughters_beside_a_son_take_no_fixed_share() {
        let heirs = HeirsData::new()
            .with(HeirType::Son, 1)
            .with(HeirType::Daughter, 1);
        let out = fixed(Madhab::Hanafi, &heirs);
        assert!(out.shares.is_empty());
        assert_eq!(out.residual, Fraction::ONE);

        let out = fixed(Madhab::Hanafi, &HeirsData::new().with(HeirType::Daughter, 3));
        assert_eq!(share(&out, HeirType::Daughter), Some(f(2, 3)));
    }

    #[test]
    fn granddaughter_completes_two_thirds() {
        let heirs = HeirsData::new()
            .with(HeirType::Daughter, 1)
            .with(HeirType::Granddaughter, 2);
        let out = fixed(Madhab::Maliki, &heirs);
        assert_eq!(share(&out, HeirType::Daughter), Some(f(1, 2)));
        assert_eq!(share(&out, HeirType::Granddaughter), Some(f(1, 6)));
        assert_eq!(out.residual, f(1, 3));
    }

    #[test]
    fn mother_beside_father_varies_by_school() {
        let heirs = HeirsData::new()
            .with(HeirType::Wife, 1)
            .with(HeirType::Father, 1)
            .with(HeirType::Mother, 1);
        // a third of what the wife leaves
        let out = fixed(Madhab::Shafii, &heirs);
        assert_eq!(share(&out, HeirType::Mother), Some(f(1, 4)));
        let out = fixed(Madhab::Maliki, &heirs);
        assert_eq!(share(&out, HeirType::Mother), Some(f(1, 6)));

        let heirs = HeirsData::new()
            .with(HeirType::Husband, 1)
            .with(HeirType::Father, 1)
            .with(HeirType::Mother, 1);
        let out = fixed(Madhab::Hanbali, &heirs);
        assert_eq!(share(&out, HeirType::Mother), Some(f(1, 6)));
        assert_eq!(share(&out, HeirType::Father), None);
    }

    #[test]
    fn mother_with_siblings_or_descendants_takes_a_sixth() {
        let heirs = HeirsData::new()
            .with(HeirType::Mother, 1)
            .with(HeirType::FullBrother, 1)
            .with(HeirType::MaternalSister, 1);
        let out = fixed(Madhab::Hanafi, &heirs);
        assert_eq!(share(&out, HeirType::Mother), Some(f(1, 6)));
        assert_eq!(share(&out, HeirType::MaternalSister), Some(f(1, 6)));

        let out = fixed(Madhab::Hanafi, &HeirsData::new().with(HeirType::Mother, 1));
        assert_eq!(share(&out, HeirType::Mother), Some(f(1, 3)));
    }

    #[test]
    fn uterine_third_is_split_per_head() {
        let heirs = HeirsData::new()
            .with(HeirType::MaternalBrother, 1)
            .with(HeirType::MaternalSister, 2);
        let out = fixed(Madhab::Hanbali, &heirs);
        assert_eq!(share(&out, HeirType::MaternalBrother), Some(f(1, 9)));
        assert_eq!(share(&out, HeirType::MaternalSister), Some(f(2, 9)));
    }

    #[test]
    fn grandmothers_share_a_sixth() {
        let heirs = HeirsData::new()
            .with(HeirType::PaternalGrandmother, 1)
            .with(HeirType::MaternalGrandmother, 1)
            .with(HeirType::Son, 1);
        let out = fixed(Madhab::Shafii, &heirs);
        assert_eq!(share(&out, HeirType::PaternalGrandmother), Some(f(1, 12)));
        assert_eq!(share(&out, HeirType::MaternalGrandmother), Some(f(1, 12)));
    }

    #[test]
    fn oversubscription_is_flagged_not_resolved() {
        let heirs = HeirsData::new()
            .with(HeirType::Husband, 1)
            .with(HeirType::FullSister, 2)
            .with(HeirType::Mother, 1);
        let out = fixed(Madhab::Shafii, &heirs);
        assert!(out.oversubscribed);
        assert_eq!(out.residual, Fraction::ZERO);
        assert_eq!(sum_shares(&out.shares).unwrap(), f(4, 3));
    }
}
