//! Residuary (asaba) resolver.
//!
//! The residuary class is decided from the filtered heirs before fixed
//! shares are computed, because a female heir standing beside her agnatic
//! counterpart (or beside daughters) takes no fixed share at all. Once the
//! fixed shares are known, [`distribute_residual`] hands the residual to the
//! class, two parts per male head and one per female head.

use mirath_core::{
    ArithmeticError, Fraction, GrandfatherPolicy, HeirType, HeirsData, MadhhabRuleSet,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::shares::{Allocation, ShareMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResiduaryKind {
    /// Agnatic males in their own right (asaba bi-nafsihi).
    ByThemselves,
    /// Females made residuary by their brothers (asaba bil-ghayr).
    WithOthers,
    /// Sisters made residuary by female descendants (asaba ma'al-ghayr).
    AlongsideDaughters,
    /// The grandfather pooled with full or consanguine siblings.
    GrandfatherWithSiblings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResiduaryClass {
    pub members: Vec<HeirType>,
    pub kind: ResiduaryKind,
}

impl ResiduaryClass {
    pub fn contains(&self, heir: HeirType) -> bool {
        self.members.contains(&heir)
    }

    fn of(heirs: &HeirsData, male: HeirType, female: Option<HeirType>) -> Self {
        let mut members = vec![male];
        match female {
            Some(f) if heirs.is_present(f) => {
                members.push(f);
                ResiduaryClass {
                    members,
                    kind: ResiduaryKind::WithOthers,
                }
            }
            _ => ResiduaryClass {
                members,
                kind: ResiduaryKind::ByThemselves,
            },
        }
    }
}

/// The nearest agnatic class present in `heirs`, if any.
pub fn residuary_class(heirs: &HeirsData, rules: &MadhhabRuleSet) -> Option<ResiduaryClass> {
    use HeirType::*;

    let female_descendants = heirs.any_present(&HeirType::FEMALE_DESCENDANTS);
    let alongside = |sister: HeirType| ResiduaryClass {
        members: vec![sister],
        kind: ResiduaryKind::AlongsideDaughters,
    };

    if heirs.is_present(Son) {
        return Some(ResiduaryClass::of(heirs, Son, Some(Daughter)));
    }
    if heirs.is_present(Grandson) {
        return Some(ResiduaryClass::of(heirs, Grandson, Some(Granddaughter)));
    }
    if heirs.is_present(Father) {
        return Some(ResiduaryClass::of(heirs, Father, None));
    }
    if heirs.is_present(Grandfather) {
        let pooled = match rules.grandfather_with_siblings {
            GrandfatherPolicy::Share if heirs.any_present(&[FullBrother, FullSister]) => {
                vec![FullBrother, FullSister]
            }
            GrandfatherPolicy::Share if heirs.any_present(&[PaternalBrother, PaternalSister]) => {
                vec![PaternalBrother, PaternalSister]
            }
            _ => Vec::new(),
        };
        if pooled.is_empty() {
            return Some(ResiduaryClass::of(heirs, Grandfather, None));
        }
        let mut members = vec![Grandfather];
        members.extend(pooled.into_iter().filter(|h| heirs.is_present(*h)));
        return Some(ResiduaryClass {
            members,
            kind: ResiduaryKind::GrandfatherWithSiblings,
        });
    }
    if heirs.is_present(FullBrother) {
        return Some(ResiduaryClass::of(heirs, FullBrother, Some(FullSister)));
    }
    if heirs.is_present(FullSister) && female_descendants {
        return Some(alongside(FullSister));
    }
    if heirs.is_present(PaternalBrother) {
        return Some(ResiduaryClass::of(heirs, PaternalBrother, Some(PaternalSister)));
    }
    if heirs.is_present(PaternalSister) && female_descendants {
        return Some(alongside(PaternalSister));
    }
    HeirType::REMOTE_AGNATES
        .into_iter()
        .find(|h| heirs.is_present(*h))
        .map(|h| ResiduaryClass::of(heirs, h, None))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResiduaryOutcome {
    /// Members that received a non-zero residuary fraction.
    pub absorbed_by: Vec<HeirType>,
    /// Residual left for radd; zero whenever a class exists.
    pub unassigned: Fraction,
    /// Full siblings were admitted to the uterine third.
    pub shared_uterine_third: bool,
}

impl ResiduaryOutcome {
    /// Whether a residuary class took (or was entitled to) the residual.
    pub fn absorbed(&self) -> bool {
        self.unassigned.is_zero()
    }
}

fn weight(heir: HeirType) -> i64 {
    if heir.is_male() {
        2
    } else {
        1
    }
}

fn weighted_heads(members: &[HeirType], heirs: &HeirsData) -> i64 {
    members
        .iter()
        .map(|h| weight(*h) * i64::from(heirs.count(*h)))
        .sum()
}

/// Split `amount` among `members` by head weight, adding to their residuary part.
fn split_by_weight(
    shares: &mut ShareMap,
    amount: Fraction,
    members: &[HeirType],
    heirs: &HeirsData,
) -> Result<(), ArithmeticError> {
    let total = weighted_heads(members, heirs);
    if total == 0 || amount.is_zero() {
        return Ok(());
    }
    for &heir in members {
        let part = amount
            .mul_int(weight(heir) * i64::from(heirs.count(heir)))?
            .div_int(total)?;
        let entry = shares.entry(heir).or_default();
        entry.residuary = entry.residuary.checked_add(&part)?;
    }
    Ok(())
}

/// The grandfather's portion beside siblings: the best of an equal
/// brother's portion, a third of the residual, or a sixth of the estate.
fn grandfather_portion(
    residual: Fraction,
    class: &ResiduaryClass,
    heirs: &HeirsData,
) -> Result<Fraction, ArithmeticError> {
    let sixth = Fraction::new(1, 6)?;
    let muqasama = residual
        .mul_int(weight(HeirType::Grandfather))?
        .div_int(weighted_heads(&class.members, heirs))?;
    let third_of_residual = residual.div_int(3)?;
    Ok(muqasama.max(third_of_residual).max(sixth))
}

/// Assign `residual` to the class, then apply the shared uterine third
/// when the rule set allows it.
pub fn distribute_residual(
    shares: &mut ShareMap,
    residual: Fraction,
    class: Option<&ResiduaryClass>,
    heirs: &HeirsData,
    rules: &MadhhabRuleSet,
) -> Result<ResiduaryOutcome, ArithmeticError> {
    let Some(class) = class else {
        debug!(residual = %residual, "no residuary heir");
        return Ok(ResiduaryOutcome {
            absorbed_by: Vec::new(),
            unassigned: residual,
            shared_uterine_third: false,
        });
    };

    if class.kind == ResiduaryKind::GrandfatherWithSiblings {
        let portion = grandfather_portion(residual, class, heirs)?;
        let entry = shares.entry(HeirType::Grandfather).or_default();
        entry.residuary = entry.residuary.checked_add(&portion)?;
        // a residual at or below a sixth leaves the siblings nothing
        let rest = residual.checked_sub(&portion)?.max(Fraction::ZERO);
        split_by_weight(shares, rest, &class.members[1..], heirs)?;
    } else {
        split_by_weight(shares, residual, &class.members, heirs)?;
    }

    let shared_uterine_third = share_uterine_third(shares, residual, class, heirs, rules)?;
    let absorbed_by = class
        .members
        .iter()
        .copied()
        .filter(|h| shares.get(h).is_some_and(|a| a.residuary.is_positive()))
        .collect();
    debug!(kind = ?class.kind, residual = %residual, "residual distributed");
    Ok(ResiduaryOutcome {
        absorbed_by,
        unassigned: Fraction::ZERO,
        shared_uterine_third,
    })
}

/// Mushtarakah: full siblings left with nothing by the fixed shares join
/// the uterine siblings and the third is split equally per head.
fn share_uterine_third(
    shares: &mut ShareMap,
    residual: Fraction,
    class: &ResiduaryClass,
    heirs: &HeirsData,
    rules: &MadhhabRuleSet,
) -> Result<bool, ArithmeticError> {
    use HeirType::*;

    if !rules.shared_uterine_third || !residual.is_zero() || !class.contains(FullBrother) {
        return Ok(false);
    }
    let uterine: Vec<HeirType> = HeirType::UTERINE_SIBLINGS
        .into_iter()
        .filter(|h| shares.contains_key(h))
        .collect();
    if uterine.is_empty() {
        return Ok(false);
    }
    let pool = uterine.iter().try_fold(Fraction::ZERO, |acc, h| {
        acc.checked_add(&shares.get(h).map(|a| a.fixed).unwrap_or_default())
    })?;
    let sharers: Vec<HeirType> = uterine
        .into_iter()
        .chain([FullBrother, FullSister])
        .filter(|h| heirs.is_present(*h))
        .collect();
    let heads: i64 = sharers.iter().map(|h| i64::from(heirs.count(*h))).sum();
    for heir in sharers {
        let part = pool.mul_int(i64::from(heirs.count(heir)))?.div_int(heads)?;
        shares.insert(heir, Allocation::fixed(part));
    }
    debug!(pool = %pool, heads, "full siblings share the uterine third");
    Ok(true)
}
