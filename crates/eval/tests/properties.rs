//! Property tests over random families and estates.

use mirath_core::{EstateData, Fraction, HeirType, HeirsData, Madhab, MadhhabRuleSet};
use mirath_eval::{apply_hijab, Engine};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Sparse head counts over all categories, respecting the per-category
/// limits, with at most one kind of spouse and at least one heir.
fn family() -> impl Strategy<Value = HeirsData> {
    prop::collection::vec(
        prop_oneof![3 => Just(0u32), 1 => 1u32..=4],
        HeirType::ALL.len(),
    )
    .prop_map(|counts| {
        let mut heirs: HeirsData = HeirType::ALL
            .iter()
            .zip(counts)
            .map(|(heir, count)| (*heir, heir.max_count().map_or(count, |max| count.min(max))))
            .collect();
        if heirs.is_present(HeirType::Husband) {
            heirs.set(HeirType::Wife, 0);
        }
        if heirs.is_empty() {
            heirs.set(HeirType::FullUncle, 1);
        }
        heirs
    })
}

/// Gross estate in minor units with deductions never exceeding it.
fn estate() -> impl Strategy<Value = EstateData> {
    (1i64..10_000_000_000)
        .prop_flat_map(|total| (Just(total), 0..=total, 0u8..=3))
        .prop_map(|(total, deducted, split)| {
            let total_d = Decimal::new(total, 2);
            let deducted_d = Decimal::new(deducted, 2);
            let estate = EstateData::new(total_d);
            match split {
                0 => estate,
                1 => estate.with_debts(deducted_d),
                2 => estate.with_bequest(deducted_d),
                _ => estate.with_funeral_costs(deducted_d),
            }
        })
}

fn madhab() -> impl Strategy<Value = Madhab> {
    prop::sample::select(Madhab::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    /// Invariant: every valid input succeeds, the fractions sum to exactly
    /// one and the amounts to exactly the net estate.
    #[test]
    fn shares_cover_the_whole_estate(heirs in family(), estate in estate(), madhab in madhab()) {
        let engine = Engine::classical();
        let result = engine.calculate_with(madhab, &estate, &heirs);
        prop_assert!(result.success, "{:?} {:?}: {:?}", madhab, heirs, result.error);
        prop_assert_eq!(result.total_fraction().unwrap(), Fraction::ONE);
        let net = estate.net_estate().unwrap();
        prop_assert_eq!(result.total_amount(), net);
        prop_assert_eq!(result.net_estate, Some(net));
    }

    /// Invariant: awl and radd never fire together.
    #[test]
    fn awl_and_radd_are_exclusive(heirs in family(), madhab in madhab()) {
        let result = Engine::classical().calculate_with(madhab, &EstateData::new(Decimal::ONE_HUNDRED), &heirs);
        prop_assert!(!(result.awl_applied && result.radd_applied));
        prop_assert!((0.0..=1.0).contains(&result.confidence));
    }

    /// Invariant: every fraction is in lowest terms with a positive denominator.
    #[test]
    fn fractions_are_reduced(heirs in family(), madhab in madhab()) {
        let result = Engine::classical().calculate_with(madhab, &EstateData::new(Decimal::ONE_HUNDRED), &heirs);
        for share in &result.shares {
            prop_assert!(share.fraction.is_reduced());
            prop_assert!(share.fraction.is_positive());
            prop_assert!(share.per_head().unwrap().is_reduced());
        }
    }

    /// Invariant: hijab applied to its own output excludes nothing more.
    #[test]
    fn hijab_is_idempotent(heirs in family(), madhab in madhab()) {
        let rules = MadhhabRuleSet::classical(madhab);
        let once = apply_hijab(&heirs, &rules);
        let twice = apply_hijab(&once.filtered, &rules);
        prop_assert_eq!(&twice.filtered, &once.filtered);
        prop_assert!(twice.exclusions.is_empty());
    }

    /// Invariant: an excluded heir never appears among the shares.
    #[test]
    fn blocked_heirs_receive_nothing(heirs in family(), madhab in madhab()) {
        let result = Engine::classical().calculate_with(madhab, &EstateData::new(Decimal::ONE_HUNDRED), &heirs);
        for heir in &result.blocked_heirs {
            prop_assert!(result.share(*heir).is_none());
            prop_assert!(heirs.is_present(*heir));
        }
    }

    /// Invariant: fraction arithmetic always yields reduced values.
    #[test]
    fn fraction_operations_stay_reduced(
        a in -1000i64..1000, b in 1i64..1000, c in -1000i64..1000, d in 1i64..1000,
    ) {
        let x = Fraction::new(a, b).unwrap();
        let y = Fraction::new(c, d).unwrap();
        prop_assert!(x.checked_add(&y).unwrap().is_reduced());
        prop_assert!(x.checked_sub(&y).unwrap().is_reduced());
        prop_assert!(x.checked_mul(&y).unwrap().is_reduced());
        if !y.is_zero() {
            let q = x.checked_div(&y).unwrap();
            prop_assert!(q.is_reduced());
            prop_assert_eq!(q.checked_mul(&y).unwrap(), x);
        }
    }
}
