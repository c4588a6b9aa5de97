//! Monetary projection of the final fractions.
//!
//! All arithmetic uses `rust_decimal::Decimal` with
//! `RoundingStrategy::MidpointNearestEven`. Independent rounding can leave
//! the amounts a few minor units away from the net estate; the leftover is
//! added to the first share in canonical heir order so the amounts always
//! sum to the net estate exactly.

use std::collections::BTreeMap;

use mirath_core::{ArithmeticError, Fraction, HeirType};
use rust_decimal::{Decimal, RoundingStrategy};

/// `round(net * fraction, scale)` with overflow checking.
pub fn share_amount(net: Decimal, fraction: &Fraction, scale: u32) -> Result<Decimal, ArithmeticError> {
    let overflow = ArithmeticError::Overflow {
        operation: "amount conversion",
    };
    let scaled = net
        .checked_mul(Decimal::from(fraction.numerator()))
        .ok_or(overflow)?;
    let exact = scaled
        .checked_div(Decimal::from(fraction.denominator()))
        .ok_or(ArithmeticError::DivisionByZero)?;
    Ok(exact.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven))
}

/// Amount per heir; the rounding leftover lands on the first key.
pub fn finalize_amounts(
    net: Decimal,
    fractions: &BTreeMap<HeirType, Fraction>,
    scale: u32,
) -> Result<BTreeMap<HeirType, Decimal>, ArithmeticError> {
    let mut amounts = BTreeMap::new();
    let mut distributed = Decimal::ZERO;
    for (heir, fraction) in fractions {
        let amount = share_amount(net, fraction, scale)?;
        distributed = distributed.checked_add(amount).ok_or(ArithmeticError::Overflow {
            operation: "amount summation",
        })?;
        amounts.insert(*heir, amount);
    }

    let leftover = net - distributed;
    if let Some(first) = amounts.values_mut().next() {
        *first += leftover;
    }
    Ok(amounts)
}
