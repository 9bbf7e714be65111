//! Common utility functions for tax calculations.

use rust_decimal::Decimal;

/// Rounds a decimal value to whole won using half-up rounding.
///
/// Values at exactly .5 round away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use fintax_core::calculations::common::round_to_won;
///
/// assert_eq!(round_to_won(dec!(2310000.4)), dec!(2310000));
/// assert_eq!(round_to_won(dec!(2310000.5)), dec!(2310001));
/// assert_eq!(round_to_won(dec!(-0.5)), dec!(-1));
/// ```
pub fn round_to_won(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Sums values, returning `None` on overflow.
pub fn checked_sum<I>(values: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(value))
}
