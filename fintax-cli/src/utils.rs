use fintax_core::calculations::common::round_to_won;
use num_format::{Locale, ToFormattedString as _};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Error returned when a string cannot be parsed as a [`Decimal`].
#[derive(Debug, Error)]
#[error("invalid decimal '{input}': {source}")]
pub struct ParseDecimalError {
    input: String,
    #[source]
    source: rust_decimal::Error,
}

/// Trims whitespace and removes commas used as thousands separators.
fn normalize_decimal_input(s: &str) -> String {
    s.trim().replace(',', "")
}

/// Parses a string into a [`Decimal`].
///
/// Accepts `,` as a thousands separator (`"12,000,000"`). Empty or
/// whitespace-only input is 0.
pub fn parse_decimal(s: &str) -> Result<Decimal, ParseDecimalError> {
    let normalized = normalize_decimal_input(s);
    if normalized.is_empty() {
        return Ok(Decimal::ZERO);
    }
    normalized.parse().map_err(|e| {
        tracing::debug!(input = %s, "invalid decimal: {}", e);
        ParseDecimalError {
            input: s.to_string(),
            source: e,
        }
    })
}

/// Whole won with thousands separators, e.g. `4,620,000원`.
pub fn format_won(amount: Decimal) -> String {
    format!("{}원", group_integer(round_to_won(amount)))
}

/// Two-decimal amount with thousands separators, e.g. `1,234.50 USD`.
pub fn format_usd(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let cents = (rounded.fract().abs() * Decimal::ONE_HUNDRED)
        .to_u32()
        .unwrap_or_default();
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}{}.{:02} USD", sign, group_integer(rounded.trunc().abs()), cents)
}

/// A rate such as `0.154` rendered as `15.4%`. Rates too large to scale
/// are shown as the bare factor.
pub fn format_rate(rate: Decimal) -> String {
    match rate.checked_mul(Decimal::ONE_HUNDRED) {
        Some(percent) => format!("{}%", percent.normalize()),
        None => rate.normalize().to_string(),
    }
}

fn group_integer(value: Decimal) -> String {
    match value.trunc().to_i128() {
        Some(n) => n.to_formatted_string(&Locale::en),
        None => value.trunc().to_string(),
    }
}
