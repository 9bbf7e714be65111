//! Dividend income after withholding.
//!
//! Domestic dividends are withheld at 15.4%; overseas dividends at whatever
//! rate the paying country applies. The rate is taken in percent, the way it
//! appears on a brokerage statement.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Domestic dividend withholding rate, in percent.
pub const DOMESTIC_DIVIDEND_RATE_PERCENT: Decimal = dec!(15.4);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DividendError {
    #[error("share count must not be negative (got {0})")]
    NegativeShares(Decimal),

    #[error("dividend per share must not be negative (got {0})")]
    NegativePerShare(Decimal),

    #[error("withholding rate must be between 0 and 100 percent (got {0})")]
    RateOutOfRange(Decimal),

    #[error("arithmetic overflow computing the dividend")]
    Overflow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendCalculation {
    pub gross: Decimal,
    pub withholding: Decimal,
    pub net: Decimal,
}

pub fn calculate_dividend(
    shares: Decimal,
    per_share: Decimal,
    rate_percent: Decimal,
) -> Result<DividendCalculation, DividendError> {
    if shares < Decimal::ZERO {
        return Err(DividendError::NegativeShares(shares));
    }
    if per_share < Decimal::ZERO {
        return Err(DividendError::NegativePerShare(per_share));
    }
    if rate_percent < Decimal::ZERO || rate_percent > Decimal::ONE_HUNDRED {
        return Err(DividendError::RateOutOfRange(rate_percent));
    }

    let gross = shares.checked_mul(per_share).ok_or(DividendError::Overflow)?;
    let withholding = gross
        .checked_mul(rate_percent / Decimal::ONE_HUNDRED)
        .ok_or(DividendError::Overflow)?;

    Ok(DividendCalculation {
        gross,
        withholding,
        net: gross - withholding,
    })
}
