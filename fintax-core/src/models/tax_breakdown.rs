use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::TaxPolicy;
use crate::calculations::common::round_to_won;

/// Which computation produced the progressive portion of the bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxMethod {
    /// Financial income stayed within the threshold; flat withholding only.
    Separate,
    /// Surcharged progressive differential exceeded flat tax on the excess.
    Comprehensive,
    /// Flat tax on the excess was the larger amount (비교과세 floor).
    FlatFloor,
}

/// Result of a financial-income tax estimate. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    pub financial_income_total: Decimal,
    pub other_income_total: Decimal,

    /// 분리과세액: flat withholding on financial income up to the threshold.
    pub separate_tax: Decimal,

    /// 종합과세 추가분: additional tax once the threshold is exceeded.
    pub progressive_tax: Decimal,

    pub total_tax: Decimal,
    pub is_over_threshold: bool,

    /// Financial income above the threshold; zero when within it.
    pub excess: Decimal,

    /// Other income plus excess; zero when within the threshold.
    pub taxable_comprehensive: Decimal,

    pub method: TaxMethod,
}

impl TaxBreakdown {
    /// All-zero breakdown for empty input.
    pub fn zero() -> Self {
        Self {
            financial_income_total: Decimal::ZERO,
            other_income_total: Decimal::ZERO,
            separate_tax: Decimal::ZERO,
            progressive_tax: Decimal::ZERO,
            total_tax: Decimal::ZERO,
            is_over_threshold: false,
            excess: Decimal::ZERO,
            taxable_comprehensive: Decimal::ZERO,
            method: TaxMethod::Separate,
        }
    }

    /// Copy with every amount rounded to whole won, half away from zero.
    ///
    /// The total is re-derived from the rounded parts so the displayed
    /// figures always add up. If that sum does not fit, the original total
    /// is rounded instead.
    pub fn rounded_to_won(&self) -> Self {
        let separate_tax = round_to_won(self.separate_tax);
        let progressive_tax = round_to_won(self.progressive_tax);
        let total_tax = separate_tax
            .checked_add(progressive_tax)
            .unwrap_or_else(|| round_to_won(self.total_tax));

        Self {
            financial_income_total: round_to_won(self.financial_income_total),
            other_income_total: round_to_won(self.other_income_total),
            separate_tax,
            progressive_tax,
            total_tax,
            is_over_threshold: self.is_over_threshold,
            excess: round_to_won(self.excess),
            taxable_comprehensive: round_to_won(self.taxable_comprehensive),
            method: self.method,
        }
    }

    /// Financial income as a percentage of twice the threshold, capped at 100.
    /// The threshold itself sits at the 50% mark.
    ///
    /// A ratio too large to represent is off the scale and reads as full.
    pub fn threshold_gauge_percent(
        &self,
        policy: &TaxPolicy,
    ) -> Decimal {
        if policy.threshold <= Decimal::ZERO {
            return Decimal::ONE_HUNDRED;
        }
        let off_scale = if self.financial_income_total.is_sign_negative() {
            Decimal::ZERO
        } else {
            Decimal::ONE_HUNDRED
        };
        self.financial_income_total
            .checked_div(policy.threshold)
            .and_then(|ratio| ratio.checked_mul(Decimal::from(50)))
            .map_or(off_scale, |percent| percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED))
    }

    /// Financial income over the threshold can cost national health
    /// insurance dependent status.
    pub fn dependent_status_at_risk(&self) -> bool {
        self.is_over_threshold
    }
}
