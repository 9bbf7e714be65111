//! Financial-income tax estimate (금융소득 종합과세).
//!
//! Interest and dividends are withheld at a flat rate. Once a year's
//! financial income passes the threshold, the excess is added to other
//! taxable income and taxed on the progressive schedule, and the taxpayer
//! owes the larger of that and flat tax on the excess (비교과세).
//!
//! # Steps
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Financial total (sum of entry amounts) |
//! | 2    | Other total (sum of revenue less expense) |
//! | 3    | Within threshold: flat rate on the whole financial total, done |
//! | 4a   | Over threshold: flat rate on the threshold amount |
//! | 4b   | Excess = financial total - threshold |
//! | 4c   | Schedule tax on (other total + excess) |
//! | 4d   | Schedule tax on other total alone |
//! | 4e   | Differential = 4c - 4d |
//! | 4f   | Progressive tax = max(4e × surcharge, excess × flat rate) |
//! | 5    | Total = separate tax + progressive tax |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use fintax_core::calculations::FinancialIncomeTaxEstimator;
//! use fintax_core::{FinancialEntry, IncomeKind, TaxMethod, TaxPolicy};
//!
//! let policy = TaxPolicy::default();
//! let estimator = FinancialIncomeTaxEstimator::new(&policy);
//!
//! let financial = vec![FinancialEntry::new(IncomeKind::Dividend, "ETF", dec!(30000000))];
//! let breakdown = estimator.calculate(&financial, &[]).unwrap();
//!
//! assert_eq!(breakdown.separate_tax, dec!(3080000));
//! assert_eq!(breakdown.progressive_tax, dec!(1540000));
//! assert_eq!(breakdown.total_tax, dec!(4620000));
//! assert_eq!(breakdown.method, TaxMethod::FlatFloor);
//! ```

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use crate::calculations::common::checked_sum;
use crate::models::{
    EntryError, FinancialEntry, OtherEntry, PolicyError, TaxBreakdown, TaxMethod, TaxPolicy,
};

/// Errors that can occur during a financial-income estimate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EstimatorError {
    #[error("invalid tax policy: {0}")]
    InvalidPolicy(#[from] PolicyError),

    #[error("invalid financial entry at index {index}: {source}")]
    InvalidFinancialEntry {
        index: usize,
        #[source]
        source: EntryError,
    },

    #[error("invalid other-income entry at index {index}: {source}")]
    InvalidOtherEntry {
        index: usize,
        #[source]
        source: EntryError,
    },

    /// No bracket covers the amount. Only reachable with an unvalidated policy.
    #[error("no progressive bracket found for {0}")]
    NoMatchingBracket(Decimal),

    #[error("arithmetic overflow while computing {0}")]
    Overflow(&'static str),
}

/// Estimator over a borrowed tax policy.
///
/// Holds no state of its own; every call recomputes from the inputs.
#[derive(Debug, Clone, Copy)]
pub struct FinancialIncomeTaxEstimator<'a> {
    policy: &'a TaxPolicy,
}

impl<'a> FinancialIncomeTaxEstimator<'a> {
    pub fn new(policy: &'a TaxPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &TaxPolicy {
        self.policy
    }

    /// Computes the tax breakdown for one year's entries.
    ///
    /// Entry order does not matter and duplicates are summed.
    ///
    /// # Errors
    ///
    /// Returns [`EstimatorError`] if:
    /// - the policy fails [`TaxPolicy::validate`]
    /// - any entry has a negative amount, revenue or expense, or an expense
    ///   above its revenue (the first offending index is reported)
    /// - an intermediate value overflows
    pub fn calculate(
        &self,
        financial_entries: &[FinancialEntry],
        other_entries: &[OtherEntry],
    ) -> Result<TaxBreakdown, EstimatorError> {
        self.policy.validate()?;
        validate_entries(financial_entries, other_entries)?;

        let financial_total = self.financial_total(financial_entries)?;
        let other_total = self.other_total(other_entries)?;

        let breakdown = if financial_total <= self.policy.threshold {
            self.separate_only(financial_total, other_total)?
        } else {
            self.comprehensive(financial_total, other_total)?
        };

        debug!(
            financial_total = %breakdown.financial_income_total,
            other_total = %breakdown.other_income_total,
            total_tax = %breakdown.total_tax,
            method = ?breakdown.method,
            "financial income tax estimated"
        );

        Ok(breakdown)
    }

    /// Schedule tax for `amount`: the first bracket (ascending) whose upper
    /// bound is at least `amount`, giving `amount * rate - deduction`.
    ///
    /// Amounts at or below zero use the first bracket and are not clamped.
    pub fn bracket_tax(
        &self,
        amount: Decimal,
    ) -> Result<Decimal, EstimatorError> {
        let bracket = self
            .policy
            .brackets
            .iter()
            .find(|b| b.contains(amount))
            .ok_or(EstimatorError::NoMatchingBracket(amount))?;

        bracket
            .tax_for(amount)
            .ok_or(EstimatorError::Overflow("bracket tax"))
    }

    fn financial_total(
        &self,
        entries: &[FinancialEntry],
    ) -> Result<Decimal, EstimatorError> {
        checked_sum(entries.iter().map(|e| e.amount))
            .ok_or(EstimatorError::Overflow("financial income total"))
    }

    fn other_total(
        &self,
        entries: &[OtherEntry],
    ) -> Result<Decimal, EstimatorError> {
        checked_sum(entries.iter().map(OtherEntry::net))
            .ok_or(EstimatorError::Overflow("other income total"))
    }

    fn flat_tax(
        &self,
        amount: Decimal,
        what: &'static str,
    ) -> Result<Decimal, EstimatorError> {
        amount
            .checked_mul(self.policy.flat_withholding_rate)
            .ok_or(EstimatorError::Overflow(what))
    }

    /// Step 3: everything is withheld at the flat rate.
    fn separate_only(
        &self,
        financial_total: Decimal,
        other_total: Decimal,
    ) -> Result<TaxBreakdown, EstimatorError> {
        let separate_tax = self.flat_tax(financial_total, "separate tax")?;

        Ok(TaxBreakdown {
            financial_income_total: financial_total,
            other_income_total: other_total,
            separate_tax,
            progressive_tax: Decimal::ZERO,
            total_tax: separate_tax,
            is_over_threshold: false,
            excess: Decimal::ZERO,
            taxable_comprehensive: Decimal::ZERO,
            method: TaxMethod::Separate,
        })
    }

    /// Step 4: flat rate up to the threshold, comparison tax on the excess.
    fn comprehensive(
        &self,
        financial_total: Decimal,
        other_total: Decimal,
    ) -> Result<TaxBreakdown, EstimatorError> {
        let separate_tax = self.flat_tax(self.policy.threshold, "separate tax")?;
        let excess = financial_total - self.policy.threshold;
        let taxable_comprehensive = other_total
            .checked_add(excess)
            .ok_or(EstimatorError::Overflow("comprehensive taxable income"))?;

        let raw_tax = self.bracket_tax(taxable_comprehensive)?;
        let other_only_tax = self.bracket_tax(other_total)?;
        let differential = raw_tax
            .checked_sub(other_only_tax)
            .ok_or(EstimatorError::Overflow("differential tax"))?;

        let surcharged = differential
            .checked_mul(self.policy.comprehensive_surcharge_rate)
            .ok_or(EstimatorError::Overflow("surcharged differential"))?;
        let floor = self.flat_tax(excess, "flat tax on excess")?;

        // Ties go to the comprehensive computation; the amount is the same.
        let (progressive_tax, method) = if surcharged >= floor {
            (surcharged, TaxMethod::Comprehensive)
        } else {
            (floor, TaxMethod::FlatFloor)
        };

        let total_tax = separate_tax
            .checked_add(progressive_tax)
            .ok_or(EstimatorError::Overflow("total tax"))?;

        Ok(TaxBreakdown {
            financial_income_total: financial_total,
            other_income_total: other_total,
            separate_tax,
            progressive_tax,
            total_tax,
            is_over_threshold: true,
            excess,
            taxable_comprehensive,
            method,
        })
    }
}

fn validate_entries(
    financial_entries: &[FinancialEntry],
    other_entries: &[OtherEntry],
) -> Result<(), EstimatorError> {
    for (index, entry) in financial_entries.iter().enumerate() {
        entry
            .validate()
            .map_err(|source| EstimatorError::InvalidFinancialEntry { index, source })?;
    }
    for (index, entry) in other_entries.iter().enumerate() {
        entry
            .validate()
            .map_err(|source| EstimatorError::InvalidOtherEntry { index, source })?;
    }
    Ok(())
}
