//! Tax calculations over recorded income.
//!
//! The estimator here is a pure function of its inputs: it reads the policy
//! and the entry slices it is handed and returns a fresh breakdown.

pub mod common;
pub mod dividend;
pub mod financial_income;

pub use dividend::{
    DOMESTIC_DIVIDEND_RATE_PERCENT, DividendCalculation, DividendError, calculate_dividend,
};
pub use financial_income::{EstimatorError, FinancialIncomeTaxEstimator};
