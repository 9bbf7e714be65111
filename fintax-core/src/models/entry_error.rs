use rust_decimal::Decimal;
use thiserror::Error;

/// Reasons an income entry is rejected before it reaches the tax formulas.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error("negative amount {0}")]
    NegativeAmount(Decimal),

    #[error("negative revenue {0}")]
    NegativeRevenue(Decimal),

    #[error("negative expense {0}")]
    NegativeExpense(Decimal),

    #[error("expense {expense} exceeds revenue {revenue}")]
    ExpenseExceedsRevenue { revenue: Decimal, expense: Decimal },
}
