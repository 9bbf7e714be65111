use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::EntryError;

/// Other taxable income (freelance, business) with its necessary expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherEntry {
    pub description: String,
    pub revenue: Decimal,
    pub expense: Decimal,
}

impl OtherEntry {
    pub fn new(
        description: impl Into<String>,
        revenue: Decimal,
        expense: Decimal,
    ) -> Self {
        Self {
            description: description.into(),
            revenue,
            expense,
        }
    }

    /// Revenue less expense.
    pub fn net(&self) -> Decimal {
        self.revenue - self.expense
    }

    pub fn validate(&self) -> Result<(), EntryError> {
        if self.revenue < Decimal::ZERO {
            return Err(EntryError::NegativeRevenue(self.revenue));
        }
        if self.expense < Decimal::ZERO {
            return Err(EntryError::NegativeExpense(self.expense));
        }
        if self.expense > self.revenue {
            return Err(EntryError::ExpenseExceedsRevenue {
                revenue: self.revenue,
                expense: self.expense,
            });
        }
        Ok(())
    }
}

/// An other-income entry as stored by a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherEntryRecord {
    pub id: i64,
    #[serde(flatten)]
    pub entry: OtherEntry,
    pub created_at: DateTime<Utc>,
}
