use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::EntryError;

/// Kind of financial income. Shown to the user, ignored by the calculation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncomeKind {
    #[default]
    Interest,
    Dividend,
}

impl IncomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interest => "interest",
            Self::Dividend => "dividend",
        }
    }

    /// Korean label, as printed on bank and brokerage statements.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Interest => "이자",
            Self::Dividend => "배당",
        }
    }

    /// Accepts the English code (any case) or the Korean label.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "이자" => Some(Self::Interest),
            "배당" => Some(Self::Dividend),
            other => match other.to_ascii_lowercase().as_str() {
                "interest" => Some(Self::Interest),
                "dividend" => Some(Self::Dividend),
                _ => None,
            },
        }
    }
}

/// One interest or dividend payment, in whole won.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialEntry {
    pub kind: IncomeKind,
    pub description: String,
    pub amount: Decimal,
}

impl FinancialEntry {
    pub fn new(
        kind: IncomeKind,
        description: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            kind,
            description: description.into(),
            amount,
        }
    }

    pub fn validate(&self) -> Result<(), EntryError> {
        if self.amount < Decimal::ZERO {
            return Err(EntryError::NegativeAmount(self.amount));
        }
        Ok(())
    }
}

/// A financial entry as stored by a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialEntryRecord {
    pub id: i64,
    #[serde(flatten)]
    pub entry: FinancialEntry,
    pub created_at: DateTime<Utc>,
}
