//! Raw text input for new entries.
//!
//! A form holds exactly what the user typed. `validate` turns it into a
//! typed entry or the full list of problems, so nothing half-parsed ever
//! reaches the income book.

use fintax_core::{FinancialEntry, IncomeKind, OtherEntry};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::utils::parse_decimal;

/// Every problem found in one form, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", messages.join("; "))]
pub struct FormErrors {
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinancialEntryForm {
    /// `interest`, `dividend`, `이자` or `배당`. Empty means interest.
    pub kind: String,
    pub description: String,
    pub amount: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtherEntryForm {
    pub description: String,
    pub revenue: String,
    /// Empty means no expense.
    pub expense: String,
}

impl FinancialEntryForm {
    pub fn validate(&self) -> Result<FinancialEntry, FormErrors> {
        let mut errors = Vec::new();

        let kind = if self.kind.trim().is_empty() {
            Some(IncomeKind::default())
        } else {
            let parsed = IncomeKind::parse(&self.kind);
            if parsed.is_none() {
                errors.push(format!(
                    "Kind '{}' is not one of interest, dividend, 이자, 배당",
                    self.kind.trim()
                ));
            }
            parsed
        };
        let amount = parse_positive_won("Amount", &self.amount, &mut errors);

        match (kind, amount) {
            (Some(kind), Some(amount)) if errors.is_empty() => Ok(FinancialEntry::new(
                kind,
                self.description.trim(),
                amount,
            )),
            _ => Err(FormErrors { messages: errors }),
        }
    }
}

impl OtherEntryForm {
    pub fn validate(&self) -> Result<OtherEntry, FormErrors> {
        let mut errors = Vec::new();

        let revenue = parse_positive_won("Revenue", &self.revenue, &mut errors);
        let expense = parse_won("Expense", &self.expense, &mut errors);

        let (Some(revenue), Some(expense)) = (revenue, expense) else {
            return Err(FormErrors { messages: errors });
        };

        let entry = OtherEntry::new(self.description.trim(), revenue, expense);
        if let Err(e) = entry.validate() {
            errors.push(capitalize(&e.to_string()));
        }
        if errors.is_empty() {
            Ok(entry)
        } else {
            Err(FormErrors { messages: errors })
        }
    }
}

/// Required, greater than zero, whole won.
fn parse_positive_won(
    field: &str,
    value: &str,
    errors: &mut Vec<String>,
) -> Option<Decimal> {
    if value.trim().is_empty() {
        errors.push(format!("{field} is required"));
        return None;
    }
    let amount = parse_won(field, value, errors)?;
    if amount <= Decimal::ZERO {
        errors.push(format!("{field} must be greater than zero"));
        return None;
    }
    Some(amount)
}

/// Optional (empty is zero), non-negative, whole won.
fn parse_won(
    field: &str,
    value: &str,
    errors: &mut Vec<String>,
) -> Option<Decimal> {
    let Ok(amount) = parse_decimal(value) else {
        errors.push(format!("{field} must be a valid number"));
        return None;
    };
    if amount < Decimal::ZERO {
        errors.push(format!("{field} must not be negative"));
        return None;
    }
    if !amount.fract().is_zero() {
        errors.push(format!("{field} must be a whole number of won"));
        return None;
    }
    Some(amount)
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
