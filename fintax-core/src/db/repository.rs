use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    FinancialEntry, FinancialEntryRecord, OtherEntry, OtherEntryRecord, ProgressiveBracket,
    TaxPolicy,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Durable storage for tax policies and the user's income entries.
///
/// The estimator never talks to this trait; callers load entries through it
/// and hand plain slices to the calculation.
#[async_trait]
pub trait IncomeRepository: Send + Sync {
    // Tax policy
    async fn get_tax_policy(&self, tax_year: i32) -> Result<TaxPolicy, RepositoryError>;
    async fn list_tax_years(&self) -> Result<Vec<i32>, RepositoryError>;

    /// Insert or replace the policy for `policy.tax_year`, brackets included.
    async fn save_tax_policy(&self, policy: &TaxPolicy) -> Result<(), RepositoryError>;

    // Progressive brackets
    async fn insert_progressive_bracket(
        &self,
        tax_year: i32,
        position: i32,
        bracket: &ProgressiveBracket,
    ) -> Result<(), RepositoryError>;

    async fn delete_progressive_brackets(&self, tax_year: i32) -> Result<(), RepositoryError>;

    // Financial income entries
    async fn add_financial_entry(
        &self,
        entry: &FinancialEntry,
    ) -> Result<FinancialEntryRecord, RepositoryError>;

    async fn list_financial_entries(&self) -> Result<Vec<FinancialEntryRecord>, RepositoryError>;

    async fn delete_financial_entry(&self, id: i64) -> Result<(), RepositoryError>;

    async fn clear_financial_entries(&self) -> Result<(), RepositoryError>;

    // Other income entries
    async fn add_other_entry(
        &self,
        entry: &OtherEntry,
    ) -> Result<OtherEntryRecord, RepositoryError>;

    async fn list_other_entries(&self) -> Result<Vec<OtherEntryRecord>, RepositoryError>;

    async fn delete_other_entry(&self, id: i64) -> Result<(), RepositoryError>;

    async fn clear_other_entries(&self) -> Result<(), RepositoryError>;
}
