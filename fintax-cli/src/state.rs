use fintax_core::calculations::{EstimatorError, FinancialIncomeTaxEstimator};
use fintax_core::{
    FinancialEntry, FinancialEntryRecord, IncomeRepository, OtherEntry, OtherEntryRecord,
    RepositoryError, TaxBreakdown, TaxPolicy,
};
use fintax_data::ImportedEntries;
use tracing::info;

/// The user's income entries, mirrored from the store.
///
/// Lists are loaded once up front. Every mutation goes to the store first
/// and only touches the in-memory copy once the store has accepted it.
pub struct IncomeBook<'a> {
    repo: &'a dyn IncomeRepository,
    financial: Vec<FinancialEntryRecord>,
    other: Vec<OtherEntryRecord>,
}

impl<'a> IncomeBook<'a> {
    pub async fn load(repo: &'a dyn IncomeRepository) -> Result<Self, RepositoryError> {
        let financial = repo.list_financial_entries().await?;
        let other = repo.list_other_entries().await?;
        tracing::debug!(
            financial = financial.len(),
            other = other.len(),
            "income book loaded"
        );
        Ok(Self {
            repo,
            financial,
            other,
        })
    }

    pub fn financial(&self) -> &[FinancialEntryRecord] {
        &self.financial
    }

    pub fn other(&self) -> &[OtherEntryRecord] {
        &self.other
    }

    pub fn is_empty(&self) -> bool {
        self.financial.is_empty() && self.other.is_empty()
    }

    pub async fn add_financial(
        &mut self,
        entry: &FinancialEntry,
    ) -> Result<FinancialEntryRecord, RepositoryError> {
        let record = self.repo.add_financial_entry(entry).await?;
        info!(id = record.id, kind = record.entry.kind.as_str(), "financial entry added");
        self.financial.push(record.clone());
        Ok(record)
    }

    pub async fn add_other(
        &mut self,
        entry: &OtherEntry,
    ) -> Result<OtherEntryRecord, RepositoryError> {
        let record = self.repo.add_other_entry(entry).await?;
        info!(id = record.id, "other entry added");
        self.other.push(record.clone());
        Ok(record)
    }

    pub async fn remove_financial(
        &mut self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        self.repo.delete_financial_entry(id).await?;
        self.financial.retain(|record| record.id != id);
        Ok(())
    }

    pub async fn remove_other(
        &mut self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        self.repo.delete_other_entry(id).await?;
        self.other.retain(|record| record.id != id);
        Ok(())
    }

    /// Removes every entry of both kinds.
    pub async fn clear(&mut self) -> Result<(), RepositoryError> {
        self.repo.clear_financial_entries().await?;
        self.financial.clear();
        self.repo.clear_other_entries().await?;
        self.other.clear();
        info!("income book cleared");
        Ok(())
    }

    /// Appends every imported entry and returns how many were stored.
    ///
    /// Stops at the first store failure; entries stored before it stay.
    pub async fn import(
        &mut self,
        imported: &ImportedEntries,
    ) -> Result<usize, RepositoryError> {
        for entry in &imported.financial {
            self.add_financial(entry).await?;
        }
        for entry in &imported.other {
            self.add_other(entry).await?;
        }
        Ok(imported.len())
    }

    /// Runs the estimator over the current lists.
    pub fn estimate(
        &self,
        policy: &TaxPolicy,
    ) -> Result<TaxBreakdown, EstimatorError> {
        let financial: Vec<FinancialEntry> =
            self.financial.iter().map(|r| r.entry.clone()).collect();
        let other: Vec<OtherEntry> = self.other.iter().map(|r| r.entry.clone()).collect();

        FinancialIncomeTaxEstimator::new(policy).calculate(&financial, &other)
    }
}
