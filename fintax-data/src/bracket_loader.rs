use std::collections::BTreeMap;
use std::io::Read;

use fintax_core::{IncomeRepository, PolicyError, ProgressiveBracket, RepositoryError};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading progressive bracket data.
#[derive(Debug, Error)]
pub enum ProgressiveBracketLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid bracket schedule for tax year {tax_year}: {source}")]
    InvalidSchedule {
        tax_year: i32,
        #[source]
        source: PolicyError,
    },

    #[error("Tax year {0} not found in database (have you run the seeds?)")]
    TaxYearNotFound(i32),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for ProgressiveBracketLoaderError {
    fn from(err: csv::Error) -> Self {
        ProgressiveBracketLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from the progressive brackets CSV file.
///
/// - `tax_year`: the tax year the row belongs to (e.g. 2025)
/// - `upper_bound`: inclusive upper bound in won; empty for the top bracket
/// - `rate`: marginal rate as a decimal (e.g. `0.15`)
/// - `cumulative_deduction`: amount subtracted from `amount * rate`
///
/// Rows for one year must appear lowest bracket first.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProgressiveBracketRecord {
    pub tax_year: i32,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
    pub cumulative_deduction: Decimal,
}

impl ProgressiveBracketRecord {
    pub fn to_bracket(&self) -> ProgressiveBracket {
        ProgressiveBracket::new(self.upper_bound, self.rate, self.cumulative_deduction)
    }
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Loads progressive bracket schedules from CSV through any
/// [`IncomeRepository`].
pub struct ProgressiveBracketLoader;

impl ProgressiveBracketLoader {
    /// Parse bracket records from a CSV reader, in file order.
    pub fn parse<R: Read>(
        reader: R,
    ) -> Result<Vec<ProgressiveBracketRecord>, ProgressiveBracketLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: ProgressiveBracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Replace the bracket schedule of every tax year present in `records`.
    ///
    /// Each year's policy row must already exist. Every year's new schedule
    /// is checked against its stored rates before anything is written, so a
    /// bad schedule for one year leaves all years untouched. Existing
    /// brackets are then deleted and the new ones inserted in file order,
    /// which makes repeated loads of the same file idempotent.
    ///
    /// Returns the number of bracket rows inserted.
    pub async fn load<R: IncomeRepository + ?Sized>(
        repo: &R,
        records: &[ProgressiveBracketRecord],
    ) -> Result<usize, ProgressiveBracketLoaderError> {
        let mut groups: BTreeMap<i32, Vec<ProgressiveBracket>> = BTreeMap::new();
        for record in records {
            groups
                .entry(record.tax_year)
                .or_default()
                .push(record.to_bracket());
        }

        for (&tax_year, brackets) in &groups {
            let mut candidate = repo.get_tax_policy(tax_year).await.map_err(|e| match e {
                RepositoryError::NotFound => {
                    ProgressiveBracketLoaderError::TaxYearNotFound(tax_year)
                }
                other => ProgressiveBracketLoaderError::Repository(other),
            })?;
            candidate.brackets = brackets.clone();
            candidate.validate().map_err(|source| {
                ProgressiveBracketLoaderError::InvalidSchedule { tax_year, source }
            })?;
        }

        let mut inserted = 0;
        for (tax_year, brackets) in groups {
            repo.delete_progressive_brackets(tax_year).await?;

            for (position, bracket) in brackets.iter().enumerate() {
                repo.insert_progressive_bracket(tax_year, position as i32, bracket)
                    .await?;
                inserted += 1;
            }
            tracing::info!(tax_year, brackets = brackets.len(), "progressive brackets replaced");
        }

        Ok(inserted)
    }
}
