//! CSV import of income entries.
//!
//! ## CSV Format
//!
//! Headers are matched by name, so column order does not matter. Values are
//! trimmed.
//!
//! | Column        | Used by     | Type    | Notes                                   |
//! |---------------|-------------|---------|-----------------------------------------|
//! | `section`     | all rows    | string  | `financial` or `other`                  |
//! | `kind`        | `financial` | string  | `interest`/`dividend` (or `이자`/`배당`) |
//! | `description` | all rows    | string  | optional                                |
//! | `amount`      | `financial` | decimal | required                                |
//! | `revenue`     | `other`     | decimal | required                                |
//! | `expense`     | `other`     | decimal | empty means 0                           |
//!
//! ```csv
//! section,kind,description,amount,revenue,expense
//! financial,interest,savings,12000000,,
//! other,,lecturing,,30000000,12000000
//! ```
use std::path::{Path, PathBuf};

use fintax_core::{EntryError, FinancialEntry, IncomeKind, OtherEntry};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CsvRow {
    section: String,
    kind: Option<String>,
    description: Option<String>,
    amount: Option<Decimal>,
    revenue: Option<Decimal>,
    expense: Option<Decimal>,
}

/// Errors that can occur while importing entries from CSV.
///
/// Row numbers are 1-based and do not count the header.
#[derive(Debug, thiserror::Error)]
pub enum EntryCsvError {
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    #[error("unrecognised section '{section}' on row {row}")]
    InvalidSection { section: String, row: usize },

    #[error("unrecognised income kind '{kind}' on row {row}")]
    InvalidKind { kind: String, row: usize },

    #[error("missing '{field}' on row {row}")]
    MissingField { field: &'static str, row: usize },

    #[error("invalid entry on row {row}: {source}")]
    InvalidEntry {
        row: usize,
        #[source]
        source: EntryError,
    },

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Entries read from one CSV file, each list in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedEntries {
    pub financial: Vec<FinancialEntry>,
    pub other: Vec<OtherEntry>,
}

impl ImportedEntries {
    pub fn len(&self) -> usize {
        self.financial.len() + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.financial.is_empty() && self.other.is_empty()
    }
}

enum Converted {
    Financial(FinancialEntry),
    Other(OtherEntry),
}

fn convert_row(
    row: CsvRow,
    row_number: usize,
) -> Result<Converted, EntryCsvError> {
    let description = row.description.unwrap_or_default();

    match row.section.to_ascii_lowercase().as_str() {
        "financial" => {
            let kind_text = row.kind.ok_or(EntryCsvError::MissingField {
                field: "kind",
                row: row_number,
            })?;
            let kind = IncomeKind::parse(&kind_text).ok_or_else(|| EntryCsvError::InvalidKind {
                kind: kind_text.clone(),
                row: row_number,
            })?;
            let amount = row.amount.ok_or(EntryCsvError::MissingField {
                field: "amount",
                row: row_number,
            })?;

            let entry = FinancialEntry::new(kind, description, amount);
            entry.validate().map_err(|source| EntryCsvError::InvalidEntry {
                row: row_number,
                source,
            })?;
            Ok(Converted::Financial(entry))
        }
        "other" => {
            let revenue = row.revenue.ok_or(EntryCsvError::MissingField {
                field: "revenue",
                row: row_number,
            })?;
            let expense = row.expense.unwrap_or(Decimal::ZERO);

            let entry = OtherEntry::new(description, revenue, expense);
            entry.validate().map_err(|source| EntryCsvError::InvalidEntry {
                row: row_number,
                source,
            })?;
            Ok(Converted::Other(entry))
        }
        _ => Err(EntryCsvError::InvalidSection {
            section: row.section,
            row: row_number,
        }),
    }
}

/// Parse CSV text and split the rows into financial and other entries.
///
/// Stops at the first bad row.
pub fn load_from_str(input: &str) -> Result<ImportedEntries, EntryCsvError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(input.as_bytes());

    let mut imported = ImportedEntries::default();
    for (idx, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result?;
        match convert_row(row, idx + 1)? {
            Converted::Financial(entry) => imported.financial.push(entry),
            Converted::Other(entry) => imported.other.push(entry),
        }
    }

    tracing::debug!(
        financial = imported.financial.len(),
        other = imported.other.len(),
        "entries parsed from CSV"
    );
    Ok(imported)
}

/// Read a file from disk and delegate to [`load_from_str`].
pub fn load_from_file(path: &Path) -> Result<ImportedEntries, EntryCsvError> {
    let contents = std::fs::read_to_string(path).map_err(|source| EntryCsvError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents)
}
