use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fintax_core::{
    FinancialEntry, FinancialEntryRecord, IncomeKind, IncomeRepository, OtherEntry,
    OtherEntryRecord, ProgressiveBracket, RepositoryError, TaxPolicy,
};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};

use crate::decimal::{decimal_to_text, get_decimal, get_optional_decimal};

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Connect to `database_url`, creating the database file if needed.
    ///
    /// Accepts sqlx URLs (`sqlite:fintax.db`), bare paths and `:memory:`.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Execute every `*.sql` file in `seeds_dir`, in filename order.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
            tracing::debug!(file = %path.display(), "seed file applied");
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn get_financial_entry(
        &self,
        id: i64,
    ) -> Result<FinancialEntryRecord, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, kind, description, amount, created_at FROM financial_entry WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?
        .ok_or(RepositoryError::NotFound)?;

        row_to_financial_entry(&row)
    }

    async fn get_other_entry(
        &self,
        id: i64,
    ) -> Result<OtherEntryRecord, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, description, revenue, expense, created_at FROM other_entry WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?
        .ok_or(RepositoryError::NotFound)?;

        row_to_other_entry(&row)
    }

    async fn delete_by_id(
        &self,
        table: &'static str,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", table))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tracing::info!(table, id, "entry deleted");
        Ok(())
    }

    async fn clear_table(
        &self,
        table: &'static str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(&format!("DELETE FROM {}", table))
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        tracing::info!(table, removed = result.rows_affected(), "entries cleared");
        Ok(())
    }
}

fn get_created_at(row: &SqliteRow) -> Result<DateTime<Utc>, RepositoryError> {
    row.try_get::<DateTime<Utc>, _>("created_at")
        .map_err(|e| RepositoryError::Database(format!("Failed to get created_at: {}", e)))
}

fn row_to_financial_entry(row: &SqliteRow) -> Result<FinancialEntryRecord, RepositoryError> {
    let kind_str: String = row
        .try_get("kind")
        .map_err(|e| RepositoryError::Database(e.to_string()))?;
    let kind = IncomeKind::parse(&kind_str)
        .ok_or_else(|| RepositoryError::Database(format!("Invalid income kind: {}", kind_str)))?;

    Ok(FinancialEntryRecord {
        id: row
            .try_get("id")
            .map_err(|e| RepositoryError::Database(e.to_string()))?,
        entry: FinancialEntry {
            kind,
            description: row
                .try_get("description")
                .map_err(|e| RepositoryError::Database(e.to_string()))?,
            amount: get_decimal(row, "amount")?,
        },
        created_at: get_created_at(row)?,
    })
}

fn row_to_other_entry(row: &SqliteRow) -> Result<OtherEntryRecord, RepositoryError> {
    Ok(OtherEntryRecord {
        id: row
            .try_get("id")
            .map_err(|e| RepositoryError::Database(e.to_string()))?,
        entry: OtherEntry {
            description: row
                .try_get("description")
                .map_err(|e| RepositoryError::Database(e.to_string()))?,
            revenue: get_decimal(row, "revenue")?,
            expense: get_decimal(row, "expense")?,
        },
        created_at: get_created_at(row)?,
    })
}

#[async_trait]
impl IncomeRepository for SqliteRepository {
    async fn get_tax_policy(
        &self,
        tax_year: i32,
    ) -> Result<TaxPolicy, RepositoryError> {
        let row = sqlx::query(
            "SELECT tax_year, flat_withholding_rate, comprehensive_surcharge_rate, threshold
             FROM tax_policy WHERE tax_year = ?",
        )
        .bind(tax_year)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?
        .ok_or(RepositoryError::NotFound)?;

        let bracket_rows = sqlx::query(
            "SELECT upper_bound, rate, cumulative_deduction
             FROM progressive_bracket
             WHERE tax_year = ?
             ORDER BY position",
        )
        .bind(tax_year)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let mut brackets = Vec::with_capacity(bracket_rows.len());
        for bracket_row in &bracket_rows {
            brackets.push(ProgressiveBracket {
                upper_bound: get_optional_decimal(bracket_row, "upper_bound")?,
                rate: get_decimal(bracket_row, "rate")?,
                cumulative_deduction: get_decimal(bracket_row, "cumulative_deduction")?,
            });
        }

        Ok(TaxPolicy {
            tax_year: row
                .try_get("tax_year")
                .map_err(|e| RepositoryError::Database(e.to_string()))?,
            flat_withholding_rate: get_decimal(&row, "flat_withholding_rate")?,
            comprehensive_surcharge_rate: get_decimal(&row, "comprehensive_surcharge_rate")?,
            threshold: get_decimal(&row, "threshold")?,
            brackets,
        })
    }

    async fn list_tax_years(&self) -> Result<Vec<i32>, RepositoryError> {
        let rows = sqlx::query("SELECT tax_year FROM tax_policy ORDER BY tax_year DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter()
            .map(|row| {
                row.try_get("tax_year")
                    .map_err(|e| RepositoryError::Database(e.to_string()))
            })
            .collect()
    }

    async fn save_tax_policy(
        &self,
        policy: &TaxPolicy,
    ) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        sqlx::query(
            "INSERT INTO tax_policy (tax_year, flat_withholding_rate, comprehensive_surcharge_rate, threshold)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (tax_year) DO UPDATE SET
                flat_withholding_rate = excluded.flat_withholding_rate,
                comprehensive_surcharge_rate = excluded.comprehensive_surcharge_rate,
                threshold = excluded.threshold",
        )
        .bind(policy.tax_year)
        .bind(decimal_to_text(policy.flat_withholding_rate))
        .bind(decimal_to_text(policy.comprehensive_surcharge_rate))
        .bind(decimal_to_text(policy.threshold))
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM progressive_bracket WHERE tax_year = ?")
            .bind(policy.tax_year)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        for (position, bracket) in policy.brackets.iter().enumerate() {
            sqlx::query(
                "INSERT INTO progressive_bracket (tax_year, position, upper_bound, rate, cumulative_deduction)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(policy.tax_year)
            .bind(position as i64)
            .bind(bracket.upper_bound.map(decimal_to_text))
            .bind(decimal_to_text(bracket.rate))
            .bind(decimal_to_text(bracket.cumulative_deduction))
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        tracing::info!(
            tax_year = policy.tax_year,
            brackets = policy.brackets.len(),
            "tax policy saved"
        );
        Ok(())
    }

    async fn insert_progressive_bracket(
        &self,
        tax_year: i32,
        position: i32,
        bracket: &ProgressiveBracket,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO progressive_bracket (tax_year, position, upper_bound, rate, cumulative_deduction)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(tax_year)
        .bind(position)
        .bind(bracket.upper_bound.map(decimal_to_text))
        .bind(decimal_to_text(bracket.rate))
        .bind(decimal_to_text(bracket.cumulative_deduction))
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(())
    }

    async fn delete_progressive_brackets(
        &self,
        tax_year: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM progressive_bracket WHERE tax_year = ?")
            .bind(tax_year)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(())
    }

    async fn add_financial_entry(
        &self,
        entry: &FinancialEntry,
    ) -> Result<FinancialEntryRecord, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO financial_entry (kind, description, amount, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(entry.kind.as_str())
        .bind(&entry.description)
        .bind(decimal_to_text(entry.amount))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let id = result.last_insert_rowid();
        tracing::info!(
            id,
            kind = entry.kind.as_str(),
            amount = %entry.amount,
            "financial entry added"
        );
        self.get_financial_entry(id).await
    }

    async fn list_financial_entries(&self) -> Result<Vec<FinancialEntryRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, kind, description, amount, created_at FROM financial_entry ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter().map(row_to_financial_entry).collect()
    }

    async fn delete_financial_entry(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        self.delete_by_id("financial_entry", id).await
    }

    async fn clear_financial_entries(&self) -> Result<(), RepositoryError> {
        self.clear_table("financial_entry").await
    }

    async fn add_other_entry(
        &self,
        entry: &OtherEntry,
    ) -> Result<OtherEntryRecord, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO other_entry (description, revenue, expense, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&entry.description)
        .bind(decimal_to_text(entry.revenue))
        .bind(decimal_to_text(entry.expense))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let id = result.last_insert_rowid();
        tracing::info!(id, revenue = %entry.revenue, expense = %entry.expense, "other entry added");
        self.get_other_entry(id).await
    }

    async fn list_other_entries(&self) -> Result<Vec<OtherEntryRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, description, revenue, expense, created_at FROM other_entry ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter().map(row_to_other_entry).collect()
    }

    async fn delete_other_entry(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        self.delete_by_id("other_entry", id).await
    }

    async fn clear_other_entries(&self) -> Result<(), RepositoryError> {
        self.clear_table("other_entry").await
    }
}
