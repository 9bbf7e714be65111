use std::str::FromStr;

use fintax_core::RepositoryError;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, TypeInfo, ValueRef};

/// Read a decimal column.
///
/// Amounts are written as TEXT so they survive the round trip exactly, but
/// hand-edited databases may hold INTEGER or REAL values, so those are
/// accepted too. NULL reads as zero.
pub fn get_decimal(
    row: &SqliteRow,
    column: &str,
) -> Result<Decimal, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{}' not found: {}", column, e)))?;

    let type_name = value_ref.type_info().name().to_string();

    match type_name.as_str() {
        "TEXT" => {
            let text: String = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get TEXT from '{}': {}", column, e))
            })?;
            Decimal::from_str(text.trim()).map_err(|e| {
                RepositoryError::Database(format!(
                    "Column '{}' holds '{}', which is not a decimal: {}",
                    column, text, e
                ))
            })
        }
        "INTEGER" => {
            let val: i64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!(
                    "Failed to get INTEGER from '{}': {}",
                    column, e
                ))
            })?;
            Ok(Decimal::from(val))
        }
        "REAL" => {
            let val: f64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get REAL from '{}': {}", column, e))
            })?;
            Decimal::try_from(val).map_err(|e| {
                RepositoryError::Database(format!("Failed to convert {} to Decimal: {}", val, e))
            })
        }
        "NULL" => Ok(Decimal::ZERO),
        other => Err(RepositoryError::Database(format!(
            "Unexpected type '{}' for column '{}'",
            other, column
        ))),
    }
}

/// Like [`get_decimal`] but NULL reads as `None`.
pub fn get_optional_decimal(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<Decimal>, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{}' not found: {}", column, e)))?;

    if value_ref.is_null() {
        return Ok(None);
    }

    get_decimal(row, column).map(Some)
}

/// Storage form of a decimal.
pub fn decimal_to_text(d: Decimal) -> String {
    d.to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

    use super::*;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        sqlx::query(
            "CREATE TABLE test_decimals (
                id INTEGER PRIMARY KEY,
                int_value INTEGER,
                real_value REAL,
                text_value TEXT,
                blob_value BLOB
            )",
        )
        .execute(&pool)
        .await
        .expect("Failed to create test table");
        pool
    }

    async fn fetch(
        pool: &SqlitePool,
        insert: &str,
        column: &str,
    ) -> SqliteRow {
        sqlx::query(insert)
            .execute(pool)
            .await
            .expect("Failed to insert test data");
        sqlx::query(&format!("SELECT {column} FROM test_decimals WHERE id = 1"))
            .fetch_one(pool)
            .await
            .expect("Failed to fetch row")
    }

    // ===== get_decimal =====

    #[tokio::test]
    async fn test_get_decimal_from_text_is_exact() {
        let pool = setup_test_db().await;
        let row = fetch(
            &pool,
            "INSERT INTO test_decimals (id, text_value) VALUES (1, '0.154')",
            "text_value",
        )
        .await;

        assert_eq!(get_decimal(&row, "text_value"), Ok(dec!(0.154)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_text_trims_whitespace() {
        let pool = setup_test_db().await;
        let row = fetch(
            &pool,
            "INSERT INTO test_decimals (id, text_value) VALUES (1, ' 15440000 ')",
            "text_value",
        )
        .await;

        assert_eq!(get_decimal(&row, "text_value"), Ok(dec!(15440000)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_non_numeric_text() {
        let pool = setup_test_db().await;
        let row = fetch(
            &pool,
            "INSERT INTO test_decimals (id, text_value) VALUES (1, 'not a number')",
            "text_value",
        )
        .await;

        let result = get_decimal(&row, "text_value");

        assert!(matches!(
            result,
            Err(RepositoryError::Database(msg)) if msg.starts_with("Column 'text_value' holds 'not a number'")
        ));
    }

    #[tokio::test]
    async fn test_get_decimal_from_integer() {
        let pool = setup_test_db().await;
        let row = fetch(
            &pool,
            "INSERT INTO test_decimals (id, int_value) VALUES (1, -99999)",
            "int_value",
        )
        .await;

        assert_eq!(get_decimal(&row, "int_value"), Ok(dec!(-99999)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_real() {
        let pool = setup_test_db().await;
        let row = fetch(
            &pool,
            "INSERT INTO test_decimals (id, real_value) VALUES (1, 123.45)",
            "real_value",
        )
        .await;

        assert_eq!(get_decimal(&row, "real_value"), Ok(dec!(123.45)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_null_returns_zero() {
        let pool = setup_test_db().await;
        let row = fetch(
            &pool,
            "INSERT INTO test_decimals (id) VALUES (1)",
            "text_value",
        )
        .await;

        assert_eq!(get_decimal(&row, "text_value"), Ok(Decimal::ZERO));
    }

    #[tokio::test]
    async fn test_get_decimal_column_not_found() {
        let pool = setup_test_db().await;
        let row = fetch(&pool, "INSERT INTO test_decimals (id) VALUES (1)", "id").await;

        let result = get_decimal(&row, "nonexistent_column");

        assert!(matches!(
            result,
            Err(RepositoryError::Database(msg)) if msg.starts_with("Column 'nonexistent_column' not found:")
        ));
    }

    #[tokio::test]
    async fn test_get_decimal_unexpected_type() {
        let pool = setup_test_db().await;
        let row = fetch(
            &pool,
            "INSERT INTO test_decimals (id, blob_value) VALUES (1, X'00FF')",
            "blob_value",
        )
        .await;

        assert_eq!(
            get_decimal(&row, "blob_value"),
            Err(RepositoryError::Database(
                "Unexpected type 'BLOB' for column 'blob_value'".to_string()
            ))
        );
    }

    // ===== get_optional_decimal =====

    #[tokio::test]
    async fn test_get_optional_decimal_from_text() {
        let pool = setup_test_db().await;
        let row = fetch(
            &pool,
            "INSERT INTO test_decimals (id, text_value) VALUES (1, '88000000')",
            "text_value",
        )
        .await;

        assert_eq!(get_optional_decimal(&row, "text_value"), Ok(Some(dec!(88000000))));
    }

    #[tokio::test]
    async fn test_get_optional_decimal_from_null_returns_none() {
        let pool = setup_test_db().await;
        let row = fetch(
            &pool,
            "INSERT INTO test_decimals (id) VALUES (1)",
            "text_value",
        )
        .await;

        assert_eq!(get_optional_decimal(&row, "text_value"), Ok(None));
    }

    // ===== decimal_to_text =====

    #[test]
    fn test_decimal_to_text_keeps_scale() {
        assert_eq!(decimal_to_text(dec!(0.154)), "0.154");
        assert_eq!(decimal_to_text(dec!(1.10)), "1.10");
        assert_eq!(decimal_to_text(dec!(20000000)), "20000000");
        assert_eq!(decimal_to_text(dec!(-1.5)), "-1.5");
    }
}
