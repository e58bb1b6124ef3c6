//! Read path against the companies database.
//!
//! Every call opens its own read-only connection and releases it when the
//! call returns, whatever the outcome. No pooling: ingestion may replace the
//! table between requests, and a held connection would pin the old file.

use crate::domain::error::{AppError, Result};
use crate::domain::query::ValidatedQuery;
use crate::domain::result_set::ResultSet;
use crate::domain::schema::{ColumnDescriptor, SchemaDescriptor};
use crate::infrastructure::config::DatabaseSettings;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column, ConnectOptions, Row};
use std::time::Duration;
use tracing::debug;

pub struct CompanyStore {
    settings: DatabaseSettings,
}

impl CompanyStore {
    pub fn new(settings: DatabaseSettings) -> Result<Self> {
        if !is_valid_identifier(&settings.table) {
            return Err(AppError::ExecutionError(format!(
                "Invalid table name: {}",
                settings.table
            )));
        }
        Ok(Self { settings })
    }

    pub fn table(&self) -> &str {
        &self.settings.table
    }

    async fn connect(&self) -> Result<SqliteConnection> {
        SqliteConnectOptions::new()
            .filename(&self.settings.path)
            .create_if_missing(false)
            .read_only(true)
            .busy_timeout(Duration::from_secs(self.settings.busy_timeout_secs))
            .connect()
            .await
            .map_err(|e| {
                AppError::StoreUnavailable(format!(
                    "Failed to open database at {}: {}",
                    self.settings.path, e
                ))
            })
    }

    /// Introspect the table's columns in declaration order.
    pub async fn fetch_schema(&self) -> Result<SchemaDescriptor> {
        let mut conn = self.connect().await?;

        let pragma = format!("PRAGMA table_info({})", self.settings.table);
        let rows = sqlx::query(&pragma)
            .fetch_all(&mut conn)
            .await
            .map_err(|e| {
                AppError::StoreUnavailable(format!(
                    "Failed to inspect {} schema: {}",
                    self.settings.table, e
                ))
            })?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get("name").map_err(|e| {
                AppError::StoreUnavailable(format!("Failed to read column name: {}", e))
            })?;
            let declared_type: String = row.try_get("type").map_err(|e| {
                AppError::StoreUnavailable(format!("Failed to read column type: {}", e))
            })?;
            columns.push(ColumnDescriptor {
                name,
                declared_type,
            });
        }

        if columns.is_empty() {
            return Err(AppError::SchemaEmpty(format!(
                "Table '{}' does not exist or has no columns",
                self.settings.table
            )));
        }

        Ok(SchemaDescriptor::new(columns))
    }

    /// Run a validated statement and return rows in store-native order.
    pub async fn execute(&self, query: &ValidatedQuery) -> Result<ResultSet> {
        let mut conn = self.connect().await?;

        debug!(sql = query.sql(), "Executing validated query");
        let rows = sqlx::query(query.sql())
            .fetch_all(&mut conn)
            .await
            .map_err(|e| AppError::ExecutionError(format!("Query execution failed: {}", e)))?;

        Ok(rows_to_result_set(&rows))
    }

    /// Coverage of the accounts due-date column, logged before date-range
    /// queries to make empty results explainable.
    pub async fn due_date_stats(&self) -> Result<ResultSet> {
        let sql = format!(
            "SELECT \
                MIN(date(AccountsNextDueDate)) AS min_date, \
                MAX(date(AccountsNextDueDate)) AS max_date, \
                COUNT(*) AS total_companies, \
                COUNT(AccountsNextDueDate) AS companies_with_due_date \
             FROM {} \
             WHERE AccountsNextDueDate IS NOT NULL AND AccountsNextDueDate != ''",
            self.settings.table
        );

        let mut conn = self.connect().await?;
        let rows = sqlx::query(&sql)
            .fetch_all(&mut conn)
            .await
            .map_err(|e| AppError::ExecutionError(format!("Due-date stats failed: {}", e)))?;

        Ok(rows_to_result_set(&rows))
    }
}

fn rows_to_result_set(rows: &[SqliteRow]) -> ResultSet {
    let mut columns: Vec<String> = Vec::new();
    let mut mapped: Vec<Map<String, Value>> = Vec::with_capacity(rows.len());

    for row in rows {
        if columns.is_empty() {
            columns = row.columns().iter().map(|c| c.name().to_string()).collect();
        }

        let mut record = Map::new();
        for (i, column) in row.columns().iter().enumerate() {
            record.insert(column.name().to_string(), extract_column_value(row, i));
        }
        mapped.push(record);
    }

    ResultSet {
        columns,
        rows: mapped,
    }
}

/// Decode a column as JSON without knowing its declared type. The companies
/// table is TEXT-heavy, so strings are tried first.
fn extract_column_value(row: &SqliteRow, index: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<String>, _>(index) {
        return v.map(Value::String).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return v.map(|n| Value::Number(n.into())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return v
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
        return v.map(Value::Bool).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDate>, _>(index) {
        return v
            .map(|d| Value::String(d.to_string()))
            .unwrap_or(Value::Null);
    }

    Value::Null
}

pub(crate) fn is_valid_identifier(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    let first = s.chars().next().unwrap();
    if !first.is_ascii_alphabetic() && first != '_' {
        return false;
    }
    s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::{CandidateQuery, QueryOrigin};
    use crate::application::use_cases::query_guard::{PrefixPolicy, SqlPolicy};

    fn temp_settings(name: &str) -> DatabaseSettings {
        DatabaseSettings {
            path: std::env::temp_dir()
                .join(name)
                .to_string_lossy()
                .to_string(),
            table: "companies".to_string(),
            busy_timeout_secs: 30,
        }
    }

    async fn seed(settings: &DatabaseSettings) {
        let mut conn = SqliteConnectOptions::new()
            .filename(&settings.path)
            .create_if_missing(true)
            .connect()
            .await
            .unwrap();
        sqlx::query("DROP TABLE IF EXISTS companies")
            .execute(&mut conn)
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE companies (\
                CompanyName TEXT, CompanyNumber TEXT, CompanyStatus TEXT)",
        )
        .execute(&mut conn)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO companies VALUES \
                ('ACME LTD', '01234567', 'Active'), \
                ('BOLT PLC', '07654321', 'Liquidation')",
        )
        .execute(&mut conn)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_fetch_schema_lists_columns_in_order() {
        let settings = temp_settings("companylens_schema_test.db");
        seed(&settings).await;

        let store = CompanyStore::new(settings).unwrap();
        let schema = store.fetch_schema().await.unwrap();
        let names: Vec<&str> = schema.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["CompanyName", "CompanyNumber", "CompanyStatus"]);
    }

    #[tokio::test]
    async fn test_execute_returns_rows_in_store_order() {
        let settings = temp_settings("companylens_execute_test.db");
        seed(&settings).await;

        let store = CompanyStore::new(settings).unwrap();
        let policy = PrefixPolicy::new();
        let query = policy
            .validate(
                CandidateQuery::new("SELECT CompanyName, CompanyStatus FROM companies"),
                QueryOrigin::Direct,
            )
            .unwrap();

        let result = store.execute(&query).await.unwrap();
        assert_eq!(result.columns, vec!["CompanyName", "CompanyStatus"]);
        assert_eq!(result.row_count(), 2);
        assert_eq!(
            result.rows[0].get("CompanyName"),
            Some(&Value::String("ACME LTD".to_string()))
        );
    }

    #[tokio::test]
    async fn test_missing_database_is_store_unavailable() {
        let settings = temp_settings("companylens_missing_test_does_not_exist.db");
        let _ = std::fs::remove_file(&settings.path);

        let store = CompanyStore::new(settings).unwrap();
        match store.fetch_schema().await {
            Err(AppError::StoreUnavailable(_)) => {}
            other => panic!("expected StoreUnavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_table_is_schema_empty() {
        let settings = DatabaseSettings {
            table: "nowhere".to_string(),
            ..temp_settings("companylens_empty_test.db")
        };
        seed(&settings).await;

        let store = CompanyStore::new(settings).unwrap();
        match store.fetch_schema().await {
            Err(AppError::SchemaEmpty(_)) => {}
            other => panic!("expected SchemaEmpty, got {:?}", other),
        }
    }

    #[test]
    fn test_identifier_check() {
        assert!(is_valid_identifier("companies"));
        assert!(is_valid_identifier("_companies2"));
        assert!(!is_valid_identifier("companies; DROP TABLE x"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("2companies"));
    }
}
