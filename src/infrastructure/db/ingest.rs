//! Bulk load of the companies CSV into SQLite.
//!
//! The register snapshot is large, so rows are written in 50k-row chunks,
//! each chunk inside its own transaction. The first chunk replaces the table;
//! later chunks append. Column names are sanitized to alphanumeric/underscore
//! tokens so the raw CSV headers (which contain dots and spaces) become valid
//! identifiers.

use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::DatabaseSettings;
use crate::infrastructure::db::company_store::is_valid_identifier;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{Connection, ConnectOptions};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

const CHUNK_SIZE: usize = 50_000;

async fn connect_writable(settings: &DatabaseSettings) -> Result<SqliteConnection> {
    if let Some(parent) = Path::new(&settings.path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    SqliteConnectOptions::new()
        .filename(&settings.path)
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(settings.busy_timeout_secs))
        .connect()
        .await
        .map_err(|e| {
            AppError::StoreUnavailable(format!(
                "Failed to open database at {}: {}",
                settings.path, e
            ))
        })
}

pub fn sanitize_column(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    cleaned
}

/// Load a CSV file into the companies table. Returns the number of rows written.
pub async fn ingest_csv(settings: &DatabaseSettings, csv_path: &Path) -> Result<u64> {
    if !csv_path.exists() {
        return Err(AppError::ExecutionError(format!(
            "CSV file not found at {}",
            csv_path.display()
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(csv_path)
        .map_err(|e| AppError::ExecutionError(format!("Failed to open CSV: {}", e)))?;

    let headers = reader
        .headers()
        .map_err(|e| AppError::ExecutionError(format!("Failed to read CSV headers: {}", e)))?
        .clone();

    let mut columns: Vec<String> = Vec::with_capacity(headers.len());
    for (i, raw) in headers.iter().enumerate() {
        let mut name = sanitize_column(raw);
        if !is_valid_identifier(&name) {
            warn!(raw, "Unusable CSV header, substituting positional name");
            name = format!("column_{}", i);
        }
        columns.push(name);
    }

    let mut conn = connect_writable(settings).await?;

    let create = format!(
        "CREATE TABLE {} ({})",
        settings.table,
        columns
            .iter()
            .map(|c| format!("{} TEXT", c))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let insert = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        settings.table,
        columns.join(", "),
        vec!["?"; columns.len()].join(", ")
    );

    sqlx::query(&format!("DROP TABLE IF EXISTS {}", settings.table))
        .execute(&mut conn)
        .await
        .map_err(|e| AppError::ExecutionError(format!("Failed to replace table: {}", e)))?;
    sqlx::query(&create)
        .execute(&mut conn)
        .await
        .map_err(|e| AppError::ExecutionError(format!("Failed to create table: {}", e)))?;

    let mut total: u64 = 0;
    let mut chunk: Vec<csv::StringRecord> = Vec::with_capacity(CHUNK_SIZE);
    let mut chunk_index = 0u32;

    for record in reader.records() {
        let record =
            record.map_err(|e| AppError::ExecutionError(format!("Bad CSV record: {}", e)))?;
        chunk.push(record);
        if chunk.len() >= CHUNK_SIZE {
            chunk_index += 1;
            total += flush_chunk(&mut conn, &insert, columns.len(), &chunk).await?;
            info!(chunk = chunk_index, rows = total, "Loaded chunk");
            chunk.clear();
        }
    }

    if !chunk.is_empty() {
        chunk_index += 1;
        total += flush_chunk(&mut conn, &insert, columns.len(), &chunk).await?;
        info!(chunk = chunk_index, rows = total, "Loaded final chunk");
    }

    info!(
        rows = total,
        table = settings.table.as_str(),
        "CSV load complete"
    );
    Ok(total)
}

async fn flush_chunk(
    conn: &mut SqliteConnection,
    insert: &str,
    width: usize,
    chunk: &[csv::StringRecord],
) -> Result<u64> {
    let mut tx = conn
        .begin()
        .await
        .map_err(|e| AppError::ExecutionError(format!("Failed to begin transaction: {}", e)))?;

    let mut affected: u64 = 0;
    for record in chunk {
        let mut query = sqlx::query(insert);
        for i in 0..width {
            query = query.bind(record.get(i).unwrap_or("").to_string());
        }
        let res = query
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::ExecutionError(format!("Failed to insert row: {}", e)))?;
        affected += res.rows_affected();
    }

    tx.commit()
        .await
        .map_err(|e| AppError::ExecutionError(format!("Failed to commit chunk: {}", e)))?;

    Ok(affected)
}

/// Create the lookup indexes the query path benefits from. Queries work with
/// or without them; only latency changes.
pub async fn create_indexes(settings: &DatabaseSettings) -> Result<()> {
    let table = &settings.table;
    let statements = [
        ("idx_company_status", format!("CREATE INDEX IF NOT EXISTS idx_company_status ON {} (CompanyStatus)", table)),
        ("idx_accounts_category", format!("CREATE INDEX IF NOT EXISTS idx_accounts_category ON {} (AccountsAccountCategory)", table)),
        ("idx_reg_address_county", format!("CREATE INDEX IF NOT EXISTS idx_reg_address_county ON {} (UPPER(RegAddressCounty))", table)),
        ("idx_accounts_due_date", format!("CREATE INDEX IF NOT EXISTS idx_accounts_due_date ON {} (AccountsNextDueDate)", table)),
        ("idx_sic_code_1", format!("CREATE INDEX IF NOT EXISTS idx_sic_code_1 ON {} (SICCodeSicText_1)", table)),
        ("idx_sic_code_2", format!("CREATE INDEX IF NOT EXISTS idx_sic_code_2 ON {} (SICCodeSicText_2)", table)),
        ("idx_sic_code_3", format!("CREATE INDEX IF NOT EXISTS idx_sic_code_3 ON {} (SICCodeSicText_3)", table)),
        ("idx_sic_code_4", format!("CREATE INDEX IF NOT EXISTS idx_sic_code_4 ON {} (SICCodeSicText_4)", table)),
    ];

    let mut conn = connect_writable(settings).await?;
    for (name, sql) in &statements {
        info!(index = *name, "Creating index");
        sqlx::query(sql)
            .execute(&mut conn)
            .await
            .map_err(|e| AppError::ExecutionError(format!("Failed to create {}: {}", name, e)))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_column() {
        assert_eq!(sanitize_column("RegAddress.PostCode"), "RegAddressPostCode");
        assert_eq!(
            sanitize_column("SICCode.SicText_1"),
            "SICCodeSicText_1"
        );
        assert_eq!(sanitize_column(" Company Name"), "CompanyName");
        assert_eq!(sanitize_column("!!!"), "");
    }

    #[tokio::test]
    async fn test_ingest_replaces_table_and_loads_rows() {
        let dir = std::env::temp_dir();
        let csv_path = dir.join("companylens_ingest_test.csv");
        std::fs::write(
            &csv_path,
            "CompanyName, Company Number,RegAddress.County\n\
             ACME LTD,01234567,SUFFOLK\n\
             BOLT PLC,07654321,NORFOLK\n",
        )
        .unwrap();

        let settings = DatabaseSettings {
            path: dir
                .join("companylens_ingest_test.db")
                .to_string_lossy()
                .to_string(),
            table: "companies".to_string(),
            busy_timeout_secs: 30,
        };

        let loaded = ingest_csv(&settings, &csv_path).await.unwrap();
        assert_eq!(loaded, 2);

        // Re-ingesting replaces rather than appends.
        let loaded = ingest_csv(&settings, &csv_path).await.unwrap();
        assert_eq!(loaded, 2);

        let mut conn = connect_writable(&settings).await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM companies")
            .fetch_one(&mut conn)
            .await
            .unwrap();
        assert_eq!(count, 2);

        let county: String =
            sqlx::query_scalar("SELECT RegAddressCounty FROM companies WHERE CompanyName = 'ACME LTD'")
                .fetch_one(&mut conn)
                .await
                .unwrap();
        assert_eq!(county, "SUFFOLK");
    }
}
