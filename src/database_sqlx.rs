use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Row, SqlitePool,
};
use std::path::Path;
use tracing::{debug, info};

use crate::models::{FundamentalMetrics, StoredRow, DATE_FORMAT, TIMESTAMP_FORMAT};

const CREATE_STOCK_METRICS: &str = r#"
    CREATE TABLE IF NOT EXISTS stock_metrics (
        date TEXT,
        stock_symbol TEXT,
        revenue_billions REAL,
        profit_margin REAL,
        de_ratio REAL,
        roe REAL,
        beta REAL,
        div_yield REAL
    )
"#;

const INSERT_STOCK_METRICS: &str = r#"
    INSERT INTO stock_metrics (
        date, stock_symbol, revenue_billions, profit_margin,
        de_ratio, roe, beta, div_yield
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
"#;

const SELECT_FOR_DATE: &str = r#"
    SELECT date, stock_symbol, revenue_billions, profit_margin,
           de_ratio, roe, beta, div_yield
    FROM stock_metrics
    WHERE date LIKE ?
    ORDER BY stock_symbol, rowid
"#;

/// Format a capture time the way it is stored in the `date` column.
pub fn capture_timestamp(captured_at: NaiveDateTime) -> String {
    captured_at.format(TIMESTAMP_FORMAT).to_string()
}

/// Append-only SQLite store for fundamentals.
///
/// The table has no key: every run appends its rows, so running twice on the
/// same day leaves two rows per ticker.
pub struct MetricsStore {
    pool: SqlitePool,
}

impl MetricsStore {
    /// Open (creating if needed) the database file and ensure the table exists
    pub async fn open(database_path: &Path) -> Result<Self> {
        debug!("Opening metrics store at {}", database_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(
                SqliteConnectOptions::new()
                    .filename(database_path)
                    .create_if_missing(true),
            )
            .await
            .with_context(|| format!("failed to open {}", database_path.display()))?;

        sqlx::query(CREATE_STOCK_METRICS)
            .execute(&pool)
            .await
            .context("failed to create stock_metrics table")?;

        info!("💾 Metrics store ready at {}", database_path.display());
        Ok(Self { pool })
    }

    /// Insert every row in a single transaction; nothing is written unless all rows are
    pub async fn insert_batch(&self, rows: &[StoredRow]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;

        for row in rows {
            let metrics = &row.metrics;
            sqlx::query(INSERT_STOCK_METRICS)
                .bind(&row.date)
                .bind(&metrics.symbol)
                .bind(metrics.revenue_billions)
                .bind(metrics.profit_margin)
                .bind(metrics.de_ratio)
                .bind(metrics.roe)
                .bind(metrics.beta)
                .bind(metrics.div_yield)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("failed to insert metrics for {}", metrics.symbol))?;
        }

        tx.commit().await.context("failed to commit stock_metrics")?;
        info!("✅ Stored {} rows in stock_metrics", rows.len());
        Ok(rows.len())
    }

    /// All rows captured on `date`, ordered by symbol
    pub async fn records_for_date(&self, date: NaiveDate) -> Result<Vec<StoredRow>> {
        let pattern = format!("{}%", date.format(DATE_FORMAT));

        let rows = sqlx::query(SELECT_FOR_DATE)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(StoredRow {
                date: row.try_get::<Option<String>, _>("date")?.unwrap_or_default(),
                metrics: FundamentalMetrics {
                    symbol: row
                        .try_get::<Option<String>, _>("stock_symbol")?
                        .unwrap_or_default(),
                    revenue_billions: real(&row, "revenue_billions")?,
                    profit_margin: real(&row, "profit_margin")?,
                    de_ratio: real(&row, "de_ratio")?,
                    roe: real(&row, "roe")?,
                    beta: real(&row, "beta")?,
                    div_yield: real(&row, "div_yield")?,
                },
            });
        }

        Ok(records)
    }

    /// Total number of rows in the table
    pub async fn count_rows(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM stock_metrics")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("total")?)
    }

    /// Release the connection
    pub async fn close(self) {
        self.pool.close().await;
    }
}

fn real(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<f64> {
    Ok(row.try_get::<Option<f64>, _>(column)?.unwrap_or_default())
}
