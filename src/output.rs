use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::models::{EsgResult, FundamentalMetrics, StoredRow};

pub const REPORT_HEADER: &str =
    "Date                 | Symbol | Revenue | Profit% | D/E% | ROE% | Beta | Div%";

#[derive(Debug, Serialize)]
struct EsgCsvRow<'a> {
    #[serde(rename = "Symbol")]
    symbol: &'a str,
    #[serde(rename = "ESG Risk Score")]
    score: f64,
}

/// Print the result lines for one ticker with an ESG score
pub fn print_esg_result(symbol: &str, score: f64) {
    println!("Stock: {}", symbol);
    println!("ESG Risk Score: {:.2}", score);
}

/// Print the normalized metrics for one ticker
pub fn print_metrics(metrics: &FundamentalMetrics) {
    println!("Stock: {}", metrics.symbol);
    println!("Size (Revenue in B): {:.2}", metrics.revenue_billions);
    println!("Profit Margin %: {:.2}", metrics.profit_margin);
    println!("D/E %: {:.2}", metrics.de_ratio);
    println!("ROE %: {:.2}", metrics.roe);
    println!("Beta: {:.2}", metrics.beta);
    println!("Dividend Yield %: {:.2}", metrics.div_yield);
}

/// Write every present score to `path`, overwriting it.
///
/// Absent entries are skipped. Returns the number of data rows; when there are
/// none the file is left untouched.
pub fn write_esg_csv(path: &Path, results: &[EsgResult]) -> Result<usize> {
    let rows: Vec<EsgCsvRow> = results
        .iter()
        .filter_map(|result| {
            result.score.map(|score| EsgCsvRow {
                symbol: &result.symbol,
                score,
            })
        })
        .collect();

    if rows.is_empty() {
        return Ok(0);
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!("📝 Wrote {} ESG rows to {}", rows.len(), path.display());
    Ok(rows.len())
}

/// Summary table of the present scores, in batch order
pub fn format_esg_table(results: &[EsgResult]) -> String {
    let width = results
        .iter()
        .map(|result| result.symbol.len())
        .max()
        .unwrap_or(0)
        .max("Symbol".len());

    let mut table = format!("{:>width$}  ESG Risk Score\n", "Symbol");
    for result in results {
        if let Some(score) = result.score {
            table.push_str(&format!("{:>width$}  {:>14.2}\n", result.symbol, score));
        }
    }
    table
}

pub fn print_esg_table(results: &[EsgResult]) {
    println!("\nAll ESG Risk Scores:");
    println!("{}", "=".repeat(50));
    print!("{}", format_esg_table(results));
}

pub fn format_report_row(row: &StoredRow) -> String {
    let m = &row.metrics;
    format!(
        "{} | {:6} | {:7.2} | {:7.2} | {:4.2} | {:4.2} | {:4.2} | {:4.2}",
        row.date, m.symbol, m.revenue_billions, m.profit_margin, m.de_ratio, m.roe, m.beta, m.div_yield
    )
}

/// Print the same-day report read back from the store
pub fn print_daily_report(rows: &[StoredRow]) {
    println!("\nToday's records from database:");
    println!("{}", REPORT_HEADER);
    println!("{}", "-".repeat(80));
    for row in rows {
        println!("{}", format_report_row(row));
    }
}
