use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::TickerSymbol;

#[derive(Debug, Error)]
pub enum TickerSourceError {
    #[error("failed to read ticker list: {0}")]
    Read(#[from] csv::Error),

    #[error("ticker list has no `{0}` column")]
    MissingColumn(String),
}

/// Load ticker symbols from a CSV file with a header row.
///
/// Symbols are trimmed and blank cells skipped; order and duplicates are preserved.
pub fn load_tickers(path: &Path, column: &str) -> Result<Vec<TickerSymbol>, TickerSourceError> {
    debug!("Reading tickers from {}", path.display());
    let reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let tickers = read_tickers(reader, column)?;
    info!("📋 Loaded {} tickers from {}", tickers.len(), path.display());
    Ok(tickers)
}

/// Same as [`load_tickers`] for any reader.
pub fn read_tickers<R: Read>(
    mut reader: csv::Reader<R>,
    column: &str,
) -> Result<Vec<TickerSymbol>, TickerSourceError> {
    let index = reader
        .headers()?
        .iter()
        .position(|header| header.trim() == column)
        .ok_or_else(|| TickerSourceError::MissingColumn(column.to_string()))?;

    let mut tickers = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(symbol) = record.get(index).map(str::trim) {
            if !symbol.is_empty() {
                tickers.push(symbol.to_string());
            }
        }
    }

    Ok(tickers)
}
