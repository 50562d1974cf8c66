use anyhow::{Context, Result};
use chrono::Local;
use tracing::{info, warn};

use crate::api::{FundamentalsProvider, RequestPacer, SustainabilityPageSource};
use crate::data_collector::{CollectionSummary, DataCollector};
use crate::database_sqlx::{capture_timestamp, MetricsStore};
use crate::models::{Config, StoredRow};
use crate::output;
use crate::tickers::load_tickers;

/// What an ESG run produced
#[derive(Debug, Clone, PartialEq)]
pub struct EsgRunReport {
    pub summary: CollectionSummary,
    pub rows_written: usize,
}

/// What a fundamentals run produced
#[derive(Debug, Clone, PartialEq)]
pub struct FundamentalsRunReport {
    pub summary: CollectionSummary,
    pub rows_inserted: usize,
    pub rows_today: Vec<StoredRow>,
    /// Rows in the table after this run, across all days
    pub total_rows: i64,
}

/// Load tickers, fetch every ESG score, write the CSV and print the summary table
pub async fn run_esg_pipeline<S: SustainabilityPageSource>(
    config: &Config,
    source: S,
) -> Result<EsgRunReport> {
    info!("🌱 Starting ESG collection");
    let tickers = load_tickers(&config.ticker_path, &config.ticker_column)
        .with_context(|| format!("failed to load tickers from {}", config.ticker_path.display()))?;

    let mut collector = DataCollector::new(source, RequestPacer::new(&config.pacing));
    let run = collector.collect_esg_scores(&tickers).await;

    let rows_written = output::write_esg_csv(&config.esg_output_path, &run.results)?;
    if rows_written == 0 {
        warn!("No ESG scores found; {} not written", config.esg_output_path.display());
        println!("\nNo ESG Risk Scores were found.");
    } else {
        output::print_esg_table(&run.results);
        println!(
            "\nESG Risk Scores have been saved to {}",
            config.esg_output_path.display()
        );
    }

    Ok(EsgRunReport {
        summary: run.summary,
        rows_written,
    })
}

/// Fetch fundamentals for every ticker, append them to the store and print today's rows
pub async fn run_fundamentals_pipeline<P: FundamentalsProvider>(
    config: &Config,
    provider: P,
) -> Result<FundamentalsRunReport> {
    info!("📈 Starting fundamentals collection");
    let tickers = load_tickers(&config.ticker_path, &config.ticker_column)
        .with_context(|| format!("failed to load tickers from {}", config.ticker_path.display()))?;
    let store = MetricsStore::open(&config.database_path).await?;

    let captured_at = Local::now().naive_local();
    let date = capture_timestamp(captured_at);

    let mut collector = DataCollector::new(provider, RequestPacer::new(&config.pacing));
    let run = collector.collect_fundamentals(&tickers).await;

    let rows: Vec<StoredRow> = run
        .results
        .into_iter()
        .map(|metrics| StoredRow {
            date: date.clone(),
            metrics,
        })
        .collect();
    let rows_inserted = store.insert_batch(&rows).await?;

    let rows_today = store.records_for_date(captured_at.date()).await?;
    let total_rows = store.count_rows().await?;
    info!("💾 stock_metrics now holds {} rows", total_rows);
    output::print_daily_report(&rows_today);
    println!(
        "\nData has been saved to {}",
        config.database_path.display()
    );

    store.close().await;
    Ok(FundamentalsRunReport {
        summary: run.summary,
        rows_inserted,
        rows_today,
        total_rows,
    })
}
