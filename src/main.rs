use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use stock_metrics::api::YahooClient;
use stock_metrics::models::Config;
use stock_metrics::pipeline::{run_esg_pipeline, run_fundamentals_pipeline};

#[derive(Parser, Debug)]
#[command(version, about = "Collect ESG risk scores and fundamentals for a list of tickers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Ticker CSV file (overrides TICKER_FILE).
    #[arg(short, long, global = true)]
    tickers: Option<PathBuf>,

    /// Pause between tickers in milliseconds (overrides REQUEST_DELAY_MS).
    #[arg(long, global = true)]
    delay_ms: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scrape ESG risk scores and write them to a CSV file.
    Esg {
        /// Output CSV path (overrides ESG_OUTPUT_PATH).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch fundamentals and append them to the SQLite store.
    Fundamentals {
        /// Database file (overrides DATABASE_PATH).
        #[arg(short, long)]
        database: Option<PathBuf>,
    },
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.tickers {
            config.ticker_path = path.clone();
        }
        if let Some(delay_ms) = self.delay_ms {
            config.pacing.delay = Duration::from_millis(delay_ms);
        }
        match &self.command {
            Commands::Esg { output: Some(path) } => config.esg_output_path = path.clone(),
            Commands::Fundamentals { database: Some(path) } => config.database_path = path.clone(),
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stock_metrics=info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let mut config = Config::from_env();
    cli.apply(&mut config);
    info!("📋 Configuration loaded (tickers: {})", config.ticker_path.display());

    let client = YahooClient::new(&config)?;

    let result = match cli.command {
        Commands::Esg { .. } => run_esg_pipeline(&config, client).await.map(|report| {
            info!(
                "🏁 ESG run complete: {} of {} tickers written",
                report.rows_written, report.summary.attempted
            );
        }),
        Commands::Fundamentals { .. } => {
            run_fundamentals_pipeline(&config, client).await.map(|report| {
                info!(
                    "🏁 Fundamentals run complete: {} rows stored, {} rows today",
                    report.rows_inserted,
                    report.rows_today.len()
                );
            })
        }
    };

    if let Err(e) = &result {
        error!("Run failed: {:#}", e);
        eprintln!("❌ {:#}", e);
    }
    result
}
