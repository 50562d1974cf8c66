use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Format of the capture timestamp stored in the `date` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format of the date portion used for the same-day report.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A trimmed ticker symbol as read from the ticker file.
///
/// Duplicates are not collapsed; each occurrence is fetched on its own.
pub type TickerSymbol = String;

/// Outcome of one ESG fetch attempt
#[derive(Debug, Clone, PartialEq)]
pub struct EsgResult {
    pub symbol: TickerSymbol,
    pub score: Option<f64>,
}

impl EsgResult {
    pub fn new(symbol: impl Into<TickerSymbol>, score: Option<f64>) -> Self {
        Self {
            symbol: symbol.into(),
            score,
        }
    }
}

/// Fields as reported by the market-data provider, before any unit transform.
///
/// `None` means the provider did not report the field at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFundamentals {
    pub total_revenue: Option<f64>,
    pub profit_margins: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub beta: Option<f64>,
    pub dividend_yield: Option<f64>,
}

impl RawFundamentals {
    /// True when the provider returned a record with no usable field.
    pub fn is_empty(&self) -> bool {
        self.total_revenue.is_none()
            && self.profit_margins.is_none()
            && self.debt_to_equity.is_none()
            && self.return_on_equity.is_none()
            && self.beta.is_none()
            && self.dividend_yield.is_none()
    }
}

/// Normalized fundamentals for one ticker.
///
/// Revenue is in billions; margin, ROE and dividend yield are percentages.
/// Fields the provider did not report are 0.0.
#[derive(Debug, Clone, PartialEq)]
pub struct FundamentalMetrics {
    pub symbol: TickerSymbol,
    pub revenue_billions: f64,
    pub profit_margin: f64,
    pub de_ratio: f64,
    pub roe: f64,
    pub beta: f64,
    pub div_yield: f64,
}

/// One row of the `stock_metrics` table
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    /// Capture timestamp, formatted with [`TIMESTAMP_FORMAT`].
    pub date: String,
    pub metrics: FundamentalMetrics,
}

/// Base URLs of the provider, overridable so tests can point at a mock server.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderEndpoints {
    pub page_base: String,
    pub query_base: String,
    pub cookie_url: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            page_base: "https://finance.yahoo.com".to_string(),
            query_base: "https://query2.finance.yahoo.com".to_string(),
            cookie_url: "https://fc.yahoo.com".to_string(),
        }
    }
}

/// Delay policy applied between successive ticker fetches
#[derive(Debug, Clone, PartialEq)]
pub struct PacingConfig {
    pub delay: Duration,
    /// Multiplier applied per consecutive transport failure; 1.0 keeps the delay fixed.
    pub backoff_factor: f64,
    pub max_delay: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(2000),
            backoff_factor: 1.0,
            max_delay: Duration::from_millis(30_000),
        }
    }
}

/// Configuration for both pipelines
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub ticker_path: PathBuf,
    pub ticker_column: String,
    pub esg_output_path: PathBuf,
    pub database_path: PathBuf,
    pub pacing: PacingConfig,
    pub request_timeout: Option<Duration>,
    pub endpoints: ProviderEndpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ticker_path: PathBuf::from("ticker.csv"),
            ticker_column: "Ticker".to_string(),
            esg_output_path: PathBuf::from("esg_risk_scores.csv"),
            database_path: PathBuf::from("stock_metrics.db"),
            pacing: PacingConfig::default(),
            request_timeout: None,
            endpoints: ProviderEndpoints::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to the defaults
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let defaults = Config::default();
        let delay_ms = parse_or(std::env::var("REQUEST_DELAY_MS").ok(), 2000u64);
        let max_delay_ms = parse_or(std::env::var("MAX_DELAY_MS").ok(), 30_000u64);

        Config {
            ticker_path: std::env::var("TICKER_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.ticker_path),
            ticker_column: std::env::var("TICKER_COLUMN").unwrap_or(defaults.ticker_column),
            esg_output_path: std::env::var("ESG_OUTPUT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.esg_output_path),
            database_path: std::env::var("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            pacing: PacingConfig {
                delay: Duration::from_millis(delay_ms),
                backoff_factor: parse_or(std::env::var("BACKOFF_FACTOR").ok(), 1.0f64).max(1.0),
                max_delay: Duration::from_millis(max_delay_ms),
            },
            request_timeout: std::env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|secs| secs.trim().parse::<u64>().ok())
                .map(Duration::from_secs),
            endpoints: ProviderEndpoints {
                page_base: std::env::var("YAHOO_PAGE_BASE").unwrap_or(defaults.endpoints.page_base),
                query_base: std::env::var("YAHOO_QUERY_BASE")
                    .unwrap_or(defaults.endpoints.query_base),
                cookie_url: std::env::var("YAHOO_COOKIE_URL")
                    .unwrap_or(defaults.endpoints.cookie_url),
            },
        }
    }
}

/// Parse an optional raw value, keeping `default` when it is missing or malformed.
pub fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|value| value.trim().parse().ok()).unwrap_or(default)
}
