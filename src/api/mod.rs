use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::models::{PacingConfig, RawFundamentals};

pub mod yahoo_client;
pub use yahoo_client::YahooClient;

/// Errors raised while talking to a data provider
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("could not establish provider session: {0}")]
    Session(String),

    #[error("could not decode provider response: {0}")]
    Decode(String),

    #[error("invalid provider URL: {0}")]
    Url(#[from] url::ParseError),
}

impl FetchError {
    /// Network errors, timeouts and non-2xx statuses count as transport failures.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FetchError::Http(_) | FetchError::Status { .. } | FetchError::Session(_)
        )
    }
}

/// Source of the raw sustainability page for a ticker
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SustainabilityPageSource: Send + Sync {
    async fn fetch_sustainability_page(&self, symbol: &str) -> Result<String, FetchError>;
}

/// Market-data provider keyed by ticker symbol.
///
/// `Ok(None)` is an empty record: the provider answered but knows nothing about the ticker.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FundamentalsProvider: Send + Sync {
    async fn fetch_fundamentals(&self, symbol: &str)
        -> Result<Option<RawFundamentals>, FetchError>;
}

/// Pause inserted after every ticker to stay under provider rate limits.
///
/// The delay grows by `backoff_factor` for each consecutive transport failure
/// and is capped at `max_delay`. With a factor of 1.0 it is a fixed pause.
#[derive(Debug, Clone)]
pub struct RequestPacer {
    delay: Duration,
    backoff_factor: f64,
    max_delay: Duration,
    consecutive_failures: u32,
}

impl RequestPacer {
    pub fn new(config: &PacingConfig) -> Self {
        Self {
            delay: config.delay,
            backoff_factor: config.backoff_factor.max(1.0),
            max_delay: config.max_delay.max(config.delay),
            consecutive_failures: 0,
        }
    }

    /// Pacer that never sleeps
    pub fn disabled() -> Self {
        Self::new(&PacingConfig {
            delay: Duration::ZERO,
            backoff_factor: 1.0,
            max_delay: Duration::ZERO,
        })
    }

    /// Record the outcome of the last fetch.
    pub fn record(&mut self, transport_failure: bool) {
        if transport_failure {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        } else {
            self.consecutive_failures = 0;
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Delay the next pause will sleep for.
    pub fn current_delay(&self) -> Duration {
        if self.consecutive_failures == 0 || self.backoff_factor <= 1.0 {
            return self.delay;
        }

        let exponent = self.consecutive_failures.min(32) as i32;
        let scaled = self.delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        Duration::from_secs_f64(scaled.min(self.max_delay.as_secs_f64()))
    }

    pub async fn pause(&self) {
        let delay = self.current_delay();
        if delay.is_zero() {
            return;
        }
        debug!("⏳ Pausing {:?} before next ticker", delay);
        tokio::time::sleep(delay).await;
    }
}
