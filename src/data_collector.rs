use tracing::{debug, error, info, warn};

use crate::api::{FundamentalsProvider, RequestPacer, SustainabilityPageSource};
use crate::extractors::{extract_esg_score, normalize_fundamentals};
use crate::models::{EsgResult, FundamentalMetrics, TickerSymbol};
use crate::output;

/// Result of one per-ticker fetch
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Found(T),
    /// The provider answered but had no usable data.
    Absent,
    /// Network error, timeout or non-2xx status.
    TransportFailed,
}

impl<T> FetchOutcome<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            FetchOutcome::Found(value) => Some(value),
            FetchOutcome::Absent | FetchOutcome::TransportFailed => None,
        }
    }

    pub fn is_transport_failure(&self) -> bool {
        matches!(self, FetchOutcome::TransportFailed)
    }
}

/// Counts for one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub absent: usize,
    pub transport_failures: usize,
}

impl CollectionSummary {
    fn record<T>(&mut self, outcome: &FetchOutcome<T>) {
        self.attempted += 1;
        match outcome {
            FetchOutcome::Found(_) => self.succeeded += 1,
            FetchOutcome::Absent => self.absent += 1,
            FetchOutcome::TransportFailed => {
                self.absent += 1;
                self.transport_failures += 1;
            }
        }
    }
}

/// Everything one batch produced, handed to the sink
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionRun<T> {
    pub results: Vec<T>,
    pub summary: CollectionSummary,
}

/// Sequential per-ticker collector.
///
/// Tickers are fetched one at a time; the pacer sleeps after every ticker,
/// whether or not its fetch succeeded. One ticker's failure never stops the batch.
pub struct DataCollector<C> {
    client: C,
    pacer: RequestPacer,
}

impl<C> DataCollector<C> {
    pub fn new(client: C, pacer: RequestPacer) -> Self {
        Self { client, pacer }
    }

    fn record_outcome<T>(&mut self, outcome: &FetchOutcome<T>) {
        self.pacer.record(outcome.is_transport_failure());
        let failures = self.pacer.consecutive_failures();
        if failures > 1 {
            warn!(
                "⚠️ {} consecutive transport failures, next pause {:?}",
                failures,
                self.pacer.current_delay()
            );
        }
    }
}

impl<C: SustainabilityPageSource> DataCollector<C> {
    /// Fetch the total ESG risk score for one ticker; `None` on any failure or missing data
    pub async fn fetch_esg(&self, symbol: &str) -> Option<f64> {
        self.esg_outcome(symbol).await.into_option()
    }

    async fn esg_outcome(&self, symbol: &str) -> FetchOutcome<f64> {
        let html = match self.client.fetch_sustainability_page(symbol).await {
            Ok(html) => html,
            Err(e) => {
                error!("Error fetching ESG data for {}: {}", symbol, e);
                return if e.is_transport() {
                    FetchOutcome::TransportFailed
                } else {
                    FetchOutcome::Absent
                };
            }
        };

        debug!("Response received for {}. Searching for ESG data...", symbol);
        match extract_esg_score(&html) {
            Ok(score) => {
                info!("Found ESG score for {}: {}", symbol, score);
                FetchOutcome::Found(score)
            }
            Err(e) if e.is_missing_data() => {
                info!("No ESG Risk Score found for {} ({})", symbol, e);
                FetchOutcome::Absent
            }
            Err(e) => {
                warn!("Error reading ESG data for {}: {}", symbol, e);
                FetchOutcome::Absent
            }
        }
    }

    /// Fetch ESG scores for every ticker in order, keeping absent entries
    pub async fn collect_esg_scores(
        &mut self,
        tickers: &[TickerSymbol],
    ) -> CollectionRun<EsgResult> {
        let mut results = Vec::with_capacity(tickers.len());
        let mut summary = CollectionSummary::default();

        for (index, symbol) in tickers.iter().enumerate() {
            info!(
                "[{}/{}] Fetching ESG Risk Score for {}...",
                index + 1,
                tickers.len(),
                symbol
            );

            let outcome = self.esg_outcome(symbol).await;
            summary.record(&outcome);
            self.record_outcome(&outcome);

            let score = outcome.into_option();
            if let Some(score) = score {
                output::print_esg_result(symbol, score);
            }
            results.push(EsgResult::new(symbol.clone(), score));

            self.pacer.pause().await;
        }

        info!(
            "✅ ESG collection finished: {} tickers, {} scores, {} without data ({} transport failures)",
            summary.attempted, summary.succeeded, summary.absent, summary.transport_failures
        );
        CollectionRun { results, summary }
    }
}

impl<C: FundamentalsProvider> DataCollector<C> {
    /// Fetch and normalize fundamentals for one ticker; `None` on any failure or empty record
    pub async fn fetch_metrics(&self, symbol: &str) -> Option<FundamentalMetrics> {
        self.metrics_outcome(symbol).await.into_option()
    }

    async fn metrics_outcome(&self, symbol: &str) -> FetchOutcome<FundamentalMetrics> {
        match self.client.fetch_fundamentals(symbol).await {
            Ok(Some(raw)) => {
                debug!("Raw data for {}: {:?}", symbol, raw);
                FetchOutcome::Found(normalize_fundamentals(symbol, &raw))
            }
            Ok(None) => {
                warn!("No data found for {}", symbol);
                FetchOutcome::Absent
            }
            Err(e) => {
                error!("Error fetching data for {}: {}", symbol, e);
                if e.is_transport() {
                    FetchOutcome::TransportFailed
                } else {
                    FetchOutcome::Absent
                }
            }
        }
    }

    /// Fetch fundamentals for every ticker in order, keeping only successes
    pub async fn collect_fundamentals(
        &mut self,
        tickers: &[TickerSymbol],
    ) -> CollectionRun<FundamentalMetrics> {
        let mut results = Vec::with_capacity(tickers.len());
        let mut summary = CollectionSummary::default();

        for (index, symbol) in tickers.iter().enumerate() {
            info!(
                "[{}/{}] Fetching data for {}...",
                index + 1,
                tickers.len(),
                symbol
            );

            let outcome = self.metrics_outcome(symbol).await;
            summary.record(&outcome);
            self.record_outcome(&outcome);

            if let FetchOutcome::Found(metrics) = outcome {
                output::print_metrics(&metrics);
                results.push(metrics);
            }

            self.pacer.pause().await;
        }

        info!(
            "✅ Fundamentals collection finished: {} tickers, {} with data, {} without ({} transport failures)",
            summary.attempted, summary.succeeded, summary.absent, summary.transport_failures
        );
        CollectionRun { results, summary }
    }
}
