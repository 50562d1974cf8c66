use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, UPGRADE_INSECURE_REQUESTS},
    Client,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use super::{FetchError, FundamentalsProvider, SustainabilityPageSource};
use crate::models::{Config, ProviderEndpoints, RawFundamentals};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const QUOTE_SUMMARY_MODULES: &str = "financialData,defaultKeyStatistics,summaryDetail";

/// Yahoo Finance client used by both pipelines.
///
/// Sends browser-like headers on every request and keeps a cookie jar so the
/// crumb obtained for quote-summary queries stays valid for the whole run.
pub struct YahooClient {
    client: Client,
    endpoints: ProviderEndpoints,
    crumb: Arc<Mutex<Option<String>>>,
}

impl YahooClient {
    /// Create a new Yahoo client
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let mut builder = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(browser_headers())
            .cookie_store(true);

        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoints: config.endpoints.clone(),
            crumb: Arc::new(Mutex::new(None)),
        })
    }

    /// GET `url` and return the body; `accept` replaces the default Accept header
    async fn get_text(&self, url: Url, accept: Option<&'static str>) -> Result<String, FetchError> {
        let mut request = self.client.get(url.clone());
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }

    /// Get the session crumb, establishing the session on first use
    async fn crumb(&self) -> Result<String, FetchError> {
        let mut guard = self.crumb.lock().await;
        if let Some(crumb) = guard.as_ref() {
            return Ok(crumb.clone());
        }

        // The cookie endpoint answers 404 but still sets the session cookie.
        if let Err(e) = self.client.get(&self.endpoints.cookie_url).send().await {
            warn!("Failed to prime provider cookies: {}", e);
        }

        let url = endpoint(&self.endpoints.query_base, &["v1", "test", "getcrumb"])?;
        let crumb = self
            .get_text(url, None)
            .await
            .map_err(|e| FetchError::Session(e.to_string()))?;
        let crumb = crumb.trim().to_string();
        if crumb.is_empty() || crumb.contains('<') {
            return Err(FetchError::Session("provider returned an empty crumb".to_string()));
        }

        info!("🔑 Provider session established");
        *guard = Some(crumb.clone());
        Ok(crumb)
    }
}

#[async_trait]
impl SustainabilityPageSource for YahooClient {
    async fn fetch_sustainability_page(&self, symbol: &str) -> Result<String, FetchError> {
        let url = endpoint(
            &self.endpoints.page_base,
            &["quote", symbol, "sustainability", ""],
        )?;
        debug!("Accessing URL: {}", url);
        self.get_text(url, None).await
    }
}

#[async_trait]
impl FundamentalsProvider for YahooClient {
    async fn fetch_fundamentals(
        &self,
        symbol: &str,
    ) -> Result<Option<RawFundamentals>, FetchError> {
        let crumb = self.crumb().await?;

        let mut url = endpoint(
            &self.endpoints.query_base,
            &["v10", "finance", "quoteSummary", symbol],
        )?;
        url.query_pairs_mut()
            .append_pair("modules", QUOTE_SUMMARY_MODULES)
            .append_pair("crumb", &crumb);

        let body = self.get_text(url, Some("application/json")).await?;
        parse_quote_summary(&body)
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers
}

/// Join path segments onto a base URL, percent-encoding each segment.
fn endpoint(base: &str, segments: &[&str]) -> Result<Url, FetchError> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| FetchError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Decode a quote-summary body. An empty or null result is `None`.
pub(crate) fn parse_quote_summary(body: &str) -> Result<Option<RawFundamentals>, FetchError> {
    let response: QuoteSummaryResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    let Some(result) = response
        .quote_summary
        .result
        .and_then(|results| results.into_iter().next())
    else {
        return Ok(None);
    };

    let raw = result.into_raw();
    if raw.is_empty() {
        return Ok(None);
    }
    Ok(Some(raw))
}

// wire format
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    result: Option<Vec<QuoteSummaryResult>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    financial_data: Option<FinancialData>,
    default_key_statistics: Option<KeyStatistics>,
    summary_detail: Option<SummaryDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialData {
    total_revenue: Option<YahooNumber>,
    profit_margins: Option<YahooNumber>,
    debt_to_equity: Option<YahooNumber>,
    return_on_equity: Option<YahooNumber>,
}

#[derive(Debug, Deserialize)]
struct KeyStatistics {
    beta: Option<YahooNumber>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    beta: Option<YahooNumber>,
    dividend_yield: Option<YahooNumber>,
}

/// `{"raw": 0.12, "fmt": "12.00%"}`; Yahoo sends `{}` for unknown values.
#[derive(Debug, Deserialize)]
struct YahooNumber {
    raw: Option<f64>,
}

fn raw_of(value: Option<YahooNumber>) -> Option<f64> {
    value.and_then(|number| number.raw)
}

impl QuoteSummaryResult {
    fn into_raw(self) -> RawFundamentals {
        let (total_revenue, profit_margins, debt_to_equity, return_on_equity) =
            match self.financial_data {
                Some(data) => (
                    raw_of(data.total_revenue),
                    raw_of(data.profit_margins),
                    raw_of(data.debt_to_equity),
                    raw_of(data.return_on_equity),
                ),
                None => (None, None, None, None),
            };

        let (summary_beta, dividend_yield) = match self.summary_detail {
            Some(detail) => (raw_of(detail.beta), raw_of(detail.dividend_yield)),
            None => (None, None),
        };
        let beta = summary_beta.or_else(|| {
            self.default_key_statistics
                .and_then(|statistics| raw_of(statistics.beta))
        });

        RawFundamentals {
            total_revenue,
            profit_margins,
            debt_to_equity,
            return_on_equity,
            beta,
            dividend_yield,
        }
    }
}
