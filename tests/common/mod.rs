//! Common test utilities and helpers

use std::path::{Path, PathBuf};
use std::time::Duration;

use stock_metrics::models::{Config, PacingConfig, ProviderEndpoints};

/// Test data utilities
pub mod test_data {
    /// Sustainability page whose state payload carries `score` as `totalEsg.raw`
    pub fn esg_page(score: f64) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head><title>Sustainability</title></head>
<body>
<script>window.YAHOO = {{"context": "quote"}};</script>
<script>
root.App.main = {{"context":{{"dispatcher":{{"stores":{{"QuoteSummaryStore":{{"esgScores":{{"totalEsg":{{"raw":{score},"fmt":"{score:.1}"}},"peerGroup":"Energy"}}}}}}}}}}}};
(function (root) {{ root.App.render(); }}(this));
</script>
</body>
</html>"#
        )
    }

    /// Sustainability page with no state payload at all
    pub fn page_without_payload() -> String {
        "<html><body><h1>Symbols similar to this one</h1><script>var x = {};</script></body></html>"
            .to_string()
    }

    /// quoteSummary body with every field reported
    pub fn quote_summary_json(revenue: f64, margin: f64, beta: f64) -> String {
        format!(
            r#"{{
  "quoteSummary": {{
    "result": [{{
      "financialData": {{
        "totalRevenue": {{"raw": {revenue}, "fmt": "-"}},
        "profitMargins": {{"raw": {margin}, "fmt": "-"}},
        "debtToEquity": {{"raw": 45.0, "fmt": "45.00"}},
        "returnOnEquity": {{"raw": 0.18, "fmt": "18.00%"}}
      }},
      "defaultKeyStatistics": {{"beta": {{"raw": 0.5}}}},
      "summaryDetail": {{
        "beta": {{"raw": {beta}, "fmt": "-"}},
        "dividendYield": {{"raw": 0.025, "fmt": "2.50%"}}
      }}
    }}],
    "error": null
  }}
}}"#
        )
    }

    /// quoteSummary body for a symbol the provider does not know
    pub fn empty_quote_summary_json() -> String {
        r#"{"quoteSummary": {"result": [], "error": null}}"#.to_string()
    }
}

/// Write a ticker file with a `Ticker` header into `dir`
pub fn write_ticker_csv(dir: &Path, symbols: &[&str]) -> PathBuf {
    let path = dir.join("ticker.csv");
    let mut contents = String::from("Ticker\n");
    for symbol in symbols {
        contents.push_str(symbol);
        contents.push('\n');
    }
    std::fs::write(&path, contents).expect("Failed to write ticker file");
    path
}

/// Config pointing every path into `dir` and every endpoint at `server_uri`, with no pauses
pub fn test_config(dir: &Path, server_uri: &str) -> Config {
    Config {
        ticker_path: dir.join("ticker.csv"),
        ticker_column: "Ticker".to_string(),
        esg_output_path: dir.join("esg_risk_scores.csv"),
        database_path: dir.join("stock_metrics.db"),
        pacing: PacingConfig {
            delay: Duration::ZERO,
            ..PacingConfig::default()
        },
        request_timeout: Some(Duration::from_secs(5)),
        endpoints: ProviderEndpoints {
            page_base: server_uri.to_string(),
            query_base: server_uri.to_string(),
            cookie_url: format!("{}/cookie", server_uri),
        },
    }
}

/// Logging utilities for tests
pub mod logging {
    use std::sync::Once;
    use tracing::info;

    static INIT: Once = Once::new();

    /// Initialize test logging
    pub fn init_test_logging() {
        INIT.call_once(|| {
            // Another test binary may already own the global subscriber
            let _ = tracing::subscriber::set_global_default(
                tracing_subscriber::fmt()
                    .with_env_filter("stock_metrics=debug,main=debug")
                    .with_test_writer()
                    .finish(),
            );
        });
    }

    /// Log test step
    pub fn log_test_step(step: &str) {
        info!("🧪 Test Step: {}", step);
    }
}
