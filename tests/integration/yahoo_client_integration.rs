//! Provider client against a mock HTTP server

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use stock_metrics::api::{
    FetchError, FundamentalsProvider, RequestPacer, SustainabilityPageSource, YahooClient,
};
use stock_metrics::data_collector::DataCollector;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{logging, test_config, test_data};

fn client_for(server: &MockServer) -> YahooClient {
    let dir = std::env::temp_dir();
    YahooClient::new(&test_config(&dir, &server.uri())).expect("Failed to build client")
}

async fn mount_crumb(server: &MockServer, crumb: &str) {
    Mock::given(method("GET"))
        .and(path("/v1/test/getcrumb"))
        .respond_with(ResponseTemplate::new(200).set_body_string(crumb))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_sustainability_page_sends_browser_headers() {
    logging::init_test_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote/PTT.BK/sustainability/"))
        .and(header("upgrade-insecure-requests", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(test_data::esg_page(26.4)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let html = client.fetch_sustainability_page("PTT.BK").await.unwrap();
    assert!(html.contains("root.App.main"));
}

#[tokio::test]
async fn test_fetch_esg_over_http() {
    logging::init_test_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote/PTT.BK/sustainability/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(test_data::esg_page(26.4)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/quote/EMPTY.BK/sustainability/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(test_data::page_without_payload()),
        )
        .mount(&server)
        .await;

    let collector = DataCollector::new(client_for(&server), RequestPacer::disabled());
    assert_eq!(collector.fetch_esg("PTT.BK").await, Some(26.4));
    assert_eq!(collector.fetch_esg("EMPTY.BK").await, None);
    // unmatched requests answer 404
    assert_eq!(collector.fetch_esg("GONE.BK").await, None);
}

#[tokio::test]
async fn test_non_success_status_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.fetch_sustainability_page("PTT.BK").await.unwrap_err();
    assert_matches!(err, FetchError::Status { .. });
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_fundamentals_use_cached_crumb() {
    logging::init_test_logging();
    let server = MockServer::start().await;
    mount_crumb(&server, "abc123").await;
    Mock::given(method("GET"))
        .and(path("/v10/finance/quoteSummary/PTT.BK"))
        .and(query_param("crumb", "abc123"))
        .and(query_param(
            "modules",
            "financialData,defaultKeyStatistics,summaryDetail",
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(test_data::quote_summary_json(5_000_000_000.0, 0.12, 1.1)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v10/finance/quoteSummary/NOPE.BK"))
        .and(query_param("crumb", "abc123"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(test_data::empty_quote_summary_json()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let raw = client.fetch_fundamentals("PTT.BK").await.unwrap().unwrap();
    assert_eq!(raw.total_revenue, Some(5_000_000_000.0));
    assert_eq!(raw.beta, Some(1.1));
    assert_eq!(raw.dividend_yield, Some(0.025));

    assert_eq!(client.fetch_fundamentals("NOPE.BK").await.unwrap(), None);
}

#[tokio::test]
async fn test_missing_crumb_is_session_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/test/getcrumb"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.fetch_fundamentals("PTT.BK").await.unwrap_err();
    assert_matches!(err, FetchError::Session(_));
}

#[tokio::test]
async fn test_quote_summary_requests_json_and_checks_status() {
    let server = MockServer::start().await;
    mount_crumb(&server, "abc123").await;
    Mock::given(method("GET"))
        .and(path("/v10/finance/quoteSummary/PTT.BK"))
        .and(header("accept", "application/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(test_data::quote_summary_json(1_234_567_890.0, 0.1, 1.0)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v10/finance/quoteSummary/BUSY.BK"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let raw = client.fetch_fundamentals("PTT.BK").await.unwrap().unwrap();
    assert_eq!(raw.total_revenue, Some(1_234_567_890.0));

    let err = client.fetch_fundamentals("BUSY.BK").await.unwrap_err();
    assert_matches!(
        err,
        FetchError::Status { status, .. } if status == reqwest::StatusCode::TOO_MANY_REQUESTS
    );
}
