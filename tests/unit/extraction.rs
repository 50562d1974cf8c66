//! ESG extraction and fundamentals normalization through the public API

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use stock_metrics::extractors::{extract_esg_score, normalize_fundamentals, EsgExtractError};
use stock_metrics::models::RawFundamentals;

use crate::common::{logging, test_data};

#[test]
fn test_score_from_realistic_page() {
    logging::init_test_logging();
    assert_eq!(extract_esg_score(&test_data::esg_page(24.31)).unwrap(), 24.31);
}

#[test]
fn test_page_without_payload_is_missing_data() {
    let err = extract_esg_score(&test_data::page_without_payload()).unwrap_err();
    assert_matches!(err, EsgExtractError::NoMarkerBlock);
    assert!(err.is_missing_data());
}

#[test]
fn test_empty_document_is_missing_data() {
    assert!(extract_esg_score("").unwrap_err().is_missing_data());
}

#[test]
fn test_normalization_examples() {
    let metrics = normalize_fundamentals(
        "CPALL.BK",
        &RawFundamentals {
            total_revenue: Some(5_000_000_000.0),
            profit_margins: Some(0.12),
            ..Default::default()
        },
    );

    assert_eq!(metrics.revenue_billions, 5_000_000_000.0 / 1e9);
    assert!((metrics.profit_margin - 12.0).abs() < 1e-9);
    assert_eq!(metrics.de_ratio, 0.0);
    assert_eq!(metrics.roe, 0.0);
    assert_eq!(metrics.beta, 0.0);
    assert_eq!(metrics.div_yield, 0.0);
}
