//! Error scenario integration tests
//!
//! Tests provider failure modes:
//! 1. Rate limiting
//! 2. HTTP error responses
//! 3. Timeouts
//! 4. Malformed payloads
//! 5. Partial failures during collection

use std::sync::Arc;
use std::time::Duration;

use serptrend::analytics::ScoringConfig;
use serptrend::crawler::{SerpProvider, SerpQuery, SnapshotCollector};
use serptrend::error::{ErrorCategory, SerpErrorTrait};
use serptrend::storage::{create_mock_repository, SnapshotRepository};
use serptrend::utils::error::FetchError;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::fixtures::{fetcher_for, serp_json};

// ============================================================================
// HTTP Error Tests
// ============================================================================

#[tokio::test]
async fn test_rate_limit_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server, Duration::from_secs(5));
    let err = fetcher
        .search(&SerpQuery::new("nextjs", 10))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::RateLimit));
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn test_server_error_keeps_truncated_body() {
    let server = MockServer::start().await;
    let long_body = "x".repeat(500);
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string(long_body))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server, Duration::from_secs(5));
    let err = fetcher
        .search(&SerpQuery::new("nextjs", 10))
        .await
        .unwrap_err();

    match &err {
        FetchError::ServerError { status, body } => {
            assert_eq!(*status, 401);
            assert!(body.chars().count() <= 203);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!err.is_recoverable());
    assert_eq!(SerpErrorTrait::category(&err), ErrorCategory::Network);
}

#[tokio::test]
async fn test_timeout_handling() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serp_json(&[]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server, Duration::from_millis(200));
    let err = fetcher
        .search(&SerpQuery::new("nextjs", 10))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Timeout));
}

// ============================================================================
// Payload Tests
// ============================================================================

#[tokio::test]
async fn test_malformed_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>captcha</html>"))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server, Duration::from_secs(5));
    let err = fetcher
        .search(&SerpQuery::new("nextjs", 10))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::MalformedResponse(_)));
    assert_eq!(SerpErrorTrait::category(&err), ErrorCategory::Parsing);
}

// ============================================================================
// Collection Tests
// ============================================================================

#[tokio::test]
async fn test_collection_continues_after_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/request"))
        .and(body_string_contains("q=broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/request"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serp_json(&[
            ("https://a.com/", "A", "a"),
            ("https://b.com/", "B", "b"),
        ])))
        .mount(&server)
        .await;

    let repo = create_mock_repository();
    let collector = SnapshotCollector::new(
        Arc::new(fetcher_for(&server, Duration::from_secs(5))),
        Arc::clone(&repo),
        ScoringConfig::default(),
    );

    let keywords = vec!["broken".to_string(), "working".to_string()];
    let report = collector
        .collect(&keywords, chrono::NaiveDate::from_ymd_opt(2025, 11, 1).unwrap())
        .await;

    assert_eq!(report.failed(), 1);
    assert_eq!(report.failures[0].0, "broken");
    assert_eq!(report.fetched, 1);
    assert_eq!(repo.snapshot_count().unwrap(), 2);
}
