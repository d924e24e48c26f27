//! Test fixtures for integration tests
//!
//! Provider payloads and helpers for wiremock-backed tests

use serde_json::{json, Value};
use serptrend::crawler::SerpFetcher;
use std::time::Duration;
use wiremock::MockServer;

pub const API_KEY: &str = "test-api-key";
pub const ZONE: &str = "serp_test_zone";

/// SERP JSON with organic results for the given (url, title, description) rows
pub fn serp_json(rows: &[(&str, &str, &str)]) -> Value {
    let organic: Vec<Value> = rows
        .iter()
        .enumerate()
        .map(|(i, (link, title, description))| {
            json!({
                "rank": i + 1,
                "link": link,
                "title": title,
                "description": description,
            })
        })
        .collect();

    json!({
        "general": { "search_engine": "google", "query": "nextjs" },
        "organic": organic,
    })
}

/// Provider envelope carrying the SERP as a JSON string in `body`
pub fn wrapped(serp: &Value) -> Value {
    json!({
        "status_code": 200,
        "headers": {},
        "body": serp.to_string(),
    })
}

/// Fetcher pointed at the mock server's `/request` endpoint
pub fn fetcher_for(server: &MockServer, timeout: Duration) -> SerpFetcher {
    SerpFetcher::with_endpoint(
        &format!("{}/request", server.uri()),
        API_KEY,
        ZONE,
        100,
        timeout,
    )
    .unwrap()
}
