//! SERP provider client with rate limiting
//!
//! This module talks to the Bright Data request API. A Google results page is
//! requested with `brd_json=1` so the provider answers with parsed JSON, and
//! the organic results are extracted from it.

use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::num::NonZeroU32;
use std::time::Duration;
use url::Url;

use crate::config::ProviderConfig;
use crate::models::OrganicResult;
use crate::utils::error::FetchError;
use crate::utils::truncate_text;

/// Google search endpoint the provider is asked to render
const SEARCH_BASE_URL: &str = "https://www.google.com/search";

/// Error bodies are cut to this many characters
const MAX_ERROR_BODY: usize = 200;

/// One search request
#[derive(Debug, Clone)]
pub struct SerpQuery {
    pub keyword: String,
    pub num_results: u32,
    /// Interface and result language, e.g. `en`
    pub language: Option<String>,
    /// Overrides the provider's configured country
    pub country: Option<String>,
}

impl SerpQuery {
    pub fn new(keyword: impl Into<String>, num_results: u32) -> Self {
        Self {
            keyword: keyword.into(),
            num_results,
            language: None,
            country: None,
        }
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Google URL for this query
    pub fn search_url(&self) -> Result<String, FetchError> {
        let num = self.num_results.to_string();
        let mut params = vec![
            ("q", self.keyword.as_str()),
            ("num", num.as_str()),
            ("brd_json", "1"),
        ];

        let lr;
        if let Some(lang) = &self.language {
            lr = format!("lang_{lang}");
            params.push(("hl", lang.as_str()));
            params.push(("lr", lr.as_str()));
        }

        Url::parse_with_params(SEARCH_BASE_URL, &params)
            .map(String::from)
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))
    }
}

/// Source of organic search results
#[async_trait]
pub trait SerpProvider: Send + Sync {
    /// Fetch the organic results for one query, in rank order
    async fn search(&self, query: &SerpQuery) -> Result<Vec<OrganicResult>, FetchError>;
}

#[derive(Debug, Serialize)]
struct RequestPayload<'a> {
    zone: &'a str,
    url: String,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    country: Option<&'a str>,
}

/// Bright Data SERP client
pub struct SerpFetcher {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// Rate limiter to control request frequency
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,

    endpoint: String,
    api_key: String,
    zone: String,
    country: Option<String>,
}

impl SerpFetcher {
    /// Create a fetcher from provider configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::MissingCredential` when the API key or zone is
    /// absent, and `FetchError::Http` if the HTTP client cannot be created
    pub fn new(config: &ProviderConfig) -> Result<Self, FetchError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(FetchError::MissingCredential("BRIGHT_DATA_API_KEY"))?;
        let zone = config
            .zone
            .clone()
            .ok_or(FetchError::MissingCredential("BRIGHT_DATA_ZONE"))?;

        let mut fetcher = Self::with_endpoint(
            &config.endpoint,
            &api_key,
            &zone,
            config.requests_per_second,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        fetcher.country = config.country.clone();
        Ok(fetcher)
    }

    /// Create a fetcher against an explicit endpoint, e.g. a mock server
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` for an unparsable endpoint and
    /// `FetchError::Http` if the HTTP client cannot be created
    pub fn with_endpoint(
        endpoint: &str,
        api_key: &str,
        zone: &str,
        requests_per_second: u32,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        Url::parse(endpoint).map_err(|e| FetchError::InvalidUrl(format!("{endpoint}: {e}")))?;

        let client = Client::builder().timeout(timeout).gzip(true).build()?;

        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(rate));

        Ok(Self {
            client,
            rate_limiter,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            zone: zone.to_string(),
            country: None,
        })
    }

    #[must_use]
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Send one request and return the unwrapped SERP JSON
    ///
    /// # Errors
    ///
    /// Returns `FetchError::RateLimit` on 429, `FetchError::ServerError` on any
    /// other non-success status, `FetchError::Timeout` when the request times
    /// out and `FetchError::MalformedResponse` when the body is not JSON
    pub async fn fetch_serp(&self, query: &SerpQuery) -> Result<Value, FetchError> {
        let payload = RequestPayload {
            zone: &self.zone,
            url: query.search_url()?,
            format: "json",
            country: query.country.as_deref().or(self.country.as_deref()),
        };

        self.rate_limiter.until_ready().await;

        tracing::debug!(keyword = %query.keyword, url = %payload.url, "Requesting SERP");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::Http(e)
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimit);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::ServerError {
                status: status.as_u16(),
                body: truncate_text(&body, MAX_ERROR_BODY),
            });
        }

        let text = response.text().await?;
        let value: Value = serde_json::from_str(&text)
            .map_err(|e| FetchError::MalformedResponse(format!("invalid JSON: {e}")))?;

        unwrap_body(value)
    }
}

#[async_trait]
impl SerpProvider for SerpFetcher {
    async fn search(&self, query: &SerpQuery) -> Result<Vec<OrganicResult>, FetchError> {
        let serp = self.fetch_serp(query).await?;
        let results = parse_organic_results(&serp);

        tracing::info!(
            keyword = %query.keyword,
            results = results.len(),
            "Fetched SERP"
        );
        Ok(results)
    }
}

/// The provider may wrap the SERP in a `body` field, possibly as a JSON string
fn unwrap_body(value: Value) -> Result<Value, FetchError> {
    match value {
        Value::Object(mut map) if map.contains_key("body") => match map.remove("body") {
            Some(Value::String(body)) => serde_json::from_str(&body)
                .map_err(|e| FetchError::MalformedResponse(format!("invalid body JSON: {e}"))),
            Some(body) => Ok(body),
            None => Ok(Value::Object(map)),
        },
        other => Ok(other),
    }
}

fn string_field<'a>(item: &'a Value, keys: &[&str]) -> &'a str {
    keys.iter()
        .find_map(|key| item.get(*key).and_then(Value::as_str))
        .unwrap_or("")
}

/// Extract organic results in page order
///
/// The URL is read from `link` or `url`, the snippet from `description` or
/// `snippet`. A payload without an `organic` array yields no results.
pub fn parse_organic_results(serp: &Value) -> Vec<OrganicResult> {
    let Some(items) = serp.get("organic").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .map(|item| {
            OrganicResult::new(
                string_field(item, &["link", "url"]),
                string_field(item, &["title"]),
                string_field(item, &["description", "snippet"]),
            )
        })
        .collect()
}
