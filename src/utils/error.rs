//! Error types for the SERP provider client
//!
//! This module defines the errors raised while fetching result pages.

use thiserror::Error;

/// Errors that can occur while fetching a result page from the provider
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded")]
    RateLimit,

    /// Non-success response with status code
    #[error("Server error: {status}: {body}")]
    ServerError { status: u16, body: String },

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Response body was not the expected JSON shape
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    /// Provider credentials are not configured
    #[error("Missing provider credential: {0}")]
    MissingCredential(&'static str),
}

impl FetchError {
    /// Check if the request may succeed when repeated later
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimit | Self::Timeout => true,
            Self::ServerError { status, .. } => matches!(status, 500 | 502 | 503 | 504),
            Self::InvalidUrl(_) | Self::MalformedResponse(_) | Self::MissingCredential(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_statuses() {
        let err = FetchError::ServerError {
            status: 503,
            body: String::new(),
        };
        assert!(err.is_recoverable());

        let err = FetchError::ServerError {
            status: 401,
            body: "unauthorized".to_string(),
        };
        assert!(!err.is_recoverable());
        assert!(FetchError::RateLimit.is_recoverable());
        assert!(!FetchError::MissingCredential("BRIGHT_DATA_API_KEY").is_recoverable());
    }
}
