//! Unified error handling for the serptrend crate
//!
//! This module provides a unified error type that consolidates all domain-specific
//! errors into a single `Error` enum, while maintaining the ability to use
//! domain-specific errors when needed.
//!
//! # Architecture
//!
//! - [`SerpErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use serptrend::error::{Error, ErrorCategory, SerpErrorTrait};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         println!("Try again later: {}", err.category().description());
//!     } else {
//!         eprintln!("Fatal error: {}", err);
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::analytics::error::AnalyticsError;
pub use crate::utils::error::FetchError;

/// Common trait for all serptrend error types
pub trait SerpErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout, rate limit)
    Network,
    /// Provider payload errors
    Parsing,
    /// Storage and I/O errors
    Storage,
    /// Not enough snapshot data for the requested analysis
    Analysis,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Short human-readable description of the category
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "network error",
            Self::Parsing => "parsing error",
            Self::Storage => "storage error",
            Self::Analysis => "analysis error",
            Self::Config => "configuration error",
            Self::Other => "other error",
        }
    }
}

/// Unified error type for the serptrend crate
#[derive(Error, Debug)]
pub enum Error {
    /// Score engine and analyzer errors
    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),

    /// Provider fetch errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[source] rusqlite::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl SerpErrorTrait for FetchError {
    fn is_recoverable(&self) -> bool {
        FetchError::is_recoverable(self)
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedResponse(_) => ErrorCategory::Parsing,
            Self::InvalidUrl(_) | Self::MissingCredential(_) => ErrorCategory::Config,
            _ => ErrorCategory::Network,
        }
    }
}

impl SerpErrorTrait for AnalyticsError {
    fn is_recoverable(&self) -> bool {
        AnalyticsError::is_recoverable(self)
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InsufficientHistory { .. } | Self::EmptySnapshotBatch { .. } => {
                ErrorCategory::Analysis
            }
            Self::InvalidWindow { .. } => ErrorCategory::Config,
            Self::Repository(_) => ErrorCategory::Storage,
        }
    }
}

impl SerpErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Analytics(e) => SerpErrorTrait::is_recoverable(e),
            Self::Fetch(e) => SerpErrorTrait::is_recoverable(e),
            Self::Database(_) => false,
            Self::Io(_) => true, // I/O errors are often transient
            Self::Json(_) => false,
            Self::Http(_) => true, // HTTP errors are often transient
            Self::Config(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Analytics(e) => e.category(),
            Self::Fetch(e) => e.category(),
            Self::Http(_) => ErrorCategory::Network,
            Self::Database(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::Json(_) => ErrorCategory::Parsing,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

// Conversion from rusqlite::Error
impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err)
    }
}

// Conversion from anyhow::Error
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: format!("{err:#}"),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_error_category() {
        let fetch_err = Error::Fetch(FetchError::Timeout);
        assert_eq!(fetch_err.category(), ErrorCategory::Network);

        let parse_err = Error::Fetch(FetchError::MalformedResponse("no organic".into()));
        assert_eq!(parse_err.category(), ErrorCategory::Parsing);

        let window_err: Error = AnalyticsError::invalid_window("zero days").into();
        assert_eq!(window_err.category(), ErrorCategory::Config);
    }

    #[test]
    fn test_is_recoverable() {
        let fetch_err = Error::Fetch(FetchError::Timeout);
        assert!(fetch_err.is_recoverable());

        let history: Error = AnalyticsError::InsufficientHistory {
            keyword: "rust".into(),
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        }
        .into();
        assert!(history.is_recoverable());
        assert_eq!(history.category(), ErrorCategory::Analysis);

        let json_err: Error = serde_json::from_str::<u32>("x").unwrap_err().into();
        assert!(!json_err.is_recoverable());
    }

    #[test]
    fn test_repository_error_is_storage() {
        let err: Error = AnalyticsError::from(anyhow::anyhow!("disk full")).into();
        assert_eq!(err.category(), ErrorCategory::Storage);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("Invalid API key");
        assert_eq!(err.category(), ErrorCategory::Config);
        assert!(!err.is_recoverable());
        assert_eq!(err.category().description(), "configuration error");
    }

    #[test]
    fn test_other_error() {
        let err = Error::other("Something went wrong");
        assert_eq!(err.category(), ErrorCategory::Other);
    }
}
