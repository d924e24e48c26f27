//! Error types for the analytics module

use chrono::NaiveDate;
use thiserror::Error;

/// Result type for analytics operations
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Errors raised by the score engine and the windowed analyzers
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// No earlier capture exists for the keyword. Expected for the first fetch.
    #[error("Insufficient history for '{keyword}' on {date}: no earlier snapshot")]
    InsufficientHistory { keyword: String, date: NaiveDate },

    /// A requested capture date has no rows
    #[error("Empty snapshot batch for '{keyword}' on {date}")]
    EmptySnapshotBatch { keyword: String, date: NaiveDate },

    /// Window of zero or negative length, or end before start
    #[error("Invalid window: {reason}")]
    InvalidWindow { reason: String },

    /// Failure in the underlying snapshot or score store
    #[error(transparent)]
    Repository(#[from] anyhow::Error),
}

impl AnalyticsError {
    pub fn invalid_window(reason: impl Into<String>) -> Self {
        Self::InvalidWindow {
            reason: reason.into(),
        }
    }

    /// True for the steady-state "nothing to compare against yet" outcome
    #[must_use]
    pub fn is_insufficient_history(&self) -> bool {
        matches!(self, Self::InsufficientHistory { .. })
    }

    /// Check if the operation may succeed once more data is ingested
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InsufficientHistory { .. } | Self::EmptySnapshotBatch { .. }
        )
    }
}
