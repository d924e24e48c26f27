//! Date windows for the trailing analyses

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::error::{AnalyticsError, AnalyticsResult};

/// Inclusive range of capture dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl AnalysisWindow {
    /// Window covering `end - window_days ..= end`
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::InvalidWindow` when `window_days <= 0`
    pub fn trailing(end: NaiveDate, window_days: i64) -> AnalyticsResult<Self> {
        if window_days <= 0 {
            return Err(AnalyticsError::invalid_window(format!(
                "window_days must be positive, got {window_days}"
            )));
        }

        let start = end
            .checked_sub_signed(Duration::days(window_days))
            .ok_or_else(|| {
                AnalyticsError::invalid_window(format!("{window_days} days before {end} is out of range"))
            })?;

        Ok(Self { start, end })
    }

    /// Explicit `start ..= end` window
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::InvalidWindow` when `end` is before `start`
    pub fn between(start: NaiveDate, end: NaiveDate) -> AnalyticsResult<Self> {
        if end < start {
            return Err(AnalyticsError::invalid_window(format!(
                "end {end} is before start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}
