// Core data structures for serptrend

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::utils::extract_domain;

/// One organic result as returned by the SERP provider, before ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OrganicResult {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

impl OrganicResult {
    pub fn new(url: impl Into<String>, title: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            snippet: snippet.into(),
        }
    }
}

/// One observed SERP row: a URL at a rank for a keyword on a capture date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub keyword: String,
    pub capture_date: NaiveDate,
    pub rank: u32, // 1-based
    pub url: String,
    pub domain: String,
    pub title: String,
    pub snippet: String,
}

impl Snapshot {
    /// Create a row with the domain derived from the URL and empty text fields
    pub fn new(keyword: &str, capture_date: NaiveDate, rank: u32, url: &str) -> Self {
        Self {
            keyword: keyword.to_string(),
            capture_date,
            rank,
            url: url.to_string(),
            domain: extract_domain(url),
            title: String::new(),
            snippet: String::new(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }
}

/// All rows captured for one keyword on one date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotBatch {
    pub keyword: String,
    pub capture_date: NaiveDate,
    pub rows: Vec<Snapshot>,
}

impl SnapshotBatch {
    /// Rank provider results in order.
    ///
    /// Results with an empty URL are skipped and repeated URLs keep their first
    /// occurrence, so ranks stay contiguous and each URL appears once per batch.
    pub fn from_results(keyword: &str, capture_date: NaiveDate, results: &[OrganicResult]) -> Self {
        let mut seen = HashSet::new();
        let rows = results
            .iter()
            .filter(|r| !r.url.is_empty() && seen.insert(r.url.as_str()))
            .enumerate()
            .map(|(idx, r)| {
                Snapshot::new(keyword, capture_date, idx as u32 + 1, &r.url)
                    .with_title(r.title.as_str())
                    .with_snippet(r.snippet.as_str())
            })
            .collect();

        Self {
            keyword: keyword.to_string(),
            capture_date,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Daily interest score with the raw metrics and sub-scores it was built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestScore {
    pub keyword: String,
    pub capture_date: NaiveDate,
    /// Capture date the score was compared against
    pub previous_date: NaiveDate,
    pub interest_score: f64,
    pub new_domains_count: u32,
    pub avg_rank_improvement: f64,
    pub reshuffle_frequency: f64,
    pub new_domains_score: f64,
    pub rank_improvement_score: f64,
    pub reshuffle_score: f64,
}

/// Rank statistics for one URL over a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityStat {
    pub url: String,
    pub domain: String,
    pub snapshot_count: u32,
    pub avg_rank: f64,
    pub best_rank: u32,
    pub worst_rank: u32,
    /// Sample standard deviation, 0 for a single observation
    pub rank_stddev: f64,
    pub rank_changes: u32,
    /// `rank_stddev / avg_rank * 100`
    pub volatility_pct: f64,
}

/// A URL whose first-ever observation for a keyword falls inside the window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntrant {
    pub url: String,
    pub domain: String,
    pub first_seen_date: NaiveDate,
    pub first_rank: u32,
    pub title: String,
    pub snippet: String,
}

/// Title or snippet change between two consecutive observations of a URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentChange {
    pub url: String,
    pub domain: String,
    pub snapshot_date: NaiveDate,
    pub previous_date: NaiveDate,
    pub rank: u32,
    pub previous_title: String,
    pub new_title: String,
    pub previous_snippet: String,
    pub new_snippet: String,
    pub title_changed: bool,
    pub snippet_changed: bool,
}

/// Aggregate counts for everything recorded about a keyword
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub keyword: String,
    /// Number of distinct capture dates
    pub total_snapshots: usize,
    pub unique_urls: usize,
    pub unique_domains: usize,
    pub first_snapshot: Option<NaiveDate>,
    pub last_snapshot: Option<NaiveDate>,
}
