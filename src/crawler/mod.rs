//! SERP snapshot collection
//!
//! This module fetches organic results for a keyword list, stores each result
//! page as a dated snapshot batch and scores it against the previous capture.

pub mod fetcher;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::analytics::{ScoringConfig, SerpAnalytics};
use crate::models::SnapshotBatch;
use crate::storage::{SerpRepository, SharedSerpRepository};

pub use fetcher::{parse_organic_results, SerpFetcher, SerpProvider, SerpQuery};

/// Default number of results requested per keyword
pub const DEFAULT_NUM_RESULTS: u32 = 10;

/// Outcome of one collection run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionReport {
    pub keywords_total: usize,
    /// Keywords with a stored, non-empty batch
    pub fetched: usize,
    /// Keywords for which the provider returned no organic results
    pub empty: usize,
    pub rows_inserted: usize,
    pub scores_computed: usize,
    /// (keyword, error message)
    pub failures: Vec<(String, String)>,
}

impl CollectionReport {
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Fetches, stores and scores daily snapshots
pub struct SnapshotCollector {
    provider: Arc<dyn SerpProvider>,
    repo: SharedSerpRepository,
    analytics: SerpAnalytics<dyn SerpRepository>,
    num_results: u32,
    language: Option<String>,
}

impl SnapshotCollector {
    pub fn new(
        provider: Arc<dyn SerpProvider>,
        repo: SharedSerpRepository,
        scoring: ScoringConfig,
    ) -> Self {
        let analytics = SerpAnalytics::new(Arc::clone(&repo), scoring);
        Self {
            provider,
            repo,
            analytics,
            num_results: DEFAULT_NUM_RESULTS,
            language: None,
        }
    }

    #[must_use]
    pub fn with_num_results(mut self, num_results: u32) -> Self {
        self.num_results = num_results;
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Collect one snapshot per keyword for `date`
    ///
    /// A failing keyword is logged and recorded in the report; the remaining
    /// keywords are still processed.
    pub async fn collect(&self, keywords: &[String], date: NaiveDate) -> CollectionReport {
        let mut report = CollectionReport {
            keywords_total: keywords.len(),
            ..Default::default()
        };

        for (idx, keyword) in keywords.iter().enumerate() {
            let mut query = SerpQuery::new(keyword.as_str(), self.num_results);
            query.language = self.language.clone();

            let results = match self.provider.search(&query).await {
                Ok(results) => results,
                Err(e) => {
                    tracing::warn!(keyword = %keyword, error = %e, "Failed to fetch SERP");
                    report.failures.push((keyword.clone(), e.to_string()));
                    continue;
                }
            };

            let batch = SnapshotBatch::from_results(keyword, date, &results);
            if batch.is_empty() {
                tracing::warn!(keyword = %keyword, "No organic results found");
                report.empty += 1;
                continue;
            }

            match self.repo.insert_batch(&batch) {
                Ok(inserted) => {
                    report.fetched += 1;
                    report.rows_inserted += inserted;
                    tracing::info!(
                        progress = %format!("{}/{}", idx + 1, keywords.len()),
                        keyword = %keyword,
                        results = batch.len(),
                        inserted,
                        "Stored snapshot"
                    );
                }
                Err(e) => {
                    tracing::warn!(keyword = %keyword, error = %e, "Failed to store snapshot");
                    report.failures.push((keyword.clone(), format!("{e:#}")));
                    continue;
                }
            }

            match self.analytics.compute_and_store(keyword, date) {
                Ok(Some(_)) => report.scores_computed += 1,
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(keyword = %keyword, error = %e, "Failed to compute interest score");
                    report.failures.push((keyword.clone(), e.to_string()));
                }
            }
        }

        tracing::info!(
            keywords = report.keywords_total,
            fetched = report.fetched,
            empty = report.empty,
            failed = report.failed(),
            scores = report.scores_computed,
            "Collection finished"
        );
        report
    }
}
