//! Repository-backed entry points for the analyzers
//!
//! [`SerpAnalytics`] loads rows through the repository traits and hands them
//! to the pure analyzer functions. Only score computation writes anything.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::changes::content_changes;
use super::entrants::new_entrants;
use super::error::{AnalyticsError, AnalyticsResult};
use super::interest::{score_day_pair, ScoringConfig};
use super::volatility::rank_volatility;
use super::window::AnalysisWindow;
use crate::models::{ContentChange, InterestScore, NewEntrant, SnapshotSummary, VolatilityStat};
use crate::storage::SerpRepository;

/// Which (keyword, date) pairs a backfill should visit
#[derive(Debug, Clone, Default)]
pub struct BackfillOptions {
    /// Restrict to one keyword; all keywords when `None`
    pub keyword: Option<String>,

    /// Recompute pairs that already have a stored score
    pub force: bool,
}

/// Outcome counts of a backfill run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillReport {
    pub calculated: usize,
    pub skipped_existing: usize,
    /// First capture of a keyword, nothing to compare against
    pub insufficient_history: usize,
}

/// Analytics over a snapshot repository
pub struct SerpAnalytics<R: ?Sized> {
    repo: Arc<R>,
    scoring: ScoringConfig,
}

impl<R: SerpRepository + ?Sized> SerpAnalytics<R> {
    pub fn new(repo: Arc<R>, scoring: ScoringConfig) -> Self {
        Self { repo, scoring }
    }

    #[must_use]
    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    #[must_use]
    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    /// Compute the interest score of `keyword` on `date` against its previous capture.
    ///
    /// # Errors
    ///
    /// - `EmptySnapshotBatch` when nothing was captured on `date`
    /// - `InsufficientHistory` when `date` is the keyword's first capture
    pub fn compute_score(&self, keyword: &str, date: NaiveDate) -> AnalyticsResult<InterestScore> {
        let curr = self.repo.snapshots_on(keyword, date)?;
        if curr.is_empty() {
            return Err(AnalyticsError::EmptySnapshotBatch {
                keyword: keyword.to_string(),
                date,
            });
        }

        let prev_date = self.repo.previous_capture_date(keyword, date)?.ok_or_else(|| {
            AnalyticsError::InsufficientHistory {
                keyword: keyword.to_string(),
                date,
            }
        })?;

        let prev = self.repo.snapshots_on(keyword, prev_date)?;
        if prev.is_empty() {
            return Err(AnalyticsError::EmptySnapshotBatch {
                keyword: keyword.to_string(),
                date: prev_date,
            });
        }

        Ok(score_day_pair(
            keyword,
            prev_date,
            &prev,
            date,
            &curr,
            &self.scoring,
        ))
    }

    /// Compute and upsert the score for `date`.
    ///
    /// Returns `Ok(None)` on the keyword's first capture.
    pub fn compute_and_store(
        &self,
        keyword: &str,
        date: NaiveDate,
    ) -> AnalyticsResult<Option<InterestScore>> {
        match self.compute_score(keyword, date) {
            Ok(score) => {
                self.repo.upsert_score(&score)?;
                tracing::info!(
                    keyword = %keyword,
                    date = %date,
                    interest_score = score.interest_score,
                    "Stored interest score"
                );
                Ok(Some(score))
            }
            Err(e) if e.is_insufficient_history() => {
                tracing::debug!(keyword = %keyword, date = %date, "No earlier capture to score against");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Score every stored (keyword, date) pair that has a predecessor.
    ///
    /// Pairs already scored are skipped unless `options.force` is set. Each
    /// pair is independent of the others.
    pub fn backfill(&self, options: &BackfillOptions) -> AnalyticsResult<BackfillReport> {
        let pairs = self.repo.capture_dates(options.keyword.as_deref())?;
        let mut report = BackfillReport::default();

        for (keyword, date) in pairs {
            if !options.force && self.repo.has_score(&keyword, date)? {
                report.skipped_existing += 1;
                continue;
            }

            match self.compute_and_store(&keyword, date)? {
                Some(_) => report.calculated += 1,
                None => report.insufficient_history += 1,
            }
        }

        tracing::info!(
            keyword = ?options.keyword,
            force = options.force,
            calculated = report.calculated,
            skipped_existing = report.skipped_existing,
            insufficient_history = report.insufficient_history,
            "Backfill complete"
        );
        Ok(report)
    }

    /// Stored scores inside the window, ascending by date
    pub fn interest_scores(
        &self,
        keyword: &str,
        window: &AnalysisWindow,
    ) -> AnalyticsResult<Vec<InterestScore>> {
        Ok(self.repo.scores_between(keyword, window.start, window.end)?)
    }

    /// Per-URL rank statistics inside the window
    pub fn volatility(
        &self,
        keyword: &str,
        window: &AnalysisWindow,
    ) -> AnalyticsResult<Vec<VolatilityStat>> {
        let rows = self.repo.snapshots_between(keyword, window.start, window.end)?;
        Ok(rank_volatility(&rows))
    }

    /// URLs whose first-ever capture falls inside the window
    pub fn new_entrants(
        &self,
        keyword: &str,
        window: &AnalysisWindow,
    ) -> AnalyticsResult<Vec<NewEntrant>> {
        let firsts = self.repo.first_appearances(keyword)?;
        Ok(new_entrants(&firsts, window))
    }

    /// Title/snippet changes between consecutive captures inside the window
    pub fn content_changes(
        &self,
        keyword: &str,
        window: &AnalysisWindow,
    ) -> AnalyticsResult<Vec<ContentChange>> {
        let rows = self.repo.snapshots_between(keyword, window.start, window.end)?;
        Ok(content_changes(&rows))
    }

    pub fn summary(&self, keyword: &str) -> AnalyticsResult<SnapshotSummary> {
        Ok(self.repo.summary(keyword)?)
    }
}
