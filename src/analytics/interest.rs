//! Interest score engine
//!
//! Turns the movement between two consecutive batches of a keyword into a
//! 0-100 score made of three bounded parts:
//!
//! | part              | budget | input                                                 |
//! |-------------------|--------|-------------------------------------------------------|
//! | new domains       | 40     | `min(budget, new_domains * budget / N)`               |
//! | rank improvement  | 30     | `clamp(avg_improvement / (N - 1) * budget, 0, budget)` |
//! | reshuffle         | 30     | `reshuffle_frequency * budget`                        |
//!
//! `N` is the tracked page depth. Only rows with `rank <= N` take part.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::comparator::compare;
use crate::models::{InterestScore, Snapshot};

/// Upper bound of the combined score
pub const MAX_INTEREST_SCORE: f64 = 100.0;

/// Normalization constants for the interest score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Page depth N; rows ranked below it are ignored
    pub top_n: usize,

    /// Points available for domains new to the page
    pub new_domain_budget: f64,

    /// Points available for net upward movement of retained URLs
    pub rank_improvement_budget: f64,

    /// Points available for retained URLs changing position
    pub reshuffle_budget: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            new_domain_budget: 40.0,
            rank_improvement_budget: 30.0,
            reshuffle_budget: 30.0,
        }
    }
}

impl ScoringConfig {
    #[must_use]
    pub fn with_top_n(top_n: usize) -> Self {
        Self {
            top_n,
            ..Default::default()
        }
    }

    fn in_page<'a>(&self, batch: &'a [Snapshot]) -> Vec<&'a Snapshot> {
        batch
            .iter()
            .filter(|s| (s.rank as usize) <= self.top_n)
            .collect()
    }

    fn new_domains_score(&self, count: u32) -> f64 {
        if self.top_n == 0 {
            return 0.0;
        }
        let per_domain = self.new_domain_budget / self.top_n as f64;
        (f64::from(count) * per_domain).min(self.new_domain_budget)
    }

    fn rank_improvement_score(&self, avg_rank_improvement: f64) -> f64 {
        // Largest possible single-URL move is N - 1 positions
        let ceiling = self.top_n.saturating_sub(1) as f64;
        if ceiling == 0.0 {
            return 0.0;
        }
        (avg_rank_improvement / ceiling * self.rank_improvement_budget)
            .clamp(0.0, self.rank_improvement_budget)
    }

    fn reshuffle_score(&self, reshuffle_frequency: f64) -> f64 {
        reshuffle_frequency * self.reshuffle_budget
    }
}

/// Score the move from `prev` (captured on `prev_date`) to `curr` (captured on `curr_date`)
///
/// Pure function of the two batches: same input, same output.
pub fn score_day_pair(
    keyword: &str,
    prev_date: NaiveDate,
    prev: &[Snapshot],
    curr_date: NaiveDate,
    curr: &[Snapshot],
    config: &ScoringConfig,
) -> InterestScore {
    let prev = config.in_page(prev);
    let curr = config.in_page(curr);
    let comparison = compare(prev.iter().copied(), curr.iter().copied());

    let prev_domains: HashSet<&str> = prev.iter().map(|s| s.domain.as_str()).collect();
    let new_domains: HashSet<&str> = comparison
        .entered
        .iter()
        .map(|s| s.domain.as_str())
        .filter(|domain| !prev_domains.contains(domain))
        .collect();
    let new_domains_count = new_domains.len() as u32;

    let (avg_rank_improvement, reshuffle_frequency) = if comparison.common.is_empty() {
        (0.0, 0.0)
    } else {
        let common = comparison.common.len() as f64;
        let total_improvement: i64 = comparison.common.iter().map(|m| m.improvement()).sum();
        let changed = comparison.common.iter().filter(|m| m.changed()).count();
        (total_improvement as f64 / common, changed as f64 / common)
    };

    let new_domains_score = config.new_domains_score(new_domains_count);
    let rank_improvement_score = config.rank_improvement_score(avg_rank_improvement);
    let reshuffle_score = config.reshuffle_score(reshuffle_frequency);
    let interest_score =
        (new_domains_score + rank_improvement_score + reshuffle_score).clamp(0.0, MAX_INTEREST_SCORE);

    tracing::debug!(
        keyword = %keyword,
        date = %curr_date,
        previous = %prev_date,
        common = comparison.common.len(),
        entered = comparison.entered.len(),
        exited = comparison.exited.len(),
        interest_score,
        "Scored day pair"
    );

    InterestScore {
        keyword: keyword.to_string(),
        capture_date: curr_date,
        previous_date: prev_date,
        interest_score,
        new_domains_count,
        avg_rank_improvement,
        reshuffle_frequency,
        new_domains_score,
        rank_improvement_score,
        reshuffle_score,
    }
}
