//! New-entrant detection
//!
//! A URL is new when its earliest observation across all recorded history
//! falls inside the window. Feeding only windowed rows would misclassify URLs
//! that dropped out and came back, so callers must pass full-history rows
//! (or the earliest row per URL).

use std::collections::HashMap;

use super::window::AnalysisWindow;
use crate::models::{NewEntrant, Snapshot};

/// Find URLs first seen inside `window`.
///
/// Ordered by first-seen date ascending, then first rank ascending, then URL.
pub fn new_entrants(history: &[Snapshot], window: &AnalysisWindow) -> Vec<NewEntrant> {
    let mut earliest: HashMap<&str, &Snapshot> = HashMap::new();
    for row in history {
        earliest
            .entry(row.url.as_str())
            .and_modify(|current| {
                if row.capture_date < current.capture_date {
                    *current = row;
                }
            })
            .or_insert(row);
    }

    let mut entrants: Vec<NewEntrant> = earliest
        .into_values()
        .filter(|first| window.contains(first.capture_date))
        .map(|first| NewEntrant {
            url: first.url.clone(),
            domain: first.domain.clone(),
            first_seen_date: first.capture_date,
            first_rank: first.rank,
            title: first.title.clone(),
            snippet: first.snippet.clone(),
        })
        .collect();

    entrants.sort_by(|a, b| {
        a.first_seen_date
            .cmp(&b.first_seen_date)
            .then_with(|| a.first_rank.cmp(&b.first_rank))
            .then_with(|| a.url.cmp(&b.url))
    });
    entrants
}
