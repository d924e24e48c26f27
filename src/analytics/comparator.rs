//! Day-pair comparison between two consecutive snapshot batches
//!
//! URLs are matched by exact string equality. Two pages on the same domain
//! are distinct entries.

use std::collections::HashMap;

use crate::models::Snapshot;

/// A URL present in both batches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankMove<'a> {
    pub url: &'a str,
    pub domain: &'a str,
    pub prev_rank: u32,
    pub curr_rank: u32,
}

impl RankMove<'_> {
    /// Positions gained; negative when the URL moved down
    #[must_use]
    pub fn improvement(&self) -> i64 {
        i64::from(self.prev_rank) - i64::from(self.curr_rank)
    }

    #[must_use]
    pub fn changed(&self) -> bool {
        self.prev_rank != self.curr_rank
    }
}

/// Result of comparing a previous batch against a current one
#[derive(Debug, Clone, Default)]
pub struct DayPairComparison<'a> {
    /// URLs in both batches, ordered by current rank
    pub common: Vec<RankMove<'a>>,
    /// URLs only in the current batch, ordered by rank
    pub entered: Vec<&'a Snapshot>,
    /// URLs only in the previous batch, ordered by rank
    pub exited: Vec<&'a Snapshot>,
}

/// Compare two batches of the same keyword
///
/// Accepts anything that yields borrowed rows, so a caller can pass a slice
/// or a filtered subset without cloning.
pub fn compare<'a, P, C>(prev: P, curr: C) -> DayPairComparison<'a>
where
    P: IntoIterator<Item = &'a Snapshot>,
    C: IntoIterator<Item = &'a Snapshot>,
{
    let prev: Vec<&'a Snapshot> = prev.into_iter().collect();
    let curr: Vec<&'a Snapshot> = curr.into_iter().collect();

    let prev_by_url: HashMap<&str, &Snapshot> =
        prev.iter().map(|&s| (s.url.as_str(), s)).collect();
    let curr_by_url: HashMap<&str, &Snapshot> =
        curr.iter().map(|&s| (s.url.as_str(), s)).collect();

    let mut comparison = DayPairComparison::default();

    for &snap in &curr {
        match prev_by_url.get(snap.url.as_str()) {
            Some(before) => comparison.common.push(RankMove {
                url: &snap.url,
                domain: &snap.domain,
                prev_rank: before.rank,
                curr_rank: snap.rank,
            }),
            None => comparison.entered.push(snap),
        }
    }

    comparison.exited = prev
        .into_iter()
        .filter(|s| !curr_by_url.contains_key(s.url.as_str()))
        .collect();

    comparison.common.sort_by_key(|m| m.curr_rank);
    comparison.entered.sort_by_key(|s| s.rank);
    comparison.exited.sort_by_key(|s| s.rank);

    comparison
}
