//! Rank volatility per URL over a window

use statrs::statistics::Statistics;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::{Snapshot, VolatilityStat};

/// Compute rank statistics for every URL present in `rows`.
///
/// `rows` are the observations of one keyword inside the window, in any
/// order. The result is ordered by `volatility_pct` descending, then
/// `rank_changes` descending, then URL ascending.
pub fn rank_volatility(rows: &[Snapshot]) -> Vec<VolatilityStat> {
    let mut by_url: BTreeMap<&str, Vec<&Snapshot>> = BTreeMap::new();
    for row in rows {
        by_url.entry(row.url.as_str()).or_default().push(row);
    }

    let mut stats: Vec<VolatilityStat> = by_url
        .into_values()
        .filter_map(|mut observations| {
            observations.sort_by_key(|s| s.capture_date);
            url_stats(&observations)
        })
        .collect();

    stats.sort_by(compare_volatility);
    stats
}

fn url_stats(observations: &[&Snapshot]) -> Option<VolatilityStat> {
    let latest = observations.last()?;
    let ranks: Vec<f64> = observations.iter().map(|s| f64::from(s.rank)).collect();

    let avg_rank = ranks.iter().mean();
    let rank_stddev = if ranks.len() < 2 {
        0.0
    } else {
        finite_or_zero(ranks.iter().std_dev())
    };
    let volatility_pct = if avg_rank > 0.0 {
        finite_or_zero(rank_stddev / avg_rank * 100.0)
    } else {
        0.0
    };
    let rank_changes = observations
        .windows(2)
        .filter(|pair| pair[0].rank != pair[1].rank)
        .count() as u32;

    Some(VolatilityStat {
        url: latest.url.clone(),
        domain: latest.domain.clone(),
        snapshot_count: observations.len() as u32,
        avg_rank: finite_or_zero(avg_rank),
        best_rank: observations.iter().fold(latest.rank, |best, s| best.min(s.rank)),
        worst_rank: observations.iter().fold(latest.rank, |worst, s| worst.max(s.rank)),
        rank_stddev,
        rank_changes,
        volatility_pct,
    })
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn compare_volatility(a: &VolatilityStat, b: &VolatilityStat) -> Ordering {
    b.volatility_pct
        .partial_cmp(&a.volatility_pct)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.rank_changes.cmp(&a.rank_changes))
        .then_with(|| a.url.cmp(&b.url))
}
