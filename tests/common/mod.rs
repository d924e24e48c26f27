//! Common test utilities

use chrono::NaiveDate;
use serptrend::models::{OrganicResult, SnapshotBatch};

/// Calendar date shorthand
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Organic results with generated titles and snippets, in rank order
pub fn organic(urls: &[&str]) -> Vec<OrganicResult> {
    urls.iter()
        .map(|url| OrganicResult::new(*url, format!("Title of {url}"), format!("About {url}")))
        .collect()
}

/// Batch ranked in the given URL order
#[allow(dead_code)]
pub fn batch(keyword: &str, day: NaiveDate, urls: &[&str]) -> SnapshotBatch {
    SnapshotBatch::from_results(keyword, day, &organic(urls))
}
