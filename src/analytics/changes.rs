//! Title and snippet change detection

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::{ContentChange, Snapshot};

/// Compare each observation of a URL with the one before it (by date, any gap).
///
/// A record is emitted when the title or the snippet differs by exact string
/// comparison. Ordered by snapshot date descending, then rank, then URL.
pub fn content_changes(rows: &[Snapshot]) -> Vec<ContentChange> {
    let mut by_url: BTreeMap<&str, Vec<&Snapshot>> = BTreeMap::new();
    for row in rows {
        by_url.entry(row.url.as_str()).or_default().push(row);
    }

    let mut changes = Vec::new();
    for mut observations in by_url.into_values() {
        if observations.len() < 2 {
            continue;
        }
        observations.sort_by_key(|s| s.capture_date);

        for pair in observations.windows(2) {
            let (before, after) = (pair[0], pair[1]);
            let title_changed = before.title != after.title;
            let snippet_changed = before.snippet != after.snippet;

            if title_changed || snippet_changed {
                changes.push(ContentChange {
                    url: after.url.clone(),
                    domain: after.domain.clone(),
                    snapshot_date: after.capture_date,
                    previous_date: before.capture_date,
                    rank: after.rank,
                    previous_title: before.title.clone(),
                    new_title: after.title.clone(),
                    previous_snippet: before.snippet.clone(),
                    new_snippet: after.snippet.clone(),
                    title_changed,
                    snippet_changed,
                });
            }
        }
    }

    changes.sort_by(compare_changes);
    changes
}

fn compare_changes(a: &ContentChange, b: &ContentChange) -> Ordering {
    b.snapshot_date
        .cmp(&a.snapshot_date)
        .then_with(|| a.rank.cmp(&b.rank))
        .then_with(|| a.url.cmp(&b.url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn obs(day: u32, rank: u32, url: &str, title: &str, snippet: &str) -> Snapshot {
        Snapshot::new("kw", NaiveDate::from_ymd_opt(2025, 7, day).unwrap(), rank, url)
            .with_title(title)
            .with_snippet(snippet)
    }

    #[test]
    fn test_snippet_only_change() {
        let rows = vec![
            obs(1, 1, "https://a.com/", "Title", "old snippet"),
            obs(2, 1, "https://a.com/", "Title", "new snippet"),
        ];

        let changes = content_changes(&rows);

        assert_eq!(changes.len(), 1);
        assert!(!changes[0].title_changed);
        assert!(changes[0].snippet_changed);
        assert_eq!(changes[0].previous_snippet, "old snippet");
        assert_eq!(changes[0].new_snippet, "new snippet");
    }

    #[test]
    fn test_compares_with_immediate_predecessor_across_gaps() {
        let rows = vec![
            obs(10, 2, "https://a.com/", "B", "s"),
            obs(1, 2, "https://a.com/", "A", "s"),
            obs(4, 2, "https://a.com/", "A", "s"),
        ];

        let changes = content_changes(&rows);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].previous_date, NaiveDate::from_ymd_opt(2025, 7, 4).unwrap());
        assert_eq!(changes[0].previous_title, "A");
        assert_eq!(changes[0].new_title, "B");
    }

    #[test]
    fn test_no_change_no_record() {
        let rows = vec![
            obs(1, 1, "https://a.com/", "T", "S"),
            obs(2, 3, "https://a.com/", "T", "S"),
            obs(2, 1, "https://b.com/", "only once", ""),
        ];
        assert!(content_changes(&rows).is_empty());
    }

    #[test]
    fn test_most_recent_first() {
        let rows = vec![
            obs(1, 1, "https://a.com/", "a1", ""),
            obs(2, 1, "https://a.com/", "a2", ""),
            obs(3, 1, "https://a.com/", "a3", ""),
            obs(2, 2, "https://b.com/", "b2", ""),
            obs(3, 2, "https://b.com/", "b3", "x"),
        ];

        let changes = content_changes(&rows);
        let order: Vec<_> = changes
            .iter()
            .map(|c| (c.snapshot_date.format("%d").to_string(), c.url.as_str()))
            .collect();

        assert_eq!(
            order,
            vec![
                ("03".to_string(), "https://a.com/"),
                ("03".to_string(), "https://b.com/"),
                ("02".to_string(), "https://a.com/"),
            ]
        );
        assert!(changes[1].title_changed && changes[1].snippet_changed);
    }
}
