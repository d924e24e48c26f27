//! End-to-end analytics over the SQLite store

mod common;

use std::sync::Arc;

use serptrend::analytics::{AnalysisWindow, AnalyticsError, BackfillOptions, SerpAnalytics};
use serptrend::config::AnalysisConfig;
use serptrend::models::{OrganicResult, SnapshotBatch};
use serptrend::storage::{ScoreRepository, SnapshotRepository, SqliteSerpRepository};

use common::{batch, date};

const A: &str = "https://nextjs.org/docs";
const B: &str = "https://vercel.com/blog/nextjs";
const C: &str = "https://github.com/vercel/next.js";
const D: &str = "https://www.freecodecamp.org/news/nextjs-tutorial";

fn setup() -> (Arc<SqliteSerpRepository>, SerpAnalytics<SqliteSerpRepository>) {
    let repo = Arc::new(SqliteSerpRepository::in_memory().unwrap());
    let analytics = SerpAnalytics::new(Arc::clone(&repo), AnalysisConfig::default().scoring);
    (repo, analytics)
}

#[test]
fn test_nextjs_day_pair_scores_34() {
    let (repo, analytics) = setup();
    repo.insert_batch(&batch("nextjs", date(2025, 11, 1), &[A, B, C]))
        .unwrap();
    repo.insert_batch(&batch("nextjs", date(2025, 11, 2), &[B, A, D]))
        .unwrap();

    let score = analytics
        .compute_and_store("nextjs", date(2025, 11, 2))
        .unwrap()
        .unwrap();

    assert_eq!(score.previous_date, date(2025, 11, 1));
    assert_eq!(score.new_domains_count, 1);
    assert!(score.avg_rank_improvement.abs() < 1e-9);
    assert!((score.reshuffle_frequency - 1.0).abs() < 1e-9);
    assert!((score.new_domains_score - 4.0).abs() < 1e-9);
    assert!(score.rank_improvement_score.abs() < 1e-9);
    assert!((score.reshuffle_score - 30.0).abs() < 1e-9);
    assert!((score.interest_score - 34.0).abs() < 1e-9);

    let stored = repo.get_score("nextjs", date(2025, 11, 2)).unwrap();
    assert_eq!(stored, Some(score));
}

#[test]
fn test_recompute_is_idempotent() {
    let (repo, analytics) = setup();
    repo.insert_batch(&batch("nextjs", date(2025, 11, 1), &[A, B, C]))
        .unwrap();
    repo.insert_batch(&batch("nextjs", date(2025, 11, 2), &[C, A, D]))
        .unwrap();

    let first = analytics.compute_score("nextjs", date(2025, 11, 2)).unwrap();
    let second = analytics.compute_score("nextjs", date(2025, 11, 2)).unwrap();
    assert_eq!(first, second);

    analytics.compute_and_store("nextjs", date(2025, 11, 2)).unwrap();
    analytics.compute_and_store("nextjs", date(2025, 11, 2)).unwrap();
    let stored = analytics
        .interest_scores(
            "nextjs",
            &AnalysisWindow::between(date(2025, 11, 1), date(2025, 11, 30)).unwrap(),
        )
        .unwrap();
    assert_eq!(stored, vec![first]);
}

#[test]
fn test_first_capture_and_missing_date() {
    let (repo, analytics) = setup();
    repo.insert_batch(&batch("nextjs", date(2025, 11, 1), &[A]))
        .unwrap();

    assert!(matches!(
        analytics.compute_score("nextjs", date(2025, 11, 1)),
        Err(AnalyticsError::InsufficientHistory { .. })
    ));
    assert!(matches!(
        analytics.compute_score("nextjs", date(2025, 11, 3)),
        Err(AnalyticsError::EmptySnapshotBatch { .. })
    ));
}

#[test]
fn test_backfill_across_keywords() {
    let (repo, analytics) = setup();
    for (day, urls) in [(1, vec![A, B]), (2, vec![B, A]), (4, vec![A, C])] {
        repo.insert_batch(&batch("nextjs", date(2025, 11, day), &urls))
            .unwrap();
    }
    repo.insert_batch(&batch("react", date(2025, 11, 1), &[C]))
        .unwrap();

    let report = analytics.backfill(&BackfillOptions::default()).unwrap();
    assert_eq!(report.calculated, 2);
    assert_eq!(report.insufficient_history, 2);

    let only_react = analytics
        .backfill(&BackfillOptions {
            keyword: Some("react".to_string()),
            force: true,
        })
        .unwrap();
    assert_eq!(only_react.calculated, 0);
    assert_eq!(only_react.insufficient_history, 1);

    // day 4 compares against day 2 across the gap
    let day4 = repo.get_score("nextjs", date(2025, 11, 4)).unwrap().unwrap();
    assert_eq!(day4.previous_date, date(2025, 11, 2));
}

#[test]
fn test_volatility_over_window() {
    let (repo, analytics) = setup();
    let ranks_of_a = [1, 3, 1, 5];
    let fillers = [
        "https://f1.com/",
        "https://f2.com/",
        "https://f3.com/",
        "https://f4.com/",
    ];

    for (i, rank) in ranks_of_a.iter().enumerate() {
        let mut urls: Vec<&str> = fillers.to_vec();
        urls.insert(rank - 1, A);
        repo.insert_batch(&batch("nextjs", date(2025, 11, 10 + i as u32), &urls))
            .unwrap();
    }

    let window = AnalysisWindow::trailing(date(2025, 11, 13), 30).unwrap();
    let stats = analytics.volatility("nextjs", &window).unwrap();
    let a = stats.iter().find(|s| s.url == A).unwrap();

    assert_eq!(a.snapshot_count, 4);
    assert_eq!(a.best_rank, 1);
    assert_eq!(a.worst_rank, 5);
    assert!((a.avg_rank - 2.5).abs() < 1e-9);
    assert_eq!(a.rank_changes, 3);
    assert_eq!(stats[0].url, A);

    let narrow = AnalysisWindow::trailing(date(2025, 11, 13), 1).unwrap();
    let a_recent = analytics
        .volatility("nextjs", &narrow)
        .unwrap()
        .into_iter()
        .find(|s| s.url == A)
        .unwrap();
    assert_eq!(a_recent.snapshot_count, 2);
}

#[test]
fn test_new_entrants_use_full_history() {
    let (repo, analytics) = setup();
    repo.insert_batch(&batch("nextjs", date(2025, 10, 1), &[A, B]))
        .unwrap();
    repo.insert_batch(&batch("nextjs", date(2025, 11, 8), &[B, A, D]))
        .unwrap();
    repo.insert_batch(&batch("nextjs", date(2025, 11, 10), &[C, A, D]))
        .unwrap();

    let window = AnalysisWindow::trailing(date(2025, 11, 10), 7).unwrap();
    let entrants = analytics.new_entrants("nextjs", &window).unwrap();
    let urls: Vec<&str> = entrants.iter().map(|e| e.url.as_str()).collect();

    // A re-entered after a drop; D and C are first-ever appearances
    assert_eq!(urls, vec![D, C]);
    assert_eq!(entrants[0].first_seen_date, date(2025, 11, 8));
    assert_eq!(entrants[0].domain, "freecodecamp.org");
    assert_eq!(entrants[0].first_rank, 3);
    assert_eq!(entrants[1].first_rank, 1);
}

#[test]
fn test_content_changes_in_window() {
    let (repo, analytics) = setup();
    let day1 = vec![OrganicResult::new(A, "Next.js Docs", "Learn Next.js")];
    let day2 = vec![OrganicResult::new(A, "Next.js Docs", "Learn Next.js 15")];
    repo.insert_batch(&SnapshotBatch::from_results("nextjs", date(2025, 11, 1), &day1))
        .unwrap();
    repo.insert_batch(&SnapshotBatch::from_results("nextjs", date(2025, 11, 2), &day2))
        .unwrap();

    let window = AnalysisWindow::trailing(date(2025, 11, 2), 30).unwrap();
    let changes = analytics.content_changes("nextjs", &window).unwrap();

    assert_eq!(changes.len(), 1);
    assert!(!changes[0].title_changed);
    assert!(changes[0].snippet_changed);
    assert_eq!(changes[0].previous_snippet, "Learn Next.js");
    assert_eq!(changes[0].new_snippet, "Learn Next.js 15");
}

#[test]
fn test_empty_window_is_not_an_error() {
    let (_repo, analytics) = setup();
    let window = AnalysisWindow::trailing(date(2025, 11, 2), 30).unwrap();

    assert!(analytics.volatility("unknown", &window).unwrap().is_empty());
    assert!(analytics.new_entrants("unknown", &window).unwrap().is_empty());
    assert!(analytics.content_changes("unknown", &window).unwrap().is_empty());
    assert!(AnalysisWindow::trailing(date(2025, 11, 2), 0).is_err());
}

#[test]
fn test_summary() {
    let (repo, analytics) = setup();
    repo.insert_batch(&batch("nextjs", date(2025, 11, 1), &[A, B]))
        .unwrap();
    repo.insert_batch(&batch("nextjs", date(2025, 11, 3), &[A, D]))
        .unwrap();

    let summary = analytics.summary("nextjs").unwrap();
    assert_eq!(summary.total_snapshots, 2);
    assert_eq!(summary.unique_urls, 3);
    assert_eq!(summary.unique_domains, 3);
    assert_eq!(summary.first_snapshot, Some(date(2025, 11, 1)));
    assert_eq!(summary.last_snapshot, Some(date(2025, 11, 3)));
}
