//! Fetch → store → score pipeline against a mock provider

use std::sync::Arc;
use std::time::Duration;

use serptrend::analytics::{AnalysisWindow, ScoringConfig, SerpAnalytics};
use serptrend::crawler::SnapshotCollector;
use serptrend::storage::{create_sqlite_repository, ScoreRepository, SnapshotRepository};
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::fixtures::{fetcher_for, serp_json, wrapped};

async fn mount_day(server: &MockServer, rows: &[(&str, &str, &str)]) {
    server.reset().await;
    Mock::given(method("POST"))
        .and(path("/request"))
        .and(body_partial_json(serde_json::json!({ "format": "json" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(wrapped(&serp_json(rows))))
        .mount(server)
        .await;
}

fn d(day: u32) -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(2025, 11, day).unwrap()
}

#[tokio::test]
async fn test_three_day_pipeline() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let repo = create_sqlite_repository(dir.path().join("serp.db")).unwrap();

    let fetcher = fetcher_for(&server, Duration::from_secs(5));
    let collector =
        SnapshotCollector::new(Arc::new(fetcher), Arc::clone(&repo), ScoringConfig::default());
    let keywords = vec!["nextjs".to_string()];

    mount_day(
        &server,
        &[
            ("https://nextjs.org/docs", "Docs", "Learn"),
            ("https://vercel.com/blog", "Blog", "News"),
            ("https://github.com/vercel/next.js", "GitHub", "Source"),
        ],
    )
    .await;
    let day1 = collector.collect(&keywords, d(1)).await;
    assert_eq!(day1.fetched, 1);
    assert_eq!(day1.rows_inserted, 3);
    assert_eq!(day1.scores_computed, 0);

    mount_day(
        &server,
        &[
            ("https://vercel.com/blog", "Blog", "News"),
            ("https://nextjs.org/docs", "Docs", "Learn"),
            ("https://www.freecodecamp.org/nextjs", "Tutorial", "Guide"),
        ],
    )
    .await;
    let day2 = collector.collect(&keywords, d(2)).await;
    assert_eq!(day2.scores_computed, 1);

    let score = repo.get_score("nextjs", d(2)).unwrap().unwrap();
    assert!((score.interest_score - 34.0).abs() < 1e-9);

    mount_day(
        &server,
        &[
            ("https://vercel.com/blog", "Blog", "Next.js 16 released"),
            ("https://nextjs.org/docs", "Docs", "Learn"),
            ("https://www.freecodecamp.org/nextjs", "Tutorial", "Guide"),
        ],
    )
    .await;
    collector.collect(&keywords, d(3)).await;

    assert_eq!(repo.snapshot_count().unwrap(), 9);

    let analytics = SerpAnalytics::new(Arc::clone(&repo), ScoringConfig::default());
    let window = AnalysisWindow::trailing(d(3), 30).unwrap();

    let changes = analytics.content_changes("nextjs", &window).unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].url, "https://vercel.com/blog");
    assert!(changes[0].snippet_changed);

    let entrants = analytics
        .new_entrants("nextjs", &AnalysisWindow::trailing(d(3), 1).unwrap())
        .unwrap();
    assert_eq!(entrants.len(), 1);
    assert_eq!(entrants[0].domain, "freecodecamp.org");

    let scores = analytics.interest_scores("nextjs", &window).unwrap();
    assert_eq!(scores.len(), 2);
    // day 3 only changed a snippet
    assert!(scores[1].interest_score.abs() < 1e-9);
}
