use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;

use serptrend::analytics::{AnalysisWindow, BackfillOptions, BackfillReport};
use serptrend::config::Config;
use serptrend::models::InterestScore;
use serptrend::utils::markdown_table;

use super::{fmt_f64, open_analytics};

/// Score series written by `scores --output`
#[derive(Debug, Serialize)]
struct ScoreExport<'a> {
    query: &'a str,
    days: i64,
    start: NaiveDate,
    end: NaiveDate,
    scores: &'a [InterestScore],
}

pub fn calculate_scores(config: &Config, keywords: Vec<String>, force: bool) -> Result<()> {
    let analytics = open_analytics(config)?;

    let total = if keywords.is_empty() {
        println!("Calculating interest scores for all keywords...");
        let report = analytics.backfill(&BackfillOptions {
            keyword: None,
            force,
        })?;
        print_backfill(&report);
        report.calculated
    } else {
        println!(
            "Calculating interest scores for {} keywords...",
            keywords.len()
        );
        let mut total = 0;
        for keyword in keywords {
            let report = analytics
                .backfill(&BackfillOptions {
                    keyword: Some(keyword.clone()),
                    force,
                })
                .with_context(|| format!("Failed to calculate scores for '{keyword}'"))?;
            if report.calculated > 0 {
                println!("  '{keyword}': {} scores calculated", report.calculated);
            }
            total += report.calculated;
        }
        total
    };

    println!("\nTotal interest scores calculated: {total}");
    if total == 0 {
        println!("\nNote: Interest scores require at least 2 snapshots on different days.");
        println!("Fetch snapshots on multiple days to build historical data.");
    }
    Ok(())
}

fn print_backfill(report: &BackfillReport) {
    println!(
        "  calculated: {}, already scored: {}, first captures: {}",
        report.calculated, report.skipped_existing, report.insufficient_history
    );
}

pub fn scores(
    config: &Config,
    query: &str,
    days: Option<i64>,
    as_of: NaiveDate,
    output: Option<PathBuf>,
) -> Result<()> {
    let days = days.unwrap_or(config.analysis.score_history_days);
    let window = AnalysisWindow::trailing(as_of, days)?;
    let analytics = open_analytics(config)?;
    let scores = analytics
        .interest_scores(query, &window)
        .with_context(|| format!("Failed to load interest scores for '{query}'"))?;

    println!("\n=== Interest Scores for '{query}' (last {days} days) ===");
    if scores.is_empty() {
        println!("No interest scores found");
        println!("Note: Interest scores require at least 2 snapshots on different days.");
        println!("To calculate scores for existing data, run:");
        println!("  serptrend calculate-scores --keywords {query}");
        return Ok(());
    }

    println!("\nFound {} scores:\n", scores.len());
    println!("{}", scores_table(&scores));

    if let Some(path) = output {
        let export = ScoreExport {
            query,
            days,
            start: window.start,
            end: window.end,
            scores: &scores,
        };
        let json = serde_json::to_string_pretty(&export)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("\nScore series saved to: {}", path.display());
    }

    Ok(())
}

fn scores_table(scores: &[InterestScore]) -> String {
    let rows: Vec<Vec<String>> = scores
        .iter()
        .map(|s| {
            vec![
                s.capture_date.to_string(),
                fmt_f64(s.interest_score),
                s.new_domains_count.to_string(),
                fmt_f64(s.avg_rank_improvement),
                fmt_f64(s.reshuffle_frequency),
            ]
        })
        .collect();

    markdown_table(
        &[
            "snapshot_date",
            "interest_score",
            "new_domains_count",
            "avg_rank_improvement",
            "reshuffle_frequency",
        ],
        &rows,
    )
}
