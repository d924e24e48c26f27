//! Windowed report commands: volatility, new entrants, content changes

use anyhow::{Context, Result};
use chrono::NaiveDate;

use serptrend::analytics::AnalysisWindow;
use serptrend::config::Config;
use serptrend::models::{ContentChange, NewEntrant, VolatilityStat};
use serptrend::utils::markdown_table;

use super::{fmt_f64, open_analytics};

/// Arguments shared by the windowed reports
#[derive(Debug, Clone)]
pub struct ReportParams {
    pub query: String,
    /// Trailing window; the command's configured default when `None`
    pub days: Option<i64>,
    /// Row cap; `analysis.report_limit` when `None`
    pub limit: Option<usize>,
    pub as_of: NaiveDate,
}

impl ReportParams {
    fn window(&self, default_days: i64) -> Result<(i64, AnalysisWindow)> {
        let days = self.days.unwrap_or(default_days);
        let window = AnalysisWindow::trailing(self.as_of, days)?;
        Ok((days, window))
    }

    fn limit(&self, config: &Config) -> usize {
        self.limit.unwrap_or(config.analysis.report_limit)
    }
}

pub fn volatility(config: &Config, params: &ReportParams) -> Result<()> {
    let (days, window) = params.window(config.analysis.volatility_days)?;
    let analytics = open_analytics(config)?;
    let mut stats = analytics
        .volatility(&params.query, &window)
        .with_context(|| format!("Failed to compute volatility for '{}'", params.query))?;
    stats.truncate(params.limit(config));

    println!(
        "\n=== Rank Volatility for '{}' (last {days} days) ===",
        params.query
    );
    if stats.is_empty() {
        println!("No data found");
        return Ok(());
    }

    println!("\nTop {} most volatile URLs:\n", stats.len());
    println!("{}", volatility_table(&stats));
    Ok(())
}

pub fn new_entrants(config: &Config, params: &ReportParams) -> Result<()> {
    let (days, window) = params.window(config.analysis.new_entrant_days)?;
    let analytics = open_analytics(config)?;
    let mut entrants = analytics
        .new_entrants(&params.query, &window)
        .with_context(|| format!("Failed to find new entrants for '{}'", params.query))?;
    entrants.truncate(params.limit(config));

    println!(
        "\n=== New Entrants for '{}' (last {days} days) ===",
        params.query
    );
    if entrants.is_empty() {
        println!("No new entrants found");
        return Ok(());
    }

    println!("\nFound {} new URLs:\n", entrants.len());
    println!("{}", entrants_table(&entrants));
    Ok(())
}

pub fn changes(config: &Config, params: &ReportParams) -> Result<()> {
    let (days, window) = params.window(config.analysis.content_change_days)?;
    let analytics = open_analytics(config)?;
    let mut changes = analytics
        .content_changes(&params.query, &window)
        .with_context(|| format!("Failed to detect content changes for '{}'", params.query))?;
    changes.truncate(params.limit(config));

    println!(
        "\n=== Content Changes for '{}' (last {days} days) ===",
        params.query
    );
    if changes.is_empty() {
        println!("No changes found");
        return Ok(());
    }

    println!("\nFound {} changes:\n", changes.len());
    println!("{}", changes_table(&changes));
    Ok(())
}

fn volatility_table(stats: &[VolatilityStat]) -> String {
    let rows: Vec<Vec<String>> = stats
        .iter()
        .map(|s| {
            vec![
                s.url.clone(),
                s.domain.clone(),
                s.snapshot_count.to_string(),
                fmt_f64(s.avg_rank),
                s.best_rank.to_string(),
                s.worst_rank.to_string(),
                fmt_f64(s.rank_stddev),
                s.rank_changes.to_string(),
                fmt_f64(s.volatility_pct),
            ]
        })
        .collect();

    markdown_table(
        &[
            "url",
            "domain",
            "snapshot_count",
            "avg_rank",
            "best_rank",
            "worst_rank",
            "rank_stddev",
            "rank_changes",
            "volatility_pct",
        ],
        &rows,
    )
}

fn entrants_table(entrants: &[NewEntrant]) -> String {
    let rows: Vec<Vec<String>> = entrants
        .iter()
        .map(|e| {
            vec![
                e.url.clone(),
                e.domain.clone(),
                e.first_seen_date.to_string(),
                e.first_rank.to_string(),
                e.title.clone(),
                e.snippet.clone(),
            ]
        })
        .collect();

    markdown_table(
        &["url", "domain", "first_seen_date", "first_rank", "title", "snippet"],
        &rows,
    )
}

fn changes_table(changes: &[ContentChange]) -> String {
    let rows: Vec<Vec<String>> = changes
        .iter()
        .map(|c| {
            vec![
                c.url.clone(),
                c.domain.clone(),
                c.snapshot_date.to_string(),
                c.previous_date.to_string(),
                c.rank.to_string(),
                c.previous_title.clone(),
                c.new_title.clone(),
                c.previous_snippet.clone(),
                c.new_snippet.clone(),
                c.title_changed.to_string(),
                c.snippet_changed.to_string(),
            ]
        })
        .collect();

    markdown_table(
        &[
            "url",
            "domain",
            "snapshot_date",
            "previous_date",
            "rank",
            "previous_title",
            "new_title",
            "previous_snippet",
            "new_snippet",
            "title_changed",
            "snippet_changed",
        ],
        &rows,
    )
}
