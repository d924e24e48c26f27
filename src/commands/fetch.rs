use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::sync::Arc;

use serptrend::config::Config;
use serptrend::crawler::{SerpFetcher, SnapshotCollector};
use serptrend::storage::{open_repository, SnapshotRepository};

pub async fn fetch(
    config: &Config,
    keywords: Vec<String>,
    num_results: u32,
    language: Option<String>,
    date: NaiveDate,
) -> Result<()> {
    if keywords.is_empty() {
        anyhow::bail!("No keywords provided");
    }

    let fetcher = SerpFetcher::new(&config.provider).context("Failed to create SERP client")?;
    let repo = open_repository(&config.database)?;

    let mut collector =
        SnapshotCollector::new(Arc::new(fetcher), Arc::clone(&repo), config.analysis.scoring)
            .with_num_results(num_results);
    if let Some(language) = language {
        collector = collector.with_language(language);
    }

    println!("Fetching snapshots for {} keywords...", keywords.len());
    let report = collector.collect(&keywords, date).await;

    for (keyword, error) in &report.failures {
        println!("Error fetching '{keyword}': {error}");
    }
    println!(
        "\nStored {} of {} keywords ({} without results, {} failed)",
        report.fetched,
        report.keywords_total,
        report.empty,
        report.failed()
    );
    println!("Interest scores computed: {}", report.scores_computed);
    println!("Total snapshots in database: {}", repo.snapshot_count()?);

    Ok(())
}
