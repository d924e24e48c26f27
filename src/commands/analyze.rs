use anyhow::{Context, Result};

use serptrend::config::Config;

use super::open_analytics;

pub fn analyze(config: &Config, query: &str) -> Result<()> {
    let analytics = open_analytics(config)?;
    let stats = analytics
        .summary(query)
        .with_context(|| format!("Failed to summarize '{query}'"))?;

    let date_or_none = |date: Option<chrono::NaiveDate>| {
        date.map_or_else(|| "None".to_string(), |d| d.to_string())
    };

    println!("\n=== Summary for '{query}' ===");
    println!("Total snapshots: {}", stats.total_snapshots);
    println!("Unique URLs: {}", stats.unique_urls);
    println!("Unique domains: {}", stats.unique_domains);
    println!("First snapshot: {}", date_or_none(stats.first_snapshot));
    println!("Last snapshot: {}", date_or_none(stats.last_snapshot));

    Ok(())
}
