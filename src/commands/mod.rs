pub mod analyze;
pub mod fetch;
pub mod report;
pub mod scores;

// Re-export command functions for convenience
pub use analyze::analyze;
pub use fetch::fetch;
pub use report::{changes, new_entrants, volatility, ReportParams};
pub use scores::{calculate_scores, scores};

use anyhow::Result;

use serptrend::analytics::SerpAnalytics;
use serptrend::config::Config;
use serptrend::storage::{open_repository, SerpRepository};

/// Analytics service over the configured database
pub(crate) fn open_analytics(config: &Config) -> Result<SerpAnalytics<dyn SerpRepository>> {
    let repo = open_repository(&config.database)?;
    Ok(SerpAnalytics::new(repo, config.analysis.scoring))
}

/// Two-decimal rendering used in every report table
pub(crate) fn fmt_f64(value: f64) -> String {
    format!("{value:.2}")
}
