//! serptrend - SERP time-series analytics
//!
//! Tracks daily search-result snapshots per keyword and derives trend signals
//! from them: a 0-100 interest score per capture, rank volatility, new entrants
//! and title/snippet changes.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`crawler`] - SERP provider client and snapshot collection
//! - [`models`] - Core data structures and types
//! - [`storage`] - Snapshot and score persistence (SQLite, in-memory)
//! - [`analytics`] - Interest scores and windowed analyzers
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use serptrend::analytics::{AnalysisWindow, SerpAnalytics};
//! use serptrend::config::Config;
//! use serptrend::storage::open_repository;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let repo = open_repository(&config.database)?;
//!     let analytics = SerpAnalytics::new(repo, config.analysis.scoring);
//!
//!     let today = chrono::Local::now().date_naive();
//!     let window = AnalysisWindow::trailing(today, 30)?;
//!     for stat in analytics.volatility("rust async", &window)? {
//!         println!("{} {:.1}%", stat.url, stat.volatility_pct);
//!     }
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod config;
pub mod crawler;
pub mod error;
pub mod models;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::analytics::{
        AnalysisWindow, AnalyticsError, AnalyticsResult, BackfillOptions, ScoringConfig,
        SerpAnalytics,
    };
    pub use crate::config::Config;
    pub use crate::crawler::{SerpFetcher, SerpProvider, SnapshotCollector};
    pub use crate::error::{Error, ErrorCategory, Result, SerpErrorTrait};
    pub use crate::models::{
        ContentChange, InterestScore, NewEntrant, OrganicResult, Snapshot, SnapshotBatch,
        VolatilityStat,
    };
    pub use crate::storage::{open_repository, SerpRepository, SharedSerpRepository};
}

// Direct re-exports for convenience
pub use models::{InterestScore, Snapshot, SnapshotBatch};
