//! Persistence for SERP snapshots and derived interest scores
//!
//! Snapshots are append-only. Scores are upserted per (keyword, capture_date).

pub mod repository;

use anyhow::{Context, Result};

use crate::config::DatabaseConfig;

pub use repository::{
    create_mock_repository, create_sqlite_repository, MockSerpRepository, ScoreRepository,
    SerpRepository, SharedSerpRepository, SnapshotRepository, SqliteSerpRepository,
};

/// Open the configured SQLite store, creating the schema when missing
pub fn open_repository(config: &DatabaseConfig) -> Result<SharedSerpRepository> {
    create_sqlite_repository(&config.sqlite_path).with_context(|| {
        format!(
            "Failed to open snapshot database at {}",
            config.sqlite_path.display()
        )
    })
}
