//! Repository Pattern for Snapshot and Score Storage
//!
//! This module provides trait-based repository abstractions so the analytics
//! code never talks to a database directly, enabling:
//! - Testing the analyzers with in-memory fixtures
//! - Swappable storage backends
//! - A query for full keyword history kept apart from the windowed query
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Analytics / Collector                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Repository Traits                         │
//! │          SnapshotRepository, ScoreRepository                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                  ┌───────────┴───────────┐
//!                  ▼                       ▼
//!         ┌─────────────────┐     ┌─────────────────┐
//!         │     SQLite      │     │      Mock       │
//!         │  Implementation │     │ Implementation  │
//!         └─────────────────┘     └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use serptrend::storage::repository::{SqliteSerpRepository, MockSerpRepository};
//!
//! // Production: use SQLite
//! let repo = SqliteSerpRepository::new("data/serp_data.db")?;
//!
//! // Testing: use Mock
//! let mock_repo = MockSerpRepository::new();
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{InterestScore, Snapshot, SnapshotBatch, SnapshotSummary};

const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// Repository Traits
// ============================================================================

/// Append-only store of SERP observations
pub trait SnapshotRepository: Send + Sync {
    /// Store a batch as the snapshot for its (keyword, date).
    ///
    /// A stored snapshot is never changed: when any row already exists for the
    /// batch's keyword and date, nothing is inserted. Returns the number of
    /// rows inserted.
    fn insert_batch(&self, batch: &SnapshotBatch) -> Result<usize>;

    /// Rows for one keyword on one date, by rank
    fn snapshots_on(&self, keyword: &str, date: NaiveDate) -> Result<Vec<Snapshot>>;

    /// Rows for one keyword with `start <= capture_date <= end`, by date then rank
    fn snapshots_between(&self, keyword: &str, start: NaiveDate, end: NaiveDate)
        -> Result<Vec<Snapshot>>;

    /// Earliest row of every URL ever recorded for a keyword, unbounded by any window
    fn first_appearances(&self, keyword: &str) -> Result<Vec<Snapshot>>;

    /// Latest capture date strictly before `before`
    fn previous_capture_date(&self, keyword: &str, before: NaiveDate) -> Result<Option<NaiveDate>>;

    /// Distinct (keyword, date) pairs, ordered by keyword then date
    fn capture_dates(&self, keyword: Option<&str>) -> Result<Vec<(String, NaiveDate)>>;

    /// Aggregate counts for a keyword
    fn summary(&self, keyword: &str) -> Result<SnapshotSummary>;

    /// Total number of stored rows
    fn snapshot_count(&self) -> Result<usize>;
}

/// Sink for derived interest scores, keyed by (keyword, capture_date)
pub trait ScoreRepository: Send + Sync {
    /// Insert or replace the score for its (keyword, date)
    fn upsert_score(&self, score: &InterestScore) -> Result<()>;

    /// Get the stored score for a (keyword, date)
    fn get_score(&self, keyword: &str, date: NaiveDate) -> Result<Option<InterestScore>>;

    /// Check if a score is stored for a (keyword, date)
    fn has_score(&self, keyword: &str, date: NaiveDate) -> Result<bool> {
        Ok(self.get_score(keyword, date)?.is_some())
    }

    /// Scores with `start <= capture_date <= end`, ascending by date
    fn scores_between(
        &self,
        keyword: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<InterestScore>>;
}

/// Combined snapshot and score storage
pub trait SerpRepository: SnapshotRepository + ScoreRepository {}

impl<T: SnapshotRepository + ScoreRepository> SerpRepository for T {}

// ============================================================================
// SQLite Implementation
// ============================================================================

/// SQLite implementation of both repositories
///
/// Uses `Mutex` to ensure thread-safety for the SQLite connection.
pub struct SqliteSerpRepository {
    conn: Mutex<Connection>,
}

impl SqliteSerpRepository {
    /// Open (or create) a database file
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).context("Failed to open SQLite database")?;

        // Enable WAL mode for better concurrency
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.create_schema()?;

        tracing::info!(path = %path.display(), "SQLite repository initialized");
        Ok(repo)
    }

    /// Create in-memory repository (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to create in-memory SQLite")?;
        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.create_schema()?;
        Ok(repo)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("SQLite connection lock poisoned"))
    }

    /// Create database schema
    fn create_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
                CREATE TABLE IF NOT EXISTS serp_snapshots (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    keyword TEXT NOT NULL,
                    capture_date TEXT NOT NULL,
                    rank INTEGER NOT NULL,
                    url TEXT NOT NULL,
                    domain TEXT NOT NULL DEFAULT '',
                    title TEXT NOT NULL DEFAULT '',
                    snippet TEXT NOT NULL DEFAULT '',
                    captured_at TEXT NOT NULL,
                    UNIQUE(keyword, capture_date, url)
                );

                CREATE INDEX IF NOT EXISTS idx_serp_snapshots_keyword_date
                    ON serp_snapshots(keyword, capture_date);

                CREATE INDEX IF NOT EXISTS idx_serp_snapshots_url_keyword
                    ON serp_snapshots(url, keyword);

                CREATE TABLE IF NOT EXISTS interest_scores (
                    keyword TEXT NOT NULL,
                    capture_date TEXT NOT NULL,
                    previous_date TEXT NOT NULL,
                    interest_score REAL NOT NULL,
                    new_domains_count INTEGER NOT NULL,
                    avg_rank_improvement REAL NOT NULL,
                    reshuffle_frequency REAL NOT NULL,
                    new_domains_score REAL NOT NULL,
                    rank_improvement_score REAL NOT NULL,
                    reshuffle_score REAL NOT NULL,
                    computed_at TEXT NOT NULL,
                    PRIMARY KEY (keyword, capture_date)
                );
                "#,
        )
        .context("Failed to create SQLite schema")?;

        Ok(())
    }

    fn query_snapshots(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<Snapshot>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql).context("Failed to prepare snapshot query")?;
        let rows = stmt
            .query_map(params, snapshot_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read snapshot rows")?;
        Ok(rows)
    }
}

fn date_to_sql(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(value: &str, idx: usize) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    parse_date(&row.get::<_, String>(idx)?, idx)
}

const SNAPSHOT_COLUMNS: &str = "keyword, capture_date, rank, url, domain, title, snippet";

fn snapshot_from_row(row: &Row<'_>) -> rusqlite::Result<Snapshot> {
    Ok(Snapshot {
        keyword: row.get(0)?,
        capture_date: date_column(row, 1)?,
        rank: row.get(2)?,
        url: row.get(3)?,
        domain: row.get(4)?,
        title: row.get(5)?,
        snippet: row.get(6)?,
    })
}

const SCORE_COLUMNS: &str = "keyword, capture_date, previous_date, interest_score, \
    new_domains_count, avg_rank_improvement, reshuffle_frequency, \
    new_domains_score, rank_improvement_score, reshuffle_score";

fn score_from_row(row: &Row<'_>) -> rusqlite::Result<InterestScore> {
    Ok(InterestScore {
        keyword: row.get(0)?,
        capture_date: date_column(row, 1)?,
        previous_date: date_column(row, 2)?,
        interest_score: row.get(3)?,
        new_domains_count: row.get(4)?,
        avg_rank_improvement: row.get(5)?,
        reshuffle_frequency: row.get(6)?,
        new_domains_score: row.get(7)?,
        rank_improvement_score: row.get(8)?,
        reshuffle_score: row.get(9)?,
    })
}

impl SnapshotRepository for SqliteSerpRepository {
    fn insert_batch(&self, batch: &SnapshotBatch) -> Result<usize> {
        let mut conn = self.conn()?;
        let now = Utc::now().to_rfc3339();
        let tx = conn.transaction().context("Failed to begin transaction")?;

        let existing: i64 = tx
            .query_row(
                "SELECT COUNT(*) FROM serp_snapshots WHERE keyword = ?1 AND capture_date = ?2",
                params![batch.keyword, date_to_sql(batch.capture_date)],
                |row| row.get(0),
            )
            .context("Failed to check for an existing snapshot")?;
        if existing > 0 {
            tracing::debug!(
                keyword = %batch.keyword,
                date = %batch.capture_date,
                existing,
                "Snapshot already stored, skipping batch"
            );
            return Ok(0);
        }

        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR IGNORE INTO serp_snapshots
                    (keyword, capture_date, rank, url, domain, title, snippet, captured_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )?;
            for row in &batch.rows {
                inserted += stmt
                    .execute(params![
                        batch.keyword,
                        date_to_sql(batch.capture_date),
                        row.rank,
                        row.url,
                        row.domain,
                        row.title,
                        row.snippet,
                        now,
                    ])
                    .context("Failed to insert snapshot row")?;
            }
        }
        tx.commit().context("Failed to commit snapshot batch")?;

        tracing::debug!(
            keyword = %batch.keyword,
            date = %batch.capture_date,
            inserted,
            "Stored snapshot batch"
        );
        Ok(inserted)
    }

    fn snapshots_on(&self, keyword: &str, date: NaiveDate) -> Result<Vec<Snapshot>> {
        let sql = format!(
            "SELECT {SNAPSHOT_COLUMNS} FROM serp_snapshots
             WHERE keyword = ?1 AND capture_date = ?2
             ORDER BY rank ASC"
        );
        self.query_snapshots(&sql, &[&keyword, &date_to_sql(date)])
    }

    fn snapshots_between(
        &self,
        keyword: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Snapshot>> {
        let sql = format!(
            "SELECT {SNAPSHOT_COLUMNS} FROM serp_snapshots
             WHERE keyword = ?1 AND capture_date >= ?2 AND capture_date <= ?3
             ORDER BY capture_date ASC, rank ASC"
        );
        self.query_snapshots(&sql, &[&keyword, &date_to_sql(start), &date_to_sql(end)])
    }

    fn first_appearances(&self, keyword: &str) -> Result<Vec<Snapshot>> {
        let sql = format!(
            "SELECT {SNAPSHOT_COLUMNS} FROM serp_snapshots s
             WHERE s.keyword = ?1
               AND s.capture_date = (
                   SELECT MIN(f.capture_date) FROM serp_snapshots f
                   WHERE f.keyword = s.keyword AND f.url = s.url
               )
             ORDER BY s.capture_date ASC, s.rank ASC"
        );
        self.query_snapshots(&sql, &[&keyword])
    }

    fn previous_capture_date(&self, keyword: &str, before: NaiveDate) -> Result<Option<NaiveDate>> {
        let conn = self.conn()?;
        let value: Option<String> = conn
            .query_row(
                "SELECT MAX(capture_date) FROM serp_snapshots
                 WHERE keyword = ?1 AND capture_date < ?2",
                params![keyword, date_to_sql(before)],
                |row| row.get(0),
            )
            .context("Failed to find previous capture date")?;

        value
            .map(|v| parse_date(&v, 0).context("Invalid stored capture date"))
            .transpose()
    }

    fn capture_dates(&self, keyword: Option<&str>) -> Result<Vec<(String, NaiveDate)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT keyword, capture_date FROM serp_snapshots
             WHERE ?1 IS NULL OR keyword = ?1
             ORDER BY keyword ASC, capture_date ASC",
        )?;
        let dates = stmt
            .query_map(params![keyword], |row| {
                Ok((row.get::<_, String>(0)?, date_column(row, 1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to list capture dates")?;
        Ok(dates)
    }

    fn summary(&self, keyword: &str) -> Result<SnapshotSummary> {
        let conn = self.conn()?;
        let (total, urls, domains, first, last): (i64, i64, i64, Option<String>, Option<String>) =
            conn.query_row(
                "SELECT COUNT(DISTINCT capture_date), COUNT(DISTINCT url), COUNT(DISTINCT domain),
                        MIN(capture_date), MAX(capture_date)
                 FROM serp_snapshots WHERE keyword = ?1",
                params![keyword],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .context("Failed to summarize snapshots")?;

        Ok(SnapshotSummary {
            keyword: keyword.to_string(),
            total_snapshots: total as usize,
            unique_urls: urls as usize,
            unique_domains: domains as usize,
            first_snapshot: first.map(|v| parse_date(&v, 3)).transpose()?,
            last_snapshot: last.map(|v| parse_date(&v, 4)).transpose()?,
        })
    }

    fn snapshot_count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let total: i64 =
            conn.query_row("SELECT COUNT(*) FROM serp_snapshots", [], |row| row.get(0))?;
        Ok(total as usize)
    }
}

impl ScoreRepository for SqliteSerpRepository {
    fn upsert_score(&self, score: &InterestScore) -> Result<()> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            r#"
                INSERT INTO interest_scores (
                    keyword, capture_date, previous_date, interest_score,
                    new_domains_count, avg_rank_improvement, reshuffle_frequency,
                    new_domains_score, rank_improvement_score, reshuffle_score, computed_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                ON CONFLICT(keyword, capture_date) DO UPDATE SET
                    previous_date = excluded.previous_date,
                    interest_score = excluded.interest_score,
                    new_domains_count = excluded.new_domains_count,
                    avg_rank_improvement = excluded.avg_rank_improvement,
                    reshuffle_frequency = excluded.reshuffle_frequency,
                    new_domains_score = excluded.new_domains_score,
                    rank_improvement_score = excluded.rank_improvement_score,
                    reshuffle_score = excluded.reshuffle_score,
                    computed_at = excluded.computed_at
                "#,
            params![
                score.keyword,
                date_to_sql(score.capture_date),
                date_to_sql(score.previous_date),
                score.interest_score,
                score.new_domains_count,
                score.avg_rank_improvement,
                score.reshuffle_frequency,
                score.new_domains_score,
                score.rank_improvement_score,
                score.reshuffle_score,
                now,
            ],
        )
        .context("Failed to upsert interest score")?;

        Ok(())
    }

    fn get_score(&self, keyword: &str, date: NaiveDate) -> Result<Option<InterestScore>> {
        let conn = self.conn()?;
        let score = conn
            .query_row(
                &format!(
                    "SELECT {SCORE_COLUMNS} FROM interest_scores
                     WHERE keyword = ?1 AND capture_date = ?2"
                ),
                params![keyword, date_to_sql(date)],
                score_from_row,
            )
            .optional()
            .context("Failed to get interest score")?;
        Ok(score)
    }

    fn scores_between(
        &self,
        keyword: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<InterestScore>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SCORE_COLUMNS} FROM interest_scores
             WHERE keyword = ?1 AND capture_date >= ?2 AND capture_date <= ?3
             ORDER BY capture_date ASC"
        ))?;
        let scores = stmt
            .query_map(
                params![keyword, date_to_sql(start), date_to_sql(end)],
                score_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read interest scores")?;
        Ok(scores)
    }
}

// ============================================================================
// Mock Implementation (for testing)
// ============================================================================

/// In-memory implementation of both repositories
///
/// Useful for testing without database dependencies.
pub struct MockSerpRepository {
    snapshots: RwLock<Vec<Snapshot>>,
    scores: RwLock<BTreeMap<(String, NaiveDate), InterestScore>>,
}

impl MockSerpRepository {
    /// Create a new mock repository
    pub fn new() -> Self {
        Self {
            snapshots: RwLock::new(Vec::new()),
            scores: RwLock::new(BTreeMap::new()),
        }
    }

    /// Get the number of stored scores
    pub fn score_count(&self) -> usize {
        self.scores.read().map(|s| s.len()).unwrap_or_default()
    }

    /// Clear all records
    pub fn clear(&self) {
        if let Ok(mut snapshots) = self.snapshots.write() {
            snapshots.clear();
        }
        if let Ok(mut scores) = self.scores.write() {
            scores.clear();
        }
    }

    fn read_snapshots(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<Snapshot>>> {
        self.snapshots
            .read()
            .map_err(|_| anyhow!("Snapshot store lock poisoned"))
    }

    fn select<F>(&self, keyword: &str, keep: F) -> Result<Vec<Snapshot>>
    where
        F: Fn(&Snapshot) -> bool,
    {
        let mut rows: Vec<Snapshot> = self
            .read_snapshots()?
            .iter()
            .filter(|s| s.keyword == keyword && keep(s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.capture_date.cmp(&b.capture_date).then(a.rank.cmp(&b.rank)));
        Ok(rows)
    }
}

impl Default for MockSerpRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotRepository for MockSerpRepository {
    fn insert_batch(&self, batch: &SnapshotBatch) -> Result<usize> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| anyhow!("Snapshot store lock poisoned"))?;

        let day_stored = snapshots
            .iter()
            .any(|s| s.keyword == batch.keyword && s.capture_date == batch.capture_date);
        if day_stored {
            return Ok(0);
        }

        snapshots.extend(batch.rows.iter().map(|row| Snapshot {
            keyword: batch.keyword.clone(),
            capture_date: batch.capture_date,
            ..row.clone()
        }));
        Ok(batch.rows.len())
    }

    fn snapshots_on(&self, keyword: &str, date: NaiveDate) -> Result<Vec<Snapshot>> {
        self.select(keyword, |s| s.capture_date == date)
    }

    fn snapshots_between(
        &self,
        keyword: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Snapshot>> {
        self.select(keyword, |s| start <= s.capture_date && s.capture_date <= end)
    }

    fn first_appearances(&self, keyword: &str) -> Result<Vec<Snapshot>> {
        let history = self.select(keyword, |_| true)?;
        let mut seen = HashSet::new();
        // history is date-ordered, so the first row per URL is its earliest
        Ok(history
            .into_iter()
            .filter(|s| seen.insert(s.url.clone()))
            .collect())
    }

    fn previous_capture_date(&self, keyword: &str, before: NaiveDate) -> Result<Option<NaiveDate>> {
        Ok(self
            .read_snapshots()?
            .iter()
            .filter(|s| s.keyword == keyword && s.capture_date < before)
            .map(|s| s.capture_date)
            .max())
    }

    fn capture_dates(&self, keyword: Option<&str>) -> Result<Vec<(String, NaiveDate)>> {
        let pairs: std::collections::BTreeSet<(String, NaiveDate)> = self
            .read_snapshots()?
            .iter()
            .filter(|s| keyword.map_or(true, |k| s.keyword == k))
            .map(|s| (s.keyword.clone(), s.capture_date))
            .collect();
        Ok(pairs.into_iter().collect())
    }

    fn summary(&self, keyword: &str) -> Result<SnapshotSummary> {
        let rows = self.select(keyword, |_| true)?;
        let dates: HashSet<NaiveDate> = rows.iter().map(|s| s.capture_date).collect();
        let urls: HashSet<&str> = rows.iter().map(|s| s.url.as_str()).collect();
        let domains: HashSet<&str> = rows.iter().map(|s| s.domain.as_str()).collect();

        Ok(SnapshotSummary {
            keyword: keyword.to_string(),
            total_snapshots: dates.len(),
            unique_urls: urls.len(),
            unique_domains: domains.len(),
            first_snapshot: rows.first().map(|s| s.capture_date),
            last_snapshot: rows.last().map(|s| s.capture_date),
        })
    }

    fn snapshot_count(&self) -> Result<usize> {
        Ok(self.read_snapshots()?.len())
    }
}

impl ScoreRepository for MockSerpRepository {
    fn upsert_score(&self, score: &InterestScore) -> Result<()> {
        let mut scores = self
            .scores
            .write()
            .map_err(|_| anyhow!("Score store lock poisoned"))?;
        scores.insert((score.keyword.clone(), score.capture_date), score.clone());
        Ok(())
    }

    fn get_score(&self, keyword: &str, date: NaiveDate) -> Result<Option<InterestScore>> {
        let scores = self
            .scores
            .read()
            .map_err(|_| anyhow!("Score store lock poisoned"))?;
        Ok(scores.get(&(keyword.to_string(), date)).cloned())
    }

    fn scores_between(
        &self,
        keyword: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<InterestScore>> {
        let scores = self
            .scores
            .read()
            .map_err(|_| anyhow!("Score store lock poisoned"))?;
        Ok(scores
            .range((keyword.to_string(), start)..=(keyword.to_string(), end))
            .map(|(_, score)| score.clone())
            .collect())
    }
}

// ============================================================================
// Shared Repository Types
// ============================================================================

/// Thread-safe shared repository wrapper
pub type SharedSerpRepository = Arc<dyn SerpRepository>;

/// Create a shared SQLite repository
pub fn create_sqlite_repository(path: impl AsRef<Path>) -> Result<SharedSerpRepository> {
    let repo = SqliteSerpRepository::new(path)?;
    Ok(Arc::new(repo))
}

/// Create a shared mock repository
pub fn create_mock_repository() -> SharedSerpRepository {
    Arc::new(MockSerpRepository::new())
}

// ============================================================================
// Tests
// ============================================================================
