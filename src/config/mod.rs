//! Configuration management for serptrend
//!
//! This module handles loading and validating configuration from environment variables,
//! files, and command-line arguments.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::analytics::ScoringConfig;

/// Default Bright Data request endpoint
pub const DEFAULT_PROVIDER_ENDPOINT: &str = "https://api.brightdata.com/request";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// SERP provider configuration
    pub provider: ProviderConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Analysis parameters
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// SERP provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Request endpoint URL
    pub endpoint: String,

    /// API token, sent as a bearer token
    pub api_key: Option<String>,

    /// Provider zone name
    pub zone: Option<String>,

    /// Two-letter country code for geo-targeted results
    pub country: Option<String>,

    /// Rate limit (requests per second)
    pub requests_per_second: u32,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path
    pub sqlite_path: PathBuf,
}

/// Analysis parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Interest score normalization, read from the same `[analysis]` table
    #[serde(flatten)]
    pub scoring: ScoringConfig,

    /// Default trailing windows, in days
    pub volatility_days: i64,
    pub new_entrant_days: i64,
    pub content_change_days: i64,
    pub score_history_days: i64,

    /// Maximum rows printed per report
    pub report_limit: usize,
}

/// Accepted `logging.level` values
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Accepted `logging.format` values
pub const LOG_FORMATS: &[&str] = &["text", "json"];

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            volatility_days: 30,
            new_entrant_days: 7,
            content_change_days: 30,
            score_history_days: 90,
            report_limit: 50,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl LoggingConfig {
    /// `EnvFilter` directive for the subscriber
    ///
    /// `verbose` raises the crate to debug and lets other crates log at info.
    #[must_use]
    pub fn filter_directive(&self, verbose: bool) -> String {
        if verbose {
            String::from("serptrend=debug,info")
        } else {
            format!("serptrend={},warn", self.level)
        }
    }

    /// Output format, with a command-line value taking precedence
    #[must_use]
    pub fn effective_format<'a>(&'a self, cli_format: Option<&'a str>) -> &'a str {
        cli_format.unwrap_or(&self.format)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let endpoint = env_non_empty("SERPTREND_PROVIDER_ENDPOINT")
            .unwrap_or_else(|| String::from(DEFAULT_PROVIDER_ENDPOINT));

        let requests_per_second = env_parse::<u32>("SERPTREND_RATE_LIMIT")
            .unwrap_or(defaults.provider.requests_per_second);

        let request_timeout_secs = env_parse::<u64>("SERPTREND_REQUEST_TIMEOUT")
            .unwrap_or(defaults.provider.request_timeout_secs);

        let sqlite_path = std::env::var("SERPTREND_SQLITE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.database.sqlite_path);

        let mut analysis = defaults.analysis;
        if let Some(top_n) = env_parse::<usize>("SERPTREND_TOP_N") {
            analysis.scoring.top_n = top_n;
        }

        let log_level = env_non_empty("SERPTREND_LOG_LEVEL")
            .map(|v| v.trim().to_lowercase())
            .unwrap_or(defaults.logging.level);

        let log_format = env_non_empty("SERPTREND_LOG_FORMAT")
            .map(|v| v.trim().to_lowercase())
            .unwrap_or(defaults.logging.format);

        Ok(Self {
            provider: ProviderConfig {
                endpoint,
                api_key: env_non_empty("BRIGHT_DATA_API_KEY"),
                zone: env_non_empty("BRIGHT_DATA_ZONE"),
                country: env_non_empty("BRIGHT_DATA_COUNTRY"),
                requests_per_second,
                request_timeout_secs,
            },
            database: DatabaseConfig { sqlite_path },
            analysis,
            logging: LoggingConfig {
                level: log_level,
                format: log_format,
            },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.provider.requests_per_second == 0 {
            anyhow::bail!("requests_per_second must be greater than 0");
        }

        if self.provider.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        let scoring = &self.analysis.scoring;
        if scoring.top_n == 0 {
            anyhow::bail!("top_n must be greater than 0");
        }

        let budgets = [
            ("new_domain_budget", scoring.new_domain_budget),
            ("rank_improvement_budget", scoring.rank_improvement_budget),
            ("reshuffle_budget", scoring.reshuffle_budget),
        ];
        for (name, value) in budgets {
            if !value.is_finite() || value < 0.0 {
                anyhow::bail!("{name} must be a non-negative number");
            }
        }

        let windows = [
            ("volatility_days", self.analysis.volatility_days),
            ("new_entrant_days", self.analysis.new_entrant_days),
            ("content_change_days", self.analysis.content_change_days),
            ("score_history_days", self.analysis.score_history_days),
        ];
        for (name, days) in windows {
            if days <= 0 {
                anyhow::bail!("{name} must be positive");
            }
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "logging.level must be one of {}, got {:?}",
                LOG_LEVELS.join(", "),
                self.logging.level
            );
        }

        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            anyhow::bail!(
                "logging.format must be one of {}, got {:?}",
                LOG_FORMATS.join(", "),
                self.logging.format
            );
        }

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.provider.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig {
                endpoint: String::from(DEFAULT_PROVIDER_ENDPOINT),
                api_key: None,
                zone: None,
                country: None,
                requests_per_second: 2,
                request_timeout_secs: 60,
            },
            database: DatabaseConfig {
                sqlite_path: PathBuf::from("data/serp_snapshots.db"),
            },
            analysis: AnalysisConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_top_n() {
        let mut config = Config::default();
        config.analysis.scoring.top_n = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_window_and_budget() {
        let mut config = Config::default();
        config.analysis.new_entrant_days = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.analysis.scoring.reshuffle_budget = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_request_timeout_conversion() {
        let config = Config::default();
        let timeout = config.request_timeout();
        assert_eq!(timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_analysis_scoring_matches_engine_defaults() {
        assert_eq!(AnalysisConfig::default().scoring, ScoringConfig::default());
    }

    #[test]
    fn test_invalid_logging() {
        let mut config = Config::default();
        config.logging.level = String::from("loud");
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.format = String::from("xml");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_logging_filter_and_format() {
        let logging = LoggingConfig {
            level: String::from("debug"),
            format: String::from("json"),
        };

        assert_eq!(logging.filter_directive(false), "serptrend=debug,warn");
        assert_eq!(logging.filter_directive(true), "serptrend=debug,info");
        assert_eq!(logging.effective_format(None), "json");
        assert_eq!(logging.effective_format(Some("text")), "text");
    }
}
