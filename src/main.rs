use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use serptrend::config::{Config, LoggingConfig};

mod commands;

use commands::ReportParams;

#[derive(Parser)]
#[command(
    name = "serptrend",
    version,
    about = "Track daily SERP snapshots and derive search interest trends",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file (environment variables are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path, overrides the configuration
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Reference date for capture and trailing windows (YYYY-MM-DD, default today)
    #[arg(long, global = true)]
    as_of: Option<NaiveDate>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json), overrides the configured format
    #[arg(long, global = true, value_parser = ["text", "json"])]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch SERP snapshots
    Fetch {
        /// Keywords to track
        #[arg(short, long, num_args = 1.., required = true)]
        keywords: Vec<String>,

        /// Results per keyword
        #[arg(short, long, default_value = "10")]
        num_results: u32,

        /// Result language, e.g. en
        #[arg(long)]
        language: Option<String>,
    },

    /// Show summary statistics
    Analyze {
        /// Query keyword
        #[arg(short, long)]
        query: String,
    },

    /// Show rank volatility
    Volatility {
        /// Query keyword
        #[arg(short, long)]
        query: String,

        /// Days to analyze (default 30)
        #[arg(short, long)]
        days: Option<i64>,

        /// Maximum rows to print
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show URLs seen for the first time
    NewEntrants {
        /// Query keyword
        #[arg(short, long)]
        query: String,

        /// Days to analyze (default 7)
        #[arg(short, long)]
        days: Option<i64>,

        /// Maximum rows to print
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show title/snippet changes
    Changes {
        /// Query keyword
        #[arg(short, long)]
        query: String,

        /// Days to analyze (default 30)
        #[arg(short, long)]
        days: Option<i64>,

        /// Maximum rows to print
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Calculate interest scores for existing snapshots
    CalculateScores {
        /// Keywords to calculate scores for (all if omitted)
        #[arg(short, long, num_args = 1..)]
        keywords: Vec<String>,

        /// Recompute scores that already exist
        #[arg(long, default_value = "false")]
        force: bool,
    },

    /// Show interest scores for a query
    Scores {
        /// Query keyword
        #[arg(short, long)]
        query: String,

        /// Days to analyze (default 90)
        #[arg(short, long)]
        days: Option<i64>,

        /// Write the score series as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref(), cli.db)?;

    // Initialize tracing/logging
    setup_tracing(&config.logging, cli.log_format.as_deref(), cli.verbose)?;
    let as_of = cli
        .as_of
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    tracing::info!(as_of = %as_of, db = %config.database.sqlite_path.display(), "serptrend starting");

    match cli.command {
        Commands::Fetch {
            keywords,
            num_results,
            language,
        } => {
            tracing::info!(
                keywords = ?keywords,
                num_results = %num_results,
                "Starting fetch command"
            );
            commands::fetch(&config, keywords, num_results, language, as_of).await?;
        }

        Commands::Analyze { query } => {
            tracing::info!(query = %query, "Starting analyze command");
            commands::analyze(&config, &query)?;
        }

        Commands::Volatility { query, days, limit } => {
            tracing::info!(query = %query, days = ?days, "Starting volatility command");
            commands::volatility(
                &config,
                &ReportParams {
                    query,
                    days,
                    limit,
                    as_of,
                },
            )?;
        }

        Commands::NewEntrants { query, days, limit } => {
            tracing::info!(query = %query, days = ?days, "Starting new-entrants command");
            commands::new_entrants(
                &config,
                &ReportParams {
                    query,
                    days,
                    limit,
                    as_of,
                },
            )?;
        }

        Commands::Changes { query, days, limit } => {
            tracing::info!(query = %query, days = ?days, "Starting changes command");
            commands::changes(
                &config,
                &ReportParams {
                    query,
                    days,
                    limit,
                    as_of,
                },
            )?;
        }

        Commands::CalculateScores { keywords, force } => {
            tracing::info!(keywords = ?keywords, force = %force, "Starting calculate-scores command");
            commands::calculate_scores(&config, keywords, force)?;
        }

        Commands::Scores {
            query,
            days,
            output,
        } => {
            tracing::info!(query = %query, days = ?days, output = ?output, "Starting scores command");
            commands::scores(&config, &query, days, as_of, output)?;
        }
    }

    tracing::info!("serptrend completed successfully");
    Ok(())
}

fn load_config(path: Option<&std::path::Path>, db: Option<PathBuf>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    if let Some(db) = db {
        config.database.sqlite_path = db;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn setup_tracing(logging: &LoggingConfig, cli_format: Option<&str>, verbose: bool) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_new(logging.filter_directive(verbose))
        .context("Invalid log level")?;

    match logging.effective_format(cli_format) {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }

    Ok(())
}
