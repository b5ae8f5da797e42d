//! # Social Pulse CLI (`pulse`)
//!
//! The `pulse` binary is the primary interface for Social Pulse. It
//! provides commands for database initialization, CSV ingestion, ad-hoc
//! classification, batch analysis, aggregate reports, database statistics,
//! and the JSON HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! pulse --config ./config/pulse.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pulse init` | Create the SQLite database and run schema migrations |
//! | `pulse ingest <csv>` | Load a posts dump into the store |
//! | `pulse classify "<text>"` | Classify a text without touching the store |
//! | `pulse analyze "<query>"` | Classify all posts matching a query window |
//! | `pulse report "<query>"` | Build the aggregate dashboard views |
//! | `pulse stats` | Show database counts and coverage |
//! | `pulse serve` | Start the JSON HTTP API |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! pulse init --config ./config/pulse.toml
//!
//! # Load a Sentiment140-style dump
//! pulse ingest ./tweets.csv --limit 10000
//!
//! # Analyze and report on a keyword over the last two weeks
//! pulse report "rust" --days 14 --limit 500
//!
//! # Force reclassification of a query sample
//! pulse analyze "rust" --force
//!
//! # Serve reports over HTTP
//! pulse serve
//! ```

mod analyze;
mod cache;
mod classifier;
mod config;
mod db;
mod ingest;
mod labels;
mod migrate;
mod models;
mod report;
mod server;
mod stats;
mod store;
mod topics;
mod vader;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Social Pulse CLI — a query-driven sentiment analysis and reporting
/// pipeline for social posts.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/pulse.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "pulse",
    about = "Social Pulse — query-driven sentiment analysis over social posts",
    version,
    long_about = "Social Pulse ingests social post dumps into SQLite, classifies them through \
    a transformer-with-lexicon-fallback chain with model-version caching, and aggregates the \
    labeled stream into dashboard views via a CLI and a JSON HTTP API."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/pulse.toml`. Database, classifier, report,
    /// and server settings are read from this file.
    #[arg(long, global = true, default_value = "./config/pulse.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all required tables (posts,
    /// posts_fts) and indexes. This command is idempotent — running it
    /// multiple times is safe.
    Init,

    /// Load a CSV posts dump into the store.
    ///
    /// Accepts the Sentiment140 layout (`target, id, date, flag, user,
    /// text`, headerless) or a one-text-per-row file. Re-ingesting the
    /// same file skips duplicates.
    Ingest {
        /// Path to the CSV file.
        path: PathBuf,

        /// Maximum number of rows to load.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Classify a text without reading or writing the store.
    ///
    /// Runs the classifier chain (transformer when available, lexicon
    /// fallback otherwise) and prints the resulting metadata record.
    Classify {
        /// The text to classify.
        text: String,
    },

    /// Classify every post matching a query window, using cached results
    /// where the model version still matches.
    Analyze {
        /// Free-text query. Leave empty to match all posts.
        #[arg(default_value = "")]
        query: String,

        /// Day window, counted back from now (1–365).
        #[arg(long)]
        days: Option<i64>,

        /// Maximum number of posts to analyze (50–2000).
        #[arg(long)]
        limit: Option<i64>,

        /// Only posts near this point, as `LAT,LON` (requires --radius-km).
        #[arg(long, value_parser = parse_lat_lon)]
        near: Option<(f64, f64)>,

        /// Radius in kilometers around --near.
        #[arg(long, default_value_t = 50.0)]
        radius_km: f64,

        /// Reclassify even when a valid cached result exists.
        #[arg(long)]
        force: bool,
    },

    /// Build the aggregate report for a query window.
    ///
    /// Prints counts, sentiment distribution, daily time series, word
    /// frequencies, hashtag ranking, topic clusters, and sample posts.
    Report {
        /// Free-text query. Leave empty to match all posts.
        #[arg(default_value = "")]
        query: String,

        /// Day window, counted back from now (1–365).
        #[arg(long)]
        days: Option<i64>,

        /// Maximum number of posts to analyze (50–2000).
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Show database counts, coverage, and time range.
    Stats,

    /// Start the JSON HTTP API.
    ///
    /// Binds to the address configured in `[server].bind` and serves
    /// `/health` and `/api/report`.
    Serve,
}

/// Parse a `LAT,LON` pair for the `--near` argument.
fn parse_lat_lon(s: &str) -> Result<(f64, f64), String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("invalid LAT,LON: no ',' found in '{}'", s))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude: '{}'", lat))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude: '{}'", lon))?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(format!("coordinates out of range: {},{}", lat, lon));
    }
    Ok((lat, lon))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Classify needs no database; fall back to built-in defaults when no
    // config file is present.
    if let Commands::Classify { text } = &cli.command {
        let cfg = config::load_config(&cli.config).unwrap_or_else(|_| config::Config::minimal());
        let chain = classifier::ClassifierChain::from_config(&cfg.classifier)?;
        let meta = chain.classify(text).await?;

        println!("label:         {}", meta.label);
        println!("score:         {:.4}", meta.score);
        println!("model:         {}", meta.model);
        println!("model_version: {}", meta.model_version);
        println!("analyzed_at:   {}", meta.analyzed_at.format("%Y-%m-%dT%H:%M:%SZ"));
        println!("raw:           {}", serde_json::to_string(&meta.raw)?);
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest { path, limit } => {
            ingest::run_ingest(&cfg, &path, limit).await?;
        }
        Commands::Analyze {
            query,
            days,
            limit,
            near,
            radius_km,
            force,
        } => {
            let days = days.unwrap_or(cfg.report.default_days);
            let limit = limit.unwrap_or(cfg.report.default_limit);
            let geo = near.map(|(lat, lon)| store::GeoFilter {
                lat,
                lon,
                radius_km,
            });
            analyze::run_analyze(&cfg, &query, days, limit, geo, force).await?;
        }
        Commands::Report { query, days, limit } => {
            let days = days.unwrap_or(cfg.report.default_days);
            let limit = limit.unwrap_or(cfg.report.default_limit);
            report::run_report(&cfg, &query, days, limit).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Classify { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
