//! CLI argument definitions for the vidstats binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use vidstats_pipeline::Stage;

/// vidstats - batch ETL for video statistics: CSV in, SQLite and charts out.
#[derive(Parser, Debug)]
#[command(name = "vidstats", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level or filter directive (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Print the run report as JSON on stdout. Logs go to stderr.
    #[arg(long = "json", global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run every stage in order (the default).
    Run,
    /// Copy the raw CSV to the staging artifact.
    Ingest,
    /// Clean the staged records and derive calendar and engagement columns.
    Clean,
    /// Replace `video_stats` with the cleaned records.
    Load,
    /// Render charts from `video_stats`.
    Report {
        /// Number of videos in the top-by-views chart.
        #[arg(long = "top-n")]
        top_n: Option<usize>,
    },
}

impl Command {
    /// The single stage this command runs, or `None` for a full run.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Command::Run => None,
            Command::Ingest => Some(Stage::Ingest),
            Command::Clean => Some(Stage::Clean),
            Command::Load => Some(Stage::Load),
            Command::Report { .. } => Some(Stage::Report),
        }
    }
}

impl CliArgs {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }

    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > VIDSTATS_CONFIG env var > ./vidstats.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("VIDSTATS_CONFIG") {
            if !p.is_empty() {
                return PathBuf::from(p);
            }
        }
        PathBuf::from("vidstats.toml")
    }

    /// Resolve the log filter directive.
    ///
    /// Priority: --log-level flag > RUST_LOG env var > config file value.
    pub fn resolve_log_filter(&self, config_level: &str) -> String {
        if let Some(ref level) = self.log_level {
            return level.clone();
        }
        if let Ok(filter) = std::env::var("RUST_LOG") {
            if !filter.trim().is_empty() {
                return filter;
            }
        }
        config_level.to_string()
    }
}
