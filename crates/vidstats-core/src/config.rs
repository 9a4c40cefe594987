//! TOML configuration for the pipeline: artifact paths, logging and chart settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, VidstatsError};

/// Top-level configuration for the vidstats pipeline.
///
/// Loaded from `./vidstats.toml` by default. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VidstatsConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

impl VidstatsConfig {
    /// Load configuration from a TOML file.
    ///
    /// Logs nothing: the binary reads its config before the subscriber is
    /// installed and reports the outcome itself.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: VidstatsConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| VidstatsError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Locations of the artifacts each stage reads and writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Source CSV consumed by the ingest stage.
    pub raw_csv: PathBuf,
    /// Staging copy written by ingest.
    pub ingested_csv: PathBuf,
    /// Output of the clean/transform stage.
    pub cleaned_csv: PathBuf,
    /// SQLite database file holding `video_stats`.
    pub database: PathBuf,
    /// Directory the report stage writes charts into.
    pub figures_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_csv: PathBuf::from("data/raw_videos.csv"),
            ingested_csv: PathBuf::from("data/ingested.csv"),
            cleaned_csv: PathBuf::from("data/cleaned.csv"),
            database: PathBuf::from("db/youtube.db"),
            figures_dir: PathBuf::from("analysis/figures"),
        }
    }
}

impl PathsConfig {
    /// All paths rooted under `base`. Used by tests and `--base-dir` style overrides.
    pub fn rooted_at(base: &Path) -> Self {
        let defaults = Self::default();
        Self {
            raw_csv: base.join(defaults.raw_csv),
            ingested_csv: base.join(defaults.ingested_csv),
            cleaned_csv: base.join(defaults.cleaned_csv),
            database: base.join(defaults.database),
            figures_dir: base.join(defaults.figures_dir),
        }
    }
}

/// Chart rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Number of videos in the top-by-views chart.
    pub top_n: usize,
    /// Chart width in pixels.
    pub chart_width: u32,
    /// Chart height in pixels.
    pub chart_height: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            chart_width: 1200,
            chart_height: 800,
        }
    }
}
