//! Error types shared across the vidstats crates.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the vidstats pipeline.
///
/// Subsystem crates with their own error types implement
/// `From<SubsystemError> for VidstatsError` so that `?` works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VidstatsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Artifact not found: {}", path.display())]
    MissingArtifact { path: PathBuf },

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VidstatsError {
    /// Returns true when the error means an expected input file or table was absent.
    pub fn is_missing_artifact(&self) -> bool {
        matches!(self, VidstatsError::MissingArtifact { .. })
    }
}

impl From<csv::Error> for VidstatsError {
    fn from(err: csv::Error) -> Self {
        VidstatsError::Csv(err.to_string())
    }
}

impl From<toml::de::Error> for VidstatsError {
    fn from(err: toml::de::Error) -> Self {
        VidstatsError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for VidstatsError {
    fn from(err: toml::ser::Error) -> Self {
        VidstatsError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for VidstatsError {
    fn from(err: serde_json::Error) -> Self {
        VidstatsError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for vidstats operations.
pub type Result<T> = std::result::Result<T, VidstatsError>;
