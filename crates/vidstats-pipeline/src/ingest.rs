//! Ingest stage: stage a verbatim copy of the raw record set.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use vidstats_core::artifact::{create_parent_dir, ensure_exists, parse_table};
use vidstats_core::error::{Result, VidstatsError};

use crate::context::StageContext;

/// Where raw records come from.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestSource {
    /// A local CSV file with a header row.
    Csv { path: PathBuf },
    /// The YouTube Data API. Not yet supported.
    YoutubeApi {
        region_code: String,
        max_results: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestSummary {
    pub rows: usize,
    pub columns: usize,
    pub path: PathBuf,
}

/// Copy `source` to the staging artifact at `dest`.
///
/// The staged file holds exactly the bytes that were read; parsing only
/// validates the file and measures its shape.
pub fn ingest(source: &IngestSource, dest: &Path, ctx: &StageContext) -> Result<IngestSummary> {
    ctx.in_scope(|| match source {
        IngestSource::Csv { path } => ingest_csv(path, dest),
        IngestSource::YoutubeApi { region_code, .. } => {
            info!(region_code = %region_code, "YouTube API ingestion requested");
            Err(VidstatsError::NotImplemented(
                "YouTube API ingestion".to_string(),
            ))
        }
    })
}

fn ingest_csv(path: &Path, dest: &Path) -> Result<IngestSummary> {
    info!("Reading data from {}", path.display());
    ensure_exists(path)?;

    let bytes = std::fs::read(path)?;
    let table = parse_table(&bytes)?;
    let (rows, columns) = table.shape();
    info!(rows, columns, "Read records from CSV");

    create_parent_dir(dest)?;
    std::fs::write(dest, &bytes)?;
    info!("Data saved to {}", dest.display());

    Ok(IngestSummary {
        rows,
        columns,
        path: dest.to_path_buf(),
    })
}
