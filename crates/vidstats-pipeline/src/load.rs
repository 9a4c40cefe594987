//! Load stage: cleaned artifact into the SQLite `video_stats` table.

use std::path::Path;

use tracing::info;

use vidstats_core::artifact::read_table;
use vidstats_core::error::Result;
use vidstats_storage::{load_table, Database, LoadSummary};

use crate::context::StageContext;

/// Load the cleaned artifact at `input` into `video_stats` in the database at `db_path`.
///
/// The artifact is checked before the database is touched, so a missing
/// input never creates an empty database file.
pub fn load(input: &Path, db_path: &Path, ctx: &StageContext) -> Result<LoadSummary> {
    ctx.in_scope(|| {
        info!("Reading cleaned data from {}", input.display());
        let table = read_table(input)?;

        let db = Database::open(db_path)?;
        let summary = load_table(&db, &table)?;
        info!(
            rows_loaded = summary.rows_loaded,
            indexes = summary.indexes.len(),
            "Data loaded into {}",
            db_path.display()
        );
        Ok(summary)
    })
}
