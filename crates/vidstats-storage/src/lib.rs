//! vidstats storage crate - SQLite sink and source for `video_stats`.
//!
//! Provides the connection wrapper, the replace-and-index loader used by the
//! load stage, and the read-only aggregate queries used by the reporter.

pub mod db;
pub mod loader;
pub mod queries;

pub use db::Database;
pub use loader::{count_rows, load_table, ColumnType, LoadSummary, VIDEO_STATS_TABLE};
pub use queries::{CategoryRow, DailyTrendRow, TopVideoRow, VideoStatsQueries};
