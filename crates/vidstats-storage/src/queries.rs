//! Read-only aggregate queries over `video_stats` for the reporter.
//!
//! Column types in `video_stats` are inferred at load time, so results are
//! read as dynamic SQLite values and converted here rather than trusting a
//! declared type.

use rusqlite::types::Value as SqlValue;
use rusqlite::{Params, Row};

use vidstats_core::error::VidstatsError;

use crate::db::Database;

/// One bar of the top-videos chart.
#[derive(Debug, Clone, PartialEq)]
pub struct TopVideoRow {
    pub title: String,
    pub views: f64,
}

/// Per-category aggregates.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRow {
    pub category_id: String,
    pub video_count: u64,
    pub avg_views: f64,
    pub avg_likes: f64,
    pub avg_dislikes: f64,
}

/// Per-publish-date aggregates.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyTrendRow {
    pub publish_date: String,
    pub video_count: u64,
    pub avg_views: f64,
}

/// Aggregate queries against `video_stats`.
pub struct VideoStatsQueries<'a> {
    db: &'a Database,
}

impl<'a> VideoStatsQueries<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// The `limit` most viewed videos, highest first.
    pub fn top_videos_by_views(&self, limit: usize) -> Result<Vec<TopVideoRow>, VidstatsError> {
        self.collect(
            "SELECT title, views
             FROM video_stats
             ORDER BY views DESC
             LIMIT ?1",
            [sql_limit(limit)],
            |row| {
                Ok(TopVideoRow {
                    title: label(row.get(0)?),
                    views: number(row.get(1)?),
                })
            },
        )
    }

    /// Counts and averages per `category_id`, by descending average views.
    pub fn category_summary(&self) -> Result<Vec<CategoryRow>, VidstatsError> {
        self.collect(
            "SELECT category_id,
                    COUNT(*) AS video_count,
                    AVG(views) AS avg_views,
                    AVG(likes) AS avg_likes,
                    AVG(dislikes) AS avg_dislikes
             FROM video_stats
             GROUP BY category_id
             ORDER BY avg_views DESC",
            [],
            |row| {
                Ok(CategoryRow {
                    category_id: label(row.get(0)?),
                    video_count: row.get::<_, i64>(1)? as u64,
                    avg_views: number(row.get(2)?),
                    avg_likes: number(row.get(3)?),
                    avg_dislikes: number(row.get(4)?),
                })
            },
        )
    }

    /// Counts and average views per `publish_date`, oldest first.
    pub fn daily_trend(&self) -> Result<Vec<DailyTrendRow>, VidstatsError> {
        self.collect(
            "SELECT publish_date,
                    COUNT(*) AS video_count,
                    AVG(views) AS avg_views
             FROM video_stats
             GROUP BY publish_date
             ORDER BY publish_date",
            [],
            |row| {
                Ok(DailyTrendRow {
                    publish_date: label(row.get(0)?),
                    video_count: row.get::<_, i64>(1)? as u64,
                    avg_views: number(row.get(2)?),
                })
            },
        )
    }

    fn collect<P, T, F>(&self, sql: &str, params: P, map: F) -> Result<Vec<T>, VidstatsError>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(sql)
                .map_err(|e| VidstatsError::Storage(format!("Query prepare: {}", e)))?;
            let rows = stmt
                .query_map(params, map)
                .map_err(|e| VidstatsError::Storage(format!("Query: {}", e)))?;

            let mut results = Vec::new();
            for row in rows {
                results.push(row.map_err(|e| VidstatsError::Storage(e.to_string()))?);
            }
            Ok(results)
        })
    }
}

/// A `LIMIT` operand. SQLite treats a negative limit as unbounded, so this
/// saturates instead of wrapping.
fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Display text for a grouping key or title.
fn label(value: SqlValue) -> String {
    match value {
        SqlValue::Null => "unknown".to_string(),
        SqlValue::Integer(i) => i.to_string(),
        SqlValue::Real(f) => f.to_string(),
        SqlValue::Text(s) => s,
        SqlValue::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

/// Numeric view of an aggregate or measure; NULL and non-numeric text are zero.
fn number(value: SqlValue) -> f64 {
    match value {
        SqlValue::Integer(i) => i as f64,
        SqlValue::Real(f) => f,
        SqlValue::Text(s) => s.trim().parse().unwrap_or(0.0),
        SqlValue::Null | SqlValue::Blob(_) => 0.0,
    }
}
