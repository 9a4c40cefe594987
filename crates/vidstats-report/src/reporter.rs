//! The reporter: runs each fixed analysis against `video_stats` and writes its chart.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{error, info, warn};

use vidstats_core::config::ReportConfig;
use vidstats_storage::{Database, VideoStatsQueries};

use crate::charts;
use crate::error::ReportError;

/// The fixed set of analyses the reporter runs, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Analysis {
    TopVideos,
    CategoryAverages,
    DailyTrend,
}

impl Analysis {
    pub const ALL: [Analysis; 3] = [
        Analysis::TopVideos,
        Analysis::CategoryAverages,
        Analysis::DailyTrend,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Analysis::TopVideos => "top_videos",
            Analysis::CategoryAverages => "category_averages",
            Analysis::DailyTrend => "daily_trend",
        }
    }

    /// Fixed output file name; rewritten on every run.
    pub fn file_name(self) -> &'static str {
        match self {
            Analysis::TopVideos => "top_videos_by_views.svg",
            Analysis::CategoryAverages => "avg_views_by_category.svg",
            Analysis::DailyTrend => "avg_views_over_time.svg",
        }
    }
}

impl std::fmt::Display for Analysis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisFailure {
    pub analysis: Analysis,
    pub error: String,
}

/// Outcome of one reporter run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportSummary {
    pub rendered: Vec<PathBuf>,
    /// Analyses whose query returned no rows.
    pub skipped: Vec<Analysis>,
    pub failed: Vec<AnalysisFailure>,
}

impl ReportSummary {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

enum Outcome {
    Rendered(PathBuf),
    Empty,
}

/// Renders the fixed analyses from `video_stats` into a figures directory.
pub struct Reporter {
    figures_dir: PathBuf,
    top_n: usize,
    size: (u32, u32),
}

impl Reporter {
    pub fn new(figures_dir: impl Into<PathBuf>, config: &ReportConfig) -> Self {
        Self {
            figures_dir: figures_dir.into(),
            top_n: config.top_n,
            size: (config.chart_width, config.chart_height),
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Run every analysis against `db`.
    ///
    /// Only a failure to create the figures directory is returned as an
    /// error. Query and rendering failures are logged and recorded per
    /// analysis in the summary; they never stop the remaining analyses.
    pub fn run(&self, db: &Database) -> Result<ReportSummary, ReportError> {
        std::fs::create_dir_all(&self.figures_dir)?;

        let mut summary = ReportSummary::default();
        for analysis in Analysis::ALL {
            match self.render(db, analysis) {
                Ok(Outcome::Rendered(path)) => {
                    info!(analysis = %analysis, path = %path.display(), "Chart written");
                    summary.rendered.push(path);
                }
                Ok(Outcome::Empty) => {
                    warn!(analysis = %analysis, "No data returned for {} query", analysis);
                    summary.skipped.push(analysis);
                }
                Err(e) => {
                    error!(analysis = %analysis, error = %e, "Analysis failed");
                    summary.failed.push(AnalysisFailure {
                        analysis,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            rendered = summary.rendered.len(),
            skipped = summary.skipped.len(),
            failed = summary.failed.len(),
            "Report complete"
        );
        Ok(summary)
    }

    fn render(&self, db: &Database, analysis: Analysis) -> Result<Outcome, ReportError> {
        let queries = VideoStatsQueries::new(db);
        let path = self.figures_dir.join(analysis.file_name());

        match analysis {
            Analysis::TopVideos => {
                let rows = queries.top_videos_by_views(self.top_n)?;
                if rows.is_empty() {
                    return Ok(Outcome::Empty);
                }
                charts::top_videos_chart(&rows, &path, self.size)?;
            }
            Analysis::CategoryAverages => {
                let rows = queries.category_summary()?;
                if rows.is_empty() {
                    return Ok(Outcome::Empty);
                }
                charts::category_chart(&rows, &path, self.size)?;
            }
            Analysis::DailyTrend => {
                let rows = queries.daily_trend()?;
                if rows.is_empty() {
                    return Ok(Outcome::Empty);
                }
                charts::daily_trend_chart(&rows, &path, self.size)?;
            }
        }
        Ok(Outcome::Rendered(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidstats_core::types::{Table, Value};
    use vidstats_storage::load_table;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn full_columns() -> Vec<String> {
        columns(&[
            "video_id",
            "title",
            "category_id",
            "publish_date",
            "views",
            "likes",
            "dislikes",
        ])
    }

    fn seeded_db() -> Database {
        let db = Database::in_memory().unwrap();
        let row = |id: &str, cat: i64, date: &str, views: i64| {
            vec![
                Value::Text(id.into()),
                Value::Text(format!("Video {id}")),
                Value::Integer(cat),
                Value::Text(date.into()),
                Value::Integer(views),
                Value::Integer(views / 10),
                Value::Integer(1),
            ]
        };
        let table = Table::from_rows(
            full_columns(),
            vec![
                row("a", 10, "2018-01-01", 1500),
                row("b", 10, "2018-01-02", 300),
                row("c", 24, "2018-01-02", 42),
            ],
        );
        load_table(&db, &table).unwrap();
        db
    }

    #[test]
    fn test_analysis_names() {
        assert_eq!(Analysis::TopVideos.file_name(), "top_videos_by_views.svg");
        assert_eq!(Analysis::CategoryAverages.file_name(), "avg_views_by_category.svg");
        assert_eq!(Analysis::DailyTrend.file_name(), "avg_views_over_time.svg");
        assert_eq!(
            serde_json::to_string(&Analysis::DailyTrend).unwrap(),
            "\"daily_trend\""
        );
    }

    #[test]
    fn test_run_renders_all_charts() {
        let dir = tempfile::tempdir().unwrap();
        let figures = dir.path().join("analysis").join("figures");
        let db = seeded_db();

        let summary = Reporter::new(&figures, &ReportConfig::default())
            .run(&db)
            .unwrap();

        assert_eq!(summary.rendered.len(), 3);
        assert!(summary.skipped.is_empty());
        assert!(summary.is_clean());
        for analysis in Analysis::ALL {
            assert!(figures.join(analysis.file_name()).exists());
        }
    }

    #[test]
    fn test_run_on_empty_table_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::in_memory().unwrap();
        load_table(&db, &Table::new(full_columns())).unwrap();

        let summary = Reporter::new(dir.path(), &ReportConfig::default())
            .run(&db)
            .unwrap();

        assert!(summary.rendered.is_empty());
        assert_eq!(summary.skipped, Analysis::ALL.to_vec());
        assert!(summary.is_clean());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_failed_analysis_does_not_stop_others() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::in_memory().unwrap();
        // No publish_date column: the daily trend query fails, the rest render.
        let table = Table::from_rows(
            columns(&["video_id", "title", "category_id", "views", "likes", "dislikes"]),
            vec![vec![
                Value::Text("a".into()),
                Value::Text("Only".into()),
                Value::Integer(10),
                Value::Integer(100),
                Value::Integer(5),
                Value::Integer(1),
            ]],
        );
        load_table(&db, &table).unwrap();

        let summary = Reporter::new(dir.path(), &ReportConfig::default())
            .run(&db)
            .unwrap();

        assert_eq!(summary.rendered.len(), 2);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].analysis, Analysis::DailyTrend);
        assert!(!dir.path().join("avg_views_over_time.svg").exists());
    }

    #[test]
    fn test_with_top_n_limits_bars() {
        let dir = tempfile::tempdir().unwrap();
        let db = seeded_db();

        Reporter::new(dir.path(), &ReportConfig::default())
            .with_top_n(1)
            .run(&db)
            .unwrap();

        let svg = std::fs::read_to_string(dir.path().join("top_videos_by_views.svg")).unwrap();
        assert!(svg.contains("Top 1 Most Viewed Videos"));
    }
}
