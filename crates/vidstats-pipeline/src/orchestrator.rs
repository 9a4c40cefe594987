//! Sequential stage runner.
//!
//! Runs ingest, clean, load and report in order, one artifact handing off to
//! the next. A failure in any of the first three stops the run and fails it;
//! a report failure is logged and recorded but the run still succeeds.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use vidstats_core::config::VidstatsConfig;
use vidstats_core::error::Result;
use vidstats_report::{ReportSummary, Reporter};
use vidstats_storage::{Database, LoadSummary};

use crate::context::{Stage, StageContext};
use crate::ingest::{ingest, IngestSource, IngestSummary};
use crate::load::load;
use crate::transform::clean_transform;

/// What a successful stage produced.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageOutcome {
    Ingested(IngestSummary),
    Cleaned { rows: usize, columns: usize },
    Loaded(LoadSummary),
    Reported(ReportSummary),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageStatus {
    Succeeded,
    Failed { error: String },
    /// Not run because an earlier fatal stage failed.
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
    pub stage: Stage,
    #[serde(flatten)]
    pub status: StageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<StageOutcome>,
}

/// Result of a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stages: Vec<StageRecord>,
    /// True when every fatal stage that ran succeeded.
    pub success: bool,
}

impl RunReport {
    pub fn record(&self, stage: Stage) -> Option<&StageRecord> {
        self.stages.iter().find(|r| r.stage == stage)
    }
}

/// Runs pipeline stages against the artifact locations in a [`VidstatsConfig`].
pub struct Pipeline {
    config: VidstatsConfig,
    top_n: Option<usize>,
}

impl Pipeline {
    pub fn new(config: VidstatsConfig) -> Self {
        Self {
            config,
            top_n: None,
        }
    }

    /// Override `report.top_n` from the configuration.
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = Some(top_n);
        self
    }

    /// Run all four stages in order.
    pub fn run(&self) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(run_id = %run_id, "Starting YouTube data pipeline");

        let mut stages = Vec::with_capacity(Stage::ALL.len());
        let mut halted = false;
        let mut success = true;

        for stage in Stage::ALL {
            if halted {
                stages.push(StageRecord {
                    stage,
                    status: StageStatus::Skipped,
                    outcome: None,
                });
                continue;
            }

            let record = self.execute(&StageContext::new(run_id, stage));
            if let StageStatus::Failed { error } = &record.status {
                if stage.is_fatal() {
                    error!(stage = %stage, error = %error, "Stage failed. Stopping pipeline.");
                    halted = true;
                    success = false;
                } else {
                    warn!(stage = %stage, error = %error, "Stage failed; run continues");
                }
            }
            stages.push(record);
        }

        if success {
            info!(run_id = %run_id, "Pipeline completed successfully");
        } else {
            error!(run_id = %run_id, "Pipeline failed");
        }

        RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            stages,
            success,
        }
    }

    /// Run one stage on its own against the configured artifacts.
    ///
    /// Unlike a full run, a report failure here marks the run failed.
    pub fn run_stage(&self, stage: Stage) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let record = self.execute(&StageContext::new(run_id, stage));
        let success = record.status == StageStatus::Succeeded;

        RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            stages: vec![record],
            success,
        }
    }

    fn execute(&self, ctx: &StageContext) -> StageRecord {
        let stage = ctx.stage();
        ctx.in_scope(|| info!("Running stage"));
        match self.dispatch(ctx) {
            Ok(outcome) => {
                ctx.in_scope(|| info!("Stage completed"));
                StageRecord {
                    stage,
                    status: StageStatus::Succeeded,
                    outcome: Some(outcome),
                }
            }
            Err(e) => StageRecord {
                stage,
                status: StageStatus::Failed {
                    error: e.to_string(),
                },
                outcome: None,
            },
        }
    }

    fn dispatch(&self, ctx: &StageContext) -> Result<StageOutcome> {
        let paths = &self.config.paths;
        match ctx.stage() {
            Stage::Ingest => {
                let source = IngestSource::Csv {
                    path: paths.raw_csv.clone(),
                };
                ingest(&source, &paths.ingested_csv, ctx).map(StageOutcome::Ingested)
            }
            Stage::Clean => {
                let table = clean_transform(&paths.ingested_csv, &paths.cleaned_csv, ctx)?;
                let (rows, columns) = table.shape();
                Ok(StageOutcome::Cleaned { rows, columns })
            }
            Stage::Load => load(&paths.cleaned_csv, &paths.database, ctx).map(StageOutcome::Loaded),
            Stage::Report => ctx.in_scope(|| {
                let db = Database::open_read_only(&paths.database)?;
                let mut reporter = Reporter::new(&paths.figures_dir, &self.config.report);
                if let Some(top_n) = self.top_n {
                    reporter = reporter.with_top_n(top_n);
                }
                let summary = reporter.run(&db)?;
                Ok(StageOutcome::Reported(summary))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidstats_core::config::PathsConfig;

    fn pipeline_in(dir: &std::path::Path) -> Pipeline {
        let mut config = VidstatsConfig::default();
        config.paths = PathsConfig::rooted_at(dir);
        Pipeline::new(config)
    }

    #[test]
    fn test_missing_raw_halts_run() {
        let dir = tempfile::tempdir().unwrap();
        let report = pipeline_in(dir.path()).run();

        assert!(!report.success);
        assert_eq!(report.stages.len(), 4);
        assert!(matches!(
            report.record(Stage::Ingest).unwrap().status,
            StageStatus::Failed { .. }
        ));
        for stage in [Stage::Clean, Stage::Load, Stage::Report] {
            assert_eq!(report.record(stage).unwrap().status, StageStatus::Skipped);
        }
        assert!(!dir.path().join("db").join("youtube.db").exists());
    }

    #[test]
    fn test_report_stage_alone_without_database() {
        let dir = tempfile::tempdir().unwrap();
        let report = pipeline_in(dir.path()).run_stage(Stage::Report);

        assert!(!report.success);
        let StageStatus::Failed { error } = &report.stages[0].status else {
            panic!("expected failure, got {:?}", report.stages[0].status);
        };
        assert!(error.contains("Artifact not found"));
    }

    #[test]
    fn test_run_report_serializes() {
        let dir = tempfile::tempdir().unwrap();
        let report = pipeline_in(dir.path()).run();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["stages"][0]["stage"], "ingest");
        assert_eq!(json["stages"][0]["status"], "failed");
        assert_eq!(json["stages"][1]["status"], "skipped");
    }
}
