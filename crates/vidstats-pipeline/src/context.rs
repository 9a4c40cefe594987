//! Stage identity and the per-stage logging context.

use serde::Serialize;
use tracing::{info_span, Span};
use uuid::Uuid;

/// The pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Ingest,
    Clean,
    Load,
    Report,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Ingest, Stage::Clean, Stage::Load, Stage::Report];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Ingest => "ingest",
            Stage::Clean => "clean",
            Stage::Load => "load",
            Stage::Report => "report",
        }
    }

    /// Whether a failure of this stage stops the run and fails it.
    pub fn is_fatal(self) -> bool {
        !matches!(self, Stage::Report)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Logging context handed to a stage.
///
/// Carries the run id and a `stage` span; every event a stage emits is
/// recorded inside that span.
#[derive(Debug, Clone)]
pub struct StageContext {
    run_id: Uuid,
    stage: Stage,
    span: Span,
}

impl StageContext {
    pub fn new(run_id: Uuid, stage: Stage) -> Self {
        let span = info_span!("stage", run_id = %run_id, stage = stage.name());
        Self {
            run_id,
            stage,
            span,
        }
    }

    /// A context with a fresh run id, for running one stage on its own.
    pub fn standalone(stage: Stage) -> Self {
        Self::new(Uuid::new_v4(), stage)
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Run `f` inside this context's span.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        self.span.in_scope(f)
    }
}
