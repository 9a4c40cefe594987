//! vidstats pipeline crate - the four stages and the orchestrator that runs them.
//!
//! Stages hand data to each other only through artifacts on disk:
//! raw CSV -> ingested CSV -> cleaned CSV -> `video_stats` -> figures.

pub mod context;
pub mod ingest;
pub mod load;
pub mod orchestrator;
pub mod transform;

pub use context::{Stage, StageContext};
pub use ingest::{ingest, IngestSource, IngestSummary};
pub use load::load;
pub use orchestrator::{Pipeline, RunReport, StageOutcome, StageRecord, StageStatus};
pub use transform::{clean_transform, transform_table};
