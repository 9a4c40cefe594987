//! vidstats report crate - aggregate queries rendered as static charts.
//!
//! Three fixed analyses run against `video_stats`:
//! - Top videos by views (horizontal bar chart)
//! - Average views per category (bar chart)
//! - Average views per publish date (line chart with markers)

pub mod charts;
pub mod error;
pub mod reporter;

pub use error::ReportError;
pub use reporter::{Analysis, AnalysisFailure, ReportSummary, Reporter};
