//! Errors raised while querying and rendering the report.

use thiserror::Error;

use vidstats_core::error::VidstatsError;

/// Errors that can occur while producing a report.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("chart error: {0}")]
    Chart(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<VidstatsError> for ReportError {
    fn from(err: VidstatsError) -> Self {
        ReportError::Storage(err.to_string())
    }
}

impl From<ReportError> for VidstatsError {
    fn from(err: ReportError) -> Self {
        VidstatsError::Report(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_chart() {
        let e = ReportError::Chart("backend closed".to_string());
        assert_eq!(e.to_string(), "chart error: backend closed");
    }

    #[test]
    fn test_error_from_storage() {
        let e: ReportError = VidstatsError::Storage("no such table".to_string()).into();
        assert_eq!(e.to_string(), "storage error: Storage error: no such table");
    }

    #[test]
    fn test_error_into_vidstats() {
        let e: VidstatsError = ReportError::Chart("x".to_string()).into();
        assert!(matches!(e, VidstatsError::Report(_)));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only fs");
        let e: ReportError = io_err.into();
        assert!(matches!(e, ReportError::Io(_)));
        assert!(e.to_string().contains("read-only fs"));
    }
}
