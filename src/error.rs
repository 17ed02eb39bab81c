use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced to the current render cycle.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// A source file is missing, unreadable, or does not have the expected shape.
    #[error("{what} unavailable at {}: {detail}", .path.display())]
    DataUnavailable {
        what: &'static str,
        path: PathBuf,
        detail: String,
    },

    /// A record's Year/Month pair does not name a calendar month.
    #[error("row {row}: invalid date {year}-{month:02}")]
    InvalidDate { row: usize, year: i64, month: i64 },

    #[error("not enough data points for decomposition ({points}, need at least {required})")]
    InsufficientData { points: usize, required: usize },

    /// A filter selection outside the loaded data's domain.
    #[error("invalid selection: {0}")]
    InvalidSelection(String),
}

impl DashboardError {
    /// Fold an `anyhow` chain from a loader into `DataUnavailable`.
    pub fn unavailable(what: &'static str, path: impl Into<PathBuf>, err: anyhow::Error) -> Self {
        DashboardError::DataUnavailable {
            what,
            path: path.into(),
            detail: format!("{err:#}"),
        }
    }
}
