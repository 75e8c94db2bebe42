//! Storage module for persisting acquisition history
//!
//! This module handles everything written to disk after a run, including:
//! - Completeness classification of a run
//! - Dated, immutable JSON snapshots plus a per-date "latest" copy
//! - The capped history index
//! - Queries, date comparisons and price trends over past snapshots
//! - Commit statistics and retention cleanup

mod analysis;
mod index;
mod retention;
mod store;
mod summary;
mod tier;

pub use analysis::{DailyAverage, DateComparison, FuelComparison, PriceChange, PriceTrend, TrendDirection};
pub use index::{HistoryIndex, IndexEntry, SnapshotFiles};
pub use retention::CleanupReport;
pub use store::{HistorySnapshot, HistoryStore};
pub use summary::{DaySummary, HistorySummary};
pub use tier::CompletenessTier;

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during history operations
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No snapshot recorded for {0}")]
    MissingSnapshot(NaiveDate),

    #[error("Not enough history for a trend: {found} day(s) with data, at least 2 needed")]
    InsufficientData { found: usize },
}

impl HistoryError {
    /// Wraps an IO error with the path it occurred on
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> HistoryError {
        let path = path.to_path_buf();
        move |source| HistoryError::Io { path, source }
    }
}

/// Result type for history operations
pub type HistoryResult<T> = Result<T, HistoryError>;
