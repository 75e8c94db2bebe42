//! Snapshot exporter trait and error types
//!
//! Secondary exports (CSV, Markdown) are written next to each dated
//! snapshot. Exporters see only the completed run.

use crate::observation::AcquisitionRun;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writes a secondary rendering of a completed run
///
/// Failures are reported to the caller, which logs them; they never abort
/// a history commit.
pub trait SnapshotExporter: Send + Sync {
    /// File extension of the export, without the dot
    fn extension(&self) -> &'static str;

    /// Writes the export for `run` to `path`
    ///
    /// # Arguments
    ///
    /// * `run` - The completed acquisition run
    /// * `path` - Destination file, next to the dated snapshot
    fn export(&self, run: &AcquisitionRun, path: &Path) -> OutputResult<()>;
}
