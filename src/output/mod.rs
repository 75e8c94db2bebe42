//! Output module for run reports and snapshot exports
//!
//! This module handles:
//! - Per-fuel price statistics
//! - Console summaries of runs, comparisons, trends and history maintenance
//! - Secondary snapshot exports (CSV, Markdown)

mod csv;
mod markdown;
pub mod stats;
mod traits;

pub use csv::{write_csv, CsvExporter};
pub use markdown::{format_markdown_summary, generate_markdown_summary, MarkdownExporter};
pub use stats::{
    price_statistics, print_cleanup_report, print_comparison, print_history_summary, print_run_summary, print_trend,
    PriceStats,
};
pub use traits::{OutputError, OutputResult, SnapshotExporter};
