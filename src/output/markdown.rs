//! Markdown summary generation
//!
//! This module generates a human-readable markdown report of a run,
//! including per-fuel statistics, the region price table and errors.

use crate::fuel::FuelTag;
use crate::observation::AcquisitionRun;
use crate::output::stats::price_statistics;
use crate::output::traits::{OutputResult, SnapshotExporter};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Exports a run as a markdown report
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownExporter;

impl SnapshotExporter for MarkdownExporter {
    fn extension(&self) -> &'static str {
        "md"
    }

    fn export(&self, run: &AcquisitionRun, path: &Path) -> OutputResult<()> {
        generate_markdown_summary(run, path)
    }
}

/// Generates a markdown summary of a run
///
/// # Arguments
///
/// * `run` - The completed acquisition run
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(run: &AcquisitionRun, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(run);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run as markdown
///
/// # Arguments
///
/// * `run` - The completed acquisition run
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_summary(run: &AcquisitionRun) -> String {
    let mut md = String::new();

    md.push_str("# Regional Fuel Prices\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", run.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", run.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {} seconds\n",
        run.duration().num_seconds()
    ));
    md.push_str(&format!(
        "- **Regions**: {} requested, {} fetched, {} failed\n",
        run.requested_region_count,
        run.successful_count,
        run.failed_count()
    ));
    md.push_str(&format!("- **Success Rate**: {:.2}%\n\n", run.success_rate()));

    // Per-fuel statistics
    let stats = price_statistics(run);
    if !stats.is_empty() {
        md.push_str("## Prices by Fuel\n\n");
        md.push_str("| Fuel | Average | Min | Max | Regions |\n");
        md.push_str("|------|---------|-----|-----|---------|\n");
        for (fuel, s) in &stats {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                fuel, s.avg, s.min, s.max, s.count
            ));
        }
        md.push('\n');
    }

    // Region table
    let fuels: Vec<FuelTag> = run.fuel_types_present().into_iter().collect();
    if !fuels.is_empty() {
        md.push_str("## Regions\n\n");

        md.push_str("| ID | Region |");
        for fuel in &fuels {
            md.push_str(&format!(" {} |", fuel));
        }
        md.push('\n');
        md.push_str("|----|--------|");
        for _ in &fuels {
            md.push_str("------|");
        }
        md.push('\n');

        let mut rows: Vec<_> = run.usable().collect();
        rows.sort_by_key(|o| o.region_id);
        for observation in rows {
            md.push_str(&format!(
                "| {} | {} |",
                observation.region_id,
                escape_cell(&observation.region_name)
            ));
            for fuel in &fuels {
                match observation.fuel_prices.get(fuel) {
                    Some(price) => md.push_str(&format!(" {} |", price)),
                    None => md.push_str(" - |"),
                }
            }
            md.push('\n');
        }
        md.push('\n');
    }

    if !run.errors.is_empty() {
        md.push_str("## Errors\n\n");
        for (region_id, detail) in &run.errors {
            md.push_str(&format!("- **{}**: {}\n", region_id, escape_cell(detail)));
        }
        md.push('\n');
    }

    md
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
