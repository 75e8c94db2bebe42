//! Price statistics and console reports
//!
//! This module provides per-fuel statistics over a run and the formatted
//! console output for runs, date comparisons, price trends and history
//! maintenance.

use crate::fuel::FuelTag;
use crate::observation::AcquisitionRun;
use crate::storage::{CleanupReport, DateComparison, HistorySummary, PriceTrend};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Price statistics for one fuel type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceStats {
    /// Mean price rounded to two decimal places
    pub avg: Decimal,

    pub min: Decimal,

    pub max: Decimal,

    /// Number of regions reporting this fuel
    pub count: usize,
}

/// Computes per-fuel statistics over the successful observations of a run
///
/// # Arguments
///
/// * `run` - The completed acquisition run
///
/// # Returns
///
/// A map from fuel tag to statistics; fuels nobody reported are absent
pub fn price_statistics(run: &AcquisitionRun) -> BTreeMap<FuelTag, PriceStats> {
    let mut by_fuel: BTreeMap<FuelTag, Vec<Decimal>> = BTreeMap::new();
    for observation in run.usable() {
        for (fuel, price) in &observation.fuel_prices {
            by_fuel.entry(*fuel).or_default().push(*price);
        }
    }

    by_fuel
        .into_iter()
        .filter_map(|(fuel, prices)| summarize(&prices).map(|stats| (fuel, stats)))
        .collect()
}

fn summarize(prices: &[Decimal]) -> Option<PriceStats> {
    let min = prices.iter().min().copied()?;
    let max = prices.iter().max().copied()?;
    let sum: Decimal = prices.iter().sum();
    let mut avg = (sum / Decimal::from(prices.len())).round_dp(2);
    avg.rescale(2);

    Some(PriceStats {
        avg,
        min,
        max,
        count: prices.len(),
    })
}

/// Prints a run summary to stdout
///
/// Shows the fetch counts, per-fuel statistics and the first ten regions
/// with prices.
pub fn print_run_summary(run: &AcquisitionRun) {
    println!("=== Acquisition Summary ===\n");

    println!("Overview:");
    println!("  Regions requested: {}", run.requested_region_count);
    println!(
        "  Regions fetched: {} ({:.1}%)",
        run.successful_count,
        run.success_rate()
    );
    println!("  Regions with prices: {}", run.usable().count());
    println!("  Failed: {}", run.failed_count());
    println!("  Duration: {}s", run.duration().num_seconds());
    println!();

    let stats = price_statistics(run);
    if !stats.is_empty() {
        println!("Prices by Fuel:");
        for (fuel, s) in &stats {
            println!(
                "  {:<8} avg {:>7} | min {:>7} | max {:>7} | {} regions",
                fuel.as_str(),
                s.avg,
                s.min,
                s.max,
                s.count
            );
        }
        println!();
    }

    let usable: Vec<_> = run.usable().collect();
    if !usable.is_empty() {
        println!("Regions:");
        for observation in usable.iter().take(10) {
            let prices: Vec<String> = observation
                .fuel_prices
                .iter()
                .map(|(fuel, price)| format!("{} {}", fuel, price))
                .collect();
            println!(
                "  [{}] {}: {}",
                observation.region_id,
                observation.region_name,
                prices.join(", ")
            );
        }
        if usable.len() > 10 {
            println!("  ... and {} more", usable.len() - 10);
        }
        println!();
    }

    if !run.errors.is_empty() {
        println!("Errors ({}):", run.errors.len());
        for (region_id, detail) in run.errors.iter().take(10) {
            println!("  [{}] {}", region_id, detail);
        }
        println!();
    }
}

/// Prints a date comparison to stdout
pub fn print_comparison(comparison: &DateComparison) {
    println!(
        "=== Price Comparison: {} -> {} ===\n",
        comparison.first, comparison.second
    );
    println!("  Common regions: {}", comparison.common_regions);
    println!("  Only on {}: {}", comparison.first, comparison.only_first);
    println!("  Only on {}: {}", comparison.second, comparison.only_second);
    println!();

    if comparison.fuel_changes.is_empty() {
        println!("No price changes found.");
        return;
    }

    for (fuel, changes) in &comparison.fuel_changes {
        println!("{}:", fuel);
        println!(
            "  Regions with changes: {} | average change: {:+}",
            changes.regions_with_changes, changes.avg_change
        );
        println!(
            "  Largest increase: {} {:+} ({:+}%)",
            changes.max_increase.region_name,
            changes.max_increase.change,
            changes.max_increase.change_percent
        );
        println!(
            "  Largest decrease: {} {:+} ({:+}%)",
            changes.max_decrease.region_name,
            changes.max_decrease.change,
            changes.max_decrease.change_percent
        );
        for change in &changes.top_changes {
            println!(
                "    [{}] {}: {} -> {} ({:+})",
                change.region_id, change.region_name, change.before, change.after, change.change
            );
        }
        println!();
    }
}

/// Prints a price trend to stdout
pub fn print_trend(trend: &PriceTrend) {
    println!(
        "=== {} Trend, {} days ===\n",
        trend.fuel, trend.period_days
    );
    for day in &trend.daily_averages {
        println!(
            "  {}  {:>7}  ({} regions)",
            day.date, day.avg_price, day.regions_count
        );
    }
    println!();
    println!(
        "Overall: {} ({:+}, {:+}%)",
        trend.direction, trend.total_change, trend.total_change_percent
    );
}

/// Prints commit statistics over a window of days to stdout
pub fn print_history_summary(summary: &HistorySummary) {
    println!("=== History, last {} days ===\n", summary.period_days);

    println!("Overview:");
    println!("  Commits: {}", summary.total_entries);
    println!("  Days with data: {}", summary.unique_dates);
    println!("  Average regions per commit: {}", summary.average_regions);
    println!();

    println!("Completeness:");
    for (tier, count) in &summary.completeness {
        println!("  {:<8} {}", tier.as_str(), count);
    }
    println!();

    if !summary.fuel_frequency.is_empty() {
        println!("Fuels seen:");
        for (fuel, count) in &summary.fuel_frequency {
            println!("  {:<8} in {} commits", fuel.as_str(), count);
        }
        println!();
    }

    println!("By date:");
    for (date, day) in summary.by_date.iter().rev() {
        println!(
            "  {}  {} commits, latest {} with {} regions",
            date, day.entries, day.latest_completeness, day.latest_regions
        );
    }
    println!();

    let latest = &summary.latest;
    println!(
        "Latest: {} ({}, {} regions, {} fuels)",
        latest.timestamp.format("%Y-%m-%d %H:%M:%S"),
        latest.completeness,
        latest.successful_regions,
        latest.fuel_types.len()
    );
}

/// Prints what a history cleanup removed to stdout
pub fn print_cleanup_report(report: &CleanupReport) {
    println!("=== History Cleanup ===\n");
    println!("  Days removed: {}", report.removed_days.len());
    println!("  Files removed: {}", report.removed_files);
    println!("  Index entries dropped: {}", report.removed_entries);
    if let (Some(first), Some(last)) = (report.removed_days.first(), report.removed_days.last()) {
        println!("  Range: {} .. {}", first, last);
    }
}
