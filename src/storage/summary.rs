//! Commit statistics over the history index

use crate::fuel::FuelTag;
use crate::storage::{CompletenessTier, HistoryStore, IndexEntry};
use chrono::{Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Commits recorded on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    pub entries: usize,
    pub latest_completeness: CompletenessTier,
    pub latest_regions: usize,
}

/// Summary of the commits recorded over a window of days
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    pub period_days: u32,
    pub total_entries: usize,
    pub unique_dates: usize,

    /// Commits per completeness tier
    pub completeness: BTreeMap<CompletenessTier, usize>,

    /// Number of commits in which each fuel appeared
    pub fuel_frequency: BTreeMap<FuelTag, usize>,

    /// Mean fetched regions per commit, one decimal place
    pub average_regions: Decimal,

    pub by_date: BTreeMap<NaiveDate, DaySummary>,

    /// Most recent commit in the window
    pub latest: IndexEntry,
}

impl HistoryStore {
    /// Summarizes the commits of the last `days` days, today included
    pub fn statistics_summary(&self, days: u32) -> Option<HistorySummary> {
        self.statistics_summary_at(Utc::now().date_naive(), days)
    }

    /// Summarizes the index entries recorded in the `days` days ending at `end`
    ///
    /// # Returns
    ///
    /// * `Some(HistorySummary)` - At least one commit falls in the window
    /// * `None` - The window is empty
    pub fn statistics_summary_at(&self, end: NaiveDate, days: u32) -> Option<HistorySummary> {
        let start = end.checked_sub_days(Days::new(u64::from(days.checked_sub(1)?)))?;
        let index = self.load_index();
        let entries: Vec<&IndexEntry> = index
            .entries
            .iter()
            .filter(|e| (start..=end).contains(&e.timestamp.date_naive()))
            .collect();

        summarize_entries(days, &entries)
    }
}

fn summarize_entries(period_days: u32, entries: &[&IndexEntry]) -> Option<HistorySummary> {
    let latest = entries.iter().max_by_key(|e| e.timestamp)?;

    let mut completeness = BTreeMap::new();
    let mut fuel_frequency = BTreeMap::new();
    let mut days: BTreeMap<NaiveDate, Vec<&IndexEntry>> = BTreeMap::new();
    let mut total_regions = 0usize;

    for entry in entries {
        *completeness.entry(entry.completeness).or_insert(0) += 1;
        for fuel in &entry.fuel_types {
            *fuel_frequency.entry(*fuel).or_insert(0) += 1;
        }
        days.entry(entry.timestamp.date_naive()).or_default().push(*entry);
        total_regions += entry.successful_regions;
    }

    let by_date: BTreeMap<NaiveDate, DaySummary> = days
        .into_iter()
        .filter_map(|(date, day)| {
            let last = day.iter().max_by_key(|e| e.timestamp)?;
            Some((
                date,
                DaySummary {
                    entries: day.len(),
                    latest_completeness: last.completeness,
                    latest_regions: last.successful_regions,
                },
            ))
        })
        .collect();

    Some(HistorySummary {
        period_days,
        total_entries: entries.len(),
        unique_dates: by_date.len(),
        completeness,
        fuel_frequency,
        average_regions: (Decimal::from(total_regions) / Decimal::from(entries.len())).round_dp(1),
        by_date,
        latest: (*latest).clone(),
    })
}
