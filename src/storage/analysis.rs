//! Comparisons and trends over committed snapshots

use crate::fuel::FuelTag;
use crate::observation::PriceObservation;
use crate::storage::{HistoryError, HistoryResult, HistoryStore};
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Number of individual changes kept per fuel, largest first
const TOP_CHANGES: usize = 20;

/// Changes smaller than one kopeck are ignored
const MIN_CHANGE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Day-over-day movements under this are reported as stable
const STABLE_THRESHOLD: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// One region's price change for one fuel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceChange {
    pub region_id: u32,
    pub region_name: String,
    pub before: Decimal,
    pub after: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
}

/// Summary of the changes for one fuel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuelComparison {
    pub regions_with_changes: usize,
    pub avg_change: Decimal,
    pub max_increase: PriceChange,
    pub max_decrease: PriceChange,

    /// At most twenty changes, largest magnitude first
    pub top_changes: Vec<PriceChange>,
}

/// Price changes between the latest snapshots of two dates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateComparison {
    pub first: NaiveDate,
    pub second: NaiveDate,
    pub common_regions: usize,
    pub only_first: usize,
    pub only_second: usize,

    /// Fuels with at least one change; fuels that did not move are absent
    pub fuel_changes: BTreeMap<FuelTag, FuelComparison>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Stable,
    Rising,
    Falling,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stable => "stable",
            Self::Rising => "rising",
            Self::Falling => "falling",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAverage {
    pub date: NaiveDate,
    pub avg_price: Decimal,
    pub regions_count: usize,
}

/// Average price movement of one fuel over a window of days
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceTrend {
    pub fuel: FuelTag,
    pub period_days: u32,

    /// One point per day with data, oldest first
    pub daily_averages: Vec<DailyAverage>,
    pub direction: TrendDirection,
    pub total_change: Decimal,
    pub total_change_percent: Decimal,
}

impl HistoryStore {
    /// Compares the latest snapshots of two dates
    ///
    /// Only regions present in both snapshots are compared. Pass `fuel` to
    /// restrict the comparison to one fuel type.
    ///
    /// # Returns
    ///
    /// * `Ok(DateComparison)` - Per-fuel changes between the two days
    /// * `Err(HistoryError::MissingSnapshot)` - Nothing was committed on one of the dates
    pub fn compare_dates(
        &self,
        first: NaiveDate,
        second: NaiveDate,
        fuel: Option<FuelTag>,
    ) -> HistoryResult<DateComparison> {
        let before = self
            .latest_snapshot_for_date(first)?
            .ok_or(HistoryError::MissingSnapshot(first))?;
        let after = self
            .latest_snapshot_for_date(second)?
            .ok_or(HistoryError::MissingSnapshot(second))?;

        Ok(compare_snapshots(first, &before, second, &after, fuel))
    }

    /// Computes the daily average trend of `fuel` over `days` days ending at `end`
    ///
    /// Each day contributes the average over its latest snapshot. Days
    /// without a snapshot or without the fuel are skipped.
    ///
    /// # Returns
    ///
    /// * `Ok(PriceTrend)` - At least two days had data
    /// * `Err(HistoryError::InsufficientData)` - Fewer than two days had data
    pub fn price_trend(&self, end: NaiveDate, days: u32, fuel: FuelTag) -> HistoryResult<PriceTrend> {
        let mut daily_averages = Vec::new();

        for offset in (0..days).rev() {
            let Some(date) = end.checked_sub_days(Days::new(u64::from(offset))) else {
                continue;
            };
            let Some(observations) = self.latest_snapshot_for_date(date)? else {
                continue;
            };
            if let Some(point) = daily_average(date, &observations, fuel) {
                daily_averages.push(point);
            }
        }

        trend_from_averages(fuel, days, daily_averages)
    }
}

fn compare_snapshots(
    first: NaiveDate,
    before: &[PriceObservation],
    second: NaiveDate,
    after: &[PriceObservation],
    fuel: Option<FuelTag>,
) -> DateComparison {
    let before = by_region(before);
    let after = by_region(after);

    let common: Vec<u32> = before
        .keys()
        .filter(|id| after.contains_key(*id))
        .copied()
        .collect();

    let mut fuels: BTreeSet<FuelTag> = before
        .values()
        .chain(after.values())
        .flat_map(|o| o.fuel_prices.keys().copied())
        .collect();
    if let Some(only) = fuel {
        fuels.retain(|f| *f == only);
    }

    let mut fuel_changes = BTreeMap::new();
    for fuel in fuels {
        let changes: Vec<PriceChange> = common
            .iter()
            .filter_map(|id| price_change(before[id], after[id], fuel))
            .collect();
        if let Some(summary) = summarize_changes(changes) {
            fuel_changes.insert(fuel, summary);
        }
    }

    DateComparison {
        first,
        second,
        common_regions: common.len(),
        only_first: before.len() - common.len(),
        only_second: after.len() - common.len(),
        fuel_changes,
    }
}

fn by_region(observations: &[PriceObservation]) -> BTreeMap<u32, &PriceObservation> {
    observations
        .iter()
        .filter(|o| o.status.is_success())
        .map(|o| (o.region_id, o))
        .collect()
}

fn price_change(before: &PriceObservation, after: &PriceObservation, fuel: FuelTag) -> Option<PriceChange> {
    let old = *before.fuel_prices.get(&fuel)?;
    let new = *after.fuel_prices.get(&fuel)?;

    let change = (new - old).round_dp(2);
    if change.abs() <= MIN_CHANGE {
        return None;
    }

    let change_percent = if old > Decimal::ZERO {
        (change / old * Decimal::ONE_HUNDRED).round_dp(2)
    } else {
        Decimal::ZERO
    };

    Some(PriceChange {
        region_id: after.region_id,
        region_name: after.region_name.clone(),
        before: old,
        after: new,
        change,
        change_percent,
    })
}

fn summarize_changes(mut changes: Vec<PriceChange>) -> Option<FuelComparison> {
    let max_increase = changes.iter().max_by_key(|c| c.change)?.clone();
    let max_decrease = changes.iter().min_by_key(|c| c.change)?.clone();

    let total: Decimal = changes.iter().map(|c| c.change).sum();
    let avg_change = (total / Decimal::from(changes.len())).round_dp(2);
    let regions_with_changes = changes.len();

    changes.sort_by(|a, b| b.change.abs().cmp(&a.change.abs()));
    changes.truncate(TOP_CHANGES);

    Some(FuelComparison {
        regions_with_changes,
        avg_change,
        max_increase,
        max_decrease,
        top_changes: changes,
    })
}

fn daily_average(date: NaiveDate, observations: &[PriceObservation], fuel: FuelTag) -> Option<DailyAverage> {
    let prices: Vec<Decimal> = observations
        .iter()
        .filter(|o| o.status.is_success())
        .filter_map(|o| o.fuel_prices.get(&fuel).copied())
        .collect();
    if prices.is_empty() {
        return None;
    }

    let total: Decimal = prices.iter().sum();
    Some(DailyAverage {
        date,
        avg_price: (total / Decimal::from(prices.len())).round_dp(2),
        regions_count: prices.len(),
    })
}

fn trend_from_averages(
    fuel: FuelTag,
    period_days: u32,
    daily_averages: Vec<DailyAverage>,
) -> HistoryResult<PriceTrend> {
    let (first, last) = match (daily_averages.first(), daily_averages.last()) {
        (Some(first), Some(last)) if daily_averages.len() >= 2 => (first.avg_price, last.avg_price),
        _ => {
            return Err(HistoryError::InsufficientData {
                found: daily_averages.len(),
            })
        }
    };

    let change = last - first;
    let direction = if change.abs() < STABLE_THRESHOLD {
        TrendDirection::Stable
    } else if change > Decimal::ZERO {
        TrendDirection::Rising
    } else {
        TrendDirection::Falling
    };
    let total_change_percent = if first > Decimal::ZERO {
        (change / first * Decimal::ONE_HUNDRED).round_dp(2)
    } else {
        Decimal::ZERO
    };

    Ok(PriceTrend {
        fuel,
        period_days,
        daily_averages,
        direction,
        total_change: change.round_dp(2),
        total_change_percent,
    })
}
