use crate::fuel::FuelTag;
use crate::observation::PriceObservation;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// The complete result of one acquisition run
///
/// Holds exactly one observation per requested region. Observation order is
/// the order in which results arrived, which is unspecified for concurrent
/// runs.
#[derive(Debug, Clone)]
pub struct AcquisitionRun {
    pub observations: Vec<PriceObservation>,

    pub started_at: DateTime<Utc>,

    pub finished_at: DateTime<Utc>,

    pub requested_region_count: usize,

    /// Observations whose page was fetched
    pub successful_count: usize,

    /// Error detail keyed by region id
    pub errors: BTreeMap<u32, String>,
}

impl AcquisitionRun {
    /// Builds a run from its observations, deriving the counts and error list
    pub fn new(
        observations: Vec<PriceObservation>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        let successful_count = observations
            .iter()
            .filter(|o| o.status.is_success())
            .count();
        let errors = observations
            .iter()
            .filter(|o| !o.status.is_success())
            .map(|o| {
                let detail = o
                    .error_detail
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string());
                (o.region_id, detail)
            })
            .collect();

        Self {
            requested_region_count: observations.len(),
            observations,
            started_at,
            finished_at,
            successful_count,
            errors,
        }
    }

    /// Number of regions that could not be fetched
    pub fn failed_count(&self) -> usize {
        self.requested_region_count - self.successful_count
    }

    /// Iterates over fetched pages that yielded prices
    pub fn usable(&self) -> impl Iterator<Item = &PriceObservation> {
        self.observations.iter().filter(|o| o.is_usable())
    }

    /// Returns true if at least one region yielded prices
    pub fn has_usable_observations(&self) -> bool {
        self.usable().next().is_some()
    }

    /// Fuel tags that appear in at least one observation
    pub fn fuel_types_present(&self) -> BTreeSet<FuelTag> {
        self.usable()
            .flat_map(|o| o.fuel_prices.keys().copied())
            .collect()
    }

    /// Wall-clock duration of the run
    pub fn duration(&self) -> Duration {
        self.finished_at - self.started_at
    }

    /// Share of requested regions that were fetched, in percent
    pub fn success_rate(&self) -> f64 {
        if self.requested_region_count == 0 {
            0.0
        } else {
            (self.successful_count as f64 / self.requested_region_count as f64) * 100.0
        }
    }
}
