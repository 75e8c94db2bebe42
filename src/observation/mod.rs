//! Price observations and acquisition runs
//!
//! A [`PriceObservation`] is the outcome of fetching one region once. An
//! [`AcquisitionRun`] collects the observations of one run together with its
//! timing and error list. Both are immutable once built.

mod run;
mod status;

pub use run::AcquisitionRun;
pub use status::ObservationStatus;

use crate::extract::PriceMap;
use crate::regions::Region;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prices observed for one region at one point in time
///
/// Serializes to the snapshot record shape:
/// `{region_id, region_name, fuel_prices, url, timestamp, status}`, plus
/// `error` when the fetch failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub region_id: u32,

    pub region_name: String,

    /// Empty for failed fetches and for pages with no plausible prices
    pub fuel_prices: PriceMap,

    #[serde(rename = "url")]
    pub source_url: String,

    #[serde(rename = "timestamp")]
    pub observed_at: DateTime<Utc>,

    pub status: ObservationStatus,

    #[serde(rename = "error", default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl PriceObservation {
    /// Builds an observation for a page that was fetched
    pub fn success(region: &Region, source_url: impl Into<String>, fuel_prices: PriceMap) -> Self {
        Self {
            region_id: region.id,
            region_name: region.name.clone(),
            fuel_prices,
            source_url: source_url.into(),
            observed_at: Utc::now(),
            status: ObservationStatus::Success,
            error_detail: None,
        }
    }

    /// Builds an observation for a page that could not be fetched
    pub fn error(region: &Region, source_url: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            region_id: region.id,
            region_name: region.name.clone(),
            fuel_prices: PriceMap::new(),
            source_url: source_url.into(),
            observed_at: Utc::now(),
            status: ObservationStatus::Error,
            error_detail: Some(detail.into()),
        }
    }

    /// Returns true for a fetched page that yielded at least one price
    pub fn is_usable(&self) -> bool {
        self.status.is_success() && !self.fuel_prices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuel::FuelTag;
    use rust_decimal::Decimal;

    #[test]
    fn test_snapshot_record_shape() {
        let region = Region::new(77, "Москва");
        let prices = PriceMap::from([(FuelTag::Ai95, Decimal::new(5735, 2))]);
        let observation = PriceObservation::success(&region, "https://example.com/?region=77", prices);

        let value = serde_json::to_value(&observation).unwrap();
        assert_eq!(value["region_id"], 77);
        assert_eq!(value["region_name"], "Москва");
        assert_eq!(value["url"], "https://example.com/?region=77");
        assert_eq!(value["status"], "success");
        assert_eq!(value["fuel_prices"]["AI-95"].as_f64(), Some(57.35));
        assert!(value.get("timestamp").is_some());
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_error_observation() {
        let region = Region::new(18, "Удмуртская Республика");
        let observation = PriceObservation::error(&region, "https://example.com/?region=18", "HTTP 503");

        assert!(!observation.is_usable());
        assert!(observation.fuel_prices.is_empty());

        let value = serde_json::to_value(&observation).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"], "HTTP 503");
    }

    #[test]
    fn test_success_without_prices_is_not_usable() {
        let region = Region::new(1, "Республика Адыгея");
        let observation = PriceObservation::success(&region, "u", PriceMap::new());
        assert!(observation.status.is_success());
        assert!(!observation.is_usable());
    }

    #[test]
    fn test_json_roundtrip() {
        let region = Region::new(77, "Москва");
        let prices = PriceMap::from([(FuelTag::Diesel, Decimal::new(6680, 2))]);
        let observation = PriceObservation::success(&region, "u", prices);

        let json = serde_json::to_string(&observation).unwrap();
        let back: PriceObservation = serde_json::from_str(&json).unwrap();
        assert_eq!(back.fuel_prices, observation.fuel_prices);
        assert_eq!(back.region_id, 77);
    }
}
