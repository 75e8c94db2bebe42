//! Crawler module for fetching regional price pages
//!
//! This module contains the acquisition logic, including:
//! - HTTP fetching with bounded retries
//! - Region list discovery
//! - Request scheduling and pacing
//! - Overall acquisition coordination

mod coordinator;
mod fetcher;
mod retry;
mod scheduler;

pub use coordinator::{Coordinator, ObservationSource};
pub use fetcher::{build_http_client, fetch_url, FetchError, FetchResult, RegionFetcher};
pub use retry::{retry_fixed, RetryPolicy};
pub use scheduler::Scheduler;

use crate::config::Config;
use crate::observation::AcquisitionRun;
use crate::regions::{select_regions, RegionCache, RegionSelection};
use crate::LedgerError;
use std::time::Duration;

/// Runs a complete acquisition
///
/// This is the main entry point for collecting prices. It will:
/// 1. Build the HTTP client
/// 2. Resolve the region list (from `cache` when already resolved)
/// 3. Select the regions to fetch
/// 4. Fetch every selected region, sequentially or concurrently
///
/// # Arguments
///
/// * `config` - The full configuration
/// * `selection` - Which regions to fetch
/// * `max_regions` - Optional cap on the number of regions
/// * `cache` - Region list cache, filled on first use
///
/// # Returns
///
/// * `Ok(AcquisitionRun)` - One observation per selected region
/// * `Err(LedgerError)` - Region discovery failed or nothing was selected
pub async fn acquire(
    config: &Config,
    selection: &RegionSelection,
    max_regions: Option<usize>,
    cache: &mut RegionCache,
) -> Result<AcquisitionRun, LedgerError> {
    let fetcher = RegionFetcher::new(config)?;
    let region_map = fetcher.discover_regions(cache).await?;
    tracing::info!("Resolved {} regions", region_map.len());

    let regions = select_regions(&region_map, selection, max_regions);
    if regions.is_empty() {
        return Err(LedgerError::NoRegions);
    }

    let coordinator = Coordinator::new(
        fetcher,
        Duration::from_millis(config.fetcher.request_delay_ms),
    );
    Ok(coordinator
        .run(regions, config.fetcher.concurrency as usize)
        .await)
}
