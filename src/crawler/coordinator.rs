//! Acquisition coordinator - runs region fetches and collects observations
//!
//! This module contains the acquisition loop, including:
//! - Sequential mode: one region at a time with a pause after each fetch
//! - Bounded-concurrent mode: a fixed pool of workers draining a shared queue
//! - Fan-in of results into a single owner
//! - Backfilling an error observation for regions whose worker died

use crate::crawler::scheduler::Scheduler;
use crate::observation::{AcquisitionRun, PriceObservation};
use crate::regions::Region;
use chrono::Utc;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Anything that can turn a region into a price observation
///
/// Implementations must not fail: an unreachable region is reported as an
/// `error` observation.
pub trait ObservationSource: Send + Sync + 'static {
    fn fetch_observation(&self, region: &Region) -> impl Future<Output = PriceObservation> + Send;
}

/// Runs an acquisition over a list of regions
pub struct Coordinator<S> {
    source: Arc<S>,
    request_delay: Duration,
}

impl<S: ObservationSource> Coordinator<S> {
    /// Creates a new coordinator
    ///
    /// # Arguments
    ///
    /// * `source` - Where observations come from
    /// * `request_delay` - Pause after each fetch before the next one
    pub fn new(source: S, request_delay: Duration) -> Self {
        Self {
            source: Arc::new(source),
            request_delay,
        }
    }

    /// Fetches every region and assembles the run
    ///
    /// With `concurrency <= 1` regions are fetched strictly in order.
    /// Otherwise at most `concurrency` fetches are in flight at any moment
    /// and observations arrive in completion order.
    ///
    /// The returned run always holds exactly one observation per region.
    pub async fn run(&self, regions: Vec<Region>, concurrency: usize) -> AcquisitionRun {
        let started_at = Utc::now();
        tracing::info!(
            "Starting acquisition of {} regions (concurrency {})",
            regions.len(),
            concurrency.max(1)
        );

        let observations = if concurrency <= 1 || regions.len() <= 1 {
            self.run_sequential(&regions).await
        } else {
            self.run_concurrent(&regions, concurrency).await
        };

        let run = AcquisitionRun::new(observations, started_at, Utc::now());
        tracing::info!(
            "Acquisition complete: {}/{} regions fetched, {} failed, took {}s",
            run.successful_count,
            run.requested_region_count,
            run.failed_count(),
            run.duration().num_seconds()
        );
        run
    }

    async fn run_sequential(&self, regions: &[Region]) -> Vec<PriceObservation> {
        let scheduler = Scheduler::new(regions.to_vec(), self.request_delay);
        let mut observations = Vec::with_capacity(regions.len());

        while let Some(region) = scheduler.next_region() {
            observations.push(self.source.fetch_observation(&region).await);
            scheduler.pace().await;
        }

        observations
    }

    async fn run_concurrent(&self, regions: &[Region], concurrency: usize) -> Vec<PriceObservation> {
        let scheduler = Arc::new(Scheduler::new(regions.to_vec(), self.request_delay));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut workers = JoinSet::new();

        for worker_id in 0..concurrency.min(regions.len()) {
            let scheduler = Arc::clone(&scheduler);
            let source = Arc::clone(&self.source);
            let tx = tx.clone();

            workers.spawn(async move {
                while let Some(region) = scheduler.next_region() {
                    let observation = source.fetch_observation(&region).await;
                    if tx.send(observation).is_err() {
                        break;
                    }
                    scheduler.pace().await;
                }
                tracing::trace!("Worker {} finished", worker_id);
            });
        }
        drop(tx);

        // The channel closes once every worker has exited or panicked
        let mut observations = Vec::with_capacity(regions.len());
        while let Some(observation) = rx.recv().await {
            observations.push(observation);
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        backfill_missing(regions, &mut observations);
        observations
    }
}

/// Adds an error observation for every region that produced none
fn backfill_missing(regions: &[Region], observations: &mut Vec<PriceObservation>) {
    let seen: HashSet<u32> = observations.iter().map(|o| o.region_id).collect();

    for region in regions.iter().filter(|r| !seen.contains(&r.id)) {
        tracing::error!(region_id = region.id, "No observation produced for {}", region.name);
        observations.push(PriceObservation::error(
            region,
            String::new(),
            "fetch task stopped before completing",
        ));
    }
}
