//! Scheduler for handing out regions to fetch and pacing requests
//!
//! This module handles:
//! - The shared queue of regions still to be fetched
//! - Pacing: the delay that follows every fetch
//! - Progress reporting

use crate::regions::Region;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Scheduler shared by every worker of one acquisition run
///
/// Regions are handed out in request order. Each region is handed out
/// exactly once, no matter how many workers pull from the queue.
pub struct Scheduler {
    /// Regions not yet handed out
    queue: Mutex<VecDeque<Region>>,

    /// Pause that follows each fetch
    request_delay: Duration,

    /// Number of regions the run started with
    total: usize,

    /// Number of regions handed out so far
    issued: AtomicUsize,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `regions` - Regions to fetch, in request order
    /// * `request_delay` - Pause after each fetch
    ///
    /// # Returns
    ///
    /// A new Scheduler instance
    pub fn new(regions: Vec<Region>, request_delay: Duration) -> Self {
        Self {
            total: regions.len(),
            queue: Mutex::new(VecDeque::from(regions)),
            request_delay,
            issued: AtomicUsize::new(0),
        }
    }

    /// Gets the next region to fetch
    ///
    /// # Returns
    ///
    /// * `Some(Region)` - A region nobody else has been given
    /// * `None` - The queue is drained
    pub fn next_region(&self) -> Option<Region> {
        let region = self.lock_queue().pop_front()?;

        let issued = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(
            region_id = region.id,
            "Scheduling region {}/{}: {}",
            issued,
            self.total,
            region.name
        );
        if issued % 10 == 0 {
            tracing::info!("Progress: {}/{} regions scheduled", issued, self.total);
        }

        Some(region)
    }

    /// Waits out the request delay after a fetch
    ///
    /// Skipped when nothing is left to fetch, so the last fetch of a run is
    /// not followed by an idle pause.
    pub async fn pace(&self) {
        if self.request_delay.is_zero() || self.is_empty() {
            return;
        }
        tokio::time::sleep(self.request_delay).await;
    }

    /// Number of regions still waiting in the queue
    pub fn remaining(&self) -> usize {
        self.lock_queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Number of regions the run started with
    pub fn total(&self) -> usize {
        self.total
    }

    fn lock_queue(&self) -> MutexGuard<'_, VecDeque<Region>> {
        // pop_front is the only mutation, so a poisoned queue is still consistent
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn regions(ids: &[u32]) -> Vec<Region> {
        ids.iter()
            .map(|&id| Region::new(id, format!("Region {}", id)))
            .collect()
    }

    #[test]
    fn test_hands_out_in_request_order() {
        let scheduler = Scheduler::new(regions(&[77, 78, 50]), Duration::ZERO);
        assert_eq!(scheduler.total(), 3);

        let ids: Vec<u32> = std::iter::from_fn(|| scheduler.next_region())
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![77, 78, 50]);
        assert!(scheduler.is_empty());
        assert!(scheduler.next_region().is_none());
    }

    #[tokio::test]
    async fn test_each_region_handed_out_once_across_workers() {
        let ids: Vec<u32> = (1..=40).collect();
        let scheduler = Arc::new(Scheduler::new(regions(&ids), Duration::ZERO));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let scheduler = Arc::clone(&scheduler);
            handles.push(tokio::spawn(async move {
                let mut taken = Vec::new();
                while let Some(region) = scheduler.next_region() {
                    taken.push(region.id);
                    tokio::task::yield_now().await;
                }
                taken
            }));
        }

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }

        assert_eq!(all.len(), 40);
        let unique: HashSet<u32> = all.into_iter().collect();
        assert_eq!(unique.len(), 40);
    }

    #[tokio::test]
    async fn test_pace_waits_while_work_remains() {
        let scheduler = Scheduler::new(regions(&[1, 2]), Duration::from_millis(30));
        scheduler.next_region();

        let start = std::time::Instant::now();
        scheduler.pace().await;
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_pace_skipped_after_last_region() {
        let scheduler = Scheduler::new(regions(&[1]), Duration::from_secs(5));
        scheduler.next_region();

        let start = std::time::Instant::now();
        scheduler.pace().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
