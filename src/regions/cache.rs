//! Region map caching
//!
//! Region discovery costs a page fetch and a scan of its scripts, so the first
//! successful resolution is kept for the rest of the process. The cache is an
//! ordinary value owned by the caller, which makes "not resolved yet" an
//! explicit state rather than a global.

use crate::regions::{resolve_regions, RegionMap};
use chrono::{DateTime, Duration, Utc};

/// A resolved region map and where it came from
#[derive(Debug, Clone)]
pub struct CachedRegions {
    /// The resolved map (never empty)
    pub regions: RegionMap,

    /// Page the map was resolved from
    pub source_url: String,

    /// When the map was resolved
    pub resolved_at: DateTime<Utc>,
}

/// Holds the region map once it has been resolved
#[derive(Debug, Clone, Default)]
pub struct RegionCache {
    entry: Option<CachedRegions>,
}

impl RegionCache {
    /// Creates an unresolved cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache that is already resolved to `regions`
    ///
    /// An empty map leaves the cache unresolved.
    pub fn with_regions(regions: RegionMap, source_url: impl Into<String>) -> Self {
        if regions.is_empty() {
            return Self::new();
        }
        Self {
            entry: Some(CachedRegions {
                regions,
                source_url: source_url.into(),
                resolved_at: Utc::now(),
            }),
        }
    }

    /// Returns true once a non-empty map has been cached
    pub fn is_resolved(&self) -> bool {
        self.entry.is_some()
    }

    /// Returns the cached map, if resolved
    pub fn regions(&self) -> Option<&RegionMap> {
        self.entry.as_ref().map(|entry| &entry.regions)
    }

    /// Returns the cached entry with its provenance, if resolved
    pub fn entry(&self) -> Option<&CachedRegions> {
        self.entry.as_ref()
    }

    /// Resolves the region map from a page, unless one is already cached
    ///
    /// # Arguments
    ///
    /// * `source_url` - URL the page was fetched from
    /// * `html` - Page markup
    ///
    /// # Returns
    ///
    /// * `Some(&RegionMap)` - The cached map (possibly from an earlier call)
    /// * `None` - Nothing cached yet and this page held no region list
    pub fn resolve_from(&mut self, source_url: &str, html: &str) -> Option<&RegionMap> {
        if self.entry.is_none() {
            let regions = resolve_regions(html);
            if regions.is_empty() {
                tracing::debug!("No region list found in {}", source_url);
                return None;
            }
            tracing::info!("Resolved {} regions from {}", regions.len(), source_url);
            self.entry = Some(CachedRegions {
                regions,
                source_url: source_url.to_string(),
                resolved_at: Utc::now(),
            });
        }

        self.regions()
    }

    /// Returns how long ago the map was resolved
    pub fn age(&self) -> Option<Duration> {
        self.entry.as_ref().map(|entry| Utc::now() - entry.resolved_at)
    }

    /// Forgets the cached map
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}
