//! Region discovery and selection
//!
//! The price source publishes its region list only as an undocumented JSON
//! structure embedded in its pages. This module recovers that list
//! ([`resolve_regions`]), holds it for the rest of a run ([`RegionCache`]),
//! and turns a user's choice of regions into the work list for a run.

mod cache;
mod resolver;

pub use cache::{CachedRegions, RegionCache};
pub use resolver::resolve_regions;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Region id → display name, as published by the source
pub type RegionMap = BTreeMap<u32, String>;

/// One administrative region
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    /// Source-assigned identifier
    pub id: u32,

    /// Display name
    pub name: String,
}

impl Region {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Which regions a run should cover
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionSelection {
    /// Every region in the resolved map, in id order
    All,

    /// The configured popular subset, in configured order
    Popular(Vec<u32>),

    /// An explicit list of ids, in the given order
    Ids(Vec<u32>),
}

/// Builds the work list for a run
///
/// Ids that are not present in `map` are skipped with a warning, duplicates
/// are dropped, and the list is cut to `max_regions` when given.
///
/// # Arguments
///
/// * `map` - The resolved region map
/// * `selection` - Which regions to include
/// * `max_regions` - Optional upper bound on the number of regions
///
/// # Returns
///
/// The regions to fetch, in fetch order
pub fn select_regions(
    map: &RegionMap,
    selection: &RegionSelection,
    max_regions: Option<usize>,
) -> Vec<Region> {
    let mut regions: Vec<Region> = match selection {
        RegionSelection::All => map
            .iter()
            .map(|(id, name)| Region::new(*id, name.clone()))
            .collect(),
        RegionSelection::Popular(ids) | RegionSelection::Ids(ids) => {
            let mut seen = HashSet::new();
            ids.iter()
                .filter(|id| seen.insert(**id))
                .filter_map(|id| match map.get(id) {
                    Some(name) => Some(Region::new(*id, name.clone())),
                    None => {
                        tracing::warn!(region_id = id, "Region not published by source, skipping");
                        None
                    }
                })
                .collect()
        }
    };

    if let Some(max) = max_regions {
        regions.truncate(max);
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_map() -> RegionMap {
        RegionMap::from([
            (23, "Краснодарский край".to_string()),
            (50, "Московская область".to_string()),
            (77, "Москва".to_string()),
            (78, "Санкт-Петербург".to_string()),
        ])
    }

    #[test]
    fn test_select_all_in_id_order() {
        let regions = select_regions(&sample_map(), &RegionSelection::All, None);
        let ids: Vec<u32> = regions.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![23, 50, 77, 78]);
    }

    #[test]
    fn test_select_ids_keeps_order_and_skips_unknown() {
        let selection = RegionSelection::Ids(vec![78, 999, 23, 78]);
        let regions = select_regions(&sample_map(), &selection, None);
        assert_eq!(
            regions,
            vec![
                Region::new(78, "Санкт-Петербург"),
                Region::new(23, "Краснодарский край"),
            ]
        );
    }

    #[test]
    fn test_max_regions_truncates() {
        let selection = RegionSelection::Popular(vec![77, 78, 50]);
        let regions = select_regions(&sample_map(), &selection, Some(2));
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].id, 77);
    }
}
