//! The history index: one entry per committed snapshot

use crate::fuel::FuelTag;
use crate::output::PriceStats;
use crate::storage::CompletenessTier;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Files written for one snapshot, relative to the history root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotFiles {
    pub json: String,

    /// Secondary exports keyed by file extension (`csv`, `md`)
    #[serde(flatten)]
    pub exports: BTreeMap<String, String>,
}

/// Metadata recorded for one committed snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub timestamp: DateTime<Utc>,

    /// Commit date as `YYYYMMDD`
    pub date: String,

    /// Commit time as `HHMMSS`
    pub time: String,

    pub completeness: CompletenessTier,

    pub total_regions: usize,

    pub successful_regions: usize,

    pub failed_regions: usize,

    pub prefix: String,

    pub files: SnapshotFiles,

    pub fuel_types: Vec<FuelTag>,

    pub price_statistics: BTreeMap<FuelTag, PriceStats>,

    /// SHA-256 of the configuration file used for the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
}

impl IndexEntry {
    pub fn is_on(&self, date: NaiveDate) -> bool {
        self.date == date_key(date)
    }
}

/// Formats a date the way index entries store it
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Capped, append-only list of snapshot entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryIndex {
    pub created: DateTime<Utc>,

    pub entries: Vec<IndexEntry>,

    pub total_entries: usize,

    pub last_updated: DateTime<Utc>,
}

impl HistoryIndex {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            created: now,
            entries: Vec::new(),
            total_entries: 0,
            last_updated: now,
        }
    }

    /// Reads the index at `path`
    ///
    /// A missing file yields a fresh index. So does an unreadable or corrupt
    /// one, after a warning.
    pub fn load_or_fresh(path: &Path, now: DateTime<Utc>) -> Self {
        if !path.exists() {
            return Self::new(now);
        }

        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| {
                serde_json::from_str::<HistoryIndex>(&content).map_err(|e| e.to_string())
            });

        match parsed {
            Ok(index) => index,
            Err(e) => {
                tracing::warn!("History index {} unreadable ({}), starting a fresh one", path.display(), e);
                Self::new(now)
            }
        }
    }

    /// Appends an entry, evicting the oldest entries beyond `cap`
    ///
    /// # Returns
    ///
    /// The number of entries evicted
    pub fn push(&mut self, entry: IndexEntry, cap: usize, now: DateTime<Utc>) -> usize {
        self.entries.push(entry);

        let evicted = self.entries.len().saturating_sub(cap.max(1));
        if evicted > 0 {
            self.entries.drain(..evicted);
            tracing::info!("History index trimmed to the last {} entries", self.entries.len());
        }

        self.total_entries = self.entries.len();
        self.last_updated = now;
        evicted
    }

    /// Drops entries committed before `cutoff`
    ///
    /// # Returns
    ///
    /// The number of entries dropped
    pub fn retain_from(&mut self, cutoff: NaiveDate, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.timestamp.date_naive() >= cutoff);

        let dropped = before - self.entries.len();
        if dropped > 0 {
            self.total_entries = self.entries.len();
            self.last_updated = now;
        }
        dropped
    }

    /// Entries recorded on `date`, oldest first
    pub fn entries_for_date(&self, date: NaiveDate) -> Vec<&IndexEntry> {
        self.entries.iter().filter(|e| e.is_on(date)).collect()
    }

    /// Most recent entry recorded on `date`
    pub fn latest_for_date(&self, date: NaiveDate) -> Option<&IndexEntry> {
        self.entries
            .iter()
            .filter(|e| e.is_on(date))
            .max_by_key(|e| e.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry_at(timestamp: DateTime<Utc>, json: &str) -> IndexEntry {
        IndexEntry {
            timestamp,
            date: timestamp.format("%Y%m%d").to_string(),
            time: timestamp.format("%H%M%S").to_string(),
            completeness: CompletenessTier::Partial,
            total_regions: 1,
            successful_regions: 1,
            failed_regions: 0,
            prefix: "regions_partial_1reg".to_string(),
            files: SnapshotFiles {
                json: json.to_string(),
                exports: BTreeMap::new(),
            },
            fuel_types: Vec::new(),
            price_statistics: BTreeMap::new(),
            config_hash: None,
        }
    }

    #[test]
    fn test_push_caps_fifo() {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let mut index = HistoryIndex::new(t0);

        for i in 0..3 {
            index.push(entry_at(t0, &format!("e{}", i)), 3, t0);
        }
        let evicted = index.push(entry_at(t0, "e3"), 3, t0);

        assert_eq!(evicted, 1);
        assert_eq!(index.total_entries, 3);
        let names: Vec<&str> = index.entries.iter().map(|e| e.files.json.as_str()).collect();
        assert_eq!(names, vec!["e1", "e2", "e3"]);
    }

    #[test]
    fn test_date_queries() {
        let morning = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2026, 3, 1, 20, 0, 0).unwrap();
        let next_day = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();

        let mut index = HistoryIndex::new(morning);
        index.push(entry_at(evening, "evening"), 10, evening);
        index.push(entry_at(morning, "morning"), 10, morning);
        index.push(entry_at(next_day, "next"), 10, next_day);

        let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(index.entries_for_date(day).len(), 2);
        assert_eq!(index.latest_for_date(day).unwrap().files.json, "evening");

        let empty = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        assert!(index.latest_for_date(empty).is_none());
    }

    #[test]
    fn test_retain_from_cutoff() {
        let old = Utc.with_ymd_and_hms(2026, 2, 27, 23, 59, 0).unwrap();
        let boundary = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap();

        let mut index = HistoryIndex::new(old);
        index.push(entry_at(old, "old"), 10, old);
        index.push(entry_at(boundary, "boundary"), 10, boundary);

        let cutoff = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(index.retain_from(cutoff, now), 1);
        assert_eq!(index.total_entries, 1);
        assert_eq!(index.entries[0].files.json, "boundary");
        assert_eq!(index.last_updated, now);

        assert_eq!(index.retain_from(cutoff, Utc::now()), 0);
        assert_eq!(index.last_updated, now);
    }

    #[test]
    fn test_files_flatten_exports() {
        let mut files = SnapshotFiles {
            json: "2026/03/01/a.json".to_string(),
            exports: BTreeMap::new(),
        };
        files.exports.insert("csv".to_string(), "2026/03/01/a.csv".to_string());

        let value = serde_json::to_value(&files).unwrap();
        assert_eq!(value["json"], "2026/03/01/a.json");
        assert_eq!(value["csv"], "2026/03/01/a.csv");
    }

    #[test]
    fn test_load_corrupt_index_is_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history_index.json");
        std::fs::write(&path, "{ not json").unwrap();

        let now = Utc::now();
        let index = HistoryIndex::load_or_fresh(&path, now);
        assert!(index.entries.is_empty());
        assert_eq!(index.created, now);
    }
}
