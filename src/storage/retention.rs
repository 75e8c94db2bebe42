//! Retention: removing history older than a number of days

use crate::storage::index::HistoryIndex;
use crate::storage::store::{write_atomic, LATEST_DIR};
use crate::storage::{HistoryError, HistoryResult, HistoryStore};
use chrono::{DateTime, Days, NaiveDate, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// What a cleanup removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Day directories deleted, oldest first
    pub removed_days: Vec<NaiveDate>,

    /// Snapshot, export and latest files deleted
    pub removed_files: usize,

    /// Index entries dropped
    pub removed_entries: usize,
}

impl HistoryStore {
    /// Removes history older than `keep_days` days before today
    pub fn cleanup(&self, keep_days: u32) -> HistoryResult<CleanupReport> {
        self.cleanup_at(Utc::now(), keep_days)
    }

    /// Removes history dated before `now` minus `keep_days` days
    ///
    /// Day directories before the cutoff are deleted with everything in them,
    /// as are the matching `latest` copies and index entries. Month and year
    /// directories left empty are removed too.
    pub fn cleanup_at(&self, now: DateTime<Utc>, keep_days: u32) -> HistoryResult<CleanupReport> {
        let cutoff = now
            .date_naive()
            .checked_sub_days(Days::new(u64::from(keep_days)))
            .unwrap_or(NaiveDate::MIN);
        let mut report = CleanupReport::default();

        for (date, dir) in day_directories(self.root())? {
            if date >= cutoff {
                continue;
            }
            report.removed_files += count_files(&dir)?;
            fs::remove_dir_all(&dir).map_err(HistoryError::io(&dir))?;
            tracing::debug!("Removed {}", dir.display());
            report.removed_days.push(date);
        }
        remove_empty_parents(self.root())?;

        report.removed_files += remove_stale_latest(&self.root().join(LATEST_DIR), cutoff)?;

        let index_path = self.index_path();
        if index_path.exists() {
            let mut index = HistoryIndex::load_or_fresh(&index_path, now);
            report.removed_entries = index.retain_from(cutoff, now);
            if report.removed_entries > 0 {
                write_atomic(&index_path, &serde_json::to_vec_pretty(&index)?)?;
            }
        }

        tracing::info!(
            "Cleanup before {}: {} day(s), {} file(s), {} index entries removed",
            cutoff,
            report.removed_days.len(),
            report.removed_files,
            report.removed_entries
        );
        Ok(report)
    }
}

/// Subdirectories of `dir` whose names are plain numbers, in numeric order
fn numeric_subdirs(dir: &Path) -> HistoryResult<Vec<(u32, PathBuf)>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in fs::read_dir(dir).map_err(HistoryError::io(dir))? {
        let entry = entry.map_err(HistoryError::io(dir))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let number = entry
            .file_name()
            .to_str()
            .filter(|name| name.chars().all(|c| c.is_ascii_digit()))
            .and_then(|name| name.parse::<u32>().ok());
        if let Some(number) = number {
            found.push((number, path));
        }
    }
    found.sort();
    Ok(found)
}

/// Every `YYYY/MM/DD` directory under `root` that names a real date
fn day_directories(root: &Path) -> HistoryResult<Vec<(NaiveDate, PathBuf)>> {
    let mut days = Vec::new();
    for (year, year_dir) in numeric_subdirs(root)? {
        for (month, month_dir) in numeric_subdirs(&year_dir)? {
            for (day, day_dir) in numeric_subdirs(&month_dir)? {
                let date = i32::try_from(year)
                    .ok()
                    .and_then(|year| NaiveDate::from_ymd_opt(year, month, day));
                if let Some(date) = date {
                    days.push((date, day_dir));
                }
            }
        }
    }
    Ok(days)
}

fn count_files(dir: &Path) -> HistoryResult<usize> {
    let mut count = 0;
    for entry in fs::read_dir(dir).map_err(HistoryError::io(dir))? {
        if entry.map_err(HistoryError::io(dir))?.path().is_file() {
            count += 1;
        }
    }
    Ok(count)
}

fn remove_empty_parents(root: &Path) -> HistoryResult<()> {
    for (_, year_dir) in numeric_subdirs(root)? {
        for (_, month_dir) in numeric_subdirs(&year_dir)? {
            remove_if_empty(&month_dir)?;
        }
        remove_if_empty(&year_dir)?;
    }
    Ok(())
}

fn remove_if_empty(dir: &Path) -> HistoryResult<()> {
    let empty = fs::read_dir(dir).map_err(HistoryError::io(dir))?.next().is_none();
    if empty {
        fs::remove_dir(dir).map_err(HistoryError::io(dir))?;
    }
    Ok(())
}

/// Deletes `latest_regions_YYYYMMDD.*` copies dated before `cutoff`
fn remove_stale_latest(latest_dir: &Path, cutoff: NaiveDate) -> HistoryResult<usize> {
    if !latest_dir.is_dir() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(latest_dir).map_err(HistoryError::io(latest_dir))? {
        let path = entry.map_err(HistoryError::io(latest_dir))?.path();
        let date = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_prefix("latest_regions_"))
            .and_then(|rest| rest.get(..8))
            .and_then(|digits| NaiveDate::parse_from_str(digits, "%Y%m%d").ok());

        if matches!(date, Some(date) if date < cutoff) {
            fs::remove_file(&path).map_err(HistoryError::io(&path))?;
            removed += 1;
        }
    }
    Ok(removed)
}
