//! Snapshot commits and history queries

use crate::config::HistoryConfig;
use crate::fuel::FuelTag;
use crate::observation::{AcquisitionRun, PriceObservation};
use crate::output::{price_statistics, CsvExporter, MarkdownExporter, PriceStats, SnapshotExporter};
use crate::storage::index::{date_key, HistoryIndex, IndexEntry, SnapshotFiles};
use crate::storage::{CompletenessTier, HistoryError, HistoryResult};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const INDEX_FILE: &str = "history_index.json";
pub(super) const LATEST_DIR: &str = "latest";

/// Result of committing one run to history
#[derive(Debug, Clone)]
pub struct HistorySnapshot {
    pub completeness: CompletenessTier,

    /// Immutable dated snapshot
    pub json_path: PathBuf,

    /// Copy in the `latest` directory for the commit date
    pub latest_path: PathBuf,

    /// Secondary exports that were written successfully
    pub export_paths: Vec<PathBuf>,

    /// Regions whose page was fetched
    pub region_count: usize,

    /// The entry appended to the index
    pub entry: IndexEntry,
}

impl HistorySnapshot {
    pub fn fuel_types_present(&self) -> &[FuelTag] {
        &self.entry.fuel_types
    }

    pub fn price_statistics(&self) -> &BTreeMap<FuelTag, PriceStats> {
        &self.entry.price_statistics
    }
}

/// Date-organized store of acquisition snapshots
///
/// Layout under the root directory:
///
/// ```text
/// <root>/YYYY/MM/DD/<prefix>_<YYYYMMDD_HHMMSS>.json
/// <root>/latest/latest_regions_<YYYYMMDD>.json
/// <root>/history_index.json
/// ```
///
/// The index is read-modify-written on every commit and assumes a single
/// writer process.
pub struct HistoryStore {
    root: PathBuf,
    expected_regions: u32,
    max_index_entries: usize,
    config_hash: Option<String>,
    exporters: Vec<Box<dyn SnapshotExporter>>,
}

impl HistoryStore {
    /// Creates a store from the history configuration
    ///
    /// The CSV and Markdown exporters are attached when enabled.
    pub fn new(config: &HistoryConfig) -> Self {
        let mut exporters: Vec<Box<dyn SnapshotExporter>> = Vec::new();
        if config.export_csv {
            exporters.push(Box::new(CsvExporter));
        }
        if config.export_markdown {
            exporters.push(Box::new(MarkdownExporter));
        }

        Self {
            root: PathBuf::from(&config.root),
            expected_regions: config.expected_regions.max(1),
            max_index_entries: config.max_index_entries.max(1),
            config_hash: None,
            exporters,
        }
    }

    /// Records the configuration hash in every index entry
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Attaches an additional secondary exporter
    pub fn with_exporter(mut self, exporter: Box<dyn SnapshotExporter>) -> Self {
        self.exporters.push(exporter);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    /// Commits a completed run, timestamped now
    pub fn commit(&self, run: &AcquisitionRun) -> HistoryResult<HistorySnapshot> {
        self.commit_at(run, Utc::now())
    }

    /// Commits a completed run as of `at`
    ///
    /// Writes the dated snapshot (never overwriting an existing one), copies
    /// it to the latest file for that date, runs the secondary exporters and
    /// appends an entry to the index. Exporter failures are logged and
    /// skipped.
    ///
    /// # Returns
    ///
    /// * `Ok(HistorySnapshot)` - The snapshot and the index entry written
    /// * `Err(HistoryError)` - The snapshot, latest copy or index could not be written
    pub fn commit_at(&self, run: &AcquisitionRun, at: DateTime<Utc>) -> HistoryResult<HistorySnapshot> {
        let successful = run.successful_count;
        let completeness = CompletenessTier::classify(successful, self.expected_regions);
        let prefix = completeness.file_prefix(successful, self.expected_regions);

        let date_rel = at.format("%Y/%m/%d").to_string();
        let date_dir = self.root.join(&date_rel);
        fs::create_dir_all(&date_dir).map_err(HistoryError::io(&date_dir))?;

        let stem = unique_stem(&date_dir, &format!("{}_{}", prefix, at.format("%Y%m%d_%H%M%S")));
        let json_path = date_dir.join(format!("{}.json", stem));
        let payload = serde_json::to_vec_pretty(&run.observations)?;
        write_atomic(&json_path, &payload)?;

        let latest_dir = self.root.join(LATEST_DIR);
        fs::create_dir_all(&latest_dir).map_err(HistoryError::io(&latest_dir))?;
        let latest_stem = format!("latest_regions_{}", at.format("%Y%m%d"));
        let latest_path = latest_dir.join(format!("{}.json", latest_stem));
        write_atomic(&latest_path, &payload)?;

        let mut exports = BTreeMap::new();
        let mut export_paths = Vec::new();
        for exporter in &self.exporters {
            let extension = exporter.extension();
            let path = date_dir.join(format!("{}.{}", stem, extension));
            match exporter.export(run, &path) {
                Ok(()) => {
                    let latest_copy = latest_dir.join(format!("{}.{}", latest_stem, extension));
                    if let Err(e) = fs::copy(&path, &latest_copy) {
                        tracing::error!("Failed to copy {} export to latest: {}", extension, e);
                    }
                    exports.insert(extension.to_string(), format!("{}/{}.{}", date_rel, stem, extension));
                    export_paths.push(path);
                }
                Err(e) => tracing::error!("Failed to write {} export: {}", extension, e),
            }
        }

        let entry = IndexEntry {
            timestamp: at,
            date: at.format("%Y%m%d").to_string(),
            time: at.format("%H%M%S").to_string(),
            completeness,
            total_regions: run.requested_region_count,
            successful_regions: successful,
            failed_regions: run.failed_count(),
            prefix,
            files: SnapshotFiles {
                json: format!("{}/{}.json", date_rel, stem),
                exports,
            },
            fuel_types: run.fuel_types_present().into_iter().collect(),
            price_statistics: price_statistics(run),
            config_hash: self.config_hash.clone(),
        };

        self.append_to_index(entry.clone(), at)?;

        tracing::info!(
            "Snapshot saved: {} ({}, {} regions)",
            json_path.display(),
            completeness,
            successful
        );
        tracing::info!("Latest copy: {}", latest_path.display());

        Ok(HistorySnapshot {
            completeness,
            json_path,
            latest_path,
            export_paths,
            region_count: successful,
            entry,
        })
    }

    /// Reads the index, or an empty one if there is none yet
    pub fn load_index(&self) -> HistoryIndex {
        HistoryIndex::load_or_fresh(&self.index_path(), Utc::now())
    }

    /// Index entries recorded on `date`, oldest first
    pub fn entries_for_date(&self, date: NaiveDate) -> Vec<IndexEntry> {
        self.load_index()
            .entries_for_date(date)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Most recent index entry recorded on `date`
    pub fn latest_entry_for_date(&self, date: NaiveDate) -> Option<IndexEntry> {
        self.load_index().latest_for_date(date).cloned()
    }

    /// Reads the observations of a committed snapshot
    pub fn load_snapshot(&self, entry: &IndexEntry) -> HistoryResult<Vec<PriceObservation>> {
        let path = self.root.join(&entry.files.json);
        let content = fs::read_to_string(&path).map_err(HistoryError::io(&path))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Reads the most recent snapshot committed on `date`
    ///
    /// # Returns
    ///
    /// * `Ok(Some(observations))` - The day's latest snapshot
    /// * `Ok(None)` - Nothing was committed that day
    /// * `Err(HistoryError)` - The snapshot is listed but unreadable
    pub fn latest_snapshot_for_date(&self, date: NaiveDate) -> HistoryResult<Option<Vec<PriceObservation>>> {
        match self.latest_entry_for_date(date) {
            Some(entry) => self.load_snapshot(&entry).map(Some),
            None => {
                tracing::debug!("No snapshot recorded for {}", date_key(date));
                Ok(None)
            }
        }
    }

    fn append_to_index(&self, entry: IndexEntry, now: DateTime<Utc>) -> HistoryResult<()> {
        let path = self.index_path();
        let mut index = HistoryIndex::load_or_fresh(&path, now);
        index.push(entry, self.max_index_entries, now);

        let content = serde_json::to_vec_pretty(&index)?;
        write_atomic(&path, &content)
    }
}

/// Returns `stem`, or `stem_N` for the first N that names no existing file
fn unique_stem(dir: &Path, stem: &str) -> String {
    let taken = |candidate: &str| dir.join(format!("{}.json", candidate)).exists();

    if !taken(stem) {
        return stem.to_string();
    }

    let mut n = 1u32;
    loop {
        let candidate = format!("{}_{}", stem, n);
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Writes `content` to a sibling temp file and renames it over `path`
pub(super) fn write_atomic(path: &Path, content: &[u8]) -> HistoryResult<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, content).map_err(HistoryError::io(&tmp))?;
    fs::rename(&tmp, path).map_err(HistoryError::io(path))
}
