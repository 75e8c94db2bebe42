//! Fuel-Ledger main entry point
//!
//! This is the command-line interface for the regional fuel price collector.

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser};
use fuel_ledger::config::{load_config_with_hash, Config};
use fuel_ledger::crawler::{acquire, RegionFetcher};
use fuel_ledger::output::{
    print_cleanup_report, print_comparison, print_history_summary, print_run_summary, print_trend,
};
use fuel_ledger::regions::RegionSelection;
use fuel_ledger::{FuelTag, HistoryStore, RegionCache};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Fuel-Ledger: regional fuel price collector
///
/// Fuel-Ledger discovers the regions published by the price source, fetches
/// average fuel prices for each of them, and keeps a dated history of every
/// run for later comparison.
#[derive(Parser, Debug)]
#[command(name = "fuel-ledger")]
#[command(version = "1.0.0")]
#[command(about = "Regional fuel price collector", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    mode: Mode,

    /// Fetch at most this many regions
    #[arg(long, value_name = "N")]
    max_regions: Option<usize>,

    /// Pause between requests in seconds (overrides config)
    #[arg(long, value_name = "SECS")]
    delay: Option<f64>,

    /// Number of regions fetched in parallel (overrides config)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..=32))]
    concurrency: Option<u32>,

    /// Do not save the run to history
    #[arg(long)]
    no_history: bool,

    /// Fuel type for --compare and --trend (e.g. AI-95, ДТ)
    #[arg(long, value_name = "TAG")]
    fuel: Option<FuelTag>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct Mode {
    /// Fetch every region published by the source
    #[arg(long)]
    all_regions: bool,

    /// Fetch the configured popular regions
    #[arg(long)]
    popular_regions: bool,

    /// Fetch the given region ids
    #[arg(long, value_name = "ID", num_args = 1..)]
    regions: Option<Vec<u32>>,

    /// List the regions published by the source and exit
    #[arg(long)]
    list_regions: bool,

    /// Compare the latest snapshots of two dates (YYYY-MM-DD)
    #[arg(long, num_args = 2, value_names = ["DATE1", "DATE2"])]
    compare: Option<Vec<NaiveDate>>,

    /// Show the average price trend over the last N days
    #[arg(long, value_name = "DAYS")]
    trend: Option<u32>,

    /// Show commit statistics for the last N days
    #[arg(long, value_name = "DAYS")]
    stats: Option<u32>,

    /// Delete history older than N days
    #[arg(long, value_name = "DAYS")]
    cleanup: Option<u32>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let (mut config, config_hash) = load_configuration(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);

    let mode = &cli.mode;
    if mode.list_regions {
        handle_list_regions(&config).await?;
        return Ok(ExitCode::SUCCESS);
    }
    if let Some([first, second]) = mode.compare.as_deref() {
        handle_compare(&config, *first, *second, cli.fuel)?;
        return Ok(ExitCode::SUCCESS);
    }
    if let Some(days) = mode.trend {
        handle_trend(&config, days, cli.fuel.unwrap_or(FuelTag::Ai95))?;
        return Ok(ExitCode::SUCCESS);
    }
    if let Some(days) = mode.stats {
        handle_stats(&config, days);
        return Ok(ExitCode::SUCCESS);
    }
    if let Some(keep_days) = mode.cleanup {
        handle_cleanup(&config, keep_days)?;
        return Ok(ExitCode::SUCCESS);
    }

    let selection = if mode.all_regions {
        RegionSelection::All
    } else if let Some(ids) = &mode.regions {
        RegionSelection::Ids(ids.clone())
    } else {
        RegionSelection::Popular(config.regions.popular.clone())
    };

    handle_acquisition(&config, config_hash, &selection, cli.max_regions, cli.no_history).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("fuel_ledger=info,warn"),
            1 => EnvFilter::new("fuel_ledger=debug,info"),
            2 => EnvFilter::new("fuel_ledger=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, or the defaults when none is given
fn load_configuration(path: Option<&Path>) -> anyhow::Result<(Config, Option<String>)> {
    let Some(path) = path else {
        tracing::info!("No configuration file given, using defaults");
        return Ok((Config::default(), None));
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    Ok((config, Some(hash)))
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(secs) = cli.delay {
        config.fetcher.request_delay_ms = (secs.max(0.0) * 1000.0).round() as u64;
    }
    if let Some(concurrency) = cli.concurrency {
        config.fetcher.concurrency = concurrency;
    }
}

/// Handles the --list-regions mode: prints the resolved region map
async fn handle_list_regions(config: &Config) -> anyhow::Result<()> {
    let fetcher = RegionFetcher::new(config)?;
    let mut cache = RegionCache::new();
    let regions = fetcher
        .discover_regions(&mut cache)
        .await
        .context("Region discovery failed")?;

    println!("=== Regions ({}) ===\n", regions.len());
    for (id, name) in &regions {
        println!("  {:>4}  {}", id, name);
    }

    Ok(())
}

/// Handles the --compare mode: prints price changes between two dates
fn handle_compare(
    config: &Config,
    first: NaiveDate,
    second: NaiveDate,
    fuel: Option<FuelTag>,
) -> anyhow::Result<()> {
    let store = HistoryStore::new(&config.history);
    let comparison = store
        .compare_dates(first, second, fuel)
        .with_context(|| format!("Cannot compare {} with {}", first, second))?;

    print_comparison(&comparison);
    Ok(())
}

/// Handles the --trend mode: prints daily averages for one fuel
fn handle_trend(config: &Config, days: u32, fuel: FuelTag) -> anyhow::Result<()> {
    let store = HistoryStore::new(&config.history);
    let trend = store
        .price_trend(Utc::now().date_naive(), days, fuel)
        .with_context(|| format!("Cannot compute {} trend", fuel))?;

    print_trend(&trend);
    Ok(())
}

/// Handles the --stats mode: prints commit statistics for recent days
fn handle_stats(config: &Config, days: u32) {
    let store = HistoryStore::new(&config.history);
    match store.statistics_summary(days) {
        Some(summary) => print_history_summary(&summary),
        None => println!("No snapshots recorded in the last {} days.", days),
    }
}

/// Handles the --cleanup mode: deletes history older than the retention window
fn handle_cleanup(config: &Config, keep_days: u32) -> anyhow::Result<()> {
    let store = HistoryStore::new(&config.history);
    tracing::info!("Removing history older than {} days from {}", keep_days, store.root().display());
    let report = store
        .cleanup(keep_days)
        .context("History cleanup failed")?;

    print_cleanup_report(&report);
    Ok(())
}

/// Handles the main acquisition: fetch, report, and save to history
async fn handle_acquisition(
    config: &Config,
    config_hash: Option<String>,
    selection: &RegionSelection,
    max_regions: Option<usize>,
    no_history: bool,
) -> anyhow::Result<ExitCode> {
    tracing::info!(
        "Starting acquisition from {} (concurrency {}, {}ms between requests)",
        config.source.base_url,
        config.fetcher.concurrency,
        config.fetcher.request_delay_ms
    );

    let mut cache = RegionCache::new();
    let run = acquire(config, selection, max_regions, &mut cache)
        .await
        .context("Acquisition failed")?;

    print_run_summary(&run);

    if !run.has_usable_observations() {
        tracing::error!("No prices collected from any region");
        return Ok(ExitCode::FAILURE);
    }

    if no_history {
        tracing::info!("History disabled, snapshot not saved");
        return Ok(ExitCode::SUCCESS);
    }

    let mut store = HistoryStore::new(&config.history);
    if let Some(hash) = config_hash {
        store = store.with_config_hash(hash);
    }
    let snapshot = store.commit(&run).context("Failed to save history")?;

    println!("✓ Snapshot saved: {}", snapshot.json_path.display());
    println!("✓ Latest copy: {}", snapshot.latest_path.display());
    for path in &snapshot.export_paths {
        println!("✓ Export: {}", path.display());
    }
    println!(
        "✓ Completeness: {} ({} regions)",
        snapshot.completeness, snapshot.region_count
    );

    Ok(ExitCode::SUCCESS)
}
