//! Fuel-Ledger: regional fuel price acquisition and history
//!
//! This crate discovers the regions published by a fuel price source, fetches
//! and extracts per-region prices under polite rate limiting, and commits each
//! run as a dated, indexed snapshot for later comparison.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod fuel;
pub mod observation;
pub mod output;
pub mod regions;
pub mod storage;

use thiserror::Error;

/// Main error type for Fuel-Ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("No region list found after trying {attempted} seed page(s)")]
    RegionDiscovery { attempted: usize },

    #[error("Unknown fuel type: {0}")]
    UnknownFuel(String),

    #[error("History error: {0}")]
    History(#[from] storage::HistoryError),

    #[error("No regions selected for acquisition")]
    NoRegions,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Fuel-Ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use extract::{ExtractionPipeline, PriceMap};
pub use fuel::{normalize_fuel_label, FuelTag};
pub use observation::{AcquisitionRun, ObservationStatus, PriceObservation};
pub use regions::{Region, RegionCache, RegionMap};
pub use storage::{HistorySnapshot, HistoryStore};
