//! Configuration module for Fuel-Ledger
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use fuel_ledger::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("fuel-ledger.toml")).unwrap();
//! println!("Fetching with {} worker(s)", config.fetcher.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FetcherConfig, HistoryConfig, RegionsConfig, SourceConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
