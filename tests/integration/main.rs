//! Integration tests for fuel-ledger
//!
//! These tests use wiremock to stand in for the price source and exercise
//! fetching, region discovery and full acquisition runs end-to-end.

mod acquisition_tests;
mod fetcher_tests;
