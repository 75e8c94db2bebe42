//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests to the price source, including:
//! - Building the HTTP client with the configured identity and timeouts
//! - Building region page URLs
//! - Bounded retries for failed requests
//! - Region list discovery from seed pages
//! - Turning a region page into a price observation

use crate::config::{Config, SourceConfig};
use crate::crawler::coordinator::ObservationSource;
use crate::crawler::retry::{retry_fixed, RetryPolicy};
use crate::extract::ExtractionPipeline;
use crate::observation::PriceObservation;
use crate::regions::{Region, RegionCache, RegionMap};
use crate::LedgerError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Result of a single fetch attempt
#[derive(Debug)]
pub enum FetchResult {
    /// The server answered 200 OK
    Success {
        /// Final URL after redirects
        final_url: String,
        /// Page body content
        body: String,
    },

    /// The server answered with any other status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// No usable response (connection refused, timeout, body read failure)
    NetworkError {
        /// Error description
        error: String,
    },
}

/// Why a page could not be fetched
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP {status_code}")]
    Status { status_code: u16 },

    #[error("{0}")]
    Network(String),
}

impl FetchResult {
    /// Converts the attempt into the page body or a retryable error
    pub fn into_body(self) -> Result<String, FetchError> {
        match self {
            Self::Success { body, .. } => Ok(body),
            Self::HttpError { status_code } => Err(FetchError::Status { status_code }),
            Self::NetworkError { error } => Err(FetchError::Network(error)),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The source configuration (user agent, language, timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &SourceConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    if let Ok(language) = HeaderValue::from_str(&config.accept_language) {
        headers.insert(ACCEPT_LANGUAGE, language);
    }

    let timeout = Duration::from_secs(config.timeout_secs);

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL once and classifies the outcome
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
///
/// # Returns
///
/// A FetchResult; only `200 OK` counts as success
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status();
            let final_url = response.url().to_string();

            if status != StatusCode::OK {
                return FetchResult::HttpError {
                    status_code: status.as_u16(),
                };
            }

            match response.text().await {
                Ok(body) => FetchResult::Success { final_url, body },
                Err(e) => FetchResult::NetworkError {
                    error: e.to_string(),
                },
            }
        }
        Err(e) => {
            let error = if e.is_timeout() {
                "Request timeout".to_string()
            } else if e.is_connect() {
                "Connection refused".to_string()
            } else {
                e.to_string()
            };
            FetchResult::NetworkError { error }
        }
    }
}

/// Fetches region pages and turns them into price observations
pub struct RegionFetcher {
    client: Client,
    source: SourceConfig,
    retry: RetryPolicy,
    pipeline: ExtractionPipeline,
}

impl RegionFetcher {
    /// Creates a fetcher from the full configuration
    pub fn new(config: &Config) -> Result<Self, LedgerError> {
        Ok(Self {
            client: build_http_client(&config.source)?,
            source: config.source.clone(),
            retry: RetryPolicy::from_config(&config.fetcher),
            pipeline: ExtractionPipeline::default(),
        })
    }

    /// Replaces the extraction pipeline
    pub fn with_pipeline(mut self, pipeline: ExtractionPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Returns the page URL for a region (`<base-url>?<region-param>=<id>`)
    pub fn region_url(&self, region_id: u32) -> Result<String, LedgerError> {
        let mut url = Url::parse(&self.source.base_url)?;
        url.query_pairs_mut()
            .append_pair(&self.source.region_param, &region_id.to_string());
        Ok(url.to_string())
    }

    /// Fetches a page body, retrying per the retry policy
    pub async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        retry_fixed(self.retry, || async {
            fetch_url(&self.client, url).await.into_body()
        })
        .await
    }

    /// Fetches one region and extracts its prices
    ///
    /// Never fails: a page that cannot be fetched within the attempt budget
    /// becomes an `error` observation carrying the last error message. A
    /// fetched page without recognisable prices is a `success` observation
    /// with an empty price map.
    pub async fn fetch(&self, region: &Region) -> PriceObservation {
        let url = match self.region_url(region.id) {
            Ok(url) => url,
            Err(e) => {
                return PriceObservation::error(region, self.source.base_url.as_str(), e.to_string())
            }
        };

        tracing::debug!(region_id = region.id, "Fetching {}", url);

        match self.fetch_page(&url).await {
            Ok(body) => {
                let prices = self.pipeline.extract(&body);
                if prices.is_empty() {
                    tracing::warn!(region_id = region.id, region = %region.name, "No prices found on page");
                } else {
                    tracing::info!(
                        region_id = region.id,
                        region = %region.name,
                        fuels = prices.len(),
                        "Fetched prices"
                    );
                }
                PriceObservation::success(region, url, prices)
            }
            Err(e) => {
                tracing::error!(region_id = region.id, region = %region.name, error = %e, "Region fetch failed");
                PriceObservation::error(region, url, e.to_string())
            }
        }
    }

    /// Returns the region map, fetching and resolving seed pages if needed
    ///
    /// Seed pages are tried in order until one yields a region list. The
    /// result is stored in `cache`, so later calls do not touch the network.
    ///
    /// # Returns
    ///
    /// * `Ok(RegionMap)` - The resolved, non-empty region map
    /// * `Err(LedgerError::RegionDiscovery)` - No seed page held a region list
    pub async fn discover_regions(&self, cache: &mut RegionCache) -> Result<RegionMap, LedgerError> {
        if let Some(regions) = cache.regions() {
            return Ok(regions.clone());
        }

        let seeds = self.source.discovery_urls();
        for seed in &seeds {
            match self.fetch_page(seed).await {
                Ok(body) => {
                    if let Some(regions) = cache.resolve_from(seed, &body) {
                        return Ok(regions.clone());
                    }
                    tracing::warn!("No region list found on {}", seed);
                }
                Err(e) => tracing::warn!("Could not fetch seed page {}: {}", seed, e),
            }
        }

        Err(LedgerError::RegionDiscovery {
            attempted: seeds.len(),
        })
    }
}

impl ObservationSource for RegionFetcher {
    fn fetch_observation(&self, region: &Region) -> impl Future<Output = PriceObservation> + Send {
        self.fetch(region)
    }
}
