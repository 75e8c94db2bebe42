use serde::Deserialize;

/// Main configuration structure for Fuel-Ledger
///
/// Every section has defaults, so an empty file (or no file at all) yields a
/// working configuration pointed at the public price source.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub fetcher: FetcherConfig,
    pub history: HistoryConfig,
    pub regions: RegionsConfig,
}

/// Price source endpoint and request identity
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Price page URL; the region id is appended as a query parameter
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Name of the query parameter carrying the region id
    #[serde(rename = "region-param")]
    pub region_param: String,

    /// Pages tried in order when discovering the region list.
    /// Empty means "use the base URL".
    #[serde(rename = "seed-urls")]
    pub seed_urls: Vec<String>,

    /// Whole-request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    #[serde(rename = "accept-language")]
    pub accept_language: String,
}

impl SourceConfig {
    /// Returns the seed pages for region discovery, falling back to the base URL
    pub fn discovery_urls(&self) -> Vec<String> {
        if self.seed_urls.is_empty() {
            vec![self.base_url.clone()]
        } else {
            self.seed_urls.clone()
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://russiabase.ru/prices".to_string(),
            region_param: "region".to_string(),
            seed_urls: Vec::new(),
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            accept_language: "ru-RU,ru;q=0.8,en-US;q=0.5,en;q=0.3".to_string(),
        }
    }
}

/// Fetch pacing, retry and concurrency settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Number of workers; 1 runs regions sequentially
    pub concurrency: u32,

    /// Total attempts per region, including the first
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts for the same region (milliseconds)
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,

    /// Delay after every fetch before the same worker issues the next one (milliseconds)
    #[serde(rename = "request-delay-ms")]
    pub request_delay_ms: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            max_attempts: 3,
            retry_delay_ms: 2000,
            request_delay_ms: 1500,
        }
    }
}

/// History store layout and export settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Root directory of the dated snapshot tree
    pub root: String,

    /// Region count a complete run is expected to cover
    #[serde(rename = "expected-regions")]
    pub expected_regions: u32,

    /// Maximum number of entries kept in the history index
    #[serde(rename = "max-index-entries")]
    pub max_index_entries: usize,

    #[serde(rename = "export-csv")]
    pub export_csv: bool,

    #[serde(rename = "export-markdown")]
    pub export_markdown: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            root: "data/regional_history".to_string(),
            expected_regions: 85,
            max_index_entries: 1000,
            export_csv: true,
            export_markdown: false,
        }
    }
}

/// Region selection presets
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegionsConfig {
    /// Region ids fetched by `--popular-regions`
    pub popular: Vec<u32>,
}

impl Default for RegionsConfig {
    fn default() -> Self {
        Self {
            popular: vec![77, 78, 50, 40, 23, 66, 96],
        }
    }
}
