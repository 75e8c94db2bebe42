use crate::config::types::{Config, FetcherConfig, HistoryConfig, RegionsConfig, SourceConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_history_config(&config.history)?;
    validate_regions_config(&config.regions)?;
    Ok(())
}

/// Validates the source endpoint settings
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    validate_http_url("base-url", &config.base_url)?;

    for seed in &config.seed_urls {
        validate_http_url("seed-urls", seed)?;
    }

    if config.region_param.is_empty() {
        return Err(ConfigError::Validation(
            "region-param cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates fetch pacing and retry settings
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 32 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 32, got {}",
            config.concurrency
        )));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    Ok(())
}

/// Validates history store settings
fn validate_history_config(config: &HistoryConfig) -> Result<(), ConfigError> {
    if config.root.is_empty() {
        return Err(ConfigError::Validation(
            "history root cannot be empty".to_string(),
        ));
    }

    if config.expected_regions < 1 {
        return Err(ConfigError::Validation(
            "expected-regions must be >= 1".to_string(),
        ));
    }

    if config.max_index_entries < 1 {
        return Err(ConfigError::Validation(
            "max-index-entries must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates region presets
fn validate_regions_config(config: &RegionsConfig) -> Result<(), ConfigError> {
    if config.popular.contains(&0) {
        return Err(ConfigError::Validation(
            "popular region ids must be non-zero".to_string(),
        ));
    }
    Ok(())
}

/// Checks that `value` parses as an http(s) URL
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_http_url() {
        assert!(validate_http_url("base-url", "https://example.com/prices").is_ok());
        assert!(validate_http_url("base-url", "http://127.0.0.1:8080/").is_ok());

        assert!(validate_http_url("base-url", "").is_err());
        assert!(validate_http_url("base-url", "not a url").is_err());
        assert!(validate_http_url("base-url", "ftp://example.com/").is_err());
    }

    #[test]
    fn test_concurrency_bounds() {
        let mut config = Config::default();
        config.fetcher.concurrency = 33;
        assert!(validate(&config).is_err());

        config.fetcher.concurrency = 32;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = Config::default();
        config.fetcher.max_attempts = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_history_limits() {
        let mut config = Config::default();
        config.history.max_index_entries = 0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.history.root = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_popular_region_rejected() {
        let mut config = Config::default();
        config.regions.popular = vec![77, 0];
        assert!(validate(&config).is_err());
    }
}
