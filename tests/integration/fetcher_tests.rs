//! Region fetcher and discovery against a mock source

use fuel_ledger::config::Config;
use fuel_ledger::crawler::RegionFetcher;
use fuel_ledger::{FuelTag, LedgerError, ObservationStatus, Region, RegionCache};
use rust_decimal::Decimal;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRICE_PAGE: &str = r#"<html><body>
    <script>window.prices = {"АИ-92": 53.10, "АИ-95": 57.35, "ДТ": "66,80"};</script>
    </body></html>"#;

const REGIONS_PAGE: &str = r#"<html><body>
    <script>window.__INITIAL_STATE__ = {"filters": {"regions": [
        {"id": "77", "value": "Москва"},
        {"id": "78", "value": "Санкт-Петербург"}
    ]}};</script>
    </body></html>"#;

/// Creates a test configuration pointed at the mock server, with no delays
fn create_test_config(server: &MockServer, max_attempts: u32) -> Config {
    let mut config = Config::default();
    config.source.base_url = format!("{}/prices", server.uri());
    config.source.timeout_secs = 5;
    config.fetcher.max_attempts = max_attempts;
    config.fetcher.retry_delay_ms = 0;
    config.fetcher.request_delay_ms = 0;
    config
}

#[tokio::test]
async fn test_fetch_region_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/prices"))
        .and(query_param("region", "77"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PRICE_PAGE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = RegionFetcher::new(&create_test_config(&mock_server, 3)).unwrap();
    let observation = fetcher.fetch(&Region::new(77, "Москва")).await;

    assert_eq!(observation.status, ObservationStatus::Success);
    assert_eq!(observation.region_id, 77);
    assert_eq!(observation.region_name, "Москва");
    assert!(observation.source_url.ends_with("/prices?region=77"));
    assert_eq!(observation.fuel_prices.len(), 3);
    assert_eq!(observation.fuel_prices[&FuelTag::Ai95], Decimal::new(5735, 2));
    assert_eq!(observation.fuel_prices[&FuelTag::Diesel], Decimal::new(6680, 2));
}

#[tokio::test]
async fn test_fetch_page_without_prices_is_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/prices"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>Нет данных</body></html>"))
        .mount(&mock_server)
        .await;

    let fetcher = RegionFetcher::new(&create_test_config(&mock_server, 3)).unwrap();
    let observation = fetcher.fetch(&Region::new(1, "Республика Адыгея")).await;

    assert_eq!(observation.status, ObservationStatus::Success);
    assert!(observation.fuel_prices.is_empty());
    assert!(!observation.is_usable());
}

#[tokio::test]
async fn test_server_error_retried_until_budget_spent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/prices"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3) // One attempt plus two retries
        .mount(&mock_server)
        .await;

    let fetcher = RegionFetcher::new(&create_test_config(&mock_server, 3)).unwrap();
    let observation = fetcher.fetch(&Region::new(50, "Московская область")).await;

    assert_eq!(observation.status, ObservationStatus::Error);
    assert_eq!(observation.error_detail.as_deref(), Some("HTTP 500"));
    assert!(observation.fuel_prices.is_empty());
}

#[tokio::test]
async fn test_transient_error_recovers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/prices"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/prices"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PRICE_PAGE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = RegionFetcher::new(&create_test_config(&mock_server, 3)).unwrap();
    let observation = fetcher.fetch(&Region::new(77, "Москва")).await;

    assert_eq!(observation.status, ObservationStatus::Success);
    assert!(observation.is_usable());
}

#[tokio::test]
async fn test_unreachable_source_yields_error_observation() {
    let mut config = Config::default();
    // Nothing listens on port 1
    config.source.base_url = "http://127.0.0.1:1/prices".to_string();
    config.source.timeout_secs = 2;
    config.fetcher.max_attempts = 2;
    config.fetcher.retry_delay_ms = 0;

    let fetcher = RegionFetcher::new(&config).unwrap();
    let observation = fetcher.fetch(&Region::new(77, "Москва")).await;

    assert_eq!(observation.status, ObservationStatus::Error);
    assert!(observation.error_detail.is_some());
    assert_eq!(observation.source_url, "http://127.0.0.1:1/prices?region=77");
}

#[tokio::test]
async fn test_discover_regions_is_cached() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/prices"))
        .respond_with(ResponseTemplate::new(200).set_body_string(REGIONS_PAGE))
        .expect(1) // Second discovery is served from the cache
        .mount(&mock_server)
        .await;

    let fetcher = RegionFetcher::new(&create_test_config(&mock_server, 1)).unwrap();
    let mut cache = RegionCache::new();

    let regions = fetcher.discover_regions(&mut cache).await.unwrap();
    assert_eq!(regions.len(), 2);
    assert_eq!(regions.get(&77).map(String::as_str), Some("Москва"));
    assert_eq!(regions.get(&78).map(String::as_str), Some("Санкт-Петербург"));
    assert!(cache.is_resolved());

    let again = fetcher.discover_regions(&mut cache).await.unwrap();
    assert_eq!(again, regions);
}

#[tokio::test]
async fn test_discovery_tries_each_seed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/empty"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/regions"))
        .respond_with(ResponseTemplate::new(200).set_body_string(REGIONS_PAGE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server, 1);
    config.source.seed_urls = vec![
        format!("{}/empty", mock_server.uri()),
        format!("{}/regions", mock_server.uri()),
    ];

    let fetcher = RegionFetcher::new(&config).unwrap();
    let mut cache = RegionCache::new();
    let regions = fetcher.discover_regions(&mut cache).await.unwrap();

    assert_eq!(regions.len(), 2);
    assert!(cache.entry().unwrap().source_url.ends_with("/regions"));
}

#[tokio::test]
async fn test_discovery_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/prices"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PRICE_PAGE))
        .mount(&mock_server)
        .await;

    let fetcher = RegionFetcher::new(&create_test_config(&mock_server, 1)).unwrap();
    let mut cache = RegionCache::new();
    let result = fetcher.discover_regions(&mut cache).await;

    assert!(matches!(result, Err(LedgerError::RegionDiscovery { attempted: 1 })));
    assert!(!cache.is_resolved());
}
