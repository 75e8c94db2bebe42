//! Full acquisition runs against a mock source, committed to history

use chrono::{NaiveDate, TimeZone, Utc};
use fuel_ledger::config::Config;
use fuel_ledger::crawler::acquire;
use fuel_ledger::regions::RegionSelection;
use fuel_ledger::storage::CompletenessTier;
use fuel_ledger::{FuelTag, HistoryStore, LedgerError, ObservationStatus, RegionCache};
use rust_decimal::Decimal;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REGIONS_PAGE: &str = r#"<html><body>
    <script>window.__INITIAL_STATE__ = {"filters": {"regions": [
        {"id": 50, "value": "Московская область"},
        {"id": 77, "value": "Москва"},
        {"id": 78, "value": "Санкт-Петербург"}
    ]}};</script>
    </body></html>"#;

const MOSCOW_PAGE: &str = r#"<html><body>
    <script>window.prices = {"АИ-92": 53.10, "АИ-95": 57.35, "ДТ": "66,80"};</script>
    </body></html>"#;

const MOSCOW_PAGE_LATER: &str = r#"<html><body>
    <script>window.prices = {"АИ-92": 53.10, "АИ-95": 58.35, "ДТ": "66,80"};</script>
    </body></html>"#;

const SPB_PAGE: &str = r#"<html><body>
    <table class="prices-table">
      <tr><th>Регион</th><th>АИ-92</th><th>АИ-95</th><th>ДТ</th></tr>
      <tr><td>Средняя цена</td><td>52,10</td><td>57.35</td><td>66.80</td></tr>
    </table>
    </body></html>"#;

fn create_test_config(server: &MockServer, history_root: &Path) -> Config {
    let mut config = Config::default();
    config.source.base_url = format!("{}/prices", server.uri());
    config.source.seed_urls = vec![format!("{}/regions", server.uri())];
    config.source.timeout_secs = 5;
    config.fetcher.concurrency = 2;
    config.fetcher.max_attempts = 2;
    config.fetcher.retry_delay_ms = 0;
    config.fetcher.request_delay_ms = 0;
    config.history.root = history_root.to_string_lossy().into_owned();
    config.history.expected_regions = 3;
    config.history.export_csv = true;
    config.history.export_markdown = true;
    config
}

async fn mount_region(server: &MockServer, region_id: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/prices"))
        .and(query_param("region", region_id))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_source(server: &MockServer, moscow_page: &str) {
    Mock::given(method("GET"))
        .and(path("/regions"))
        .respond_with(ResponseTemplate::new(200).set_body_string(REGIONS_PAGE))
        .mount(server)
        .await;
    mount_region(server, "77", ResponseTemplate::new(200).set_body_string(moscow_page)).await;
    mount_region(server, "78", ResponseTemplate::new(200).set_body_string(SPB_PAGE)).await;
    mount_region(server, "50", ResponseTemplate::new(500)).await;
}

#[tokio::test]
async fn test_acquire_all_regions_and_commit() {
    let mock_server = MockServer::start().await;
    mount_source(&mock_server, MOSCOW_PAGE).await;

    let history_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server, history_dir.path());

    let mut cache = RegionCache::new();
    let run = acquire(&config, &RegionSelection::All, None, &mut cache)
        .await
        .unwrap();

    assert_eq!(run.requested_region_count, 3);
    assert_eq!(run.observations.len(), 3);
    assert_eq!(run.successful_count, 2);
    assert_eq!(run.failed_count(), 1);
    assert_eq!(run.errors.get(&50).map(String::as_str), Some("HTTP 500"));

    let moscow = run.observations.iter().find(|o| o.region_id == 77).unwrap();
    assert_eq!(moscow.status, ObservationStatus::Success);
    assert_eq!(moscow.fuel_prices[&FuelTag::Ai95], Decimal::new(5735, 2));

    let spb = run.observations.iter().find(|o| o.region_id == 78).unwrap();
    assert_eq!(spb.fuel_prices[&FuelTag::Ai92], Decimal::new(5210, 2));

    let at = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap();
    let store = HistoryStore::new(&config.history);
    let snapshot = store.commit_at(&run, at).unwrap();

    assert_eq!(snapshot.completeness, CompletenessTier::Partial);
    assert_eq!(snapshot.region_count, 2);
    assert_eq!(
        snapshot.json_path,
        history_dir
            .path()
            .join("2025/03/14/regions_partial_2reg_20250314_093000.json")
    );
    assert!(snapshot.json_path.exists());
    assert!(history_dir
        .path()
        .join("latest/latest_regions_20250314.json")
        .exists());
    assert!(history_dir
        .path()
        .join("latest/latest_regions_20250314.csv")
        .exists());
    assert_eq!(snapshot.export_paths.len(), 2);

    let entry = store
        .latest_entry_for_date(NaiveDate::from_ymd_opt(2025, 3, 14).unwrap())
        .unwrap();
    assert_eq!(entry.successful_regions, 2);
    assert_eq!(entry.failed_regions, 1);
    assert_eq!(
        entry.fuel_types,
        vec![FuelTag::Ai92, FuelTag::Ai95, FuelTag::Diesel]
    );
    assert_eq!(entry.price_statistics[&FuelTag::Ai95].count, 2);

    let restored = store.load_snapshot(&entry).unwrap();
    assert_eq!(restored.len(), 3);
    let restored_moscow = restored.iter().find(|o| o.region_id == 77).unwrap();
    assert_eq!(restored_moscow.fuel_prices, moscow.fuel_prices);
}

#[tokio::test]
async fn test_acquire_popular_regions_with_limit() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/regions"))
        .respond_with(ResponseTemplate::new(200).set_body_string(REGIONS_PAGE))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/prices"))
        .and(query_param("region", "78"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SPB_PAGE))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/prices"))
        .and(query_param("region", "77"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MOSCOW_PAGE))
        .expect(0) // Cut by max_regions
        .mount(&mock_server)
        .await;

    let history_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server, history_dir.path());

    // 999 is not published by the source and is skipped
    let selection = RegionSelection::Popular(vec![999, 78, 77]);
    let mut cache = RegionCache::new();
    let run = acquire(&config, &selection, Some(1), &mut cache).await.unwrap();

    assert_eq!(run.observations.len(), 1);
    assert_eq!(run.observations[0].region_id, 78);
    assert!(run.has_usable_observations());
}

#[tokio::test]
async fn test_acquire_unknown_regions_only() {
    let mock_server = MockServer::start().await;
    mount_source(&mock_server, MOSCOW_PAGE).await;

    let history_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server, history_dir.path());

    let mut cache = RegionCache::new();
    let result = acquire(&config, &RegionSelection::Ids(vec![998, 999]), None, &mut cache).await;

    assert!(matches!(result, Err(LedgerError::NoRegions)));
}

#[tokio::test]
async fn test_compare_and_trend_across_days() {
    let mock_server = MockServer::start().await;
    mount_source(&mock_server, MOSCOW_PAGE).await;

    let history_dir = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server, history_dir.path());
    config.fetcher.concurrency = 1;
    let store = HistoryStore::new(&config.history);

    let day1 = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
    let day2 = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();

    let mut cache = RegionCache::new();
    let first_run = acquire(&config, &RegionSelection::All, None, &mut cache)
        .await
        .unwrap();
    store
        .commit_at(&first_run, Utc.with_ymd_and_hms(2025, 3, 14, 8, 0, 0).unwrap())
        .unwrap();

    // Next day Moscow AI-95 is a rouble up; the region list comes from the cache
    mock_server.reset().await;
    mount_region(&mock_server, "77", ResponseTemplate::new(200).set_body_string(MOSCOW_PAGE_LATER)).await;
    mount_region(&mock_server, "78", ResponseTemplate::new(200).set_body_string(SPB_PAGE)).await;
    mount_region(&mock_server, "50", ResponseTemplate::new(500)).await;

    let second_run = acquire(&config, &RegionSelection::All, None, &mut cache)
        .await
        .unwrap();
    store
        .commit_at(&second_run, Utc.with_ymd_and_hms(2025, 3, 15, 8, 0, 0).unwrap())
        .unwrap();

    let comparison = store.compare_dates(day1, day2, None).unwrap();
    assert_eq!(comparison.common_regions, 2);
    assert_eq!(comparison.fuel_changes.len(), 1);
    let ai95 = &comparison.fuel_changes[&FuelTag::Ai95];
    assert_eq!(ai95.regions_with_changes, 1);
    assert_eq!(ai95.max_increase.region_id, 77);
    assert_eq!(ai95.max_increase.change, Decimal::new(100, 2));

    let trend = store.price_trend(day2, 7, FuelTag::Ai95).unwrap();
    assert_eq!(trend.daily_averages.len(), 2);
    assert_eq!(trend.daily_averages[0].avg_price, Decimal::new(5735, 2));
    assert_eq!(trend.daily_averages[1].avg_price, Decimal::new(5785, 2));
    assert_eq!(trend.total_change, Decimal::new(50, 2));

    let summary = store.statistics_summary_at(day2, 7).unwrap();
    assert_eq!(summary.total_entries, 2);
    assert_eq!(summary.unique_dates, 2);
    assert_eq!(summary.fuel_frequency[&FuelTag::Diesel], 2);
    assert_eq!(summary.average_regions, Decimal::new(20, 1));

    // Keeping one day back from the 16th drops the 14th only
    let report = store
        .cleanup_at(Utc.with_ymd_and_hms(2025, 3, 16, 8, 0, 0).unwrap(), 1)
        .unwrap();
    assert_eq!(report.removed_days, vec![day1]);
    assert_eq!(report.removed_entries, 1);
    assert!(!history_dir.path().join("2025/03/14").exists());
    assert!(store.compare_dates(day1, day2, None).is_err());
    assert_eq!(store.statistics_summary_at(day2, 7).unwrap().total_entries, 1);
}
