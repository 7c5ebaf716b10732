use super::*;
use crate::pacing::NoDelay;
use crate::testing::{FakeListing, FakePage};

const BASE: &str = "https://maps.test/search/";

fn settings(skip_first: usize, max_results: usize) -> SearchSettings {
    SearchSettings {
        base_url: BASE.to_string(),
        country: "Perú".to_string(),
        max_results,
        skip_first,
        max_scroll_attempts: 5,
        estimate_age: false,
    }
}

fn orchestrator(page: FakePage, skip_first: usize, max_results: usize) -> SearchOrchestrator<FakePage> {
    SearchOrchestrator::new(
        page,
        Arc::new(NoDelay),
        EmailHarvester::new(5, 0.0).expect("harvester"),
        settings(skip_first, max_results),
    )
}

fn miraflores() -> SearchLocation {
    SearchLocation::new("Lima", "Lima", "Miraflores")
}

fn listings(n: usize) -> Vec<FakeListing> {
    (0..n)
        .map(|i| FakeListing::named(&format!("Negocio {i}")))
        .collect()
}

fn names(records: &[BusinessRecord]) -> Vec<&str> {
    records.iter().map(|r| r.name.as_str()).collect()
}

// -----------------------------------------------------------------------
// search_url
// -----------------------------------------------------------------------

#[test]
fn search_url_encodes_each_word_and_joins_with_plus() {
    let url = search_url(
        "https://www.google.com/maps/search/",
        "restaurantes",
        &SearchLocation::new("Lima", "Lima", "San Isidro"),
        "Perú",
    );
    assert_eq!(
        url,
        "https://www.google.com/maps/search/restaurantes+en+San+Isidro%2C+Lima%2C+Lima%2C+Per%C3%BA"
    );
}

#[test]
fn search_url_collapses_repeated_whitespace() {
    let url = search_url(BASE, "  pollo   a la brasa ", &miraflores(), "Perú");
    assert!(url.starts_with(&format!("{BASE}pollo+a+la+brasa+en+Miraflores%2C")));
}

#[test]
fn settings_follow_app_config() {
    let config = AppConfig {
        env: mapscout_core::Environment::Test,
        log_level: "info".into(),
        output_dir: "out".into(),
        country: "Perú".into(),
        search_base_url: BASE.into(),
        headless: true,
        chrome_path: None,
        max_results: 40,
        skip_first: 20,
        max_scroll_attempts: 7,
        website_scan_probability: 0.5,
        website_timeout_secs: 8,
        pacing: mapscout_core::PacingMode::None,
    };
    let s = SearchSettings::from_config(&config);
    assert_eq!(s.max_results, 40);
    assert_eq!(s.skip_first, 20);
    assert_eq!(s.max_scroll_attempts, 7);
    assert!(!s.estimate_age);
}

// -----------------------------------------------------------------------
// search_location
// -----------------------------------------------------------------------

#[tokio::test]
async fn extracts_every_listing_in_order_with_location_metadata() {
    let orch = orchestrator(FakePage::new(listings(3)), 0, 10);
    let records = orch
        .search_location("cevicherías", &miraflores(), &FilterCriteria::default())
        .await
        .unwrap();

    assert_eq!(names(&records), vec!["Negocio 0", "Negocio 1", "Negocio 2"]);
    for record in &records {
        assert_eq!(record.department, "Lima");
        assert_eq!(record.province, "Lima");
        assert_eq!(record.district, "Miraflores");
        assert_eq!(record.search_query, "cevicherías");
    }
    assert_eq!(orch.page().back_clicks(), 3);
    assert_eq!(orch.page().visited_urls().len(), 1);
}

#[tokio::test]
async fn consent_prompt_is_dismissed() {
    let orch = orchestrator(FakePage::new(listings(1)).with_consent(), 0, 10);
    let records = orch
        .search_location("hoteles", &miraflores(), &FilterCriteria::default())
        .await
        .unwrap();
    assert!(orch.page().consent_dismissed());
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn skip_window_is_truncated_to_loaded_items() {
    let page = FakePage::new(listings(25)).paged(10, 10);
    let orch = orchestrator(page, 20, 20);
    let records = orch
        .search_location("bodegas", &miraflores(), &FilterCriteria::default())
        .await
        .unwrap();
    assert_eq!(
        names(&records),
        vec!["Negocio 20", "Negocio 21", "Negocio 22", "Negocio 23", "Negocio 24"]
    );
}

#[tokio::test]
async fn unopenable_item_is_skipped_without_restore() {
    let orch = orchestrator(FakePage::new(listings(3)).unclickable(1), 0, 10);
    let records = orch
        .search_location("farmacias", &miraflores(), &FilterCriteria::default())
        .await
        .unwrap();
    assert_eq!(names(&records), vec!["Negocio 0", "Negocio 2"]);
    assert_eq!(orch.page().back_clicks(), 2);
    assert_eq!(orch.page().history_backs(), 0);
}

#[tokio::test]
async fn shrunken_list_skips_missing_indices() {
    let orch = orchestrator(FakePage::new(listings(4)).shrinking_to(2), 0, 10);
    let records = orch
        .search_location("cafés", &miraflores(), &FilterCriteria::default())
        .await
        .unwrap();
    assert_eq!(names(&records), vec!["Negocio 0", "Negocio 1"]);
}

#[tokio::test]
async fn nameless_listings_never_become_records() {
    let mut all = listings(2);
    all.insert(1, FakeListing::default());
    let orch = orchestrator(FakePage::new(all), 0, 10);
    let records = orch
        .search_location("panaderías", &miraflores(), &FilterCriteria::default())
        .await
        .unwrap();
    assert_eq!(names(&records), vec!["Negocio 0", "Negocio 1"]);
}

#[tokio::test]
async fn filters_apply_to_the_batch() {
    let page = FakePage::new(vec![
        FakeListing::named("Buena").with_detail(|d| {
            d.rating_label = Some("4,8 estrellas".into());
            d.review_count_text = Some("(120)".into());
        }),
        FakeListing::named("Regular").with_detail(|d| {
            d.rating_label = Some("3,9 estrellas".into());
            d.review_count_text = Some("(300)".into());
        }),
        FakeListing::named("Nueva").with_detail(|d| {
            d.rating_label = Some("5 estrellas".into());
            d.review_count_text = Some("(3)".into());
        }),
    ]);
    let orch = orchestrator(page, 0, 10);
    let filters = FilterCriteria {
        min_rating: 4.0,
        min_reviews: 10,
        ..FilterCriteria::default()
    };
    let records = orch
        .search_location("restaurantes", &miraflores(), &filters)
        .await
        .unwrap();
    assert_eq!(names(&records), vec!["Buena"]);
    assert_eq!(records[0].rating, 4.8);
    assert_eq!(records[0].review_count, 120);
}

#[tokio::test]
async fn navigation_failure_is_a_location_level_error() {
    let orch = orchestrator(FakePage::new(listings(3)).failing_navigation(), 0, 10);
    let err = orch
        .search_location("gimnasios", &miraflores(), &FilterCriteria::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ScraperError::Browser(BrowserError::Navigation { .. })));
    assert!(!err.is_fatal());
    assert!(orch.page().opened().is_empty());
}

#[tokio::test]
async fn missing_list_is_a_location_level_error() {
    let orch = orchestrator(FakePage::new(listings(3)).without_list(), 0, 10);
    let err = orch
        .search_location("gimnasios", &miraflores(), &FilterCriteria::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ScraperError::ListNotFound { .. }));
    assert!(!err.is_fatal());
}

#[tokio::test]
async fn session_loss_mid_search_is_fatal() {
    let orch = orchestrator(FakePage::new(listings(3)).closing_after(1), 0, 10);
    let err = orch
        .search_location("bares", &miraflores(), &FilterCriteria::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ScraperError::Browser(BrowserError::SessionClosed)));
    assert!(err.is_fatal());
    assert_eq!(orch.page().opened(), vec![0]);
}
