//! Integration tests for the statistics client using wiremock

use co2_dashboard::api::{ApiError, StatsClient, TopEmittersParams};
use co2_dashboard::dashboard::{spawn_refresh, Dashboard, LoadState, ResourceKind};
use co2_dashboard::{FilterField, FilterOptions, FilterState};
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> StatsClient {
    StatsClient::new(
        &server.uri(),
        Duration::from_secs(5),
        vec![2020, 2021, 2022, 2023],
    )
    .expect("Failed to build client")
}

#[tokio::test]
async fn test_available_options_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stats/available-options"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "years": [2019, 2020],
            "regions": ["ANDINA", "CARIBE"],
            "categories": ["1.A. Energia"],
            "category_types": ["aire"]
        })))
        .mount(&server)
        .await;

    let options = client_for(&server).available_options().await;

    assert_eq!(options.years, vec![2019, 2020]);
    assert!(options.regions.contains("CARIBE"));
    assert_eq!(options.categories.len(), 1);
}

#[tokio::test]
async fn test_available_options_falls_back_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stats/available-options"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let options = client_for(&server).available_options().await;

    assert_eq!(
        options,
        FilterOptions {
            years: vec![2020, 2021, 2022, 2023],
            regions: BTreeSet::new(),
            categories: BTreeSet::new(),
        }
    );
}

#[tokio::test]
async fn test_available_options_falls_back_when_unreachable() {
    // Nothing listens on the discard port.
    let client = StatsClient::new("http://127.0.0.1:9", Duration::from_secs(2), vec![2023])
        .expect("Failed to build client");

    let options = client.available_options().await;
    assert_eq!(options.years, vec![2023]);
    assert!(options.regions.is_empty());
}

#[tokio::test]
async fn test_general_stats_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stats/general"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"detail": "Datos no cargados"})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .general_stats(None)
        .await
        .expect_err("503 must surface as an error");

    match err {
        ApiError::Status { status, url } => {
            assert_eq!(status.as_u16(), 503);
            assert!(url.ends_with("/stats/general"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_general_stats_invalid_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stats/general"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).general_stats(None).await.unwrap_err();
    assert!(matches!(err, ApiError::Decode { .. }));
}

#[tokio::test]
async fn test_filters_are_sent_and_all_is_omitted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stats/time-series"))
        .and(query_param("year", "2021"))
        .and(query_param("region", "AMAZONIA"))
        .and(query_param_is_missing("category"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "time_series": [{"ANO": 2021, "mean": 4.2}],
            "region": "AMAZONIA"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let filters = FilterState::default()
        .with(FilterField::Year, "2021")
        .with(FilterField::Region, "AMAZONIA");

    let payload = client_for(&server)
        .time_series(Some(&filters))
        .await
        .expect("time series request failed");

    assert_eq!(payload["region"], "AMAZONIA");
}

#[tokio::test]
async fn test_region_stats_groups_by_region() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stats/regions"))
        .and(query_param("by", "REGION"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"stats": []})))
        .expect(1)
        .mount(&server)
        .await;

    let payload = client_for(&server).region_stats(None).await.unwrap();
    assert_eq!(payload, json!({"stats": []}));
}

#[tokio::test]
async fn test_top_emitters_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stats/top-emitters"))
        .and(query_param("category", "1.A. Energia"))
        .and(query_param("n", "5"))
        .and(query_param("by", "CATEGORIA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "top_emitters": [{"CATEGORIA": "1.A. Energia", "total_emissions": 99.0, "count": 3}],
            "by": "CATEGORIA",
            "n": 5
        })))
        .expect(1)
        .mount(&server)
        .await;

    let filters = FilterState::default().with(FilterField::Category, "1.A. Energia");
    let params = TopEmittersParams {
        n: 5,
        by: "CATEGORIA".to_string(),
    };

    let payload = client_for(&server)
        .top_emitters(Some(&filters), &params)
        .await
        .unwrap();
    assert_eq!(payload["n"], 5);
}

#[tokio::test]
async fn test_health() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "data_loaded": true,
            "model_loaded": false
        })))
        .mount(&server)
        .await;

    let health = client_for(&server).health().await.unwrap();
    assert!(health.is_healthy());
    assert!(health.data_loaded);
    assert!(!health.model_loaded);
}

#[tokio::test]
async fn test_refresh_populates_every_resource() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stats/general"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_records": 42,
            "co2_stats": {"mean": 1.5}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/stats/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stats": [{"CATEGORIA": "A", "count": 2, "mean": 7.0}]
        })))
        .mount(&server)
        .await;
    // Every other resource is unavailable.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = Arc::new(client_for(&server));
    let mut dashboard = Dashboard::default();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let requests = dashboard.begin_refresh();
    let expected = requests.len();
    spawn_refresh(&client, requests, &TopEmittersParams::default(), &tx);

    for _ in 0..expected {
        let outcome = rx.recv().await.expect("channel closed early");
        assert!(dashboard.apply(outcome));
    }

    assert!(!dashboard.is_loading());
    assert!(!dashboard.connection_failed());
    assert_eq!(dashboard.summary().and_then(|s| s.count), Some(42.0));

    let categories = dashboard.series(ResourceKind::Categories).unwrap();
    assert_eq!(categories.value_key, "mean");
    assert_eq!(categories.points(), vec![("A".to_string(), 7.0)]);

    assert!(matches!(
        dashboard.state(ResourceKind::TimeSeries),
        LoadState::Error(_)
    ));
}

#[tokio::test]
async fn test_refresh_reports_connection_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = Arc::new(client_for(&server));
    let mut dashboard = Dashboard::default();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let requests = dashboard.begin_refresh();
    let expected = requests.len();
    spawn_refresh(&client, requests, &TopEmittersParams::default(), &tx);

    for _ in 0..expected {
        dashboard.apply(rx.recv().await.unwrap());
    }

    assert!(dashboard.connection_failed());
    assert!(!dashboard.service_unreachable());
}

#[tokio::test]
async fn test_refresh_reports_unreachable_service() {
    // Nothing listens on the discard port.
    let client = Arc::new(
        StatsClient::new("http://127.0.0.1:9", Duration::from_secs(2), vec![2023])
            .expect("Failed to build client"),
    );
    let mut dashboard = Dashboard::default();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let requests = dashboard.begin_refresh();
    let expected = requests.len();
    spawn_refresh(&client, requests, &TopEmittersParams::default(), &tx);

    for _ in 0..expected {
        dashboard.apply(rx.recv().await.unwrap());
    }

    assert!(dashboard.connection_failed());
    assert!(dashboard.service_unreachable());
}
