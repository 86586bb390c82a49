//! Integration tests for the measurement client and the full run
//!
//! Tests cover:
//! - Query parameters and X-Api-Key header reach the server
//! - Non-success statuses surface as RemoteFetch with status and body
//! - Undecodable bodies, refused connections and timeouts
//! - End-to-end run: totals, chart file, empty result, negative values

use axum::{
    extract::Query,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use ecal_av::config::AggregateSettings;
use ecal_av::{DateRange, Error, MeasurementClient};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tempfile::TempDir;

const TEST_KEY: &str = "test-key";

/// Test helper: start `app` on an ephemeral port, return its base URL
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api/v1/measurements", addr)
}

/// Test helper: mock measurement endpoint
///
/// Requires the test key and the 2022 calendar year; answers with three
/// facilities and one measurement lacking the Facility attribute.
async fn measurements(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> Response {
    if headers.get("X-Api-Key").and_then(|v| v.to_str().ok()) != Some(TEST_KEY) {
        return (StatusCode::UNAUTHORIZED, "invalid api key").into_response();
    }
    if query.get("start_date").map(String::as_str) != Some("2022-01-01")
        || query.get("end_date").map(String::as_str) != Some("2022-12-31")
    {
        return (StatusCode::BAD_REQUEST, "unexpected date range").into_response();
    }

    Json(json!({
        "measurements": [
            {"customerData": {"Facility": "Paris"}, "resultValue": 5.0},
            {"customerData": {"Facility": "Lyon"}, "resultValue": 10.0},
            {"customerData": {"Facility": "Paris"}, "resultValue": 3.0},
            {"customerData": {"Facility": "Nantes"}, "resultValue": 0.5},
            {"customerData": {"Site": "Unknown"}, "resultValue": 99.0}
        ]
    }))
    .into_response()
}

fn mock_app() -> Router {
    Router::new().route("/api/v1/measurements", get(measurements))
}

fn year_2022() -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2022, 12, 31).unwrap(),
    )
    .unwrap()
}

fn client(url: &str, key: &str) -> MeasurementClient {
    MeasurementClient::new(url, key.to_string(), Duration::from_secs(5)).unwrap()
}

fn settings(url: String, chart_path: std::path::PathBuf) -> AggregateSettings {
    AggregateSettings {
        api_url: url,
        range: year_2022(),
        group_field: "Facility".to_string(),
        chart_path,
        timeout: Duration::from_secs(5),
    }
}

// =============================================================================
// Measurement client
// =============================================================================

#[tokio::test]
async fn test_fetch_sends_key_and_range() {
    let url = serve(mock_app()).await;

    let measurements = client(&url, TEST_KEY).fetch(&year_2022()).await.unwrap();

    assert_eq!(measurements.len(), 5);
    assert_eq!(measurements[1].group_key("Facility").as_deref(), Some("Lyon"));
    assert_eq!(measurements[1].result_value, 10.0);
}

#[tokio::test]
async fn test_unauthorized_is_remote_fetch() {
    let url = serve(mock_app()).await;

    let result = client(&url, "wrong-key").fetch(&year_2022()).await;

    match result {
        Err(Error::RemoteFetch { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "invalid api key");
        }
        other => panic!("expected RemoteFetch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_is_remote_fetch() {
    let app = Router::new().route(
        "/api/v1/measurements",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable") }),
    );
    let url = serve(app).await;

    let result = client(&url, TEST_KEY).fetch(&year_2022()).await;

    assert!(matches!(
        result,
        Err(Error::RemoteFetch { status: 500, ref message }) if message == "database unavailable"
    ));
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let app = Router::new().route(
        "/api/v1/measurements",
        get(|| async { Json(json!({"items": []})) }),
    );
    let url = serve(app).await;

    let result = client(&url, TEST_KEY).fetch(&year_2022()).await;

    assert!(matches!(result, Err(Error::Decode(_))));
}

#[tokio::test]
async fn test_refused_connection_is_network_error() {
    // Reserve a port, then close it
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = format!("http://{}/api/v1/measurements", addr);
    let result = client(&url, TEST_KEY).fetch(&year_2022()).await;

    assert!(matches!(result, Err(Error::Network(_))));
}

#[tokio::test]
async fn test_timeout_is_network_error() {
    let app = Router::new().route(
        "/api/v1/measurements",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!({"measurements": []}))
        }),
    );
    let url = serve(app).await;
    let client = MeasurementClient::new(url, TEST_KEY.to_string(), Duration::from_millis(200)).unwrap();

    let result = client.fetch(&year_2022()).await;

    assert!(matches!(result, Err(Error::Network(_))));
}

// =============================================================================
// Full run
// =============================================================================

#[tokio::test]
async fn test_run_aggregates_and_writes_chart() {
    let url = serve(mock_app()).await;
    let temp_dir = TempDir::new().unwrap();
    let chart_path = temp_dir.path().join("output").join("emissions_by_facility.svg");

    let outcome = ecal_av::run(&settings(url, chart_path.clone()), TEST_KEY.to_string())
        .await
        .unwrap();

    assert_eq!(outcome.measurements, 5);
    assert_eq!(
        outcome.totals.groups,
        vec![
            ("Lyon".to_string(), 10.0),
            ("Paris".to_string(), 8.0),
            ("Nantes".to_string(), 0.5),
        ]
    );
    assert_eq!(outcome.totals.skipped, 1);
    assert_eq!(outcome.totals.negative_values, 0);
    assert_eq!(outcome.chart_file.as_deref(), Some(chart_path.as_path()));

    let svg = std::fs::read_to_string(&chart_path).unwrap();
    assert!(svg.contains("Emission Distribution by Facility in 2022"));
    assert!(svg.contains("10.00"));
    assert!(svg.contains("8.00"));
}

#[tokio::test]
async fn test_run_with_no_measurements_skips_chart() {
    let app = Router::new().route(
        "/api/v1/measurements",
        get(|| async { Json(json!({"measurements": []})) }),
    );
    let url = serve(app).await;
    let temp_dir = TempDir::new().unwrap();
    let chart_path = temp_dir.path().join("chart.svg");

    let outcome = ecal_av::run(&settings(url, chart_path.clone()), TEST_KEY.to_string())
        .await
        .unwrap();

    assert!(outcome.totals.is_empty());
    assert!(outcome.chart_file.is_none());
    assert!(!chart_path.exists());
}

#[tokio::test]
async fn test_run_reports_negative_values() {
    let app = Router::new().route(
        "/api/v1/measurements",
        get(|| async {
            Json(json!({
                "measurements": [
                    {"customerData": {"Facility": "Paris"}, "resultValue": 5.0},
                    {"customerData": {"Facility": "Paris"}, "resultValue": -20.0},
                    {"customerData": {"Facility": "Lyon"}, "resultValue": 1.0}
                ]
            }))
        }),
    );
    let url = serve(app).await;
    let temp_dir = TempDir::new().unwrap();
    let chart_path = temp_dir.path().join("chart.svg");

    let outcome = ecal_av::run(&settings(url, chart_path.clone()), TEST_KEY.to_string())
        .await
        .unwrap();

    assert_eq!(outcome.totals.negative_values, 1);
    assert_eq!(
        outcome.totals.groups,
        vec![("Lyon".to_string(), 1.0), ("Paris".to_string(), -15.0)]
    );
    assert!(chart_path.exists());
}

#[tokio::test]
async fn test_run_fails_without_partial_output() {
    let url = serve(mock_app()).await;
    let temp_dir = TempDir::new().unwrap();
    let chart_path = temp_dir.path().join("chart.svg");

    let result = ecal_av::run(&settings(url, chart_path.clone()), "wrong-key".to_string()).await;

    assert!(matches!(result, Err(Error::RemoteFetch { status: 401, .. })));
    assert!(!chart_path.exists());
}
