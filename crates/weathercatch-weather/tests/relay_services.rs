//! Integration tests for the relay-backed services using wiremock.
//!
//! The mock server plays the relay: every response is an envelope whose
//! `contents` holds the upstream body as a string.

use std::time::Duration;

use weathercatch_weather::{
    FetchError, Geocoder, PlaceLookup, RelayClient, WeatherProvider, WeatherSource,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Wrap an upstream JSON body the way the relay does
fn envelope(upstream: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "contents": upstream.to_string(),
        "status": { "http_code": 200 }
    })
}

async fn relay_returning(body: serde_json::Value) -> MockServer {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&mock_server)
        .await;
    mock_server
}

fn relay_client(server: &MockServer) -> RelayClient {
    RelayClient::new(format!("{}/get", server.uri())).unwrap()
}

/// The target URL the relay was asked to fetch
async fn forwarded_target(server: &MockServer) -> url::Url {
    let requests = server.received_requests().await.unwrap();
    let target = requests[0]
        .url
        .query_pairs()
        .find(|(k, _)| k == "url")
        .map(|(_, v)| v.into_owned())
        .unwrap();
    url::Url::parse(&target).unwrap()
}

#[tokio::test]
async fn test_fetch_weather_success() {
    let server = relay_returning(envelope(serde_json::json!({
        "timeseries": [
            { "time": "2024-01-01T01:00:00Z", "temperature": 301.0, "rainfall": 1.5 },
            { "time": "2024-01-01T00:00:00Z", "temperature": 300.0, "rainfall": 0.0 }
        ]
    })))
    .await;

    let provider = WeatherProvider::new(relay_client(&server), "https://weather.example/timeseries");
    let snapshot = provider.fetch(20.5937, 78.9629).await.unwrap();

    assert_eq!(snapshot.len(), 2);
    let current = snapshot.current().unwrap();
    assert_eq!(current.temperature_kelvin, 300.0);
    assert_eq!(current.rainfall_mm, 0.0);

    let target = forwarded_target(&server).await;
    assert_eq!(target.path(), "/timeseries");
    assert!(target.query_pairs().any(|(k, v)| k == "lat" && v == "20.5937"));
    assert!(target.query_pairs().any(|(k, v)| k == "lon" && v == "78.9629"));
}

#[tokio::test]
async fn test_fetch_weather_missing_timeseries_is_data_format() {
    let server = relay_returning(envelope(serde_json::json!({ "error": "upstream down" }))).await;

    let provider = WeatherProvider::new(relay_client(&server), "https://weather.example/timeseries");
    let err = provider.fetch(1.0, 2.0).await.unwrap_err();

    assert!(matches!(err, FetchError::DataFormat(_)), "got {:?}", err);
    assert!(err.to_string().contains("Malformed"));
}

#[tokio::test]
async fn test_fetch_weather_empty_timeseries_is_data_format() {
    let server = relay_returning(envelope(serde_json::json!({ "timeseries": [] }))).await;

    let provider = WeatherProvider::new(relay_client(&server), "https://weather.example/timeseries");
    let err = provider.fetch(1.0, 2.0).await.unwrap_err();

    assert!(matches!(err, FetchError::DataFormat(_)));
}

#[tokio::test]
async fn test_fetch_weather_missing_envelope() {
    let server = relay_returning(serde_json::json!({ "status": { "http_code": 500 } })).await;

    let provider = WeatherProvider::new(relay_client(&server), "https://weather.example/timeseries");
    let err = provider.fetch(1.0, 2.0).await.unwrap_err();

    assert!(matches!(err, FetchError::Envelope(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_fetch_weather_timeout_is_distinguishable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(serde_json::json!({ "timeseries": [] })))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let provider = WeatherProvider::new(relay_client(&server), "https://weather.example/timeseries")
        .with_timeout(Duration::from_millis(50));
    let err = provider.fetch(1.0, 2.0).await.unwrap_err();

    assert!(matches!(err, FetchError::Timeout));
    assert!(err.to_string().contains("timed out"));
}

#[tokio::test]
async fn test_fetch_weather_proxy_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let provider = WeatherProvider::new(relay_client(&server), "https://weather.example/timeseries");
    let err = provider.fetch(1.0, 2.0).await.unwrap_err();

    assert!(matches!(err, FetchError::Transport(_)));
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_reverse_geocode_success() {
    let server = relay_returning(envelope(serde_json::json!({
        "display_name": "Seattle, King County, Washington, United States",
        "lat": "47.6062",
        "lon": "-122.3321"
    })))
    .await;

    let geocoder = Geocoder::new(relay_client(&server), "https://nominatim.example");
    let name = geocoder.reverse_geocode(47.6062, -122.3321).await;
    assert_eq!(name, "Seattle, King County, Washington, United States");

    let target = forwarded_target(&server).await;
    assert_eq!(target.path(), "/reverse");
    assert!(target.query_pairs().any(|(k, v)| k == "format" && v == "json"));
}

#[tokio::test]
async fn test_reverse_geocode_failure_falls_back_to_coordinates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let geocoder = Geocoder::new(relay_client(&server), "https://nominatim.example");
    let name = geocoder.reverse_geocode(20.5937, 78.9629).await;
    assert_eq!(name, "20.5937, 78.9629");
}

#[tokio::test]
async fn test_reverse_geocode_without_name_falls_back_to_coordinates() {
    let server = relay_returning(envelope(serde_json::json!({ "error": "Unable to geocode" }))).await;

    let geocoder = Geocoder::new(relay_client(&server), "https://nominatim.example");
    let name = geocoder.reverse_geocode(0.0, -30.5).await;
    assert_eq!(name, "0.0000, -30.5000");
}

#[tokio::test]
async fn test_suggest_returns_parsed_places() {
    let server = relay_returning(envelope(serde_json::json!([
        { "display_name": "London, England", "lat": "51.5074", "lon": "-0.1278" },
        { "display_name": "London, Ontario", "lat": "42.9849", "lon": "-81.2453" },
        { "display_name": "Broken", "lat": "n/a", "lon": "0" }
    ])))
    .await;

    let geocoder = Geocoder::new(relay_client(&server), "https://nominatim.example");
    let suggestions = geocoder.suggest("London").await;

    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0].display_name, "London, England");
    assert_eq!(suggestions[1].latitude, 42.9849);

    let target = forwarded_target(&server).await;
    assert_eq!(target.path(), "/search");
    assert!(target.query_pairs().any(|(k, v)| k == "q" && v == "London"));
    assert!(target.query_pairs().any(|(k, v)| k == "limit" && v == "5"));
}

#[tokio::test]
async fn test_suggest_non_array_is_empty() {
    let server = relay_returning(envelope(serde_json::json!({ "error": "rate limited" }))).await;

    let geocoder = Geocoder::new(relay_client(&server), "https://nominatim.example");
    assert!(geocoder.suggest("London").await.is_empty());
}

#[tokio::test]
async fn test_suggest_failure_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let geocoder = Geocoder::new(relay_client(&server), "https://nominatim.example");
    assert!(geocoder.suggest("London").await.is_empty());
}
