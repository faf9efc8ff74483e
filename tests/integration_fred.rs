#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

//! End-to-end tool calls against a mock FRED API, resolving the API key from
//! the process environment on every call.

use fred_mcp::commands::build_server;
use fred_mcp::config::{Config, FredConfig};
use fred_mcp::fred::{ClientFactory, HttpClientFactory};
use fred_mcp::mcp::McpServer;
use fred_mcp::mcp::server::MessageHandler;
use serde_json::{Value, json};
use serial_test::serial;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY_VAR: &str = "FRED_MCP_INTEGRATION_KEY";

fn server_against(mock: &MockServer) -> Arc<McpServer> {
    let config = Config {
        fred: FredConfig {
            base_url: format!("{}/fred/", mock.uri()),
            api_key_env: KEY_VAR.to_string(),
            timeout_seconds: 5,
            ..FredConfig::default()
        },
        ..Config::default()
    };
    let factory: Arc<dyn ClientFactory> = Arc::new(HttpClientFactory::new(config.fred.clone()));
    Arc::new(build_server(&config, factory).expect("Failed to create MCP server"))
}

fn set_key(value: Option<&str>) {
    // SAFETY: every test touching this variable is #[serial], so no other
    // thread reads or writes the environment concurrently.
    unsafe {
        match value {
            Some(value) => std::env::set_var(KEY_VAR, value),
            None => std::env::remove_var(KEY_VAR),
        }
    }
}

async fn call_tool(server: &Arc<McpServer>, name: &str, arguments: Value) -> Value {
    MessageHandler::new(Arc::clone(server))
        .handle_call_tool(Some(json!({"name": name, "arguments": arguments})))
        .await
        .expect("tool call should produce a result")
}

fn releases_body() -> Value {
    json!({
        "realtime_start": "2024-02-01",
        "realtime_end": "2024-02-01",
        "count": 2,
        "releases": [
            {
                "id": 9,
                "realtime_start": "2024-02-01",
                "realtime_end": "2024-02-01",
                "name": "Advance Monthly Sales for Retail and Food Services",
                "press_release": true,
                "link": "http://www.census.gov/retail/"
            },
            {
                "id": 10,
                "realtime_start": "2024-02-01",
                "realtime_end": "2024-02-01",
                "name": "Consumer Price Index",
                "press_release": true
            }
        ]
    })
}

#[tokio::test(flavor = "multi_thread")]
#[serial]
async fn missing_key_makes_no_network_call() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(releases_body()))
        .expect(0)
        .mount(&mock)
        .await;

    set_key(None);
    let server = server_against(&mock);

    for (name, arguments) in [
        ("get_releases", json!({})),
        ("search_series", json!({"query": "gdp"})),
        ("get_source", json!({"source_id": 1})),
    ] {
        let result = call_tool(&server, name, arguments).await;
        assert_eq!(result["isError"], true, "{name}");
        let text = result["content"][0]["text"].as_str().expect("text content");
        assert!(text.contains("Configuration error"), "{name}: {text}");
        assert!(text.contains("FRED_MCP_INTEGRATION_KEY environment variable not set"));
    }

    mock.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
#[serial]
async fn rotated_key_is_used_on_next_call() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fred/releases"))
        .and(query_param("api_key", "first-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(releases_body()))
        .expect(1)
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/fred/releases"))
        .and(query_param("api_key", "second-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(releases_body()))
        .expect(1)
        .mount(&mock)
        .await;

    let server = server_against(&mock);

    set_key(Some("first-key"));
    let first = call_tool(&server, "get_releases", json!({"limit": 1})).await;
    assert_eq!(first["isError"], false);
    assert_eq!(first["structuredContent"]["total"], 2);
    assert_eq!(first["structuredContent"]["showing"], 1);

    set_key(Some("second-key"));
    let second = call_tool(&server, "get_releases", json!({})).await;
    assert_eq!(second["isError"], false);
    let text = second["content"][0]["text"].as_str().expect("text content");
    assert!(text.starts_with("**Found 2 releases (showing 2):**"));

    set_key(None);
    mock.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
#[serial]
async fn upstream_rejection_is_reported_verbatim() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fred/series"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error_code": 429,
            "error_message": "Too Many Requests.  Exceeded Rate Limit"
        })))
        .mount(&mock)
        .await;

    set_key(Some("any-key"));
    let server = server_against(&mock);

    let result = call_tool(&server, "get_series_info", json!({"series_id": "GDP"})).await;
    set_key(None);

    assert_eq!(result["isError"], true);
    let error = result["structuredContent"]["error"]
        .as_str()
        .expect("error field");
    assert!(error.starts_with("Error getting series info: Upstream error:"));
    assert!(error.contains("HTTP 429"));
    assert!(error.contains("Exceeded Rate Limit"));
}

#[tokio::test(flavor = "multi_thread")]
#[serial]
async fn series_data_uses_metadata_heading() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fred/series/observations"))
        .and(query_param("series_id", "UNRATE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "observations": [
                {"realtime_start": "2024-02-01", "realtime_end": "2024-02-01", "date": "2023-11-01", "value": "3.7"},
                {"realtime_start": "2024-02-01", "realtime_end": "2024-02-01", "date": "2023-12-01", "value": "3.7"},
                {"realtime_start": "2024-02-01", "realtime_end": "2024-02-01", "date": "2024-01-01", "value": "."}
            ]
        })))
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/fred/series"))
        .and(query_param("series_id", "UNRATE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "seriess": [{
                "id": "UNRATE",
                "title": "Unemployment Rate",
                "units": "Percent",
                "frequency": "Monthly"
            }]
        })))
        .mount(&mock)
        .await;

    set_key(Some("any-key"));
    let server = server_against(&mock);

    let result = call_tool(
        &server,
        "get_series_data",
        json!({"series_id": "UNRATE", "offset": 1}),
    )
    .await;
    set_key(None);

    assert_eq!(result["isError"], false);
    let text = result["content"][0]["text"].as_str().expect("text content");
    assert!(text.starts_with("## Unemployment Rate (Percent)\n\n**Found 3 data points (showing 2):**"));
    assert_eq!(
        result["structuredContent"]["results"],
        json!([
            {"date": "2023-12-01", "value": 3.7},
            {"date": "2024-01-01", "value": null}
        ])
    );
}

#[tokio::test(flavor = "multi_thread")]
#[serial]
async fn unknown_series_data_is_not_found() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error_code": 400,
            "error_message": "Bad Request.  The series does not exist."
        })))
        .mount(&mock)
        .await;

    set_key(Some("any-key"));
    let server = server_against(&mock);

    let data = call_tool(&server, "get_series_data", json!({"series_id": "NOPE"})).await;
    let info = call_tool(&server, "get_series_info", json!({"series_id": "NOPE"})).await;
    set_key(None);

    for result in [&data, &info] {
        assert_eq!(result["isError"], false);
        assert_eq!(result["structuredContent"]["status"], "not_found");
    }
    assert_eq!(data["content"][0]["text"], "No data found for series NOPE");
    assert_eq!(info["content"][0]["text"], "No info found for series NOPE");

    // No metadata lookup follows an unknown observations request
    let requests = mock.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 2);
}
