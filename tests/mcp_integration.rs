#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

//! MCP Server Integration Tests
//!
//! Drives the complete server (catalog, validation, dispatch, response
//! building) over an in-memory transport against a stub FRED upstream.

use fred_mcp::commands::build_server;
use fred_mcp::config::Config;
use fred_mcp::fred::{
    ClientFactory, EntityLookup, FredApi, Observation, Release, Series, Source,
};
use fred_mcp::mcp::server::{ConnectionState, MessageHandler};
use fred_mcp::mcp::{CallToolParams, McpServer, ToolContent, ToolHandler};
use fred_mcp::{FredError, Result};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Upstream returning five search hits and nothing else
struct StubUpstream;

fn stub_series(i: usize) -> Series {
    serde_json::from_value(json!({
        "id": format!("GDP{i}"),
        "title": format!("Gross Domestic Product {i}"),
        "units": "Billions of Dollars",
        "observation_start": "1947-01-01",
        "last_updated": "2024-01-25 07:52:02-06"
    }))
    .expect("series should deserialize")
}

impl FredApi for StubUpstream {
    fn search_series(&self, _search_text: &str) -> Result<Vec<Series>> {
        Ok((1..=5).map(stub_series).collect())
    }

    fn series_info(&self, series_id: &str) -> Result<EntityLookup<Series>> {
        Ok(EntityLookup::NotFound(format!(
            "No info found for series {series_id}"
        )))
    }

    fn series_observations(&self, _series_id: &str) -> Result<EntityLookup<Vec<Observation>>> {
        Err(FredError::Upstream(
            "FRED API returned HTTP 500: Internal Server Error".to_string(),
        ))
    }

    fn category_series(&self, _category_id: i64) -> Result<EntityLookup<Vec<Series>>> {
        Ok(EntityLookup::Single(Vec::new()))
    }

    fn releases(&self) -> Result<Vec<Release>> {
        Ok(Vec::new())
    }

    fn release_series(&self, release_id: i64) -> Result<EntityLookup<Vec<Series>>> {
        Ok(EntityLookup::NotFound(format!(
            "No series found for release {release_id}"
        )))
    }

    fn sources(&self) -> Result<Vec<Source>> {
        Ok(Vec::new())
    }

    fn source(&self, source_id: i64) -> Result<EntityLookup<Source>> {
        Ok(EntityLookup::NotFound(format!(
            "No info found for source {source_id}"
        )))
    }
}

#[derive(Default)]
struct StubFactory {
    connects: AtomicUsize,
}

impl ClientFactory for StubFactory {
    fn connect(&self) -> Result<Box<dyn FredApi>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubUpstream))
    }
}

fn test_server() -> (Arc<McpServer>, Arc<StubFactory>) {
    let factory = Arc::new(StubFactory::default());
    let server = build_server(&Config::default(), Arc::clone(&factory) as Arc<dyn ClientFactory>)
        .expect("Failed to create MCP server");
    (Arc::new(server), factory)
}

/// Call a tool through the message handler and return the JSON result
async fn call_tool(server: &Arc<McpServer>, name: &str, arguments: Value) -> Value {
    let handler = MessageHandler::new(Arc::clone(server));
    handler
        .handle_call_tool(Some(json!({"name": name, "arguments": arguments})))
        .await
        .expect("tool call should produce a result")
}

/// Feed newline-delimited messages to the server and collect its replies
async fn run_session(server: Arc<McpServer>, messages: &[Value]) -> Vec<Value> {
    let input: String = messages
        .iter()
        .map(|m| format!("{m}\n"))
        .collect();
    let mut output: Vec<u8> = Vec::new();

    server
        .serve(input.as_bytes(), &mut output)
        .await
        .expect("session should complete");

    String::from_utf8(output)
        .expect("output is UTF-8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("each reply is JSON"))
        .collect()
}

#[tokio::test]
async fn mcp_server_initialization() {
    let (server, _) = test_server();

    assert_eq!(server.server_info.name, "fred-mcp-server");
    assert_eq!(server.connection_state().await, ConnectionState::Uninitialized);

    let statistics = server.server_statistics().await;
    assert_eq!(statistics.registered_tools.len(), 11);
    assert!(
        statistics
            .registered_tools
            .contains(&"get_series_data".to_string())
    );
}

#[tokio::test]
async fn full_session_over_stream() {
    let (server, _) = test_server();

    let replies = run_session(
        Arc::clone(&server),
        &[
            json!({
                "jsonrpc": "2.0", "id": 1, "method": "initialize",
                "params": {
                    "protocolVersion": "2025-06-18",
                    "capabilities": {},
                    "clientInfo": {"name": "test-client", "version": "1.0.0"}
                }
            }),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
            json!({
                "jsonrpc": "2.0", "id": 3, "method": "tools/call",
                "params": {"name": "search_series", "arguments": {"query": "gdp", "limit": 2}}
            }),
            json!({"jsonrpc": "2.0", "id": 4, "method": "ping"}),
        ],
    )
    .await;

    // The notification gets no reply
    assert_eq!(replies.len(), 4);

    assert_eq!(replies[0]["id"], 1);
    assert_eq!(replies[0]["result"]["protocolVersion"], "2025-06-18");
    assert_eq!(replies[0]["result"]["serverInfo"]["name"], "fred-mcp-server");
    assert!(replies[0]["result"]["capabilities"]["tools"].is_object());

    let tools = replies[1]["result"]["tools"].as_array().expect("tool list");
    assert_eq!(tools.len(), 11);
    assert_eq!(tools[0]["name"], "search_series");
    assert!(tools[0]["inputSchema"]["properties"]["query"].is_object());

    assert_eq!(replies[2]["id"], 3);
    assert_eq!(replies[2]["result"]["isError"], false);
    assert_eq!(
        replies[2]["result"]["structuredContent"]["results"]
            .as_array()
            .map(Vec::len),
        Some(2)
    );

    assert_eq!(replies[3]["result"], json!({}));
    assert_eq!(server.connection_state().await, ConnectionState::Closed);
}

#[tokio::test]
async fn older_protocol_version_is_echoed() {
    let (server, _) = test_server();
    let replies = run_session(
        server,
        &[json!({
            "jsonrpc": "2.0", "id": "init", "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "clientInfo": {"name": "legacy", "version": "0.1"}
            }
        })],
    )
    .await;

    assert_eq!(replies[0]["id"], "init");
    assert_eq!(replies[0]["result"]["protocolVersion"], "2024-11-05");
}

#[tokio::test]
async fn malformed_and_unknown_messages_get_jsonrpc_errors() {
    let (server, _) = test_server();

    let input = concat!(
        "{not json\n",
        "{\"jsonrpc\":\"2.0\",\"id\":5,\"method\":\"resources/list\"}\n",
        "{\"jsonrpc\":\"2.0\",\"id\":6,\"method\":\"tools/call\",\"params\":{\"name\":\"get_series_vintages\"}}\n",
        "{\"jsonrpc\":\"1.0\",\"id\":7,\"method\":\"ping\"}\n",
    );
    let mut output: Vec<u8> = Vec::new();
    server
        .serve(input.as_bytes(), &mut output)
        .await
        .expect("session should complete");

    let replies: Vec<Value> = String::from_utf8(output)
        .expect("output is UTF-8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("each reply is JSON"))
        .collect();

    assert_eq!(replies.len(), 4);
    assert_eq!(replies[0]["error"]["code"], -32700);
    assert!(replies[0]["id"].is_null());
    assert_eq!(replies[1]["id"], 5);
    assert_eq!(replies[1]["error"]["code"], -32601);
    assert_eq!(replies[2]["id"], 6);
    assert_eq!(replies[2]["error"]["code"], -32001);
    assert_eq!(replies[3]["error"]["code"], -32600);
}

#[tokio::test]
async fn search_preview_shows_window_of_total() {
    let (server, _) = test_server();
    let result = call_tool(
        &server,
        "search_series",
        json!({"query": "gdp", "limit": 2, "offset": 0}),
    )
    .await;

    assert_eq!(result["isError"], false);
    let text = result["content"][0]["text"].as_str().expect("text content");
    assert!(text.contains("Found 5 series (showing 2)"));
    assert!(text.contains("| id | realtime_start |"));

    let structured = &result["structuredContent"];
    assert_eq!(structured["results"].as_array().map(Vec::len), Some(2));
    assert_eq!(structured["results"][0]["id"], "GDP1");
    assert_eq!(structured["results"][0]["last_updated"], "2024-01-25");
}

#[tokio::test]
async fn search_export_writes_all_rows() {
    let (server, _) = test_server();
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("exports").join("gdp.json");

    let result = call_tool(
        &server,
        "search_series",
        json!({
            "query": "gdp",
            "limit": 2,
            "offset": 0,
            "file_path": path.to_string_lossy()
        }),
    )
    .await;

    assert_eq!(result["isError"], false);
    let text = result["content"][0]["text"].as_str().expect("text content");
    assert!(text.contains("Saved 5 records for `gdp`"));
    assert_eq!(result["structuredContent"]["records"], 5);

    let body = std::fs::read_to_string(&path).expect("export file exists");
    let rows: Vec<Value> = serde_json::from_str(&body).expect("export is a JSON array");
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[4]["id"], "GDP5");
    assert!(body.starts_with("[\n  {"), "export is indented by two spaces");
}

#[tokio::test]
async fn unknown_series_is_reported_as_not_found() {
    let (server, _) = test_server();
    let result = call_tool(&server, "get_series_info", json!({"series_id": "NOPE"})).await;

    assert_eq!(result["isError"], false);
    assert_eq!(result["structuredContent"]["status"], "not_found");
    assert_eq!(
        result["structuredContent"]["message"],
        "No info found for series NOPE"
    );
    assert!(result["structuredContent"].get("error").is_none());
}

#[tokio::test]
async fn unknown_release_matches_unknown_series_convention() {
    let (server, _) = test_server();
    let result = call_tool(&server, "get_release_series", json!({"release_id": 999_999})).await;

    assert_eq!(result["isError"], false);
    assert_eq!(result["structuredContent"]["status"], "not_found");
    assert_eq!(
        result["content"][0]["text"],
        "No series found for release 999999"
    );
}

#[tokio::test]
async fn empty_category_is_a_listing_not_a_lookup_failure() {
    let (server, _) = test_server();
    let result = call_tool(&server, "get_category_series", json!({"category_id": 125})).await;

    assert_eq!(result["isError"], false);
    assert_eq!(result["content"][0]["text"], "No series found.");
    assert_eq!(result["structuredContent"]["total"], 0);
}

#[tokio::test]
async fn upstream_failure_is_an_error_result() {
    let (server, _) = test_server();
    let result = call_tool(&server, "get_series_data", json!({"series_id": "NOPE"})).await;

    assert_eq!(result["isError"], true);
    let error = result["structuredContent"]["error"]
        .as_str()
        .expect("error field");
    assert!(error.starts_with("Error getting series data:"));
    assert!(error.contains("HTTP 500"));
    assert_eq!(result["content"][0]["text"], error);
}

#[tokio::test]
async fn schema_violations_become_validation_errors() {
    let (server, factory) = test_server();

    for arguments in [
        json!({"query": "gdp", "limit": -1}),
        json!({"query": "gdp", "page": 2}),
        json!({}),
    ] {
        let result = call_tool(&server, "search_series", arguments).await;
        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().expect("text content");
        assert!(text.starts_with("Error calling search_series: Validation error"));
    }

    assert_eq!(factory.connects.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn stub_tools_are_informational() {
    let (server, factory) = test_server();

    for (name, arguments) in [
        ("get_category_details", json!({"category_id": 125})),
        ("get_category_children", json!({"category_id": 125})),
        ("search_related_tags", json!({"tag_names": "gdp;usa"})),
    ] {
        let result = call_tool(&server, name, arguments).await;
        assert_eq!(result["isError"], false, "{name}");
        assert_eq!(result["structuredContent"]["status"], "unsupported", "{name}");
    }

    assert_eq!(factory.connects.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn handler_runs_without_server() {
    let factory: Arc<dyn ClientFactory> = Arc::new(StubFactory::default());
    let handler =
        fred_mcp::mcp::FredToolHandler::new(fred_mcp::mcp::FredTool::GetReleases, factory);

    let params = CallToolParams {
        name: "get_releases".to_string(),
        arguments: None,
    };
    let result = handler.handle(params).await.expect("Tool execution failed");

    assert_eq!(result.is_error, Some(false));
    let ToolContent::Text { text } = &result.content[0];
    assert_eq!(text, "No releases found.");
}

#[tokio::test]
async fn concurrent_tool_calls() {
    let (server, factory) = test_server();

    let mut handles = Vec::new();
    for i in 0..5 {
        let server = Arc::clone(&server);
        handles.push(tokio::spawn(async move {
            call_tool(&server, "search_series", json!({"query": "gdp", "offset": i})).await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let result = handle.await.expect("Task failed");
        assert_eq!(result["isError"], false);
        assert_eq!(result["structuredContent"]["showing"], 5 - i);
    }

    assert_eq!(factory.connects.load(Ordering::SeqCst), 5);
}
