//! Integration tests for MCP protocol handling.
//!
//! These tests verify the MCP server's JSON-RPC 2.0 protocol implementation,
//! including request/response handling, error responses, and lifecycle management.

use molecule_layout::mcp::protocol::{parse_message, ErrorCode, IncomingMessage, RequestId};
use molecule_layout::mcp::server::{McpServer, ServerState, ToolDefaults};
use molecule_layout::molecule::{Alignment, ContactPosition, LayoutResult, MarginKind, SizeClass};
use serde_json::{json, Value};

const INITIALIZE: &str = r#"{
    "jsonrpc": "2.0",
    "id": 1,
    "method": "initialize",
    "params": {
        "protocolVersion": "2024-11-05",
        "capabilities": {},
        "clientInfo": { "name": "test-client", "version": "1.0.0" }
    }
}"#;

const INITIALIZED: &str = r#"{"jsonrpc": "2.0", "method": "notifications/initialized"}"#;

fn running_server() -> McpServer {
    let mut server = McpServer::new(ToolDefaults::default());
    assert!(matches!(server.handle_line(INITIALIZE), Some(Ok(_))));
    assert!(server.handle_line(INITIALIZED).is_none());
    assert_eq!(server.state(), ServerState::Running);
    server
}

fn request(id: i64, method: &str, params: &Value) -> String {
    json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }).to_string()
}

/// Sends a `tools/call` and returns the result object.
fn call(server: &mut McpServer, name: &str, arguments: Value) -> Value {
    let line = request(10, "tools/call", &json!({ "name": name, "arguments": arguments }));
    match server.handle_line(&line) {
        Some(Ok(response)) => response.result,
        other => panic!("Expected response, got {other:?}"),
    }
}

fn text(result: &Value) -> &str {
    result["content"][0]["text"].as_str().unwrap()
}

// =============================================================================
// Protocol Parsing Tests
// =============================================================================

#[test]
fn test_parse_initialize_request() {
    let result = parse_message(INITIALIZE);
    assert!(result.is_ok());

    if let IncomingMessage::Request(req) = result.unwrap() {
        assert_eq!(req.method, "initialize");
        assert_eq!(req.id, RequestId::Number(1));
    } else {
        panic!("Expected Request");
    }
}

#[test]
fn test_parse_notification() {
    let result = parse_message(INITIALIZED);
    assert!(result.is_ok());

    if let IncomingMessage::Notification(notif) = result.unwrap() {
        assert_eq!(notif.method, "notifications/initialized");
    } else {
        panic!("Expected Notification");
    }
}

#[test]
fn test_parse_string_id() {
    let json = r#"{"jsonrpc": "2.0", "id": "abc", "method": "ping"}"#;
    let message = parse_message(json).unwrap();
    assert_eq!(message.id(), Some(&RequestId::String("abc".to_string())));
    assert_eq!(message.method(), "ping");
}

#[test]
fn test_parse_invalid_json() {
    let err = parse_message("not valid json").unwrap_err();
    assert_eq!(err.error.code, ErrorCode::ParseError.code());
}

#[test]
fn test_parse_missing_jsonrpc_version() {
    let json = r#"{
        "id": 1,
        "method": "test"
    }"#;

    let err = parse_message(json).unwrap_err();
    assert_eq!(err.error.code, ErrorCode::InvalidRequest.code());
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_initialize_handshake() {
    let mut server = McpServer::new(ToolDefaults::default());
    assert_eq!(server.state(), ServerState::AwaitingInit);

    let Some(Ok(response)) = server.handle_line(INITIALIZE) else {
        panic!("initialize failed");
    };
    assert_eq!(response.id, RequestId::Number(1));
    assert_eq!(response.result["protocolVersion"], "2024-11-05");
    assert_eq!(response.result["serverInfo"]["name"], "molecule-layout");
    assert!(response.result["capabilities"]["tools"].is_object());
    assert_eq!(server.state(), ServerState::Initialising);
    assert_eq!(server.protocol_version(), Some("2024-11-05"));

    assert!(server.handle_line(INITIALIZED).is_none());
    assert_eq!(server.state(), ServerState::Running);
}

#[test]
fn test_tools_rejected_before_initialised() {
    let mut server = McpServer::new(ToolDefaults::default());

    let line = request(2, "tools/list", &json!({}));
    let Some(Err(error)) = server.handle_line(&line) else {
        panic!("Expected error before initialize");
    };
    assert_eq!(error.id, Some(RequestId::Number(2)));
    assert_eq!(error.error.code, ErrorCode::InvalidRequest.code());

    // Still refused between initialize and the initialized notification.
    server.handle_line(INITIALIZE);
    assert!(matches!(server.handle_line(&line), Some(Err(_))));
}

#[test]
fn test_double_initialize_rejected() {
    let mut server = running_server();
    let Some(Err(error)) = server.handle_line(INITIALIZE) else {
        panic!("Expected error on second initialize");
    };
    assert!(error.error.message.contains("already initialised"));
    assert_eq!(server.state(), ServerState::Running);
}

#[test]
fn test_ping_and_unknown_method() {
    let mut server = McpServer::new(ToolDefaults::default());

    let ping = request(3, "ping", &json!({}));
    assert!(matches!(server.handle_line(&ping), Some(Ok(_))));

    let unknown = request(4, "resources/list", &json!({}));
    let Some(Err(error)) = server.handle_line(&unknown) else {
        panic!("Expected method not found");
    };
    assert_eq!(error.error.code, ErrorCode::MethodNotFound.code());
}

#[test]
fn test_blank_and_malformed_lines() {
    let mut server = running_server();
    assert!(server.handle_line("   ").is_none());

    let Some(Err(error)) = server.handle_line("{ nope") else {
        panic!("Expected parse error");
    };
    assert_eq!(error.error.code, ErrorCode::ParseError.code());
    assert!(error.id.is_none());
}

// =============================================================================
// Tool Tests
// =============================================================================

#[test]
fn test_tools_list() {
    let mut server = running_server();
    let Some(Ok(response)) = server.handle_line(&request(5, "tools/list", &json!({}))) else {
        panic!("tools/list failed");
    };

    let names: Vec<&str> = response.result["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|tool| tool["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        ["calculate_layout", "fill_margins", "place_contacts", "list_pin_types"]
    );
    assert!(response.result["tools"][0]["inputSchema"]["properties"]["spec"].is_object());
}

#[test]
fn test_tool_call_without_params() {
    let mut server = running_server();
    let line = json!({ "jsonrpc": "2.0", "id": 6, "method": "tools/call" }).to_string();

    let Some(Err(error)) = server.handle_line(&line) else {
        panic!("Expected invalid params");
    };
    assert_eq!(error.error.code, ErrorCode::InvalidParams.code());
}

#[test]
fn test_calculate_layout_tool() {
    let mut server = running_server();
    let result = call(
        &mut server,
        "calculate_layout",
        json!({ "spec": { "type": "FourPin", "size": "8x8", "wing": 2 } }),
    );

    assert!(result.get("isError").is_none());
    let layout: LayoutResult = serde_json::from_str(text(&result)).unwrap();
    assert!((layout.board_width - 14.0).abs() < 1e-9);
    assert_eq!(layout.margins.len(), 21);
}

#[test]
fn test_layout_error_is_tool_error() {
    let mut server = running_server();
    let result = call(
        &mut server,
        "calculate_layout",
        json!({ "spec": { "type": "FourPin", "pinType": "Tiny" } }),
    );

    assert_eq!(result["isError"], true);
    assert!(text(&result).contains("Invalid pin type 'Tiny'"));
}

#[test]
fn test_place_contacts_tool() {
    let mut server = running_server();
    let result = call(
        &mut server,
        "place_contacts",
        json!({
            "spec": { "type": "FourPin", "size": "10x10" },
            "contacts": [
                { "name": "J1", "margin": "Left", "size_class": "medium" },
                { "name": "J2", "margin": "Left", "size_class": "medium" },
                { "name": "J3", "margin": "Left", "size_class": "medium" }
            ]
        }),
    );

    let packed: Value = serde_json::from_str(text(&result)).unwrap();
    let contacts: Vec<ContactPosition> =
        serde_json::from_value(packed["contacts"].clone()).unwrap();
    let ys: Vec<f64> = contacts.iter().map(|c| c.y).collect();
    assert_eq!(ys, [-2.0, 0.0, 2.0]);
}

#[test]
fn test_place_contacts_over_capacity() {
    let mut server = running_server();
    let contacts: Vec<Value> = (1..=5)
        .map(|n| json!({ "name": format!("J{n}"), "margin": "Left", "size_class": "medium" }))
        .collect();
    let result = call(
        &mut server,
        "place_contacts",
        json!({ "spec": { "type": "FourPin", "size": "10x10" }, "contacts": contacts }),
    );

    assert_eq!(result["isError"], true);
    assert!(text(&result).contains("Requested: 5, Capacity: 4"));
}

#[test]
fn test_fill_margins_uses_server_defaults() {
    let defaults = ToolDefaults {
        alignment: Alignment::Left,
        size_class: SizeClass::Medium,
    };
    let mut server = McpServer::new(defaults);
    server.handle_line(INITIALIZE);
    server.handle_line(INITIALIZED);

    let result = call(
        &mut server,
        "fill_margins",
        json!({ "spec": { "type": "FourPin", "size": "10x10" }, "margins": ["top"] }),
    );

    let packed: Value = serde_json::from_str(text(&result)).unwrap();
    let contacts: Vec<ContactPosition> =
        serde_json::from_value(packed["contacts"].clone()).unwrap();
    assert_eq!(contacts.len(), 4);
    assert!(contacts.iter().all(|c| c.margin == MarginKind::Top));
    assert_eq!(contacts[0].name, "MC1");
    assert!((contacts[0].x + 3.0).abs() < 1e-9);
}

#[test]
fn test_unknown_tool() {
    let mut server = running_server();
    let result = call(&mut server, "route_traces", json!({}));
    assert_eq!(result["isError"], true);
    assert_eq!(text(&result), "Unknown tool: route_traces");
}
