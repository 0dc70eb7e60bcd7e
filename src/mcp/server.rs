//! MCP server exposing the molecule layout engine.
//!
//! This module implements the MCP server lifecycle:
//!
//! 1. **Initialisation**: Capability negotiation and version agreement
//! 2. **Operation**: Handling tool calls and other requests
//! 3. **Shutdown**: Graceful connection termination
//!
//! Tools are thin wrappers: they deserialise their arguments, call the
//! engine synchronously and return the result as pretty JSON text. Engine
//! errors become tool results with `isError` set; protocol problems become
//! JSON-RPC errors.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::PackingConfig;
use crate::mcp::protocol::{
    parse_message, ErrorCode, IncomingMessage, JsonRpcError, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, RequestId, MCP_PROTOCOL_VERSION, SERVER_NAME,
};
use crate::mcp::transport::StdioTransport;
use crate::molecule::{
    default_fill_kinds, fill_margins, place_contacts, Alignment, ContactPosition, ContactRequest,
    LayoutCalculator, LayoutResult, MarginKind, MoleculeSpec, PinType, SizeClass,
};

/// Server state in the MCP lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Waiting for initialize request.
    AwaitingInit,
    /// Initialize received, waiting for initialized notification.
    Initialising,
    /// Ready for normal operation.
    Running,
    /// Shutdown in progress.
    ShuttingDown,
}

/// Server information for initialisation response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Client information received during initialisation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    #[serde(default)]
    pub version: Option<String>,
}

/// Parameters for the initialize request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version requested by client.
    pub protocol_version: String,
    /// Client capabilities.
    #[serde(default)]
    pub capabilities: Value,
    /// Client information.
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

/// A tool definition for tools/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

/// Parameters for tools/call request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call.
    pub name: String,
    /// Arguments for the tool.
    #[serde(default)]
    pub arguments: Value,
}

/// Content item in a tool call response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Result of a tool call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the tool call resulted in an error.
    #[serde(skip_serializing_if = "is_false")]
    pub is_error: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires fn(&T) -> bool
const fn is_false(b: &bool) -> bool {
    !*b
}

impl ToolCallResult {
    /// Creates a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Creates an error text result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    /// Creates a successful result holding `value` as pretty JSON.
    #[must_use]
    pub fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(text) => Self::text(text),
            Err(e) => Self::error(format!("Failed to serialise result: {e}")),
        }
    }
}

/// Packing defaults applied when a tool call omits them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolDefaults {
    /// Alignment for `fill_margins` and `place_contacts`.
    pub alignment: Alignment,
    /// Size class for `fill_margins`.
    pub size_class: SizeClass,
}

impl From<&PackingConfig> for ToolDefaults {
    fn from(config: &PackingConfig) -> Self {
        Self {
            alignment: config.alignment(),
            size_class: config.size_class(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LayoutArgs {
    spec: MoleculeSpec,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FillArgs {
    spec: MoleculeSpec,
    #[serde(default)]
    margins: Option<Vec<String>>,
    #[serde(default)]
    size_class: Option<SizeClass>,
    #[serde(default)]
    alignment: Option<Alignment>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlaceArgs {
    spec: MoleculeSpec,
    contacts: Vec<ContactRequest>,
    #[serde(default)]
    alignment: Option<Alignment>,
    #[serde(default)]
    margin_alignment: Option<HashMap<String, Alignment>>,
}

#[derive(Debug, Serialize)]
struct PackedLayout<'a> {
    layout: &'a LayoutResult,
    contacts: &'a [ContactPosition],
}

/// The MCP server for molecule layout.
pub struct McpServer {
    state: ServerState,
    transport: StdioTransport,
    protocol_version: Option<String>,
    defaults: ToolDefaults,
    calculator: LayoutCalculator,
}

impl McpServer {
    /// Creates a new MCP server using `defaults` for omitted tool arguments.
    #[must_use]
    pub fn new(defaults: ToolDefaults) -> Self {
        Self {
            state: ServerState::AwaitingInit,
            transport: StdioTransport::stdio(),
            protocol_version: None,
            defaults,
            calculator: LayoutCalculator::new(),
        }
    }

    /// Returns the current server state.
    #[must_use]
    pub const fn state(&self) -> ServerState {
        self.state
    }

    /// Returns the negotiated protocol version, once initialised.
    #[must_use]
    pub fn protocol_version(&self) -> Option<&str> {
        self.protocol_version.as_deref()
    }

    /// Runs the MCP server main loop with graceful shutdown handling.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn run(&mut self) -> std::io::Result<()> {
        self.run_with_shutdown().await
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(unix)]
    async fn run_with_shutdown(&mut self) -> std::io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).map_err(std::io::Error::other)?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(std::io::Error::other)?;

        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                _ = sigterm.recv() => {
                    info!("Received SIGTERM, initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                line_result = self.transport.read_line() => {
                    if self.handle_transport_result(line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(windows)]
    async fn run_with_shutdown(&mut self) -> std::io::Result<()> {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    info!("Received Ctrl+C, initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                line_result = self.transport.read_line() => {
                    if self.handle_transport_result(line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handles the result from transport read.
    ///
    /// Returns `true` if the server should shut down.
    async fn handle_transport_result(
        &mut self,
        line_result: std::io::Result<Option<String>>,
    ) -> std::io::Result<bool> {
        let Some(line) = line_result? else {
            info!("stdin closed");
            self.state = ServerState::ShuttingDown;
            return Ok(true);
        };

        match self.handle_line(&line) {
            Some(Ok(response)) => self.transport.write_response(&response).await?,
            Some(Err(error)) => self.transport.write_error(&error).await?,
            None => {}
        }

        Ok(self.state == ServerState::ShuttingDown)
    }

    /// Processes one line of input and returns the reply to send, if any.
    ///
    /// Blank lines and notifications produce no reply.
    pub fn handle_line(&mut self, line: &str) -> Option<Result<JsonRpcResponse, JsonRpcError>> {
        if line.trim().is_empty() {
            return None;
        }

        match parse_message(line) {
            Ok(IncomingMessage::Request(req)) => Some(self.handle_request(&req)),
            Ok(IncomingMessage::Notification(notif)) => {
                self.handle_notification(&notif);
                None
            }
            Err(error) => {
                warn!(code = error.error.code, "Rejected malformed message");
                Some(Err(error))
            }
        }
    }

    /// Handles an incoming request.
    fn handle_request(&mut self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        debug!(id = %req.id, method = %req.method, "Handling request");

        match req.method.as_str() {
            "initialize" => self.handle_initialize(req),
            "tools/list" => self.handle_tools_list(req),
            "tools/call" => self.handle_tools_call(req),
            "ping" => Ok(JsonRpcResponse::success(req.id.clone(), json!({}))),
            _ => Err(JsonRpcError::method_not_found(req.id.clone(), &req.method)),
        }
    }

    /// Handles an incoming notification.
    fn handle_notification(&mut self, notif: &JsonRpcNotification) {
        match notif.method.as_str() {
            "notifications/initialized" if self.state == ServerState::Initialising => {
                info!("Client initialised, server running");
                self.state = ServerState::Running;
            }
            "notifications/cancelled" => {}
            other => debug!(method = other, "Ignoring notification"),
        }
    }

    /// Handles the initialize request.
    fn handle_initialize(&mut self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        if self.state != ServerState::AwaitingInit {
            return Err(JsonRpcError::new(
                Some(req.id.clone()),
                ErrorCode::InvalidRequest,
                "Server already initialised",
            ));
        }

        let params: InitializeParams = req.parse_params("initialize")?;
        if let Some(client) = &params.client_info {
            info!(
                client = %client.name,
                version = client.version.as_deref().unwrap_or("unknown"),
                requested = %params.protocol_version,
                "Client connected"
            );
        }

        self.protocol_version = Some(MCP_PROTOCOL_VERSION.to_string());
        self.state = ServerState::Initialising;

        Ok(JsonRpcResponse::success(
            req.id.clone(),
            json!({
                "protocolVersion": MCP_PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": ServerInfo::default(),
            }),
        ))
    }

    /// Handles the tools/list request.
    fn handle_tools_list(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;

        Ok(JsonRpcResponse::success(
            req.id.clone(),
            json!({ "tools": Self::tool_definitions() }),
        ))
    }

    /// Handles the tools/call request.
    fn handle_tools_call(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;

        let params: ToolCallParams = req.parse_params("tool call")?;
        let result = self.call_tool(&params.name, params.arguments);

        if result.is_error {
            debug!(tool = %params.name, "Tool call returned an error result");
        }

        let value = serde_json::to_value(&result).map_err(|e| {
            tracing::error!(error = %e, "Failed to serialise tool call result");
            JsonRpcError::internal_error(req.id.clone(), "Internal error: failed to serialise result")
        })?;

        Ok(JsonRpcResponse::success(req.id.clone(), value))
    }

    /// Dispatches a tool call by name.
    #[must_use]
    pub fn call_tool(&self, name: &str, arguments: Value) -> ToolCallResult {
        match name {
            "calculate_layout" => self.call_calculate_layout(arguments),
            "fill_margins" => self.call_fill_margins(arguments),
            "place_contacts" => self.call_place_contacts(arguments),
            "list_pin_types" => Self::call_list_pin_types(),
            _ => ToolCallResult::error(format!("Unknown tool: {name}")),
        }
    }

    /// Ensures the server is in the Running state.
    fn require_running(&self, id: &RequestId) -> Result<(), JsonRpcError> {
        if self.state != ServerState::Running {
            return Err(JsonRpcError::new(
                Some(id.clone()),
                ErrorCode::InvalidRequest,
                "Server not initialised",
            ));
        }
        Ok(())
    }

    /// Returns the list of available tools.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn tool_definitions() -> Vec<ToolDefinition> {
        let spec_schema = json!({
            "type": "object",
            "description": "Molecule spec, e.g. {\"type\": \"FourPin\", \"size\": \"8x8\", \"wing\": 2}",
            "properties": {
                "type": { "type": "string", "enum": ["TwoPin", "FourPin"] },
                "size": {
                    "type": "string",
                    "description": "'<w>x<h>' in mm, optionally followed by 'absolute' or 'relative'. Default '8x8'"
                },
                "pinType": {
                    "type": "string",
                    "description": "Pin type key, see list_pin_types. Default 'MediumStandard'"
                },
                "wing": { "type": ["number", "string"], "description": "Wing for every side: mm, 'nominal', or '<mm> absolute|padding'" },
                "wingTop": { "type": ["number", "string"] },
                "wingBottom": { "type": ["number", "string"] },
                "wingLeft": { "type": ["number", "string"] },
                "wingRight": { "type": ["number", "string"] },
                "roundEdges": { "type": ["boolean", "number", "string"], "description": "false, true/'auto', or a radius in mm" }
            },
            "required": ["type"]
        });
        let alignment_schema = json!({
            "type": "string",
            "enum": ["left", "center", "right", "space-between", "cw", "ccw"]
        });

        vec![
            ToolDefinition {
                name: "calculate_layout",
                description: "Calculate board dimensions, pin positions and usable margins for a \
                              molecule spec. All values are in millimetres, relative to the centre \
                              of the pin grid with y pointing up.",
                input_schema: json!({
                    "type": "object",
                    "properties": { "spec": spec_schema },
                    "required": ["spec"]
                }),
            },
            ToolDefinition {
                name: "fill_margins",
                description: "Calculate a layout, then fill margins to capacity with auto-named \
                              contacts (MC1, MC2, ...), visiting margins clockwise. Defaults to the \
                              four side margins for FourPin and the centre margin for TwoPin.",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "spec": spec_schema,
                        "margins": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "Margin kinds to fill, e.g. ['Left', 'TopWing']"
                        },
                        "size_class": { "type": "string", "enum": ["medium", "large"] },
                        "alignment": alignment_schema
                    },
                    "required": ["spec"]
                }),
            },
            ToolDefinition {
                name: "place_contacts",
                description: "Calculate a layout, then place named contacts into their requested \
                              margins. Fails if a margin receives mixed size classes or more \
                              contacts than it holds. Requests for margins not in the layout are \
                              skipped.",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "spec": spec_schema,
                        "contacts": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "name": { "type": "string" },
                                    "margin": { "type": "string" },
                                    "size_class": { "type": "string", "enum": ["medium", "large"] },
                                    "perpendicular_shift": {
                                        "type": ["number", "string"],
                                        "description": "'outer', 'center', 'inner', or mm (positive = away from the board centre)"
                                    }
                                },
                                "required": ["name", "margin", "size_class"]
                            }
                        },
                        "alignment": alignment_schema,
                        "margin_alignment": {
                            "type": "object",
                            "additionalProperties": alignment_schema,
                            "description": "Per-margin alignment overrides keyed by margin kind"
                        }
                    },
                    "required": ["spec", "contacts"]
                }),
            },
            ToolDefinition {
                name: "list_pin_types",
                description: "List the supported pin types with their offset, contact size class \
                              and length.",
                input_schema: json!({ "type": "object", "properties": {} }),
            },
        ]
    }

    fn parse_args<T: serde::de::DeserializeOwned>(arguments: Value) -> Result<T, ToolCallResult> {
        serde_json::from_value(arguments)
            .map_err(|e| ToolCallResult::error(format!("Invalid arguments: {e}")))
    }

    fn call_calculate_layout(&self, arguments: Value) -> ToolCallResult {
        let args: LayoutArgs = match Self::parse_args(arguments) {
            Ok(args) => args,
            Err(result) => return result,
        };

        match self.calculator.calculate(&args.spec) {
            Ok(layout) => ToolCallResult::json(&layout),
            Err(e) => ToolCallResult::error(e.to_string()),
        }
    }

    fn call_fill_margins(&self, arguments: Value) -> ToolCallResult {
        let args: FillArgs = match Self::parse_args(arguments) {
            Ok(args) => args,
            Err(result) => return result,
        };

        let molecule = match args.spec.resolve() {
            Ok(molecule) => molecule,
            Err(e) => return ToolCallResult::error(e.to_string()),
        };
        let layout = self.calculator.layout(&molecule);

        let kinds = match args.margins {
            None => default_fill_kinds(molecule.molecule_type),
            Some(names) => match names
                .iter()
                .map(|name| name.parse::<MarginKind>())
                .collect::<Result<Vec<_>, _>>()
            {
                Ok(kinds) => kinds,
                Err(e) => return ToolCallResult::error(e),
            },
        };

        let contacts = fill_margins(
            &layout.margins,
            &kinds,
            args.size_class.unwrap_or(self.defaults.size_class),
            Some(args.alignment.unwrap_or(self.defaults.alignment)),
        );

        ToolCallResult::json(&PackedLayout {
            layout: &layout,
            contacts: &contacts,
        })
    }

    fn call_place_contacts(&self, arguments: Value) -> ToolCallResult {
        let args: PlaceArgs = match Self::parse_args(arguments) {
            Ok(args) => args,
            Err(result) => return result,
        };

        let overrides = match args.margin_alignment {
            None => None,
            Some(raw) => match raw
                .into_iter()
                .map(|(name, alignment)| name.parse::<MarginKind>().map(|kind| (kind, alignment)))
                .collect::<Result<HashMap<_, _>, _>>()
            {
                Ok(map) => Some(map),
                Err(e) => return ToolCallResult::error(e),
            },
        };

        let layout = match self.calculator.calculate(&args.spec) {
            Ok(layout) => layout,
            Err(e) => return ToolCallResult::error(e.to_string()),
        };

        match place_contacts(
            &layout.margins,
            &args.contacts,
            args.alignment.unwrap_or(self.defaults.alignment),
            overrides.as_ref(),
        ) {
            Ok(contacts) => ToolCallResult::json(&PackedLayout {
                layout: &layout,
                contacts: &contacts,
            }),
            Err(e) => ToolCallResult::error(e.to_string()),
        }
    }

    fn call_list_pin_types() -> ToolCallResult {
        let rows: Vec<Value> = PinType::ALL
            .iter()
            .map(|pin_type| {
                let spec = pin_type.spec();
                json!({
                    "name": pin_type.as_str(),
                    "offset_mm": spec.offset_mm,
                    "size_class": spec.size_class,
                    "length": spec.length,
                })
            })
            .collect();

        ToolCallResult::json(&json!({ "pin_types": rows }))
    }
}
