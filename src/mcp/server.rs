//! MCP Server Implementation
//!
//! This module provides the core MCP server framework with connection handling,
//! message routing, and protocol compliance.

use crate::FredError;
use crate::mcp::errors::{ErrorHandler, McpError};
use crate::mcp::protocol::*;
use crate::mcp::validation::McpValidator;
use crate::response::ToolResponse;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// MCP Server state and configuration
pub struct McpServer {
    /// Server implementation information
    pub server_info: Implementation,
    /// Server capabilities
    pub capabilities: ServerCapabilities,
    /// Text returned to the client on `initialize`
    instructions: Option<String>,
    /// Tool definitions, in catalog order
    tools: Arc<[Tool]>,
    /// Tool handlers by tool name
    tool_handlers: Arc<HashMap<String, Box<dyn ToolHandler>>>,
    /// Connection state
    connection_state: Arc<RwLock<ConnectionState>>,
    /// Message and tool argument validator
    validator: Arc<McpValidator>,
}

/// Connection state tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Uninitialized,
    Initializing,
    Ready,
    Closed,
}

/// Tool handler trait for implementing tool execution
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult>;
}

/// A tool definition paired with the handler that executes it
pub struct ToolEntry {
    pub tool: Tool,
    pub handler: Box<dyn ToolHandler>,
}

/// Message handler for processing incoming messages
pub struct MessageHandler {
    server: Arc<McpServer>,
}

impl McpServer {
    /// Create a new MCP server serving a fixed set of tools.
    ///
    /// Every tool's input schema is compiled up front; a schema that does not
    /// compile or a duplicate tool name fails construction.
    #[inline]
    pub fn new(
        server_info: Implementation,
        instructions: Option<String>,
        entries: Vec<ToolEntry>,
    ) -> Result<Self> {
        let capabilities = ServerCapabilities {
            tools: Some(ToolsCapability {
                list_changed: Some(false),
            }),
        };

        let mut validator = McpValidator::new()?;
        let mut tools = Vec::with_capacity(entries.len());
        let mut tool_handlers: HashMap<String, Box<dyn ToolHandler>> = HashMap::new();

        for ToolEntry { tool, handler } in entries {
            if tool_handlers.contains_key(&tool.name) {
                return Err(anyhow!("Tool registered twice: {}", tool.name));
            }
            validator.add_tool_schema(&tool)?;
            debug!("Registered tool: {}", tool.name);
            tool_handlers.insert(tool.name.clone(), handler);
            tools.push(tool);
        }

        Ok(Self {
            server_info,
            capabilities,
            instructions,
            tools: tools.into(),
            tool_handlers: Arc::new(tool_handlers),
            connection_state: Arc::new(RwLock::new(ConnectionState::Uninitialized)),
            validator: Arc::new(validator),
        })
    }

    /// Start the server using stdio transport
    #[inline]
    pub async fn serve_stdio(self: Arc<Self>) -> Result<()> {
        info!("Starting MCP server with stdio transport");
        self.serve(io::stdin(), io::stdout()).await
    }

    /// Serve newline-delimited JSON-RPC from `reader`, answering on `writer`,
    /// until the reader reaches EOF
    #[inline]
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut reader = BufReader::new(reader);

        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("EOF reached, closing connection");
                    break;
                }
                Ok(_) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    let raw_value: Value = match serde_json::from_str(line) {
                        Ok(value) => value,
                        Err(e) => {
                            let error = McpError::ParseError {
                                message: e.to_string(),
                            };
                            error.log();
                            self.send_message(&mut writer, &error.to_error_response(None))
                                .await?;
                            continue;
                        }
                    };

                    match self.validator.validate_raw_message(&raw_value) {
                        Ok(message) => {
                            let handler = MessageHandler::new(Arc::clone(&self));
                            if let Err(e) = handler.process_message(message, &mut writer).await {
                                error!("Error processing message: {}", e);
                            }
                        }
                        Err(e) => {
                            let error = McpError::InvalidRequest {
                                message: e.to_string(),
                            };
                            error.log();
                            self.send_message(&mut writer, &error.to_error_response(None))
                                .await?;
                        }
                    }
                }
                Err(e) => {
                    error!("Error reading from input: {}", e);
                    break;
                }
            }
        }

        {
            let mut state = self.connection_state.write().await;
            *state = ConnectionState::Closed;
        }

        info!("MCP server stopped");
        Ok(())
    }

    /// Send a message to the client
    async fn send_message<W>(&self, writer: &mut W, message: &JsonRpcMessage) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let json = serde_json::to_string(message)?;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }

    /// Get current connection state
    #[inline]
    pub async fn connection_state(&self) -> ConnectionState {
        *self.connection_state.read().await
    }

    /// Tool definitions in catalog order
    #[inline]
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    #[inline]
    pub async fn server_statistics(&self) -> ServerStatistics {
        ServerStatistics {
            server_info: self.server_info.clone(),
            connection_state: self.connection_state().await,
            registered_tools: self.tools.iter().map(|t| t.name.clone()).collect(),
        }
    }
}

impl MessageHandler {
    /// Create a new message handler
    #[inline]
    pub fn new(server: Arc<McpServer>) -> Self {
        Self { server }
    }

    /// Process an incoming message
    #[inline]
    pub async fn process_message<W>(&self, message: JsonRpcMessage, writer: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        match message {
            JsonRpcMessage::Request(request) => self.handle_request(request, writer).await,
            JsonRpcMessage::Notification(notification) => {
                self.handle_notification(notification).await;
                Ok(())
            }
            JsonRpcMessage::Response(_) | JsonRpcMessage::ErrorResponse(_) => {
                warn!("Received unexpected response message from client");
                Ok(())
            }
        }
    }

    /// Handle a JSON-RPC request
    async fn handle_request<W>(&self, request: JsonRpcRequest, writer: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params).await,
            "tools/list" => self.handle_list_tools(),
            "tools/call" => self.handle_call_tool(request.params).await,
            "ping" => Ok(serde_json::json!({})),
            method => Err(McpError::MethodNotFound {
                method: method.to_string(),
            }
            .into()),
        };

        let message = match response {
            Ok(result) => JsonRpcMessage::Response(JsonRpcResponse::new(result, request.id)),
            Err(e) => {
                debug!("Request {} failed: {}", request.method, e);
                ErrorHandler::handle_error(&e, Some(request.id))
            }
        };

        self.server.send_message(writer, &message).await
    }

    /// Handle a JSON-RPC notification
    async fn handle_notification(&self, notification: JsonRpcNotification) {
        match notification.method.as_str() {
            "initialized" | "notifications/initialized" => self.handle_initialized().await,
            "notifications/cancelled" => {
                debug!("Received cancellation notification");
            }
            _ => {
                warn!("Unknown notification method: {}", notification.method);
            }
        }
    }

    /// Handle initialize request
    #[inline]
    pub async fn handle_initialize(&self, params: Option<Value>) -> Result<Value> {
        let params: InitializeParams = match params {
            Some(p) => serde_json::from_value(p)?,
            None => {
                return Err(McpError::InvalidParameters {
                    message: "Initialize request missing parameters".to_string(),
                }
                .into());
            }
        };

        let protocol_version = self
            .server
            .validator
            .negotiate_protocol_version(&params.protocol_version);
        if protocol_version != params.protocol_version {
            warn!(
                "Client requested protocol {}, answering with {}",
                params.protocol_version, protocol_version
            );
        }

        {
            let mut state = self.server.connection_state.write().await;
            *state = ConnectionState::Initializing;
        }

        let result = InitializeResult {
            protocol_version: protocol_version.to_string(),
            capabilities: self.server.capabilities.clone(),
            server_info: self.server.server_info.clone(),
            instructions: self.server.instructions.clone(),
        };

        info!(
            "Client initialized: {} {}",
            params.client_info.name, params.client_info.version
        );
        Ok(serde_json::to_value(result)?)
    }

    /// Handle initialized notification
    async fn handle_initialized(&self) {
        {
            let mut state = self.server.connection_state.write().await;
            *state = ConnectionState::Ready;
        }

        info!("Server ready to handle requests");
    }

    /// Handle list tools request
    #[inline]
    pub fn handle_list_tools(&self) -> Result<Value> {
        let result = ListToolsResult {
            tools: self.server.tools.to_vec(),
        };
        Ok(serde_json::to_value(result)?)
    }

    /// Handle call tool request.
    ///
    /// Arguments that fail the tool's schema are answered with an error
    /// envelope, the same shape a failing tool produces.
    #[inline]
    pub async fn handle_call_tool(&self, params: Option<Value>) -> Result<Value> {
        let params: CallToolParams = match params {
            Some(p) => serde_json::from_value(p)?,
            None => {
                return Err(McpError::InvalidParameters {
                    message: "Tool call request missing parameters".to_string(),
                }
                .into());
            }
        };

        let handler = self
            .server
            .tool_handlers
            .get(&params.name)
            .ok_or_else(|| McpError::ToolNotFound {
                name: params.name.clone(),
            })?;

        if let Err(e) = self
            .server
            .validator
            .validate_tool_arguments(&params.name, params.arguments.as_ref())
        {
            warn!("Rejected arguments for {}: {}", params.name, e);
            let response = ToolResponse::failure(
                &format!("calling {}", params.name),
                &FredError::Validation(e.to_string()),
            );
            return Ok(serde_json::to_value(CallToolResult::from(response))?);
        }

        let result = handler.handle(params).await?;
        Ok(serde_json::to_value(result)?)
    }
}
