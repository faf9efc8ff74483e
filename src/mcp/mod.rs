//! MCP (Model Context Protocol) Server Implementation
//!
//! This module provides a complete MCP server implementation following the
//! JSON-RPC 2.0 specification and MCP protocol version 2025-06-18.


pub mod errors;
pub mod protocol;
pub mod server;
pub mod tools;
pub mod validation;

pub use errors::{ErrorHandler, McpError};
pub use protocol::{
    CallToolParams, CallToolResult, Implementation, MCP_VERSION, Tool, ToolContent,
};
pub use server::{ConnectionState, McpServer, MessageHandler, ToolEntry, ToolHandler};
pub use tools::{FredTool, FredToolHandler, ToolCatalog};
pub use validation::McpValidator;
