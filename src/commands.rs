use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::fred::{ClientFactory, HttpClientFactory, authenticate};
use crate::mcp::{FredTool, Implementation, McpServer, ToolCatalog};

/// Build the MCP server for `config`, with every tool drawing clients from `factory`
#[inline]
pub fn build_server(config: &Config, factory: Arc<dyn ClientFactory>) -> Result<McpServer> {
    let server_info = Implementation {
        name: config.server.name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    McpServer::new(
        server_info,
        config.server.instructions.clone(),
        ToolCatalog::new(factory).into_entries(),
    )
    .context("Failed to create MCP server")
}

/// Start the MCP server on stdio.
///
/// Stdout carries the protocol, so everything meant for a human goes to stderr.
#[inline]
pub async fn serve_mcp() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        "Starting {} against {}",
        config.server.name, config.fred.base_url
    );

    // Tools re-check on every call; this only warns early
    if let Err(e) = authenticate(&config.fred.api_key_env) {
        warn!("{}", e);
        eprintln!(
            "⚠️  {} is not set. Tools will report a configuration error until it is.",
            config.fred.api_key_env
        );
    }

    let factory: Arc<dyn ClientFactory> = Arc::new(HttpClientFactory::new(config.fred.clone()));
    let server = Arc::new(build_server(&config, factory)?);

    let tool_names: Vec<&str> = server.tools().iter().map(|t| t.name.as_str()).collect();
    eprintln!("✅ MCP server initialized with tools: {}", tool_names.join(", "));
    eprintln!("🌐 Starting MCP server on stdio transport...");

    tokio::select! {
        result = Arc::clone(&server).serve_stdio() => {
            result.context("MCP server failed")?;
            info!("MCP server stopped normally");
        }
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\n📴 Received interrupt signal, shutting down...");
        }
    }

    Ok(())
}

/// Print the tool catalog
#[inline]
pub fn list_tools() -> Result<()> {
    println!("FRED MCP tools ({} total):", FredTool::ALL.len());
    println!();

    for tool in FredTool::ALL {
        let schema = tool.input_schema();
        let arguments: Vec<String> = schema["properties"]
            .as_object()
            .map(|properties| {
                properties
                    .keys()
                    .map(|name| {
                        let required = schema["required"]
                            .as_array()
                            .is_some_and(|r| r.iter().any(|v| v == name.as_str()));
                        if required {
                            name.clone()
                        } else {
                            format!("[{name}]")
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let marker = if tool.is_stub() { "🚧" } else { "📈" };
        println!("{} {}({})", marker, tool.name(), arguments.join(", "));
        println!("   {}", tool.description());
    }

    Ok(())
}
