use thiserror::Error;

pub type Result<T> = std::result::Result<T, FredError>;

#[derive(Error, Debug)]
pub enum FredError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("MCP error: {0}")]
    Mcp(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl FredError {
    /// Short name of the error class, used in logs
    #[inline]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "configuration",
            Self::Upstream(_) => "upstream",
            Self::Validation(_) => "validation",
            Self::Mcp(_) => "mcp",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Other(_) => "other",
        }
    }
}

pub mod commands;
pub mod config;
pub mod fred;
pub mod mcp;
pub mod response;
