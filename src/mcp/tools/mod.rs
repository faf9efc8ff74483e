//! MCP Tools Implementation
//!
//! The explicit tool catalog: one descriptor per FRED capability, each pairing
//! a name and input schema with the handler that runs the operation pipeline.

mod operations;

pub use operations::{ToolArguments, execute};

use crate::fred::ClientFactory;
use crate::mcp::protocol::*;
use crate::mcp::server::{ToolEntry, ToolHandler};
use crate::response::ToolResponse;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::debug;

/// Preview size for free-text search
pub const SEARCH_DEFAULT_LIMIT: i64 = 10;

/// Preview size for every other listing
pub const LISTING_DEFAULT_LIMIT: i64 = 1000;

/// Every tool the server exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FredTool {
    SearchSeries,
    GetSeriesInfo,
    GetSeriesData,
    GetCategorySeries,
    GetReleases,
    GetReleaseSeries,
    GetSources,
    GetSource,
    GetCategoryDetails,
    GetCategoryChildren,
    SearchRelatedTags,
}

impl FredTool {
    /// Catalog order, as listed to clients
    pub const ALL: [Self; 11] = [
        Self::SearchSeries,
        Self::GetSeriesInfo,
        Self::GetSeriesData,
        Self::GetCategoryDetails,
        Self::GetCategoryChildren,
        Self::GetCategorySeries,
        Self::GetReleases,
        Self::GetReleaseSeries,
        Self::GetSources,
        Self::GetSource,
        Self::SearchRelatedTags,
    ];

    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            Self::SearchSeries => "search_series",
            Self::GetSeriesInfo => "get_series_info",
            Self::GetSeriesData => "get_series_data",
            Self::GetCategorySeries => "get_category_series",
            Self::GetReleases => "get_releases",
            Self::GetReleaseSeries => "get_release_series",
            Self::GetSources => "get_sources",
            Self::GetSource => "get_source",
            Self::GetCategoryDetails => "get_category_details",
            Self::GetCategoryChildren => "get_category_children",
            Self::SearchRelatedTags => "search_related_tags",
        }
    }

    #[inline]
    pub fn description(self) -> &'static str {
        match self {
            Self::SearchSeries => "Search for economic data series by text query.",
            Self::GetSeriesInfo => "Get metadata for a specific data series.",
            Self::GetSeriesData => {
                "Get data points for a specific series. When file_path is given the full \
                 dataset (ignoring limit/offset) is saved there as JSON instead of previewed."
            }
            Self::GetCategorySeries => "Get series in a specific category, most popular first.",
            Self::GetReleases => "Get all releases of economic data.",
            Self::GetReleaseSeries => "Get series in a specific release.",
            Self::GetSources => "Get all sources of economic data.",
            Self::GetSource => "Get details for a specific source.",
            Self::GetCategoryDetails => "Get details for a specific category (if supported).",
            Self::GetCategoryChildren => "Get child categories for a specific category.",
            Self::SearchRelatedTags => "Get related tags for a set of tags.",
        }
    }

    /// Listing tools page their preview; single-entity tools and stubs do not
    #[inline]
    pub fn is_listing(self) -> bool {
        matches!(
            self,
            Self::SearchSeries
                | Self::GetSeriesData
                | Self::GetCategorySeries
                | Self::GetReleases
                | Self::GetReleaseSeries
                | Self::GetSources
        )
    }

    /// Capabilities the upstream client does not offer
    #[inline]
    pub fn is_stub(self) -> bool {
        matches!(
            self,
            Self::GetCategoryDetails | Self::GetCategoryChildren | Self::SearchRelatedTags
        )
    }

    #[inline]
    pub fn default_limit(self) -> i64 {
        match self {
            Self::SearchSeries => SEARCH_DEFAULT_LIMIT,
            _ => LISTING_DEFAULT_LIMIT,
        }
    }

    /// Plural noun used in listing previews
    #[inline]
    pub fn noun(self) -> &'static str {
        match self {
            Self::GetSeriesData => "data points",
            Self::GetReleases => "releases",
            Self::GetSources => "sources",
            _ => "series",
        }
    }

    /// What the operation was doing, as used in `Error {action}: ...`
    #[inline]
    pub fn action(self) -> &'static str {
        match self {
            Self::SearchSeries => "searching series",
            Self::GetSeriesInfo => "getting series info",
            Self::GetSeriesData => "getting series data",
            Self::GetCategorySeries => "getting category series",
            Self::GetReleases => "getting releases",
            Self::GetReleaseSeries => "getting release series",
            Self::GetSources => "getting sources",
            Self::GetSource => "getting source",
            Self::GetCategoryDetails => "getting category details",
            Self::GetCategoryChildren => "getting category children",
            Self::SearchRelatedTags => "searching related tags",
        }
    }

    #[inline]
    pub fn input_schema(self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        let mut require = |name: &str, property: Value| {
            properties.insert(name.to_string(), property);
            required.push(name.to_string());
        };

        match self {
            Self::SearchSeries => require(
                "query",
                json!({"type": "string", "description": "The search text (e.g., \"gdp\", \"unemployment\")"}),
            ),
            Self::GetSeriesInfo | Self::GetSeriesData => require(
                "series_id",
                json!({"type": "string", "description": "The ID of the series (e.g., \"GDP\", \"UNRATE\")"}),
            ),
            Self::GetCategorySeries | Self::GetCategoryDetails | Self::GetCategoryChildren => {
                require(
                    "category_id",
                    json!({"type": "integer", "description": "The ID of the category (e.g., 125)"}),
                );
            }
            Self::GetReleaseSeries => require(
                "release_id",
                json!({"type": "integer", "description": "The ID of the release"}),
            ),
            Self::GetSource => require(
                "source_id",
                json!({"type": "integer", "description": "The ID of the source"}),
            ),
            Self::SearchRelatedTags => require(
                "tag_names",
                json!({"type": "string", "description": "Semicolon separated list of tag names"}),
            ),
            Self::GetReleases | Self::GetSources => {}
        }

        if self.is_listing() || self == Self::SearchRelatedTags {
            properties.insert(
                "limit".to_string(),
                json!({
                    "type": "integer",
                    "minimum": 0,
                    "description": format!("Maximum number of rows in the preview (default: {})", self.default_limit())
                }),
            );
            properties.insert(
                "offset".to_string(),
                json!({
                    "type": "integer",
                    "minimum": 0,
                    "description": "Number of rows to skip in the preview (default: 0)"
                }),
            );
        }

        if !self.is_stub() {
            properties.insert(
                "file_path".to_string(),
                json!({
                    "type": "string",
                    "minLength": 1,
                    "description": "Optional path to save the full result as JSON. \
                                    When given, the result is saved instead of previewed."
                }),
            );
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false
        })
    }

    #[inline]
    pub fn definition(self) -> Tool {
        Tool {
            name: self.name().to_string(),
            description: Some(self.description().to_string()),
            input_schema: self.input_schema(),
        }
    }
}

/// Runs one [`FredTool`] against clients produced by the factory
pub struct FredToolHandler {
    tool: FredTool,
    factory: Arc<dyn ClientFactory>,
}

impl FredToolHandler {
    #[inline]
    pub fn new(tool: FredTool, factory: Arc<dyn ClientFactory>) -> Self {
        Self { tool, factory }
    }
}

#[async_trait]
impl ToolHandler for FredToolHandler {
    #[inline]
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        let tool = self.tool;
        let factory = Arc::clone(&self.factory);
        let arguments = params.arguments.unwrap_or_default();

        debug!("Dispatching {} with {} argument(s)", tool.name(), arguments.len());

        // The upstream client blocks on network and file IO
        let response =
            tokio::task::spawn_blocking(move || execute(tool, arguments, factory.as_ref()))
                .await
                .with_context(|| format!("{} task did not complete", tool.name()))?;

        Ok(response.into())
    }
}

/// The descriptor table handed to the server at start
pub struct ToolCatalog {
    factory: Arc<dyn ClientFactory>,
}

impl ToolCatalog {
    #[inline]
    pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
        Self { factory }
    }

    /// Tool definitions in catalog order
    #[inline]
    pub fn definitions() -> Vec<Tool> {
        FredTool::ALL.into_iter().map(FredTool::definition).collect()
    }

    #[inline]
    pub fn into_entries(self) -> Vec<ToolEntry> {
        FredTool::ALL
            .into_iter()
            .map(|tool| ToolEntry {
                tool: tool.definition(),
                handler: Box::new(FredToolHandler::new(tool, Arc::clone(&self.factory))),
            })
            .collect()
    }
}

impl From<ToolResponse> for CallToolResult {
    #[inline]
    fn from(response: ToolResponse) -> Self {
        Self::text(
            response.display_text,
            Some(response.structured),
            response.is_error,
        )
    }
}
