//! The per-call pipeline shared by every tool:
//! `Authenticate -> Fetch -> (Export | Preview)`, with any failure turned into
//! an error envelope.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use super::FredTool;
use crate::fred::{ClientFactory, EntityLookup, FredApi, observations_table};
use crate::response::{
    Record, Table, ToolResponse, Window, entity_heading, paginate, persist, render_listing,
    render_record,
};
use crate::{FredError, Result};

/// Arguments accepted across the catalog. Each tool's schema admits a subset.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolArguments {
    pub query: Option<String>,
    pub series_id: Option<String>,
    pub category_id: Option<i64>,
    pub release_id: Option<i64>,
    pub source_id: Option<i64>,
    pub tag_names: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub file_path: Option<PathBuf>,
}

impl ToolArguments {
    #[inline]
    pub fn from_map(arguments: Map<String, Value>) -> Result<Self> {
        serde_json::from_value(Value::Object(arguments))
            .map_err(|e| FredError::Validation(format!("invalid arguments: {e}")))
    }

    fn window(&self, tool: FredTool) -> Result<Window> {
        Window::new(
            self.offset.unwrap_or(0),
            self.limit.unwrap_or_else(|| tool.default_limit()),
        )
    }
}

fn required<T: Clone>(value: Option<&T>, name: &str) -> Result<T> {
    value
        .cloned()
        .ok_or_else(|| FredError::Validation(format!("missing required argument `{name}`")))
}

/// What the fetch stage produced
#[derive(Debug)]
enum Fetched {
    Listing {
        subject: String,
        heading: Option<String>,
        records: Vec<Record>,
    },
    Entity {
        subject: String,
        heading: String,
        record: Record,
    },
    NotFound(String),
}

/// Run `tool` with raw call arguments. Never fails: every error becomes an
/// error envelope.
#[inline]
pub fn execute(
    tool: FredTool,
    arguments: Map<String, Value>,
    factory: &dyn ClientFactory,
) -> ToolResponse {
    info!("Tool {} invoked", tool.name());

    let result = ToolArguments::from_map(arguments).and_then(|args| {
        if tool.is_stub() {
            Ok(unsupported(tool, &args))
        } else {
            run(tool, &args, factory)
        }
    });

    match result {
        Ok(response) => response,
        Err(e) => {
            warn!("{} failed ({} error): {}", tool.name(), e.kind(), e);
            ToolResponse::failure(tool.action(), &e)
        }
    }
}

fn run(tool: FredTool, args: &ToolArguments, factory: &dyn ClientFactory) -> Result<ToolResponse> {
    let window = args.window(tool)?;

    let api = factory.connect()?;
    debug!("{}: authenticated", tool.name());

    let fetched = fetch(tool, args, api.as_ref())?;
    debug!("{}: fetched", tool.name());

    let path = args.file_path.as_deref();
    let response = match fetched {
        Fetched::NotFound(message) => {
            debug!("{}: nothing found", tool.name());
            ToolResponse::not_found(message)
        }
        Fetched::Listing {
            subject,
            heading,
            records,
        } => match path {
            Some(path) => export(tool, &subject, &records, path)?,
            None => preview_listing(tool, heading, &records, window),
        },
        Fetched::Entity {
            subject,
            heading,
            record,
        } => match path {
            Some(path) => export(tool, &subject, std::slice::from_ref(&record), path)?,
            None => preview_entity(tool, &heading, record),
        },
    };

    Ok(response)
}

fn export(tool: FredTool, subject: &str, records: &[Record], path: &Path) -> Result<ToolResponse> {
    let summary = persist(records, path)?;
    debug!("{}: exported", tool.name());
    Ok(ToolResponse::success(
        summary.message(subject),
        summary.to_json(),
    ))
}

fn fetch(tool: FredTool, args: &ToolArguments, api: &dyn FredApi) -> Result<Fetched> {
    let fetched = match tool {
        FredTool::SearchSeries => {
            let query = required(args.query.as_ref(), "query")?;
            listing(query.clone(), None, &Table::from_rows(&api.search_series(&query)?))
        }
        FredTool::GetSeriesInfo => {
            let series_id = required(args.series_id.as_ref(), "series_id")?;
            match api.series_info(&series_id)? {
                EntityLookup::Single(series) => {
                    entity(series_id, &Table::from_rows(&[series]), "title", "units")
                }
                EntityLookup::NotFound(message) => Fetched::NotFound(message),
            }
        }
        FredTool::GetSeriesData => {
            let series_id = required(args.series_id.as_ref(), "series_id")?;
            match api.series_observations(&series_id)? {
                EntityLookup::Single(observations) => {
                    // Exports carry no heading, so metadata is only fetched for previews
                    let heading = args
                        .file_path
                        .is_none()
                        .then(|| series_heading(api, &series_id));
                    listing(series_id, heading, &observations_table(&observations))
                }
                EntityLookup::NotFound(message) => Fetched::NotFound(message),
            }
        }
        FredTool::GetCategorySeries => {
            let category_id = required(args.category_id.as_ref(), "category_id")?;
            match api.category_series(category_id)? {
                EntityLookup::Single(series) => listing(
                    format!("category {category_id}"),
                    None,
                    &Table::from_rows(&series),
                ),
                EntityLookup::NotFound(message) => Fetched::NotFound(message),
            }
        }
        FredTool::GetReleases => listing(
            "releases".to_string(),
            None,
            &Table::from_rows(&api.releases()?),
        ),
        FredTool::GetReleaseSeries => {
            let release_id = required(args.release_id.as_ref(), "release_id")?;
            match api.release_series(release_id)? {
                EntityLookup::Single(series) => listing(
                    format!("release {release_id}"),
                    None,
                    &Table::from_rows(&series),
                ),
                EntityLookup::NotFound(message) => Fetched::NotFound(message),
            }
        }
        FredTool::GetSources => listing(
            "sources".to_string(),
            None,
            &Table::from_rows(&api.sources()?),
        ),
        FredTool::GetSource => {
            let source_id = required(args.source_id.as_ref(), "source_id")?;
            match api.source(source_id)? {
                EntityLookup::Single(source) => entity(
                    format!("Source {source_id}"),
                    &Table::from_rows(&[source]),
                    "name",
                    "units",
                ),
                EntityLookup::NotFound(message) => Fetched::NotFound(message),
            }
        }
        FredTool::GetCategoryDetails
        | FredTool::GetCategoryChildren
        | FredTool::SearchRelatedTags => {
            return Err(FredError::Mcp(format!(
                "{} has no upstream capability",
                tool.name()
            )));
        }
    };

    Ok(fetched)
}

fn listing(subject: String, heading: Option<String>, table: &Table) -> Fetched {
    Fetched::Listing {
        subject,
        heading,
        records: table.to_records(),
    }
}

fn entity(subject: String, table: &Table, title_key: &str, units_key: &str) -> Fetched {
    match table.to_records().into_iter().next() {
        Some(record) => Fetched::Entity {
            heading: entity_heading(&record, title_key, units_key, &subject),
            subject,
            record,
        },
        None => Fetched::NotFound(format!("No info found for {subject}")),
    }
}

/// Heading for an observation preview. A failed metadata lookup falls back to
/// the series id rather than failing the call.
fn series_heading(api: &dyn FredApi, series_id: &str) -> String {
    match api.series_info(series_id) {
        Ok(EntityLookup::Single(series)) => Table::from_rows(&[series])
            .to_records()
            .first()
            .map_or_else(
                || format!("## {series_id}"),
                |record| entity_heading(record, "title", "units", series_id),
            ),
        Ok(EntityLookup::NotFound(reason)) => {
            debug!("No metadata for {}: {}", series_id, reason);
            format!("## {series_id}")
        }
        Err(e) => {
            debug!("Metadata lookup for {} failed: {}", series_id, e);
            format!("## {series_id}")
        }
    }
}

fn preview_listing(
    tool: FredTool,
    heading: Option<String>,
    records: &[Record],
    window: Window,
) -> ToolResponse {
    let page = paginate(records, window);
    let listing = render_listing(page.rows, page.total, tool.noun());
    let display_text = match heading {
        Some(heading) => format!("{heading}\n\n{listing}"),
        None => listing,
    };
    let structured = json!({
        "results": page.rows,
        "total": page.total,
        "showing": page.shown(),
        "offset": window.offset,
        "limit": window.limit,
    });
    debug!("{}: previewed {} of {}", tool.name(), page.shown(), page.total);
    ToolResponse::success(display_text, structured)
}

fn preview_entity(tool: FredTool, heading: &str, record: Record) -> ToolResponse {
    let display_text = format!("{heading}\n\n{}", render_record(&record));
    debug!("{}: previewed entity", tool.name());
    ToolResponse::success(display_text, Value::Object(record))
}

/// Fixed informational answer for capabilities the upstream client lacks.
/// No credential is read and no request is made.
fn unsupported(tool: FredTool, args: &ToolArguments) -> ToolResponse {
    let message = match tool {
        FredTool::GetCategoryDetails => args.category_id.map_or_else(
            || "To explore a category, please use `get_category_series` or `get_category_children`."
                .to_string(),
            |id| {
                format!(
                    "To explore category {id}, please use `get_category_series` or `get_category_children`."
                )
            },
        ),
        FredTool::GetCategoryChildren => format!(
            "Tool `{}` is not currently available via this server. Please use `get_category_series`.",
            tool.name()
        ),
        _ => format!("Tool `{}` is not available in this version.", tool.name()),
    };
    debug!("{} is unsupported", tool.name());
    ToolResponse::unsupported(message)
}
