
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use super::auth::{ApiKey, authenticate};
use super::models::{EntityLookup, Observation, Release, Series, Source};
use crate::config::FredConfig;
use crate::{FredError, Result};

/// The upstream data capabilities the tools are built on
pub trait FredApi: Send + Sync {
    fn search_series(&self, search_text: &str) -> Result<Vec<Series>>;

    fn series_info(&self, series_id: &str) -> Result<EntityLookup<Series>>;

    fn series_observations(&self, series_id: &str) -> Result<EntityLookup<Vec<Observation>>>;

    fn category_series(&self, category_id: i64) -> Result<EntityLookup<Vec<Series>>>;

    fn releases(&self) -> Result<Vec<Release>>;

    fn release_series(&self, release_id: i64) -> Result<EntityLookup<Vec<Series>>>;

    fn sources(&self) -> Result<Vec<Source>>;

    fn source(&self, source_id: i64) -> Result<EntityLookup<Source>>;
}

/// Produces an authenticated client for a single operation.
///
/// Implementations resolve credentials on every call instead of holding a
/// long-lived client.
pub trait ClientFactory: Send + Sync {
    fn connect(&self) -> Result<Box<dyn FredApi>>;
}

/// Builds [`FredClient`]s from the configuration and the environment key
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    config: FredConfig,
}

impl HttpClientFactory {
    #[inline]
    pub fn new(config: FredConfig) -> Self {
        Self { config }
    }
}

impl ClientFactory for HttpClientFactory {
    #[inline]
    fn connect(&self) -> Result<Box<dyn FredApi>> {
        let api_key = authenticate(&self.config.api_key_env)?;
        Ok(Box::new(FredClient::new(&self.config, api_key)?))
    }
}

/// Blocking HTTP client for the FRED REST API
#[derive(Debug, Clone)]
pub struct FredClient {
    base_url: Url,
    api_key: ApiKey,
    max_rows: u32,
    agent: ureq::Agent,
}

#[derive(Debug, Deserialize)]
struct SeriesResponse {
    #[serde(default)]
    seriess: Vec<Series>,
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    #[serde(default)]
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct ReleasesResponse {
    #[serde(default)]
    releases: Vec<Release>,
}

#[derive(Debug, Deserialize)]
struct SourcesResponse {
    #[serde(default)]
    sources: Vec<Source>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error_code: Option<u16>,
    error_message: String,
}

/// Failure of one HTTP exchange, before it is folded into [`FredError`]
#[derive(Debug)]
enum RequestError {
    Api { status: u16, message: String },
    Transport(String),
    Decode(String),
}

impl From<RequestError> for FredError {
    fn from(error: RequestError) -> Self {
        match error {
            RequestError::Api { status, message } => {
                Self::Upstream(format!("FRED API returned HTTP {status}: {message}"))
            }
            RequestError::Transport(message) => {
                Self::Upstream(format!("Request to FRED failed: {message}"))
            }
            RequestError::Decode(message) => {
                Self::Upstream(format!("Malformed FRED response: {message}"))
            }
        }
    }
}

impl RequestError {
    /// FRED answers lookups of unknown ids with a 400 saying the entity does not exist
    fn is_unknown_entity(&self) -> bool {
        matches!(self, Self::Api { status: 400 | 404, message } if message.contains("does not exist"))
    }
}

impl FredClient {
    #[inline]
    pub fn new(config: &FredConfig, api_key: ApiKey) -> Result<Self> {
        let base_url = config
            .base_url()
            .map_err(|e| FredError::Config(e.to_string()))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout()))
            .http_status_as_error(false)
            .build()
            .into();

        Ok(Self {
            base_url,
            api_key,
            max_rows: config.max_rows,
            agent,
        })
    }

    fn limit(&self) -> String {
        self.max_rows.to_string()
    }

    fn get<T>(&self, endpoint: &str, params: &[(&str, &str)]) -> std::result::Result<T, RequestError>
    where
        T: DeserializeOwned,
    {
        let mut url = self
            .base_url
            .join(endpoint)
            .map_err(|e| RequestError::Transport(format!("invalid endpoint {endpoint}: {e}")))?;

        url.query_pairs_mut()
            .extend_pairs(params.iter().copied())
            .append_pair("file_type", "json");

        // Logged before the key is attached
        debug!("GET {}", url);

        url.query_pairs_mut()
            .append_pair("api_key", self.api_key.expose());

        let mut response = self
            .agent
            .get(url.as_str())
            .call()
            .map_err(|e| RequestError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| RequestError::Transport(e.to_string()))?;

        if !(200..300).contains(&status) {
            let message = serde_json::from_str::<ErrorResponse>(&body).map_or_else(
                |_| format!("unexpected response from {endpoint}"),
                |err| {
                    if let Some(code) = err.error_code.filter(|code| *code != status) {
                        debug!("FRED error code {} differs from HTTP status {}", code, status);
                    }
                    err.error_message
                },
            );
            warn!("FRED {} failed with HTTP {}: {}", endpoint, status, message);
            return Err(RequestError::Api { status, message });
        }

        serde_json::from_str(&body).map_err(|e| RequestError::Decode(format!("{endpoint}: {e}")))
    }

    /// Request an endpoint keyed by an upstream id. An id FRED does not know, or
    /// a body `extract` finds nothing in, is `NotFound(missing)`.
    fn keyed<R, T, F>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        missing: String,
        extract: F,
    ) -> Result<EntityLookup<T>>
    where
        R: DeserializeOwned,
        F: FnOnce(R) -> Option<T>,
    {
        match self.get::<R>(endpoint, params) {
            Ok(response) => {
                Ok(extract(response).map_or(EntityLookup::NotFound(missing), EntityLookup::Single))
            }
            Err(e) if e.is_unknown_entity() => {
                debug!("{} reported unknown entity: {:?}", endpoint, e);
                Ok(EntityLookup::NotFound(missing))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn lookup<T>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        missing: String,
    ) -> Result<EntityLookup<T>>
    where
        T: DeserializeOwned,
    {
        self.keyed(endpoint, params, missing, EntityResponse::<T>::into_first)
    }
}

/// Single-entity endpoints wrap their record in a one-element list under
/// `seriess` or `sources`
#[derive(Debug, Deserialize)]
struct EntityResponse<T> {
    #[serde(default = "Vec::new", alias = "seriess", alias = "sources")]
    items: Vec<T>,
}

impl<T> EntityResponse<T> {
    fn into_first(self) -> Option<T> {
        self.items.into_iter().next()
    }
}

impl FredApi for FredClient {
    #[inline]
    fn search_series(&self, search_text: &str) -> Result<Vec<Series>> {
        let limit = self.limit();
        let response: SeriesResponse = self.get(
            "series/search",
            &[("search_text", search_text), ("limit", limit.as_str())],
        )?;
        Ok(response.seriess)
    }

    #[inline]
    fn series_info(&self, series_id: &str) -> Result<EntityLookup<Series>> {
        self.lookup(
            "series",
            &[("series_id", series_id)],
            format!("No info found for series {series_id}"),
        )
    }

    #[inline]
    fn series_observations(&self, series_id: &str) -> Result<EntityLookup<Vec<Observation>>> {
        self.keyed(
            "series/observations",
            &[("series_id", series_id)],
            format!("No data found for series {series_id}"),
            |response: ObservationsResponse| Some(response.observations),
        )
    }

    #[inline]
    fn category_series(&self, category_id: i64) -> Result<EntityLookup<Vec<Series>>> {
        let id = category_id.to_string();
        let limit = self.limit();
        self.keyed(
            "category/series",
            &[
                ("category_id", id.as_str()),
                ("limit", limit.as_str()),
                ("order_by", "popularity"),
                ("sort_order", "desc"),
            ],
            format!("No series found for category {category_id}"),
            |response: SeriesResponse| Some(response.seriess),
        )
    }

    #[inline]
    fn releases(&self) -> Result<Vec<Release>> {
        let limit = self.limit();
        let response: ReleasesResponse = self.get("releases", &[("limit", limit.as_str())])?;
        Ok(response.releases)
    }

    #[inline]
    fn release_series(&self, release_id: i64) -> Result<EntityLookup<Vec<Series>>> {
        let id = release_id.to_string();
        let limit = self.limit();
        self.keyed(
            "release/series",
            &[("release_id", id.as_str()), ("limit", limit.as_str())],
            format!("No series found for release {release_id}"),
            |response: SeriesResponse| Some(response.seriess),
        )
    }

    #[inline]
    fn sources(&self) -> Result<Vec<Source>> {
        let limit = self.limit();
        let response: SourcesResponse = self.get("sources", &[("limit", limit.as_str())])?;
        Ok(response.sources)
    }

    #[inline]
    fn source(&self, source_id: i64) -> Result<EntityLookup<Source>> {
        let id = source_id.to_string();
        self.lookup(
            "source",
            &[("source_id", id.as_str())],
            format!("No info found for source {source_id}"),
        )
    }
}
