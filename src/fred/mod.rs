// FRED upstream: credential resolution, typed records and the HTTP client

pub mod auth;
pub mod client;
pub mod models;

pub use auth::{ApiKey, authenticate};
pub use client::{ClientFactory, FredApi, FredClient, HttpClientFactory};
pub use models::{EntityLookup, Observation, Release, Series, Source, observations_table};
