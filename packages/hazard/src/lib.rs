#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hazard data queries along walking routes.
//!
//! The safety engine sees hazard data only through the [`HazardQuery`]
//! trait. Two backends are provided:
//!
//! 1. [`rpc::RpcHazardQuery`]: calls `PostGIS` functions exposed through a
//!    `PostgREST` (Supabase) API.
//! 2. [`memory::InMemoryHazardQuery`]: R-tree indexes over a JSON dataset,
//!    for local development and tests.
//!
//! Both estimate lighting coverage the same way (see [`coverage`]).

pub mod coverage;
pub mod memory;
mod retry;
pub mod rpc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use streetwise_geometry::{LngLat, RouteGeometry};
use streetwise_hazard_models::{Incident, LightingData, PoliceStation};
use thiserror::Error;

/// Errors from hazard data lookups.
#[derive(Debug, Error)]
pub enum HazardError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (dataset file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The data service answered with an error status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, usually a `PostgREST` error object.
        body: String,
    },

    /// The data service answered with something unexpected.
    #[error("Unexpected response: {message}")]
    UnexpectedResponse {
        /// Description of what was wrong.
        message: String,
    },
}

/// Source of hazard and safety-asset data near a route.
///
/// Each lookup is independent so that an outage of one data source never
/// blocks the others.
#[async_trait]
pub trait HazardQuery: Send + Sync {
    /// Incidents within `buffer_meters` of the route reported at or after
    /// `since`.
    ///
    /// # Errors
    ///
    /// Returns [`HazardError`] if the lookup fails.
    async fn incidents_near_route(
        &self,
        route: &RouteGeometry,
        buffer_meters: f64,
        since: DateTime<Utc>,
    ) -> Result<Vec<Incident>, HazardError>;

    /// Police stations within `buffer_meters` of the route.
    ///
    /// # Errors
    ///
    /// Returns [`HazardError`] if the lookup fails.
    async fn police_stations_near_route(
        &self,
        route: &RouteGeometry,
        buffer_meters: f64,
    ) -> Result<Vec<PoliceStation>, HazardError>;

    /// Street lights within `buffer_meters` of the route, with estimated
    /// coverage.
    ///
    /// # Errors
    ///
    /// Returns [`HazardError`] if the lookup fails.
    async fn street_lights_near_route(
        &self,
        route: &RouteGeometry,
        buffer_meters: f64,
    ) -> Result<LightingData, HazardError>;

    /// The police station closest to `point`, if any exist.
    ///
    /// # Errors
    ///
    /// Returns [`HazardError`] if the lookup fails.
    async fn nearest_police_station(
        &self,
        point: LngLat,
    ) -> Result<Option<PoliceStation>, HazardError>;
}
