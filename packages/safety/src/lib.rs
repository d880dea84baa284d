#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Route safety scoring and safer-route planning.
//!
//! The pipeline for one request:
//!
//! 1. The routing provider returns the fastest walking route, possibly with
//!    alternatives.
//! 2. [`scoring::SafetyScorer`] rates each route from nearby incidents,
//!    police stations and street lighting.
//! 3. When the provider gave no alternatives, [`cluster`] groups the fastest
//!    route's incidents into danger zones and [`detour`] yields waypoints
//!    that steer around them.
//! 4. [`ranking`] filters detours by length and safety and picks the best.
//!
//! [`planner::RoutePlanner`] ties the steps together.

pub mod clock;
pub mod cluster;
pub mod detour;
pub mod planner;
pub mod progress;
pub mod ranking;
pub mod scoring;

#[cfg(test)]
mod testing;

use std::time::Duration;

use streetwise_geometry::LngLat;
use streetwise_hazard::HazardError;
use streetwise_routing::RoutingError;
use thiserror::Error;

pub use clock::{Clock, FixedClock, SystemClock};
pub use planner::RoutePlanner;
pub use progress::{LogProgress, NullProgress, RouteProgress};
pub use scoring::SafetyScorer;

/// Errors from scoring a route.
#[derive(Debug, Error)]
pub enum SafetyError {
    /// Incidents could not be fetched. Incidents are the primary signal, so
    /// no score is produced without them.
    #[error("Failed to fetch incidents: {0}")]
    Incidents(#[from] HazardError),

    /// The incident lookup did not answer in time.
    #[error("Incident lookup timed out after {0:?}")]
    IncidentsTimeout(Duration),
}

/// Errors from planning routes.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Start or end is not a valid WGS84 coordinate.
    #[error("Invalid coordinates: start {start:?}, end {end:?}")]
    InvalidCoordinates {
        /// Requested start.
        start: LngLat,
        /// Requested end.
        end: LngLat,
    },

    /// The routing provider failed on the fastest route.
    #[error("Routing provider failed: {0}")]
    PrimaryRoute(#[from] RoutingError),

    /// The routing provider did not answer in time.
    #[error("Routing provider timed out after {0:?}")]
    PrimaryRouteTimeout(Duration),
}
