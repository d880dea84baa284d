#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Walking route providers.
//!
//! Road-network pathfinding is delegated to an external service behind the
//! [`RoutingProvider`] trait. The bundled implementation talks to any
//! OSRM-compatible HTTP API (see [`osrm`]).

pub mod osrm;

use async_trait::async_trait;
use streetwise_routing_models::{ProviderResponse, RouteRequest};
use thiserror::Error;

/// Errors from routing providers.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The provider rejected the request.
    #[error("Routing provider error {code}: {message}")]
    Provider {
        /// Provider error code.
        code: String,
        /// Provider error message.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,
}

/// A service that computes walking routes.
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// Computes routes for `request`, fastest first.
    ///
    /// An empty route list means no route exists between the points.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError`] if the provider cannot be reached or answers
    /// with an error.
    async fn route(&self, request: &RouteRequest) -> Result<ProviderResponse, RoutingError>;
}
