#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for route safety scoring.
//!
//! Serves the REST API used by the map frontend: scoring an arbitrary route,
//! planning the fastest route plus a safer alternative, and finding the
//! nearest police station. Routing goes to an OSRM-compatible service.
//! Hazard data comes from a `PostgREST` RPC backend when one is configured,
//! otherwise from a local JSON dataset.

mod handlers;

use std::path::Path;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, error, middleware, web};
use streetwise_config::{ConfigError, SafetyConfig};
use streetwise_hazard::{
    HazardError, HazardQuery,
    memory::{DATASET_ENV_VAR, HazardDataset, InMemoryHazardQuery},
    rpc::RpcHazardQuery,
};
use streetwise_routing::{RoutingError, RoutingProvider, osrm::OsrmProvider};
use streetwise_safety::{Clock, RoutePlanner, SafetyScorer, SystemClock};
use thiserror::Error;

/// Errors from starting the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Safety configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The hazard data source could not be set up.
    #[error(transparent)]
    Hazard(#[from] HazardError),

    /// The routing provider could not be set up.
    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// Binding or running the HTTP server failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Shared application state.
pub struct AppState {
    /// Fastest-route and safer-alternative planner.
    pub planner: Arc<RoutePlanner>,
    /// Scorer for routes supplied by clients.
    pub scorer: Arc<SafetyScorer>,
    /// Hazard data source, for direct lookups.
    pub hazards: Arc<dyn HazardQuery>,
}

impl AppState {
    /// Wires the engine around the given collaborators.
    #[must_use]
    pub fn new(
        router: Arc<dyn RoutingProvider>,
        hazards: Arc<dyn HazardQuery>,
        clock: Arc<dyn Clock>,
        config: Arc<SafetyConfig>,
    ) -> Self {
        let scorer = Arc::new(SafetyScorer::new(Arc::clone(&hazards), clock, config));
        let planner = Arc::new(RoutePlanner::new(router, Arc::clone(&scorer)));
        Self {
            planner,
            scorer,
            hazards,
        }
    }

    /// Builds the state from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if a provider cannot be created or the hazard
    /// dataset cannot be loaded.
    pub fn from_env(config: SafetyConfig) -> Result<Self, ServerError> {
        let router = OsrmProvider::from_env(config.timeouts.routing_request())?;
        let hazards = hazards_from_env(&config)?;
        log::info!("Routing via {}", router.name());

        Ok(Self::new(
            Arc::new(router),
            hazards,
            Arc::new(SystemClock),
            Arc::new(config),
        ))
    }
}

/// Picks the hazard source: the RPC backend when its credentials are set,
/// then a dataset file, then an empty dataset.
fn hazards_from_env(config: &SafetyConfig) -> Result<Arc<dyn HazardQuery>, ServerError> {
    if let Some(rpc) =
        RpcHazardQuery::from_env(config.timeouts.hazard_request(), config.lighting.clone())?
    {
        log::info!("Using RPC hazard backend");
        return Ok(Arc::new(rpc));
    }

    if let Ok(path) = std::env::var(DATASET_ENV_VAR) {
        log::info!("Loading hazard dataset from {path}");
        return Ok(Arc::new(InMemoryHazardQuery::from_file(
            Path::new(&path),
            config.lighting.clone(),
        )?));
    }

    log::warn!("No hazard data configured, every route will score as hazard-free");
    Ok(Arc::new(InMemoryHazardQuery::new(
        HazardDataset::default(),
        config.lighting.clone(),
    )))
}

/// Turns request body and query extraction failures into JSON 400s.
fn bad_request<E>(err: E, _req: &HttpRequest) -> error::Error
where
    E: std::fmt::Debug + std::fmt::Display + 'static,
{
    let response = HttpResponse::BadRequest().json(serde_json::json!({
        "error": err.to_string()
    }));
    error::InternalError::from_response(err, response).into()
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::JsonConfig::default().error_handler(bad_request))
            .app_data(web::QueryConfig::default().error_handler(bad_request))
            .route("/health", web::get().to(handlers::health))
            .route("/incident-types", web::get().to(handlers::incident_types))
            .route(
                "/calculate-safety",
                web::post().to(handlers::calculate_safety),
            )
            .route("/routes", web::post().to(handlers::routes))
            .route("/nearest-police", web::get().to(handlers::nearest_police)),
    );
}

/// Starts the API server.
///
/// Loads the safety configuration, builds the routing provider and hazard
/// source from the environment, and serves until shut down. The caller
/// provides the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns [`ServerError`] if setup fails, or if the HTTP server fails to
/// bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> Result<(), ServerError> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = SafetyConfig::from_env()?;
    let state = web::Data::new(AppState::from_env(config)?);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await?;

    Ok(())
}
