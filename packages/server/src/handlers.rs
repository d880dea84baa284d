//! HTTP handler functions for the streetwise API.

use actix_web::{HttpResponse, web};
use streetwise_geometry::RouteGeometry;
use streetwise_hazard_models::IncidentType;
use streetwise_safety::{LogProgress, PlanError};
use streetwise_server_models::{
    ApiHealth, ApiIncidentType, ApiPoliceStation, ApiRoutesResponse, ApiSafetyResponse,
    CalculateSafetyRequest, NearestPoliceParams, RoutesRequest,
};

use crate::AppState;

fn error_json(message: &str) -> serde_json::Value {
    serde_json::json!({ "error": message })
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/incident-types`
///
/// Returns every reportable incident type with the severity and penalty
/// the scorer is configured with.
pub async fn incident_types(state: web::Data<AppState>) -> HttpResponse {
    let weights = &state.scorer.config().incidents;
    let types: Vec<ApiIncidentType> = IncidentType::all()
        .iter()
        .map(|t| ApiIncidentType {
            name: *t,
            emoji: t.emoji().to_string(),
            severity: weights.severity(*t),
            penalty: weights.penalty(*t),
        })
        .collect();

    HttpResponse::Ok().json(types)
}

/// `POST /api/calculate-safety`
///
/// Scores a client-supplied route.
pub async fn calculate_safety(
    state: web::Data<AppState>,
    body: web::Json<CalculateSafetyRequest>,
) -> HttpResponse {
    let Some(geometry) = body.into_inner().geometry else {
        return HttpResponse::BadRequest().json(error_json("Invalid route geometry"));
    };

    let route: RouteGeometry = match serde_json::from_value(geometry) {
        Ok(route) => route,
        Err(e) => {
            return HttpResponse::BadRequest()
                .json(error_json(&format!("Invalid route geometry: {e}")));
        }
    };

    match state.scorer.score(&route).await {
        Ok(report) => {
            log::info!(
                "Scored route: {}/10, {} incidents, {} police stations",
                report.safety_score,
                report.incident_count,
                report.police_station_count
            );
            let weights = &state.scorer.config().incidents;
            HttpResponse::Ok().json(ApiSafetyResponse::from_report(report, |t| {
                weights.severity(t)
            }))
        }
        Err(e) => {
            log::error!("Failed to score route: {e}");
            HttpResponse::InternalServerError().json(error_json("Failed to fetch incidents"))
        }
    }
}

/// `POST /api/routes`
///
/// Plans the fastest walking route and, when one exists, a safer option.
pub async fn routes(state: web::Data<AppState>, body: web::Json<RoutesRequest>) -> HttpResponse {
    let RoutesRequest { start, end } = body.into_inner();

    match state
        .planner
        .calculate_routes(start, end, &LogProgress)
        .await
    {
        Ok(routes) if routes.is_empty() => {
            HttpResponse::NotFound().json(error_json("No route found"))
        }
        Ok(routes) => HttpResponse::Ok().json(ApiRoutesResponse { routes }),
        Err(e @ PlanError::InvalidCoordinates { .. }) => {
            HttpResponse::BadRequest().json(error_json(&e.to_string()))
        }
        Err(e) => {
            log::error!("Failed to plan routes: {e}");
            HttpResponse::BadGateway().json(error_json("Routing provider failed"))
        }
    }
}

/// `GET /api/nearest-police`
pub async fn nearest_police(
    state: web::Data<AppState>,
    params: web::Query<NearestPoliceParams>,
) -> HttpResponse {
    let Some(point) = params.point() else {
        return HttpResponse::BadRequest().json(error_json("Missing coordinates"));
    };
    if !point.is_valid() {
        return HttpResponse::BadRequest().json(error_json("Invalid coordinates"));
    }

    match state.hazards.nearest_police_station(point).await {
        Ok(Some(station)) => HttpResponse::Ok().json(ApiPoliceStation::from(station)),
        Ok(None) => HttpResponse::NotFound().json(error_json("No police stations found")),
        Err(e) => {
            log::error!("Failed to find nearest police station: {e}");
            HttpResponse::InternalServerError().json(error_json("Internal server error"))
        }
    }
}
