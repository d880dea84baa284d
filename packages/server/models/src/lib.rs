#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the streetwise server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the engine's report types so the API contract can round values and
//! add display fields without touching the scoring code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use streetwise_geometry::LngLat;
use streetwise_hazard_models::{Incident, IncidentType, LightingData, PoliceStation};
use streetwise_routing_models::{RouteCandidate, SafetyReport};

/// Rounds to one decimal place for display.
fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `GET /api/health` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is up.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// An incident type with its display and scoring values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiIncidentType {
    /// Type name as used in incident records.
    pub name: IncidentType,
    /// Map marker emoji.
    pub emoji: String,
    /// Severity used for danger clustering.
    pub severity: f64,
    /// Points deducted per incident before time weighting.
    pub penalty: f64,
}

/// An incident as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiIncident {
    /// Unique incident ID.
    pub id: String,
    /// What was reported.
    #[serde(rename = "type")]
    pub incident_type: IncidentType,
    /// Severity of the type.
    pub severity: f64,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// When the report was made.
    pub created_at: DateTime<Utc>,
    /// `[lng, lat]`.
    pub location: LngLat,
}

impl ApiIncident {
    /// Wraps `incident` with its type's severity.
    #[must_use]
    pub fn new(incident: Incident, severity: f64) -> Self {
        let location = incident.location();
        Self {
            id: incident.id,
            incident_type: incident.incident_type,
            severity,
            latitude: incident.latitude,
            longitude: incident.longitude,
            created_at: incident.created_at,
            location,
        }
    }
}

/// A police station as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiPoliceStation {
    /// Station ID.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// `[lng, lat]`.
    pub location: LngLat,
}

impl From<PoliceStation> for ApiPoliceStation {
    fn from(station: PoliceStation) -> Self {
        let location = station.location();
        Self {
            id: station.id,
            name: station.name,
            latitude: station.latitude,
            longitude: station.longitude,
            location,
        }
    }
}

/// Body of `POST /api/calculate-safety`.
///
/// The geometry is kept as raw JSON so a malformed line can be reported as
/// a 400 with a message instead of an extractor error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalculateSafetyRequest {
    /// `GeoJSON` `LineString` of the route.
    #[serde(default)]
    pub geometry: Option<serde_json::Value>,
}

/// `POST /api/calculate-safety` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSafetyResponse {
    /// Safety score (0-10, one decimal).
    pub safety_score: f64,
    /// Incidents that counted against the route.
    pub incident_count: usize,
    /// Police stations near the route.
    pub police_station_count: usize,
    /// Sum of time-weighted incident penalties (one decimal).
    pub total_penalty: f64,
    /// Police bonus (one decimal).
    pub police_bonus: f64,
    /// Lighting bonus (one decimal).
    pub lighting_bonus: f64,
    /// Street lighting along the route.
    pub lighting_data: LightingData,
    /// Incidents that counted against the route.
    pub incidents: Vec<ApiIncident>,
    /// Police stations near the route.
    pub police_stations: Vec<ApiPoliceStation>,
}

impl ApiSafetyResponse {
    /// Builds the response from a report, looking up each incident's
    /// severity with `severity`.
    #[must_use]
    pub fn from_report(report: SafetyReport, severity: impl Fn(IncidentType) -> f64) -> Self {
        Self {
            safety_score: round_one_decimal(report.safety_score),
            incident_count: report.incident_count,
            police_station_count: report.police_station_count,
            total_penalty: round_one_decimal(report.total_penalty),
            police_bonus: round_one_decimal(report.police_bonus),
            lighting_bonus: round_one_decimal(report.lighting_bonus),
            lighting_data: report.lighting_data,
            incidents: report
                .incidents
                .into_iter()
                .map(|incident| {
                    let severity = severity(incident.incident_type);
                    ApiIncident::new(incident, severity)
                })
                .collect(),
            police_stations: report
                .police_stations
                .into_iter()
                .map(ApiPoliceStation::from)
                .collect(),
        }
    }
}

/// Body of `POST /api/routes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesRequest {
    /// Start as `[lng, lat]`.
    pub start: LngLat,
    /// Destination as `[lng, lat]`.
    pub end: LngLat,
}

/// `POST /api/routes` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRoutesResponse {
    /// Fastest route first, then any safer options.
    pub routes: Vec<RouteCandidate>,
}

/// Query parameters for `GET /api/nearest-police`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NearestPoliceParams {
    /// Latitude of the user.
    pub lat: Option<f64>,
    /// Longitude of the user.
    pub lng: Option<f64>,
}

impl NearestPoliceParams {
    /// The requested point, if both coordinates were given.
    #[must_use]
    pub fn point(&self) -> Option<LngLat> {
        Some(LngLat::new(self.lng?, self.lat?))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    fn report() -> SafetyReport {
        SafetyReport {
            safety_score: 8.5,
            incident_count: 1,
            police_station_count: 1,
            total_penalty: 1.886_326,
            police_bonus: 0.3,
            lighting_bonus: 0.833_333,
            lighting_data: LightingData::unlit(),
            incidents: vec![Incident {
                id: "abc".to_string(),
                incident_type: IncidentType::Harassment,
                latitude: 48.855,
                longitude: 2.35,
                created_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            }],
            police_stations: vec![PoliceStation {
                id: 7,
                name: "Central".to_string(),
                latitude: 48.85,
                longitude: 2.34,
            }],
        }
    }

    #[test]
    fn safety_response_rounds_and_adds_locations() {
        let response = ApiSafetyResponse::from_report(report(), |_| 10.0);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["safetyScore"], 8.5);
        assert_eq!(json["totalPenalty"], 1.9);
        assert_eq!(json["lightingBonus"], 0.8);
        assert_eq!(json["policeStationCount"], 1);
        assert_eq!(json["incidents"][0]["type"], "harassment");
        assert_eq!(json["incidents"][0]["severity"], 10.0);
        assert_eq!(json["incidents"][0]["location"], serde_json::json!([2.35, 48.855]));
        assert_eq!(json["policeStations"][0]["location"], serde_json::json!([2.34, 48.85]));
    }

    #[test]
    fn routes_request_takes_lng_lat_pairs() {
        let request: RoutesRequest =
            serde_json::from_str(r#"{"start": [2.35, 48.85], "end": [2.36, 48.86]}"#).unwrap();
        assert_eq!(request.start, LngLat::new(2.35, 48.85));
        assert_eq!(request.end, LngLat::new(2.36, 48.86));
    }

    #[test]
    fn nearest_police_needs_both_coordinates() {
        let params = NearestPoliceParams {
            lat: Some(48.85),
            lng: None,
        };
        assert!(params.point().is_none());

        let params = NearestPoliceParams {
            lat: Some(48.85),
            lng: Some(2.35),
        };
        assert_eq!(params.point(), Some(LngLat::new(2.35, 48.85)));
    }
}
