#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Route request/response types shared by the routing provider, the safety
//! engine and the HTTP API.
//!
//! A [`ProviderRoute`] is what the routing provider returns. After scoring
//! it becomes a [`RouteCandidate`], which carries the safety figures the
//! client displays.

use serde::{Deserialize, Serialize};
use streetwise_geometry::{LngLat, RouteGeometry};
use streetwise_hazard_models::{Incident, LightingData, PoliceStation};
use strum_macros::{AsRefStr, Display, EnumString};

/// A walking route request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    /// Start of the walk.
    pub origin: LngLat,
    /// End of the walk.
    pub destination: LngLat,
    /// Intermediate points the route must pass through, in order.
    #[serde(default)]
    pub waypoints: Vec<LngLat>,
    /// Ask the provider for alternative routes as well.
    #[serde(default)]
    pub alternatives: bool,
}

impl RouteRequest {
    /// A direct request without waypoints or alternatives.
    #[must_use]
    pub const fn new(origin: LngLat, destination: LngLat) -> Self {
        Self {
            origin,
            destination,
            waypoints: Vec::new(),
            alternatives: false,
        }
    }

    /// Adds a waypoint.
    #[must_use]
    pub fn with_waypoint(mut self, waypoint: LngLat) -> Self {
        self.waypoints.push(waypoint);
        self
    }

    /// Sets whether alternatives are requested.
    #[must_use]
    pub const fn with_alternatives(mut self, alternatives: bool) -> Self {
        self.alternatives = alternatives;
        self
    }

    /// All points in travel order: origin, waypoints, destination.
    pub fn coordinates(&self) -> impl Iterator<Item = LngLat> + '_ {
        std::iter::once(self.origin)
            .chain(self.waypoints.iter().copied())
            .chain(std::iter::once(self.destination))
    }
}

/// Turn-by-turn maneuver at the start of a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Maneuver {
    /// Maneuver kind (`depart`, `turn`, `arrive`, ...).
    #[serde(rename = "type")]
    pub maneuver_type: String,
    /// Direction modifier (`left`, `slight right`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<String>,
    /// Human-readable instruction.
    pub instruction: String,
    /// Heading before the maneuver, in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearing_before: Option<f64>,
    /// Heading after the maneuver, in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearing_after: Option<f64>,
    /// Where the maneuver happens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LngLat>,
}

/// One navigation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationStep {
    /// Human-readable instruction.
    pub instruction: String,
    /// Step length in meters.
    pub distance: f64,
    /// Step duration in seconds.
    pub duration: f64,
    /// Maneuver at the start of the step.
    pub maneuver: Maneuver,
    /// Street name.
    #[serde(default)]
    pub name: String,
}

/// Part of a route between two consecutive request points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteLeg {
    /// Leg length in meters.
    pub distance: f64,
    /// Leg duration in seconds.
    pub duration: f64,
    /// Short summary (main street names).
    #[serde(default)]
    pub summary: String,
    /// Navigation steps.
    #[serde(default)]
    pub steps: Vec<NavigationStep>,
}

/// A route as returned by the routing provider, before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRoute {
    /// Full route line.
    pub geometry: RouteGeometry,
    /// Length in meters.
    pub distance: f64,
    /// Walking time in seconds.
    pub duration: f64,
    /// Legs with navigation steps.
    #[serde(default)]
    pub legs: Vec<RouteLeg>,
}

/// Routing provider answer. The first route is the fastest; the rest are
/// provider-supplied alternatives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Routes, fastest first.
    pub routes: Vec<ProviderRoute>,
}

/// Safety assessment of a single route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyReport {
    /// Final score in `[min, max]`, one decimal.
    pub safety_score: f64,
    /// Incidents that contributed a penalty.
    pub incident_count: usize,
    /// Police stations near the route.
    pub police_station_count: usize,
    /// Sum of time-weighted incident penalties.
    pub total_penalty: f64,
    /// Bonus from nearby police stations.
    pub police_bonus: f64,
    /// Bonus from street lighting.
    pub lighting_bonus: f64,
    /// Street lighting along the route.
    pub lighting_data: LightingData,
    /// Incidents that contributed a penalty.
    pub incidents: Vec<Incident>,
    /// Police stations near the route.
    pub police_stations: Vec<PoliceStation>,
}

/// How a route candidate was obtained.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RouteKind {
    /// The provider's fastest route.
    Fastest,
    /// A provider-supplied alternative.
    Alternative,
    /// A route forced through a waypoint away from a danger cluster.
    SaferDetour,
}

/// A scored route offered to the pedestrian.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteCandidate {
    /// Full route line.
    pub geometry: RouteGeometry,
    /// Length in meters.
    pub distance: f64,
    /// Walking time in seconds.
    pub duration: f64,
    /// Legs with navigation steps.
    pub legs: Vec<RouteLeg>,
    /// Safety score (0-10, higher is safer).
    pub safety_score: f64,
    /// Incidents near the route.
    pub incident_count: usize,
    /// Sum of time-weighted incident penalties.
    pub total_penalty: f64,
    /// Bonus from nearby police stations.
    pub police_bonus: f64,
    /// Bonus from street lighting.
    pub lighting_bonus: f64,
    /// Estimated lit share of the route (0-100).
    pub lighting_percentage: f64,
    /// Street lights along the route.
    pub lighting_count: u32,
    /// How this route was obtained.
    pub kind: RouteKind,
}

impl RouteCandidate {
    /// Combines a provider route with its safety report.
    #[must_use]
    pub fn scored(route: ProviderRoute, report: &SafetyReport, kind: RouteKind) -> Self {
        Self {
            geometry: route.geometry,
            distance: route.distance,
            duration: route.duration,
            legs: route.legs,
            safety_score: report.safety_score,
            incident_count: report.incident_count,
            total_penalty: report.total_penalty,
            police_bonus: report.police_bonus,
            lighting_bonus: report.lighting_bonus,
            lighting_percentage: report.lighting_data.coverage_percentage,
            lighting_count: report.lighting_data.total_lights,
            kind,
        }
    }

    /// A route that could not be scored, given a fixed score and no hazard
    /// data.
    #[must_use]
    pub fn unscored(route: ProviderRoute, safety_score: f64, kind: RouteKind) -> Self {
        Self {
            geometry: route.geometry,
            distance: route.distance,
            duration: route.duration,
            legs: route.legs,
            safety_score,
            incident_count: 0,
            total_penalty: 0.0,
            police_bonus: 0.0,
            lighting_bonus: 0.0,
            lighting_percentage: 0.0,
            lighting_count: 0,
            kind,
        }
    }
}

/// A group of nearby incidents treated as one area to avoid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DangerCluster {
    /// Location of the incident that seeded the cluster.
    pub center: LngLat,
    /// Member incidents, seed first. Never empty.
    pub incidents: Vec<Incident>,
    /// Sum of member severities.
    pub total_severity: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route() -> ProviderRoute {
        ProviderRoute {
            geometry: RouteGeometry::new(vec![LngLat::new(2.35, 48.85), LngLat::new(2.36, 48.86)])
                .unwrap(),
            distance: 1300.0,
            duration: 950.0,
            legs: vec![],
        }
    }

    #[test]
    fn request_coordinates_in_travel_order() {
        let request = RouteRequest::new(LngLat::new(0.0, 0.0), LngLat::new(2.0, 2.0))
            .with_waypoint(LngLat::new(1.0, 1.0));
        let coordinates: Vec<LngLat> = request.coordinates().collect();
        assert_eq!(
            coordinates,
            vec![
                LngLat::new(0.0, 0.0),
                LngLat::new(1.0, 1.0),
                LngLat::new(2.0, 2.0)
            ]
        );
    }

    #[test]
    fn scored_candidate_copies_report_figures() {
        let report = SafetyReport {
            safety_score: 7.4,
            incident_count: 3,
            police_station_count: 1,
            total_penalty: 3.2,
            police_bonus: 0.3,
            lighting_bonus: 0.3,
            lighting_data: LightingData {
                total_lights: 12,
                lights_24h: 4,
                lights_night_only: 8,
                coverage_percentage: 18.0,
            },
            incidents: vec![],
            police_stations: vec![],
        };
        let candidate = RouteCandidate::scored(route(), &report, RouteKind::Fastest);
        assert!((candidate.safety_score - 7.4).abs() < f64::EPSILON);
        assert_eq!(candidate.incident_count, 3);
        assert_eq!(candidate.lighting_count, 12);
        assert!((candidate.lighting_percentage - 18.0).abs() < f64::EPSILON);
        assert!((candidate.distance - 1300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn candidate_serializes_camel_case_with_kind() {
        let candidate = RouteCandidate::unscored(route(), 8.0, RouteKind::SaferDetour);
        let json = serde_json::to_value(&candidate).unwrap();
        assert_eq!(json["kind"], "safer_detour");
        assert_eq!(json["safetyScore"], 8.0);
        assert_eq!(json["geometry"]["type"], "LineString");
        assert_eq!(json["lightingCount"], 0);
    }
}
