//! Fakes for the hazard and routing collaborators.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone as _, Utc};
use streetwise_geometry::{LngLat, RouteGeometry};
use streetwise_hazard::{HazardError, HazardQuery};
use streetwise_hazard_models::{Incident, IncidentType, LightingData, PoliceStation};
use streetwise_routing::{RoutingError, RoutingProvider};
use streetwise_routing_models::{ProviderResponse, ProviderRoute, RouteRequest};

use crate::progress::RouteProgress;

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

pub fn incident(id: &str, incident_type: IncidentType, at: LngLat, age_days: i64) -> Incident {
    Incident {
        id: id.to_string(),
        incident_type,
        latitude: at.lat,
        longitude: at.lng,
        created_at: now() - Duration::days(age_days),
    }
}

pub fn station(id: i64) -> PoliceStation {
    PoliceStation {
        id,
        name: format!("Station {id}"),
        latitude: 48.85,
        longitude: 2.35,
    }
}

pub fn line(points: &[[f64; 2]]) -> RouteGeometry {
    RouteGeometry::new(points.iter().copied().map(LngLat::from).collect()).unwrap()
}

pub fn provider_route(points: &[[f64; 2]], distance: f64) -> ProviderRoute {
    ProviderRoute {
        geometry: line(points),
        distance,
        duration: distance / 1.4,
        legs: vec![],
    }
}

type IncidentFn = Box<dyn Fn(&RouteGeometry) -> Result<Vec<Incident>, HazardError> + Send + Sync>;

/// Hazard data decided per route by a closure; stations and lighting are
/// fixed.
pub struct FakeHazards {
    pub incidents: IncidentFn,
    pub police_stations: Result<Vec<PoliceStation>, ()>,
    pub lighting: Result<LightingData, ()>,
    pub since: Mutex<Vec<DateTime<Utc>>>,
}

impl FakeHazards {
    pub fn with_incidents(
        incidents: impl Fn(&RouteGeometry) -> Vec<Incident> + Send + Sync + 'static,
    ) -> Self {
        Self {
            incidents: Box::new(move |route| Ok(incidents(route))),
            police_stations: Ok(vec![]),
            lighting: Ok(LightingData::unlit()),
            since: Mutex::new(vec![]),
        }
    }

    pub fn failing_incidents() -> Self {
        Self {
            incidents: Box::new(|_| Err(unavailable())),
            ..Self::with_incidents(|_| vec![])
        }
    }
}

fn unavailable() -> HazardError {
    HazardError::Status {
        status: 503,
        body: "service unavailable".to_string(),
    }
}

#[async_trait]
impl HazardQuery for FakeHazards {
    async fn incidents_near_route(
        &self,
        route: &RouteGeometry,
        _buffer_meters: f64,
        since: DateTime<Utc>,
    ) -> Result<Vec<Incident>, HazardError> {
        self.since.lock().unwrap().push(since);
        (self.incidents)(route)
    }

    async fn police_stations_near_route(
        &self,
        _route: &RouteGeometry,
        _buffer_meters: f64,
    ) -> Result<Vec<PoliceStation>, HazardError> {
        self.police_stations.clone().map_err(|()| unavailable())
    }

    async fn street_lights_near_route(
        &self,
        _route: &RouteGeometry,
        _buffer_meters: f64,
    ) -> Result<LightingData, HazardError> {
        self.lighting.map_err(|()| unavailable())
    }

    async fn nearest_police_station(
        &self,
        _point: LngLat,
    ) -> Result<Option<PoliceStation>, HazardError> {
        Ok(self.police_stations.clone().ok().and_then(|s| s.into_iter().next()))
    }
}

type RouteFn = Box<dyn Fn(&RouteRequest) -> Result<ProviderResponse, RoutingError> + Send + Sync>;

/// Routing answered by a closure, recording every request.
pub struct FakeRouter {
    pub respond: RouteFn,
    pub requests: Mutex<Vec<RouteRequest>>,
}

impl FakeRouter {
    pub fn new(
        respond: impl Fn(&RouteRequest) -> Result<ProviderResponse, RoutingError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            requests: Mutex::new(vec![]),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl RoutingProvider for FakeRouter {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn route(&self, request: &RouteRequest) -> Result<ProviderResponse, RoutingError> {
        self.requests.lock().unwrap().push(request.clone());
        (self.respond)(request)
    }
}

/// Records every progress message.
#[derive(Default)]
pub struct RecordingProgress {
    pub messages: Mutex<Vec<String>>,
}

impl RouteProgress for RecordingProgress {
    fn set_message(&self, msg: &str) {
        self.messages.lock().unwrap().push(msg.to_string());
    }
}
