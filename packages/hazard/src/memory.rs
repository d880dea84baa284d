//! In-memory hazard backend.
//!
//! Features are indexed by position in R-trees keyed on `[lng, lat]`.
//! A route query first selects candidates inside the route's buffered
//! bounding box, then keeps those whose exact distance to the polyline is
//! within the buffer. Results come back in dataset order.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rstar::{AABB, RTree, primitives::GeomWithData};
use serde::{Deserialize, Serialize};
use streetwise_config::LightingConfig;
use streetwise_geometry::{
    BoundingBox, LngLat, RouteGeometry, distance_to_route, haversine_distance,
};
use streetwise_hazard_models::{
    Incident, LightingData, PoliceStation, StreetLight, StreetLightCounts,
};

use crate::{HazardError, HazardQuery, coverage};

/// Environment variable pointing at a JSON [`HazardDataset`] file.
pub const DATASET_ENV_VAR: &str = "HAZARD_DATASET";

/// Hazard features loaded from a JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HazardDataset {
    /// Reported incidents.
    pub incidents: Vec<Incident>,
    /// Police stations.
    pub police_stations: Vec<PoliceStation>,
    /// Street lights.
    pub street_lights: Vec<StreetLight>,
}

impl HazardDataset {
    /// Parses a dataset from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`HazardError::Json`] if the JSON is malformed.
    pub fn from_json_str(json: &str) -> Result<Self, HazardError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a dataset file.
    ///
    /// # Errors
    ///
    /// Returns [`HazardError`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, HazardError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

type IndexedPoint = GeomWithData<[f64; 2], usize>;

fn build_index(points: impl Iterator<Item = LngLat>) -> RTree<IndexedPoint> {
    RTree::bulk_load(
        points
            .enumerate()
            .map(|(i, p)| IndexedPoint::new(p.into(), i))
            .collect(),
    )
}

/// Positions (ascending) of indexed features within `buffer_meters` of the
/// route.
fn indices_near_route(
    tree: &RTree<IndexedPoint>,
    route: &RouteGeometry,
    buffer_meters: f64,
) -> Vec<usize> {
    let bbox = BoundingBox::around_route(route, buffer_meters);
    let envelope = AABB::from_corners(bbox.min_corner(), bbox.max_corner());

    let mut hits: Vec<usize> = tree
        .locate_in_envelope(&envelope)
        .filter(|entry| distance_to_route(LngLat::from(*entry.geom()), route) <= buffer_meters)
        .map(|entry| entry.data)
        .collect();
    hits.sort_unstable();
    hits
}

/// Hazard lookups over an in-memory [`HazardDataset`].
pub struct InMemoryHazardQuery {
    dataset: HazardDataset,
    incident_index: RTree<IndexedPoint>,
    station_index: RTree<IndexedPoint>,
    light_index: RTree<IndexedPoint>,
    lighting: LightingConfig,
}

impl InMemoryHazardQuery {
    /// Indexes a dataset.
    #[must_use]
    pub fn new(dataset: HazardDataset, lighting: LightingConfig) -> Self {
        let incident_index = build_index(dataset.incidents.iter().map(Incident::location));
        let station_index =
            build_index(dataset.police_stations.iter().map(PoliceStation::location));
        let light_index = build_index(dataset.street_lights.iter().map(StreetLight::location));

        log::info!(
            "Indexed {} incidents, {} police stations, {} street lights",
            dataset.incidents.len(),
            dataset.police_stations.len(),
            dataset.street_lights.len()
        );

        Self {
            dataset,
            incident_index,
            station_index,
            light_index,
            lighting,
        }
    }

    /// Loads and indexes a dataset file.
    ///
    /// # Errors
    ///
    /// Returns [`HazardError`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path, lighting: LightingConfig) -> Result<Self, HazardError> {
        Ok(Self::new(HazardDataset::from_file(path)?, lighting))
    }
}

#[async_trait]
impl HazardQuery for InMemoryHazardQuery {
    async fn incidents_near_route(
        &self,
        route: &RouteGeometry,
        buffer_meters: f64,
        since: DateTime<Utc>,
    ) -> Result<Vec<Incident>, HazardError> {
        Ok(indices_near_route(&self.incident_index, route, buffer_meters)
            .into_iter()
            .map(|i| &self.dataset.incidents[i])
            .filter(|incident| incident.created_at >= since)
            .cloned()
            .collect())
    }

    async fn police_stations_near_route(
        &self,
        route: &RouteGeometry,
        buffer_meters: f64,
    ) -> Result<Vec<PoliceStation>, HazardError> {
        Ok(indices_near_route(&self.station_index, route, buffer_meters)
            .into_iter()
            .map(|i| self.dataset.police_stations[i].clone())
            .collect())
    }

    async fn street_lights_near_route(
        &self,
        route: &RouteGeometry,
        buffer_meters: f64,
    ) -> Result<LightingData, HazardError> {
        let hits = indices_near_route(&self.light_index, route, buffer_meters);
        let counts =
            StreetLightCounts::tally(hits.into_iter().map(|i| &self.dataset.street_lights[i]));

        Ok(coverage::lighting_along_route(counts, route, &self.lighting))
    }

    async fn nearest_police_station(
        &self,
        point: LngLat,
    ) -> Result<Option<PoliceStation>, HazardError> {
        // The tree's nearest point is nearest in degrees, not on the ground.
        // Every station at least as close lies in a box of its haversine
        // distance, so the exact winner is picked from that box.
        let Some(seed) = self.station_index.nearest_neighbor(&point.into()) else {
            return Ok(None);
        };
        let reach = haversine_distance(point, LngLat::from(*seed.geom()));
        let bbox = BoundingBox::new(point.lng, point.lat, point.lng, point.lat)
            .expand_meters(reach.mul_add(1.01, 1.0));
        let envelope = AABB::from_corners(bbox.min_corner(), bbox.max_corner());

        Ok(self
            .station_index
            .locate_in_envelope(&envelope)
            .map(|entry| {
                (
                    haversine_distance(point, LngLat::from(*entry.geom())),
                    entry.data,
                )
            })
            .min_by(|(a, i), (b, j)| a.total_cmp(b).then(i.cmp(j)))
            .map(|(_, i)| self.dataset.police_stations[i].clone()))
    }
}
