#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geometric primitives and distance metrics for walking routes.
//!
//! Coordinates follow the `GeoJSON` convention of `[lng, lat]`. Great-circle
//! distances go through `geo`'s haversine metric; everything that needs a
//! meters-to-degrees conversion goes through the [`projection`] module.

pub mod bbox;
pub mod direction;
pub mod projection;

use geo::{Distance as _, Haversine};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use bbox::BoundingBox;
pub use direction::CompassDirection;

/// Errors produced when building route geometries.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    /// The line has fewer than two points.
    #[error("Route geometry needs at least 2 points, got {count}")]
    TooFewPoints {
        /// Number of points supplied.
        count: usize,
    },

    /// A coordinate is not finite or is outside WGS84 bounds.
    #[error("Invalid coordinate at index {index}: [{lng}, {lat}]")]
    InvalidCoordinate {
        /// Position of the offending point in the line.
        index: usize,
        /// Longitude as supplied.
        lng: f64,
        /// Latitude as supplied.
        lat: f64,
    },

    /// The `GeoJSON` geometry is not a `LineString`, or a position is
    /// malformed.
    #[error("Unsupported geometry: {message}")]
    Unsupported {
        /// Description of the problem.
        message: String,
    },
}

/// A WGS84 coordinate, serialized as `[lng, lat]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    /// Longitude in degrees.
    pub lng: f64,
    /// Latitude in degrees.
    pub lat: f64,
}

impl LngLat {
    /// Creates a coordinate from longitude and latitude.
    #[must_use]
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Whether both components are finite and inside WGS84 bounds.
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.lng.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lng)
            && (-90.0..=90.0).contains(&self.lat)
    }

    /// Converts to a `geo` point (`x = lng`, `y = lat`).
    #[must_use]
    pub fn to_point(self) -> geo::Point<f64> {
        geo::Point::new(self.lng, self.lat)
    }
}

impl From<[f64; 2]> for LngLat {
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(value: LngLat) -> Self {
        [value.lng, value.lat]
    }
}

/// Great-circle distance between two coordinates in meters.
#[must_use]
pub fn haversine_distance(a: LngLat, b: LngLat) -> f64 {
    Haversine.distance(a.to_point(), b.to_point())
}

/// An ordered walking path of at least two points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LineStringJson", into = "LineStringJson")]
pub struct RouteGeometry {
    coordinates: Vec<LngLat>,
}

impl RouteGeometry {
    /// Builds a route from its points.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if fewer than two points are given or any
    /// coordinate is non-finite or out of range.
    pub fn new(coordinates: Vec<LngLat>) -> Result<Self, GeometryError> {
        if coordinates.len() < 2 {
            return Err(GeometryError::TooFewPoints {
                count: coordinates.len(),
            });
        }

        if let Some((index, bad)) = coordinates
            .iter()
            .enumerate()
            .find(|(_, c)| !c.is_valid())
        {
            return Err(GeometryError::InvalidCoordinate {
                index,
                lng: bad.lng,
                lat: bad.lat,
            });
        }

        Ok(Self { coordinates })
    }

    /// The route's points in travel order.
    #[must_use]
    pub fn coordinates(&self) -> &[LngLat] {
        &self.coordinates
    }

    /// Length of the route in meters, summed over haversine segments.
    #[must_use]
    pub fn length_meters(&self) -> f64 {
        self.coordinates
            .windows(2)
            .map(|w| haversine_distance(w[0], w[1]))
            .sum()
    }

    /// Converts to a `GeoJSON` `LineString` geometry.
    #[must_use]
    pub fn to_geojson(&self) -> geojson::Geometry {
        geojson::Geometry::new(geojson::Value::LineString(
            self.coordinates
                .iter()
                .map(|c| vec![c.lng, c.lat])
                .collect(),
        ))
    }
}

impl TryFrom<geojson::Geometry> for RouteGeometry {
    type Error = GeometryError;

    fn try_from(geometry: geojson::Geometry) -> Result<Self, Self::Error> {
        let geojson::Value::LineString(positions) = geometry.value else {
            return Err(GeometryError::Unsupported {
                message: "expected a LineString".to_string(),
            });
        };

        let coordinates = positions
            .iter()
            .enumerate()
            .map(|(index, position)| match (position.first(), position.get(1)) {
                (Some(&lng), Some(&lat)) => Ok(LngLat::new(lng, lat)),
                _ => Err(GeometryError::Unsupported {
                    message: format!("position {index} has fewer than 2 values"),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(coordinates)
    }
}

/// Serde shape of a `GeoJSON` `LineString`.
#[derive(Clone, Serialize, Deserialize)]
struct LineStringJson {
    #[serde(rename = "type")]
    kind: String,
    coordinates: Vec<LngLat>,
}

impl TryFrom<LineStringJson> for RouteGeometry {
    type Error = GeometryError;

    fn try_from(value: LineStringJson) -> Result<Self, Self::Error> {
        if value.kind != "LineString" {
            return Err(GeometryError::Unsupported {
                message: format!("expected a LineString, got {}", value.kind),
            });
        }
        Self::new(value.coordinates)
    }
}

impl From<RouteGeometry> for LineStringJson {
    fn from(value: RouteGeometry) -> Self {
        Self {
            kind: "LineString".to_string(),
            coordinates: value.coordinates,
        }
    }
}

/// Route length using the flat-earth approximation.
///
/// Cheaper and slightly less accurate than
/// [`RouteGeometry::length_meters`]; lighting coverage is calibrated
/// against this figure.
#[must_use]
pub fn flat_length_meters(route: &RouteGeometry) -> f64 {
    route
        .coordinates()
        .windows(2)
        .map(|w| {
            let (east, north) = projection::to_local_meters(w[0], w[1]);
            east.hypot(north)
        })
        .sum()
}

/// Shortest distance in meters from `point` to any segment of `route`.
///
/// Each segment is projected onto a local plane centered on `point`, which
/// is accurate for the buffer sizes (tens to hundreds of meters) used when
/// querying hazards.
#[must_use]
pub fn distance_to_route(point: LngLat, route: &RouteGeometry) -> f64 {
    route
        .coordinates()
        .windows(2)
        .map(|w| {
            let a = projection::to_local_meters(point, w[0]);
            let b = projection::to_local_meters(point, w[1]);
            distance_to_segment_from_origin(a, b)
        })
        .fold(f64::INFINITY, f64::min)
}

fn distance_to_segment_from_origin(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx.mul_add(dx, dy * dy);

    if len_sq == 0.0 {
        return a.0.hypot(a.1);
    }

    let t = (-(a.0 * dx) - a.1 * dy) / len_sq;
    let t = t.clamp(0.0, 1.0);
    t.mul_add(dx, a.0).hypot(t.mul_add(dy, a.1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(points: &[[f64; 2]]) -> RouteGeometry {
        RouteGeometry::new(points.iter().copied().map(LngLat::from).collect()).unwrap()
    }

    #[test]
    fn haversine_one_degree_latitude() {
        let d = haversine_distance(LngLat::new(0.0, 0.0), LngLat::new(0.0, 1.0));
        assert!((d - 111_195.0).abs() < 50.0, "got {d}");
    }

    #[test]
    fn rejects_single_point_routes() {
        let err = RouteGeometry::new(vec![LngLat::new(2.35, 48.85)]).unwrap_err();
        assert_eq!(err, GeometryError::TooFewPoints { count: 1 });
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let err = RouteGeometry::new(vec![LngLat::new(2.35, 48.85), LngLat::new(2.35, 91.0)])
            .unwrap_err();
        assert!(matches!(err, GeometryError::InvalidCoordinate { index: 1, .. }));
    }

    #[test]
    fn parses_geojson_line_string() {
        let json = serde_json::json!({
            "type": "LineString",
            "coordinates": [[-0.187, 5.603], [-0.186, 5.604]]
        });
        let geometry: geojson::Geometry = serde_json::from_value(json).unwrap();
        let route = RouteGeometry::try_from(geometry).unwrap();
        assert_eq!(route.coordinates().len(), 2);
        assert_eq!(route.coordinates()[0], LngLat::new(-0.187, 5.603));
    }

    #[test]
    fn rejects_geojson_point() {
        let json = serde_json::json!({ "type": "Point", "coordinates": [-0.187, 5.603] });
        let geometry: geojson::Geometry = serde_json::from_value(json).unwrap();
        assert!(matches!(
            RouteGeometry::try_from(geometry),
            Err(GeometryError::Unsupported { .. })
        ));
    }

    #[test]
    fn serializes_as_line_string() {
        let r = route(&[[1.0, 2.0], [3.0, 4.0]]);
        let value = serde_json::to_value(&r).unwrap();
        assert_eq!(value["type"], "LineString");
        assert_eq!(value["coordinates"][1][0], 3.0);

        let back: RouteGeometry = serde_json::from_value(value).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn distance_to_route_uses_segment_interior() {
        // East-west segment along the equator, point 0.001 deg north of its middle.
        let r = route(&[[0.0, 0.0], [0.01, 0.0]]);
        let d = distance_to_route(LngLat::new(0.005, 0.001), &r);
        assert!((d - 111.0).abs() < 0.5, "got {d}");
    }

    #[test]
    fn distance_to_route_clamps_to_endpoints() {
        let r = route(&[[0.0, 0.0], [0.01, 0.0]]);
        let d = distance_to_route(LngLat::new(-0.001, 0.0), &r);
        assert!((d - 111.0).abs() < 0.5, "got {d}");
    }

    #[test]
    fn flat_length_close_to_haversine_for_short_routes() {
        let r = route(&[[-0.187, 5.603], [-0.180, 5.610], [-0.170, 5.612]]);
        let flat = flat_length_meters(&r);
        let great_circle = r.length_meters();
        assert!((flat - great_circle).abs() / great_circle < 0.01);
    }
}
