//! Local flat-earth projection.
//!
//! Treats one degree of latitude as [`METERS_PER_DEGREE`] meters and one
//! degree of longitude as that figure scaled by `cos(lat)`. Only valid over
//! short distances. Every meters-to-degrees conversion in the workspace goes
//! through this module so it can be replaced by a geodesic implementation in
//! one place.

use crate::LngLat;

/// Meters per degree of latitude.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Meters per degree of longitude at the given latitude.
#[must_use]
pub fn meters_per_degree_lng(lat: f64) -> f64 {
    METERS_PER_DEGREE * lat.to_radians().cos()
}

/// Converts a metric extent at `origin` into degrees, returned as
/// `(Δlng, Δlat)`.
#[must_use]
pub fn degree_span(origin: LngLat, east_meters: f64, north_meters: f64) -> (f64, f64) {
    (
        east_meters / meters_per_degree_lng(origin.lat),
        north_meters / METERS_PER_DEGREE,
    )
}

/// Moves `origin` by the given number of meters north and east.
#[must_use]
pub fn offset(origin: LngLat, north_meters: f64, east_meters: f64) -> LngLat {
    let (d_lng, d_lat) = degree_span(origin, east_meters, north_meters);
    LngLat::new(origin.lng + d_lng, origin.lat + d_lat)
}

/// Position of `point` relative to `origin` in meters, as `(east, north)`.
#[must_use]
pub fn to_local_meters(origin: LngLat, point: LngLat) -> (f64, f64) {
    (
        (point.lng - origin.lng) * meters_per_degree_lng(origin.lat),
        (point.lat - origin.lat) * METERS_PER_DEGREE,
    )
}
