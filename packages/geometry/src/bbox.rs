//! Axis-aligned bounding boxes in WGS84 degrees.

use serde::{Deserialize, Serialize};

use crate::{LngLat, RouteGeometry, projection};

/// A geographic bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Smallest box containing every point, or `None` for an empty input.
    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = LngLat>) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| {
            Some(acc.map_or_else(
                || Self::new(p.lng, p.lat, p.lng, p.lat),
                |b: Self| {
                    Self::new(
                        b.west.min(p.lng),
                        b.south.min(p.lat),
                        b.east.max(p.lng),
                        b.north.max(p.lat),
                    )
                },
            ))
        })
    }

    /// Bounding box of a route grown by `buffer_meters` on every side.
    #[must_use]
    pub fn around_route(route: &RouteGeometry, buffer_meters: f64) -> Self {
        // A route always has points, so the fold never yields `None`.
        Self::from_points(route.coordinates().iter().copied())
            .unwrap_or_else(|| Self::new(0.0, 0.0, 0.0, 0.0))
            .expand_meters(buffer_meters)
    }

    /// Grows the box by `meters` in each direction.
    ///
    /// Longitude growth uses the latitude edge farthest from the equator so
    /// the expanded box never under-covers.
    #[must_use]
    pub fn expand_meters(self, meters: f64) -> Self {
        let widest_lat = if self.north.abs() > self.south.abs() {
            self.north
        } else {
            self.south
        };
        let (d_lng, d_lat) =
            projection::degree_span(LngLat::new(self.west, widest_lat), meters, meters);

        Self::new(
            self.west - d_lng,
            (self.south - d_lat).max(-90.0),
            self.east + d_lng,
            (self.north + d_lat).min(90.0),
        )
    }

    /// Whether `point` lies inside the box (edges included).
    #[must_use]
    pub fn contains(&self, point: LngLat) -> bool {
        point.lng >= self.west
            && point.lng <= self.east
            && point.lat >= self.south
            && point.lat <= self.north
    }

    /// South-west corner as `[lng, lat]`.
    #[must_use]
    pub const fn min_corner(&self) -> [f64; 2] {
        [self.west, self.south]
    }

    /// North-east corner as `[lng, lat]`.
    #[must_use]
    pub const fn max_corner(&self) -> [f64; 2] {
        [self.east, self.north]
    }
}
