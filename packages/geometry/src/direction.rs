//! Compass directions used to steer detours away from danger zones.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::{BoundingBox, LngLat, projection};

/// One of the four cardinal directions.
///
/// The declaration order is also the tie-break order when several
/// directions are equally good.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CompassDirection {
    /// Increasing latitude.
    North,
    /// Decreasing latitude.
    South,
    /// Increasing longitude.
    East,
    /// Decreasing longitude.
    West,
}

impl CompassDirection {
    /// Returns all variants in tie-break order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::North, Self::South, Self::East, Self::West]
    }

    /// The point `distance_meters` away from `center` in this direction.
    #[must_use]
    pub fn project(self, center: LngLat, distance_meters: f64) -> LngLat {
        match self {
            Self::North => projection::offset(center, distance_meters, 0.0),
            Self::South => projection::offset(center, -distance_meters, 0.0),
            Self::East => projection::offset(center, 0.0, distance_meters),
            Self::West => projection::offset(center, 0.0, -distance_meters),
        }
    }

    /// A rectangle adjacent to `center` on this side.
    ///
    /// `width_meters` is measured east-west and `length_meters` north-south.
    /// North and south boxes straddle the center longitude and extend
    /// `length_meters` away from it; east and west boxes straddle the center
    /// latitude and extend `width_meters` away from it.
    #[must_use]
    pub fn probe_box(self, center: LngLat, width_meters: f64, length_meters: f64) -> BoundingBox {
        let (width_deg, length_deg) = projection::degree_span(center, width_meters, length_meters);
        let LngLat { lng, lat } = center;

        match self {
            Self::North => BoundingBox::new(
                lng - width_deg / 2.0,
                lat,
                lng + width_deg / 2.0,
                lat + length_deg,
            ),
            Self::South => BoundingBox::new(
                lng - width_deg / 2.0,
                lat - length_deg,
                lng + width_deg / 2.0,
                lat,
            ),
            Self::East => BoundingBox::new(
                lng,
                lat - length_deg / 2.0,
                lng + width_deg,
                lat + length_deg / 2.0,
            ),
            Self::West => BoundingBox::new(
                lng - width_deg,
                lat - length_deg / 2.0,
                lng,
                lat + length_deg / 2.0,
            ),
        }
    }
}
