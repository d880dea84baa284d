#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Incident taxonomy, police station and street lighting types.
//!
//! Incidents are community reports that arrive as structured records; the
//! safety engine only reads them. An incident's severity and score penalty
//! are never stored on the record itself: they are looked up from its
//! [`IncidentType`] (see [`IncidentType::default_severity`] and the tunable
//! tables in `streetwise_config`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use streetwise_geometry::LngLat;
use strum_macros::{AsRefStr, Display, EnumString};

/// Kind of hazard a user reported.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum IncidentType {
    /// Verbal or physical harassment
    Harassment,
    /// Aggressive behaviour towards passers-by
    Aggressive,
    /// Pickpocketing or bag snatching
    Pickpocket,
    /// Suspicious activity
    Suspicious,
    /// Damaged property
    Vandalism,
    /// Demonstration or crowd
    Protest,
    /// General feeling of insecurity
    Insecurity,
    /// Blocked or difficult passage
    Passage,
    /// Stray or dangerous animal
    Animal,
    /// Dark or badly lit street
    Poorlight,
    /// A type this build does not recognize
    #[serde(other)]
    Unknown,
}

impl IncidentType {
    /// Default severity on a 1-10 scale, used for danger clustering.
    #[must_use]
    pub const fn default_severity(self) -> f64 {
        match self {
            Self::Harassment => 10.0,
            Self::Aggressive => 9.0,
            Self::Suspicious => 7.0,
            Self::Vandalism | Self::Insecurity | Self::Poorlight | Self::Unknown => 5.0,
            Self::Pickpocket | Self::Passage => 2.0,
            Self::Protest | Self::Animal => 1.0,
        }
    }

    /// Default points deducted from a route's safety score per incident.
    #[must_use]
    pub const fn default_penalty(self) -> f64 {
        match self {
            Self::Harassment => 1.5,
            Self::Aggressive => 1.35,
            Self::Suspicious => 1.05,
            Self::Vandalism | Self::Insecurity | Self::Poorlight => 0.75,
            Self::Unknown => 0.5,
            Self::Pickpocket | Self::Passage => 0.3,
            Self::Protest | Self::Animal => 0.15,
        }
    }

    /// Map marker emoji for this type.
    #[must_use]
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Harassment => "😠",
            Self::Aggressive => "👊",
            Self::Pickpocket => "👜",
            Self::Suspicious => "👀",
            Self::Vandalism => "🔨",
            Self::Protest => "📢",
            Self::Insecurity | Self::Unknown => "⚠️",
            Self::Passage => "🚧",
            Self::Animal => "🐕",
            Self::Poorlight => "💡",
        }
    }

    /// Returns every reportable variant (excludes [`Self::Unknown`]).
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Harassment,
            Self::Aggressive,
            Self::Pickpocket,
            Self::Suspicious,
            Self::Vandalism,
            Self::Protest,
            Self::Insecurity,
            Self::Passage,
            Self::Animal,
            Self::Poorlight,
        ]
    }
}

/// A community-reported hazard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Unique incident ID.
    pub id: String,
    /// What was reported.
    #[serde(rename = "type")]
    pub incident_type: IncidentType,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// When the report was made.
    pub created_at: DateTime<Utc>,
}

impl Incident {
    /// Location as `[lng, lat]`.
    #[must_use]
    pub const fn location(&self) -> LngLat {
        LngLat::new(self.longitude, self.latitude)
    }
}

/// A police station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoliceStation {
    /// Station ID.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
}

impl PoliceStation {
    /// Location as `[lng, lat]`.
    #[must_use]
    pub const fn location(&self) -> LngLat {
        LngLat::new(self.longitude, self.latitude)
    }
}

/// Operating schedule of a street light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LightRegime {
    /// Lit around the clock.
    AlwaysOn,
    /// Lit only at night.
    NightOnly,
}

/// A single street light.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreetLight {
    /// Light ID.
    pub id: i64,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Operating schedule.
    pub regime: LightRegime,
}

impl StreetLight {
    /// Location as `[lng, lat]`.
    #[must_use]
    pub const fn location(&self) -> LngLat {
        LngLat::new(self.longitude, self.latitude)
    }
}

/// Raw street light counts along a route, before coverage is estimated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreetLightCounts {
    /// All lights within the buffer.
    pub total_lights: u32,
    /// Lights that are always on.
    pub lights_24h: u32,
    /// Lights that only run at night.
    pub lights_night_only: u32,
}

impl StreetLightCounts {
    /// Tallies a set of lights by regime.
    #[must_use]
    pub fn tally<'a>(lights: impl IntoIterator<Item = &'a StreetLight>) -> Self {
        lights
            .into_iter()
            .fold(Self::default(), |mut counts, light| {
                counts.total_lights += 1;
                match light.regime {
                    LightRegime::AlwaysOn => counts.lights_24h += 1,
                    LightRegime::NightOnly => counts.lights_night_only += 1,
                }
                counts
            })
    }
}

/// Street lighting along a route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightingData {
    /// All lights within the buffer.
    pub total_lights: u32,
    /// Lights that are always on.
    #[serde(rename = "lights24h")]
    pub lights_24h: u32,
    /// Lights that only run at night.
    pub lights_night_only: u32,
    /// Estimated share of the route that is lit (0-100).
    pub coverage_percentage: f64,
}

impl LightingData {
    /// Lighting data for a route with no known lights.
    #[must_use]
    pub const fn unlit() -> Self {
        Self {
            total_lights: 0,
            lights_24h: 0,
            lights_night_only: 0,
            coverage_percentage: 0.0,
        }
    }
}
