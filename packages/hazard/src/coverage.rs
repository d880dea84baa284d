//! Street lighting coverage estimation.
//!
//! Coverage compares the number of lights found along a route with the
//! number a fully lit street of the same length would have (one light every
//! `meters_per_light`). The ratio is bent through a square-root curve so
//! that a handful of lights does not read as good coverage, and saturates
//! between 90 % and 100 % once the expected count is reached.

use streetwise_config::LightingConfig;
use streetwise_geometry::{RouteGeometry, flat_length_meters};
use streetwise_hazard_models::{LightingData, StreetLightCounts};

/// Estimated percentage (0-100) of a route that is lit.
#[must_use]
pub fn estimate_coverage(total_lights: u32, route_length_meters: f64, meters_per_light: f64) -> f64 {
    if total_lights == 0 {
        return 0.0;
    }

    let expected = (route_length_meters / meters_per_light).ceil().max(1.0);
    let raw = f64::from(total_lights) / expected * 100.0;

    if raw >= 100.0 {
        (90.0 + (raw - 100.0) / 10.0).min(100.0)
    } else {
        ((raw / 100.0).sqrt() * 100.0).round()
    }
}

/// Builds [`LightingData`] for a route from raw light counts.
#[must_use]
pub fn lighting_along_route(
    counts: StreetLightCounts,
    route: &RouteGeometry,
    config: &LightingConfig,
) -> LightingData {
    let length = flat_length_meters(route);
    let coverage_percentage =
        estimate_coverage(counts.total_lights, length, config.meters_per_light);

    log::debug!(
        "Route length {length:.0}m, {} lights, coverage {coverage_percentage}%",
        counts.total_lights
    );

    LightingData {
        total_lights: counts.total_lights,
        lights_24h: counts.lights_24h,
        lights_night_only: counts.lights_night_only,
        coverage_percentage,
    }
}
