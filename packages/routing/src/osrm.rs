//! OSRM-compatible routing client.
//!
//! Requests `GET {base}/route/v1/{profile}/{lng,lat;lng,lat;...}` with full
//! `GeoJSON` overview geometry and turn-by-turn steps. OSRM reports "no route"
//! as an error code rather than an empty list; that case is mapped to an
//! empty [`ProviderResponse`].
//!
//! See <https://project-osrm.org/docs/v5.24.0/api/#route-service>

use std::time::Duration;

use async_trait::async_trait;
use streetwise_geometry::{LngLat, RouteGeometry};
use streetwise_routing_models::{
    Maneuver, NavigationStep, ProviderResponse, ProviderRoute, RouteLeg, RouteRequest,
};

use crate::{RoutingError, RoutingProvider};

/// Environment variable holding the OSRM base URL.
pub const BASE_URL_ENV_VAR: &str = "OSRM_BASE_URL";

/// Environment variable holding the OSRM profile name.
pub const PROFILE_ENV_VAR: &str = "OSRM_PROFILE";

/// Public OSRM demo server.
pub const DEFAULT_BASE_URL: &str = "https://router.project-osrm.org";

/// Walking profile name.
pub const DEFAULT_PROFILE: &str = "foot";

/// OSRM codes meaning "no route between these points".
const NO_ROUTE_CODES: &[&str] = &["NoRoute", "NoSegment"];

/// Client for an OSRM-compatible routing server.
pub struct OsrmProvider {
    client: reqwest::Client,
    base_url: String,
    profile: String,
}

impl OsrmProvider {
    /// Creates a client for the server at `base_url` using `profile`.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::Http`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        profile: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RoutingError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("streetwise/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            profile: profile.into(),
        })
    }

    /// Creates a client from [`BASE_URL_ENV_VAR`] and [`PROFILE_ENV_VAR`],
    /// falling back to the public demo server and the `foot` profile.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::Http`] if the HTTP client cannot be built.
    pub fn from_env(timeout: Duration) -> Result<Self, RoutingError> {
        let base_url =
            std::env::var(BASE_URL_ENV_VAR).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let profile =
            std::env::var(PROFILE_ENV_VAR).unwrap_or_else(|_| DEFAULT_PROFILE.to_string());
        log::info!("Using OSRM routing at {base_url} (profile {profile})");
        Self::new(base_url, profile, timeout)
    }

    /// Route service URL for a request, without the query string.
    #[must_use]
    pub fn route_url(&self, request: &RouteRequest) -> String {
        let coordinates = request
            .coordinates()
            .map(|c| format!("{},{}", c.lng, c.lat))
            .collect::<Vec<_>>()
            .join(";");
        format!("{}/route/v1/{}/{coordinates}", self.base_url, self.profile)
    }
}

#[async_trait]
impl RoutingProvider for OsrmProvider {
    fn name(&self) -> &'static str {
        "osrm"
    }

    async fn route(&self, request: &RouteRequest) -> Result<ProviderResponse, RoutingError> {
        let url = self.route_url(request);
        log::debug!("OSRM request: {url}");

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("alternatives", if request.alternatives { "true" } else { "false" }),
                ("geometries", "geojson"),
                ("overview", "full"),
                ("steps", "true"),
            ])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RoutingError::RateLimited);
        }

        let status = resp.status();
        let body: serde_json::Value = resp.json().await.map_err(|e| RoutingError::Parse {
            message: format!("OSRM response (HTTP {status}) is not JSON: {e}"),
        })?;

        parse_response(&body)
    }
}

/// Parses an OSRM route service response.
fn parse_response(body: &serde_json::Value) -> Result<ProviderResponse, RoutingError> {
    let code = body["code"].as_str().ok_or_else(|| RoutingError::Parse {
        message: "Missing code in OSRM response".to_string(),
    })?;

    if NO_ROUTE_CODES.contains(&code) {
        log::info!("OSRM found no route ({code})");
        return Ok(ProviderResponse::default());
    }

    if code != "Ok" {
        return Err(RoutingError::Provider {
            code: code.to_string(),
            message: body["message"].as_str().unwrap_or_default().to_string(),
        });
    }

    let routes = body["routes"].as_array().ok_or_else(|| RoutingError::Parse {
        message: "Missing routes in OSRM response".to_string(),
    })?;

    let routes = routes
        .iter()
        .map(parse_route)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ProviderResponse { routes })
}

fn parse_route(route: &serde_json::Value) -> Result<ProviderRoute, RoutingError> {
    let geometry = route
        .get("geometry")
        .cloned()
        .ok_or_else(|| RoutingError::Parse {
            message: "Missing geometry in OSRM route".to_string(),
        })?;
    let geometry: RouteGeometry =
        serde_json::from_value(geometry).map_err(|e| RoutingError::Parse {
            message: format!("Invalid OSRM route geometry: {e}"),
        })?;

    let legs = route["legs"]
        .as_array()
        .map(|legs| legs.iter().map(parse_leg).collect())
        .unwrap_or_default();

    Ok(ProviderRoute {
        geometry,
        distance: number(route, "distance")?,
        duration: number(route, "duration")?,
        legs,
    })
}

fn parse_leg(leg: &serde_json::Value) -> RouteLeg {
    RouteLeg {
        distance: leg["distance"].as_f64().unwrap_or(0.0),
        duration: leg["duration"].as_f64().unwrap_or(0.0),
        summary: leg["summary"].as_str().unwrap_or_default().to_string(),
        steps: leg["steps"]
            .as_array()
            .map(|steps| steps.iter().map(parse_step).collect())
            .unwrap_or_default(),
    }
}

fn parse_step(step: &serde_json::Value) -> NavigationStep {
    let name = step["name"].as_str().unwrap_or_default().to_string();
    let m = &step["maneuver"];
    let maneuver_type = m["type"].as_str().unwrap_or("continue").to_string();
    let modifier = m["modifier"].as_str().map(String::from);
    let instruction = instruction_text(&maneuver_type, modifier.as_deref(), &name);

    let location = m["location"].as_array().and_then(|pair| {
        Some(LngLat::new(pair.first()?.as_f64()?, pair.get(1)?.as_f64()?))
    });

    NavigationStep {
        instruction: instruction.clone(),
        distance: step["distance"].as_f64().unwrap_or(0.0),
        duration: step["duration"].as_f64().unwrap_or(0.0),
        maneuver: Maneuver {
            maneuver_type,
            modifier,
            instruction,
            bearing_before: m["bearing_before"].as_f64(),
            bearing_after: m["bearing_after"].as_f64(),
            location,
        },
        name,
    }
}

fn number(value: &serde_json::Value, key: &str) -> Result<f64, RoutingError> {
    value[key].as_f64().ok_or_else(|| RoutingError::Parse {
        message: format!("Missing {key} in OSRM route"),
    })
}

/// Builds a short English instruction, since OSRM only returns maneuver
/// codes.
fn instruction_text(maneuver_type: &str, modifier: Option<&str>, name: &str) -> String {
    let onto = if name.is_empty() {
        String::new()
    } else {
        format!(" onto {name}")
    };

    match (maneuver_type, modifier) {
        ("depart", _) if name.is_empty() => "Depart".to_string(),
        ("depart", _) => format!("Head along {name}"),
        ("arrive", _) => "Arrive at your destination".to_string(),
        ("roundabout" | "rotary", _) => format!("Enter the roundabout{onto}"),
        (_, Some("uturn")) => format!("Make a U-turn{onto}"),
        (_, Some(modifier)) => format!("Turn {modifier}{onto}"),
        (other, None) => {
            let mut text = other.replace('-', " ");
            if let Some(first) = text.get_mut(0..1) {
                first.make_ascii_uppercase();
            }
            format!("{text}{onto}")
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_response() -> serde_json::Value {
        json!({
            "code": "Ok",
            "routes": [
                {
                    "geometry": {
                        "type": "LineString",
                        "coordinates": [[2.35, 48.85], [2.351, 48.852], [2.352, 48.853]]
                    },
                    "distance": 412.3,
                    "duration": 296.8,
                    "legs": [{
                        "distance": 412.3,
                        "duration": 296.8,
                        "summary": "Rue de Rivoli",
                        "steps": [
                            {
                                "distance": 200.0,
                                "duration": 144.0,
                                "name": "Rue de Rivoli",
                                "maneuver": {
                                    "type": "depart",
                                    "location": [2.35, 48.85],
                                    "bearing_before": 0,
                                    "bearing_after": 32
                                }
                            },
                            {
                                "distance": 212.3,
                                "duration": 152.8,
                                "name": "Rue du Louvre",
                                "maneuver": {
                                    "type": "turn",
                                    "modifier": "left",
                                    "location": [2.351, 48.852]
                                }
                            }
                        ]
                    }]
                },
                {
                    "geometry": {
                        "type": "LineString",
                        "coordinates": [[2.35, 48.85], [2.353, 48.851], [2.352, 48.853]]
                    },
                    "distance": 530.0,
                    "duration": 381.0,
                    "legs": []
                }
            ]
        })
    }

    #[test]
    fn parses_routes_fastest_first() {
        let response = parse_response(&sample_response()).unwrap();
        assert_eq!(response.routes.len(), 2);

        let primary = &response.routes[0];
        assert!((primary.distance - 412.3).abs() < f64::EPSILON);
        assert_eq!(primary.geometry.coordinates().len(), 3);
        assert_eq!(primary.legs.len(), 1);
        assert_eq!(primary.legs[0].steps.len(), 2);
        assert!(response.routes[1].legs.is_empty());
    }

    #[test]
    fn parses_step_maneuvers() {
        let response = parse_response(&sample_response()).unwrap();
        let steps = &response.routes[0].legs[0].steps;

        assert_eq!(steps[0].instruction, "Head along Rue de Rivoli");
        assert_eq!(steps[0].maneuver.bearing_after, Some(32.0));
        assert_eq!(steps[0].maneuver.location, Some(LngLat::new(2.35, 48.85)));

        assert_eq!(steps[1].maneuver.maneuver_type, "turn");
        assert_eq!(steps[1].maneuver.modifier.as_deref(), Some("left"));
        assert_eq!(steps[1].instruction, "Turn left onto Rue du Louvre");
    }

    #[test]
    fn no_route_is_empty_response() {
        let response = parse_response(&json!({
            "code": "NoRoute",
            "message": "Impossible route between points"
        }))
        .unwrap();
        assert!(response.routes.is_empty());
    }

    #[test]
    fn error_code_is_provider_error() {
        let err = parse_response(&json!({
            "code": "InvalidQuery",
            "message": "Query string malformed"
        }))
        .unwrap_err();
        assert!(matches!(err, RoutingError::Provider { code, .. } if code == "InvalidQuery"));
    }

    #[test]
    fn missing_code_is_parse_error() {
        let err = parse_response(&json!({"routes": []})).unwrap_err();
        assert!(matches!(err, RoutingError::Parse { .. }));
    }

    #[test]
    fn degenerate_geometry_is_parse_error() {
        let err = parse_response(&json!({
            "code": "Ok",
            "routes": [{
                "geometry": {"type": "LineString", "coordinates": [[2.35, 48.85]]},
                "distance": 0.0,
                "duration": 0.0
            }]
        }))
        .unwrap_err();
        assert!(matches!(err, RoutingError::Parse { .. }));
    }

    #[test]
    fn route_url_lists_waypoints_in_order() {
        let provider =
            OsrmProvider::new("http://localhost:5000/", "foot", Duration::from_secs(5)).unwrap();
        let request = RouteRequest::new(LngLat::new(2.35, 48.85), LngLat::new(2.36, 48.86))
            .with_waypoint(LngLat::new(2.355, 48.851));
        assert_eq!(
            provider.route_url(&request),
            "http://localhost:5000/route/v1/foot/2.35,48.85;2.355,48.851;2.36,48.86"
        );
    }

    #[test]
    fn instruction_text_variants() {
        assert_eq!(instruction_text("depart", None, ""), "Depart");
        assert_eq!(instruction_text("arrive", Some("left"), "Main St"), "Arrive at your destination");
        assert_eq!(
            instruction_text("continue", Some("uturn"), "Main St"),
            "Make a U-turn onto Main St"
        );
        assert_eq!(instruction_text("new name", None, "Main St"), "New name onto Main St");
        assert_eq!(instruction_text("end-of-road", None, ""), "End of road");
    }
}
