//! `PostgREST` RPC backend.
//!
//! The spatial work happens in `PostGIS` functions exposed by a Supabase
//! project. Every call is a `POST {base_url}/rest/v1/rpc/{function}` with a
//! JSON argument object and the service key in both the `apikey` and
//! `Authorization` headers.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::json;
use streetwise_config::LightingConfig;
use streetwise_geometry::{LngLat, RouteGeometry};
use streetwise_hazard_models::{Incident, LightingData, PoliceStation, StreetLightCounts};

use crate::{HazardError, HazardQuery, coverage, retry};

/// Environment variable holding the Supabase project URL.
pub const URL_ENV_VAR: &str = "SUPABASE_URL";

/// Environment variable holding the Supabase service key.
pub const KEY_ENV_VAR: &str = "SUPABASE_SERVICE_KEY";

/// `PostgREST` error code for "function not found in the schema cache".
const FUNCTION_NOT_FOUND: &str = "PGRST202";

/// Hazard lookups through Supabase RPC functions.
pub struct RpcHazardQuery {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    lighting: LightingConfig,
}

impl RpcHazardQuery {
    /// Creates a client for the project at `base_url`.
    ///
    /// `timeout` bounds a whole lookup, retries included. Each attempt gets
    /// a share of it.
    ///
    /// # Errors
    ///
    /// Returns [`HazardError::Http`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        lighting: LightingConfig,
    ) -> Result<Self, HazardError> {
        let client = reqwest::Client::builder()
            .timeout(retry::attempt_timeout(timeout))
            .user_agent(concat!("streetwise/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            lighting,
        })
    }

    /// Creates a client from [`URL_ENV_VAR`] and [`KEY_ENV_VAR`].
    ///
    /// Returns `Ok(None)` when either variable is unset.
    ///
    /// # Errors
    ///
    /// Returns [`HazardError::Http`] if the HTTP client cannot be built.
    pub fn from_env(timeout: Duration, lighting: LightingConfig) -> Result<Option<Self>, HazardError> {
        let (Ok(url), Ok(key)) = (std::env::var(URL_ENV_VAR), std::env::var(KEY_ENV_VAR)) else {
            return Ok(None);
        };
        Self::new(url, key, timeout, lighting).map(Some)
    }

    fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{function}", self.base_url)
    }

    async fn call(
        &self,
        function: &str,
        params: &serde_json::Value,
    ) -> Result<serde_json::Value, HazardError> {
        let url = self.rpc_url(function);
        log::debug!("RPC {function}");

        retry::send_json(|| {
            self.client
                .post(&url)
                .header("apikey", &self.api_key)
                .bearer_auth(&self.api_key)
                .json(params)
        })
        .await
    }
}

#[derive(Debug, Default, Deserialize)]
struct LightCountsRow {
    total_lights: Option<u32>,
    lights_24h: Option<u32>,
    lights_night_only: Option<u32>,
}

impl From<LightCountsRow> for StreetLightCounts {
    fn from(row: LightCountsRow) -> Self {
        Self {
            total_lights: row.total_lights.unwrap_or(0),
            lights_24h: row.lights_24h.unwrap_or(0),
            lights_night_only: row.lights_night_only.unwrap_or(0),
        }
    }
}

/// Single-row RPCs may answer with an object or a one-element array.
fn first_row(value: serde_json::Value) -> Option<serde_json::Value> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::Array(rows) => rows.into_iter().next(),
        other => Some(other),
    }
}

fn is_missing_function(error: &HazardError) -> bool {
    matches!(error, HazardError::Status { body, .. } if body.contains(FUNCTION_NOT_FOUND))
}

#[async_trait]
impl HazardQuery for RpcHazardQuery {
    async fn incidents_near_route(
        &self,
        route: &RouteGeometry,
        buffer_meters: f64,
        since: DateTime<Utc>,
    ) -> Result<Vec<Incident>, HazardError> {
        let params = json!({
            "route_geojson": route.to_geojson(),
            "buffer_meters": buffer_meters,
            "since": since.to_rfc3339_opts(SecondsFormat::Secs, true),
        });
        let body = self.call("incidents_near_route", &params).await?;
        let incidents: Vec<Incident> = serde_json::from_value(body)?;

        log::debug!("Found {} incidents near route", incidents.len());
        Ok(incidents)
    }

    async fn police_stations_near_route(
        &self,
        route: &RouteGeometry,
        buffer_meters: f64,
    ) -> Result<Vec<PoliceStation>, HazardError> {
        let params = json!({
            "route_geojson": route.to_geojson(),
            "buffer_meters": buffer_meters,
        });
        let body = self.call("police_stations_near_route", &params).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn street_lights_near_route(
        &self,
        route: &RouteGeometry,
        buffer_meters: f64,
    ) -> Result<LightingData, HazardError> {
        let params = json!({
            "route_geojson": route.to_geojson(),
            "buffer_meters": buffer_meters,
        });

        let body = match self.call("count_lights_along_route", &params).await {
            Ok(body) => body,
            Err(e) if is_missing_function(&e) => {
                log::debug!("Street light data not available: {e}");
                return Ok(LightingData::unlit());
            }
            Err(e) => return Err(e),
        };

        let row = match first_row(body) {
            Some(row) => serde_json::from_value::<LightCountsRow>(row)?,
            None => LightCountsRow::default(),
        };

        Ok(coverage::lighting_along_route(
            row.into(),
            route,
            &self.lighting,
        ))
    }

    async fn nearest_police_station(
        &self,
        point: LngLat,
    ) -> Result<Option<PoliceStation>, HazardError> {
        let params = json!({
            "user_lat": point.lat,
            "user_lng": point.lng,
        });
        let body = self.call("get_nearest_police_station", &params).await?;

        first_row(body)
            .map(serde_json::from_value)
            .transpose()
            .map_err(HazardError::from)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
    use streetwise_hazard_models::IncidentType;

    use super::*;

    const API_KEY: &str = "service-key";

    /// Stand-in for the `PostgREST` API, counting calls per function.
    #[derive(Default)]
    struct Backend {
        calls: Mutex<HashMap<String, usize>>,
    }

    impl Backend {
        fn calls(&self, function: &str) -> usize {
            self.calls.lock().unwrap().get(function).copied().unwrap_or(0)
        }
    }

    async fn rpc(
        function: web::Path<String>,
        req: HttpRequest,
        backend: web::Data<Backend>,
    ) -> HttpResponse {
        let authorized = req
            .headers()
            .get("apikey")
            .is_some_and(|key| key == API_KEY);
        if !authorized {
            return HttpResponse::Unauthorized().finish();
        }

        let function = function.into_inner();
        let call = {
            let mut calls = backend.calls.lock().unwrap();
            let count = calls.entry(function.clone()).or_default();
            *count += 1;
            *count
        };

        match function.as_str() {
            "incidents_near_route" if call == 1 => {
                HttpResponse::ServiceUnavailable().body("upstream restarting")
            }
            "incidents_near_route" => HttpResponse::Ok().json(json!([{
                "id": "i-1",
                "type": "pickpocket",
                "latitude": 48.855,
                "longitude": 2.35,
                "created_at": "2025-06-01T12:00:00Z",
            }])),
            "police_stations_near_route" => HttpResponse::BadRequest()
                .json(json!({"code": "22P02", "message": "invalid input syntax"})),
            "count_lights_along_route" => HttpResponse::NotFound()
                .json(json!({"code": "PGRST202", "message": "Could not find the function"})),
            "get_nearest_police_station" => {
                if call == 1 {
                    actix_web::rt::time::sleep(Duration::from_secs(2)).await;
                }
                HttpResponse::Ok().json(json!([{
                    "id": 3,
                    "name": "Commissariat",
                    "latitude": 48.85,
                    "longitude": 2.34,
                }]))
            }
            _ => HttpResponse::NotFound().finish(),
        }
    }

    async fn serve(backend: web::Data<Backend>) -> String {
        let data = backend.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .route("/rest/v1/rpc/{function}", web::post().to(rpc))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());
        format!("http://{addr}")
    }

    fn query(base_url: &str, budget: Duration) -> RpcHazardQuery {
        RpcHazardQuery::new(base_url, API_KEY, budget, LightingConfig::default()).unwrap()
    }

    fn route() -> RouteGeometry {
        RouteGeometry::new(vec![LngLat::new(2.35, 48.85), LngLat::new(2.35, 48.86)]).unwrap()
    }

    fn since() -> DateTime<Utc> {
        "2025-05-01T00:00:00Z".parse().unwrap()
    }

    #[actix_web::test]
    async fn server_errors_are_retried() {
        let backend = web::Data::new(Backend::default());
        let query = query(&serve(backend.clone()).await, Duration::from_secs(5));

        let incidents = query
            .incidents_near_route(&route(), 100.0, since())
            .await
            .unwrap();

        assert_eq!(backend.calls("incidents_near_route"), 2);
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].incident_type, IncidentType::Pickpocket);
    }

    #[actix_web::test]
    async fn client_errors_return_the_body_without_retrying() {
        let backend = web::Data::new(Backend::default());
        let query = query(&serve(backend.clone()).await, Duration::from_secs(5));

        let result = query.police_stations_near_route(&route(), 200.0).await;

        assert_eq!(backend.calls("police_stations_near_route"), 1);
        match result {
            Err(HazardError::Status { status, body }) => {
                assert_eq!(status, 400);
                assert!(body.contains("22P02"));
            }
            other => panic!("expected a status error, got {other:?}"),
        }
    }

    #[actix_web::test]
    async fn missing_light_function_reads_as_unlit() {
        let backend = web::Data::new(Backend::default());
        let query = query(&serve(backend.clone()).await, Duration::from_secs(5));

        let lighting = query.street_lights_near_route(&route(), 30.0).await.unwrap();

        assert_eq!(lighting, LightingData::unlit());
        assert_eq!(backend.calls("count_lights_along_route"), 1);
    }

    #[actix_web::test]
    async fn slow_attempt_is_retried_within_the_budget() {
        let backend = web::Data::new(Backend::default());
        let budget = Duration::from_millis(1800);
        let query = query(&serve(backend.clone()).await, budget);

        let station = tokio::time::timeout(
            budget,
            query.nearest_police_station(LngLat::new(2.35, 48.85)),
        )
        .await
        .expect("lookup should finish within its budget")
        .unwrap()
        .unwrap();

        assert_eq!(station.id, 3);
        assert_eq!(backend.calls("get_nearest_police_station"), 2);
    }

    #[actix_web::test]
    async fn connection_failures_exhaust_the_retries() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let query = query(&format!("http://{addr}"), Duration::from_secs(5));
        let result = query.police_stations_near_route(&route(), 200.0).await;

        assert!(matches!(result, Err(HazardError::Http(e)) if e.is_connect()));
    }

    #[test]
    fn first_row_accepts_object_or_array() {
        assert_eq!(first_row(json!({"a": 1})), Some(json!({"a": 1})));
        assert_eq!(first_row(json!([{"a": 1}, {"a": 2}])), Some(json!({"a": 1})));
        assert_eq!(first_row(json!([])), None);
        assert_eq!(first_row(serde_json::Value::Null), None);
    }

    #[test]
    fn null_counts_read_as_zero() {
        let row: LightCountsRow = serde_json::from_value(json!({
            "total_lights": 4,
            "lights_24h": null,
        }))
        .unwrap();
        let counts = StreetLightCounts::from(row);
        assert_eq!(counts.total_lights, 4);
        assert_eq!(counts.lights_24h, 0);
        assert_eq!(counts.lights_night_only, 0);
    }

    #[test]
    fn detects_missing_function_error() {
        let missing = HazardError::Status {
            status: 404,
            body: r#"{"code":"PGRST202","message":"Could not find the function"}"#.to_string(),
        };
        let other = HazardError::Status {
            status: 400,
            body: r#"{"code":"22P02"}"#.to_string(),
        };
        assert!(is_missing_function(&missing));
        assert!(!is_missing_function(&other));
    }

    #[test]
    fn rpc_url_strips_trailing_slash() {
        let query = RpcHazardQuery::new(
            "https://example.supabase.co/",
            "key",
            Duration::from_secs(5),
            LightingConfig::default(),
        )
        .unwrap();
        assert_eq!(
            query.rpc_url("count_lights_along_route"),
            "https://example.supabase.co/rest/v1/rpc/count_lights_along_route"
        );
    }
}
