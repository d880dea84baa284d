//! Route planning: fastest route plus the safest acceptable alternative.
//!
//! The result always starts with the provider's fastest route. A second
//! entry, when present, is either a scored provider alternative or the
//! safest detour found around the fastest route's danger clusters.

use std::sync::Arc;

use streetwise_config::SafetyConfig;
use streetwise_geometry::LngLat;
use streetwise_hazard_models::Incident;
use streetwise_routing::{RoutingError, RoutingProvider};
use streetwise_routing_models::{ProviderResponse, RouteCandidate, RouteKind, RouteRequest};
use tokio::time::error::Elapsed;

use crate::{
    PlanError,
    cluster::find_danger_clusters,
    detour::DetourWaypoints,
    progress::RouteProgress,
    ranking::{detour_percentage, meets_safety_tolerance, select_safest, within_detour_limit},
    scoring::SafetyScorer,
};

/// Plans walking routes and looks for safer alternatives.
pub struct RoutePlanner {
    router: Arc<dyn RoutingProvider>,
    scorer: Arc<SafetyScorer>,
    config: Arc<SafetyConfig>,
}

impl RoutePlanner {
    /// Creates a planner using `scorer`'s configuration.
    #[must_use]
    pub fn new(router: Arc<dyn RoutingProvider>, scorer: Arc<SafetyScorer>) -> Self {
        let config = scorer.config_handle();
        Self {
            router,
            scorer,
            config,
        }
    }

    /// Computes the fastest route from `start` to `end` and, when one can be
    /// found, a safer alternative.
    ///
    /// Returns an empty list when the provider finds no route.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] if the coordinates are invalid or the provider
    /// fails on the fastest route.
    pub async fn calculate_routes(
        &self,
        start: LngLat,
        end: LngLat,
        progress: &dyn RouteProgress,
    ) -> Result<Vec<RouteCandidate>, PlanError> {
        if !start.is_valid() || !end.is_valid() {
            return Err(PlanError::InvalidCoordinates { start, end });
        }

        progress.set_message("Finding fastest route...");

        let request = RouteRequest::new(start, end).with_alternatives(true);
        let response = self
            .request_route(&request)
            .await
            .map_err(|_| PlanError::PrimaryRouteTimeout(self.config.timeouts.routing_request()))??;

        let mut provider_routes = response.routes.into_iter();
        let Some(primary_route) = provider_routes.next() else {
            log::warn!("No routes found from {start:?} to {end:?}");
            return Ok(vec![]);
        };

        let primary_report = match self.scorer.score(&primary_route.geometry).await {
            Ok(report) => Some(report),
            Err(e) => {
                log::warn!(
                    "Could not score fastest route, using fallback score {}: {e}",
                    self.config.scoring.fallback_safety_score
                );
                None
            }
        };

        let primary = match &primary_report {
            Some(report) => RouteCandidate::scored(primary_route, report, RouteKind::Fastest),
            None => RouteCandidate::unscored(
                primary_route,
                self.config.scoring.fallback_safety_score,
                RouteKind::Fastest,
            ),
        };

        log::info!(
            "Primary route (fastest): {}/10 safety, {} incidents, {}% lit",
            primary.safety_score,
            primary.incident_count,
            primary.lighting_percentage
        );

        progress.set_message("Analyzing safety and finding safer alternatives...");

        let mut routes = vec![primary];

        for alternative in provider_routes.take(self.config.detour.max_native_alternatives) {
            match self.scorer.score(&alternative.geometry).await {
                Ok(report) => routes.push(RouteCandidate::scored(
                    alternative,
                    &report,
                    RouteKind::Alternative,
                )),
                Err(e) => log::warn!("Skipping alternative route: {e}"),
            }
        }

        if routes.len() == 1 {
            let incidents = primary_report.map(|r| r.incidents).unwrap_or_default();
            let detour = self
                .find_safer_detour(start, end, &routes[0], &incidents, progress)
                .await;
            routes.extend(detour);
        }

        for (i, route) in routes.iter().enumerate() {
            log::info!(
                "Route {} ({}): {}/10 safety, {:.2}km, {:.0}min",
                i + 1,
                route.kind,
                route.safety_score,
                route.distance / 1000.0,
                (route.duration / 60.0).ceil()
            );
        }

        Ok(routes)
    }

    async fn request_route(
        &self,
        request: &RouteRequest,
    ) -> Result<Result<ProviderResponse, RoutingError>, Elapsed> {
        tokio::time::timeout(
            self.config.timeouts.routing_request(),
            self.router.route(request),
        )
        .await
    }

    /// Routes through waypoints pushed away from danger clusters and
    /// returns the safest acceptable result.
    async fn find_safer_detour(
        &self,
        start: LngLat,
        end: LngLat,
        primary: &RouteCandidate,
        incidents: &[Incident],
        progress: &dyn RouteProgress,
    ) -> Option<RouteCandidate> {
        progress.set_message("Checking for danger zones to avoid...");

        if incidents.is_empty() {
            log::info!("No incidents found, no need for an alternative");
            return None;
        }

        let clusters = find_danger_clusters(incidents, &self.config);
        if clusters.is_empty() {
            log::info!("No danger clusters identified");
            return None;
        }

        log::info!("Found {} danger clusters to avoid", clusters.len());
        progress.set_message("Calculating safest route...");

        let detour_config = &self.config.detour;
        let mut accepted = Vec::new();

        for attempt in DetourWaypoints::new(&clusters, incidents, detour_config) {
            log::debug!(
                "Detour attempt: cluster {}, {} {}m",
                attempt.cluster_index,
                attempt.direction,
                attempt.offset_meters
            );

            let request = RouteRequest::new(start, end).with_waypoint(attempt.waypoint);
            let route = match self.request_route(&request).await {
                Ok(Ok(response)) => match response.routes.into_iter().next() {
                    Some(route) => route,
                    None => {
                        log::debug!("No route through waypoint");
                        continue;
                    }
                },
                Ok(Err(e)) => {
                    log::warn!("Error fetching waypoint route: {e}");
                    continue;
                }
                Err(_) => {
                    log::warn!("Waypoint route request timed out");
                    continue;
                }
            };

            let detour = detour_percentage(route.distance, primary.distance);
            if !within_detour_limit(detour, detour_config) {
                log::debug!("Detour too long ({detour:.1}%)");
                continue;
            }

            let report = match self.scorer.score(&route.geometry).await {
                Ok(report) => report,
                Err(e) => {
                    log::warn!("Could not score detour: {e}");
                    continue;
                }
            };

            if !meets_safety_tolerance(report.safety_score, primary.safety_score, detour_config) {
                log::debug!(
                    "Detour less safe ({} vs {})",
                    report.safety_score,
                    primary.safety_score
                );
                continue;
            }

            let candidate = RouteCandidate::scored(route, &report, RouteKind::SaferDetour);
            let good_enough = detour_config
                .good_enough_score
                .is_some_and(|target| candidate.safety_score >= target);
            accepted.push(candidate);

            if good_enough {
                log::info!("Detour reached the good-enough score, stopping search");
                break;
            }
        }

        if accepted.is_empty() {
            log::info!("No safer alternatives found");
            return None;
        }

        progress.set_message("Selecting the safest route...");
        select_safest(accepted)
    }
}
