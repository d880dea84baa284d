//! Detour waypoint generation.
//!
//! For each danger cluster the planner probes the four compass directions,
//! picks the one with the fewest incidents, and tries waypoints at growing
//! distances from the cluster center in that direction. [`DetourWaypoints`]
//! yields those attempts in priority order under a global attempt budget.

use streetwise_config::DetourConfig;
use streetwise_geometry::{CompassDirection, LngLat};
use streetwise_hazard_models::Incident;
use streetwise_routing_models::DangerCluster;

/// Number of incidents inside the probe box on `direction`'s side of
/// `center`.
#[must_use]
pub fn count_incidents_in_direction(
    center: LngLat,
    direction: CompassDirection,
    incidents: &[Incident],
    config: &DetourConfig,
) -> usize {
    let probe = direction.probe_box(
        center,
        config.direction_check_box_width_meters,
        config.direction_check_box_length_meters,
    );
    incidents
        .iter()
        .filter(|incident| probe.contains(incident.location()))
        .count()
}

/// The direction around `center` with the fewest incidents.
///
/// Ties go to the earliest of north, south, east, west.
#[must_use]
pub fn safest_direction(
    center: LngLat,
    incidents: &[Incident],
    config: &DetourConfig,
) -> CompassDirection {
    CompassDirection::all()
        .iter()
        .copied()
        .min_by_key(|direction| count_incidents_in_direction(center, *direction, incidents, config))
        .unwrap_or(CompassDirection::North)
}

/// One detour routing attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetourAttempt {
    /// Position of the cluster being avoided in the cluster list.
    pub cluster_index: usize,
    /// Direction the waypoint is pushed in.
    pub direction: CompassDirection,
    /// Distance from the cluster center, in meters.
    pub offset_meters: f64,
    /// The waypoint to route through.
    pub waypoint: LngLat,
}

/// Detour attempts in priority order: clusters in the given order, and for
/// each cluster every configured offset nearest first.
///
/// Stops after `max_alternative_route_attempts` items in total.
#[derive(Debug, Clone)]
pub struct DetourWaypoints {
    targets: Vec<(LngLat, CompassDirection)>,
    offsets: Vec<f64>,
    cluster_index: usize,
    offset_index: usize,
    remaining: usize,
}

impl DetourWaypoints {
    /// Plans attempts around `clusters`.
    ///
    /// Each cluster's safest direction is computed once, against all
    /// `incidents` (not just the cluster's members).
    #[must_use]
    pub fn new(clusters: &[DangerCluster], incidents: &[Incident], config: &DetourConfig) -> Self {
        let targets = clusters
            .iter()
            .take(config.max_danger_clusters_to_avoid)
            .map(|cluster| {
                let direction = safest_direction(cluster.center, incidents, config);
                log::debug!(
                    "Cluster at [{}, {}] (severity {}): safest direction {direction}",
                    cluster.center.lng,
                    cluster.center.lat,
                    cluster.total_severity
                );
                (cluster.center, direction)
            })
            .collect();

        Self {
            targets,
            offsets: config.waypoint_offset_distances.clone(),
            cluster_index: 0,
            offset_index: 0,
            remaining: config.max_alternative_route_attempts,
        }
    }
}

impl Iterator for DetourWaypoints {
    type Item = DetourAttempt;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        while self.offset_index >= self.offsets.len() {
            if self.offsets.is_empty() || self.cluster_index >= self.targets.len() {
                return None;
            }
            self.cluster_index += 1;
            self.offset_index = 0;
        }

        let (center, direction) = *self.targets.get(self.cluster_index)?;
        let offset_meters = self.offsets[self.offset_index];

        self.offset_index += 1;
        self.remaining -= 1;

        Some(DetourAttempt {
            cluster_index: self.cluster_index,
            direction,
            offset_meters,
            waypoint: direction.project(center, offset_meters),
        })
    }
}
