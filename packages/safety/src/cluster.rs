//! Danger clustering.
//!
//! Single-pass greedy star clustering: incidents are visited from most to
//! least severe, each unassigned incident seeds a cluster, and every other
//! unassigned incident within the radius *of the seed* joins it. Members are
//! never compared with each other, so a chain of incidents 40 m apart does
//! not collapse into one cluster.

use streetwise_config::SafetyConfig;
use streetwise_geometry::haversine_distance;
use streetwise_hazard_models::Incident;
use streetwise_routing_models::DangerCluster;

/// Groups incidents into danger clusters, most severe first, keeping at
/// most `max_danger_clusters_to_avoid`.
///
/// Equal severities keep input order, both for incidents and clusters.
#[must_use]
pub fn find_danger_clusters(incidents: &[Incident], config: &SafetyConfig) -> Vec<DangerCluster> {
    let weights = &config.incidents;
    let radius = config.detour.danger_cluster_radius_meters;

    let mut ordered: Vec<(&Incident, f64)> = incidents
        .iter()
        .map(|incident| (incident, weights.severity(incident.incident_type)))
        .collect();
    ordered.sort_by(|(_, a), (_, b)| b.total_cmp(a));

    let mut assigned = vec![false; ordered.len()];
    let mut clusters = Vec::new();

    for seed_index in 0..ordered.len() {
        if assigned[seed_index] {
            continue;
        }
        assigned[seed_index] = true;

        let (seed, seed_severity) = ordered[seed_index];
        let center = seed.location();
        let mut members = vec![seed.clone()];
        let mut total_severity = seed_severity;

        // Every incident before the seed is already assigned.
        for other_index in seed_index + 1..ordered.len() {
            if assigned[other_index] {
                continue;
            }
            let (other, severity) = ordered[other_index];
            if haversine_distance(center, other.location()) <= radius {
                assigned[other_index] = true;
                members.push(other.clone());
                total_severity += severity;
            }
        }

        clusters.push(DangerCluster {
            center,
            incidents: members,
            total_severity,
        });
    }

    clusters.sort_by(|a, b| b.total_severity.total_cmp(&a.total_severity));
    clusters.truncate(config.detour.max_danger_clusters_to_avoid);
    clusters
}
