//! Filtering and ranking of detour candidates against the fastest route.

use streetwise_config::DetourConfig;
use streetwise_routing_models::RouteCandidate;

/// Slack for comparisons against limits that scores and distances often sit
/// exactly on after rounding.
const LIMIT_EPSILON: f64 = 1e-9;

/// How much longer a candidate is than the primary route, in percent.
///
/// A zero-length primary gives 0 for a zero-length candidate and infinity
/// otherwise.
#[must_use]
pub fn detour_percentage(candidate_distance: f64, primary_distance: f64) -> f64 {
    if primary_distance <= 0.0 {
        return if candidate_distance <= 0.0 {
            0.0
        } else {
            f64::INFINITY
        };
    }
    (candidate_distance - primary_distance) / primary_distance * 100.0
}

/// Whether a detour is short enough (inclusive limit).
#[must_use]
pub fn within_detour_limit(detour_percentage: f64, config: &DetourConfig) -> bool {
    detour_percentage <= config.max_detour_percentage + LIMIT_EPSILON
}

/// Whether a candidate is not meaningfully less safe than the primary.
#[must_use]
pub fn meets_safety_tolerance(candidate_score: f64, primary_score: f64, config: &DetourConfig) -> bool {
    candidate_score + LIMIT_EPSILON >= primary_score - config.safety_tolerance
}

/// The candidate with the highest safety score; ties keep the earliest.
#[must_use]
pub fn select_safest(candidates: Vec<RouteCandidate>) -> Option<RouteCandidate> {
    candidates.into_iter().reduce(|best, candidate| {
        if candidate.safety_score > best.safety_score {
            candidate
        } else {
            best
        }
    })
}

#[cfg(test)]
mod tests {
    use streetwise_routing_models::RouteKind;

    use super::*;
    use crate::testing::provider_route;

    fn candidate(score: f64, distance: f64) -> RouteCandidate {
        RouteCandidate::unscored(
            provider_route(&[[2.35, 48.85], [2.36, 48.86]], distance),
            score,
            RouteKind::SaferDetour,
        )
    }

    #[test]
    fn detour_percentage_relative_to_primary() {
        assert!((detour_percentage(1500.0, 1000.0) - 50.0).abs() < 1e-9);
        assert!((detour_percentage(900.0, 1000.0) + 10.0).abs() < 1e-9);
    }

    #[test]
    fn zero_length_primary() {
        assert!(detour_percentage(0.0, 0.0).abs() < f64::EPSILON);
        assert!(detour_percentage(10.0, 0.0).is_infinite());
    }

    #[test]
    fn detour_limit_is_inclusive() {
        let config = DetourConfig::default();
        assert!(within_detour_limit(90.0, &config));
        assert!(!within_detour_limit(90.01, &config));
        assert!(within_detour_limit(detour_percentage(1900.0, 1000.0), &config));
        assert!(!within_detour_limit(f64::INFINITY, &config));
    }

    #[test]
    fn safety_tolerance_allows_near_ties() {
        let config = DetourConfig::default();
        assert!(meets_safety_tolerance(6.7, 7.0, &config));
        assert!(meets_safety_tolerance(7.5, 7.0, &config));
        assert!(!meets_safety_tolerance(6.6, 7.0, &config));
    }

    #[test]
    fn limits_hold_for_values_exactly_on_the_boundary() {
        let config = DetourConfig::default();
        assert!(meets_safety_tolerance(7.1, 7.4, &config));
        assert!(meets_safety_tolerance(4.1, 4.4, &config));
        assert!(!meets_safety_tolerance(7.0, 7.4, &config));

        let percentage = detour_percentage(13.3, 7.0);
        assert!(within_detour_limit(percentage, &config));
        assert!(!within_detour_limit(detour_percentage(13.4, 7.0), &config));
    }

    #[test]
    fn selects_highest_score_earliest_on_ties() {
        let best = select_safest(vec![
            candidate(7.0, 1000.0),
            candidate(8.5, 1100.0),
            candidate(8.5, 1200.0),
            candidate(6.0, 900.0),
        ])
        .unwrap();
        assert!((best.safety_score - 8.5).abs() < f64::EPSILON);
        assert!((best.distance - 1100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn nothing_to_select_from() {
        assert!(select_safest(vec![]).is_none());
    }
}
