//! Route safety scoring.
//!
//! A route starts at the base score (10). Each nearby incident deducts its
//! type's penalty scaled by a time weight. Nearby police stations and
//! street lighting add capped bonuses. The result is clamped and rounded to
//! one decimal.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use streetwise_config::{PoliceConfig, SafetyConfig, ScoringConfig};
use streetwise_geometry::RouteGeometry;
use streetwise_hazard::{HazardError, HazardQuery};
use streetwise_hazard_models::{Incident, LightingData, PoliceStation};
use streetwise_routing_models::SafetyReport;
use tokio::time::error::Elapsed;

use crate::{SafetyError, clock::Clock};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Weight of an incident reported at `created_at`, as seen at `now`.
///
/// Incidents at most `recent_threshold_days` old (inclusive) count
/// `recent_incident_multiplier` times. Older ones decay exponentially down
/// to `min_time_weight`. Anything past `max_incident_age_days` weighs 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn time_weight(created_at: DateTime<Utc>, now: DateTime<Utc>, config: &ScoringConfig) -> f64 {
    let age_days = (now - created_at).num_milliseconds() as f64 / MILLIS_PER_DAY;

    if age_days > config.max_incident_age_days {
        0.0
    } else if age_days <= config.recent_threshold_days {
        config.recent_incident_multiplier
    } else {
        (-config.decay_rate * age_days)
            .exp()
            .max(config.min_time_weight)
    }
}

/// Bonus for `count` police stations near the route, capped.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn police_bonus(count: usize, config: &PoliceConfig) -> f64 {
    (count as f64 * config.bonus_per_station).min(config.max_bonus)
}

/// Bonus for lighting coverage (0-100 %), from 0 up to 2.
///
/// Piecewise linear: 0-30 % earns up to 0.5, 30-60 % up to 1.0, 60-80 % up
/// to 1.5 and 80-100 % up to 2.0.
#[must_use]
pub fn lighting_bonus(coverage_percentage: f64) -> f64 {
    let c = coverage_percentage.clamp(0.0, 100.0);

    if c <= 30.0 {
        c / 30.0 * 0.5
    } else if c <= 60.0 {
        0.5 + (c - 30.0) / 30.0 * 0.5
    } else if c <= 80.0 {
        1.0 + (c - 60.0) / 20.0 * 0.5
    } else {
        1.5 + (c - 80.0) / 20.0 * 0.5
    }
}

/// Rounds to one decimal place.
#[must_use]
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Builds a safety report from fetched hazard data.
///
/// Incidents with zero time weight are dropped from the report.
#[must_use]
pub fn compute_report(
    incidents: Vec<Incident>,
    police_stations: Vec<PoliceStation>,
    lighting_data: LightingData,
    now: DateTime<Utc>,
    config: &SafetyConfig,
) -> SafetyReport {
    let scoring = &config.scoring;

    let mut total_penalty = 0.0;
    let mut counted = Vec::with_capacity(incidents.len());
    for incident in incidents {
        let weight = time_weight(incident.created_at, now, scoring);
        if weight <= 0.0 {
            continue;
        }
        total_penalty += config.incidents.penalty(incident.incident_type) * weight;
        counted.push(incident);
    }

    let police_bonus = police_bonus(police_stations.len(), &config.police);
    let lighting_bonus = if lighting_data.total_lights > 0 {
        lighting_bonus(lighting_data.coverage_percentage)
    } else {
        0.0
    };

    let raw = scoring.base_safety_score - total_penalty + police_bonus + lighting_bonus;
    let safety_score = round_one_decimal(
        raw.max(scoring.min_safety_score)
            .min(scoring.max_safety_score),
    );

    SafetyReport {
        safety_score,
        incident_count: counted.len(),
        police_station_count: police_stations.len(),
        total_penalty,
        police_bonus,
        lighting_bonus,
        lighting_data,
        incidents: counted,
        police_stations,
    }
}

/// Scores routes against a hazard data source.
pub struct SafetyScorer {
    hazards: Arc<dyn HazardQuery>,
    clock: Arc<dyn Clock>,
    config: Arc<SafetyConfig>,
}

impl SafetyScorer {
    /// Creates a scorer.
    #[must_use]
    pub fn new(
        hazards: Arc<dyn HazardQuery>,
        clock: Arc<dyn Clock>,
        config: Arc<SafetyConfig>,
    ) -> Self {
        Self {
            hazards,
            clock,
            config,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &SafetyConfig {
        &self.config
    }

    /// Shared handle to the active configuration.
    #[must_use]
    pub fn config_handle(&self) -> Arc<SafetyConfig> {
        Arc::clone(&self.config)
    }

    /// Scores a route.
    ///
    /// The three hazard lookups run concurrently. Police station and
    /// lighting failures are logged and contribute no bonus.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError`] if incidents cannot be fetched.
    #[allow(clippy::cast_possible_truncation)]
    pub async fn score(&self, route: &RouteGeometry) -> Result<SafetyReport, SafetyError> {
        let now = self.clock.now();
        // Ages beyond what chrono can represent reach back to the start of time.
        let since = chrono::Duration::try_milliseconds(
            (self.config.scoring.max_incident_age_days * MILLIS_PER_DAY) as i64,
        )
        .and_then(|max_age| now.checked_sub_signed(max_age))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let timeout = self.config.timeouts.hazard_request();
        let buffers = &self.config.buffers;

        let (incidents, police_stations, lighting) = futures::join!(
            tokio::time::timeout(
                timeout,
                self.hazards
                    .incidents_near_route(route, buffers.incident_meters, since),
            ),
            tokio::time::timeout(
                timeout,
                self.hazards
                    .police_stations_near_route(route, buffers.police_station_meters),
            ),
            tokio::time::timeout(
                timeout,
                self.hazards
                    .street_lights_near_route(route, buffers.lighting_meters),
            ),
        );

        let incidents = incidents.map_err(|_| SafetyError::IncidentsTimeout(timeout))??;
        let police_stations = or_degraded(police_stations, "police stations", Vec::new);
        let lighting = or_degraded(lighting, "street lights", LightingData::unlit);

        let report = compute_report(incidents, police_stations, lighting, now, &self.config);

        log::debug!(
            "Route scored {}/10: {} incidents (penalty {:.2}), {} police stations (+{:.1}), {}% lit (+{:.2})",
            report.safety_score,
            report.incident_count,
            report.total_penalty,
            report.police_station_count,
            report.police_bonus,
            report.lighting_data.coverage_percentage,
            report.lighting_bonus,
        );

        Ok(report)
    }
}

/// Unwraps a secondary hazard lookup, logging and substituting `fallback`
/// on failure.
fn or_degraded<T>(
    result: Result<Result<T, HazardError>, Elapsed>,
    what: &str,
    fallback: impl FnOnce() -> T,
) -> T {
    match result {
        Ok(Ok(value)) => value,
        Ok(Err(e)) => {
            log::warn!("Error fetching {what}, scoring without them: {e}");
            fallback()
        }
        Err(_) => {
            log::warn!("Timed out fetching {what}, scoring without them");
            fallback()
        }
    }
}
