#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tunable configuration for safety scoring and safer-route generation.
//!
//! The shipped defaults live in `config/safety.toml`, embedded at compile
//! time. Deployments can point the `STREETWISE_CONFIG` environment variable
//! at an override file; any key it leaves out keeps its default.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use streetwise_hazard_models::IncidentType;
use thiserror::Error;

/// Environment variable naming an override configuration file.
pub const CONFIG_ENV_VAR: &str = "STREETWISE_CONFIG";

const EMBEDDED_CONFIG: &str = include_str!("../config/safety.toml");

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The override file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The TOML could not be parsed into a [`SafetyConfig`].
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of its allowed range.
    #[error("Invalid config: {message}")]
    Invalid {
        /// Which value is wrong and why.
        message: String,
    },
}

/// All tunables consumed by the safety engine.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Score arithmetic and incident time weighting.
    pub scoring: ScoringConfig,
    /// Search buffers around a route.
    pub buffers: BufferConfig,
    /// Police station bonus.
    pub police: PoliceConfig,
    /// Street lighting coverage.
    pub lighting: LightingConfig,
    /// Per-type severity and penalty tables.
    pub incidents: IncidentWeights,
    /// Safer-route search.
    pub detour: DetourConfig,
    /// Per-call timeouts for external services.
    pub timeouts: TimeoutConfig,
}

/// Score arithmetic and incident time weighting.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Score every route starts from.
    pub base_safety_score: f64,
    /// Lower clamp for final scores.
    pub min_safety_score: f64,
    /// Upper clamp for final scores.
    pub max_safety_score: f64,
    /// Incidents older than this carry no weight.
    pub max_incident_age_days: f64,
    /// Incidents at most this old get the recent multiplier.
    pub recent_threshold_days: f64,
    /// Weight applied to recent incidents.
    pub recent_incident_multiplier: f64,
    /// Exponential decay rate per day for older incidents.
    pub decay_rate: f64,
    /// Floor for the decayed weight.
    pub min_time_weight: f64,
    /// Score assigned to a fastest route that could not be scored.
    pub fallback_safety_score: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_safety_score: 10.0,
            min_safety_score: 0.0,
            max_safety_score: 10.0,
            max_incident_age_days: 30.0,
            recent_threshold_days: 7.0,
            recent_incident_multiplier: 1.5,
            decay_rate: 0.05,
            min_time_weight: 0.3,
            fallback_safety_score: 8.0,
        }
    }
}

/// Search buffers around a route, in meters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Incidents within this distance count against the route.
    pub incident_meters: f64,
    /// Police stations within this distance add a bonus.
    pub police_station_meters: f64,
    /// Street lights within this distance count towards coverage.
    pub lighting_meters: f64,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            incident_meters: 100.0,
            police_station_meters: 300.0,
            lighting_meters: 30.0,
        }
    }
}

/// Police station bonus.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PoliceConfig {
    /// Bonus per station near the route.
    pub bonus_per_station: f64,
    /// Cap on the total police bonus.
    pub max_bonus: f64,
}

impl Default for PoliceConfig {
    fn default() -> Self {
        Self {
            bonus_per_station: 0.3,
            max_bonus: 3.0,
        }
    }
}

/// Street lighting coverage estimation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Expected spacing between lights on a fully lit street, in meters.
    pub meters_per_light: f64,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            meters_per_light: 25.0,
        }
    }
}

/// Per-type severity and penalty tables, keyed by type name.
///
/// Types absent from a table use [`IncidentType::default_severity`] or
/// [`IncidentType::default_penalty`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IncidentWeights {
    /// Severity used for danger clustering.
    pub severity: BTreeMap<String, f64>,
    /// Points deducted from the safety score.
    pub penalty: BTreeMap<String, f64>,
}

impl IncidentWeights {
    /// Severity of an incident type.
    #[must_use]
    pub fn severity(&self, incident_type: IncidentType) -> f64 {
        self.severity
            .get(incident_type.as_ref())
            .copied()
            .unwrap_or_else(|| incident_type.default_severity())
    }

    /// Score penalty of an incident type, before time weighting.
    #[must_use]
    pub fn penalty(&self, incident_type: IncidentType) -> f64 {
        self.penalty
            .get(incident_type.as_ref())
            .copied()
            .unwrap_or_else(|| incident_type.default_penalty())
    }
}

impl Default for IncidentWeights {
    fn default() -> Self {
        let table = |value: fn(IncidentType) -> f64| -> BTreeMap<String, f64> {
            IncidentType::all()
                .iter()
                .map(|t| (t.as_ref().to_string(), value(*t)))
                .collect()
        };

        Self {
            severity: table(IncidentType::default_severity),
            penalty: table(IncidentType::default_penalty),
        }
    }
}

/// Safer-route search.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DetourConfig {
    /// Offsets tried from each cluster, nearest first.
    pub waypoint_offset_distances: Vec<f64>,
    /// Longest acceptable detour relative to the fastest route, in percent.
    pub max_detour_percentage: f64,
    /// Incidents within this radius of a cluster seed join its cluster.
    pub danger_cluster_radius_meters: f64,
    /// Number of clusters a detour is attempted around.
    pub max_danger_clusters_to_avoid: usize,
    /// East-west size of the direction probe rectangle.
    pub direction_check_box_width_meters: f64,
    /// North-south size of the direction probe rectangle.
    pub direction_check_box_length_meters: f64,
    /// Routing requests spent on detours across all clusters.
    pub max_alternative_route_attempts: usize,
    /// How far below the fastest route's score a detour may be.
    pub safety_tolerance: f64,
    /// Provider-supplied alternatives scored per request.
    pub max_native_alternatives: usize,
    /// Stop searching once a detour reaches this score.
    pub good_enough_score: Option<f64>,
}

impl Default for DetourConfig {
    fn default() -> Self {
        Self {
            waypoint_offset_distances: vec![50.0, 150.0, 500.0, 1500.0],
            max_detour_percentage: 90.0,
            danger_cluster_radius_meters: 50.0,
            max_danger_clusters_to_avoid: 2,
            direction_check_box_width_meters: 100.0,
            direction_check_box_length_meters: 100.0,
            max_alternative_route_attempts: 5,
            safety_tolerance: 0.3,
            max_native_alternatives: 2,
            good_enough_score: None,
        }
    }
}

/// Per-call timeouts for external services, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Routing provider requests.
    pub routing_request_secs: u64,
    /// Hazard data requests.
    pub hazard_request_secs: u64,
}

impl TimeoutConfig {
    /// Routing provider timeout.
    #[must_use]
    pub const fn routing_request(&self) -> Duration {
        Duration::from_secs(self.routing_request_secs)
    }

    /// Hazard data timeout.
    #[must_use]
    pub const fn hazard_request(&self) -> Duration {
        Duration::from_secs(self.hazard_request_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            routing_request_secs: 15,
            hazard_request_secs: 10,
        }
    }
}

impl SafetyConfig {
    /// Parses and validates a configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the TOML is malformed or a value is out of
    /// range.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::de::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or is invalid.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// The shipped defaults from `config/safety.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the embedded file is invalid.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_toml_str(EMBEDDED_CONFIG)
    }

    /// Loads the file named by [`CONFIG_ENV_VAR`], or the embedded defaults
    /// when it is unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the chosen configuration cannot be loaded.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => {
                log::info!("Loading safety config from {path}");
                Self::from_file(Path::new(&path))
            }
            _ => {
                log::info!("Using embedded safety config");
                Self::embedded()
            }
        }
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.scoring;
        ensure(
            s.min_safety_score <= s.max_safety_score,
            "scoring.min_safety_score must not exceed scoring.max_safety_score",
        )?;
        ensure(
            s.recent_threshold_days <= s.max_incident_age_days,
            "scoring.recent_threshold_days must not exceed scoring.max_incident_age_days",
        )?;
        ensure(
            s.max_incident_age_days >= 0.0 && s.decay_rate >= 0.0 && s.min_time_weight >= 0.0,
            "scoring ages, decay_rate and min_time_weight must be non-negative",
        )?;

        let b = &self.buffers;
        ensure(
            b.incident_meters >= 0.0 && b.police_station_meters >= 0.0 && b.lighting_meters >= 0.0,
            "buffers must be non-negative",
        )?;

        ensure(
            self.police.bonus_per_station >= 0.0 && self.police.max_bonus >= 0.0,
            "police bonuses must be non-negative",
        )?;
        ensure(
            self.lighting.meters_per_light > 0.0,
            "lighting.meters_per_light must be positive",
        )?;

        for (name, table) in [
            ("severity", &self.incidents.severity),
            ("penalty", &self.incidents.penalty),
        ] {
            if let Some(key) = table
                .keys()
                .find(|key| key.parse::<IncidentType>().is_err())
            {
                return Err(ConfigError::Invalid {
                    message: format!("incidents.{name} has unknown incident type '{key}'"),
                });
            }
        }

        let d = &self.detour;
        ensure(
            d.waypoint_offset_distances.iter().all(|m| *m > 0.0),
            "detour.waypoint_offset_distances must all be positive",
        )?;
        ensure(
            d.max_detour_percentage >= 0.0,
            "detour.max_detour_percentage must be non-negative",
        )?;
        ensure(
            d.danger_cluster_radius_meters >= 0.0,
            "detour.danger_cluster_radius_meters must be non-negative",
        )?;
        ensure(
            d.direction_check_box_width_meters > 0.0 && d.direction_check_box_length_meters > 0.0,
            "detour direction check box sizes must be positive",
        )?;
        ensure(
            d.safety_tolerance >= 0.0,
            "detour.safety_tolerance must be non-negative",
        )?;

        Ok(())
    }
}

fn ensure(condition: bool, message: &str) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            message: message.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_config_matches_defaults() {
        assert_eq!(SafetyConfig::embedded().unwrap(), SafetyConfig::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = SafetyConfig::from_toml_str(
            "[detour]\nmax_detour_percentage = 50.0\n\n[incidents.penalty]\nharassment = 2.0\n",
        )
        .unwrap();

        assert!((config.detour.max_detour_percentage - 50.0).abs() < f64::EPSILON);
        assert_eq!(config.detour.max_alternative_route_attempts, 5);
        assert_eq!(config.scoring, ScoringConfig::default());
        assert!((config.incidents.penalty(IncidentType::Harassment) - 2.0).abs() < f64::EPSILON);
        // Types left out of an overridden table fall back to built-in values.
        assert!((config.incidents.penalty(IncidentType::Pickpocket) - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_type_falls_back_to_builtin_weights() {
        let weights = IncidentWeights::default();
        assert!((weights.severity(IncidentType::Unknown) - 5.0).abs() < f64::EPSILON);
        assert!((weights.penalty(IncidentType::Unknown) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_inverted_score_bounds() {
        let err = SafetyConfig::from_toml_str(
            "[scoring]\nmin_safety_score = 5.0\nmax_safety_score = 4.0\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn cluster_radius_may_be_zero_but_not_negative() {
        assert!(SafetyConfig::from_toml_str("[detour]\ndanger_cluster_radius_meters = 0.0\n").is_ok());

        let err = SafetyConfig::from_toml_str("[detour]\ndanger_cluster_radius_meters = -1.0\n")
            .unwrap_err();
        assert!(err.to_string().contains("non-negative"));
    }

    #[test]
    fn rejects_unknown_incident_type_keys() {
        let err = SafetyConfig::from_toml_str("[incidents.severity]\nflooding = 3.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            SafetyConfig::from_toml_str("[detour\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn timeouts_convert_to_durations() {
        let timeouts = TimeoutConfig::default();
        assert_eq!(timeouts.routing_request(), Duration::from_secs(15));
        assert_eq!(timeouts.hazard_request(), Duration::from_secs(10));
    }
}
