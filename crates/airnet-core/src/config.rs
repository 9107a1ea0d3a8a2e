// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// How routes sharing the same ordered airport pair are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParallelRoutePolicy {
    /// One edge per ordered pair carrying the first loaded route's attributes.
    #[default]
    KeepFirst,
    /// One edge per (pair, airline) so airline preferences can pick a variant.
    KeepAll,
}

/// What to do with a route that has no airline code when an airline
/// preference is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingAirlinePolicy {
    #[default]
    Exclude,
    Include,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransitModel {
    /// Uniform draw within the configured transit range.
    #[default]
    Random,
    /// Midpoint of the transit range, deterministic.
    Midpoint,
    /// Minimum connection time of the transit airport.
    ConnectionTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedBand {
    /// Upper distance bound of this band; `None` is open-ended.
    pub up_to_km: Option<f64>,
    pub cruise_kmh: f64,
    /// Fixed taxi/climb/descent allowance added to every leg in this band.
    pub buffer_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub parallel_routes: ParallelRoutePolicy,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            parallel_routes: ParallelRoutePolicy::KeepFirst,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightTimeConfig {
    pub bands: Vec<SpeedBand>,
    pub transit_min_hours: f64,
    pub transit_max_hours: f64,
    pub transit_model: TransitModel,
    /// Seed for the transit-time generator; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for FlightTimeConfig {
    fn default() -> Self {
        Self {
            bands: vec![
                SpeedBand {
                    up_to_km: Some(1500.0),
                    cruise_kmh: 700.0,
                    buffer_hours: 0.5,
                },
                SpeedBand {
                    up_to_km: Some(4000.0),
                    cruise_kmh: 820.0,
                    buffer_hours: 0.4,
                },
                SpeedBand {
                    up_to_km: None,
                    cruise_kmh: 880.0,
                    buffer_hours: 0.3,
                },
            ],
            transit_min_hours: 2.0,
            transit_max_hours: 5.0,
            transit_model: TransitModel::Random,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub max_stops_limit: usize,
    /// Candidate paths examined before giving up on a stop limit.
    pub search_budget: usize,
    pub hub_probe_count: usize,
    /// Itineraries per direction combined into round trips.
    pub round_trip_pairs: usize,
    pub missing_airline: MissingAirlinePolicy,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            max_stops_limit: 10,
            search_budget: 200,
            hub_probe_count: 10,
            round_trip_pairs: 10,
            missing_airline: MissingAirlinePolicy::Exclude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub pagerank_alpha: f64,
    pub pagerank_tolerance: f64,
    pub pagerank_max_iterations: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            pagerank_alpha: 0.85,
            pagerank_tolerance: 1.0e-6,
            pagerank_max_iterations: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    pub high_component_increase: i64,
    pub medium_edges_lost: usize,
    pub affected_route_sample: usize,
    pub recovery_sample: usize,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            high_component_increase: 5,
            medium_edges_lost: 100,
            affected_route_sample: 10,
            recovery_sample: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub network: NetworkConfig,
    pub flight_time: FlightTimeConfig,
    pub routing: RoutingConfig,
    pub hubs: HubConfig,
    pub resilience: ResilienceConfig,
}

impl AnalyzerConfig {
    /// Parses a JSON document; missing sections keep their defaults.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: AnalyzerConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ft = &self.flight_time;
        if ft.bands.is_empty() {
            return Err(ConfigError::Invalid("at least one speed band is required".to_string()));
        }
        if ft.bands.iter().any(|b| b.cruise_kmh <= 0.0 || b.buffer_hours < 0.0) {
            return Err(ConfigError::Invalid(
                "speed bands need a positive cruise speed and a non-negative buffer".to_string(),
            ));
        }
        if ft.bands.last().and_then(|b| b.up_to_km).is_some() {
            return Err(ConfigError::Invalid(
                "the last speed band must be open-ended".to_string(),
            ));
        }
        if ft.transit_min_hours < 0.0 || ft.transit_min_hours > ft.transit_max_hours {
            return Err(ConfigError::Invalid(format!(
                "transit range {}..{} is not valid",
                ft.transit_min_hours, ft.transit_max_hours
            )));
        }

        let alpha = self.hubs.pagerank_alpha;
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "pagerank_alpha must be in (0, 1), got {}",
                alpha
            )));
        }

        Ok(())
    }
}
