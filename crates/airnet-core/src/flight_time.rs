// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::config::{FlightTimeConfig, SpeedBand, TransitModel};
use airnet_data::mct::ConnectionTimes;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Distance-banded cruise speeds. Bands are checked in order; the first band
/// whose upper bound covers the distance applies.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedProfile {
    bands: Vec<SpeedBand>,
}

impl Default for SpeedProfile {
    fn default() -> Self {
        Self::new(FlightTimeConfig::default().bands)
    }
}

impl SpeedProfile {
    pub fn new(bands: Vec<SpeedBand>) -> Self {
        Self { bands }
    }

    /// Single constant speed with no ground allowance.
    pub fn flat(cruise_kmh: f64) -> Self {
        Self::new(vec![SpeedBand {
            up_to_km: None,
            cruise_kmh,
            buffer_hours: 0.0,
        }])
    }

    fn band_for(&self, distance_km: f64) -> Option<&SpeedBand> {
        self.bands
            .iter()
            .find(|b| b.up_to_km.map_or(true, |max| distance_km <= max))
            .or_else(|| self.bands.last())
    }

    /// Block time in hours for one leg; `None` for a non-positive distance.
    pub fn leg_hours(&self, distance_km: f64) -> Option<f64> {
        if !distance_km.is_finite() || distance_km <= 0.0 {
            return None;
        }
        let band = self.band_for(distance_km)?;
        Some(distance_km / band.cruise_kmh + band.buffer_hours)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeBreakdown {
    pub flight_time_hours: f64,
    pub transit_time_hours: f64,
    pub total_time_hours: f64,
    pub leg_times: Vec<f64>,
    pub transit_times: Vec<f64>,
    pub number_of_transits: usize,
}

impl TimeBreakdown {
    /// Component-wise sum, used when joining the two halves of a round trip.
    pub fn combine(&self, other: &TimeBreakdown) -> TimeBreakdown {
        TimeBreakdown {
            flight_time_hours: self.flight_time_hours + other.flight_time_hours,
            transit_time_hours: self.transit_time_hours + other.transit_time_hours,
            total_time_hours: self.total_time_hours + other.total_time_hours,
            leg_times: self.leg_times.iter().chain(&other.leg_times).copied().collect(),
            transit_times: self
                .transit_times
                .iter()
                .chain(&other.transit_times)
                .copied()
                .collect(),
            number_of_transits: self.number_of_transits + other.number_of_transits,
        }
    }
}

/// Context for one intermediate stop, consulted by the connection-time model.
#[derive(Debug, Clone, Copy)]
pub struct TransitStop<'a> {
    pub iata: &'a str,
    pub international: bool,
    /// Carriers on either side are not partners; adds the terminal buffer.
    pub terminal_change: bool,
}

pub struct FlightTimeEstimator {
    profile: SpeedProfile,
    model: TransitModel,
    transit_min_hours: f64,
    transit_max_hours: f64,
    rng: Mutex<StdRng>,
    connection_times: ConnectionTimes,
}

impl std::fmt::Debug for FlightTimeEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlightTimeEstimator")
            .field("profile", &self.profile)
            .field("model", &self.model)
            .field("transit_min_hours", &self.transit_min_hours)
            .field("transit_max_hours", &self.transit_max_hours)
            .finish()
    }
}

impl Default for FlightTimeEstimator {
    fn default() -> Self {
        Self::new(&FlightTimeConfig::default())
    }
}

impl FlightTimeEstimator {
    pub fn new(config: &FlightTimeConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            profile: SpeedProfile::new(config.bands.clone()),
            model: config.transit_model,
            transit_min_hours: config.transit_min_hours,
            transit_max_hours: config.transit_max_hours,
            rng: Mutex::new(rng),
            connection_times: ConnectionTimes,
        }
    }

    /// Default speed bands with midpoint transit times.
    pub fn deterministic() -> Self {
        Self::new(&FlightTimeConfig {
            transit_model: TransitModel::Midpoint,
            ..FlightTimeConfig::default()
        })
    }

    pub fn with_profile(mut self, profile: SpeedProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn profile(&self) -> &SpeedProfile {
        &self.profile
    }

    pub fn model(&self) -> TransitModel {
        self.model
    }

    pub fn midpoint_transit_hours(&self) -> f64 {
        (self.transit_min_hours + self.transit_max_hours) / 2.0
    }

    pub fn leg_hours(&self, distance_km: f64) -> Option<f64> {
        self.profile.leg_hours(distance_km)
    }

    pub fn estimate(&self, legs: &[f64]) -> Option<TimeBreakdown> {
        self.estimate_with_stops(legs, &[])
    }

    /// Flight and transit time for an itinerary. `stops[i]` describes the
    /// airport between leg `i` and leg `i + 1`; missing entries are fine.
    /// Returns `None` when no leg has a usable distance.
    pub fn estimate_with_stops(
        &self,
        legs: &[f64],
        stops: &[TransitStop<'_>],
    ) -> Option<TimeBreakdown> {
        let leg_times: Vec<f64> = legs.iter().filter_map(|&d| self.leg_hours(d)).collect();
        if leg_times.is_empty() {
            return None;
        }
        let flight_time_hours: f64 = leg_times.iter().sum();

        let number_of_transits = legs.len() - 1;
        let transit_times: Vec<f64> = (0..number_of_transits)
            .map(|i| self.transit_hours(stops.get(i)))
            .collect();
        let transit_time_hours: f64 = transit_times.iter().sum();

        Some(TimeBreakdown {
            flight_time_hours,
            transit_time_hours,
            total_time_hours: flight_time_hours + transit_time_hours,
            leg_times,
            transit_times,
            number_of_transits,
        })
    }

    fn transit_hours(&self, stop: Option<&TransitStop<'_>>) -> f64 {
        match self.model {
            TransitModel::Midpoint => self.midpoint_transit_hours(),
            TransitModel::Random => {
                let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
                rng.gen_range(self.transit_min_hours..=self.transit_max_hours)
            }
            TransitModel::ConnectionTime => match stop {
                Some(s) => {
                    self.connection_times
                        .get(s.iata, s.international, s.terminal_change)
                }
                None => self.transit_min_hours,
            },
        }
    }
}
