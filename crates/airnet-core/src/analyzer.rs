// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::config::{AnalyzerConfig, ConfigError};
use crate::flight_time::FlightTimeEstimator;
use crate::hubs::{HubAnalyzer, HubReport};
use crate::network::{Airport, Network, NetworkStats, RouteRecord};
use crate::preferences::Preferences;
use crate::resilience::{ResilienceReport, ResilienceSimulator};
use crate::routing::{Objective, RoundTrip, RouteFinder, RouteResult};
use crate::RouteError;

/// Query facade over one loaded network. Every query takes `&self`, so an
/// analyzer can be shared between threads once built.
#[derive(Debug)]
pub struct NetworkAnalyzer {
    network: Network,
    config: AnalyzerConfig,
    estimator: FlightTimeEstimator,
}

impl NetworkAnalyzer {
    pub fn new(airports: Vec<Airport>, routes: Vec<RouteRecord>) -> Self {
        let config = AnalyzerConfig::default();
        let network = Network::build_with(airports, routes, &config.network);
        Self::assemble(network, config)
    }

    pub fn with_config(
        airports: Vec<Airport>,
        routes: Vec<RouteRecord>,
        config: AnalyzerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let network = Network::build_with(airports, routes, &config.network);
        Ok(Self::assemble(network, config))
    }

    pub fn from_network(network: Network, config: AnalyzerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::assemble(network, config))
    }

    fn assemble(network: Network, config: AnalyzerConfig) -> Self {
        let estimator = FlightTimeEstimator::new(&config.flight_time);
        Self {
            network,
            config,
            estimator,
        }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn estimator(&self) -> &FlightTimeEstimator {
        &self.estimator
    }

    fn finder(&self) -> RouteFinder<'_> {
        RouteFinder::new(&self.network, &self.estimator, &self.config.routing)
    }

    pub fn find_route(&self, source: &str, destination: &str) -> Result<RouteResult, RouteError> {
        self.finder().find_route(source, destination)
    }

    pub fn find_optimized_route(
        &self,
        source: &str,
        destination: &str,
        objective: Objective,
        preferences: &Preferences,
        max_stops: Option<usize>,
    ) -> Result<RouteResult, RouteError> {
        self.finder()
            .find_optimized_route(source, destination, objective, preferences, max_stops)
    }

    pub fn find_alternative_routes(
        &self,
        source: &str,
        destination: &str,
        k: usize,
        preferences: &Preferences,
        max_stops: Option<usize>,
    ) -> Result<Vec<RouteResult>, RouteError> {
        self.finder()
            .find_alternative_routes(source, destination, k, preferences, max_stops)
    }

    pub fn find_round_trip(
        &self,
        source: &str,
        destination: &str,
        k: usize,
        preferences: &Preferences,
        max_stops: Option<usize>,
    ) -> Result<Vec<RoundTrip>, RouteError> {
        self.finder()
            .find_round_trip(source, destination, k, preferences, max_stops)
    }

    pub fn analyze_hubs(&self, country: Option<&str>, top_n: usize) -> HubReport {
        HubAnalyzer::new(&self.config.hubs).analyze(&self.network, country, top_n)
    }

    pub fn simulate_hub_removal(&self, hub_code: &str) -> Result<ResilienceReport, RouteError> {
        ResilienceSimulator::new(&self.config.resilience).simulate_removal(&self.network, hub_code)
    }

    pub fn network_stats(&self) -> NetworkStats {
        self.network.stats()
    }

    pub fn airport(&self, code: &str) -> Option<&Airport> {
        self.network.airport_by_code(code)
    }

    /// (lat, lon, code) per resolvable code, for map rendering.
    pub fn coordinates(&self, codes: &[&str]) -> Vec<(f64, f64, String)> {
        self.network.coordinates(codes)
    }
}
