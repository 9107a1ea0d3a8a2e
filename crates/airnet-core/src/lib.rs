// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

pub mod analyzer;
pub mod config;
pub mod flight_time;
pub mod hubs;
pub mod network;
pub mod preferences;
pub mod resilience;
pub mod routing;
pub mod search;

pub use analyzer::NetworkAnalyzer;
pub use config::AnalyzerConfig;
pub use flight_time::{FlightTimeEstimator, TimeBreakdown};
pub use hubs::{HubRecord, HubReport};
pub use network::{Airport, Network, NetworkStats, RouteRecord};
pub use preferences::Preferences;
pub use resilience::{ResilienceReport, Severity};
pub use routing::{Objective, RoundTrip, RouteLeg, RouteResult};

use thiserror::Error;

/// Failures a query can report. None of these are fatal: the caller is
/// expected to branch on the kind and present a message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouteError {
    #[error("Airport not found: {0}")]
    AirportNotFound(String),
    #[error("Source and destination are the same airport: {0}")]
    SameAirport(String),
    #[error("No path found between {from} and {to}")]
    NoPathFound { from: String, to: String },
    #[error("No path between {from} and {to} satisfies the stop limit or preferences")]
    NoPathWithinConstraint { from: String, to: String },
    #[error("Hub {0} not found in network")]
    HubNotFound(String),
    #[error("Invalid preferences: {0}")]
    InvalidPreferences(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl RouteError {
    /// Stable tag for callers that map errors to user-facing messages.
    pub fn kind(&self) -> &'static str {
        match self {
            RouteError::AirportNotFound(_) => "airport_not_found",
            RouteError::SameAirport(_) => "same_airport",
            RouteError::NoPathFound { .. } => "no_path_found",
            RouteError::NoPathWithinConstraint { .. } => "no_path_within_constraint",
            RouteError::HubNotFound(_) => "hub_not_found",
            RouteError::InvalidPreferences(_) => "invalid_preferences",
            RouteError::InvalidRequest(_) => "invalid_request",
        }
    }
}
