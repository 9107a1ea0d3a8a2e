// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::config::ResilienceConfig;
use crate::network::{Airport, Network, NetworkStats, Route};
use crate::search::{self, Exclusions};
use crate::RouteError;
use log::{debug, info};
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactMetrics {
    pub nodes_lost: usize,
    pub edges_lost: usize,
    pub density_change: f64,
    /// Strongly connected before the removal and not after.
    pub connectivity_broken: bool,
    /// Change in strongly connected component count; may be negative.
    pub components_increase: i64,
}

impl ImpactMetrics {
    pub fn between(original: &NetworkStats, remaining: &NetworkStats) -> Self {
        Self {
            nodes_lost: original.total_nodes.saturating_sub(remaining.total_nodes),
            edges_lost: original.total_edges.saturating_sub(remaining.total_edges),
            density_change: remaining.density - original.density,
            connectivity_broken: original.is_strongly_connected
                && !remaining.is_strongly_connected,
            components_increase: remaining.strongly_connected_components as i64
                - original.strongly_connected_components as i64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AffectedRoute {
    pub from: String,
    pub to: String,
    pub distance_km: f64,
    pub airline: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Recovery {
    Found { path: Vec<String>, distance_km: f64 },
    NoAlternative,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlternativePath {
    pub original_from: String,
    pub original_to: String,
    pub recovery: Recovery,
    /// Infinite when there is no alternative.
    pub alternative_distance_km: f64,
    /// Airports on the recovered path, 0 when there is none.
    pub path_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResilienceReport {
    pub hub_removed: String,
    pub hub_info: Airport,
    pub original_stats: NetworkStats,
    pub remaining_stats: NetworkStats,
    pub impact: ImpactMetrics,
    pub severity: Severity,
    pub affected_routes_count: usize,
    pub affected_routes: Vec<AffectedRoute>,
    pub alternative_paths: Vec<AlternativePath>,
}

/// Severity in fixed precedence: broken strong connectivity, then component
/// growth, then edge loss.
pub fn classify(impact: &ImpactMetrics, config: &ResilienceConfig) -> Severity {
    if impact.connectivity_broken {
        Severity::Critical
    } else if impact.components_increase > config.high_component_increase {
        Severity::High
    } else if impact.edges_lost > config.medium_edges_lost {
        Severity::Medium
    } else {
        Severity::Low
    }
}

fn push_unique(list: &mut Vec<NodeIndex>, node: NodeIndex) {
    if !list.contains(&node) {
        list.push(node);
    }
}

pub struct ResilienceSimulator<'c> {
    config: &'c ResilienceConfig,
}

impl<'c> ResilienceSimulator<'c> {
    pub fn new(config: &'c ResilienceConfig) -> Self {
        Self { config }
    }

    pub fn simulate_removal(
        &self,
        network: &Network,
        hub_code: &str,
    ) -> Result<ResilienceReport, RouteError> {
        let hub = network
            .lookup(hub_code)
            .ok_or_else(|| RouteError::HubNotFound(hub_code.trim().to_ascii_uppercase()))?;
        let hub_airport = network.airport(hub);

        let original_stats = network.stats();
        let mut reduced = network.view();
        reduced.exclude_node(hub);
        let remaining_stats = reduced.stats();

        let impact = ImpactMetrics::between(&original_stats, &remaining_stats);
        let severity = classify(&impact, self.config);

        let mut affected_routes = Vec::new();
        let mut affected_routes_count = 0;
        let mut feeders = Vec::new();
        let mut onward = Vec::new();
        for record in network.routes() {
            let touches_source = record.source_id == hub_airport.id;
            let touches_dest = record.destination_id == hub_airport.id;
            if !touches_source && !touches_dest {
                continue;
            }
            let (Some(src), Some(dst)) = (
                network.lookup_id(record.source_id),
                network.lookup_id(record.destination_id),
            ) else {
                continue;
            };
            affected_routes_count += 1;
            if affected_routes.len() < self.config.affected_route_sample {
                affected_routes.push(AffectedRoute {
                    from: network.code_of(src),
                    to: network.code_of(dst),
                    distance_km: record.distance_km.unwrap_or(0.0),
                    airline: record.airline.clone(),
                });
            }
            if touches_dest {
                push_unique(&mut feeders, src);
            }
            if touches_source {
                push_unique(&mut onward, dst);
            }
        }

        // pairs that connected through the hub
        let pairs: Vec<(NodeIndex, NodeIndex)> = feeders
            .iter()
            .flat_map(|&u| onward.iter().map(move |&w| (u, w)))
            .filter(|(u, w)| u != w)
            .take(self.config.recovery_sample)
            .collect();

        let weight = |r: &Route| r.distance_km;
        let alternative_paths: Vec<AlternativePath> = pairs
            .into_iter()
            .map(|(from, to)| {
                let found = search::dijkstra(&reduced, from, to, &weight, &Exclusions::default());
                let (recovery, distance, length) = match found {
                    Some(path) => {
                        let codes: Vec<String> =
                            path.nodes.iter().map(|&n| network.code_of(n)).collect();
                        let length = codes.len();
                        (
                            Recovery::Found {
                                path: codes,
                                distance_km: path.cost,
                            },
                            path.cost,
                            length,
                        )
                    }
                    None => (Recovery::NoAlternative, f64::INFINITY, 0),
                };
                AlternativePath {
                    original_from: network.code_of(from),
                    original_to: network.code_of(to),
                    recovery,
                    alternative_distance_km: distance,
                    path_length: length,
                }
            })
            .collect();

        debug!(
            "Recovery sample for {}: {} of {} pairs recovered",
            hub_airport.code(),
            alternative_paths
                .iter()
                .filter(|p| matches!(p.recovery, Recovery::Found { .. }))
                .count(),
            alternative_paths.len()
        );
        info!(
            "Simulated removal of {} — severity={:?} edges_lost={} components_increase={}",
            hub_airport.code(),
            severity,
            impact.edges_lost,
            impact.components_increase
        );

        Ok(ResilienceReport {
            hub_removed: hub_airport.code(),
            hub_info: hub_airport.clone(),
            original_stats,
            remaining_stats,
            impact,
            severity,
            affected_routes_count,
            affected_routes,
            alternative_paths,
        })
    }
}
