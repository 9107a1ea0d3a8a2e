// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::config::{NetworkConfig, ParallelRoutePolicy};
use airnet_data::geo::{haversine_km, is_valid_coordinate};
use log::{debug, info, warn};
use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, EdgeIndex, EdgeReference, NodeIndex};
use petgraph::unionfind::UnionFind;
use petgraph::visit::{EdgeFiltered, EdgeRef};
use petgraph::Direction;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// One row of the airport table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub id: u32,
    #[serde(default)]
    pub iata: Option<String>,
    pub name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

impl Airport {
    /// Display code: the IATA code when present, otherwise the numeric id.
    pub fn code(&self) -> String {
        self.iata.clone().unwrap_or_else(|| self.id.to_string())
    }
}

/// One row of the route table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub source_id: u32,
    pub destination_id: u32,
    /// Filled from airport coordinates at build time when absent.
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub airline: Option<String>,
    #[serde(default)]
    pub airline_id: Option<u32>,
    #[serde(default)]
    pub stops: u32,
}

/// Edge payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub distance_km: f64,
    pub airline: Option<String>,
    pub airline_id: Option<u32>,
    pub stops: u32,
    /// Number of route rows merged into this edge.
    pub route_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildSummary {
    pub airports_loaded: usize,
    pub airports_rejected: usize,
    pub routes_loaded: usize,
    pub routes_rejected: usize,
    pub routes_merged: usize,
    pub distances_filled: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkStats {
    pub total_nodes: usize,
    /// Distinct directed airport pairs; airline variants of a pair count once.
    pub total_edges: usize,
    pub density: f64,
    pub is_strongly_connected: bool,
    pub is_weakly_connected: bool,
    pub strongly_connected_components: usize,
    pub weakly_connected_components: usize,
}

fn normalize_iata(raw: Option<&str>) -> Option<String> {
    static IATA_RE: OnceLock<Regex> = OnceLock::new();
    let re = IATA_RE.get_or_init(|| Regex::new(r"^[A-Z]{3}$").unwrap());

    let code = raw?.trim().to_ascii_uppercase();
    if re.is_match(&code) {
        Some(code)
    } else {
        None
    }
}

/// The directed, weighted air-route graph. Built once, read-only afterwards.
#[derive(Debug)]
pub struct Network {
    graph: DiGraph<Airport, Route>,
    by_iata: HashMap<String, NodeIndex>,
    by_id: HashMap<u32, NodeIndex>,
    routes: Vec<RouteRecord>,
    summary: BuildSummary,
}

impl Network {
    pub fn build(airports: Vec<Airport>, routes: Vec<RouteRecord>) -> Self {
        Self::build_with(airports, routes, &NetworkConfig::default())
    }

    pub fn build_with(
        airports: Vec<Airport>,
        routes: Vec<RouteRecord>,
        config: &NetworkConfig,
    ) -> Self {
        let mut graph: DiGraph<Airport, Route> =
            DiGraph::with_capacity(airports.len(), routes.len());
        let mut by_iata = HashMap::new();
        let mut by_id = HashMap::new();
        let mut summary = BuildSummary::default();

        for mut airport in airports {
            if !is_valid_coordinate(airport.lat, airport.lon) {
                warn!(
                    "Skipping airport with invalid coordinates — id={} lat={} lon={}",
                    airport.id, airport.lat, airport.lon
                );
                summary.airports_rejected += 1;
                continue;
            }
            if by_id.contains_key(&airport.id) {
                warn!("Skipping duplicate airport id={}", airport.id);
                summary.airports_rejected += 1;
                continue;
            }

            airport.iata = normalize_iata(airport.iata.as_deref());
            let id = airport.id;
            let code = airport.iata.clone();
            let idx = graph.add_node(airport);
            by_id.insert(id, idx);
            if let Some(code) = code {
                // first airport wins the code
                by_iata.entry(code).or_insert(idx);
            }
            summary.airports_loaded += 1;
        }

        let mut edge_index: HashMap<(NodeIndex, NodeIndex, Option<String>), EdgeIndex> =
            HashMap::new();
        let mut accepted = Vec::with_capacity(routes.len());

        for mut record in routes {
            let endpoints = (
                by_id.get(&record.source_id),
                by_id.get(&record.destination_id),
            );
            let (src, dst) = match endpoints {
                (Some(&s), Some(&d)) => (s, d),
                _ => {
                    debug!(
                        "Skipping route with unknown endpoint — {} -> {}",
                        record.source_id, record.destination_id
                    );
                    summary.routes_rejected += 1;
                    continue;
                }
            };
            if src == dst {
                debug!("Skipping self-loop route at airport id={}", record.source_id);
                summary.routes_rejected += 1;
                continue;
            }

            let distance = match record.distance_km {
                Some(d) if d.is_finite() && d > 0.0 => d,
                Some(_) => {
                    summary.routes_rejected += 1;
                    continue;
                }
                None => {
                    let (a, b) = (&graph[src], &graph[dst]);
                    let d = haversine_km(a.lat, a.lon, b.lat, b.lon);
                    if d <= 0.0 {
                        summary.routes_rejected += 1;
                        continue;
                    }
                    summary.distances_filled += 1;
                    d
                }
            };
            record.distance_km = Some(distance);
            record.airline = record
                .airline
                .as_deref()
                .map(|a| a.trim().to_ascii_uppercase())
                .filter(|a| !a.is_empty() && a != "\\N");

            let key = match config.parallel_routes {
                ParallelRoutePolicy::KeepFirst => (src, dst, None),
                ParallelRoutePolicy::KeepAll => (src, dst, record.airline.clone()),
            };

            if let Some(&existing) = edge_index.get(&key) {
                graph[existing].route_count += 1;
                summary.routes_merged += 1;
            } else {
                let e = graph.add_edge(
                    src,
                    dst,
                    Route {
                        distance_km: distance,
                        airline: record.airline.clone(),
                        airline_id: record.airline_id,
                        stops: record.stops,
                        route_count: 1,
                    },
                );
                edge_index.insert(key, e);
            }
            summary.routes_loaded += 1;
            accepted.push(record);
        }

        info!(
            "Network built — nodes={} edges={} airports_rejected={} routes_rejected={} routes_merged={} distances_filled={}",
            graph.node_count(),
            graph.edge_count(),
            summary.airports_rejected,
            summary.routes_rejected,
            summary.routes_merged,
            summary.distances_filled
        );

        Self {
            graph,
            by_iata,
            by_id,
            routes: accepted,
            summary,
        }
    }

    pub fn graph(&self) -> &DiGraph<Airport, Route> {
        &self.graph
    }

    pub fn summary(&self) -> &BuildSummary {
        &self.summary
    }

    /// Accepted route rows, in input order.
    pub fn routes(&self) -> &[RouteRecord] {
        &self.routes
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Case-insensitive IATA lookup.
    pub fn lookup(&self, code: &str) -> Option<NodeIndex> {
        self.by_iata.get(&code.trim().to_ascii_uppercase()).copied()
    }

    pub fn lookup_id(&self, id: u32) -> Option<NodeIndex> {
        self.by_id.get(&id).copied()
    }

    pub fn airport(&self, node: NodeIndex) -> &Airport {
        &self.graph[node]
    }

    pub fn airport_by_code(&self, code: &str) -> Option<&Airport> {
        self.lookup(code).map(|idx| &self.graph[idx])
    }

    pub fn code_of(&self, node: NodeIndex) -> String {
        self.graph[node].code()
    }

    pub fn route(&self, edge: EdgeIndex) -> &Route {
        &self.graph[edge]
    }

    /// Distinct successors plus distinct predecessors in the base graph.
    pub fn degree(&self, node: NodeIndex) -> usize {
        let distinct = |dir: Direction| {
            self.graph
                .neighbors_directed(node, dir)
                .collect::<HashSet<_>>()
                .len()
        };
        distinct(Direction::Outgoing) + distinct(Direction::Incoming)
    }

    /// (lat, lon, code) for every code that resolves; unknown codes are skipped.
    pub fn coordinates(&self, codes: &[&str]) -> Vec<(f64, f64, String)> {
        codes
            .iter()
            .filter_map(|code| self.airport_by_code(code))
            .map(|a| (a.lat, a.lon, a.code()))
            .collect()
    }

    pub fn view(&self) -> NetworkView<'_> {
        NetworkView::new(self)
    }

    pub fn stats(&self) -> NetworkStats {
        self.view().stats()
    }
}

/// A read-only overlay of the network with some nodes and edges hidden.
/// Traversals through a view never see excluded elements; the network itself
/// is untouched.
#[derive(Debug, Clone)]
pub struct NetworkView<'a> {
    network: &'a Network,
    node_excluded: Vec<bool>,
    edge_excluded: Vec<bool>,
}

impl<'a> NetworkView<'a> {
    pub fn new(network: &'a Network) -> Self {
        Self {
            network,
            node_excluded: vec![false; network.node_count()],
            edge_excluded: vec![false; network.edge_count()],
        }
    }

    pub fn network(&self) -> &'a Network {
        self.network
    }

    pub fn exclude_node(&mut self, node: NodeIndex) {
        self.node_excluded[node.index()] = true;
    }

    pub fn exclude_edge(&mut self, edge: EdgeIndex) {
        self.edge_excluded[edge.index()] = true;
    }

    pub fn restore_edge(&mut self, edge: EdgeIndex) {
        self.edge_excluded[edge.index()] = false;
    }

    pub fn is_node_active(&self, node: NodeIndex) -> bool {
        !self.node_excluded[node.index()]
    }

    pub fn is_edge_active(&self, edge: EdgeReference<'_, Route>) -> bool {
        !self.edge_excluded[edge.id().index()]
            && self.is_node_active(edge.source())
            && self.is_node_active(edge.target())
    }

    pub fn active_nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.network
            .graph
            .node_indices()
            .filter(move |&n| self.is_node_active(n))
    }

    pub fn out_edges(&self, node: NodeIndex) -> impl Iterator<Item = EdgeReference<'a, Route>> + '_ {
        let graph: &'a DiGraph<Airport, Route> = &self.network.graph;
        graph
            .edges_directed(node, Direction::Outgoing)
            .filter(move |e| self.is_edge_active(*e))
    }

    pub fn in_edges(&self, node: NodeIndex) -> impl Iterator<Item = EdgeReference<'a, Route>> + '_ {
        let graph: &'a DiGraph<Airport, Route> = &self.network.graph;
        graph
            .edges_directed(node, Direction::Incoming)
            .filter(move |e| self.is_edge_active(*e))
    }

    /// Active edges from `from` to `to`, parallel airline variants included.
    pub fn edges_between(
        &self,
        from: NodeIndex,
        to: NodeIndex,
    ) -> impl Iterator<Item = EdgeReference<'a, Route>> + '_ {
        let graph: &'a DiGraph<Airport, Route> = &self.network.graph;
        graph
            .edges_connecting(from, to)
            .filter(move |e| self.is_edge_active(*e))
    }

    pub fn node_count(&self) -> usize {
        self.node_excluded.iter().filter(|&&x| !x).count()
    }

    pub fn edge_count(&self) -> usize {
        self.network
            .graph
            .edge_references()
            .filter(|e| self.is_edge_active(*e))
            .count()
    }

    /// Distinct ordered pairs joined by at least one active edge.
    pub fn connection_count(&self) -> usize {
        self.network
            .graph
            .edge_references()
            .filter(|e| self.is_edge_active(*e))
            .map(|e| (e.source(), e.target()))
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn stats(&self) -> NetworkStats {
        let nodes = self.node_count();
        let edges = self.connection_count();
        let density = if nodes > 1 {
            edges as f64 / (nodes as f64 * (nodes as f64 - 1.0))
        } else {
            0.0
        };

        let graph = &self.network.graph;
        // excluded nodes lose all their edges and come back as singletons
        let active_edges = EdgeFiltered::from_fn(graph, |e| self.is_edge_active(e));
        let scc = kosaraju_scc(&active_edges)
            .into_iter()
            .filter(|component| component.iter().any(|&n| self.is_node_active(n)))
            .count();

        let mut components = UnionFind::new(graph.node_count());
        for e in graph.edge_references().filter(|e| self.is_edge_active(*e)) {
            components.union(e.source().index(), e.target().index());
        }
        let wcc = self
            .active_nodes()
            .map(|n| components.find(n.index()))
            .collect::<HashSet<_>>()
            .len();

        NetworkStats {
            total_nodes: nodes,
            total_edges: edges,
            density,
            is_strongly_connected: nodes > 0 && scc == 1,
            is_weakly_connected: nodes > 0 && wcc == 1,
            strongly_connected_components: scc,
            weakly_connected_components: wcc,
        }
    }
}
