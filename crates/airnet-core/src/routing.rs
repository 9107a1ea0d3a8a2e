// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::config::RoutingConfig;
use crate::flight_time::{FlightTimeEstimator, TimeBreakdown, TransitStop};
use crate::network::{Network, NetworkView, Route};
use crate::preferences::Preferences;
use crate::search::{self, Exclusions, Path, SimplePaths};
use crate::RouteError;
use airnet_data::alliance::is_partner_connection;
use airnet_data::mct::is_international_transfer;
use log::{debug, warn};
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// What a search minimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    #[default]
    Distance,
    Transfers,
    Fastest,
    /// Searched by distance; only `rank_routes` orders by popularity.
    Popular,
}

impl Objective {
    /// Per-edge weight for this objective.
    pub fn edge_weight<'e>(
        self,
        estimator: &'e FlightTimeEstimator,
    ) -> impl Fn(&Route) -> f64 + Send + Sync + 'e {
        let transit = estimator.midpoint_transit_hours();
        move |route: &Route| match self {
            Objective::Distance | Objective::Popular => route.distance_km,
            Objective::Transfers => 1.0,
            Objective::Fastest => estimator
                .leg_hours(route.distance_km)
                .map_or(f64::INFINITY, |h| h + transit),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub from: String,
    pub to: String,
    pub distance_km: f64,
    pub airline: Option<String>,
    pub stops: u32,
    pub route_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub source: String,
    pub destination: String,
    pub path: Vec<String>,
    pub legs: Vec<RouteLeg>,
    pub total_distance_km: f64,
    /// `path.len() - 2`.
    pub stops: usize,
    pub time: TimeBreakdown,
}

impl RouteResult {
    /// Mean number of merged route rows per leg.
    pub fn popularity(&self) -> f64 {
        if self.legs.is_empty() {
            return 0.0;
        }
        let total: u32 = self.legs.iter().map(|l| l.route_count).sum();
        total as f64 / self.legs.len() as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundTrip {
    pub outbound: RouteResult,
    pub inbound: RouteResult,
    pub total_distance_km: f64,
    pub stops: usize,
    pub time: TimeBreakdown,
}

impl RoundTrip {
    pub fn new(outbound: RouteResult, inbound: RouteResult) -> Self {
        Self {
            total_distance_km: outbound.total_distance_km + inbound.total_distance_km,
            stops: outbound.stops + inbound.stops,
            time: outbound.time.combine(&inbound.time),
            outbound,
            inbound,
        }
    }
}

/// Orders itineraries for presentation. Sorting is stable.
pub fn rank_routes(routes: &mut [RouteResult], objective: Objective) {
    match objective {
        Objective::Distance => {
            routes.sort_by(|a, b| a.total_distance_km.total_cmp(&b.total_distance_km))
        }
        Objective::Transfers => routes.sort_by(|a, b| {
            a.stops
                .cmp(&b.stops)
                .then_with(|| a.total_distance_km.total_cmp(&b.total_distance_km))
        }),
        Objective::Fastest => routes.sort_by(|a, b| {
            a.time
                .total_time_hours
                .total_cmp(&b.time.total_time_hours)
        }),
        Objective::Popular => routes.sort_by(|a, b| {
            b.popularity()
                .total_cmp(&a.popularity())
                .then_with(|| a.total_distance_km.total_cmp(&b.total_distance_km))
        }),
    }
}

fn is_iata(code: &str) -> bool {
    static IATA_RE: OnceLock<Regex> = OnceLock::new();
    IATA_RE
        .get_or_init(|| Regex::new(r"^[A-Z]{3}$").unwrap())
        .is_match(code)
}

fn usable(weight: f64) -> bool {
    weight.is_finite() && weight >= 0.0
}

/// Path queries over one network. Borrowed per call, holds no state.
pub struct RouteFinder<'a> {
    network: &'a Network,
    estimator: &'a FlightTimeEstimator,
    config: &'a RoutingConfig,
}

impl<'a> RouteFinder<'a> {
    pub fn new(
        network: &'a Network,
        estimator: &'a FlightTimeEstimator,
        config: &'a RoutingConfig,
    ) -> Self {
        Self {
            network,
            estimator,
            config,
        }
    }

    fn resolve_code(&self, code: &str) -> Result<NodeIndex, RouteError> {
        let normalized = code.trim().to_ascii_uppercase();
        if !is_iata(&normalized) {
            return Err(RouteError::InvalidRequest(format!(
                "'{}' is not a three-letter IATA code",
                code
            )));
        }
        self.network
            .lookup(&normalized)
            .ok_or(RouteError::AirportNotFound(normalized))
    }

    fn resolve(&self, source: &str, destination: &str) -> Result<(NodeIndex, NodeIndex), RouteError> {
        let s = self.resolve_code(source)?;
        let d = self.resolve_code(destination)?;
        if s == d {
            return Err(RouteError::SameAirport(self.network.code_of(s)));
        }
        Ok((s, d))
    }

    fn check_max_stops(&self, max_stops: Option<usize>) -> Result<(), RouteError> {
        match max_stops {
            Some(m) if m > self.config.max_stops_limit => Err(RouteError::InvalidRequest(format!(
                "max_stops {} exceeds the limit of {}",
                m, self.config.max_stops_limit
            ))),
            _ => Ok(()),
        }
    }

    /// `NoPathFound` when the base network has no path at all, otherwise
    /// the constraints are to blame.
    fn no_path(&self, s: NodeIndex, d: NodeIndex) -> RouteError {
        let from = self.network.code_of(s);
        let to = self.network.code_of(d);
        if search::is_reachable(&self.network.view(), s, d) {
            RouteError::NoPathWithinConstraint { from, to }
        } else {
            RouteError::NoPathFound { from, to }
        }
    }

    /// Shortest path by distance with no preferences and no stop limit.
    pub fn find_route(&self, source: &str, destination: &str) -> Result<RouteResult, RouteError> {
        let (s, d) = self.resolve(source, destination)?;
        let view = self.network.view();
        let weight = Objective::Distance.edge_weight(self.estimator);
        let path = search::dijkstra(&view, s, d, &weight, &Exclusions::default())
            .ok_or_else(|| self.no_path(s, d))?;
        Ok(self.annotate(&path))
    }

    pub fn find_optimized_route(
        &self,
        source: &str,
        destination: &str,
        objective: Objective,
        preferences: &Preferences,
        max_stops: Option<usize>,
    ) -> Result<RouteResult, RouteError> {
        self.check_max_stops(max_stops)?;
        let (s, d) = self.resolve(source, destination)?;
        let view = preferences.apply(self.network, s, d, self.config.missing_airline);
        let weight = objective.edge_weight(self.estimator);

        let path = self
            .best_path(&view, s, d, &weight, max_stops)
            .ok_or_else(|| self.no_path(s, d))?;
        debug!(
            "Optimized route {} -> {} ({:?}, max_stops={:?}): {} stops, cost {:.2}",
            source,
            destination,
            objective,
            max_stops,
            path.stops(),
            path.cost
        );
        Ok(self.annotate(&path))
    }

    /// Up to `k` itineraries other than the primary shortest path, sorted by
    /// total distance.
    pub fn find_alternative_routes(
        &self,
        source: &str,
        destination: &str,
        k: usize,
        preferences: &Preferences,
        max_stops: Option<usize>,
    ) -> Result<Vec<RouteResult>, RouteError> {
        if k == 0 {
            return Err(RouteError::InvalidRequest("k must be at least 1".to_string()));
        }
        self.check_max_stops(max_stops)?;
        let (s, d) = self.resolve(source, destination)?;
        let view = preferences.apply(self.network, s, d, self.config.missing_airline);

        let (_, alternatives) = self.candidate_paths(&view, s, d, k, max_stops)?;
        let mut results: Vec<RouteResult> = alternatives.iter().map(|p| self.annotate(p)).collect();
        rank_routes(&mut results, Objective::Distance);
        results.truncate(k);
        Ok(results)
    }

    /// Pairs outbound and return itineraries, cheapest combined distance first.
    pub fn find_round_trip(
        &self,
        source: &str,
        destination: &str,
        k: usize,
        preferences: &Preferences,
        max_stops: Option<usize>,
    ) -> Result<Vec<RoundTrip>, RouteError> {
        if k == 0 {
            return Err(RouteError::InvalidRequest("k must be at least 1".to_string()));
        }
        self.check_max_stops(max_stops)?;
        let (s, d) = self.resolve(source, destination)?;
        let per_direction = self.config.round_trip_pairs.max(1);

        let outbound = self.itineraries(s, d, per_direction, preferences, max_stops)?;
        let inbound = self.itineraries(d, s, per_direction, preferences, max_stops)?;

        let mut trips: Vec<RoundTrip> = outbound
            .iter()
            .flat_map(|out| {
                inbound
                    .iter()
                    .map(move |back| RoundTrip::new(out.clone(), back.clone()))
            })
            .collect();
        trips.sort_by(|a, b| a.total_distance_km.total_cmp(&b.total_distance_km));
        trips.truncate(k);
        Ok(trips)
    }

    /// Primary path followed by its alternatives, at most `limit` in total.
    fn itineraries(
        &self,
        s: NodeIndex,
        d: NodeIndex,
        limit: usize,
        preferences: &Preferences,
        max_stops: Option<usize>,
    ) -> Result<Vec<RouteResult>, RouteError> {
        let view = preferences.apply(self.network, s, d, self.config.missing_airline);
        let (primary, mut alternatives) =
            self.candidate_paths(&view, s, d, limit.saturating_sub(1), max_stops)?;
        alternatives.sort_by(|a, b| a.cost.total_cmp(&b.cost));

        let mut results = vec![self.annotate(&primary)];
        results.extend(
            alternatives
                .iter()
                .take(limit.saturating_sub(1))
                .map(|p| self.annotate(p)),
        );
        Ok(results)
    }

    /// The primary distance path and a pool of distinct alternatives: edge
    /// deviations first, then hub probes while short of `k`.
    fn candidate_paths(
        &self,
        view: &NetworkView<'_>,
        s: NodeIndex,
        d: NodeIndex,
        k: usize,
        max_stops: Option<usize>,
    ) -> Result<(Path, Vec<Path>), RouteError> {
        use rayon::prelude::*;

        let weight = Objective::Distance.edge_weight(self.estimator);
        let primary = self
            .best_path(view, s, d, &weight, max_stops)
            .ok_or_else(|| self.no_path(s, d))?;
        let limit = max_stops.unwrap_or(usize::MAX);

        let mut seen: HashSet<Vec<NodeIndex>> = HashSet::new();
        seen.insert(primary.nodes.clone());
        let mut alternatives = Vec::new();
        if k == 0 {
            return Ok((primary, alternatives));
        }

        let deviations: Vec<Option<Path>> = primary
            .nodes
            .par_windows(2)
            .map(|pair| {
                let mut exclusions = Exclusions::default();
                exclusions
                    .edges
                    .extend(view.edges_between(pair[0], pair[1]).map(|e| e.id()));
                search::dijkstra(view, s, d, &weight, &exclusions)
            })
            .collect();
        for path in deviations.into_iter().flatten() {
            if path.stops() <= limit && seen.insert(path.nodes.clone()) {
                alternatives.push(path);
            }
        }

        if alternatives.len() < k {
            let hubs = self.probe_hubs(view, s, d);
            let probes: Vec<Option<Path>> = hubs
                .par_iter()
                .map(|&hub| {
                    let none = Exclusions::default();
                    let head = search::dijkstra(view, s, hub, &weight, &none)?;
                    let tail = search::dijkstra(view, hub, d, &weight, &none)?;
                    head.concat(&tail)
                })
                .collect();
            for path in probes.into_iter().flatten() {
                if path.stops() <= limit && seen.insert(path.nodes.clone()) {
                    alternatives.push(path);
                }
            }
        }

        debug!(
            "Alternative search {} -> {}: {} candidates besides the primary",
            self.network.code_of(s),
            self.network.code_of(d),
            alternatives.len()
        );
        Ok((primary, alternatives))
    }

    /// Highest-degree airports in the view, endpoints excluded.
    fn probe_hubs(&self, view: &NetworkView<'_>, s: NodeIndex, d: NodeIndex) -> Vec<NodeIndex> {
        let mut hubs: Vec<(NodeIndex, usize)> = view
            .active_nodes()
            .filter(|&n| n != s && n != d)
            .map(|n| (n, self.network.degree(n)))
            .collect();
        hubs.sort_by(|a, b| b.1.cmp(&a.1));
        hubs.into_iter()
            .take(self.config.hub_probe_count)
            .map(|(n, _)| n)
            .collect()
    }

    fn best_path<W>(
        &self,
        view: &NetworkView<'_>,
        s: NodeIndex,
        d: NodeIndex,
        weight: &W,
        max_stops: Option<usize>,
    ) -> Option<Path>
    where
        W: Fn(&Route) -> f64,
    {
        match max_stops {
            Some(m) if m <= 2 => enumerate_short(view, s, d, weight, m),
            Some(m) => self.bounded_search(view, s, d, weight, m),
            None => search::dijkstra(view, s, d, weight, &Exclusions::default()),
        }
    }

    /// Walks simple paths cheapest first until one has at most `max_stops`.
    fn bounded_search<W>(
        &self,
        view: &NetworkView<'_>,
        s: NodeIndex,
        d: NodeIndex,
        weight: &W,
        max_stops: usize,
    ) -> Option<Path>
    where
        W: Fn(&Route) -> f64,
    {
        for (examined, path) in SimplePaths::new(view, s, d, weight).enumerate() {
            if path.stops() <= max_stops {
                return Some(path);
            }
            if examined + 1 >= self.config.search_budget {
                warn!(
                    "Search budget of {} paths exhausted for {} -> {} (max_stops={})",
                    self.config.search_budget,
                    self.network.code_of(s),
                    self.network.code_of(d),
                    max_stops
                );
                return None;
            }
        }
        None
    }

    fn annotate(&self, path: &Path) -> RouteResult {
        let network = self.network;
        let codes: Vec<String> = path.nodes.iter().map(|&n| network.code_of(n)).collect();

        let legs: Vec<RouteLeg> = path
            .edges
            .iter()
            .enumerate()
            .map(|(i, &e)| {
                let route = network.route(e);
                RouteLeg {
                    from: codes[i].clone(),
                    to: codes[i + 1].clone(),
                    distance_km: route.distance_km,
                    airline: route.airline.clone(),
                    stops: route.stops,
                    route_count: route.route_count,
                }
            })
            .collect();

        let n = path.nodes.len();
        let transit_stops: Vec<TransitStop<'_>> = if n > 2 {
            let origin = &network.airport(path.nodes[0]).country;
            let dest = &network.airport(path.nodes[n - 1]).country;
            (1..n - 1)
                .map(|i| TransitStop {
                    iata: &codes[i],
                    international: is_international_transfer(
                        origin,
                        dest,
                        &network.airport(path.nodes[i]).country,
                    ),
                    terminal_change: match (&legs[i - 1].airline, &legs[i].airline) {
                        (Some(inbound), Some(outbound)) => {
                            !is_partner_connection(inbound, outbound)
                        }
                        _ => false,
                    },
                })
                .collect()
        } else {
            Vec::new()
        };

        let distances: Vec<f64> = legs.iter().map(|l| l.distance_km).collect();
        let time = self
            .estimator
            .estimate_with_stops(&distances, &transit_stops)
            .unwrap_or_default();

        RouteResult {
            source: codes.first().cloned().unwrap_or_default(),
            destination: codes.last().cloned().unwrap_or_default(),
            total_distance_km: distances.iter().sum(),
            stops: path.stops(),
            path: codes,
            legs,
            time,
        }
    }
}

/// Cheapest usable edge per ordered pair `(from, to)` for a fixed `to`.
fn cheapest_into<W>(view: &NetworkView<'_>, to: NodeIndex, weight: &W) -> HashMap<NodeIndex, (EdgeIndex, f64)>
where
    W: Fn(&Route) -> f64,
{
    let mut best: HashMap<NodeIndex, (EdgeIndex, f64)> = HashMap::new();
    for edge in view.in_edges(to) {
        let w = weight(edge.weight());
        if !usable(w) {
            continue;
        }
        let entry = best.entry(edge.source()).or_insert((edge.id(), w));
        if w < entry.1 {
            *entry = (edge.id(), w);
        }
    }
    best
}

/// Exhaustive search over itineraries with at most two stops. Cheapest
/// weight wins; on ties the one with fewer stops, then the first found.
fn enumerate_short<W>(
    view: &NetworkView<'_>,
    s: NodeIndex,
    d: NodeIndex,
    weight: &W,
    max_stops: usize,
) -> Option<Path>
where
    W: Fn(&Route) -> f64,
{
    if !view.is_node_active(s) || !view.is_node_active(d) {
        return None;
    }
    let into_dest = cheapest_into(view, d, weight);
    let mut best: Option<Path> = None;
    let mut consider = |candidate: Path| {
        let better = match &best {
            None => true,
            Some(current) => {
                candidate.cost < current.cost
                    || (candidate.cost == current.cost && candidate.stops() < current.stops())
            }
        };
        if better {
            best = Some(candidate);
        }
    };

    if let Some(&(edge, w)) = into_dest.get(&s) {
        consider(Path {
            nodes: vec![s, d],
            edges: vec![edge],
            cost: w,
        });
    }

    if max_stops >= 1 {
        for first in view.out_edges(s) {
            let hop = first.target();
            let w1 = weight(first.weight());
            if hop == d || !usable(w1) {
                continue;
            }
            if let Some(&(last, w2)) = into_dest.get(&hop) {
                consider(Path {
                    nodes: vec![s, hop, d],
                    edges: vec![first.id(), last],
                    cost: w1 + w2,
                });
            }

            if max_stops >= 2 {
                for second in view.out_edges(hop) {
                    let hop2 = second.target();
                    let w2 = weight(second.weight());
                    if hop2 == s || hop2 == d || !usable(w2) {
                        continue;
                    }
                    if let Some(&(last, w3)) = into_dest.get(&hop2) {
                        consider(Path {
                            nodes: vec![s, hop, hop2, d],
                            edges: vec![first.id(), second.id(), last],
                            cost: w1 + w2 + w3,
                        });
                    }
                }
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FlightTimeConfig, NetworkConfig, ParallelRoutePolicy, TransitModel};
    use crate::network::tests::{diamond, make_airport, make_route};

    const NONE: [&str; 0] = [];

    fn finder<'a>(
        network: &'a Network,
        estimator: &'a FlightTimeEstimator,
        config: &'a RoutingConfig,
    ) -> RouteFinder<'a> {
        RouteFinder::new(network, estimator, config)
    }

    /// A -> B -> C -> D -> E at 100 km per hop, plus A -> E at 1000 km
    /// and A -> C at 250 km.
    fn chain() -> Network {
        Network::build(
            vec![
                make_airport(1, "AAA", "One"),
                make_airport(2, "BBB", "One"),
                make_airport(3, "CCC", "Two"),
                make_airport(4, "DDD", "Two"),
                make_airport(5, "EEE", "Three"),
            ],
            vec![
                make_route(1, 2, 100.0, "XA"),
                make_route(2, 3, 100.0, "XA"),
                make_route(3, 4, 100.0, "XA"),
                make_route(4, 5, 100.0, "XA"),
                make_route(1, 5, 1000.0, "YB"),
                make_route(1, 3, 250.0, "YB"),
            ],
        )
    }

    #[test]
    fn test_distance_with_one_stop() {
        let network = diamond();
        let estimator = FlightTimeEstimator::deterministic();
        let config = RoutingConfig::default();
        let f = finder(&network, &estimator, &config);

        let r = f
            .find_optimized_route("AAA", "DDD", Objective::Distance, &Preferences::default(), Some(1))
            .unwrap();
        assert_eq!(r.path, vec!["AAA", "CCC", "DDD"]);
        assert_eq!(r.total_distance_km, 600.0);
        assert_eq!(r.stops, 1);
        assert_eq!(r.legs.len(), 2);
        assert_eq!(r.time.number_of_transits, 1);
    }

    #[test]
    fn test_transfers_objective() {
        let network = diamond();
        let estimator = FlightTimeEstimator::deterministic();
        let config = RoutingConfig::default();
        let f = finder(&network, &estimator, &config);

        let r = f
            .find_optimized_route("AAA", "DDD", Objective::Transfers, &Preferences::default(), None)
            .unwrap();
        assert_eq!(r.stops, 1);
        assert_eq!(r.path.len(), 3);
    }

    #[test]
    fn test_zero_stops_requires_direct_edge() {
        let network = diamond();
        let estimator = FlightTimeEstimator::deterministic();
        let config = RoutingConfig::default();
        let f = finder(&network, &estimator, &config);

        let err = f
            .find_optimized_route("AAA", "DDD", Objective::Distance, &Preferences::default(), Some(0))
            .unwrap_err();
        assert_eq!(err.kind(), "no_path_within_constraint");
    }

    #[test]
    fn test_stop_limit_paths() {
        let network = chain();
        let estimator = FlightTimeEstimator::deterministic();
        let config = RoutingConfig::default();
        let f = finder(&network, &estimator, &config);
        let prefs = Preferences::default();

        // unbounded: the 400 km chain
        let r = f
            .find_optimized_route("AAA", "EEE", Objective::Distance, &prefs, None)
            .unwrap();
        assert_eq!(r.total_distance_km, 400.0);
        assert_eq!(r.stops, 3);

        // two stops: skip B via A -> C
        let r = f
            .find_optimized_route("AAA", "EEE", Objective::Distance, &prefs, Some(2))
            .unwrap();
        assert_eq!(r.path, vec!["AAA", "CCC", "DDD", "EEE"]);
        assert_eq!(r.total_distance_km, 450.0);

        // one stop: nothing fits but the direct flight
        let r = f
            .find_optimized_route("AAA", "EEE", Objective::Distance, &prefs, Some(1))
            .unwrap();
        assert_eq!(r.path, vec!["AAA", "EEE"]);
        assert_eq!(r.stops, 0);

        // three stops goes through the bounded search
        let r = f
            .find_optimized_route("AAA", "EEE", Objective::Distance, &prefs, Some(3))
            .unwrap();
        assert_eq!(r.total_distance_km, 400.0);
    }

    #[test]
    fn test_bounded_search_budget() {
        let network = chain();
        let estimator = FlightTimeEstimator::deterministic();
        let config = RoutingConfig {
            search_budget: 1,
            ..RoutingConfig::default()
        };
        let f = finder(&network, &estimator, &config);
        let view = network.view();
        let a = network.lookup("AAA").unwrap();
        let e = network.lookup("EEE").unwrap();
        let weight = Objective::Distance.edge_weight(&estimator);

        // the cheapest path has three stops, so a budget of one gives up
        assert!(f.bounded_search(&view, a, e, &weight, 3).is_some());
        assert!(f.bounded_search(&view, a, e, &weight, 2).is_none());
    }

    #[test]
    fn test_query_errors() {
        let network = diamond();
        let estimator = FlightTimeEstimator::deterministic();
        let config = RoutingConfig::default();
        let f = finder(&network, &estimator, &config);
        let prefs = Preferences::default();

        let err = f.find_route("AAA", "aaa").unwrap_err();
        assert_eq!(err, RouteError::SameAirport("AAA".to_string()));
        assert_eq!(f.find_route("AAA", "ZZZ").unwrap_err().kind(), "airport_not_found");
        assert_eq!(f.find_route("AAA", "D1").unwrap_err().kind(), "invalid_request");
        assert_eq!(f.find_route("DDD", "AAA").unwrap_err().kind(), "no_path_found");
        assert_eq!(
            f.find_optimized_route("AAA", "DDD", Objective::Distance, &prefs, Some(11))
                .unwrap_err()
                .kind(),
            "invalid_request"
        );
        assert_eq!(
            f.find_alternative_routes("AAA", "DDD", 0, &prefs, None)
                .unwrap_err()
                .kind(),
            "invalid_request"
        );
    }

    #[test]
    fn test_preferences_constrain_search() {
        let network = diamond();
        let estimator = FlightTimeEstimator::deterministic();
        let config = RoutingConfig::default();
        let f = finder(&network, &estimator, &config);

        let avoid_charlie = Preferences::new(["Charlie"], [""; 0], [""; 0]).unwrap();
        let r = f
            .find_optimized_route("AAA", "DDD", Objective::Distance, &avoid_charlie, None)
            .unwrap();
        assert_eq!(r.path, vec!["AAA", "BBB", "DDD"]);

        let only_xa = Preferences::new([""; 0], [""; 0], ["XA"]).unwrap();
        let r = f
            .find_optimized_route("AAA", "DDD", Objective::Distance, &only_xa, Some(1))
            .unwrap();
        assert_eq!(r.total_distance_km, 1000.0);

        let nobody = Preferences::new(["Bravo", "Charlie"], [""; 0], [""; 0]).unwrap();
        let err = f
            .find_optimized_route("AAA", "DDD", Objective::Distance, &nobody, None)
            .unwrap_err();
        assert_eq!(err.kind(), "no_path_within_constraint");
    }

    #[test]
    fn test_alternatives_exclude_primary() {
        let network = diamond();
        let estimator = FlightTimeEstimator::deterministic();
        let config = RoutingConfig::default();
        let f = finder(&network, &estimator, &config);

        let alts = f
            .find_alternative_routes("AAA", "DDD", 3, &Preferences::default(), None)
            .unwrap();
        assert_eq!(alts.len(), 1);
        assert_eq!(alts[0].path, vec!["AAA", "BBB", "DDD"]);
    }

    #[test]
    fn test_alternatives_sorted_and_bounded() {
        let network = chain();
        let estimator = FlightTimeEstimator::deterministic();
        let config = RoutingConfig::default();
        let f = finder(&network, &estimator, &config);

        let alts = f
            .find_alternative_routes("AAA", "EEE", 5, &Preferences::default(), None)
            .unwrap();
        assert!(!alts.is_empty() && alts.len() <= 5);
        assert!(alts.iter().all(|r| r.path != vec!["AAA", "BBB", "CCC", "DDD", "EEE"]));
        assert!(alts
            .windows(2)
            .all(|w| w[0].total_distance_km <= w[1].total_distance_km));
        let unique: HashSet<Vec<String>> = alts.iter().map(|r| r.path.clone()).collect();
        assert_eq!(unique.len(), alts.len());

        let one = f
            .find_alternative_routes("AAA", "EEE", 1, &Preferences::default(), None)
            .unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].total_distance_km, 450.0);
    }

    #[test]
    fn test_round_trip_is_additive() {
        let network = Network::build(
            vec![make_airport(1, "AAA", "One"), make_airport(2, "BBB", "Two")],
            vec![make_route(1, 2, 800.0, "XA"), make_route(2, 1, 900.0, "XA")],
        );
        let estimator = FlightTimeEstimator::deterministic();
        let config = RoutingConfig::default();
        let f = finder(&network, &estimator, &config);

        let trips = f
            .find_round_trip("AAA", "BBB", 3, &Preferences::default(), None)
            .unwrap();
        assert_eq!(trips.len(), 1);
        let trip = &trips[0];
        assert_eq!(trip.total_distance_km, 1700.0);
        assert_eq!(trip.stops, 0);
        assert!(
            (trip.time.total_time_hours
                - (trip.outbound.time.total_time_hours + trip.inbound.time.total_time_hours))
                .abs()
                < 1e-9
        );
    }

    #[test]
    fn test_rank_routes() {
        let network = chain();
        let estimator = FlightTimeEstimator::deterministic();
        let config = RoutingConfig::default();
        let f = finder(&network, &estimator, &config);
        let prefs = Preferences::default();

        let mut routes = vec![
            f.find_optimized_route("AAA", "EEE", Objective::Distance, &prefs, None)
                .unwrap(),
            f.find_optimized_route("AAA", "EEE", Objective::Distance, &prefs, Some(1))
                .unwrap(),
        ];
        rank_routes(&mut routes, Objective::Transfers);
        assert_eq!(routes[0].stops, 0);
        rank_routes(&mut routes, Objective::Distance);
        assert_eq!(routes[0].total_distance_km, 400.0);
        rank_routes(&mut routes, Objective::Fastest);
        // one 1000 km leg beats four legs with three transits
        assert_eq!(routes[0].stops, 0);
    }

    #[test]
    fn test_fastest_prefers_fewer_transits() {
        let network = diamond();
        let estimator = FlightTimeEstimator::deterministic();
        let weight = Objective::Fastest.edge_weight(&estimator);
        let route = network.route(network.graph().edge_indices().next().unwrap());
        let expected = estimator.leg_hours(route.distance_km).unwrap() + 3.5;
        assert!((weight(route) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_rank_by_popularity() {
        // AAA -> BBB -> DDD is flown three times over, the rest once
        let mut routes = Vec::new();
        for _ in 0..3 {
            routes.push(make_route(1, 2, 100.0, "XA"));
            routes.push(make_route(2, 4, 100.0, "XA"));
        }
        routes.push(make_route(1, 4, 150.0, "XA"));
        routes.push(make_route(1, 3, 100.0, "XA"));
        routes.push(make_route(3, 4, 100.0, "XA"));
        let network = Network::build(
            vec![
                make_airport(1, "AAA", "Alpha"),
                make_airport(2, "BBB", "Bravo"),
                make_airport(3, "CCC", "Charlie"),
                make_airport(4, "DDD", "Delta"),
            ],
            routes,
        );
        let estimator = FlightTimeEstimator::deterministic();
        let config = RoutingConfig::default();
        let f = finder(&network, &estimator, &config);
        let prefs = Preferences::default();

        let mut results = f
            .find_alternative_routes("AAA", "DDD", 2, &prefs, None)
            .unwrap();
        results.push(f.find_route("AAA", "DDD").unwrap());
        assert_eq!(results.len(), 3);

        rank_routes(&mut results, Objective::Popular);
        let order: Vec<&str> = results.iter().map(|r| r.path[1].as_str()).collect();
        // equal popularity falls back to distance: direct (150) before CCC (200)
        assert_eq!(order, vec!["BBB", "DDD", "CCC"]);
        assert_eq!(results[0].popularity(), 3.0);
        assert_eq!(results[1].popularity(), 1.0);
    }

    #[test]
    fn test_connection_times_follow_transfer_kind() {
        let network = Network::build(
            vec![
                make_airport(1, "CCC", "Singapore"),
                make_airport(2, "SIN", "Singapore"),
                make_airport(3, "DDD", "Singapore"),
                make_airport(4, "HKG", "Hong Kong"),
                make_airport(5, "EEE", "Singapore"),
                make_airport(6, "GGG", "Singapore"),
                make_airport(7, "FFF", "Singapore"),
            ],
            vec![
                make_route(1, 2, 1000.0, "XA"),
                make_route(2, 3, 1000.0, "XA"),
                make_route(1, 4, 2500.0, "XA"),
                make_route(4, 5, 2500.0, "YB"),
                make_route(6, 4, 2500.0, "LH"),
                make_route(4, 7, 2500.0, "UA"),
            ],
        );
        let estimator = FlightTimeEstimator::new(&FlightTimeConfig {
            transit_model: TransitModel::ConnectionTime,
            ..FlightTimeConfig::default()
        });
        let config = RoutingConfig::default();
        let f = finder(&network, &estimator, &config);

        // domestic transfer at SIN on one carrier: domestic minimum
        let r = f.find_route("CCC", "DDD").unwrap();
        assert_eq!(r.time.transit_times, vec![0.75]);

        // international transfer at HKG between unrelated carriers: plus terminal buffer
        let r = f.find_route("CCC", "EEE").unwrap();
        assert_eq!(r.time.transit_times, vec![1.75]);

        // alliance partners connect without the buffer
        let r = f.find_route("GGG", "FFF").unwrap();
        assert_eq!(r.time.transit_times, vec![1.25]);
        assert!(
            (r.time.total_time_hours - r.time.flight_time_hours - 1.25).abs() < 1e-9
        );
    }

    #[test]
    fn test_preferred_airline_picks_variant_edge() {
        let network = Network::build_with(
            vec![
                make_airport(1, "AAA", "Alpha"),
                make_airport(2, "BBB", "Bravo"),
                make_airport(3, "CCC", "Charlie"),
            ],
            vec![
                make_route(1, 2, 500.0, "XA"),
                make_route(1, 2, 400.0, "YB"),
                make_route(2, 3, 300.0, "XA"),
            ],
            &NetworkConfig {
                parallel_routes: ParallelRoutePolicy::KeepAll,
            },
        );
        let estimator = FlightTimeEstimator::deterministic();
        let config = RoutingConfig::default();
        let f = finder(&network, &estimator, &config);

        let any = f
            .find_optimized_route("AAA", "CCC", Objective::Distance, &Preferences::default(), None)
            .unwrap();
        assert_eq!(any.total_distance_km, 700.0);
        assert_eq!(any.legs[0].airline.as_deref(), Some("YB"));

        let xa = Preferences::new(NONE, NONE, ["XA"]).unwrap();
        let r = f
            .find_optimized_route("AAA", "CCC", Objective::Distance, &xa, None)
            .unwrap();
        assert_eq!(r.path, vec!["AAA", "BBB", "CCC"]);
        assert_eq!(r.total_distance_km, 800.0);
        assert!(r.legs.iter().all(|l| l.airline.as_deref() == Some("XA")));

        let yb = Preferences::new(NONE, NONE, ["YB"]).unwrap();
        let err = f
            .find_optimized_route("AAA", "CCC", Objective::Distance, &yb, None)
            .unwrap_err();
        assert!(matches!(err, RouteError::NoPathWithinConstraint { .. }));
    }
}
