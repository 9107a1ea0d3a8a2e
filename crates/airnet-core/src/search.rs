// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Shortest-path primitives over a [`NetworkView`].
//!
//! Weights are supplied per query as a closure over the edge payload so the
//! same machinery serves distance, hop-count and time objectives.

use crate::network::{NetworkView, Route};
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet, VecDeque};

/// A simple path: `nodes.len() == edges.len() + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub nodes: Vec<NodeIndex>,
    pub edges: Vec<EdgeIndex>,
    pub cost: f64,
}

impl Path {
    pub fn stops(&self) -> usize {
        self.nodes.len().saturating_sub(2)
    }

    /// Joins `self` (ending at X) with `tail` (starting at X). `None` when the
    /// endpoints differ or the result would revisit a node.
    pub fn concat(&self, tail: &Path) -> Option<Path> {
        if self.nodes.last() != tail.nodes.first() {
            return None;
        }
        let mut nodes = self.nodes.clone();
        nodes.extend_from_slice(&tail.nodes[1..]);
        let unique: HashSet<NodeIndex> = nodes.iter().copied().collect();
        if unique.len() != nodes.len() {
            return None;
        }
        let mut edges = self.edges.clone();
        edges.extend_from_slice(&tail.edges);
        Some(Path {
            nodes,
            edges,
            cost: self.cost + tail.cost,
        })
    }
}

/// Extra elements hidden from a single search, on top of the view's own.
#[derive(Debug, Clone, Default)]
pub struct Exclusions {
    pub nodes: HashSet<NodeIndex>,
    pub edges: HashSet<EdgeIndex>,
}

impl Exclusions {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct State {
    cost: f64,
    node: NodeIndex,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // min-heap on cost, then on node index
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.index().cmp(&self.node.index()))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dijkstra from `source` to `target`. Edges whose weight is negative or not
/// finite are skipped. Among equal-cost paths the first one settled wins.
pub fn dijkstra<W>(
    view: &NetworkView<'_>,
    source: NodeIndex,
    target: NodeIndex,
    weight: &W,
    exclusions: &Exclusions,
) -> Option<Path>
where
    W: Fn(&Route) -> f64 + ?Sized,
{
    if !view.is_node_active(source) || !view.is_node_active(target) {
        return None;
    }
    if source == target {
        return Some(Path {
            nodes: vec![source],
            edges: Vec::new(),
            cost: 0.0,
        });
    }

    let n = view.network().node_count();
    let mut dist = vec![f64::INFINITY; n];
    let mut prev: Vec<Option<(NodeIndex, EdgeIndex)>> = vec![None; n];
    let mut heap = BinaryHeap::new();

    dist[source.index()] = 0.0;
    heap.push(State {
        cost: 0.0,
        node: source,
    });

    while let Some(State { cost, node }) = heap.pop() {
        if node == target {
            break;
        }
        if cost > dist[node.index()] {
            continue;
        }
        for edge in view.out_edges(node) {
            let next = edge.target();
            if exclusions.edges.contains(&edge.id()) || exclusions.nodes.contains(&next) {
                continue;
            }
            let w = weight(edge.weight());
            if !w.is_finite() || w < 0.0 {
                continue;
            }
            let candidate = cost + w;
            if candidate < dist[next.index()] {
                dist[next.index()] = candidate;
                prev[next.index()] = Some((node, edge.id()));
                heap.push(State {
                    cost: candidate,
                    node: next,
                });
            }
        }
    }

    if !dist[target.index()].is_finite() {
        return None;
    }

    let mut nodes = vec![target];
    let mut edges = Vec::new();
    let mut cursor = target;
    while let Some((from, edge)) = prev[cursor.index()] {
        nodes.push(from);
        edges.push(edge);
        cursor = from;
    }
    nodes.reverse();
    edges.reverse();

    Some(Path {
        nodes,
        edges,
        cost: dist[target.index()],
    })
}

/// Breadth-first reachability over the view.
pub fn is_reachable(view: &NetworkView<'_>, source: NodeIndex, target: NodeIndex) -> bool {
    if !view.is_node_active(source) || !view.is_node_active(target) {
        return false;
    }
    let mut seen = vec![false; view.network().node_count()];
    let mut queue = VecDeque::from([source]);
    seen[source.index()] = true;
    while let Some(node) = queue.pop_front() {
        if node == target {
            return true;
        }
        for edge in view.out_edges(node) {
            let next = edge.target();
            if !seen[next.index()] {
                seen[next.index()] = true;
                queue.push_back(next);
            }
        }
    }
    false
}

/// Simple paths from `source` to `target` in non-decreasing cost order
/// (Yen's algorithm). Paths are distinct by airport sequence; parallel
/// airline edges between the same pair count as one hop.
pub struct SimplePaths<'v, 'a, W> {
    view: &'v NetworkView<'a>,
    source: NodeIndex,
    target: NodeIndex,
    weight: W,
    found: Vec<Path>,
    candidates: Vec<Path>,
    seen: HashSet<Vec<NodeIndex>>,
    started: bool,
}

impl<'v, 'a, W> SimplePaths<'v, 'a, W>
where
    W: Fn(&Route) -> f64,
{
    pub fn new(view: &'v NetworkView<'a>, source: NodeIndex, target: NodeIndex, weight: W) -> Self {
        Self {
            view,
            source,
            target,
            weight,
            found: Vec::new(),
            candidates: Vec::new(),
            seen: HashSet::new(),
            started: false,
        }
    }

    fn edge_cost(&self, edges: &[EdgeIndex]) -> f64 {
        let network = self.view.network();
        edges.iter().map(|&e| (self.weight)(network.route(e))).sum()
    }

    fn spur_from(&mut self, last: &Path) {
        for i in 0..last.nodes.len().saturating_sub(1) {
            let spur = last.nodes[i];
            let root_nodes = &last.nodes[..=i];
            let root_edges = &last.edges[..i];

            let mut exclusions = Exclusions::default();
            for path in &self.found {
                if path.nodes.len() > i + 1 && path.nodes[..=i] == *root_nodes {
                    for edge in self.view.edges_between(path.nodes[i], path.nodes[i + 1]) {
                        exclusions.edges.insert(edge.id());
                    }
                }
            }
            exclusions.nodes.extend(root_nodes[..i].iter().copied());

            let Some(spur_path) =
                dijkstra(self.view, spur, self.target, &self.weight, &exclusions)
            else {
                continue;
            };

            let mut nodes = root_nodes[..i].to_vec();
            nodes.extend_from_slice(&spur_path.nodes);
            if !self.seen.insert(nodes.clone()) {
                continue;
            }
            let mut edges = root_edges.to_vec();
            edges.extend_from_slice(&spur_path.edges);
            let cost = self.edge_cost(root_edges) + spur_path.cost;
            self.candidates.push(Path { nodes, edges, cost });
        }
    }

    fn take_best_candidate(&mut self) -> Option<Path> {
        let best = self
            .candidates
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.cost
                    .total_cmp(&b.cost)
                    .then_with(|| a.nodes.len().cmp(&b.nodes.len()))
                    .then_with(|| {
                        let ka: Vec<usize> = a.nodes.iter().map(|n| n.index()).collect();
                        let kb: Vec<usize> = b.nodes.iter().map(|n| n.index()).collect();
                        ka.cmp(&kb)
                    })
            })
            .map(|(i, _)| i)?;
        Some(self.candidates.swap_remove(best))
    }
}

impl<'v, 'a, W> Iterator for SimplePaths<'v, 'a, W>
where
    W: Fn(&Route) -> f64,
{
    type Item = Path;

    fn next(&mut self) -> Option<Path> {
        if !self.started {
            self.started = true;
            let first = dijkstra(
                self.view,
                self.source,
                self.target,
                &self.weight,
                &Exclusions::default(),
            )?;
            self.seen.insert(first.nodes.clone());
            self.found.push(first.clone());
            return Some(first);
        }

        let last = self.found.last()?.clone();
        self.spur_from(&last);
        let next = self.take_best_candidate()?;
        self.found.push(next.clone());
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::tests::{diamond, make_airport, make_route};
    use crate::network::Network;

    fn by_distance(r: &Route) -> f64 {
        r.distance_km
    }

    fn codes(network: &Network, path: &Path) -> Vec<String> {
        path.nodes.iter().map(|&n| network.code_of(n)).collect()
    }

    #[test]
    fn test_dijkstra_diamond() {
        let network = diamond();
        let view = network.view();
        let a = network.lookup("AAA").unwrap();
        let d = network.lookup("DDD").unwrap();

        let path = dijkstra(&view, a, d, &by_distance, &Exclusions::default()).unwrap();
        assert_eq!(codes(&network, &path), vec!["AAA", "CCC", "DDD"]);
        assert_eq!(path.cost, 600.0);
        assert_eq!(path.stops(), 1);
        assert_eq!(path.edges.len(), 2);

        // no way back
        assert!(dijkstra(&view, d, a, &by_distance, &Exclusions::default()).is_none());
    }

    #[test]
    fn test_dijkstra_respects_exclusions() {
        let network = diamond();
        let view = network.view();
        let a = network.lookup("AAA").unwrap();
        let c = network.lookup("CCC").unwrap();
        let d = network.lookup("DDD").unwrap();

        let mut exclusions = Exclusions::default();
        exclusions.nodes.insert(c);
        let path = dijkstra(&view, a, d, &by_distance, &exclusions).unwrap();
        assert_eq!(codes(&network, &path), vec!["AAA", "BBB", "DDD"]);
        assert_eq!(path.cost, 1000.0);
    }

    #[test]
    fn test_hop_weight() {
        let network = diamond();
        let view = network.view();
        let a = network.lookup("AAA").unwrap();
        let d = network.lookup("DDD").unwrap();
        let path = dijkstra(&view, a, d, &|_: &Route| 1.0, &Exclusions::default()).unwrap();
        assert_eq!(path.cost, 2.0);
    }

    #[test]
    fn test_simple_paths_in_cost_order() {
        let network = Network::build(
            vec![
                make_airport(1, "AAA", "X"),
                make_airport(2, "BBB", "X"),
                make_airport(3, "CCC", "X"),
                make_airport(4, "DDD", "X"),
            ],
            vec![
                make_route(1, 2, 1.0, "XX"),
                make_route(2, 3, 1.0, "XX"),
                make_route(1, 3, 3.0, "XX"),
                make_route(3, 4, 1.0, "XX"),
                make_route(2, 4, 4.0, "XX"),
                make_route(1, 4, 10.0, "XX"),
            ],
        );
        let view = network.view();
        let a = network.lookup("AAA").unwrap();
        let d = network.lookup("DDD").unwrap();

        let paths: Vec<Path> = SimplePaths::new(&view, a, d, by_distance).collect();
        let costs: Vec<f64> = paths.iter().map(|p| p.cost).collect();
        assert_eq!(costs, vec![3.0, 4.0, 5.0, 10.0]);
        assert_eq!(codes(&network, &paths[0]), vec!["AAA", "BBB", "CCC", "DDD"]);
        assert_eq!(codes(&network, &paths[3]), vec!["AAA", "DDD"]);

        let unique: HashSet<Vec<NodeIndex>> = paths.iter().map(|p| p.nodes.clone()).collect();
        assert_eq!(unique.len(), paths.len());
    }

    #[test]
    fn test_concat_requires_meeting_endpoints() {
        let network = diamond();
        let view = network.view();
        let a = network.lookup("AAA").unwrap();
        let c = network.lookup("CCC").unwrap();
        let d = network.lookup("DDD").unwrap();

        let head = dijkstra(&view, a, c, &by_distance, &Exclusions::default()).unwrap();
        let tail = dijkstra(&view, c, d, &by_distance, &Exclusions::default()).unwrap();
        let joined = head.concat(&tail).unwrap();
        assert_eq!(codes(&network, &joined), vec!["AAA", "CCC", "DDD"]);
        assert_eq!(joined.cost, 600.0);

        assert!(joined.concat(&head).is_none());
        assert!(tail.concat(&head).is_none());
    }

    #[test]
    fn test_reachability() {
        let network = diamond();
        let mut view = network.view();
        let a = network.lookup("AAA").unwrap();
        let d = network.lookup("DDD").unwrap();
        assert!(is_reachable(&view, a, d));
        assert!(!is_reachable(&view, d, a));

        view.exclude_node(network.lookup("BBB").unwrap());
        view.exclude_node(network.lookup("CCC").unwrap());
        assert!(!is_reachable(&view, a, d));
    }
}
