// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Structural importance of airports: degree, weighted betweenness,
//! weighted closeness and weighted PageRank.

use crate::config::HubConfig;
use crate::network::Network;
use log::{debug, info, warn};
use petgraph::visit::EdgeRef;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::time::Instant;

/// Sources per betweenness work unit. Fixed so partial sums are added in
/// the same grouping whatever the thread count.
const BETWEENNESS_CHUNK: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubRecord {
    pub airport: String,
    pub name: String,
    pub city: String,
    pub country: String,
    pub degree_centrality: f64,
    pub betweenness_centrality: f64,
    pub closeness_centrality: f64,
    pub pagerank: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubReport {
    /// The requested country, or "Global".
    pub country: String,
    pub top_hubs: Vec<HubRecord>,
    pub backup_hubs: Vec<HubRecord>,
    /// Airports matching the country filter.
    pub total_airports: usize,
}

/// Scores indexed by node index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CentralityScores {
    pub degree: Vec<f64>,
    pub betweenness: Vec<f64>,
    pub closeness: Vec<f64>,
    pub pagerank: Vec<f64>,
}

type Adjacency = Vec<Vec<(usize, f64)>>;

/// Out- and in-lists with parallel edges collapsed. Shortest paths take the
/// lightest edge of a pair; PageRank takes the summed weight.
fn collapsed_adjacency(network: &Network) -> (Adjacency, Adjacency, Adjacency) {
    let n = network.node_count();
    let mut lightest: HashMap<(usize, usize), f64> = HashMap::new();
    let mut summed: HashMap<(usize, usize), f64> = HashMap::new();
    for edge in network.graph().edge_references() {
        let key = (edge.source().index(), edge.target().index());
        let w = edge.weight().distance_km;
        lightest
            .entry(key)
            .and_modify(|cur| *cur = cur.min(w))
            .or_insert(w);
        *summed.entry(key).or_insert(0.0) += w;
    }

    let mut out = vec![Vec::new(); n];
    let mut inc = vec![Vec::new(); n];
    for (&(u, v), &w) in &lightest {
        out[u].push((v, w));
        inc[v].push((u, w));
    }
    let mut weighted = vec![Vec::new(); n];
    for (&(u, v), &w) in &summed {
        weighted[u].push((v, w));
    }
    for list in out.iter_mut().chain(inc.iter_mut()).chain(weighted.iter_mut()) {
        list.sort_by_key(|&(v, _)| v);
    }
    (out, inc, weighted)
}

#[derive(Debug, Clone, Copy)]
struct Item {
    dist: f64,
    node: usize,
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Item {}

impl Ord for Item {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Item {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Single-source Dijkstra returning settled distances.
fn distances_from(adj: &Adjacency, source: usize) -> Vec<f64> {
    let mut dist = vec![f64::INFINITY; adj.len()];
    let mut heap = BinaryHeap::new();
    dist[source] = 0.0;
    heap.push(Item {
        dist: 0.0,
        node: source,
    });
    while let Some(Item { dist: d, node }) = heap.pop() {
        if d > dist[node] {
            continue;
        }
        for &(next, w) in &adj[node] {
            let nd = d + w;
            if nd < dist[next] {
                dist[next] = nd;
                heap.push(Item { dist: nd, node: next });
            }
        }
    }
    dist
}

/// Brandes dependency accumulation from one source, added into `acc`.
fn accumulate_from(adj: &Adjacency, source: usize, acc: &mut [f64]) {
    let n = adj.len();
    let mut dist = vec![f64::INFINITY; n];
    let mut sigma = vec![0.0_f64; n];
    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut settled = vec![false; n];
    let mut order = Vec::new();
    let mut heap = BinaryHeap::new();

    dist[source] = 0.0;
    sigma[source] = 1.0;
    heap.push(Item {
        dist: 0.0,
        node: source,
    });

    while let Some(Item { dist: d, node: v }) = heap.pop() {
        if settled[v] || d > dist[v] {
            continue;
        }
        settled[v] = true;
        order.push(v);
        for &(w, weight) in &adj[v] {
            if settled[w] {
                continue;
            }
            let nd = d + weight;
            if nd < dist[w] {
                dist[w] = nd;
                sigma[w] = sigma[v];
                preds[w].clear();
                preds[w].push(v);
                heap.push(Item { dist: nd, node: w });
            } else if nd == dist[w] {
                sigma[w] += sigma[v];
                preds[w].push(v);
            }
        }
    }

    let mut delta = vec![0.0_f64; n];
    for &w in order.iter().rev() {
        for &v in &preds[w] {
            delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
        }
        if w != source {
            acc[w] += delta[w];
        }
    }
}

fn betweenness(adj: &Adjacency) -> Vec<f64> {
    let n = adj.len();
    let sources: Vec<usize> = (0..n).collect();
    let partials: Vec<Vec<f64>> = sources
        .par_chunks(BETWEENNESS_CHUNK)
        .map(|chunk| {
            let mut acc = vec![0.0; n];
            for &s in chunk {
                accumulate_from(adj, s, &mut acc);
            }
            acc
        })
        .collect();

    let mut scores = vec![0.0; n];
    for partial in partials {
        for (total, p) in scores.iter_mut().zip(partial) {
            *total += p;
        }
    }
    if n > 2 {
        let scale = 1.0 / ((n as f64 - 1.0) * (n as f64 - 2.0));
        for s in &mut scores {
            *s *= scale;
        }
    }
    scores
}

/// Closeness over distances *to* each node, scaled by the reachable share
/// of the graph (Wasserman and Faust).
fn closeness(inc: &Adjacency) -> Vec<f64> {
    let n = inc.len();
    (0..n)
        .into_par_iter()
        .map(|u| {
            let dist = distances_from(inc, u);
            let reached: Vec<f64> = dist.into_iter().filter(|d| d.is_finite()).collect();
            let total: f64 = reached.iter().sum();
            let others = reached.len() as f64 - 1.0;
            if total > 0.0 && n > 1 {
                (others / total) * (others / (n as f64 - 1.0))
            } else {
                0.0
            }
        })
        .collect()
}

fn pagerank(weighted: &Adjacency, config: &HubConfig) -> Vec<f64> {
    let n = weighted.len();
    if n == 0 {
        return Vec::new();
    }
    let nf = n as f64;
    let alpha = config.pagerank_alpha;
    let out_weight: Vec<f64> = weighted
        .iter()
        .map(|list| list.iter().map(|&(_, w)| w).sum())
        .collect();
    let dangling: Vec<usize> = (0..n).filter(|&u| out_weight[u] == 0.0).collect();

    let mut x = vec![1.0 / nf; n];
    for iteration in 0..config.pagerank_max_iterations {
        let dangle_sum: f64 = alpha * dangling.iter().map(|&u| x[u]).sum::<f64>();
        let base = dangle_sum / nf + (1.0 - alpha) / nf;
        let mut next = vec![base; n];
        for u in 0..n {
            if out_weight[u] == 0.0 {
                continue;
            }
            for &(v, w) in &weighted[u] {
                next[v] += alpha * x[u] * w / out_weight[u];
            }
        }
        let err: f64 = next.iter().zip(&x).map(|(a, b)| (a - b).abs()).sum();
        x = next;
        if err < nf * config.pagerank_tolerance {
            debug!("PageRank converged after {} iterations", iteration + 1);
            return x;
        }
    }
    warn!(
        "PageRank did not converge within {} iterations",
        config.pagerank_max_iterations
    );
    x
}

pub struct HubAnalyzer<'c> {
    config: &'c HubConfig,
}

impl<'c> HubAnalyzer<'c> {
    pub fn new(config: &'c HubConfig) -> Self {
        Self { config }
    }

    pub fn centrality(&self, network: &Network) -> CentralityScores {
        let n = network.node_count();
        let degree = if n <= 1 {
            vec![1.0; n]
        } else {
            network
                .graph()
                .node_indices()
                .map(|node| network.degree(node) as f64 / (n as f64 - 1.0))
                .collect()
        };

        let (out, inc, weighted) = collapsed_adjacency(network);
        let (betweenness, closeness) = rayon::join(|| betweenness(&out), || closeness(&inc));
        let pagerank = pagerank(&weighted, self.config);

        CentralityScores {
            degree,
            betweenness,
            closeness,
            pagerank,
        }
    }

    /// Ranks airports with an IATA code by degree centrality, descending.
    /// The country filter applies to the output only.
    pub fn analyze(&self, network: &Network, country: Option<&str>, top_n: usize) -> HubReport {
        let started = Instant::now();
        let scores = self.centrality(network);
        let wanted = country.map(|c| c.trim().to_lowercase());

        let mut hubs: Vec<HubRecord> = network
            .graph()
            .node_indices()
            .filter_map(|node| {
                let airport = network.airport(node);
                let code = airport.iata.clone()?;
                if let Some(wanted) = &wanted {
                    if airport.country.to_lowercase() != *wanted {
                        return None;
                    }
                }
                let i = node.index();
                Some(HubRecord {
                    airport: code,
                    name: airport.name.clone(),
                    city: airport.city.clone(),
                    country: airport.country.clone(),
                    degree_centrality: scores.degree[i],
                    betweenness_centrality: scores.betweenness[i],
                    closeness_centrality: scores.closeness[i],
                    pagerank: scores.pagerank[i],
                })
            })
            .collect();
        hubs.sort_by(|a, b| b.degree_centrality.total_cmp(&a.degree_centrality));

        let total_airports = hubs.len();
        let backup_hubs: Vec<HubRecord> = hubs.iter().skip(top_n).take(top_n).cloned().collect();
        hubs.truncate(top_n);

        info!(
            "Hub analysis for {} — {} airports ranked in {:?}",
            country.unwrap_or("Global"),
            total_airports,
            started.elapsed()
        );

        HubReport {
            country: country.unwrap_or("Global").to_string(),
            top_hubs: hubs,
            backup_hubs,
            total_airports,
        }
    }
}
