// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::config::MissingAirlinePolicy;
use crate::network::{Network, NetworkView};
use crate::RouteError;
use airnet_data::alliance::AllianceIndex;
use log::debug;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Unvalidated shape accepted from callers and deserializers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPreferences {
    pub avoid_countries: Vec<String>,
    pub allowed_countries: Vec<String>,
    pub preferred_airlines: Vec<String>,
    pub preferred_alliance: Option<String>,
}

/// Request-scoped routing constraints. Countries are compared
/// case-insensitively; empty sets mean unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPreferences")]
pub struct Preferences {
    avoid_countries: BTreeSet<String>,
    allowed_countries: BTreeSet<String>,
    preferred_airlines: BTreeSet<String>,
}

impl TryFrom<RawPreferences> for Preferences {
    type Error = RouteError;

    fn try_from(raw: RawPreferences) -> Result<Self, Self::Error> {
        let prefs = Preferences::new(
            raw.avoid_countries,
            raw.allowed_countries,
            raw.preferred_airlines,
        )?;
        match raw.preferred_alliance {
            Some(name) => prefs.with_alliance(&name),
            None => Ok(prefs),
        }
    }
}

fn normalize_countries<I, S>(field: &str, items: I) -> Result<BTreeSet<String>, RouteError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut set = BTreeSet::new();
    for item in items {
        let country = item.as_ref().trim().to_lowercase();
        if country.is_empty() {
            return Err(RouteError::InvalidPreferences(format!(
                "all countries in {} must be non-empty",
                field
            )));
        }
        set.insert(country);
    }
    Ok(set)
}

fn normalize_airlines<I, S>(items: I) -> Result<BTreeSet<String>, RouteError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    static AIRLINE_RE: OnceLock<Regex> = OnceLock::new();
    let re = AIRLINE_RE.get_or_init(|| Regex::new(r"^[A-Z0-9]{2,3}$").unwrap());

    let mut set = BTreeSet::new();
    for item in items {
        let code = item.as_ref().trim().to_ascii_uppercase();
        if !re.is_match(&code) {
            return Err(RouteError::InvalidPreferences(format!(
                "'{}' is not an airline code",
                item.as_ref()
            )));
        }
        set.insert(code);
    }
    Ok(set)
}

impl Preferences {
    pub fn new<A, B, C, S1, S2, S3>(avoid: A, allowed: B, airlines: C) -> Result<Self, RouteError>
    where
        A: IntoIterator<Item = S1>,
        B: IntoIterator<Item = S2>,
        C: IntoIterator<Item = S3>,
        S1: AsRef<str>,
        S2: AsRef<str>,
        S3: AsRef<str>,
    {
        let avoid_countries = normalize_countries("avoid_countries", avoid)?;
        let allowed_countries = normalize_countries("allowed_countries", allowed)?;
        let preferred_airlines = normalize_airlines(airlines)?;

        if let Some(overlap) = avoid_countries.intersection(&allowed_countries).next() {
            return Err(RouteError::InvalidPreferences(format!(
                "avoid_countries and allowed_countries cannot overlap ('{}')",
                overlap
            )));
        }

        Ok(Self {
            avoid_countries,
            allowed_countries,
            preferred_airlines,
        })
    }

    /// Adds every member airline of the named alliance to the preferred set.
    pub fn with_alliance(mut self, alliance: &str) -> Result<Self, RouteError> {
        let members = AllianceIndex::global().members(alliance);
        if members.is_empty() {
            return Err(RouteError::InvalidPreferences(format!(
                "unknown alliance '{}'",
                alliance
            )));
        }
        self.preferred_airlines.extend(members);
        Ok(self)
    }

    pub fn avoid_countries(&self) -> &BTreeSet<String> {
        &self.avoid_countries
    }

    pub fn allowed_countries(&self) -> &BTreeSet<String> {
        &self.allowed_countries
    }

    pub fn preferred_airlines(&self) -> &BTreeSet<String> {
        &self.preferred_airlines
    }

    pub fn is_unconstrained(&self) -> bool {
        !self.has_country_filter() && self.preferred_airlines.is_empty()
    }

    pub fn has_country_filter(&self) -> bool {
        !self.avoid_countries.is_empty() || !self.allowed_countries.is_empty()
    }

    pub fn allows_country(&self, country: &str) -> bool {
        let country = country.trim().to_lowercase();
        if !self.allowed_countries.is_empty() && !self.allowed_countries.contains(&country) {
            return false;
        }
        !self.avoid_countries.contains(&country)
    }

    pub fn allows_airline(&self, airline: Option<&str>, missing: MissingAirlinePolicy) -> bool {
        if self.preferred_airlines.is_empty() {
            return true;
        }
        match airline {
            Some(code) => self.preferred_airlines.contains(code),
            None => missing == MissingAirlinePolicy::Include,
        }
    }

    /// Builds the filtered view for one query. Source and destination are
    /// always kept, whatever their country.
    pub fn apply<'a>(
        &self,
        network: &'a Network,
        source: NodeIndex,
        destination: NodeIndex,
        missing: MissingAirlinePolicy,
    ) -> NetworkView<'a> {
        let mut view = network.view();
        if self.is_unconstrained() {
            return view;
        }

        let mut nodes_removed = 0;
        if self.has_country_filter() {
            for node in network.graph().node_indices() {
                if node == source || node == destination {
                    continue;
                }
                if !self.allows_country(&network.airport(node).country) {
                    view.exclude_node(node);
                    nodes_removed += 1;
                }
            }
        }

        let mut edges_removed = 0;
        if !self.preferred_airlines.is_empty() {
            for edge in network.graph().edge_references() {
                if !self.allows_airline(edge.weight().airline.as_deref(), missing) {
                    view.exclude_edge(edge.id());
                    edges_removed += 1;
                }
            }
        }

        debug!(
            "Preference filter applied — nodes_removed={} edges_removed={}",
            nodes_removed, edges_removed
        );
        view
    }
}
