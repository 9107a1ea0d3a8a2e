// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

#[derive(Debug, Clone, Deserialize)]
pub struct Alliance {
    pub name: String,
    pub airlines: Vec<String>,
}

/// Alliance membership, indexed both ways.
#[derive(Debug)]
pub struct AllianceIndex {
    alliances: Vec<Alliance>,
    by_airline: HashMap<String, usize>,
}

impl AllianceIndex {
    fn load() -> Self {
        let alliances: Vec<Alliance> = serde_json::from_str(include_str!("tables/alliances.json"))
            .expect("Failed to parse alliances.json");

        let mut by_airline = HashMap::new();
        for (idx, alliance) in alliances.iter().enumerate() {
            for code in &alliance.airlines {
                by_airline.insert(code.to_ascii_uppercase(), idx);
            }
        }
        log::debug!(
            "Loaded alliance table — alliances={} airlines={}",
            alliances.len(),
            by_airline.len()
        );

        Self {
            alliances,
            by_airline,
        }
    }

    pub fn global() -> &'static AllianceIndex {
        static INDEX: OnceLock<AllianceIndex> = OnceLock::new();
        INDEX.get_or_init(Self::load)
    }

    pub fn alliances(&self) -> &[Alliance] {
        &self.alliances
    }

    pub fn alliance_of(&self, airline: &str) -> Option<&Alliance> {
        self.by_airline
            .get(&airline.trim().to_ascii_uppercase())
            .map(|&idx| &self.alliances[idx])
    }

    /// Member airline codes of the named alliance (case-insensitive name match).
    /// Unknown names yield an empty set.
    pub fn members(&self, alliance_name: &str) -> HashSet<String> {
        self.alliances
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(alliance_name.trim()))
            .map(|a| a.airlines.iter().map(|c| c.to_ascii_uppercase()).collect())
            .unwrap_or_default()
    }
}

pub fn get_alliance(airline: &str) -> Option<&'static str> {
    AllianceIndex::global()
        .alliance_of(airline)
        .map(|a| a.name.as_str())
}

pub fn is_same_alliance(a: &str, b: &str) -> bool {
    match (get_alliance(a), get_alliance(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Two legs connect under one ticketing umbrella when flown by the same
/// airline or by members of the same alliance.
pub fn is_partner_connection(inbound: &str, outbound: &str) -> bool {
    inbound.trim().eq_ignore_ascii_case(outbound.trim()) || is_same_alliance(inbound, outbound)
}
