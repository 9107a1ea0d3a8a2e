// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

#[derive(Debug, Clone, Deserialize)]
struct MctTable {
    default_domestic_hours: f64,
    default_international_hours: f64,
    terminal_change_buffer_hours: f64,
    /// IATA -> (domestic, international) in hours
    airports: HashMap<String, (f64, f64)>,
}

fn table() -> &'static MctTable {
    static TABLE: OnceLock<MctTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        serde_json::from_str(include_str!("tables/mct.json")).expect("Failed to parse mct.json")
    })
}

/// Minimum connection time lookup, backed by the embedded airport table.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionTimes;

impl ConnectionTimes {
    /// Minimum connection time in hours at `iata`.
    /// Unknown airports fall back to the default domestic/international values.
    pub fn get(&self, iata: &str, international: bool, terminal_change: bool) -> f64 {
        let t = table();
        let base = match t.airports.get(&iata.to_ascii_uppercase()) {
            Some(&(domestic, intl)) => {
                if international {
                    intl
                } else {
                    domestic
                }
            }
            None => {
                if international {
                    t.default_international_hours
                } else {
                    t.default_domestic_hours
                }
            }
        };

        if terminal_change {
            base + t.terminal_change_buffer_hours
        } else {
            base
        }
    }
}

/// A transfer is international when the transit country differs from
/// either end of the journey.
pub fn is_international_transfer(
    source_country: &str,
    dest_country: &str,
    transit_country: &str,
) -> bool {
    !transit_country.eq_ignore_ascii_case(source_country)
        || !transit_country.eq_ignore_ascii_case(dest_country)
}
