// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Static aviation reference data shared by the analysis core:
//! minimum connection times, airline alliances and great-circle distance.

pub mod alliance;
pub mod geo;
pub mod mct;

pub use alliance::{get_alliance, is_same_alliance, AllianceIndex};
pub use geo::haversine_km;
pub use mct::{is_international_transfer, ConnectionTimes};
