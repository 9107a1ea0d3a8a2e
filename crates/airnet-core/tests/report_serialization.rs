// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use airnet_core::config::{MissingAirlinePolicy, ParallelRoutePolicy, TransitModel};
use airnet_core::{
    Airport, AnalyzerConfig, NetworkAnalyzer, Objective, Preferences, RouteRecord,
};
use serde_json::Value;
use simplelog::{Config, LevelFilter, TestLogger};

fn init_logging() {
    let _ = TestLogger::init(LevelFilter::Debug, Config::default());
}

fn airports() -> Vec<Airport> {
    serde_json::from_str(
        r#"[
            {"id": 1, "iata": "AAA", "name": "Alpha Field", "city": "Alpha", "country": "Alpha", "lat": 10.0, "lon": 10.0},
            {"id": 2, "iata": "BBB", "name": "Bravo Field", "country": "Bravo", "lat": 12.0, "lon": 12.0},
            {"id": 3, "name": "Unlisted Field", "lat": 14.0, "lon": 14.0}
        ]"#,
    )
    .unwrap()
}

fn routes() -> Vec<RouteRecord> {
    serde_json::from_str(
        r#"[
            {"source_id": 1, "destination_id": 2, "distance_km": 310.0, "airline": "xa"},
            {"source_id": 1, "destination_id": 2, "distance_km": 310.0, "airline": "YB"},
            {"source_id": 2, "destination_id": 1, "airline": "XA"},
            {"source_id": 2, "destination_id": 3, "distance_km": 290.0}
        ]"#,
    )
    .unwrap()
}

#[test]
fn test_config_from_json() {
    let config = AnalyzerConfig::from_json(
        r#"{
            "network": { "parallel_routes": "keep_all" },
            "flight_time": { "transit_model": "connection_time" },
            "routing": { "missing_airline": "include", "max_stops_limit": 4 },
            "resilience": { "recovery_sample": 2 }
        }"#,
    )
    .unwrap();
    assert_eq!(config.network.parallel_routes, ParallelRoutePolicy::KeepAll);
    assert_eq!(config.flight_time.transit_model, TransitModel::ConnectionTime);
    assert_eq!(config.routing.missing_airline, MissingAirlinePolicy::Include);
    assert_eq!(config.routing.max_stops_limit, 4);
    assert_eq!(config.routing.search_budget, 200);
    assert_eq!(config.resilience.recovery_sample, 2);
    assert_eq!(config.hubs.pagerank_alpha, 0.85);

    let analyzer = NetworkAnalyzer::with_config(airports(), routes(), config).unwrap();
    assert_eq!(analyzer.network().edge_count(), 4);
    let err = analyzer
        .find_optimized_route("AAA", "BBB", Objective::Distance, &Preferences::default(), Some(5))
        .unwrap_err();
    assert_eq!(err.kind(), "invalid_request");
}

#[test]
fn test_route_result_json() {
    init_logging();
    let analyzer = NetworkAnalyzer::new(airports(), routes());
    let result = analyzer.find_route("AAA", "BBB").unwrap();
    let json: Value = serde_json::to_value(&result).unwrap();

    assert_eq!(json["path"], serde_json::json!(["AAA", "BBB"]));
    assert_eq!(json["stops"], 0);
    assert_eq!(json["legs"][0]["airline"], "XA");
    assert_eq!(json["legs"][0]["route_count"], 2);
    assert_eq!(json["time"]["number_of_transits"], 0);
}

#[test]
fn test_resilience_report_json() {
    init_logging();
    let analyzer = NetworkAnalyzer::new(airports(), routes());
    let report = analyzer.simulate_hub_removal("BBB").unwrap();
    let json: Value = serde_json::to_value(&report).unwrap();

    assert_eq!(json["hub_removed"], "BBB");
    assert_eq!(json["severity"], "LOW");
    assert_eq!(json["impact"]["nodes_lost"], 1);

    // A -> 3 had only BBB in between: no alternative, infinite distance
    let alt = &json["alternative_paths"][0];
    assert_eq!(alt["original_from"], "AAA");
    assert_eq!(alt["original_to"], "3");
    assert_eq!(alt["recovery"]["status"], "no_alternative");
    assert!(alt["alternative_distance_km"].is_null());
}

#[test]
fn test_hub_report_json() {
    let analyzer = NetworkAnalyzer::new(airports(), routes());
    let report = analyzer.analyze_hubs(None, 1);
    let json: Value = serde_json::to_value(&report).unwrap();

    assert_eq!(json["country"], "Global");
    assert_eq!(json["total_airports"], 2);
    assert_eq!(json["top_hubs"][0]["airport"], "BBB");
    assert!(json["top_hubs"][0]["pagerank"].as_f64().unwrap() > 0.0);
}

#[test]
fn test_preferences_json() {
    let prefs: Preferences = serde_json::from_str(
        r#"{"avoid_countries": ["Bravo"], "preferred_airlines": ["xa"]}"#,
    )
    .unwrap();
    assert!(prefs.preferred_airlines().contains("XA"));

    let json = serde_json::to_value(&prefs).unwrap();
    assert_eq!(json["avoid_countries"], serde_json::json!(["bravo"]));

    let bad = serde_json::from_str::<Preferences>(r#"{"preferred_alliance": "Nope"}"#);
    assert!(bad.is_err());
}
