//! Scenario tests for the tiered route search.

use super::*;
use crate::config::EngineConfig;
use crate::domain::{
    RouteKind, RouteSegment, Service, ServiceCategory, ServiceNumber, StationCode, Stop,
    StopIndex, StopTime,
};
use crate::graph::{PartialGraph, ScheduleGraph};
use crate::identity::{StationIdentity, StationIdentityBuilder};
use chrono::Duration;
use std::sync::Arc;

fn code(s: &str) -> StationCode {
    StationCode::parse(s).unwrap()
}

/// Build a service from (station, arrival, departure, km) tuples.
fn service(number: u32, category: ServiceCategory, calls: &[(&str, &str, &str, f64)]) -> Arc<Service> {
    let stops = calls
        .iter()
        .map(|(station, arr, dep, km)| {
            let mut stop = Stop::new(code(station), StopTime::parse(arr), StopTime::parse(dep));
            stop.distance_km = *km;
            stop
        })
        .collect();
    Arc::new(Service {
        number: ServiceNumber(number),
        name: format!("Service {number}"),
        category,
        category_label: category.as_str().into(),
        classes: vec!["SL".into()],
        stops,
    })
}

/// Two-stop express service.
fn hop(number: u32, from: &str, dep: &str, to: &str, arr: &str, km: f64) -> Arc<Service> {
    service(
        number,
        ServiceCategory::MailExpress,
        &[(from, "", dep, 0.0), (to, arr, "", km)],
    )
}

fn graph_of(services: &[Arc<Service>]) -> ScheduleGraph {
    let mut partial = PartialGraph::new();
    for s in services {
        for i in 0..s.stops.len() {
            for j in (i + 1)..s.stops.len() {
                if s.stops[i].station == s.stops[j].station {
                    continue;
                }
                if let Ok(seg) = RouteSegment::new(s.clone(), StopIndex(i), StopIndex(j)) {
                    partial.add_segment(seg);
                }
            }
        }
    }
    let mut graph = ScheduleGraph::new();
    graph.merge(partial);
    graph
}

fn config() -> EngineConfig {
    EngineConfig {
        hub_stations: vec![],
        ..EngineConfig::default()
    }
}

fn search(
    graph: &ScheduleGraph,
    identity: &StationIdentity,
    config: &EngineConfig,
    from: &str,
    to: &str,
) -> SearchOutcome {
    RouteSearch::new(graph, identity, config).find(code(from), code(to), SearchBudget::unbounded())
}

fn abc_service() -> Arc<Service> {
    service(
        12345,
        ServiceCategory::Superfast,
        &[
            ("AAA", "", "10:00", 0.0),
            ("BBB", "10:30", "10:32", 40.0),
            ("CCC", "11:15", "", 95.0),
        ],
    )
}

// ============================================================================
// Direct tier
// ============================================================================

#[test]
fn direct_route_between_end_points() {
    let graph = graph_of(&[abc_service()]);
    let identity = StationIdentity::new();
    let config = config();

    let outcome = search(&graph, &identity, &config, "AAA", "CCC");

    assert_eq!(outcome.tier, Some(SearchTier::Direct));
    assert!(outcome.complete);
    assert_eq!(outcome.routes.len(), 1);
    let route = &outcome.routes[0];
    assert_eq!(route.kind(), RouteKind::Direct);
    assert_eq!(route.legs().len(), 1);
    assert_eq!(route.legs()[0].distance_km(), 95.0);
    assert_eq!(route.total_duration(), Duration::minutes(75));
    assert_eq!(route.legs()[0].stops().len(), 3);
    assert!(route.score() > 0.0);
}

#[test]
fn direct_routes_for_every_sub_journey() {
    let graph = graph_of(&[abc_service()]);
    let identity = StationIdentity::new();
    let config = config();

    let ab = search(&graph, &identity, &config, "AAA", "BBB");
    assert_eq!(ab.routes.len(), 1);
    assert_eq!(ab.routes[0].kind(), RouteKind::Direct);
    assert_eq!(ab.routes[0].total_duration(), Duration::minutes(30));

    let bc = search(&graph, &identity, &config, "BBB", "CCC");
    assert_eq!(bc.routes.len(), 1);
    assert_eq!(bc.routes[0].kind(), RouteKind::Direct);
    assert_eq!(bc.routes[0].legs()[0].departure_time().to_string(), "10:32");
    assert_eq!(bc.routes[0].legs()[0].distance_km(), 55.0);
}

#[test]
fn direct_beats_any_interchange() {
    let graph = graph_of(&[
        hop(1, "AAA", "08:00", "CCC", "12:00", 300.0),
        hop(2, "AAA", "08:00", "BBB", "09:00", 100.0),
        hop(3, "BBB", "09:30", "CCC", "10:30", 100.0),
    ]);
    let identity = StationIdentity::new();
    let config = config();

    let outcome = search(&graph, &identity, &config, "AAA", "CCC");
    assert_eq!(outcome.tier, Some(SearchTier::Direct));
    assert!(outcome.routes.iter().all(|r| r.kind().is_direct()));
}

#[test]
fn faster_longer_candidate_ranks_first() {
    let graph = graph_of(&[
        hop(1, "AAA", "10:00", "BBB", "12:00", 100.0),
        hop(2, "AAA", "10:00", "BBB", "12:00", 120.0),
    ]);
    let identity = StationIdentity::new();
    let config = config();

    let outcome = search(&graph, &identity, &config, "AAA", "BBB");
    assert_eq!(outcome.routes.len(), 2);
    assert_eq!(outcome.routes[0].service_numbers(), vec![ServiceNumber(2)]);
    assert!(outcome.routes[0].score() >= outcome.routes[1].score());
}

#[test]
fn direct_results_are_capped() {
    let services: Vec<_> = (1..=8)
        .map(|n| hop(n, "AAA", "10:00", "BBB", "12:00", 100.0 + n as f64))
        .collect();
    let graph = graph_of(&services);
    let identity = StationIdentity::new();
    let config = config();

    let outcome = search(&graph, &identity, &config, "AAA", "BBB");
    assert_eq!(outcome.routes.len(), config.max_direct_results);
}

#[test]
fn one_result_per_service_across_equivalent_boarding_points() {
    let graph = graph_of(&[service(
        12002,
        ServiceCategory::Shatabdi,
        &[
            ("NDLS", "", "06:00", 0.0),
            ("NZM", "06:20", "06:25", 8.0),
            ("BPL", "14:00", "", 700.0),
        ],
    )]);
    let identity = StationIdentityBuilder::new()
        .cluster("Delhi", &["NDLS", "NZM"])
        .build();
    let config = config();

    let outcome = search(&graph, &identity, &config, "NDLS", "BPL");
    assert_eq!(outcome.routes.len(), 1);
    assert_eq!(outcome.routes[0].service_numbers(), vec![ServiceNumber(12002)]);
}

// ============================================================================
// Equivalence and unreachable pairs
// ============================================================================

#[test]
fn equivalent_origins_give_identical_results() {
    let graph = graph_of(&[
        hop(1, "NZM", "07:00", "BPL", "14:00", 700.0),
        hop(2, "NDLS", "09:00", "BPL", "17:00", 705.0),
    ]);
    let identity = StationIdentityBuilder::new()
        .cluster("Delhi", &["NDLS", "NZM", "DLI"])
        .build();
    let config = config();

    let from_ndls = search(&graph, &identity, &config, "NDLS", "BPL");
    let from_nzm = search(&graph, &identity, &config, "NZM", "BPL");
    let from_dli = search(&graph, &identity, &config, "DLI", "BPL");

    assert!(!from_ndls.routes.is_empty());
    let summary = |o: &SearchOutcome| {
        o.routes
            .iter()
            .map(|r| (r.service_numbers(), r.score(), r.total_duration()))
            .collect::<Vec<_>>()
    };
    assert_eq!(summary(&from_ndls), summary(&from_nzm));
    assert_eq!(summary(&from_ndls), summary(&from_dli));
    assert_eq!(from_ndls.routes.len(), 2);
}

#[test]
fn unreachable_pair_is_empty_not_error() {
    let graph = graph_of(&[
        hop(1, "AAA", "10:00", "BBB", "11:00", 50.0),
        hop(2, "CCC", "10:00", "DDD", "11:00", 50.0),
    ]);
    let identity = StationIdentity::new();
    let config = config();

    let outcome = search(&graph, &identity, &config, "AAA", "DDD");
    assert!(outcome.routes.is_empty());
    assert!(outcome.complete);
    assert_eq!(outcome.tier, None);

    // Wrong direction
    assert!(search(&graph, &identity, &config, "BBB", "AAA").routes.is_empty());
}

#[test]
fn unknown_station_is_empty() {
    let graph = graph_of(&[abc_service()]);
    let identity = StationIdentity::new();
    let config = config();

    let outcome = search(&graph, &identity, &config, "AAA", "ZZZ");
    assert!(outcome.routes.is_empty());
    assert!(outcome.complete);
}

#[test]
fn same_place_is_empty() {
    let graph = graph_of(&[hop(1, "NDLS", "10:00", "NZM", "10:20", 8.0)]);
    let identity = StationIdentityBuilder::new()
        .cluster("Delhi", &["NDLS", "NZM"])
        .build();
    let config = config();

    assert!(search(&graph, &identity, &config, "NDLS", "NZM").routes.is_empty());
}

// ============================================================================
// Single interchange
// ============================================================================

#[test]
fn wait_across_midnight_is_twenty_minutes() {
    let graph = graph_of(&[
        hop(1, "XXX", "22:00", "YYY", "23:50", 150.0),
        hop(2, "YYY", "00:10", "ZZZ", "01:00", 60.0),
    ]);
    let identity = StationIdentity::new();
    let config = config();

    let outcome = search(&graph, &identity, &config, "XXX", "ZZZ");
    assert_eq!(outcome.tier, Some(SearchTier::SingleInterchange));
    let route = &outcome.routes[0];
    assert_eq!(route.kind(), RouteKind::Interchange(1));
    assert_eq!(route.interchanges()[0].station, code("YYY"));
    assert_eq!(route.interchanges()[0].waiting_time, Duration::minutes(20));
    assert_eq!(route.total_duration(), Duration::minutes(110 + 20 + 50));
}

#[test]
fn wait_below_minimum_is_rejected() {
    let graph = graph_of(&[
        hop(1, "XXX", "22:00", "YYY", "23:50", 150.0),
        hop(2, "YYY", "00:10", "ZZZ", "01:00", 60.0),
    ]);
    let identity = StationIdentity::new();
    let config = EngineConfig {
        min_waiting_mins: 30,
        ..config()
    };

    let outcome = search(&graph, &identity, &config, "XXX", "ZZZ");
    assert!(outcome.routes.is_empty());
}

#[test]
fn wait_above_maximum_is_rejected() {
    let graph = graph_of(&[
        hop(1, "AAA", "08:00", "BBB", "09:00", 80.0),
        hop(2, "BBB", "16:00", "CCC", "17:00", 80.0),
    ]);
    let identity = StationIdentity::new();
    let config = config();

    assert!(search(&graph, &identity, &config, "AAA", "CCC").routes.is_empty());
}

#[test]
fn change_between_equivalent_terminals() {
    let graph = graph_of(&[
        hop(1, "AGC", "06:00", "NDLS", "08:00", 200.0),
        hop(2, "NZM", "09:00", "UMB", "12:00", 250.0),
    ]);
    let identity = StationIdentityBuilder::new()
        .cluster("Delhi", &["NDLS", "NZM"])
        .build();
    let config = config();

    let outcome = search(&graph, &identity, &config, "AGC", "UMB");
    assert_eq!(outcome.routes.len(), 1);
    let change = &outcome.routes[0].interchanges()[0];
    assert_eq!(change.station, code("NDLS"));
    assert_eq!(change.boarding_station, code("NZM"));
    assert_eq!(change.waiting_time, Duration::minutes(60));
    assert_eq!(outcome.routes[0].stop_count(), 4);
}

#[test]
fn interchange_results_are_capped_and_ranked() {
    let mut services = vec![hop(1, "AAA", "08:00", "BBB", "09:00", 100.0)];
    for n in 0..5u32 {
        let dep = format!("{:02}:00", 10 + n);
        let arr = format!("{:02}:00", 11 + n);
        services.push(hop(10 + n, "BBB", &dep, "CCC", &arr, 100.0));
    }
    let graph = graph_of(&services);
    let identity = StationIdentity::new();
    let config = config();

    let outcome = search(&graph, &identity, &config, "AAA", "CCC");
    assert_eq!(outcome.routes.len(), config.max_interchange_results);
    // Shortest wait scores best
    assert_eq!(
        outcome.routes[0].service_numbers(),
        vec![ServiceNumber(1), ServiceNumber(10)]
    );
    let scores: Vec<f64> = outcome.routes.iter().map(|r| r.score()).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

// ============================================================================
// Double and multi interchange
// ============================================================================

#[test]
fn double_interchange_through_hubs() {
    let graph = graph_of(&[
        hop(1, "AAA", "08:00", "HUBA", "09:00", 90.0),
        hop(2, "HUBA", "09:30", "HUBB", "10:30", 90.0),
        hop(3, "HUBB", "11:00", "DDD", "12:00", 90.0),
    ]);
    let identity = StationIdentity::new();
    let config = EngineConfig {
        hub_stations: vec![code("HUBA"), code("HUBB")],
        ..config()
    };

    let outcome = search(&graph, &identity, &config, "AAA", "DDD");
    assert_eq!(outcome.tier, Some(SearchTier::DoubleInterchange));
    let route = &outcome.routes[0];
    assert_eq!(route.kind(), RouteKind::Interchange(2));
    assert_eq!(route.total_duration(), Duration::minutes(240));
    assert_eq!(route.total_distance_km(), 270.0);
    assert_eq!(route.stop_count(), 4);
}

fn four_leg_chain() -> Vec<Arc<Service>> {
    vec![
        hop(1, "AAA", "08:00", "PPP", "09:00", 60.0),
        hop(2, "PPP", "09:30", "QQQ", "10:30", 60.0),
        hop(3, "QQQ", "11:00", "RRR", "12:00", 60.0),
        hop(4, "RRR", "12:30", "DDD", "13:30", 60.0),
    ]
}

#[test]
fn general_search_finds_long_chains() {
    let graph = graph_of(&four_leg_chain());
    let identity = StationIdentity::new();
    let config = config();

    let outcome = search(&graph, &identity, &config, "AAA", "DDD");
    assert_eq!(outcome.tier, Some(SearchTier::MultiInterchange));
    let route = &outcome.routes[0];
    assert_eq!(route.kind(), RouteKind::Interchange(3));
    assert_eq!(
        route.service_numbers(),
        vec![ServiceNumber(1), ServiceNumber(2), ServiceNumber(3), ServiceNumber(4)]
    );
    for change in route.interchanges() {
        assert_eq!(change.waiting_time, Duration::minutes(30));
    }
}

#[test]
fn general_search_respects_depth_bound() {
    let graph = graph_of(&four_leg_chain());
    let identity = StationIdentity::new();
    let config = EngineConfig {
        max_interchange_depth: 2,
        ..config()
    };

    let outcome = search(&graph, &identity, &config, "AAA", "DDD");
    assert!(outcome.routes.is_empty());
    assert!(outcome.complete);
}

#[test]
fn general_search_does_not_loop() {
    let mut services = four_leg_chain();
    // A cycle back to the origin side
    services.push(hop(5, "PPP", "09:20", "AAA", "09:40", 60.0));
    services.push(hop(6, "QQQ", "10:45", "PPP", "11:30", 60.0));
    let graph = graph_of(&services);
    let identity = StationIdentity::new();
    let config = config();

    let outcome = search(&graph, &identity, &config, "AAA", "DDD");
    assert_eq!(outcome.routes.len(), 1);
    assert_eq!(outcome.routes[0].kind(), RouteKind::Interchange(3));
}

#[test]
fn expired_deadline_stops_search() {
    let graph = graph_of(&four_leg_chain());
    let identity = StationIdentity::new();
    let config = config();

    let outcome = RouteSearch::new(&graph, &identity, &config).find(
        code("AAA"),
        code("DDD"),
        SearchBudget::with_timeout(std::time::Duration::ZERO),
    );
    assert!(outcome.routes.is_empty());
    assert!(!outcome.complete);
}

#[test]
fn results_are_deterministic() {
    let mut services = vec![hop(1, "AAA", "08:00", "BBB", "09:00", 100.0)];
    for n in 0..4u32 {
        services.push(hop(20 + n, "BBB", "10:00", "CCC", "11:00", 100.0));
    }
    let graph = graph_of(&services);
    let identity = StationIdentity::new();
    let config = config();

    let first = search(&graph, &identity, &config, "AAA", "CCC");
    let second = search(&graph, &identity, &config, "AAA", "CCC");
    let numbers = |o: &SearchOutcome| o.routes.iter().map(|r| r.service_numbers()).collect::<Vec<_>>();
    assert_eq!(numbers(&first), numbers(&second));
    // Equal on score and duration, so service number decides
    assert_eq!(numbers(&first)[0], vec![ServiceNumber(1), ServiceNumber(20)]);
}
