//! Serializable views of route results.
//!
//! The engine itself is serialization-agnostic; these are the plain shapes
//! the binary prints and a request layer can hand straight to serde.

use serde::Serialize;

use crate::domain::{Interchange, RouteResult, RouteSegment, StationCode, Stop};

/// Response for a route query.
#[derive(Debug, Serialize)]
pub struct RoutesResponse {
    pub from: String,
    pub to: String,

    /// Found routes, best first
    pub routes: Vec<RouteView>,
}

/// One candidate journey.
#[derive(Debug, Serialize)]
pub struct RouteView {
    /// "direct", "interchange-1", ...
    pub kind: String,

    pub score: f64,

    /// Total duration in minutes, waits included
    pub total_duration_mins: i64,

    pub total_distance_km: f64,

    /// Stops visited, each interchange counted once
    pub stop_count: usize,

    pub legs: Vec<LegView>,

    pub interchanges: Vec<InterchangeView>,
}

/// A ride on one service.
#[derive(Debug, Serialize)]
pub struct LegView {
    pub train_number: String,
    pub train_name: String,

    /// Type label as given by the timetable
    pub train_type: String,

    /// Normalized category
    pub category: &'static str,

    pub classes: Vec<String>,

    pub origin: StopView,
    pub destination: StopView,

    /// Intermediate stops
    pub stops: Vec<StopView>,

    pub distance_km: f64,
    pub duration_mins: i64,
}

/// A stop for display.
#[derive(Debug, Serialize)]
pub struct StopView {
    pub code: String,
    pub name: Option<String>,

    /// Time at this stop (HH:MM)
    pub time: Option<String>,

    pub platform: Option<String>,

    /// Running day relative to the service's first stop
    pub day: u16,
}

/// A change between services.
#[derive(Debug, Serialize)]
pub struct InterchangeView {
    pub station: String,
    pub boarding_station: String,
    pub waiting_mins: i64,
    pub arriving_train: String,
    pub departing_train: String,
    pub arrival_platform: Option<String>,
    pub departure_platform: Option<String>,
}

// Conversion implementations

impl RoutesResponse {
    pub fn new(from: &StationCode, to: &StationCode, routes: &[RouteResult]) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            routes: routes.iter().map(RouteView::from_route).collect(),
        }
    }
}

impl RouteView {
    /// Create from a domain RouteResult.
    pub fn from_route(route: &RouteResult) -> Self {
        Self {
            kind: route.kind().to_string(),
            score: route.score(),
            total_duration_mins: route.total_duration().num_minutes(),
            total_distance_km: route.total_distance_km(),
            stop_count: route.stop_count(),
            legs: route.legs().iter().map(LegView::from_leg).collect(),
            interchanges: route
                .interchanges()
                .iter()
                .map(InterchangeView::from_interchange)
                .collect(),
        }
    }
}

impl LegView {
    /// Create from a domain RouteSegment.
    pub fn from_leg(leg: &RouteSegment) -> Self {
        let service = leg.service();

        // Exclude board and alight
        let all_stops = leg.stops();
        let stops = if all_stops.len() > 2 {
            all_stops[1..all_stops.len() - 1]
                .iter()
                .map(|s| StopView::from_stop(s, s.arrival_clock().ok().map(|t| t.to_string())))
                .collect()
        } else {
            Vec::new()
        };

        Self {
            train_number: service.number.to_string(),
            train_name: service.name.clone(),
            train_type: service.category_label.clone(),
            category: service.category.as_str(),
            classes: service.classes.clone(),
            origin: StopView::from_stop(leg.board_stop(), Some(leg.departure_time().to_string())),
            destination: StopView::from_stop(leg.alight_stop(), Some(leg.arrival_time().to_string())),
            stops,
            distance_km: leg.distance_km(),
            duration_mins: leg.duration().num_minutes(),
        }
    }
}

impl StopView {
    fn from_stop(stop: &Stop, time: Option<String>) -> Self {
        Self {
            code: stop.station.to_string(),
            name: stop.station_name.clone(),
            time,
            platform: stop.platform.clone(),
            day: stop.day_offset,
        }
    }
}

impl InterchangeView {
    pub fn from_interchange(change: &Interchange) -> Self {
        Self {
            station: change.station.to_string(),
            boarding_station: change.boarding_station.to_string(),
            waiting_mins: change.waiting_time.num_minutes(),
            arriving_train: change.arriving_service.to_string(),
            departing_train: change.departing_service.to_string(),
            arrival_platform: change.arrival_platform.clone(),
            departure_platform: change.departure_platform.clone(),
        }
    }
}
