//! Route result types.
//!
//! A `RouteResult` is one candidate journey: one or more legs joined by
//! interchanges whose waiting times have already been checked.

use std::fmt;

use chrono::Duration;

use super::{DomainError, RouteSegment, ServiceNumber, StationCode, WaitWindow};

/// What kind of journey a result is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RouteKind {
    Direct,
    /// Number of changes between services.
    Interchange(usize),
}

impl RouteKind {
    fn for_legs(legs: usize) -> Self {
        match legs {
            0 | 1 => RouteKind::Direct,
            n => RouteKind::Interchange(n - 1),
        }
    }

    pub fn interchange_count(&self) -> usize {
        match self {
            RouteKind::Direct => 0,
            RouteKind::Interchange(n) => *n,
        }
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, RouteKind::Direct)
    }
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteKind::Direct => f.write_str("direct"),
            RouteKind::Interchange(n) => write!(f, "interchange-{n}"),
        }
    }
}

/// A change from one service to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interchange {
    /// Where the arriving service is left.
    pub station: StationCode,
    /// Where the departing service is boarded. Differs from `station` when
    /// the change is between two terminals of one city.
    pub boarding_station: StationCode,
    pub waiting_time: Duration,
    pub arriving_service: ServiceNumber,
    pub departing_service: ServiceNumber,
    pub arrival_platform: Option<String>,
    pub departure_platform: Option<String>,
}

/// One candidate journey.
///
/// # Invariants
///
/// - At least one leg
/// - `interchanges.len() == legs.len() - 1`
/// - Every interchange wait lies within the window it was built with
#[derive(Debug, Clone)]
pub struct RouteResult {
    kind: RouteKind,
    legs: Vec<RouteSegment>,
    interchanges: Vec<Interchange>,
    total_duration: Duration,
    total_distance_km: f64,
    score: f64,
}

impl RouteResult {
    /// A single-leg journey.
    pub fn direct(leg: RouteSegment) -> Self {
        Self {
            kind: RouteKind::Direct,
            total_duration: leg.duration(),
            total_distance_km: leg.distance_km(),
            legs: vec![leg],
            interchanges: Vec::new(),
            score: 0.0,
        }
    }

    /// Join legs into a journey, checking every connection's waiting time.
    ///
    /// # Errors
    ///
    /// Returns `Err` if there are no legs or a wait falls outside `window`.
    pub fn from_legs(legs: Vec<RouteSegment>, window: &WaitWindow) -> Result<Self, DomainError> {
        if legs.is_empty() {
            return Err(DomainError::EmptyRoute);
        }

        let mut interchanges = Vec::with_capacity(legs.len() - 1);
        for pair in legs.windows(2) {
            let (arriving, departing) = (&pair[0], &pair[1]);
            let wait = window
                .check(arriving.arrival_time(), departing.departure_time())
                .ok_or(DomainError::IllegalWait(*arriving.alight_station()))?;

            interchanges.push(Interchange {
                station: *arriving.alight_station(),
                boarding_station: *departing.board_station(),
                waiting_time: wait,
                arriving_service: arriving.service_number(),
                departing_service: departing.service_number(),
                arrival_platform: arriving.alight_platform().map(str::to_string),
                departure_platform: departing.board_platform().map(str::to_string),
            });
        }

        let riding = legs
            .iter()
            .fold(Duration::zero(), |acc, leg| acc + leg.duration());
        let waiting = interchanges
            .iter()
            .fold(Duration::zero(), |acc, i| acc + i.waiting_time);

        Ok(Self {
            kind: RouteKind::for_legs(legs.len()),
            total_distance_km: legs.iter().map(RouteSegment::distance_km).sum(),
            total_duration: riding + waiting,
            legs,
            interchanges,
            score: 0.0,
        })
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    pub fn kind(&self) -> RouteKind {
        self.kind
    }

    pub fn legs(&self) -> &[RouteSegment] {
        &self.legs
    }

    pub fn interchanges(&self) -> &[Interchange] {
        &self.interchanges
    }

    pub fn total_duration(&self) -> Duration {
        self.total_duration
    }

    pub fn total_distance_km(&self) -> f64 {
        self.total_distance_km
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn interchange_count(&self) -> usize {
        self.interchanges.len()
    }

    /// Sum of all waiting times.
    pub fn total_wait(&self) -> Duration {
        self.interchanges
            .iter()
            .fold(Duration::zero(), |acc, i| acc + i.waiting_time)
    }

    /// Stops visited, counting a same-station interchange once.
    pub fn stop_count(&self) -> usize {
        let visited: usize = self.legs.iter().map(RouteSegment::stop_count).sum();
        let shared = self
            .interchanges
            .iter()
            .filter(|i| i.station == i.boarding_station)
            .count();
        visited - shared
    }

    pub fn origin(&self) -> &StationCode {
        // Safe: at least one leg by construction
        self.legs[0].board_station()
    }

    pub fn destination(&self) -> &StationCode {
        self.legs[self.legs.len() - 1].alight_station()
    }

    /// Service numbers in riding order.
    pub fn service_numbers(&self) -> Vec<ServiceNumber> {
        self.legs.iter().map(RouteSegment::service_number).collect()
    }
}
