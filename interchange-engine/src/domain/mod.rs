//! Domain types for the route-discovery engine.
//!
//! This module contains the validated timetable model: station codes,
//! clock times, services with their stops, the segments derived from them
//! and the journeys assembled from segments. Types enforce their
//! invariants at construction time.

mod error;
mod route;
mod segment;
mod service;
mod station;
mod time;

pub use error::DomainError;
pub use route::{Interchange, RouteKind, RouteResult};
pub use segment::{RouteSegment, SegmentKey};
pub use service::{Service, ServiceCategory, ServiceNumber, Stop, StopIndex};
pub use station::{InvalidStationCode, MAX_CODE_LEN, StationCode};
pub use time::{
    ClockTime, MINUTES_PER_DAY, StopTime, TimeError, WaitWindow, elapsed_minutes, waiting_time,
};
