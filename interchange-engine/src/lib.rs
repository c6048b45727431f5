//! Railway route-discovery engine.
//!
//! Loads a national timetable into an in-memory station graph and answers:
//! "how do I get from this station to that one, with how many changes?"
//! Direct services come first, then journeys with one or more interchanges,
//! scored and ranked.

pub mod cache;
pub mod config;
pub mod domain;
pub mod dto;
pub mod engine;
pub mod graph;
pub mod identity;
pub mod planner;
pub mod schedule;
