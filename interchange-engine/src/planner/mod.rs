//! Route planner.
//!
//! This module answers "how do I get from station A to station B": direct
//! services first, then one change, two changes at hub stations, and
//! finally a bounded search over any number of changes up to the
//! configured depth. Candidates are scored and ranked before they are
//! returned.

mod rank;
mod score;
mod search;

#[cfg(test)]
mod search_tests;

pub use rank::{compare_routes, finalize, rank_routes};
pub use score::{MAX_DISTANCE_KM, REFERENCE_SPEED_KMH, leg_score, route_score, type_score};
pub use search::{RouteSearch, SearchBudget, SearchOutcome, SearchTier};
