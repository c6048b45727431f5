//! Route ranking for search results.
//!
//! Orders candidates so the most useful options come first and trims the
//! list to the configured number of results per kind.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::domain::{RouteResult, SegmentKey, ServiceNumber};

/// Compare two routes, best first.
///
/// 1. Direct before any interchange, fewer interchanges before more
/// 2. Higher score
/// 3. Shorter total duration
/// 4. Earlier departure, then service numbers, so ties are deterministic
pub fn compare_routes(a: &RouteResult, b: &RouteResult) -> Ordering {
    a.kind()
        .cmp(&b.kind())
        .then_with(|| b.score().total_cmp(&a.score()))
        .then_with(|| a.total_duration().cmp(&b.total_duration()))
        .then_with(|| departure_minutes(a).cmp(&departure_minutes(b)))
        .then_with(|| leg_keys(a).cmp(&leg_keys(b)))
}

fn departure_minutes(route: &RouteResult) -> i64 {
    route
        .legs()
        .first()
        .map(|l| l.departure_time().minutes_since_midnight())
        .unwrap_or(0)
}

fn leg_keys(route: &RouteResult) -> Vec<SegmentKey> {
    route.legs().iter().map(|l| l.key()).collect()
}

/// Sort routes best first.
pub fn rank_routes(mut routes: Vec<RouteResult>) -> Vec<RouteResult> {
    routes.sort_by(compare_routes);
    routes
}

/// Drop routes that ride exactly the same legs as an earlier one.
///
/// Keeps the first occurrence, so rank before deduplicating.
pub fn deduplicate(routes: Vec<RouteResult>) -> Vec<RouteResult> {
    let mut seen: HashSet<Vec<SegmentKey>> = HashSet::with_capacity(routes.len());
    routes
        .into_iter()
        .filter(|r| seen.insert(leg_keys(r)))
        .collect()
}

/// Keep only the best-ranked direct result per service.
///
/// Equivalent origin or destination codes can yield several segments of
/// one service (boarding at either of two terminals it calls at).
pub fn best_per_service(routes: Vec<RouteResult>) -> Vec<RouteResult> {
    let mut best: HashMap<ServiceNumber, RouteResult> = HashMap::new();
    for route in routes {
        let Some(number) = route.legs().first().map(|l| l.service_number()) else {
            continue;
        };
        match best.get(&number) {
            Some(existing) if compare_routes(existing, &route) != Ordering::Greater => {}
            _ => {
                best.insert(number, route);
            }
        }
    }
    rank_routes(best.into_values().collect())
}

/// Truncate a ranked list to at most `max_direct` direct results and
/// `max_interchange` interchange results.
pub fn truncate_per_kind(
    routes: Vec<RouteResult>,
    max_direct: usize,
    max_interchange: usize,
) -> Vec<RouteResult> {
    let mut direct = 0;
    let mut interchange = 0;
    routes
        .into_iter()
        .filter(|r| {
            let (count, cap) = if r.kind().is_direct() {
                (&mut direct, max_direct)
            } else {
                (&mut interchange, max_interchange)
            };
            *count += 1;
            *count <= cap
        })
        .collect()
}

/// Rank, deduplicate and truncate.
pub fn finalize(
    routes: Vec<RouteResult>,
    max_direct: usize,
    max_interchange: usize,
) -> Vec<RouteResult> {
    truncate_per_kind(
        deduplicate(rank_routes(routes)),
        max_direct,
        max_interchange,
    )
}
