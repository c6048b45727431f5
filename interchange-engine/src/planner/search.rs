//! Tiered route search.
//!
//! Tiers run in order and the first one that finds anything wins:
//!
//! 1. Direct: one service from an origin code to a destination code.
//! 2. Single interchange: one change at any station both sides reach.
//! 3. Double interchange: two changes, both at curated hub stations.
//! 4. Multi interchange: bounded depth-first search over the whole graph.
//!
//! Equivalent station codes are tried wherever a code is: an origin, a
//! destination or a place to change.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};

use chrono::Duration;
use tracing::debug;

use crate::config::EngineConfig;
use crate::domain::{RouteResult, RouteSegment, SegmentKey, ServiceNumber, StationCode, WaitWindow};
use crate::graph::ScheduleGraph;
use crate::identity::StationIdentity;

use super::rank::{best_per_service, finalize};
use super::score::route_score;

/// Deadline for one search.
#[derive(Debug, Clone, Copy)]
pub struct SearchBudget {
    deadline: Option<Instant>,
}

impl SearchBudget {
    /// No deadline. Depth, branching and visited-set bounds still apply.
    pub fn unbounded() -> Self {
        Self { deadline: None }
    }

    pub fn with_timeout(timeout: StdDuration) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Which tier produced a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTier {
    Direct,
    SingleInterchange,
    DoubleInterchange,
    MultiInterchange,
}

impl fmt::Display for SearchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SearchTier::Direct => "direct",
            SearchTier::SingleInterchange => "single-interchange",
            SearchTier::DoubleInterchange => "double-interchange",
            SearchTier::MultiInterchange => "multi-interchange",
        })
    }
}

const TIERS: [SearchTier; 4] = [
    SearchTier::Direct,
    SearchTier::SingleInterchange,
    SearchTier::DoubleInterchange,
    SearchTier::MultiInterchange,
];

/// Result of a route search.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Ranked and truncated routes. Empty when nothing was found.
    pub routes: Vec<RouteResult>,

    /// Tier that produced the routes.
    pub tier: Option<SearchTier>,

    /// Connections and search nodes examined.
    pub explored: usize,

    /// False when the deadline cut the search short.
    pub complete: bool,
}

/// Per-call search state.
struct Query {
    from: Vec<StationCode>,
    to: Vec<StationCode>,
    budget: SearchBudget,
    explored: usize,
    timed_out: bool,
}

impl Query {
    fn is_endpoint(&self, station: &StationCode) -> bool {
        self.from.contains(station) || self.to.contains(station)
    }

    fn out_of_time(&mut self) -> bool {
        if !self.timed_out && self.budget.expired() {
            debug!(explored = self.explored, "Search deadline reached");
            self.timed_out = true;
        }
        self.timed_out
    }
}

/// A partial journey and the time since its first departure.
#[derive(Debug, Clone)]
struct Chain {
    legs: Vec<RouteSegment>,
    elapsed: Duration,
}

impl Chain {
    fn start(leg: RouteSegment) -> Self {
        Self {
            elapsed: leg.duration(),
            legs: vec![leg],
        }
    }

    fn rides(&self, service: ServiceNumber) -> bool {
        self.legs.iter().any(|l| l.service_number() == service)
    }

    /// Append `leg` if the connection is legal.
    fn extend(&self, leg: &RouteSegment, window: &WaitWindow) -> Option<Chain> {
        if self.rides(leg.service_number()) {
            return None;
        }
        let last = self.legs.last()?;
        let wait = window.check(last.arrival_time(), leg.departure_time())?;

        let mut legs = self.legs.clone();
        legs.push(leg.clone());
        Some(Chain {
            legs,
            elapsed: self.elapsed + wait + leg.duration(),
        })
    }

    fn keys(&self) -> Vec<SegmentKey> {
        self.legs.iter().map(RouteSegment::key).collect()
    }
}

/// Route search over one graph generation.
pub struct RouteSearch<'a> {
    graph: &'a ScheduleGraph,
    identity: &'a StationIdentity,
    config: &'a EngineConfig,
    window: WaitWindow,
}

impl<'a> RouteSearch<'a> {
    pub fn new(
        graph: &'a ScheduleGraph,
        identity: &'a StationIdentity,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            graph,
            identity,
            config,
            window: config.wait_window(),
        }
    }

    /// Find ranked routes from `from` to `to`.
    ///
    /// Never fails: an unreachable pair yields no routes.
    pub fn find(&self, from: StationCode, to: StationCode, budget: SearchBudget) -> SearchOutcome {
        let mut query = Query {
            from: self.identity.equivalents_of(&from),
            to: self.identity.equivalents_of(&to),
            budget,
            explored: 0,
            timed_out: false,
        };

        if self.identity.are_equivalent(&from, &to) {
            debug!(%from, %to, "Origin and destination are the same place");
            return SearchOutcome {
                complete: true,
                ..SearchOutcome::default()
            };
        }

        let known = |codes: &[StationCode]| codes.iter().any(|c| self.graph.contains_station(c));
        if !known(query.from.as_slice()) || !known(query.to.as_slice()) {
            debug!(%from, %to, "Station not served by any service");
            return SearchOutcome {
                complete: true,
                ..SearchOutcome::default()
            };
        }

        for tier in TIERS {
            if query.out_of_time() {
                break;
            }
            let started = Instant::now();
            let found = match tier {
                SearchTier::Direct => self.direct_routes(&mut query),
                SearchTier::SingleInterchange => self.single_interchange_routes(&mut query),
                SearchTier::DoubleInterchange => self.double_interchange_routes(&mut query),
                SearchTier::MultiInterchange => self.multi_interchange_routes(&mut query),
            };
            debug!(
                %tier,
                %from,
                %to,
                candidates = found.len(),
                explored = query.explored,
                elapsed_us = started.elapsed().as_micros() as u64,
                "Search tier finished"
            );

            if !found.is_empty() {
                return SearchOutcome {
                    routes: finalize(
                        found,
                        self.config.max_direct_results,
                        self.config.max_interchange_results,
                    ),
                    tier: Some(tier),
                    explored: query.explored,
                    complete: !query.timed_out,
                };
            }
        }

        SearchOutcome {
            routes: Vec::new(),
            tier: None,
            explored: query.explored,
            complete: !query.timed_out,
        }
    }

    fn direct_routes(&self, query: &mut Query) -> Vec<RouteResult> {
        let mut seen: HashSet<SegmentKey> = HashSet::new();
        let mut routes = Vec::new();

        for origin in &query.from {
            for destination in &query.to {
                for leg in self.graph.segments_between(origin, destination) {
                    if seen.insert(leg.key()) {
                        routes.push(self.score(RouteResult::direct(leg.clone())));
                    }
                }
            }

            // Runs to the terminus may pass a destination code somewhere in
            // their itinerary; ride them only as far as that stop.
            for (_, legs) in self.graph.segments_from(origin) {
                for leg in legs {
                    if Some(leg.alight_idx()) != leg.service().last_index() {
                        continue;
                    }
                    query.explored += 1;
                    for destination in &query.to {
                        let Some(idx) = leg.service().find_stop(destination, leg.board_idx().next())
                        else {
                            continue;
                        };
                        if let Ok(trimmed) = leg.truncated_at(idx)
                            && seen.insert(trimmed.key())
                        {
                            routes.push(self.score(RouteResult::direct(trimmed)));
                        }
                    }
                }
            }
        }

        best_per_service(routes)
    }

    fn single_interchange_routes(&self, query: &mut Query) -> Vec<RouteResult> {
        let vias = self.via_candidates(query);
        let mut routes = Vec::new();

        for via in vias.iter().take(self.config.max_interchange_stations) {
            if query.out_of_time() {
                break;
            }
            let first = self.legs_between(&query.from, via);
            let second = self.legs_between(via, &query.to);
            let chains = first.into_iter().map(Chain::start).collect();
            let chains = self.extend_chains(chains, &second, self.config.connections_per_via, query);
            routes.extend(chains.into_iter().filter_map(|c| self.finish(c)));
        }

        routes
    }

    /// Change stations reachable from the origin that have a service on to
    /// the destination, fastest combined ride first.
    fn via_candidates(&self, query: &Query) -> Vec<Vec<StationCode>> {
        let mut groups: BTreeMap<StationCode, (Duration, Vec<StationCode>)> = BTreeMap::new();

        for origin in &query.from {
            for via in self.graph.neighbors_of(origin) {
                if query.is_endpoint(via) {
                    continue;
                }
                let canonical = self.identity.canonical(via);
                if groups.contains_key(&canonical) {
                    continue;
                }
                let members = self.identity.equivalents_of(via);
                let Some(onward) = self.fastest(&members, &query.to) else {
                    continue;
                };
                let Some(inbound) = self.fastest(&query.from, &members) else {
                    continue;
                };
                groups.insert(canonical, (inbound + onward, members));
            }
        }

        let mut ordered: Vec<_> = groups.into_iter().collect();
        ordered.sort_by(|(a_code, (a_time, _)), (b_code, (b_time, _))| {
            a_time.cmp(b_time).then_with(|| a_code.cmp(b_code))
        });
        ordered.into_iter().map(|(_, (_, members))| members).collect()
    }

    fn double_interchange_routes(&self, query: &mut Query) -> Vec<RouteResult> {
        let hubs = self.hub_groups(query);
        let inbound: Vec<Vec<RouteSegment>> = hubs
            .iter()
            .map(|hub| self.legs_between(&query.from, hub))
            .collect();
        let onward: Vec<Vec<RouteSegment>> = hubs
            .iter()
            .map(|hub| self.legs_between(hub, &query.to))
            .collect();

        let keep = self.config.connections_per_via;
        let mut routes = Vec::new();

        for (i, first_hub) in hubs.iter().enumerate() {
            if inbound[i].is_empty() {
                continue;
            }
            for (j, second_hub) in hubs.iter().enumerate() {
                if i == j || onward[j].is_empty() {
                    continue;
                }
                if query.out_of_time() {
                    return routes;
                }
                let middle = self.legs_between(first_hub, second_hub);
                if middle.is_empty() {
                    continue;
                }

                let chains = inbound[i].iter().cloned().map(Chain::start).collect();
                let chains = self.extend_chains(chains, &middle, keep * 4, query);
                let chains = self.extend_chains(chains, &onward[j], keep, query);
                routes.extend(chains.into_iter().filter_map(|c| self.finish(c)));
            }
        }

        routes
    }

    /// Configured hubs as equivalence groups, skipping the endpoints and
    /// hubs the graph does not know.
    fn hub_groups(&self, query: &Query) -> Vec<Vec<StationCode>> {
        let mut seen = HashSet::new();
        self.config
            .hub_stations
            .iter()
            .filter(|hub| !query.is_endpoint(hub))
            .filter(|hub| seen.insert(self.identity.canonical(hub)))
            .map(|hub| self.identity.equivalents_of(hub))
            .filter(|group| group.iter().any(|c| self.graph.contains_station(c)))
            .collect()
    }

    fn multi_interchange_routes(&self, query: &mut Query) -> Vec<RouteResult> {
        let max_legs = self.config.max_interchange_depth + 1;
        if max_legs < 2 {
            return Vec::new();
        }
        let hops = self.hops_to_destination(query, max_legs);
        if query.timed_out {
            return Vec::new();
        }

        let mut visited: HashSet<StationCode> = query
            .from
            .iter()
            .map(|c| self.identity.canonical(c))
            .collect();
        let mut found = Vec::new();
        let origin = query.from.clone();

        self.explore(query, None, &origin, &mut visited, &hops, max_legs, &mut found);
        found
    }

    /// Minimum number of legs from each station to the destination, up to
    /// `max_legs`. Stations missing from the map cannot make it in time.
    fn hops_to_destination(
        &self,
        query: &mut Query,
        max_legs: usize,
    ) -> HashMap<StationCode, usize> {
        let mut hops: HashMap<StationCode, usize> = query.to.iter().map(|c| (*c, 0)).collect();
        let mut queue: VecDeque<(StationCode, usize)> =
            query.to.iter().map(|c| (*c, 0)).collect();

        while let Some((station, depth)) = queue.pop_front() {
            if query.out_of_time() {
                break;
            }
            if depth >= max_legs {
                continue;
            }
            for previous in self.graph.predecessors_of(&station) {
                // Clusters are inserted whole, so one member seen means all were
                if hops.contains_key(previous) {
                    continue;
                }
                query.explored += 1;
                // Arriving anywhere in the cluster lets you board here
                for equivalent in self.identity.equivalents_of(previous) {
                    if !hops.contains_key(&equivalent) {
                        hops.insert(equivalent, depth + 1);
                        queue.push_back((equivalent, depth + 1));
                    }
                }
            }
        }

        hops
    }

    #[allow(clippy::too_many_arguments)]
    fn explore(
        &self,
        query: &mut Query,
        chain: Option<&Chain>,
        at: &[StationCode],
        visited: &mut HashSet<StationCode>,
        hops: &HashMap<StationCode, usize>,
        max_legs: usize,
        found: &mut Vec<RouteResult>,
    ) {
        if query.out_of_time() || found.len() >= self.result_target() {
            return;
        }
        query.explored += 1;
        let used = chain.map_or(0, |c| c.legs.len());

        if let Some(chain) = chain {
            let last = self.legs_between(at, &query.to);
            let done = self.extend_chains(
                vec![chain.clone()],
                &last,
                self.config.connections_per_via,
                query,
            );
            found.extend(done.into_iter().filter_map(|c| self.finish(c)));
        }

        // One more leg to a change station, then at least one to finish
        if used + 2 > max_legs {
            return;
        }

        let mut options: BTreeMap<(usize, StationCode), Vec<StationCode>> = BTreeMap::new();
        let mut considered = HashSet::new();
        for station in at {
            for next in self.graph.neighbors_of(station) {
                if query.is_endpoint(next) {
                    continue;
                }
                let Some(&remaining) = hops.get(next) else {
                    continue;
                };
                if used + 1 + remaining > max_legs {
                    continue;
                }
                let canonical = self.identity.canonical(next);
                if visited.contains(&canonical) || !considered.insert(canonical) {
                    continue;
                }
                options.insert((remaining, canonical), self.identity.equivalents_of(next));
            }
        }

        for ((_, canonical), group) in options.into_iter().take(self.config.max_branching) {
            let legs = self.legs_between(at, &group);
            let next_chains = match chain {
                None => self.fastest_starts(legs),
                Some(chain) => self.extend_chains(vec![chain.clone()], &legs, 1, query),
            };

            visited.insert(canonical);
            for next in &next_chains {
                self.explore(query, Some(next), &group, visited, hops, max_legs, found);
            }
            visited.remove(&canonical);

            if query.timed_out || found.len() >= self.result_target() {
                return;
            }
        }
    }

    /// Enough candidates for ranking to choose from.
    fn result_target(&self) -> usize {
        (self.config.max_interchange_results * 4).max(1)
    }

    fn fastest_starts(&self, mut legs: Vec<RouteSegment>) -> Vec<Chain> {
        legs.sort_by(|a, b| a.duration().cmp(&b.duration()).then_with(|| a.key().cmp(&b.key())));
        legs.truncate(self.config.connections_per_via.max(1));
        legs.into_iter().map(Chain::start).collect()
    }

    /// Every legal extension of `chains` by one of `next`, quickest first,
    /// at most `keep` of them.
    fn extend_chains(
        &self,
        chains: Vec<Chain>,
        next: &[RouteSegment],
        keep: usize,
        query: &mut Query,
    ) -> Vec<Chain> {
        let mut extended = Vec::new();
        for chain in &chains {
            for leg in next {
                query.explored += 1;
                if let Some(longer) = chain.extend(leg, &self.window) {
                    extended.push(longer);
                }
            }
        }
        extended.sort_by(|a, b| a.elapsed.cmp(&b.elapsed).then_with(|| a.keys().cmp(&b.keys())));
        extended.truncate(keep.max(1));
        extended
    }

    fn finish(&self, chain: Chain) -> Option<RouteResult> {
        RouteResult::from_legs(chain.legs, &self.window)
            .ok()
            .map(|route| self.score(route))
    }

    fn score(&self, route: RouteResult) -> RouteResult {
        let score = route_score(&route, self.window.max);
        route.with_score(score)
    }

    fn legs_between(&self, from: &[StationCode], to: &[StationCode]) -> Vec<RouteSegment> {
        from.iter()
            .flat_map(|f| to.iter().map(move |t| (f, t)))
            .flat_map(|(f, t)| self.graph.segments_between(f, t).iter().cloned())
            .collect()
    }

    fn fastest(&self, from: &[StationCode], to: &[StationCode]) -> Option<Duration> {
        from.iter()
            .flat_map(|f| to.iter().map(move |t| (f, t)))
            .flat_map(|(f, t)| self.graph.segments_between(f, t))
            .map(RouteSegment::duration)
            .min()
    }
}
