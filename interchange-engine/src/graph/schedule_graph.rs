//! The station to station segment graph.
//!
//! For every service and every pair of its stops (i < j) the graph holds one
//! `RouteSegment` under `edges[station(i)][station(j)]`. It is assembled from
//! per-worker `PartialGraph`s and never mutated once handed to queries.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::domain::{RouteSegment, StationCode};

type Adjacency = HashMap<StationCode, BTreeMap<StationCode, Vec<RouteSegment>>>;

/// Segments collected by a single build worker.
#[derive(Debug, Default)]
pub struct PartialGraph {
    edges: Adjacency,
    names: HashMap<StationCode, String>,
    segments: usize,
}

impl PartialGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a segment under its board and alight stations.
    pub fn add_segment(&mut self, segment: RouteSegment) {
        let from = *segment.board_station();
        let to = *segment.alight_station();
        self.edges
            .entry(from)
            .or_default()
            .entry(to)
            .or_default()
            .push(segment);
        self.segments += 1;
    }

    /// Remember a display name. The first name seen for a code wins.
    pub fn add_name(&mut self, station: StationCode, name: &str) {
        self.names
            .entry(station)
            .or_insert_with(|| name.to_string());
    }

    pub fn segment_count(&self) -> usize {
        self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments == 0
    }
}

/// Read-only adjacency of stations.
///
/// Neighbors iterate in station-code order and segments for a pair keep
/// the order they were merged in, so every traversal is deterministic for
/// a given build.
#[derive(Debug, Default)]
pub struct ScheduleGraph {
    edges: Adjacency,
    predecessors: HashMap<StationCode, BTreeSet<StationCode>>,
    names: HashMap<StationCode, String>,
    segments: usize,
}

impl ScheduleGraph {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a worker's partial graph into this one.
    ///
    /// Callers merge partials in a fixed order (batch order during a
    /// build) so segment lists come out the same on every run.
    pub fn merge(&mut self, partial: PartialGraph) {
        for (from, destinations) in partial.edges {
            let row = self.edges.entry(from).or_default();
            for (to, mut segments) in destinations {
                self.predecessors.entry(to).or_default().insert(from);
                row.entry(to).or_default().append(&mut segments);
            }
        }
        for (station, name) in partial.names {
            self.names.entry(station).or_insert(name);
        }
        self.segments += partial.segments;
    }

    /// Every destination reachable on one service from `station`, with the
    /// segments achieving it.
    pub fn segments_from(
        &self,
        station: &StationCode,
    ) -> impl Iterator<Item = (&StationCode, &[RouteSegment])> {
        self.edges
            .get(station)
            .into_iter()
            .flat_map(|row| row.iter().map(|(to, segs)| (to, segs.as_slice())))
    }

    /// Stations reachable on one service from `station`.
    pub fn neighbors_of(&self, station: &StationCode) -> impl Iterator<Item = &StationCode> {
        self.edges
            .get(station)
            .into_iter()
            .flat_map(|row| row.keys())
    }

    /// Segments riding from `from` to `to`. Empty if there are none.
    pub fn segments_between(&self, from: &StationCode, to: &StationCode) -> &[RouteSegment] {
        self.edges
            .get(from)
            .and_then(|row| row.get(to))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Stations with at least one service to `station`.
    pub fn predecessors_of(&self, station: &StationCode) -> impl Iterator<Item = &StationCode> {
        self.predecessors
            .get(station)
            .into_iter()
            .flat_map(|set| set.iter())
    }

    /// Whether any segment starts or ends at `station`.
    pub fn contains_station(&self, station: &StationCode) -> bool {
        self.edges.contains_key(station) || self.predecessors.contains_key(station)
    }

    /// Number of stations touched by at least one segment.
    pub fn station_count(&self) -> usize {
        self.edges.len()
            + self
                .predecessors
                .keys()
                .filter(|s| !self.edges.contains_key(*s))
                .count()
    }

    pub fn segment_count(&self) -> usize {
        self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments == 0
    }

    /// Display name recorded for a station, if the schedule carried one.
    pub fn station_name(&self, station: &StationCode) -> Option<&str> {
        self.names.get(station).map(String::as_str)
    }
}
