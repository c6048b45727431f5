//! Engine configuration.
//!
//! Every tunable the engine exposes lives here, with defaults and
//! `ROUTE_*` environment overrides.

use std::time::Duration as StdDuration;

use chrono::Duration;
use tracing::warn;

use crate::domain::{StationCode, WaitWindow};

/// Major junctions tried as via points in the double-interchange tier.
const DEFAULT_HUBS: &[&str] = &[
    "NDLS", "CSMT", "HWH", "MAS", "SBC", "SC", "NGP", "ET", "BPL", "JHS", "PRYJ", "DDU", "BZA",
    "KOTA", "BRC", "ADI", "LKO", "CNB", "PNBE", "UMB",
];

/// Configuration parameters for building and querying.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Records fetched from the source per batch.
    pub batch_size: usize,

    /// Batches processed concurrently while building the graph.
    pub max_concurrent_build_workers: usize,

    /// Consecutive source read failures tolerated before the build fails.
    pub max_read_retries: u32,

    /// Backoff before the first retry (milliseconds). Doubles per retry.
    pub retry_backoff_ms: u64,

    /// How long a cached result set stays valid (seconds).
    pub cache_ttl_secs: u64,

    /// Maximum number of cached (from, to) pairs.
    pub cache_capacity: u64,

    /// Shortest legal interchange (minutes).
    pub min_waiting_mins: i64,

    /// Longest legal interchange (minutes).
    pub max_waiting_mins: i64,

    /// Maximum number of interchanges in the general search tier.
    pub max_interchange_depth: usize,

    /// Direct results returned.
    pub max_direct_results: usize,

    /// Interchange results returned.
    pub max_interchange_results: usize,

    /// Via stations explored in the single-interchange tier.
    pub max_interchange_stations: usize,

    /// Best connections kept per via station when pairing legs.
    pub connections_per_via: usize,

    /// Neighbors expanded per station in the general search tier.
    pub max_branching: usize,

    /// Default deadline for a single query (milliseconds).
    pub query_timeout_ms: u64,

    /// Via candidates for the double-interchange tier.
    pub hub_stations: Vec<StationCode>,
}

impl EngineConfig {
    /// Defaults overridden by `ROUTE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        override_parsed(&lookup, "ROUTE_BATCH_SIZE", &mut config.batch_size);
        override_parsed(
            &lookup,
            "ROUTE_BUILD_WORKERS",
            &mut config.max_concurrent_build_workers,
        );
        override_parsed(&lookup, "ROUTE_READ_RETRIES", &mut config.max_read_retries);
        override_parsed(&lookup, "ROUTE_RETRY_BACKOFF_MS", &mut config.retry_backoff_ms);
        override_parsed(&lookup, "ROUTE_CACHE_TTL_SECS", &mut config.cache_ttl_secs);
        override_parsed(&lookup, "ROUTE_CACHE_CAPACITY", &mut config.cache_capacity);
        override_parsed(&lookup, "ROUTE_MIN_WAIT_MINS", &mut config.min_waiting_mins);
        override_parsed(&lookup, "ROUTE_MAX_WAIT_MINS", &mut config.max_waiting_mins);
        override_parsed(
            &lookup,
            "ROUTE_MAX_INTERCHANGES",
            &mut config.max_interchange_depth,
        );
        override_parsed(&lookup, "ROUTE_MAX_DIRECT", &mut config.max_direct_results);
        override_parsed(
            &lookup,
            "ROUTE_MAX_INTERCHANGE_RESULTS",
            &mut config.max_interchange_results,
        );
        override_parsed(
            &lookup,
            "ROUTE_MAX_VIA_STATIONS",
            &mut config.max_interchange_stations,
        );
        override_parsed(
            &lookup,
            "ROUTE_CONNECTIONS_PER_VIA",
            &mut config.connections_per_via,
        );
        override_parsed(&lookup, "ROUTE_MAX_BRANCHING", &mut config.max_branching);
        override_parsed(&lookup, "ROUTE_QUERY_TIMEOUT_MS", &mut config.query_timeout_ms);

        if let Some(raw) = lookup("ROUTE_HUBS") {
            let hubs = parse_codes(&raw);
            if hubs.is_empty() {
                warn!(value = %raw, "ROUTE_HUBS has no valid station codes, keeping defaults");
            } else {
                config.hub_stations = hubs;
            }
        }

        if config.min_waiting_mins < 0 || config.max_waiting_mins < config.min_waiting_mins {
            let defaults = Self::default();
            warn!(
                min = config.min_waiting_mins,
                max = config.max_waiting_mins,
                "Waiting window must satisfy 0 <= min <= max, keeping defaults"
            );
            config.min_waiting_mins = defaults.min_waiting_mins;
            config.max_waiting_mins = defaults.max_waiting_mins;
        }

        config
    }

    pub fn min_waiting_time(&self) -> Duration {
        Duration::minutes(self.min_waiting_mins)
    }

    pub fn max_waiting_time(&self) -> Duration {
        Duration::minutes(self.max_waiting_mins)
    }

    /// The legal interchange window.
    pub fn wait_window(&self) -> WaitWindow {
        WaitWindow::new(self.min_waiting_time(), self.max_waiting_time())
    }

    pub fn cache_ttl(&self) -> StdDuration {
        StdDuration::from_secs(self.cache_ttl_secs)
    }

    pub fn retry_backoff(&self) -> StdDuration {
        StdDuration::from_millis(self.retry_backoff_ms)
    }

    pub fn query_timeout(&self) -> StdDuration {
        StdDuration::from_millis(self.query_timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            max_concurrent_build_workers: 10,
            max_read_retries: 3,
            retry_backoff_ms: 200,
            cache_ttl_secs: 24 * 60 * 60,
            cache_capacity: 10_000,
            min_waiting_mins: 15,
            max_waiting_mins: 360, // 6 hours
            max_interchange_depth: 3,
            max_direct_results: 5,
            max_interchange_results: 3,
            max_interchange_stations: 50,
            connections_per_via: 5,
            max_branching: 8,
            query_timeout_ms: 2_000,
            hub_stations: parse_codes(&DEFAULT_HUBS.join(",")),
        }
    }
}

fn override_parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    slot: &mut T,
) {
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *slot = value,
        Err(_) => warn!(key, value = %raw, "Ignoring unparsable configuration value"),
    }
}

fn parse_codes(raw: &str) -> Vec<StationCode> {
    raw.split(',')
        .filter_map(|c| StationCode::parse(c).ok())
        .collect()
}
