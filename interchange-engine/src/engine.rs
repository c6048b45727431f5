//! The route engine.
//!
//! `Engine` owns everything a query touches: the current graph generation,
//! the station identity table and the route cache. Build it once at
//! startup and share it (usually behind an `Arc`).
//!
//! A generation is a frozen `ScheduleGraph` plus a number. Queries clone
//! the current generation's `Arc` and never hold a lock while searching, so
//! a rebuild can swap in a new generation without waiting for them.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, RwLock, watch};
use tracing::{debug, info, warn};

use crate::cache::{CacheConfig, RouteCache, RouteEntry};
use crate::config::EngineConfig;
use crate::domain::StationCode;
use crate::graph::{BuildError, BuildReport, GraphBuilder, ScheduleGraph};
use crate::identity::StationIdentity;
use crate::planner::{RouteSearch, SearchBudget};
use crate::schedule::ScheduleSource;

/// Errors surfaced by the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No graph has been built yet
    #[error("route engine is not ready")]
    NotReady,

    /// The graph could not be built
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// One frozen build of the graph.
#[derive(Debug)]
struct Generation {
    id: u64,
    graph: ScheduleGraph,
    report: BuildReport,
}

/// Route engine with a readiness gate.
pub struct Engine {
    config: Arc<EngineConfig>,
    identity: Arc<StationIdentity>,
    current: RwLock<Option<Arc<Generation>>>,
    ready: watch::Sender<bool>,
    cache: RouteCache,
    generations: AtomicU64,
    /// Serializes builds so generation numbers match install order.
    build_lock: Mutex<()>,
}

impl Engine {
    /// Create an engine with no graph. Queries report `NotReady` until
    /// `initialize` succeeds.
    pub fn new(config: EngineConfig, identity: StationIdentity) -> Self {
        let cache = RouteCache::new(&CacheConfig::from(&config));
        let (ready, _) = watch::channel(false);
        Self {
            config: Arc::new(config),
            identity: Arc::new(identity),
            current: RwLock::new(None),
            ready,
            cache,
            generations: AtomicU64::new(0),
            build_lock: Mutex::new(()),
        }
    }

    /// Build the graph from `source` and open the engine for queries.
    pub async fn initialize<S: ScheduleSource>(
        &self,
        source: &mut S,
    ) -> Result<BuildReport, EngineError> {
        self.install(source).await
    }

    /// Build a fresh generation from `source` and swap it in.
    ///
    /// Queries keep being served from the previous generation while the
    /// build runs. On failure the previous generation stays in place.
    pub async fn rebuild<S: ScheduleSource>(
        &self,
        source: &mut S,
    ) -> Result<BuildReport, EngineError> {
        self.install(source).await
    }

    async fn install<S: ScheduleSource>(&self, source: &mut S) -> Result<BuildReport, EngineError> {
        let _building = self.build_lock.lock().await;

        let (graph, report) = match GraphBuilder::new(&self.config).build(source).await {
            Ok(built) => built,
            Err(e) => {
                warn!(error = %e, ready = self.is_ready(), "Schedule graph build failed");
                return Err(e.into());
            }
        };

        let id = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Arc::new(Generation {
            id,
            graph,
            report: report.clone(),
        });

        *self.current.write().await = Some(generation);
        self.cache.invalidate_all();
        self.ready.send_replace(true);

        info!(
            generation = id,
            stations = report.stations,
            segments = report.segments,
            "Route engine ready"
        );
        Ok(report)
    }

    /// Whether a graph has been installed.
    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Wait until a graph has been installed.
    pub async fn wait_ready(&self) {
        let mut rx = self.ready.subscribe();
        // The sender lives as long as self, so this only ends once ready
        let _ = rx.wait_for(|ready| *ready).await;
    }

    /// Ranked routes from `from` to `to` using the configured query timeout.
    ///
    /// Returns `NotReady` instead of waiting if no graph is installed yet.
    /// An unreachable pair is an empty list, not an error.
    pub async fn find_routes(
        &self,
        from: StationCode,
        to: StationCode,
    ) -> Result<RouteEntry, EngineError> {
        self.find_routes_within(from, to, self.config.query_timeout())
            .await
    }

    /// Like `find_routes`, but waits for the engine to become ready.
    pub async fn find_routes_ready(&self, from: StationCode, to: StationCode) -> RouteEntry {
        loop {
            self.wait_ready().await;
            if let Some(generation) = self.current_generation().await {
                return self
                    .query(&generation, from, to, self.config.query_timeout())
                    .await;
            }
        }
    }

    /// Ranked routes with an explicit deadline for the search.
    ///
    /// A search cut short by the deadline returns what it found so far and
    /// is not cached.
    pub async fn find_routes_within(
        &self,
        from: StationCode,
        to: StationCode,
        timeout: Duration,
    ) -> Result<RouteEntry, EngineError> {
        let generation = self
            .current_generation()
            .await
            .ok_or(EngineError::NotReady)?;
        Ok(self.query(&generation, from, to, timeout).await)
    }

    async fn current_generation(&self) -> Option<Arc<Generation>> {
        self.current.read().await.clone()
    }

    async fn query(
        &self,
        generation: &Arc<Generation>,
        from: StationCode,
        to: StationCode,
        timeout: Duration,
    ) -> RouteEntry {
        // Equivalent codes share one entry; the search only sees clusters
        let key_from = self.identity.canonical(&from);
        let key_to = self.identity.canonical(&to);

        if let Some(hit) = self.cache.get(generation.id, key_from, key_to).await {
            debug!(%from, %to, generation = generation.id, "Route cache hit");
            return hit;
        }
        debug!(%from, %to, generation = generation.id, "Route cache miss");

        // The search is CPU-bound; keep it off the async workers
        let budget = SearchBudget::with_timeout(timeout);
        let searched = Arc::clone(generation);
        let identity = Arc::clone(&self.identity);
        let config = Arc::clone(&self.config);
        let outcome = match tokio::task::spawn_blocking(move || {
            RouteSearch::new(&searched.graph, &identity, &config).find(from, to, budget)
        })
        .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, %from, %to, "Route search task failed");
                return Arc::new(Vec::new());
            }
        };
        let entry = Arc::new(outcome.routes);

        if outcome.complete {
            self.cache
                .put(generation.id, key_from, key_to, entry.clone())
                .await;
        } else {
            debug!(
                %from,
                %to,
                explored = outcome.explored,
                "Search hit its deadline, result not cached"
            );
        }
        entry
    }

    /// Number of the installed generation, 0 before the first build.
    pub async fn generation(&self) -> u64 {
        self.current_generation().await.map_or(0, |g| g.id)
    }

    /// Report of the build behind the installed generation.
    pub async fn build_report(&self) -> Option<BuildReport> {
        self.current_generation().await.map(|g| g.report.clone())
    }

    /// Display name of a station, if the schedule carried one.
    pub async fn station_name(&self, station: &StationCode) -> Option<String> {
        self.current_generation()
            .await
            .and_then(|g| g.graph.station_name(station).map(str::to_string))
    }

    pub fn identity(&self) -> &StationIdentity {
        &self.identity
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Approximate number of cached result sets.
    pub fn cached_entries(&self) -> u64 {
        self.cache.entry_count()
    }
}
