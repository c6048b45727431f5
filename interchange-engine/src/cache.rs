//! Caching layer for computed route sets.
//!
//! Results are keyed by (graph generation, canonical from, canonical to).
//! The generation makes a rebuilt graph's answers unreachable from the old
//! ones, so a hit can never mix two builds. Entries expire whole after the
//! TTL; moka checks expiry on read, so a stale entry behaves as a miss.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;

use crate::config::EngineConfig;
use crate::domain::{RouteResult, StationCode};

/// Cache key: (generation, from, to).
type RouteKey = (u64, StationCode, StationCode);

/// Cached, already ranked result set.
pub type RouteEntry = Arc<Vec<RouteResult>>;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(24 * 60 * 60),
            max_capacity: 10_000,
        }
    }
}

impl From<&EngineConfig> for CacheConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            ttl: config.cache_ttl(),
            max_capacity: config.cache_capacity,
        }
    }
}

/// TTL cache of route results.
pub struct RouteCache {
    routes: MokaCache<RouteKey, RouteEntry>,
}

impl RouteCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let routes = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { routes }
    }

    /// Look up a result set.
    pub async fn get(
        &self,
        generation: u64,
        from: StationCode,
        to: StationCode,
    ) -> Option<RouteEntry> {
        self.routes.get(&(generation, from, to)).await
    }

    /// Store a result set, replacing any previous one for the pair.
    pub async fn put(&self, generation: u64, from: StationCode, to: StationCode, entry: RouteEntry) {
        self.routes.insert((generation, from, to), entry).await;
    }

    /// Approximate number of live entries (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.routes.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.routes.invalidate_all();
    }

    /// Apply pending evictions so counts are exact.
    pub async fn sync(&self) {
        self.routes.run_pending_tasks().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        RouteSegment, Service, ServiceCategory, ServiceNumber, Stop, StopIndex, StopTime,
    };

    fn code(s: &str) -> StationCode {
        StationCode::parse(s).unwrap()
    }

    fn entry() -> RouteEntry {
        let service = Arc::new(Service {
            number: ServiceNumber(12001),
            name: "Shatabdi".into(),
            category: ServiceCategory::Shatabdi,
            category_label: "Shatabdi".into(),
            classes: vec![],
            stops: vec![
                Stop::new(code("NDLS"), StopTime::NotApplicable, StopTime::parse("06:00")),
                Stop::new(code("BPL"), StopTime::parse("14:40"), StopTime::NotApplicable),
            ],
        });
        let leg = RouteSegment::new(service, StopIndex(0), StopIndex(1)).unwrap();
        Arc::new(vec![RouteResult::direct(leg)])
    }

    #[test]
    fn default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(86_400));
        assert_eq!(config.max_capacity, 10_000);
    }

    #[test]
    fn config_from_engine_config() {
        let engine = EngineConfig {
            cache_ttl_secs: 30,
            cache_capacity: 5,
            ..EngineConfig::default()
        };
        let config = CacheConfig::from(&engine);
        assert_eq!(config.ttl, Duration::from_secs(30));
        assert_eq!(config.max_capacity, 5);
    }

    #[tokio::test]
    async fn hit_after_put() {
        let cache = RouteCache::new(&CacheConfig::default());
        assert!(cache.get(1, code("NDLS"), code("BPL")).await.is_none());

        let stored = entry();
        cache.put(1, code("NDLS"), code("BPL"), stored.clone()).await;

        let hit = cache.get(1, code("NDLS"), code("BPL")).await.unwrap();
        assert!(Arc::ptr_eq(&hit, &stored));
        // Direction matters
        assert!(cache.get(1, code("BPL"), code("NDLS")).await.is_none());

        cache.sync().await;
        assert_eq!(cache.entry_count(), 1);
    }

    #[tokio::test]
    async fn generations_do_not_mix() {
        let cache = RouteCache::new(&CacheConfig::default());
        cache.put(1, code("NDLS"), code("BPL"), entry()).await;

        assert!(cache.get(2, code("NDLS"), code("BPL")).await.is_none());
    }

    #[tokio::test]
    async fn entries_expire() {
        let cache = RouteCache::new(&CacheConfig {
            ttl: Duration::from_millis(50),
            max_capacity: 10,
        });
        cache.put(1, code("NDLS"), code("BPL"), entry()).await;
        assert!(cache.get(1, code("NDLS"), code("BPL")).await.is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(cache.get(1, code("NDLS"), code("BPL")).await.is_none());
    }

    #[tokio::test]
    async fn invalidate_all_clears() {
        let cache = RouteCache::new(&CacheConfig::default());
        cache.put(1, code("NDLS"), code("BPL"), entry()).await;
        cache.invalidate_all();

        assert!(cache.get(1, code("NDLS"), code("BPL")).await.is_none());
        cache.sync().await;
        assert_eq!(cache.entry_count(), 0);
    }
}
