//! Caching layer for live arrival estimates.
//!
//! An arrival set stays valid until the first of its estimates has passed,
//! at which point the whole set for that stop is dropped and refetched. A
//! TTL bounds how long a set with no estimates in it can be served.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use moka::future::Cache as MokaCache;
use tracing::trace;

use crate::domain::{StopArrivals, StopCode};
use crate::lta::LtaClient;
use crate::planner::{ArrivalProvider, RouteError};

/// Configuration for the arrival cache.
#[derive(Debug, Clone)]
pub struct ArrivalCacheConfig {
    /// Upper bound on how long any entry is kept.
    pub ttl: Duration,

    /// Maximum number of cached stops.
    pub max_capacity: u64,
}

impl Default for ArrivalCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(120),
            max_capacity: 5000,
        }
    }
}

impl ArrivalCacheConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_capacity(mut self, n: u64) -> Self {
        self.max_capacity = n;
        self
    }
}

/// Arrival sets keyed by stop.
pub struct ArrivalCache {
    entries: MokaCache<StopCode, Arc<StopArrivals>>,
}

impl ArrivalCache {
    pub fn new(config: &ArrivalCacheConfig) -> Self {
        let entries = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { entries }
    }

    /// A still-valid arrival set for `stop`. Stale sets are evicted.
    pub async fn get(&self, stop: &StopCode, now: NaiveDateTime) -> Option<Arc<StopArrivals>> {
        let cached = self.entries.get(stop).await?;
        if cached.is_stale(now) {
            trace!(%stop, "arrival set stale");
            self.entries.invalidate(stop).await;
            return None;
        }
        Some(cached)
    }

    pub async fn insert(&self, arrivals: StopArrivals) {
        self.entries
            .insert(arrivals.stop.clone(), Arc::new(arrivals))
            .await;
    }
}

/// Arrival lookups through [`LtaClient`], served from an
/// [`ArrivalCache`] while the cached estimates are still ahead of now.
pub struct CachedArrivalClient {
    client: LtaClient,
    cache: ArrivalCache,
}

impl CachedArrivalClient {
    pub fn new(client: LtaClient, cache_config: &ArrivalCacheConfig) -> Self {
        Self {
            client,
            cache: ArrivalCache::new(cache_config),
        }
    }
}

impl ArrivalProvider for CachedArrivalClient {
    async fn arrival_times(
        &self,
        stop: &StopCode,
        use_cache: bool,
        now: NaiveDateTime,
    ) -> Result<StopArrivals, RouteError> {
        if use_cache {
            if let Some(cached) = self.cache.get(stop, now).await {
                return Ok(StopArrivals::clone(&cached));
            }
        }

        let arrivals = self
            .client
            .get_arrivals(stop)
            .await
            .map_err(|e| RouteError::UpstreamUnavailable(e.to_string()))?;

        self.cache.insert(arrivals.clone()).await;
        Ok(arrivals)
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::Router;
    use axum::extract::State;
    use axum::routing::get;
    use chrono::NaiveDate;
    use serde_json::{Value, json};

    use super::*;
    use crate::lta::LtaConfig;

    fn at(hh: u32, mm: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 13)
            .unwrap()
            .and_hms_opt(hh, mm, 0)
            .unwrap()
    }

    fn stop() -> StopCode {
        StopCode::parse("83139").unwrap()
    }

    fn arrivals_due(hh: u32, mm: u32) -> StopArrivals {
        let mut arrivals = StopArrivals::new(stop());
        arrivals.insert("15", at(hh, mm));
        arrivals
    }

    #[test]
    fn default_config() {
        let config = ArrivalCacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(120));
        assert_eq!(config.max_capacity, 5000);

        let config = config
            .with_ttl(Duration::from_secs(5))
            .with_max_capacity(10);
        assert_eq!(config.ttl, Duration::from_secs(5));
        assert_eq!(config.max_capacity, 10);
    }

    #[tokio::test]
    async fn fresh_entry_is_served() {
        let cache = ArrivalCache::new(&ArrivalCacheConfig::default());
        cache.insert(arrivals_due(12, 5)).await;

        let hit = cache.get(&stop(), at(12, 0)).await.unwrap();
        assert_eq!(hit.get("15"), Some(at(12, 5)));
    }

    #[tokio::test]
    async fn passed_arrival_evicts_the_set() {
        let cache = ArrivalCache::new(&ArrivalCacheConfig::default());
        cache.insert(arrivals_due(12, 5)).await;

        assert!(cache.get(&stop(), at(12, 6)).await.is_none());
        // Gone for earlier readers too.
        assert!(cache.get(&stop(), at(12, 0)).await.is_none());
    }

    async fn arrivals_endpoint(State(hits): State<Arc<AtomicUsize>>) -> axum::Json<Value> {
        hits.fetch_add(1, Ordering::SeqCst);
        axum::Json(json!({
            "BusStopCode": "83139",
            "Services": [
                {"ServiceNo": "15", "NextBus": {"EstimatedArrival": "2024-03-13T12:05:00+08:00"}}
            ]
        }))
    }

    async fn serve(hits: Arc<AtomicUsize>) -> SocketAddr {
        let app = Router::new()
            .route("/BusArrivalv2", get(arrivals_endpoint))
            .with_state(hits);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn cached_client(addr: SocketAddr) -> CachedArrivalClient {
        let client =
            LtaClient::new(LtaConfig::new("secret").with_base_url(format!("http://{addr}")))
                .unwrap();
        CachedArrivalClient::new(client, &ArrivalCacheConfig::default())
    }

    #[tokio::test]
    async fn upstream_is_hit_once_while_fresh() {
        let hits = Arc::new(AtomicUsize::new(0));
        let client = cached_client(serve(hits.clone()).await);

        client.arrival_times(&stop(), true, at(12, 0)).await.unwrap();
        client.arrival_times(&stop(), true, at(12, 1)).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // The cached estimate has passed.
        client.arrival_times(&stop(), true, at(12, 6)).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn bypassing_the_cache_always_fetches() {
        let hits = Arc::new(AtomicUsize::new(0));
        let client = cached_client(serve(hits.clone()).await);

        client.arrival_times(&stop(), false, at(12, 0)).await.unwrap();
        client.arrival_times(&stop(), false, at(12, 0)).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn upstream_failure_is_unavailable() {
        // Nothing listens on the discard port.
        let client = cached_client("127.0.0.1:9".parse().unwrap());
        let err = client
            .arrival_times(&stop(), true, at(12, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::UpstreamUnavailable(_)));
    }
}
