//! Offline network reduction.
//!
//! Summarises each service into hub-to-hub, hub-to-spoke and spoke-to-hub
//! aggregate segments plus route descriptions, so the hub-and-spoke finder
//! can search a far smaller graph than the finegrain network.
//!
//! A run clears previous aggregates and regenerates them, so running it
//! twice over unchanged data yields the same result.

mod cache;
mod reduce;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::{SegmentType, ServiceKey};
use crate::store::{NetworkStore, RouteQuery, SegmentQuery, StoreError};

pub use cache::ResolutionCache;
pub use reduce::{ServiceReduction, reduce_service};

/// Errors from network reduction.
#[derive(Debug, thiserror::Error)]
pub enum ReduceError {
    /// The service has no finegrain segments to summarise
    #[error("service {0} has no finegrain segments")]
    NoSegments(ServiceKey),

    /// A referenced stop or service is missing
    #[error("service {service}: {message}")]
    DataIntegrity { service: ServiceKey, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The blocking worker running a batch panicked or was cancelled
    #[error("reduction worker failed: {0}")]
    Worker(String),
}

/// Configuration for a reduction run.
#[derive(Debug, Clone)]
pub struct ReducerConfig {
    /// Services reduced and written per batch.
    pub batch_size: usize,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self { batch_size: 64 }
    }
}

impl ReducerConfig {
    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.batch_size = n;
        self
    }
}

/// Counts from one reduction run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReductionSummary {
    pub services_reduced: usize,
    pub services_skipped: usize,
    pub hub_to_hub_segments: usize,
    pub spoke_segments: usize,
    pub route_descriptions: usize,
}

/// Regenerates aggregate segments and route descriptions in a store.
pub struct NetworkReducer<'a, S> {
    store: &'a S,
    config: ReducerConfig,
}

impl<'a, S: NetworkStore> NetworkReducer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self::with_config(store, ReducerConfig::default())
    }

    pub fn with_config(store: &'a S, config: ReducerConfig) -> Self {
        Self { store, config }
    }

    /// Run a full reduction.
    ///
    /// Services that cannot be reduced are logged and skipped. Store
    /// failures abort the run.
    pub async fn run(&self) -> Result<ReductionSummary, ReduceError> {
        let mut cleared = 0;
        for ty in SegmentType::AGGREGATES {
            cleared += self.store.delete_segments(&SegmentQuery::of_type(ty)).await?;
        }
        let cleared_routes = self
            .store
            .delete_route_descriptions(&RouteQuery::all())
            .await?;
        debug!(
            segments = cleared,
            route_descriptions = cleared_routes,
            "cleared previous aggregates"
        );

        let services = self.store.find_services().await?;
        info!(services = services.len(), "reducing network");

        let mut cache = ResolutionCache::new();
        let mut summary = ReductionSummary::default();

        for batch in services.chunks(self.config.batch_size.max(1)) {
            // Load sequentially so the workers never touch the store.
            let mut work = Vec::with_capacity(batch.len());
            for service in batch {
                let mut finegrain = self
                    .store
                    .find_segments(
                        &SegmentQuery::of_type(SegmentType::Finegrain)
                            .with_service(service.key.clone()),
                    )
                    .await?;
                finegrain.sort_by_key(|s| s.sequence);
                cache.warm(self.store, service, &finegrain).await?;
                cache.insert_service(service.clone());
                work.push((service.key.clone(), finegrain));
            }

            let (returned, results) = tokio::task::spawn_blocking(move || {
                let results: Vec<_> = work
                    .par_iter()
                    .map(|(key, finegrain)| (key.clone(), reduce_service(key, finegrain, &cache)))
                    .collect();
                (cache, results)
            })
            .await
            .map_err(|e| ReduceError::Worker(e.to_string()))?;
            cache = returned;

            let mut segments = Vec::new();
            let mut routes = Vec::new();
            for (key, result) in results {
                match result {
                    Ok(reduction) => {
                        summary.services_reduced += 1;
                        for segment in &reduction.segments {
                            if segment.segment_type == SegmentType::HubToHub {
                                summary.hub_to_hub_segments += 1;
                            } else {
                                summary.spoke_segments += 1;
                            }
                        }
                        segments.extend(reduction.segments);
                        routes.extend(reduction.routes);
                    }
                    Err(e) => {
                        summary.services_skipped += 1;
                        warn!(service = %key, error = %e, "skipping service");
                    }
                }
            }

            self.store.insert_segments(segments).await?;
            summary.route_descriptions += self.store.insert_route_descriptions(routes).await?;
            debug!(
                reduced = summary.services_reduced,
                skipped = summary.services_skipped,
                "batch written"
            );
        }

        info!(
            reduced = summary.services_reduced,
            skipped = summary.services_skipped,
            hub_to_hub = summary.hub_to_hub_segments,
            spokes = summary.spoke_segments,
            route_descriptions = summary.route_descriptions,
            lookups = cache.lookups(),
            "reduction complete"
        );

        Ok(summary)
    }
}
