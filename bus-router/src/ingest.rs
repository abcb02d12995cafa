//! Batch ingestion of the bus network.
//!
//! Replaces the stored network with a fresh copy from a [`NetworkSource`]
//! and regenerates the hub-and-spoke aggregates.

use std::future::Future;
use std::time::Duration;

use tracing::info;

use crate::lta::{LtaError, NetworkSource};
use crate::reducer::{NetworkReducer, ReduceError, ReductionSummary};
use crate::store::{NetworkStore, RouteQuery, SegmentQuery, StoreError};

/// Errors from an ingestion run.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("upstream fetch failed: {0}")]
    Upstream(#[from] LtaError),

    /// A dataset fetch exceeded its time budget
    #[error("timed out fetching {0}")]
    Timeout(&'static str),

    /// Bus speeds must be positive and finite
    #[error("invalid {name} speed: {value} km/h")]
    InvalidSpeed { name: &'static str, value: f64 },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Reduce(#[from] ReduceError),
}

/// Configuration for an ingestion run.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Assumed speed between closely spaced stops (km/h).
    pub normal_speed: f64,

    /// Assumed speed over long hops (km/h).
    pub express_speed: f64,

    /// Upper bound on fetching each dataset.
    pub fetch_timeout: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            normal_speed: 22.0,
            express_speed: 30.0,
            fetch_timeout: Duration::from_secs(600),
        }
    }
}

impl IngestConfig {
    pub fn with_speeds(mut self, normal: f64, express: f64) -> Self {
        self.normal_speed = normal;
        self.express_speed = express;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Reject speeds that would make hop times meaningless.
    pub fn validate(&self) -> Result<(), IngestError> {
        for (name, value) in [("normal", self.normal_speed), ("express", self.express_speed)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(IngestError::InvalidSpeed { name, value });
            }
        }
        Ok(())
    }
}

/// Counts from one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub stops: usize,
    pub services: usize,
    pub segments: usize,
    pub reduction: ReductionSummary,
}

async fn bounded<T>(
    what: &'static str,
    limit: Duration,
    fetch: impl Future<Output = Result<T, LtaError>>,
) -> Result<T, IngestError> {
    match tokio::time::timeout(limit, fetch).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(IngestError::Timeout(what)),
    }
}

/// Clear the store, load the network from `source`, then reduce it.
///
/// The store is cleared before fetching, so a failed run leaves it empty
/// rather than half old and half new. An invalid config fails before
/// anything is cleared.
pub async fn run_ingestion<N: NetworkSource, S: NetworkStore>(
    source: &N,
    store: &S,
    config: &IngestConfig,
) -> Result<IngestSummary, IngestError> {
    config.validate()?;

    store.delete_route_descriptions(&RouteQuery::all()).await?;
    store.delete_segments(&SegmentQuery::all()).await?;
    store.delete_services().await?;
    store.delete_stops().await?;
    info!("cleared stored network");

    let limit = config.fetch_timeout;
    let (stops, services, segments) = tokio::try_join!(
        bounded("bus stops", limit, source.fetch_all_stops()),
        bounded("bus services", limit, source.fetch_all_services()),
        bounded(
            "bus routes",
            limit,
            source.fetch_all_segments(config.normal_speed, config.express_speed)
        ),
    )?;

    let summary_stops = store.insert_stops(stops).await?;
    info!(count = summary_stops, "saved bus stops");
    let summary_services = store.insert_services(services).await?;
    info!(count = summary_services, "saved bus services");
    let summary_segments = store.insert_segments(segments).await?;
    info!(count = summary_segments, "saved finegrain segments");

    let reduction = NetworkReducer::new(store).run().await?;

    Ok(IngestSummary {
        stops: summary_stops,
        services: summary_services,
        segments: summary_segments,
        reduction,
    })
}
