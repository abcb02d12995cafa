//! Per-run lookup cache for the reducer.

use std::collections::HashMap;

use crate::domain::{Segment, Service, ServiceKey, Stop, StopCode};
use crate::store::{NetworkStore, StoreError};

/// Stops and services resolved during one reduction run.
///
/// Misses are remembered too, so an unknown code is only queried once.
/// Filled sequentially before each batch, then shared read-only with the
/// workers.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    stops: HashMap<StopCode, Option<Stop>>,
    services: HashMap<ServiceKey, Option<Service>>,
    lookups: usize,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a service that was already loaded.
    pub fn insert_service(&mut self, service: Service) {
        self.services.insert(service.key.clone(), Some(service));
    }

    /// Resolve a stop, querying the store only on first sight.
    pub async fn resolve_stop<S: NetworkStore>(
        &mut self,
        store: &S,
        code: &StopCode,
    ) -> Result<Option<&Stop>, StoreError> {
        if !self.stops.contains_key(code) {
            let found = store.find_stop(code).await?;
            self.lookups += 1;
            self.stops.insert(code.clone(), found);
        }
        Ok(self.stops.get(code).and_then(Option::as_ref))
    }

    /// Resolve everything reducing `service` will need.
    pub async fn warm<S: NetworkStore>(
        &mut self,
        store: &S,
        service: &Service,
        segments: &[Segment],
    ) -> Result<(), StoreError> {
        self.resolve_stop(store, &service.origin).await?;
        self.resolve_stop(store, &service.destination).await?;
        for segment in segments {
            self.resolve_stop(store, &segment.origin).await?;
            self.resolve_stop(store, &segment.destination).await?;
        }
        Ok(())
    }

    pub fn stop(&self, code: &StopCode) -> Option<&Stop> {
        self.stops.get(code).and_then(Option::as_ref)
    }

    pub fn service(&self, key: &ServiceKey) -> Option<&Service> {
        self.services.get(key).and_then(Option::as_ref)
    }

    /// Number of store queries made so far.
    pub fn lookups(&self) -> usize {
        self.lookups
    }
}
