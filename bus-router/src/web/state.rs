//! Application state for the web layer.

use std::sync::Arc;

use crate::cache::CachedArrivalClient;
use crate::planner::PlannerConfig;
use crate::store::MemoryStore;

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState {
    /// The bus network
    pub store: Arc<MemoryStore>,

    /// Cached live-arrival client
    pub arrivals: Arc<CachedArrivalClient>,

    /// Route planner configuration
    pub config: Arc<PlannerConfig>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(store: MemoryStore, arrivals: CachedArrivalClient, config: PlannerConfig) -> Self {
        Self {
            store: Arc::new(store),
            arrivals: Arc::new(arrivals),
            config: Arc::new(config),
        }
    }
}
