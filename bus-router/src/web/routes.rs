//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::planner::{GeoPoint, RouteError, RouteRanker};

use super::dto::*;
use super::state::AppState;

/// Reply when any coordinate is missing or not a number.
pub const MISSING_COORDINATES: &str = "You must specify origin and destination coordinates";

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/findroute", get(find_route))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

async fn index() -> &'static str {
    "bus-router: GET /findroute?originlat=&originlong=&destlat=&destlong="
}

/// Find the best route between two coordinates.
///
/// Always answers 200; failures are reported in the `error` field.
async fn find_route(
    State(state): State<AppState>,
    query: Option<Query<FindRouteRequest>>,
) -> Json<FindRouteResponse> {
    let request = query.map(|Query(q)| q).unwrap_or_default();
    let Some(coords) = request.coordinates() else {
        return Json(FindRouteResponse::failed(MISSING_COORDINATES));
    };

    let origin = GeoPoint::new(coords.origin_lat, coords.origin_long);
    let destination = GeoPoint::new(coords.dest_lat, coords.dest_long);
    let now = state.config.local_now();

    let ranker = RouteRanker::new(state.store.as_ref(), state.arrivals.as_ref(), &state.config);
    match ranker.find_best_route(origin, destination, now).await {
        Ok(route) => {
            info!(
                legs = route.segments.len(),
                travel_time = route.travel_time,
                "route found"
            );
            Json(FindRouteResponse::found(&route))
        }
        Err(e) => {
            match &e {
                RouteError::Store(_) | RouteError::DataIntegrity(_) => {
                    warn!(error = %e, "route finding failed")
                }
                _ => debug!(error = %e, "no route"),
            }
            Json(FindRouteResponse::failed(e.user_message()))
        }
    }
}
