//! Route ranking across candidate stops.
//!
//! A request names two coordinates rather than two stops. The ranker tries
//! every pairing of nearby stops, adjusts each resulting route by how long
//! the rider would wait for its first bus, and returns the fastest.

use std::collections::HashMap;
use std::future::Future;

use chrono::NaiveDateTime;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::domain::{Route, Stop, StopArrivals, StopCode};
use crate::store::NetworkStore;

use super::config::PlannerConfig;
use super::error::{Endpoint, RouteError};
use super::hub_and_spoke::HubAndSpokeFinder;
use super::point_to_point::PointToPointFinder;

/// Source of live arrival estimates.
///
/// This abstraction allows ranking to be tested without the upstream API.
pub trait ArrivalProvider: Send + Sync {
    /// Next arrivals at `stop`. With `use_cache` false the provider must
    /// go upstream.
    fn arrival_times(
        &self,
        stop: &StopCode,
        use_cache: bool,
        now: NaiveDateTime,
    ) -> impl Future<Output = Result<StopArrivals, RouteError>> + Send;
}

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Finds the best route between two coordinates.
pub struct RouteRanker<'a, S, A> {
    store: &'a S,
    arrivals: &'a A,
    config: &'a PlannerConfig,
}

impl<'a, S: NetworkStore, A: ArrivalProvider> RouteRanker<'a, S, A> {
    pub fn new(store: &'a S, arrivals: &'a A, config: &'a PlannerConfig) -> Self {
        Self {
            store,
            arrivals,
            config,
        }
    }

    /// Find the fastest route from `origin` to `destination` at `now`.
    ///
    /// The returned route's travel time includes the wait for its first bus.
    pub async fn find_best_route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        now: NaiveDateTime,
    ) -> Result<Route, RouteError> {
        let origins = self.nearby(origin).await?;
        if origins.is_empty() {
            return Err(RouteError::NoNearbyStop(Endpoint::Origin));
        }
        let destinations = self.nearby(destination).await?;
        if destinations.is_empty() {
            return Err(RouteError::NoNearbyStop(Endpoint::Destination));
        }

        let candidates = self.candidate_routes(&origins, &destinations, now).await;
        if candidates.is_empty() {
            return Err(RouteError::NoRouteFound);
        }

        let arrivals = self.fetch_arrivals(&candidates, now).await;
        let missing = self.config.missing_arrival_penalty_mins;
        let adjusted = candidates
            .into_iter()
            .map(|mut route| {
                route.travel_time += wait_penalty(&route, &arrivals, now, missing);
                route
            })
            .collect();

        select_fastest(adjusted).ok_or(RouteError::NoRouteFound)
    }

    async fn nearby(&self, point: GeoPoint) -> Result<Vec<Stop>, RouteError> {
        Ok(self
            .store
            .find_stops_near(
                point.latitude,
                point.longitude,
                self.config.nearby_radius_m,
                self.config.max_stop_candidates,
            )
            .await?)
    }

    async fn candidate_routes(
        &self,
        origins: &[Stop],
        destinations: &[Stop],
        now: NaiveDateTime,
    ) -> Vec<Route> {
        let point_to_point = PointToPointFinder::new(self.store, self.config);
        let hub_and_spoke = HubAndSpokeFinder::new(self.store, self.config);
        let mut routes = Vec::new();

        for origin in origins {
            for destination in destinations {
                if origin.code == destination.code {
                    continue;
                }

                let direct = match point_to_point
                    .find_route(&origin.code, &destination.code, now)
                    .await
                {
                    Ok(route) => {
                        routes.push(route);
                        continue;
                    }
                    Err(e) => e,
                };

                match hub_and_spoke
                    .find_route(&origin.code, &destination.code, now)
                    .await
                {
                    Ok(route) => routes.push(route),
                    Err(via_hubs) => {
                        log_failure(&origin.code, &destination.code, &direct, &via_hubs)
                    }
                }
            }
        }

        routes
    }

    /// Arrivals for each distinct boarding stop. Failures are logged and
    /// left out.
    async fn fetch_arrivals(
        &self,
        routes: &[Route],
        now: NaiveDateTime,
    ) -> HashMap<StopCode, StopArrivals> {
        let mut stops: Vec<&StopCode> = Vec::new();
        for stop in routes.iter().filter_map(Route::first_stop) {
            if !stops.contains(&&stop.code) {
                stops.push(&stop.code);
            }
        }

        let fetches = stops.iter().map(|stop| async move {
            let result = tokio::time::timeout(
                self.config.arrival_timeout,
                self.arrivals.arrival_times(stop, true, now),
            )
            .await;
            (*stop, result)
        });

        let mut found = HashMap::new();
        for (stop, result) in join_all(fetches).await {
            match result {
                Ok(Ok(arrivals)) => {
                    found.insert(stop.clone(), arrivals);
                }
                Ok(Err(e)) => warn!(%stop, error = %e, "arrival fetch failed"),
                Err(_) => warn!(%stop, "arrival fetch timed out"),
            }
        }
        found
    }
}

fn log_failure(
    origin: &StopCode,
    destination: &StopCode,
    direct: &RouteError,
    via_hubs: &RouteError,
) {
    let expected = |e: &RouteError| matches!(e, RouteError::NotFound { .. });
    if expected(direct) && expected(via_hubs) {
        debug!(%origin, %destination, "no route between candidate stops");
    } else {
        warn!(
            %origin,
            %destination,
            point_to_point = %direct,
            hub_and_spoke = %via_hubs,
            "route finding failed"
        );
    }
}

/// Minutes until the route's first bus, or `missing` without an estimate.
pub fn wait_penalty(
    route: &Route,
    arrivals: &HashMap<StopCode, StopArrivals>,
    now: NaiveDateTime,
    missing: u32,
) -> u32 {
    let estimate = route
        .first_stop()
        .zip(route.first_service())
        .and_then(|(stop, service)| arrivals.get(&stop.code)?.get(&service.key.number));

    match estimate {
        Some(at) => u32::try_from((at - now).num_minutes().unsigned_abs()).unwrap_or(u32::MAX),
        None => missing,
    }
}

/// The route with the least travel time. Ties go to the earlier route.
pub fn select_fastest(routes: Vec<Route>) -> Option<Route> {
    routes.into_iter().min_by_key(|r| r.travel_time)
}
