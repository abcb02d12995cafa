//! Hub-and-spoke route finding over the reduced network.
//!
//! Searches a graph of aggregate segments only: spokes out of the origin,
//! every hub-to-hub service, and spokes into the destination. Each hop of
//! the resulting path is expanded back into stops with its precomputed
//! route description.

use chrono::NaiveDateTime;
use tracing::{debug, trace};

use crate::domain::{Route, SegmentType, StopCode};
use crate::graph::build_graph;
use crate::store::{NetworkStore, RouteQuery, SegmentQuery};

use super::config::PlannerConfig;
use super::error::RouteError;
use super::service_time::{in_service, is_in_service};

/// Finds routes through the hub network built by the reducer.
pub struct HubAndSpokeFinder<'a, S> {
    store: &'a S,
    config: &'a PlannerConfig,
}

impl<'a, S: NetworkStore> HubAndSpokeFinder<'a, S> {
    pub fn new(store: &'a S, config: &'a PlannerConfig) -> Self {
        Self { store, config }
    }

    /// Find a route from `origin` to `destination` operating at `at`.
    pub async fn find_route(
        &self,
        origin: &StopCode,
        destination: &StopCode,
        at: NaiveDateTime,
    ) -> Result<Route, RouteError> {
        if origin == destination {
            return Err(RouteError::not_found(origin, destination));
        }

        let spokes_out = self
            .store
            .find_segments(&SegmentQuery::of_type(SegmentType::SpokeToHub).with_origin(origin.clone()))
            .await?;
        let hubs = self
            .store
            .find_segments(&SegmentQuery::of_type(SegmentType::HubToHub))
            .await?;
        let spokes_in = self
            .store
            .find_segments(
                &SegmentQuery::of_type(SegmentType::HubToSpoke).with_destination(destination.clone()),
            )
            .await?;

        let segments = in_service(spokes_out.iter().chain(&hubs).chain(&spokes_in), at);
        let graph = build_graph(segments);
        let path = graph
            .shortest_path(origin, destination)
            .ok_or_else(|| RouteError::not_found(origin, destination))?;
        trace!(hops = path.stops.len() - 1, cost = path.cost, "hub path");

        let mut legs = Vec::with_capacity(path.stops.len() - 1);
        let mut travel_time = 0;

        for pair in path.stops.windows(2) {
            let candidates = self
                .store
                .find_route_descriptions(&RouteQuery::between(pair[0].clone(), pair[1].clone()))
                .await?;
            let description = candidates
                .iter()
                .find(|d| is_in_service(&d.window, at))
                .ok_or_else(|| RouteError::not_found(origin, destination))?;

            travel_time += description.travel_time;
            legs.push(description.to_route_segment());
        }

        travel_time += self.config.transfer_penalty_mins * (legs.len() as u32).saturating_sub(1);

        debug!(
            %origin,
            %destination,
            legs = legs.len(),
            time = travel_time,
            "hub-and-spoke route found"
        );

        Ok(Route::new(legs, travel_time))
    }
}
