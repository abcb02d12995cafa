//! Routes: what the planner returns, and the precomputed descriptions it
//! assembles them from.

use serde::{Deserialize, Serialize};

use super::{SegmentType, Service, Stop, StopCode, TimeWindow};

/// Precomputed description of travelling one aggregate segment.
///
/// One is stored for every hub-to-hub, hub-to-spoke and spoke-to-hub
/// segment, carrying the full stop list so that hub-and-spoke routes can be
/// expanded without walking the finegrain network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDescription {
    pub service: Service,
    pub service_origin: Stop,
    pub service_destination: Stop,
    pub origin: StopCode,
    pub destination: StopCode,
    /// Every stop passed, `origin` first and `destination` last.
    pub stops: Vec<Stop>,
    /// Whole minutes.
    pub travel_time: u32,
    pub window: TimeWindow,
    pub segment_type: SegmentType,
}

impl RouteDescription {
    /// The leg of a route this description stands for.
    pub fn to_route_segment(&self) -> RouteSegment {
        RouteSegment {
            service: self.service.clone(),
            service_origin: self.service_origin.clone(),
            service_destination: self.service_destination.clone(),
            stops: self.stops.clone(),
        }
    }
}

/// One leg of a route: a ride on a single service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub service: Service,
    pub service_origin: Stop,
    pub service_destination: Stop,
    /// Stops in riding order. The boarding stop is first, the alighting
    /// stop last.
    pub stops: Vec<Stop>,
}

impl RouteSegment {
    pub fn first_stop(&self) -> Option<&Stop> {
        self.stops.first()
    }

    pub fn last_stop(&self) -> Option<&Stop> {
        self.stops.last()
    }
}

/// A complete answer: legs in order plus total travel time in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub segments: Vec<RouteSegment>,
    pub travel_time: u32,
}

impl Route {
    pub fn new(segments: Vec<RouteSegment>, travel_time: u32) -> Self {
        Self {
            segments,
            travel_time,
        }
    }

    /// Where the rider boards the first bus.
    pub fn first_stop(&self) -> Option<&Stop> {
        self.segments.first().and_then(RouteSegment::first_stop)
    }

    /// Where the rider leaves the last bus.
    pub fn last_stop(&self) -> Option<&Stop> {
        self.segments.last().and_then(RouteSegment::last_stop)
    }

    /// The service boarded first.
    pub fn first_service(&self) -> Option<&Service> {
        self.segments.first().map(|s| &s.service)
    }

    pub fn transfer_count(&self) -> usize {
        self.segments.len().saturating_sub(1)
    }
}
