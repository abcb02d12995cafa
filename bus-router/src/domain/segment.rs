//! Directed network edges.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ServiceKey, StopCode, TimeWindow};

/// What kind of edge a segment is.
///
/// `Finegrain` segments join physically adjacent stops on one service. The
/// other three are aggregates produced by the network reducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentType {
    Finegrain,
    /// Service origin to service destination.
    HubToHub,
    /// Service origin to an intermediate stop.
    HubToSpoke,
    /// Intermediate stop to service destination.
    SpokeToHub,
}

impl SegmentType {
    /// Aggregate types, in the order the reducer emits them.
    pub const AGGREGATES: [SegmentType; 3] = [
        SegmentType::HubToHub,
        SegmentType::HubToSpoke,
        SegmentType::SpokeToHub,
    ];

    pub fn is_aggregate(self) -> bool {
        !matches!(self, SegmentType::Finegrain)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SegmentType::Finegrain => "finegrain",
            SegmentType::HubToHub => "hubtohub",
            SegmentType::HubToSpoke => "hubtospoke",
            SegmentType::SpokeToHub => "spoketohub",
        }
    }
}

impl fmt::Display for SegmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a segment within the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId {
    pub service: ServiceKey,
    pub origin: StopCode,
    pub destination: StopCode,
    pub segment_type: SegmentType,
}

/// A directed, weighted edge between two stops on one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub service: ServiceKey,
    pub origin: StopCode,
    pub destination: StopCode,
    /// Whole minutes.
    pub travel_time: u32,
    /// Position along the service. For finegrain segments this is the
    /// origin's stop sequence; for spoke aggregates it is the spoke's index.
    pub sequence: u32,
    pub window: TimeWindow,
    pub segment_type: SegmentType,
}

impl Segment {
    pub fn id(&self) -> SegmentId {
        SegmentId {
            service: self.service.clone(),
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            segment_type: self.segment_type,
        }
    }

    /// True if this segment runs from `origin` to `destination`.
    pub fn joins(&self, origin: &StopCode, destination: &StopCode) -> bool {
        &self.origin == origin && &self.destination == destination
    }
}
