//! Selection criteria for segments and route descriptions.

use crate::domain::{RouteDescription, Segment, SegmentType, ServiceKey, StopCode};

/// Criteria for selecting segments. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentQuery {
    pub service: Option<ServiceKey>,
    pub origin: Option<StopCode>,
    pub destination: Option<StopCode>,
    pub segment_type: Option<SegmentType>,
    /// Inclusive lower bound on sequence.
    pub min_sequence: Option<u32>,
    /// Inclusive upper bound on sequence.
    pub max_sequence: Option<u32>,
}

impl SegmentQuery {
    /// Matches every segment.
    pub fn all() -> Self {
        Self::default()
    }

    /// Matches every segment of one type.
    pub fn of_type(segment_type: SegmentType) -> Self {
        Self {
            segment_type: Some(segment_type),
            ..Self::default()
        }
    }

    pub fn with_service(mut self, service: ServiceKey) -> Self {
        self.service = Some(service);
        self
    }

    pub fn with_origin(mut self, origin: StopCode) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn with_destination(mut self, destination: StopCode) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn with_min_sequence(mut self, sequence: u32) -> Self {
        self.min_sequence = Some(sequence);
        self
    }

    pub fn with_max_sequence(mut self, sequence: u32) -> Self {
        self.max_sequence = Some(sequence);
        self
    }

    pub fn matches(&self, segment: &Segment) -> bool {
        self.service.as_ref().is_none_or(|s| s == &segment.service)
            && self.origin.as_ref().is_none_or(|o| o == &segment.origin)
            && self
                .destination
                .as_ref()
                .is_none_or(|d| d == &segment.destination)
            && self.segment_type.is_none_or(|t| t == segment.segment_type)
            && self.min_sequence.is_none_or(|min| segment.sequence >= min)
            && self.max_sequence.is_none_or(|max| segment.sequence <= max)
    }
}

/// Criteria for selecting route descriptions. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteQuery {
    pub service: Option<ServiceKey>,
    pub origin: Option<StopCode>,
    pub destination: Option<StopCode>,
    pub segment_type: Option<SegmentType>,
}

impl RouteQuery {
    pub fn all() -> Self {
        Self::default()
    }

    /// Descriptions from `origin` to `destination`.
    pub fn between(origin: StopCode, destination: StopCode) -> Self {
        Self {
            origin: Some(origin),
            destination: Some(destination),
            ..Self::default()
        }
    }

    pub fn with_service(mut self, service: ServiceKey) -> Self {
        self.service = Some(service);
        self
    }

    pub fn with_type(mut self, segment_type: SegmentType) -> Self {
        self.segment_type = Some(segment_type);
        self
    }

    pub fn matches(&self, route: &RouteDescription) -> bool {
        self.service
            .as_ref()
            .is_none_or(|s| s == &route.service.key)
            && self.origin.as_ref().is_none_or(|o| o == &route.origin)
            && self
                .destination
                .as_ref()
                .is_none_or(|d| d == &route.destination)
            && self.segment_type.is_none_or(|t| t == route.segment_type)
    }
}
