//! Route-finding errors.

use std::fmt;

use crate::domain::StopCode;
use crate::store::StoreError;

/// Which end of a request a failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Origin,
    Destination,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Origin => f.write_str("origin"),
            Endpoint::Destination => f.write_str("destination"),
        }
    }
}

/// Errors from route finding.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// No in-service route between two stops
    #[error("no route from {origin} to {destination}")]
    NotFound {
        origin: StopCode,
        destination: StopCode,
    },

    /// No stop within range of a requested point
    #[error("no bus stop near the {0}")]
    NoNearbyStop(Endpoint),

    /// Every candidate stop pair failed
    #[error("no route found between any candidate stops")]
    NoRouteFound,

    /// A referenced stop or service is missing from the store
    #[error("data integrity: {0}")]
    DataIntegrity(String),

    /// An external dependency could not be reached
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RouteError {
    pub(crate) fn not_found(origin: &StopCode, destination: &StopCode) -> Self {
        RouteError::NotFound {
            origin: origin.clone(),
            destination: destination.clone(),
        }
    }

    /// Message suitable for the public API.
    pub fn user_message(&self) -> &'static str {
        match self {
            RouteError::NoNearbyStop(Endpoint::Origin) => "Unable to locate a bus stop near you.",
            RouteError::NoNearbyStop(Endpoint::Destination) => {
                "Unable to locate a bus stop near your destination."
            }
            _ => "Unable to find a route to your destination",
        }
    }
}
