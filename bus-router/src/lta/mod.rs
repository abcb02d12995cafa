//! LTA DataMall client.
//!
//! This module provides an HTTP client for Singapore's Land Transport
//! Authority DataMall, the source of the bus network and of live arrival
//! estimates.
//!
//! Key characteristics of DataMall:
//! - Bulk datasets (`BusStops`, `BusServices`, `BusRoutes`) are paged in
//!   blocks of 500 rows selected with `$skip`
//! - `BusRoutes` gives cumulative distances, not travel times; segment
//!   times are estimated from distance and an assumed speed
//! - Arrival estimates are RFC 3339 timestamps in network-local time, with
//!   no direction attached

mod client;
mod convert;
mod error;
mod types;

use std::future::Future;

use crate::domain::{Segment, Service, Stop};

pub use client::{LtaClient, LtaConfig, PAGE_SIZE};
pub use convert::{
    ConversionError, EXPRESS_THRESHOLD_KM, convert_arrivals, derive_segments, travel_time_minutes,
};
pub use error::LtaError;
pub use types::{
    ArrivalService, BusArrivalResponse, BusRouteRecord, BusServiceRecord, BusStopRecord, NextBus,
};

/// Where ingestion gets the network from.
///
/// This abstraction allows ingestion to be tested without the upstream API.
pub trait NetworkSource: Send + Sync {
    fn fetch_all_stops(&self) -> impl Future<Output = Result<Vec<Stop>, LtaError>> + Send;

    fn fetch_all_services(&self) -> impl Future<Output = Result<Vec<Service>, LtaError>> + Send;

    /// Finegrain segments, with travel times estimated at the given speeds
    /// (km/h).
    fn fetch_all_segments(
        &self,
        normal_speed: f64,
        express_speed: f64,
    ) -> impl Future<Output = Result<Vec<Segment>, LtaError>> + Send;
}
