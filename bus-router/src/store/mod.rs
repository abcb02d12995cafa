//! Network storage.
//!
//! The planner and the reducer talk to storage only through
//! [`NetworkStore`]. [`MemoryStore`] is the implementation used by the
//! server: indexed in-memory tables persisted as a JSON snapshot.

mod error;
mod memory;
mod query;
mod snapshot;

use std::future::Future;

use crate::domain::{RouteDescription, Segment, Service, ServiceKey, Stop, StopCode};

pub use error::StoreError;
pub use memory::{MemoryStore, StoreStats};
pub use query::{RouteQuery, SegmentQuery};
pub use snapshot::Snapshot;

/// Read and write access to the bus network.
///
/// Queries return rows in insertion order. Inserts return how many rows
/// were written; deletes return how many were removed.
pub trait NetworkStore: Send + Sync {
    fn find_stop(
        &self,
        code: &StopCode,
    ) -> impl Future<Output = Result<Option<Stop>, StoreError>> + Send;

    /// Up to `limit` stops within `max_distance_m` metres, nearest first.
    fn find_stops_near(
        &self,
        latitude: f64,
        longitude: f64,
        max_distance_m: f64,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Stop>, StoreError>> + Send;

    fn find_service(
        &self,
        key: &ServiceKey,
    ) -> impl Future<Output = Result<Option<Service>, StoreError>> + Send;

    /// All services, ordered by key.
    fn find_services(&self) -> impl Future<Output = Result<Vec<Service>, StoreError>> + Send;

    fn find_segments(
        &self,
        query: &SegmentQuery,
    ) -> impl Future<Output = Result<Vec<Segment>, StoreError>> + Send;

    fn find_route_descriptions(
        &self,
        query: &RouteQuery,
    ) -> impl Future<Output = Result<Vec<RouteDescription>, StoreError>> + Send;

    /// Insert stops, replacing any with the same code.
    fn insert_stops(
        &self,
        stops: Vec<Stop>,
    ) -> impl Future<Output = Result<usize, StoreError>> + Send;

    /// Insert services, replacing any with the same key.
    fn insert_services(
        &self,
        services: Vec<Service>,
    ) -> impl Future<Output = Result<usize, StoreError>> + Send;

    fn insert_segments(
        &self,
        segments: Vec<Segment>,
    ) -> impl Future<Output = Result<usize, StoreError>> + Send;

    fn insert_route_descriptions(
        &self,
        routes: Vec<RouteDescription>,
    ) -> impl Future<Output = Result<usize, StoreError>> + Send;

    fn delete_stops(&self) -> impl Future<Output = Result<usize, StoreError>> + Send;

    fn delete_services(&self) -> impl Future<Output = Result<usize, StoreError>> + Send;

    fn delete_segments(
        &self,
        query: &SegmentQuery,
    ) -> impl Future<Output = Result<usize, StoreError>> + Send;

    fn delete_route_descriptions(
        &self,
        query: &RouteQuery,
    ) -> impl Future<Output = Result<usize, StoreError>> + Send;
}
