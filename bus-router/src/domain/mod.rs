//! Domain types for the bus network.
//!
//! This module contains the core model: stops, services, the segments that
//! join stops, and the routes built from them. Identifier types enforce
//! their invariants at construction time, so code that receives them can
//! trust their validity.

mod arrivals;
mod error;
mod route;
mod segment;
mod service;
mod stop;
mod time;

pub use arrivals::StopArrivals;
pub use error::DomainError;
pub use route::{Route, RouteDescription, RouteSegment};
pub use segment::{Segment, SegmentId, SegmentType};
pub use service::{Direction, InvalidDirection, Service, ServiceKey};
pub use stop::{InvalidStopCode, Stop, StopCode};
pub use time::{BusTime, DayWindow, TimeError, TimeWindow, parse_published};
