//! Route planning over the bus network.
//!
//! Two finders answer stop-to-stop queries: [`PointToPointFinder`] searches
//! the finegrain segments of services touching the two stops, and
//! [`HubAndSpokeFinder`] searches the reduced hub network when no single
//! pair of services connects them. [`RouteRanker`] sits on top, turning a
//! pair of coordinates into candidate stop pairs and choosing the fastest
//! route once live arrivals are accounted for.

mod config;
mod error;
mod hub_and_spoke;
mod point_to_point;
mod rank;
mod service_time;


pub use config::PlannerConfig;
pub use error::{Endpoint, RouteError};
pub use hub_and_spoke::HubAndSpokeFinder;
pub use point_to_point::PointToPointFinder;
pub use rank::{ArrivalProvider, GeoPoint, RouteRanker, select_fastest, wait_penalty};
pub use service_time::{Timetabled, day_window, in_service, is_in_service};
