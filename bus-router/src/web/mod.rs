//! Web layer for the bus route finder.
//!
//! Provides the `/findroute` endpoint used by mobile clients, plus a
//! health check.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{MISSING_COORDINATES, create_router};
pub use state::AppState;
