//! LTA DataMall response DTOs.
//!
//! These types map directly to the DataMall JSON responses. Bulk datasets
//! wrap their rows in an OData `value` array; fields are PascalCase.

use serde::Deserialize;

/// One page of a bulk dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

/// Row of the `BusStops` dataset.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BusStopRecord {
    pub bus_stop_code: String,
    pub road_name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Row of the `BusServices` dataset.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BusServiceRecord {
    pub service_no: String,
    pub operator: String,
    pub direction: u8,
    pub category: String,
    pub origin_code: String,
    pub destination_code: String,
    /// Empty for services that are not loops.
    #[serde(default)]
    pub loop_desc: Option<String>,
}

/// Row of the `BusRoutes` dataset: one stop on one service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BusRouteRecord {
    pub service_no: String,
    pub direction: u8,
    pub stop_sequence: u32,
    pub bus_stop_code: String,
    /// Cumulative distance from the start of the route (km).
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(rename = "WD_FirstBus", default)]
    pub wd_first_bus: String,
    #[serde(rename = "WD_LastBus", default)]
    pub wd_last_bus: String,
    #[serde(rename = "SAT_FirstBus", default)]
    pub sat_first_bus: String,
    #[serde(rename = "SAT_LastBus", default)]
    pub sat_last_bus: String,
    #[serde(rename = "SUN_FirstBus", default)]
    pub sun_first_bus: String,
    #[serde(rename = "SUN_LastBus", default)]
    pub sun_last_bus: String,
}

/// Response from `BusArrivalv2`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BusArrivalResponse {
    pub bus_stop_code: String,
    #[serde(default)]
    pub services: Vec<ArrivalService>,
}

/// One service approaching the stop.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ArrivalService {
    pub service_no: String,
    #[serde(default)]
    pub operator: Option<String>,
    /// The next bus. Its fields are empty strings when none is due.
    #[serde(default)]
    pub next_bus: Option<NextBus>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NextBus {
    /// RFC 3339 with the network's offset, or empty.
    #[serde(default)]
    pub estimated_arrival: String,
}
