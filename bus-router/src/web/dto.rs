//! Data transfer objects for web requests and responses.
//!
//! Field names follow the published JSON contract used by existing mobile
//! clients: camelCase for route structure, PascalCase for the stop and
//! service records echoed from DataMall.

use serde::{Deserialize, Serialize};

use crate::domain::{Route, RouteSegment, Service, Stop};

/// Query parameters of `/findroute`.
///
/// Kept as strings so that malformed numbers produce the API's own error
/// message rather than a rejection.
#[derive(Debug, Default, Deserialize)]
pub struct FindRouteRequest {
    pub originlat: Option<String>,
    pub originlong: Option<String>,
    pub destlat: Option<String>,
    pub destlong: Option<String>,
}

/// Parsed coordinates of a `/findroute` request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub origin_lat: f64,
    pub origin_long: f64,
    pub dest_lat: f64,
    pub dest_long: f64,
}

impl FindRouteRequest {
    /// All four coordinates, if present and finite.
    pub fn coordinates(&self) -> Option<Coordinates> {
        let parse = |v: &Option<String>| {
            v.as_deref()
                .and_then(|s| s.trim().parse::<f64>().ok())
                .filter(|n| n.is_finite())
        };

        Some(Coordinates {
            origin_lat: parse(&self.originlat)?,
            origin_long: parse(&self.originlong)?,
            dest_lat: parse(&self.destlat)?,
            dest_long: parse(&self.destlong)?,
        })
    }
}

/// Body of every `/findroute` response.
#[derive(Debug, Serialize)]
pub struct FindRouteResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteResult>,
}

impl FindRouteResponse {
    pub fn found(route: &Route) -> Self {
        Self {
            error: "none".to_string(),
            route: Some(RouteResult::from_route(route)),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            route: None,
        }
    }
}

/// A route in a response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    pub segments: Vec<SegmentResult>,
    /// Minutes, including the wait for the first bus.
    pub travel_time: u32,
}

/// One leg of a route.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentResult {
    pub bus_service: ServiceResult,
    pub bus_service_origin: StopResult,
    pub bus_service_destination: StopResult,
    pub bus_stops: Vec<StopResult>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceResult {
    pub service_no: String,
    pub operator: String,
    pub direction: u8,
    pub category: String,
    pub origin_code: String,
    pub destination_code: String,
    pub loop_desc: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StopResult {
    pub bus_stop_code: String,
    pub road_name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
}

// Conversion implementations

impl RouteResult {
    pub fn from_route(route: &Route) -> Self {
        Self {
            segments: route.segments.iter().map(SegmentResult::from_segment).collect(),
            travel_time: route.travel_time,
        }
    }
}

impl SegmentResult {
    pub fn from_segment(segment: &RouteSegment) -> Self {
        Self {
            bus_service: ServiceResult::from_service(&segment.service),
            bus_service_origin: StopResult::from_stop(&segment.service_origin),
            bus_service_destination: StopResult::from_stop(&segment.service_destination),
            bus_stops: segment.stops.iter().map(StopResult::from_stop).collect(),
        }
    }
}

impl ServiceResult {
    pub fn from_service(service: &Service) -> Self {
        Self {
            service_no: service.key.number.clone(),
            operator: service.operator.clone(),
            direction: service.key.direction.into(),
            category: service.category.clone(),
            origin_code: service.origin.to_string(),
            destination_code: service.destination.to_string(),
            loop_desc: service.loop_desc.clone().unwrap_or_default(),
        }
    }
}

impl StopResult {
    pub fn from_stop(stop: &Stop) -> Self {
        Self {
            bus_stop_code: stop.code.to_string(),
            road_name: stop.road_name.clone(),
            description: stop.description.clone(),
            latitude: stop.latitude,
            longitude: stop.longitude,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, ServiceKey, StopCode};

    fn stop(code: &str) -> Stop {
        Stop {
            code: StopCode::parse(code).unwrap(),
            road_name: "Victoria St".into(),
            description: format!("Stop {code}"),
            latitude: 1.2966,
            longitude: 103.8525,
        }
    }

    fn route() -> Route {
        Route::new(
            vec![RouteSegment {
                service: Service {
                    key: ServiceKey::new("96", Direction::Two),
                    operator: "SBST".into(),
                    category: "TRUNK".into(),
                    origin: StopCode::parse("17091").unwrap(),
                    destination: StopCode::parse("17129").unwrap(),
                    loop_desc: None,
                },
                service_origin: stop("17091"),
                service_destination: stop("17129"),
                stops: vec![stop("17091"), stop("17101")],
            }],
            13,
        )
    }

    fn request(values: [Option<&str>; 4]) -> FindRouteRequest {
        let [originlat, originlong, destlat, destlong] = values.map(|v| v.map(str::to_string));
        FindRouteRequest {
            originlat,
            originlong,
            destlat,
            destlong,
        }
    }

    #[test]
    fn coordinates_parse() {
        let req = request([Some("1.30"), Some("103.72"), Some(" 1.32 "), Some("103.76")]);
        assert_eq!(
            req.coordinates(),
            Some(Coordinates {
                origin_lat: 1.30,
                origin_long: 103.72,
                dest_lat: 1.32,
                dest_long: 103.76,
            })
        );
    }

    #[test]
    fn missing_or_bad_coordinates() {
        assert!(request([None, Some("103.72"), Some("1.32"), Some("103.76")]).coordinates().is_none());
        assert!(request([Some("north"), Some("103.72"), Some("1.32"), Some("103.76")]).coordinates().is_none());
        assert!(request([Some("NaN"), Some("103.72"), Some("1.32"), Some("103.76")]).coordinates().is_none());
        assert!(FindRouteRequest::default().coordinates().is_none());
    }

    #[test]
    fn route_json_shape() {
        let json = serde_json::to_value(FindRouteResponse::found(&route())).unwrap();

        assert_eq!(json["error"], "none");
        assert_eq!(json["route"]["travelTime"], 13);
        let segment = &json["route"]["segments"][0];
        assert_eq!(segment["busService"]["ServiceNo"], "96");
        assert_eq!(segment["busService"]["Direction"], 2);
        assert_eq!(segment["busService"]["LoopDesc"], "");
        assert_eq!(segment["busServiceOrigin"]["BusStopCode"], "17091");
        assert_eq!(segment["busServiceDestination"]["BusStopCode"], "17129");
        assert_eq!(segment["busStops"][1]["Description"], "Stop 17101");
        assert_eq!(segment["busStops"][1]["RoadName"], "Victoria St");
    }

    #[test]
    fn failure_has_no_route() {
        let json = serde_json::to_value(FindRouteResponse::failed("nope")).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "nope" }));
    }
}
