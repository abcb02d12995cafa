//! Conversion from DataMall DTOs to domain types.
//!
//! Bulk conversions skip rows that fail validation and log them, so one
//! malformed record never aborts an ingestion run.

use std::collections::BTreeMap;

use chrono::DateTime;
use tracing::warn;

use crate::domain::{
    DayWindow, Direction, Segment, SegmentType, Service, ServiceKey, Stop, StopArrivals, StopCode,
    TimeWindow,
};

use super::types::{BusArrivalResponse, BusRouteRecord, BusServiceRecord, BusStopRecord};

/// Distance (km) at and above which a hop is assumed to run express.
pub const EXPRESS_THRESHOLD_KM: f64 = 5.0;

/// Error during DTO to domain conversion.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConversionError {
    #[error("invalid stop code: {0:?}")]
    InvalidStopCode(String),

    #[error("invalid direction {direction} on service {service}")]
    InvalidDirection { service: String, direction: u8 },

    #[error("invalid arrival time for service {service}: {value:?}")]
    InvalidArrival { service: String, value: String },
}

fn stop_code(s: &str) -> Result<StopCode, ConversionError> {
    StopCode::parse(s).map_err(|_| ConversionError::InvalidStopCode(s.to_string()))
}

fn direction(service: &str, d: u8) -> Result<Direction, ConversionError> {
    Direction::try_from(d).map_err(|_| ConversionError::InvalidDirection {
        service: service.to_string(),
        direction: d,
    })
}

pub fn convert_stop(record: &BusStopRecord) -> Result<Stop, ConversionError> {
    Ok(Stop {
        code: stop_code(&record.bus_stop_code)?,
        road_name: record.road_name.clone(),
        description: record.description.clone(),
        latitude: record.latitude,
        longitude: record.longitude,
    })
}

pub fn convert_service(record: &BusServiceRecord) -> Result<Service, ConversionError> {
    let loop_desc = record
        .loop_desc
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(Service {
        key: ServiceKey::new(
            record.service_no.clone(),
            direction(&record.service_no, record.direction)?,
        ),
        operator: record.operator.clone(),
        category: record.category.clone(),
        origin: stop_code(&record.origin_code)?,
        destination: stop_code(&record.destination_code)?,
        loop_desc,
    })
}

/// Convert every row, logging and dropping the ones that fail.
pub fn convert_all<R, T>(
    dataset: &str,
    records: &[R],
    convert: impl Fn(&R) -> Result<T, ConversionError>,
) -> Vec<T> {
    records
        .iter()
        .filter_map(|record| match convert(record) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(dataset, error = %e, "skipping record");
                None
            }
        })
        .collect()
}

/// Estimated minutes to cover `distance_km` at `speed_kmh`.
///
/// The distance is padded and rounded up to a whole kilometre first. Every
/// hop costs at least one minute, whatever the speed.
pub fn travel_time_minutes(distance_km: f64, speed_kmh: f64) -> u32 {
    let km = (distance_km.abs() + 0.01).ceil();
    let minutes = (km / speed_kmh * 60.0).ceil();
    if minutes.is_nan() {
        return 1;
    }
    (minutes as u32).max(1)
}

fn window_of(row: &BusRouteRecord) -> TimeWindow {
    TimeWindow::new(
        DayWindow::from_published(&row.wd_first_bus, &row.wd_last_bus),
        DayWindow::from_published(&row.sat_first_bus, &row.sat_last_bus),
        DayWindow::from_published(&row.sun_first_bus, &row.sun_last_bus),
    )
}

/// Derive finegrain segments from `BusRoutes` rows.
///
/// Rows are grouped per service and direction and ordered by stop
/// sequence; each consecutive pair becomes one segment carrying the
/// origin row's sequence and service window.
pub fn derive_segments(rows: &[BusRouteRecord], normal_speed: f64, express_speed: f64) -> Vec<Segment> {
    let mut routes: BTreeMap<(&str, u8), Vec<&BusRouteRecord>> = BTreeMap::new();
    for row in rows {
        routes
            .entry((row.service_no.as_str(), row.direction))
            .or_default()
            .push(row);
    }

    let mut segments = Vec::new();
    for ((number, dir), mut stops) in routes {
        let dir = match direction(number, dir) {
            Ok(d) => d,
            Err(e) => {
                warn!(error = %e, "skipping route");
                continue;
            }
        };
        let key = ServiceKey::new(number, dir);
        stops.sort_by_key(|r| r.stop_sequence);

        for pair in stops.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let (origin, destination) =
                match (stop_code(&from.bus_stop_code), stop_code(&to.bus_stop_code)) {
                    (Ok(o), Ok(d)) => (o, d),
                    (Err(e), _) | (_, Err(e)) => {
                        warn!(service = %key, sequence = from.stop_sequence, error = %e, "skipping segment");
                        continue;
                    }
                };

            let delta = to.distance.unwrap_or(0.0) - from.distance.unwrap_or(0.0);
            let speed = if delta.abs() >= EXPRESS_THRESHOLD_KM {
                express_speed
            } else {
                normal_speed
            };

            segments.push(Segment {
                service: key.clone(),
                origin,
                destination,
                travel_time: travel_time_minutes(delta, speed),
                sequence: from.stop_sequence,
                window: window_of(from),
                segment_type: SegmentType::Finegrain,
            });
        }
    }

    segments
}

/// Next estimated arrival per service at one stop, as network-local time.
///
/// Services with no bus due are left out.
pub fn convert_arrivals(
    stop: &StopCode,
    response: &BusArrivalResponse,
) -> Result<StopArrivals, ConversionError> {
    let mut arrivals = StopArrivals::new(stop.clone());

    for service in &response.services {
        let Some(next) = service.next_bus.as_ref() else {
            continue;
        };
        let value = next.estimated_arrival.trim();
        if value.is_empty() {
            continue;
        }
        let at = DateTime::parse_from_rfc3339(value).map_err(|_| {
            ConversionError::InvalidArrival {
                service: service.service_no.clone(),
                value: value.to_string(),
            }
        })?;
        arrivals.insert(service.service_no.clone(), at.naive_local());
    }

    Ok(arrivals)
}
