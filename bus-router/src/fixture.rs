//! Small synthetic network shared by tests.
//!
//! ```text
//!  96/1:  17091 -3-> 17101 -2-> 17111 -4-> 17129
//! 198/1:  10009 -6-> 17111 -5-> 51061 -3-> 51071 -2-> 51079
//!  14/1:  17091 -10-> 41011 -15-> 51071
//!  30/1:  17129 -10-> 30011 -10-> 65009
//!  65/1:  65009 -4-> 65019 -3-> 99099 -2-> 65099
//! ```
//!
//! Every service runs 0530-2330 on all days. Stops sit on a grid about
//! 2 km apart so a 1 km radius only ever finds the stop itself.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::domain::{
    DayWindow, Direction, Segment, SegmentType, Service, ServiceKey, Stop, StopCode, TimeWindow,
};
use crate::reducer::NetworkReducer;
use crate::store::{MemoryStore, NetworkStore, Snapshot};

pub const SERVICES: &[(&str, &[(&str, u32)])] = &[
    ("96", &[("17091", 3), ("17101", 2), ("17111", 4), ("17129", 0)]),
    (
        "198",
        &[("10009", 6), ("17111", 5), ("51061", 3), ("51071", 2), ("51079", 0)],
    ),
    ("14", &[("17091", 10), ("41011", 15), ("51071", 0)]),
    ("30", &[("17129", 10), ("30011", 10), ("65009", 0)]),
    ("65", &[("65009", 4), ("65019", 3), ("99099", 2), ("65099", 0)]),
];

pub fn code(s: &str) -> StopCode {
    StopCode::parse(s).unwrap()
}

pub fn key(number: &str) -> ServiceKey {
    ServiceKey::new(number, Direction::One)
}

pub fn window() -> TimeWindow {
    TimeWindow::every_day(DayWindow::from_published("0530", "2330"))
}

/// Wednesday 2024-03-13 at `hh:mm`.
pub fn weekday_at(hh: u32, mm: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 13)
        .unwrap()
        .and_time(NaiveTime::from_hms_opt(hh, mm, 0).unwrap())
}

/// Grid position of a stop, derived from its code so it is stable.
pub fn location(c: &str) -> (f64, f64) {
    let mut all: Vec<&str> = SERVICES
        .iter()
        .flat_map(|(_, stops)| stops.iter().map(|(c, _)| *c))
        .collect();
    all.sort_unstable();
    all.dedup();
    let i = all.iter().position(|s| *s == c).unwrap_or(all.len());
    let row = (i / 5) as f64;
    let col = (i % 5) as f64;
    (1.30 + row * 0.02, 103.70 + col * 0.02)
}

pub fn stop(c: &str) -> Stop {
    let (latitude, longitude) = location(c);
    Stop {
        code: code(c),
        road_name: format!("Road {c}"),
        description: format!("Stop {c}"),
        latitude,
        longitude,
    }
}

pub fn snapshot() -> Snapshot {
    let mut snapshot = Snapshot::default();

    for (number, stops) in SERVICES {
        let first = stops[0].0;
        let last = stops[stops.len() - 1].0;
        snapshot.services.push(Service {
            key: key(number),
            operator: "SBST".into(),
            category: "TRUNK".into(),
            origin: code(first),
            destination: code(last),
            loop_desc: None,
        });

        for (i, pair) in stops.windows(2).enumerate() {
            snapshot.segments.push(Segment {
                service: key(number),
                origin: code(pair[0].0),
                destination: code(pair[1].0),
                travel_time: pair[0].1,
                sequence: i as u32 + 1,
                window: window(),
                segment_type: SegmentType::Finegrain,
            });
        }

        for (c, _) in stops.iter() {
            if !snapshot.stops.iter().any(|s| s.code.as_str() == *c) {
                snapshot.stops.push(stop(c));
            }
        }
    }

    snapshot
}

/// Store holding finegrain data only.
pub fn raw_store() -> MemoryStore {
    MemoryStore::from_snapshot(snapshot())
}

/// Store with aggregates and route descriptions already generated.
pub async fn reduced_store() -> MemoryStore {
    let store = raw_store();
    NetworkReducer::new(&store).run().await.unwrap();
    store
}

/// Asserts every consecutive stop pair of every leg is an in-service
/// finegrain segment of that leg's service.
pub async fn assert_route_is_rideable<S: NetworkStore>(
    store: &S,
    route: &crate::domain::Route,
    at: NaiveDateTime,
) {
    use crate::planner::is_in_service;
    use crate::store::SegmentQuery;

    for leg in &route.segments {
        assert!(leg.stops.len() >= 2, "leg must ride at least one segment");
        for pair in leg.stops.windows(2) {
            let q = SegmentQuery::of_type(SegmentType::Finegrain)
                .with_service(leg.service.key.clone())
                .with_origin(pair[0].code.clone())
                .with_destination(pair[1].code.clone());
            let found = store.find_segments(&q).await.unwrap();
            assert!(
                found.iter().any(|s| is_in_service(&s.window, at)),
                "{} -> {} is not an in-service segment of {}",
                pair[0].code,
                pair[1].code,
                leg.service.key
            );
        }
    }
}
