//! In-memory network store.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use geo::{Distance, Haversine, Point};
use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree};
use tokio::sync::RwLock;

use crate::domain::{RouteDescription, Segment, SegmentType, Service, ServiceKey, Stop, StopCode};

use super::{NetworkStore, RouteQuery, SegmentQuery, Snapshot, StoreError};

/// Stop location in the R-tree: `[longitude, latitude]` tagged with its code.
type StopPoint = GeomWithData<[f64; 2], StopCode>;

/// Metres per degree of latitude.
const METRES_PER_DEGREE: f64 = 111_320.0;

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub stops: usize,
    pub services: usize,
    pub segments: usize,
    pub route_descriptions: usize,
}

/// Network store held entirely in memory.
///
/// Stops are unique by code and indexed spatially. Segments are indexed by
/// (service, type), (origin, type) and (destination, type); route
/// descriptions by (origin, destination). Indexes are rebuilt after deletes.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    stops: HashMap<StopCode, Stop>,
    locations: RTree<StopPoint>,
    services: BTreeMap<ServiceKey, Service>,
    segments: Vec<Segment>,
    segment_index: SegmentIndex,
    routes: Vec<RouteDescription>,
    route_index: HashMap<(StopCode, StopCode), Vec<usize>>,
}

#[derive(Default)]
struct SegmentIndex {
    by_service: HashMap<(ServiceKey, SegmentType), Vec<usize>>,
    by_origin: HashMap<(StopCode, SegmentType), Vec<usize>>,
    by_destination: HashMap<(StopCode, SegmentType), Vec<usize>>,
}

impl SegmentIndex {
    fn build(segments: &[Segment]) -> Self {
        let mut index = Self::default();
        for (i, segment) in segments.iter().enumerate() {
            index.add(i, segment);
        }
        index
    }

    fn add(&mut self, i: usize, segment: &Segment) {
        let ty = segment.segment_type;
        self.by_service
            .entry((segment.service.clone(), ty))
            .or_default()
            .push(i);
        self.by_origin
            .entry((segment.origin.clone(), ty))
            .or_default()
            .push(i);
        self.by_destination
            .entry((segment.destination.clone(), ty))
            .or_default()
            .push(i);
    }

    /// Row positions that may match, or `None` if the query needs a scan.
    fn candidates(&self, query: &SegmentQuery) -> Option<&[usize]> {
        let ty = query.segment_type?;
        let hit = if let Some(service) = &query.service {
            self.by_service.get(&(service.clone(), ty))
        } else if let Some(origin) = &query.origin {
            self.by_origin.get(&(origin.clone(), ty))
        } else if let Some(destination) = &query.destination {
            self.by_destination.get(&(destination.clone(), ty))
        } else {
            return None;
        };
        Some(hit.map(Vec::as_slice).unwrap_or(&[]))
    }
}

impl Tables {
    fn rebuild_locations(&mut self) {
        let points = self
            .stops
            .values()
            .map(|s| StopPoint::new([s.longitude, s.latitude], s.code.clone()))
            .collect();
        self.locations = RTree::bulk_load(points);
    }

    fn rebuild_route_index(&mut self) {
        self.route_index.clear();
        for (i, route) in self.routes.iter().enumerate() {
            self.route_index
                .entry((route.origin.clone(), route.destination.clone()))
                .or_default()
                .push(i);
        }
    }

    fn select_segments(&self, query: &SegmentQuery) -> Vec<Segment> {
        match self.segment_index.candidates(query) {
            Some(rows) => rows
                .iter()
                .map(|&i| &self.segments[i])
                .filter(|s| query.matches(s))
                .cloned()
                .collect(),
            None => self
                .segments
                .iter()
                .filter(|s| query.matches(s))
                .cloned()
                .collect(),
        }
    }

    fn select_routes(&self, query: &RouteQuery) -> Vec<RouteDescription> {
        if let (Some(origin), Some(destination)) = (&query.origin, &query.destination) {
            let key = (origin.clone(), destination.clone());
            return self
                .route_index
                .get(&key)
                .map(|rows| {
                    rows.iter()
                        .map(|&i| &self.routes[i])
                        .filter(|r| query.matches(r))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
        }

        self.routes
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect()
    }

    fn stops_near(&self, latitude: f64, longitude: f64, max_distance_m: f64, limit: usize) -> Vec<Stop> {
        if limit == 0 || !max_distance_m.is_finite() || max_distance_m < 0.0 {
            return Vec::new();
        }

        // Bounding box first, then exact great-circle distance.
        let lat_delta = max_distance_m / METRES_PER_DEGREE;
        let lon_delta = max_distance_m / (METRES_PER_DEGREE * latitude.to_radians().cos().abs().max(1e-6));
        let envelope = AABB::from_corners(
            [longitude - lon_delta, latitude - lat_delta],
            [longitude + lon_delta, latitude + lat_delta],
        );

        let here = Point::new(longitude, latitude);
        let mut found: Vec<(f64, &Stop)> = self
            .locations
            .locate_in_envelope(&envelope)
            .filter_map(|p| self.stops.get(&p.data))
            .map(|stop| (Haversine.distance(here, stop.point()), stop))
            .filter(|(d, _)| *d <= max_distance_m)
            .collect();

        found.sort_by(|(da, a), (db, b)| da.total_cmp(db).then_with(|| a.code.cmp(&b.code)));
        found
            .into_iter()
            .take(limit)
            .map(|(_, stop)| stop.clone())
            .collect()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the contents of a snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut tables = Tables {
            stops: snapshot
                .stops
                .into_iter()
                .map(|s| (s.code.clone(), s))
                .collect(),
            services: snapshot
                .services
                .into_iter()
                .map(|s| (s.key.clone(), s))
                .collect(),
            segment_index: SegmentIndex::build(&snapshot.segments),
            segments: snapshot.segments,
            routes: snapshot.route_descriptions,
            ..Tables::default()
        };
        tables.rebuild_locations();
        tables.rebuild_route_index();

        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Load a store from a snapshot file.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Snapshot::load(path).map(Self::from_snapshot)
    }

    /// Copy the current contents out. Stops are ordered by code.
    pub async fn snapshot(&self) -> Snapshot {
        let tables = self.tables.read().await;
        let mut stops: Vec<Stop> = tables.stops.values().cloned().collect();
        stops.sort_by(|a, b| a.code.cmp(&b.code));

        Snapshot {
            stops,
            services: tables.services.values().cloned().collect(),
            segments: tables.segments.clone(),
            route_descriptions: tables.routes.clone(),
        }
    }

    /// Write the current contents to a snapshot file.
    pub async fn save(&self, path: &Path) -> Result<(), StoreError> {
        self.snapshot().await.save(path)
    }

    pub async fn stats(&self) -> StoreStats {
        let tables = self.tables.read().await;
        StoreStats {
            stops: tables.stops.len(),
            services: tables.services.len(),
            segments: tables.segments.len(),
            route_descriptions: tables.routes.len(),
        }
    }
}

impl NetworkStore for MemoryStore {
    async fn find_stop(&self, code: &StopCode) -> Result<Option<Stop>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.stops.get(code).cloned())
    }

    async fn find_stops_near(
        &self,
        latitude: f64,
        longitude: f64,
        max_distance_m: f64,
        limit: usize,
    ) -> Result<Vec<Stop>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.stops_near(latitude, longitude, max_distance_m, limit))
    }

    async fn find_service(&self, key: &ServiceKey) -> Result<Option<Service>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.services.get(key).cloned())
    }

    async fn find_services(&self) -> Result<Vec<Service>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.services.values().cloned().collect())
    }

    async fn find_segments(&self, query: &SegmentQuery) -> Result<Vec<Segment>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.select_segments(query))
    }

    async fn find_route_descriptions(
        &self,
        query: &RouteQuery,
    ) -> Result<Vec<RouteDescription>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.select_routes(query))
    }

    async fn insert_stops(&self, stops: Vec<Stop>) -> Result<usize, StoreError> {
        let count = stops.len();
        let mut tables = self.tables.write().await;
        for stop in stops {
            tables.stops.insert(stop.code.clone(), stop);
        }
        tables.rebuild_locations();
        Ok(count)
    }

    async fn insert_services(&self, services: Vec<Service>) -> Result<usize, StoreError> {
        let count = services.len();
        let mut tables = self.tables.write().await;
        for service in services {
            tables.services.insert(service.key.clone(), service);
        }
        Ok(count)
    }

    async fn insert_segments(&self, segments: Vec<Segment>) -> Result<usize, StoreError> {
        let count = segments.len();
        let mut tables = self.tables.write().await;
        for segment in segments {
            let i = tables.segments.len();
            tables.segment_index.add(i, &segment);
            tables.segments.push(segment);
        }
        Ok(count)
    }

    async fn insert_route_descriptions(
        &self,
        routes: Vec<RouteDescription>,
    ) -> Result<usize, StoreError> {
        let count = routes.len();
        let mut tables = self.tables.write().await;
        for route in routes {
            let i = tables.routes.len();
            tables
                .route_index
                .entry((route.origin.clone(), route.destination.clone()))
                .or_default()
                .push(i);
            tables.routes.push(route);
        }
        Ok(count)
    }

    async fn delete_stops(&self) -> Result<usize, StoreError> {
        let mut tables = self.tables.write().await;
        let count = tables.stops.len();
        tables.stops.clear();
        tables.locations = RTree::new();
        Ok(count)
    }

    async fn delete_services(&self) -> Result<usize, StoreError> {
        let mut tables = self.tables.write().await;
        let count = tables.services.len();
        tables.services.clear();
        Ok(count)
    }

    async fn delete_segments(&self, query: &SegmentQuery) -> Result<usize, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.segments.len();
        tables.segments.retain(|s| !query.matches(s));
        let removed = before - tables.segments.len();
        if removed > 0 {
            tables.segment_index = SegmentIndex::build(&tables.segments);
        }
        Ok(removed)
    }

    async fn delete_route_descriptions(&self, query: &RouteQuery) -> Result<usize, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.routes.len();
        tables.routes.retain(|r| !query.matches(r));
        let removed = before - tables.routes.len();
        if removed > 0 {
            tables.rebuild_route_index();
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, TimeWindow};
    use tempfile::tempdir;

    fn code(s: &str) -> StopCode {
        StopCode::parse(s).unwrap()
    }

    fn stop(c: &str, latitude: f64, longitude: f64) -> Stop {
        Stop {
            code: code(c),
            road_name: "Road".into(),
            description: format!("Stop {c}"),
            latitude,
            longitude,
        }
    }

    fn seg(service: &str, origin: &str, destination: &str, sequence: u32, ty: SegmentType) -> Segment {
        Segment {
            service: ServiceKey::new(service, Direction::One),
            origin: code(origin),
            destination: code(destination),
            travel_time: 2,
            sequence,
            window: TimeWindow::default(),
            segment_type: ty,
        }
    }

    #[tokio::test]
    async fn stop_codes_are_unique() {
        let store = MemoryStore::new();
        store
            .insert_stops(vec![stop("1", 1.30, 103.80), stop("1", 1.31, 103.81)])
            .await
            .unwrap();

        assert_eq!(store.stats().await.stops, 1);
        let found = store.find_stop(&code("1")).await.unwrap().unwrap();
        assert_eq!(found.latitude, 1.31);
    }

    #[tokio::test]
    async fn nearest_stops_are_ordered_and_bounded() {
        let store = MemoryStore::new();
        // Roughly 111 m per 0.001 degree of latitude.
        store
            .insert_stops(vec![
                stop("far", 1.3080, 103.8000),
                stop("near", 1.3005, 103.8000),
                stop("mid", 1.3040, 103.8000),
                stop("out", 1.3200, 103.8000),
            ])
            .await
            .unwrap();

        let found = store.find_stops_near(1.3, 103.8, 1000.0, 3).await.unwrap();
        let codes: Vec<_> = found.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, ["near", "mid", "far"]);

        let found = store.find_stops_near(1.3, 103.8, 1000.0, 2).await.unwrap();
        assert_eq!(found.len(), 2);

        let found = store.find_stops_near(1.3, 103.8, 100.0, 3).await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn no_stops_nearby() {
        let store = MemoryStore::new();
        store.insert_stops(vec![stop("1", 1.40, 103.90)]).await.unwrap();
        assert!(store.find_stops_near(1.3, 103.8, 1000.0, 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn segment_queries_keep_insertion_order() {
        let store = MemoryStore::new();
        store
            .insert_segments(vec![
                seg("96", "c", "d", 3, SegmentType::Finegrain),
                seg("96", "a", "b", 1, SegmentType::Finegrain),
                seg("14", "a", "x", 1, SegmentType::Finegrain),
                seg("96", "a", "d", 0, SegmentType::HubToHub),
            ])
            .await
            .unwrap();

        let q = SegmentQuery::of_type(SegmentType::Finegrain)
            .with_service(ServiceKey::new("96", Direction::One));
        let found = store.find_segments(&q).await.unwrap();
        let seqs: Vec<_> = found.iter().map(|s| s.sequence).collect();
        assert_eq!(seqs, [3, 1]);

        let q = SegmentQuery::of_type(SegmentType::Finegrain).with_origin(code("a"));
        assert_eq!(store.find_segments(&q).await.unwrap().len(), 2);

        let q = SegmentQuery::all().with_origin(code("a"));
        assert_eq!(store.find_segments(&q).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn delete_rebuilds_indexes() {
        let store = MemoryStore::new();
        store
            .insert_segments(vec![
                seg("96", "a", "b", 1, SegmentType::Finegrain),
                seg("96", "a", "d", 0, SegmentType::HubToHub),
                seg("96", "b", "c", 2, SegmentType::Finegrain),
            ])
            .await
            .unwrap();

        let removed = store
            .delete_segments(&SegmentQuery::of_type(SegmentType::HubToHub))
            .await
            .unwrap();
        assert_eq!(removed, 1);

        let q = SegmentQuery::of_type(SegmentType::Finegrain).with_origin(code("b"));
        let found = store.find_segments(&q).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].destination, code("c"));
    }

    #[tokio::test]
    async fn save_and_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("network.json");

        let store = MemoryStore::new();
        store.insert_stops(vec![stop("2", 1.30, 103.80), stop("1", 1.31, 103.81)]).await.unwrap();
        store
            .insert_segments(vec![seg("96", "1", "2", 1, SegmentType::Finegrain)])
            .await
            .unwrap();
        store.save(&path).await.unwrap();

        let reopened = MemoryStore::open(&path).unwrap();
        assert_eq!(reopened.stats().await, store.stats().await);
        assert_eq!(reopened.snapshot().await, store.snapshot().await);
        assert_eq!(
            reopened.find_stops_near(1.30, 103.80, 50.0, 3).await.unwrap()[0].code,
            code("2")
        );
    }
}
