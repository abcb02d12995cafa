//! Point-to-point route finding over finegrain segments.
//!
//! Only services that touch the origin (from the origin onward) or the
//! destination (up to the destination) are loaded. The shortest stop path
//! through that subnetwork is then turned into legs, preferring to stay on
//! the same bus whenever the next stop can be reached without changing.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;
use tracing::{debug, trace};

use crate::domain::{
    Route, RouteSegment, Segment, SegmentId, SegmentType, ServiceKey, Stop, StopCode,
};
use crate::graph::build_graph;
use crate::store::{NetworkStore, SegmentQuery};

use super::config::PlannerConfig;
use super::error::RouteError;
use super::service_time::{in_service, is_in_service};

/// Finds routes by riding finegrain segments of nearby services.
pub struct PointToPointFinder<'a, S> {
    store: &'a S,
    config: &'a PlannerConfig,
}

/// A partial itinerary along the shortest stop path.
#[derive(Debug, Clone)]
struct Candidate<'s> {
    segments: Vec<&'s Segment>,
    time: u32,
}

impl<'s> Candidate<'s> {
    fn start(segment: &'s Segment) -> Self {
        Self {
            segments: vec![segment],
            time: segment.travel_time,
        }
    }

    fn service(&self) -> Option<&'s ServiceKey> {
        self.segments.last().map(|s| &s.service)
    }

    fn extend(&self, segment: &'s Segment, penalty: u32) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self {
            segments,
            time: self.time + segment.travel_time + penalty,
        }
    }
}

/// The in-service segments of the services near both ends.
struct Subnetwork {
    segments: Vec<Segment>,
}

impl Subnetwork {
    /// Segments joining each ordered stop pair, in load order.
    fn by_edge(&self) -> HashMap<(&StopCode, &StopCode), Vec<&Segment>> {
        let mut edges: HashMap<(&StopCode, &StopCode), Vec<&Segment>> = HashMap::new();
        for segment in &self.segments {
            edges
                .entry((&segment.origin, &segment.destination))
                .or_default()
                .push(segment);
        }
        edges
    }
}

impl<'a, S: NetworkStore> PointToPointFinder<'a, S> {
    pub fn new(store: &'a S, config: &'a PlannerConfig) -> Self {
        Self { store, config }
    }

    /// Find a route from `origin` to `destination` operating at `at`.
    pub async fn find_route(
        &self,
        origin: &StopCode,
        destination: &StopCode,
        at: NaiveDateTime,
    ) -> Result<Route, RouteError> {
        if origin == destination {
            return Err(RouteError::not_found(origin, destination));
        }

        let subnetwork = self.load_subnetwork(origin, destination, at).await?;
        let graph = build_graph(&subnetwork.segments);
        let path = graph
            .shortest_path(origin, destination)
            .ok_or_else(|| RouteError::not_found(origin, destination))?;
        trace!(stops = path.stops.len(), cost = path.cost, "point-to-point path");

        let best = self
            .fewest_transfers(&subnetwork, &path.stops)
            .ok_or_else(|| RouteError::not_found(origin, destination))?;

        debug!(
            %origin,
            %destination,
            segments = best.segments.len(),
            time = best.time,
            "point-to-point route found"
        );

        let legs = self.build_legs(&best.segments).await?;
        Ok(Route::new(legs, best.time))
    }

    /// Load the in-service sub-routes of every service leaving `origin` or
    /// reaching `destination`. Each service is queried at most once per
    /// direction, bounded by sequence at the stop it touches.
    async fn load_subnetwork(
        &self,
        origin: &StopCode,
        destination: &StopCode,
        at: NaiveDateTime,
    ) -> Result<Subnetwork, RouteError> {
        let leaving = in_service(
            self.store
                .find_segments(&SegmentQuery::of_type(SegmentType::Finegrain).with_origin(origin.clone()))
                .await?,
            at,
        );
        let arriving = in_service(
            self.store
                .find_segments(
                    &SegmentQuery::of_type(SegmentType::Finegrain).with_destination(destination.clone()),
                )
                .await?,
            at,
        );

        // (service, onward) -> widest sequence bound, in first-seen order.
        let mut bounds: Vec<(ServiceKey, bool, u32)> = Vec::new();
        let mut index: HashMap<(ServiceKey, bool), usize> = HashMap::new();
        let anchors = leaving
            .iter()
            .map(|s| (s, true))
            .chain(arriving.iter().map(|s| (s, false)));
        for (anchor, onward) in anchors {
            match index.get(&(anchor.service.clone(), onward)) {
                Some(&i) => {
                    let bound = &mut bounds[i].2;
                    *bound = if onward {
                        (*bound).min(anchor.sequence)
                    } else {
                        (*bound).max(anchor.sequence)
                    };
                }
                None => {
                    index.insert((anchor.service.clone(), onward), bounds.len());
                    bounds.push((anchor.service.clone(), onward, anchor.sequence));
                }
            }
        }

        let mut seen: HashSet<SegmentId> = HashSet::new();
        let mut segments = Vec::new();

        // Onward from the origin, then up to the destination.
        for (service, onward, sequence) in &bounds {
            let query = SegmentQuery::of_type(SegmentType::Finegrain).with_service(service.clone());
            let query = if *onward {
                query.with_min_sequence(*sequence)
            } else {
                query.with_max_sequence(*sequence)
            };

            for segment in self.store.find_segments(&query).await? {
                if is_in_service(&segment.window, at) && seen.insert(segment.id()) {
                    segments.push(segment);
                }
            }
        }

        trace!(
            queries = bounds.len(),
            segments = segments.len(),
            "loaded point-to-point subnetwork"
        );
        Ok(Subnetwork { segments })
    }

    /// Walk `path` keeping a set of candidate itineraries, and return the
    /// cheapest. Returns `None` if some step cannot be ridden.
    ///
    /// Each step is one round: every candidate first tries to stay on its
    /// current service; a candidate that cannot stay branches onto every
    /// service serving the step, most useful first. Only after all
    /// candidates have moved are transfers pruned, and only if at least one
    /// candidate managed to stay. Candidates on the same service are then
    /// merged, keeping the cheapest.
    fn fewest_transfers<'s>(
        &self,
        subnetwork: &'s Subnetwork,
        path: &[StopCode],
    ) -> Option<Candidate<'s>> {
        let edges = subnetwork.by_edge();
        let steps: Vec<&[&'s Segment]> = path
            .windows(2)
            .map(|pair| {
                edges
                    .get(&(&pair[0], &pair[1]))
                    .map(Vec::as_slice)
                    .unwrap_or(&[])
            })
            .collect();

        let (first, rest) = steps.split_first()?;
        let mut candidates: Vec<Candidate<'s>> = first.iter().copied().map(Candidate::start).collect();
        let penalty = self.config.transfer_penalty_mins;

        for (i, step) in rest.iter().enumerate() {
            let alternatives = ranked_alternatives(step, &steps[i + 2..]);
            let mut next: Vec<(Candidate<'s>, bool)> = Vec::new();
            let mut any_stayed = false;

            for candidate in &candidates {
                let current = candidate.service();
                if let Some(same) = step.iter().copied().find(|s| Some(&s.service) == current) {
                    any_stayed = true;
                    next.push((candidate.extend(same, 0), false));
                } else {
                    for &alternative in &alternatives {
                        next.push((candidate.extend(alternative, penalty), true));
                    }
                }
            }

            if any_stayed {
                next.retain(|(_, transferred)| !transferred);
            }
            candidates = merge_by_service(next.into_iter().map(|(c, _)| c));

            if candidates.is_empty() {
                return None;
            }
        }

        candidates.into_iter().min_by_key(|c| c.time)
    }

    /// Group consecutive same-service segments into legs and resolve every
    /// stop and service. The stop where a transfer happens ends one leg and
    /// starts the next.
    async fn build_legs(&self, segments: &[&Segment]) -> Result<Vec<RouteSegment>, RouteError> {
        let mut legs = Vec::new();

        for run in segments.chunk_by(|a, b| a.service == b.service) {
            let Some(first) = run.first() else {
                continue;
            };

            let service = self
                .store
                .find_service(&first.service)
                .await?
                .ok_or_else(|| RouteError::DataIntegrity(format!("no such service {}", first.service)))?;

            let service_origin = self.stop(&service.origin).await?;
            let service_destination = self.stop(&service.destination).await?;

            let mut stops = Vec::with_capacity(run.len() + 1);
            stops.push(self.stop(&first.origin).await?);
            for segment in run {
                stops.push(self.stop(&segment.destination).await?);
            }

            legs.push(RouteSegment {
                service,
                service_origin,
                service_destination,
                stops,
            });
        }

        Ok(legs)
    }

    async fn stop(&self, code: &StopCode) -> Result<Stop, RouteError> {
        self.store
            .find_stop(code)
            .await?
            .ok_or_else(|| RouteError::DataIntegrity(format!("no such bus stop {code}")))
    }
}

/// Segments serving this step, ordered by how many of the following steps
/// the same service also serves without a break. Ties keep load order.
fn ranked_alternatives<'s>(step: &[&'s Segment], upcoming: &[&[&'s Segment]]) -> Vec<&'s Segment> {
    let reach = |service: &ServiceKey| {
        upcoming
            .iter()
            .take_while(|next| next.iter().any(|s| &s.service == service))
            .count()
    };

    let mut ranked: Vec<(usize, &'s Segment)> = step.iter().map(|s| (reach(&s.service), *s)).collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    ranked.into_iter().map(|(_, s)| s).collect()
}

/// Keep one candidate per current service: the cheapest, first on ties.
fn merge_by_service<'s>(candidates: impl Iterator<Item = Candidate<'s>>) -> Vec<Candidate<'s>> {
    let mut merged: Vec<Candidate<'s>> = Vec::new();
    for candidate in candidates {
        match merged
            .iter_mut()
            .find(|existing| existing.service() == candidate.service())
        {
            Some(existing) => {
                if candidate.time < existing.time {
                    *existing = candidate;
                }
            }
            None => merged.push(candidate),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, TimeWindow};
    use crate::fixture;
    use crate::store::MemoryStore;

    fn seg(service: &str, origin: &str, destination: &str, travel_time: u32, sequence: u32) -> Segment {
        Segment {
            service: ServiceKey::new(service, Direction::One),
            origin: fixture::code(origin),
            destination: fixture::code(destination),
            travel_time,
            sequence,
            window: fixture::window(),
            segment_type: SegmentType::Finegrain,
        }
    }

    fn codes(route: &RouteSegment) -> Vec<&str> {
        route.stops.iter().map(|s| s.code.as_str()).collect()
    }

    #[tokio::test]
    async fn direct_ride_on_one_service() {
        let store = fixture::raw_store();
        let config = PlannerConfig::default();
        let finder = PointToPointFinder::new(&store, &config);

        let route = finder
            .find_route(&fixture::code("17091"), &fixture::code("17111"), fixture::weekday_at(12, 0))
            .await
            .unwrap();

        assert_eq!(route.segments.len(), 1);
        assert_eq!(route.segments[0].service.key, fixture::key("96"));
        assert_eq!(codes(&route.segments[0]), ["17091", "17101", "17111"]);
        assert_eq!(route.travel_time, 5);
    }

    #[tokio::test]
    async fn transfer_stop_is_repeated() {
        let store = fixture::raw_store();
        let config = PlannerConfig::default();
        let finder = PointToPointFinder::new(&store, &config);

        let route = finder
            .find_route(&fixture::code("17091"), &fixture::code("51071"), fixture::weekday_at(12, 0))
            .await
            .unwrap();

        assert_eq!(route.segments.len(), 2);
        assert_eq!(codes(&route.segments[0]), ["17091", "17101", "17111"]);
        assert_eq!(codes(&route.segments[1]), ["17111", "51061", "51071"]);
        // 3 + 2 + 5 + 3 plus one transfer
        assert_eq!(route.travel_time, 18);
    }

    #[tokio::test]
    async fn same_stop_is_not_found() {
        let store = fixture::raw_store();
        let config = PlannerConfig::default();
        let finder = PointToPointFinder::new(&store, &config);

        let err = finder
            .find_route(&fixture::code("17091"), &fixture::code("17091"), fixture::weekday_at(12, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::NotFound { .. }));
    }

    #[tokio::test]
    async fn subnetwork_is_bounded_by_sequence() {
        let store = fixture::raw_store();
        let config = PlannerConfig::default();
        let finder = PointToPointFinder::new(&store, &config);

        let subnetwork = finder
            .load_subnetwork(&fixture::code("17101"), &fixture::code("51071"), fixture::weekday_at(12, 0))
            .await
            .unwrap();
        let pairs: Vec<(&str, &str)> = subnetwork
            .segments
            .iter()
            .map(|s| (s.origin.as_str(), s.destination.as_str()))
            .collect();

        // 96 onward from 17101
        assert!(pairs.contains(&("17101", "17111")));
        assert!(pairs.contains(&("17111", "17129")));
        assert!(!pairs.contains(&("17091", "17101")));
        // 198 and 14 up to 51071
        assert!(pairs.contains(&("10009", "17111")));
        assert!(pairs.contains(&("51061", "51071")));
        assert!(pairs.contains(&("41011", "51071")));
        assert!(!pairs.contains(&("51071", "51079")));
        assert_eq!(pairs.len(), 7);
    }

    /// Two services share the whole path, but one leaves the path halfway.
    /// The rider should board the one that goes all the way.
    #[tokio::test]
    async fn prefers_staying_on_one_bus() {
        let store = MemoryStore::new();
        let stops = ["1", "2", "3", "4"];
        store
            .insert_stops(
                stops
                    .iter()
                    .map(|c| Stop {
                        code: fixture::code(c),
                        road_name: String::new(),
                        description: String::new(),
                        latitude: 1.3,
                        longitude: 103.8,
                    })
                    .collect(),
            )
            .await
            .unwrap();
        store
            .insert_services(
                [("7", "1", "4"), ("8", "1", "2")]
                    .iter()
                    .map(|(n, o, d)| crate::domain::Service {
                        key: ServiceKey::new(*n, Direction::One),
                        operator: "SBST".into(),
                        category: "TRUNK".into(),
                        origin: fixture::code(o),
                        destination: fixture::code(d),
                        loop_desc: None,
                    })
                    .collect(),
            )
            .await
            .unwrap();
        store
            .insert_segments(vec![
                seg("8", "1", "2", 1, 1),
                seg("7", "1", "2", 2, 1),
                seg("7", "2", "3", 2, 2),
                seg("7", "3", "4", 2, 3),
            ])
            .await
            .unwrap();

        let config = PlannerConfig::default();
        let finder = PointToPointFinder::new(&store, &config);
        let route = finder
            .find_route(&fixture::code("1"), &fixture::code("4"), fixture::weekday_at(12, 0))
            .await
            .unwrap();

        assert_eq!(route.segments.len(), 1);
        assert_eq!(route.segments[0].service.key.number, "7");
        assert_eq!(route.travel_time, 6);
    }

    #[tokio::test]
    async fn missing_stop_is_data_integrity() {
        let store = fixture::raw_store();
        store
            .insert_segments(vec![seg("96", "17129", "77777", 1, 4)])
            .await
            .unwrap();

        let config = PlannerConfig::default();
        let finder = PointToPointFinder::new(&store, &config);
        let err = finder
            .find_route(&fixture::code("17091"), &fixture::code("77777"), fixture::weekday_at(12, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::DataIntegrity(_)));
    }

    #[test]
    fn alternatives_rank_by_reach() {
        let a = seg("a", "1", "2", 1, 1);
        let b = seg("b", "1", "2", 1, 1);
        let b2 = seg("b", "2", "3", 1, 2);
        let c2 = seg("c", "2", "3", 1, 2);
        let b3 = seg("b", "3", "4", 1, 3);

        let step = [&a, &b];
        let next: [&[&Segment]; 2] = [&[&c2, &b2], &[&b3]];
        let ranked = ranked_alternatives(&step, &next);
        assert_eq!(ranked[0].service.number, "b");
        assert_eq!(ranked[1].service.number, "a");
    }

    #[test]
    fn merge_keeps_cheapest_then_first() {
        let a = seg("a", "1", "2", 4, 1);
        let a_fast = seg("a", "1", "2", 2, 1);
        let b = seg("b", "1", "2", 2, 1);
        let merged = merge_by_service(
            vec![Candidate::start(&a), Candidate::start(&b), Candidate::start(&a_fast)].into_iter(),
        );
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].time, 2);
        assert_eq!(merged[0].service().unwrap().number, "a");
        assert_eq!(merged[1].service().unwrap().number, "b");
    }

    #[test]
    fn window_outside_hours_is_skipped() {
        let mut closed = seg("a", "1", "2", 1, 1);
        closed.window = TimeWindow::default();
        assert!(!is_in_service(&closed.window, fixture::weekday_at(12, 0)));
    }
}
