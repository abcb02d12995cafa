//! Aggregate generation for a single service.

use tracing::warn;

use crate::domain::{RouteDescription, Segment, SegmentType, Service, ServiceKey, Stop, TimeWindow};

use super::{ReduceError, ResolutionCache};

/// Aggregates produced for one service, in emission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceReduction {
    pub segments: Vec<Segment>,
    pub routes: Vec<RouteDescription>,
}

/// Build the hub-to-hub, hub-to-spoke and spoke-to-hub aggregates for a
/// service from its finegrain segments, which must be sorted by sequence.
///
/// For stops `s0..sN` this emits `s0 -> sN`, then for every intermediate
/// stop `sk` the pair `s0 -> sk` and `sk -> sN`, each with a matching route
/// description. Every stop must resolve through `cache`.
pub fn reduce_service(
    key: &ServiceKey,
    finegrain: &[Segment],
    cache: &ResolutionCache,
) -> Result<ServiceReduction, ReduceError> {
    let (Some(first), Some(last)) = (finegrain.first(), finegrain.last()) else {
        return Err(ReduceError::NoSegments(key.clone()));
    };

    let integrity = |message: String| ReduceError::DataIntegrity {
        service: key.clone(),
        message,
    };

    let service = cache
        .service(key)
        .ok_or_else(|| integrity("service not found".to_string()))?;
    let service_origin = cache
        .stop(&service.origin)
        .ok_or_else(|| integrity(format!("service origin {} not found", service.origin)))?;
    let service_destination = cache.stop(&service.destination).ok_or_else(|| {
        integrity(format!(
            "service destination {} not found",
            service.destination
        ))
    })?;

    // Stop sequence as actually ridden.
    let mut codes = Vec::with_capacity(finegrain.len() + 1);
    codes.push(&first.origin);
    codes.extend(finegrain.iter().map(|s| &s.destination));

    let stops: Vec<Stop> = codes
        .iter()
        .map(|c| {
            cache
                .stop(c)
                .cloned()
                .ok_or_else(|| integrity(format!("stop {c} not found")))
        })
        .collect::<Result<_, _>>()?;

    if first.origin != service.origin || last.destination != service.destination {
        warn!(
            service = %key,
            ridden_from = %first.origin,
            ridden_to = %last.destination,
            published_from = %service.origin,
            published_to = %service.destination,
            "stop sequence endpoints differ from published service endpoints"
        );
    }

    let weights: Vec<u32> = finegrain.iter().map(|s| s.travel_time).collect();
    let hubs = Hubs {
        service,
        origin: service_origin,
        destination: service_destination,
    };

    let mut out = ServiceReduction::default();
    let last_stop = stops.len() - 1;

    hubs.emit(
        &mut out,
        SegmentType::HubToHub,
        &stops,
        weights.iter().sum(),
        0,
        first.window,
    );

    for k in 1..finegrain.len() {
        hubs.emit(
            &mut out,
            SegmentType::HubToSpoke,
            &stops[..=k],
            weights[..k].iter().sum(),
            k as u32,
            first.window,
        );
        hubs.emit(
            &mut out,
            SegmentType::SpokeToHub,
            &stops[k..=last_stop],
            weights[k..].iter().sum(),
            k as u32,
            finegrain[k].window,
        );
    }

    Ok(out)
}

struct Hubs<'a> {
    service: &'a Service,
    origin: &'a Stop,
    destination: &'a Stop,
}

impl Hubs<'_> {
    fn emit(
        &self,
        out: &mut ServiceReduction,
        segment_type: SegmentType,
        stops: &[Stop],
        travel_time: u32,
        sequence: u32,
        window: TimeWindow,
    ) {
        let (Some(from), Some(to)) = (stops.first(), stops.last()) else {
            return;
        };

        out.segments.push(Segment {
            service: self.service.key.clone(),
            origin: from.code.clone(),
            destination: to.code.clone(),
            travel_time,
            sequence,
            window,
            segment_type,
        });
        out.routes.push(RouteDescription {
            service: self.service.clone(),
            service_origin: self.origin.clone(),
            service_destination: self.destination.clone(),
            origin: from.code.clone(),
            destination: to.code.clone(),
            stops: stops.to_vec(),
            travel_time,
            window,
            segment_type,
        });
    }
}
