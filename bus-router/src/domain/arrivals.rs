//! Live arrival estimates at a stop.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use super::stop::StopCode;

/// Next estimated arrival per service number at one stop.
///
/// Upstream arrivals carry no direction, so entries are keyed by the bare
/// service number. Times are naive wall-clock times on the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopArrivals {
    pub stop: StopCode,
    pub by_service: HashMap<String, NaiveDateTime>,
}

impl StopArrivals {
    pub fn new(stop: StopCode) -> Self {
        Self {
            stop,
            by_service: HashMap::new(),
        }
    }

    pub fn insert(&mut self, number: impl Into<String>, at: NaiveDateTime) {
        self.by_service.insert(number.into(), at);
    }

    pub fn get(&self, number: &str) -> Option<NaiveDateTime> {
        self.by_service.get(number).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.by_service.is_empty()
    }

    /// True once any estimate in the set has passed.
    pub fn is_stale(&self, now: NaiveDateTime) -> bool {
        self.by_service.values().any(|at| *at <= now)
    }
}
