//! Planner configuration.

use std::time::Duration;

use chrono::{FixedOffset, NaiveDateTime, Offset, Utc};

/// Configuration parameters for route finding and ranking.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Fixed cost of changing buses (minutes).
    pub transfer_penalty_mins: u32,

    /// How many nearby stops to try at each end of a request.
    pub max_stop_candidates: usize,

    /// Search radius for nearby stops (metres).
    pub nearby_radius_m: f64,

    /// Wait assumed when no live arrival is available (minutes).
    pub missing_arrival_penalty_mins: u32,

    /// Upper bound on each live-arrival fetch.
    pub arrival_timeout: Duration,

    /// Offset of the network's wall clock from UTC (minutes).
    /// Published first/last bus times are local to the network.
    pub utc_offset_mins: i32,
}

impl PlannerConfig {
    pub fn with_transfer_penalty(mut self, mins: u32) -> Self {
        self.transfer_penalty_mins = mins;
        self
    }

    pub fn with_max_stop_candidates(mut self, n: usize) -> Self {
        self.max_stop_candidates = n;
        self
    }

    pub fn with_nearby_radius(mut self, metres: f64) -> Self {
        self.nearby_radius_m = metres;
        self
    }

    pub fn with_missing_arrival_penalty(mut self, mins: u32) -> Self {
        self.missing_arrival_penalty_mins = mins;
        self
    }

    pub fn with_arrival_timeout(mut self, timeout: Duration) -> Self {
        self.arrival_timeout = timeout;
        self
    }

    pub fn with_utc_offset(mut self, mins: i32) -> Self {
        self.utc_offset_mins = mins;
        self
    }

    /// The network's wall-clock offset, falling back to UTC if out of range.
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_mins * 60).unwrap_or_else(|| Utc.fix())
    }

    /// Current wall-clock time on the network.
    pub fn local_now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.utc_offset()).naive_local()
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            transfer_penalty_mins: 5,
            max_stop_candidates: 3,
            nearby_radius_m: 1000.0,
            missing_arrival_penalty_mins: 10,
            arrival_timeout: Duration::from_secs(5),
            utc_offset_mins: 8 * 60, // Singapore
        }
    }
}
