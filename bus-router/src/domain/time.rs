//! First/last bus times.
//!
//! The operator publishes, for each stop on a service, the time of the first
//! and last bus on weekdays, Saturdays and Sundays as `HHMM` strings. Missing
//! values are published as `-`. A last bus earlier than the first bus means
//! the service runs past midnight.

use std::fmt;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Sentinel written for a missing time.
const MISSING: &str = "-";

/// A wall-clock time with minute precision, as published in `HHMM` form.
///
/// # Examples
///
/// ```
/// use bus_router::domain::BusTime;
///
/// let t = BusTime::parse_hhmm("0530").unwrap();
/// assert_eq!(t.to_string(), "0530");
///
/// assert!(BusTime::parse_hhmm("-").is_err());
/// assert!(BusTime::parse_hhmm("2460").is_err());
/// assert!(BusTime::parse_hhmm("05:30").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BusTime(NaiveTime);

impl BusTime {
    /// Parse a time from exactly four ASCII digits `HHMM`.
    pub fn parse_hhmm(s: &str) -> Result<Self, TimeError> {
        let bytes = s.as_bytes();

        if bytes.len() != 4 {
            return Err(TimeError::new("expected HHMM format"));
        }

        if !bytes.iter().all(u8::is_ascii_digit) {
            return Err(TimeError::new("expected digits only"));
        }

        let hours = u32::from(bytes[0] - b'0') * 10 + u32::from(bytes[1] - b'0');
        let minutes = u32::from(bytes[2] - b'0') * 10 + u32::from(bytes[3] - b'0');

        if hours > 23 {
            return Err(TimeError::new("hours must be 00-23"));
        }
        if minutes > 59 {
            return Err(TimeError::new("minutes must be 00-59"));
        }

        NaiveTime::from_hms_opt(hours, minutes, 0)
            .map(BusTime)
            .ok_or(TimeError::new("invalid time"))
    }

    /// Construct from hour and minute, for callers that already hold numbers.
    pub fn from_hm(hours: u32, minutes: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hours, minutes, 0).map(BusTime)
    }

    pub fn time(&self) -> NaiveTime {
        self.0
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }
}

impl fmt::Debug for BusTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BusTime({self})")
    }
}

impl fmt::Display for BusTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}{:02}", self.hour(), self.minute())
    }
}

/// Parse a published time, treating the sentinel and anything malformed as
/// missing.
pub fn parse_published(s: &str) -> Option<BusTime> {
    BusTime::parse_hhmm(s.trim()).ok()
}

/// First and last bus for one day type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DayWindow {
    #[serde(with = "published_time")]
    pub first: Option<BusTime>,
    #[serde(with = "published_time")]
    pub last: Option<BusTime>,
}

impl DayWindow {
    pub fn new(first: Option<BusTime>, last: Option<BusTime>) -> Self {
        Self { first, last }
    }

    /// Build from the raw published strings.
    pub fn from_published(first: &str, last: &str) -> Self {
        Self {
            first: parse_published(first),
            last: parse_published(last),
        }
    }

    /// Both ends, if both are known.
    pub fn bounds(&self) -> Option<(BusTime, BusTime)> {
        Some((self.first?, self.last?))
    }

    /// True when the last bus is earlier than the first, i.e. the window
    /// runs past midnight.
    pub fn crosses_midnight(&self) -> bool {
        self.bounds().is_some_and(|(first, last)| last < first)
    }
}

/// Operating windows for the three day types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub weekday: DayWindow,
    pub saturday: DayWindow,
    pub sunday: DayWindow,
}

impl TimeWindow {
    pub fn new(weekday: DayWindow, saturday: DayWindow, sunday: DayWindow) -> Self {
        Self {
            weekday,
            saturday,
            sunday,
        }
    }

    /// The same window on every day type.
    pub fn every_day(window: DayWindow) -> Self {
        Self::new(window, window, window)
    }
}

/// Serde adapter writing `Option<BusTime>` in published form.
mod published_time {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{BusTime, MISSING, parse_published};

    pub fn serialize<S: Serializer>(t: &Option<BusTime>, s: S) -> Result<S::Ok, S::Error> {
        match t {
            Some(t) => s.collect_str(t),
            None => s.serialize_str(MISSING),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<BusTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        Ok(raw.as_deref().and_then(parse_published))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_times() {
        assert_eq!(BusTime::parse_hhmm("0000").unwrap().to_string(), "0000");
        assert_eq!(BusTime::parse_hhmm("2359").unwrap().to_string(), "2359");
        let t = BusTime::parse_hhmm("0615").unwrap();
        assert_eq!(t.hour(), 6);
        assert_eq!(t.minute(), 15);
    }

    #[test]
    fn reject_malformed_times() {
        for bad in ["", "-", "615", "06155", "06:15", "2400", "0660", "ab12", " 615"] {
            assert!(BusTime::parse_hhmm(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn published_sentinel_is_missing() {
        assert_eq!(parse_published("-"), None);
        assert_eq!(parse_published(""), None);
        assert_eq!(parse_published("0530"), BusTime::from_hm(5, 30));
    }

    #[test]
    fn crosses_midnight() {
        assert!(DayWindow::from_published("2300", "0100").crosses_midnight());
        assert!(!DayWindow::from_published("0600", "2300").crosses_midnight());
        assert!(!DayWindow::from_published("-", "0100").crosses_midnight());
    }

    #[test]
    fn serializes_in_published_form() {
        let window = DayWindow::from_published("0530", "-");
        let json = serde_json::to_string(&window).unwrap();
        assert_eq!(json, r#"{"first":"0530","last":"-"}"#);
    }

    #[test]
    fn deserializes_garbage_as_missing() {
        let window: DayWindow = serde_json::from_str(r#"{"first":"5:30","last":null}"#).unwrap();
        assert_eq!(window.first, None);
        assert_eq!(window.last, None);
    }

    #[test]
    fn window_json_roundtrip() {
        let window = TimeWindow::new(
            DayWindow::from_published("0530", "2330"),
            DayWindow::from_published("0600", "0030"),
            DayWindow::from_published("-", "-"),
        );
        let json = serde_json::to_string(&window).unwrap();
        let back: TimeWindow = serde_json::from_str(&json).unwrap();
        assert_eq!(back, window);
    }
}
