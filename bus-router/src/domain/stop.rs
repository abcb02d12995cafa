//! Bus stop types.

use std::fmt;

use geo::Point;
use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid stop code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stop code: {reason}")]
pub struct InvalidStopCode {
    reason: &'static str,
}

/// Longest stop code accepted. Real codes are 5 digits; leave headroom.
const MAX_STOP_CODE_LEN: usize = 10;

/// A bus stop code, such as `17091`.
///
/// Stop codes are short ASCII alphanumeric strings. This type guarantees
/// that any `StopCode` value is valid by construction.
///
/// # Examples
///
/// ```
/// use bus_router::domain::StopCode;
///
/// let code = StopCode::parse("17091").unwrap();
/// assert_eq!(code.as_str(), "17091");
///
/// assert!(StopCode::parse("").is_err());
/// assert!(StopCode::parse("17 091").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StopCode(String);

impl StopCode {
    /// Parse a stop code from a string.
    ///
    /// Surrounding whitespace is not trimmed; the input must already be clean.
    pub fn parse(s: &str) -> Result<Self, InvalidStopCode> {
        if s.is_empty() {
            return Err(InvalidStopCode {
                reason: "must not be empty",
            });
        }

        if s.len() > MAX_STOP_CODE_LEN {
            return Err(InvalidStopCode {
                reason: "too long",
            });
        }

        if !s.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(InvalidStopCode {
                reason: "must be ASCII letters or digits",
            });
        }

        Ok(StopCode(s.to_string()))
    }

    /// Returns the stop code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StopCode {
    type Error = InvalidStopCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        StopCode::parse(&value)
    }
}

impl From<StopCode> for String {
    fn from(code: StopCode) -> Self {
        code.0
    }
}

impl fmt::Debug for StopCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopCode({})", self.0)
    }
}

impl fmt::Display for StopCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A physical bus stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub code: StopCode,
    pub road_name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Stop {
    /// Location as a geo point (x = longitude, y = latitude).
    pub fn point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_codes() {
        assert!(StopCode::parse("17091").is_ok());
        assert!(StopCode::parse("01012").is_ok());
        assert!(StopCode::parse("B1").is_ok());
    }

    #[test]
    fn reject_empty_and_long() {
        assert!(StopCode::parse("").is_err());
        assert!(StopCode::parse("12345678901").is_err());
    }

    #[test]
    fn reject_non_alphanumeric() {
        assert!(StopCode::parse("170-91").is_err());
        assert!(StopCode::parse(" 17091").is_err());
        assert!(StopCode::parse("1709É").is_err());
    }

    #[test]
    fn leading_zeros_are_kept() {
        let code = StopCode::parse("01012").unwrap();
        assert_eq!(code.to_string(), "01012");
    }

    #[test]
    fn deserialize_rejects_invalid() {
        let ok: Result<StopCode, _> = serde_json::from_str("\"17091\"");
        assert!(ok.is_ok());

        let bad: Result<StopCode, _> = serde_json::from_str("\"17 091\"");
        assert!(bad.is_err());
    }

    #[test]
    fn point_is_lon_lat() {
        let stop = Stop {
            code: StopCode::parse("17091").unwrap(),
            road_name: "Clementi Ave 3".into(),
            description: "Blk 431".into(),
            latitude: 1.3147,
            longitude: 103.7649,
        };
        let p = stop.point();
        assert_eq!(p.x(), 103.7649);
        assert_eq!(p.y(), 1.3147);
    }
}
