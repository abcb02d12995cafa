//! Bus service types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::StopCode;

/// Error returned for a direction other than 1 or 2.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid direction: {0} (expected 1 or 2)")]
pub struct InvalidDirection(pub u8);

/// Direction of travel of a service. Loop services only have `One`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Direction {
    One,
    Two,
}

impl TryFrom<u8> for Direction {
    type Error = InvalidDirection;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Direction::One),
            2 => Ok(Direction::Two),
            other => Err(InvalidDirection(other)),
        }
    }
}

impl From<Direction> for u8 {
    fn from(d: Direction) -> Self {
        match d {
            Direction::One => 1,
            Direction::Two => 2,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

/// Identifies a service: the public service number plus direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceKey {
    pub number: String,
    pub direction: Direction,
}

impl ServiceKey {
    pub fn new(number: impl Into<String>, direction: Direction) -> Self {
        Self {
            number: number.into(),
            direction,
        }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.number, self.direction)
    }
}

/// A bus service as published by the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub key: ServiceKey,
    pub operator: String,
    /// Service category, e.g. "TRUNK" or "EXPRESS".
    pub category: String,
    /// Terminus the service starts from.
    pub origin: StopCode,
    /// Terminus the service ends at.
    pub destination: StopCode,
    /// Where a loop service turns around, if it is one.
    pub loop_desc: Option<String>,
}

impl Service {
    /// Returns true if the service is categorised as an express service.
    pub fn is_express(&self) -> bool {
        self.category.eq_ignore_ascii_case("EXPRESS")
    }
}
