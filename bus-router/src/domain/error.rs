//! Domain error types.
//!
//! These errors represent validation failures in the domain layer. They are
//! distinct from API and storage errors.

use super::{InvalidDirection, InvalidStopCode, TimeError};

/// Domain-level validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error(transparent)]
    InvalidStopCode(#[from] InvalidStopCode),

    #[error(transparent)]
    InvalidDirection(#[from] InvalidDirection),

    #[error(transparent)]
    InvalidTime(#[from] TimeError),
}
