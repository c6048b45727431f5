//! Domain error types.
//!
//! These errors represent validation failures in the domain layer. They
//! are distinct from ingestion and source I/O errors.

use super::StationCode;

/// Domain-level errors for segment construction and stop times.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Stop index is out of bounds for the service
    #[error("invalid stop index: out of bounds")]
    InvalidStopIndex,

    /// Invalid segment construction (e.g., alight before board)
    #[error("invalid segment: {0}")]
    InvalidSegment(&'static str),

    /// Neither arrival nor departure is given at a stop
    #[error("no scheduled time at {0}")]
    MissingTime(StationCode),

    /// A stop time could not be read
    #[error("unreadable time {raw:?} at {station}")]
    UnreadableTime { station: StationCode, raw: String },

    /// Route has no legs
    #[error("route must have at least one leg")]
    EmptyRoute,

    /// Connection at a station is outside the legal waiting window
    #[error("connection at {0} is outside the waiting window")]
    IllegalWait(StationCode),
}
