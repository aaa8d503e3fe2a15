//! Error types surfaced to the presentation layer

use thiserror::Error;

/// Every failure a parking operation can report.
///
/// All variants are recoverable; the `Display` text is meant to be shown
/// to the operator as-is.
#[derive(Debug, Error)]
pub enum ParkingError {
    #[error("license plate cannot be empty")]
    EmptyInput,

    #[error("license plate '{input}' is invalid: {reason}")]
    InvalidFormat { input: String, reason: String },

    #[error("vehicle {0} is already parked")]
    DuplicateEntry(String),

    #[error("no active parking session with id {0}")]
    NotFound(i64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("record store unavailable: {0}")]
    StoreUnavailable(String),
}

impl ParkingError {
    pub(crate) fn invalid_format(input: &str, reason: impl Into<String>) -> Self {
        ParkingError::InvalidFormat {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<rusqlite::Error> for ParkingError {
    fn from(err: rusqlite::Error) -> Self {
        ParkingError::StoreUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ParkingError>;
