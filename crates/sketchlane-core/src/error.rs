//! Error types shared across the crate.

use thiserror::Error;

/// Errors raised by presence transports.
///
/// The presence manager logs these and carries on; they never abort a local
/// interaction.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PresenceError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Failed to encode presence message: {0}")]
    Encode(String),
    #[error("Failed to decode presence message: {0}")]
    Decode(String),
    #[error("Presence channel closed")]
    Closed,
}

/// Errors raised while loading a canvas options record.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OptionsError {
    #[error("Failed to parse options: {0}")]
    Parse(String),
    #[error("Invalid option: {0}")]
    Invalid(String),
}

/// Result type for presence operations.
pub type PresenceResult<T> = Result<T, PresenceError>;

/// Result type for fallible core operations.
pub type CoreResult<T> = Result<T, OptionsError>;

impl From<serde_json::Error> for OptionsError {
    fn from(err: serde_json::Error) -> Self {
        OptionsError::Parse(err.to_string())
    }
}
