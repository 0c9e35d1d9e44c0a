//! Error types for state synchronization.

use thiserror::Error;

/// Main error type for store operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Malformed percent-encoding: {0}")]
    Decode(String),

    #[error("Invalid state value for key {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("No URL has been parsed yet")]
    UrlNotParsed,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Storage is locked by another process")]
    Locked,
}

impl From<serde_json::Error> for StateError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_data() || e.is_syntax() || e.is_eof() {
            StateError::Deserialization(e.to_string())
        } else {
            StateError::Serialization(e.to_string())
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StateError>;
