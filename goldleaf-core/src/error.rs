//! Error types for goldleaf-core

use thiserror::Error;

/// Main error type for the goldleaf-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Task or profile absent, or owned by a different profile
    #[error("not found: {0}")]
    NotFound(String),

    /// Action applied to the wrong task type
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Daily already completed for this period, or todo already done
    #[error("already completed: {0}")]
    AlreadyCompleted(String),

    /// Non-repeatable reward claimed a second time
    #[error("already claimed: {0}")]
    AlreadyClaimed(String),

    /// Entity state violates an invariant (e.g. reward with non-negative cost)
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Reward claim would drive the balance negative
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Malformed input, with the offending field
    #[error("validation error on {field}: {message}")]
    Validation { field: String, message: String },

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Remote API error
    #[error("API error: {0}")]
    Api(String),
}

impl Error {
    /// Shorthand for a field-level validation error.
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for goldleaf-core
pub type Result<T> = std::result::Result<T, Error>;
