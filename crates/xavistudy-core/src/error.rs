//! Core error types for xavistudy-core.
//!
//! This module defines the error hierarchy using thiserror. Session errors
//! are precondition failures raised by the state machine, API errors come
//! from the external backend, and the rest cover local storage and config.

use std::path::PathBuf;
use thiserror::Error;

use crate::session::SessionStatus;

/// Core error type for xavistudy-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Rejected state machine transitions
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// External backend failures
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Local SQLite store errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Precondition failures of the study session state machine.
///
/// These are never swallowed: an invalid transition almost always means the
/// UI layer called into the machine at the wrong time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot {action} while session is {status}")]
    InvalidTransition {
        action: &'static str,
        status: SessionStatus,
    },

    #[error("a study session is already {0}")]
    AlreadyActive(SessionStatus),

    #[error("cannot finish a session with no elapsed time")]
    NothingElapsed,

    /// The session was cancelled (e.g. app backgrounded) while an external
    /// call for it was still in flight.
    #[error("session was interrupted before the operation completed")]
    Interrupted,

    #[error("another {0} operation is already in flight")]
    OperationInFlight(&'static str),
}

/// Errors reported by the external backend adapters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("network failure: {0}")]
    Network(String),

    #[error("backend rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("unauthorized")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Empty collection
    #[error("Empty collection: {0}")]
    EmptyCollection(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
