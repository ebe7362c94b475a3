//! # AppError
//!
//! Centralized error handling for the Fomí client core.
//! Maps backend and domain failures to actionable error types.

use thiserror::Error;

/// The primary error type for all domain operations.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// Resource not found (e.g., profile, review, list)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., empty list name, score out of range)
    #[error("validation error: {0}")]
    Validation(String),

    /// Auth failure (e.g., no session, rejected credentials, expired token)
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Transport-level failure (DNS, TLS, timeout) before any backend answer
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status
    #[error("backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// Object-storage failure (upload rejected, bucket missing)
    #[error("storage error: {0}")]
    Storage(String),

    /// Row or payload could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invariant breakage that should not happen in normal operation
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Creates a NotFound error.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound(entity.into(), id.to_string())
    }

    /// Creates an Unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Creates a Backend error from a status code and response body.
    pub fn backend(status: u16, message: impl Into<String>) -> Self {
        Self::Backend {
            status,
            message: message.into(),
        }
    }

    /// True for errors that indicate a missing row rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(..))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// A specialized Result type for Fomí client logic.
pub type Result<T> = std::result::Result<T, AppError>;
