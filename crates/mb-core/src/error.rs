//! # AppError
//!
//! Centralized error handling for the Modboard ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all mb-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., submission, attachment)
    #[error("{0} not found")]
    NotFound(String),

    /// One message per invalid or missing field
    #[error("validation error: {}", .0.join(", "))]
    Validation(Vec<String>),

    /// Disallowed attachment type or oversized payload
    #[error("invalid attachment: {0}")]
    InvalidAttachment(String),

    /// Resource already exists (e.g., duplicate admin username/email)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Missing, malformed, or expired bearer token
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Login failure (unknown username or wrong password)
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Infrastructure failure (e.g., DB down, SMTP unreachable)
    #[error("internal service error: {0}")]
    Internal(String),
}

/// A specialized Result type for Modboard logic.
pub type Result<T> = std::result::Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
