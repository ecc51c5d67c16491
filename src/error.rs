//! Error types for taskboard-notify
//!
//! This module defines the error types shared by the HTTP layer, the
//! credential providers and the notification store.
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// HTTP status code used by the backend to signal rate limiting
pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// HTTP status code for a rejected or expired session
pub const STATUS_UNAUTHORIZED: u16 = 401;

/// Errors returned by calls against the REST backend
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
    /// Request exceeded the configured transport timeout
    #[error("Request timed out")]
    Timeout,

    /// Backend could not be reached
    #[error("Connection refused")]
    Connection,

    /// Any other transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Backend answered with a non-success HTTP status
    #[error("HTTP {status}{}", message_suffix(.message))]
    Http {
        /// HTTP status code
        status: u16,
        /// Message from the response envelope, if any
        message: Option<String>,
    },

    /// Response body could not be decoded into the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Envelope decoded but reported `success: false`
    #[error("Request rejected: {0}")]
    Rejected(String),
}

fn message_suffix(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(": {}", m),
        None => String::new(),
    }
}

impl ApiError {
    /// HTTP status carried by this error, if it came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend rejected the session credentials
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(STATUS_UNAUTHORIZED)
    }
}

/// Credential storage errors
#[derive(Debug, Error)]
pub enum CredentialError {
    /// IO error while reading or removing the token file
    #[error("Credential IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application-level error type
///
/// Aggregates the domain errors for callers that do not care which layer failed.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend call failed
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Credential storage failed
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Trait for determining if an error is retryable
pub trait RetryableError {
    /// Returns true if the error is retryable
    fn is_retryable(&self) -> bool;
}

impl RetryableError for ApiError {
    fn is_retryable(&self) -> bool {
        // Only rate limiting is retried; timeouts and 5xx surface immediately.
        self.status() == Some(STATUS_TOO_MANY_REQUESTS)
    }
}
