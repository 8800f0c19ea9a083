//! Error types for API operations
//!
//! This module defines the errors returned by [`LaunchDarklyApi`]
//! implementations. HTTP error statuses are mapped to distinct variants so
//! callers can tell a missing resource apart from a transport failure.
//!
//! [`LaunchDarklyApi`]: crate::client::LaunchDarklyApi

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The requested resource does not exist (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// The resource already exists (HTTP 409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The request body or patch was rejected (HTTP 400 / 422)
    #[error("Validation failed ({status}): {message}")]
    Validation {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// The token was rejected (HTTP 401 / 403)
    #[error("Unauthorized ({status}): {message}")]
    Unauthorized {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Any other non-success status
    #[error("API error ({status}): {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The response body could not be parsed
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Client configuration is unusable
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Coarse classification of a failure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Single-resource fetch target is absent.
    NotFound,
    /// A lookup matched zero or several resources where one was required.
    Ambiguous,
    /// Create against an existing key.
    Conflict,
    /// Malformed request, surfaced by the API.
    Validation,
    /// Network or HTTP-layer failure.
    Transport,
    /// Everything else.
    Other,
}

impl ErrorKind {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Ambiguous => "ambiguous",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Validation => "validation",
            ErrorKind::Transport => "transport",
            ErrorKind::Other => "other",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ApiError {
    /// Map a non-success HTTP status and body to an error.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            404 => ApiError::NotFound(message),
            409 => ApiError::Conflict(message),
            400 | 422 => ApiError::Validation { status, message },
            401 | 403 => ApiError::Unauthorized { status, message },
            _ => ApiError::Status { status, message },
        }
    }

    /// Get the HTTP status code, if the server answered.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::NotFound(_) => Some(404),
            ApiError::Conflict(_) => Some(409),
            ApiError::Validation { status, .. }
            | ApiError::Unauthorized { status, .. }
            | ApiError::Status { status, .. } => Some(*status),
            ApiError::RequestFailed(e) => e.status().map(|s| s.as_u16()),
            ApiError::InvalidResponse(_) | ApiError::Config(_) => None,
        }
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::Conflict(_) => ErrorKind::Conflict,
            ApiError::Validation { .. } => ErrorKind::Validation,
            ApiError::RequestFailed(_) => ErrorKind::Transport,
            ApiError::Status { status, .. } if *status >= 500 => ErrorKind::Transport,
            ApiError::Unauthorized { .. }
            | ApiError::Status { .. }
            | ApiError::InvalidResponse(_)
            | ApiError::Config(_) => ErrorKind::Other,
        }
    }

    /// Check if this error means the resource is absent.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
