//! Error types shared by every capability backend.

use thiserror::Error;

/// Result type alias for capability calls.
pub type CapabilityResult<T> = Result<T, CapabilityError>;

/// Errors returned by an external service capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("{operation}: not found: {target}")]
    NotFound {
        operation: &'static str,
        target: String,
    },

    #[error("{operation}: service error: {message}")]
    Service {
        operation: &'static str,
        message: String,
    },

    #[error("{operation}: invalid request: {message}")]
    InvalidRequest {
        operation: &'static str,
        message: String,
    },
}

impl CapabilityError {
    pub fn not_found(operation: &'static str, target: impl Into<String>) -> Self {
        Self::NotFound {
            operation,
            target: target.into(),
        }
    }

    pub fn service(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Service {
            operation,
            message: message.into(),
        }
    }

    pub fn invalid_request(operation: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            operation,
            message: message.into(),
        }
    }

    /// Name of the capability operation that failed.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::NotFound { operation, .. }
            | Self::Service { operation, .. }
            | Self::InvalidRequest { operation, .. } => operation,
        }
    }
}
