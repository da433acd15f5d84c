//! Failure values produced while dispatching a render request.
//!
//! Nothing here is fatal: every variant is reported back to the caller,
//! either as a `null` response on a stream or as a [`CallStatus`] on the
//! unary path.

use std::fmt;

use thiserror::Error;

/// Failure reported by a caller-supplied render function.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RenderError {
    message: String,
}

impl RenderError {
    /// Creates a render error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Message logged and reported for the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for RenderError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for RenderError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Why a dispatch produced no content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderFailure {
    /// No component is registered under the requested name.
    #[error("Name \"{name}\" not registered")]
    NotRegistered { name: String },

    /// The render function returned an error or panicked.
    #[error("{message}")]
    RenderFunction { message: String },
}

impl RenderFailure {
    /// Creates a not-registered failure.
    pub fn not_registered(name: impl Into<String>) -> Self {
        Self::NotRegistered { name: name.into() }
    }

    /// Creates a render function failure.
    pub fn render_function(message: impl Into<String>) -> Self {
        Self::RenderFunction {
            message: message.into(),
        }
    }

    /// Status reported for this failure on the unary path.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotRegistered { .. } => StatusCode::InvalidArgument,
            Self::RenderFunction { .. } => StatusCode::Unknown,
        }
    }
}

/// Status codes surfaced by unary dispatch, numbered as in gRPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// The render function failed for a reason the service cannot classify.
    Unknown,
    /// The request named a component that is not registered.
    InvalidArgument,
}

impl StatusCode {
    /// Numeric code.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Unknown => 2,
            Self::InvalidArgument => 3,
        }
    }

    /// Canonical upper-case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::InvalidArgument => "INVALID_ARGUMENT",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error status returned by unary dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct CallStatus {
    /// Classification of the failure.
    pub code: StatusCode,
    /// Human-readable description, identical to the logged message.
    pub message: String,
}

impl From<RenderFailure> for CallStatus {
    fn from(failure: RenderFailure) -> Self {
        Self {
            code: failure.status_code(),
            message: failure.to_string(),
        }
    }
}
