//! Transport failures that end a duplex session.

use std::io;

use thiserror::Error;

/// Errors that terminate a single session without affecting any other.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading from or writing to the connection failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// An inbound line exceeded the maximum request size.
    #[error("request too large: {size} bytes exceeds {max_size} byte limit")]
    RequestTooLarge { size: usize, max_size: usize },

    /// A response could not be serialised.
    #[error("failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl SessionError {
    /// Creates a request too large error.
    pub fn request_too_large(size: usize, max_size: usize) -> Self {
        Self::RequestTooLarge { size, max_size }
    }
}
