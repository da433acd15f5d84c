use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::Props;

/// Errors raised while decoding a request line.
#[derive(Debug, Error)]
pub enum WireError {
    /// The line held nothing but whitespace.
    #[error("empty request line")]
    Empty,
    /// The line was not a JSON object matching the request schema.
    #[error("malformed request: {source}")]
    Malformed {
        /// Underlying decoder error.
        #[source]
        source: serde_json::Error,
    },
}

/// A keyed render request sent by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Caller-chosen correlation key echoed in the response.
    pub request_key: String,
    /// Registry key of the component to render.
    pub name: String,
    /// Properties forwarded to the render function; `null` when omitted.
    #[serde(default)]
    pub props: Option<Props>,
}

impl RenderRequest {
    /// Builds a request without props.
    #[must_use]
    pub fn new(request_key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            request_key: request_key.into(),
            name: name.into(),
            props: None,
        }
    }

    /// Attaches props to the request.
    #[must_use]
    pub fn with_props(mut self, props: Props) -> Self {
        self.props = Some(props);
        self
    }

    /// Parses a JSONL line into a request.
    ///
    /// Trailing whitespace, including the newline delimiter, is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Empty`] for a blank line and
    /// [`WireError::Malformed`] when the JSON does not match the schema.
    pub fn parse(line: &[u8]) -> Result<Self, WireError> {
        let trimmed = trim_trailing_whitespace(line);
        if trimmed.is_empty() {
            return Err(WireError::Empty);
        }
        serde_json::from_slice(trimmed).map_err(|source| WireError::Malformed { source })
    }

    /// Salvages the `request_key` from a line that failed to parse as a
    /// request, so the rejection can still be correlated by the client.
    #[must_use]
    pub fn recover_request_key(line: &[u8]) -> Option<String> {
        let value: Value = serde_json::from_slice(trim_trailing_whitespace(line)).ok()?;
        value
            .get("request_key")
            .and_then(Value::as_str)
            .map(str::to_owned)
    }
}

/// The reply written for exactly one [`RenderRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderResponse {
    /// Echo of the request's correlation key.
    pub request_key: String,
    /// Rendered output, or `null` when the request could not be rendered.
    pub content: Option<String>,
}

impl RenderResponse {
    /// A response carrying rendered content.
    #[must_use]
    pub fn rendered(request_key: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            request_key: request_key.into(),
            content: Some(content.into()),
        }
    }

    /// A response reporting that nothing could be rendered.
    #[must_use]
    pub fn empty(request_key: impl Into<String>) -> Self {
        Self {
            request_key: request_key.into(),
            content: None,
        }
    }

    /// Parses a JSONL response line, as read by clients.
    ///
    /// # Errors
    ///
    /// Returns [`WireError`] when the line is blank or malformed.
    pub fn parse(line: &[u8]) -> Result<Self, WireError> {
        let trimmed = trim_trailing_whitespace(line);
        if trimmed.is_empty() {
            return Err(WireError::Empty);
        }
        serde_json::from_slice(trimmed).map_err(|source| WireError::Malformed { source })
    }
}

fn trim_trailing_whitespace(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|byte| !byte.is_ascii_whitespace())
        .map_or(0, |pos| pos + 1);
    bytes.get(..end).unwrap_or_default()
}
