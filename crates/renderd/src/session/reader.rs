//! Bounded JSONL line reader for the inbound half of a session.

use std::io::{BufRead, BufReader, Read};

use super::errors::SessionError;

/// Maximum size of a single request line in bytes, delimiter included.
pub const MAX_REQUEST_BYTES: usize = 1024 * 1024;

/// Splits an inbound byte stream into newline-delimited request lines.
pub(crate) struct LineReader<R> {
    inner: BufReader<R>,
    limit: usize,
}

impl<R: Read> LineReader<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self::with_limit(reader, MAX_REQUEST_BYTES)
    }

    pub(crate) fn with_limit(reader: R, limit: usize) -> Self {
        Self {
            inner: BufReader::new(reader),
            limit,
        }
    }

    /// Reads the next line.
    ///
    /// Returns `Ok(None)` once the peer has closed its half of the stream. A
    /// trailing line without a delimiter is returned as-is before that.
    pub(crate) fn next_line(&mut self) -> Result<Option<Vec<u8>>, SessionError> {
        let mut buffer = Vec::new();
        let cap = u64::try_from(self.limit)
            .unwrap_or(u64::MAX)
            .saturating_add(1);
        let read = self
            .inner
            .by_ref()
            .take(cap)
            .read_until(b'\n', &mut buffer)?;
        if read == 0 {
            return Ok(None);
        }
        if buffer.len() > self.limit {
            return Err(SessionError::request_too_large(buffer.len(), self.limit));
        }
        Ok(Some(buffer))
    }
}
