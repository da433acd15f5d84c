//! Response serialisation for the outbound half of a session.

use std::io::{self, Write};

use render_wire::RenderResponse;

use super::errors::SessionError;

/// Outbound half of a duplex connection.
pub trait OutboundHalf: Write + Send {
    /// Signals end-of-output to the peer.
    fn close(&mut self) -> io::Result<()>;
}

impl OutboundHalf for Vec<u8> {
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes render responses as JSONL lines.
///
/// Each response is serialised into a complete line before it touches the
/// stream, so one `write_response` call never interleaves with another when
/// callers serialise access to the writer.
pub struct ResponseWriter<W> {
    writer: W,
    written: usize,
}

impl<W: OutboundHalf> ResponseWriter<W> {
    /// Creates a new response writer wrapping the given outbound half.
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Writes one response line and flushes it.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, writing or flushing fails.
    pub fn write_response(&mut self, response: &RenderResponse) -> Result<(), SessionError> {
        let mut line = serde_json::to_vec(response)?;
        line.push(b'\n');
        self.writer.write_all(&line)?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }

    /// Number of responses written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flushes pending output and signals end-of-output.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing or closing the stream fails.
    pub fn finish(&mut self) -> Result<(), SessionError> {
        self.writer.flush()?;
        self.writer.close()?;
        Ok(())
    }

    /// Releases the wrapped stream.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
