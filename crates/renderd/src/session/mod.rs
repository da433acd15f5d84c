//! Duplex render sessions.
//!
//! A session owns one bidirectional connection. The inbound half carries
//! JSONL [`RenderRequest`](render_wire::RenderRequest) lines, the outbound
//! half carries one [`RenderResponse`](render_wire::RenderResponse) line per
//! request, tagged with the request's `request_key`.
//!
//! ```text
//! Open ──end of input──▶ Closing ──drained, end of output──▶ Closed
//!   └──────────────────transport failure─────────────────────▶ Closed
//! ```
//!
//! Failures of individual requests never leave the `Open` state: they are
//! answered with `null` content. Only transport failures (read or write
//! errors, oversized lines) end a session early, and they end only that
//! session.

mod errors;
mod multiplexer;
mod reader;
#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod tests;
mod writer;

pub use self::errors::SessionError;
pub use self::multiplexer::{MAX_IN_FLIGHT, SessionOutcome, SessionReport, SessionState, StreamSession};
pub use self::writer::{OutboundHalf, ResponseWriter};

pub use self::reader::MAX_REQUEST_BYTES;
#[cfg(test)]
pub(crate) use self::reader::LineReader;
#[cfg(test)]
pub(crate) use self::test_utils::{FailingReader, FailingWriter, SharedOutbound};
