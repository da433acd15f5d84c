//! Wire types exchanged between render clients and the render service.
//!
//! Every message is a single JSON object terminated by a newline (JSONL).
//! Clients write [`RenderRequest`] lines and read [`RenderResponse`] lines;
//! the `request_key` chosen by the client is echoed in the matching response
//! so replies can be correlated regardless of the order they arrive in.
//!
//! ```json
//! {"request_key":"b","name":"gunnar","props":{"exclamate":false}}
//! {"request_key":"b","content":"hello gunnar."}
//! ```

mod message;
mod props;

pub use message::{RenderRequest, RenderResponse, WireError};
pub use props::Props;
