//! Socket transport for render sessions.
//!
//! A [`SocketListener`] binds the configured endpoint and accepts
//! connections on a background thread; each accepted connection is handed
//! to a [`ConnectionHandler`] on its own thread.

mod errors;
mod handler;
mod listener;

pub use self::errors::ListenerError;
pub(crate) use self::handler::{ConnectionHandler, ConnectionStream, SessionHandler};
pub(crate) use self::listener::{ListenerHandle, SocketListener};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
