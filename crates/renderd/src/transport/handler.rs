//! Connection handling for accepted render sockets.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::dispatch::Dispatcher;
use crate::session::{OutboundHalf, StreamSession};

use super::LISTENER_TARGET;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

/// Stream types accepted by the render listener.
#[derive(Debug)]
pub(crate) enum ConnectionStream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl ConnectionStream {
    /// Splits the stream into independently owned inbound and outbound
    /// halves backed by the same socket.
    pub(crate) fn split(self) -> io::Result<(Self, Self)> {
        let inbound = match &self {
            Self::Tcp(stream) => Self::Tcp(stream.try_clone()?),
            #[cfg(unix)]
            Self::Unix(stream) => Self::Unix(stream.try_clone()?),
        };
        Ok((inbound, self))
    }
}

impl Read for ConnectionStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for ConnectionStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

impl OutboundHalf for ConnectionStream {
    fn close(&mut self) -> io::Result<()> {
        let result = match self {
            Self::Tcp(stream) => stream.shutdown(Shutdown::Write),
            #[cfg(unix)]
            Self::Unix(stream) => stream.shutdown(Shutdown::Write),
        };
        match result {
            // The peer may already have gone away entirely.
            Err(error) if error.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

/// Handles accepted socket connections.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Handles a single connection. Implementations should avoid panicking.
    fn handle(&self, stream: ConnectionStream);
}

/// Serves each connection as a duplex render session.
pub(crate) struct SessionHandler<T> {
    dispatcher: Arc<Dispatcher<T>>,
}

impl<T> SessionHandler<T> {
    pub(crate) fn new(dispatcher: Arc<Dispatcher<T>>) -> Self {
        Self { dispatcher }
    }
}

impl<T: Send + Sync + 'static> ConnectionHandler for SessionHandler<T> {
    fn handle(&self, stream: ConnectionStream) {
        let (inbound, outbound) = match stream.split() {
            Ok(halves) => halves,
            Err(error) => {
                warn!(
                    target: LISTENER_TARGET,
                    error = %error,
                    "failed to split connection"
                );
                return;
            }
        };
        let report = StreamSession::new(&self.dispatcher).run(inbound, outbound);
        debug!(
            target: LISTENER_TARGET,
            requests = report.requests,
            responses = report.responses,
            graceful = report.is_graceful(),
            "session finished"
        );
    }
}
