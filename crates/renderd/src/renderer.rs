//! Embeddable render service.
//!
//! A [`Renderer`] owns the component registry and the render function. It
//! answers single calls directly, serves duplex sessions over any reader and
//! outbound half, and can bind a socket to serve sessions for every accepted
//! connection.

use std::fmt;
use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;

use render_config::{Config, Severity, SocketEndpoint};
use render_wire::Props;

use crate::dispatch::{CallStatus, Dispatcher, RenderError, RenderFn};
use crate::logger::{LogSink, Logger, StdoutSink};
use crate::registry::Registry;
use crate::session::{OutboundHalf, SessionReport, StreamSession};
use crate::transport::{ListenerError, ListenerHandle, SessionHandler, SocketListener};

/// Construction-time settings for a [`Renderer`].
pub struct RendererOptions<T> {
    log_level: Severity,
    log_colors: bool,
    sink: Arc<dyn LogSink>,
    render: Arc<RenderFn<T>>,
}

impl<T> RendererOptions<T> {
    /// Options rendering with `render`, logging everything to stdout without
    /// colour.
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&T, &Props) -> Result<String, RenderError> + Send + Sync + 'static,
    {
        Self {
            log_level: Severity::Debug,
            log_colors: false,
            sink: Arc::new(StdoutSink),
            render: Arc::new(render),
        }
    }

    /// Options taking the render log settings from `config`.
    pub fn from_config<F>(config: &Config, render: F) -> Self
    where
        F: Fn(&T, &Props) -> Result<String, RenderError> + Send + Sync + 'static,
    {
        Self::new(render)
            .with_log_level(config.log_level())
            .with_log_colors(config.log_colors())
    }

    /// Sets the minimum severity of emitted render log records.
    #[must_use]
    pub fn with_log_level(mut self, level: Severity) -> Self {
        self.log_level = level;
        self
    }

    /// Enables or disables colourised render log lines.
    #[must_use]
    pub fn with_log_colors(mut self, enabled: bool) -> Self {
        self.log_colors = enabled;
        self
    }

    /// Routes render log lines to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }
}

impl<T> fmt::Debug for RendererOptions<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RendererOptions")
            .field("log_level", &self.log_level)
            .field("log_colors", &self.log_colors)
            .finish_non_exhaustive()
    }
}

/// Render service over components of type `T`.
pub struct Renderer<T> {
    dispatcher: Arc<Dispatcher<T>>,
}

impl<T: Send + Sync + 'static> Renderer<T> {
    /// Builds a renderer with an empty registry.
    pub fn new(options: RendererOptions<T>) -> Self {
        let RendererOptions {
            log_level,
            log_colors,
            sink,
            render,
        } = options;
        let logger = Logger::new(log_level, log_colors, sink);
        let dispatcher = Dispatcher::new(Arc::new(Registry::new()), render, logger);
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Registers `component` under `key`, replacing any previous entry.
    ///
    /// Registration is visible to sessions that are already being served.
    pub fn register(&self, key: impl Into<String>, component: T) {
        self.dispatcher.registry().register(key, component);
    }

    /// Returns the component registered under `key`.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<Arc<T>> {
        self.dispatcher.registry().lookup(key)
    }

    /// Render log shared by every dispatch.
    #[must_use]
    pub fn logger(&self) -> &Logger {
        self.dispatcher.logger()
    }

    /// Renders one request outside any session.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_ARGUMENT` when `name` is not registered and
    /// `UNKNOWN` when the render function fails.
    pub fn render(&self, name: &str, props: Option<&Props>) -> Result<String, CallStatus> {
        self.dispatcher.dispatch_unary(name, props)
    }

    /// Serves one duplex session until the peer ends its input or the
    /// transport fails.
    pub fn serve_stream<R: Read, W: OutboundHalf>(&self, reader: R, writer: W) -> SessionReport {
        StreamSession::new(&self.dispatcher).run(reader, writer)
    }

    /// Binds `endpoint` and serves a session for every accepted connection.
    ///
    /// # Errors
    ///
    /// Returns a [`ListenerError`] when the endpoint cannot be bound.
    pub fn start(&self, endpoint: &SocketEndpoint) -> Result<RenderServer, ListenerError> {
        let listener = SocketListener::bind(endpoint)?;
        let local_addr = listener.local_addr();
        let bound = match local_addr {
            Some(addr) => SocketEndpoint::tcp(addr.ip().to_string(), addr.port()),
            None => listener.endpoint().clone(),
        };
        let handler = Arc::new(SessionHandler::new(Arc::clone(&self.dispatcher)));
        let handle = listener.start(handler)?;
        self.logger().info(&format!("Serving on {bound}"));
        Ok(RenderServer {
            endpoint: bound,
            local_addr,
            handle,
        })
    }
}

impl<T> fmt::Debug for Renderer<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Renderer")
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

/// A renderer serving a bound socket.
///
/// Dropping the server stops the accept loop without waiting for it.
#[derive(Debug)]
pub struct RenderServer {
    endpoint: SocketEndpoint,
    local_addr: Option<SocketAddr>,
    handle: ListenerHandle,
}

impl RenderServer {
    /// Endpoint being served, with the bound port for TCP listeners.
    #[must_use]
    pub fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    /// Bound TCP address; `None` for Unix sockets.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Stops accepting connections. Sessions already running continue
    /// until their peers close them.
    pub fn shutdown(&self) {
        self.handle.shutdown();
    }

    /// Whether [`RenderServer::shutdown`] has been called.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.handle.is_shutting_down()
    }

    /// Waits for the accept loop to exit.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] when the accept loop panicked.
    pub fn join(self) -> Result<(), ListenerError> {
        self.handle.join()
    }
}
