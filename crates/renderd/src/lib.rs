//! Request-multiplexing render service.
//!
//! Clients open one duplex connection and push many independent, keyed
//! render requests over it. For each request the service looks up a
//! registered component by name, invokes the caller-supplied render function
//! with the request's props, and writes back a response carrying the same
//! `request_key`. A request that names an unknown component, or whose render
//! function fails or panics, is answered with `null` content; the connection
//! stays open for the requests that follow.
//!
//! ```no_run
//! use render_config::SocketEndpoint;
//! use render_wire::Props;
//! use renderd::{RenderError, Renderer, RendererOptions};
//!
//! let renderer = Renderer::new(RendererOptions::new(
//!     |component: &String, _props: &Props| -> Result<String, RenderError> {
//!         Ok(format!("hello {component}"))
//!     },
//! ));
//! renderer.register("gunnar", String::from("gunnar"));
//! let server = renderer.start(&SocketEndpoint::tcp("127.0.0.1", 50051))?;
//! server.join()?;
//! # Ok::<(), renderd::ListenerError>(())
//! ```
//!
//! Render activity is reported through the severity-gated [`Logger`];
//! listener, bootstrap and shutdown diagnostics go through `tracing`.

mod bootstrap;
mod dispatch;
mod health;
mod logger;
mod process;
mod registry;
mod renderer;
mod session;
mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, Bootstrapped, ConfigLoader, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use dispatch::{CallMode, CallStatus, Dispatcher, RenderError, RenderFailure, RenderFn, StatusCode};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use logger::{BufferSink, LogSink, Logger, StdoutSink, TracingSink};
pub use process::{
    LaunchError, ServicePlan, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_service,
    run_service_with,
};
pub use registry::Registry;
pub use renderer::{RenderServer, Renderer, RendererOptions};
pub use session::{
    MAX_IN_FLIGHT, MAX_REQUEST_BYTES, OutboundHalf, ResponseWriter, SessionError, SessionOutcome,
    SessionReport, SessionState, StreamSession,
};
pub use telemetry::{TelemetryError, TelemetryHandle, initialise as initialise_telemetry};
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
