//! Shared collaborators for the behavioural suites.

use std::ffi::OsString;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use ortho_config::OrthoError;
use render_config::{Config, SocketEndpoint};
use render_wire::Props;

use crate::bootstrap::{BootstrapError, ConfigLoader};
use crate::dispatch::RenderError;
use crate::health::HealthReporter;
use crate::logger::{BufferSink, LogSink};
use crate::process::{ShutdownError, ShutdownSignal};
use crate::renderer::{Renderer, RendererOptions};

/// Lifecycle events captured by [`RecordingHealthReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    ListenerStarted(SocketEndpoint),
    ListenerStopped(SocketEndpoint),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Endpoint announced by the most recent `listener_started` event.
    pub fn started_endpoint(&self) -> Option<SocketEndpoint> {
        self.events().into_iter().rev().find_map(|event| match event {
            HealthEvent::ListenerStarted(endpoint) => Some(endpoint),
            _ => None,
        })
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn listener_started(&self, endpoint: &SocketEndpoint) {
        self.record(HealthEvent::ListenerStarted(endpoint.clone()));
    }

    fn listener_stopped(&self, endpoint: &SocketEndpoint) {
        self.record(HealthEvent::ListenerStopped(endpoint.clone()));
    }
}

/// Loader serving an ephemeral loopback TCP port.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoopbackConfigLoader;

impl ConfigLoader for LoopbackConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            listen_socket: SocketEndpoint::tcp("127.0.0.1", 0),
            ..Config::default()
        })
    }
}

/// Loader that fails by passing an unparseable endpoint on the command line.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter(vec![
            OsString::from("renderd"),
            OsString::from("--listen-socket"),
            OsString::from("invalid://socket"),
        ])
    }
}

/// Shutdown signal released by the test through a channel.
pub struct ChannelShutdown {
    receiver: Mutex<Receiver<()>>,
}

impl ChannelShutdown {
    pub fn new() -> (Sender<()>, Self) {
        let (sender, receiver) = mpsc::channel();
        let signal = Self {
            receiver: Mutex::new(receiver),
        };
        (sender, signal)
    }
}

impl ShutdownSignal for ChannelShutdown {
    fn wait(&self) -> Result<(), ShutdownError> {
        // A dropped sender also releases the service.
        let _ = self
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recv_timeout(Duration::from_secs(10));
        Ok(())
    }
}

/// Render function used by the suites: greets the component, honours the
/// `exclamate` flag, and fails on demand through the `fail` prop.
pub fn greet(component: &String, props: &Props) -> Result<String, RenderError> {
    match props.get_str("fail") {
        Some("error") => Err(RenderError::new("render exploded")),
        Some("panic") => panic!("render panicked"),
        _ => {
            let suffix = if props.flag("exclamate") { "!" } else { "." };
            Ok(format!("hello {component}{suffix}"))
        }
    }
}

/// Builds a renderer logging into `sink` with `gunnar` registered.
pub fn gunnar_renderer(sink: &Arc<BufferSink>) -> Renderer<String> {
    let options =
        RendererOptions::new(greet).with_sink(Arc::clone(sink) as Arc<dyn LogSink>);
    let renderer = Renderer::new(options);
    renderer.register("gunnar", String::from("gunnar"));
    renderer
}
