//! Resolves a component and runs the render function behind a caught
//! boundary.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use render_config::Severity;
use render_wire::Props;

use crate::logger::Logger;
use crate::registry::Registry;

use super::errors::{CallStatus, RenderError, RenderFailure};

/// Caller-supplied render function.
pub type RenderFn<T> = dyn Fn(&T, &Props) -> Result<String, RenderError> + Send + Sync;

/// How the result of a dispatch reaches the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    /// Part of a duplex session; failures become `null` responses.
    Streaming,
    /// A single call; failures become a [`CallStatus`].
    Unary,
}

impl CallMode {
    fn not_registered_severity(self) -> Severity {
        match self {
            Self::Streaming => Severity::Warning,
            Self::Unary => Severity::Error,
        }
    }
}

/// Runs render requests against the shared registry.
pub struct Dispatcher<T> {
    registry: Arc<Registry<T>>,
    render: Arc<RenderFn<T>>,
    logger: Logger,
}

impl<T> Dispatcher<T> {
    /// Creates a dispatcher over `registry` using `render` for every request.
    pub fn new(registry: Arc<Registry<T>>, render: Arc<RenderFn<T>>, logger: Logger) -> Self {
        Self {
            registry,
            render,
            logger,
        }
    }

    /// Registry consulted by this dispatcher.
    pub fn registry(&self) -> &Arc<Registry<T>> {
        &self.registry
    }

    /// Render log used for dispatch outcomes.
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Renders the component registered under `name`.
    ///
    /// Absent props reach the render function as an empty bag. Errors and
    /// panics raised by the render function are caught and converted into
    /// [`RenderFailure::RenderFunction`]; no failure escapes this call.
    ///
    /// # Errors
    ///
    /// Returns [`RenderFailure::NotRegistered`] when `name` has no registry
    /// entry and [`RenderFailure::RenderFunction`] when rendering failed.
    pub fn dispatch(
        &self,
        name: &str,
        props: Option<&Props>,
        mode: CallMode,
    ) -> Result<String, RenderFailure> {
        let Some(component) = self.registry.lookup(name) else {
            let failure = RenderFailure::not_registered(name);
            self.logger
                .log(mode.not_registered_severity(), &failure.to_string());
            return Err(failure);
        };

        let empty = Props::new();
        match invoke(self.render.as_ref(), &component, props.unwrap_or(&empty)) {
            Ok(content) => {
                if self.logger.enabled(Severity::Debug) {
                    let props_text = props.map_or_else(|| String::from("null"), Props::to_string);
                    self.logger
                        .debug(&format!("Rendered {name} with props {props_text}"));
                }
                Ok(content)
            }
            Err(failure) => {
                self.logger.error(&failure.to_string());
                Err(failure)
            }
        }
    }

    /// Renders a single request outside any stream.
    ///
    /// # Errors
    ///
    /// Returns a [`CallStatus`] of `INVALID_ARGUMENT` for unregistered names
    /// and `UNKNOWN` for render function failures.
    pub fn dispatch_unary(&self, name: &str, props: Option<&Props>) -> Result<String, CallStatus> {
        self.dispatch(name, props, CallMode::Unary)
            .map_err(CallStatus::from)
    }
}

impl<T> fmt::Debug for Dispatcher<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}

fn invoke<T>(render: &RenderFn<T>, component: &T, props: &Props) -> Result<String, RenderFailure> {
    match panic::catch_unwind(AssertUnwindSafe(|| render(component, props))) {
        Ok(Ok(content)) => Ok(content),
        Ok(Err(error)) => Err(RenderFailure::render_function(error.message())),
        Err(payload) => Err(RenderFailure::render_function(panic_message(
            payload.as_ref(),
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned());
    match detail {
        Some(detail) => format!("render function panicked: {detail}"),
        None => String::from("render function panicked"),
    }
}
