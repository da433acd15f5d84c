//! Severity-gated render log.
//!
//! Render activity (dispatch outcomes and session lifecycle) is reported as
//! single formatted lines:
//!
//! ```text
//! 2024-05-01T12:00:00.000Z [INFO] Closed connection
//! ```
//!
//! A [`Logger`] drops records below its minimum severity and optionally wraps
//! the whole line in an ANSI colour sequence before handing it to a
//! [`LogSink`]. Sinks are injectable so embedders can route lines to the
//! console, to `tracing`, or into memory.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use render_config::Severity;
use time::OffsetDateTime;
use time::macros::format_description;

/// Tracing target used by [`TracingSink`].
pub(crate) const RENDER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::render");

const COLOR_RESET: &str = "\u{1b}[39m";

/// Destination for formatted render log lines.
pub trait LogSink: Send + Sync {
    /// Receives one fully formatted line (without trailing newline).
    fn emit(&self, severity: Severity, line: &str);
}

/// Writes lines to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn emit(&self, _severity: Severity, line: &str) {
        let mut stdout = io::stdout().lock();
        // Console failures are not worth surfacing to render callers.
        drop(writeln!(stdout, "{line}"));
    }
}

/// Forwards lines to `tracing` at the matching level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, severity: Severity, line: &str) {
        match severity {
            Severity::Debug => tracing::debug!(target: RENDER_TARGET, "{line}"),
            Severity::Info => tracing::info!(target: RENDER_TARGET, "{line}"),
            Severity::Warning => tracing::warn!(target: RENDER_TARGET, "{line}"),
            Severity::Error => tracing::error!(target: RENDER_TARGET, "{line}"),
        }
    }
}

/// Captures lines in memory.
#[derive(Debug, Default)]
pub struct BufferSink {
    records: Mutex<Vec<(Severity, String)>>,
}

impl BufferSink {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every captured record in emission order.
    #[must_use]
    pub fn records(&self) -> Vec<(Severity, String)> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of the captured lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.records().into_iter().map(|(_, line)| line).collect()
    }

    /// Whether a record at `severity` contains `needle`.
    #[must_use]
    pub fn contains(&self, severity: Severity, needle: &str) -> bool {
        self.records()
            .iter()
            .any(|(level, line)| *level == severity && line.contains(needle))
    }

    /// Number of records captured at `severity`.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.records()
            .iter()
            .filter(|(level, _)| *level == severity)
            .count()
    }
}

impl LogSink for BufferSink {
    fn emit(&self, severity: Severity, line: &str) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((severity, line.to_owned()));
    }
}

/// Severity-gated, optionally colourised render log.
#[derive(Clone)]
pub struct Logger {
    minimum: Severity,
    colorize: bool,
    sink: Arc<dyn LogSink>,
}

impl Logger {
    /// Creates a logger emitting records at or above `minimum` into `sink`.
    #[must_use]
    pub fn new(minimum: Severity, colorize: bool, sink: Arc<dyn LogSink>) -> Self {
        Self {
            minimum,
            colorize,
            sink,
        }
    }

    /// Minimum severity that reaches the sink.
    #[must_use]
    pub fn minimum(&self) -> Severity {
        self.minimum
    }

    /// Whether lines are wrapped in colour sequences.
    #[must_use]
    pub fn colorize(&self) -> bool {
        self.colorize
    }

    /// Whether a record at `severity` would be emitted.
    #[must_use]
    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.minimum
    }

    /// Emits `message` at `severity` when the threshold allows it.
    pub fn log(&self, severity: Severity, message: &str) {
        if !self.enabled(severity) {
            return;
        }
        let line = self.format_line(severity, &timestamp(), message);
        self.sink.emit(severity, &line);
    }

    /// Emits a `DEBUG` record.
    pub fn debug(&self, message: &str) {
        self.log(Severity::Debug, message);
    }

    /// Emits an `INFO` record.
    pub fn info(&self, message: &str) {
        self.log(Severity::Info, message);
    }

    /// Emits a `WARNING` record.
    pub fn warning(&self, message: &str) {
        self.log(Severity::Warning, message);
    }

    /// Emits an `ERROR` record.
    pub fn error(&self, message: &str) {
        self.log(Severity::Error, message);
    }

    fn format_line(&self, severity: Severity, timestamp: &str, message: &str) -> String {
        let line = format!("{timestamp} [{}] {message}", severity.label());
        if self.colorize {
            format!("{}{line}{COLOR_RESET}", color_for(severity))
        } else {
            line
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(Severity::Debug, false, Arc::new(StdoutSink))
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Logger")
            .field("minimum", &self.minimum)
            .field("colorize", &self.colorize)
            .finish_non_exhaustive()
    }
}

fn color_for(severity: Severity) -> &'static str {
    match severity {
        Severity::Debug => "\u{1b}[90m",
        Severity::Info => "\u{1b}[34m",
        Severity::Warning => "\u{1b}[33m",
        Severity::Error => "\u{1b}[31m",
    }
}

/// Current UTC time as ISO-8601 with millisecond precision.
fn timestamp() -> String {
    let format =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");
    OffsetDateTime::now_utc()
        .format(format)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00.000Z"))
}
