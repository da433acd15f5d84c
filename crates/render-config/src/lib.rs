//! Shared configuration for the render service.
//!
//! Configuration is layered by `ortho_config`: built-in defaults, then an
//! optional configuration file (`--config-path` or `RENDERD_CONFIG_PATH`),
//! then `RENDERD_*` environment variables, and finally command-line flags.
//! The resolved [`Config`] describes where the service listens and how both
//! the render log and the infrastructure telemetry are emitted.

mod defaults;
mod logging;
mod socket;

use std::ffi::OsString;

use ortho_config::{OrthoConfig, OrthoResult};
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_TCP_HOST, DEFAULT_TCP_PORT, default_log_filter,
    default_log_filter_string, default_log_format, default_log_level, default_socket_endpoint,
};
pub use logging::{LogFormat, LogFormatParseError, Severity, SeverityParseError};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved configuration for the render service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "RENDERD")]
pub struct Config {
    /// Endpoint the render service listens on.
    #[ortho_config(default = default_socket_endpoint())]
    pub listen_socket: SocketEndpoint,
    /// Minimum severity emitted by the render log.
    #[ortho_config(default = default_log_level())]
    pub log_level: Severity,
    /// Whether render log lines are wrapped in colour sequences.
    #[ortho_config(default = false)]
    pub log_colors: bool,
    /// `tracing` filter expression for infrastructure telemetry.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for infrastructure telemetry.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_socket: default_socket_endpoint(),
            log_level: default_log_level(),
            log_colors: false,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Resolves the configuration from the process arguments, environment
    /// and configuration file.
    ///
    /// # Errors
    ///
    /// Returns the layering error when any source fails to parse.
    pub fn load() -> OrthoResult<Self> {
        <Self as OrthoConfig>::load()
    }

    /// Resolves the configuration using `args` in place of the process
    /// arguments. The first item is the program name.
    ///
    /// # Errors
    ///
    /// Returns the layering error when any source fails to parse.
    pub fn load_from_iter<I, T>(args: I) -> OrthoResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as OrthoConfig>::load_from_iter(args)
    }

    /// Endpoint the render service binds.
    #[must_use]
    pub fn listen_socket(&self) -> &SocketEndpoint {
        &self.listen_socket
    }

    /// Minimum severity of render log records.
    #[must_use]
    pub fn log_level(&self) -> Severity {
        self.log_level
    }

    /// Whether render log lines are colourised.
    #[must_use]
    pub fn log_colors(&self) -> bool {
        self.log_colors
    }

    /// Filter expression handed to the telemetry subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Telemetry output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_published_constants() {
        let config = Config::default();
        assert_eq!(
            config.listen_socket(),
            &SocketEndpoint::tcp(DEFAULT_TCP_HOST, DEFAULT_TCP_PORT)
        );
        assert_eq!(config.log_level(), Severity::Debug);
        assert!(!config.log_colors());
        assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
        assert_eq!(config.log_format(), LogFormat::Json);
    }

    #[test]
    fn load_from_iter_applies_command_line_flags() {
        let config = Config::load_from_iter([
            "renderd",
            "--log-level",
            "error",
            "--listen-socket",
            "tcp://127.0.0.1:7000",
        ])
        .expect("load configuration");
        assert_eq!(config.log_level(), Severity::Error);
        assert_eq!(config.listen_socket(), &SocketEndpoint::tcp("127.0.0.1", 7000));
    }
}
