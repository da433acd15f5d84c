use crate::logging::{LogFormat, Severity};
use crate::socket::SocketEndpoint;

/// Host the service binds when no endpoint is configured.
pub const DEFAULT_TCP_HOST: &str = "0.0.0.0";

/// Port the service binds when no endpoint is configured.
pub const DEFAULT_TCP_PORT: u16 = 50051;

/// Default telemetry filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default telemetry filter expression.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned telemetry filter used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default telemetry output format.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default render log threshold: everything is emitted.
#[must_use]
pub fn default_log_level() -> Severity {
    Severity::Debug
}

/// Endpoint used when neither file, environment nor CLI name one.
#[must_use]
pub fn default_socket_endpoint() -> SocketEndpoint {
    SocketEndpoint::tcp(DEFAULT_TCP_HOST, DEFAULT_TCP_PORT)
}
