use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Supported telemetry output formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;

/// Ordered severity of a render log record.
///
/// Variants are declared from least to most severe so the derived ordering
/// gives `Debug < Info < Warning < Error`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Deserialize,
    Serialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumString,
    Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum Severity {
    /// Per-request detail such as successful renders.
    #[default]
    #[strum(to_string = "DEBUG")]
    Debug,
    /// Session lifecycle events.
    #[strum(to_string = "INFO")]
    Info,
    /// Recoverable request problems.
    #[serde(alias = "warn")]
    #[strum(to_string = "WARNING", serialize = "WARN")]
    Warning,
    /// Failed renders and broken connections.
    #[strum(to_string = "ERROR")]
    Error,
}

impl Severity {
    /// Every severity, least severe first.
    pub const ALL: [Self; 4] = [Self::Debug, Self::Info, Self::Warning, Self::Error];

    /// Upper-case label used inside formatted log lines.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

/// Errors encountered while parsing a [`Severity`] from text.
pub type SeverityParseError = strum::ParseError;
