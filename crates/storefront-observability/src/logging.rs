//! Structured logging setup.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured level.
pub const FILTER_ENV: &str = "STOREFRONT_LOG";

/// Log level for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Filter directive for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ObservabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(ObservabilityError::InvalidLevel(other.to_string())),
        }
    }
}

/// Output format for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (for production/log aggregation).
    #[default]
    Json,
    /// Human-readable format (for development).
    Human,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Extra filter directives, e.g. `"storefront_data=debug,reqwest=warn"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directives: Option<String>,
}

impl LogConfig {
    pub fn new(level: LogLevel, format: LogFormat) -> Self {
        Self {
            level,
            format,
            directives: None,
        }
    }

    pub fn with_directives(mut self, directives: impl Into<String>) -> Self {
        self.directives = Some(directives.into());
        self
    }

    /// Full filter string: the level, then any extra directives.
    pub fn filter_string(&self) -> String {
        match self.directives.as_deref().map(str::trim) {
            Some(extra) if !extra.is_empty() => format!("{},{}", self.level, extra),
            _ => self.level.to_string(),
        }
    }

    /// Build the filter, preferring [`FILTER_ENV`] when it is set.
    pub fn env_filter(&self) -> Result<EnvFilter, ObservabilityError> {
        if let Ok(filter) = EnvFilter::try_from_env(FILTER_ENV) {
            return Ok(filter);
        }
        EnvFilter::try_new(self.filter_string())
            .map_err(|e| ObservabilityError::InvalidFilter(e.to_string()))
    }
}

/// Errors raised while setting up logging.
#[derive(Debug, thiserror::Error)]
pub enum ObservabilityError {
    #[error("Unknown log level: {0}")]
    InvalidLevel(String),

    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    /// A global subscriber is already installed. Safe to ignore.
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Install the global subscriber. Logs go to stderr.
///
/// Calling this a second time returns
/// [`ObservabilityError::AlreadyInitialized`] and leaves the first
/// subscriber in place.
pub fn init(config: &LogConfig) -> Result<(), ObservabilityError> {
    let filter = config.env_filter()?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = match config.format {
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
        LogFormat::Human => builder.with_target(false).try_init(),
    };
    result.map_err(|e| ObservabilityError::AlreadyInitialized(e.to_string()))?;
    tracing::debug!(
        format = ?config.format,
        filter = %config.filter_string(),
        "logging_initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing() {
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
        assert!(LogLevel::Error > LogLevel::Info);
    }

    #[test]
    fn test_config_defaults() {
        let config: LogConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Json);

        let config: LogConfig =
            serde_json::from_str(r#"{"level": "debug", "format": "human"}"#).unwrap();
        assert_eq!(config, LogConfig::new(LogLevel::Debug, LogFormat::Human));
    }

    #[test]
    fn test_filter_string() {
        let config = LogConfig::new(LogLevel::Warn, LogFormat::Json);
        assert_eq!(config.filter_string(), "warn");

        let config = config.with_directives("storefront_data=debug");
        assert_eq!(config.filter_string(), "warn,storefront_data=debug");
    }

    #[test]
    fn test_second_init_is_reported() {
        let config = LogConfig::new(LogLevel::Error, LogFormat::Human);
        let _ = init(&config);
        assert!(matches!(
            init(&config),
            Err(ObservabilityError::AlreadyInitialized(_))
        ));
    }
}
