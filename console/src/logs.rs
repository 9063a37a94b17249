//! Logging configuration

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::errors::KeyVaultError;

/// File name prefix for rolling log files
const LOG_FILE_PREFIX: &str = "keyvault.log";

/// Log level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_filter_string(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}

impl serde::Serialize for LogLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_filter_string())
    }
}

impl<'de> serde::Deserialize<'de> for LogLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Where log lines are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Standard output
    Stdout,

    /// Daily rolling file in the given directory
    File(PathBuf),
}

/// Logging options
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Log level
    pub log_level: LogLevel,

    /// Log destination
    pub target: LogTarget,

    /// Enable JSON format
    pub json_format: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            target: LogTarget::Stdout,
            json_format: false,
        }
    }
}

/// Initialize logging
///
/// File logging is written from a background thread; the returned guard
/// flushes it when dropped and must be held for the life of the process.
pub fn init_logging(options: LogOptions) -> Result<Option<WorkerGuard>, KeyVaultError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.log_level.to_filter_string()));

    let subscriber = tracing_subscriber::registry().with(filter);

    match options.target {
        LogTarget::Stdout => {
            if options.json_format {
                subscriber
                    .with(fmt::layer().json())
                    .try_init()
                    .map_err(|e| KeyVaultError::ConfigError(e.to_string()))?;
            } else {
                subscriber
                    .with(fmt::layer())
                    .try_init()
                    .map_err(|e| KeyVaultError::ConfigError(e.to_string()))?;
            }
            Ok(None)
        }
        LogTarget::File(dir) => {
            std::fs::create_dir_all(&dir)?;
            let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            if options.json_format {
                subscriber
                    .with(fmt::layer().json().with_writer(writer))
                    .try_init()
                    .map_err(|e| KeyVaultError::ConfigError(e.to_string()))?;
            } else {
                subscriber
                    .with(fmt::layer().with_ansi(false).with_writer(writer))
                    .try_init()
                    .map_err(|e| KeyVaultError::ConfigError(e.to_string()))?;
            }
            Ok(Some(guard))
        }
    }
}
